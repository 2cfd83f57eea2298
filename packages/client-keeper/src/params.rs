//! Parameters of the client keeper

use ibc_light_client_core::ClientError;
use ibc_light_client_utils::ensure;
use serde::{Deserialize, Serialize};
use solomachine_light_client::SOLOMACHINE_CLIENT_TYPE;
use tendermint_light_client::TENDERMINT_CLIENT_TYPE;

/// Client keeper parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Client types that may be created
    pub allowed_client_types: Vec<String>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            allowed_client_types: vec![
                SOLOMACHINE_CLIENT_TYPE.to_string(),
                TENDERMINT_CLIENT_TYPE.to_string(),
            ],
        }
    }
}

impl Params {
    /// Parameters allowing exactly `client_types`.
    #[must_use]
    pub fn new(client_types: &[&str]) -> Self {
        Self {
            allowed_client_types: client_types.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether clients of `client_type` may be created.
    #[must_use]
    pub fn is_allowed_client(&self, client_type: &str) -> bool {
        !client_type.trim().is_empty() && self.allowed_client_types.iter().any(|t| t == client_type)
    }

    /// Checks that no allowed client type is blank.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidParams`] for a blank entry.
    pub fn validate(&self) -> Result<(), ClientError> {
        for (i, client_type) in self.allowed_client_types.iter().enumerate() {
            ensure!(
                !client_type.trim().is_empty(),
                ClientError::InvalidParams {
                    reason: format!("client type {i} cannot be blank"),
                }
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::default_params(Params::default(), true)]
    #[case::empty_list(Params::new(&[]), true)]
    #[case::blank_type(Params::new(&["07-tendermint", " "]), false)]
    #[case::empty_type(Params::new(&[""]), false)]
    fn validate(#[case] params: Params, #[case] ok: bool) {
        let res = params.validate();
        assert_eq!(res.is_ok(), ok);
        if !ok {
            assert!(matches!(res, Err(ClientError::InvalidParams { .. })));
        }
    }

    #[rstest]
    #[case::solomachine("06-solomachine", true)]
    #[case::tendermint("07-tendermint", true)]
    #[case::localhost("09-localhost", false)]
    #[case::blank("", false)]
    fn default_allow_list(#[case] client_type: &str, #[case] allowed: bool) {
        assert_eq!(Params::default().is_allowed_client(client_type), allowed);
    }

    #[test]
    fn serializes_as_json() {
        let json = serde_json::to_string(&Params::new(&["07-tendermint"])).unwrap();
        assert_eq!(json, r#"{"allowed_client_types":["07-tendermint"]}"#);
        let params: Params = serde_json::from_str(&json).unwrap();
        assert!(params.is_allowed_client("07-tendermint"));
    }
}
