//! Chain and client identifiers

use crate::error::ClientError;

/// Minimum length of a client identifier.
pub const MIN_CLIENT_ID_LENGTH: usize = 9;
/// Maximum length of a client identifier.
pub const MAX_CLIENT_ID_LENGTH: usize = 64;
/// Minimum length of a client type.
pub const MIN_CLIENT_TYPE_LENGTH: usize = 2;
/// Maximum length of a client type.
pub const MAX_CLIENT_TYPE_LENGTH: usize = 64;

/// Returns true if the chain identifier ends in `-{N}` with `N ≥ 1` and no leading zero,
/// preceded by at least two characters of which the last is not a dash.
#[must_use]
pub fn is_revision_format(chain_id: &str) -> bool {
    split_revision(chain_id).is_some()
}

fn split_revision(chain_id: &str) -> Option<(&str, &str)> {
    let (prefix, revision) = chain_id.rsplit_once('-')?;
    let valid_revision = revision.starts_with(|c: char| ('1'..='9').contains(&c))
        && revision.bytes().all(|b| b.is_ascii_digit());
    let valid_prefix = prefix.chars().count() >= 2 && !prefix.ends_with('-');
    (valid_revision && valid_prefix).then_some((prefix, revision))
}

/// Returns the revision number encoded in the chain identifier, or 0 when the identifier
/// is not in revision format.
#[must_use]
pub fn parse_chain_id(chain_id: &str) -> u64 {
    split_revision(chain_id)
        .and_then(|(_, revision)| revision.parse().ok())
        .unwrap_or_default()
}

/// Rewrites the trailing revision number of a chain identifier.
///
/// # Errors
/// Returns [`ClientError::InvalidChainId`] if the identifier is not in revision format.
pub fn set_revision_number(chain_id: &str, revision: u64) -> Result<String, ClientError> {
    let (prefix, _) = split_revision(chain_id).ok_or_else(|| ClientError::InvalidChainId {
        reason: format!("chain id {chain_id:?} is not in revision format"),
    })?;
    Ok(format!("{prefix}-{revision}"))
}

/// Formats a client identifier as `{client_type}-{sequence}`.
#[must_use]
pub fn format_client_identifier(client_type: &str, sequence: u64) -> String {
    format!("{client_type}-{sequence}")
}

/// Splits a client identifier into its client type and sequence.
///
/// # Errors
/// Returns [`ClientError::InvalidClientId`] if the identifier has no dash, the sequence is
/// not an unsigned 64-bit decimal, or the client type is blank, too long or contains
/// characters outside the identifier alphabet.
pub fn parse_client_identifier(client_id: &str) -> Result<(String, u64), ClientError> {
    let (client_type, sequence) =
        client_id
            .rsplit_once('-')
            .ok_or_else(|| ClientError::InvalidClientId {
                reason: format!("{client_id:?} is not in format {{client-type}}-{{N}}"),
            })?;

    if client_type.trim().is_empty() {
        return Err(ClientError::InvalidClientId {
            reason: format!("client type in {client_id:?} cannot be blank"),
        });
    }
    validate_client_type(client_type).map_err(|e| ClientError::InvalidClientId {
        reason: e.to_string(),
    })?;
    if !client_type.chars().all(is_identifier_char) {
        return Err(ClientError::InvalidClientId {
            reason: format!("client type {client_type:?} contains invalid characters"),
        });
    }

    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClientError::InvalidClientId {
            reason: format!("sequence {sequence:?} is not a decimal number"),
        });
    }
    let sequence = sequence.parse().map_err(|e| ClientError::InvalidClientId {
        reason: format!("sequence {sequence:?}: {e}"),
    })?;

    Ok((client_type.to_string(), sequence))
}

/// Returns true iff [`parse_client_identifier`] succeeds.
#[must_use]
pub fn is_valid_client_id(client_id: &str) -> bool {
    parse_client_identifier(client_id).is_ok()
}

/// Validates a client type tag.
///
/// # Errors
/// Returns [`ClientError::InvalidClientType`] if the type is blank, padded with whitespace,
/// ends in a dash or its length is outside `2..=64`.
pub fn validate_client_type(client_type: &str) -> Result<(), ClientError> {
    let invalid = |reason: String| Err(ClientError::InvalidClientType { reason });

    if client_type.trim().is_empty() {
        return invalid("client type cannot be blank".to_string());
    }
    if client_type.trim() != client_type {
        return invalid(format!(
            "client type {client_type:?} has surrounding whitespace"
        ));
    }
    let len = client_type.chars().count();
    if !(MIN_CLIENT_TYPE_LENGTH..=MAX_CLIENT_TYPE_LENGTH).contains(&len) {
        return invalid(format!(
            "client type {client_type:?} length {len} not in [{MIN_CLIENT_TYPE_LENGTH}, {MAX_CLIENT_TYPE_LENGTH}]"
        ));
    }
    if client_type.ends_with('-') {
        return invalid(format!("client type {client_type:?} cannot end with a dash"));
    }
    Ok(())
}

/// Validates a client identifier against the host identifier rules: non-blank, no path
/// separators, length within `9..=64` and only `[a-zA-Z0-9._+-#[]<>]` characters.
///
/// # Errors
/// Returns [`ClientError::InvalidClientId`] on any violation.
pub fn validate_client_identifier(client_id: &str) -> Result<(), ClientError> {
    let invalid = |reason: String| Err(ClientError::InvalidClientId { reason });

    if client_id.trim().is_empty() {
        return invalid("identifier cannot be blank".to_string());
    }
    if client_id.contains('/') {
        return invalid(format!("identifier {client_id:?} cannot contain separator '/'"));
    }
    let len = client_id.len();
    if !(MIN_CLIENT_ID_LENGTH..=MAX_CLIENT_ID_LENGTH).contains(&len) {
        return invalid(format!(
            "identifier {client_id:?} has invalid length {len}, must be between {MIN_CLIENT_ID_LENGTH}-{MAX_CLIENT_ID_LENGTH} characters"
        ));
    }
    if !client_id.chars().all(is_identifier_char) {
        return invalid(format!(
            "identifier {client_id:?} must contain only alphanumeric or the following characters: '.', '_', '+', '-', '#', '[', ']', '<', '>'"
        ));
    }
    Ok(())
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>')
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("gaia-1", 1)]
    #[case("cosmoshub-4", 4)]
    #[case("chain--a-12", 12)]
    #[case("evmos_9001-2", 2)]
    #[case("gaia-01", 0)]
    #[case("gaia-0", 0)]
    #[case("gaia", 0)]
    #[case("a-1", 0)]
    #[case("gaia--1", 0)]
    #[case("gaia-", 0)]
    #[case("gaia-1x", 0)]
    #[case("gaia-99999999999999999999999", 0)]
    fn parses_trailing_revision(#[case] chain_id: &str, #[case] exp: u64) {
        assert_eq!(parse_chain_id(chain_id), exp);
    }

    #[test]
    fn set_revision_number_rewrites_suffix() {
        assert_eq!(set_revision_number("gaia-1", 5).unwrap(), "gaia-5");
        assert!(matches!(
            set_revision_number("gaia", 5),
            Err(ClientError::InvalidChainId { .. })
        ));
    }

    #[rstest]
    #[case("07-tendermint", 0)]
    #[case("06-solomachine", 42)]
    #[case("my-custom-client", u64::MAX)]
    fn client_identifier_round_trips(#[case] client_type: &str, #[case] sequence: u64) {
        let id = format_client_identifier(client_type, sequence);
        assert_eq!(
            parse_client_identifier(&id).unwrap(),
            (client_type.to_string(), sequence)
        );
        assert!(is_valid_client_id(&id));
    }

    #[rstest]
    #[case("tendermint")]
    #[case("-1")]
    #[case("   -1")]
    #[case("07-tendermint-")]
    #[case("07-tendermint-x")]
    #[case("07-tendermint-+1")]
    #[case("07-tendermint-18446744073709551616")]
    #[case("a-1")]
    #[case("07/tendermint-1")]
    fn rejects_malformed_client_identifiers(#[case] client_id: &str) {
        assert!(matches!(
            parse_client_identifier(client_id),
            Err(ClientError::InvalidClientId { .. })
        ));
        assert!(!is_valid_client_id(client_id));
    }

    #[test]
    fn rejects_overlong_client_type() {
        let id = format!("{}-1", "x".repeat(MAX_CLIENT_TYPE_LENGTH + 1));
        assert!(parse_client_identifier(&id).is_err());
    }

    #[rstest]
    #[case("07-tendermint", true)]
    #[case("ab", true)]
    #[case("a", false)]
    #[case("", false)]
    #[case("   ", false)]
    #[case(" tendermint", false)]
    #[case("tendermint-", false)]
    fn validates_client_type(#[case] client_type: &str, #[case] ok: bool) {
        assert_eq!(validate_client_type(client_type).is_ok(), ok);
    }

    #[rstest]
    #[case("07-tendermint-0", true)]
    #[case("09-localhost", true)]
    #[case("clientidone", true)]
    #[case("short", false)]
    #[case("07-tendermint/0", false)]
    #[case("07-tendermint 0", false)]
    fn validates_host_identifier(#[case] client_id: &str, #[case] ok: bool) {
        assert_eq!(validate_client_identifier(client_id).is_ok(), ok);
    }
}
