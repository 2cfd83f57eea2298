//! Versioned heights

use std::{fmt, str::FromStr};

use ibc_light_client_utils::serde::number_as_string;
use ibc_proto::ibc::core::client::v1::Height as RawHeight;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A height on a chain that may go through revisions.
///
/// Ordering is lexicographic: the revision number dominates, then the revision height.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Height {
    /// The revision the height belongs to
    #[serde(with = "number_as_string")]
    pub revision_number: u64,
    /// The height within the revision
    #[serde(with = "number_as_string")]
    pub revision_height: u64,
}

impl Height {
    /// Creates a new height.
    #[must_use]
    pub const fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    /// The zero height, used as the "unset" marker.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Returns true if both components are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }

    /// Returns the height right below this one within the same revision,
    /// or `None` when the revision height is already zero.
    #[must_use]
    pub const fn decrement(&self) -> Option<Self> {
        if self.revision_height == 0 {
            return None;
        }
        Some(Self::new(self.revision_number, self.revision_height - 1))
    }

    /// Returns the next height within the same revision.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidHeight`] if the revision height is `u64::MAX`.
    pub fn increment(&self) -> Result<Self, ClientError> {
        let revision_height = self
            .revision_height
            .checked_add(1)
            .ok_or_else(|| ClientError::InvalidHeight {
                reason: format!("height {self} cannot be incremented"),
            })?;
        Ok(Self::new(self.revision_number, revision_height))
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

impl FromStr for Height {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let [revision_number, revision_height] = parts.as_slice() else {
            return Err(ClientError::InvalidHeight {
                reason: format!("expected format {{revision}}-{{height}}, got {s:?}"),
            });
        };

        Ok(Self::new(
            parse_component(revision_number, "revision number")?,
            parse_component(revision_height, "revision height")?,
        ))
    }
}

fn parse_component(component: &str, name: &str) -> Result<u64, ClientError> {
    // `u64::from_str` tolerates a leading `+`
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClientError::InvalidHeight {
            reason: format!("invalid {name} {component:?}"),
        });
    }
    component.parse().map_err(|e| ClientError::InvalidHeight {
        reason: format!("invalid {name} {component:?}: {e}"),
    })
}

/// Parses a height from its `"{revision_number}-{revision_height}"` form.
///
/// # Errors
/// Returns [`ClientError::InvalidHeight`] if the string is not exactly two unsigned integers
/// joined by a single dash.
pub fn parse_height(s: &str) -> Result<Height, ClientError> {
    s.parse()
}

impl From<RawHeight> for Height {
    fn from(raw: RawHeight) -> Self {
        Self::new(raw.revision_number, raw.revision_height)
    }
}

impl From<Height> for RawHeight {
    fn from(height: Height) -> Self {
        Self {
            revision_number: height.revision_number,
            revision_height: height.revision_height,
        }
    }
}
