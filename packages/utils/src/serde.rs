//! This module provides custom serde implementations.

/// Serialize a number as a string.
pub mod number_as_string {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Implements the serde `serialize` function for a number.
    /// # Errors
    /// Returns an error if the number cannot be serialized.
    pub fn serialize<T, S>(number: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: ToString,
        S: Serializer,
    {
        serializer.serialize_str(&number.to_string())
    }

    /// Implements the serde `deserialize` function for a number.
    /// # Errors
    /// Returns an error if the string cannot be deserialized to a number.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serialize bytes as a standard base64 string.
pub mod base64 {
    use base64::prelude::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Implements the serde `serialize` function for a byte buffer.
    /// # Errors
    /// Returns an error if the serializer fails.
    pub fn serialize<S, T: AsRef<[u8]>>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64_STANDARD.encode(data))
    }

    /// Implements the serde `deserialize` function for a byte buffer.
    /// # Errors
    /// Returns an error if the string is not valid base64.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let s = String::deserialize(deserializer)?;
        let decoded = BASE64_STANDARD
            .decode(s.as_bytes())
            .map_err(de::Error::custom)?;
        T::try_from(decoded).map_err(|_| de::Error::custom("Invalid base64 data"))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super::number_as_string")]
        sequence: u64,
        #[serde(with = "super::base64")]
        payload: Vec<u8>,
    }

    #[test]
    fn encodes_numbers_as_strings_and_bytes_as_base64() {
        let sample = Sample {
            sequence: 18_446_744_073_709_551_615,
            payload: b"ibc".to_vec(),
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(
            json,
            r#"{"sequence":"18446744073709551615","payload":"aWJj"}"#
        );
        assert_eq!(serde_json::from_str::<Sample>(&json).unwrap(), sample);
    }

    #[test]
    fn rejects_malformed_base64() {
        let res = serde_json::from_str::<Sample>(r#"{"sequence":"1","payload":"@@"}"#);
        assert!(res.is_err());
    }
}
