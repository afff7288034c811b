//! Identity-provider user identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProviderUserId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderUserIdError {
    /// The identifier is empty.
    #[error("provider user id cannot be empty")]
    Empty,
    /// The identifier is longer than the session hash can cover.
    #[error("provider user id must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length in bytes.
        max: usize,
    },
}

/// The stable user identifier assigned by the identity provider
/// (Google's numeric `id` field, carried as a string).
///
/// Immutable once stored on an admin record. The session cookie carries a
/// bcrypt hash of this value. bcrypt hashes at most 72 bytes including the
/// NUL terminator it appends, so ids are capped at 71 bytes rather than being
/// silently truncated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderUserId(String);

impl ProviderUserId {
    /// Largest identifier that fits in a single bcrypt input.
    pub const MAX_LENGTH: usize = 71;

    /// Parse a provider user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or longer than
    /// [`ProviderUserId::MAX_LENGTH`] bytes.
    pub fn parse(s: &str) -> Result<Self, ProviderUserIdError> {
        if s.is_empty() {
            return Err(ProviderUserIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ProviderUserIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProviderUserId {
    type Error = ProviderUserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProviderUserId> for String {
    fn from(id: ProviderUserId) -> Self {
        id.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ProviderUserId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ProviderUserId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_google_id() {
        let id = ProviderUserId::parse("108234567890123456789").unwrap();
        assert_eq!(id.as_str(), "108234567890123456789");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ProviderUserId::parse(""), Err(ProviderUserIdError::Empty));
    }

    #[test]
    fn test_parse_length_limit() {
        assert!(ProviderUserId::parse(&"9".repeat(71)).is_ok());
        assert!(matches!(
            ProviderUserId::parse(&"9".repeat(72)),
            Err(ProviderUserIdError::TooLong { max: 71 })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<ProviderUserId>("\"pid1\"").is_ok());
        assert!(serde_json::from_str::<ProviderUserId>("\"\"").is_err());
    }
}
