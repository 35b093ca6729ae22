//! Store name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StoreName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreNameError {
    /// The input string is empty.
    #[error("store name cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("store name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character reserved by the role cache key.
    #[error("store name cannot contain '{0}'")]
    ReservedCharacter(char),
}

/// The Shopify shop a request is scoped to (e.g. `acme-b2b.myshopify.com`).
///
/// Role cache rows are partitioned by store, so the name is normalized
/// (trimmed, lowercased) to keep `Acme-B2B.myshopify.com` and
/// `acme-b2b.myshopify.com` from producing two cache partitions.
///
/// ## Examples
///
/// ```
/// use b2b_portal_core::StoreName;
///
/// let store = StoreName::parse(" Acme-B2B.myshopify.com ").unwrap();
/// assert_eq!(store.as_str(), "acme-b2b.myshopify.com");
///
/// assert!(StoreName::parse("").is_err());
/// assert!(StoreName::parse("a|b").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct StoreName(String);

impl StoreName {
    /// Maximum length of a store name.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `StoreName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// 255 characters, or contains the `|` key separator.
    pub fn parse(s: &str) -> Result<Self, StoreNameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(StoreNameError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(StoreNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if trimmed.contains('|') {
            return Err(StoreNameError::ReservedCharacter('|'));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the store name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StoreName {
    type Err = StoreNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoreName {
    type Error = StoreNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreName> for String {
    fn from(store: StoreName) -> Self {
        store.0
    }
}

impl AsRef<str> for StoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for StoreName {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for StoreName {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for StoreName {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
