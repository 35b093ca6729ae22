//! Newtype IDs for type-safe entity references.
//!
//! Two families of IDs live here:
//!
//! - [`define_id!`] wraps local `i32` keys (e.g. [`RoleId`]).
//! - [`define_gid!`] wraps Shopify global IDs (`gid://shopify/<Resource>/<n>`),
//!   which are opaque strings owned by Shopify.
//!
//! Keeping them as distinct types prevents passing a company ID where a
//! company location ID is expected, which is easy to do with raw strings.

use thiserror::Error;

/// Prefix shared by every Shopify global ID.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a Shopify global ID from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GidError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input is a GID for a different resource type.
    #[error("expected a {expected} id, got {actual}")]
    WrongResource {
        /// Resource the caller asked for.
        expected: &'static str,
        /// The rejected input.
        actual: String,
    },
    /// The input is neither a GID nor a bare numeric ID.
    #[error("id must be a Shopify GID or a numeric id, got {0}")]
    Malformed(String),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use b2b_portal_core::define_id;
/// define_id!(QuoteId);
/// define_id!(ListId);
///
/// let quote_id = QuoteId::new(1);
/// let list_id = ListId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: QuoteId = list_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

/// Macro to define a Shopify global ID wrapper.
///
/// Creates a newtype wrapper around `String` for the given Shopify resource
/// with the same derives as [`define_id!`], plus:
/// - `from_input()` accepting either a full GID or a bare numeric ID
/// - `numeric_id()` returning the trailing numeric segment
/// - `sqlx` `TEXT` mappings (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use b2b_portal_core::define_gid;
/// define_gid!(DraftOrderId, "DraftOrder");
///
/// let id = DraftOrderId::from_input("42").unwrap();
/// assert_eq!(id.as_str(), "gid://shopify/DraftOrder/42");
/// assert_eq!(id.numeric_id(), Some(42));
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Shopify resource name used in the GID path.
            pub const RESOURCE: &'static str = $resource;

            /// Wrap a GID string as returned by Shopify.
            #[must_use]
            pub fn new(gid: impl Into<String>) -> Self {
                Self(gid.into())
            }

            /// Parse user input that is either a full GID or a bare numeric ID.
            ///
            /// # Errors
            ///
            /// Returns `GidError` if the input is empty, names another
            /// resource, or is neither a GID nor a number.
            pub fn from_input(input: &str) -> Result<Self, $crate::types::id::GidError> {
                let input = input.trim();
                if input.is_empty() {
                    return Err($crate::types::id::GidError::Empty);
                }

                if let Some(rest) = input.strip_prefix($crate::types::id::GID_PREFIX) {
                    let resource = rest.split('/').next().unwrap_or_default();
                    if resource != $resource {
                        return Err($crate::types::id::GidError::WrongResource {
                            expected: $resource,
                            actual: input.to_owned(),
                        });
                    }
                    return Ok(Self(input.to_owned()));
                }

                if input.bytes().all(|b| b.is_ascii_digit()) {
                    return Ok(Self(format!(
                        "{}{}/{}",
                        $crate::types::id::GID_PREFIX,
                        $resource,
                        input
                    )));
                }

                Err($crate::types::id::GidError::Malformed(input.to_owned()))
            }

            /// Get the GID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the GID string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The trailing numeric segment of the GID, if it has one.
            #[must_use]
            pub fn numeric_id(&self) -> Option<u64> {
                self.0
                    .rsplit('/')
                    .next()
                    .and_then(|tail| tail.split('?').next())
                    .and_then(|digits| digits.parse().ok())
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(gid: String) -> Self {
                Self(gid)
            }
        }

        impl From<&str> for $name {
            fn from(gid: &str) -> Self {
                Self(gid.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let gid = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(gid))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(RoleId);

impl RoleId {
    /// Local role granted to any assignment whose Shopify role name contains "admin".
    pub const ADMIN: Self = Self::new(1);
    /// Local role granted to every other assignment.
    pub const MEMBER: Self = Self::new(2);
}

define_gid!(CustomerId, "Customer");
define_gid!(CompanyId, "Company");
define_gid!(CompanyLocationId, "CompanyLocation");
define_gid!(CompanyContactId, "CompanyContact");
define_gid!(RoleAssignmentId, "CompanyContactRoleAssignment");
