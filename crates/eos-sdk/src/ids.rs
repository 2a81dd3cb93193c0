//! Account and game-service identifiers.
//!
//! Both identity spaces use 32 lowercase hex digits as their textual form.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the textual form of an id.
pub const ID_LENGTH: usize = 32;

/// Error returned when parsing an id from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("Invalid id length: expected {ID_LENGTH}, got {0}")]
    Length(usize),

    #[error("Invalid id character: {0:?}")]
    Character(char),
}

fn validate(s: &str) -> Result<String, IdError> {
    if s.len() != ID_LENGTH {
        return Err(IdError::Length(s.len()));
    }
    if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(IdError::Character(c));
    }
    Ok(s.to_ascii_lowercase())
}

fn generate() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an id from its textual form.
            pub fn from_string(s: &str) -> Result<Self, IdError> {
                validate(s).map(Self)
            }

            /// Allocate a fresh random id.
            pub fn generate() -> Self {
                Self(generate())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_string(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_type!(
    /// Account-level identity, established by the auth interface.
    EpicAccountId
);

id_type!(
    /// Game-service identity, established by the connect interface.
    ProductUserId
);

/// Opaque token returned by a connect login for an unknown user.
///
/// Passed back to `create_user` to create the game-service user.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContinuanceToken(String);

impl ContinuanceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContinuanceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContinuanceToken(..)")
    }
}
