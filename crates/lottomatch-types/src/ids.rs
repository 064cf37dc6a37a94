//! Globally unique identifiers used throughout LottoMatch.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting, so a
//! `BTreeMap` keyed by any of them iterates in creation order.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a lottery product (a "lotto type").
    ProductId,
    "product"
);

uuid_id!(
    /// Identifier of a betting round.
    RoundId,
    "round"
);

uuid_id!(
    /// Identifier of a submitted bill.
    BillId,
    "bill"
);

uuid_id!(
    /// Identifier of one submitted line inside a bill.
    BillEntryId,
    "entry"
);

uuid_id!(
    /// Identifier of a single (number, style) wager.
    BetItemId,
    "item"
);

uuid_id!(
    /// Unique identifier for a betting user account.
    UserId,
    "user"
);

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A user role name (e.g. `"agent"`, `"admin"`), used for role exemptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller on whose behalf a submission is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn new(user_id: UserId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: Role::new(role),
        }
    }
}
