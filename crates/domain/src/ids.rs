//! Strongly-typed identifiers for persisted records.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw database value.
            #[must_use]
            pub fn from_i64(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database value.
            #[must_use]
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier of an access grant row.
    GrantId
);

id_type!(
    /// Identifier of a principal, shared between the local shadow table
    /// and the external identity directory.
    PrincipalId
);

id_type!(
    /// Unique identifier of a reusable role template.
    RoleTemplateId
);
