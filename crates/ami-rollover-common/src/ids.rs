//! Opaque identifier newtypes
//!
//! These prevent accidentally passing an image id where an instance id is
//! expected. None of them is ever parsed or constructed by the deploy logic;
//! they are assigned or discovered by the provider.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::Deref,
            derive_more::From,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// Machine image identifier (e.g. `ami-12345`)
    ImageId
);

string_id!(
    /// Instance identifier assigned by the provider at launch (e.g. `i-01fb1e7`)
    InstanceId
);

string_id!(
    /// Name of a classic load balancer
    LoadBalancerName
);

/// Render a list of instance ids as `[i-1, i-2]` for messages and progress lines
pub fn display_ids(ids: &[InstanceId]) -> String {
    let joined: Vec<&str> = ids.iter().map(InstanceId::as_str).collect();
    format!("[{}]", joined.join(", "))
}
