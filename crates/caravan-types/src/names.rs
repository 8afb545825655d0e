//! Type-safe name wrappers around [`String`].
//!
//! Cities, resources and facilities are identified by their unique names.
//! Each gets its own newtype so a resource name can never be passed where a
//! city name is expected. All names serialize transparently as plain strings,
//! which keeps the ledger wire encoding a nested JSON object keyed by name.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a name from anything string-like.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_name! {
    /// Unique name of a city (node in the world graph).
    CityName
}

define_name! {
    /// Unique name of a resource such as `Wood` or `Iron`.
    ResourceName
}

define_name! {
    /// Unique identifier of a production or consumption facility.
    FacilityId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_against_str() {
        let city = CityName::new("City1");
        assert_eq!(city, "City1");
        assert_eq!(city.as_str(), "City1");
        assert_eq!(city.to_string(), "City1");
    }

    #[test]
    fn names_order_lexicographically() {
        let mut names = vec![CityName::from("City3"), CityName::from("City1"), CityName::from("City2")];
        names.sort();
        let sorted: Vec<&str> = names.iter().map(CityName::as_str).collect();
        assert_eq!(sorted, vec!["City1", "City2", "City3"]);
    }

    #[test]
    fn names_serialize_as_plain_strings() {
        let resource = ResourceName::new("Wood");
        let json = serde_json::to_string(&resource).unwrap();
        assert_eq!(json, "\"Wood\"");

        let back: ResourceName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resource);
    }
}
