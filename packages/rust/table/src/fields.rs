//! Primitive cell types used to declare a table schema.

use serde::{Deserialize, Serialize};

macro_rules! text_field {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_field!(
    /// Single line of free text.
    ShortText
);
text_field!(
    /// One option of a single-select column.
    SingleSelect
);
text_field!(
    /// URL column.
    Url
);
text_field!(
    /// Email column.
    Email
);
text_field!(
    /// Phone number column.
    Phone
);

/// Numeric column.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Number(pub f64);

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

/// Collaborator reference. Only `id` is needed on write; the service fills
/// in `email` and `name` on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl User {
    /// Reference an existing user by id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_serialize_as_plain_strings() {
        let json = serde_json::to_string(&Email::from("a@b.co")).unwrap();
        assert_eq!(json, r#""a@b.co""#);

        let parsed: SingleSelect = serde_json::from_str(r#""YouTube""#).unwrap();
        assert_eq!(parsed.as_str(), "YouTube");
    }

    #[test]
    fn number_is_transparent() {
        let json = serde_json::to_string(&Number(12.5)).unwrap();
        assert_eq!(json, "12.5");
    }

    #[test]
    fn user_reference_omits_unknown_parts() {
        let json = serde_json::to_value(User::with_id("usr1")).unwrap();
        assert_eq!(json, serde_json::json!({"id": "usr1"}));

        let user: User =
            serde_json::from_str(r#"{"id":"usr1","email":"x@y.z","name":"Sam Lee"}"#).unwrap();
        assert_eq!(user.name, "Sam Lee");
    }
}
