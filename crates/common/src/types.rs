use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mints a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier carries no token.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

opaque_id! {
    /// Scopes exactly one synchronous request/response interaction.
    ///
    /// Minted by the gateway once per call and never reused. The token is
    /// opaque: callers may hand back any string they were given.
    CorrelationId
}

opaque_id! {
    /// Scopes one end-to-end workflow instance.
    ///
    /// Minted by the participant when it issues work and threaded through
    /// every stage of the saga.
    ExecutionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
        assert_ne!(ExecutionId::new(), ExecutionId::new());
    }

    #[test]
    fn arbitrary_tokens_are_accepted() {
        let id = ExecutionId::from("exec-1");
        assert_eq!(id.as_str(), "exec-1");
        assert_eq!(id.to_string(), "exec-1");
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = CorrelationId::from("C1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"C1\"");
        let back: CorrelationId = serde_json::from_str("\"C1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn empty_token_is_detected() {
        assert!(ExecutionId::from("").is_empty());
        assert!(!ExecutionId::new().is_empty());
    }
}
