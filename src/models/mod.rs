//! Datastore model types.

mod package;
mod resource;

pub use package::*;
pub use resource::*;

/// Serde helpers for loosely typed datastore fields.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept a string or a number (the datastore is not consistent about
    /// version fields) and keep it as a string.
    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }
}
