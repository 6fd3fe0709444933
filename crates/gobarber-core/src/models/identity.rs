use serde::{Deserialize, Deserializer, Serialize};

/// The authenticated user as returned by `/sessions`, `/profile` and
/// `/users/avatar`, and as persisted under the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    /// The backend sends `null` until the user uploads an avatar.
    #[serde(deserialize_with = "null_as_empty")]
    pub avatar_url: String,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar_url: avatar_url.into(),
        }
    }

    /// Check the structural invariants of an identity.
    /// Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.id.trim().is_empty() {
            return Err("id");
        }
        if self.name.trim().is_empty() {
            return Err("name");
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("email");
        }
        Ok(())
    }

    pub fn has_avatar(&self) -> bool {
        !self.avatar_url.is_empty()
    }

    /// First word of the display name, for greetings
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
