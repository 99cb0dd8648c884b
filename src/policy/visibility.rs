use serde::{Deserialize, Serialize};

/// Two-state visibility of a persisted `can_display`-style flag.
///
/// Missing or non-boolean flags read as `Private`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    pub fn to_flag(self) -> bool {
        matches!(self, Visibility::Public)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn is_public(&self) -> bool {
        self.to_flag()
    }
}

impl From<bool> for Visibility {
    fn from(flag: bool) -> Self {
        Self::from_flag(Some(flag))
    }
}

impl From<Visibility> for bool {
    fn from(visibility: Visibility) -> Self {
        visibility.to_flag()
    }
}
