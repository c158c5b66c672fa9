use serde::{Deserialize, Serialize};

pub const ADMINISTRATOR: &str = "Administrator";

/// The identity every operation acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: String,
}

impl Actor {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    pub fn is_administrator(&self) -> bool {
        self.user == ADMINISTRATOR
    }
}
