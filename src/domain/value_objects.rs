use serde::{Deserialize, Serialize};

/// Bearer token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(pub String);

impl AuthToken {
    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens never end up in logs.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Newtype for backend resource paths (`apartment`, `clients`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceName(pub &'static str);

impl ResourceName {
    /// Every resource the CLI can list, in menu order.
    pub const ALL: &'static [&'static str] = &[
        "apartment",
        "land",
        "commercial",
        "clients",
        "deals",
        "views",
        "user",
        "metro",
        "district",
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim_matches('/');
        Self::ALL.iter().find(|r| **r == s).map(|r| ResourceName(r))
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
