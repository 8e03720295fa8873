/// Screens that need a signed-in operator.
pub const PROTECTED: &[&str] = &[
    "/apartment",
    "/land",
    "/commercial",
    "/clients",
    "/deals",
    "/views",
    "/users",
    "/metro",
    "/district",
    "/changes",
    "/accounting",
    "/dashboard",
];

/// Protected screens that are hidden entirely from anonymous visitors.
pub const SUPERUSER_ONLY: &[&str] = &["/users", "/metro", "/district", "/changes"];

pub const LOGIN: &str = "/login";
pub const HOME: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectLogin,
    /// Redirect to the home screen (signed-in operator opening `/login`).
    RedirectHome,
    NotFound,
}

impl GuardDecision {
    /// Where the navigation should end up, if not on `path` itself.
    pub fn location(&self) -> Option<&'static str> {
        match self {
            GuardDecision::Allow | GuardDecision::NotFound => None,
            GuardDecision::RedirectLogin => Some(LOGIN),
            GuardDecision::RedirectHome => Some(HOME),
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}

/// Decide what happens when `path` is opened with or without a token.
pub fn guard(path: &str, has_token: bool) -> GuardDecision {
    if matches_prefix(path, LOGIN) {
        return if has_token {
            GuardDecision::RedirectHome
        } else {
            GuardDecision::Allow
        };
    }
    if has_token || !PROTECTED.iter().any(|p| matches_prefix(path, p)) {
        return GuardDecision::Allow;
    }
    if SUPERUSER_ONLY.iter().any(|p| matches_prefix(path, p)) {
        GuardDecision::NotFound
    } else {
        GuardDecision::RedirectLogin
    }
}
