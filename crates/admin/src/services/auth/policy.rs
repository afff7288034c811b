//! Static allow-list of admin emails.

/// Decides which emails may become admins.
///
/// Matching is exact and case-sensitive: `Admin@x.com` and `admin@x.com` are
/// different entries. There are no wildcard or domain rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    emails: Vec<String>,
}

impl AuthorizationPolicy {
    /// Create a policy allowing exactly `emails`.
    #[must_use]
    pub const fn new(emails: Vec<String>) -> Self {
        Self { emails }
    }

    /// Whether `email` is on the allow-list.
    #[must_use]
    pub fn is_allowed(&self, email: &str) -> bool {
        self.emails.iter().any(|allowed| allowed == email)
    }

    /// Whether nobody is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Number of allowed emails.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }
}
