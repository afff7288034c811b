//! Salted one-way hashing for session secrets.

use thiserror::Error;

/// Errors from hashing or verifying a secret.
#[derive(Debug, Error)]
pub enum HashError {
    /// The hash library rejected the input (secret of 72 bytes or more,
    /// cost out of range, malformed stored hash).
    #[error("hash computation failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    /// The blocking hash task panicked or was cancelled.
    #[error("hash task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// bcrypt-based credential hasher.
///
/// Every call to [`hash`](Self::hash) draws a fresh salt, so hashing the same
/// secret twice yields different outputs. Use [`verify`](Self::verify) to
/// compare; never compare hashes as strings.
///
/// bcrypt at cost 14 takes on the order of a second, so both operations run
/// on the blocking thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// Production work factor.
    pub const DEFAULT_COST: u32 = 14;

    /// Create a hasher with the given bcrypt cost.
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// The configured bcrypt cost.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `secret` with a random salt.
    ///
    /// # Errors
    ///
    /// Returns `HashError::Bcrypt` if the secret is 72 bytes or longer (bcrypt
    /// counts its NUL terminator against the 72-byte limit) or the cost is
    /// invalid.
    pub async fn hash(&self, secret: &str) -> Result<String, HashError> {
        let secret = secret.to_owned();
        let cost = self.cost;
        let hashed =
            tokio::task::spawn_blocking(move || bcrypt::non_truncating_hash(secret, cost)).await??;
        Ok(hashed)
    }

    /// Check `candidate` against a hash produced by [`hash`](Self::hash).
    ///
    /// Returns `Ok(false)` on mismatch.
    ///
    /// # Errors
    ///
    /// Returns `HashError::Bcrypt` if `hashed` is not a valid bcrypt hash or the
    /// candidate is 72 bytes or longer.
    pub async fn verify(&self, hashed: &str, candidate: &str) -> Result<bool, HashError> {
        let hashed = hashed.to_owned();
        let candidate = candidate.to_owned();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::non_truncating_verify(candidate, &hashed))
                .await??;
        Ok(matches)
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_verifies() {
        let hasher = CredentialHasher::new(TEST_COST);
        let hashed = hasher.hash("108234567890").await.unwrap();

        assert!(hasher.verify(&hashed, "108234567890").await.unwrap());
        assert!(!hasher.verify(&hashed, "108234567891").await.unwrap());
        assert!(!hasher.verify(&hashed, "").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_is_salted() {
        let hasher = CredentialHasher::new(TEST_COST);
        let first = hasher.hash("pid1").await.unwrap();
        let second = hasher.hash("pid1").await.unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify(&first, "pid1").await.unwrap());
        assert!(hasher.verify(&second, "pid1").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_embeds_cost() {
        let hashed = CredentialHasher::new(TEST_COST).hash("pid1").await.unwrap();
        assert!(hashed.starts_with("$2b$04$"));
    }

    #[tokio::test]
    async fn test_overlong_secret_is_rejected() {
        let hasher = CredentialHasher::new(TEST_COST);
        let result = hasher.hash(&"x".repeat(72)).await;
        assert!(matches!(result, Err(HashError::Bcrypt(_))));
    }

    #[tokio::test]
    async fn test_longest_secret_round_trips() {
        let hasher = CredentialHasher::new(TEST_COST);
        let secret = "x".repeat(71);
        let hashed = hasher.hash(&secret).await.unwrap();
        assert!(hasher.verify(&hashed, &secret).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_error() {
        let hasher = CredentialHasher::new(TEST_COST);
        let result = hasher.verify("not-a-bcrypt-hash", "pid1").await;
        assert!(matches!(result, Err(HashError::Bcrypt(_))));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(CredentialHasher::default().cost(), 14);
    }
}
