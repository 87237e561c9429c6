// Administrator credential checks

use crate::config::SqlscribeConfig;
use crate::error::{ConsoleError, ConsoleResult};
use subtle::ConstantTimeEq;

/// Cost used by `sqlscribe hash-password`
pub const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Longest password bcrypt looks at
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Decides whether a user name and password pair grants admin access
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, user: &str, password: &str) -> bool;
}

/// A single administrator account backed by a bcrypt hash
///
/// With no hash configured every login is refused.
#[derive(Clone)]
pub struct BcryptCredential {
    user: String,
    password_hash: Option<String>,
}

impl BcryptCredential {
    pub fn new(user: impl Into<String>, password_hash: Option<String>) -> Self {
        Self {
            user: user.into(),
            password_hash,
        }
    }

    pub fn from_config(config: &SqlscribeConfig) -> Self {
        Self::new(config.admin_user.clone(), config.admin_password_hash.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }
}

impl std::fmt::Debug for BcryptCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BcryptCredential")
            .field("user", &self.user)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialVerifier for BcryptCredential {
    fn verify(&self, user: &str, password: &str) -> bool {
        let Some(hash) = self.password_hash.as_deref() else {
            return false;
        };
        let user_ok: bool = self.user.as_bytes().ct_eq(user.as_bytes()).into();
        // hash even on a user mismatch so both paths cost the same
        let password_ok = match bcrypt::verify(password, hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("stored admin password hash is unusable: {}", e);
                false
            }
        };
        user_ok & password_ok
    }
}

/// Produce a bcrypt hash suitable for `admin_password_hash`
pub fn hash_password(password: &str, cost: u32) -> ConsoleResult<String> {
    if password.is_empty() {
        return Err(ConsoleError::validation("password", "must not be empty"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ConsoleError::validation(
            "password",
            format!("must be at most {} bytes", MAX_PASSWORD_LENGTH),
        ));
    }
    bcrypt::hash(password, cost).map_err(|e| ConsoleError::Auth(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> BcryptCredential {
        BcryptCredential::new("admin", Some(bcrypt::hash("admin123", 4).unwrap()))
    }

    #[test]
    fn test_verify() {
        let cred = credential();
        assert!(cred.verify("admin", "admin123"));
        assert!(!cred.verify("admin", "wrong"));
        assert!(!cred.verify("root", "admin123"));
        assert!(!cred.verify("", ""));
    }

    #[test]
    fn test_disabled_without_hash() {
        let cred = BcryptCredential::new("admin", None);
        assert!(!cred.is_enabled());
        assert!(!cred.verify("admin", ""));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let cred = BcryptCredential::new("admin", Some("not-a-hash".into()));
        assert!(!cred.verify("admin", "admin123"));
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("s3cret", 4).unwrap();
        assert!(bcrypt::verify("s3cret", &hash).unwrap());
        assert!(hash_password("", 4).is_err());
        assert!(hash_password(&"x".repeat(73), 4).is_err());
    }

    #[test]
    fn test_debug_hides_hash() {
        let out = format!("{:?}", credential());
        assert!(!out.contains("$2"));
        assert!(out.contains("<redacted>"));
    }
}
