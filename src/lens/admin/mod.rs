//! Administrator gate
//!
//! Table drops require a logged-in administrator and an explicit
//! confirmation. Login state is per session and starts logged out.

mod credentials;

pub use credentials::{
    hash_password, BcryptCredential, CredentialVerifier, BCRYPT_COST, MAX_PASSWORD_LENGTH,
};

use crate::database::{quote_identifier, sanitize_identifier, SchemaStore};
use crate::error::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};

/// Administrator login state of one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSession {
    #[default]
    LoggedOut,
    LoggedIn,
}

impl AdminSession {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, AdminSession::LoggedIn)
    }
}

/// What a drop request did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "table")]
pub enum DropOutcome {
    Dropped(String),
    /// Not confirmed, nothing happened
    Skipped,
}

pub struct AdminGate<'a> {
    store: &'a SchemaStore,
    verifier: &'a dyn CredentialVerifier,
}

impl<'a> AdminGate<'a> {
    pub fn new(store: &'a SchemaStore, verifier: &'a dyn CredentialVerifier) -> Self {
        Self { store, verifier }
    }

    /// Check credentials; a rejected login always leaves `session` logged out,
    /// even if it was logged in before
    pub fn login(&self, session: &mut AdminSession, user: &str, password: &str) -> ConsoleResult<()> {
        if self.verifier.verify(user, password) {
            *session = AdminSession::LoggedIn;
            tracing::info!("administrator logged in");
            Ok(())
        } else {
            *session = AdminSession::LoggedOut;
            tracing::warn!("failed administrator login for user '{}'", user);
            Err(ConsoleError::Auth("Invalid credentials".to_string()))
        }
    }

    pub fn drop_table(
        &self,
        session: &AdminSession,
        table: &str,
        confirmed: bool,
    ) -> ConsoleResult<DropOutcome> {
        if !session.is_logged_in() {
            tracing::warn!("drop of '{}' refused: not logged in", table);
            return Err(ConsoleError::Auth(
                "Administrator login required".to_string(),
            ));
        }
        if !confirmed {
            return Ok(DropOutcome::Skipped);
        }

        let table = sanitize_identifier("table name", table.trim())?;
        self.store
            .execute_ddl(&format!("DROP TABLE {}", quote_identifier(table)))?;
        tracing::info!("dropped table {}", table);
        Ok(DropOutcome::Dropped(table.to_string()))
    }

    pub fn logout(&self, session: &mut AdminSession) {
        *session = AdminSession::LoggedOut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> BcryptCredential {
        BcryptCredential::new("admin", Some(bcrypt::hash("admin123", 4).unwrap()))
    }

    fn store() -> SchemaStore {
        let store = SchemaStore::open_in_memory().unwrap();
        store.execute_ddl(r#"CREATE TABLE "t" ("a" TEXT)"#).unwrap();
        store
    }

    #[test]
    fn test_login_states() {
        let store = store();
        let verifier = verifier();
        let gate = AdminGate::new(&store, &verifier);
        let mut session = AdminSession::default();

        let err = gate.login(&mut session, "admin", "nope").unwrap_err();
        assert!(matches!(err, ConsoleError::Auth(_)));
        assert_eq!(session, AdminSession::LoggedOut);

        gate.login(&mut session, "admin", "admin123").unwrap();
        assert_eq!(session, AdminSession::LoggedIn);

        gate.logout(&mut session);
        assert_eq!(session, AdminSession::LoggedOut);
        gate.logout(&mut session);
        assert_eq!(session, AdminSession::LoggedOut);
    }

    #[test]
    fn test_failed_login_logs_out() {
        let store = store();
        let verifier = verifier();
        let gate = AdminGate::new(&store, &verifier);
        let mut session = AdminSession::LoggedIn;
        assert!(gate.login(&mut session, "admin", "bad").is_err());
        assert_eq!(session, AdminSession::LoggedOut);
    }

    #[test]
    fn test_drop_requires_login() {
        let store = store();
        let verifier = verifier();
        let gate = AdminGate::new(&store, &verifier);
        let err = gate
            .drop_table(&AdminSession::LoggedOut, "t", true)
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Auth(_)));
        assert!(store.table_exists("t").unwrap());
    }

    #[test]
    fn test_unconfirmed_drop_is_noop() {
        let store = store();
        let verifier = verifier();
        let gate = AdminGate::new(&store, &verifier);
        let outcome = gate.drop_table(&AdminSession::LoggedIn, "t", false).unwrap();
        assert_eq!(outcome, DropOutcome::Skipped);
        assert!(store.table_exists("t").unwrap());
    }

    #[test]
    fn test_confirmed_drop() {
        let store = store();
        let verifier = verifier();
        let gate = AdminGate::new(&store, &verifier);
        let outcome = gate.drop_table(&AdminSession::LoggedIn, "t", true).unwrap();
        assert_eq!(outcome, DropOutcome::Dropped("t".into()));
        assert!(store.list_tables().unwrap().is_empty());

        let err = gate
            .drop_table(&AdminSession::LoggedIn, "t", true)
            .unwrap_err();
        assert!(matches!(err, ConsoleError::SqlExecution(_)));
    }

    #[test]
    fn test_drop_rejects_unsafe_name() {
        let store = store();
        let verifier = verifier();
        let gate = AdminGate::new(&store, &verifier);
        let err = gate
            .drop_table(&AdminSession::LoggedIn, "t\"; --", true)
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));
    }
}
