//! User Repository
//!
//! Console accounts with a salted secret digest.

use rusqlite::{params, Connection};

use crate::domain::{Credentials, DomainError, DomainResult, User};
use super::db::{now_millis, SharedConnection};

const SECRET_CONTEXT: &str = "phrasebank 2024-01-01 console secret";

pub struct UserRepository {
    conn: SharedConnection,
}

impl UserRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Register an account; the identifier must be unused
    pub async fn create_user(&self, credentials: &Credentials) -> DomainResult<User> {
        let identifier = credentials
            .validate()
            .map_err(|e| DomainError::InvalidInput(e.message().to_string()))?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        if find_secret(conn, &identifier)?.is_some() {
            return Err(DomainError::Conflict(format!("Account {} already exists", identifier)));
        }

        let now = now_millis();
        let salt = make_salt(&identifier, now);
        conn.execute(
            "INSERT INTO users (identifier, salt, secret_hash, created_at) VALUES (?, ?, ?, ?)",
            params![identifier, salt, digest(&salt, &credentials.secret).to_hex().to_string(), now],
        )?;

        let id = conn.last_insert_rowid() as u32;
        log::info!("Registered account {}", identifier);
        Ok(User { id, identifier })
    }

    /// The account matching both identifier and secret
    pub async fn verify_credentials(&self, credentials: &Credentials) -> DomainResult<User> {
        let identifier = credentials.validate()?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let rejected = || DomainError::Unauthorized("Invalid email or password".into());
        let (id, salt, stored) = find_secret(conn, &identifier)?.ok_or_else(rejected)?;
        let stored = blake3::Hash::from_hex(&stored).map_err(|e| DomainError::Internal(e.to_string()))?;

        // blake3::Hash equality is constant-time
        if digest(&salt, &credentials.secret) != stored {
            log::warn!("Failed sign-in for {}", identifier);
            return Err(rejected());
        }
        Ok(User { id, identifier })
    }
}

fn find_secret(conn: &Connection, identifier: &str) -> DomainResult<Option<(u32, String, String)>> {
    let mut stmt = conn.prepare("SELECT id, salt, secret_hash FROM users WHERE identifier = ?")?;
    let mut rows = stmt.query(params![identifier])?;
    let found = match rows.next()? {
        Some(row) => Some((row.get(0)?, row.get(1)?, row.get(2)?)),
        None => None,
    };
    Ok(found)
}

/// Format: blake3(identifier|created_ms|process id)
fn make_salt(identifier: &str, now: i64) -> String {
    let input = format!("{}|{}|{}", identifier, now, std::process::id());
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

fn digest(salt: &str, secret: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(SECRET_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_depends_on_salt() {
        assert_eq!(digest("a", "secret"), digest("a", "secret"));
        assert_ne!(digest("a", "secret"), digest("b", "secret"));
        assert_ne!(make_salt("x@y.z", 1), make_salt("x@y.z", 2));
    }
}
