//! User and Session
//!
//! Console accounts. A session exists only while someone is signed in.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use super::entity::{DomainError, DomainResult, Entity};

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("identifier pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    /// Sign-in identifier (email address)
    pub identifier: String,
}

impl Entity for User {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Signed-in state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: u32,
    pub identifier: String,
    pub signed_in_at: i64,
}

/// Identifier + secret as typed on the login form
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Trimmed identifier; rejects malformed addresses and empty secrets
    pub fn validate(&self) -> DomainResult<String> {
        let identifier = self.identifier.trim();
        if !IDENTIFIER_RE.is_match(identifier) {
            return Err(DomainError::Unauthorized("Enter a valid email address".into()));
        }
        if self.secret.is_empty() {
            return Err(DomainError::Unauthorized("Enter your password".into()));
        }
        Ok(identifier.to_lowercase())
    }
}
