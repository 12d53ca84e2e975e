//! Commands for sign-in state
//!
//! One session per process; every route except the login page needs it.

use crate::domain::{Credentials, DomainResult, Session, User};
use crate::repository::now_millis;
use crate::AppState;

pub async fn sign_in(state: &AppState, identifier: String, secret: String) -> DomainResult<Session> {
    let user = state
        .user_repo
        .verify_credentials(&Credentials::new(identifier, secret))
        .await?;

    let session = Session {
        user_id: user.id,
        identifier: user.identifier,
        signed_in_at: now_millis(),
    };
    *state.session.lock().await = Some(session.clone());
    log::info!("Signed in as {}", session.identifier);
    Ok(session)
}

pub async fn sign_out(state: &AppState) {
    if let Some(session) = state.session.lock().await.take() {
        log::info!("Signed out {}", session.identifier);
    }
}

pub async fn current_session(state: &AppState) -> Option<Session> {
    state.session.lock().await.clone()
}

/// Seed an account
pub async fn register_user(state: &AppState, identifier: String, secret: String) -> DomainResult<User> {
    state
        .user_repo
        .create_user(&Credentials::new(identifier, secret))
        .await
}
