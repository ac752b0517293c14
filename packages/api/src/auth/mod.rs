//! Authentication: the provider seam, the session it produces, and a local provider.
//!
//! [`AuthProvider`] is what the app shell talks to. It signs users in and out and
//! publishes the current [`Session`] on a watch channel; the shell maps
//! `Some(session)` to the workspace and `None` to the welcome screen.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

mod local;
mod password;
mod session;

pub use local::{Identity, LocalAuth};
pub use password::{check_password, seal_password};
pub use session::{Provider, Session};

/// Errors from an auth provider. The display text is what users see.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The email address is badly formatted.")]
    InvalidEmail,
    #[error("Password should be at least {0} characters.")]
    WeakPassword(usize),
    #[error("The email address is already in use by another account.")]
    EmailInUse,
    #[error("There is no account for this email address.")]
    UserNotFound,
    #[error("The password is invalid.")]
    WrongPassword,
    #[error("The popup was closed before sign-in completed.")]
    PopupClosed,
    #[error("{0} does not support popup sign-in.")]
    UnsupportedProvider(Provider),
    #[error("Failed to hash password: {0}")]
    Hashing(String),
    #[error("The auth service is unavailable.")]
    Unavailable,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an email + password account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    /// Sign in through a third-party provider's popup.
    async fn sign_in_with_popup(&self, provider: Provider) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The current session, updated on every sign-in and sign-out.
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;
}
