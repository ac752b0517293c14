//! In-process auth provider.
//!
//! Accounts live in memory; passwords are stored as Argon2id PHC strings.
//! Popup sign-in resolves against the identities registered per provider with
//! [`LocalAuth::register_identity`], which stand in for the account the user
//! would pick in the provider's popup. An unregistered provider behaves like a
//! popup closed by the user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::password::{check_password, seal_password};
use super::{AuthError, AuthProvider, Provider, Session};

const MIN_PASSWORD_LEN: usize = 6;

/// A third-party account offered by a provider's popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug)]
struct Account {
    uid: String,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    identities: HashMap<Provider, Identity>,
    federated: HashMap<(Provider, String), String>,
    offline: bool,
}

#[derive(Clone, Debug)]
pub struct LocalAuth {
    accounts: Arc<Mutex<Accounts>>,
    session: Arc<watch::Sender<Option<Session>>>,
}

impl Default for LocalAuth {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Arc::new(Mutex::new(Accounts::default())),
            session: Arc::new(session),
        }
    }
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `identity` the account chosen in `provider`'s popup.
    pub fn register_identity(&self, provider: Provider, identity: Identity) {
        self.accounts
            .lock()
            .unwrap()
            .identities
            .insert(provider, identity);
    }

    /// Simulate the auth service being unreachable.
    pub fn set_online(&self, online: bool) {
        self.accounts.lock().unwrap().offline = !online;
    }

    pub fn current(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn establish(&self, session: Session) -> Session {
        info!(uid = %session.uid, provider = %session.provider, "signed in");
        self.session.send_replace(Some(session.clone()));
        session
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }
        let password_hash = seal_password(password)?;

        let uid = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.offline {
                return Err(AuthError::Unavailable);
            }
            if accounts.by_email.contains_key(&email) {
                return Err(AuthError::EmailInUse);
            }
            let uid = Uuid::new_v4().simple().to_string();
            accounts.by_email.insert(
                email.clone(),
                Account {
                    uid: uid.clone(),
                    password_hash,
                },
            );
            uid
        };

        Ok(self.establish(Session {
            uid,
            email,
            display_name: None,
            photo_url: None,
            provider: Provider::Password,
        }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        let (uid, password_hash) = {
            let accounts = self.accounts.lock().unwrap();
            if accounts.offline {
                return Err(AuthError::Unavailable);
            }
            let account = accounts
                .by_email
                .get(&email)
                .ok_or(AuthError::UserNotFound)?;
            (account.uid.clone(), account.password_hash.clone())
        };

        check_password(password, &password_hash)?;

        Ok(self.establish(Session {
            uid,
            email,
            display_name: None,
            photo_url: None,
            provider: Provider::Password,
        }))
    }

    async fn sign_in_with_popup(&self, provider: Provider) -> Result<Session, AuthError> {
        if !provider.is_federated() {
            return Err(AuthError::UnsupportedProvider(provider));
        }
        let session = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.offline {
                return Err(AuthError::Unavailable);
            }
            let identity = accounts
                .identities
                .get(&provider)
                .cloned()
                .ok_or(AuthError::PopupClosed)?;
            // Returning users keep their uid, and with it their notes
            let uid = accounts
                .federated
                .entry((provider, identity.email.clone()))
                .or_insert_with(|| Uuid::new_v4().simple().to_string())
                .clone();
            Session {
                uid,
                email: identity.email,
                display_name: identity.display_name,
                photo_url: identity.photo_url,
                provider,
            }
        };
        Ok(self.establish(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.accounts.lock().unwrap().offline {
            return Err(AuthError::Unavailable);
        }
        self.session.send_replace(None);
        info!("signed out");
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
