//! App shell: which screen is showing, and the wiring between auth and the workspace.
//!
//! The shell follows the auth provider's session stream. A session opens a
//! [`Workspace`] (sidebar and editor bound to that user); no session shows the
//! welcome screen; before the first session event the app is loading.

use std::sync::Arc;
use std::time::Duration;

use api::settings::Settings;
use api::{AuthProvider, Cipher, CryptoError, NoteStore, Provider, Session};
use store::{Database, StoreError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::backend::make_database;
use crate::editor::Editor;
use crate::sidebar::Sidebar;
use crate::toast::Toasts;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Store(#[from] StoreError),
    #[error("invalid content key: {0}")]
    Crypto(#[from] CryptoError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Loading,
    Welcome,
    Workspace,
}

/// Everything that exists only while a user is signed in.
pub struct Workspace {
    pub session: Session,
    pub sidebar: Sidebar,
    pub editor: Editor,
}

pub struct App {
    auth: Arc<dyn AuthProvider>,
    db: Arc<dyn Database>,
    cipher: Cipher,
    save_delay: Duration,
    toasts: Toasts,
    sessions: watch::Receiver<Option<Session>>,
    loaded: bool,
    workspace: Option<Workspace>,
}

impl App {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        db: Arc<dyn Database>,
        cipher: Cipher,
        save_delay: Duration,
    ) -> Self {
        let sessions = auth.session_changes();
        Self {
            auth,
            db,
            cipher,
            save_delay,
            toasts: Toasts::new(),
            sessions,
            loaded: false,
            workspace: None,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, StartupError> {
        let db = make_database(settings)?;
        let cipher = settings.cipher()?;
        Ok(Self::new(auth, db, cipher, settings.save_debounce()))
    }

    /// Apply the provider's current session. Leaves the loading view.
    pub async fn start(&mut self) {
        let session = self.sessions.borrow_and_update().clone();
        self.apply_session(session).await;
    }

    /// Wait for the next sign-in or sign-out and apply it.
    ///
    /// Returns `false` once the provider is gone.
    pub async fn next_session_change(&mut self) -> bool {
        if self.sessions.changed().await.is_err() {
            return false;
        }
        let session = self.sessions.borrow_and_update().clone();
        self.apply_session(session).await;
        true
    }

    async fn sync_session(&mut self) {
        if self.sessions.has_changed().unwrap_or(false) {
            let session = self.sessions.borrow_and_update().clone();
            self.apply_session(session).await;
        }
    }

    async fn apply_session(&mut self, session: Option<Session>) {
        self.loaded = true;
        match session {
            Some(session) => {
                if let Some(workspace) = &mut self.workspace {
                    if workspace.session.uid == session.uid {
                        workspace.session = session;
                        return;
                    }
                }
                info!(uid = %session.uid, "opening workspace");
                let store = NoteStore::new(Arc::clone(&self.db), self.cipher.clone(), &session);
                let sidebar = Sidebar::new(store.clone(), self.toasts.clone()).await;
                let editor = Editor::new(store, self.toasts.clone(), self.save_delay);
                self.workspace = Some(Workspace {
                    session,
                    sidebar,
                    editor,
                });
            }
            None => {
                if self.workspace.take().is_some() {
                    info!("closed workspace");
                }
            }
        }
    }

    pub fn view(&self) -> View {
        match (&self.workspace, self.loaded) {
            (Some(_), _) => View::Workspace,
            (None, true) => View::Welcome,
            (None, false) => View::Loading,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.workspace.as_ref().map(|w| &w.session)
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn sidebar(&self) -> Option<&Sidebar> {
        self.workspace.as_ref().map(|w| &w.sidebar)
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.workspace.as_ref().map(|w| &w.editor)
    }

    pub fn active_note(&self) -> Option<String> {
        self.editor().and_then(Editor::note_id)
    }

    pub async fn sign_in_with_password(&mut self, email: &str, password: &str) -> bool {
        match self.auth.sign_in_with_password(email, password).await {
            Ok(_) => {
                self.toasts.success("Signed in successfully!");
                self.sync_session().await;
                true
            }
            Err(e) => {
                warn!(error = %e, "password sign-in failed");
                self.toasts.error(e.to_string());
                false
            }
        }
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> bool {
        match self.auth.sign_up(email, password).await {
            Ok(_) => {
                self.toasts.success("Account created successfully!");
                self.sync_session().await;
                true
            }
            Err(e) => {
                warn!(error = %e, "sign-up failed");
                self.toasts.error(e.to_string());
                false
            }
        }
    }

    pub async fn sign_in_with_popup(&mut self, provider: Provider) -> bool {
        match self.auth.sign_in_with_popup(provider).await {
            Ok(_) => {
                self.toasts.success("Welcome to Notepad!");
                self.sync_session().await;
                true
            }
            Err(e) => {
                warn!(%provider, error = %e, "popup sign-in failed");
                self.toasts.error("Failed to sign in");
                false
            }
        }
    }

    pub async fn sign_out(&mut self) -> bool {
        match self.auth.sign_out().await {
            Ok(()) => {
                self.toasts.success("Signed out successfully");
                self.sync_session().await;
                true
            }
            Err(e) => {
                warn!(error = %e, "sign-out failed");
                self.toasts.error("Failed to sign out");
                false
            }
        }
    }

    /// Open a note in the editor and close the mobile drawer.
    pub async fn select_note(&self, id: &str) {
        let Some(workspace) = &self.workspace else {
            return;
        };
        workspace.editor.open(Some(id)).await;
        workspace.sidebar.close();
    }

    /// A click on a note in the list: finishes a pending move, otherwise opens it.
    pub async fn click_note(&self, id: &str) {
        let Some(workspace) = &self.workspace else {
            return;
        };
        if workspace.sidebar.moving().is_some() {
            workspace.sidebar.drop_on_note(id).await;
        } else {
            self.select_note(id).await;
        }
    }

    pub async fn create_note(&self) -> Option<String> {
        let workspace = self.workspace.as_ref()?;
        let id = workspace.sidebar.create_note().await?;
        self.select_note(&id).await;
        Some(id)
    }

    pub async fn delete_note(&self, id: &str) -> bool {
        let Some(workspace) = &self.workspace else {
            return false;
        };
        let deleted = workspace.sidebar.delete_note(id).await;
        if deleted && workspace.editor.note_id().as_deref() == Some(id) {
            workspace.editor.open(None).await;
        }
        deleted
    }

    pub fn toggle_sidebar(&self) -> bool {
        self.sidebar().is_some_and(Sidebar::toggle)
    }
}
