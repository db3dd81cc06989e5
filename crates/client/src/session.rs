//! Session state: the auth token provider.
//!
//! The session is process-wide state with a lifecycle governed solely by
//! three events: sign-in, sign-out, and an unauthorized response from any
//! backend service. Every remote call site reads the token through here
//! (via [`crate::transport::Transport`]); none of them stores its own copy.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;
use tokio::sync::watch;

/// Where the session currently stands, for observers such as a login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No credentials; nothing has gone wrong.
    #[default]
    SignedOut,
    /// A token is present.
    SignedIn,
    /// A backend rejected the token; credentials were discarded and the
    /// user must sign in again.
    LoginRequired,
}

/// Minimal identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
}

struct Credentials {
    token: SecretString,
    user: Option<UserProfile>,
}

/// Holds the current session credential and broadcasts lifecycle changes.
///
/// Cheaply cloneable; all clones share the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    credentials: RwLock<Option<Credentials>>,
    events: watch::Sender<AuthState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = watch::channel(AuthState::SignedOut);
        Self {
            inner: Arc::new(SessionInner {
                credentials: RwLock::new(None),
                events,
            }),
        }
    }

    /// Install credentials after a successful login.
    pub fn sign_in(&self, token: SecretString, user: Option<UserProfile>) {
        *self.write() = Some(Credentials { token, user });
        self.inner.events.send_replace(AuthState::SignedIn);
    }

    /// Discard credentials at the user's request.
    pub fn sign_out(&self) {
        *self.write() = None;
        self.inner.events.send_replace(AuthState::SignedOut);
    }

    /// Invalidate the session because a backend answered 401.
    ///
    /// Idempotent: several in-flight calls may all receive 401 for the same
    /// dead token, but only the first one transitions the state and signals
    /// observers. The call sites themselves never implement this policy -
    /// it lives here and in the transport, nowhere else.
    pub fn on_unauthorized(&self) {
        let mut credentials = self.write();
        if credentials.take().is_some() {
            drop(credentials);
            tracing::warn!("session invalidated by unauthorized response");
            self.inner.events.send_replace(AuthState::LoginRequired);
        }
    }

    /// The current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|c| c.token.clone())
    }

    /// True iff a token is present. No server-side expiry check is made.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// The signed-in user's profile, if one was recorded at sign-in.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.read().as_ref().and_then(|c| c.user.clone())
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        *self.inner.events.borrow()
    }

    /// Subscribe to lifecycle changes (e.g. to present a login surface on
    /// [`AuthState::LoginRequired`]).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.events.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Credentials>> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
