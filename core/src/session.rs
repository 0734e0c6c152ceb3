// cartsync/src/session.rs

//! Explicit session context injected into the API client and checkout.
//!
//! There is no login protocol here. A session is created from a credential
//! obtained elsewhere, optionally restored from and written through to
//! storage under the `token` and `user` keys.

use crate::storage::StorageHandle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Bearer token. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
  /// Returns `None` for a blank token.
  pub fn new(token: impl Into<String>) -> Option<Self> {
    let token = token.into();
    let trimmed = token.trim();
    (!trimmed.is_empty()).then(|| Credential(trimmed.to_string()))
  }

  pub fn token(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Credential(<redacted>)")
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub roles: Vec<Role>,
}

#[derive(Debug, Clone)]
pub struct Session {
  pub credential: Credential,
  pub user: Option<User>,
}

impl Session {
  pub fn new(credential: Credential) -> Self {
    Self { credential, user: None }
  }

  pub fn with_user(mut self, user: User) -> Self {
    self.user = Some(user);
    self
  }
}

struct SessionInner {
  state: RwLock<Option<Session>>,
  storage: Option<StorageHandle>,
}

/// Shared, cloneable handle to the current session (or its absence).
#[derive(Clone)]
pub struct SessionContext {
  inner: Arc<SessionInner>,
}

impl fmt::Debug for SessionContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SessionContext")
      .field("authenticated", &self.is_authenticated())
      .field("persistent", &self.inner.storage.is_some())
      .finish()
  }
}

impl Default for SessionContext {
  fn default() -> Self {
    Self::anonymous()
  }
}

impl SessionContext {
  pub fn anonymous() -> Self {
    Self::build(None, None)
  }

  pub fn signed_in(session: Session) -> Self {
    Self::build(Some(session), None)
  }

  /// Loads `token`/`user` from storage and writes later sign-in/sign-out back
  /// through the same handle. An undecodable user record is dropped; the
  /// token alone still authenticates.
  pub fn restore(storage: StorageHandle) -> Self {
    let credential = match storage.get(TOKEN_KEY) {
      Ok(raw) => raw.and_then(Credential::new),
      Err(e) => {
        warn!(error = %e, "Stored session token could not be read.");
        None
      }
    };
    let session = credential.map(|credential| {
      let user = match storage.get(USER_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<User>(&raw)
          .map_err(|e| warn!(error = %e, "Stored user record is invalid; ignoring it."))
          .ok(),
        Ok(None) => None,
        Err(e) => {
          warn!(error = %e, "Stored user record could not be read.");
          None
        }
      };
      Session { credential, user }
    });
    Self::build(session, Some(storage))
  }

  fn build(session: Option<Session>, storage: Option<StorageHandle>) -> Self {
    Self {
      inner: Arc::new(SessionInner {
        state: RwLock::new(session),
        storage,
      }),
    }
  }

  pub fn sign_in(&self, session: Session) {
    let user_name = session.user.as_ref().map(|u| u.name.clone());
    self.persist(Some(&session));
    *self.inner.state.write() = Some(session);
    info!(user = ?user_name, "Session established.");
  }

  /// Drops the session. Returns whether one was active.
  pub fn sign_out(&self) -> bool {
    let was_active = self.inner.state.write().take().is_some();
    if was_active {
      self.persist(None);
      info!("Session cleared.");
    }
    was_active
  }

  pub fn credential(&self) -> Option<Credential> {
    self.inner.state.read().as_ref().map(|s| s.credential.clone())
  }

  pub fn is_authenticated(&self) -> bool {
    self.inner.state.read().is_some()
  }

  pub fn user(&self) -> Option<User> {
    self.inner.state.read().as_ref().and_then(|s| s.user.clone())
  }

  pub fn is_admin(&self) -> bool {
    self
      .inner
      .state
      .read()
      .as_ref()
      .and_then(|s| s.user.as_ref())
      .is_some_and(|u| u.roles.iter().any(|r| r.name == "admin"))
  }

  fn persist(&self, session: Option<&Session>) {
    let Some(storage) = &self.inner.storage else {
      return;
    };
    let result = match session {
      Some(s) => storage.set(TOKEN_KEY, s.credential.token()).and_then(|()| match &s.user {
        Some(user) => match serde_json::to_string(user) {
          Ok(raw) => storage.set(USER_KEY, &raw),
          Err(e) => Err(crate::error::StorageError::Encode {
            key: USER_KEY.to_string(),
            message: e.to_string(),
          }),
        },
        None => storage.remove(USER_KEY),
      }),
      None => storage.remove(TOKEN_KEY).and_then(|()| storage.remove(USER_KEY)),
    };
    if let Err(e) = result {
      warn!(error = %e, "Session could not be written to storage.");
    }
  }
}
