//! Login/session use-case service.
//!
//! # Responsibility
//! - Match login input against the persisted credential table.
//! - Persist and clear the current session.
//!
//! # Invariants
//! - Name matching is case-insensitive; id and role match exactly.
//! - A failed login leaves any existing session untouched.

use crate::error::{required, PermissionError, SchoolResult};
use crate::model::session::{Role, Session};
use crate::repo::kv_repo::KvRepository;
use crate::repo::school_store::SchoolStore;
use log::{info, warn};

pub struct AuthService<R: KvRepository> {
    store: SchoolStore<R>,
}

impl<R: KvRepository> AuthService<R> {
    pub fn new(store: SchoolStore<R>) -> Self {
        Self { store }
    }

    /// Authenticates and persists the resulting session.
    ///
    /// # Errors
    /// - `ValidationError::BlankField` when name or id is blank.
    /// - `PermissionError::InvalidCredentials` when nothing matches.
    pub fn login(&self, name: &str, id: &str, role: Role) -> SchoolResult<Session> {
        let name = required("name", name)?;
        let id = required("id", id)?;
        let credentials = self.store.load_credentials()?;

        let Some(user) = credentials.authenticate(&name, &id, role) else {
            warn!("event=login module=auth status=error role={role} error_code=invalid_credentials");
            return Err(PermissionError::InvalidCredentials.into());
        };

        let session = Session {
            name: user.name.clone(),
            role: user.role,
            id: user.id.clone(),
        };
        self.store.set_session(&session)?;
        info!("event=login module=auth status=ok role={role}");
        Ok(session)
    }

    pub fn current_session(&self) -> SchoolResult<Option<Session>> {
        Ok(self.store.session()?)
    }

    /// Clears the persisted session. Idempotent.
    pub fn logout(&self) -> SchoolResult<()> {
        self.store.clear_session()?;
        info!("event=logout module=auth status=ok");
        Ok(())
    }
}
