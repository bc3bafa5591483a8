//! School document store over a key/value repository.
//!
//! # Responsibility
//! - Load the school document, seeding defaults on first run.
//! - Persist the document, credential table and session under their keys.
//!
//! # Invariants
//! - `load` returns a fully linked graph (see
//!   `SchoolData::reconcile_class_links`).
//! - `save` never mutates the caller's graph; failure leaves storage as it
//!   was before the call.
//! - `save(load())` followed by `load()` yields an equal graph.

use super::kv_repo::{KvRepository, StorageResult};
use super::schema::{upgrade_document, SchemaError, LATEST_DOCUMENT_VERSION};
use crate::error::SchoolResult;
use crate::model::school::SchoolData;
use crate::model::session::{CredentialTable, Session, CREDENTIAL_TABLE_VERSION};
use log::{info, warn};

/// Storage keys for the three persisted documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub data: String,
    pub session: String,
    pub credentials: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            data: "schoolData_v4".to_string(),
            session: "currentUser".to_string(),
            credentials: "credentials".to_string(),
        }
    }
}

pub struct SchoolStore<R: KvRepository> {
    repo: R,
    keys: StoreKeys,
}

impl<R: KvRepository> SchoolStore<R> {
    pub fn new(repo: R) -> Self {
        Self::with_keys(repo, StoreKeys::default())
    }

    pub fn with_keys(repo: R, keys: StoreKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Loads the full record graph.
    ///
    /// Seeds and persists the default dataset when nothing is stored yet.
    /// Older or damaged documents are repaired in memory; the repair is
    /// persisted by the next `save`.
    pub fn load(&self) -> SchoolResult<SchoolData> {
        let Some(text) = self.repo.get(&self.keys.data)? else {
            let seeded = SchoolData::seeded(LATEST_DOCUMENT_VERSION);
            self.save(&seeded)?;
            info!(
                "event=store_seed module=repo status=ok students={} classes={}",
                seeded.students.len(),
                seeded.classes.len()
            );
            return Ok(seeded);
        };

        let upgraded = upgrade_document(&text)?;
        let from_version = upgraded.from_version;
        let migrated = upgraded.migrated();
        let mut data = upgraded.data;
        let relinked = data.reconcile_class_links();
        if migrated || relinked > 0 {
            info!(
                "event=store_repair module=repo status=ok from_version={} to_version={} relinked={}",
                from_version, data.schema_version, relinked
            );
        }
        Ok(data)
    }

    /// Persists the whole graph as one document.
    pub fn save(&self, data: &SchoolData) -> StorageResult<()> {
        let text = serde_json::to_string(data)?;
        self.repo.put(&self.keys.data, &text)
    }

    /// Persists the graph and credential table in one write.
    pub fn save_with_credentials(
        &self,
        data: &SchoolData,
        credentials: &CredentialTable,
    ) -> StorageResult<()> {
        let data_text = serde_json::to_string(data)?;
        let credentials_text = serde_json::to_string(credentials)?;
        self.repo.put_many(&[
            (self.keys.data.as_str(), data_text.as_str()),
            (self.keys.credentials.as_str(), credentials_text.as_str()),
        ])
    }

    /// Loads the credential table, falling back to the seeded demo users.
    pub fn load_credentials(&self) -> SchoolResult<CredentialTable> {
        let Some(text) = self.repo.get(&self.keys.credentials)? else {
            return Ok(CredentialTable::default());
        };
        let table: CredentialTable = serde_json::from_str(&text)
            .map_err(|err| SchemaError::Malformed(format!("credential table: {err}")))?;
        if table.version > CREDENTIAL_TABLE_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: table.version,
                latest: CREDENTIAL_TABLE_VERSION,
            }
            .into());
        }
        Ok(table)
    }

    /// Returns the persisted session, if any.
    ///
    /// An unreadable session entry is treated as logged out.
    pub fn session(&self) -> StorageResult<Option<Session>> {
        let Some(text) = self.repo.get(&self.keys.session)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&text) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!("event=session_read module=repo status=error error_code=invalid_session error={err}");
                Ok(None)
            }
        }
    }

    pub fn set_session(&self, session: &Session) -> StorageResult<()> {
        let text = serde_json::to_string(session)?;
        self.repo.put(&self.keys.session, &text)
    }

    pub fn clear_session(&self) -> StorageResult<()> {
        self.repo.remove(&self.keys.session)
    }
}
