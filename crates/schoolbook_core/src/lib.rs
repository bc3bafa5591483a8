//! Core domain logic for the school record book.
//! This crate is the single source of truth for record invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod report;
pub mod service;

pub use config::{ConfigError, SchoolbookConfig, CONFIG_ENV_VAR};
pub use db::{open_db, open_db_in_memory, DbError};
pub use error::{NotFoundError, PermissionError, SchoolError, SchoolResult, ValidationError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::school::SchoolData;
pub use model::session::{CredentialTable, Role, Session};
pub use repo::kv_repo::{KvRepository, SqliteKvRepository, StorageError};
pub use repo::schema::SchemaError;
pub use repo::school_store::{SchoolStore, StoreKeys};
pub use service::auth_service::AuthService;
pub use service::school_service::{
    AdmitStudentRequest, FeeRequest, MarksEntry, MarksRequest, SchoolService, TeacherInput,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
