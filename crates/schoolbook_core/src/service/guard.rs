//! Role gates and outcome logging shared by services.

use crate::error::{PermissionError, SchoolResult};
use crate::model::session::{Role, Session};
use log::{info, warn};
use std::time::Instant;

pub(crate) fn require_role(
    session: &Session,
    action: &'static str,
    allowed: &[Role],
) -> Result<(), PermissionError> {
    if allowed.contains(&session.role) {
        return Ok(());
    }
    Err(PermissionError::Denied {
        action,
        role: session.role,
    })
}

pub(crate) fn require_principal(
    session: &Session,
    action: &'static str,
) -> Result<(), PermissionError> {
    require_role(session, action, &[Role::Principal])
}

/// Emits one `event=<event>` line for the finished action and passes the
/// result through unchanged.
pub(crate) fn log_outcome<T>(
    event: &'static str,
    session: &Session,
    started_at: Instant,
    result: SchoolResult<T>,
) -> SchoolResult<T> {
    match &result {
        Ok(_) => info!(
            "event={event} module=service status=ok role={} duration_ms={}",
            session.role,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error role={} duration_ms={} error_code={} error={}",
            session.role,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}
