use crate::models::application::ApplicationStatus;
use tracing::warn;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("'{0}' is not a known application status")]
    UnknownStatus(String),
}

/// Outcome of a validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The application already has the requested status.
    Unchanged(ApplicationStatus),
    Moved {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

impl Transition {
    pub fn target(&self) -> ApplicationStatus {
        match self {
            Transition::Unchanged(status) => *status,
            Transition::Moved { to, .. } => *to,
        }
    }
}

/// Validate a requested status change.
///
/// Any known state may follow any other; only membership in the known set
/// is enforced. Leaving a terminal state is allowed but logged.
pub fn validate_transition(
    current: ApplicationStatus,
    requested: &str,
) -> Result<Transition, WorkflowError> {
    let target: ApplicationStatus = requested.parse().map_err(WorkflowError::UnknownStatus)?;

    if target == current {
        return Ok(Transition::Unchanged(current));
    }

    if current.is_terminal() {
        warn!(from = %current, to = %target, "Application leaves a terminal status");
    }

    Ok(Transition::Moved {
        from: current,
        to: target,
    })
}
