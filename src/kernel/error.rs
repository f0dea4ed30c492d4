use crate::tools::{ParamType, ToolError};

/// Everything that can stop a task from completing.
///
/// All variants except `ToolInvocationFailure` are raised before any tool runs.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown task: '{0}'")]
    UnknownTask(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Missing required argument '{param}' for task '{task}'")]
    MissingArgument { task: String, param: String },

    #[error("Invalid value '{value}' for argument '{param}' of task '{task}' (expected {expected})")]
    InvalidArgument {
        task: String,
        param: String,
        expected: ParamType,
        value: String,
    },

    #[error("Task '{task}' failed: {source}")]
    ToolInvocationFailure {
        task: String,
        #[source]
        source: ToolError,
    },
}

impl DispatchError {
    /// Process exit code for flag-driven mode.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ToolInvocationFailure { .. } => 1,
            Self::UnknownTask(_)
            | Self::ToolNotFound(_)
            | Self::MissingArgument { .. }
            | Self::InvalidArgument { .. } => 2,
        }
    }

    /// Corrective hint shown under the error.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::UnknownTask(_) | Self::ToolNotFound(_) => {
                Some("Run with `--task list` to see the available tasks.".to_string())
            }
            Self::MissingArgument { param, .. } => {
                Some(format!("Supply it with its flag or `--arg {param}=<value>`."))
            }
            Self::InvalidArgument { param, expected, .. } => {
                Some(format!("'{param}' takes a value of type {expected}."))
            }
            Self::ToolInvocationFailure { .. } => None,
        }
    }

    /// Whether the caller should show the tool listing as a recovery aid.
    pub fn wants_listing(&self) -> bool {
        matches!(self, Self::UnknownTask(_) | Self::ToolNotFound(_))
    }
}
