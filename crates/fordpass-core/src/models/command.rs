//! Remote command payloads and the vendor's in-body status codes.
//!
//! Commands are asynchronous: the command request returns a `commandId`,
//! and completion is reported by a status sub-endpoint as a status code
//! embedded in the JSON body (not the HTTP status line).

use serde::Deserialize;

/// Vendor status code meaning the command is still pending
pub const STATUS_PENDING: i64 = 552;

/// Vendor status code meaning the command completed successfully
pub const STATUS_COMPLETED: i64 = 200;

/// Response to a command request; the id is tracked only for the duration
/// of the completion poll loop.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandResponse {
    #[serde(rename = "commandId")]
    pub command_id: String,
}

/// Classification of a command poll response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// 552 - still executing, poll again
    Pending,
    /// 200 - completed successfully
    Completed,
    /// Any other code - terminal failure
    Failed(i64),
}

impl CommandStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            STATUS_PENDING => CommandStatus::Pending,
            STATUS_COMPLETED => CommandStatus::Completed,
            other => CommandStatus::Failed(other),
        }
    }

    /// Whether the poll loop should stop on this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandStatus::Pending)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, CommandStatus::Completed)
    }
}
