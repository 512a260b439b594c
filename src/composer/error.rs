use thiserror::Error;

use crate::{api::ApiError, composer::schedule::ScheduleError};

/// Problems caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Add text or image")]
    EmptyDraft,
    #[error("Select at least one VK group or Telegram channel from the list")]
    NoDestination,
    #[error("Enter group ID and access token")]
    MissingVkGroup,
    #[error("Enter channel ID")]
    MissingTgChannel,
    #[error("Publishing is already in progress")]
    Busy,
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Connection error: {0}")]
    Connection(#[from] ApiError),
    #[error("Publishing error:\n{0}")]
    Publish(String),
    #[error("Scheduling error:\n{0}")]
    Schedule(String),
    #[error("Delete error: {0}")]
    Delete(String),
    #[error("Error: {0}")]
    Save(String),
}

impl From<ScheduleError> for ComposerError {
    fn from(e: ScheduleError) -> Self {
        Self::Validation(e.into())
    }
}

impl ComposerError {
    /// True for errors raised before any request went out.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
