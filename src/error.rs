//! Error taxonomy for the story client.
//!
//! Poller errors never reach the player: they are logged and folded into the
//! retry loop. Save-store errors are always surfaced through a notification
//! whose text comes from [`ClientError::save_message_key`] or
//! [`ClientError::load_message_key`].

/// Failures of the key-value storage primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The write would exceed the browser's storage budget.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Storage could not be reached at all (private mode, disabled, no window).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other rejected write.
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// Main client error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or non-success HTTP status.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The server answered but the body could not be parsed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The image URL was handed back but the resource could not be loaded.
    #[error("image failed to load: {0}")]
    ImageLoadFailure(String),

    /// The server refused to produce a session snapshot.
    #[error("snapshot failed: {0}")]
    SnapshotError(String),

    /// The server refused to restore a saved snapshot.
    #[error("restore failed: {0}")]
    RestoreError(String),

    /// The save collection no longer fits into local storage.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Any storage failure other than quota exhaustion.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// No save record with the given id.
    #[error("save not found: {0}")]
    NotFound(String),

    /// Page bootstrap data could not be decoded.
    #[error("bootstrap data invalid: {0}")]
    BootstrapParseError(String),

    /// Configuration rejected by validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded => ClientError::QuotaExceeded,
            other => ClientError::StorageFailure(other.to_string()),
        }
    }
}

impl ClientError {
    /// Whether the failure happened on the way to or from the server, as
    /// opposed to inside the browser.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkFailure(_) | ClientError::MalformedResponse(_)
        )
    }

    /// Localization key of the player-facing message for a failed save.
    #[must_use]
    pub fn save_message_key(&self) -> &'static str {
        match self {
            ClientError::QuotaExceeded => "save.error.quota",
            ClientError::SnapshotError(_) => "save.error.snapshot",
            e if e.is_transport() => "save.error.network",
            _ => "save.error.storage",
        }
    }

    /// Localization key of the player-facing message for a failed load.
    #[must_use]
    pub fn load_message_key(&self) -> &'static str {
        match self {
            ClientError::NotFound(_) => "load.not_found",
            e if e.is_transport() => "load.error.network",
            _ => "load.error",
        }
    }
}
