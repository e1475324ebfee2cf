use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the player, asset and chat boundaries.
///
/// Internal plumbing works with `anyhow::Error`; the source chain is kept in
/// the `#[source]` field so `{:#}` formatting still shows the decoder or
/// network cause.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The path could not be opened or decoded as a video source.
    #[error("video source unavailable: {path}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A detector asset (weights, network config, class list) is absent or unreadable.
    #[error("detector asset missing: {}", path.display())]
    AssetMissing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A frame could not be read from an open source. The player treats this as end-of-stream.
    #[error("frame {index} could not be read")]
    FrameReadFailure {
        index: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The outbound chat-completion call failed. Never retried.
    #[error("external call failed")]
    ExternalCallFailure(#[source] anyhow::Error),
}

impl PlaybackError {
    pub fn source_unavailable(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn asset_missing(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::AssetMissing {
            path: path.into(),
            source,
        }
    }
}
