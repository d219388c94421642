use thiserror::Error;

use crate::provider::DataSource;

/// Failure talking to an upstream weather source.
///
/// Out-of-range requests and client-side bad requests are not errors: they
/// yield an empty sequence instead.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{kind} request failed with status {status}: {reason}")]
    Upstream {
        kind: DataSource,
        status: u16,
        reason: String,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode {kind} response: {message}")]
    Decode { kind: DataSource, message: String },
}

impl SourceError {
    /// Text for the error panel shown above the retry action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { reason, .. } => reason.clone(),
            Self::Transport(_) => {
                "気象データの取得に失敗しました。ネットワーク接続を確認してください。".to_string()
            }
            Self::Decode { .. } => "気象データの形式が不正です。".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_carries_reason() {
        let err = SourceError::Upstream {
            kind: DataSource::Archive,
            status: 500,
            reason: "Internal failure".to_string(),
        };
        assert_eq!(err.user_message(), "Internal failure");
        assert!(err.to_string().contains("archive"));
        assert!(err.to_string().contains("500"));
    }
}
