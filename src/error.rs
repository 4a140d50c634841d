//! Error types for the taskwall engine.

/// Top-level error type for the display engine.
#[derive(Debug, thiserror::Error)]
pub enum WallError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board service error surfaced by an aggregation.
    #[error("deck error: {0}")]
    Deck(#[from] taskwall_deck::DeckError),

    /// Board selection store error (read, parse, write).
    #[error("selection error: {0}")]
    Selection(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, WallError>;

#[cfg(test)]
mod tests {
    use super::*;
    use taskwall_deck::DeckError;

    #[test]
    fn display_prefixes_are_stable() {
        assert_eq!(
            WallError::Config("bad".into()).to_string(),
            "config error: bad"
        );
        assert_eq!(
            WallError::Selection("corrupt".into()).to_string(),
            "selection error: corrupt"
        );
    }

    #[test]
    fn deck_errors_convert() {
        let err: WallError = DeckError::Status {
            status: 503,
            message: "maintenance".into(),
        }
        .into();
        assert_eq!(err.to_string(), "deck error: service returned 503: maintenance");
    }

    #[test]
    fn io_errors_convert() {
        let err: WallError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, WallError::Io(_)));
    }
}
