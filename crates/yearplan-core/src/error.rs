//! Centralized error types for the planner.
//!
//! Every boundary (storage, URL, clipboard, file import) maps its failures
//! into one of these enums. None of them is meant to reach the user as a
//! crash: callers log the technical `Display` form and show `user_message()`.

use thiserror::Error;

use crate::share::DecodeError;

/// Top-level application error type.
///
/// All planner errors convert into this type. Use `user_message()` to get a
/// UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Recover the domain error behind an `anyhow` chain, falling back to
    /// `Other` when none of the planner's error types is found.
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ConfigError>() {
            Ok(e) => return AppError::Config(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ParseError>() {
            Ok(e) => return AppError::Parse(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ValidationError>() {
            Ok(e) => return AppError::Validation(e),
            Err(err) => err,
        };
        let err = match err.downcast::<StorageError>() {
            Ok(e) => return AppError::Storage(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ClipboardError>() {
            Ok(e) => return AppError::Clipboard(e),
            Err(err) => err,
        };
        match err.downcast::<std::io::Error>() {
            Ok(e) => AppError::Io(e),
            Err(err) => AppError::Other(err),
        }
    }

    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Parse(e) => e.user_message(),
            AppError::Validation(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Clipboard(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred.",
        }
    }
}

/// Malformed input: stored JSON, month tokens, share tokens, import files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid month pointer value: {0}")]
    MonthToken(String),

    #[error("Stored data under '{key}' is malformed: {message}")]
    StoredJson { key: String, message: String },

    #[error("Share token could not be decoded: {0}")]
    ShareToken(#[from] DecodeError),

    #[error("Import file is invalid: {0}")]
    ImportFile(String),
}

impl ParseError {
    pub fn stored_json(key: impl Into<String>, message: impl ToString) -> Self {
        ParseError::StoredJson {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ParseError::MonthToken(_) => "That month could not be read.",
            ParseError::StoredJson { .. } => "Saved data could not be read. Defaults are in use.",
            ParseError::ShareToken(_) => "The shared calendar link is damaged and was ignored.",
            ParseError::ImportFile(_) => "Invalid data file format.",
        }
    }
}

/// Well-formed input that falls outside what the planner accepts.
///
/// These are never shown to the user; the prior valid value is kept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Month {month} of year {year} is outside 0..=11")]
    MonthOutOfRange { year: i32, month: i32 },

    #[error("Year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Unknown color or texture: {0}")]
    UnknownColorTexture(String),
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::MonthOutOfRange { .. } | ValidationError::YearOutOfRange(_) => {
                "That month is not available."
            }
            ValidationError::UnknownView(_) => "That view is not available.",
            ValidationError::UnknownColorTexture(_) => "That color or texture is not available.",
        }
    }
}

/// Durable key-value store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read '{key}': {message}")]
    Read { key: String, message: String },

    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    #[error("Failed to remove '{key}': {message}")]
    Remove { key: String, message: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn read(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Read {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn write(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Write {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn remove(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Remove {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Read { .. } => "Saved data could not be loaded. Defaults are in use.",
            StorageError::Write { .. } | StorageError::Remove { .. } | StorageError::Unavailable(_) => {
                "Changes could not be saved locally and may be lost on reload. Export your data to keep it."
            }
        }
    }
}

/// Clipboard write failures. Always recovered by showing the raw link.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable")]
    Unavailable,

    #[error("Clipboard write failed: {0}")]
    WriteFailed(String),
}

impl ClipboardError {
    pub fn user_message(&self) -> &'static str {
        "Copy failed, copy the link manually."
    }
}

/// Config file failures. Raised by `Config::load*` and `Config::save_to`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory is available on this system")]
    NoConfigDir,

    #[error("Failed to access configuration file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn io(path: &std::path::Path, message: impl ToString) -> Self {
        ConfigError::Io {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NoConfigDir => "No configuration directory found. Pass --config.",
            ConfigError::Io { .. } => "The configuration file could not be read or written.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = ValidationError::UnknownView("Grid".into()).into();
        assert!(matches!(err, AppError::Validation(ValidationError::UnknownView(_))));
    }

    #[test]
    fn test_storage_message_recommends_export() {
        let err = AppError::Storage(StorageError::write("calendar_registry", "quota exceeded"));
        assert!(err.user_message().contains("Export"));
    }

    #[test]
    fn test_display_keeps_technical_detail() {
        let err = StorageError::write("calendar_data", "quota exceeded");
        assert_eq!(err.to_string(), "Failed to write 'calendar_data': quota exceeded");
    }

    #[test]
    fn test_classify_finds_error_behind_context() {
        use anyhow::Context;

        let result: Result<(), ValidationError> =
            Err(ValidationError::UnknownView("Grid".into()));
        let err = result.context("Failed to select view").unwrap_err();
        let app = AppError::classify(err);
        assert!(matches!(app, AppError::Validation(ValidationError::UnknownView(_))));
        assert_eq!(app.user_message(), "That view is not available.");
    }

    #[test]
    fn test_classify_config_and_fallback() {
        let app = AppError::classify(ConfigError::ParseError("line 1".into()).into());
        assert!(matches!(app, AppError::Config(ConfigError::ParseError(_))));

        let app = AppError::classify(anyhow::anyhow!("No calendar with id 'x'"));
        assert!(matches!(app, AppError::Other(_)));
        assert_eq!(app.user_message(), "An unexpected error occurred.");
    }

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            AppError::Parse(ParseError::MonthToken("x".into())),
            AppError::Validation(ValidationError::YearOutOfRange(i32::MAX)),
            AppError::Clipboard(ClipboardError::Unavailable),
            AppError::Config(ConfigError::Invalid("x".into())),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
