//! Clipboard capability and share-link delivery.

use yearplan_core::ClipboardError;

/// Write text to the host clipboard.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// How a share link reached the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The link is on the clipboard.
    Copied(String),
    /// Copy failed; the link has to be shown for manual copying.
    ManualCopy(String),
}

impl ShareOutcome {
    pub fn url(&self) -> &str {
        match self {
            ShareOutcome::Copied(url) | ShareOutcome::ManualCopy(url) => url,
        }
    }

    pub fn was_copied(&self) -> bool {
        matches!(self, ShareOutcome::Copied(_))
    }
}

/// Try the clipboard, falling back to manual copy on any failure.
pub fn deliver_link<C>(clipboard: &mut C, url: String) -> ShareOutcome
where
    C: ClipboardWriter + ?Sized,
{
    match clipboard.write_text(&url) {
        Ok(()) => {
            tracing::info!("Share link copied to clipboard");
            ShareOutcome::Copied(url)
        }
        Err(e) => {
            tracing::warn!("Failed to copy share link: {}", e);
            ShareOutcome::ManualCopy(url)
        }
    }
}

/// Clipboard for hosts without one. Every write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl ClipboardWriter for NoClipboard {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// Clipboard that keeps the last written text.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl ClipboardWriter for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl ClipboardWriter for Broken {
        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::WriteFailed("permission denied".into()))
        }
    }

    #[test]
    fn test_copied_when_clipboard_works() {
        let mut clipboard = MemoryClipboard::new();
        let outcome = deliver_link(&mut clipboard, "https://x.test/?calendar=a".into());
        assert!(outcome.was_copied());
        assert_eq!(clipboard.contents(), Some("https://x.test/?calendar=a"));
    }

    #[test]
    fn test_manual_copy_on_failure() {
        let outcome = deliver_link(&mut Broken, "https://x.test/".into());
        assert_eq!(outcome, ShareOutcome::ManualCopy("https://x.test/".into()));

        let outcome = deliver_link(&mut NoClipboard, "https://x.test/".into());
        assert!(!outcome.was_copied());
        assert_eq!(outcome.url(), "https://x.test/");
    }
}
