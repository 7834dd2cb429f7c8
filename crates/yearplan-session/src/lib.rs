//! The interactive planner session and its host-facing edges: clipboard
//! sharing, drag painting and file transfer.

pub mod clipboard;
pub mod controller;
pub mod drag;
pub mod transfer;

pub use clipboard::{deliver_link, ClipboardWriter, MemoryClipboard, NoClipboard, ShareOutcome};
pub use controller::{CalendarController, StorageNotice};
pub use drag::DragState;
pub use transfer::{apply_import, parse_import, ExportDocument};
