//! Planner domain model: months, day annotations, snapshots and share tokens.

pub mod config;
pub mod date_cell;
pub mod error;
pub mod month_range;
pub mod palette;
pub mod share;
pub mod snapshot;

pub use config::{Config, LoggingConfig, ShareConfig, ValidationResult};
pub use date_cell::{date_key, DateCellData, DateCells, StackedDateCells};
pub use error::{
    AppError, ClipboardError, ConfigError, ParseError, StorageError, ValidationError,
};
pub use month_range::{DateInterval, MonthPointer, MonthRange, Months};
pub use palette::{CalendarView, ColorCode, ColorTexture, TextureCode};
pub use share::DecodeError;
pub use snapshot::{StoredData, STORAGE_VERSION};

/// Initialize logging.
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Year planner core initialized");
}
