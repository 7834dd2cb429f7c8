//! Persistence for the year planner: storage capabilities, schema migration
//! and the multi-calendar registry.

pub mod id;
pub mod kv;
pub mod location;
pub mod migrate;
pub mod registry;

pub use id::{generate_calendar_id, CALENDAR_ID_LEN};
pub use kv::{FileStore, KeyValueStore, MemoryStore, LEGACY_STORAGE_KEY, REGISTRY_STORAGE_KEY};
pub use location::{LinkParams, LocationState, MemoryLocation, CALENDAR_PARAM, DATA_PARAM};
pub use migrate::{normalize_stored_data, upgrade, CalendarDocument, SchemaVersion};
pub use registry::{CalendarEntry, CalendarRegistry, CalendarSummary, LoadedRegistry, LOCAL_LABEL};
