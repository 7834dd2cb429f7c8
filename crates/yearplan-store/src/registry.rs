//! The multi-calendar registry.
//!
//! One profile keeps any number of calendars: exactly one local calendar
//! (`local_id`) plus any calendars received through share links. The whole
//! registry is written to [`REGISTRY_STORAGE_KEY`] after every change, and
//! the local calendar is mirrored to [`LEGACY_STORAGE_KEY`] so older builds
//! still find it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use yearplan_core::{share, ParseError, StorageError, StoredData};

use crate::id::generate_calendar_id;
use crate::kv::{KeyValueStore, LEGACY_STORAGE_KEY, REGISTRY_STORAGE_KEY};
use crate::location::{self, LinkParams, LocationState};
use crate::migrate::normalize_stored_data;

/// Label shown for the local calendar.
pub const LOCAL_LABEL: &str = "My calendar";

/// One calendar and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub data: StoredData,
    /// Received through a share link rather than created on this profile.
    pub external: bool,
    pub last_updated: DateTime<Utc>,
}

impl CalendarEntry {
    fn new(id: impl Into<String>, data: StoredData, external: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            data,
            external,
            last_updated: now,
        }
    }
}

/// What a calendar picker shows for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub id: String,
    pub label: String,
    pub external: bool,
    pub last_updated: DateTime<Utc>,
    pub is_current: bool,
}

/// Every calendar known to this profile.
///
/// Invariants, once [`CalendarRegistry::load`] has run: `calendars` always
/// holds an entry for `local_id`, that entry is never external, and
/// `current_id` always names an existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRegistry {
    current_id: String,
    local_id: String,
    calendars: BTreeMap<String, CalendarEntry>,
}

/// Result of [`CalendarRegistry::load`].
#[derive(Debug)]
pub struct LoadedRegistry {
    pub registry: CalendarRegistry,
    /// Data of the calendar that ended up current.
    pub active: StoredData,
    pub summaries: Vec<CalendarSummary>,
    /// Set when the initial write-back failed. The registry is still usable.
    pub storage_error: Option<StorageError>,
    /// Id of a calendar imported from the page's share parameters.
    pub shared_import: Option<String>,
}

impl CalendarRegistry {
    /// Registry holding only a local calendar with `data`.
    pub fn seeded(data: StoredData, now: DateTime<Utc>) -> Self {
        let local_id = generate_calendar_id();
        let mut calendars = BTreeMap::new();
        calendars.insert(
            local_id.clone(),
            CalendarEntry::new(local_id.clone(), data, false, now),
        );
        Self {
            current_id: local_id.clone(),
            local_id,
            calendars,
        }
    }

    /// Lenient parse of a stored registry blob.
    ///
    /// Only JSON that fails to parse, or isn't an object, is an error.
    /// Everything else is repaired: a blank `localId` gets a new id, entries
    /// are migrated to the current schema, and a bad `lastUpdated` becomes
    /// `now`. `currentId` is kept as stored even when it names no entry, and
    /// the local entry may be missing; [`CalendarRegistry::load`] seeds the
    /// local calendar and points a dangling `currentId` back at it.
    pub fn parse(raw: &str, fallback_year: i32, now: DateTime<Utc>) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ParseError::stored_json(REGISTRY_STORAGE_KEY, e))?;
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::stored_json(REGISTRY_STORAGE_KEY, "expected an object"))?;

        let local_id = object
            .get("localId")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                tracing::warn!("Stored registry has no local calendar id, generating one");
                generate_calendar_id()
            });

        let mut calendars = BTreeMap::new();
        if let Some(stored) = object.get("calendars").and_then(Value::as_object) {
            for (id, entry) in stored {
                if id.is_empty() || !entry.is_object() {
                    tracing::debug!("Skipping malformed calendar entry '{}'", id);
                    continue;
                }
                // early registries stored the data fields directly on the entry
                let data = entry.get("data").filter(|d| d.is_object()).unwrap_or(entry);
                let external = entry
                    .get("external")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
                    && *id != local_id;
                let last_updated = entry
                    .get("lastUpdated")
                    .and_then(Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or(now);

                calendars.insert(
                    id.clone(),
                    CalendarEntry::new(
                        id.clone(),
                        normalize_stored_data(data, fallback_year),
                        external,
                        last_updated,
                    ),
                );
            }
        }

        let current_id = object
            .get("currentId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            current_id,
            local_id,
            calendars,
        })
    }

    /// Bring the registry up for a page load.
    ///
    /// Reads the stored registry (or builds one from the legacy key or
    /// defaults), applies the page's `calendar`/`data` parameters, and writes
    /// the result back. Read and parse failures degrade to defaults; a
    /// failed write is reported in [`LoadedRegistry::storage_error`].
    pub fn load<S, L>(store: &S, location: &mut L, fallback_year: i32) -> LoadedRegistry
    where
        S: KeyValueStore + ?Sized,
        L: LocationState + ?Sized,
    {
        let now = Utc::now();
        let legacy = read_legacy(store, fallback_year);

        let stored = read_raw(store, REGISTRY_STORAGE_KEY).and_then(|raw| {
            match Self::parse(&raw, fallback_year, now) {
                Ok(registry) => Some(registry),
                Err(e) => {
                    tracing::warn!("Ignoring stored calendar registry: {}", e);
                    None
                }
            }
        });

        let mut registry = match stored {
            Some(mut registry) => {
                registry.ensure_local_entry(legacy, fallback_year, now);
                registry
            }
            None => {
                tracing::info!("Creating calendar registry");
                Self::seeded(
                    legacy.unwrap_or_else(|| StoredData::defaults(fallback_year)),
                    now,
                )
            }
        };

        let params = LinkParams::from_href(&location.href());
        let mut shared_import = None;

        if let Some((id, data)) = shared_calendar(&params, fallback_year) {
            registry.import_shared(&id, data, now);
            if let Some(href) = location::with_calendar_param(&location.href(), &id) {
                location.replace_href(&href);
            }
            tracing::info!("Imported shared calendar '{}'", id);
            shared_import = Some(id);
        } else if let Some(requested) = params
            .calendar
            .as_deref()
            .filter(|id| registry.calendars.contains_key(*id))
        {
            registry.current_id = requested.to_string();
        } else {
            registry.heal_current();
        }

        let storage_error = registry.persist(store).err();
        let active = registry
            .active_data()
            .cloned()
            .unwrap_or_else(|| StoredData::defaults(fallback_year));

        LoadedRegistry {
            summaries: registry.list_summaries(),
            registry,
            active,
            storage_error,
            shared_import,
        }
    }

    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEntry> {
        self.calendars.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.calendars.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CalendarEntry> {
        self.calendars.values()
    }

    pub fn active_entry(&self) -> Option<&CalendarEntry> {
        self.calendars
            .get(&self.current_id)
            .or_else(|| self.calendars.get(&self.local_id))
    }

    pub fn active_data(&self) -> Option<&StoredData> {
        self.active_entry().map(|entry| &entry.data)
    }

    /// Make `id` current and point the page address at it.
    ///
    /// Returns `Ok(false)` without touching anything when `id` is unknown.
    /// On `Err` the switch has still happened in memory.
    pub fn switch_calendar<S, L>(
        &mut self,
        id: &str,
        store: &S,
        location: &mut L,
    ) -> Result<bool, StorageError>
    where
        S: KeyValueStore + ?Sized,
        L: LocationState + ?Sized,
    {
        if !self.calendars.contains_key(id) {
            tracing::debug!("Ignoring switch to unknown calendar '{}'", id);
            return Ok(false);
        }

        self.current_id = id.to_string();
        if let Some(href) = location::with_calendar_param(&location.href(), id) {
            location.replace_href(&href);
        }
        tracing::info!("Switched to calendar '{}'", id);

        self.persist(store)?;
        Ok(true)
    }

    /// Replace `id`'s data after an edit, make it current and persist.
    ///
    /// An unknown id is registered as external. On `Err` the change is kept
    /// in memory.
    pub fn record_mutation<S>(
        &mut self,
        id: &str,
        data: StoredData,
        store: &S,
    ) -> Result<(), StorageError>
    where
        S: KeyValueStore + ?Sized,
    {
        let external = if id == self.local_id {
            false
        } else {
            self.calendars.get(id).map_or(true, |entry| entry.external)
        };

        self.calendars.insert(
            id.to_string(),
            CalendarEntry::new(id, data, external, Utc::now()),
        );
        self.current_id = id.to_string();

        self.persist(store)
    }

    /// Local calendar first, then the rest newest first.
    pub fn list_summaries(&self) -> Vec<CalendarSummary> {
        let mut entries: Vec<&CalendarEntry> = self.calendars.values().collect();
        entries.sort_by(|a, b| {
            let a_local = a.id == self.local_id;
            let b_local = b.id == self.local_id;
            match (a_local, b_local) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => b
                    .last_updated
                    .cmp(&a.last_updated)
                    .then_with(|| a.id.cmp(&b.id)),
            }
        });

        entries
            .into_iter()
            .map(|entry| CalendarSummary {
                id: entry.id.clone(),
                label: self.label_for(&entry.id),
                external: entry.external,
                last_updated: entry.last_updated,
                is_current: entry.id == self.current_id,
            })
            .collect()
    }

    fn label_for(&self, id: &str) -> String {
        if id == self.local_id {
            LOCAL_LABEL.to_string()
        } else {
            format!("Shared {}", id.chars().take(6).collect::<String>())
        }
    }

    /// Write the registry, then mirror the local calendar to the legacy key.
    ///
    /// Both writes are attempted; the first failure is returned.
    pub fn persist<S>(&self, store: &S) -> Result<(), StorageError>
    where
        S: KeyValueStore + ?Sized,
    {
        let mut first_error = None;

        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(e) = store.set(REGISTRY_STORAGE_KEY, &json) {
                    first_error = Some(e);
                }
            }
            Err(e) => first_error = Some(StorageError::write(REGISTRY_STORAGE_KEY, e)),
        }

        if let Some(local) = self.calendars.get(&self.local_id) {
            let mirrored = serde_json::to_string(&local.data)
                .map_err(|e| StorageError::write(LEGACY_STORAGE_KEY, e))
                .and_then(|json| store.set(LEGACY_STORAGE_KEY, &json));
            if let Err(e) = mirrored {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                tracing::error!("Failed to persist calendar registry: {}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Remove the legacy mirror key.
    pub fn clear_legacy_mirror<S>(store: &S) -> Result<(), StorageError>
    where
        S: KeyValueStore + ?Sized,
    {
        store.remove(LEGACY_STORAGE_KEY).map_err(|e| {
            tracing::error!("Failed to clear legacy calendar data: {}", e);
            e
        })
    }

    fn ensure_local_entry(
        &mut self,
        legacy: Option<StoredData>,
        fallback_year: i32,
        now: DateTime<Utc>,
    ) {
        if let Some(entry) = self.calendars.get_mut(&self.local_id) {
            entry.external = false;
            return;
        }

        tracing::info!("Seeding missing local calendar '{}'", self.local_id);
        let data = legacy.unwrap_or_else(|| StoredData::defaults(fallback_year));
        self.calendars.insert(
            self.local_id.clone(),
            CalendarEntry::new(self.local_id.clone(), data, false, now),
        );
    }

    fn heal_current(&mut self) {
        if !self.calendars.contains_key(&self.current_id) {
            if !self.current_id.is_empty() {
                tracing::warn!(
                    "Current calendar '{}' is missing, falling back to local",
                    self.current_id
                );
            }
            self.current_id = self.local_id.clone();
        }
    }

    fn import_shared(&mut self, id: &str, data: StoredData, now: DateTime<Utc>) {
        let external = id != self.local_id;
        self.calendars
            .insert(id.to_string(), CalendarEntry::new(id, data, external, now));
        self.current_id = id.to_string();
    }
}

fn read_raw<S>(store: &S, key: &str) -> Option<String>
where
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to read '{}': {}", key, e);
            None
        }
    }
}

fn read_legacy<S>(store: &S, fallback_year: i32) -> Option<StoredData>
where
    S: KeyValueStore + ?Sized,
{
    let raw = read_raw(store, LEGACY_STORAGE_KEY)?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) if value.is_object() => Some(normalize_stored_data(&value, fallback_year)),
        Ok(_) => {
            tracing::warn!("Ignoring legacy calendar data: expected an object");
            None
        }
        Err(e) => {
            tracing::warn!(
                "Ignoring legacy calendar data: {}",
                ParseError::stored_json(LEGACY_STORAGE_KEY, e)
            );
            None
        }
    }
}

/// The calendar carried by `calendar=<id>&data=<token>`, if both are present
/// and the token decodes to an object.
fn shared_calendar(params: &LinkParams, fallback_year: i32) -> Option<(String, StoredData)> {
    let id = params.calendar.as_deref()?.trim();
    let token = params.data.as_deref()?;

    match share::decode(token) {
        Ok(value) if value.is_object() => {
            Some((id.to_string(), normalize_stored_data(&value, fallback_year)))
        }
        Ok(_) => {
            tracing::warn!("Ignoring shared calendar '{}': payload is not an object", id);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to parse shared calendar from URL: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::location::MemoryLocation;
    use chrono::TimeZone;
    use serde_json::json;
    use yearplan_core::{CalendarView, ColorCode, ColorTexture, DateCells};

    const BASE: &str = "https://planner.test/";

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }

    fn painted(year: i32) -> StoredData {
        let mut data = StoredData::defaults(year);
        data.date_cells = DateCells::new().toggle_tool(
            &format!("{}-0-1", year),
            ColorTexture::Color(ColorCode::Blue),
        );
        data
    }

    #[test]
    fn test_fresh_load() {
        let store = MemoryStore::new();
        let mut location = MemoryLocation::new(BASE);

        let loaded = CalendarRegistry::load(&store, &mut location, 2025);
        let registry = &loaded.registry;

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.current_id(), registry.local_id());
        assert_eq!(registry.local_id().len(), 12);
        assert!(!registry.get(registry.local_id()).unwrap().external);
        assert_eq!(loaded.active, StoredData::defaults(2025));
        assert!(loaded.active.date_cells.is_empty());
        assert_eq!(loaded.active.selected_view, CalendarView::Linear);
        assert_eq!(loaded.active.selected_color_texture, ColorTexture::default());
        assert!(loaded.storage_error.is_none());
        assert!(store.contains_key(REGISTRY_STORAGE_KEY));
        assert!(store.contains_key(LEGACY_STORAGE_KEY));
        assert!(location.replacements().is_empty());
    }

    #[test]
    fn test_reload_keeps_local_id() {
        let store = MemoryStore::new();
        let mut location = MemoryLocation::new(BASE);
        let first = CalendarRegistry::load(&store, &mut location, 2025);
        let second = CalendarRegistry::load(&store, &mut location, 2025);
        assert_eq!(first.registry.local_id(), second.registry.local_id());
    }

    #[test]
    fn test_fresh_registry_seeded_from_legacy_key() {
        let store = MemoryStore::new();
        store
            .set(
                LEGACY_STORAGE_KEY,
                &json!({
                    "selectedYear": 2019,
                    "coloredDays": {"2019-4-5": "pink"}
                })
                .to_string(),
            )
            .unwrap();

        let loaded = CalendarRegistry::load(&store, &mut MemoryLocation::new(BASE), 2025);
        assert_eq!(loaded.active.month_range.start.year, 2019);
        assert_eq!(
            loaded.active.date_cells.get("2019-4-5").unwrap().color,
            Some(ColorCode::Pink)
        );
    }

    #[test]
    fn test_dangling_current_id_heals_to_local() {
        let store = MemoryStore::new();
        store
            .set(
                REGISTRY_STORAGE_KEY,
                &json!({
                    "currentId": "gone00000000",
                    "localId": "aaaaaaaaaaaa",
                    "calendars": {
                        "aaaaaaaaaaaa": {
                            "id": "aaaaaaaaaaaa",
                            "data": StoredData::defaults(2024).to_value(),
                            "external": false,
                            "lastUpdated": "2024-03-01T10:00:00Z"
                        }
                    }
                })
                .to_string(),
            )
            .unwrap();

        let loaded = CalendarRegistry::load(&store, &mut MemoryLocation::new(BASE), 2025);
        assert_eq!(loaded.registry.current_id(), "aaaaaaaaaaaa");
        assert_eq!(loaded.active.month_range.start.year, 2024);
    }

    #[test]
    fn test_parse_repairs_entries() {
        let raw = json!({
            "currentId": "bbbbbbbbbbbb",
            "localId": "aaaaaaaaaaaa",
            "calendars": {
                "aaaaaaaaaaaa": {"external": true, "lastUpdated": "garbage", "selectedYear": 2021},
                "bbbbbbbbbbbb": {"external": true, "data": {"dateCells": {}}},
                "cccccccccccc": 7
            }
        })
        .to_string();

        let now = at(1_700_000_000);
        let registry = CalendarRegistry::parse(&raw, 2030, now).unwrap();

        let local = registry.get("aaaaaaaaaaaa").unwrap();
        assert!(!local.external);
        assert_eq!(local.last_updated, now);
        assert_eq!(local.data.month_range.start.year, 2021);

        let shared = registry.get("bbbbbbbbbbbb").unwrap();
        assert!(shared.external);
        assert_eq!(shared.data.month_range.start.year, 2030);

        assert!(!registry.contains("cccccccccccc"));
        assert_eq!(registry.current_id(), "bbbbbbbbbbbb");
    }

    #[test]
    fn test_parse_keeps_dangling_current_id_for_load() {
        let raw = json!({
            "currentId": "gone00000000",
            "localId": "aaaaaaaaaaaa",
            "calendars": {}
        })
        .to_string();

        let registry = CalendarRegistry::parse(&raw, 2025, at(0)).unwrap();
        assert_eq!(registry.current_id(), "gone00000000");
        assert!(!registry.contains("gone00000000"));
    }

    #[test]
    fn test_blank_local_id_is_regenerated() {
        let raw = json!({"localId": "  ", "calendars": {}}).to_string();
        let registry = CalendarRegistry::parse(&raw, 2025, at(0)).unwrap();
        assert_eq!(registry.local_id().len(), 12);
    }

    #[test]
    fn test_unparsable_registry_is_replaced() {
        let store = MemoryStore::new();
        store.set(REGISTRY_STORAGE_KEY, "{not json").unwrap();
        let loaded = CalendarRegistry::load(&store, &mut MemoryLocation::new(BASE), 2025);
        assert_eq!(loaded.registry.len(), 1);
        assert!(CalendarRegistry::parse("[1,2]", 2025, at(0)).is_err());
    }

    #[test]
    fn test_shared_link_imports_external_calendar() {
        let store = MemoryStore::new();
        let token = share::encode(&painted(2026).to_value());
        let mut location =
            MemoryLocation::new(format!("{}?calendar=abc123&data={}", BASE, token));

        let loaded = CalendarRegistry::load(&store, &mut location, 2025);
        let registry = &loaded.registry;

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.current_id(), "abc123");
        assert!(registry.get("abc123").unwrap().external);
        assert_eq!(loaded.active, painted(2026));
        assert_eq!(loaded.shared_import.as_deref(), Some("abc123"));
        assert_eq!(location.href(), format!("{}?calendar=abc123", BASE));
    }

    #[test]
    fn test_bad_share_token_is_ignored() {
        let store = MemoryStore::new();
        let mut location = MemoryLocation::new(format!("{}?calendar=abc123&data=%21%21%21", BASE));
        let loaded = CalendarRegistry::load(&store, &mut location, 2025);
        assert_eq!(loaded.registry.len(), 1);
        assert!(loaded.shared_import.is_none());
        assert!(location.replacements().is_empty());

        let scalar = share::encode(&json!([1, 2, 3]));
        let mut location = MemoryLocation::new(format!("{}?calendar=abc123&data={}", BASE, scalar));
        let loaded = CalendarRegistry::load(&store, &mut location, 2025);
        assert!(!loaded.registry.contains("abc123"));
    }

    #[test]
    fn test_calendar_param_selects_existing_entry() {
        let store = MemoryStore::new();
        let token = share::encode(&painted(2026).to_value());
        let mut shared = MemoryLocation::new(format!("{}?calendar=abc123&data={}", BASE, token));
        let first = CalendarRegistry::load(&store, &mut shared, 2025);
        let local_id = first.registry.local_id().to_string();

        let mut by_param = MemoryLocation::new(format!("{}?calendar={}", BASE, local_id));
        let loaded = CalendarRegistry::load(&store, &mut by_param, 2025);
        assert_eq!(loaded.registry.current_id(), local_id);

        let mut unknown = MemoryLocation::new(format!("{}?calendar=nope", BASE));
        let loaded = CalendarRegistry::load(&store, &mut unknown, 2025);
        // stored currentId wins when the param names nothing
        assert_eq!(loaded.registry.current_id(), local_id);
    }

    #[test]
    fn test_switch_calendar() {
        let store = MemoryStore::new();
        let token = share::encode(&painted(2026).to_value());
        let mut location = MemoryLocation::new(format!("{}?calendar=abc123&data={}", BASE, token));
        let mut registry = CalendarRegistry::load(&store, &mut location, 2025).registry;
        let local_id = registry.local_id().to_string();
        let before = registry.get(&local_id).unwrap().last_updated;

        assert!(!registry.switch_calendar("unknown", &store, &mut location).unwrap());
        assert_eq!(registry.current_id(), "abc123");

        assert!(registry.switch_calendar(&local_id, &store, &mut location).unwrap());
        assert_eq!(registry.current_id(), local_id);
        assert_eq!(registry.get(&local_id).unwrap().last_updated, before);
        assert_eq!(location.href(), format!("{}?calendar={}", BASE, local_id));

        let stored = CalendarRegistry::parse(
            &store.get(REGISTRY_STORAGE_KEY).unwrap().unwrap(),
            2025,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(stored.current_id(), local_id);
    }

    #[test]
    fn test_record_mutation_mirrors_local() {
        let store = MemoryStore::new();
        let mut registry =
            CalendarRegistry::load(&store, &mut MemoryLocation::new(BASE), 2025).registry;
        let local_id = registry.local_id().to_string();

        registry
            .record_mutation(&local_id, painted(2025), &store)
            .unwrap();

        let mirror: StoredData =
            serde_json::from_str(&store.get(LEGACY_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(mirror, painted(2025));

        registry
            .record_mutation("fresh0000000", StoredData::defaults(2020), &store)
            .unwrap();
        assert!(registry.get("fresh0000000").unwrap().external);
        assert_eq!(registry.current_id(), "fresh0000000");
        // mirror still holds the local calendar
        let mirror: StoredData =
            serde_json::from_str(&store.get(LEGACY_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(mirror, painted(2025));
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let store = MemoryStore::new();
        let mut registry =
            CalendarRegistry::load(&store, &mut MemoryLocation::new(BASE), 2025).registry;
        let local_id = registry.local_id().to_string();

        store.set_quota(Some(16));
        let err = registry
            .record_mutation(&local_id, painted(2025), &store)
            .unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert_eq!(registry.active_data(), Some(&painted(2025)));
    }

    #[test]
    fn test_summaries_order_and_labels() {
        let raw = json!({
            "currentId": "222222222222",
            "localId": "000000000000",
            "calendars": {
                "000000000000": {"data": {}, "lastUpdated": "2020-01-01T00:00:00Z"},
                "111111111111": {"data": {}, "external": true, "lastUpdated": "2024-01-01T00:00:00Z"},
                "222222222222": {"data": {}, "external": true, "lastUpdated": "2025-01-01T00:00:00Z"},
                "333333333333": {"data": {}, "external": true, "lastUpdated": "2024-01-01T00:00:00Z"}
            }
        })
        .to_string();
        let registry = CalendarRegistry::parse(&raw, 2025, at(0)).unwrap();

        let summaries = registry.list_summaries();
        let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["000000000000", "222222222222", "111111111111", "333333333333"]
        );
        assert_eq!(summaries[0].label, LOCAL_LABEL);
        assert_eq!(summaries[1].label, "Shared 222222");
        assert!(summaries[1].is_current);
        assert!(!summaries[0].is_current);
    }

    #[test]
    fn test_clear_legacy_mirror() {
        let store = MemoryStore::new();
        CalendarRegistry::load(&store, &mut MemoryLocation::new(BASE), 2025);
        CalendarRegistry::clear_legacy_mirror(&store).unwrap();
        assert!(!store.contains_key(LEGACY_STORAGE_KEY));
        assert!(store.contains_key(REGISTRY_STORAGE_KEY));
    }
}
