//! The planner session: one open calendar plus the registry behind it.
//!
//! `CalendarController` owns the storage and location capabilities and the
//! loaded registry. Every setter updates the in-memory snapshot first and
//! then records the mutation, so a failed write never loses an edit; it only
//! raises a [`StorageNotice`].

use chrono::{Datelike, Local, NaiveDate, Utc};
use yearplan_core::{
    date_key, share, CalendarView, ColorTexture, DateCells, MonthPointer, MonthRange,
    ParseError, StorageError, StoredData, ValidationError,
};
use yearplan_store::{
    location, CalendarRegistry, CalendarSummary, KeyValueStore, LocationState,
};

use crate::clipboard::{deliver_link, ClipboardWriter, ShareOutcome};
use crate::drag::DragState;
use crate::transfer::{apply_import, parse_import, ExportDocument};

/// Informational notice raised when a durable write fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotice {
    /// Text for the user.
    pub message: &'static str,
    /// Technical description of the failure.
    pub detail: String,
}

impl From<&StorageError> for StorageNotice {
    fn from(error: &StorageError) -> Self {
        Self {
            message: error.user_message(),
            detail: error.to_string(),
        }
    }
}

pub struct CalendarController<S, L> {
    store: S,
    location: L,
    registry: CalendarRegistry,
    data: StoredData,
    drag: DragState,
    notice: Option<StorageNotice>,
    current_year: i32,
}

impl<S, L> CalendarController<S, L>
where
    S: KeyValueStore,
    L: LocationState,
{
    /// Load the registry for the current local year.
    pub fn load(store: S, location: L) -> Self {
        Self::load_for_year(store, location, Local::now().year())
    }

    /// Load with an explicit "current year", used for defaults and resets.
    pub fn load_for_year(store: S, mut location: L, current_year: i32) -> Self {
        let loaded = CalendarRegistry::load(&store, &mut location, current_year);
        let notice = loaded.storage_error.as_ref().map(StorageNotice::from);

        tracing::info!(
            "Loaded {} calendar(s), current '{}'",
            loaded.registry.len(),
            loaded.registry.current_id()
        );

        Self {
            store,
            location,
            registry: loaded.registry,
            data: loaded.active,
            drag: DragState::default(),
            notice,
            current_year,
        }
    }

    /// Snapshot of the active calendar.
    pub fn snapshot(&self) -> &StoredData {
        &self.data
    }

    pub fn month_range(&self) -> MonthRange {
        self.data.month_range
    }

    pub fn date_cells(&self) -> &DateCells {
        &self.data.date_cells
    }

    pub fn selected_color_texture(&self) -> ColorTexture {
        self.data.selected_color_texture
    }

    pub fn selected_view(&self) -> CalendarView {
        self.data.selected_view
    }

    pub fn current_calendar_id(&self) -> &str {
        self.registry.current_id()
    }

    pub fn local_calendar_id(&self) -> &str {
        self.registry.local_id()
    }

    pub fn available_calendars(&self) -> Vec<CalendarSummary> {
        self.registry.list_summaries()
    }

    pub fn registry(&self) -> &CalendarRegistry {
        &self.registry
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn storage_notice(&self) -> Option<&StorageNotice> {
        self.notice.as_ref()
    }

    pub fn dismiss_storage_notice(&mut self) {
        self.notice = None;
    }

    /// Replace the visible window. The range is normalized; a range with an
    /// out-of-bounds month is rejected and nothing changes.
    pub fn set_month_range(&mut self, range: MonthRange) -> Result<(), ValidationError> {
        check_range(&range)?;
        let mut next = self.data.clone();
        next.month_range = range.normalize();
        self.commit(next);
        Ok(())
    }

    /// Month-picker start selection (January selects the whole year).
    pub fn set_range_start(&mut self, start: MonthPointer) -> Result<(), ValidationError> {
        check_pointer(start)?;
        self.set_month_range(self.data.month_range.with_start(start))
    }

    pub fn set_range_end(&mut self, end: MonthPointer) -> Result<(), ValidationError> {
        check_pointer(end)?;
        self.set_month_range(self.data.month_range.with_end(end))
    }

    pub fn set_date_cells(&mut self, cells: DateCells) {
        let mut next = self.data.clone();
        next.date_cells = cells;
        self.commit(next);
    }

    /// Toggle the selected tool on `date`.
    pub fn apply_tool(&mut self, date: NaiveDate) {
        let cells = self
            .data
            .date_cells
            .toggle_tool(&date_key(date), self.data.selected_color_texture);
        self.set_date_cells(cells);
    }

    /// Annotate `date`; blank text removes the annotation.
    pub fn set_custom_text(&mut self, date: NaiveDate, text: &str) {
        let cells = self.data.date_cells.set_custom_text(&date_key(date), text);
        self.set_date_cells(cells);
    }

    pub fn set_selected_color_texture(&mut self, tool: ColorTexture) {
        let mut next = self.data.clone();
        next.selected_color_texture = tool;
        self.commit(next);
    }

    /// Select a tool by code. Unknown codes leave the current tool in place.
    pub fn select_tool_code(&mut self, code: &str) -> Result<(), ValidationError> {
        let tool = code.parse::<ColorTexture>().map_err(|e| {
            tracing::debug!("Ignoring tool selection: {}", e);
            e
        })?;
        self.set_selected_color_texture(tool);
        Ok(())
    }

    pub fn set_selected_view(&mut self, view: CalendarView) {
        let mut next = self.data.clone();
        next.selected_view = view;
        self.commit(next);
    }

    /// Select a view by name. Unknown names leave the current view in place.
    pub fn select_view_name(&mut self, name: &str) -> Result<(), ValidationError> {
        let view = name.parse::<CalendarView>().map_err(|e| {
            tracing::debug!("Ignoring view selection: {}", e);
            e
        })?;
        self.set_selected_view(view);
        Ok(())
    }

    /// Make another known calendar active. Returns `false` for unknown ids.
    pub fn switch_calendar(&mut self, id: &str) -> bool {
        let switched = match self
            .registry
            .switch_calendar(id, &self.store, &mut self.location)
        {
            Ok(switched) => switched,
            Err(e) => {
                self.notice = Some(StorageNotice::from(&e));
                true
            }
        };

        if switched {
            if let Some(data) = self.registry.active_data() {
                self.data = data.clone();
            }
            self.drag = self.drag.on_pointer_up();
        }
        switched
    }

    /// Reset the active calendar to defaults and drop the legacy mirror.
    pub fn clean_all(&mut self) {
        tracing::info!("Clearing calendar '{}'", self.registry.current_id());
        self.commit(StoredData::defaults(self.current_year));
        if let Err(e) = CalendarRegistry::clear_legacy_mirror(&self.store) {
            self.notice = Some(StorageNotice::from(&e));
        }
    }

    /// Link that reproduces the active calendar on another profile.
    pub fn share_link(&self) -> Option<String> {
        let token = share::encode(&self.data.to_value());
        location::share_link(&self.location.href(), self.registry.current_id(), &token)
    }

    /// Build the share link and try to put it on the clipboard.
    pub fn share<C>(&self, clipboard: &mut C) -> Option<ShareOutcome>
    where
        C: ClipboardWriter + ?Sized,
    {
        let url = self.share_link()?;
        Some(deliver_link(clipboard, url))
    }

    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::from_snapshot(&self.data, Utc::now())
    }

    /// Merge an exported file into the active calendar.
    pub fn import_document(&mut self, json: &str) -> Result<(), ParseError> {
        let document = parse_import(json).map_err(|e| {
            tracing::warn!("Import rejected: {}", e);
            e
        })?;
        let next = apply_import(&self.data, &document);
        tracing::info!(
            "Imported {} dated cells into '{}'",
            document.date_cells.len(),
            self.registry.current_id()
        );
        self.commit(next);
        Ok(())
    }

    /// Pointer pressed on a cell: start painting.
    pub fn pointer_down(&mut self) {
        self.drag = self.drag.on_pointer_down();
    }

    /// Pointer entered `date`; paints it while dragging.
    pub fn pointer_enter(&mut self, date: NaiveDate) {
        if self.drag.paints_on_enter() {
            self.apply_tool(date);
        }
    }

    /// Pointer released anywhere.
    pub fn pointer_up(&mut self) {
        self.drag = self.drag.on_pointer_up();
    }

    /// A plain click on `date`.
    pub fn click(&mut self, date: NaiveDate) {
        self.apply_tool(date);
    }

    fn commit(&mut self, next: StoredData) {
        self.data = next;
        let id = self.registry.current_id().to_string();
        if let Err(e) = self
            .registry
            .record_mutation(&id, self.data.clone(), &self.store)
        {
            self.notice = Some(StorageNotice::from(&e));
        }
    }
}

fn check_pointer(pointer: MonthPointer) -> Result<(), ValidationError> {
    MonthPointer::new(pointer.year, pointer.month).map(|_| ())
}

fn check_range(range: &MonthRange) -> Result<(), ValidationError> {
    check_pointer(range.start)?;
    check_pointer(range.end)
}
