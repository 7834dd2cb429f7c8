//! Schema migration for persisted calendar documents.
//!
//! Three shapes have been written over time:
//!
//! - v1: `selectedYear` plus `coloredDays: {key: code}` and
//!   `customTexts: {key: text}`
//! - v2: `selectedYear` plus `dateCells`, where a cell is an object or an
//!   array of stacked objects
//! - v3: `monthRange` plus single-object `dateCells` (the `StoredData` shape)
//!
//! Every document is read leniently into its own version's struct and then
//! lifted one version at a time until it reaches v3.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use yearplan_core::{
    CalendarView, ColorTexture, DateCellData, DateCells, MonthPointer, MonthRange,
    StackedDateCells, StoredData, STORAGE_VERSION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    V1,
    V2,
    V3,
}

impl SchemaVersion {
    /// Guess a document's version from the fields it carries.
    pub fn detect(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return SchemaVersion::V3;
        };
        if object.contains_key("monthRange") {
            SchemaVersion::V3
        } else if object.contains_key("coloredDays") || object.contains_key("customTexts") {
            SchemaVersion::V1
        } else {
            SchemaVersion::V2
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
            SchemaVersion::V3 => "v3",
        };
        write!(f, "{}", name)
    }
}

/// Single-year document with separate color and text maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyV1 {
    pub selected_year: Option<i32>,
    pub colored_days: BTreeMap<String, ColorTexture>,
    pub custom_texts: BTreeMap<String, String>,
    pub selected_color_texture: Option<ColorTexture>,
    pub selected_view: Option<CalendarView>,
}

impl LegacyV1 {
    pub fn read(object: &Map<String, Value>) -> Self {
        let mut colored_days = BTreeMap::new();
        if let Some(days) = object.get("coloredDays").and_then(Value::as_object) {
            for (key, code) in days {
                match code.as_str().map(str::parse::<ColorTexture>) {
                    Some(Ok(tool)) => {
                        colored_days.insert(key.clone(), tool);
                    }
                    _ => tracing::debug!("Dropping unknown color on '{}'", key),
                }
            }
        }

        let custom_texts = object
            .get("customTexts")
            .and_then(Value::as_object)
            .map(|texts| {
                texts
                    .iter()
                    .filter_map(|(key, text)| Some((key.clone(), text.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            selected_year: read_year(object),
            colored_days,
            custom_texts,
            selected_color_texture: read_tool(object),
            selected_view: read_view(object),
        }
    }

    /// Stack each day's color and text into one v2 cell list.
    pub fn into_v2(self) -> ArrayCellsV2 {
        let mut date_cells = StackedDateCells::default();
        for (key, tool) in self.colored_days {
            date_cells.push(key, DateCellData::with_tool(tool));
        }
        for (key, text) in self.custom_texts {
            date_cells.push(key, DateCellData::default().with_custom_text(&text));
        }

        ArrayCellsV2 {
            selected_year: self.selected_year,
            date_cells,
            selected_color_texture: self.selected_color_texture,
            selected_view: self.selected_view,
        }
    }
}

/// Single-year document whose cells may be stacked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayCellsV2 {
    pub selected_year: Option<i32>,
    pub date_cells: StackedDateCells,
    pub selected_color_texture: Option<ColorTexture>,
    pub selected_view: Option<CalendarView>,
}

impl ArrayCellsV2 {
    pub fn read(object: &Map<String, Value>) -> Self {
        Self {
            selected_year: read_year(object),
            date_cells: object
                .get("dateCells")
                .map(StackedDateCells::from_value)
                .unwrap_or_default(),
            selected_color_texture: read_tool(object),
            selected_view: read_view(object),
        }
    }

    /// The selected year becomes a whole-year range; stacks fold into one cell.
    pub fn into_v3(self) -> CalendarDocument {
        CalendarDocument {
            month_range: self.selected_year.map(MonthRange::whole_year),
            date_cells: self.date_cells.collapse(),
            selected_color_texture: self.selected_color_texture,
            selected_view: self.selected_view,
        }
    }
}

/// A v3 document whose settings may still be missing.
///
/// Import applies only the settings that are present, while load fills the
/// gaps with defaults via [`CalendarDocument::into_stored`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarDocument {
    pub month_range: Option<MonthRange>,
    pub date_cells: DateCells,
    pub selected_color_texture: Option<ColorTexture>,
    pub selected_view: Option<CalendarView>,
}

impl CalendarDocument {
    pub fn read(object: &Map<String, Value>) -> Self {
        let month_range = object
            .get("monthRange")
            .and_then(read_month_range)
            .or_else(|| read_year(object).map(MonthRange::whole_year));

        Self {
            month_range,
            date_cells: object
                .get("dateCells")
                .map(DateCells::from_value)
                .unwrap_or_default(),
            selected_color_texture: read_tool(object),
            selected_view: read_view(object),
        }
    }

    pub fn into_stored(self, fallback_year: i32) -> StoredData {
        StoredData {
            month_range: self
                .month_range
                .unwrap_or_else(|| MonthRange::whole_year(fallback_year)),
            date_cells: self.date_cells,
            selected_color_texture: self.selected_color_texture.unwrap_or_default(),
            selected_view: self.selected_view.unwrap_or_default(),
            version: Some(STORAGE_VERSION.to_string()),
        }
    }
}

/// Read any historical document and lift it to v3.
///
/// Returns the detected source version alongside the upgraded document. A
/// value that is not an object yields an empty document.
pub fn upgrade(value: &Value) -> (SchemaVersion, CalendarDocument) {
    let version = SchemaVersion::detect(value);
    let Some(object) = value.as_object() else {
        return (version, CalendarDocument::default());
    };

    let document = match version {
        SchemaVersion::V1 => LegacyV1::read(object).into_v2().into_v3(),
        SchemaVersion::V2 => ArrayCellsV2::read(object).into_v3(),
        SchemaVersion::V3 => CalendarDocument::read(object),
    };

    if version != SchemaVersion::V3 {
        tracing::info!(
            "Migrated calendar document from {} to {} ({} dated cells)",
            version,
            SchemaVersion::V3,
            document.date_cells.len()
        );
    }

    (version, document)
}

/// Normalize any stored calendar value into complete `StoredData`.
pub fn normalize_stored_data(value: &Value, fallback_year: i32) -> StoredData {
    upgrade(value).1.into_stored(fallback_year)
}

/// Integer read that also accepts integral floats such as `2025.0`.
fn as_int(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

fn read_year(object: &Map<String, Value>) -> Option<i32> {
    object.get("selectedYear").and_then(as_int)
}

fn read_tool(object: &Map<String, Value>) -> Option<ColorTexture> {
    object
        .get("selectedColorTexture")
        .and_then(Value::as_str)
        .and_then(|code| code.parse().ok())
}

fn read_view(object: &Map<String, Value>) -> Option<CalendarView> {
    object
        .get("selectedView")
        .and_then(Value::as_str)
        .and_then(|name| name.parse().ok())
}

fn read_pointer(value: &Value) -> Option<MonthPointer> {
    let year = value.get("year").and_then(as_int)?;
    let month = value.get("month").and_then(as_int)?;
    MonthPointer::new(year, month).ok()
}

fn read_month_range(value: &Value) -> Option<MonthRange> {
    let start = read_pointer(value.get("start")?)?;
    let end = read_pointer(value.get("end")?)?;
    Some(MonthRange::new(start, end).normalize())
}
