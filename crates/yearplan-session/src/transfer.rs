//! File export and additive import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use yearplan_core::{
    CalendarView, ColorTexture, DateCells, MonthRange, ParseError, StoredData, STORAGE_VERSION,
};
use yearplan_store::{upgrade, CalendarDocument};

/// The JSON document written by "save to file".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub month_range: MonthRange,
    /// Start year of the range, for readers that predate month ranges.
    pub selected_year: i32,
    pub date_cells: DateCells,
    pub selected_color_texture: ColorTexture,
    pub selected_view: CalendarView,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportDocument {
    pub fn from_snapshot(data: &StoredData, now: DateTime<Utc>) -> Self {
        let month_range = data.month_range.normalize();
        Self {
            month_range,
            selected_year: month_range.start.year,
            date_cells: data.date_cells.clone(),
            selected_color_texture: data.selected_color_texture,
            selected_view: data.selected_view,
            export_date: now,
            version: STORAGE_VERSION.to_string(),
        }
    }

    /// `year-planner-data-YYYY-MM-DD.json`, dated by the export time.
    pub fn file_name(&self) -> String {
        format!(
            "year-planner-data-{}.json",
            self.export_date.format("%Y-%m-%d")
        )
    }

    /// Two-space indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse an import file of any historical shape.
///
/// Only invalid JSON or a non-object document is an error; unknown or
/// invalid fields are skipped.
pub fn parse_import(json: &str) -> Result<CalendarDocument, ParseError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ParseError::ImportFile(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ParseError::ImportFile(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    let (version, document) = upgrade(&value);
    tracing::debug!(
        "Parsed {} import with {} dated cells",
        version,
        document.date_cells.len()
    );
    Ok(document)
}

/// Merge an imported document into `current`.
///
/// Cells merge key by key: imported fields overwrite, untouched fields and
/// days survive. Settings present in the document replace the current ones.
pub fn apply_import(current: &StoredData, document: &CalendarDocument) -> StoredData {
    StoredData {
        month_range: document.month_range.unwrap_or(current.month_range),
        date_cells: current.date_cells.merge(&document.date_cells),
        selected_color_texture: document
            .selected_color_texture
            .unwrap_or(current.selected_color_texture),
        selected_view: document.selected_view.unwrap_or(current.selected_view),
        version: Some(STORAGE_VERSION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use yearplan_core::{ColorCode, TextureCode};

    fn current() -> StoredData {
        let mut data = StoredData::defaults(2025);
        data.date_cells = DateCells::new()
            .toggle_tool("2025-0-1", ColorTexture::Color(ColorCode::Red))
            .set_custom_text("2025-0-1", "keep me")
            .toggle_tool("2025-0-2", ColorTexture::Color(ColorCode::Orange));
        data
    }

    #[test]
    fn test_export_shape() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 30, 0).unwrap();
        let document = ExportDocument::from_snapshot(&current(), now);

        assert_eq!(document.file_name(), "year-planner-data-2025-03-09.json");

        let value: Value = serde_json::from_str(&document.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["selectedYear"], json!(2025));
        assert_eq!(value["version"], json!("3.0"));
        assert_eq!(value["exportDate"], json!("2025-03-09T12:30:00Z"));
        assert_eq!(value["dateCells"]["2025-0-2"], json!({"color": "orange"}));
    }

    #[test]
    fn test_export_reimports_unchanged() {
        let now = Utc::now();
        let exported = ExportDocument::from_snapshot(&current(), now)
            .to_json_pretty()
            .unwrap();
        let merged = apply_import(&StoredData::defaults(1999), &parse_import(&exported).unwrap());
        assert_eq!(merged, current());
    }

    #[test]
    fn test_import_is_additive() {
        let file = json!({
            "dateCells": {
                "2025-0-1": {"texture": "polka-dots"},
                "2025-5-5": {"customText": "Trip"}
            },
            "selectedView": "Classic"
        })
        .to_string();

        let merged = apply_import(&current(), &parse_import(&file).unwrap());
        let first = merged.date_cells.get("2025-0-1").unwrap();
        assert_eq!(first.texture, Some(TextureCode::PolkaDots));
        assert_eq!(first.color, None);
        assert_eq!(first.custom_text.as_deref(), Some("keep me"));
        assert!(merged.date_cells.contains_key("2025-0-2"));
        assert!(merged.date_cells.contains_key("2025-5-5"));
        assert_eq!(merged.selected_view, CalendarView::Classic);
        assert_eq!(merged.month_range, current().month_range);
    }

    #[test]
    fn test_import_v1_file() {
        let file = json!({
            "selectedYear": 2022,
            "coloredDays": {"2022-1-14": "pink"},
            "customTexts": {"2022-1-14": "Valentine"},
            "selectedColorTexture": "square-net",
            "selectedView": "Bogus",
            "exportDate": "2022-02-01T00:00:00.000Z",
            "version": "1.0"
        })
        .to_string();

        let merged = apply_import(&current(), &parse_import(&file).unwrap());
        assert_eq!(merged.month_range, MonthRange::whole_year(2022));
        let day = merged.date_cells.get("2022-1-14").unwrap();
        assert_eq!(day.color, Some(ColorCode::Pink));
        assert_eq!(day.custom_text.as_deref(), Some("Valentine"));
        assert_eq!(
            merged.selected_color_texture,
            ColorTexture::Texture(TextureCode::SquareNet)
        );
        // invalid view is ignored
        assert_eq!(merged.selected_view, CalendarView::Linear);
    }

    #[test]
    fn test_import_rejects_non_objects() {
        assert!(matches!(parse_import("[]"), Err(ParseError::ImportFile(_))));
        assert!(matches!(parse_import("{oops"), Err(ParseError::ImportFile(_))));
    }
}
