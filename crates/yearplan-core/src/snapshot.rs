//! The persisted state of one calendar.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date_cell::DateCells;
use crate::month_range::MonthRange;
use crate::palette::{CalendarView, ColorTexture};

/// Version tag written into every snapshot produced by this crate.
pub const STORAGE_VERSION: &str = "3.0";

/// One calendar's complete state, as stored and as shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
    pub month_range: MonthRange,
    pub date_cells: DateCells,
    pub selected_color_texture: ColorTexture,
    pub selected_view: CalendarView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl StoredData {
    /// Empty calendar showing the whole of `year`.
    pub fn defaults(year: i32) -> Self {
        Self {
            month_range: MonthRange::whole_year(year),
            date_cells: DateCells::new(),
            selected_color_texture: ColorTexture::default(),
            selected_view: CalendarView::default(),
            version: Some(STORAGE_VERSION.to_string()),
        }
    }

    /// JSON form used for share tokens and durable storage.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            // string-keyed maps and plain enums cannot fail to serialize
            tracing::error!("Failed to serialize calendar snapshot: {}", e);
            Value::Null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_shape() {
        let data = StoredData::defaults(2025);
        assert_eq!(
            data.to_value(),
            json!({
                "monthRange": {
                    "start": {"year": 2025, "month": 0},
                    "end": {"year": 2025, "month": 11}
                },
                "dateCells": {},
                "selectedColorTexture": "red",
                "selectedView": "Linear",
                "version": "3.0"
            })
        );
    }

    #[test]
    fn test_strict_deserialize_round_trip() {
        let data = StoredData::defaults(2024);
        let back: StoredData = serde_json::from_value(data.to_value()).unwrap();
        assert_eq!(back, data);
    }
}
