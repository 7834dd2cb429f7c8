//! Per-date annotations and the copy-on-write cell map.
//!
//! Every mutation returns a new [`DateCells`]; the receiver is never touched.
//! A cell whose fields are all unset is dropped from the map on every write
//! path, so `get(key).is_some()` always means "something is painted or
//! written on that day".

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::palette::{ColorCode, ColorTexture, TextureCode};

/// Map key for a calendar day: `"{year}-{month0}-{day}"`.
pub fn date_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month0(), date.day())
}

/// Annotation attached to one date.
///
/// `color` and `texture` are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCellData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
}

impl DateCellData {
    pub fn with_tool(tool: ColorTexture) -> Self {
        let mut cell = Self::default();
        cell.set_tool(tool);
        cell
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            custom_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.texture.is_none() && self.custom_text.is_none()
    }

    /// The painted color or texture, if any.
    pub fn tool(&self) -> Option<ColorTexture> {
        self.color
            .map(ColorTexture::Color)
            .or(self.texture.map(ColorTexture::Texture))
    }

    fn set_tool(&mut self, tool: ColorTexture) {
        match tool {
            ColorTexture::Color(code) => {
                self.color = Some(code);
                self.texture = None;
            }
            ColorTexture::Texture(code) => {
                self.texture = Some(code);
                self.color = None;
            }
        }
    }

    /// Paint with `tool`, or erase it if the cell already carries it.
    pub fn toggled(&self, tool: ColorTexture) -> Self {
        let mut next = self.clone();
        if self.tool() == Some(tool) {
            next.color = None;
            next.texture = None;
        } else {
            next.set_tool(tool);
        }
        next
    }

    /// Text that trims to nothing clears the annotation; anything else is
    /// stored as typed.
    pub fn with_custom_text(&self, text: &str) -> Self {
        let mut next = self.clone();
        next.custom_text = if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        next
    }

    /// Shallow merge: every field set on `other` overwrites ours.
    pub fn merge_from(&mut self, other: &DateCellData) {
        if let Some(color) = other.color {
            self.set_tool(ColorTexture::Color(color));
        }
        if let Some(texture) = other.texture {
            self.set_tool(ColorTexture::Texture(texture));
        }
        if let Some(text) = &other.custom_text {
            if !text.trim().is_empty() {
                self.custom_text = Some(text.clone());
            }
        }
    }

    /// Lenient read of one stored cell.
    ///
    /// Unknown codes are dropped. When both a color and a texture survive,
    /// the color wins. Returns `None` for anything that is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let color = object
            .get("color")
            .and_then(Value::as_str)
            .and_then(|code| match code.parse::<ColorCode>() {
                Ok(color) => Some(color),
                Err(e) => {
                    tracing::debug!("Dropping cell color: {}", e);
                    None
                }
            });
        let texture = object
            .get("texture")
            .and_then(Value::as_str)
            .and_then(|code| match code.parse::<TextureCode>() {
                Ok(texture) => Some(texture),
                Err(e) => {
                    tracing::debug!("Dropping cell texture: {}", e);
                    None
                }
            });
        let custom_text = object
            .get("customText")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string);

        Some(Self {
            color,
            texture: if color.is_some() { None } else { texture },
            custom_text,
        })
    }
}

/// Date key → annotation, with copy-on-write mutation helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateCells(BTreeMap<String, DateCellData>);

impl DateCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&DateCellData> {
        self.0.get(key)
    }

    pub fn get_date(&self, date: NaiveDate) -> Option<&DateCellData> {
        self.get(&date_key(date))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DateCellData)> {
        self.0.iter()
    }

    /// Copy of the map with `key` replaced by `cell`, or removed when the
    /// cell is empty.
    fn with_cell(&self, key: &str, cell: DateCellData) -> Self {
        let mut next = self.0.clone();
        if cell.is_empty() {
            next.remove(key);
        } else {
            next.insert(key.to_string(), cell);
        }
        Self(next)
    }

    /// Paint `key` with `tool`; a second application with the same tool erases.
    pub fn toggle_tool(&self, key: &str, tool: ColorTexture) -> Self {
        let current = self.0.get(key).cloned().unwrap_or_default();
        self.with_cell(key, current.toggled(tool))
    }

    pub fn set_custom_text(&self, key: &str, text: &str) -> Self {
        let current = self.0.get(key).cloned().unwrap_or_default();
        self.with_cell(key, current.with_custom_text(text))
    }

    /// Additive per-cell merge used by file import.
    pub fn merge(&self, incoming: &DateCells) -> Self {
        let mut next = self.0.clone();
        for (key, cell) in &incoming.0 {
            let merged = match next.get(key) {
                Some(existing) => {
                    let mut merged = existing.clone();
                    merged.merge_from(cell);
                    merged
                }
                None => cell.clone(),
            };
            if merged.is_empty() {
                next.remove(key);
            } else {
                next.insert(key.clone(), merged);
            }
        }
        Self(next)
    }

    /// Lenient read of a stored `dateCells` object in either historical
    /// shape.
    pub fn from_value(value: &Value) -> Self {
        StackedDateCells::from_value(value).collapse()
    }
}

impl FromIterator<(String, DateCellData)> for DateCells {
    fn from_iter<I: IntoIterator<Item = (String, DateCellData)>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|(_, cell)| !cell.is_empty()).collect())
    }
}

/// Array-shaped cell map: several annotations stacked on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackedDateCells(BTreeMap<String, Vec<DateCellData>>);

impl StackedDateCells {
    pub fn get(&self, key: &str) -> Option<&[DateCellData]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a `dateCells` object, lifting bare cells into one-element
    /// stacks. Entries that are neither objects nor arrays are skipped.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let mut stacks = BTreeMap::new();
        for (key, entry) in object {
            let stack: Vec<DateCellData> = match entry {
                Value::Array(items) => items
                    .iter()
                    .filter_map(DateCellData::from_value)
                    .filter(|cell| !cell.is_empty())
                    .collect(),
                Value::Object(_) => DateCellData::from_value(entry)
                    .filter(|cell| !cell.is_empty())
                    .into_iter()
                    .collect(),
                _ => {
                    tracing::debug!("Skipping malformed date cell '{}'", key);
                    Vec::new()
                }
            };
            if !stack.is_empty() {
                stacks.insert(key.clone(), stack);
            }
        }
        Self(stacks)
    }

    /// Folds each stack into one cell, later entries winning field by field.
    pub fn collapse(&self) -> DateCells {
        self.0
            .iter()
            .map(|(key, stack)| {
                let mut cell = DateCellData::default();
                for entry in stack {
                    cell.merge_from(entry);
                }
                (key.clone(), cell)
            })
            .collect()
    }

    pub fn push(&mut self, key: impl Into<String>, cell: DateCellData) {
        if !cell.is_empty() {
            self.0.entry(key.into()).or_default().push(cell);
        }
    }
}
