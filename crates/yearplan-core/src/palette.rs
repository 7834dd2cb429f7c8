//! Painting tools and calendar views.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// The eight fixed hues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorCode {
    Red,
    Orange,
    Green,
    Blue,
    Yellow,
    Purple,
    Teal,
    Pink,
}

impl ColorCode {
    pub const ALL: [ColorCode; 8] = [
        ColorCode::Red,
        ColorCode::Orange,
        ColorCode::Green,
        ColorCode::Blue,
        ColorCode::Yellow,
        ColorCode::Purple,
        ColorCode::Teal,
        ColorCode::Pink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorCode::Red => "red",
            ColorCode::Orange => "orange",
            ColorCode::Green => "green",
            ColorCode::Blue => "blue",
            ColorCode::Yellow => "yellow",
            ColorCode::Purple => "purple",
            ColorCode::Teal => "teal",
            ColorCode::Pink => "pink",
        }
    }
}

impl FromStr for ColorCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownColorTexture(s.to_string()))
    }
}

/// The three fixed patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureCode {
    DiagonalStripes,
    PolkaDots,
    SquareNet,
}

impl TextureCode {
    pub const ALL: [TextureCode; 3] = [
        TextureCode::DiagonalStripes,
        TextureCode::PolkaDots,
        TextureCode::SquareNet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureCode::DiagonalStripes => "diagonal-stripes",
            TextureCode::PolkaDots => "polka-dots",
            TextureCode::SquareNet => "square-net",
        }
    }
}

impl FromStr for TextureCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextureCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownColorTexture(s.to_string()))
    }
}

/// The active painting tool: one color or one texture.
///
/// Serialized as its bare code string (`"red"`, `"polka-dots"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTexture {
    Color(ColorCode),
    Texture(TextureCode),
}

impl ColorTexture {
    /// Colors first, then textures. The first entry is the default tool.
    pub fn all() -> impl Iterator<Item = ColorTexture> {
        ColorCode::ALL
            .into_iter()
            .map(ColorTexture::Color)
            .chain(TextureCode::ALL.into_iter().map(ColorTexture::Texture))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTexture::Color(code) => code.as_str(),
            ColorTexture::Texture(code) => code.as_str(),
        }
    }
}

impl Default for ColorTexture {
    fn default() -> Self {
        ColorTexture::Color(ColorCode::Red)
    }
}

impl fmt::Display for ColorTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTexture {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ColorCode>()
            .map(ColorTexture::Color)
            .or_else(|_| s.parse::<TextureCode>().map(ColorTexture::Texture))
    }
}

impl Serialize for ColorTexture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColorTexture {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// Calendar layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalendarView {
    #[default]
    Linear,
    Classic,
    Column,
}

impl CalendarView {
    pub const ALL: [CalendarView; 3] = [CalendarView::Linear, CalendarView::Classic, CalendarView::Column];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarView::Linear => "Linear",
            CalendarView::Classic => "Classic",
            CalendarView::Column => "Column",
        }
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarView {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalendarView::ALL
            .into_iter()
            .find(|view| view.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownView(s.to_string()))
    }
}
