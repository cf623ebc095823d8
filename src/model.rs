//! Editor data model: text lines, the shared style and the image source.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest position (percent) a text line may take on either axis.
pub const MIN_POSITION: u32 = 10;
/// Highest position (percent) a text line may take on either axis.
pub const MAX_POSITION: u32 = 90;
/// Position given to lines added after the initial two.
pub const DEFAULT_POSITION: u32 = 50;

pub const MIN_FONT_SIZE: u32 = 16;
pub const MAX_FONT_SIZE: u32 = 48;
pub const DEFAULT_FONT_SIZE: u32 = 36;

/// Identifier of a text line, unique within one editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextLineId(pub u64);

impl fmt::Display for TextLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One overlay text annotation.
///
/// Positions are whole percentages. `vertical_position` is measured from the
/// top edge, `horizontal_position` is centred on the vertical midline (50 is
/// the middle of the canvas).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    #[serde(skip)]
    pub id: TextLineId,
    pub text: String,
    pub vertical_position: u32,
    pub horizontal_position: u32,
}

impl TextLine {
    /// A blank line at the default 50/50 position.
    pub fn new(id: TextLineId) -> Self {
        Self::at(id, DEFAULT_POSITION, DEFAULT_POSITION)
    }

    /// A blank line at the given position, clamped to the allowed range.
    pub fn at(id: TextLineId, vertical: u32, horizontal: u32) -> Self {
        Self {
            id,
            text: String::new(),
            vertical_position: clamp_position(vertical),
            horizontal_position: clamp_position(horizontal),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Blank (empty or whitespace-only) lines are never painted.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub fn clamp_position(pct: u32) -> u32 {
    pct.clamp(MIN_POSITION, MAX_POSITION)
}

pub fn clamp_font_size(px: u32) -> u32 {
    px.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// The fixed set of font families offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontFamily {
    #[default]
    Impact,
    Arial,
    Helvetica,
    TimesNewRoman,
    ComicSansMs,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::Impact,
        FontFamily::Arial,
        FontFamily::Helvetica,
        FontFamily::TimesNewRoman,
        FontFamily::ComicSansMs,
    ];

    /// The CSS family name, which is also the value sent to the backend.
    pub fn css_name(self) -> &'static str {
        match self {
            FontFamily::Impact => "Impact",
            FontFamily::Arial => "Arial",
            FontFamily::Helvetica => "Helvetica",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::ComicSansMs => "Comic Sans MS",
        }
    }

    /// Font file names probed (in order) inside the fonts directory.
    pub fn file_candidates(self) -> &'static [&'static str] {
        match self {
            FontFamily::Impact => &["impact.ttf", "Impact.ttf"],
            FontFamily::Arial => &["arial.ttf", "Arial.ttf"],
            FontFamily::Helvetica => &["helvetica.ttf", "Helvetica.ttf", "arial.ttf"],
            FontFamily::TimesNewRoman => &["times.ttf", "Times New Roman.ttf", "times_new_roman.ttf"],
            FontFamily::ComicSansMs => &["comic.ttf", "Comic Sans MS.ttf", "comic_sans_ms.ttf"],
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

impl FromStr for FontFamily {
    type Err = Error;

    /// Accepts the CSS name in any case, with or without spaces
    /// (`"Times New Roman"`, `"times-new-roman"`, `"comicsansms"`).
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        FontFamily::ALL
            .into_iter()
            .find(|f| {
                f.css_name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .eq(key.chars())
            })
            .ok_or_else(|| Error::InvalidInput(format!("unknown font family: {}", s)))
    }
}

/// An opaque text color parsed from `#rgb` or `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TextColor {
    pub const WHITE: TextColor = TextColor { r: 255, g: 255, b: 255 };
    pub const BLACK: TextColor = TextColor { r: 0, g: 0, b: 0 };

    pub fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{}", hex::encode([self.r, self.g, self.b]))
    }
}

impl Default for TextColor {
    fn default() -> Self {
        TextColor::WHITE
    }
}

impl FromStr for TextColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidInput(format!("color must start with '#': {}", s)))?;
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(Error::InvalidInput(format!("invalid color: {}", s))),
        };
        let bytes =
            hex::decode(&expanded).map_err(|_| Error::InvalidInput(format!("invalid color: {}", s)))?;
        Ok(TextColor { r: bytes[0], g: bytes[1], b: bytes[2] })
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Global text style shared by every line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub font_family: FontFamily,
    /// Pixel size, always within `[MIN_FONT_SIZE, MAX_FONT_SIZE]` when set through the editor.
    pub font_size: u32,
    pub text_color: TextColor,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Impact,
            font_size: DEFAULT_FONT_SIZE,
            text_color: TextColor::WHITE,
        }
    }
}

/// A predefined background image offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_count: Option<u32>,
}

/// Where the background image comes from. Exactly one source is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Template(Template),
    /// An uploaded image (data URL), a pasted URL or a local path.
    Custom(String),
}

impl ImageSource {
    /// The location the loader should resolve.
    pub fn location(&self) -> &str {
        match self {
            ImageSource::Template(t) => &t.url,
            ImageSource::Custom(loc) => loc,
        }
    }

    pub fn template(&self) -> Option<&Template> {
        match self {
            ImageSource::Template(t) => Some(t),
            ImageSource::Custom(_) => None,
        }
    }
}

/// Backend ids arrive as either JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
