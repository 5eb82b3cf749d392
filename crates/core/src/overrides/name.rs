//! Name style override value

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Text decorations applied to a display name
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextStyle: u8 {
        const BOLD = 0x01;
        const ITALIC = 0x02;
        const UNDERLINE = 0x04;
        const STRIKETHROUGH = 0x08;
        const OBFUSCATED = 0x10;
    }
}

impl TextStyle {
    fn parse_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bold" => Some(Self::BOLD),
            "italic" => Some(Self::ITALIC),
            "underline" | "underlined" => Some(Self::UNDERLINE),
            "strikethrough" => Some(Self::STRIKETHROUGH),
            "obfuscated" => Some(Self::OBFUSCATED),
            _ => None,
        }
    }

    fn names(self) -> Vec<String> {
        [
            (Self::BOLD, "bold"),
            (Self::ITALIC, "italic"),
            (Self::UNDERLINE, "underline"),
            (Self::STRIKETHROUGH, "strikethrough"),
            (Self::OBFUSCATED, "obfuscated"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name.to_string())
        .collect()
    }
}

/// Named colors accepted besides `#rrggbb`
const NAMED_COLORS: &[&str] = &[
    "black",
    "dark_blue",
    "dark_green",
    "dark_aqua",
    "dark_red",
    "dark_purple",
    "gold",
    "gray",
    "dark_gray",
    "blue",
    "green",
    "aqua",
    "red",
    "light_purple",
    "yellow",
    "white",
];

fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => NAMED_COLORS.contains(&color),
    }
}

#[derive(Serialize, Deserialize)]
struct RawNameStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    styles: Vec<String>,
}

/// Color and decorations for a user's display name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawNameStyle", into = "RawNameStyle")]
pub struct NameStyle {
    color: Option<String>,
    styles: TextStyle,
}

impl NameStyle {
    pub fn new(color: Option<&str>, styles: TextStyle) -> Result<Self, String> {
        if let Some(color) = color {
            if !is_valid_color(color) {
                return Err(format!("unknown color '{}'", color));
            }
        }
        Ok(Self {
            color: color.map(str::to_string),
            styles,
        })
    }

    /// Named color or `#rrggbb`, if one is set
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn styles(&self) -> TextStyle {
        self.styles
    }

    /// Returns true if the style changes nothing
    pub fn is_plain(&self) -> bool {
        self.color.is_none() && self.styles.is_empty()
    }
}

impl TryFrom<RawNameStyle> for NameStyle {
    type Error = String;

    fn try_from(raw: RawNameStyle) -> Result<Self, Self::Error> {
        let mut styles = TextStyle::empty();
        for name in &raw.styles {
            styles |= TextStyle::parse_name(name).ok_or_else(|| format!("unknown style '{}'", name))?;
        }
        Self::new(raw.color.as_deref(), styles)
    }
}

impl From<NameStyle> for RawNameStyle {
    fn from(style: NameStyle) -> Self {
        Self {
            color: style.color,
            styles: style.styles.names(),
        }
    }
}
