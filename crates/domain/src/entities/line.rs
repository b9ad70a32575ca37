//! Transit line with resolved display colors

use serde::{Deserialize, Serialize};

use crate::value_objects::ProductKind;

/// A transit line (e.g. "S5", "M10", "U8")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Backend line identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display label
    pub label: String,
    /// Product category
    pub product: ProductKind,
    /// Background color as `#RRGGBB`
    pub background_color: String,
    /// Foreground (text) color as `#RRGGBB`
    pub foreground_color: String,
}

impl Line {
    /// Build a line, resolving colors
    ///
    /// Explicit non-empty colors win; otherwise the product's fallback colors apply.
    #[must_use]
    pub fn new(
        id: Option<String>,
        label: impl Into<String>,
        product: ProductKind,
        background: Option<&str>,
        foreground: Option<&str>,
    ) -> Self {
        let pick = |explicit: Option<&str>, fallback: &str| {
            explicit
                .filter(|c| !c.trim().is_empty())
                .map_or_else(|| fallback.to_string(), str::to_string)
        };

        Self {
            id,
            label: label.into(),
            product,
            background_color: pick(background, product.fallback_background()),
            foreground_color: pick(foreground, product.fallback_foreground()),
        }
    }
}

/// Render a packed `0xRRGGBB` value (upper byte ignored) as `#RRGGBB`
#[must_use]
pub fn hex_color(rgb: u32) -> String {
    format!("#{:06X}", rgb & 0x00FF_FFFF)
}

/// Parse `#RRGGBB` / `RRGGBB` (or the short `#RGB` form) into a packed value
#[must_use]
pub fn parse_hex_color(color: &str) -> Option<u32> {
    let digits = color.trim().trim_start_matches('#');
    match digits.len() {
        6 => u32::from_str_radix(digits, 16).ok(),
        3 => {
            let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
            u32::from_str_radix(&expanded, 16).ok()
        },
        _ => None,
    }
}
