//! Transport product classification

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of transport a line or stop serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductKind {
    /// S-Bahn
    SuburbanTrain,
    /// U-Bahn
    Subway,
    /// Tram / Straßenbahn
    Tram,
    /// Bus
    Bus,
    /// Ferry
    Ferry,
    /// RE / RB and long-distance express trains
    RegionalTrain,
}

impl ProductKind {
    /// Every product kind, in display order
    pub const ALL: [Self; 6] = [
        Self::SuburbanTrain,
        Self::Subway,
        Self::Tram,
        Self::Bus,
        Self::Ferry,
        Self::RegionalTrain,
    ];

    /// Map a backend product string; unknown values fall back to `Bus`
    #[must_use]
    pub fn from_backend(product: &str) -> Self {
        Self::parse_known(product).unwrap_or(Self::Bus)
    }

    /// Map a backend product string, returning `None` for unknown values
    #[must_use]
    pub fn parse_known(product: &str) -> Option<Self> {
        match product.to_ascii_lowercase().as_str() {
            "suburban" => Some(Self::SuburbanTrain),
            "subway" => Some(Self::Subway),
            "tram" => Some(Self::Tram),
            "bus" => Some(Self::Bus),
            "ferry" => Some(Self::Ferry),
            "regional" | "express" => Some(Self::RegionalTrain),
            _ => None,
        }
    }

    /// Background color used when a line carries no explicit color
    #[must_use]
    pub const fn fallback_background(&self) -> &'static str {
        match self {
            Self::SuburbanTrain => "#008C3C",
            Self::Subway => "#0066CC",
            Self::Tram => "#D8232A",
            Self::Bus => "#993399",
            Self::Ferry => "#0099CC",
            Self::RegionalTrain => "#EC192E",
        }
    }

    /// Foreground color used when a line carries no explicit color
    #[must_use]
    pub const fn fallback_foreground(&self) -> &'static str {
        "#FFFFFF"
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SuburbanTrain => "S-Bahn",
            Self::Subway => "U-Bahn",
            Self::Tram => "Tram",
            Self::Bus => "Bus",
            Self::Ferry => "Ferry",
            Self::RegionalTrain => "Regional Train",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
