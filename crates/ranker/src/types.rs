//! Closed enumerations selecting the configuration tables.
//!
//! Caller-supplied strings are parsed leniently: matching ignores case and
//! surrounding whitespace, and anything unrecognized falls back to the
//! documented default instead of being rejected.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Risk category selecting filter thresholds and weight emphasis.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Risk {
    /// Conservative: tight drawdown cap, strongest stability weighting
    #[display("LOW")]
    Low,
    /// Balanced
    #[default]
    #[display("MID")]
    Mid,
    /// Aggressive: loose caps, strongest trend weighting
    #[display("HIGH")]
    High,
}

impl Risk {
    /// All risk categories in ascending order of appetite.
    pub const ALL: [Self; 3] = [Self::Low, Self::Mid, Self::High];

    /// Parse a caller string, falling back to [`Risk::Mid`].
    pub fn parse_lenient(s: &str) -> Self {
        match normalize_key(s).as_str() {
            "LOW" => Self::Low,
            "MID" => Self::Mid,
            "HIGH" => Self::High,
            _ => Self::default(),
        }
    }
}

/// Investment horizon selecting which windowed signals are read.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Horizon {
    /// Days to a couple of weeks
    #[display("SHORT")]
    Short,
    /// Roughly a month
    #[default]
    #[display("MID")]
    Mid,
    /// One quarter and beyond
    #[display("LONG")]
    Long,
}

impl Horizon {
    /// All horizons from shortest to longest.
    pub const ALL: [Self; 3] = [Self::Short, Self::Mid, Self::Long];

    /// Parse a caller string, falling back to [`Horizon::Mid`].
    pub fn parse_lenient(s: &str) -> Self {
        match normalize_key(s).as_str() {
            "SHORT" => Self::Short,
            "MID" => Self::Mid,
            "LONG" => Self::Long,
            _ => Self::default(),
        }
    }
}

/// Weight table variant.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effort {
    /// News-excluded weights
    #[display("SIMPLE")]
    Simple,
    /// News-aware weights
    #[default]
    #[display("OPTIMIZE")]
    Optimize,
}

impl Effort {
    /// Both weight table variants.
    pub const ALL: [Self; 2] = [Self::Simple, Self::Optimize];

    /// Parse a caller string, falling back to [`Effort::Optimize`].
    pub fn parse_lenient(s: &str) -> Self {
        match normalize_key(s).as_str() {
            "SIMPLE" => Self::Simple,
            "OPTIMIZE" => Self::Optimize,
            _ => Self::default(),
        }
    }
}

fn normalize_key(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}
