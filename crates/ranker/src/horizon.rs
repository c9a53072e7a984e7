//! Horizon configuration and once-per-run field resolution.
//!
//! Each horizon names the return windows blended into the trend signal and,
//! for the other signals, an ordered list of candidate field names. The
//! first candidate present in the snapshot schema is chosen once and then
//! read for every entity, so all entities are compared on the same field.

use crate::{
    RankError, Result,
    snapshot::{FeatureRow, FeatureSnapshot},
    types::Horizon,
};
use serde::{Deserialize, Serialize};

/// Signal sources for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonConfig {
    /// Return windows in days; window `w` is read from field `r{w}`
    pub trend_windows: Vec<u32>,
    /// Blend weights, one per window
    pub trend_weights: Vec<f64>,
    /// Volume-anomaly candidates in preference order
    pub volume_fields: Vec<String>,
    /// Volatility candidates in preference order
    pub volatility_fields: Vec<String>,
    /// Drawdown candidates in preference order
    pub drawdown_fields: Vec<String>,
    /// News-intensity field
    pub news_field: String,
}

impl HorizonConfig {
    fn new(
        windows: &[u32],
        weights: &[f64],
        volume: &[&str],
        volatility: &[&str],
        drawdown: &[&str],
        news: &str,
    ) -> Self {
        let owned =
            |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        Self {
            trend_windows: windows.to_vec(),
            trend_weights: weights.to_vec(),
            volume_fields: owned(volume),
            volatility_fields: owned(volatility),
            drawdown_fields: owned(drawdown),
            news_field: news.to_string(),
        }
    }

    /// Field names composing the trend signal.
    pub fn trend_fields(&self) -> Vec<String> {
        self.trend_windows.iter().map(|w| format!("r{w}")).collect()
    }

    /// Resolve every logical signal against the snapshot schema.
    pub fn resolve(&self, snapshot: &FeatureSnapshot) -> ResolvedFields {
        let pick = |candidates: &[String]| {
            let chosen = candidates.iter().find(|f| snapshot.has_field(f)).cloned();
            if chosen.is_none() {
                tracing::warn!(?candidates, "no candidate field present in snapshot, reading 0.0");
            }
            chosen
        };

        ResolvedFields {
            trend: self
                .trend_fields()
                .into_iter()
                .zip(self.trend_weights.iter().copied())
                .collect(),
            volume: pick(&self.volume_fields),
            volatility: pick(&self.volatility_fields),
            drawdown: pick(&self.drawdown_fields),
            news: self.news_field.clone(),
        }
    }

    fn validate(&self, horizon: Horizon) -> Result<()> {
        if self.trend_windows.len() != self.trend_weights.len() {
            return Err(RankError::InvalidConfig(format!(
                "{horizon}: {} trend windows but {} trend weights",
                self.trend_windows.len(),
                self.trend_weights.len()
            )));
        }
        if self.trend_weights.iter().any(|w| !w.is_finite()) {
            return Err(RankError::InvalidConfig(format!(
                "{horizon}: trend weights must be finite"
            )));
        }
        Ok(())
    }
}

/// Horizon configurations keyed by [`Horizon`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonTable {
    /// SHORT horizon
    pub short: HorizonConfig,
    /// MID horizon
    pub mid: HorizonConfig,
    /// LONG horizon
    pub long: HorizonConfig,
}

impl Default for HorizonTable {
    fn default() -> Self {
        const WIDE_VOLUME: [&str; 5] = ["vz20", "volume_z20", "vz5", "volume_z5", "volume_z"];
        Self {
            short: HorizonConfig::new(
                &[1, 5],
                &[0.4, 0.6],
                &["vz5", "volume_z5", "volume_z"],
                &["vol10", "vol"],
                &["mdd10", "mdd"],
                "news3",
            ),
            mid: HorizonConfig::new(
                &[5, 20],
                &[0.6, 0.4],
                &WIDE_VOLUME,
                &["vol20", "vol"],
                &["mdd20", "mdd"],
                "news7",
            ),
            long: HorizonConfig::new(
                &[20, 60],
                &[0.3, 0.7],
                &WIDE_VOLUME,
                &["vol60", "vol"],
                &["mdd60", "mdd"],
                "news30",
            ),
        }
    }
}

impl HorizonTable {
    /// Configuration for `horizon`.
    pub const fn get(&self, horizon: Horizon) -> &HorizonConfig {
        match horizon {
            Horizon::Short => &self.short,
            Horizon::Mid => &self.mid,
            Horizon::Long => &self.long,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for horizon in Horizon::ALL {
            self.get(horizon).validate(horizon)?;
        }
        Ok(())
    }
}

/// Physical fields chosen for one ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFields {
    /// Trend fields with their blend weights
    pub trend: Vec<(String, f64)>,
    /// Volume-anomaly field, if any candidate is present
    pub volume: Option<String>,
    /// Volatility field, if any candidate is present
    pub volatility: Option<String>,
    /// Drawdown field, if any candidate is present
    pub drawdown: Option<String>,
    /// News field
    pub news: String,
}

impl ResolvedFields {
    /// Weighted blend of the trend windows; missing windows contribute 0.
    pub fn trend_raw(&self, row: &FeatureRow) -> f64 {
        self.trend
            .iter()
            .map(|(field, weight)| weight * row.value(field))
            .sum()
    }

    /// Value of an optional resolved field, 0.0 when unresolved.
    pub fn read(field: Option<&String>, row: &FeatureRow) -> f64 {
        field.map_or(0.0, |f| row.value(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn snapshot(fields: &[&str], rows: Vec<FeatureRow>) -> FeatureSnapshot {
        FeatureSnapshot::with_schema(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            fields.iter().copied(),
            rows,
        )
    }

    #[test]
    fn test_default_table_is_valid() {
        HorizonTable::default().validate().unwrap();
    }

    #[test]
    fn test_trend_fields() {
        let table = HorizonTable::default();
        assert_eq!(table.get(Horizon::Short).trend_fields(), vec!["r1", "r5"]);
        assert_eq!(table.get(Horizon::Mid).trend_fields(), vec!["r5", "r20"]);
        assert_eq!(table.get(Horizon::Long).trend_fields(), vec!["r20", "r60"]);
    }

    #[test]
    fn test_resolve_prefers_first_present_candidate() {
        let table = HorizonTable::default();
        let snap = snapshot(&["vol", "vol20", "mdd", "vz5", "volume_z"], Vec::new());
        let fields = table.get(Horizon::Mid).resolve(&snap);

        assert_eq!(fields.volatility.as_deref(), Some("vol20"));
        assert_eq!(fields.drawdown.as_deref(), Some("mdd"));
        assert_eq!(fields.volume.as_deref(), Some("vz5"));
        assert_eq!(fields.news, "news7");
    }

    #[test]
    fn test_resolve_without_candidates() {
        let table = HorizonTable::default();
        let fields = table.get(Horizon::Short).resolve(&snapshot(&[], Vec::new()));
        assert_eq!(fields.volatility, None);
        assert_eq!(fields.drawdown, None);
        assert_eq!(fields.volume, None);
        let row = FeatureRow::new("A", "a").with("vol10", 3.0);
        assert_eq!(ResolvedFields::read(fields.volatility.as_ref(), &row), 0.0);
    }

    #[test]
    fn test_trend_raw_blends_windows() {
        let table = HorizonTable::default();
        let snap = snapshot(&["r1", "r5"], Vec::new());
        let fields = table.get(Horizon::Short).resolve(&snap);

        let row = FeatureRow::new("A", "a").with("r1", 1.0).with("r5", 2.0);
        assert_relative_eq!(fields.trend_raw(&row), 0.4 + 1.2, epsilon = 1e-12);

        let partial = FeatureRow::new("B", "b").with("r5", 2.0);
        assert_relative_eq!(fields.trend_raw(&partial), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_mismatched_lengths() {
        let mut table = HorizonTable::default();
        table.long.trend_weights.push(0.1);
        assert!(matches!(table.validate(), Err(RankError::InvalidConfig(_))));
    }
}
