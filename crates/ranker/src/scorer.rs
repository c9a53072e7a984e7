//! Composite scoring over the filtered population.

use crate::{
    percentile::{to_percentile, to_stability},
    weights::WeightVector,
};
use serde::{Deserialize, Serialize};

/// Raw values of the five dimensions for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignals {
    /// Blended trend
    #[serde(rename = "T_raw")]
    pub trend: f64,
    /// Volume anomaly
    #[serde(rename = "U_raw")]
    pub volume: f64,
    /// News intensity
    #[serde(rename = "N_raw")]
    pub news: f64,
    /// Volatility
    #[serde(rename = "V_raw")]
    pub volatility: f64,
    /// Drawdown
    #[serde(rename = "D_raw")]
    pub drawdown: f64,
}

/// Normalized contributions in [0, 1]; volatility and drawdown are
/// stability values (`1 - percentile`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Trend percentile
    #[serde(rename = "T")]
    pub trend: f64,
    /// Volume-anomaly percentile
    #[serde(rename = "U")]
    pub volume: f64,
    /// News percentile
    #[serde(rename = "N")]
    pub news: f64,
    /// Volatility stability
    #[serde(rename = "V")]
    pub volatility: f64,
    /// Drawdown stability
    #[serde(rename = "D")]
    pub drawdown: f64,
}

impl Components {
    /// Weighted sum.
    pub fn weighted(&self, w: &WeightVector) -> f64 {
        w.trend * self.trend
            + w.volume * self.volume
            + w.news * self.news
            + w.volatility * self.volatility
            + w.drawdown * self.drawdown
    }
}

/// One entity's raw signals, tagged with its snapshot position.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Index in the snapshot, used as the final tie-break
    pub position: usize,
    /// Entity identifier
    pub code: String,
    /// Display name
    pub name: String,
    /// Raw signals
    pub raw: RawSignals,
}

/// A scored entity with full provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Index in the snapshot
    pub position: usize,
    /// Entity identifier
    pub code: String,
    /// Display name
    pub name: String,
    /// Composite score, possibly profile-adjusted
    pub score: f64,
    /// Normalized components
    pub components: Components,
    /// Raw signals
    pub raw: RawSignals,
}

/// Normalize each dimension across `rows` and compute composite scores.
///
/// When `news_active` is false the news component is reported as 0.0
/// instead of being ranked.
pub fn score_population(
    rows: &[RawRow],
    weights: &WeightVector,
    news_active: bool,
) -> Vec<ScoredCandidate> {
    let column = |f: fn(&RawSignals) -> f64| rows.iter().map(|r| f(&r.raw)).collect::<Vec<_>>();

    let trend = to_percentile(&column(|r| r.trend));
    let volume = to_percentile(&column(|r| r.volume));
    let news = if news_active {
        to_percentile(&column(|r| r.news))
    } else {
        vec![0.0; rows.len()]
    };
    let volatility = to_stability(&column(|r| r.volatility));
    let drawdown = to_stability(&column(|r| r.drawdown));

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let components = Components {
                trend: trend[i],
                volume: volume[i],
                news: news[i],
                volatility: volatility[i],
                drawdown: drawdown[i],
            };
            ScoredCandidate {
                position: row.position,
                code: row.code.clone(),
                name: row.name.clone(),
                score: components.weighted(weights),
                components,
                raw: row.raw,
            }
        })
        .collect()
}

/// Sort by score descending; equal scores keep snapshot order.
pub fn sort_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        (b.score + 0.0)
            .total_cmp(&(a.score + 0.0))
            .then_with(|| a.position.cmp(&b.position))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(position: usize, trend: f64, volatility: f64, drawdown: f64) -> RawRow {
        RawRow {
            position,
            code: format!("C{position}"),
            name: String::new(),
            raw: RawSignals {
                trend,
                volume: 0.0,
                news: 0.0,
                volatility,
                drawdown,
            },
        }
    }

    #[test]
    fn test_components_in_unit_interval() {
        let rows = vec![row(0, -0.02, 1.0, 0.1), row(1, 0.0, 2.0, 0.2), row(2, 0.05, 3.0, 0.3)];
        let w = WeightVector::new(1.0, 1.0, 1.0, 1.0, 1.0);
        let scored = score_population(&rows, &w, true);

        assert_eq!(scored[0].components.trend, 0.0);
        assert_eq!(scored[1].components.trend, 0.5);
        assert_eq!(scored[2].components.trend, 1.0);
        // Lowest volatility is the most stable
        assert_eq!(scored[0].components.volatility, 1.0);
        assert_eq!(scored[2].components.volatility, 0.0);
        for c in &scored {
            for v in [
                c.components.trend,
                c.components.volume,
                c.components.news,
                c.components.volatility,
                c.components.drawdown,
            ] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_score_is_weighted_sum() {
        let rows = vec![row(0, 1.0, 1.0, 0.1), row(1, 2.0, 2.0, 0.2)];
        let w = WeightVector::new(0.4, 0.0, 0.0, 0.1, 0.2);
        let scored = score_population(&rows, &w, true);

        // Row 0: trend 0, vol stab 1, dd stab 1
        assert_relative_eq!(scored[0].score, 0.1 + 0.2, epsilon = 1e-12);
        // Row 1: trend 1, vol stab 0, dd stab 0
        assert_relative_eq!(scored[1].score, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_single_survivor_is_neutral() {
        let scored = score_population(
            &[row(3, 123.0, 9.0, 0.4)],
            &WeightVector::new(1.0, 1.0, 0.0, 1.0, 1.0),
            false,
        );
        let c = scored[0].components;
        assert_eq!(c.trend, 0.5);
        assert_eq!(c.volatility, 0.5);
        assert_eq!(c.drawdown, 0.5);
        assert_eq!(c.news, 0.0);
        assert_eq!(scored[0].position, 3);
    }

    #[test]
    fn test_inactive_news_reports_zero() {
        let mut rows = vec![row(0, 1.0, 1.0, 0.1), row(1, 2.0, 2.0, 0.2)];
        rows[1].raw.news = 5.0;
        let scored = score_population(&rows, &WeightVector::default(), false);
        assert!(scored.iter().all(|c| c.components.news == 0.0));
    }

    #[test]
    fn test_sort_ties_by_position() {
        let w = WeightVector::default();
        let rows = [row(1, 0.0, 0.0, 0.0), row(0, 0.0, 0.0, 0.0)];
        let mut scored = score_population(&rows, &w, true);
        scored[0].score = 1.0;
        scored[1].score = 1.0;
        sort_candidates(&mut scored);
        assert_eq!(scored[0].position, 0);
        assert_eq!(scored[1].position, 1);
    }

    #[test]
    fn test_sort_signed_zero_scores_tie() {
        let w = WeightVector::default();
        let rows = [row(1, 0.0, 0.0, 0.0), row(0, 0.0, 0.0, 0.0)];
        let mut scored = score_population(&rows, &w, true);
        scored[0].score = 0.0;
        scored[1].score = -0.0;
        sort_candidates(&mut scored);
        assert_eq!(scored[0].position, 0);
        assert_eq!(scored[1].position, 1);
    }
}
