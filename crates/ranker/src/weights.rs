//! Composite weight tables.
//!
//! Weights are tuned design constants and are deliberately not normalized
//! to sum to one.

use crate::{
    RankError, Result,
    types::{Effort, Risk},
};
use serde::{Deserialize, Serialize};

/// Weights for the five scoring dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Trend
    pub trend: f64,
    /// Volume anomaly
    pub volume: f64,
    /// News intensity
    pub news: f64,
    /// Volatility stability
    pub volatility: f64,
    /// Drawdown stability
    pub drawdown: f64,
}

impl WeightVector {
    /// Create a weight vector in (trend, volume, news, volatility, drawdown) order.
    pub const fn new(trend: f64, volume: f64, news: f64, volatility: f64, drawdown: f64) -> Self {
        Self {
            trend,
            volume,
            news,
            volatility,
            drawdown,
        }
    }

    /// Copy with the news weight forced to zero.
    #[must_use]
    pub const fn without_news(self) -> Self {
        Self { news: 0.0, ..self }
    }

    const fn as_array(&self) -> [f64; 5] {
        [
            self.trend,
            self.volume,
            self.news,
            self.volatility,
            self.drawdown,
        ]
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RankError::InvalidConfig(format!(
                "{label}: weights must be finite and non-negative"
            )));
        }
        Ok(())
    }
}

/// Weights for each risk category within one effort variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// LOW
    pub low: WeightVector,
    /// MID
    pub mid: WeightVector,
    /// HIGH
    pub high: WeightVector,
}

impl RiskWeights {
    const fn get(&self, risk: Risk) -> WeightVector {
        match risk {
            Risk::Low => self.low,
            Risk::Mid => self.mid,
            Risk::High => self.high,
        }
    }
}

/// Weight vectors keyed by (effort, risk).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    /// News-excluded variant
    pub simple: RiskWeights,
    /// News-aware variant
    pub optimize: RiskWeights,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            optimize: RiskWeights {
                low: WeightVector::new(0.30, 0.10, 0.10, 0.25, 0.25),
                mid: WeightVector::new(0.35, 0.15, 0.15, 0.20, 0.15),
                high: WeightVector::new(0.40, 0.20, 0.20, 0.10, 0.10),
            },
            simple: RiskWeights {
                low: WeightVector::new(0.35, 0.10, 0.00, 0.30, 0.25),
                mid: WeightVector::new(0.40, 0.15, 0.00, 0.25, 0.20),
                high: WeightVector::new(0.45, 0.25, 0.00, 0.15, 0.15),
            },
        }
    }
}

impl WeightTable {
    /// Table entry for (effort, risk), with news zeroed when excluded.
    pub const fn select(&self, effort: Effort, risk: Risk, include_news: bool) -> WeightVector {
        let weights = match effort {
            Effort::Simple => self.simple.get(risk),
            Effort::Optimize => self.optimize.get(risk),
        };
        if include_news {
            weights
        } else {
            weights.without_news()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for effort in Effort::ALL {
            for risk in Risk::ALL {
                self.select(effort, risk, true)
                    .validate(&format!("{effort}/{risk}"))?;
            }
        }
        Ok(())
    }
}
