//! Two-stage risk filter.
//!
//! Stage A is a hard drawdown cap. Stage B drops the most volatile entities
//! by percentile within the Stage A survivors. Each stage fails open: when
//! it would remove every entity, the stage is skipped and its input set is
//! kept, so filtering alone never produces an empty shortlist.

use crate::{RankError, Result, percentile::to_percentile, types::Risk};
use serde::{Deserialize, Serialize};

/// Filter thresholds for one risk category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Largest acceptable raw drawdown
    pub max_drawdown: f64,
    /// Largest acceptable volatility percentile in [0, 1]
    pub max_volatility_pct: f64,
}

impl RiskPolicy {
    /// Create a policy.
    pub const fn new(max_drawdown: f64, max_volatility_pct: f64) -> Self {
        Self {
            max_drawdown,
            max_volatility_pct,
        }
    }

    /// Stage A predicate. A drawdown of exactly zero means the value was
    /// missing and always passes.
    pub fn passes_drawdown(&self, drawdown: f64) -> bool {
        drawdown <= self.max_drawdown || drawdown == 0.0
    }

    /// Run both stages and return surviving indices in input order.
    pub fn apply(&self, drawdowns: &[f64], volatilities: &[f64]) -> FilterOutcome {
        debug_assert_eq!(drawdowns.len(), volatilities.len());
        let universe = drawdowns.len();

        let mut stage_a: Vec<usize> = (0..universe)
            .filter(|&i| self.passes_drawdown(drawdowns[i]))
            .collect();
        let drawdown_fallback = stage_a.is_empty() && universe > 0;
        if drawdown_fallback {
            tracing::warn!(
                universe,
                max_drawdown = self.max_drawdown,
                "drawdown cap removed every entity, keeping full set"
            );
            stage_a = (0..universe).collect();
        }

        let vols: Vec<f64> = stage_a.iter().map(|&i| volatilities[i]).collect();
        let vol_pct = to_percentile(&vols);
        let mut stage_b: Vec<usize> = stage_a
            .iter()
            .zip(&vol_pct)
            .filter(|&(_, &p)| p <= self.max_volatility_pct)
            .map(|(&i, _)| i)
            .collect();
        let volatility_fallback = stage_b.is_empty() && !stage_a.is_empty();
        if volatility_fallback {
            tracing::warn!(
                survivors = stage_a.len(),
                max_volatility_pct = self.max_volatility_pct,
                "volatility cut removed every entity, keeping drawdown survivors"
            );
            stage_b = stage_a.clone();
        }

        FilterOutcome {
            stats: FilterStats {
                universe,
                after_drawdown: stage_a.len(),
                after_volatility: stage_b.len(),
                drawdown_fallback,
                volatility_fallback,
            },
            survivors: stage_b,
        }
    }

    fn validate(&self, risk: Risk) -> Result<()> {
        if !self.max_drawdown.is_finite() {
            return Err(RankError::InvalidConfig(format!(
                "{risk}: max drawdown must be finite"
            )));
        }
        if !(0.0..=1.0).contains(&self.max_volatility_pct) {
            return Err(RankError::InvalidConfig(format!(
                "{risk}: volatility percentile {} outside [0, 1]",
                self.max_volatility_pct
            )));
        }
        Ok(())
    }
}

/// Risk policies keyed by [`Risk`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicyTable {
    /// LOW: drop the top 20% most volatile
    pub low: RiskPolicy,
    /// MID
    pub mid: RiskPolicy,
    /// HIGH
    pub high: RiskPolicy,
}

impl Default for RiskPolicyTable {
    fn default() -> Self {
        Self {
            low: RiskPolicy::new(0.25, 0.80),
            mid: RiskPolicy::new(0.35, 0.90),
            high: RiskPolicy::new(0.50, 0.98),
        }
    }
}

impl RiskPolicyTable {
    /// Policy for `risk`.
    pub const fn get(&self, risk: Risk) -> &RiskPolicy {
        match risk {
            Risk::Low => &self.low,
            Risk::Mid => &self.mid,
            Risk::High => &self.high,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for risk in Risk::ALL {
            self.get(risk).validate(risk)?;
        }
        Ok(())
    }
}

/// Surviving indices plus per-stage counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Indices into the input, ascending
    pub survivors: Vec<usize>,
    /// Counts for provenance
    pub stats: FilterStats,
}

/// How many entities each filter stage kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Entities in the snapshot
    pub universe: usize,
    /// Survivors of the drawdown cap
    pub after_drawdown: usize,
    /// Survivors of the volatility cut
    pub after_volatility: usize,
    /// Drawdown cap was skipped because it removed everything
    pub drawdown_fallback: bool,
    /// Volatility cut was skipped because it removed everything
    pub volatility_fallback: bool,
}
