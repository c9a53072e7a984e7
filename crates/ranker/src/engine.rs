//! Ranking orchestrator.
//!
//! Wires the pipeline in order: snapshot, raw rows, risk filter,
//! normalization and scoring on the survivors, optional profile
//! adjustment, truncation. The engine is a pure function of the snapshot,
//! the configuration and the request; it holds no state between calls and
//! can be shared freely across threads.

use crate::{
    RankError, Result,
    filter::{FilterStats, RiskPolicyTable},
    horizon::{HorizonTable, ResolvedFields},
    profile::{ProfileSummary, UserProfile},
    scorer::{Components, RawRow, RawSignals, ScoredCandidate, score_population, sort_candidates},
    snapshot::{FeatureSnapshot, FeatureSource},
    types::{Effort, Horizon, Risk},
    weights::{WeightTable, WeightVector},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default shortlist length.
pub const DEFAULT_TOP_N: usize = 20;

/// Placeholder reported for a signal with no field present in the snapshot.
const NO_FIELD: &str = "(none)";

/// All configuration tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Signal sources per horizon
    pub horizons: HorizonTable,
    /// Weight vectors per (effort, risk)
    pub weights: WeightTable,
    /// Filter thresholds per risk
    pub risk: RiskPolicyTable,
}

impl EngineConfig {
    /// Check table invariants.
    pub fn validate(&self) -> Result<()> {
        self.horizons.validate()?;
        self.weights.validate()?;
        self.risk.validate()
    }

    /// Parse and validate a JSON configuration. Omitted tables keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Parameters of one ranking call.
#[derive(Debug, Clone, PartialEq)]
pub struct RankRequest {
    /// Snapshot date
    pub as_of: NaiveDate,
    /// Risk category
    pub risk: Risk,
    /// Horizon
    pub horizon: Horizon,
    /// Weight table variant
    pub effort: Effort,
    /// Shortlist length; values below 1 are treated as 1
    pub top_n: usize,
    /// Whether the news signal may contribute
    pub include_news: bool,
    /// Optional profile for score adjustment
    pub profile: Option<UserProfile>,
}

impl RankRequest {
    /// Request with every parameter at its default.
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            risk: Risk::default(),
            horizon: Horizon::default(),
            effort: Effort::default(),
            top_n: DEFAULT_TOP_N,
            include_news: true,
            profile: None,
        }
    }

    /// Set the risk category.
    #[must_use]
    pub const fn risk(mut self, risk: Risk) -> Self {
        self.risk = risk;
        self
    }

    /// Set the horizon.
    #[must_use]
    pub const fn horizon(mut self, horizon: Horizon) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the weight table variant.
    #[must_use]
    pub const fn effort(mut self, effort: Effort) -> Self {
        self.effort = effort;
        self
    }

    /// Set the shortlist length.
    #[must_use]
    pub const fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Enable or disable the news signal.
    #[must_use]
    pub const fn include_news(mut self, include_news: bool) -> Self {
        self.include_news = include_news;
        self
    }

    /// Attach a user profile.
    #[must_use]
    pub fn profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }
}

/// Physical fields read in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsUsed {
    /// Trend window fields
    pub trend: Vec<String>,
    /// Volume-anomaly field
    pub volume: String,
    /// Volatility field
    pub volatility: String,
    /// Drawdown field
    pub drawdown: String,
    /// News field
    pub news: String,
}

impl FieldsUsed {
    fn from_resolved(fields: &ResolvedFields) -> Self {
        let or_none = |f: &Option<String>| f.clone().unwrap_or_else(|| NO_FIELD.to_string());
        Self {
            trend: fields.trend.iter().map(|(f, _)| f.clone()).collect(),
            volume: or_none(&fields.volume),
            volatility: or_none(&fields.volatility),
            drawdown: or_none(&fields.drawdown),
            news: fields.news.clone(),
        }
    }
}

/// One shortlisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Entity identifier
    pub code: String,
    /// Display name
    pub name: String,
    /// Final score
    pub score: f64,
    /// Normalized components
    pub components: Components,
    /// Raw signals
    pub raw: RawSignals,
}

impl From<ScoredCandidate> for Recommendation {
    fn from(c: ScoredCandidate) -> Self {
        Self {
            code: c.code,
            name: c.name,
            score: round6(c.score),
            components: Components {
                trend: round6(c.components.trend),
                volume: round6(c.components.volume),
                news: round6(c.components.news),
                volatility: round6(c.components.volatility),
                drawdown: round6(c.components.drawdown),
            },
            raw: RawSignals {
                trend: round6(c.raw.trend),
                volume: round6(c.raw.volume),
                news: round6(c.raw.news),
                volatility: round6(c.raw.volatility),
                drawdown: round6(c.raw.drawdown),
            },
        }
    }
}

/// Output of a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Date the ranking applies to
    pub as_of: NaiveDate,
    /// Date originally requested; set by [`Ranker::rank_with_fallback`] only
    /// when it fell back to another date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_as_of: Option<NaiveDate>,
    /// Risk category used
    pub risk: Risk,
    /// Horizon used
    pub horizon: Horizon,
    /// Weight variant used
    pub effort: Effort,
    /// Whether news was allowed
    pub include_news: bool,
    /// Weights used
    pub weights: WeightVector,
    /// Fields read; absent when there was no data
    pub fields_used: Option<FieldsUsed>,
    /// Filter counts; absent when there was no data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterStats>,
    /// Profile echo; absent without a profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
    /// Number of recommendations
    pub count: usize,
    /// Shortlist, best first
    pub recommendations: Vec<Recommendation>,
    /// Human-readable note
    pub detail: Option<String>,
}

impl RankedResult {
    fn no_data(request: &RankRequest, weights: WeightVector) -> Self {
        Self {
            as_of: request.as_of,
            requested_as_of: None,
            risk: request.risk,
            horizon: request.horizon,
            effort: request.effort,
            include_news: request.include_news,
            weights,
            fields_used: None,
            filter: None,
            profile: None,
            count: 0,
            recommendations: Vec::new(),
            detail: Some(format!("no feature data for date {}", request.as_of)),
        }
    }

    /// False when the snapshot for the date was empty.
    pub const fn has_data(&self) -> bool {
        self.fields_used.is_some()
    }

    /// Pretty JSON rendering.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(RankError::from)
    }
}

/// The ranking engine.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: EngineConfig,
}

impl Ranker {
    /// Engine over the given tables.
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the snapshot for `request.as_of` and rank it.
    pub fn rank(&self, source: &dyn FeatureSource, request: &RankRequest) -> Result<RankedResult> {
        let snapshot = source.features(request.as_of)?;
        Ok(self.rank_snapshot(&snapshot, request))
    }

    /// Like [`Ranker::rank`], but when the requested date has no data,
    /// retry with the provider's latest date.
    pub fn rank_with_fallback(
        &self,
        source: &dyn FeatureSource,
        request: &RankRequest,
    ) -> Result<RankedResult> {
        let result = self.rank(source, request)?;
        if result.has_data() {
            return Ok(result);
        }
        let Some(latest) = source.latest_as_of()?.filter(|d| *d != request.as_of) else {
            return Ok(result);
        };

        tracing::info!(
            requested = %request.as_of,
            %latest,
            "no data for requested date, using latest snapshot"
        );
        let retry = RankRequest {
            as_of: latest,
            ..request.clone()
        };
        let mut result = self.rank(source, &retry)?;
        result.requested_as_of = Some(request.as_of);
        Ok(result)
    }

    /// Rank an already loaded snapshot.
    pub fn rank_snapshot(&self, snapshot: &FeatureSnapshot, request: &RankRequest) -> RankedResult {
        let weights = self
            .config
            .weights
            .select(request.effort, request.risk, request.include_news);

        if snapshot.is_empty() {
            tracing::debug!(as_of = %request.as_of, "empty snapshot");
            return RankedResult::no_data(request, weights);
        }

        let news_active = request.include_news && weights.news > 0.0;
        let fields = self.config.horizons.get(request.horizon).resolve(snapshot);
        tracing::debug!(
            rows = snapshot.len(),
            volume = ?fields.volume,
            volatility = ?fields.volatility,
            drawdown = ?fields.drawdown,
            news_active,
            "resolved feature fields"
        );

        let rows = raw_rows(snapshot, &fields, news_active);

        let drawdowns: Vec<f64> = rows.iter().map(|r| r.raw.drawdown).collect();
        let volatilities: Vec<f64> = rows.iter().map(|r| r.raw.volatility).collect();
        let outcome = self
            .config
            .risk
            .get(request.risk)
            .apply(&drawdowns, &volatilities);
        tracing::debug!(
            universe = outcome.stats.universe,
            after_drawdown = outcome.stats.after_drawdown,
            after_volatility = outcome.stats.after_volatility,
            "risk filter applied"
        );

        let survivors: Vec<RawRow> = outcome
            .survivors
            .iter()
            .map(|&i| rows[i].clone())
            .collect();
        let mut scored = score_population(&survivors, &weights, news_active);
        sort_candidates(&mut scored);

        let profile = request.profile.as_ref().map(|p| {
            let rules = p.adjust(&mut scored);
            ProfileSummary::new(p, &rules)
        });

        scored.truncate(request.top_n.max(1));
        let recommendations: Vec<Recommendation> =
            scored.into_iter().map(Recommendation::from).collect();

        RankedResult {
            as_of: request.as_of,
            requested_as_of: None,
            risk: request.risk,
            horizon: request.horizon,
            effort: request.effort,
            include_news: request.include_news,
            weights,
            fields_used: Some(FieldsUsed::from_resolved(&fields)),
            filter: Some(outcome.stats),
            profile,
            count: recommendations.len(),
            recommendations,
            detail: None,
        }
    }
}

fn raw_rows(snapshot: &FeatureSnapshot, fields: &ResolvedFields, news_active: bool) -> Vec<RawRow> {
    snapshot
        .rows
        .iter()
        .enumerate()
        .map(|(position, row)| RawRow {
            position,
            code: row.code.clone(),
            name: row.name.clone(),
            raw: RawSignals {
                trend: fields.trend_raw(row),
                volume: ResolvedFields::read(fields.volume.as_ref(), row),
                news: if news_active {
                    row.value(&fields.news)
                } else {
                    0.0
                },
                volatility: ResolvedFields::read(fields.volatility.as_ref(), row),
                drawdown: ResolvedFields::read(fields.drawdown.as_ref(), row),
            },
        })
        .collect()
}

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
