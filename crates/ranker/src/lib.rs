#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ranker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod filter;
pub mod frame;
pub mod horizon;
pub mod percentile;
pub mod profile;
pub mod scorer;
pub mod snapshot;
pub mod types;
pub mod weights;

// Re-export core types
pub use engine::{
    DEFAULT_TOP_N, EngineConfig, FieldsUsed, RankRequest, RankedResult, Ranker, Recommendation,
};
pub use error::{RankError, Result};
pub use filter::{FilterOutcome, FilterStats, RiskPolicy, RiskPolicyTable};
pub use frame::FrameSource;
pub use horizon::{HorizonConfig, HorizonTable, ResolvedFields};
pub use percentile::{NEUTRAL, to_percentile, to_stability};
pub use profile::{
    AdjustmentRule, AgeBracket, GoalKind, ProfileSummary, UserProfile, WealthBracket,
};
pub use scorer::{Components, RawRow, RawSignals, ScoredCandidate};
pub use snapshot::{
    FeatureRow, FeatureSnapshot, FeatureSource, MemorySource, parse_as_of, require_as_of,
};
pub use types::{Effort, Horizon, Risk};
pub use weights::{RiskWeights, WeightTable, WeightVector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
