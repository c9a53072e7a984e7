//! Profile-based score adjustment.
//!
//! A profile selects up to three rules: one from its age bracket, one from
//! its stated goal and one from its wealth bracket. Each rule maps an
//! entity's raw signals to a multiplier. Rules are folded over every
//! candidate in the fixed order age, goal, wealth; because multipliers are
//! cumulative the order is part of the observable result.

use crate::scorer::{RawSignals, ScoredCandidate, sort_candidates};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Optional user attributes.
///
/// Income and savings are expressed in ten-thousands of the local currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Age in years
    pub age: Option<u32>,
    /// Free-text investment goal
    pub investment_goal: Option<String>,
    /// Annual income
    pub income: Option<f64>,
    /// Savings
    pub savings: Option<f64>,
}

/// Age-driven preference.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    /// Under 35: growth
    #[display("young")]
    Young,
    /// 35 to 54: no adjustment
    #[display("middle")]
    Middle,
    /// 55 and over: stability
    #[display("senior")]
    Senior,
}

impl AgeBracket {
    /// Bracket for an age; zero is treated as unknown.
    pub const fn from_age(age: u32) -> Option<Self> {
        match age {
            0 => None,
            1..35 => Some(Self::Young),
            35..55 => Some(Self::Middle),
            _ => Some(Self::Senior),
        }
    }
}

/// Goal category recognized in the free-text goal.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Retirement or pension
    #[display("retirement")]
    Retirement,
    /// Short-term profit
    #[display("short_term")]
    ShortTerm,
    /// Education or family
    #[display("education")]
    Education,
}

impl GoalKind {
    const KEYWORDS: [(Self, &'static [&'static str]); 3] = [
        (Self::Retirement, &["노후", "연금", "retire", "pension"]),
        (
            Self::ShortTerm,
            &["단기", "수익", "short-term", "short term", "profit"],
        ),
        (Self::Education, &["자녀", "교육", "education", "child", "family"]),
    ];

    /// First category whose keywords occur in `goal`, case-insensitively.
    pub fn detect(goal: &str) -> Option<Self> {
        let goal = goal.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| goal.contains(w)))
            .map(|(kind, _)| *kind)
    }
}

/// Income/savings bracket.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WealthBracket {
    /// Income or savings at least 10000
    #[display("high")]
    High,
    /// Income or savings at least 5000
    #[display("medium")]
    Medium,
    /// Below both thresholds
    #[display("low")]
    Low,
}

impl WealthBracket {
    const HIGH: f64 = 10_000.0;
    const MEDIUM: f64 = 5_000.0;

    /// Bracket for an income or savings figure taken alone.
    pub fn from_amount(amount: f64) -> Self {
        Self::from_pair(amount, f64::NEG_INFINITY)
    }

    /// Bracket from income and savings; the larger signal wins.
    pub fn from_pair(income: f64, savings: f64) -> Self {
        if income >= Self::HIGH || savings >= Self::HIGH {
            Self::High
        } else if income >= Self::MEDIUM || savings >= Self::MEDIUM {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One multiplicative adjustment.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AdjustmentRule {
    /// Age bracket rule
    #[display("age:{_0}")]
    Age(AgeBracket),
    /// Goal keyword rule
    #[display("goal:{_0}")]
    Goal(GoalKind),
    /// Income/savings rule
    #[display("wealth:{_0}")]
    Wealth(WealthBracket),
}

impl AdjustmentRule {
    /// Multiplier this rule applies to an entity with raw signals `raw`.
    pub fn multiplier(&self, raw: &RawSignals) -> f64 {
        match self {
            Self::Age(AgeBracket::Young) => {
                if raw.trend > 5.0 {
                    1.1
                } else {
                    1.0
                }
            }
            Self::Age(AgeBracket::Middle) => 1.0,
            Self::Age(AgeBracket::Senior) => {
                if raw.volatility < 2.0 {
                    1.15
                } else if raw.volatility > 4.0 {
                    0.85
                } else {
                    1.0
                }
            }
            Self::Goal(GoalKind::Retirement) => {
                if raw.drawdown < 0.15 {
                    1.1
                } else {
                    1.0
                }
            }
            Self::Goal(GoalKind::ShortTerm) => {
                if raw.trend > 3.0 {
                    1.1
                } else {
                    1.0
                }
            }
            Self::Goal(GoalKind::Education) => {
                if raw.volatility > 2.0 && raw.volatility < 3.5 {
                    1.05
                } else {
                    1.0
                }
            }
            Self::Wealth(WealthBracket::High) => 1.0,
            Self::Wealth(WealthBracket::Medium) => {
                if raw.volatility > 5.0 || raw.drawdown > 0.3 {
                    0.9
                } else {
                    1.0
                }
            }
            Self::Wealth(WealthBracket::Low) => {
                if raw.volatility > 3.5 || raw.drawdown > 0.2 {
                    0.7
                } else if raw.volatility < 2.5 && raw.drawdown < 0.15 {
                    1.2
                } else {
                    1.0
                }
            }
        }
    }
}

impl UserProfile {
    /// Rules this profile selects, in application order.
    pub fn rules(&self) -> Vec<AdjustmentRule> {
        let mut rules = Vec::with_capacity(3);

        if let Some(bracket) = self.age.and_then(AgeBracket::from_age) {
            rules.push(AdjustmentRule::Age(bracket));
        }

        if let Some(kind) = self.investment_goal.as_deref().and_then(GoalKind::detect) {
            rules.push(AdjustmentRule::Goal(kind));
        }

        if let Some(bracket) = self.wealth_bracket() {
            rules.push(AdjustmentRule::Wealth(bracket));
        }

        rules
    }

    /// Wealth bracket, only when both income and savings are known and
    /// non-zero.
    pub fn wealth_bracket(&self) -> Option<WealthBracket> {
        match (self.income, self.savings) {
            (Some(income), Some(savings)) if income != 0.0 && savings != 0.0 => {
                Some(WealthBracket::from_pair(income, savings))
            }
            _ => None,
        }
    }

    /// Income level reported back to the caller, from income alone.
    pub fn income_level(&self) -> Option<WealthBracket> {
        self.income
            .filter(|i| *i != 0.0)
            .map(WealthBracket::from_amount)
    }

    /// Apply the rules to `candidates` and re-sort by adjusted score.
    ///
    /// Returns the rules that were applied.
    pub fn adjust(&self, candidates: &mut [ScoredCandidate]) -> Vec<AdjustmentRule> {
        let rules = self.rules();
        for candidate in candidates.iter_mut() {
            candidate.score = rules
                .iter()
                .fold(candidate.score, |score, rule| score * rule.multiplier(&candidate.raw));
        }
        sort_candidates(candidates);
        tracing::debug!(rules = ?rules, candidates = candidates.len(), "applied profile rules");
        rules
    }
}

/// Profile echo carried in ranking results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Age as supplied
    pub age: Option<u32>,
    /// Goal text as supplied
    pub investment_goal: Option<String>,
    /// Income bracket derived from income alone
    pub income_level: Option<WealthBracket>,
    /// Applied rules in order, e.g. `age:senior`
    pub rules: Vec<String>,
}

impl ProfileSummary {
    pub(crate) fn new(profile: &UserProfile, rules: &[AdjustmentRule]) -> Self {
        Self {
            age: profile.age,
            investment_goal: profile.investment_goal.clone(),
            income_level: profile.income_level(),
            rules: rules.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Components;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn raw(trend: f64, volatility: f64, drawdown: f64) -> RawSignals {
        RawSignals {
            trend,
            volume: 0.0,
            news: 0.0,
            volatility,
            drawdown,
        }
    }

    fn candidate(position: usize, score: f64, raw: RawSignals) -> ScoredCandidate {
        ScoredCandidate {
            position,
            code: format!("C{position}"),
            name: String::new(),
            score,
            components: Components::default(),
            raw,
        }
    }

    #[rstest]
    #[case(0, None)]
    #[case(20, Some(AgeBracket::Young))]
    #[case(34, Some(AgeBracket::Young))]
    #[case(35, Some(AgeBracket::Middle))]
    #[case(54, Some(AgeBracket::Middle))]
    #[case(55, Some(AgeBracket::Senior))]
    #[case(80, Some(AgeBracket::Senior))]
    fn test_age_bracket(#[case] age: u32, #[case] expected: Option<AgeBracket>) {
        assert_eq!(AgeBracket::from_age(age), expected);
    }

    #[rstest]
    #[case("노후 대비", Some(GoalKind::Retirement))]
    #[case("Retirement savings", Some(GoalKind::Retirement))]
    #[case("단기 수익", Some(GoalKind::ShortTerm))]
    #[case("Quick PROFIT", Some(GoalKind::ShortTerm))]
    #[case("자녀 교육비", Some(GoalKind::Education))]
    #[case("pension and profit", Some(GoalKind::Retirement))]
    #[case("buy a house", None)]
    fn test_goal_detect(#[case] goal: &str, #[case] expected: Option<GoalKind>) {
        assert_eq!(GoalKind::detect(goal), expected);
    }

    #[rstest]
    #[case(12_000.0, 100.0, WealthBracket::High)]
    #[case(100.0, 10_000.0, WealthBracket::High)]
    #[case(5_000.0, 100.0, WealthBracket::Medium)]
    #[case(4_999.0, 4_999.0, WealthBracket::Low)]
    fn test_wealth_bracket(
        #[case] income: f64,
        #[case] savings: f64,
        #[case] expected: WealthBracket,
    ) {
        assert_eq!(WealthBracket::from_pair(income, savings), expected);
    }

    #[rstest]
    #[case(AdjustmentRule::Age(AgeBracket::Young), raw(6.0, 0.0, 0.0), 1.1)]
    #[case(AdjustmentRule::Age(AgeBracket::Young), raw(5.0, 0.0, 0.0), 1.0)]
    #[case(AdjustmentRule::Age(AgeBracket::Middle), raw(9.0, 9.0, 0.9), 1.0)]
    #[case(AdjustmentRule::Age(AgeBracket::Senior), raw(0.0, 1.5, 0.0), 1.15)]
    #[case(AdjustmentRule::Age(AgeBracket::Senior), raw(0.0, 4.5, 0.0), 0.85)]
    #[case(AdjustmentRule::Age(AgeBracket::Senior), raw(0.0, 3.0, 0.0), 1.0)]
    #[case(AdjustmentRule::Goal(GoalKind::Retirement), raw(0.0, 0.0, 0.1), 1.1)]
    #[case(AdjustmentRule::Goal(GoalKind::ShortTerm), raw(3.5, 0.0, 0.0), 1.1)]
    #[case(AdjustmentRule::Goal(GoalKind::Education), raw(0.0, 3.0, 0.0), 1.05)]
    #[case(AdjustmentRule::Goal(GoalKind::Education), raw(0.0, 3.5, 0.0), 1.0)]
    #[case(AdjustmentRule::Wealth(WealthBracket::High), raw(0.0, 9.0, 0.9), 1.0)]
    #[case(AdjustmentRule::Wealth(WealthBracket::Medium), raw(0.0, 5.5, 0.0), 0.9)]
    #[case(AdjustmentRule::Wealth(WealthBracket::Medium), raw(0.0, 1.0, 0.31), 0.9)]
    #[case(AdjustmentRule::Wealth(WealthBracket::Low), raw(0.0, 4.0, 0.0), 0.7)]
    #[case(AdjustmentRule::Wealth(WealthBracket::Low), raw(0.0, 2.0, 0.1), 1.2)]
    #[case(AdjustmentRule::Wealth(WealthBracket::Low), raw(0.0, 3.0, 0.1), 1.0)]
    fn test_rule_multiplier(
        #[case] rule: AdjustmentRule,
        #[case] raw: RawSignals,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(rule.multiplier(&raw), expected);
    }

    #[test]
    fn test_rules_order_age_goal_wealth() {
        let profile = UserProfile {
            age: Some(60),
            investment_goal: Some("연금 준비".to_string()),
            income: Some(3_000.0),
            savings: Some(1_000.0),
        };
        assert_eq!(
            profile.rules(),
            vec![
                AdjustmentRule::Age(AgeBracket::Senior),
                AdjustmentRule::Goal(GoalKind::Retirement),
                AdjustmentRule::Wealth(WealthBracket::Low),
            ]
        );
    }

    #[test]
    fn test_wealth_requires_both_amounts() {
        let profile = UserProfile {
            income: Some(20_000.0),
            ..Default::default()
        };
        assert_eq!(profile.wealth_bracket(), None);
        assert_eq!(profile.income_level(), Some(WealthBracket::High));

        let zero = UserProfile {
            income: Some(0.0),
            savings: Some(8_000.0),
            ..Default::default()
        };
        assert_eq!(zero.wealth_bracket(), None);
        assert_eq!(zero.income_level(), None);
    }

    #[test]
    fn test_adjust_multiplies_in_order_and_resorts() {
        let profile = UserProfile {
            age: Some(60),
            investment_goal: Some("retirement".to_string()),
            ..Default::default()
        };
        let mut candidates = vec![
            candidate(0, 1.0, raw(0.0, 3.0, 0.3)),
            candidate(1, 0.8, raw(0.0, 1.0, 0.1)),
        ];
        let applied = profile.adjust(&mut candidates);

        assert_eq!(applied.len(), 2);
        assert_eq!(candidates[0].position, 1);
        assert_relative_eq!(candidates[0].score, 0.8 * 1.15 * 1.1, epsilon = 1e-12);
        assert_relative_eq!(candidates[1].score, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_profile_is_identity() {
        let mut candidates = vec![candidate(0, 0.3, raw(9.0, 9.0, 0.9))];
        let applied = UserProfile::default().adjust(&mut candidates);
        assert!(applied.is_empty());
        assert_eq!(candidates[0].score, 0.3);
    }

    #[test]
    fn test_summary_rule_labels() {
        let profile = UserProfile {
            age: Some(25),
            investment_goal: Some("단기".to_string()),
            income: Some(6_000.0),
            savings: Some(100.0),
        };
        let summary = ProfileSummary::new(&profile, &profile.rules());
        assert_eq!(summary.rules, vec!["age:young", "goal:short_term", "wealth:medium"]);
        assert_eq!(summary.income_level, Some(WealthBracket::Medium));
    }
}
