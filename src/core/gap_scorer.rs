use crate::domain::model::clamp_percent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 三個分量的權重，預設 40/30/30
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapWeights {
    pub demand: f64,
    pub saturation: f64,
    pub quality_gap: f64,
}

impl Default for GapWeights {
    fn default() -> Self {
        Self {
            demand: 0.40,
            saturation: 0.30,
            quality_gap: 0.30,
        }
    }
}

/// 加分條件：本國需求夠高、目標市場熱度與競品品質夠低
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusRule {
    pub home_min: f64,
    /// `None` 表示不看目標市場熱度
    pub target_max: Option<f64>,
    pub quality_max: f64,
    pub points: f64,
}

impl BonusRule {
    pub fn golden() -> Self {
        Self {
            home_min: 70.0,
            target_max: Some(30.0),
            quality_max: 40.0,
            points: 10.0,
        }
    }

    pub fn strong() -> Self {
        Self {
            home_min: 60.0,
            target_max: None,
            quality_max: 30.0,
            points: 5.0,
        }
    }

    pub fn applies(&self, home_interest: f64, target_interest: f64, target_quality: f64) -> bool {
        home_interest >= self.home_min
            && self.target_max.map_or(true, |max| target_interest <= max)
            && target_quality <= self.quality_max
    }
}

/// 設定檔中的部分覆蓋，沒寫的欄位沿用該規則自己的預設值
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BonusRuleOverride {
    pub home_min: Option<f64>,
    pub target_max: Option<f64>,
    pub quality_max: Option<f64>,
    pub points: Option<f64>,
}

impl BonusRuleOverride {
    pub fn apply(self, base: BonusRule) -> BonusRule {
        BonusRule {
            home_min: self.home_min.unwrap_or(base.home_min),
            target_max: self.target_max.or(base.target_max),
            quality_max: self.quality_max.unwrap_or(base.quality_max),
            points: self.points.unwrap_or(base.points),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bonus {
    Golden,
    Strong,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpportunityCategory {
    Poor,
    Weak,
    Moderate,
    Strong,
    Excellent,
}

impl OpportunityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            OpportunityCategory::Excellent => "EXCELLENT",
            OpportunityCategory::Strong => "STRONG",
            OpportunityCategory::Moderate => "MODERATE",
            OpportunityCategory::Weak => "WEAK",
            OpportunityCategory::Poor => "POOR",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            OpportunityCategory::Excellent => "🔥",
            OpportunityCategory::Strong => "✅",
            OpportunityCategory::Moderate => "⚠️",
            OpportunityCategory::Weak => "⚡",
            OpportunityCategory::Poor => "❌",
        }
    }
}

impl fmt::Display for OpportunityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    pub category: OpportunityCategory,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct GapScorer {
    weights: GapWeights,
    golden: BonusRule,
    strong: BonusRule,
    home_label: String,
    target_label: String,
}

impl Default for GapScorer {
    fn default() -> Self {
        Self::new(GapWeights::default(), BonusRule::golden(), BonusRule::strong())
    }
}

impl GapScorer {
    pub fn new(weights: GapWeights, golden: BonusRule, strong: BonusRule) -> Self {
        Self {
            weights,
            golden,
            strong,
            home_label: "US".to_string(),
            target_label: "BR".to_string(),
        }
    }

    /// 洞察文字中使用的市場名稱，通常是地區代碼
    pub fn with_market_labels(mut self, home: impl Into<String>, target: impl Into<String>) -> Self {
        self.home_label = home.into();
        self.target_label = target.into();
        self
    }

    /// 計算缺口分數 (0-100)，四捨五入到小數一位
    pub fn calculate_gap_score(
        &self,
        home_interest: u8,
        target_interest: u8,
        target_avg_quality: f64,
    ) -> f64 {
        let home = clamp_percent(home_interest as f64);
        let target = clamp_percent(target_interest as f64);
        let quality = clamp_percent(target_avg_quality);

        let demand_component = home * self.weights.demand;
        let saturation_component = (100.0 - target) * self.weights.saturation;
        let quality_gap_component = (100.0 - quality) * self.weights.quality_gap;
        let base = demand_component + saturation_component + quality_gap_component;

        let (bonus, points) = self.bonus(home, target, quality);
        match bonus {
            Bonus::Golden => tracing::info!("🎯 GOLDEN OPPORTUNITY detected! (+{} bonus)", points),
            Bonus::Strong => tracing::info!("⭐ Strong opportunity detected! (+{} bonus)", points),
            Bonus::None => {}
        }

        let score = clamp_percent(base + points);

        tracing::debug!(
            "Gap score breakdown: demand={:.1}, saturation={:.1}, quality_gap={:.1}, bonus={:.1}, total={:.1}",
            demand_component,
            saturation_component,
            quality_gap_component,
            points,
            score
        );

        round_one_decimal(score)
    }

    /// 黃金條件優先判斷，兩者互斥
    pub fn bonus(&self, home_interest: f64, target_interest: f64, target_quality: f64) -> (Bonus, f64) {
        if self.golden.applies(home_interest, target_interest, target_quality) {
            (Bonus::Golden, self.golden.points)
        } else if self.strong.applies(home_interest, target_interest, target_quality) {
            (Bonus::Strong, self.strong.points)
        } else {
            (Bonus::None, 0.0)
        }
    }

    pub fn categorize(&self, score: f64) -> Opportunity {
        if score >= 80.0 {
            Opportunity {
                category: OpportunityCategory::Excellent,
                description: "High home demand, weak target competition - top priority",
            }
        } else if score >= 65.0 {
            Opportunity {
                category: OpportunityCategory::Strong,
                description: "Good opportunity with favorable conditions",
            }
        } else if score >= 50.0 {
            Opportunity {
                category: OpportunityCategory::Moderate,
                description: "Moderate opportunity, requires validation",
            }
        } else if score >= 35.0 {
            Opportunity {
                category: OpportunityCategory::Weak,
                description: "Low opportunity, high competition or low demand",
            }
        } else {
            Opportunity {
                category: OpportunityCategory::Poor,
                description: "Not recommended - saturated or low demand",
            }
        }
    }

    /// 純描述用，不影響分數
    pub fn insights(
        &self,
        home_interest: u8,
        target_interest: u8,
        target_quality: f64,
        score: f64,
    ) -> String {
        let demand = match home_interest {
            70.. => "Strong",
            40..=69 => "Moderate",
            _ => "Low",
        };

        let competitors = if target_quality < 30.0 {
            "very weak"
        } else if target_quality < 50.0 {
            "weak"
        } else if target_quality < 70.0 {
            "moderate"
        } else {
            "strong"
        };

        let saturation = match target_interest {
            0..=19 => "untapped",
            20..=49 => "growing",
            _ => "saturated",
        };

        let category = self.categorize(score).category;

        format!(
            "{}: {} {} demand, {} {} competitors, {} {} market",
            category,
            demand,
            self.home_label,
            competitors,
            self.target_label,
            saturation,
            self.target_label
        )
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> GapScorer {
        GapScorer::default()
    }

    #[test]
    fn test_perfect_opportunity() {
        let score = scorer().calculate_gap_score(90, 10, 20.0);
        assert!(score >= 80.0);
        assert_eq!(score, 97.0);
    }

    #[test]
    fn test_poor_opportunity() {
        let score = scorer().calculate_gap_score(10, 90, 90.0);
        assert!(score <= 35.0);
        assert_eq!(score, 10.0);
    }

    #[test]
    fn test_moderate_opportunity() {
        let score = scorer().calculate_gap_score(50, 50, 50.0);
        assert!((35.0..=65.0).contains(&score));
    }

    #[test]
    fn test_score_bounds_over_input_grid() {
        let scorer = scorer();
        for home in (0..=100u8).step_by(5) {
            for target in (0..=100u8).step_by(5) {
                for quality in (0..=100).step_by(5) {
                    let score = scorer.calculate_gap_score(home, target, quality as f64);
                    assert!(
                        (0.0..=100.0).contains(&score),
                        "score {} out of range for ({}, {}, {})",
                        score,
                        home,
                        target,
                        quality
                    );
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let scorer = scorer();
        assert_eq!(
            scorer.calculate_gap_score(200, 0, -50.0),
            scorer.calculate_gap_score(100, 0, 0.0)
        );
        assert_eq!(scorer.calculate_gap_score(100, 0, 0.0), 100.0);
        assert_eq!(scorer.calculate_gap_score(0, 100, 100.0), 0.0);
    }

    #[test]
    fn test_monotonic_in_home_interest() {
        let scorer = scorer();
        for target in (0..=100u8).step_by(10) {
            for quality in (0..=100).step_by(10) {
                let mut previous = f64::MIN;
                for home in 0..=100u8 {
                    let score = scorer.calculate_gap_score(home, target, quality as f64);
                    assert!(score >= previous, "decreased at home={}", home);
                    previous = score;
                }
            }
        }
    }

    #[test]
    fn test_monotonic_in_target_interest_and_quality() {
        let scorer = scorer();
        for home in (0..=100u8).step_by(10) {
            for fixed in (0..=100u8).step_by(10) {
                let mut previous = f64::MAX;
                for target in 0..=100u8 {
                    let score = scorer.calculate_gap_score(home, target, fixed as f64);
                    assert!(score <= previous, "increased at target={}", target);
                    previous = score;
                }

                let mut previous = f64::MAX;
                for quality in 0..=100 {
                    let score = scorer.calculate_gap_score(home, fixed, quality as f64);
                    assert!(score <= previous, "increased at quality={}", quality);
                    previous = score;
                }
            }
        }
    }

    #[test]
    fn test_golden_bonus_thresholds() {
        let scorer = scorer();

        // 28 + 21 + 18 = 67, +10
        assert_eq!(scorer.bonus(70.0, 30.0, 40.0).0, Bonus::Golden);
        assert_eq!(scorer.calculate_gap_score(70, 30, 40.0), 77.0);

        // 每個門檻外一步都失去黃金加分
        assert_eq!(scorer.bonus(69.0, 30.0, 40.0).0, Bonus::None);
        assert_eq!(scorer.calculate_gap_score(69, 30, 40.0), 66.6);
        assert_eq!(scorer.bonus(70.0, 31.0, 40.0).0, Bonus::None);
        assert_eq!(scorer.calculate_gap_score(70, 31, 40.0), 66.7);
        assert_eq!(scorer.bonus(70.0, 30.0, 40.5).0, Bonus::None);
    }

    #[test]
    fn test_strong_bonus_when_golden_misses() {
        let scorer = scorer();

        // 目標市場熱度超標，但品質 <= 30 仍有 +5
        assert_eq!(scorer.bonus(70.0, 31.0, 30.0), (Bonus::Strong, 5.0));
        assert_eq!(scorer.calculate_gap_score(70, 31, 30.0), 74.7);

        assert_eq!(scorer.bonus(60.0, 80.0, 30.0).0, Bonus::Strong);
        assert_eq!(scorer.bonus(59.0, 80.0, 30.0).0, Bonus::None);
        assert_eq!(scorer.bonus(60.0, 80.0, 31.0).0, Bonus::None);

        // 兩者都符合時只給黃金加分
        assert_eq!(scorer.bonus(90.0, 10.0, 10.0), (Bonus::Golden, 10.0));
    }

    #[test]
    fn test_configured_weights_are_used() {
        let scorer = GapScorer::new(
            GapWeights {
                demand: 1.0,
                saturation: 0.0,
                quality_gap: 0.0,
            },
            BonusRule::golden(),
            BonusRule::strong(),
        );
        assert_eq!(scorer.calculate_gap_score(42, 90, 90.0), 42.0);
    }

    #[test]
    fn test_categorization() {
        let scorer = scorer();

        assert!(scorer.categorize(85.0).category.to_string().contains("EXCELLENT"));
        assert!(scorer.categorize(70.0).category.to_string().contains("STRONG"));
        assert!(scorer.categorize(55.0).category.to_string().contains("MODERATE"));
        assert!(scorer.categorize(40.0).category.to_string().contains("WEAK"));
        assert!(scorer.categorize(25.0).category.to_string().contains("POOR"));
    }

    #[test]
    fn test_categorization_boundaries() {
        let scorer = scorer();

        assert_eq!(scorer.categorize(100.0).category, OpportunityCategory::Excellent);
        assert_eq!(scorer.categorize(80.0).category, OpportunityCategory::Excellent);
        assert_eq!(scorer.categorize(79.9).category, OpportunityCategory::Strong);
        assert_eq!(scorer.categorize(65.0).category, OpportunityCategory::Strong);
        assert_eq!(scorer.categorize(64.9).category, OpportunityCategory::Moderate);
        assert_eq!(scorer.categorize(50.0).category, OpportunityCategory::Moderate);
        assert_eq!(scorer.categorize(49.9).category, OpportunityCategory::Weak);
        assert_eq!(scorer.categorize(35.0).category, OpportunityCategory::Weak);
        assert_eq!(scorer.categorize(34.9).category, OpportunityCategory::Poor);
        assert_eq!(scorer.categorize(0.0).category, OpportunityCategory::Poor);
    }

    #[test]
    fn test_insights_sentence() {
        let scorer = scorer();

        assert_eq!(
            scorer.insights(90, 10, 20.0, 97.0),
            format!(
                "{}: Strong US demand, very weak BR competitors, untapped BR market",
                OpportunityCategory::Excellent
            )
        );
        assert_eq!(
            scorer.insights(45, 30, 55.0, 55.0),
            format!(
                "{}: Moderate US demand, moderate BR competitors, growing BR market",
                OpportunityCategory::Moderate
            )
        );
        assert_eq!(
            scorer.insights(10, 90, 90.0, 10.0),
            format!(
                "{}: Low US demand, strong BR competitors, saturated BR market",
                OpportunityCategory::Poor
            )
        );
    }

    #[test]
    fn test_insights_use_market_labels() {
        let scorer = scorer().with_market_labels("GB", "MX");
        let text = scorer.insights(40, 49, 49.9, 40.0);
        assert!(text.contains("WEAK"));
        assert!(text.ends_with("Moderate GB demand, weak MX competitors, growing MX market"));
    }
}
