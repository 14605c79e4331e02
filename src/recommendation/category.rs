use serde::Serialize;

pub const HIGH_VALUE_THRESHOLD: f64 = 70.0;
pub const MEDIUM_VALUE_THRESHOLD: f64 = 40.0;

/// Serialized as the same short id that `id()` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecommendationCategory {
    #[serde(rename = "high")]
    HighValue,
    #[serde(rename = "medium")]
    MediumValue,
    #[serde(rename = "low")]
    LowValue,
}

/// Display-only styling attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisualTag {
    pub css_class: &'static str,
    pub emoji: &'static str,
    pub accent: &'static str,
}

static HIGH_VALUE_ACTIONS: [&str; 5] = [
    "vip_membership_benefits",
    "personalized_shopping",
    "early_access",
    "dedicated_support",
    "premium_loyalty_rewards",
];

static MEDIUM_VALUE_ACTIONS: [&str; 5] = [
    "targeted_promotions",
    "bundle_deals",
    "referral_program",
    "limited_time_offers",
    "repeat_purchase_rewards",
];

static LOW_VALUE_ACTIONS: [&str; 5] = [
    "welcome_discount",
    "educational_content",
    "social_engagement",
    "simple_loyalty_points",
    "regular_newsletter",
];

impl RecommendationCategory {
    pub const ALL: [RecommendationCategory; 3] = [
        RecommendationCategory::HighValue,
        RecommendationCategory::MediumValue,
        RecommendationCategory::LowValue,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RecommendationCategory::HighValue => "high",
            RecommendationCategory::MediumValue => "medium",
            RecommendationCategory::LowValue => "low",
        }
    }

    /// Suggested action identifiers, in display order.
    pub fn actions(self) -> &'static [&'static str; 5] {
        match self {
            RecommendationCategory::HighValue => &HIGH_VALUE_ACTIONS,
            RecommendationCategory::MediumValue => &MEDIUM_VALUE_ACTIONS,
            RecommendationCategory::LowValue => &LOW_VALUE_ACTIONS,
        }
    }

    pub fn tag(self) -> VisualTag {
        match self {
            RecommendationCategory::HighValue => VisualTag {
                css_class: "high-value",
                emoji: "🎯",
                accent: "#10b981",
            },
            RecommendationCategory::MediumValue => VisualTag {
                css_class: "medium-value",
                emoji: "💡",
                accent: "#f59e0b",
            },
            RecommendationCategory::LowValue => VisualTag {
                css_class: "low-value",
                emoji: "🔍",
                accent: "#ef4444",
            },
        }
    }
}

/// Both thresholds are inclusive on their lower bound.
pub fn classify(score: f64) -> RecommendationCategory {
    if score >= HIGH_VALUE_THRESHOLD {
        RecommendationCategory::HighValue
    } else if score >= MEDIUM_VALUE_THRESHOLD {
        RecommendationCategory::MediumValue
    } else {
        RecommendationCategory::LowValue
    }
}
