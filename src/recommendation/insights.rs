use serde::Serialize;

use crate::CustomerProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeLevel {
    High,
    Moderate,
    Low,
}

impl IncomeLevel {
    pub fn from_income(income: i64) -> Self {
        if income >= 75_000 {
            IncomeLevel::High
        } else if income >= 40_000 {
            IncomeLevel::Moderate
        } else {
            IncomeLevel::Low
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            IncomeLevel::High => "high",
            IncomeLevel::Moderate => "moderate",
            IncomeLevel::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyLevel {
    Strong,
    Growing,
    New,
}

impl LoyaltyLevel {
    pub fn from_membership_years(years: i64) -> Self {
        if years >= 10 {
            LoyaltyLevel::Strong
        } else if years >= 3 {
            LoyaltyLevel::Growing
        } else {
            LoyaltyLevel::New
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            LoyaltyLevel::Strong => "strong",
            LoyaltyLevel::Growing => "growing",
            LoyaltyLevel::New => "new",
        }
    }
}

/// Coarse split of the score around its midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStanding {
    AboveAverage,
    BelowAverage,
}

impl CustomerStanding {
    pub fn from_score(score: f64) -> Self {
        if score >= 50.0 {
            CustomerStanding::AboveAverage
        } else {
            CustomerStanding::BelowAverage
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            CustomerStanding::AboveAverage => "above_average",
            CustomerStanding::BelowAverage => "below_average",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickStats {
    pub income_level: IncomeLevel,
    pub loyalty: LoyaltyLevel,
    pub standing: CustomerStanding,
}

impl QuickStats {
    pub fn new(profile: &CustomerProfile, score: f64) -> Self {
        Self {
            income_level: IncomeLevel::from_income(profile.annual_income()),
            loyalty: LoyaltyLevel::from_membership_years(profile.membership_years()),
            standing: CustomerStanding::from_score(score),
        }
    }
}
