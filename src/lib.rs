pub mod config;
pub mod error;
pub mod recommendation;
pub mod scoring;

use serde::Serialize;
use std::fmt;

pub use crate::error::{ConfigError, ProfileError};
pub use crate::recommendation::{
    classify, CustomerStanding, IncomeLevel, LoyaltyLevel, QuickStats, RecommendationCategory,
    VisualTag,
};
pub use crate::scoring::{
    FeatureContributions, FixedNoise, GaussianNoise, NoNoise, NoiseSource, ScoreWeights,
    SpendingScorer,
};

/// Standard deviation of the noise term added to every score.
pub const DEFAULT_NOISE_STD_DEV: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Age,
    AnnualIncome,
    MembershipYears,
    PurchaseFrequency,
}

impl ProfileField {
    pub fn label(self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::AnnualIncome => "annual_income",
            ProfileField::MembershipYears => "membership_years",
            ProfileField::PurchaseFrequency => "purchase_frequency",
        }
    }

    /// Inclusive bounds accepted for this field.
    pub fn domain(self) -> (i64, i64) {
        match self {
            ProfileField::Age => (18, 70),
            ProfileField::AnnualIncome => (0, 500_000),
            ProfileField::MembershipYears => (0, 20),
            ProfileField::PurchaseFrequency => (0, 100),
        }
    }

    fn check(self, value: i64) -> Result<i64, ProfileError> {
        let (min, max) = self.domain();
        if value < min || value > max {
            return Err(ProfileError::OutOfDomain {
                field: self,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    fn clamp(self, value: i64) -> i64 {
        let (min, max) = self.domain();
        value.clamp(min, max)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four customer attributes the score is computed from.
///
/// Fields are private: a value of this type is always within the domains
/// reported by [`ProfileField::domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomerProfile {
    age: i64,
    annual_income: i64,
    membership_years: i64,
    purchase_frequency: i64,
}

impl CustomerProfile {
    pub fn new(
        age: i64,
        annual_income: i64,
        membership_years: i64,
        purchase_frequency: i64,
    ) -> Result<Self, ProfileError> {
        Self::validate(age, annual_income, membership_years, purchase_frequency).map_err(|err| {
            tracing::warn!(error = %err, "rejected customer profile");
            err
        })
    }

    fn validate(
        age: i64,
        annual_income: i64,
        membership_years: i64,
        purchase_frequency: i64,
    ) -> Result<Self, ProfileError> {
        Ok(Self {
            age: ProfileField::Age.check(age)?,
            annual_income: ProfileField::AnnualIncome.check(annual_income)?,
            membership_years: ProfileField::MembershipYears.check(membership_years)?,
            purchase_frequency: ProfileField::PurchaseFrequency.check(purchase_frequency)?,
        })
    }

    /// Pulls each value into its domain instead of rejecting it, the way
    /// bounded input widgets behave.
    pub fn clamped(
        age: i64,
        annual_income: i64,
        membership_years: i64,
        purchase_frequency: i64,
    ) -> Self {
        Self {
            age: ProfileField::Age.clamp(age),
            annual_income: ProfileField::AnnualIncome.clamp(annual_income),
            membership_years: ProfileField::MembershipYears.clamp(membership_years),
            purchase_frequency: ProfileField::PurchaseFrequency.clamp(purchase_frequency),
        }
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn annual_income(&self) -> i64 {
        self.annual_income
    }

    pub fn membership_years(&self) -> i64 {
        self.membership_years
    }

    pub fn purchase_frequency(&self) -> i64 {
        self.purchase_frequency
    }
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            age: 35,
            annual_income: 50_000,
            membership_years: 5,
            purchase_frequency: 25,
        }
    }
}

/// A spending score in `[0, 100]`, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ScoreResult(f64);

impl ScoreResult {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Clamps then rounds. NaN lands on the lower bound.
    pub fn from_raw(value: f64) -> Self {
        Self(round2(clamp_score(value)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub profile: CustomerProfile,
    pub score: ScoreResult,
    pub category: RecommendationCategory,
    pub actions: Vec<&'static str>,
    pub quick_stats: QuickStats,
    pub contributions: FeatureContributions,
}

/// Scores a profile with the default formula and fresh entropy.
pub fn score(profile: &CustomerProfile) -> ScoreResult {
    let mut noise = GaussianNoise::from_entropy(DEFAULT_NOISE_STD_DEV);
    score_with(profile, &mut noise)
}

/// Scores a profile with the default formula and a caller-supplied noise source.
pub fn score_with<N: NoiseSource + ?Sized>(profile: &CustomerProfile, noise: &mut N) -> ScoreResult {
    SpendingScorer::default().score(profile, noise)
}

pub fn predict<N: NoiseSource + ?Sized>(
    profile: &CustomerProfile,
    scorer: &SpendingScorer,
    noise: &mut N,
) -> Prediction {
    let score = scorer.score(profile, noise);
    let category = classify(score.value());
    let quick_stats = QuickStats::new(profile, score.value());
    tracing::debug!(
        score = score.value(),
        category = category.id(),
        "spending score predicted"
    );

    Prediction {
        profile: *profile,
        score,
        category,
        actions: category.actions().to_vec(),
        quick_stats,
        contributions: scorer.contributions(profile),
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return ScoreResult::MIN;
    }
    value.max(ScoreResult::MIN).min(ScoreResult::MAX)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_score(score: ScoreResult) -> String {
    format!("{:.2}", score.value())
}

pub fn format_currency(value: i64) -> String {
    let mut digits: Vec<char> = value.abs().to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = digits.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    let grouped: String = result.chars().rev().collect();
    if value < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_each_out_of_domain_field() {
        let err = CustomerProfile::new(17, 0, 0, 0).unwrap_err();
        assert_eq!(
            err,
            ProfileError::OutOfDomain {
                field: ProfileField::Age,
                value: 17,
                min: 18,
                max: 70
            }
        );
        assert!(CustomerProfile::new(18, -1, 0, 0).is_err());
        assert!(CustomerProfile::new(18, 500_001, 0, 0).is_err());
        assert!(CustomerProfile::new(18, 0, 21, 0).is_err());
        assert!(CustomerProfile::new(18, 0, 0, 101).is_err());
        assert!(CustomerProfile::new(70, 500_000, 20, 100).is_ok());
    }

    #[test]
    fn clamped_pulls_values_into_domain() {
        let profile = CustomerProfile::clamped(5, 900_000, -3, 250);
        assert_eq!(profile.age(), 18);
        assert_eq!(profile.annual_income(), 500_000);
        assert_eq!(profile.membership_years(), 0);
        assert_eq!(profile.purchase_frequency(), 100);
    }

    #[test]
    fn score_result_clamps_rounds_and_absorbs_nan() {
        assert_eq!(ScoreResult::from_raw(110.0).value(), 100.0);
        assert_eq!(ScoreResult::from_raw(-4.0).value(), 0.0);
        assert_eq!(ScoreResult::from_raw(f64::NAN).value(), 0.0);
        assert!((ScoreResult::from_raw(42.34567).value() - 42.35).abs() < 1e-9);
    }

    #[test]
    fn format_currency_groups_thousands() {
        assert_eq!(format_currency(0), "$0");
        assert_eq!(format_currency(50_000), "$50,000");
        assert_eq!(format_currency(1_234_567), "$1,234,567");
    }

    #[test]
    fn error_message_names_field_and_bounds() {
        let err = CustomerProfile::new(18, 0, 0, 120).unwrap_err();
        assert_eq!(
            err.to_string(),
            "purchase_frequency out of domain: 120 (expected 0..=100)"
        );
    }
}
