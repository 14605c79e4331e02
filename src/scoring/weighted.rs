use serde::{Deserialize, Serialize};

use crate::scoring::NoiseSource;
use crate::{CustomerProfile, ProfileField, ScoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub base: f64,
    pub age: f64,
    pub income: f64,
    pub membership: f64,
    pub frequency: f64,
    /// Income at which the income term stops growing.
    pub income_saturation: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 10.0,
            age: 15.0,
            income: 35.0,
            membership: 20.0,
            frequency: 30.0,
            income_saturation: 200_000.0,
        }
    }
}

/// Points each attribute adds to the raw score, before noise and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureContributions {
    pub base: f64,
    pub age: f64,
    pub income: f64,
    pub membership: f64,
    pub frequency: f64,
}

impl FeatureContributions {
    pub fn total(&self) -> f64 {
        self.base + self.age + self.income + self.membership + self.frequency
    }

    /// Share of the non-base points owned by each attribute, in percent.
    pub fn shares(&self) -> [(ProfileField, f64); 4] {
        let variable = self.age + self.income + self.membership + self.frequency;
        let share = |points: f64| {
            if variable <= 0.0 {
                0.0
            } else {
                100.0 * points / variable
            }
        };
        [
            (ProfileField::Age, share(self.age)),
            (ProfileField::AnnualIncome, share(self.income)),
            (ProfileField::MembershipYears, share(self.membership)),
            (ProfileField::PurchaseFrequency, share(self.frequency)),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpendingScorer {
    weights: ScoreWeights,
}

impl SpendingScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn contributions(&self, profile: &CustomerProfile) -> FeatureContributions {
        FeatureContributions {
            base: self.weights.base,
            age: age_norm(profile.age()) * self.weights.age,
            income: self.income_norm(profile.annual_income()) * self.weights.income,
            membership: span_norm(profile.membership_years(), ProfileField::MembershipYears)
                * self.weights.membership,
            frequency: span_norm(profile.purchase_frequency(), ProfileField::PurchaseFrequency)
                * self.weights.frequency,
        }
    }

    /// Deterministic part of the score. May exceed 100.
    pub fn raw_score(&self, profile: &CustomerProfile) -> f64 {
        self.contributions(profile).total()
    }

    pub fn score<N: NoiseSource + ?Sized>(
        &self,
        profile: &CustomerProfile,
        noise: &mut N,
    ) -> ScoreResult {
        let raw = self.raw_score(profile) + noise.sample();
        ScoreResult::from_raw(raw)
    }

    // Only the normalized term is capped; the raw income is taken as given.
    fn income_norm(&self, income: i64) -> f64 {
        if self.weights.income_saturation <= 0.0 {
            return 1.0;
        }
        (income as f64 / self.weights.income_saturation).min(1.0)
    }
}

fn age_norm(age: i64) -> f64 {
    let (min, max) = ProfileField::Age.domain();
    (age - min) as f64 / (max - min) as f64
}

fn span_norm(value: i64, field: ProfileField) -> f64 {
    let (_, max) = field.domain();
    value as f64 / max as f64
}
