use serde::{Deserialize, Serialize};
use spending_score::{
    CustomerProfile, FeatureContributions, Prediction, ProfileError, QuickStats, VisualTag,
};

use crate::dashboard::{GaugeView, Theme};
use crate::locale::{Locale, Translations};
use crate::session::DashboardSession;

#[derive(Debug, Default, Deserialize)]
pub struct ApiPredictRequest {
    pub request_id: Option<String>,
    pub age: Option<i64>,
    pub annual_income: Option<i64>,
    pub membership_years: Option<i64>,
    pub purchase_frequency: Option<i64>,
    pub locale: Option<String>,
}

impl ApiPredictRequest {
    /// Missing fields take the default profile's values; present ones must be in domain.
    pub fn to_profile(&self) -> Result<CustomerProfile, ProfileError> {
        let defaults = CustomerProfile::default();
        CustomerProfile::new(
            self.age.unwrap_or(defaults.age()),
            self.annual_income.unwrap_or(defaults.annual_income()),
            self.membership_years.unwrap_or(defaults.membership_years()),
            self.purchase_frequency
                .unwrap_or(defaults.purchase_frequency()),
        )
    }

    pub fn locale(&self) -> Result<Option<Locale>, String> {
        match self.locale.as_deref() {
            Some(value) => value.parse::<Locale>().map(Some),
            None => Ok(None),
        }
    }
}

/// Body of the dashboard's HTML input form.
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub age: i64,
    pub annual_income: i64,
    pub membership_years: i64,
    pub purchase_frequency: i64,
}

impl PredictForm {
    pub fn to_profile(&self) -> CustomerProfile {
        CustomerProfile::clamped(
            self.age,
            self.annual_income,
            self.membership_years,
            self.purchase_frequency,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionUpdate {
    pub locale: Option<String>,
    pub theme: Option<String>,
}

impl SessionUpdate {
    pub fn apply(&self, session: &mut DashboardSession) -> Result<(), String> {
        let locale = self
            .locale
            .as_deref()
            .map(str::parse::<Locale>)
            .transpose()?;
        let theme = self
            .theme
            .as_deref()
            .map(str::parse::<Theme>)
            .transpose()?;

        if let Some(locale) = locale {
            session.set_locale(locale);
        }
        if let Some(theme) = theme {
            session.set_theme(theme);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ApiSessionResponse {
    pub locale: Locale,
    pub theme: Theme,
    pub rtl: bool,
    pub profile: CustomerProfile,
    pub has_prediction: bool,
}

impl ApiSessionResponse {
    pub fn from_session(session: &DashboardSession) -> Self {
        Self {
            locale: session.locale,
            theme: session.theme,
            rtl: session.locale.is_rtl(),
            profile: session.profile,
            has_prediction: session.has_prediction(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocalizedStats {
    pub income_level: String,
    pub loyalty: String,
    pub customer_category: String,
}

#[derive(Debug, Serialize)]
pub struct ApiPredictResponse {
    pub request_id: String,
    pub locale: Locale,
    pub score: f64,
    pub category: &'static str,
    pub label: String,
    pub narrative: String,
    pub action_ids: Vec<&'static str>,
    pub actions: Vec<String>,
    pub tag: VisualTag,
    pub quick_stats: QuickStats,
    pub quick_stats_text: LocalizedStats,
    pub gauge: GaugeView,
    pub contributions: FeatureContributions,
}

impl ApiPredictResponse {
    pub fn from_prediction(
        prediction: &Prediction,
        locale: Locale,
        t: &Translations,
        request_id: String,
    ) -> Self {
        let category = prediction.category;
        let stats = prediction.quick_stats;
        Self {
            request_id,
            locale,
            score: prediction.score.value(),
            category: category.id(),
            label: t.category_label(category).to_string(),
            narrative: t.category_narrative(category).to_string(),
            action_ids: prediction.actions.clone(),
            actions: t.actions(category),
            tag: category.tag(),
            quick_stats: stats,
            quick_stats_text: LocalizedStats {
                income_level: t.income_level(stats.income_level).to_string(),
                loyalty: t.loyalty(stats.loyalty).to_string(),
                customer_category: t.standing(stats.standing).to_string(),
            },
            gauge: GaugeView::new(prediction.score.value()),
            contributions: prediction.contributions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocaleCatalog;
    use spending_score::{predict, NoNoise, SpendingScorer};

    #[test]
    fn request_fills_missing_fields_from_defaults() {
        let request = ApiPredictRequest {
            age: Some(60),
            ..Default::default()
        };
        let profile = request.to_profile().unwrap();
        assert_eq!(profile.age(), 60);
        assert_eq!(profile.annual_income(), 50_000);
        assert_eq!(profile.membership_years(), 5);
        assert_eq!(profile.purchase_frequency(), 25);
    }

    #[test]
    fn request_rejects_out_of_domain_instead_of_clamping() {
        let request = ApiPredictRequest {
            annual_income: Some(600_000),
            ..Default::default()
        };
        assert!(request.to_profile().is_err());
    }

    #[test]
    fn form_clamps_like_bounded_widgets() {
        let form = PredictForm {
            age: 90,
            annual_income: 600_000,
            membership_years: 3,
            purchase_frequency: -2,
        };
        let profile = form.to_profile();
        assert_eq!(profile.age(), 70);
        assert_eq!(profile.annual_income(), 500_000);
        assert_eq!(profile.purchase_frequency(), 0);
    }

    #[test]
    fn session_update_rejects_unknown_theme() {
        let mut session = DashboardSession::default();
        let update = SessionUpdate {
            locale: Some("ar".to_string()),
            theme: Some("sepia".to_string()),
        };
        assert!(update.apply(&mut session).is_err());
        assert_eq!(session.locale, Locale::En);
    }

    #[test]
    fn response_carries_localized_recommendation() {
        let catalog = LocaleCatalog::load().unwrap();
        let profile = CustomerProfile::new(18, 0, 0, 0).unwrap();
        let prediction = predict(&profile, &SpendingScorer::default(), &mut NoNoise);
        let response = ApiPredictResponse::from_prediction(
            &prediction,
            Locale::En,
            catalog.get(Locale::En),
            "req-1".to_string(),
        );

        assert_eq!(response.category, "low");
        assert!((response.score - 10.0).abs() < 1e-6);
        assert_eq!(response.actions.len(), 5);
        assert_eq!(response.actions[0], "Welcome discount for next purchase");
        assert_eq!(response.quick_stats_text.income_level, "Low");
        assert_eq!(response.quick_stats_text.loyalty, "New");
        assert_eq!(response.quick_stats_text.customer_category, "Below Average");
    }
}
