use serde::Serialize;

use spending_score::{CustomerProfile, Prediction};

use crate::dashboard::Theme;
use crate::locale::Locale;

/// Everything the dashboard remembers between requests for its one visitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSession {
    pub locale: Locale,
    pub theme: Theme,
    pub profile: CustomerProfile,
    pub last_prediction: Option<Prediction>,
}

impl DashboardSession {
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn record(&mut self, prediction: Prediction) {
        self.profile = prediction.profile;
        self.last_prediction = Some(prediction);
    }

    pub fn has_prediction(&self) -> bool {
        self.last_prediction.is_some()
    }
}
