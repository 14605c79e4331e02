use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use spending_score::{CustomerStanding, IncomeLevel, LoyaltyLevel, RecommendationCategory};

const EN_TABLE: &str = include_str!("../locales/en.toml");
const AR_TABLE: &str = include_str!("../locales/ar.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ar" | "arabic" => Ok(Locale::Ar),
            _ => Err(format!("invalid locale: {}", value)),
        }
    }
}

impl Locale {

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Locale::Ar)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryText {
    label: String,
    narrative: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Translations {
    ui: HashMap<String, String>,
    categories: HashMap<String, CategoryText>,
    actions: HashMap<String, String>,
}

impl Translations {
    fn parse(table: &str) -> Result<Self, String> {
        toml::from_str(table).map_err(|err| format!("failed to parse locale table: {}", err))
    }

    pub fn ui(&self) -> &HashMap<String, String> {
        &self.ui
    }

    /// Unknown keys render as the key itself.
    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.ui.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn category_label(&self, category: RecommendationCategory) -> &str {
        self.categories
            .get(category.id())
            .map(|text| text.label.as_str())
            .unwrap_or(category.id())
    }

    pub fn category_narrative(&self, category: RecommendationCategory) -> &str {
        self.categories
            .get(category.id())
            .map(|text| text.narrative.as_str())
            .unwrap_or("")
    }

    pub fn action<'a>(&'a self, action_id: &'a str) -> &'a str {
        self.actions.get(action_id).map(String::as_str).unwrap_or(action_id)
    }

    pub fn actions(&self, category: RecommendationCategory) -> Vec<String> {
        category
            .actions()
            .iter()
            .map(|id| self.action(id).to_string())
            .collect()
    }

    pub fn income_level(&self, level: IncomeLevel) -> &str {
        self.text(level.key())
    }

    pub fn loyalty(&self, level: LoyaltyLevel) -> &str {
        self.text(level.key())
    }

    pub fn standing(&self, standing: CustomerStanding) -> &str {
        self.text(standing.key())
    }
}

/// Every locale table, parsed once at startup.
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    en: Translations,
    ar: Translations,
}

impl LocaleCatalog {
    pub fn load() -> Result<Self, String> {
        Ok(Self {
            en: Translations::parse(EN_TABLE)?,
            ar: Translations::parse(AR_TABLE)?,
        })
    }

    pub fn get(&self, locale: Locale) -> &Translations {
        match locale {
            Locale::En => &self.en,
            Locale::Ar => &self.ar,
        }
    }
}
