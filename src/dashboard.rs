use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tera::{Context, Tera};

use spending_score::{format_currency, format_score, Prediction, ProfileField, VisualTag};

use crate::locale::Translations;
use crate::session::DashboardSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("invalid theme: {}", value)),
        }
    }
}

impl Theme {

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: "#f8fafc",
                surface: "#ffffff",
                card: "#ffffff",
                text_primary: "#0f172a",
                text_secondary: "#475569",
                border: "#cbd5e1",
                accent: "#3b82f6",
                gauge_background: "#f8fafc",
            },
            Theme::Dark => Palette {
                background: "#0a0f1e",
                surface: "#151b2e",
                card: "#1a2238",
                text_primary: "#ffffff",
                text_secondary: "#e2e8f0",
                border: "#2d3748",
                accent: "#06b6d4",
                gauge_background: "#1e293b",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub card: &'static str,
    pub text_primary: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
    pub gauge_background: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeBand {
    pub from: f64,
    pub to: f64,
    pub color: &'static str,
}

const GAUGE_BANDS: [GaugeBand; 3] = [
    GaugeBand { from: 0.0, to: 40.0, color: "#fee2e2" },
    GaugeBand { from: 40.0, to: 70.0, color: "#fef3c7" },
    GaugeBand { from: 70.0, to: 100.0, color: "#d1fae5" },
];

const GAUGE_REFERENCE: f64 = 50.0;
const GAUGE_THRESHOLD: f64 = 90.0;

const FEATURE_COLORS: [&str; 4] = ["#3b82f6", "#10b981", "#f59e0b", "#ef4444"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeView {
    pub value: f64,
    pub bar_color: &'static str,
    pub bands: [GaugeBand; 3],
    pub threshold: f64,
    pub delta: f64,
}

impl GaugeView {
    pub fn new(score: f64) -> Self {
        let bar_color = if score >= GAUGE_REFERENCE {
            "#3b82f6"
        } else {
            "#f59e0b"
        };
        Self {
            value: score,
            bar_color,
            bands: GAUGE_BANDS,
            threshold: GAUGE_THRESHOLD,
            delta: score - GAUGE_REFERENCE,
        }
    }
}

pub const TEMPLATE_GLOB: &str = "templates/dashboard/**/*";
const PAGE_TEMPLATE: &str = "layout.html";

const EMBEDDED_TEMPLATES: [(&str, &str); 5] = [
    ("layout.html", include_str!("../templates/dashboard/layout.html")),
    ("sidebar.html", include_str!("../templates/dashboard/sidebar.html")),
    ("welcome.html", include_str!("../templates/dashboard/welcome.html")),
    ("results.html", include_str!("../templates/dashboard/results.html")),
    ("gauge.html", include_str!("../templates/dashboard/gauge.html")),
];

/// Loads the dashboard templates from disk, falling back to the copies built into the binary.
pub fn init_templates() -> Result<Tera, tera::Error> {
    match Tera::new(TEMPLATE_GLOB) {
        Ok(tera) if tera.get_template_names().any(|name| name == PAGE_TEMPLATE) => Ok(tera),
        Ok(_) => {
            tracing::warn!(glob = TEMPLATE_GLOB, "no dashboard templates on disk, using embedded copies");
            embedded_templates()
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load dashboard templates, using embedded copies");
            embedded_templates()
        }
    }
}

pub fn embedded_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(EMBEDDED_TEMPLATES)?;
    Ok(tera)
}

#[derive(Debug, Serialize)]
struct FieldInput {
    icon: &'static str,
    label: String,
    name: &'static str,
    min: i64,
    max: i64,
    step: i64,
    value: i64,
}

#[derive(Debug, Serialize)]
struct WelcomeCard {
    emoji: &'static str,
    title: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    icon: &'static str,
    label: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct FeatureBar {
    label: String,
    share: String,
    color: &'static str,
}

#[derive(Debug, Serialize)]
struct StatCard {
    icon: &'static str,
    label: String,
    value: String,
}

/// Display-ready view of the last prediction.
#[derive(Debug, Serialize)]
struct ResultsView {
    score: String,
    delta: String,
    gauge: GaugeView,
    summary: Vec<SummaryRow>,
    features: Vec<FeatureBar>,
    label: String,
    narrative: String,
    actions: Vec<String>,
    tag: VisualTag,
    stats: Vec<StatCard>,
}

impl ResultsView {
    fn new(prediction: &Prediction, t: &Translations) -> Self {
        let gauge = GaugeView::new(prediction.score.value());
        let profile = &prediction.profile;
        let category = prediction.category;
        let stats = prediction.quick_stats;

        let summary = vec![
            SummaryRow {
                icon: "👤",
                label: t.text("age").to_string(),
                value: format!("{} {}", profile.age(), t.text("years")),
            },
            SummaryRow {
                icon: "💵",
                label: t.text("annual_income").to_string(),
                value: format_currency(profile.annual_income()),
            },
            SummaryRow {
                icon: "🎖️",
                label: t.text("membership_years").to_string(),
                value: format!("{} {}", profile.membership_years(), t.text("years")),
            },
            SummaryRow {
                icon: "🛒",
                label: t.text("purchase_frequency").to_string(),
                value: format!(
                    "{} {}",
                    profile.purchase_frequency(),
                    t.text("purchases_per_year")
                ),
            },
        ];

        let features = prediction
            .contributions
            .shares()
            .into_iter()
            .zip(FEATURE_COLORS)
            .map(|((field, share), color)| FeatureBar {
                label: t.text(field.label()).to_string(),
                share: format!("{:.1}", share),
                color,
            })
            .collect();

        Self {
            score: format_score(prediction.score),
            delta: format!("{:+.2}", gauge.delta),
            gauge,
            summary,
            features,
            label: t.category_label(category).to_string(),
            narrative: t.category_narrative(category).to_string(),
            actions: t.actions(category),
            tag: category.tag(),
            stats: vec![
                StatCard {
                    icon: "💰",
                    label: t.text("income_level").to_string(),
                    value: t.income_level(stats.income_level).to_string(),
                },
                StatCard {
                    icon: "📈",
                    label: t.text("customer_category").to_string(),
                    value: t.standing(stats.standing).to_string(),
                },
                StatCard {
                    icon: "🎯",
                    label: t.text("loyalty").to_string(),
                    value: t.loyalty(stats.loyalty).to_string(),
                },
            ],
        }
    }
}

fn field_inputs(session: &DashboardSession, t: &Translations) -> Vec<FieldInput> {
    let profile = &session.profile;
    [
        (ProfileField::Age, "👤", profile.age()),
        (ProfileField::AnnualIncome, "💵", profile.annual_income()),
        (ProfileField::MembershipYears, "🎖️", profile.membership_years()),
        (ProfileField::PurchaseFrequency, "🛒", profile.purchase_frequency()),
    ]
    .into_iter()
    .map(|(field, icon, value)| {
        let (min, max) = field.domain();
        FieldInput {
            icon,
            label: t.text(field.label()).to_string(),
            name: field.label(),
            min,
            max,
            step: if matches!(field, ProfileField::AnnualIncome) { 5000 } else { 1 },
            value,
        }
    })
    .collect()
}

fn welcome_cards(t: &Translations) -> Vec<WelcomeCard> {
    [
        ("📝", "enter_data", "enter_data_desc"),
        ("🤖", "ai_analysis", "ai_analysis_desc"),
        ("💡", "get_insights", "get_insights_desc"),
    ]
    .into_iter()
    .map(|(emoji, title, description)| WelcomeCard {
        emoji,
        title: t.text(title).to_string(),
        description: t.text(description).to_string(),
    })
    .collect()
}

pub fn page_context(session: &DashboardSession, t: &Translations) -> Context {
    let rtl = session.locale.is_rtl();
    let mut context = Context::new();
    context.insert("lang", session.locale.code());
    context.insert("dir", if rtl { "rtl" } else { "ltr" });
    context.insert("font", if rtl { "Cairo, sans-serif" } else { "Inter, sans-serif" });
    context.insert("theme", &session.theme);
    context.insert("palette", &session.theme.palette());
    context.insert("t", t.ui());
    context.insert("fields", &field_inputs(session, t));
    context.insert("welcome_cards", &welcome_cards(t));
    context.insert(
        "results",
        &session
            .last_prediction
            .as_ref()
            .map(|prediction| ResultsView::new(prediction, t)),
    );
    context
}

/// Renders the welcome page, or the results page once a prediction exists.
pub fn render_page(
    templates: &Tera,
    session: &DashboardSession,
    t: &Translations,
) -> Result<String, tera::Error> {
    templates.render(PAGE_TEMPLATE, &page_context(session, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{Locale, LocaleCatalog};
    use spending_score::{predict, CustomerProfile, FixedNoise, SpendingScorer};

    #[test]
    fn gauge_bar_color_flips_at_fifty() {
        assert_eq!(GaugeView::new(50.0).bar_color, "#3b82f6");
        assert_eq!(GaugeView::new(49.99).bar_color, "#f59e0b");
        assert!((GaugeView::new(62.5).delta - 12.5).abs() < 1e-6);
        assert_eq!(GaugeView::new(10.0).threshold, 90.0);
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!(" Dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn welcome_page_before_any_prediction() {
        let templates = embedded_templates().unwrap();
        let catalog = LocaleCatalog::load().unwrap();
        let session = DashboardSession::default();
        let page = render_page(&templates, &session, catalog.get(session.locale)).unwrap();
        assert!(page.contains("dir=\"ltr\""));
        assert!(page.contains("How It Works"));
        assert!(page.contains("name=\"annual_income\" min=\"0\" max=\"500000\" step=\"5000\""));
        assert!(page.contains("<option value=\"light\" selected>"));
        assert!(!page.contains("Business Recommendation"));
    }

    #[test]
    fn results_page_shows_recommendation_in_arabic() {
        let templates = embedded_templates().unwrap();
        let catalog = LocaleCatalog::load().unwrap();
        let mut session = DashboardSession::default();
        session.set_locale(Locale::Ar);
        session.set_theme(Theme::Dark);
        let profile = CustomerProfile::new(70, 200_000, 20, 100).unwrap();
        session.record(predict(&profile, &SpendingScorer::default(), &mut FixedNoise(0.0)));

        let page = render_page(&templates, &session, catalog.get(session.locale)).unwrap();
        assert!(page.contains("dir=\"rtl\""));
        assert!(page.contains("عميل ذو قيمة عالية"));
        assert!(page.contains("#0a0f1e"));
        assert!(page.contains("100.00"));
        assert!(page.contains("+50.00"));
        assert!(page.contains("$200,000"));
        assert!(page.contains("high-value"));
    }

    #[test]
    fn every_locale_renders_both_pages() {
        let templates = embedded_templates().unwrap();
        let catalog = LocaleCatalog::load().unwrap();
        let profile = CustomerProfile::new(30, 20_000, 1, 5).unwrap();
        for locale in [Locale::En, Locale::Ar] {
            let mut session = DashboardSession::default();
            session.set_locale(locale);
            assert!(render_page(&templates, &session, catalog.get(locale)).is_ok());
            session.record(predict(&profile, &SpendingScorer::default(), &mut FixedNoise(0.0)));
            assert!(render_page(&templates, &session, catalog.get(locale)).is_ok());
        }
    }

    #[test]
    fn locale_text_is_html_escaped() {
        let templates = embedded_templates().unwrap();
        let catalog = LocaleCatalog::load().unwrap();
        let session = DashboardSession::default();
        let page = render_page(&templates, &session, catalog.get(Locale::En)).unwrap();
        assert!(page.contains("click &#x27;Predict Spending Score&#x27;"));
    }
}
