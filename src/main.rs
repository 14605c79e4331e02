mod api;
mod dashboard;
mod locale;
mod server;
mod session;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spending_score::config::AppConfig;
use spending_score::{
    format_currency, format_score, predict, CustomerProfile, GaussianNoise, NoNoise, NoiseSource,
    Prediction,
};

use crate::locale::{Locale, LocaleCatalog, Translations};

#[derive(Parser)]
#[command(name = "spending-score", about = "Customer spending score predictor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Predict(PredictArgs),
    Serve(ServeArgs),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default configuration file.
    Init { path: Option<PathBuf> },
}

#[derive(Args, Debug, Clone)]
struct PredictArgs {
    #[arg(long, default_value_t = 35, allow_negative_numbers = true)]
    age: i64,
    #[arg(long, default_value_t = 50_000, allow_negative_numbers = true)]
    income: i64,
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    membership_years: i64,
    #[arg(long, default_value_t = 25, allow_negative_numbers = true)]
    purchase_frequency: i64,
    #[arg(long, default_value = "en")]
    lang: String,
    #[arg(long, conflicts_with = "no_noise")]
    seed: Option<u64>,
    #[arg(long)]
    no_noise: bool,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Default for PredictArgs {
    fn default() -> Self {
        let profile = CustomerProfile::default();
        Self {
            age: profile.age(),
            income: profile.annual_income(),
            membership_years: profile.membership_years(),
            purchase_frequency: profile.purchase_frequency(),
            lang: "en".to_string(),
            seed: None,
            no_noise: false,
            json: false,
            config: None,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct PredictOutput<'a> {
    #[serde(flatten)]
    prediction: &'a Prediction,
    label: &'a str,
    narrative: &'a str,
    action_text: Vec<String>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Some(Command::Serve(_))));
    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let command = cli.command.unwrap_or(Command::Predict(PredictArgs::default()));

    match command {
        Command::Predict(args) => run_predict(args),
        Command::Serve(args) => run_serve(args).await,
        Command::Config(ConfigCommand::Init { path }) => run_config_init(path),
    }
}

fn run_predict(args: PredictArgs) -> Result<(), String> {
    let locale: Locale = args.lang.parse()?;
    let (config, _) = AppConfig::load(args.config.clone()).map_err(|err| err.to_string())?;
    let profile = CustomerProfile::new(
        args.age,
        args.income,
        args.membership_years,
        args.purchase_frequency,
    )
    .map_err(|err| err.to_string())?;

    let mut noise: Box<dyn NoiseSource> = if args.no_noise {
        Box::new(NoNoise)
    } else if let Some(seed) = args.seed {
        Box::new(GaussianNoise::seeded(seed, config.noise.std_dev))
    } else {
        Box::new(config.noise.build_noise())
    };

    let prediction = predict(&profile, &config.scorer(), noise.as_mut());
    let catalog = LocaleCatalog::load()?;
    let t = catalog.get(locale);

    if args.json {
        let output = PredictOutput {
            prediction: &prediction,
            label: t.category_label(prediction.category),
            narrative: t.category_narrative(prediction.category),
            action_text: t.actions(prediction.category),
        };
        let payload = serde_json::to_string_pretty(&output)
            .map_err(|err| format!("failed to serialize prediction: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    print_prediction(&prediction, t);
    Ok(())
}

fn print_prediction(prediction: &Prediction, t: &Translations) {
    let category = prediction.category;
    let tag = category.tag();
    let profile = &prediction.profile;

    println!(
        "{}: {} ({})",
        t.text("spending_score"),
        format_score(prediction.score),
        t.text("out_of")
    );
    println!(
        "{} {}: {}",
        tag.emoji,
        t.text("customer_category"),
        t.category_label(category)
    );
    println!("{}", t.category_narrative(category));

    println!("\n{}:", t.text("recommended_actions"));
    for action in t.actions(category) {
        println!("- {}", action);
    }

    println!("\n{}:", t.text("input_summary"));
    println!("  {}: {} {}", t.text("age"), profile.age(), t.text("years"));
    println!(
        "  {}: {}",
        t.text("annual_income"),
        format_currency(profile.annual_income())
    );
    println!(
        "  {}: {} {}",
        t.text("membership_years"),
        profile.membership_years(),
        t.text("years")
    );
    println!(
        "  {}: {} {}",
        t.text("purchase_frequency"),
        profile.purchase_frequency(),
        t.text("purchases_per_year")
    );

    let stats = prediction.quick_stats;
    println!(
        "\n{}: {} {} | {} {} | {} {}",
        t.text("quick_stats"),
        t.text("income_level"),
        t.income_level(stats.income_level),
        t.text("customer_category"),
        t.standing(stats.standing),
        t.text("loyalty"),
        t.loyalty(stats.loyalty)
    );
}

async fn run_serve(args: ServeArgs) -> Result<(), String> {
    let (mut config, _) = AppConfig::load(args.config).map_err(|err| err.to_string())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let catalog = LocaleCatalog::load()?;
    let templates = dashboard::init_templates()
        .map_err(|err| format!("failed to load dashboard templates: {}", err))?;
    server::serve(config, catalog, templates).await
}

fn run_config_init(path: Option<PathBuf>) -> Result<(), String> {
    let path = path.unwrap_or_else(|| PathBuf::from("config/spending_score.toml"));
    if path.exists() {
        return Err(format!("config already exists: {}", path.display()));
    }
    AppConfig::default()
        .write(&path)
        .map_err(|err| err.to_string())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
