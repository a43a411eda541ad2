//! Bank Churn Predictor - Main Entry Point
//!
//! Loads the encoding and classifier artifacts once, then predicts churn for
//! customers entered on the command line or through the interactive form.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use churn_predictor::{
    config::{AppConfig, LogFormat},
    form::ChurnForm,
    metrics::SessionMetrics,
    models::inference::InferenceEngine,
    types::customer::{parse_yes_no, Country, CustomerRecord, Gender},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bank Churn Predictor
#[derive(Parser)]
#[command(name = "churn-predictor")]
#[command(about = "Predict whether a bank customer is likely to churn")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict churn for one customer given as flags
    Predict {
        #[command(flatten)]
        customer: CustomerArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Interactive form; stays open for new submissions until EOF or `q`
    Form,

    /// Show the loaded feature schema
    Inspect,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Customer fields, defaulting to the form's pre-filled values
#[derive(Args)]
struct CustomerArgs {
    /// Male or Female
    #[arg(long, default_value = "Male")]
    gender: String,

    /// Age in years (18-100)
    #[arg(long, default_value_t = 30)]
    age: u32,

    /// Credit score (350-850)
    #[arg(long, default_value_t = 600)]
    credit_score: u32,

    /// Years with the bank (0-10)
    #[arg(long, default_value_t = 3)]
    tenure: u32,

    /// Account balance
    #[arg(long, default_value_t = 1000.0)]
    balance: f64,

    /// Number of products (0-10)
    #[arg(long, default_value_t = 1)]
    products: u32,

    /// Estimated salary
    #[arg(long, default_value_t = 50000.0)]
    salary: f64,

    /// Has a credit card (Yes/No)
    #[arg(long, default_value = "Yes")]
    credit_card: String,

    /// Is an active member (Yes/No)
    #[arg(long, default_value = "Yes")]
    active_member: String,

    /// Germany, Spain or France
    #[arg(long, default_value = "Germany")]
    country: String,
}

impl CustomerArgs {
    fn to_record(&self) -> churn_predictor::error::Result<CustomerRecord> {
        Ok(CustomerRecord {
            gender: self.gender.parse::<Gender>()?,
            age: self.age,
            credit_score: self.credit_score,
            tenure: self.tenure,
            balance: self.balance,
            products: self.products,
            salary: self.salary,
            has_credit_card: parse_yes_no("credit_card", &self.credit_card)?,
            is_active_member: parse_yes_no("active_member", &self.active_member)?,
            country: self.country.parse::<Country>()?,
        })
    }
}

fn init_logging(config: &AppConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.level))
            .context("Invalid log level")?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_required(path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config, cli.verbose)?;
    info!(artifacts = %config.artifacts.dir, "Starting Bank Churn Predictor");

    let engine = InferenceEngine::new(&config).context("Failed to load model artifacts")?;

    match cli.command {
        Commands::Predict { customer, output } => {
            let record = customer.to_record()?;
            let result = engine.infer(&record)?;

            match output {
                OutputFormat::Text => {
                    println!("{}", result.headline());
                    println!("{}", result.probability_text());
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }
        Commands::Form => {
            let metrics = SessionMetrics::new();
            let stdin = std::io::stdin();
            let color = std::io::stdout().is_terminal();

            let mut form = ChurnForm::new(stdin.lock(), std::io::stdout()).with_color(color);
            let submissions = form.run(&engine, &metrics)?;

            info!(submissions, "Form closed");
            metrics.print_summary();
        }
        Commands::Inspect => {
            let context = engine.context();
            println!("classifier: {}", context.classifier.name());
            println!("features:   {}", context.feature_width());
            for (i, name) in engine.extractor().feature_names().iter().enumerate() {
                println!("  {:>2}  {}", i, name);
            }
            if let Some(dropped) = context.country.dropped_category() {
                println!("dropped country category: {}", dropped);
            }
        }
    }

    Ok(())
}
