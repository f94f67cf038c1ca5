use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formpilot::browser::{inspect_form, BrowserManager};
use formpilot::classifier::{Classifier, PatternRegistry};
use formpilot::config::Config;
use formpilot::error::FillError;
use formpilot::fill::FormFiller;
use formpilot::llm::{AnswerGenerator, AnswerSource};
use formpilot::models::CandidateProfile;
use formpilot::resolver::ValueResolver;

/// Fill a job-application form from a candidate profile.
#[derive(Parser, Debug)]
#[command(name = "formpilot", version, about)]
struct Args {
    /// URL of the job application form
    url: String,

    /// Path to the candidate profile JSON file
    #[arg(long, short)]
    profile: PathBuf,

    /// Run the browser without a visible window
    #[arg(long)]
    headless: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Keep the browser open this many seconds after filling, for review
    #[arg(long, default_value_t = 0)]
    review_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env();
    if args.headless {
        config.headless = true;
    }

    let profile_json = std::fs::read_to_string(&args.profile)
        .with_context(|| format!("Failed to read profile {}", args.profile.display()))?;
    let profile: CandidateProfile = serde_json::from_str(&profile_json)
        .map_err(|e| FillError::Profile(e.to_string()))?;

    let browser = BrowserManager::new();
    browser
        .launch(&args.url, config.headless)
        .await
        .map_err(|e| FillError::Browser(e.to_string()))?;

    let run = run_fill(&browser, &args, &config, &profile).await;

    if args.review_secs > 0 {
        tracing::info!("Leaving the browser open {}s for review", args.review_secs);
        tokio::time::sleep(std::time::Duration::from_secs(args.review_secs)).await;
    }
    browser.close().await.ok();

    let report = run?;
    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    println!("{}", report.summary());
    Ok(())
}

async fn run_fill(
    browser: &BrowserManager,
    args: &Args,
    config: &Config,
    profile: &CandidateProfile,
) -> anyhow::Result<formpilot::models::RunReport> {
    let mut fields = inspect_form(browser).await?;

    let registry = Arc::new(PatternRegistry::standard());
    let classifier = Classifier::new(registry.clone());
    classifier.annotate(&mut fields);

    // Missing credentials are normal: resolution skips straight to heuristics.
    let source: Option<Arc<dyn AnswerSource>> = if AnswerGenerator::credentials_present() {
        Some(Arc::new(AnswerGenerator::from_config(config)))
    } else {
        tracing::warn!("No generation credentials configured, heuristic answers only");
        None
    };

    let resolver = ValueResolver::new(registry, source);
    let filler = FormFiller::new(browser, resolver, config.clone());
    Ok(filler.fill(&args.url, &fields, profile).await)
}
