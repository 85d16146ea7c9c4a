use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;

use shopcheck::browser::BrowserSession;
use shopcheck::config::AppConfig;
use shopcheck::error::{CheckError, CheckResult};
use shopcheck::logging::{init_logging, LoggingConfig};
use shopcheck::report::{RunSummary, ScenarioReport};
use shopcheck::scenarios::{self, ScenarioContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioName {
    Console,
    Links,
    Login,
    Pulls,
}

impl ScenarioName {
    const ALL: [ScenarioName; 4] = [
        ScenarioName::Console,
        ScenarioName::Links,
        ScenarioName::Login,
        ScenarioName::Pulls,
    ];

    fn label(self) -> &'static str {
        match self {
            ScenarioName::Console => scenarios::console::NAME,
            ScenarioName::Links => scenarios::links::NAME,
            ScenarioName::Login => scenarios::login::NAME,
            ScenarioName::Pulls => scenarios::pulls::NAME,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "shopcheck", version, about = "End-to-end browser checks for the demo storefront")]
struct Cli {
    /// Target environment name; overrides TEST_ENV and APP_ENV
    #[arg(long)]
    env: Option<String>,
    /// Path to the JSON configuration document
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for CSV output and screenshots
    #[arg(long, default_value = "test-results")]
    output_dir: PathBuf,
    /// Scenario to run; repeat for several, omit for all
    #[arg(long = "scenario", value_enum)]
    scenarios: Vec<ScenarioName>,
    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,
    /// Log level override (e.g. debug, shopcheck=trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv();
    let cli = Cli::parse();

    let _guard = match init_logging(LoggingConfig {
        log_level: cli.log_level.clone(),
        ..Default::default()
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e @ CheckError::Configuration(_)) => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CheckResult<bool> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let env = config.resolve(cli.env.as_deref())?.clone();
    let ctx = ScenarioContext::new(&config, &env, cli.output_dir.clone())?;

    let mut selected: Vec<ScenarioName> = if cli.scenarios.is_empty() {
        ScenarioName::ALL.to_vec()
    } else {
        cli.scenarios
    };
    selected.dedup();

    let session = BrowserSession::launch(cli.headed).await?;
    let mut summary = RunSummary::default();
    for scenario in selected {
        let outcome = match scenario {
            ScenarioName::Console => scenarios::console::run(&ctx, &session).await,
            ScenarioName::Links => scenarios::links::run(&ctx, &session).await,
            ScenarioName::Login => scenarios::login::run(&ctx, &session).await,
            ScenarioName::Pulls => scenarios::pulls::run(&ctx, &session).await,
        };
        match outcome {
            Ok(report) => summary.push(report),
            // A scenario-level error fails that scenario, not the run loop.
            Err(e) => summary.push(ScenarioReport::errored(scenario.label(), &e)),
        }
    }
    session.close().await;

    println!("{}", summary.render());
    Ok(summary.all_passed())
}
