use clap::Parser;
use release_ops::core::{DeploymentManifest, LogSource};
use release_ops::utils::error::Result;
use release_ops::utils::{logger, validation::Validate};
use release_ops::{
    CliConfig, JiraClient, LocalLogSource, ReleaseConfig, ReleaseEngine, ReleaseError,
    ReleaseOutcome, ScpLogSource,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting release-ticket");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證參數
    if let Err(e) = config.validate() {
        fail(&e);
    }

    match run(&config).await {
        Ok(outcome) => report(&outcome),
        Err(e) => fail(&e),
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<ReleaseOutcome> {
    tracing::info!("📁 Loading configuration from: {}", cli.config);
    let settings_file = ReleaseConfig::from_file(&cli.config)?;
    settings_file.validate()?;

    let jira_config = settings_file.require_jira()?;
    let name_map = settings_file.require_services()?;
    let settings = settings_file.reconcile_settings()?;
    let timeout = settings_file.timeout();

    let previous = DeploymentManifest::from_file(&cli.previous)?;
    let current = DeploymentManifest::from_file(&cli.current)?;

    let log_source: Box<dyn LogSource> = match &cli.release_log {
        Some(path) => {
            tracing::info!("📄 Using local release log {}", path);
            Box::new(LocalLogSource::new(path))
        }
        None => {
            let remote = settings_file.require_log_source()?;
            Box::new(ScpLogSource {
                program: remote.program.clone(),
                host: remote.host.clone(),
                port: remote.port,
                remote_path: remote.remote_path.clone(),
                username: cli.user.clone(),
                key_path: PathBuf::from(&cli.keys),
                local_path: PathBuf::from(&remote.local_path),
                timeout,
            })
        }
    };

    let jira = JiraClient::new(
        &jira_config.base_url,
        &jira_config.username,
        &jira_config.api_token,
        timeout,
    )?;

    let engine = ReleaseEngine::new(log_source.as_ref(), &jira, name_map, &settings);
    engine
        .run(&previous, &current, &cli.release_request())
        .await
}

fn report(outcome: &ReleaseOutcome) {
    let report = &outcome.report;

    println!("✅ Release ticket: {}", report.ticket_url);
    if !report.created {
        println!("   (existing ticket updated)");
    }
    println!("📦 Released: {:?}", outcome.release_set);
    println!("🔎 Found in release log: {:?}", report.log_match.found);

    if let Some(versions) = &report.versions {
        for name in &versions.updated {
            println!("[JIRA] {} \"released\" on Jira", name);
        }
        for name in &versions.unchanged {
            println!("[JIRA] {} already in the requested state", name);
        }
    }

    for warning in &report.warnings {
        eprintln!("[WARNING] {}", warning);
    }
}

fn fail(e: &ReleaseError) -> ! {
    tracing::error!(
        "❌ release-ticket failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
