use clap::Parser;
use release_ops::core::release_notes::{build_page, publish};
use release_ops::domain::model::{PeriodKind, PublishedPage};
use release_ops::utils::error::Result;
use release_ops::utils::logger;
use release_ops::utils::validation::{validate_non_empty_string, Validate};
use release_ops::{ConfluenceClient, LabelFormatter, ReleaseConfig};

#[derive(Parser, Debug)]
#[command(name = "release-notes")]
#[command(about = "Create a release notes page listing the tickets of a release label")]
struct Args {
    /// Period the release label covers
    #[arg(short = 'f', long = "filter", value_enum)]
    filter: PeriodKind,

    /// Year, month (1-12) or week (1-52) of the label
    #[arg(short = 'l', long = "label")]
    label: u32,

    /// Environment, labelled RE.<env> on the tickets
    #[arg(short = 'e', long = "env")]
    env: String,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = release_ops::config::toml_config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting release-notes");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    match run(&args).await {
        Ok(page) if page.already_existed => {
            println!("Page already existed at : {}", page.link);
        }
        Ok(page) => {
            println!("Release Notes links : {}", page.link);
        }
        Err(e) => {
            tracing::error!(
                "❌ release-notes failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

async fn run(args: &Args) -> Result<PublishedPage> {
    let config = ReleaseConfig::from_file(&args.config)?;
    config.validate()?;

    // 標籤驗證要在任何網路請求之前完成
    let label = LabelFormatter::new(config.labels.allowed_years.clone())
        .format(args.filter, args.label)?;
    tracing::info!("🏷️  Release label: {}", label);

    validate_non_empty_string("env", &args.env)?;

    let confluence = config.require_confluence()?;
    let wiki = ConfluenceClient::new(
        &confluence.base_url,
        &confluence.username,
        &confluence.api_token,
        &confluence.space_key,
        confluence.parent_page_id.clone(),
        config.timeout(),
    )?;

    let today = chrono::Local::now().date_naive();
    let page = build_page(&args.env, &label, today, &config.macro_settings());
    publish(&wiki, &page).await
}
