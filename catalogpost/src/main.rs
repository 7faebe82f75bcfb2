use catalogpost::cli::catalog_cli;
use catalogpost::config::{Config, ENV_DOTENV_FILE, load_dotenv};
use catalogpost::console::{render_notification, run_console};
use catalogpost::draft::{DraftEdit, DraftStore, Photo};
use catalogpost::env::{Env, build_hook_from_config};
use catalogpost::notification::NotificationController;
use catalogpost::orchestrator::{Orchestrator, SubmitOutcome};
use catalogpost::rebuild::{RebuildTrigger, TriggerOutcome};
use catalogpost::validate::missing_requirements;
use clap::ArgMatches;
use log::{debug, error, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> ExitCode {
    // Before the logger so RUST_LOG can come from the file
    let dotenv_file = std::env::var_os(ENV_DOTENV_FILE).map(PathBuf::from);
    let dotenv = load_dotenv(dotenv_file.as_deref());
    env_logger::init();
    match dotenv {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring unreadable env file: {}", e),
    }

    let matches = catalog_cli().get_matches();
    let config = Config::from_matches(&matches);
    let client = reqwest::Client::new();

    let result = match matches.subcommand() {
        Some(("submit", args)) => submit(&config, client, args).await,
        Some(("rebuild", _)) => rebuild(&config, client).await,
        Some(("console", _)) => console(&config, client).await,
        _ => Err("Unknown command".to_string()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn orchestrator(config: &Config, client: reqwest::Client) -> Result<Arc<Orchestrator>, String> {
    let env = Env::from_config(config, client)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Arc::new(Orchestrator::new(
        Arc::new(env),
        Arc::new(RwLock::new(DraftStore::new())),
        Arc::new(NotificationController::default()),
    )))
}

async fn submit(
    config: &Config,
    client: reqwest::Client,
    args: &ArgMatches,
) -> Result<ExitCode, String> {
    let get = |id: &str| args.get_one::<String>(id).cloned().unwrap_or_default();

    let photo_path = get("photo");
    let photo = Photo::load(&photo_path).await.map_err(|e| e.to_string())?;
    let orchestrator = orchestrator(config, client).await?;

    orchestrator.edit(DraftEdit::Name(get("name"))).await;
    orchestrator.edit(DraftEdit::Notes(get("notes"))).await;
    orchestrator.edit(DraftEdit::PriceThousands(get("price"))).await;
    orchestrator.edit(DraftEdit::Photo(Some(photo))).await;

    let outcome = orchestrator.submit().await;
    if let Some(line) = render_notification(&orchestrator.notifications().current()) {
        println!("{}", line);
    }

    match outcome {
        SubmitOutcome::Submitted(record) => {
            println!("{} stored, photo at {}", record.name, record.photo_url);
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Failed(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Skipped => {
            let draft = orchestrator.draft().await;
            for requirement in missing_requirements(&draft, orchestrator.state().await) {
                eprintln!("- {}", requirement.describe());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn rebuild(config: &Config, client: reqwest::Client) -> Result<ExitCode, String> {
    let hook = build_hook_from_config(config, client).map_err(|e| e.to_string())?;
    match RebuildTrigger::new(hook).trigger().await {
        TriggerOutcome::Settled => println!("rebuild requested"),
        TriggerOutcome::Rejected => println!("rebuild already in progress"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn console(config: &Config, client: reqwest::Client) -> Result<ExitCode, String> {
    let rebuild = build_hook_from_config(config, client.clone())
        .ok()
        .map(|hook| Arc::new(RebuildTrigger::new(hook)));
    let orchestrator = orchestrator(config, client).await?;

    run_console(
        orchestrator,
        rebuild,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
    .map_err(|e| e.to_string())?;

    Ok(ExitCode::SUCCESS)
}
