mod cli;

use std::path::Path;
use std::sync::Arc;
use clap::Parser;
use cli::{Cli, Commands, DraftAction, ReclaimAction};
use colored::*;
use grant_wizard::{
    draft::{DraftStore, SqliteDraftStore},
    error::{GrantError, Result},
    notify::{ConsoleNotifier, LogNotifier, Notifier},
    program::ProgramFilter,
    reclaim::{EligibilityChecker, ReclaimExecutor, ReclaimKey, ReclaimableItem},
    repository::{fetch_all, MemoryRepository},
    utils,
    wizard::{ProgramMode, ValidationEngine},
    Config,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", format!("Failed to load configuration: {}", e).red());
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Init => {
            info!("Initializing...");
            initialize(&config, &cli.config)
        }

        Commands::Draft { action } => match action {
            DraftAction::Show => show_draft(&config),
            DraftAction::Check => check_draft(&config),
            DraftAction::Clear { yes } => clear_draft(&config, yes),
        },

        Commands::Reclaim { action } => match action {
            ReclaimAction::List { verbose, format } => {
                info!("Listing reclaimable items...");
                list_reclaimable(&config, verbose, &format).await
            }
            ReclaimAction::Program { id, yes } => {
                info!("Reclaiming program: {}", id);
                reclaim_item(&config, ReclaimKey::program(&id), yes).await
            }
            ReclaimAction::Milestone { id, yes } => {
                info!("Reclaiming milestone: {}", id);
                reclaim_item(&config, ReclaimKey::milestone(&id), yes).await
            }
        },
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn initialize(config: &Config, config_path: &str) -> Result<()> {
    println!("{}", "Initializing grant-wizard...".cyan());

    SqliteDraftStore::new(&config.drafts.path, &config.drafts.key)?;
    println!("✓ Draft database ready at {}", config.drafts.path);

    if Path::new(config_path).exists() {
        println!("✓ Using existing config {}", config_path);
    } else {
        std::fs::write(config_path, config.to_toml()?)?;
        println!("✓ Wrote config template to {}", config_path);
    }

    println!("\n{}", "Initialization complete!".green().bold());
    Ok(())
}

fn open_drafts(config: &Config) -> Result<SqliteDraftStore> {
    SqliteDraftStore::new(&config.drafts.path, &config.drafts.key)
}

fn show_draft(config: &Config) -> Result<()> {
    let store = open_drafts(config)?;
    match store.get()? {
        Some(draft) => {
            if let Some(updated_at) = store.updated_at()? {
                println!("{} {}", "Saved at:".cyan(), updated_at);
            }
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        None => println!("{}", "No saved draft".yellow()),
    }
    Ok(())
}

fn check_draft(config: &Config) -> Result<()> {
    let store = open_drafts(config)?;
    let Some(draft) = store.get()? else {
        println!("{}", "No saved draft".yellow());
        return Ok(());
    };

    let mode = ProgramMode::New;
    let mut failed = false;
    for tab in mode.tabs() {
        let errors = ValidationEngine::validate_tab(*tab, &draft, mode.is_published());
        if errors.is_empty() {
            println!("{} {}", "✓".green(), tab);
            continue;
        }
        failed = true;
        println!("{} {}", "✗".red(), tab);
        for field in errors.fields() {
            println!("    {}: {}", field, errors.message(field).unwrap_or_default());
        }
    }

    if failed {
        return Err(GrantError::InvalidState("draft is not ready to submit".to_string()));
    }
    println!("\n{}", "Draft is ready to submit".green().bold());
    Ok(())
}

fn clear_draft(config: &Config, yes: bool) -> Result<()> {
    let store = open_drafts(config)?;
    if store.get()?.is_none() {
        println!("{}", "No saved draft".yellow());
        return Ok(());
    }

    if !yes && !utils::confirm_action("Discard the saved draft?")? {
        println!("Cancelled");
        return Ok(());
    }

    store.clear()?;
    println!("{}", "✓ Draft cleared".green());
    Ok(())
}

fn open_repository(config: &Config) -> Result<(Arc<MemoryRepository>, String)> {
    let user_id = config.user_id()?.to_string();
    let repo = MemoryRepository::load(Path::new(&config.repository.fixture_path), &user_id)?;
    Ok((Arc::new(repo), user_id))
}

fn build_executor(
    config: &Config,
    repo: &Arc<MemoryRepository>,
    user_id: &str,
    notifier: Arc<dyn Notifier>,
) -> ReclaimExecutor {
    ReclaimExecutor::new(
        repo.clone(),
        repo.clone(),
        notifier,
        user_id,
        config.repository.page_size,
    )
    .with_program_type(config.repository.program_type)
}

async fn list_reclaimable(config: &Config, verbose: bool, format: &str) -> Result<()> {
    let (repo, user_id) = open_repository(config)?;
    // Keep stdout clean for machine-readable output
    let notifier: Arc<dyn Notifier> = if format == "json" {
        Arc::new(LogNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };
    let executor = build_executor(config, &repo, &user_id, notifier);

    let items = executor.refresh().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!("\n{}", "=== Reclaimable ===".cyan().bold());
    if items.is_empty() {
        println!("{}", "Nothing to reclaim".yellow());
    } else {
        print_items(&items);
    }

    if verbose {
        let now = chrono::Utc::now();
        let query = executor.query(ProgramFilter::Creator(user_id.clone()));
        let sponsored = fetch_all(repo.as_ref(), query).await?;

        println!("\n{}", "Sponsored programs:".yellow());
        println!("Checked at {}", utils::format_timestamp(&now));
        for program in &sponsored {
            println!(
                "  {} {}: {}",
                utils::format_id(&program.id),
                program.name,
                EligibilityChecker::program_reason(program, now)
            );
        }
    }

    Ok(())
}

fn print_items(items: &[ReclaimableItem]) {
    let widths = [16, 18, 24, 20, 40];
    utils::print_table_border(126);
    utils::print_table_row(&["Kind", "Id", "Program", "Amount", "Reason"], &widths);
    utils::print_table_border(126);
    for item in items {
        let key = item.key();
        utils::print_table_row(
            &[
                &key.kind.to_string(),
                &utils::format_id(&key.id),
                &item.program_name,
                &utils::format_amount(item.amount, &item.currency),
                &item.reason,
            ],
            &widths,
        );
    }
    utils::print_table_border(126);
}

async fn reclaim_item(config: &Config, key: ReclaimKey, yes: bool) -> Result<()> {
    let (repo, user_id) = open_repository(config)?;
    let executor = build_executor(config, &repo, &user_id, Arc::new(ConsoleNotifier));

    let items = executor.refresh().await?;
    let item = items
        .iter()
        .find(|item| item.key() == key)
        .ok_or_else(|| GrantError::NotFound(format!("{} is not reclaimable", key)))?;

    println!("Program: {}", item.program_name);
    println!("Reason:  {}", item.reason);
    println!("Amount:  {}", utils::format_amount(item.amount, &item.currency));

    if !yes && !utils::confirm_action(&format!("Reclaim {}?", key))? {
        println!("Cancelled");
        return Ok(());
    }

    let result = executor.reclaim(item).await?;
    repo.save(Path::new(&config.repository.fixture_path))?;

    if let Some(remaining) = result.items {
        println!("{} item(s) left to reclaim", remaining.len());
    }
    Ok(())
}
