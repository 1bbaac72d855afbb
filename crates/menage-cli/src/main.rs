//! Ménage CLI - Monthly budget recommendations
//!
//! Usage:
//!   menage init                           Initialize database
//!   menage import --file CSV --account A  Import transactions
//!   menage recommend --months 3           Compute budgets
//!   menage serve --port 3000              Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Accounts { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_accounts_list(&db, &cli.user),
                Some(AccountsAction::Add { name, kind }) => {
                    commands::cmd_accounts_add(&db, &cli.user, &name, &kind)
                }
            }
        }
        Commands::Import { file, account } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &cli.user, &file, &account).map(|_| ())
        }
        Commands::Periods { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_periods_list(&db, &cli.user),
                Some(PeriodsAction::Close { month, start, end }) => commands::cmd_periods_close(
                    &db,
                    &cli.user,
                    &month,
                    start.as_deref(),
                    end.as_deref(),
                ),
                Some(PeriodsAction::Reopen { month }) => {
                    commands::cmd_periods_reopen(&db, &cli.user, &month)
                }
            }
        }
        Commands::Targets { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_targets_list(&db, &cli.user),
                Some(TargetsAction::Set { category, amount }) => {
                    commands::cmd_targets_set(&db, &cli.user, &category, amount)
                }
                Some(TargetsAction::Clear { category }) => {
                    commands::cmd_targets_clear(&db, &cli.user, &category)
                }
            }
        }
        Commands::Recommend {
            months,
            month,
            savings_rate,
            targets,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            let request = commands::build_request(months, month, savings_rate, &targets)?;
            commands::cmd_recommend(&db, &engine, &cli.user, &request, json)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => {
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_serve(&cli.db, engine, &host, port, no_auth).await
        }
    }
}
