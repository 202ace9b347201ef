// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::Path;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --quiet
    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = Path::new(&cli.config);

    match cli.command {
        Commands::Build {
            versions,
            output_directory,
        } => commands::cmd_build(config, &versions, Path::new(&output_directory)),

        Commands::List { db, page } => {
            commands::cmd_list(config, &db.db_path, page.page, page.per_page)
        }

        Commands::Show { name, db } => commands::cmd_show(&name, &db.db_path),

        Commands::Search { filters, db, page } => {
            commands::cmd_search(config, &filters, &db.db_path, page.page, page.per_page)
        }

        Commands::Maintainers { db } => commands::cmd_maintainers(&db.db_path),

        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "vitrine", &mut std::io::stdout());
            Ok(())
        }
    }
}
