//! # Kiosk Register
//!
//! ## Usage
//! ```bash
//! kiosk                              # kiosk.toml if present, platform data dir
//! kiosk --config ./store.toml
//! kiosk --db ./kiosk_dev.db          # overrides database_path
//! KIOSK_STORE_NAME="Kiosco Centro" kiosk
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize logging (stderr, `RUST_LOG` aware)
//! 2. Load configuration
//! 3. Connect to the database, run pending migrations
//! 4. Read commands from stdin until `quit` or end of input

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use tokio::io::{self, BufReader};
use tracing::info;

use kiosk_core::Session;
use kiosk_db::{Database, DbConfig};
use kiosk_terminal::config::TerminalConfig;
use kiosk_terminal::register::Register;
use kiosk_terminal::render::Renderer;

struct Args {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args { config: None, db: None };
    let mut iter = env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--db" => args.db = Some(iter.next().context("--db needs a path")?.into()),
            "--help" | "-h" => {
                println!("Usage: kiosk [--config <file>] [--db <file>]");
                return Ok(None);
            }
            other => bail!("Unknown argument: {}", other),
        }
    }

    Ok(Some(args))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kiosk_terminal::init_tracing();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let mut config = TerminalConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(db) = args.db {
        config.database_path = Some(db);
    }

    let db_path = config.resolve_database_path()?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let session = Session::new(config.user_id.clone(), config.display_name.clone());
    let renderer = Renderer::new(&config);
    let mut register = Register::new(db.clone(), session, &config);

    info!(store = %config.store_name, user_id = %config.user_id, "Register ready");
    println!("{}", renderer.banner(&config.display_name));

    let result = kiosk_terminal::run(&mut register, &renderer, BufReader::new(io::stdin()), io::stdout()).await;

    db.close().await;
    result.context("Register I/O failed")
}
