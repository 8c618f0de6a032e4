use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use halflife::{api, client::DoseClient, config::Config, db, models::*, render};

#[derive(Parser)]
#[command(name = "hl")]
#[command(about = "Log doses and see how much is still active")]
struct Cli {
    /// Whose dose log to use (overrides HALFLIFE_USER)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Log a dose
    Add {
        /// Amount in mg
        amount: f64,

        /// When it was taken (RFC 3339 or local YYYY-MM-DDTHH:MM); defaults to now
        #[arg(long)]
        at: Option<String>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Replace a dose's amount, note and optionally its time
    Edit {
        id: String,

        /// Amount in mg
        amount: f64,

        /// New time; keeps the current one when omitted
        #[arg(long)]
        at: Option<String>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Delete a dose
    Rm { id: String },
    /// List every logged dose
    List,
    /// Show the current load, one bar per dose
    Status {
        /// Evaluate at this time instead of now
        #[arg(long)]
        at: Option<String>,
    },
    /// Show the trailing daily load
    History {
        #[arg(short, long, default_value_t = halflife_core::DEFAULT_HISTORY_DAYS)]
        days: u32,
    },
    /// Delete the whole dose log
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Initialize tracing. Client commands log to stderr so stdout only carries
/// their output.
fn init_tracing(use_stderr: bool) {
    let default_filter = if use_stderr {
        "halflife=warn"
    } else {
        "halflife=debug,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn local_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

/// Parse a user-supplied time into the local zone with its UTC offset.
fn parse_local(raw: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    let instant = parse_timestamp(raw)?.with_timezone(&Local);
    Ok(instant.with_timezone(instant.offset()))
}

fn dose_input(
    amount: f64,
    at: Option<String>,
    note: Option<String>,
) -> anyhow::Result<DoseInput> {
    let timestamp = at
        .map(|raw| parse_local(&raw).map(|t| t.to_rfc3339()))
        .transpose()?;
    Ok(DoseInput {
        amount: Some(amount),
        timestamp,
        note,
    })
}

async fn serve(
    config: &Config,
    port: Option<u16>,
    db_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.port);

    let db = match db_path.or_else(|| config.db_path.clone()) {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let security = config.security();
    if security.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    let app = api::create_router_with(db, security);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    tracing::info!("Dose tracker listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_client(client: &DoseClient, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Add { amount, at, note } => {
            let dose = client.create_dose(&dose_input(amount, at, note)?).await?;
            println!("Logged {}mg ({})", dose.amount, dose.id);
        }
        Commands::Edit {
            id,
            amount,
            at,
            note,
        } => {
            let dose = client
                .update_dose(&id, &dose_input(amount, at, note)?)
                .await?;
            println!("Updated {} to {}mg", dose.id, dose.amount);
        }
        Commands::Rm { id } => {
            client.delete_dose(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::List => {
            let doses = client.list_doses().await?;
            print!("{}", render::render_doses(&doses, &Local));
        }
        Commands::Status { at } => {
            let at = match at {
                Some(raw) => parse_local(&raw)?,
                None => local_now(),
            };
            let load = client.current_load(Some(at)).await?;
            print!("{}", render::render_load(&load, &Local));
        }
        Commands::History { days } => {
            let history = client.history(days, Some(local_now())).await?;
            print!("{}", render::render_history(&history));
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!(
                    "Refusing to delete every dose of '{}' without --yes",
                    client.user_id()
                );
            }
            let deleted = client.clear_doses().await?;
            println!("Deleted {} doses", deleted);
        }
        Commands::Serve { .. } => unreachable!("serve is handled before client commands"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let mut config = Config::from_env();
    if let Some(user) = cli.user {
        config.user_id = user;
    }

    match cli.command {
        Some(Commands::Serve { port, db }) => serve(&config, port, db).await,
        // Default: start server
        None => serve(&config, None, None).await,
        Some(command) => run_client(&DoseClient::from_config(&config), command).await,
    }
}
