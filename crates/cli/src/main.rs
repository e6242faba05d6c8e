//! Stagedoor CLI - sign in, browse events and manage orders.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and sign in
//! sd-cli signup -e fan@example.com -p hunter22
//! sd-cli login -e fan@example.com -p hunter22
//!
//! # Sign in as an admin
//! sd-cli login --admin -e ops@admin.com -p hunter22
//!
//! # Browse and book events
//! sd-cli events list --page 1
//! sd-cli events book G5vYZ9 --page 1
//!
//! # Orders
//! sd-cli orders list
//! sd-cli orders create -t "Front row" --price 45
//! sd-cli orders delete 12
//! sd-cli orders summary
//! ```
//!
//! # Commands
//!
//! - `signup` / `login` - Authenticate and store the session
//! - `logout` / `whoami` - Clear or show the stored session
//! - `orders` - List, create, delete and summarize orders
//! - `events` - List events and book one

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagedoor_client::api::AuthMode;
use stagedoor_client::{AppError, ClientConfig};
use stagedoor_core::OrderId;

mod commands;
mod output;

use commands::Context;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Stagedoor ticketing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Signup(Credentials),
    /// Sign in to an existing account
    Login(Credentials),
    /// Clear the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Browse and book events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
}

#[derive(clap::Args)]
pub(crate) struct Credentials {
    /// Use the admin endpoints
    #[arg(long)]
    pub(crate) admin: bool,

    /// Account email address
    #[arg(short, long)]
    pub(crate) email: String,

    /// Account password
    #[arg(short, long, env = "STAGEDOOR_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders (or every order with --all, admins only)
    List {
        #[arg(long)]
        all: bool,
    },
    /// Create an order
    Create {
        /// Order title
        #[arg(short, long)]
        title: String,

        /// Total price, e.g. 45 or 45.50
        #[arg(long)]
        price: String,

        /// Event date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        venue: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Discovery event id
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Delete an order
    Delete {
        /// Order id
        id: OrderId,
    },
    /// Order count, revenue and average (admins only)
    Summary,
}

#[derive(Subcommand)]
enum EventsAction {
    /// List upcoming events
    List {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Book an event from a listing page
    Book {
        /// Event id as shown by `events list`
        event_id: String,

        /// Page the event appears on
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stagedoor_client=info,stagedoor_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            output::failure(&AppError::from(e).report());
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, &config).await {
        output::failure(&e.report());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), AppError> {
    let ctx = Context::open(config).await?;

    match cli.command {
        Commands::Signup(creds) => {
            commands::auth::sign_in(&ctx, AuthMode::Signup, &creds).await?;
        }
        Commands::Login(creds) => {
            commands::auth::sign_in(&ctx, AuthMode::Login, &creds).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List { all } => commands::orders::list(&ctx, all).await?,
            OrdersAction::Create {
                title,
                price,
                date,
                venue,
                location,
                event_id,
            } => {
                let draft = commands::orders::Draft {
                    title,
                    price,
                    date,
                    venue,
                    location,
                    event_id,
                };
                commands::orders::create(&ctx, draft).await?;
            }
            OrdersAction::Delete { id } => commands::orders::delete(&ctx, id).await?,
            OrdersAction::Summary => commands::orders::summary(&ctx).await?,
        },
        Commands::Events { action } => match action {
            EventsAction::List { page } => commands::events::list(&ctx, page).await?,
            EventsAction::Book { event_id, page } => {
                commands::events::book(&ctx, page, &event_id).await?;
            }
        },
    }
    Ok(())
}
