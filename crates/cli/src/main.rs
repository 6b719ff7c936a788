//! SmartSales CLI - command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Log in (prompts for the password when -p is omitted)
//! smartsales login -u vendedor1
//!
//! # Browse and fill the cart
//! smartsales products --featured
//! smartsales cart add 5
//! smartsales cart set 5 3
//!
//! # Place the order and fetch the receipt
//! smartsales checkout --method efectivo
//! smartsales sales download 10 --format pdf --out receipts/
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `products` / `categories` - Catalog browsing
//! - `cart` - Show and edit the persisted cart
//! - `checkout` - Submit the cart as a sale
//! - `sales` - Sales history and receipt downloads

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use sentry::integrations::tracing as sentry_tracing;
use smartsales_client::api::FileFormat;
use smartsales_client::config::ClientConfig;
use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_core::{CategoryId, ProductId, SaleId, UserRole};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "smartsales")]
#[command(author, version, about = "SmartSales storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and log in as it
    Register {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        city: String,

        /// Account role (`customer`, `seller`, `admin`)
        #[arg(short, long, default_value = "customer")]
        role: UserRole,
    },
    /// Log out and forget the session
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Check the stored credential against the backend
        #[arg(long)]
        verify: bool,
    },
    /// List products
    Products {
        /// Only featured products
        #[arg(long, conflicts_with = "category")]
        featured: bool,

        /// Only products in this category
        #[arg(long)]
        category: Option<CategoryId>,
    },
    /// List product categories
    Categories,
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Submit the cart as a sale
    Checkout {
        /// Payment method (`efectivo`, `paypal`, ...)
        #[arg(short, long)]
        method: String,
    },
    /// Sales history and receipts
    Sales {
        #[command(subcommand)]
        action: SalesAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart (default)
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product ID of the line
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Product ID of the line
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum SalesAction {
    /// List past sales
    List,
    /// Download a sale receipt
    Download {
        /// Sale ID
        sale_id: SaleId,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Pdf)]
        format: FormatArg,

        /// Directory to write the file into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Excel,
}

impl From<FormatArg> for FileFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Excel => Self::Excel,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = ClientConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "smartsales_client=info,smartsales_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(AppError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            tracing::error!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), AppError> {
    let mut state = AppState::new(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&mut state, &username, password).await?;
        }
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            phone,
            city,
            role,
        } => {
            let profile = commands::auth::Profile {
                username,
                email,
                first_name,
                last_name,
                phone,
                city,
                role,
            };
            commands::auth::register(&mut state, profile).await?;
        }
        Commands::Logout => commands::auth::logout(&mut state).await?,
        Commands::Whoami { verify } => commands::auth::whoami(&mut state, verify).await?,
        Commands::Products { featured, category } => {
            commands::catalog::products(&state, featured, category).await?;
        }
        Commands::Categories => commands::catalog::categories(&state).await?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add { product_id } => commands::cart::add(&mut state, product_id).await?,
            CartAction::Set { id, quantity } => commands::cart::set(&mut state, &id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&mut state, &id)?,
            CartAction::Clear => commands::cart::clear(&mut state)?,
        },
        Commands::Checkout { method } => commands::checkout::run(&mut state, &method).await?,
        Commands::Sales { action } => match action {
            SalesAction::List => commands::sales::list(&state).await?,
            SalesAction::Download {
                sale_id,
                format,
                out,
            } => commands::sales::download(&state, sale_id, format.into(), &out).await?,
        },
    }
    Ok(())
}
