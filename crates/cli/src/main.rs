//! ShopEasy CLI - command-line storefront shell.
//!
//! Plays the role of the browser client: browse the catalog, manage the
//! cart (as a guest or logged in), and drive the login session. All cart
//! mutations go through the cart reconciler, never the raw API, so guest
//! carts persist locally and merge into the account cart on login.
//!
//! # Usage
//!
//! ```bash
//! # Browse products
//! shopeasy products list --category Electronics --sort-by price
//! shopeasy products show 64a1f0c2e4b0a1b2c3d4e5f6
//!
//! # Manage the cart (works logged out; stored under ~/.shopeasy)
//! shopeasy cart add 64a1f0c2e4b0a1b2c3d4e5f6 --quantity 2
//! shopeasy cart show
//!
//! # Log in; any guest cart is merged into the account cart
//! shopeasy auth login -e user@example.com -p 'correct horse'
//! ```
//!
//! # Commands
//!
//! - `products` - List, inspect, and categorize catalog products
//! - `cart` - Show and mutate the session cart
//! - `auth` - Register, log in, log out, show the current user

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopeasy_client::api::ApiClient;
use shopeasy_client::api::types::{ProductQuery, SortField, SortOrder};
use shopeasy_client::config::ClientConfig;
use shopeasy_client::session;
use shopeasy_client::storage::FileStore;

mod commands;

#[derive(Parser)]
#[command(name = "shopeasy")]
#[command(author, version, about = "ShopEasy storefront shell")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Show and mutate the session cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the login session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products with optional filters
    List {
        /// Match against name and description
        #[arg(long)]
        search: Option<String>,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Minimum price
        #[arg(long)]
        min_price: Option<String>,

        /// Maximum price
        #[arg(long)]
        max_price: Option<String>,

        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Sort field (`name`, `price`, `createdAt`)
        #[arg(long)]
        sort_by: Option<String>,

        /// Sort order (`asc`, `desc`)
        #[arg(long)]
        sort_order: Option<String>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: String,
    },
    /// List all product categories
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with its total
    Show,
    /// Add units of a product to the cart
    Add {
        /// Product ID
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Overwrite the quantity of a cart line (0 removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        #[arg(short, long)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account and log in
    Register {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (min 6 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Log in with email and password
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Log out and forget the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
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

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ClientConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration.
    // Defaults to warnings only so command output stays readable.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopeasy_cli=warn,shopeasy_client=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiClient::new(config)?;
    let store = FileStore::open(config.data_dir.join("storage.json"))?;

    // A stored token means the last session ended logged in
    let token = session::stored_token(&store)?;
    let authenticated = token.is_some();
    let api = match token {
        Some(token) => api.with_bearer_token(token),
        None => api,
    };

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                min_price,
                max_price,
                page,
                limit,
                sort_by,
                sort_order,
            } => {
                let query = ProductQuery {
                    search,
                    category,
                    min_price: min_price.map(|s| s.parse::<Decimal>()).transpose()?,
                    max_price: max_price.map(|s| s.parse::<Decimal>()).transpose()?,
                    page,
                    limit,
                    sort_by: sort_by.map(|s| s.parse::<SortField>()).transpose()?,
                    sort_order: sort_order.map(|s| s.parse::<SortOrder>()).transpose()?,
                };
                commands::products::list(&api, &query).await?;
            }
            ProductsAction::Show { id } => commands::products::show(&api, &id).await?,
            ProductsAction::Categories => commands::products::categories(&api).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&api, store, authenticated).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&api, store, authenticated, &product_id, quantity).await?,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&api, store, authenticated, &product_id, quantity).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&api, store, authenticated, &product_id).await?;
            }
            CartAction::Clear => commands::cart::clear(&api, store, authenticated).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Register {
                email,
                name,
                password,
            } => commands::auth::register(&api, store, &email, &name, &password).await?,
            AuthAction::Login { email, password } => {
                commands::auth::login(&api, store, &email, &password).await?;
            }
            AuthAction::Logout => commands::auth::logout(store)?,
            AuthAction::Whoami => commands::auth::whoami(&api, store).await?,
        },
    }
    Ok(())
}
