//! Shopping query CLI - run model queries through the driver manager.
//!
//! Commands:
//! - `shopq paginate` - Page of records with a total count
//! - `shopq simple-paginate` - Page of records without a count
//! - `shopq cursor-paginate` - Cursor addressed page
//! - `shopq search` - Free-text search
//! - `shopq all` - Every matching record
//! - `shopq drivers` - Registered drivers and per-model routing

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{AllArgs, CursorArgs, DriversArgs, PageArgs, SearchArgs};

/// Query Shopping models through the database or Typesense drivers
#[derive(Parser)]
#[command(name = "shopq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Driver to request (defaults to the configured query_method)
    #[arg(short, long, global = true)]
    driver: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page of records with a total count
    Paginate(PageArgs),

    /// Page of records without a total count
    SimplePaginate(PageArgs),

    /// Page of records addressed by a cursor
    CursorPaginate(CursorArgs),

    /// Free-text search over model fields
    Search(SearchArgs),

    /// Every record matching the filters
    All(AllArgs),

    /// List drivers and which one serves each model
    Drivers(DriversArgs),
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("shop_query={level},shop_search={level},shop_db={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config and build the manager
    let ctx = match context::Context::load(cli.config.as_deref(), cli.driver, output.clone()).await {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Paginate(args) => commands::paginate::run(args, false, &ctx).await,
        Commands::SimplePaginate(args) => commands::paginate::run(args, true, &ctx).await,
        Commands::CursorPaginate(args) => commands::paginate::run_cursor(args, &ctx).await,
        Commands::Search(args) => commands::search::run(args, &ctx).await,
        Commands::All(args) => commands::all::run(args, &ctx).await,
        Commands::Drivers(args) => commands::drivers::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
