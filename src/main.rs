mod telemetry;

use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use sitechat::config::AppConfig;
use sitechat::coordinator::{CrawlOverrides, IndexOutcome};
use sitechat::engine::{DEFAULT_TOP_K, RagEngine};
use sitechat::search::{ImageQuery, ImageSort};
use sitechat::{Error, ErrorKind, ErrorReport};
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Crawl a website into a local index and chat with it", long_about = None)]
struct Cli {
    /// Database path (overrides SITECHAT_DATABASE)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a website and index its pages into a new collection
    Index(IndexArgs),

    /// Ask a question about an indexed collection
    Query(QueryArgs),

    /// List indexed collections
    List(ListArgs),

    /// Show the record of one collection
    Info(CollectionArgs),

    /// Delete a collection from every store
    Delete(CollectionArgs),

    /// Show page, image and chunk counts of a collection
    Stats(CollectionArgs),

    /// Re-crawl a collection's site and rebuild it under the same name
    Reindex(CollectionArgs),

    /// List the images of a collection
    Images(ImagesArgs),

    /// List the image categories of a collection
    Categories(CollectionArgs),
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// URL to start crawling from
    url: String,

    /// Maximum link depth from the start URL
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Maximum number of pages to index
    #[arg(short = 'p', long)]
    max_pages: Option<u32>,

    /// Pause between requests in milliseconds
    #[arg(long)]
    delay: Option<u64>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Collection to ask
    collection: String,

    /// The question
    question: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Show detailed information
    #[arg(short, long)]
    details: bool,
}

#[derive(Args, Debug)]
struct CollectionArgs {
    /// Collection name
    collection: String,
}

#[derive(Args, Debug)]
struct ImagesArgs {
    /// Collection name
    collection: String,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Images per page (1-100)
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Only images whose alt text contains this
    #[arg(long)]
    search: Option<String>,

    /// Only images of this category ("all" for every category)
    #[arg(long)]
    category: Option<String>,

    /// newest, oldest, size_desc, size_asc or alpha
    #[arg(long, default_value = "newest")]
    sort: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _otel = match telemetry::init_tracing_subscriber(cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error [internal]: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) => {
                let report = ErrorReport::from(err);
                eprintln!("error [{}]: {}", report.kind, report.message);
                if report.kind == ErrorKind::Input {
                    ExitCode::from(2)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                eprintln!("error [{}]: {:#}", ErrorKind::Internal, e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    let engine = RagEngine::open(&config).await?;

    match cli.command {
        Commands::Index(args) => index_command(&engine, args).await,
        Commands::Query(args) => query_command(&engine, args).await,
        Commands::List(args) => list_command(&engine, args).await,
        Commands::Info(args) => info_command(&engine, args).await,
        Commands::Delete(args) => {
            engine.delete_collection(&args.collection).await?;
            println!("Collection '{}' deleted successfully", args.collection);
            Ok(())
        }
        Commands::Stats(args) => {
            let stats = engine.collection_stats(&args.collection).await?;
            println!("Collection: {}", args.collection);
            println!("Pages: {}", stats.pages_count);
            println!("Images: {}", stats.images_count);
            println!("Chunks: {}", stats.chunk_count);
            println!("Content size: {} bytes", stats.content_size);
            Ok(())
        }
        Commands::Reindex(args) => {
            let spinner = spinner(format!("Re-crawling {}...", args.collection));
            let outcome = engine.reindex(&args.collection).await;
            spinner.finish_and_clear();
            print_outcome(&outcome?);
            Ok(())
        }
        Commands::Images(args) => images_command(&engine, args).await,
        Commands::Categories(args) => {
            for category in engine.image_categories(&args.collection).await? {
                println!("{}", category);
            }
            Ok(())
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_outcome(outcome: &IndexOutcome) {
    match outcome {
        IndexOutcome::Indexed {
            collection_name,
            document_count,
            chunk_count,
            image_count,
        } => {
            println!("Successfully indexed {} pages", document_count);
            println!("Collection: {}", collection_name);
            println!("Chunks: {}, images: {}", chunk_count, image_count);
        }
        IndexOutcome::NoContent { url } => {
            println!("No content found at {}; nothing was indexed", url);
        }
    }
}

fn format_timestamp(ts: f64) -> String {
    DateTime::<Utc>::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[instrument(skip(engine))]
async fn index_command(engine: &RagEngine, args: IndexArgs) -> anyhow::Result<()> {
    let overrides = CrawlOverrides {
        max_depth: args.max_depth,
        max_pages: args.max_pages,
        delay_ms: args.delay,
    };

    let spinner = spinner(format!("Crawling {}...", args.url));
    let outcome = engine.spawn_index(args.url.clone(), overrides).await;
    spinner.finish_and_clear();

    print_outcome(&outcome??);
    Ok(())
}

#[instrument(skip(engine))]
async fn query_command(engine: &RagEngine, args: QueryArgs) -> anyhow::Result<()> {
    let answer = engine
        .query(&args.question, &args.collection, args.top_k)
        .await?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "query": args.question,
                "response": answer.response,
                "collection_name": args.collection,
                "kind": answer.kind,
                "sources": answer.sources,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("{}", answer.response);
            if !answer.sources.is_empty() {
                println!("\nSources:");
                for (i, source) in answer.sources.iter().enumerate() {
                    println!("{}. {}", i + 1, source);
                }
            }
        }
    }
    Ok(())
}

#[instrument(skip(engine))]
async fn list_command(engine: &RagEngine, args: ListArgs) -> anyhow::Result<()> {
    let names = engine.list_collections().await?;
    println!("Collections: {}", names.len());

    for name in names {
        if !args.details {
            println!("{}", name);
            continue;
        }
        let record = engine.get_collection(&name).await?;
        println!("Name: {}", record.name);
        println!("URL: {}", record.url);
        println!("Domain: {}", record.domain);
        println!("Indexed: {}", format_timestamp(record.indexed_at));
        println!("Pages: {}", record.document_count);
        println!("Images: {}", record.image_count);
        println!();
    }
    Ok(())
}

async fn info_command(engine: &RagEngine, args: CollectionArgs) -> anyhow::Result<()> {
    let record = engine.get_collection(&args.collection).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

#[instrument(skip(engine))]
async fn images_command(engine: &RagEngine, args: ImagesArgs) -> anyhow::Result<()> {
    let query = ImageQuery {
        page: args.page,
        limit: args.limit,
        search: args.search,
        category: args.category,
        sort: args.sort.parse::<ImageSort>().map_err(Error::from)?,
    };
    let page = engine.list_images(&args.collection, &query).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => {
            println!(
                "Showing {} of {} images in {}",
                page.images.len(),
                page.count,
                page.collection_name
            );
            for image in &page.images {
                let alt = if image.alt.is_empty() { "(no alt)" } else { image.alt.as_str() };
                println!("- {} [{}] {}", alt, image.category, image.dimensions);
                println!("  {}", image.url);
                println!("  from {}", image.page_url);
            }
        }
    }
    Ok(())
}
