use clap::Parser;
use lib::{
    PipelineError, ScrapeConfig, SimpleLogger, clean, extract_table, fetch_html, publish,
    write_json,
};
use log::{debug, error, info};
use std::path::PathBuf;
use std::time::{Duration, Instant};

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page holding the table of tallest buildings
    #[arg(long, default_value = "https://ru.wikipedia.org/wiki/Список_самых_высоких_зданий_мира")]
    url: String,

    /// Class marking the table to scrape
    #[arg(long, default_value = "wikitable")]
    table_class: String,

    /// Maximum number of table rows to keep
    #[arg(long, default_value_t = 20)]
    row_limit: usize,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Output JSON file (overwritten on every run)
    #[arg(short, long, default_value = "cleaned_data.json")]
    output: PathBuf,

    /// Kafka bootstrap broker
    #[arg(long, default_value = "localhost:9092")]
    broker: String,

    /// Kafka topic receiving one message per record
    #[arg(long, default_value = "bonus_22B22B1533")]
    topic: String,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

impl From<Args> for ScrapeConfig {
    fn from(args: Args) -> Self {
        Self {
            url: args.url,
            table_class: args.table_class,
            row_limit: args.row_limit,
            timeout: Duration::from_secs(args.timeout_secs),
            output: args.output,
            broker: args.broker,
            topic: args.topic,
        }
    }
}

/// fetch -> extract -> clean -> persist -> publish, stopping at the first
/// stage that fails or produces nothing.
fn run(config: &ScrapeConfig) -> Result<usize, PipelineError> {
    let html = fetch_html(&config.url, config.timeout)?;

    let table = extract_table(&html, &config.table_class, config.row_limit)?;
    if table.is_empty() {
        return Err(PipelineError::EmptyResult("scraping"));
    }

    let cleaning_start = Instant::now();
    let records = clean(table);
    debug!("Cleaning took {:.2?}", cleaning_start.elapsed());
    if records.is_empty() {
        return Err(PipelineError::EmptyResult("cleaning"));
    }

    write_json(&records, &config.output)?;
    publish(&records, &config.topic, &config.broker);
    Ok(records.len())
}

fn main() -> Result<(), PipelineError> {
    let total_start = Instant::now();
    if let Err(e) = log::set_logger(&LOGGER) {
        eprintln!("Could not install logger: {}", e);
        return Ok(());
    }

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    let config = ScrapeConfig::from(args);
    debug!("{:?}", config);

    match run(&config) {
        Ok(count) => info!(
            "Pipeline completed in {:.2?} with {} records",
            total_start.elapsed(),
            count
        ),
        Err(e @ (PipelineError::Io(_) | PipelineError::Json(_))) => {
            error!("Could not save {}: {}", config.output.display(), e);
            return Err(e);
        }
        Err(e) => error!("Run stopped: {}", e),
    }
    Ok(())
}
