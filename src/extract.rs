use crate::error::{PipelineError, Result};
use crate::structs::RawTable;
use log::{debug, info};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("selector should parse"));
static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("selector should parse"));
static HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("selector should parse"));
static DATA_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("selector should parse"));

/// Downloads the page at `url` and returns its body as text.
///
/// A single GET is issued with a browser-like `User-Agent`; there are no retries.
///
/// # Arguments
/// * `url` - Page to download
/// * `timeout` - Upper bound for the whole request
///
/// # Errors
/// Returns `PipelineError::Fetch` on connection failures, timeouts and
/// non-success status codes.
pub fn fetch_html(url: &str, timeout: Duration) -> Result<String> {
    info!("Scraping started: {}", url);
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;

    let response = client.get(url).send()?.error_for_status()?;
    debug!("GET {} -> {}", url, response.status());
    let body = response.text()?;
    debug!("Received {} bytes", body.len());
    Ok(body)
}

/// Pulls the header row and up to `row_limit` data rows out of the first
/// `<table>` carrying `table_class`.
///
/// Data rows whose cell count differs from the header count (merged cells,
/// section dividers) are skipped without error.
///
/// # Arguments
/// * `html` - Raw page markup
/// * `table_class` - Marker class identifying the target table
/// * `row_limit` - Maximum number of accepted data rows
///
/// # Errors
/// Returns `PipelineError::NotFound` if no table carries the class and
/// `PipelineError::MalformedTable` if the table has no header row.
pub fn extract_table(html: &str, table_class: &str, row_limit: usize) -> Result<RawTable> {
    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE)
        .find(|t| t.value().classes().any(|c| c == table_class))
        .ok_or_else(|| PipelineError::NotFound(table_class.to_string()))?;

    let mut rows = table.select(&ROW);
    let header_row = rows
        .next()
        .ok_or_else(|| PipelineError::MalformedTable("table has no rows".to_string()))?;
    let headers: Vec<String> = header_row.select(&HEADER_CELL).map(cell_text).collect();
    if headers.is_empty() {
        return Err(PipelineError::MalformedTable(
            "first row has no header cells".to_string(),
        ));
    }

    let mut data = Vec::new();
    let mut skipped = 0;
    for row in rows {
        if data.len() >= row_limit {
            break;
        }
        let cells: Vec<String> = row.select(&DATA_CELL).map(cell_text).collect();
        if cells.len() == headers.len() {
            data.push(cells);
        } else {
            skipped += 1;
        }
    }

    debug!("Skipped {} rows with mismatched cell count", skipped);
    info!("Scraping finished. Extracted {} rows.", data.len());
    Ok(RawTable::new(headers, data))
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().replace('\n', " ")
}
