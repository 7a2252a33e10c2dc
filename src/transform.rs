use crate::error::{PipelineError, Result};
use crate::structs::{BuildingRecord, RawTable, Role};
use log::{debug, error, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

const HEIGHT_MARKER: &str = "Высота";
const HEIGHT_UNIT: &str = "м)";
const RANK_MARKER: &str = "№";
const NAME_MARKER: &str = "Название";
const CITY_MARKER: &str = "Город";

/// Header fragments of columns that never make it into the output
/// (imperial units, spire/roof heights, dates, floors, coordinates, media, notes).
const PRUNE_KEYWORDS: [&str; 10] = [
    "фут",
    "шпилю",
    "крыше",
    "постройки",
    "Этажность",
    "Координаты",
    "Фото",
    "антенны",
    "эксплуатируемого",
    "Примечания",
];

type HeaderMatcher = fn(&str) -> bool;

/// Roles in evaluation order. For each role the first header in column order
/// that satisfies the matcher wins. A column matched by two roles ends up
/// with the later one.
const ROLE_MATCHERS: [(Role, HeaderMatcher); 4] = [
    (Role::Height, is_height_header),
    (Role::Rank, is_rank_header),
    (Role::Name, is_name_header),
    (Role::City, is_city_header),
];

static HEADER_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t\u{a0}()]").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static FOOTNOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.+?\]").expect("valid regex"));
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

fn is_height_header(header: &str) -> bool {
    // Headers are matched after normalization has removed parentheses, so
    // the unit fragment only fires on headers passed in unnormalized.
    header.contains(HEIGHT_MARKER) || header.contains(HEIGHT_UNIT)
}

fn is_rank_header(header: &str) -> bool {
    header.contains(RANK_MARKER)
}

fn is_name_header(header: &str) -> bool {
    header.contains(NAME_MARKER)
}

fn is_city_header(header: &str) -> bool {
    header.contains(CITY_MARKER)
}

/// Column index chosen for each discovered role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMap {
    columns: HashMap<Role, usize>,
}

impl RoleMap {
    pub fn get(&self, role: Role) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn role_of(&self, index: usize) -> Option<Role> {
        self.columns
            .iter()
            .find(|&(_, &i)| i == index)
            .map(|(&role, _)| role)
    }

    /// Points `role` at `index`, taking the column away from any role that held it.
    fn assign(&mut self, role: Role, index: usize) -> Option<Role> {
        let previous = self.role_of(index);
        if let Some(previous) = previous {
            self.columns.remove(&previous);
        }
        self.columns.insert(role, index);
        previous
    }
}

/// One column of the table while it is being cleaned.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Normalized header as it appeared on the page.
    pub header: String,
    /// Canonical name for role columns, otherwise the header.
    pub name: String,
    pub role: Option<Role>,
    pub values: Vec<String>,
}

/// Column-oriented working copy of the table. Cells stay plain strings
/// until the numeric coercion step.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningContext {
    pub columns: Vec<Column>,
    pub row_count: usize,
}

impl CleaningContext {
    /// Builds the working table from normalized headers and raw rows.
    /// Rows whose length differs from the header count are left out.
    pub fn new(headers: Vec<String>, rows: &[Vec<String>], roles: &RoleMap) -> Self {
        let rows: Vec<&Vec<String>> = rows.iter().filter(|r| r.len() == headers.len()).collect();
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(i, header)| {
                let role = roles.role_of(i);
                Column {
                    name: role.map_or_else(|| header.clone(), |r| r.canonical_name().to_string()),
                    header,
                    role,
                    values: rows.iter().map(|r| r[i].clone()).collect(),
                }
            })
            .collect();
        Self {
            columns,
            row_count: rows.len(),
        }
    }

    pub fn column(&self, role: Role) -> Option<&Column> {
        self.columns.iter().find(|c| c.role == Some(role))
    }

    fn column_mut(&mut self, role: Role) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.role == Some(role))
    }
}

/// A row after coercion; any field may still be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub rank: Option<u32>,
    pub building_name: Option<String>,
    pub city: Option<String>,
    pub height_meters: Option<f64>,
}

impl PartialRecord {
    /// Returns the complete record, or `None` if any field is missing.
    pub fn complete(self) -> Option<BuildingRecord> {
        Some(BuildingRecord {
            rank: self.rank?,
            building_name: self.building_name?,
            city: self.city?,
            height_meters: self.height_meters?,
        })
    }
}

/// Cleans a scraped table into building records.
///
/// Runs, in order: header normalization, role discovery and rename, column
/// pruning, text normalization of the name and city columns, numeric
/// extraction of rank and height, row validation and projection onto the
/// four output fields. Row order is kept exactly as scraped.
///
/// # Arguments
/// * `table` - Headers and rows produced by the extractor
///
/// # Returns
/// The validated records, possibly empty. A table without a recognizable
/// height column yields an empty vector and an error-level log line; rows
/// missing any of the four fields are dropped and counted.
pub fn clean(table: RawTable) -> Vec<BuildingRecord> {
    info!("Data cleaning started");
    let headers: Vec<String> = table.headers.iter().map(|h| normalize_header(h)).collect();
    info!("Columns after header normalization: {:?}", headers);

    let roles = match discover_roles(&headers) {
        Ok(roles) => roles,
        Err(e) => {
            error!("Cleaning aborted: {}", e);
            return Vec::new();
        }
    };
    let mut ctx = CleaningContext::new(headers, &table.rows, &roles);
    if ctx.row_count < table.rows.len() {
        debug!(
            "Ignored {} rows with mismatched cell count",
            table.rows.len() - ctx.row_count
        );
    }
    info!("Step 1: columns renamed");

    let pruned = prune_columns(&mut ctx);
    info!("Step 2: dropped {} irrelevant columns {:?}", pruned.len(), pruned);

    normalize_text_fields(&mut ctx);
    info!("Step 3/4: footnotes stripped, name and city trimmed and lowercased");

    let partial = coerce_rows(&ctx);
    info!("Step 5: Height_Meters extracted as numbers");

    let (records, dropped) = validate_rows(partial);
    info!(
        "Step 6: dropped {} rows with missing values, {} rows remain",
        dropped,
        records.len()
    );

    let discarded: Vec<&str> = ctx
        .columns
        .iter()
        .filter(|c| c.role.is_none())
        .map(|c| c.name.as_str())
        .collect();
    debug!("Projection discarded columns {:?}", discarded);
    info!("Data cleaning finished");
    records
}

/// Replaces tabs, non-breaking spaces and parentheses with spaces, collapses
/// whitespace runs and trims.
pub fn normalize_header(header: &str) -> String {
    let stripped = HEADER_NOISE.replace_all(header, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Maps each role to the first matching column.
///
/// # Errors
/// Returns `PipelineError::Discovery` when no header qualifies as the height
/// column; the other roles are optional at this point.
pub fn discover_roles(headers: &[String]) -> Result<RoleMap> {
    let mut roles = RoleMap::default();
    for (role, matches) in ROLE_MATCHERS {
        let found = headers.iter().position(|h| matches(h));
        if let Some(index) = found {
            debug!(
                "{} <- column {} '{}'",
                role.canonical_name(),
                index,
                headers[index]
            );
            if let Some(previous) = roles.assign(role, index) {
                warn!(
                    "Column '{}' relabelled from {} to {}",
                    headers[index],
                    previous.canonical_name(),
                    role.canonical_name()
                );
            }
        }
    }

    if roles.get(Role::Height).is_none() {
        return Err(PipelineError::Discovery(
            Role::Height.canonical_name().to_string(),
        ));
    }
    Ok(roles)
}

/// Drops non-role columns whose header contains a prune keyword.
/// Returns the headers of the dropped columns.
pub fn prune_columns(ctx: &mut CleaningContext) -> Vec<String> {
    let mut dropped = Vec::new();
    ctx.columns.retain(|c| {
        let irrelevant = PRUNE_KEYWORDS.iter().any(|k| c.header.contains(k));
        if c.role.is_none() && irrelevant {
            dropped.push(c.header.clone());
            false
        } else {
            true
        }
    });
    dropped
}

/// Strips `[...]` footnotes, trims and lowercases every name and city cell.
pub fn normalize_text_fields(ctx: &mut CleaningContext) {
    for role in [Role::Name, Role::City] {
        if let Some(column) = ctx.column_mut(role) {
            for value in column.values.iter_mut() {
                *value = normalize_text(value);
            }
        }
    }
}

pub fn normalize_text(cell: &str) -> String {
    FOOTNOTE.replace_all(cell, "").trim().to_lowercase()
}

/// First run of ASCII digits in `cell`, ignoring whatever surrounds it.
fn first_digit_run(cell: &str) -> Option<&str> {
    DIGIT_RUN.find(cell).map(|m| m.as_str())
}

/// Parses the first digit run of a height cell, e.g. `"828 m (2,717 ft)"` -> `828.0`.
pub fn extract_height(cell: &str) -> Option<f64> {
    first_digit_run(cell)?.parse().ok()
}

pub fn extract_rank(cell: &str) -> Option<u32> {
    first_digit_run(cell)?.parse().ok()
}

/// Turns the role columns into typed rows. Empty text cells count as missing.
pub fn coerce_rows(ctx: &CleaningContext) -> Vec<PartialRecord> {
    let text = |role: Role, row: usize| {
        ctx.column(role)
            .map(|c| c.values[row].as_str())
            .filter(|v| !v.is_empty())
    };

    (0..ctx.row_count)
        .map(|row| PartialRecord {
            rank: text(Role::Rank, row).and_then(extract_rank),
            building_name: text(Role::Name, row).map(str::to_string),
            city: text(Role::City, row).map(str::to_string),
            height_meters: text(Role::Height, row).and_then(extract_height),
        })
        .collect()
}

/// Keeps rows with all four fields present. Returns the survivors in input
/// order and the number of rows dropped.
pub fn validate_rows(rows: Vec<PartialRecord>) -> (Vec<BuildingRecord>, usize) {
    let total = rows.len();
    let records: Vec<BuildingRecord> = rows
        .into_iter()
        .filter_map(PartialRecord::complete)
        .collect();
    let dropped = total - records.len();
    (records, dropped)
}
