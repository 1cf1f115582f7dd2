//! Player statistics table extraction.
//!
//! Category pages publish one large player table. Depending on the page it is
//! either rendered directly in the document or shipped inside an HTML comment
//! and only inserted by client-side script. Extraction therefore runs in two
//! strategies over a single fetched document:
//!
//! 1. **Direct**: a table present in the DOM. On combined (multi-competition)
//!    pages the first table is authoritative; on single-competition pages the
//!    first table carrying a `Player` column is used.
//! 2. **Comment-embedded**: the first comment containing a
//!    `<div class="table_container"` marker is re-parsed as a fragment and its
//!    table is read instead.
//!
//! Both strategies end in the same cleanup: repeated header rows leaking into
//! the body are dropped, auxiliary link and rank columns are removed, short
//! rows are padded with empty text.

use crate::api::DocumentSource;
use crate::errors::HarvestError;
use crate::models::{GroupedLabel, Header, Locator, RawTable, SourceLabel, retain_by_mask};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info, instrument, warn};

/// Marker of the comment that wraps a hidden table.
pub const TABLE_CONTAINER_MARKER: &str = "<div class=\"table_container\"";
/// First-column value of header rows repeated inside the body.
pub const HEADER_SENTINEL: &str = "Rk";

const PLAYER_LABEL: &str = "Player";
const SQUAD_LABEL: &str = "Squad";
const COMPETITION_LABEL: &str = "Comp";

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static HEAD_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("thead tr").unwrap());
static BODY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody tr").unwrap());
static COL_HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"th[scope="col"]"#).unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

/// A table read out of markup, before cleanup.
#[derive(Debug)]
struct Extracted {
    /// Group label per column when the header has an over-header row.
    groups: Option<Vec<Option<String>>>,
    fields: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Extracted {
    fn has_data_rows(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.first().is_some_and(|c| c != HEADER_SENTINEL))
    }
}

/// Fetch the document behind `locator` and extract its player table.
///
/// One network request per call; nothing is cached.
#[instrument(level = "info", skip_all, fields(category = %locator.category, url = %locator.url))]
pub async fn fetch_table<S: DocumentSource>(
    source: &S,
    locator: &Locator,
) -> Result<RawTable, HarvestError> {
    let html = source.fetch(locator).await?;
    extract_table(&html, locator)
}

/// Extract the player table from an already fetched document.
pub fn extract_table(html: &str, locator: &Locator) -> Result<RawTable, HarvestError> {
    let document = Html::parse_document(html);

    let extracted = match direct_table(&document, locator) {
        Some(table) => {
            debug!(rows = table.rows.len(), "Using directly rendered table");
            table
        }
        None => {
            debug!("No direct table; scanning comments");
            comment_table(&document).map_err(|reason| {
                warn!(
                    %reason,
                    preview = %truncate_for_log(html, 200),
                    "Table extraction failed"
                );
                not_found(locator, reason)
            })?
        }
    };

    let table = finish(extracted, locator);
    if table.rows.is_empty() {
        return Err(not_found(locator, "table body is empty"));
    }

    info!(
        columns = table.header.len(),
        rows = table.rows.len(),
        "Extracted table"
    );
    Ok(table)
}

fn not_found(locator: &Locator, reason: impl Into<String>) -> HarvestError {
    HarvestError::TableNotFound {
        category: locator.category,
        url: locator.url.to_string(),
        reason: reason.into(),
    }
}

fn direct_table(document: &Html, locator: &Locator) -> Option<Extracted> {
    let table = if locator.combined {
        document.select(&TABLE).next().map(parse_table)
    } else {
        document
            .select(&TABLE)
            .map(parse_table)
            .find(|t| t.fields.iter().any(|f| f == PLAYER_LABEL))
    }?;
    table.has_data_rows().then_some(table)
}

fn comment_table(document: &Html) -> Result<Extracted, String> {
    let comment = document
        .tree
        .root()
        .descendants()
        .find_map(|node| match node.value() {
            Node::Comment(c) if c.contains(TABLE_CONTAINER_MARKER) => Some(c),
            _ => None,
        })
        .ok_or("no comment contains a table container")?;

    let fragment = Html::parse_fragment(comment);
    let table = fragment
        .select(&TABLE)
        .next()
        .ok_or("table container comment has no <table> element")?;

    let extracted = parse_table(table);
    if !extracted.has_data_rows() {
        return Err("comment-embedded table has no data rows".to_string());
    }
    Ok(extracted)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_table(table: ElementRef<'_>) -> Extracted {
    let head_rows: Vec<ElementRef<'_>> = table.select(&HEAD_ROW).collect();
    let is_over = |row: &ElementRef<'_>| {
        row.value()
            .attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == "over_header"))
    };

    let over_row = head_rows
        .iter()
        .find(|r| is_over(*r))
        .or_else(|| (head_rows.len() > 1).then(|| &head_rows[0]));
    let field_row = head_rows.iter().rev().find(|r| !is_over(*r));

    let fields: Vec<String> = match field_row {
        Some(row) => {
            let scoped: Vec<String> = row.select(&COL_HEADER).map(cell_text).collect();
            if scoped.is_empty() {
                row.select(&CELL).map(cell_text).collect()
            } else {
                scoped
            }
        }
        None => Vec::new(),
    };

    let groups = over_row
        .filter(|over| Some(*over) != field_row)
        .map(|over| expand_groups(*over, fields.len()));

    let rows = table
        .select(&BODY_ROW)
        .map(|row| row.select(&CELL).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    Extracted {
        groups,
        fields,
        rows,
    }
}

/// One group label per column, following each over-header cell's `colspan`.
fn expand_groups(over: ElementRef<'_>, width: usize) -> Vec<Option<String>> {
    let mut groups = Vec::with_capacity(width);
    for cell in over.select(&CELL) {
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = cell_text(cell);
        let label = (!text.is_empty()).then_some(text);
        groups.extend(std::iter::repeat_n(label, span));
    }
    groups.resize(width, None);
    groups
}

/// Cleanup shared by both strategies.
fn finish(mut table: Extracted, locator: &Locator) -> RawTable {
    let width = table.fields.len();
    for row in &mut table.rows {
        if row.len() > width {
            debug!(cells = row.len(), width, "Truncating over-long row");
        }
        row.resize(width, String::new());
    }

    if !locator.combined && !table.fields.iter().any(|f| f == COMPETITION_LABEL) {
        insert_competition(&mut table, &locator.population);
    }

    table
        .rows
        .retain(|r| r.first().is_none_or(|c| c != HEADER_SENTINEL));

    let keep: Vec<bool> = table
        .fields
        .iter()
        .map(|f| f != HEADER_SENTINEL && !f.to_lowercase().contains("matches"))
        .collect();

    let mut header = match table.groups {
        Some(groups) => Header::TwoLevel(
            table
                .fields
                .into_iter()
                .zip(groups)
                .enumerate()
                .map(|(position, (field, group))| GroupedLabel {
                    position,
                    group,
                    field,
                })
                .collect(),
        ),
        None => Header::Single(
            table
                .fields
                .into_iter()
                .enumerate()
                .map(|(position, label)| SourceLabel { position, label })
                .collect(),
        ),
    };
    header.retain_columns(&keep);
    for row in &mut table.rows {
        retain_by_mask(row, &keep);
    }

    RawTable {
        header,
        rows: table.rows,
    }
}

/// Single-competition pages have no `Comp` column; add one after `Squad` so the
/// identity layout matches combined pages.
fn insert_competition(table: &mut Extracted, population: &str) {
    let at = table
        .fields
        .iter()
        .position(|f| f == SQUAD_LABEL)
        .map(|i| i + 1)
        .unwrap_or(table.fields.len());

    table.fields.insert(at, COMPETITION_LABEL.to_string());
    if let Some(groups) = table.groups.as_mut() {
        groups.insert(at, None);
    }
    for row in &mut table.rows {
        let value = if row.first().is_some_and(|c| c == HEADER_SENTINEL) {
            COMPETITION_LABEL.to_string()
        } else {
            population.to_string()
        };
        row.insert(at, value);
    }
}
