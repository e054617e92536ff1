//! Ranking table extraction.
//!
//! The ranking page is a sequence of tables; the first ten map to the fixed
//! categories by position. Each data row holds the rank in its first cell
//! and a link to the article in its second.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use wikis_types::{Category, RankedEntry};

use crate::error::ScrapeError;

/// Entries scraped from one category table, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    pub category: Category,
    pub entries: Vec<RankedEntry>,
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("selector {}: {}", css, e)))
}

/// Parse the ranking page into one [`CategoryTable`] per category.
pub fn extract_entries(html: &str) -> Result<Vec<CategoryTable>, ScrapeError> {
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let document = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = document.select(&table_sel).collect();

    if tables.len() < Category::ALL.len() {
        return Err(ScrapeError::MissingTable {
            expected: Category::ALL.len(),
            found: tables.len(),
        });
    }

    let result = Category::ALL
        .iter()
        .zip(tables.iter())
        .map(|(category, table)| {
            let entries = extract_table(*category, table, &row_sel, &cell_sel, &link_sel);
            debug!(category = %category, entries = entries.len(), "Extracted table");
            CategoryTable {
                category: *category,
                entries,
            }
        })
        .collect();

    Ok(result)
}

fn extract_table(
    category: Category,
    table: &ElementRef<'_>,
    row_sel: &Selector,
    cell_sel: &Selector,
    link_sel: &Selector,
) -> Vec<RankedEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    // First row is the header
    for row in table.select(row_sel).skip(1) {
        let cells: Vec<ElementRef<'_>> = row.select(cell_sel).collect();
        let Some(rank_cell) = cells.first() else {
            continue;
        };

        let Some(rank) = parse_rank(&cell_text(rank_cell)) else {
            continue;
        };

        let Some(link_cell) = cells.get(1) else {
            warn!(category = %category, rank, "Row has no article cell, skipping");
            continue;
        };

        let Some(anchor) = link_cell.select(link_sel).next() else {
            warn!(category = %category, rank, "Row has no article link, skipping");
            continue;
        };

        let title = anchor.value().attr("title").map(str::trim).unwrap_or("");
        let link = anchor.value().attr("href").map(str::trim).unwrap_or("");
        if title.is_empty() || link.is_empty() {
            warn!(category = %category, rank, "Article link lacks title or href, skipping");
            continue;
        }

        if !seen.insert(rank) {
            warn!(category = %category, rank, title, "Duplicate rank, skipping");
            continue;
        }

        entries.push(RankedEntry::new(rank, title, link));
    }

    entries
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Rank cells hold only digits; anything else (footnotes, notes, blank
/// separators) is not a ranked row.
fn parse_rank(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|rank| *rank > 0)
}
