use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

/// One row of the seed file: a company domain plus an optional
/// already-known careers page URL (second column, may be absent or empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRow {
    pub domain: String,
    pub careers_url: Option<String>,
}

/// One row of a pre-ranked input file: company domain plus the ranker
/// response text to harvest from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRow {
    pub company: String,
    pub ranked_text: String,
}

/// Seed CSV: header row skipped, first column domain, optional second
/// column careers URL.
pub fn read_seed_csv(path: &Path) -> Result<Vec<SeedRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open seed file {:?}", path))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed seed CSV record")?;
        let Some(domain) = record.get(0).map(str::trim).filter(|d| !d.is_empty()) else {
            continue;
        };
        let careers_url = record
            .get(1)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from);
        rows.push(SeedRow {
            domain: domain.to_string(),
            careers_url,
        });
    }
    Ok(rows)
}

/// Pre-ranked CSV: header row skipped, first column
/// company domain, second column the ranked-links text.
pub fn read_ranked_csv(path: &Path) -> Result<Vec<RankedRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open ranked file {:?}", path))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed ranked CSV record")?;
        let Some(company) = record.get(0).map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };
        let ranked_text = record.get(1).unwrap_or_default().to_string();
        rows.push(RankedRow {
            company: company.to_string(),
            ranked_text,
        });
    }
    Ok(rows)
}
