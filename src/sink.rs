use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::extract::Link;

/// Append one `(company domain, ranker response text)` row. Header-less and
/// append-only: re-running a batch writes the same rows again. The SQLite
/// sink is where dedup happens.
pub fn append_job_links_row(path: &Path, company: &str, response: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record([company, response])?;
    writer.flush()?;
    Ok(())
}

/// Append the domain-filtered links as `URL, Text` rows; the header is
/// written only when the file is first created. Appends still duplicate on
/// re-runs.
pub fn append_filtered_links(path: &Path, links: &[Link]) -> Result<()> {
    let file_exists = path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if !file_exists {
        writer.write_record(["URL", "Text"])?;
    }
    for link in links {
        writer.write_record([link.url.as_str(), link.text.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Full dump of the job_links table, with header and timestamps.
pub fn write_export(
    path: &Path,
    rows: &[crate::db::JobLinkRow],
) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(["Company", "Link", "Date Added"])?;
    for row in rows {
        writer.write_record([
            row.company.as_str(),
            row.link.as_str(),
            row.date_added.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn job_links_rows_duplicate_on_rerun() {
        let path = temp_path("career_scraper_job_links_test.csv");
        append_job_links_row(&path, "example.com", "1. https://x - 90/100: y").unwrap();
        append_job_links_row(&path, "example.com", "1. https://x - 90/100: y").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // Append-only sink: same batch twice means the row twice, no header
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert!(lines[0].starts_with("example.com,"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn filtered_links_header_once() {
        let path = temp_path("career_scraper_filtered_test.csv");
        let links = vec![Link {
            url: "https://example.com/jobs".to_string(),
            text: "Jobs".to_string(),
        }];
        append_filtered_links(&path, &links).unwrap();
        append_filtered_links(&path, &links).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "URL,Text");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], lines[2]);
        std::fs::remove_file(path).ok();
    }
}
