use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::db;
use crate::discover;
use crate::error::StageError;
use crate::extract::{extract_links, Link};
use crate::fetch::PageFetcher;
use crate::filter::{filter_by_domain, netloc};
use crate::input::RankedRow;
use crate::llm::parse::{
    parse_job_positions, parse_next_page, parse_ranker_response, RankerOutput,
};
use crate::llm::LlmClient;
use crate::sink;
use crate::throttle::TokenBucket;

/// Per-batch outcome counts. A "skipped" company is one whose stage failed
/// or whose ranker output had no usable link; the batch always continues.
pub struct BatchStats {
    pub total: usize,
    pub ok: usize,
    pub skipped: usize,
}

impl BatchStats {
    fn new(total: usize) -> Self {
        BatchStats {
            total,
            ok: 0,
            skipped: 0,
        }
    }

    pub fn print(&self, verb: &str) {
        println!(
            "{} {} companies ({} ok, {} skipped).",
            verb, self.total, self.ok, self.skipped
        );
    }
}

/// Everything one company's harvest produces before persistence.
struct HarvestYield {
    filtered: Vec<Link>,
    positions: Vec<String>,
}

/// Sequential per-company pipeline: fetch, extract, rank, filter, second
/// model pass, persist. One company in flight at a time; all outbound
/// calls go through the token bucket.
pub struct Pipeline<'a> {
    conn: &'a Connection,
    settings: &'a Settings,
    fetcher: PageFetcher,
    llm: LlmClient,
    throttle: TokenBucket,
}

impl<'a> Pipeline<'a> {
    pub fn new(conn: &'a Connection, settings: &'a Settings) -> Result<Self> {
        Ok(Pipeline {
            conn,
            settings,
            fetcher: PageFetcher::new(&settings.user_agent, settings.request_timeout())?,
            llm: LlmClient::new(settings.model.clone(), settings.max_response_tokens),
            throttle: TokenBucket::new(
                settings.throttle_capacity,
                settings.throttle_refill_per_sec,
            ),
        })
    }

    // ── Discover ──

    pub async fn discover(&mut self, limit: Option<usize>) -> Result<BatchStats> {
        let companies = db::fetch_undiscovered(self.conn, limit)?;
        let pb = progress_bar(companies.len())?;
        let mut stats = BatchStats::new(companies.len());

        for company in &companies {
            let careers_url =
                discover::find_careers_page(&self.fetcher, &mut self.throttle, &company.domain)
                    .await;
            if careers_url == discover::NOT_FOUND {
                stats.skipped += 1;
            } else {
                stats.ok += 1;
            }
            db::set_careers_url(self.conn, company.id, &careers_url)?;
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(stats)
    }

    // ── Rank ──

    pub async fn rank(&mut self, limit: Option<usize>) -> Result<BatchStats> {
        let companies = db::fetch_unranked(self.conn, limit)?;
        let pb = progress_bar(companies.len())?;
        let mut stats = BatchStats::new(companies.len());

        for company in &companies {
            let careers_url = company.careers_url.as_deref().unwrap_or(discover::NOT_FOUND);

            if careers_url == discover::NOT_FOUND {
                // Keep the original ledger behavior: the company still gets
                // its sentinel row in the CSV, and the queue entry is consumed.
                sink::append_job_links_row(
                    Path::new(&self.settings.job_links_csv),
                    &company.domain,
                    discover::NOT_FOUND,
                )?;
                db::insert_ranker_response(
                    self.conn,
                    company.id,
                    discover::NOT_FOUND,
                    None,
                    false,
                )?;
                stats.skipped += 1;
                pb.inc(1);
                continue;
            }

            match self.rank_page(careers_url).await {
                Ok(raw) => {
                    let output = parse_ranker_response(&raw);
                    let (scored_json, parsed_ok) = match &output {
                        RankerOutput::Parsed(scored) => {
                            (Some(serde_json::to_string(scored)?), true)
                        }
                        RankerOutput::Malformed(_) => (None, false),
                    };
                    db::insert_ranker_response(
                        self.conn,
                        company.id,
                        &raw,
                        scored_json.as_deref(),
                        parsed_ok,
                    )?;
                    sink::append_job_links_row(
                        Path::new(&self.settings.job_links_csv),
                        &company.domain,
                        &raw,
                    )?;
                    if parsed_ok {
                        stats.ok += 1;
                    } else {
                        warn!(company = %company.domain, "ranker response unparseable");
                        stats.skipped += 1;
                    }
                }
                Err(e) => {
                    warn!(company = %company.domain, error = %e, "rank failed, skipping");
                    stats.skipped += 1;
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(stats)
    }

    async fn rank_page(&mut self, careers_url: &str) -> Result<String, StageError> {
        self.throttle.acquire().await;
        let html = self.fetcher.fetch(careers_url).await?;

        let links = extract_links(&html, careers_url);
        if links.is_empty() {
            return Err(StageError::Parse(format!(
                "no links found on {}",
                careers_url
            )));
        }
        let urls: Vec<String> = links.into_iter().map(|l| l.url).unique().collect();
        info!(careers_url, candidates = urls.len(), "ranking links");

        self.throttle.acquire().await;
        self.llm.rank_links(&urls).await
    }

    // ── Harvest ──

    pub async fn harvest(&mut self, limit: Option<usize>) -> Result<BatchStats> {
        let pending = db::fetch_unharvested(self.conn, limit)?;
        let pb = progress_bar(pending.len())?;
        let mut stats = BatchStats::new(pending.len());

        for item in &pending {
            if self.harvest_one(&item.domain, &item.raw).await? {
                stats.ok += 1;
            } else {
                stats.skipped += 1;
            }
            // Consumed either way; skipped companies are not retried.
            db::mark_harvested(self.conn, item.company_id)?;
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(stats)
    }

    /// Harvest directly from pre-ranked CSV rows, bypassing the queue.
    pub async fn harvest_rows(&mut self, rows: &[RankedRow]) -> Result<BatchStats> {
        let pb = progress_bar(rows.len())?;
        let mut stats = BatchStats::new(rows.len());

        for row in rows {
            if self.harvest_one(&row.company, &row.ranked_text).await? {
                stats.ok += 1;
            } else {
                stats.skipped += 1;
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(stats)
    }

    /// Returns Ok(true) when the company produced persisted output. Stage
    /// failures are logged and collapse to Ok(false); only persistence and
    /// other batch-level problems propagate.
    async fn harvest_one(&mut self, domain: &str, ranked_text: &str) -> Result<bool> {
        let yielded = match self.harvest_company(domain, ranked_text).await {
            Ok(Some(yielded)) => yielded,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(company = domain, error = %e, "harvest failed, skipping");
                return Ok(false);
            }
        };

        sink::append_filtered_links(
            Path::new(&self.settings.filtered_links_csv),
            &yielded.filtered,
        )?;
        let company = company_label(domain);
        let inserted = db::insert_job_links(self.conn, company, &yielded.positions)?;
        info!(
            company,
            filtered = yielded.filtered.len(),
            positions = yielded.positions.len(),
            inserted,
            "harvested"
        );
        Ok(true)
    }

    async fn harvest_company(
        &mut self,
        domain: &str,
        ranked_text: &str,
    ) -> Result<Option<HarvestYield>, StageError> {
        let output = parse_ranker_response(ranked_text);
        let Some(best) = output.highest_scored() else {
            info!(company = domain, "no valid highest-scored link, skipping");
            return Ok(None);
        };
        let target = best.url.clone();
        debug!(company = domain, target = %target, score = best.score, "following highest-scored link");

        self.throttle.acquire().await;
        let html = self.fetcher.fetch(&target).await?;
        let links = extract_links(&html, &target);
        let filtered = filter_by_domain(&links, &target);

        if filtered.is_empty() {
            info!(company = domain, "no links on the target's own domain");
            return Ok(Some(HarvestYield {
                filtered,
                positions: Vec::new(),
            }));
        }

        self.throttle.acquire().await;
        let response = self.llm.job_positions(&filtered).await?;
        let positions: Vec<String> = parse_job_positions(&response)?
            .into_iter()
            .unique()
            .collect();

        // Pagination is detected but deliberately not followed; the result
        // is only logged.
        let page_urls: Vec<String> = links.into_iter().map(|l| l.url).unique().collect();
        self.throttle.acquire().await;
        match self.llm.next_page(&page_urls).await {
            Ok(raw) => match parse_next_page(&raw) {
                Some(url) => info!(company = domain, next_page = %url, "next page link detected"),
                None => info!(company = domain, "no next page link detected"),
            },
            Err(e) => warn!(company = domain, error = %e, "next page detection failed"),
        }

        Ok(Some(HarvestYield { filtered, positions }))
    }
}

/// Company column value for persisted rows: the bare domain when the seed
/// value is a URL, the seed value itself otherwise.
pub fn company_label(domain: &str) -> &str {
    netloc(domain).unwrap_or(domain)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn company_label_strips_scheme() {
        assert_eq!(company_label("https://example.com"), "example.com");
        assert_eq!(company_label("https://example.com/about"), "example.com");
        assert_eq!(company_label("example.com"), "example.com");
    }

    /// Full path composed from the pure stages: one ranked row, a page with
    /// an anchor link, a javascript link, and one real link, persisted as a
    /// single row keyed by the bare domain.
    #[test]
    fn ranked_row_to_persisted_link() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let ranked_text =
            "1. https://example.com/careers - 95/100: direct path to the careers page";
        let output = parse_ranker_response(ranked_text);
        let best = output.highest_scored().unwrap();
        assert_eq!(best.url, "https://example.com/careers");

        let html = r##"<html><body>
            <a href="#top">Back to top</a>
            <a href="javascript:void(0)">Menu</a>
            <a href="/careers/roles/1">Site Reliability Engineer</a>
        </body></html>"##;
        let links = extract_links(html, &best.url);
        assert_eq!(links.len(), 1);

        let filtered = filter_by_domain(&links, &best.url);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].url, "https://example.com/careers/roles/1");

        let company = company_label("https://example.com");
        let urls: Vec<String> = filtered.iter().map(|l| l.url.clone()).collect();
        assert_eq!(db::insert_job_links(&conn, company, &urls).unwrap(), 1);

        let rows = db::fetch_job_links(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, "example.com");
        assert_eq!(rows[0].link, "https://example.com/careers/roles/1");
    }

    /// Malformed ranker output means no highest link, no row, no panic.
    #[test]
    fn malformed_ranker_output_writes_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let output = parse_ranker_response("The list contains no job-related URLs, sorry.");
        assert!(output.highest_scored().is_none());
        assert_eq!(db::fetch_job_links(&conn).unwrap().len(), 0);
    }
}
