use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn connect(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS companies (
            id           INTEGER PRIMARY KEY,
            domain       TEXT UNIQUE NOT NULL,
            careers_url  TEXT,
            harvested_at TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_companies_careers ON companies(careers_url);

        CREATE TABLE IF NOT EXISTS ranker_responses (
            id          INTEGER PRIMARY KEY,
            company_id  INTEGER NOT NULL REFERENCES companies(id),
            raw         TEXT NOT NULL,
            scored_json TEXT,
            parsed_ok   BOOLEAN NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_responses_company ON ranker_responses(company_id);

        CREATE TABLE IF NOT EXISTS job_links (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            company    TEXT,
            link       TEXT,
            date_added TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(company, link)
        );
        CREATE INDEX IF NOT EXISTS idx_job_links_company ON job_links(company);
        ",
    )?;
    Ok(())
}

// ── Companies queue ──

pub struct Company {
    pub id: i64,
    pub domain: String,
    pub careers_url: Option<String>,
}

pub fn insert_companies(conn: &Connection, rows: &[(String, Option<String>)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO companies (domain, careers_url) VALUES (?1, ?2)")?;
        for (domain, careers_url) in rows {
            count += stmt.execute(rusqlite::params![domain, careers_url])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn set_careers_url(conn: &Connection, company_id: i64, careers_url: &str) -> Result<()> {
    conn.execute(
        "UPDATE companies SET careers_url = ?1 WHERE id = ?2",
        rusqlite::params![careers_url, company_id],
    )?;
    Ok(())
}

fn limit_clause(limit: Option<usize>) -> String {
    match limit {
        Some(n) => format!(" LIMIT {}", n),
        None => String::new(),
    }
}

/// Companies that still need careers-page discovery.
pub fn fetch_undiscovered(conn: &Connection, limit: Option<usize>) -> Result<Vec<Company>> {
    let sql = format!(
        "SELECT id, domain, careers_url FROM companies
         WHERE careers_url IS NULL ORDER BY id{}",
        limit_clause(limit)
    );
    query_companies(conn, &sql)
}

/// Companies with a careers URL but no stored ranker response yet.
pub fn fetch_unranked(conn: &Connection, limit: Option<usize>) -> Result<Vec<Company>> {
    let sql = format!(
        "SELECT c.id, c.domain, c.careers_url FROM companies c
         WHERE c.careers_url IS NOT NULL
           AND NOT EXISTS (
               SELECT 1 FROM ranker_responses r WHERE r.company_id = c.id
           )
         ORDER BY c.id{}",
        limit_clause(limit)
    );
    query_companies(conn, &sql)
}

fn query_companies(conn: &Connection, sql: &str) -> Result<Vec<Company>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Company {
                id: row.get(0)?,
                domain: row.get(1)?,
                careers_url: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Ranker responses ──

pub fn insert_ranker_response(
    conn: &Connection,
    company_id: i64,
    raw: &str,
    scored_json: Option<&str>,
    parsed_ok: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO ranker_responses (company_id, raw, scored_json, parsed_ok)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![company_id, raw, scored_json, parsed_ok],
    )?;
    Ok(())
}

pub struct RankedCompany {
    pub company_id: i64,
    pub domain: String,
    pub raw: String,
}

/// Companies with a ranker response that have not been harvested yet.
/// Uses the most recent response per company.
pub fn fetch_unharvested(conn: &Connection, limit: Option<usize>) -> Result<Vec<RankedCompany>> {
    let sql = format!(
        "SELECT c.id, c.domain, r.raw
         FROM companies c
         JOIN ranker_responses r ON r.company_id = c.id
         WHERE c.harvested_at IS NULL
           AND r.id = (
               SELECT MAX(r2.id) FROM ranker_responses r2 WHERE r2.company_id = c.id
           )
         ORDER BY c.id{}",
        limit_clause(limit)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RankedCompany {
                company_id: row.get(0)?,
                domain: row.get(1)?,
                raw: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_harvested(conn: &Connection, company_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE companies SET harvested_at = datetime('now') WHERE id = ?1",
        rusqlite::params![company_id],
    )?;
    Ok(())
}

// ── Job links ──

/// Upsert keyed by (company, link): re-running a batch never duplicates
/// rows here, unlike the CSV sinks. Returns the number actually inserted.
pub fn insert_job_links(conn: &Connection, company: &str, links: &[String]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO job_links (company, link) VALUES (?1, ?2)")?;
        for link in links {
            count += stmt.execute(rusqlite::params![company, link])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct JobLinkRow {
    pub company: String,
    pub link: String,
    pub date_added: String,
}

pub fn fetch_job_links(conn: &Connection) -> Result<Vec<JobLinkRow>> {
    let mut stmt =
        conn.prepare("SELECT company, link, date_added FROM job_links ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(JobLinkRow {
                company: row.get(0)?,
                link: row.get(1)?,
                date_added: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub companies: usize,
    pub discovered: usize,
    pub ranked: usize,
    pub harvested: usize,
    pub job_links: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let companies: usize = conn.query_row("SELECT COUNT(*) FROM companies", [], |r| r.get(0))?;
    let discovered: usize = conn.query_row(
        "SELECT COUNT(*) FROM companies WHERE careers_url IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let ranked: usize = conn.query_row(
        "SELECT COUNT(DISTINCT company_id) FROM ranker_responses",
        [],
        |r| r.get(0),
    )?;
    let harvested: usize = conn.query_row(
        "SELECT COUNT(*) FROM companies WHERE harvested_at IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let job_links: usize = conn.query_row("SELECT COUNT(*) FROM job_links", [], |r| r.get(0))?;
    Ok(Stats {
        companies,
        discovered,
        ranked,
        harvested,
        job_links,
    })
}
