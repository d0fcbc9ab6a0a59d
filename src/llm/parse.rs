use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StageError;

pub const NO_POSITIONS_SENTINEL: &str = "No job position links found.";
pub const NO_NEXT_PAGE_SENTINEL: &str = "No next page link found.";

/// One line of the ranker's `N. URL - SCORE/100: explanation` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredLink {
    pub index: u32,
    pub url: String,
    pub score: u32,
    pub explanation: String,
}

/// The ranker answers in free text; downstream stages must not assume it is
/// well formed. Lines that don't match the pattern are dropped, and a
/// response with no matching lines at all is carried as `Malformed` so the
/// raw text stays available for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankerOutput {
    Parsed(Vec<ScoredLink>),
    Malformed(String),
}

fn ranked_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\.\s+(https?://[^\s]+|/[^\s]+) - (\d+)/100:").unwrap())
}

pub fn parse_ranker_response(raw: &str) -> RankerOutput {
    let re = ranked_line_re();
    let mut scored = Vec::new();

    for line in raw.trim().lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let whole = caps.get(0).unwrap();
        scored.push(ScoredLink {
            index: caps[1].parse().unwrap_or(0),
            url: caps[2].to_string(),
            score: caps[3].parse().unwrap_or(0),
            explanation: line[whole.end()..].trim().to_string(),
        });
    }

    if scored.is_empty() {
        RankerOutput::Malformed(raw.to_string())
    } else {
        RankerOutput::Parsed(scored)
    }
}

impl RankerOutput {
    /// Strictly highest score wins; ties go to the first occurrence. A
    /// zero-score line never wins, matching the original selector's zero
    /// floor. `Malformed` yields nothing and the caller skips the company.
    pub fn highest_scored(&self) -> Option<&ScoredLink> {
        let RankerOutput::Parsed(scored) = self else {
            return None;
        };
        let mut best: Option<&ScoredLink> = None;
        let mut best_score = 0;
        for link in scored {
            if link.score > best_score {
                best_score = link.score;
                best = Some(link);
            }
        }
        best
    }
}

/// Drop markdown code-fence lines the model sometimes wraps its answer in.
fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the `<job_position_links>` fragment of the second model pass.
/// The text content is split on newlines; the fixed "none found" sentinel
/// maps to an empty list. Anything that is not well-formed XML after fence
/// stripping is a `StageError::Parse` for the caller to log and skip.
pub fn parse_job_positions(raw: &str) -> Result<Vec<String>, StageError> {
    let cleaned = strip_code_fences(raw);
    let mut reader = quick_xml::Reader::from_reader(cleaned.trim().as_bytes());
    let mut inside = false;
    let mut saw_root = false;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e))
                if e.name().as_ref() == b"job_position_links" =>
            {
                inside = true;
                saw_root = true;
            }
            Ok(quick_xml::events::Event::Text(e)) if inside => {
                let chunk = e
                    .unescape()
                    .map_err(|e| StageError::Parse(format!("job position links: {}", e)))?;
                text.push_str(&chunk);
            }
            Ok(quick_xml::events::Event::End(e))
                if e.name().as_ref() == b"job_position_links" =>
            {
                inside = false;
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => {
                return Err(StageError::Parse(format!("job position links: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    if inside {
        return Err(StageError::Parse(
            "unterminated <job_position_links> element".to_string(),
        ));
    }
    if !saw_root {
        return Err(StageError::Parse(
            "response has no <job_position_links> element".to_string(),
        ));
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != NO_POSITIONS_SENTINEL)
        .map(String::from)
        .collect())
}

fn next_page_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<next_page_link>\s*([^<]*?)\s*</next_page_link>").unwrap())
}

/// Pull the detected next-page URL out of the third model pass. Missing
/// tag, empty content, and the "not found" sentinel all mean no detection;
/// the caller only logs the result either way.
pub fn parse_next_page(raw: &str) -> Option<String> {
    let cleaned = strip_code_fences(raw);
    let url = next_page_re().captures(&cleaned)?.get(1)?.as_str().trim();
    if url.is_empty() || url == NO_NEXT_PAGE_SENTINEL {
        return None;
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLE_SAMPLE: &str = r#"1. https://jobs.apple.com/en-us/search - 100/100: Direct job search portal on Apple's jobs domain, highest priority.
2. https://jobs.apple.com/app/en-us/profile/info - 95/100: Direct link to profile information page in Apple's job application portal, suggesting account management for job applications.
3. https://www.apple.com/careers/us/ - 90/100:  Direct path to US careers page, very likely to contain job listings.
4. /careers/us/index.html - 80/100: Relative path pointing to US careers index page, suggests job listings.
5. /careers/us/retail.html - 70/100: Relative path pointing to retail careers page, suggests a specific department's hiring information."#;

    #[test]
    fn parses_ranked_lines() {
        let RankerOutput::Parsed(scored) = parse_ranker_response(APPLE_SAMPLE) else {
            panic!("expected parsed output");
        };
        assert_eq!(scored.len(), 5);
        assert_eq!(scored[0].url, "https://jobs.apple.com/en-us/search");
        assert_eq!(scored[0].score, 100);
        assert_eq!(scored[3].url, "/careers/us/index.html");
        assert!(scored[0].explanation.starts_with("Direct job search portal"));
    }

    #[test]
    fn highest_score_wins() {
        let raw = "1. https://a - 80/100: low\n2. https://b - 90/100: high";
        let out = parse_ranker_response(raw);
        assert_eq!(out.highest_scored().unwrap().url, "https://b");
    }

    #[test]
    fn tie_goes_to_first_occurrence() {
        let raw = "1. https://a - 90/100: first\n2. https://b - 90/100: second";
        let out = parse_ranker_response(raw);
        assert_eq!(out.highest_scored().unwrap().url, "https://a");
    }

    #[test]
    fn zero_score_never_selected() {
        let raw = "1. https://a - 0/100: nothing here";
        let out = parse_ranker_response(raw);
        assert!(matches!(out, RankerOutput::Parsed(_)));
        assert!(out.highest_scored().is_none());
    }

    #[test]
    fn unmatched_lines_dropped() {
        let raw = "Here are the results:\n1. https://a - 85/100: good\nThanks!";
        let RankerOutput::Parsed(scored) = parse_ranker_response(raw) else {
            panic!("expected parsed output");
        };
        assert_eq!(scored.len(), 1);
    }

    #[test]
    fn malformed_keeps_raw_text() {
        let raw = "I could not find any job-related URLs in the list.";
        let out = parse_ranker_response(raw);
        assert_eq!(out, RankerOutput::Malformed(raw.to_string()));
        assert!(out.highest_scored().is_none());
    }

    #[test]
    fn positions_well_formed() {
        let raw = "<job_position_links>\nhttps://a.com/details/1\nhttps://a.com/details/2\n</job_position_links>";
        let links = parse_job_positions(raw).unwrap();
        assert_eq!(
            links,
            vec!["https://a.com/details/1", "https://a.com/details/2"]
        );
    }

    #[test]
    fn positions_code_fences_stripped() {
        let raw = "```xml\n<job_position_links>\nhttps://a.com/details/1\n</job_position_links>\n```";
        let links = parse_job_positions(raw).unwrap();
        assert_eq!(links, vec!["https://a.com/details/1"]);
    }

    #[test]
    fn positions_sentinel_is_empty_list() {
        let raw = "<job_position_links>\nNo job position links found.\n</job_position_links>";
        assert!(parse_job_positions(raw).unwrap().is_empty());
    }

    #[test]
    fn positions_malformed_is_error() {
        assert!(parse_job_positions("Sorry, no links.").is_err());
        assert!(parse_job_positions("<job_position_links>https://a").is_err());
    }

    #[test]
    fn next_page_detected() {
        let raw = "<next_page_link>https://example.com/jobs?page=2</next_page_link>";
        assert_eq!(
            parse_next_page(raw).as_deref(),
            Some("https://example.com/jobs?page=2")
        );
    }

    #[test]
    fn next_page_sentinel() {
        let raw = "<next_page_link>No next page link found.</next_page_link>";
        assert!(parse_next_page(raw).is_none());
        assert!(parse_next_page("free text with no tag").is_none());
    }
}
