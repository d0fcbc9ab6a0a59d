use tracing::{debug, info};

use crate::extract::{extract_links, Link};
use crate::fetch::PageFetcher;
use crate::throttle::TokenBucket;

/// Stored in companies.careers_url when every probe comes up empty.
pub const NOT_FOUND: &str = "Not Found";

const CAREER_PATHS: &[&str] = &[
    "/careers",
    "/careers/",
    "/jobs",
    "/jobs/",
    "/about/careers",
    "/company/careers",
    "/en/careers",
    "/employment",
    "/work-with-us",
];

const CAREER_KEYWORDS: &[&str] = &["career", "job", "work"];

/// Probe the usual careers paths on a company domain; first 200 wins. If
/// none answer, scan the homepage for the first anchor that smells like a
/// careers link. Falls back to the `Not Found` sentinel.
pub async fn find_careers_page(
    fetcher: &PageFetcher,
    throttle: &mut TokenBucket,
    domain: &str,
) -> String {
    let root = domain.trim_end_matches('/');

    for path in CAREER_PATHS {
        let url = format!("{}{}", root, path);
        throttle.acquire().await;
        match fetcher.fetch(&url).await {
            Ok(_) => {
                info!(domain, url = %url, "careers page found by probe");
                return url;
            }
            Err(e) => debug!(domain, %e, "probe miss"),
        }
    }

    throttle.acquire().await;
    match fetcher.fetch(domain).await {
        Ok(html) => {
            if let Some(link) = homepage_candidate(&extract_links(&html, domain)) {
                info!(domain, url = %link.url, "careers page scraped from homepage");
                return link.url.clone();
            }
        }
        Err(e) => debug!(domain, %e, "homepage fetch failed"),
    }

    info!(domain, "no careers page found");
    NOT_FOUND.to_string()
}

/// First homepage link whose URL mentions career/job/work.
fn homepage_candidate(links: &[Link]) -> Option<&Link> {
    links.iter().find(|link| {
        let lower = link.url.to_lowercase();
        CAREER_KEYWORDS.iter().any(|kw| lower.contains(kw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str) -> Link {
        Link {
            url: url.to_string(),
            text: "No text".to_string(),
        }
    }

    #[test]
    fn candidate_matches_keywords() {
        let links = vec![
            link("https://example.com/products"),
            link("https://example.com/about/Careers"),
            link("https://example.com/jobs"),
        ];
        assert_eq!(
            homepage_candidate(&links).unwrap().url,
            "https://example.com/about/Careers"
        );
    }

    #[test]
    fn no_candidate() {
        let links = vec![link("https://example.com/products")];
        assert!(homepage_candidate(&links).is_none());
    }
}
