use std::sync::OnceLock;

use regex::Regex;

use crate::extract::Link;

fn netloc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://([^/]+)").unwrap())
}

/// Authority component of an absolute http(s) URL. Relative URLs and other
/// schemes have none.
pub fn netloc(url: &str) -> Option<&str> {
    netloc_re()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Keep exactly the links whose netloc string-equals the reference's.
/// No subdomain folding: www.example.com and example.com are distinct.
pub fn filter_by_domain(links: &[Link], reference: &str) -> Vec<Link> {
    let Some(target) = netloc(reference) else {
        return Vec::new();
    };
    links
        .iter()
        .filter(|link| netloc(&link.url) == Some(target))
        .cloned()
        .collect()
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
    fn netloc_extraction() {
        assert_eq!(netloc("https://example.com/jobs"), Some("example.com"));
        assert_eq!(netloc("http://jobs.example.com"), Some("jobs.example.com"));
        assert_eq!(netloc("/careers/us"), None);
        assert_eq!(netloc("mailto:hr@example.com"), None);
    }

    #[test]
    fn keeps_only_matching_netloc() {
        let links = vec![
            link("https://example.com/jobs/1"),
            link("https://jobs.example.com/2"),
            link("http://example.com/jobs/3"),
            link("https://other.com/jobs"),
        ];
        let kept = filter_by_domain(&links, "https://example.com/careers");
        let urls: Vec<&str> = kept.iter().map(|l| l.url.as_str()).collect();
        // Scheme is not part of the comparison, subdomains are
        assert_eq!(
            urls,
            vec!["https://example.com/jobs/1", "http://example.com/jobs/3"]
        );
    }

    #[test]
    fn www_prefix_is_distinct() {
        let links = vec![link("https://www.example.com/jobs")];
        assert!(filter_by_domain(&links, "https://example.com").is_empty());
        assert_eq!(
            filter_by_domain(&links, "https://www.example.com").len(),
            1
        );
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let links = vec![link("https://Example.com/jobs")];
        assert!(filter_by_domain(&links, "https://example.com").is_empty());
    }

    #[test]
    fn unparseable_reference_keeps_nothing() {
        let links = vec![link("https://example.com/jobs")];
        assert!(filter_by_domain(&links, "not a url").is_empty());
    }
}
