use scraper::{Html, Selector};
use url::Url;

/// Display text longer than this is cut and marked with "...".
const MAX_TEXT_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// Walk every `<a href>` in document order and return (absolute URL,
/// display text) pairs. `javascript:` and pure-fragment hrefs are skipped;
/// everything else that is not already http(s) is resolved against the
/// page's own scheme+host. Duplicates are kept.
pub fn extract_links(html: &str, page_url: &str) -> Vec<Link> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").unwrap();
    let base = authority_root(page_url);

    let mut links = Vec::new();
    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
            continue;
        }

        let absolute = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            let Some(base) = &base else { continue };
            match base.join(href) {
                Ok(resolved) => resolved.to_string(),
                Err(_) => continue,
            }
        };

        let text = element.text().collect::<String>();
        links.push(Link {
            url: absolute,
            text: display_text(text.trim()),
        });
    }
    links
}

/// scheme://host[:port]/ of the page, so relative hrefs resolve against the
/// site root rather than the page path.
fn authority_root(page_url: &str) -> Option<Url> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed
        .port()
        .map(|p| format!(":{}", p))
        .unwrap_or_default();
    Url::parse(&format!("{}://{}{}/", parsed.scheme(), host, port)).ok()
}

fn display_text(text: &str) -> String {
    if text.is_empty() {
        return "No text".to_string();
    }
    if text.chars().count() > MAX_TEXT_LEN {
        let cut: String = text.chars().take(MAX_TEXT_LEN).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.com/careers/index.html";

    #[test]
    fn skips_javascript_and_fragments() {
        let html = r##"<html><body>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">Menu</a>
            <a href="https://example.com/jobs">Jobs</a>
        </body></html>"##;
        let links = extract_links(html, PAGE);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/jobs");
    }

    #[test]
    fn resolves_relative_against_host_root() {
        let html = r#"<a href="/careers/us/retail.html">Retail</a>
                      <a href="openings">Openings</a>"#;
        let links = extract_links(html, PAGE);
        assert_eq!(links[0].url, "https://example.com/careers/us/retail.html");
        // Bare relative paths resolve from the root, not the page directory
        assert_eq!(links[1].url, "https://example.com/openings");
    }

    #[test]
    fn protocol_relative_href() {
        let html = r#"<a href="//jobs.example.com/search">Search</a>"#;
        let links = extract_links(html, PAGE);
        assert_eq!(links[0].url, "https://jobs.example.com/search");
    }

    #[test]
    fn truncates_long_text() {
        let text = "a".repeat(60);
        let html = format!(r#"<a href="/x">{}</a>"#, text);
        let links = extract_links(&html, PAGE);
        assert_eq!(links[0].text.chars().count(), 53);
        assert!(links[0].text.ends_with("..."));
        assert_eq!(&links[0].text[..50], &text[..50]);
    }

    #[test]
    fn exactly_fifty_chars_untouched() {
        let text = "b".repeat(50);
        let html = format!(r#"<a href="/x">{}</a>"#, text);
        let links = extract_links(&html, PAGE);
        assert_eq!(links[0].text, text);
    }

    #[test]
    fn empty_text_placeholder() {
        let html = r#"<a href="/x"></a>"#;
        let links = extract_links(html, PAGE);
        assert_eq!(links[0].text, "No text");
    }

    #[test]
    fn keeps_duplicates_in_page_order() {
        let html = r#"<a href="/jobs">First</a><a href="/jobs">Second</a>"#;
        let links = extract_links(html, PAGE);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "First");
        assert_eq!(links[1].text, "Second");
    }
}
