//! Fixed HTML fragments the challenge pages are scraped for.

use std::sync::LazyLock;

use regex::Regex;

pub const QUESTION_MARKER: &str = "Question:";

static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Question:<br\s*/?>(.*?)</p>").expect("question pattern"));
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a href="(.*?)""#).expect("href pattern"));

/// Text between `Question:<br />` and the closing `</p>`.
pub fn extract_question(html: &str) -> Option<String> {
    QUESTION_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|q| !q.is_empty())
}

/// The login form (and its question) is still on the page.
pub fn has_login_form(html: &str) -> bool {
    html.contains(QUESTION_MARKER)
}

pub fn extract_href(html: &str) -> Option<String> {
    HREF_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|h| !h.is_empty())
}

/// Appends a link to the current URL, single slash between them.
pub fn join_link(base: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_question_after_marker() {
        let html = r#"<form><p id="human-question">Question:<br />Rok lądowania na Księżycu?</p></form>"#;
        assert_eq!(extract_question(html).as_deref(), Some("Rok lądowania na Księżycu?"));
        assert_eq!(extract_question("<p>Nothing here</p>"), None);
    }

    #[test]
    fn joins_relative_links_onto_current_url() {
        assert_eq!(join_link("https://xyz.example/", "/files/0_13_4b.txt"), "https://xyz.example/files/0_13_4b.txt");
        assert_eq!(join_link("https://xyz.example", "next"), "https://xyz.example/next");
        assert_eq!(join_link("https://a", "https://b/c"), "https://b/c");
    }

    #[test]
    fn href_and_login_form_detection() {
        assert_eq!(extract_href(r#"<a href="/files/x.txt">v</a>"#).as_deref(), Some("/files/x.txt"));
        assert!(has_login_form("<p>Question:<br />2+2?</p>"));
        assert!(!has_login_form("<h1>Welcome</h1>"));
    }

    #[test]
    fn compiled_patterns_serve_repeated_pages() {
        for year in ["1410", "1945", "1989"] {
            let html = format!("<p>Question:<br/>{}?</p><a href=\"/n/{}\">", year, year);
            assert_eq!(extract_question(&html).as_deref(), Some(format!("{}?", year).as_str()));
            assert_eq!(extract_href(&html), Some(format!("/n/{}", year)));
        }
        assert_eq!(crate::submit_report::find_flag("{{FLG:SOFTWARE}}").as_deref(), Some("SOFTWARE"));
        assert_eq!(
            crate::metadata::date_from_filename("2024_11_12_report.txt"),
            chrono::NaiveDate::from_ymd_opt(2024, 11, 12)
        );
    }
}
