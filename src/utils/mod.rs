//! Utility functions and helpers.

pub mod http;
pub mod log;

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Join a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) if !path.is_empty() => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("R&D <Lead> \"BI\""),
            "R&amp;D &lt;Lead&gt; &quot;BI&quot;"
        );
        assert_eq!(escape_html("Plain"), "Plain");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://www.wellsfargojobs.com", "/job/1"),
            "https://www.wellsfargojobs.com/job/1"
        );
        assert_eq!(join_url("https://x.com/", "/job/1"), "https://x.com/job/1");
        assert_eq!(join_url("https://x.com", "job/1"), "https://x.com/job/1");
        assert_eq!(join_url("https://x.com/", ""), "https://x.com/");
    }
}
