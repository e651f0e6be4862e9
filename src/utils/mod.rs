// src/utils/mod.rs

//! Utility functions and helpers.

pub mod http;
pub mod log;

/// Escape user text for Telegram legacy Markdown.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wrap text in a legacy Markdown bold entity.
///
/// Escapes are not allowed inside an entity, so only `*` is handled: the
/// entity is closed, an escaped `*` emitted, and the entity reopened.
pub fn markdown_bold(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for (i, part) in text.split('*').enumerate() {
        if i > 0 {
            out.push_str("\\*");
        }
        if !part.is_empty() {
            out.push('*');
            out.push_str(part);
            out.push('*');
        }
    }
    out
}

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Signed percent with two decimals, e.g. `+5.00%`.
pub fn format_change(change_pct: f64) -> String {
    format!("{:+.2}%", round_change(change_pct))
}

/// Percent change at display precision, two decimals.
pub fn round_change(change_pct: f64) -> f64 {
    let rounded = (change_pct * 100.0).round() / 100.0;
    // Avoid "-0.00%" for tiny negative moves.
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("BRK_B *up* [x]"), "BRK\\_B \\*up\\* \\[x]");
        assert_eq!(escape_markdown("plain 텍스트"), "plain 텍스트");
    }

    #[test]
    fn test_markdown_bold() {
        assert_eq!(markdown_bold("📈 [모닝 브리핑]"), "*📈 [모닝 브리핑]*");
        assert_eq!(markdown_bold("snake_case"), "*snake_case*");
        assert_eq!(markdown_bold("2*2=4"), "*2*\\**2=4*");
        assert_eq!(markdown_bold("*a"), "\\**a*");
        assert_eq!(markdown_bold(""), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(5.0), "+5.00%");
        assert_eq!(format_change(-1.234), "-1.23%");
        assert_eq!(format_change(-0.001), "+0.00%");
        assert_eq!(round_change(-0.004), 0.0);
        assert!(round_change(-0.004).is_sign_positive());
        assert_eq!(round_change(1.236), 1.24);
    }
}
