//! Plain-text excerpts derived from rich-text content

pub const DEFAULT_EXCERPT_LEN: usize = 160;

const ELLIPSIS: &str = "...";

/// Strip markup, collapse whitespace and cut at a word boundary
///
/// `max_chars` counts characters of the kept text; the ellipsis is appended
/// only when something was cut.
pub fn derive_excerpt(content: &str, max_chars: usize) -> String {
    let text = collapse_whitespace(&decode_entities(&strip_tags(content)));

    if text.chars().count() <= max_chars {
        return text;
    }

    let cut: String = text.chars().take(max_chars).collect();
    let next_is_break = text
        .chars()
        .nth(max_chars)
        .is_some_and(char::is_whitespace);

    let kept = if next_is_break {
        cut.as_str()
    } else {
        match cut.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut.as_str(),
        }
    };

    let kept = kept.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'));
    format!("{kept}{ELLIPSIS}")
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // Block boundaries must not glue words together
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_kept() {
        assert_eq!(
            derive_excerpt("<p>Hola <strong>mundo</strong></p>", 160),
            "Hola mundo"
        );
    }

    #[test]
    fn test_entities_and_blocks() {
        assert_eq!(
            derive_excerpt("<p>Uno&nbsp;&amp;&nbsp;dos</p><p>tres</p>", 160),
            "Uno & dos tres"
        );
    }

    #[test]
    fn test_cut_on_word_boundary() {
        let content = "La mediación familiar es un procedimiento voluntario";
        let excerpt = derive_excerpt(content, 20);
        assert_eq!(excerpt, "La mediación...");
    }

    #[test]
    fn test_cut_exactly_before_space() {
        assert_eq!(derive_excerpt("abc def ghi", 7), "abc def...");
    }

    #[test]
    fn test_single_long_word() {
        assert_eq!(derive_excerpt("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_default_length_bound() {
        let content = "palabra ".repeat(100);
        let excerpt = derive_excerpt(&content, DEFAULT_EXCERPT_LEN);
        assert!(excerpt.chars().count() <= DEFAULT_EXCERPT_LEN + ELLIPSIS.len());
        assert!(excerpt.ends_with(ELLIPSIS));
    }
}
