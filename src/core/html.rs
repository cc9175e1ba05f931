// src/core/html.rs
//! Case-insensitive tag scanning over raw HTML text.
//!
//! No DOM is built. Helpers return byte ranges into the original string so
//! callers can slice without copying.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Position of the next `<name` opening tag at or after `from`.
/// `lc` must be the lowercased document. `<th` does not match `<thead`.
pub fn find_open_tag(lc: &str, name: &str, from: usize) -> Option<usize> {
    let pat = format!("<{name}");
    let mut at = from;
    loop {
        let i = lc.get(at..)?.find(&pat)? + at;
        let after = i + pat.len();
        match lc.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(i),
            None => return None,
            _ => at = after,
        }
    }
}

/// Position of the next `</name` closing tag at or after `from`.
fn find_close_tag(lc: &str, name: &str, from: usize) -> Option<usize> {
    let pat = format!("</{name}");
    let mut at = from;
    loop {
        let i = lc.get(at..)?.find(&pat)? + at;
        let after = i + pat.len();
        match lc.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' => return Some(i),
            None => return None,
            _ => at = after,
        }
    }
}

/// Next `<name ...>...</name>` block at or after `from`, honoring nesting of
/// the same tag. Returns `(start, end)` with `end` just past the closing `>`.
/// An unclosed block runs to the end of the input.
pub fn balanced_block_ci(lc: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let start = find_open_tag(lc, name, from)?;
    let mut depth = 0usize;
    let mut at = start;
    loop {
        let next_open = find_open_tag(lc, name, at);
        let next_close = find_close_tag(lc, name, at);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                at = o + name.len() + 1;
            }
            (_, Some(c)) => {
                depth = depth.saturating_sub(1);
                let end = lc[c..].find('>').map(|e| c + e + 1).unwrap_or(lc.len());
                if depth == 0 {
                    return Some((start, end));
                }
                at = end;
            }
            (Some(o), None) => {
                depth += 1;
                at = o + name.len() + 1;
            }
            (None, None) => return Some((start, lc.len())),
        }
    }
}

/// The opening tag of a block, up to and including its `>`.
pub fn open_tag(block: &str) -> &str {
    match block.find('>') {
        Some(i) => &block[..=i],
        None => block,
    }
}

/// Value of attribute `name` in an opening tag (quoted or bare).
pub fn attr_value(tag: &str, name: &str) -> Option<String> {
    let lc = to_lower(tag);
    let pat = to_lower(name);
    let mut at = 0;
    while let Some(rel) = lc[at..].find(&pat) {
        let i = at + rel;
        at = i + pat.len();
        let boundary = i > 0 && lc.as_bytes()[i - 1].is_ascii_whitespace();
        let rest = lc[at..].trim_start();
        if !boundary || !rest.starts_with('=') {
            continue;
        }
        let value_at = tag.len() - rest.len() + 1;
        let value = tag[value_at..].trim_start();
        let mut chars = value.chars();
        return match chars.next() {
            Some(q @ ('"' | '\'')) => {
                let body = &value[1..];
                Some(body[..body.find(q).unwrap_or(body.len())].to_string())
            }
            Some(_) => {
                let end = value
                    .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                    .unwrap_or(value.len());
                Some(value[..end].to_string())
            }
            None => None,
        };
    }
    None
}

pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
        return block[oe + 1..].to_string();
    }
    s!()
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// `<br>`, `<br/>` and `<br />` become a single space.
pub fn breaks_to_spaces(s: &str) -> String {
    let lc = to_lower(s);
    let mut out = String::with_capacity(s.len());
    let mut at = 0;
    while let Some(i) = find_open_tag(&lc, "br", at) {
        out.push_str(&s[at..i]);
        out.push(' ');
        at = match lc[i..].find('>') {
            Some(e) => i + e + 1,
            None => s.len(),
        };
    }
    out.push_str(&s[at..]);
    out
}

/// Visible text of a cell: breaks to spaces, tags stripped, entities
/// decoded once, whitespace collapsed. A second pass changes nothing unless
/// the decoded text itself contains `&`, `<` or `>`.
pub fn cell_text(inner: &str) -> String {
    let text = strip_tags(breaks_to_spaces(inner));
    super::sanitize::normalize_ws(&super::sanitize::normalize_entities(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn th_does_not_match_thead() {
        let lc = "<thead><tr><th>a</th></tr></thead>";
        assert_eq!(find_open_tag(lc, "th", 0), Some(11));
        assert_eq!(find_open_tag(lc, "thead", 0), Some(0));
    }

    #[test]
    fn nested_tables_balance() {
        let doc = "<table a><tr><td><table b></table></td></tr></table><p>";
        let lc = to_lower(doc);
        let (s, e) = balanced_block_ci(&lc, "table", 0).unwrap();
        assert_eq!(s, 0);
        assert_eq!(&doc[e..], "<p>");
        let (s2, _) = balanced_block_ci(&lc, "table", 1).unwrap();
        assert_eq!(&doc[s2..s2 + 9], "<table b>");
    }

    #[test]
    fn attribute_values() {
        let tag = r#"<TABLE Class="wikitable  sortable" data-x=1>"#;
        assert_eq!(attr_value(tag, "class").as_deref(), Some("wikitable  sortable"));
        assert_eq!(attr_value(tag, "data-x").as_deref(), Some("1"));
        assert_eq!(attr_value(tag, "id"), None);
        assert_eq!(attr_value(r#"<td colspan='2'>"#, "colspan").as_deref(), Some("2"));
    }

    #[test]
    fn cell_text_is_idempotent() {
        let raw = "Confirmed<br/>cases&nbsp; <sup>x</sup>";
        let once = cell_text(raw);
        assert_eq!(once, "Confirmed cases x");
        assert_eq!(cell_text(&once), once);
    }

    #[test]
    fn entities_decode_once() {
        assert_eq!(cell_text("&amp;lt;b&amp;gt; <i>x</i>"), "&lt;b&gt; x");
        assert_eq!(cell_text("a &lt;5 &amp; b"), "a <5 & b");
    }
}
