// src/core/sanitize.rs

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#8211;", "-")
        .replace("&ndash;", "-")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Header cell as written by the source: trimmed, BOM dropped.
pub fn normalize_header(s: &str) -> String {
    s.trim_start_matches('\u{feff}').trim().to_string()
}

/// Remove `(...)` and `[...]` annotations, e.g. `Fairfax[b]` or `Bronx (NYC)`.
/// An annotation opens on `(` or `[` and ends at the first `)` or `]`.
/// An unclosed opener is kept as text.
pub fn strip_annotations(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find(['(', '[']) {
        out.push_str(&rest[..i]);
        match rest[i..].find([')', ']']) {
            Some(j) => rest = &rest[i + j + 1..],
            None => {
                out.push_str(&rest[i..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    normalize_ws(&out)
}

/// Count cell as a non-negative integer. Annotations and thousands
/// separators are dropped; decimals are truncated. Blank is `None`.
pub fn parse_count(s: &str) -> Option<u64> {
    let v = parse_signed(s)?;
    u64::try_from(v).ok()
}

/// Like [`parse_count`] but negative values are allowed.
pub fn parse_signed(s: &str) -> Option<i64> {
    let cleaned: String = strip_annotations(s).chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

/// File-system-safe stem for a chart or entity name.
pub fn sanitize_file_stem(name: &str, fallback: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_us = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() { out.push(ch); last_us = false; }
        else if ch.is_whitespace() || ch == '/' { if !last_us { out.push('_'); last_us = true; } }
        else if ch=='-' || ch=='_' { if !(last_us && ch=='_') { out.push(ch); } last_us = ch=='_'; }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() { fallback.to_string() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_are_removed() {
        assert_eq!(strip_annotations("Fairfax[b]"), "Fairfax");
        assert_eq!(strip_annotations("Bronx (NYC) borough"), "Bronx borough");
        assert_eq!(strip_annotations("1,204[12]"), "1,204");
        assert_eq!(strip_annotations("open (never"), "open (never");
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("1,204[12]"), Some(1204));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count(" "), None);
        assert_eq!(parse_count("-"), None);
        assert_eq!(parse_count("N/A"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_signed("-3"), Some(-3));
    }

    #[test]
    fn header_bom() {
        assert_eq!(normalize_header("\u{feff}Province/State "), "Province/State");
    }

    #[test]
    fn file_stems() {
        assert_eq!(sanitize_file_stem("Cases per 1M / US", "chart"), "Cases_per_1M_US");
        assert_eq!(sanitize_file_stem("***", "chart"), "chart");
    }
}
