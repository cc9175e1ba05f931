// src/extract/revisions.rs
// MediaWiki revision history: which old revision stands for which day.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::consts::WIKI_INDEX_URL;
use crate::core::html::{attr_value, balanced_block_ci, cell_text, inner_after_open_tag, open_tag, to_lower};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Revision {
    pub date: NaiveDate,
    pub oldid: u64,
}

/// `14:05, 3 April 2020`
const STAMP_FORMAT: &str = "%H:%M, %d %B %Y";

fn oldid_of(href: &str) -> Option<u64> {
    let at = href.find("oldid=")? + "oldid=".len();
    let digits: String = href[at..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Every `<a class="mw-changeslist-date" href="...oldid=N">stamp</a>` link.
/// Links without a usable stamp or oldid are skipped.
pub fn parse_history(html: &str) -> Vec<Revision> {
    let lc = to_lower(html);
    let mut out = Vec::new();
    let mut at = 0;
    while let Some((s, e)) = balanced_block_ci(&lc, "a", at) {
        at = e;
        let block = &html[s..e];
        let tag = open_tag(block);
        let is_date_link = attr_value(tag, "class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == "mw-changeslist-date"));
        if !is_date_link {
            continue;
        }
        let Some(oldid) = attr_value(tag, "href").and_then(|h| oldid_of(&h)) else {
            continue;
        };
        let stamp = cell_text(&inner_after_open_tag(block));
        match NaiveDateTime::parse_from_str(&stamp, STAMP_FORMAT) {
            Ok(dt) => out.push(Revision { date: dt.date(), oldid }),
            Err(e) => logd!("history: skipping `{stamp}` ({e})"),
        }
    }
    out
}

/// Highest oldid per day, newest day first.
pub fn last_per_day(revisions: &[Revision]) -> Vec<Revision> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for r in revisions {
        let id = days.entry(r.date).or_insert(r.oldid);
        *id = (*id).max(r.oldid);
    }
    days.into_iter()
        .rev()
        .map(|(date, oldid)| Revision { date, oldid })
        .collect()
}

/// Article title from its URL (text after the last `/` or `\`).
pub fn article_name(url: &str) -> &str {
    match url.rfind(['/', '\\']) {
        Some(i) => &url[i + 1..],
        None => url,
    }
}

pub fn history_url(article: &str, limit: usize) -> String {
    format!("{WIKI_INDEX_URL}?title={article}&offset=&limit={limit}&action=history")
}

pub fn revision_url(article: &str, oldid: u64) -> String {
    format!("{WIKI_INDEX_URL}?title={article}&oldid={oldid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"
        <li><a href="/w/index.php?title=X&amp;oldid=951" class="mw-changeslist-date" title="X">14:05, 3 April 2020</a></li>
        <li><a href="/w/index.php?title=X&amp;oldid=950" class="mw-changeslist-date">09:00, 3 April 2020</a></li>
        <li><a href="/w/index.php?title=X&amp;diff=1" class="mw-changeslist-diff">prev</a></li>
        <li><a href="/w/index.php?title=X&amp;oldid=940" class="mw-changeslist-date">23:59, 2 April 2020</a></li>
    "#;

    #[test]
    fn parses_links_and_keeps_last_per_day() {
        let revs = parse_history(HISTORY);
        assert_eq!(revs.len(), 3);
        let days = last_per_day(&revs);
        assert_eq!(
            days,
            vec![
                Revision { date: NaiveDate::from_ymd_opt(2020, 4, 3).unwrap(), oldid: 951 },
                Revision { date: NaiveDate::from_ymd_opt(2020, 4, 2).unwrap(), oldid: 940 },
            ]
        );
    }

    #[test]
    fn urls() {
        let a = article_name("https://en.wikipedia.org/wiki/2020_coronavirus_pandemic_in_Maine");
        assert_eq!(a, "2020_coronavirus_pandemic_in_Maine");
        assert!(history_url(a, 5000).ends_with("limit=5000&action=history"));
        assert!(revision_url(a, 7).ends_with("&oldid=7"));
    }
}
