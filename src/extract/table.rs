// src/extract/table.rs
//! Flat view of the `<table>`s in an HTML document.
//!
//! Nested tables become tables of their own and are cut out of their parent.
//! Rows and cells tolerate missing close tags (`<td>a<td>b` is two cells).
//! Cells are placed on a column grid: a cell spanning rows from above
//! pushes the cells of the rows below it to the right.

use crate::core::html::{attr_value, balanced_block_ci, cell_text, find_open_tag, open_tag, to_lower};
use crate::core::sanitize::normalize_ws;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlCell {
    pub text: String,
    pub header: bool,
    /// First grid column the cell covers.
    pub col: usize,
    pub colspan: usize,
    pub rowspan: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlRow {
    pub cells: Vec<HtmlCell>,
}

impl HtmlRow {
    /// Cell of this row covering grid column `col`. Columns held by a
    /// rowspan from an earlier row have no cell here.
    pub fn cell_at(&self, col: usize) -> Option<&HtmlCell> {
        self.cells.iter().find(|c| c.col <= col && col < c.col + c.colspan)
    }

    /// `(grid column, cell)` pairs.
    pub fn positioned(&self) -> impl Iterator<Item = (usize, &HtmlCell)> {
        self.cells.iter().map(|c| (c.col, c))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlTable {
    /// Position among all tables of the document, in document order.
    pub index: usize,
    /// `class` attribute, whitespace-normalized.
    pub class: String,
    pub rows: Vec<HtmlRow>,
}

/// Every table in `doc`, outer tables before the tables nested in them.
pub fn tables(doc: &str) -> Vec<HtmlTable> {
    let lc = to_lower(doc);
    let mut out = Vec::new();
    let mut at = 0;
    while let Some((start, end)) = balanced_block_ci(&lc, "table", at) {
        let block = &doc[start..end];
        let class = attr_value(open_tag(block), "class").map(|c| normalize_ws(&c)).unwrap_or_default();
        let rows = parse_rows(&without_nested_tables(block));
        out.push(HtmlTable { index: out.len(), class, rows });
        // step into the block so nested tables are visited too
        at = start + "<table".len();
    }
    out
}

/// Table block with any inner `<table>...</table>` removed.
fn without_nested_tables(block: &str) -> String {
    let lc = to_lower(block);
    let body_from = open_tag(block).len();
    let mut out = String::with_capacity(block.len());
    out.push_str(&block[..body_from]);
    let mut at = body_from;
    while let Some((s, e)) = balanced_block_ci(&lc, "table", at) {
        out.push_str(&block[at..s]);
        at = e;
    }
    out.push_str(&block[at..]);
    out
}

/// Earliest position among several optional positions.
fn first_of(ps: &[Option<usize>]) -> Option<usize> {
    ps.iter().flatten().copied().min()
}

fn parse_rows(table: &str) -> Vec<HtmlRow> {
    let lc = to_lower(table);
    let mut rows = Vec::new();
    let mut at = 0;
    while let Some(start) = find_open_tag(&lc, "tr", at) {
        let body = start + 3;
        let next_row = find_open_tag(&lc, "tr", body);
        let mut end = next_row.unwrap_or(lc.len());
        if let Some(close) = lc[body..end].find("</tr") {
            end = body + close;
        }
        let row_html = &table[start..end];
        rows.push(parse_cells(row_html));
        at = next_row.unwrap_or(lc.len());
    }
    place_on_grid(&mut rows);
    rows
}

/// Assign grid columns, skipping columns still held by rowspans from above.
fn place_on_grid(rows: &mut [HtmlRow]) {
    // rows still covered, per grid column
    let mut held: Vec<usize> = Vec::new();
    for row in rows {
        let mut pos = 0;
        for cell in &mut row.cells {
            while held.get(pos).is_some_and(|h| *h > 0) {
                pos += 1;
            }
            cell.col = pos;
            let end = pos + cell.colspan;
            if held.len() < end {
                held.resize(end, 0);
            }
            held[pos..end].fill(cell.rowspan);
            pos = end;
        }
        for h in held.iter_mut() {
            *h = h.saturating_sub(1);
        }
    }
}

fn span(tag: &str, name: &str) -> usize {
    attr_value(tag, name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

fn parse_cells(row: &str) -> HtmlRow {
    let lc = to_lower(row);
    let next_cell = |from: usize| first_of(&[find_open_tag(&lc, "td", from), find_open_tag(&lc, "th", from)]);

    let mut cells = Vec::new();
    let mut at = 0;
    while let Some(start) = next_cell(at) {
        let tag_end = lc[start..].find('>').map(|e| start + e + 1).unwrap_or(lc.len());
        let tag = &row[start..tag_end];
        let following = next_cell(tag_end);
        let mut end = following.unwrap_or(lc.len());
        let close = first_of(&[lc[tag_end..end].find("</td"), lc[tag_end..end].find("</th")]);
        if let Some(c) = close {
            end = tag_end + c;
        }
        cells.push(HtmlCell {
            text: cell_text(&row[tag_end..end]),
            header: lc[start..].starts_with("<th"),
            col: 0,
            colspan: span(tag, "colspan"),
            rowspan: span(tag, "rowspan"),
        });
        at = following.unwrap_or(lc.len());
    }
    HtmlRow { cells }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_cells_and_spans() {
        let doc = r#"<table class=" wikitable
            sortable"><thead><tr><th colspan="2">County</th><th>Cases<br>total</th></tr></thead>
            <tr><td>A<td>b<td>1,024</tr><tr><th scope="row">Fairfax</th><td>x</td></table>"#;
        let t = &tables(doc)[0];
        assert_eq!(t.class, "wikitable sortable");
        assert_eq!(t.rows.len(), 3);
        let header: Vec<_> = t.rows[0].positioned().map(|(p, c)| (p, c.text.as_str())).collect();
        assert_eq!(header, vec![(0, "County"), (2, "Cases total")]);
        assert_eq!(t.rows[1].cell_at(2).map(|c| c.text.as_str()), Some("1,024"));
        assert!(t.rows[2].cells[0].header);
        assert_eq!(t.rows[2].cell_at(5), None);
    }

    #[test]
    fn rowspan_pushes_lower_cells_right() {
        let doc = r#"<table>
            <tr><th rowspan="2">County</th><th colspan="3">Totals</th><th rowspan=3>Ref</th></tr>
            <tr><th>Cases</th><th>Deaths</th><th>Recovered</th></tr>
            <tr><td>A</td><td>1</td><td>2</td><td>3</td></tr>
            <tr><td>B</td><td>4</td><td>5</td><td>6</td><td>x</td></tr>
            </table>"#;
        let t = &tables(doc)[0];
        let cols = |r: usize| t.rows[r].positioned().map(|(p, _)| p).collect::<Vec<_>>();
        assert_eq!(cols(0), vec![0, 1, 4]);
        assert_eq!(cols(1), vec![1, 2, 3]);
        assert_eq!(cols(2), vec![0, 1, 2, 3]);
        assert_eq!(cols(3), vec![0, 1, 2, 3, 4]);
        assert_eq!(t.rows[1].cell_at(0), None);
        assert_eq!(t.rows[1].cell_at(1).map(|c| c.text.as_str()), Some("Cases"));
    }

    #[test]
    fn nested_tables_stand_alone() {
        let doc = "<table class=outer><tr><td>1</td><td><table class=inner><tr><td>2</td></tr></table></td></tr></table>";
        let ts = tables(doc);
        assert_eq!(ts.len(), 2);
        assert_eq!(ts[0].class, "outer");
        assert_eq!(ts[0].rows.len(), 1);
        assert_eq!(ts[0].rows[0].cells.len(), 2);
        assert_eq!(ts[0].rows[0].cells[1].text, "");
        assert_eq!(ts[1].class, "inner");
        assert_eq!(ts[1].rows[0].cells[0].text, "2");
    }
}
