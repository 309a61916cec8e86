//! Page layout for the PDF document.
//!
//! [`paginate`] places every table of a dictionary on US Letter pages as a
//! bordered block: a title row followed by one row per column, each block
//! followed by a spacer. Positions are in PDF points with the origin at the
//! bottom-left corner of the page. Nothing here touches the PDF library, so
//! the layout can be inspected directly.

use super::labels;
use super::metadata::DataDictionary;

/// Page size and the fixed positions of the decorations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Baseline of the running header text
    pub header_baseline: f32,
    /// Height of the rule under the header
    pub header_rule: f32,
    pub header_x: f32,
    pub header_rule_end: f32,
    pub header_font_size: f32,
    /// Baseline of the page-number footer
    pub footer_baseline: f32,
    pub footer_font_size: f32,
}

impl PageGeometry {
    /// US Letter, 0.75 inch margins.
    pub const LETTER: Self = Self {
        width: 612.0,
        height: 792.0,
        margin: 54.0,
        header_baseline: 750.0,
        header_rule: 745.0,
        header_x: 50.0,
        header_rule_end: 600.0,
        header_font_size: 12.0,
        footer_baseline: 30.0,
        footer_font_size: 9.0,
    };

    /// Top of the content frame.
    pub fn frame_top(&self) -> f32 {
        self.height - self.margin
    }

    pub fn frame_bottom(&self) -> f32 {
        self.margin
    }

    pub fn frame_left(&self) -> f32 {
        self.margin
    }

    pub fn frame_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

pub const FONT_SIZE: f32 = 10.0;
pub const LEADING: f32 = 12.0;
pub const PADDING_X: f32 = 6.0;
pub const PADDING_TOP: f32 = 3.0;
pub const PADDING_BOTTOM: f32 = 3.0;
/// The title row gets extra room below its text.
pub const TITLE_PADDING_BOTTOM: f32 = 12.0;
/// Vertical gap after each block.
pub const BLOCK_SPACER: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Title,
    Column,
}

/// One cell row, already wrapped to the block width.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub kind: RowKind,
    pub lines: Vec<String>,
    /// y of the row's top edge
    pub top: f32,
    pub height: f32,
}

impl PlacedRow {
    /// Baselines of the text lines, top to bottom.
    pub fn baselines(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.lines.len()).map(move |i| self.top - PADDING_TOP - FONT_SIZE - i as f32 * LEADING)
    }
}

/// The part of one table's block that lands on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub table: String,
    /// Set on the second and later fragments of a block split across pages
    pub continued: bool,
    pub left: f32,
    pub width: f32,
    pub rows: Vec<PlacedRow>,
}

impl PlacedBlock {
    pub fn top(&self) -> f32 {
        self.rows.first().map_or(0.0, |r| r.top)
    }

    pub fn bottom(&self) -> f32 {
        self.rows.last().map_or(0.0, |r| r.top - r.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based
    pub number: usize,
    pub blocks: Vec<PlacedBlock>,
}

impl Page {
    pub fn footer_text(&self) -> String {
        format!("Page {}", self.number)
    }
}

struct PendingRow {
    kind: RowKind,
    lines: Vec<String>,
    height: f32,
}

impl PendingRow {
    fn new(kind: RowKind, lines: Vec<String>) -> Self {
        let height = row_height(kind, lines.len());
        Self { kind, lines, height }
    }

    /// Keep the first `at` lines, returning the rest as a row of the same kind.
    fn split_off(&mut self, at: usize) -> Self {
        let rest = self.lines.split_off(at);
        self.height = row_height(self.kind, self.lines.len());
        Self::new(self.kind, rest)
    }
}

fn bottom_padding(kind: RowKind) -> f32 {
    match kind {
        RowKind::Title => TITLE_PADDING_BOTTOM,
        RowKind::Column => PADDING_BOTTOM,
    }
}

fn row_height(kind: RowKind, line_count: usize) -> f32 {
    PADDING_TOP + line_count as f32 * LEADING + bottom_padding(kind)
}

/// Line breaks in `text` start a new line; long lines wrap to `max_width`.
fn pending_row(kind: RowKind, text: &str, max_width: f32) -> PendingRow {
    let bold = kind == RowKind::Title;
    let lines: Vec<String> = printable_text(text)
        .lines()
        .flat_map(|line| wrap_text(line, FONT_SIZE, max_width, bold))
        .collect();
    if lines.is_empty() {
        PendingRow::new(kind, vec![String::new()])
    } else {
        PendingRow::new(kind, lines)
    }
}

/// Stand-in for characters the built-in PDF fonts cannot encode.
pub const REPLACEMENT_CHAR: char = '?';

/// Whether the built-in Helvetica faces can show `c`.
///
/// They carry a single-byte encoding: printable ASCII and the Latin-1
/// supplement.
pub fn is_encodable(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF)
}

/// Make `text` safe for the built-in fonts.
///
/// Line breaks are kept as `\n`, tabs and other control characters become
/// spaces, and anything outside the font encoding becomes
/// [`REPLACEMENT_CHAR`] with a warning, so no character disappears silently.
pub fn printable_text(text: &str) -> String {
    let mut replaced = 0usize;
    let printable: String = text
        .replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            '\n' => c,
            c if is_encodable(c) => c,
            c if c.is_control() => ' ',
            _ => {
                replaced += 1;
                REPLACEMENT_CHAR
            }
        })
        .collect();
    if replaced > 0 {
        tracing::warn!(
            "Replaced {replaced} character(s) the PDF font cannot show with '{REPLACEMENT_CHAR}' in {text:?}"
        );
    }
    printable
}

struct Paginator {
    geometry: PageGeometry,
    pages: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl Paginator {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            current: Page {
                number: 1,
                blocks: Vec::new(),
            },
            cursor: geometry.frame_top(),
        }
    }

    fn fits(&self, height: f32) -> bool {
        self.cursor - height >= self.geometry.frame_bottom()
    }

    fn page_is_empty(&self) -> bool {
        self.current.blocks.is_empty()
    }

    fn new_page(&mut self) {
        let next = Page {
            number: self.current.number + 1,
            blocks: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.cursor = self.geometry.frame_top();
    }

    fn place_table(&mut self, name: &str, rows: Vec<PendingRow>) {
        let mut block = self.empty_block(name, false);

        // Keep the title together with the first column row.
        let lead_height: f32 = rows.iter().take(2).map(|r| r.height).sum();
        if !self.fits(lead_height) && !self.page_is_empty() {
            self.new_page();
        }

        for mut row in rows {
            loop {
                if self.fits(row.height) {
                    self.push_row(&mut block, row);
                    break;
                }
                if row.height > self.frame_height() {
                    // Taller than a whole page: fill what is left here and
                    // carry the remaining lines over.
                    let room = self.lines_that_fit(row.kind);
                    if room > 0 {
                        let rest = row.split_off(room);
                        self.push_row(&mut block, row);
                        row = rest;
                    } else if block.rows.is_empty() && self.page_is_empty() {
                        self.push_row(&mut block, row);
                        break;
                    }
                } else if block.rows.is_empty() && self.page_is_empty() {
                    self.push_row(&mut block, row);
                    break;
                }
                self.break_block(name, &mut block);
            }
        }

        if !block.rows.is_empty() {
            self.current.blocks.push(block);
        }
        self.cursor -= BLOCK_SPACER;
    }

    fn frame_height(&self) -> f32 {
        self.geometry.frame_top() - self.geometry.frame_bottom()
    }

    /// How many text lines of a `kind` row still fit on the current page.
    fn lines_that_fit(&self, kind: RowKind) -> usize {
        let room = self.cursor - self.geometry.frame_bottom() - row_height(kind, 0);
        (room / LEADING).floor().max(0.0) as usize
    }

    fn push_row(&mut self, block: &mut PlacedBlock, row: PendingRow) {
        block.rows.push(PlacedRow {
            kind: row.kind,
            lines: row.lines,
            top: self.cursor,
            height: row.height,
        });
        self.cursor -= row.height;
    }

    /// Close the current fragment of `block` and continue it on a new page.
    fn break_block(&mut self, name: &str, block: &mut PlacedBlock) {
        if !block.rows.is_empty() {
            let next = self.empty_block(name, true);
            self.current.blocks.push(std::mem::replace(block, next));
        }
        self.new_page();
    }

    fn empty_block(&self, name: &str, continued: bool) -> PlacedBlock {
        PlacedBlock {
            table: name.to_owned(),
            continued,
            left: self.geometry.frame_left(),
            width: self.geometry.frame_width(),
            rows: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Lay out `dictionary` on pages of the given geometry.
///
/// Always returns at least one page, so an empty dictionary still yields a
/// decorated page.
pub fn paginate(dictionary: &DataDictionary, geometry: PageGeometry) -> Vec<Page> {
    let text_width = geometry.frame_width() - 2.0 * PADDING_X;
    let mut paginator = Paginator::new(geometry);

    for (name, table) in dictionary {
        let mut rows = Vec::with_capacity(table.columns.len() + 1);
        rows.push(pending_row(RowKind::Title, &labels::table_title(name), text_width));
        for line in labels::column_lines(table) {
            rows.push(pending_row(RowKind::Column, &line, text_width));
        }
        paginator.place_table(name, rows);
    }

    paginator.finish()
}

/// Advance widths of Helvetica for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const DEFAULT_GLYPH_WIDTH: u16 = 556;

/// Bold glyphs run wider; close enough for wrapping and centering.
const BOLD_FACTOR: f32 = 1.06;

/// Estimated width in points of `text` set in Helvetica at `font_size`.
pub fn text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                HELVETICA_WIDTHS
                    .get((code - 32) as usize)
                    .copied()
                    .unwrap_or(DEFAULT_GLYPH_WIDTH)
            } else {
                DEFAULT_GLYPH_WIDTH
            }
        })
        .map(u32::from)
        .sum();
    let width = units as f32 * font_size / 1000.0;
    if bold { width * BOLD_FACTOR } else { width }
}

/// Break `text` into lines no wider than `max_width`, at spaces where
/// possible. Words wider than a whole line are split between characters.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32, bold: bool) -> Vec<String> {
    let fits = |s: &str| text_width(s, font_size, bold) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_owned();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::metadata::{ColumnInfo, TableInfo};
    use indexmap::IndexMap;

    fn table_with_columns(count: usize) -> TableInfo {
        let columns: IndexMap<String, ColumnInfo> = (0..count)
            .map(|i| (format!("col_{i}"), ColumnInfo::new("integer", true, None)))
            .collect();
        TableInfo::new(columns, vec![])
    }

    #[test]
    fn test_empty_dictionary_has_one_empty_page() {
        let pages = paginate(&DataDictionary::new(), PageGeometry::LETTER);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].blocks.is_empty());
        assert_eq!(pages[0].footer_text(), "Page 1");
    }

    #[test]
    fn test_single_column_table_is_one_block_of_two_rows() {
        let mut dict = DataDictionary::new();
        dict.insert("public", "t", table_with_columns(1));

        let pages = paginate(&dict, PageGeometry::LETTER);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks.len(), 1);

        let block = &pages[0].blocks[0];
        assert_eq!(block.rows.len(), 2);
        assert_eq!(block.rows[0].kind, RowKind::Title);
        assert_eq!(block.rows[0].lines, vec!["Tabela: public.t".to_owned()]);
        assert_eq!(block.rows[1].kind, RowKind::Column);
        assert_eq!(block.rows[1].lines.len(), 1);
        assert!((block.top() - PageGeometry::LETTER.frame_top()).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blocks_are_separated_by_spacer() {
        let mut dict = DataDictionary::new();
        dict.insert("public", "a", table_with_columns(1));
        dict.insert("public", "b", table_with_columns(1));

        let pages = paginate(&dict, PageGeometry::LETTER);
        let blocks = &pages[0].blocks;
        assert_eq!(blocks.len(), 2);
        let gap = blocks[0].bottom() - blocks[1].top();
        assert!((gap - BLOCK_SPACER).abs() < 0.01, "gap was {gap}");
    }

    #[test]
    fn test_large_table_continues_on_next_page() {
        let mut dict = DataDictionary::new();
        dict.insert("public", "wide", table_with_columns(120));

        let pages = paginate(&dict, PageGeometry::LETTER);
        assert!(pages.len() >= 2, "expected several pages, got {}", pages.len());

        let numbers: Vec<usize> = pages.iter().map(|p| p.number).collect();
        let expected: Vec<usize> = (1..=pages.len()).collect();
        assert_eq!(numbers, expected);

        assert!(!pages[0].blocks[0].continued);
        assert!(pages[1].blocks[0].continued);
        assert_eq!(pages[1].blocks[0].rows[0].kind, RowKind::Column);

        let placed_rows: usize = pages
            .iter()
            .flat_map(|p| &p.blocks)
            .map(|b| b.rows.len())
            .sum();
        assert_eq!(placed_rows, 121);

        let bottom = PageGeometry::LETTER.frame_bottom();
        for page in &pages {
            for block in &page.blocks {
                assert!(block.bottom() >= bottom - 0.01);
            }
        }
    }

    #[test]
    fn test_wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_text("Coluna: id", FONT_SIZE, 200.0, false), vec!["Coluna: id"]);
        assert_eq!(wrap_text("", FONT_SIZE, 200.0, false), vec![String::new()]);
    }

    #[test]
    fn test_wrap_long_text() {
        let text = "Coluna: payload, Tipo de Dados: jsonb, Nulo: YES, Valor Padrão: \
                    '{\"retries\": 3, \"backoff\": \"exponential\", \"targets\": []}'::jsonb";
        let lines = wrap_text(text, FONT_SIZE, 150.0, false);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FONT_SIZE, false) <= 150.0, "line too wide: {line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_unbreakable_word() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, FONT_SIZE, 100.0, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    fn single_column(name: &str, default: &str) -> DataDictionary {
        let mut columns = IndexMap::new();
        columns.insert(
            name.to_owned(),
            ColumnInfo::new("text", true, Some(default.to_owned())),
        );
        let mut dict = DataDictionary::new();
        dict.insert("public", "t", TableInfo::new(columns, vec![]));
        dict
    }

    fn column_rows(pages: &[Page]) -> Vec<&PlacedRow> {
        pages
            .iter()
            .flat_map(|p| &p.blocks)
            .flat_map(|b| &b.rows)
            .filter(|r| r.kind == RowKind::Column)
            .collect()
    }

    #[test]
    fn test_unencodable_characters_are_replaced() {
        let dict = single_column("nome_ção", "'数据'::text");
        let pages = paginate(&dict, PageGeometry::LETTER);

        let text = column_rows(&pages)[0].lines.concat();
        assert!(text.starts_with("Coluna: nome_ção,"), "{text}");
        assert!(text.ends_with("Valor Padrão: '??'::text"), "{text}");
        assert!(text.chars().all(is_encodable));
    }

    #[test]
    fn test_printable_text() {
        assert_eq!(printable_text("plain"), "plain");
        assert_eq!(printable_text("a\tb\r\nc"), "a b\nc");
        assert_eq!(printable_text("Ωmega"), "?mega");
    }

    #[test]
    fn test_line_break_starts_new_line() {
        let dict = single_column("c", "'a\nb'::text");
        let pages = paginate(&dict, PageGeometry::LETTER);

        let rows = column_rows(&pages);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].lines.len(), 2);
        assert!(rows[0].lines[0].ends_with("Valor Padrão: 'a"));
        assert_eq!(rows[0].lines[1], "b'::text");
    }

    #[test]
    fn test_oversized_row_is_cut_at_line_boundaries() {
        let default = "lorem ipsum ".repeat(1500);
        let dict = single_column("notes", default.trim_end());
        let geometry = PageGeometry::LETTER;
        let pages = paginate(&dict, geometry);
        assert!(pages.len() > 1);

        for page in &pages {
            for block in &page.blocks {
                assert!(block.top() <= geometry.frame_top() + 0.01);
                assert!(
                    block.bottom() >= geometry.frame_bottom() - 0.01,
                    "page {} block bottom {}",
                    page.number,
                    block.bottom()
                );
            }
        }

        let rows = column_rows(&pages);
        assert!(rows.len() > 1);
        let placed: Vec<String> = rows.iter().flat_map(|r| r.lines.clone()).collect();
        let text_width = geometry.frame_width() - 2.0 * PADDING_X;
        let line = labels::column_lines(dict.get("public.t").expect("table"))
            .into_iter()
            .next()
            .expect("one column");
        assert_eq!(placed, wrap_text(&line, FONT_SIZE, text_width, false));
    }

    #[test]
    fn test_text_width() {
        // "Hi" = 722 + 222
        assert!((text_width("Hi", 10.0, false) - 9.44).abs() < 0.001);
    }
}
