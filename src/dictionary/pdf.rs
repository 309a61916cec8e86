//! PDF output.
//!
//! Paints the pages computed by [`layout::paginate`] with `printpdf`, using
//! the built-in Helvetica faces so no font files are needed. Those faces only
//! cover Latin-1; the layout swaps anything else for `?` before it gets here.

use super::labels::DOCUMENT_TITLE;
use super::layout::{self, FONT_SIZE, Page, PageGeometry, PlacedBlock, PlacedRow, RowKind};
use super::metadata::DataDictionary;
use super::storage;
use crate::error::{Result, ResultExt as _};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Polygon,
    Rgb,
};
use std::path::Path;

const LAYER_NAME: &str = "Layer 1";
const GRID_THICKNESS: f32 = 1.0;

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const GREY: (f32, f32, f32) = (0.5, 0.5, 0.5);
const WHITE_SMOKE: (f32, f32, f32) = (0.96, 0.96, 0.96);
const BEIGE: (f32, f32, f32) = (0.96, 0.96, 0.86);

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Render `dictionary` as a PDF document at `destination`.
///
/// The file appears complete or not at all.
///
/// # Errors
///
/// Returns `DictError::Render` if the document cannot be built and
/// `DictError::Io` if `destination` cannot be written.
pub fn render(dictionary: &DataDictionary, destination: &Path) -> Result<()> {
    let bytes = render_to_bytes(dictionary)?;
    storage::write_atomically(destination, &bytes)
}

/// Render `dictionary` as PDF bytes.
///
/// # Errors
///
/// Returns `DictError::Render` if the document cannot be built.
pub fn render_to_bytes(dictionary: &DataDictionary) -> Result<Vec<u8>> {
    let geometry = PageGeometry::LETTER;
    let pages = layout::paginate(dictionary, geometry);
    tracing::debug!(
        "Laid out {} table(s) on {} page(s)",
        dictionary.len(),
        pages.len()
    );
    paint(&pages, geometry)
}

/// Turn laid-out pages into a PDF document.
///
/// # Errors
///
/// Returns `DictError::Render` if the document cannot be built.
pub fn paint(pages: &[Page], geometry: PageGeometry) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        mm(geometry.width),
        mm(geometry.height),
        LAYER_NAME,
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
    };

    for (i, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(geometry.width), mm(geometry.height), LAYER_NAME)
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        paint_decorations(&layer, &fonts, page, geometry);
        for block in &page.blocks {
            paint_block(&layer, &fonts, block);
        }
    }

    doc.save_to_bytes().context("Failed to build PDF document")
}

fn paint_decorations(layer: &PdfLayerReference, fonts: &Fonts, page: &Page, geometry: PageGeometry) {
    layer.set_fill_color(rgb(BLACK));
    layer.use_text(
        DOCUMENT_TITLE,
        geometry.header_font_size,
        mm(geometry.header_x),
        mm(geometry.header_baseline),
        &fonts.regular,
    );

    layer.set_outline_color(rgb(BLACK));
    layer.set_outline_thickness(GRID_THICKNESS);
    layer.add_line(Line {
        points: vec![
            (point(geometry.header_x, geometry.header_rule), false),
            (point(geometry.header_rule_end, geometry.header_rule), false),
        ],
        is_closed: false,
    });

    layer.use_text(
        page.footer_text(),
        geometry.footer_font_size,
        mm(geometry.header_x),
        mm(geometry.footer_baseline),
        &fonts.regular,
    );
}

fn paint_block(layer: &PdfLayerReference, fonts: &Fonts, block: &PlacedBlock) {
    for row in &block.rows {
        let (background, text_color, font) = match row.kind {
            RowKind::Title => (GREY, WHITE_SMOKE, &fonts.bold),
            RowKind::Column => (BEIGE, BLACK, &fonts.regular),
        };

        layer.set_fill_color(rgb(background));
        layer.add_polygon(Polygon {
            rings: vec![row_outline(block, row)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });

        layer.set_fill_color(rgb(text_color));
        let bold = row.kind == RowKind::Title;
        let center = block.left + block.width / 2.0;
        for (line, baseline) in row.lines.iter().zip(row.baselines()) {
            let x = center - layout::text_width(line, FONT_SIZE, bold) / 2.0;
            layer.use_text(line.as_str(), FONT_SIZE, mm(x), mm(baseline), font);
        }

        layer.set_outline_color(rgb(BLACK));
        layer.set_outline_thickness(GRID_THICKNESS);
        layer.add_line(Line {
            points: row_outline(block, row),
            is_closed: true,
        });
    }
}

fn row_outline(block: &PlacedBlock, row: &PlacedRow) -> Vec<(Point, bool)> {
    let left = block.left;
    let right = block.left + block.width;
    let top = row.top;
    let bottom = row.top - row.height;
    vec![
        (point(left, top), false),
        (point(right, top), false),
        (point(right, bottom), false),
        (point(left, bottom), false),
    ]
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn point(x: f32, y: f32) -> Point {
    Point::new(mm(x), mm(y))
}

/// Points to millimetres.
fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}
