//! PDF report assembly with printpdf

use anyhow::{Context, Result};
use printpdf::image_crate::{self, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const IMAGE_WIDTH_MM: f32 = 180.0;
const FONT_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 16.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const MM_PER_INCH: f32 = 25.4;

/// One line of report text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Heading(String),
    Text(String),
    Blank,
}

/// Text and images for one report document
#[derive(Debug, Clone)]
pub struct ReportDocument<'a> {
    pub title: &'a str,
    pub lines: Vec<ReportLine>,
    /// Images embedded after the text, read back from disk
    pub images: Vec<&'a Path>,
}

/// Tracks the write position, starting new pages as content runs out of room
struct PageCursor<'d> {
    doc: &'d PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'d> PageCursor<'d> {
    fn new(doc: &'d PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        }
    }

    /// Make sure `height` millimetres fit below the cursor
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN_MM {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn text(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.reserve(LINE_HEIGHT_MM);
        self.y -= LINE_HEIGHT_MM;
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
    }

    fn image(&mut self, path: &Path) -> Result<()> {
        let decoded = image_crate::open(path)
            .with_context(|| format!("failed to read chart {}", path.display()))?;
        let (width_px, height_px) = decoded.dimensions();

        // Scale so the image spans IMAGE_WIDTH_MM
        let dpi = width_px as f32 * MM_PER_INCH / IMAGE_WIDTH_MM;
        let height_mm = height_px as f32 * MM_PER_INCH / dpi;

        self.reserve(height_mm);
        self.y -= height_mm;

        Image::from_dynamic_image(&decoded).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y -= LINE_HEIGHT_MM;
        Ok(())
    }
}

/// Write the report document to `path`.
pub fn write_report(path: &Path, report: &ReportDocument<'_>) -> Result<()> {
    let (doc, page, layer) = PdfDocument::new(
        report.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Page 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("failed to add font: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("failed to add font: {e}"))?;

    {
        let mut cursor = PageCursor::new(&doc, doc.get_page(page).get_layer(layer));

        for line in &report.lines {
            match line {
                ReportLine::Heading(text) => cursor.text(text, HEADING_SIZE, &bold),
                ReportLine::Text(text) => cursor.text(text, FONT_SIZE, &regular),
                ReportLine::Blank => {
                    cursor.reserve(LINE_HEIGHT_MM);
                    cursor.y -= LINE_HEIGHT_MM / 2.0;
                }
            }
        }

        for image in &report.images {
            cursor.image(image)?;
        }
    }

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow::anyhow!("failed to write PDF {}: {e}", path.display()))?;
    Ok(())
}
