//! # Drawing Surface
//!
//! Receipts are painted through the [`Canvas`] trait rather than directly against the PDF
//! library, so the layout code can be exercised without producing a document.
//!
//! Coordinates are page points with the origin at the top-left corner, growing down, the
//! way template positions are authored. Text is anchored at the top of its line box.
//! [`PdfCanvas`] converts to the bottom-left origin and baselines PDF expects.
//!
//! - [`PdfCanvas`]: single-page PDF document built with `printpdf`, using the standard
//!   Helvetica family (regular, bold, oblique). No font file is embedded.
//! - [`RecordingCanvas`]: keeps every drawing operation in memory for inspection.

use crate::error::ReceiptError;
use common::model::section::FontStyle;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use printpdf::{
    BuiltinFont, Color as PdfColor, Image, ImageTransform, IndirectFontRef, Line, Mm,
    path::PaintMode, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};

/// Ratio between the cap-height-ish top of a Helvetica line box and its baseline.
const ASCENT_RATIO: f32 = 0.718;
const IMAGE_DPI: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Option<Color> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Color {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    fn to_pdf(self) -> PdfColor {
        PdfColor::Rgb(Rgb::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            None,
        ))
    }
}

/// An axis-aligned box in page points, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub trait Canvas {
    /// Page width and height in points.
    fn page_size(&self) -> (f32, f32);

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, font: FontStyle, color: Color);

    fn fill_rect(&mut self, area: Area, color: Color, opacity: f32);

    fn stroke_rect(&mut self, area: Area);

    /// Draws `image` stretched over `area`.
    fn image(&mut self, image: &DynamicImage, area: Area) -> Result<(), ReceiptError>;

    /// Approximate advance width of `text`.
    ///
    /// Builtin fonts carry no metrics here, so average Helvetica glyph widths are used.
    /// Only alignment depends on it.
    fn text_width(&self, text: &str, size: f32, font: FontStyle) -> f32 {
        let em = match font {
            FontStyle::Bold => 0.55,
            FontStyle::Normal | FontStyle::Italic => 0.5,
        };
        text.chars().count() as f32 * size * em
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// A single-page PDF under construction.
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    width: f32,
    height: f32,
}

impl PdfCanvas {
    pub fn new(title: &str, width: f32, height: f32) -> Result<Self, ReceiptError> {
        let (doc, page, layer) = PdfDocument::new(title, mm(width), mm(height), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let font = |builtin: BuiltinFont| {
            doc.add_builtin_font(builtin)
                .map_err(|e| ReceiptError::render("loading builtin fonts", e.to_string()))
        };
        let fonts = Fonts {
            regular: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            italic: font(BuiltinFont::HelveticaOblique)?,
        };

        Ok(Self {
            doc,
            layer,
            fonts,
            width,
            height,
        })
    }

    /// Serializes the document.
    pub fn finish(self) -> Result<Vec<u8>, ReceiptError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ReceiptError::render("serializing PDF", e.to_string()))
    }

    /// Bottom edge of `area` in PDF space.
    fn flip(&self, area: &Area) -> f32 {
        self.height - area.y - area.height
    }
}

impl Canvas for PdfCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, font: FontStyle, color: Color) {
        let baseline = self.height - y - size * ASCENT_RATIO;
        self.layer.set_fill_color(color.to_pdf());
        self.layer
            .use_text(text, size, mm(x), mm(baseline), self.fonts.get(font));
    }

    fn fill_rect(&mut self, area: Area, color: Color, _opacity: f32) {
        // printpdf has no per-shape alpha; backdrops are painted opaque.
        let bottom = self.flip(&area);
        self.layer.set_fill_color(color.to_pdf());
        let rect = Rect::new(
            mm(area.x),
            mm(bottom),
            mm(area.x + area.width),
            mm(bottom + area.height),
        )
        .with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    fn stroke_rect(&mut self, area: Area) {
        let bottom = self.flip(&area);
        let top = bottom + area.height;
        let right = area.x + area.width;
        let points = vec![
            (Point::new(mm(area.x), mm(bottom)), false),
            (Point::new(mm(right), mm(bottom)), false),
            (Point::new(mm(right), mm(top)), false),
            (Point::new(mm(area.x), mm(top)), false),
        ];
        self.layer.set_outline_color(Color::BLACK.to_pdf());
        self.layer.set_outline_thickness(1.0);
        self.layer.add_line(Line {
            points,
            is_closed: true,
        });
    }

    fn image(&mut self, image: &DynamicImage, area: Area) -> Result<(), ReceiptError> {
        let (px_width, px_height) = image.dimensions();
        if px_width == 0 || px_height == 0 {
            return Err(ReceiptError::render(
                "embedding image",
                "image has no pixels".to_string(),
            ));
        }

        // Flatten the alpha channel over white; PDF image streams are RGB only.
        let rgba = image.to_rgba8();
        let mut flattened = RgbaImage::from_pixel(px_width, px_height, Rgba([255, 255, 255, 255]));
        image::imageops::overlay(&mut flattened, &rgba, 0, 0);
        let rgb = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(flattened).to_rgb8());

        let bottom = self.flip(&area);
        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(mm(area.x)),
                translate_y: Some(mm(bottom)),
                scale_x: Some(area.width / px_width as f32),
                scale_y: Some(area.height / px_height as f32),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }
}

/// One operation captured by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        font: FontStyle,
        color: Color,
    },
    FillRect {
        area: Area,
        color: Color,
        opacity: f32,
    },
    StrokeRect {
        area: Area,
    },
    Image {
        area: Area,
    },
}

/// Canvas that only records what would have been drawn.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    width: f32,
    height: f32,
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// All text runs, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The first text run containing `needle`.
    pub fn find_text(&self, needle: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text.contains(needle)))
    }

    pub fn images(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, font: FontStyle, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size,
            font,
            color,
        });
    }

    fn fill_rect(&mut self, area: Area, color: Color, opacity: f32) {
        self.ops.push(DrawOp::FillRect {
            area,
            color,
            opacity,
        });
    }

    fn stroke_rect(&mut self, area: Area) {
        self.ops.push(DrawOp::StrokeRect { area });
    }

    fn image(&mut self, _image: &DynamicImage, area: Area) -> Result<(), ReceiptError> {
        self.ops.push(DrawOp::Image { area });
        Ok(())
    }
}
