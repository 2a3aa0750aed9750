//! # Receipt Sections
//!
//! Each [`SectionKey`] maps to one [`Painter`], a plain function that lays out the lines of
//! its section relative to the section anchor. The [`Pen`] it receives carries the resolved
//! style and takes care of alignment, colour and the optional white backdrop, so painters only
//! decide *what* goes where.
//!
//! ## Workflow
//!
//! 1.  [`paint_background`] draws the template background full-page, or a border inset from
//!     the page edges when there is no usable background.
//! 2.  [`paint_sections`] walks [`SectionKey::ALL`] in order, resolves each style (explicit or
//!     hard default) and runs the section painter. Later sections paint over earlier ones.
//!
//! Missing or undecodable assets never fail the document: they are logged and the section
//! degrades to its text rendering.

use crate::documents::canvas::{Area, Canvas, Color};
use crate::documents::dates::{format_french_date, period_bounds};
use crate::documents::wordify::wordify;
use crate::error::ReceiptError;
use chrono::NaiveDate;
use common::model::configuration::{BackgroundMode, Layout, TemplateConfiguration};
use common::model::landlord::Landlord;
use common::model::payment::PeriodPayment;
use common::model::section::{Align, FontStyle, SectionKey, SectionStyle, DEFAULT_HEADER_TITLE};
use common::model::tenant::Tenant;
use image::DynamicImage;
use log::{debug, warn};
use std::path::Path;

/// Spacing between stacked lines when the style sets no `lineHeight`.
pub const LINE_HEIGHT: f32 = 15.0;
pub const SIGNATURE_WIDTH: f32 = 150.0;
pub const SIGNATURE_HEIGHT: f32 = 40.0;
const BORDER_INSET: f32 = 30.0;
const BACKDROP_PADDING: f32 = 5.0;
const VALUE_COLUMN: f32 = 130.0;

/// Everything a receipt states, resolved before painting starts.
#[derive(Debug, Clone)]
pub struct ReceiptFacts<'a> {
    pub landlord: &'a Landlord,
    pub tenant: &'a Tenant,
    pub payment: &'a PeriodPayment,
    /// Date the receipt is drawn up.
    pub issued_on: NaiveDate,
    period_from: String,
    period_to: String,
}

impl<'a> ReceiptFacts<'a> {
    pub fn new(
        landlord: &'a Landlord,
        tenant: &'a Tenant,
        payment: &'a PeriodPayment,
        issued_on: NaiveDate,
    ) -> Result<Self, ReceiptError> {
        let (period_from, period_to) = period_bounds(payment.month, payment.year).ok_or_else(|| {
            ReceiptError::Validation(format!("month must be between 1 and 12, got {}", payment.month))
        })?;
        Ok(Self {
            landlord,
            tenant,
            payment,
            issued_on,
            period_from,
            period_to,
        })
    }

    pub fn total(&self) -> f64 {
        self.payment.total()
    }

    /// Falls back to the issue date when the payment has none.
    pub fn payment_date(&self) -> NaiveDate {
        self.payment.payment_date.unwrap_or(self.issued_on)
    }

    pub fn period_from(&self) -> &str {
        &self.period_from
    }

    pub fn period_to(&self) -> &str {
        &self.period_to
    }
}

/// Integral amounts are printed without decimals, others in their shortest form.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}

/// One line of a section, offset from the section anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub dx: f32,
    pub dy: f32,
    pub text: String,
    /// `None` keeps the section font style.
    pub font: Option<FontStyle>,
}

impl TextLine {
    pub fn at(dy: f32, text: impl Into<String>) -> Self {
        Self {
            dx: 0.0,
            dy,
            text: text.into(),
            font: None,
        }
    }

    pub fn shifted(mut self, dx: f32) -> Self {
        self.dx = dx;
        self
    }

    pub fn bold(mut self) -> Self {
        self.font = Some(FontStyle::Bold);
        self
    }

    pub fn italic(mut self) -> Self {
        self.font = Some(FontStyle::Italic);
        self
    }
}

/// Draws the lines of one section with its resolved style.
pub struct Pen<'c> {
    canvas: &'c mut dyn Canvas,
    style: SectionStyle,
    margin: f32,
}

impl<'c> Pen<'c> {
    pub fn new(canvas: &'c mut dyn Canvas, style: SectionStyle, margin: f32) -> Self {
        Self {
            canvas,
            style,
            margin,
        }
    }

    pub fn style(&self) -> &SectionStyle {
        &self.style
    }

    pub fn line_height(&self) -> f32 {
        self.style.line_height.unwrap_or(LINE_HEIGHT)
    }

    fn color(&self) -> Color {
        match self.style.color.as_deref() {
            Some(hex) => Color::from_hex(hex).unwrap_or_else(|| {
                debug!("ignoring unparseable colour {hex:?}");
                Color::BLACK
            }),
            None => Color::BLACK,
        }
    }

    /// Left edge of a line of `width` starting at `x`.
    ///
    /// Centred and right-aligned text use the span from `x` to the right page margin.
    fn aligned_x(&self, x: f32, width: f32) -> f32 {
        let (page_width, _) = self.canvas.page_size();
        let right = (page_width - self.margin).max(x);
        match self.style.align {
            Align::Left => x,
            Align::Center => x + ((right - x - width) / 2.0).max(0.0),
            Align::Right => (right - width).max(x),
        }
    }

    pub fn write(&mut self, lines: &[TextLine]) {
        let size = self.style.font_size;
        let color = self.color();
        let origin = self.style.position;

        let placed: Vec<(f32, f32, f32, FontStyle, &str)> = lines
            .iter()
            .filter(|line| !line.text.is_empty())
            .map(|line| {
                let font = line.font.unwrap_or(self.style.font_style);
                let width = self.canvas.text_width(&line.text, size, font);
                let x = self.aligned_x(origin.x + line.dx, width);
                (x, origin.y + line.dy, width, font, line.text.as_str())
            })
            .collect();

        if let Some(backdrop) = self.style.backdrop {
            if let Some(area) = bounding_area(&placed, size) {
                self.canvas.fill_rect(area, Color::WHITE, backdrop.opacity);
            }
        }

        for (x, y, _, font, text) in placed {
            self.canvas.text(text, x, y, size, font, color);
        }
    }

    /// Embeds `image` at the section anchor.
    pub fn image(&mut self, image: &DynamicImage, width: f32, height: f32) -> Result<(), ReceiptError> {
        let area = Area {
            x: self.style.position.x,
            y: self.style.position.y,
            width,
            height,
        };
        self.canvas.image(image, area)
    }
}

fn bounding_area(placed: &[(f32, f32, f32, FontStyle, &str)], size: f32) -> Option<Area> {
    let first = placed.first()?;
    let (mut left, mut top, mut right, mut bottom) = (first.0, first.1, first.0 + first.2, first.1 + size);
    for &(x, y, width, _, _) in placed {
        left = left.min(x);
        top = top.min(y);
        right = right.max(x + width);
        bottom = bottom.max(y + size);
    }
    Some(Area {
        x: left - BACKDROP_PADDING,
        y: top - BACKDROP_PADDING,
        width: right - left + 2.0 * BACKDROP_PADDING,
        height: bottom - top + 2.0 * BACKDROP_PADDING,
    })
}

pub type Painter = fn(&mut Pen<'_>, &ReceiptFacts<'_>);

pub fn painter(key: SectionKey) -> Painter {
    match key {
        SectionKey::Header => header,
        SectionKey::LandlordInfo => landlord_info,
        SectionKey::TenantInfo => tenant_info,
        SectionKey::PropertyAddress => property_address,
        SectionKey::MainText => main_text,
        SectionKey::PaymentDetails => payment_details,
        SectionKey::Signature => signature,
        SectionKey::Footer => footer,
    }
}

fn header(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    let title = pen
        .style()
        .title
        .clone()
        .unwrap_or_else(|| DEFAULT_HEADER_TITLE.to_string());
    let text = format!(
        "{title} du mois de {:02}/{}",
        facts.payment.month, facts.payment.year
    );
    pen.write(&[TextLine::at(0.0, text)]);
}

fn landlord_info(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    let lh = pen.line_height();
    let owner = facts.landlord;
    pen.write(&[
        TextLine::at(0.0, owner.name.as_str()),
        TextLine::at(lh, owner.address_line1.as_str()),
        TextLine::at(2.0 * lh, owner.address_line2.clone().unwrap_or_default()),
    ]);
}

fn tenant_info(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    let lh = pen.line_height();
    let tenant = facts.tenant;
    pen.write(&[
        TextLine::at(
            0.0,
            format!("{} {} {}", tenant.honorific(), tenant.first_name, tenant.last_name),
        ),
        TextLine::at(lh, tenant.resolved_address()),
        // One blank line after the address; 45pt at the default line height.
        TextLine::at(
            3.0 * lh,
            format!(
                "Fait à {}, le {}",
                facts.landlord.city(),
                format_french_date(facts.issued_on)
            ),
        ),
    ]);
}

fn property_address(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    let text = format!("Adresse de la location : {}", facts.tenant.resolved_address());
    pen.write(&[TextLine::at(0.0, text)]);
}

fn main_text(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    let lh = pen.line_height();
    let tenant = facts.tenant;
    let total = facts.total();
    pen.write(&[
        TextLine::at(
            0.0,
            format!(
                "Je soussigné {} propriétaire du logement désigné ci-dessus, déclare avoir",
                facts.landlord.name
            ),
        ),
        TextLine::at(
            lh,
            format!(
                "reçu de {} {} {}, la somme de {} euros ({}), au titre",
                tenant.honorific(),
                tenant.first_name,
                tenant.last_name.to_uppercase(),
                format_amount(total),
                wordify(total)
            ),
        ),
        TextLine::at(
            2.0 * lh,
            format!(
                "du paiement du loyer et des charges pour la période de location du {} au {}",
                facts.period_from(),
                facts.period_to()
            ),
        ),
        TextLine::at(
            3.0 * lh,
            "et lui en donne quittance, sous réserve de tous mes droits.",
        ),
    ]);
}

fn payment_details(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    let payment = facts.payment;
    let euros = |amount: f64| format!("{} euros", format_amount(amount));
    pen.write(&[
        TextLine::at(0.0, "Détail du règlement :").bold(),
        TextLine::at(25.0, "Loyer :"),
        TextLine::at(25.0, euros(payment.rent_amount)).shifted(VALUE_COLUMN),
        TextLine::at(45.0, "Pour charges :"),
        TextLine::at(45.0, euros(payment.charges)).shifted(VALUE_COLUMN),
        TextLine::at(
            65.0,
            "(le cas échéant, contribution aux économies d'énergies) : ....... euros",
        ),
        TextLine::at(90.0, "Total :").bold(),
        TextLine::at(90.0, euros(facts.total()))
            .shifted(VALUE_COLUMN)
            .bold(),
        TextLine::at(
            115.0,
            format!(
                "Date du paiement : le {}",
                format_french_date(facts.payment_date())
            ),
        ),
    ]);
}

fn signature(pen: &mut Pen<'_>, facts: &ReceiptFacts<'_>) {
    if let Some(image) = signature_image(facts.landlord) {
        match pen.image(&image, SIGNATURE_WIDTH, SIGNATURE_HEIGHT) {
            Ok(()) => return,
            Err(e) => warn!("Could not embed signature image, writing the signature text: {e}"),
        }
    }
    let label = facts.landlord.signature_label().to_string();
    pen.write(&[TextLine::at(10.0, label).italic()]);
}

fn signature_image(landlord: &Landlord) -> Option<DynamicImage> {
    let path = landlord.signature_image_path.as_deref()?;
    load_asset(Path::new(path), "signature")
}

fn footer(pen: &mut Pen<'_>, _facts: &ReceiptFacts<'_>) {
    let lh = pen.line_height();
    pen.write(&[
        TextLine::at(0.0, "(En bas de page) Cette quittance annule tous les reçus qui auraient pu être établis précédemment en cas de"),
        TextLine::at(lh, "paiement partiel du montant du présent terme. Elle est à conserver pendant trois ans par le locataire (loi n° 89-"),
        TextLine::at(2.0 * lh, "462 du 6 juillet 1989 : art. 7-1)."),
        TextLine::at(70.0, "Texte de référence :").bold(),
        TextLine::at(85.0, "- loi du 6.7.89 : art. 21"),
    ]);
}

/// Opens an image asset, logging why it cannot be used.
fn load_asset(path: &Path, what: &str) -> Option<DynamicImage> {
    if !path.exists() {
        warn!("{what} asset {} does not exist", path.display());
        return None;
    }
    match image::open(path) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("{what} asset {} cannot be decoded: {e}", path.display());
            None
        }
    }
}

fn background_image(layout: &Layout) -> Option<DynamicImage> {
    if layout.background_mode == BackgroundMode::None {
        return None;
    }
    let path = Path::new(layout.background_asset.as_deref()?);
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if layout.background_mode == BackgroundMode::Pdf || is_pdf {
        warn!(
            "PDF background {} cannot be composited, drawing the page border instead",
            path.display()
        );
        return None;
    }
    load_asset(path, "background")
}

/// Paints the template background, or the inset border when there is none to paint.
pub fn paint_background(canvas: &mut dyn Canvas, layout: &Layout) {
    let (width, height) = canvas.page_size();
    if let Some(image) = background_image(layout) {
        let page = Area {
            x: 0.0,
            y: 0.0,
            width,
            height,
        };
        match canvas.image(&image, page) {
            Ok(()) => return,
            Err(e) => warn!("Could not embed background image, drawing the page border: {e}"),
        }
    }
    canvas.stroke_rect(Area {
        x: BORDER_INSET,
        y: BORDER_INSET,
        width: width - 2.0 * BORDER_INSET,
        height: height - 2.0 * BORDER_INSET,
    });
}

/// Paints every section in order, using hard defaults for sections the configuration omits.
pub fn paint_sections(
    canvas: &mut dyn Canvas,
    config: &TemplateConfiguration,
    facts: &ReceiptFacts<'_>,
) {
    for key in SectionKey::ALL {
        let style = config.resolve(key);
        debug!(
            "painting {key} at ({}, {})",
            style.position.x, style.position.y
        );
        let mut pen = Pen::new(canvas, style, config.layout.margin);
        painter(key)(&mut pen, facts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::canvas::{DrawOp, RecordingCanvas};
    use common::model::section::Backdrop;
    use common::model::tenant::Gender;

    fn landlord() -> Landlord {
        Landlord {
            name: "Marie Martin".to_string(),
            address_line1: "8 rue des Lilas".to_string(),
            address_line2: Some("75011 Paris".to_string()),
            signature_text: None,
            signature_image_path: None,
        }
    }

    fn tenant() -> Tenant {
        Tenant {
            id: 1,
            first_name: "Claire".to_string(),
            last_name: "Petit".to_string(),
            gender: Gender::F,
            email: None,
            apartment: None,
            address: Some("2 place du Marché, Lyon 69002".to_string()),
        }
    }

    fn payment() -> PeriodPayment {
        PeriodPayment {
            month: 1,
            year: 2025,
            rent_amount: 720.5,
            charges: 0.0,
            payment_date: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    #[test]
    fn amounts_drop_trailing_zero_decimals() {
        assert_eq!(format_amount(550.0), "550");
        assert_eq!(format_amount(720.5), "720.5");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn facts_reject_invalid_month() {
        let (owner, renter) = (landlord(), tenant());
        let mut paid = payment();
        paid.month = 13;
        let err = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn payment_date_defaults_to_issue_date() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        assert_eq!(facts.payment_date(), today());
        assert_eq!(facts.period_from(), "31/12/2024");
        assert_eq!(facts.period_to(), "30/01/2025");
    }

    #[test]
    fn tenant_block_uses_honorific_and_landlord_city() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        let style = SectionKey::TenantInfo.default_style();
        painter(SectionKey::TenantInfo)(&mut Pen::new(&mut canvas, style, 50.0), &facts);

        assert_eq!(
            canvas.texts(),
            vec![
                "Madame Claire Petit",
                "2 place du Marché, Lyon 69002",
                "Fait à Paris, le 20/01/2025",
            ]
        );
        match canvas.find_text("Fait à") {
            Some(DrawOp::Text { y, .. }) => assert_eq!(*y, 175.0 + 45.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn place_and_date_follow_the_line_height() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        let mut style = SectionKey::TenantInfo.default_style();
        style.line_height = Some(20.0);
        painter(SectionKey::TenantInfo)(&mut Pen::new(&mut canvas, style, 50.0), &facts);

        match canvas.find_text("Fait à") {
            Some(DrawOp::Text { y, .. }) => assert_eq!(*y, 175.0 + 60.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn line_height_spreads_stacked_lines() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        let mut style = SectionKey::LandlordInfo.default_style();
        style.line_height = Some(20.0);
        painter(SectionKey::LandlordInfo)(&mut Pen::new(&mut canvas, style, 50.0), &facts);

        let ys: Vec<f32> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![130.0, 150.0, 170.0]);
    }

    #[test]
    fn backdrop_is_painted_before_text() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        let mut style = SectionKey::PropertyAddress.default_style();
        style.backdrop = Some(Backdrop { opacity: 0.8 });
        painter(SectionKey::PropertyAddress)(&mut Pen::new(&mut canvas, style, 50.0), &facts);

        match &canvas.ops[..] {
            [DrawOp::FillRect { area, color, opacity }, DrawOp::Text { font, .. }] => {
                assert_eq!(*color, Color::WHITE);
                assert_eq!(*opacity, 0.8);
                assert_eq!(area.x, 65.0);
                assert_eq!(area.y, 235.0);
                assert_eq!(*font, FontStyle::Bold);
            }
            ops => panic!("unexpected ops {ops:?}"),
        }
    }

    #[test]
    fn centred_header_stays_inside_margins() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        painter(SectionKey::Header)(
            &mut Pen::new(&mut canvas, SectionKey::Header.default_style(), 50.0),
            &facts,
        );
        match canvas.find_text("Quittance de loyer du mois de 01/2025") {
            Some(DrawOp::Text { x, size, font, .. }) => {
                assert!(*x > 50.0);
                assert!(*x < 595.28 - 50.0);
                assert_eq!(*size, 18.0);
                assert_eq!(*font, FontStyle::Bold);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn colour_applies_to_every_line() {
        let (owner, renter, paid) = (landlord(), tenant(), payment());
        let facts = ReceiptFacts::new(&owner, &renter, &paid, today()).unwrap();
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        let mut style = SectionKey::Footer.default_style();
        style.color = Some("#666666".to_string());
        painter(SectionKey::Footer)(&mut Pen::new(&mut canvas, style, 50.0), &facts);

        let grey = Color { r: 0x66, g: 0x66, b: 0x66 };
        assert_eq!(canvas.texts().len(), 5);
        assert!(canvas
            .ops
            .iter()
            .all(|op| matches!(op, DrawOp::Text { color, .. } if *color == grey)));
    }

    #[test]
    fn missing_background_draws_border() {
        let mut canvas = RecordingCanvas::new(595.28, 841.89);
        let layout = Layout {
            background_mode: BackgroundMode::Image,
            background_asset: Some("/nonexistent/background.png".to_string()),
            ..Layout::default()
        };
        paint_background(&mut canvas, &layout);
        match &canvas.ops[..] {
            [DrawOp::StrokeRect { area }] => {
                assert_eq!(area.x, 30.0);
                assert_eq!(area.y, 30.0);
                assert!((area.width - 535.28).abs() < 1e-3);
            }
            ops => panic!("unexpected ops {ops:?}"),
        }
    }
}
