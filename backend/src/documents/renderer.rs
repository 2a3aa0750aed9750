//! # Document Renderer
//!
//! Turns a [`TemplateConfiguration`] plus the landlord, tenant and payment facts into a
//! single-page PDF.
//!
//! ## Workflow
//!
//! 1.  **Facts**: [`DocumentRenderer::render`] checks that every fact was supplied by the caller
//!     (the renderer never looks anything up) and derives the rental period bounds.
//! 2.  **Canvas**: a fresh [`PdfCanvas`] is created per call, sized from the layout page size.
//!     Nothing is shared between concurrent renders.
//! 3.  **Painting**: the background (or border) first, then every section in fixed order.
//! 4.  **Output**: the bytes are returned together with the suggested file name. Writing to disk
//!     is a separate step, [`RenderedDocument::persist`], which writes to a temporary file in the
//!     target directory and links it into place so no partial receipt is ever left behind. An
//!     existing file is never replaced.

use crate::documents::canvas::{Canvas, PdfCanvas};
use crate::documents::sections::{paint_background, paint_sections, ReceiptFacts};
use crate::error::ReceiptError;
use chrono::{Local, NaiveDate};
use common::model::configuration::TemplateConfiguration;
use common::model::landlord::Landlord;
use common::model::payment::PeriodPayment;
use common::model::tenant::Tenant;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Inputs of a single render. Facts are optional so that a caller forgetting one gets a typed
/// [`ReceiptError::MissingRequiredFact`] instead of a panic further down.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub configuration: &'a TemplateConfiguration,
    pub landlord: Option<&'a Landlord>,
    pub tenant: Option<&'a Tenant>,
    pub payment: Option<&'a PeriodPayment>,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl RenderedDocument {
    /// Writes the document into `dir` under its file name and returns the final path.
    ///
    /// Fails with a render failure for which [`ReceiptError::is_existing_file`] holds when a file
    /// of that name is already in `dir`.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, ReceiptError> {
        fs::create_dir_all(dir)
            .map_err(|e| ReceiptError::render(format!("creating {}", dir.display()), e))?;
        let target = dir.join(&self.file_name);

        let mut staged = NamedTempFile::new_in(dir)
            .map_err(|e| ReceiptError::render("creating temporary receipt file", e))?;
        staged
            .write_all(&self.bytes)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| ReceiptError::render("writing receipt", e))?;
        // On failure the staged file is removed when the error is dropped.
        staged
            .persist_noclobber(&target)
            .map_err(|e| ReceiptError::render(format!("moving receipt to {}", target.display()), e.error))?;

        Ok(target)
    }
}

/// `{year}_{MM}_quittance_de_loyer_{LASTNAME}_{Firstname}.pdf`
pub fn receipt_file_name(tenant: &Tenant, payment: &PeriodPayment) -> String {
    let clean = |part: &str| {
        part.trim()
            .chars()
            .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
            .collect::<String>()
    };
    format!(
        "{}_{:02}_quittance_de_loyer_{}_{}.pdf",
        payment.year,
        payment.month,
        clean(&tenant.last_name.to_uppercase()),
        clean(&tenant.first_name)
    )
}

#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    issued_on: Option<NaiveDate>,
}

impl DocumentRenderer {
    /// Receipts are dated on the day they are rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Receipts are dated `date`, whatever the clock says.
    pub fn issued_on(date: NaiveDate) -> Self {
        Self {
            issued_on: Some(date),
        }
    }

    fn issue_date(&self) -> NaiveDate {
        self.issued_on
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn facts<'a>(&self, input: &RenderInput<'a>) -> Result<ReceiptFacts<'a>, ReceiptError> {
        let landlord = input
            .landlord
            .ok_or(ReceiptError::MissingRequiredFact("landlord"))?;
        let tenant = input
            .tenant
            .ok_or(ReceiptError::MissingRequiredFact("tenant"))?;
        let payment = input
            .payment
            .ok_or(ReceiptError::MissingRequiredFact("payment"))?;
        ReceiptFacts::new(landlord, tenant, payment, self.issue_date())
    }

    /// Paints the receipt onto an existing canvas.
    pub fn paint(&self, canvas: &mut dyn Canvas, input: &RenderInput<'_>) -> Result<(), ReceiptError> {
        let facts = self.facts(input)?;
        paint_background(canvas, &input.configuration.layout);
        paint_sections(canvas, input.configuration, &facts);
        Ok(())
    }

    pub fn render(&self, input: &RenderInput<'_>) -> Result<RenderedDocument, ReceiptError> {
        let facts = self.facts(input)?;
        let file_name = receipt_file_name(facts.tenant, facts.payment);
        let (width, height) = input.configuration.page_dimensions();

        let mut canvas = PdfCanvas::new("Quittance de loyer", width, height)?;
        paint_background(&mut canvas, &input.configuration.layout);
        paint_sections(&mut canvas, input.configuration, &facts);
        let bytes = canvas.finish()?;

        log::debug!("rendered {file_name} ({} bytes)", bytes.len());
        Ok(RenderedDocument { bytes, file_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::tenant::Gender;

    fn tenant() -> Tenant {
        Tenant {
            id: 7,
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            gender: Gender::M,
            email: None,
            apartment: None,
            address: None,
        }
    }

    fn payment() -> PeriodPayment {
        PeriodPayment {
            month: 8,
            year: 2024,
            rent_amount: 500.0,
            charges: 50.0,
            payment_date: None,
        }
    }

    #[test]
    fn file_name_uses_upper_last_name() {
        assert_eq!(
            receipt_file_name(&tenant(), &payment()),
            "2024_08_quittance_de_loyer_DUPONT_Jean.pdf"
        );
    }

    #[test]
    fn file_name_never_escapes_the_directory() {
        let mut renter = tenant();
        renter.last_name = "../etc".to_string();
        let name = receipt_file_name(&renter, &payment());
        assert!(!name.contains('/'));
    }

    #[test]
    fn each_missing_fact_is_reported() {
        let config = TemplateConfiguration::standard();
        let (renter, paid) = (tenant(), payment());
        let input = RenderInput {
            configuration: &config,
            landlord: None,
            tenant: Some(&renter),
            payment: Some(&paid),
        };
        let err = DocumentRenderer::new().render(&input).unwrap_err();
        assert!(matches!(err, ReceiptError::MissingRequiredFact("landlord")));
        assert_eq!(err.kind(), "missing_required_fact");
    }

    #[test]
    fn persist_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let document = RenderedDocument {
            bytes: b"%PDF-1.3 test".to_vec(),
            file_name: "2024_08_quittance_de_loyer_DUPONT_Jean.pdf".to_string(),
        };
        let path = document.persist(dir.path()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), document.bytes);
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn persist_never_replaces_an_existing_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let name = "2024_08_quittance_de_loyer_DUPONT_Jean.pdf";
        fs::write(dir.path().join(name), b"first").unwrap();
        let document = RenderedDocument {
            bytes: b"%PDF-1.3 second".to_vec(),
            file_name: name.to_string(),
        };

        let err = document.persist(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "render_failure");
        assert!(err.is_existing_file());
        assert_eq!(fs::read(dir.path().join(name)).unwrap(), b"first");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unusable_directory_is_a_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("quittances");
        fs::write(&blocker, b"not a directory").unwrap();
        let document = RenderedDocument {
            bytes: b"%PDF-1.3 test".to_vec(),
            file_name: "2024_08_quittance_de_loyer_DUPONT_Jean.pdf".to_string(),
        };

        let err = document.persist(&blocker.join("1")).unwrap_err();
        assert_eq!(err.kind(), "render_failure");
        assert!(!err.is_existing_file());
    }
}
