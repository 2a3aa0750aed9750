//! # Receipt Generation Service
//!
//! `POST /api/receipts` renders and records the receipt of one tenant for one month.
//!
//! ## Workflow
//!
//! 1.  **Validation**: every field problem is reported at once as a validation error.
//! 2.  **Duplicate check**: a receipt already recorded for the tenant and period fails with
//!     [`ReceiptError::DuplicatePeriod`] before anything is rendered or written.
//! 3.  **Facts**: the tenant, the owner and the template (the requested one, else the default)
//!     are loaded. The template's background upload, if any, overrides its layout background.
//! 4.  **Rendering**: the document is rendered and moved into the tenant's own directory under
//!     the receipts directory in one step, so a failure never leaves a partial file. Two tenants
//!     with the same name never share a path, and an existing file is never replaced.
//! 5.  **Record**: the receipt row is inserted with the template used. If the insert fails, the
//!     written file is removed again. Losing a race against a concurrent identical request still
//!     ends in `DuplicatePeriod`, and the winner's file is kept.

use crate::documents::{DocumentRenderer, RenderInput};
use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_web::{web, HttpResponse};
use common::model::payment::PeriodPayment;
use common::model::receipt::{NewReceipt, Receipt};
use common::requests::GenerateReceiptRequest;
use log::{info, warn};
use std::path::Path;

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<GenerateReceiptRequest>,
) -> Result<HttpResponse, ReceiptError> {
    let request = payload.into_inner();
    let state = state.get_ref().clone();
    let receipt =
        run_blocking(move || generate_receipt(&state, &request, &DocumentRenderer::new())).await?;
    Ok(HttpResponse::Created().json(receipt))
}

/// A request whose fields have all been checked.
#[derive(Debug, Clone, PartialEq)]
struct ValidRequest {
    tenant_id: i64,
    template_id: Option<i64>,
    payment: PeriodPayment,
}

fn validate(request: &GenerateReceiptRequest) -> Result<ValidRequest, ReceiptError> {
    let mut problems = Vec::new();

    let tenant_id = request.tenant_id.filter(|id| *id > 0);
    if tenant_id.is_none() {
        problems.push("tenantId is required");
    }
    let month = request.month.filter(|m| (1..=12).contains(m));
    if month.is_none() {
        problems.push("month must be between 1 and 12");
    }
    let year = request.year.filter(|y| (1900..=9999).contains(y));
    if year.is_none() {
        problems.push("year must be between 1900 and 9999");
    }
    let amount = request.amount.filter(|a| a.is_finite() && *a > 0.0);
    if amount.is_none() {
        problems.push("amount must be a positive number");
    }
    let charges = request.charges.unwrap_or(0.0);
    if !charges.is_finite() || charges < 0.0 {
        problems.push("charges must not be negative");
    }

    match (tenant_id, month, year, amount) {
        (Some(tenant_id), Some(month), Some(year), Some(rent_amount)) if problems.is_empty() => {
            Ok(ValidRequest {
                tenant_id,
                template_id: request.template_id,
                payment: PeriodPayment {
                    month,
                    year,
                    rent_amount,
                    charges,
                    payment_date: request.payment_date,
                },
            })
        }
        _ => Err(ReceiptError::Validation(problems.join("; "))),
    }
}

/// Renders, writes and records a receipt. Blocking.
pub fn generate_receipt(
    state: &AppState,
    request: &GenerateReceiptRequest,
    renderer: &DocumentRenderer,
) -> Result<Receipt, ReceiptError> {
    let valid = validate(request)?;
    let payment = &valid.payment;
    let duplicate = || ReceiptError::DuplicatePeriod {
        tenant_id: valid.tenant_id,
        month: payment.month,
        year: payment.year,
    };

    if state
        .records
        .receipt_exists(valid.tenant_id, payment.month, payment.year)?
    {
        return Err(duplicate());
    }

    let tenant = state.records.tenant_by_id(valid.tenant_id)?;
    let landlord = state.records.landlord()?;
    let template = match valid.template_id {
        Some(id) => state.templates.find_by_id(id)?,
        None => state.templates.find_default()?,
    };
    let configuration = template.effective_configuration();

    let document = renderer.render(&RenderInput {
        configuration: &configuration,
        landlord: Some(&landlord),
        tenant: Some(&tenant),
        payment: Some(payment),
    })?;

    // A concurrent request may have written and recorded the same file meanwhile.
    if state
        .records
        .receipt_exists(valid.tenant_id, payment.month, payment.year)?
    {
        return Err(duplicate());
    }
    let path = match document.persist(&state.receipts_dir.join(tenant.id.to_string())) {
        Ok(path) => path,
        // Same tenant and period: a concurrent request got there first.
        Err(e) if e.is_existing_file() => return Err(duplicate()),
        Err(e) => return Err(e),
    };

    let saved = state.records.save_receipt(&NewReceipt {
        tenant_id: tenant.id,
        template_id: Some(template.id),
        month: payment.month,
        year: payment.year,
        amount: payment.rent_amount,
        charges: payment.charges,
        file_name: document.file_name.clone(),
        file_path: path.to_string_lossy().into_owned(),
    });
    let receipt = match saved {
        Ok(receipt) => receipt,
        Err(e @ ReceiptError::DuplicatePeriod { .. }) => return Err(e),
        Err(e) => {
            discard_file(&path);
            return Err(e);
        }
    };

    info!(
        "Generated receipt #{} for tenant #{} ({:02}/{}) with template #{}",
        receipt.id, receipt.tenant_id, receipt.month, receipt.year, template.id
    );
    Ok(receipt)
}

fn discard_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Could not remove unrecorded receipt {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateReceiptRequest {
        GenerateReceiptRequest {
            tenant_id: Some(1),
            month: Some(8),
            year: Some(2024),
            amount: Some(500.0),
            charges: Some(50.0),
            payment_date: None,
            template_id: None,
        }
    }

    #[test]
    fn valid_request_becomes_a_payment() {
        let valid = validate(&request()).unwrap();
        assert_eq!(valid.tenant_id, 1);
        assert_eq!(valid.payment.total(), 550.0);
    }

    #[test]
    fn missing_charges_are_zero() {
        let valid = validate(&GenerateReceiptRequest {
            charges: None,
            ..request()
        })
        .unwrap();
        assert_eq!(valid.payment.charges, 0.0);
    }

    #[test]
    fn every_problem_is_reported() {
        let err = validate(&GenerateReceiptRequest {
            tenant_id: None,
            month: Some(13),
            amount: Some(-1.0),
            ..request()
        })
        .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        let message = err.to_string();
        assert!(message.contains("tenantId"));
        assert!(message.contains("month"));
        assert!(message.contains("amount"));
        assert!(!message.contains("year"));
    }

    #[test]
    fn negative_charges_are_rejected() {
        let err = validate(&GenerateReceiptRequest {
            charges: Some(-5.0),
            ..request()
        })
        .unwrap_err();
        assert!(err.to_string().contains("charges"));
    }
}
