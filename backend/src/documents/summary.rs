//! Email-ready summary of a generated receipt.
//!
//! Sending mail is left to an external mailer; this only assembles the subject, the plain
//! text and HTML bodies, the recipient and the attachment to send.

use crate::error::ReceiptError;
use askama::Template;
use common::model::receipt::Receipt;
use common::model::tenant::Tenant;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub receipt_id: i64,
    pub recipient: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachment_path: String,
    pub attachment_name: String,
}

struct DetailLine {
    label: &'static str,
    value: String,
}

#[derive(Template)]
#[template(path = "receipt_email.txt")]
struct TextBody<'a> {
    greeting: &'a str,
    lines: &'a [DetailLine],
}

/// Same content as [`TextBody`]; values are HTML-escaped by the template.
#[derive(Template)]
#[template(path = "receipt_email.html")]
struct HtmlBody<'a> {
    greeting: &'a str,
    lines: &'a [DetailLine],
}

fn euros(amount: f64) -> String {
    format!("{amount:.2} €")
}

impl ReceiptSummary {
    pub fn new(receipt: &Receipt, tenant: &Tenant) -> Result<Self, ReceiptError> {
        let period = format!("{}/{}", receipt.month, receipt.year);
        let full_name = format!("{} {}", tenant.first_name, tenant.last_name);
        let greeting = format!("Bonjour {} {},", tenant.honorific(), tenant.last_name);
        let total = receipt.amount + receipt.charges;

        let mut lines = vec![
            DetailLine { label: "Période", value: period.clone() },
            DetailLine { label: "Locataire", value: full_name.clone() },
            DetailLine { label: "Montant du loyer", value: euros(receipt.amount) },
        ];
        if receipt.charges > 0.0 {
            lines.push(DetailLine { label: "Charges", value: euros(receipt.charges) });
        }
        lines.push(DetailLine { label: "Total payé", value: euros(total) });

        let text = TextBody { greeting: &greeting, lines: &lines }
            .render()
            .map_err(|e| ReceiptError::render("email text body", e.to_string()))?;
        let html = HtmlBody { greeting: &greeting, lines: &lines }
            .render()
            .map_err(|e| ReceiptError::render("email HTML body", e.to_string()))?;

        let attachment_name = Path::new(&receipt.file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&receipt.file_name)
            .to_string();

        Ok(Self {
            receipt_id: receipt.id,
            recipient: tenant.email.clone(),
            subject: format!("Quittance de loyer - {period} - {full_name}"),
            text,
            html,
            attachment_path: receipt.file_path.clone(),
            attachment_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::tenant::Gender;

    fn receipt(charges: f64) -> Receipt {
        Receipt {
            id: 3,
            tenant_id: 1,
            template_id: Some(1),
            month: 8,
            year: 2024,
            amount: 500.0,
            charges,
            file_name: "2024_08_quittance_de_loyer_DUPONT_Jean.pdf".to_string(),
            file_path: "receipts/2024_08_quittance_de_loyer_DUPONT_Jean.pdf".to_string(),
            email_sent: false,
            email_sent_at: None,
            created_at: "2024-08-05 10:00:00".to_string(),
        }
    }

    fn tenant() -> Tenant {
        Tenant {
            id: 1,
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            gender: Gender::M,
            email: Some("jean.dupont@example.com".to_string()),
            apartment: None,
            address: None,
        }
    }

    #[test]
    fn summary_lists_amounts_with_two_decimals() {
        let summary = ReceiptSummary::new(&receipt(50.0), &tenant()).unwrap();
        assert_eq!(summary.subject, "Quittance de loyer - 8/2024 - Jean Dupont");
        assert!(summary.text.contains("Bonjour Monsieur Dupont,"));
        assert!(summary.text.contains("- Montant du loyer : 500.00 €"));
        assert!(summary.text.contains("- Charges : 50.00 €"));
        assert!(summary.text.contains("- Total payé : 550.00 €"));
        assert!(summary.html.contains("<strong>Total payé :</strong> 550.00 €"));
        assert_eq!(summary.recipient.as_deref(), Some("jean.dupont@example.com"));
        assert_eq!(
            summary.attachment_name,
            "2024_08_quittance_de_loyer_DUPONT_Jean.pdf"
        );
    }

    #[test]
    fn zero_charges_are_omitted() {
        let summary = ReceiptSummary::new(&receipt(0.0), &tenant()).unwrap();
        assert!(!summary.text.contains("Charges"));
        assert!(!summary.html.contains("Charges"));
    }

    #[test]
    fn html_escapes_names() {
        let mut renter = tenant();
        renter.last_name = "<Dupont>".to_string();
        let summary = ReceiptSummary::new(&receipt(0.0), &renter).unwrap();
        assert!(summary.html.contains("Bonjour Monsieur &lt;Dupont&gt;,"));
        assert!(summary.html.contains("Jean &lt;Dupont&gt;"));
        assert!(!summary.html.contains("<Dupont>"));
        assert!(summary.text.contains("Bonjour Monsieur <Dupont>,"));
    }
}
