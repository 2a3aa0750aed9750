use serde::{Deserialize, Serialize};

/// A generated receipt. Immutable apart from the email delivery fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: i64,
    pub tenant_id: i64,
    pub template_id: Option<i64>,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    pub charges: f64,
    pub file_name: String,
    pub file_path: String,
    pub email_sent: bool,
    pub email_sent_at: Option<String>,
    pub created_at: String,
}

/// Fields recorded once a receipt document has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReceipt {
    pub tenant_id: i64,
    pub template_id: Option<i64>,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    pub charges: f64,
    pub file_name: String,
    pub file_path: String,
}
