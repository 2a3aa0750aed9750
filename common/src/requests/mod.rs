use chrono::NaiveDate;
use serde::Deserialize;

/// Request payload for `POST /api/receipts`.
///
/// Every field is optional on the wire so that missing business fields are
/// reported as a validation failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReceiptRequest {
    pub tenant_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub charges: Option<f64>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Explicit template; the default template is used when absent.
    #[serde(default)]
    pub template_id: Option<i64>,
}
