use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The paid period and amounts a receipt acknowledges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPayment {
    /// 1-12
    pub month: u32,
    pub year: i32,
    pub rent_amount: f64,
    #[serde(default)]
    pub charges: f64,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

impl PeriodPayment {
    pub fn total(&self) -> f64 {
        self.rent_amount + self.charges
    }
}
