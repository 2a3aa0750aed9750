use serde::{Deserialize, Serialize};

/// The property owner. One per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landlord {
    pub name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub signature_text: Option<String>,
    #[serde(default)]
    pub signature_image_path: Option<String>,
}

impl Landlord {
    /// Text written when no signature image can be embedded.
    pub fn signature_label(&self) -> &str {
        self.signature_text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// City the receipt is drawn up in.
    ///
    /// Taken from the second address line with its leading postal code removed
    /// (`"78000 Versailles"` gives `"Versailles"`), else the first line.
    pub fn city(&self) -> &str {
        let line = self
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.address_line1.trim());
        match line.split_once(char::is_whitespace) {
            Some((code, rest)) if code.chars().all(|c| c.is_ascii_digit()) => rest.trim(),
            _ => line,
        }
    }
}
