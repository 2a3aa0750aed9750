use serde::{Deserialize, Serialize};

/// One of the eight fixed content regions of a receipt.
///
/// The declaration order is the paint order: when two sections overlap,
/// the one declared later is painted on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    Header,
    LandlordInfo,
    TenantInfo,
    PropertyAddress,
    MainText,
    PaymentDetails,
    Signature,
    Footer,
}

impl SectionKey {
    pub const ALL: [SectionKey; 8] = [
        SectionKey::Header,
        SectionKey::LandlordInfo,
        SectionKey::TenantInfo,
        SectionKey::PropertyAddress,
        SectionKey::MainText,
        SectionKey::PaymentDetails,
        SectionKey::Signature,
        SectionKey::Footer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Header => "header",
            SectionKey::LandlordInfo => "landlordInfo",
            SectionKey::TenantInfo => "tenantInfo",
            SectionKey::PropertyAddress => "propertyAddress",
            SectionKey::MainText => "mainText",
            SectionKey::PaymentDetails => "paymentDetails",
            SectionKey::Signature => "signature",
            SectionKey::Footer => "footer",
        }
    }

    /// The hard default style used whenever a configuration has no explicit
    /// style for this section.
    pub fn default_style(self) -> SectionStyle {
        match self {
            SectionKey::Header => SectionStyle {
                title: Some(DEFAULT_HEADER_TITLE.to_string()),
                font_style: FontStyle::Bold,
                align: Align::Center,
                ..SectionStyle::at(50.0, 70.0, 18.0)
            },
            SectionKey::LandlordInfo => SectionStyle::at(70.0, 130.0, 10.0),
            SectionKey::TenantInfo => SectionStyle::at(350.0, 175.0, 10.0),
            SectionKey::PropertyAddress => SectionStyle {
                font_style: FontStyle::Bold,
                ..SectionStyle::at(70.0, 240.0, 11.0)
            },
            SectionKey::MainText => SectionStyle::at(70.0, 270.0, 11.0),
            SectionKey::PaymentDetails => SectionStyle::at(70.0, 350.0, 11.0),
            SectionKey::Signature => SectionStyle::at(70.0, 480.0, DEFAULT_FONT_SIZE),
            SectionKey::Footer => SectionStyle::at(70.0, 580.0, 9.0),
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_HEADER_TITLE: &str = "Quittance de loyer";
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Anchor of a section, in page units with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// White rectangle painted behind a section to keep it legible over a backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Backdrop {
    pub opacity: f32,
}

/// Visual attributes of a single section. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStyle {
    pub position: Position,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub align: Align,
    /// Only meaningful for the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<Backdrop>,
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

impl SectionStyle {
    pub fn at(x: f32, y: f32, font_size: f32) -> Self {
        Self {
            position: Position { x, y },
            font_size,
            font_style: FontStyle::Normal,
            align: Align::Left,
            title: None,
            color: None,
            line_height: None,
            backdrop: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_default_matches_french_receipt() {
        let header = SectionKey::Header.default_style();
        assert_eq!(header.position, Position { x: 50.0, y: 70.0 });
        assert_eq!(header.font_size, 18.0);
        assert_eq!(header.font_style, FontStyle::Bold);
        assert_eq!(header.align, Align::Center);
        assert_eq!(header.title.as_deref(), Some("Quittance de loyer"));
    }

    #[test]
    fn style_without_font_fields_uses_defaults() {
        let style: SectionStyle =
            serde_json::from_str(r#"{ "position": { "x": 70, "y": 480 } }"#).unwrap();
        assert_eq!(style, SectionKey::Signature.default_style());
    }

    #[test]
    fn keys_serialize_in_camel_case() {
        let json = serde_json::to_string(&SectionKey::PaymentDetails).unwrap();
        assert_eq!(json, "\"paymentDetails\"");
        assert_eq!(SectionKey::PaymentDetails.to_string(), "paymentDetails");
    }
}
