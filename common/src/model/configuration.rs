//! # Template Configuration
//!
//! Declarative, position-based description of a receipt layout: page layout
//! attributes plus one [`SectionStyle`] per [`SectionKey`].
//!
//! A configuration may omit sections. [`TemplateConfiguration::resolve`] falls back to the
//! hard defaults of [`SectionKey::default_style`], so a configuration with missing sections
//! still renders completely. [`TemplateConfiguration::validate`] is the stricter check used
//! when a configuration is authored: it requires every section to be explicit.
//!
//! Updates never patch individual style fields. [`TemplateConfiguration::merge`] and
//! [`TemplateConfiguration::replace_section`] swap whole section styles.

use crate::model::section::{Position, SectionKey, SectionStyle};
use crate::model::template::TemplateType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    #[default]
    None,
    Image,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub background_mode: BackgroundMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_asset: Option<String>,
}

fn default_margin() -> f32 {
    50.0
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            page_size: PageSize::A4,
            background_mode: BackgroundMode::None,
            background_asset: None,
        }
    }
}

/// Where a configuration came from when it was synthesized from an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub generated_from: String,
    pub analysis_date: String,
    pub template_type: TemplateType,
    pub original_file: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfiguration {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub sections: BTreeMap<SectionKey, SectionStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
}

/// A single problem found by [`TemplateConfiguration::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    MissingSection(SectionKey),
    NegativePosition(SectionKey),
    OutsidePage(SectionKey),
    NonPositiveFontSize(SectionKey),
    InvalidMargin,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::MissingSection(key) => write!(f, "{key}: missing section style"),
            ConfigIssue::NegativePosition(key) => write!(f, "{key}: position must not be negative"),
            ConfigIssue::OutsidePage(key) => write!(f, "{key}: position is outside the page"),
            ConfigIssue::NonPositiveFontSize(key) => write!(f, "{key}: fontSize must be positive"),
            ConfigIssue::InvalidMargin => f.write_str("layout.margin must be a non-negative number"),
        }
    }
}

impl TemplateConfiguration {
    /// The standard French layout: every section at its hard default, A4, margin 50.
    pub fn standard() -> Self {
        Self {
            layout: Layout::default(),
            sections: SectionKey::ALL
                .iter()
                .map(|key| (*key, key.default_style()))
                .collect(),
            metadata: None,
        }
    }

    /// Style for `key`, explicit if present, otherwise the hard default.
    pub fn resolve(&self, key: SectionKey) -> SectionStyle {
        self.sections
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_style())
    }

    pub fn page_dimensions(&self) -> (f32, f32) {
        self.layout.page_size.dimensions()
    }

    /// Checks that every section is explicit, positioned on the page and has a usable font size.
    pub fn validate(&self) -> Result<(), Vec<ConfigIssue>> {
        let (width, height) = self.page_dimensions();
        let mut issues = Vec::new();

        if !self.layout.margin.is_finite() || self.layout.margin < 0.0 {
            issues.push(ConfigIssue::InvalidMargin);
        }

        for key in SectionKey::ALL {
            let Some(style) = self.sections.get(&key) else {
                issues.push(ConfigIssue::MissingSection(key));
                continue;
            };
            let Position { x, y } = style.position;
            if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
                issues.push(ConfigIssue::NegativePosition(key));
            } else if x > width || y > height {
                issues.push(ConfigIssue::OutsidePage(key));
            }
            if !style.font_size.is_finite() || style.font_size <= 0.0 {
                issues.push(ConfigIssue::NonPositiveFontSize(key));
            }
        }

        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }

    /// Layers `overrides` over `self`.
    ///
    /// The layout of `overrides` wins. Each section present in `overrides` replaces the
    /// base section wholesale; sections absent from `overrides` are kept from the base.
    pub fn merge(&self, overrides: &TemplateConfiguration) -> TemplateConfiguration {
        let mut sections = self.sections.clone();
        for (key, style) in &overrides.sections {
            sections.insert(*key, style.clone());
        }
        TemplateConfiguration {
            layout: overrides.layout.clone(),
            sections,
            metadata: overrides.metadata.clone().or_else(|| self.metadata.clone()),
        }
    }

    pub fn replace_section(&mut self, key: SectionKey, style: SectionStyle) {
        self.sections.insert(key, style);
    }
}
