//! # Template Analyzer
//!
//! Synthesizes a complete [`TemplateConfiguration`] for an uploaded template file.
//!
//! No layout is actually inferred from the pixels or the PDF content: the asset is classified
//! into an [`AssetFamily`] and the matching preset is used, then adjusted by the style tag found
//! in the template name.
//!
//! ## Workflow
//!
//! 1.  **Classification**: by file extension (`jpg`, `jpeg`, `png`, `gif`, `bmp` or `pdf`), unless
//!     the caller already resolved the family from the content type. Anything else fails with
//!     [`ReceiptError::UnsupportedTemplateType`].
//! 2.  **Preset**: the image preset keeps the standard layout with small offsets; the PDF preset
//!     uses smaller fonts and gives every section a white backdrop so text stays legible.
//! 3.  **Named style**: `modern`/`minimal`, `classic`/`traditional` or `compact` in the template
//!     name (case-insensitive) adjust the preset. Other names leave it untouched.
//! 4.  **Metadata**: the result records where it came from and when.
//!
//! Callers creating a template must not fail because of the analyzer: [`analyze_or_fallback`]
//! substitutes the standard smart configuration whenever analysis fails.

use crate::error::ReceiptError;
use chrono::Utc;
use common::model::configuration::{
    AnalysisMetadata, BackgroundMode, Layout, TemplateConfiguration,
};
use common::model::section::{Align, Backdrop, FontStyle, SectionKey, SectionStyle, DEFAULT_HEADER_TITLE};
use common::model::template::TemplateType;
use log::warn;
use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "bmp"];
const COMPACT_SHIFT: f32 = 20.0;
const MIN_FONT_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFamily {
    Image,
    Pdf,
}

impl AssetFamily {
    pub fn from_path(path: &Path) -> Result<Self, ReceiptError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(AssetFamily::Image)
        } else if extension == "pdf" {
            Ok(AssetFamily::Pdf)
        } else {
            Err(ReceiptError::UnsupportedTemplateType(if extension.is_empty() {
                path.display().to_string()
            } else {
                format!(".{extension}")
            }))
        }
    }

    /// Classification from a content type such as `image/png` or `application/pdf`.
    pub fn from_mime(mime: &mime_guess::Mime) -> Option<Self> {
        if mime.type_() == mime_guess::mime::IMAGE {
            Some(AssetFamily::Image)
        } else if mime.essence_str() == "application/pdf" {
            Some(AssetFamily::Pdf)
        } else {
            None
        }
    }

    fn background_mode(self) -> BackgroundMode {
        match self {
            AssetFamily::Image => BackgroundMode::Image,
            AssetFamily::Pdf => BackgroundMode::Pdf,
        }
    }
}

/// Style keyword found in a template name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Modern,
    Classic,
    Compact,
}

impl StyleTag {
    const KEYWORDS: [(&'static str, StyleTag); 5] = [
        ("modern", StyleTag::Modern),
        ("minimal", StyleTag::Modern),
        ("classic", StyleTag::Classic),
        ("traditional", StyleTag::Classic),
        ("compact", StyleTag::Compact),
    ];

    /// The first matching keyword wins, in the order modern, classic, compact.
    pub fn detect(name: &str) -> Option<StyleTag> {
        let name = name.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| name.contains(keyword))
            .map(|(_, tag)| *tag)
    }

    fn apply(self, config: &mut TemplateConfiguration) {
        match self {
            StyleTag::Modern => {
                set_header_size(config, 18.0);
                config.layout.margin = 60.0;
            }
            StyleTag::Classic => {
                set_header_size(config, 16.0);
                config.layout.margin = 40.0;
            }
            StyleTag::Compact => {
                for style in config.sections.values_mut() {
                    style.position.y = (style.position.y - COMPACT_SHIFT).max(0.0);
                    style.font_size = (style.font_size - 1.0).max(MIN_FONT_SIZE);
                }
            }
        }
    }
}

fn set_header_size(config: &mut TemplateConfiguration, size: f32) {
    if let Some(header) = config.sections.get_mut(&SectionKey::Header) {
        header.font_size = size;
    }
}

/// What the caller knows about the upload.
#[derive(Debug, Clone, Default)]
pub struct AnalysisHint {
    pub name: Option<String>,
    pub template_type: Option<TemplateType>,
    /// Family already resolved from the content type; the extension is used otherwise.
    pub family: Option<AssetFamily>,
}

fn styled(x: f32, y: f32, size: f32, color: &str) -> SectionStyle {
    SectionStyle {
        color: Some(color.to_string()),
        ..SectionStyle::at(x, y, size)
    }
}

fn header_style(y: f32, size: f32) -> SectionStyle {
    SectionStyle {
        title: Some(DEFAULT_HEADER_TITLE.to_string()),
        font_style: FontStyle::Bold,
        align: Align::Center,
        ..SectionStyle::at(50.0, y, size)
    }
}

fn image_preset() -> TemplateConfiguration {
    let black = "#000000";
    let sections = [
        (
            SectionKey::Header,
            SectionStyle {
                color: Some(black.to_string()),
                ..header_style(80.0, 16.0)
            },
        ),
        (SectionKey::LandlordInfo, styled(70.0, 130.0, 10.0, black)),
        (SectionKey::TenantInfo, styled(350.0, 175.0, 10.0, black)),
        (
            SectionKey::PropertyAddress,
            SectionStyle {
                font_style: FontStyle::Bold,
                ..styled(70.0, 240.0, 11.0, black)
            },
        ),
        (
            SectionKey::MainText,
            SectionStyle {
                line_height: Some(15.0),
                ..styled(70.0, 280.0, 11.0, black)
            },
        ),
        (SectionKey::PaymentDetails, styled(70.0, 380.0, 11.0, black)),
        (SectionKey::Signature, styled(70.0, 500.0, 11.0, black)),
        (SectionKey::Footer, styled(70.0, 580.0, 9.0, "#666666")),
    ];
    TemplateConfiguration {
        layout: Layout::default(),
        sections: sections.into_iter().collect(),
        metadata: None,
    }
}

fn pdf_preset() -> TemplateConfiguration {
    let black = "#000000";
    let backed = |style: SectionStyle, opacity: f32| SectionStyle {
        backdrop: Some(Backdrop { opacity }),
        ..style
    };
    let sections = [
        (
            SectionKey::Header,
            backed(
                SectionStyle {
                    color: Some(black.to_string()),
                    ..header_style(100.0, 14.0)
                },
                0.8,
            ),
        ),
        (SectionKey::LandlordInfo, backed(styled(80.0, 150.0, 9.0, black), 0.8)),
        (SectionKey::TenantInfo, backed(styled(320.0, 190.0, 9.0, black), 0.8)),
        (
            SectionKey::PropertyAddress,
            backed(
                SectionStyle {
                    font_style: FontStyle::Bold,
                    ..styled(80.0, 260.0, 10.0, black)
                },
                0.8,
            ),
        ),
        (
            SectionKey::MainText,
            backed(
                SectionStyle {
                    line_height: Some(14.0),
                    ..styled(80.0, 300.0, 10.0, black)
                },
                0.8,
            ),
        ),
        (SectionKey::PaymentDetails, backed(styled(80.0, 400.0, 10.0, black), 0.9)),
        (SectionKey::Signature, backed(styled(80.0, 520.0, 10.0, black), 0.8)),
        (SectionKey::Footer, backed(styled(80.0, 600.0, 8.0, "#666666"), 0.7)),
    ];
    TemplateConfiguration {
        layout: Layout::default(),
        sections: sections.into_iter().collect(),
        metadata: None,
    }
}

/// Builds the configuration for the template file at `path`.
pub fn analyze(path: &Path, hint: &AnalysisHint) -> Result<TemplateConfiguration, ReceiptError> {
    let family = match hint.family {
        Some(family) => family,
        None => AssetFamily::from_path(path)?,
    };

    let mut config = match family {
        AssetFamily::Image => image_preset(),
        AssetFamily::Pdf => pdf_preset(),
    };
    config.layout.background_mode = family.background_mode();
    config.layout.background_asset = Some(path.to_string_lossy().into_owned());

    if let Some(tag) = hint.name.as_deref().and_then(StyleTag::detect) {
        tag.apply(&mut config);
    }

    config.metadata = Some(AnalysisMetadata {
        generated_from: "uploaded_template".to_string(),
        analysis_date: Utc::now().to_rfc3339(),
        template_type: hint.template_type.unwrap_or(TemplateType::Uploaded),
        original_file: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    });
    Ok(config)
}

/// Same as [`analyze`], but never fails: the standard smart configuration with the upload as
/// background image is returned instead.
pub fn analyze_or_fallback(path: &Path, hint: &AnalysisHint) -> TemplateConfiguration {
    analyze(path, hint).unwrap_or_else(|e| {
        warn!(
            "Template analysis failed for {}, using the standard layout: {e}",
            path.display()
        );
        smart_configuration(StylePreset::Standard, Some(path))
    })
}

/// Named smart layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StylePreset {
    #[default]
    Standard,
    Modern,
    Classic,
    Minimal,
}

impl StylePreset {
    /// Unknown names give [`StylePreset::Standard`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "modern" => StylePreset::Modern,
            "classic" => StylePreset::Classic,
            "minimal" => StylePreset::Minimal,
            _ => StylePreset::Standard,
        }
    }
}

/// A preset layout, optionally over a background image.
pub fn smart_configuration(preset: StylePreset, background: Option<&Path>) -> TemplateConfiguration {
    let mut config = TemplateConfiguration::standard();
    config.replace_section(SectionKey::Header, header_style(80.0, 16.0));
    config.replace_section(SectionKey::MainText, SectionStyle::at(70.0, 280.0, 11.0));
    config.replace_section(SectionKey::PaymentDetails, SectionStyle::at(70.0, 380.0, 11.0));
    config.replace_section(SectionKey::Signature, SectionStyle::at(70.0, 500.0, 11.0));

    if let Some(path) = background {
        config.layout.background_mode = BackgroundMode::Image;
        config.layout.background_asset = Some(path.to_string_lossy().into_owned());
    }

    let (size, font_style, color, margin) = match preset {
        StylePreset::Standard => return config,
        StylePreset::Modern => (20.0, FontStyle::Bold, Some("#2563eb"), 60.0),
        StylePreset::Classic => (18.0, FontStyle::Bold, None, 40.0),
        StylePreset::Minimal => (14.0, FontStyle::Normal, None, 70.0),
    };
    if let Some(header) = config.sections.get_mut(&SectionKey::Header) {
        header.font_size = size;
        header.font_style = font_style;
        header.color = color.map(str::to_string);
    }
    config.layout.margin = margin;
    config
}
