use crate::model::configuration::{BackgroundMode, TemplateConfiguration};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Default,
    #[default]
    Custom,
    Uploaded,
}

impl TemplateType {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateType::Default => "default",
            TemplateType::Custom => "custom",
            TemplateType::Uploaded => "uploaded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(TemplateType::Default),
            "custom" => Some(TemplateType::Custom),
            "uploaded" => Some(TemplateType::Uploaded),
            _ => None,
        }
    }
}

/// A named layout, persisted by the template store.
///
/// Receipts reference templates by `id` so a historical receipt can be
/// reproduced even after the default template changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub template_type: TemplateType,
    pub active: bool,
    pub is_default: bool,
    pub configuration: TemplateConfiguration,
    pub background_asset_path: Option<String>,
    pub source_file_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Template {
    /// The configuration to render with.
    ///
    /// A background image uploaded on the template itself replaces whatever background the
    /// layout names, including the uploaded template file.
    pub fn effective_configuration(&self) -> TemplateConfiguration {
        let mut config = self.configuration.clone();
        if let Some(path) = &self.background_asset_path {
            config.layout.background_asset = Some(path.clone());
            config.layout.background_mode = BackgroundMode::Image;
        }
        config
    }
}

/// Everything needed to create a template or fully replace an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub is_default: bool,
    /// The standard layout when omitted.
    #[serde(default = "TemplateConfiguration::standard")]
    pub configuration: TemplateConfiguration,
    #[serde(default)]
    pub background_asset_path: Option<String>,
    #[serde(default)]
    pub source_file_path: Option<String>,
}

fn default_active() -> bool {
    true
}

impl NewTemplate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            template_type: TemplateType::Custom,
            active: true,
            is_default: false,
            configuration: TemplateConfiguration::standard(),
            background_asset_path: None,
            source_file_path: None,
        }
    }
}
