//! Export configuration

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout and packaging settings for the exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Horizontal indentation per list nesting level, in twips.
    pub indent_unit_twips: u32,
    /// Literal prefix written before bullet list items.
    pub bullet_marker: String,
    /// Title stored in the package core properties.
    pub title: Option<String>,
    /// Default output file name.
    pub file_name: String,
    /// Page geometry.
    pub page: PageSetup,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            indent_unit_twips: 720,
            bullet_marker: "•".to_string(),
            title: None,
            file_name: "security_findings.docx".to_string(),
            page: PageSetup::default(),
        }
    }
}

/// Page size and margins in twips (US Letter by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            width: 12240,
            height: 15840,
            margin: 1440,
        }
    }
}

impl ExportConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ExportConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.indent_unit_twips == 0 {
            return Err(ExportError::Config(
                "indent_unit_twips must be positive".to_string(),
            ));
        }
        if self.page.width == 0 || self.page.height == 0 {
            return Err(ExportError::Config("page size must be non-zero".to_string()));
        }
        if self.page.margin.saturating_mul(2) >= self.page.width {
            return Err(ExportError::Config(
                "page margins leave no printable width".to_string(),
            ));
        }
        Ok(())
    }
}
