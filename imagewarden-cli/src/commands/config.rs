//! `imagewarden config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use imagewarden_core::config::WardenConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// `config show --section` 에서 허용되는 섹션 이름
pub const SECTIONS: [&str; 9] = [
    "general",
    "docker",
    "stage",
    "vulnerability",
    "signature",
    "antivirus",
    "sandbox",
    "runtime",
    "cleanup",
];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => {
            let report = build_show_report(config_path, section.as_deref()).await?;
            writer.render(&report)
        }
    }
}

/// Loads and validates the configuration file, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` if the file is missing, malformed or invalid.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let report = build_validation_report(config_path).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

pub async fn build_validation_report(config_path: &Path) -> ConfigValidationReport {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match WardenConfig::load(config_path).await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };

    ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    }
}

/// Builds the effective configuration view (file + env overrides + defaults).
///
/// A missing file is not an error here: the defaults are shown, exactly as
/// `scan` would use them.
///
/// # Errors
///
/// Returns `CliError::Config` if loading fails or `CliError::Command` if the
/// section name is unknown.
pub async fn build_show_report(
    config_path: &Path,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = WardenConfig::load_or_default(config_path).await?;

    let (config_toml, config_json) = match section {
        Some(name) => serialize_section(&config, name)?,
        None => serialize(&config)?,
    };

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section: section.map(str::to_owned),
        config: config_json,
        config_toml,
    })
}

fn serialize_section(
    config: &WardenConfig,
    name: &str,
) -> Result<(String, serde_json::Value), CliError> {
    match name {
        "general" => serialize(&config.general),
        "docker" => serialize(&config.docker),
        "stage" => serialize(&config.stage),
        "vulnerability" => serialize(&config.vulnerability),
        "signature" => serialize(&config.signature),
        "antivirus" => serialize(&config.antivirus),
        "sandbox" => serialize(&config.sandbox),
        "runtime" => serialize(&config.runtime),
        "cleanup" => serialize(&config.cleanup),
        _ => Err(CliError::Command(format!(
            "unknown section: {} (expected: {})",
            name,
            SECTIONS.join(", ")
        ))),
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<(String, serde_json::Value), CliError> {
    let text = toml::to_string_pretty(value)
        .map_err(|e| CliError::Command(format!("failed to serialize config: {e}")))?;
    let json = serde_json::to_value(value)?;
    Ok((text, json))
}

/// Configuration display report.
///
/// Text output prints the TOML form; JSON output carries the same values as
/// a JSON object.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Effective configuration values
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Debug, Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
