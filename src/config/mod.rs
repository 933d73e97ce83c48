pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::cli::{FieldAssignment, Selector};
#[cfg(feature = "cli")]
use crate::config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "mahalla-nav")]
#[command(about = "Drill down regions, districts and neighborhoods and edit neighborhood prices")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override backend.base_url from the configuration
    #[arg(long)]
    pub base_url: Option<String>,

    /// Region to select (id or name)
    #[arg(long)]
    pub region: Option<Selector>,

    /// District to select (id or name)
    #[arg(long, requires = "region")]
    pub district: Option<Selector>,

    /// Neighborhood to focus (id or name)
    #[arg(long, requires = "district")]
    pub neighborhood: Option<Selector>,

    /// Price edit for the focused neighborhood, e.g. apartment=50000
    #[arg(long = "set", requires = "neighborhood")]
    pub edits: Vec<FieldAssignment>,

    /// Submit the focused neighborhood's prices
    #[arg(long, requires = "neighborhood")]
    pub submit: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML 配置並套用命令列覆蓋設定
    pub fn load_settings(&self) -> Result<TomlConfig> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            settings.backend.base_url = base_url.clone();
            tracing::info!("🔧 Backend base URL overridden to: {}", base_url);
        }

        Ok(settings)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_non_empty_string("config", path)?;
        }
        if let Some(base_url) = &self.base_url {
            validation::validate_url("base_url", base_url)?;
        }
        Ok(())
    }
}
