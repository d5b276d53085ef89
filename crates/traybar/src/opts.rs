use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use systray::{Color, SystrayConfig};

/// Run a bar at the top of the screen that acts as the system tray.
#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about)]
pub struct Opt {
    /// Write out debug logs.
    #[arg(long = "debug")]
    pub log_debug: bool,

    /// JSON file with systray settings (icon_size, padding, background).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Height of the bar in pixels.
    #[arg(long, default_value_t = 24)]
    pub height: u16,

    /// Overrides icon_size from the config file.
    #[arg(long)]
    pub icon_size: Option<u16>,

    /// Overrides padding from the config file.
    #[arg(long)]
    pub padding: Option<u16>,

    /// Background color like #1e1e2e, overrides the config file.
    #[arg(long)]
    pub background: Option<Color>,
}

impl Opt {
    /// The config file (if any), with the command line flags applied on top.
    pub fn systray_config(&self) -> Result<SystrayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => SystrayConfig::default(),
        };
        if let Some(icon_size) = self.icon_size {
            config.icon_size = icon_size;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if self.background.is_some() {
            config.background = self.background;
        }
        Ok(config)
    }
}
