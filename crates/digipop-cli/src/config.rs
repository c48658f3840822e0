// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use digipop_app::{CommitAnchor, DEFAULT_TRIGGER_MARKER, TriggerRule};
use digipop_tui::{PopupStyle, StyleOverrides};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "digipop";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub dataset: DatasetSection,
    #[serde(default)]
    pub trigger: TriggerSection,
    #[serde(default)]
    pub popup: PopupSection,
    #[serde(default)]
    pub log: LogSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            dataset: DatasetSection::default(),
            trigger: TriggerSection::default(),
            popup: PopupSection::default(),
            log: LogSection::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSection {
    pub url: Option<String>,
    pub path: Option<String>,
    pub timeout: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerSection {
    pub marker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopupSection {
    pub anchor: Option<String>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub background: Option<String>,
    pub color: Option<String>,
    pub hover_color: Option<String>,
    pub border_color: Option<String>,
    pub show_borders: Option<bool>,
    pub rounded: Option<bool>,
    pub item_padding: Option<u16>,
    pub text_overflow: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("DIGIPOP_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set DIGIPOP_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` at the top and keep values under [dataset], [trigger], [popup], and [log]",
                    path.display()
                )
            })?;
        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.dataset.url.is_some() && self.dataset.path.is_some() {
            bail!(
                "dataset.url and dataset.path in {} are mutually exclusive; keep one",
                path.display()
            );
        }

        if let Some(url) = &self.dataset.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            bail!(
                "dataset.url in {} must start with http:// or https://, got {url:?}; use dataset.path for local files",
                path.display()
            );
        }

        if let Some(timeout) = &self.dataset.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("dataset.timeout in {}", path.display()))?;
            if parsed.is_zero() {
                bail!(
                    "dataset.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(marker) = &self.trigger.marker
            && marker.trim().is_empty()
        {
            bail!("trigger.marker in {} must not be empty", path.display());
        }

        if let Some(anchor) = &self.popup.anchor
            && CommitAnchor::parse(anchor).is_none()
        {
            bail!(
                "popup.anchor in {} must be \"cursor\" or \"session_start\", got {anchor:?}",
                path.display()
            );
        }

        PopupStyle::from_overrides(&self.style_overrides())
            .with_context(|| format!("invalid [popup] options in {}", path.display()))?;

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "log.level in {} is not a valid filter ({error}); use e.g. \"info\" or \"digipop=debug\"",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    /// Remote URL, then file path, as configured. `None` when neither is set.
    pub fn dataset_location(&self) -> Option<&str> {
        self.dataset
            .url
            .as_deref()
            .or(self.dataset.path.as_deref())
    }

    pub fn dataset_timeout(&self) -> Result<Duration> {
        parse_duration(self.dataset.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn dataset_headers(&self) -> Vec<(String, String)> {
        self.dataset
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn trigger(&self) -> TriggerRule {
        TriggerRule::new(
            self.trigger
                .marker
                .as_deref()
                .unwrap_or(DEFAULT_TRIGGER_MARKER),
        )
    }

    pub fn commit_anchor(&self) -> CommitAnchor {
        self.popup
            .anchor
            .as_deref()
            .and_then(CommitAnchor::parse)
            .unwrap_or_default()
    }

    pub fn popup_style(&self) -> Result<PopupStyle> {
        PopupStyle::from_overrides(&self.style_overrides())
    }

    fn style_overrides(&self) -> StyleOverrides {
        StyleOverrides {
            width: self.popup.width,
            height: self.popup.height,
            background: self.popup.background.clone(),
            color: self.popup.color.clone(),
            hover_color: self.popup.hover_color.clone(),
            border_color: self.popup.border_color.clone(),
            show_borders: self.popup.show_borders,
            rounded: self.popup.rounded,
            item_padding: self.popup.item_padding,
            text_overflow: self.popup.text_overflow.clone(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set log.path in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join("digipop.log"))
    }

    pub fn example_config(path: &Path) -> String {
        let style = PopupStyle::default();
        format!(
            "# digipop config\n# Place this file at: {}\n\nversion = 1\n\n[dataset]\n# Exactly one of url or path. Without either, digipop starts with no records.\n# url = \"https://inventory.example/parts.json\"\n# path = \"/absolute/path/to/parts.json\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\n[dataset.headers]\n# X-Api-Key = \"secret\"\n\n[trigger]\nmarker = \"{DEFAULT_TRIGGER_MARKER}\"\n\n[popup]\n# \"cursor\" replaces the digits before the cursor at commit time;\n# \"session_start\" replaces them where the first digit was typed.\nanchor = \"{}\"\nwidth = {}\nheight = {}\nbackground = \"#0e1116\"\ncolor = \"white\"\nhover_color = \"#386ee3\"\n# border_color defaults to color lightened by 100 per channel\n# border_color = \"#cccccc\"\nshow_borders = {}\nrounded = {}\n# blank columns on each side of a row\nitem_padding = {}\ntext_overflow = \"{}\"\n\n[log]\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/digipop/digipop.log)\n# path = \"/absolute/path/to/digipop.log\"\n",
            path.display(),
            CommitAnchor::default().as_str(),
            style.width,
            style.height,
            style.show_borders,
            style.rounded,
            style.item_padding,
            style.text_overflow.as_str(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
