// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Cosmetic popup options. Nothing here affects which records match or
//! what a commit inserts.

use anyhow::{Context, Result, bail};
use ratatui::style::Color;
use std::str::FromStr;

const FALLBACK_BORDER: Color = Color::Rgb(0xcc, 0xcc, 0xcc);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextOverflow {
    #[default]
    Wrap,
    Ellipsis,
}

impl TextOverflow {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wrap => "wrap",
            Self::Ellipsis => "ellipsis",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wrap" => Some(Self::Wrap),
            "ellipsis" => Some(Self::Ellipsis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupStyle {
    pub width: u16,
    pub height: u16,
    pub background: Color,
    pub foreground: Color,
    pub hover: Color,
    pub border: Color,
    pub show_borders: bool,
    pub rounded: bool,
    /// Blank columns on each side of a row's text.
    pub item_padding: u16,
    pub text_overflow: TextOverflow,
}

impl Default for PopupStyle {
    fn default() -> Self {
        let foreground = Color::White;
        Self {
            width: 40,
            height: 10,
            background: Color::Rgb(0x0e, 0x11, 0x16),
            foreground,
            hover: Color::Rgb(0x38, 0x6e, 0xe3),
            border: derive_border_color(foreground),
            show_borders: true,
            rounded: true,
            item_padding: 1,
            text_overflow: TextOverflow::Wrap,
        }
    }
}

/// Raw option values as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOverrides {
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

impl PopupStyle {
    pub fn from_overrides(overrides: &StyleOverrides) -> Result<Self> {
        let defaults = Self::default();
        let foreground = match &overrides.color {
            Some(raw) => parse_color(raw).context("popup.color")?,
            None => defaults.foreground,
        };
        let border = match &overrides.border_color {
            Some(raw) => parse_color(raw).context("popup.border_color")?,
            None => derive_border_color(foreground),
        };
        let text_overflow = match &overrides.text_overflow {
            Some(raw) => TextOverflow::parse(raw).with_context(|| {
                format!("popup.text_overflow must be \"wrap\" or \"ellipsis\", got {raw:?}")
            })?,
            None => defaults.text_overflow,
        };

        let width = overrides.width.unwrap_or(defaults.width);
        let height = overrides.height.unwrap_or(defaults.height);
        if width < 8 || height < 3 {
            bail!("popup.width must be at least 8 and popup.height at least 3, got {width}x{height}");
        }
        let item_padding = overrides.item_padding.unwrap_or(defaults.item_padding);
        if width.saturating_sub(2) < item_padding.saturating_mul(2).saturating_add(4) {
            bail!(
                "popup.item_padding {item_padding} leaves less than 4 columns of text in a popup {width} wide"
            );
        }

        Ok(Self {
            width,
            height,
            background: match &overrides.background {
                Some(raw) => parse_color(raw).context("popup.background")?,
                None => defaults.background,
            },
            foreground,
            hover: match &overrides.hover_color {
                Some(raw) => parse_color(raw).context("popup.hover_color")?,
                None => defaults.hover,
            },
            border,
            show_borders: overrides.show_borders.unwrap_or(defaults.show_borders),
            rounded: overrides.rounded.unwrap_or(defaults.rounded),
            item_padding,
            text_overflow,
        })
    }
}

/// Accepts terminal colour names, `#rrggbb`, indexed colours and CSS style
/// `rgb(r, g, b)`.
pub fn parse_color(raw: &str) -> Result<Color> {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels = inner
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .with_context(|| format!("invalid rgb() colour {raw:?}"))?;
        if let [r, g, b] = channels[..] {
            return Ok(Color::Rgb(r, g, b));
        }
        bail!("rgb() colour {raw:?} needs exactly three channels");
    }

    Color::from_str(trimmed).map_err(|_| {
        anyhow::anyhow!("unknown colour {raw:?}; use a name like \"white\", \"#0e1116\" or rgb(r, g, b)")
    })
}

/// Lightens `foreground` by 100 on every channel, saturating at 255.
pub fn derive_border_color(foreground: Color) -> Color {
    match approximate_rgb(foreground) {
        Some((r, g, b)) => Color::Rgb(
            r.saturating_add(100),
            g.saturating_add(100),
            b.saturating_add(100),
        ),
        None => FALLBACK_BORDER,
    }
}

fn approximate_rgb(color: Color) -> Option<(u8, u8, u8)> {
    let rgb = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::Red => (128, 0, 0),
        Color::Green => (0, 128, 0),
        Color::Yellow => (128, 128, 0),
        Color::Blue => (0, 0, 128),
        Color::Magenta => (128, 0, 128),
        Color::Cyan => (0, 128, 128),
        Color::Gray => (192, 192, 192),
        Color::DarkGray => (128, 128, 128),
        Color::LightRed => (255, 0, 0),
        Color::LightGreen => (0, 255, 0),
        Color::LightYellow => (255, 255, 0),
        Color::LightBlue => (0, 0, 255),
        Color::LightMagenta => (255, 0, 255),
        Color::LightCyan => (0, 255, 255),
        Color::White => (255, 255, 255),
        Color::Reset | Color::Indexed(_) => return None,
    };
    Some(rgb)
}
