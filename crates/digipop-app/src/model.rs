// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

pub const DEFAULT_TRIGGER_MARKER: &str = "popup-id-suggestions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
}

impl Record {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(id),
            title: title.into(),
        }
    }

    pub fn id_text(&self) -> String {
        self.id.to_string()
    }

    /// Row text shown in the popup.
    pub fn label(&self) -> String {
        format!("{} - {}", self.id, self.title)
    }
}

/// Candidate records in load order. There is no mutation API: a dataset is
/// built once by a loader and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose decimal id starts with `query`, in dataset order.
    ///
    /// Recomputed from scratch on every call; the datasets this serves are
    /// small enough that an index would not pay for itself.
    pub fn filter_prefix(&self, query: &str) -> Vec<Record> {
        let query = query.to_lowercase();
        self.records
            .iter()
            .filter(|record| record.id_text().starts_with(&query))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Escape,
    Up,
    Down,
    Other,
}

impl Key {
    pub fn digit(self) -> Option<char> {
        match self {
            Self::Char(ch) if ch.is_ascii_digit() => Some(ch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    TextInput,
    TextArea,
    Other,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextInput => "text_input",
            Self::TextArea => "text_area",
            Self::Other => "other",
        }
    }
}

/// Screen rectangle of a field, in host cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Anchor {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn bottom(self) -> u16 {
        self.y.saturating_add(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub id: FieldId,
    pub kind: FieldKind,
    pub tags: Vec<String>,
    pub anchor: Anchor,
}

impl FieldInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

/// Text and cursor of a field at the moment it was read. The cursor is a
/// character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub text: String,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRule {
    marker: String,
}

impl Default for TriggerRule {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_MARKER)
    }
}

impl TriggerRule {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_trigger_element(&self, field: &FieldInfo) -> bool {
        field.kind == FieldKind::TextInput && field.has_tag(&self.marker)
    }
}
