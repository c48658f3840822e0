// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use digipop_app::{
    Anchor, DEFAULT_TRIGGER_MARKER, Dataset, FieldId, FieldInfo, FieldKind, FieldSnapshot,
    InputHost, PopupRenderer, Record,
};
use std::path::PathBuf;

const PART_NOUNS: [&str; 16] = [
    "Bracket", "Hinge", "Gasket", "Valve", "Bearing", "Spindle", "Flange", "Coupler", "Rotor",
    "Sensor", "Relay", "Bushing", "Spring", "Latch", "Pulley", "Washer",
];

const PART_ADJECTIVES: [&str; 12] = [
    "Steel", "Brass", "Compact", "Heavy", "Sealed", "Threaded", "Angled", "Low-profile",
    "Reinforced", "Coated", "Spare", "Replacement",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for realistic part catalogues.
#[derive(Debug, Clone)]
pub struct RecordFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl RecordFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn title(&mut self) -> String {
        format!(
            "{} {}",
            self.pick(&PART_ADJECTIVES),
            self.pick(&PART_NOUNS)
        )
    }

    /// Next record with a strictly increasing id; gaps of 1..=50 between ids
    /// give prefix collisions at several digit lengths.
    pub fn record(&mut self) -> Record {
        let id = self.next_id;
        self.next_id += 1 + self.rng.int_n(50) as i64;
        Record::new(id, self.title())
    }

    pub fn dataset(&mut self, count: usize) -> Dataset {
        Dataset::new((0..count).map(|_| self.record()).collect())
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// `[{1,"A"}, {12,"B"}, {13,"C"}]`, the canonical three-record catalogue.
pub fn sample_dataset() -> Dataset {
    Dataset::new(vec![
        Record::new(1, "A"),
        Record::new(12, "B"),
        Record::new(13, "C"),
    ])
}

pub fn records_json(dataset: &Dataset) -> String {
    let rows = dataset
        .records()
        .iter()
        .map(|record| serde_json::json!({ "id": record.id.get(), "title": record.title }))
        .collect::<Vec<_>>();
    serde_json::Value::Array(rows).to_string()
}

pub fn temp_json_path(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("records.json");
    std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Render {
        ids: Vec<i64>,
        selection: Option<usize>,
    },
    Show,
    Hide,
    PositionNear(Anchor),
}

/// Renderer that records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
    pub visible: bool,
}

impl RecordingRenderer {
    pub fn last_render(&self) -> Option<&RenderCall> {
        self.calls
            .iter()
            .rev()
            .find(|call| matches!(call, RenderCall::Render { .. }))
    }
}

impl PopupRenderer for RecordingRenderer {
    fn render(&mut self, items: &[Record], selection: Option<usize>) {
        self.calls.push(RenderCall::Render {
            ids: items.iter().map(|record| record.id.get()).collect(),
            selection,
        });
    }

    fn show(&mut self) {
        self.visible = true;
        self.calls.push(RenderCall::Show);
    }

    fn hide(&mut self) {
        self.visible = false;
        self.calls.push(RenderCall::Hide);
    }

    fn position_near(&mut self, anchor: Anchor) {
        self.calls.push(RenderCall::PositionNear(anchor));
    }
}

#[derive(Debug, Clone)]
pub struct MemoryField {
    pub info: FieldInfo,
    pub text: String,
    pub cursor: usize,
    pub attached: bool,
}

/// In-memory set of text fields with one focus slot. Typing goes through
/// [`MemoryHost::insert_char`], which inserts characters at the cursor the way
/// a real input would after the controller has seen the key.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    fields: Vec<MemoryField>,
    focused: Option<FieldId>,
    pub reject_edits: bool,
}

impl MemoryHost {
    pub fn add_field(&mut self, id: i64, kind: FieldKind, tags: &[&str]) -> FieldId {
        let field_id = FieldId::new(id);
        let row = self.fields.len() as u16;
        self.fields.push(MemoryField {
            info: FieldInfo {
                id: field_id,
                kind,
                tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
                anchor: Anchor::new(0, row * 3, 40, 3),
            },
            text: String::new(),
            cursor: 0,
            attached: true,
        });
        if self.focused.is_none() {
            self.focused = Some(field_id);
        }
        field_id
    }

    pub fn add_tagged_input(&mut self, id: i64) -> FieldId {
        self.add_field(id, FieldKind::TextInput, &[DEFAULT_TRIGGER_MARKER])
    }

    pub fn field(&self, id: FieldId) -> Option<&MemoryField> {
        self.fields.iter().find(|field| field.info.id == id)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut MemoryField> {
        self.fields.iter_mut().find(|field| field.info.id == id)
    }

    pub fn set_text(&mut self, id: FieldId, text: &str, cursor: usize) -> Result<()> {
        let field = self
            .field_mut(id)
            .ok_or_else(|| anyhow!("unknown field {id}"))?;
        field.text = text.to_owned();
        field.cursor = cursor;
        Ok(())
    }

    pub fn text(&self, id: FieldId) -> Option<&str> {
        self.field(id).map(|field| field.text.as_str())
    }

    pub fn cursor(&self, id: FieldId) -> Option<usize> {
        self.field(id).map(|field| field.cursor)
    }

    pub fn set_focus(&mut self, id: Option<FieldId>) {
        self.focused = id;
    }

    pub fn detach(&mut self, id: FieldId) {
        if let Some(field) = self.field_mut(id) {
            field.attached = false;
        }
    }

    pub fn move_cursor(&mut self, id: FieldId, cursor: usize) {
        if let Some(field) = self.field_mut(id) {
            field.cursor = cursor.min(field.text.chars().count());
        }
    }

    /// Default edit for a key the controller did not consume.
    pub fn insert_char(&mut self, ch: char) {
        let Some(id) = self.focused else {
            return;
        };
        if let Some(field) = self.field_mut(id) {
            let byte = byte_offset(&field.text, field.cursor);
            field.text.insert(byte, ch);
            field.cursor += 1;
        }
    }

    pub fn delete_before_cursor(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        if let Some(field) = self.field_mut(id)
            && field.cursor > 0
        {
            let byte = byte_offset(&field.text, field.cursor - 1);
            field.text.remove(byte);
            field.cursor -= 1;
        }
    }
}

impl InputHost for MemoryHost {
    fn focused(&self) -> Option<FieldInfo> {
        let id = self.focused?;
        self.field(id)
            .filter(|field| field.attached)
            .map(|field| field.info.clone())
    }

    fn snapshot(&self, id: FieldId) -> Option<FieldSnapshot> {
        self.field(id)
            .filter(|field| field.attached)
            .map(|field| FieldSnapshot {
                text: field.text.clone(),
                cursor: field.cursor,
            })
    }

    fn replace_text(&mut self, id: FieldId, text: &str, cursor: usize) -> Result<()> {
        if self.reject_edits {
            bail!("field {id} is read-only");
        }
        self.set_text(id, text, cursor)
    }

    fn focus(&mut self, id: FieldId) -> Result<()> {
        if self.field(id).is_none() {
            bail!("unknown field {id}");
        }
        self.focused = Some(id);
        Ok(())
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::{MemoryHost, RecordFaker, records_json, sample_dataset};
    use digipop_app::{FieldKind, InputHost};

    #[test]
    fn new_deterministic_seed() {
        let mut left = RecordFaker::new(42);
        let mut right = RecordFaker::new(42);
        assert_eq!(left.dataset(20), right.dataset(20));
    }

    #[test]
    fn faker_ids_strictly_increase() {
        let mut faker = RecordFaker::new(7);
        let dataset = faker.dataset(100);
        let ids = dataset
            .records()
            .iter()
            .map(|record| record.id.get())
            .collect::<Vec<_>>();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(dataset.records().iter().all(|record| !record.title.is_empty()));
    }

    #[test]
    fn records_json_is_an_array_of_id_title_objects() {
        let json = records_json(&sample_dataset());
        assert_eq!(
            json,
            r#"[{"id":1,"title":"A"},{"id":12,"title":"B"},{"id":13,"title":"C"}]"#
        );
    }

    #[test]
    fn memory_host_inserts_at_cursor() {
        let mut host = MemoryHost::default();
        let id = host.add_field(1, FieldKind::TextInput, &[]);
        host.insert_char('a');
        host.insert_char('c');
        host.move_cursor(id, 1);
        host.insert_char('b');
        assert_eq!(host.text(id), Some("abc"));
        assert_eq!(host.cursor(id), Some(2));

        host.delete_before_cursor();
        assert_eq!(host.text(id), Some("ac"));
    }

    #[test]
    fn detached_fields_are_invisible_to_the_controller() {
        let mut host = MemoryHost::default();
        let id = host.add_tagged_input(1);
        host.detach(id);
        assert!(host.focused().is_none());
        assert!(host.snapshot(id).is_none());
    }
}
