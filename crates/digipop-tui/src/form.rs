// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use digipop_app::{Anchor, FieldId, FieldInfo, FieldKind, FieldSnapshot, InputHost};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const FIELD_HEIGHT: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub id: FieldId,
    pub label: String,
    pub kind: FieldKind,
    pub tags: Vec<String>,
    text: String,
    cursor: usize,
}

impl TextField {
    pub fn new(id: i64, label: &str, kind: FieldKind, tags: &[&str]) -> Self {
        Self {
            id: FieldId::new(id),
            label: label.to_owned(),
            kind,
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            text: String::new(),
            cursor: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(index, _)| index)
    }

    fn insert(&mut self, ch: char) {
        let byte = self.byte_at(self.cursor);
        self.text.insert(byte, ch);
        self.cursor += 1;
    }

    fn delete_before(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let byte = self.byte_at(self.cursor - 1);
        self.text.remove(byte);
        self.cursor -= 1;
    }

    fn delete_at(&mut self) {
        if self.cursor < self.char_count() {
            let byte = self.byte_at(self.cursor);
            self.text.remove(byte);
        }
    }

    fn set(&mut self, text: &str, cursor: usize) {
        self.text = text.to_owned();
        self.cursor = cursor.min(self.char_count());
    }
}

/// Vertical stack of single-line fields with one focus slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    fields: Vec<TextField>,
    focused: usize,
    area: Rect,
}

impl Form {
    pub fn new(fields: Vec<TextField>) -> Self {
        Self {
            fields,
            focused: 0,
            area: Rect::default(),
        }
    }

    /// Work-order form: two tagged part reference fields between plain ones.
    pub fn demo(marker: &str) -> Self {
        Self::new(vec![
            TextField::new(1, "Summary", FieldKind::TextInput, &[]),
            TextField::new(2, "Parts used", FieldKind::TextInput, &[marker]),
            TextField::new(3, "Replaces part", FieldKind::TextInput, &[marker]),
            TextField::new(4, "Notes", FieldKind::TextArea, &[marker]),
        ])
    }

    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn field_rect(&self, index: usize) -> Option<Rect> {
        let offset = u16::try_from(index).ok()?.checked_mul(FIELD_HEIGHT)?;
        if offset >= self.area.height {
            return None;
        }
        Some(Rect::new(
            self.area.x,
            self.area.y + offset,
            self.area.width,
            FIELD_HEIGHT.min(self.area.height - offset),
        ))
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn field_at(&self, column: u16, row: u16) -> Option<usize> {
        (0..self.fields.len()).find(|index| {
            self.field_rect(*index).is_some_and(|rect| {
                column >= rect.x
                    && column < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
            })
        })
    }

    /// Focuses the field under the pointer and moves its cursor to the
    /// clicked column.
    pub fn click_at(&mut self, column: u16, row: u16) -> bool {
        let Some(index) = self.field_at(column, row) else {
            return false;
        };
        self.focused = index;
        if let Some(rect) = self.field_rect(index) {
            let field = &mut self.fields[index];
            let inner_width = usize::from(rect.width.saturating_sub(2));
            let start = scroll_start(&field.text, field.cursor, inner_width);
            let clicked = usize::from(column.saturating_sub(rect.x + 1));
            field.cursor = char_at_column(&field.text, start, clicked);
        }
        true
    }

    /// Default editing for keys the popup controller did not consume.
    pub fn apply_default(&mut self, key: KeyEvent) -> bool {
        let Some(field) = self.fields.get_mut(self.focused) else {
            return false;
        };
        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => field.insert(ch),
            KeyCode::Backspace => field.delete_before(),
            KeyCode::Delete => field.delete_at(),
            KeyCode::Left => field.cursor = field.cursor.saturating_sub(1),
            KeyCode::Right => field.cursor = (field.cursor + 1).min(field.char_count()),
            KeyCode::Home => field.cursor = 0,
            KeyCode::End => field.cursor = field.char_count(),
            _ => return false,
        }
        true
    }

    fn index_of(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    fn anchor_for(&self, index: usize) -> Anchor {
        self.field_rect(index)
            .map(|rect| Anchor::new(rect.x, rect.y, rect.width, rect.height))
            .unwrap_or_default()
    }
}

impl InputHost for Form {
    fn focused(&self) -> Option<FieldInfo> {
        let field = self.fields.get(self.focused)?;
        Some(FieldInfo {
            id: field.id,
            kind: field.kind,
            tags: field.tags.clone(),
            anchor: self.anchor_for(self.focused),
        })
    }

    fn snapshot(&self, id: FieldId) -> Option<FieldSnapshot> {
        let field = &self.fields[self.index_of(id)?];
        Some(FieldSnapshot {
            text: field.text.clone(),
            cursor: field.cursor,
        })
    }

    fn replace_text(&mut self, id: FieldId, text: &str, cursor: usize) -> Result<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| anyhow!("field {id} is not on this form"))?;
        self.fields[index].set(text, cursor);
        Ok(())
    }

    fn focus(&mut self, id: FieldId) -> Result<()> {
        self.focused = self
            .index_of(id)
            .ok_or_else(|| anyhow!("field {id} is not on this form"))?;
        Ok(())
    }
}

pub fn draw_form(frame: &mut Frame<'_>, form: &Form, marker: &str) {
    for (index, field) in form.fields.iter().enumerate() {
        let Some(rect) = form.field_rect(index) else {
            break;
        };
        let focused = index == form.focused;
        let tagged = field.tags.iter().any(|tag| tag == marker) && field.kind == FieldKind::TextInput;
        let title = if tagged {
            format!("{} [#]", field.label)
        } else {
            field.label.clone()
        };
        let border = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let inner_width = usize::from(rect.width.saturating_sub(2));
        let scroll = scroll_start(&field.text, field.cursor, inner_width);
        let visible = field.text.chars().skip(scroll).collect::<String>();
        let widget = Paragraph::new(visible.clone()).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border),
        );
        frame.render_widget(widget, rect);

        if focused && rect.height == FIELD_HEIGHT {
            let before = visible
                .chars()
                .take(field.cursor - scroll)
                .collect::<String>();
            let cells = u16::try_from(before.width()).unwrap_or(rect.width);
            frame.set_cursor_position((rect.x + 1 + cells, rect.y + 1));
        }
    }
}

/// First character shown so that the text before `cursor`, plus the cursor
/// cell itself, fits in `width` cells.
fn scroll_start(text: &str, cursor: usize, width: usize) -> usize {
    let chars = text.chars().collect::<Vec<_>>();
    let mut start = cursor.min(chars.len());
    let mut used = 1;
    while start > 0 {
        let cells = chars[start - 1].width().unwrap_or(0);
        if used + cells > width {
            break;
        }
        used += cells;
        start -= 1;
    }
    start
}

/// Character index under `column` cells to the right of `start`.
fn char_at_column(text: &str, start: usize, column: usize) -> usize {
    let mut used = 0;
    let mut index = start;
    for ch in text.chars().skip(start) {
        let cells = ch.width().unwrap_or(0);
        if used + cells > column {
            break;
        }
        used += cells;
        index += 1;
    }
    index
}
