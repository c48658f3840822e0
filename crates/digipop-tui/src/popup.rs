// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use digipop_app::{Anchor, PopupRenderer, Record};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};
use std::borrow::Cow;
use textwrap::Options;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::style::{PopupStyle, TextOverflow};

const MIN_POPUP_HEIGHT: u16 = 3;

/// Last state pushed by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupView {
    pub items: Vec<String>,
    pub selection: Option<usize>,
    pub visible: bool,
    pub anchor: Option<Anchor>,
}

#[derive(Debug, Clone, Default)]
pub struct TuiRenderer {
    view: PopupView,
}

impl TuiRenderer {
    pub fn view(&self) -> &PopupView {
        &self.view
    }
}

impl PopupRenderer for TuiRenderer {
    fn render(&mut self, items: &[Record], selection: Option<usize>) {
        self.view.items = items.iter().map(Record::label).collect();
        self.view.selection = selection;
    }

    fn show(&mut self) {
        self.view.visible = true;
    }

    fn hide(&mut self) {
        self.view.visible = false;
    }

    fn position_near(&mut self, anchor: Anchor) {
        self.view.anchor = Some(anchor);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRow {
    pub index: usize,
    pub area: Rect,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupLayout {
    pub area: Rect,
    pub rows: Vec<PopupRow>,
    pub separators: Vec<Rect>,
}

impl PopupLayout {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        rect_contains(self.area, column, row)
    }

    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        self.rows
            .iter()
            .find(|candidate| rect_contains(candidate.area, column, row))
            .map(|candidate| candidate.index)
    }
}

/// Places the popup directly beneath its anchor, clipped to `screen`, and
/// scrolled so the selected item is fully visible.
pub fn layout_popup(view: &PopupView, style: &PopupStyle, screen: Rect) -> Option<PopupLayout> {
    if !view.visible || view.items.is_empty() {
        return None;
    }
    let anchor = view.anchor?;

    let top = anchor.bottom();
    let screen_bottom = screen.y.saturating_add(screen.height);
    let screen_right = screen.x.saturating_add(screen.width);
    if top >= screen_bottom || anchor.x >= screen_right {
        return None;
    }
    let width = style.width.min(screen_right - anchor.x);
    let max_height = style.height.min(screen_bottom - top);
    if width < 3 || max_height < MIN_POPUP_HEIGHT {
        return None;
    }

    let padding = style.item_padding.saturating_mul(2);
    let text_width = usize::from((width - 2).saturating_sub(padding)).max(1);
    let inner_height = usize::from(max_height - 2);
    let wrapped = view
        .items
        .iter()
        .map(|label| item_lines(label, text_width, style.text_overflow))
        .collect::<Vec<_>>();
    let separator = usize::from(style.show_borders);

    let first = first_visible_item(&wrapped, view.selection, inner_height, separator);
    let mut rows = Vec::new();
    let mut separators = Vec::new();
    let mut used = 0_usize;
    for (index, lines) in wrapped.into_iter().enumerate().skip(first) {
        let gap = if index > first { separator } else { 0 };
        if used + gap >= inner_height {
            break;
        }
        if gap > 0 {
            separators.push(Rect::new(anchor.x + 1, top + 1 + used as u16, width - 2, 1));
            used += gap;
        }
        let available = inner_height - used;
        let height = lines.len().min(available);
        rows.push(PopupRow {
            index,
            area: Rect::new(anchor.x + 1, top + 1 + used as u16, width - 2, height as u16),
            lines: lines.into_iter().take(height).collect(),
        });
        used += height;
    }

    let height = (used + 2) as u16;
    Some(PopupLayout {
        area: Rect::new(anchor.x, top, width, height.max(MIN_POPUP_HEIGHT)),
        rows,
        separators,
    })
}

fn first_visible_item(
    wrapped: &[Vec<String>],
    selection: Option<usize>,
    inner_height: usize,
    separator: usize,
) -> usize {
    let Some(selected) = selection.filter(|index| *index < wrapped.len()) else {
        return 0;
    };
    let mut first = selected;
    let mut total = wrapped[selected].len();
    while first > 0 {
        let extra = wrapped[first - 1].len() + separator;
        if total + extra > inner_height {
            break;
        }
        total += extra;
        first -= 1;
    }
    first
}

/// Splits `label` into lines of at most `width` terminal cells.
pub fn item_lines(label: &str, width: usize, overflow: TextOverflow) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    if label.width() <= width {
        return vec![label.to_owned()];
    }
    match overflow {
        TextOverflow::Ellipsis => vec![truncate_with_ellipsis(label, width)],
        TextOverflow::Wrap => textwrap::wrap(label, Options::new(width))
            .into_iter()
            .map(Cow::into_owned)
            .collect(),
    }
}

fn truncate_with_ellipsis(label: &str, width: usize) -> String {
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut line = String::new();
    for ch in label.chars() {
        let cells = ch.width().unwrap_or(0);
        if used + cells > budget {
            break;
        }
        used += cells;
        line.push(ch);
    }
    line.push('…');
    line
}

pub fn draw_popup(frame: &mut Frame<'_>, view: &PopupView, style: &PopupStyle, screen: Rect) {
    let Some(layout) = layout_popup(view, style, screen) else {
        return;
    };

    let base = Style::default().fg(style.foreground).bg(style.background);
    frame.render_widget(Clear, layout.area);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(if style.rounded {
                BorderType::Rounded
            } else {
                BorderType::Plain
            })
            .border_style(Style::default().fg(style.border).bg(style.background))
            .style(base),
        layout.area,
    );

    for separator in &layout.separators {
        let rule = "─".repeat(usize::from(separator.width));
        frame.render_widget(
            Paragraph::new(rule).style(Style::default().fg(style.border).bg(style.background)),
            *separator,
        );
    }

    for row in &layout.rows {
        let row_style = if view.selection == Some(row.index) {
            base.bg(style.hover)
        } else {
            base
        };
        let lines = row
            .lines
            .iter()
            .map(|line| Line::from(line.clone()))
            .collect::<Vec<_>>();
        frame.render_widget(
            Paragraph::new(lines)
                .style(row_style)
                .block(Block::default().padding(Padding::horizontal(style.item_padding))),
            row.area,
        );
    }
}

fn rect_contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
