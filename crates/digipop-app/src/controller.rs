// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{
    Anchor, CommitAnchor, CommitSkip, Dataset, Direction, FieldId, FieldInfo, FieldSnapshot, Key,
    PopupEvent, Record, Session, SessionCommand, TriggerRule, replaced_range, splice_identifier,
};

/// Text fields the popup attaches to. Implemented by the host UI.
pub trait InputHost {
    fn focused(&self) -> Option<FieldInfo>;
    /// `None` when the field no longer exists.
    fn snapshot(&self, id: FieldId) -> Option<FieldSnapshot>;
    fn replace_text(&mut self, id: FieldId, text: &str, cursor: usize) -> Result<()>;
    fn focus(&mut self, id: FieldId) -> Result<()>;
}

/// Draws the popup. Pointer input flows back through
/// [`PopupController::hover`], [`PopupController::hover_leave`] and
/// [`PopupController::click`].
pub trait PopupRenderer {
    fn render(&mut self, items: &[Record], selection: Option<usize>);
    fn show(&mut self);
    fn hide(&mut self);
    fn position_near(&mut self, anchor: Anchor);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Handled {
    /// The host must skip its own handling of the key.
    pub consumed: bool,
    pub events: Vec<PopupEvent>,
}

impl Handled {
    fn passthrough(events: Vec<PopupEvent>) -> Self {
        Self {
            consumed: false,
            events,
        }
    }

    fn consumed(events: Vec<PopupEvent>) -> Self {
        Self {
            consumed: true,
            events,
        }
    }
}

pub struct PopupController<R> {
    renderer: R,
    session: Session,
    dataset: Dataset,
    dataset_installed: bool,
    trigger: TriggerRule,
    anchor: CommitAnchor,
}

impl<R: PopupRenderer> PopupController<R> {
    pub fn new(renderer: R, trigger: TriggerRule, anchor: CommitAnchor) -> Self {
        Self {
            renderer,
            session: Session::default(),
            dataset: Dataset::empty(),
            dataset_installed: false,
            trigger,
            anchor,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Installs the loaded dataset. Only the first call takes effect.
    pub fn install_dataset(&mut self, dataset: Dataset) -> bool {
        if self.dataset_installed {
            warn!("dataset already installed; ignoring {} records", dataset.len());
            return false;
        }
        info!(records = dataset.len(), "dataset installed");
        self.dataset = dataset;
        self.dataset_installed = true;
        true
    }

    /// Called before the host applies its default handling of `key`.
    pub fn handle_key<H: InputHost>(&mut self, host: &mut H, key: Key) -> Handled {
        if !self.session.is_active() {
            return Handled::passthrough(self.try_trigger(host, key));
        }

        match key {
            Key::Escape => Handled::consumed(self.apply(SessionCommand::Close)),
            Key::Down | Key::Up if self.session.is_visible() => {
                let direction = if key == Key::Down {
                    Direction::Down
                } else {
                    Direction::Up
                };
                Handled::consumed(self.apply(SessionCommand::Navigate(direction)))
            }
            Key::Enter => match self.session.selection() {
                Some(index) => Handled::consumed(self.commit(host, index)),
                None => Handled::default(),
            },
            Key::Backspace => Handled::passthrough(self.apply(SessionCommand::Backspace)),
            Key::Char(_) => match key.digit() {
                Some(digit) => Handled::passthrough(self.apply(SessionCommand::AppendDigit(digit))),
                None => Handled::default(),
            },
            Key::Up | Key::Down | Key::Other => Handled::default(),
        }
    }

    pub fn hover(&mut self, index: usize) -> Vec<PopupEvent> {
        self.apply(SessionCommand::Hover(index))
    }

    pub fn hover_leave(&mut self) -> Vec<PopupEvent> {
        self.apply(SessionCommand::HoverLeave)
    }

    pub fn click<H: InputHost>(&mut self, host: &mut H, index: usize) -> Vec<PopupEvent> {
        let mut events = self.hover(index);
        events.extend(self.commit(host, index));
        events
    }

    pub fn click_outside(&mut self) -> Vec<PopupEvent> {
        self.dismiss()
    }

    pub fn dismiss(&mut self) -> Vec<PopupEvent> {
        self.apply(SessionCommand::Close)
    }

    /// Splices `filtered[index]` into the target and closes the session.
    /// Invalid indexes and a missing target leave everything untouched.
    pub fn commit<H: InputHost>(&mut self, host: &mut H, index: usize) -> Vec<PopupEvent> {
        if !self.session.is_visible() {
            return Vec::new();
        }
        let Some(record) = self.session.filtered().get(index).cloned() else {
            return Vec::new();
        };
        let Some(target) = self.session.target() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        match host.snapshot(target) {
            None => {
                debug!(field = %target, "commit target detached");
                events.push(PopupEvent::CommitSkipped(CommitSkip::DetachedTarget));
            }
            Some(snapshot) => {
                let (start, end) = replaced_range(
                    self.anchor,
                    snapshot.cursor,
                    self.session.start_offset(),
                    self.session.buffer().chars().count(),
                );
                let splice = splice_identifier(&snapshot.text, start, end, &record.id_text());
                match host.replace_text(target, &splice.text, splice.cursor) {
                    Ok(()) => {
                        if let Err(error) = host.focus(target) {
                            warn!(field = %target, "restore focus after commit: {error:#}");
                        }
                        debug!(field = %target, record = %record.id, "committed");
                        events.push(PopupEvent::Committed {
                            target,
                            record: record.id,
                        });
                    }
                    Err(error) => {
                        warn!(field = %target, "commit edit rejected: {error:#}");
                        events.push(PopupEvent::CommitSkipped(CommitSkip::EditRejected));
                    }
                }
            }
        }

        events.extend(self.apply(SessionCommand::Close));
        events
    }

    fn try_trigger<H: InputHost>(&mut self, host: &H, key: Key) -> Vec<PopupEvent> {
        let Some(digit) = key.digit() else {
            return Vec::new();
        };
        let Some(field) = host.focused() else {
            return Vec::new();
        };
        if !self.trigger.is_trigger_element(&field) {
            return Vec::new();
        }

        let start_offset = host.snapshot(field.id).map(|snapshot| snapshot.cursor);
        debug!(
            field = %field.id,
            kind = field.kind.as_str(),
            "popup session triggered"
        );
        self.renderer.position_near(field.anchor);
        self.apply(SessionCommand::Start {
            target: field.id,
            digit,
            start_offset,
        })
    }

    fn apply(&mut self, command: SessionCommand) -> Vec<PopupEvent> {
        let events = self.session.dispatch(command, &self.dataset);
        self.sync_renderer(&events);
        events
    }

    fn sync_renderer(&mut self, events: &[PopupEvent]) {
        let redraw = events.iter().any(|event| {
            matches!(
                event,
                PopupEvent::Filtered { .. } | PopupEvent::SelectionChanged(_)
            )
        });
        if redraw {
            self.renderer
                .render(self.session.filtered(), self.session.selection());
        }

        for event in events {
            match event {
                PopupEvent::Shown => self.renderer.show(),
                PopupEvent::Hidden => self.renderer.hide(),
                _ => {}
            }
        }
    }
}
