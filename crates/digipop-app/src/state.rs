// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Dataset, FieldId, Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    const fn step(self) -> isize {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitSkip {
    DetachedTarget,
    EditRejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start {
        target: FieldId,
        digit: char,
        start_offset: Option<usize>,
    },
    AppendDigit(char),
    Backspace,
    Navigate(Direction),
    Hover(usize),
    HoverLeave,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupEvent {
    SessionStarted { target: FieldId },
    BufferChanged(String),
    Filtered { matches: usize },
    SelectionChanged(Option<usize>),
    Shown,
    Hidden,
    Committed { target: FieldId, record: RecordId },
    CommitSkipped(CommitSkip),
    SessionClosed,
}

/// Per-controller popup session.
///
/// `selection` is `None` whenever `filtered` was just recomputed, and
/// `visible` holds exactly when a session is active and `filtered` is
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    buffer: String,
    target: Option<FieldId>,
    start_offset: Option<usize>,
    filtered: Vec<Record>,
    selection: Option<usize>,
    visible: bool,
}

impl Session {
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn target(&self) -> Option<FieldId> {
        self.target
    }

    pub fn start_offset(&self) -> Option<usize> {
        self.start_offset
    }

    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.selection.and_then(|index| self.filtered.get(index))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn dispatch(&mut self, command: SessionCommand, dataset: &Dataset) -> Vec<PopupEvent> {
        match command {
            SessionCommand::Start {
                target,
                digit,
                start_offset,
            } => {
                if self.is_active() || !digit.is_ascii_digit() {
                    return Vec::new();
                }
                self.target = Some(target);
                self.start_offset = start_offset;
                self.buffer.clear();
                self.buffer.push(digit);
                let mut events = vec![
                    PopupEvent::SessionStarted { target },
                    PopupEvent::BufferChanged(self.buffer.clone()),
                ];
                events.extend(self.refilter(dataset));
                events
            }
            SessionCommand::AppendDigit(digit) => {
                if !self.is_active() || !digit.is_ascii_digit() {
                    return Vec::new();
                }
                self.buffer.push(digit);
                let mut events = vec![PopupEvent::BufferChanged(self.buffer.clone())];
                events.extend(self.refilter(dataset));
                events
            }
            SessionCommand::Backspace => {
                if !self.is_active() || self.buffer.pop().is_none() {
                    return Vec::new();
                }
                if self.buffer.is_empty() {
                    return self.close();
                }
                let mut events = vec![PopupEvent::BufferChanged(self.buffer.clone())];
                events.extend(self.refilter(dataset));
                events
            }
            SessionCommand::Navigate(direction) => self.navigate(direction),
            SessionCommand::Hover(index) => {
                if !self.visible || index >= self.filtered.len() {
                    return Vec::new();
                }
                self.select(Some(index))
            }
            SessionCommand::HoverLeave => {
                if !self.visible {
                    return Vec::new();
                }
                self.select(None)
            }
            SessionCommand::Close => self.close(),
        }
    }

    fn refilter(&mut self, dataset: &Dataset) -> Vec<PopupEvent> {
        self.filtered = dataset.filter_prefix(&self.buffer);
        self.selection = None;

        let mut events = vec![
            PopupEvent::Filtered {
                matches: self.filtered.len(),
            },
            PopupEvent::SelectionChanged(None),
        ];
        let visible = !self.filtered.is_empty();
        if visible != self.visible {
            self.visible = visible;
            events.push(if visible {
                PopupEvent::Shown
            } else {
                PopupEvent::Hidden
            });
        }
        events
    }

    fn navigate(&mut self, direction: Direction) -> Vec<PopupEvent> {
        let len = self.filtered.len() as isize;
        if !self.visible || len == 0 {
            return Vec::new();
        }
        let current = self.selection.map_or(-1, |index| index as isize);
        let next = (current + direction.step() + len).rem_euclid(len) as usize;
        self.select(Some(next))
    }

    fn select(&mut self, selection: Option<usize>) -> Vec<PopupEvent> {
        self.selection = selection;
        vec![PopupEvent::SelectionChanged(selection)]
    }

    fn close(&mut self) -> Vec<PopupEvent> {
        if !self.is_active() && !self.visible {
            return Vec::new();
        }
        let was_visible = self.visible;
        *self = Self::default();

        let mut events = Vec::new();
        if was_visible {
            events.push(PopupEvent::Hidden);
        }
        events.push(PopupEvent::SessionClosed);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, PopupEvent, Session, SessionCommand};
    use crate::{Dataset, FieldId, Record};

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Record::new(1, "A"),
            Record::new(12, "B"),
            Record::new(13, "C"),
        ])
    }

    fn started(digit: char) -> Session {
        let mut session = Session::default();
        session.dispatch(
            SessionCommand::Start {
                target: FieldId::new(1),
                digit,
                start_offset: Some(0),
            },
            &dataset(),
        );
        session
    }

    fn filtered_ids(session: &Session) -> Vec<i64> {
        session
            .filtered()
            .iter()
            .map(|record| record.id.get())
            .collect()
    }

    #[test]
    fn start_filters_and_shows() {
        let mut session = Session::default();
        let events = session.dispatch(
            SessionCommand::Start {
                target: FieldId::new(3),
                digit: '1',
                start_offset: None,
            },
            &dataset(),
        );

        assert_eq!(session.buffer(), "1");
        assert_eq!(filtered_ids(&session), vec![1, 12, 13]);
        assert_eq!(session.selection(), None);
        assert!(session.is_visible());
        assert_eq!(
            events,
            vec![
                PopupEvent::SessionStarted {
                    target: FieldId::new(3)
                },
                PopupEvent::BufferChanged("1".to_owned()),
                PopupEvent::Filtered { matches: 3 },
                PopupEvent::SelectionChanged(None),
                PopupEvent::Shown,
            ]
        );
    }

    #[test]
    fn start_is_ignored_while_active() {
        let mut session = started('1');
        let events = session.dispatch(
            SessionCommand::Start {
                target: FieldId::new(9),
                digit: '2',
                start_offset: None,
            },
            &dataset(),
        );
        assert!(events.is_empty());
        assert_eq!(session.target(), Some(FieldId::new(1)));
        assert_eq!(session.buffer(), "1");
    }

    #[test]
    fn append_resets_selection() {
        let mut session = started('1');
        session.dispatch(SessionCommand::Navigate(Direction::Down), &dataset());
        assert_eq!(session.selection(), Some(0));

        session.dispatch(SessionCommand::AppendDigit('2'), &dataset());
        assert_eq!(session.buffer(), "12");
        assert_eq!(filtered_ids(&session), vec![12]);
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn empty_result_hides_but_keeps_buffer() {
        let mut session = started('1');
        let events = session.dispatch(SessionCommand::AppendDigit('9'), &dataset());

        assert!(session.is_active());
        assert!(!session.is_visible());
        assert_eq!(session.buffer(), "19");
        assert!(events.contains(&PopupEvent::Hidden));

        session.dispatch(SessionCommand::Backspace, &dataset());
        assert!(session.is_visible());
        assert_eq!(filtered_ids(&session), vec![1, 12, 13]);
    }

    #[test]
    fn non_digit_append_is_ignored() {
        let mut session = started('1');
        assert!(
            session
                .dispatch(SessionCommand::AppendDigit('x'), &dataset())
                .is_empty()
        );
        assert_eq!(session.buffer(), "1");
    }

    #[test]
    fn backspace_to_empty_closes_session() {
        let mut session = started('7');
        assert!(!session.is_visible());

        let events = session.dispatch(SessionCommand::Backspace, &dataset());
        assert_eq!(session.buffer(), "");
        assert!(!session.is_visible());
        assert_eq!(session.target(), None);
        assert_eq!(events, vec![PopupEvent::SessionClosed]);
    }

    #[test]
    fn navigation_wraps_in_both_directions() {
        let mut session = started('1');
        // No selection counts as -1, so Up lands on (-1 - 1 + 3) % 3.
        session.dispatch(SessionCommand::Navigate(Direction::Up), &dataset());
        assert_eq!(session.selection(), Some(1));

        session.dispatch(SessionCommand::Navigate(Direction::Down), &dataset());
        session.dispatch(SessionCommand::Navigate(Direction::Down), &dataset());
        assert_eq!(session.selection(), Some(0));

        session.dispatch(SessionCommand::Navigate(Direction::Up), &dataset());
        assert_eq!(session.selection(), Some(2));
    }

    #[test]
    fn navigating_n_times_returns_to_start() {
        let mut session = started('1');
        session.dispatch(SessionCommand::Hover(1), &dataset());
        let len = session.filtered().len();
        for _ in 0..len {
            session.dispatch(SessionCommand::Navigate(Direction::Down), &dataset());
        }
        assert_eq!(session.selection(), Some(1));
    }

    #[test]
    fn navigation_without_matches_is_noop() {
        let mut session = started('5');
        let events = session.dispatch(SessionCommand::Navigate(Direction::Down), &dataset());
        assert!(events.is_empty());
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn hover_then_leave_clears_selection() {
        let mut session = started('1');
        session.dispatch(SessionCommand::Navigate(Direction::Down), &dataset());
        session.dispatch(SessionCommand::Hover(2), &dataset());
        assert_eq!(session.selection(), Some(2));

        session.dispatch(SessionCommand::HoverLeave, &dataset());
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn hover_out_of_range_is_ignored() {
        let mut session = started('1');
        assert!(
            session
                .dispatch(SessionCommand::Hover(3), &dataset())
                .is_empty()
        );
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn close_resets_everything() {
        let mut session = started('1');
        session.dispatch(SessionCommand::Hover(0), &dataset());

        let events = session.dispatch(SessionCommand::Close, &dataset());
        assert_eq!(session, Session::default());
        assert_eq!(events, vec![PopupEvent::Hidden, PopupEvent::SessionClosed]);
        assert!(
            session
                .dispatch(SessionCommand::Close, &dataset())
                .is_empty()
        );
    }
}
