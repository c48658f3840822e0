// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod form;
pub mod popup;
pub mod style;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use digipop_app::{
    CommitAnchor, CommitSkip, Dataset, Key, PopupController, PopupEvent, TriggerRule,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

pub use form::{Form, TextField};
pub use popup::{PopupView, TuiRenderer};
pub use style::{PopupStyle, StyleOverrides, TextOverflow};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

pub trait AppRuntime {
    fn dataset_source(&self) -> String;
    /// Starts the one-shot dataset load. The result arrives as
    /// [`InternalEvent::DatasetLoaded`].
    fn spawn_dataset_load(&mut self, tx: Sender<InternalEvent>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    DatasetLoaded(Dataset),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppOptions {
    pub trigger: TriggerRule,
    pub anchor: CommitAnchor,
    pub style: PopupStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DatasetStatus {
    Loading,
    Loaded(usize),
}

struct ViewData {
    form: Form,
    controller: PopupController<TuiRenderer>,
    style: PopupStyle,
    marker: String,
    source: String,
    dataset: DatasetStatus,
    screen: Rect,
    pointer_over_popup: bool,
    status_line: Option<String>,
    status_token: u64,
}

impl ViewData {
    fn new(options: AppOptions, source: String) -> Self {
        let marker = options.trigger.marker().to_owned();
        Self {
            form: Form::demo(&marker),
            controller: PopupController::new(
                TuiRenderer::default(),
                options.trigger,
                options.anchor,
            ),
            style: options.style,
            marker,
            source,
            dataset: DatasetStatus::Loading,
            screen: Rect::default(),
            pointer_over_popup: false,
            status_line: None,
            status_token: 0,
        }
    }

    fn resize(&mut self, screen: Rect) {
        self.screen = screen;
        self.form.set_area(screen_layout(screen)[1]);
    }
}

pub fn run_app<R: AppRuntime>(options: AppOptions, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options, runtime.dataset_source());
    let result = event_loop(&mut terminal, &mut view_data, runtime);

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn event_loop<R: AppRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view_data: &mut ViewData,
    runtime: &mut R,
) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    if let Err(error) = runtime.spawn_dataset_load(internal_tx.clone()) {
        emit_status(view_data, &internal_tx, format!("load failed: {error}"));
    }

    loop {
        process_internal_events(view_data, &internal_tx, &internal_rx);

        let size = terminal.size().context("read terminal size")?;
        view_data.resize(Rect::new(0, 0, size.width, size.height));
        terminal
            .draw(|frame| render(frame, view_data))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if handle_key_event(view_data, &internal_tx, key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => handle_mouse_event(view_data, &internal_tx, mouse),
            _ => {}
        }
    }
}

fn process_internal_events(
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::DatasetLoaded(dataset) => {
                let count = dataset.len();
                if view_data.controller.install_dataset(dataset) {
                    view_data.dataset = DatasetStatus::Loaded(count);
                    let message = if count == 0 {
                        "no records loaded; see the log for details".to_owned()
                    } else {
                        format!("loaded {count} records")
                    };
                    emit_status(view_data, tx, message);
                }
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn popup_key(key: KeyEvent) -> Key {
    match key.code {
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Key::Char(ch)
        }
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        _ => Key::Other,
    }
}

/// Returns `true` when the app should quit.
fn handle_key_event(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            let events = view_data.controller.dismiss();
            report_events(view_data, internal_tx, &events);
            if key.code == KeyCode::Tab {
                view_data.form.focus_next();
            } else {
                view_data.form.focus_prev();
            }
            return false;
        }
        _ => {}
    }

    let handled = view_data
        .controller
        .handle_key(&mut view_data.form, popup_key(key));
    report_events(view_data, internal_tx, &handled.events);
    if !handled.consumed {
        view_data.form.apply_default(key);
    }
    false
}

fn handle_mouse_event(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    let layout = popup::layout_popup(
        view_data.controller.renderer().view(),
        &view_data.style,
        view_data.screen,
    );
    let hit = layout
        .as_ref()
        .and_then(|layout| layout.row_at(mouse.column, mouse.row));
    let inside = layout
        .as_ref()
        .is_some_and(|layout| layout.contains(mouse.column, mouse.row));

    match mouse.kind {
        MouseEventKind::Moved => {
            if let Some(index) = hit {
                if view_data.controller.session().selection() != Some(index) {
                    view_data.controller.hover(index);
                }
                view_data.pointer_over_popup = true;
            } else if view_data.pointer_over_popup {
                view_data.pointer_over_popup = false;
                view_data.controller.hover_leave();
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = hit {
                let events = view_data.controller.click(&mut view_data.form, index);
                report_events(view_data, internal_tx, &events);
            } else if !inside {
                let events = view_data.controller.click_outside();
                report_events(view_data, internal_tx, &events);
                view_data.form.click_at(mouse.column, mouse.row);
            }
        }
        _ => {}
    }
}

fn report_events(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[PopupEvent],
) {
    for event in events {
        debug!(?event, "popup event");
        match event {
            PopupEvent::Committed { record, .. } => {
                emit_status(view_data, internal_tx, format!("inserted {record}"));
            }
            PopupEvent::CommitSkipped(CommitSkip::DetachedTarget) => {
                emit_status(view_data, internal_tx, "field is gone; nothing inserted");
            }
            PopupEvent::CommitSkipped(CommitSkip::EditRejected) => {
                emit_status(view_data, internal_tx, "field rejected the edit");
            }
            _ => {}
        }
    }
}

fn screen_layout(area: Rect) -> [Rect; 3] {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area);
    [layout[0], layout[1], layout[2]]
}

fn render(frame: &mut ratatui::Frame<'_>, view_data: &ViewData) {
    let [header_area, _, status_area] = screen_layout(frame.area());

    let header = Paragraph::new(header_text(view_data)).block(
        Block::default()
            .title("digipop")
            .borders(Borders::ALL)
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
    );
    frame.render_widget(header, header_area);

    form::draw_form(frame, &view_data.form, &view_data.marker);

    let status = Paragraph::new(status_text(view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, status_area);

    popup::draw_popup(
        frame,
        view_data.controller.renderer().view(),
        &view_data.style,
        frame.area(),
    );
}

fn header_text(view_data: &ViewData) -> String {
    let dataset = match view_data.dataset {
        DatasetStatus::Loading => "loading".to_owned(),
        DatasetStatus::Loaded(count) => format!("{count} records"),
    };
    format!("{} ({dataset})", view_data.source)
}

fn status_text(view_data: &ViewData) -> String {
    if let Some(status) = &view_data.status_line {
        return status.clone();
    }
    let session = view_data.controller.session();
    if session.is_active() {
        let selected = session
            .selected_record()
            .map_or_else(String::new, |record| format!("  [{}]", record.label()));
        return format!(
            "#{}  {} match(es){selected}  up/down select  enter insert  esc close",
            session.buffer(),
            session.filtered().len()
        );
    }
    "type digits in a [#] field  tab next field  ctrl+q quit".to_owned()
}
