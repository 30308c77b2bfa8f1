use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use polars::prelude::IntoLazy;
use std::sync::mpsc::Sender;
use tracing::{debug, info};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod error_display;
pub mod filter;
pub mod logging;
pub mod preset;
pub mod selection;
pub mod widgets;

pub use albumgrid_cli::{Args, LogLevel};
pub use cache::CacheManager;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use error::PresetError;
pub use filter::{ColumnKind, FilterDefinition, FilterOperation, FilterValue, Predicate};
pub use preset::{Preset, PresetList, PresetStore};
pub use selection::{Selection, SelectionChange, SelectionController, SubscriptionId};

use error_display::user_message_from_preset;
use widgets::controls::Controls;
use widgets::datatable::{DataTable, DataTableState};
use widgets::debug::DebugState;
use widgets::filter_row::{FilterRow, FilterRowAction, FilterRowStyle};
use widgets::preset_picker::{PresetPicker, PresetPickerAction};

pub const APP_NAME: &str = "albumgrid";

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    /// The user edited the filter
    Filter(FilterDefinition),
    /// The controller accepted a change
    Selection(Selection),
    Resize(u16, u16), // resized (width, height)
    Exit,
    Crash(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Filtering,
    Presets,
}

/// Startup options resolved from CLI flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppOptions {
    pub row_numbers: bool,
    pub row_start_index: usize,
    pub case_sensitive: bool,
    pub initial_preset: Option<String>,
    pub debug: bool,
    pub event_poll_interval_ms: u64,
}

impl AppOptions {
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        Self {
            row_numbers: args.row_numbers || config.display.row_numbers,
            row_start_index: args
                .row_start_index
                .unwrap_or(config.display.row_start_index),
            case_sensitive: args.case_sensitive || config.filtering.case_sensitive_contains,
            initial_preset: args
                .preset
                .clone()
                .or_else(|| config.presets.initial.clone()),
            debug: args.debug || config.debug.enabled,
            event_poll_interval_ms: config.performance.event_poll_interval_ms,
        }
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_args_and_config(&Args::default(), &AppConfig::default())
    }
}

const HELP_TEXT: &str = "\
Main view
  ↑/k ↓/j     Move the row cursor
  p           Choose a preset (\"None\" clears the filter)
  f           Edit the filter
  s           Save the current filter as a preset
              (only while the filter is not a saved preset)
  c           Clear the filter
  ?  Ctrl-h   This help
  q           Quit

Filter editor
  Tab/S-Tab   Next/previous field
  ←/→         Change column or operation
  type        Set the value; an empty value removes the condition
  d           Remove the highlighted condition
  Ctrl-x      Remove all conditions
  Esc         Close

Any edit turns the filter into an unsaved one. Saving under an existing
name replaces that preset.
";

/// Message shown in the status line until the next key in the main view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Info(text) | StatusMessage::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusMessage::Error(_))
    }
}

pub struct App {
    controller: SelectionController,
    table: DataTableState,
    pub filter_row: FilterRow,
    pub picker: PresetPicker,
    pub input_mode: InputMode,
    debug: DebugState,
    show_help: bool,
    help_scroll: usize,
    status: Option<StatusMessage>,
    theme: Theme,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> Result<App> {
        Self::new_with_config(
            events,
            Theme::default(),
            &AppConfig::default(),
            &AppOptions::default(),
        )
    }

    pub fn new_with_config(
        events: Sender<AppEvent>,
        theme: Theme,
        app_config: &AppConfig,
        options: &AppOptions,
    ) -> Result<App> {
        let store = app_config.presets.store()?;
        let mut controller = SelectionController::new(store);
        controller.subscribe(move |change| {
            if events
                .send(AppEvent::Selection(change.selection.clone()))
                .is_err()
            {
                debug!("event channel closed, dropping selection change");
            }
        });

        let columns = dataset::columns();
        let table = DataTableState::new(dataset::albums()?.lazy(), columns)?
            .with_case_sensitive(options.case_sensitive)
            .with_row_numbers(options.row_numbers, options.row_start_index);

        let mut app = App {
            controller,
            table,
            filter_row: FilterRow::new(columns),
            picker: PresetPicker::new(),
            input_mode: InputMode::Normal,
            debug: DebugState::default(),
            show_help: false,
            help_scroll: 0,
            status: None,
            theme,
        };
        app.debug.enabled = options.debug;
        app.debug.num_presets = app.controller.presets().len();
        app.debug.selection_index = app.controller.selection().raw_index();

        if let Some(name) = options.initial_preset.as_deref() {
            app.controller.select_preset_by_name(name)?;
            info!(preset = name, "initial preset selected");
        }
        Ok(app)
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn table(&self) -> &DataTableState {
        &self.table
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    /// Bring the grid, filter editor and picker in line with an accepted change
    fn apply_selection(&mut self, selection: &Selection) {
        self.table.filter(selection.filter.clone());
        self.filter_row.sync(&selection.filter);
        self.picker.sync(self.controller.presets(), selection);
        self.debug.selection_index = selection.raw_index();
        self.debug.num_presets = self.controller.presets().len();
    }

    fn select_preset(&mut self, index: Option<usize>) {
        self.debug.last_action = "select_preset".to_string();
        if let Err(e) = self.controller.select_preset(index) {
            self.status = Some(StatusMessage::Error(user_message_from_preset(&e)));
        }
    }

    fn save_preset(&mut self, name: &str) {
        self.debug.last_action = "save_preset".to_string();
        match self.controller.save_current_as_preset(name) {
            Ok(_) => {
                self.picker.close();
                self.input_mode = InputMode::Normal;
                self.status = Some(StatusMessage::Info(format!(
                    "Saved preset \"{}\"",
                    name.trim()
                )));
            }
            Err(e) => self.picker.set_error(user_message_from_preset(&e)),
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if self.show_help {
            match event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Char('h') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.help_scroll = self.help_scroll.saturating_add(1);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.help_scroll = self.help_scroll.saturating_sub(1);
                }
                KeyCode::Home => self.help_scroll = 0,
                _ => {}
            }
            return None;
        }

        if event.code == KeyCode::Char('h') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.show_help = true;
            return None;
        }

        match self.input_mode {
            InputMode::Filtering => match self.filter_row.handle_key(event)? {
                FilterRowAction::Edit(definition) => {
                    self.debug.last_action = "edit_filter".to_string();
                    Some(AppEvent::Filter(definition))
                }
                FilterRowAction::Close => {
                    self.input_mode = InputMode::Normal;
                    None
                }
            },
            InputMode::Presets => {
                match self.picker.handle_key(event)? {
                    PresetPickerAction::Select(index) => {
                        self.input_mode = InputMode::Normal;
                        self.select_preset(index);
                    }
                    PresetPickerAction::Save(name) => self.save_preset(&name),
                    PresetPickerAction::Close => self.input_mode = InputMode::Normal,
                }
                None
            }
            InputMode::Normal => self.normal_key(event),
        }
    }

    fn normal_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.status = None;
        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Exit),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(AppEvent::Exit)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.table.select_next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.table.select_previous();
                None
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                None
            }
            KeyCode::Char('p') => {
                self.picker
                    .open(self.controller.presets(), self.controller.selection());
                self.input_mode = InputMode::Presets;
                None
            }
            KeyCode::Char('f') => {
                self.filter_row.open(&self.controller.selection().filter);
                self.input_mode = InputMode::Filtering;
                None
            }
            KeyCode::Char('s') => {
                if self.controller.selection().is_attached() {
                    self.status = Some(StatusMessage::Info(
                        "Already a saved preset; edit the filter to save a new one".to_string(),
                    ));
                } else {
                    self.picker
                        .open_save(self.controller.presets(), self.controller.selection());
                    self.input_mode = InputMode::Presets;
                }
                None
            }
            KeyCode::Char('c') => {
                self.select_preset(None);
                None
            }
            _ => None,
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Filter(definition) => {
                self.controller.edit_filter(definition.clone());
                None
            }
            AppEvent::Selection(selection) => {
                self.apply_selection(selection);
                None
            }
            AppEvent::Resize(_, _) => None,
            // handled by the event loop
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(message) = self.status.as_ref() {
            let color = if message.is_error() {
                self.color("error")
            } else {
                self.color("primary")
            };
            return Line::from(Span::styled(
                message.text().to_string(),
                Style::default().fg(color),
            ));
        }
        let selection = self.controller.selection();
        let preset = selection
            .index
            .and_then(|i| self.controller.store().get(i))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "None".to_string());
        Line::from(vec![
            Span::styled(
                " Preset: ",
                Style::default().fg(self.color("dimmed")),
            ),
            Span::styled(
                preset,
                Style::default()
                    .fg(self.color("primary"))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Filter: ", Style::default().fg(self.color("dimmed"))),
            Span::raw(selection.filter.describe()),
        ])
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(area, 70, 70);
        Clear.render(popup, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.color("modal_border")))
            .title("Help")
            .title_bottom("Esc: close");
        Paragraph::new(HELP_TEXT)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.help_scroll as u16, 0))
            .render(popup, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let mut constraints = vec![
            Constraint::Fill(1),   // grid
            Constraint::Length(1), // status
            Constraint::Length(1), // controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let main_area = layout[0];
        let mut data_area = main_area;
        let mut side_area = Rect::default();
        if self.filter_row.active {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(50)])
                .split(main_area);
            data_area = chunks[0];
            side_area = chunks[1];
        }

        let table = DataTable::new()
            .with_colors(
                self.color("table_header"),
                self.color("row_numbers"),
                self.color("table_border"),
                self.color("error"),
            )
            .with_title(format!(" Albums ({}) ", self.table.num_rows));
        table.render(data_area, buf, &mut self.table);

        if self.filter_row.active {
            let style = FilterRowStyle {
                border: self.color("modal_border_active"),
                active: self.color("modal_border_active"),
                dimmed: self.color("dimmed"),
            };
            self.filter_row.render_with(side_area, buf, &style);
        }

        if self.picker.active {
            let border = self.color("modal_border");
            let error = self.color("error");
            let popup = centered_rect(main_area, 50, 50);
            self.picker.render_with(popup, buf, border, error);
        }

        if self.show_help {
            self.render_help(main_area, buf);
        }

        Paragraph::new(self.status_line()).render(layout[1], buf);

        let is_modal_active =
            self.show_help || self.input_mode != InputMode::Normal;
        let selection = self.controller.selection();
        let controls = Controls::with_row_count(self.table.num_rows)
            .with_dimmed(is_modal_active)
            .with_can_save(!selection.is_attached())
            .with_filter_active(!selection.filter.is_empty());
        (&controls).render(layout[2], buf);

        if self.debug.enabled && layout.len() > 3 {
            (&self.debug).render(layout[3], buf);
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
