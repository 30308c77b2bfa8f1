use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use super::text_input::{TextInput, TextInputEvent};
use crate::preset::PresetList;
use crate::selection::Selection;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum PresetPickerMode {
    #[default]
    List,
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetPickerAction {
    /// `None` is the "None" row
    Select(Option<usize>),
    Save(String),
    Close,
}

/// Dropdown of saved presets plus the "save as" name prompt.
///
/// Row 0 is "None"; row `i + 1` is preset `i`.
#[derive(Default)]
pub struct PresetPicker {
    pub active: bool,
    pub mode: PresetPickerMode,
    pub list_state: ListState,
    presets: PresetList,
    attached: Option<usize>,
    pub name_input: TextInput,
    pub name_error: Option<String>,
}

impl PresetPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, presets: PresetList, selection: &Selection) {
        self.active = true;
        self.mode = PresetPickerMode::List;
        self.name_error = None;
        self.sync(presets, selection);
        self.list_state.select(Some(self.attached.map(|i| i + 1).unwrap_or(0)));
    }

    /// Open straight into the name prompt
    pub fn open_save(&mut self, presets: PresetList, selection: &Selection) {
        self.open(presets, selection);
        self.enter_save_mode();
    }

    pub fn close(&mut self) {
        self.active = false;
        self.mode = PresetPickerMode::List;
        self.name_input.set_focused(false);
        self.name_error = None;
    }

    pub fn sync(&mut self, presets: PresetList, selection: &Selection) {
        self.presets = presets;
        self.attached = selection.index;
        let last = self.presets.len();
        if let Some(row) = self.list_state.selected() {
            self.list_state.select(Some(row.min(last)));
        }
    }

    pub fn presets(&self) -> &PresetList {
        &self.presets
    }

    /// Saving is offered only while the filter is not attached to a preset
    pub fn can_save(&self) -> bool {
        self.attached.is_none()
    }

    pub fn enter_save_mode(&mut self) {
        self.mode = PresetPickerMode::Save;
        self.name_error = None;
        self.name_input.clear();
        self.name_input.set_focused(true);
    }

    /// Show a refused save under the name prompt; the prompt stays open
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.name_error = Some(message.into());
    }

    /// Preset index of the highlighted row
    pub fn highlighted(&self) -> Option<usize> {
        self.list_state.selected().and_then(|row| row.checked_sub(1))
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<PresetPickerAction> {
        match self.mode {
            PresetPickerMode::List => self.handle_list_key(event),
            PresetPickerMode::Save => self.handle_save_key(event),
        }
    }

    fn handle_list_key(&mut self, event: &KeyEvent) -> Option<PresetPickerAction> {
        let rows = self.presets.len() + 1;
        match event.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('p') => {
                self.close();
                Some(PresetPickerAction::Close)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let row = self.list_state.selected().unwrap_or(0);
                self.list_state.select(Some(row.saturating_sub(1)));
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let row = self.list_state.selected().map(|r| r + 1).unwrap_or(0);
                self.list_state.select(Some(row.min(rows - 1)));
                None
            }
            KeyCode::Home => {
                self.list_state.select(Some(0));
                None
            }
            KeyCode::End => {
                self.list_state.select(Some(rows - 1));
                None
            }
            KeyCode::Enter => {
                let index = self.highlighted();
                self.close();
                Some(PresetPickerAction::Select(index))
            }
            KeyCode::Char('s') if self.can_save() => {
                self.enter_save_mode();
                None
            }
            _ => None,
        }
    }

    fn handle_save_key(&mut self, event: &KeyEvent) -> Option<PresetPickerAction> {
        match self.name_input.handle_key(event) {
            TextInputEvent::Submit => Some(PresetPickerAction::Save(
                self.name_input.value().to_string(),
            )),
            TextInputEvent::Cancel => {
                self.close();
                Some(PresetPickerAction::Close)
            }
            TextInputEvent::Changed => {
                self.name_error = None;
                None
            }
            TextInputEvent::None => None,
        }
    }
}

impl PresetPicker {
    pub fn render_with(&mut self, area: Rect, buf: &mut Buffer, border: Color, error: Color) {
        Clear.render(area, buf);
        match self.mode {
            PresetPickerMode::List => self.render_list(area, buf, border),
            PresetPickerMode::Save => self.render_save(area, buf, border, error),
        }
    }

    fn render_list(&mut self, area: Rect, buf: &mut Buffer, border: Color) {
        let mut items = vec![ListItem::new(Line::from(Span::styled(
            "None",
            Style::default().add_modifier(Modifier::ITALIC),
        )))];
        items.extend(self.presets.iter().enumerate().map(|(i, preset)| {
            let marker = if self.attached == Some(i) { "● " } else { "  " };
            ListItem::new(format!("{}{}", marker, preset.name))
        }));

        let hint = if self.can_save() {
            "Enter: select  s: save current  Esc: close"
        } else {
            "Enter: select  Esc: close"
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title("Presets")
                    .title_bottom(hint),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, area, buf, &mut self.list_state);
    }

    fn render_save(&self, area: Rect, buf: &mut Buffer, border: Color, error: Color) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("Save filter as preset")
            .title_bottom("Enter: save  Esc: cancel");
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .split(inner);
        Paragraph::new("Name (an existing name is overwritten):").render(layout[0], buf);
        (&self.name_input).render(layout[1], buf);
        if let Some(message) = self.name_error.as_deref() {
            Paragraph::new(message)
                .style(Style::default().fg(error))
                .render(layout[2], buf);
        }
    }
}
