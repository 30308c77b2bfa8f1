use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use super::text_input::{TextInput, TextInputEvent};
use crate::dataset::ColumnSpec;
use crate::filter::{FilterDefinition, FilterOperation, FilterValue, Predicate};

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum FilterRowFocus {
    #[default]
    Column,
    Operation,
    Value,
    Predicates,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterRowAction {
    /// The user changed the filter; the new definition replaces the active one
    Edit(FilterDefinition),
    Close,
}

/// Filter editor: one condition per column, edited in place.
///
/// Typing a value filters immediately. Clearing a value removes that
/// column's condition.
pub struct FilterRow {
    pub active: bool,
    columns: Vec<ColumnSpec>,
    pub column_idx: usize,
    pub operation_idx: usize,
    pub value: TextInput,
    pub focus: FilterRowFocus,
    pub list_state: ListState,
    definition: FilterDefinition,
}

impl FilterRow {
    pub fn new(columns: &[ColumnSpec]) -> Self {
        Self {
            active: false,
            columns: columns.to_vec(),
            column_idx: 0,
            operation_idx: 0,
            value: TextInput::new(),
            focus: FilterRowFocus::default(),
            list_state: ListState::default(),
            definition: FilterDefinition::new(),
        }
    }

    pub fn open(&mut self, current: &FilterDefinition) {
        self.active = true;
        self.focus = FilterRowFocus::Column;
        self.sync(current);
        self.load_column();
    }

    pub fn close(&mut self) {
        self.active = false;
        self.value.set_focused(false);
    }

    /// Mirror the active filter after it changed elsewhere (preset selected, saved, cleared)
    pub fn sync(&mut self, current: &FilterDefinition) {
        if &self.definition == current {
            return;
        }
        self.definition = current.clone();
        if self.definition.is_empty() {
            self.list_state.select(None);
        } else {
            let last = self.definition.len() - 1;
            let selected = self.list_state.selected().map(|i| i.min(last));
            self.list_state.select(selected.or(Some(0)));
        }
        if self.focus != FilterRowFocus::Value {
            self.load_column();
        }
    }

    pub fn definition(&self) -> &FilterDefinition {
        &self.definition
    }

    pub fn current_column(&self) -> Option<&ColumnSpec> {
        self.columns.get(self.column_idx)
    }

    pub fn operations(&self) -> Vec<FilterOperation> {
        self.current_column()
            .map(|c| c.kind.operations())
            .unwrap_or_default()
    }

    pub fn current_operation(&self) -> Option<FilterOperation> {
        self.operations().get(self.operation_idx).copied()
    }

    /// Load the editor fields from the condition on the current column, if any
    fn load_column(&mut self) {
        let Some(column) = self.current_column().copied() else {
            return;
        };
        match self.definition.for_field(column.name).cloned() {
            Some(predicate) => {
                self.operation_idx = self
                    .operations()
                    .iter()
                    .position(|op| *op == predicate.operation)
                    .unwrap_or(0);
                self.value.set_value(&predicate.value.to_string());
            }
            None => {
                self.operation_idx = 0;
                self.value.clear();
            }
        }
    }

    fn cycle_column(&mut self, forward: bool) {
        if self.columns.is_empty() {
            return;
        }
        let n = self.columns.len();
        self.column_idx = if forward {
            (self.column_idx + 1) % n
        } else {
            (self.column_idx + n - 1) % n
        };
        self.load_column();
    }

    fn cycle_operation(&mut self, forward: bool) {
        let n = self.operations().len();
        if n == 0 {
            return;
        }
        self.operation_idx = if forward {
            (self.operation_idx + 1) % n
        } else {
            (self.operation_idx + n - 1) % n
        };
    }

    /// Definition that results from the editor fields
    pub fn build(&self) -> FilterDefinition {
        let (Some(column), Some(operation)) = (self.current_column(), self.current_operation())
        else {
            return self.definition.clone();
        };
        let raw = self.value.value();
        if raw.trim().is_empty() {
            return self.definition.without_field(column.name);
        }
        self.definition.with_field(Predicate::new(
            column.name,
            operation,
            FilterValue::parse(raw, column.kind),
        ))
    }

    /// Emit `next` as an edit if it differs from the active filter
    fn emit(&mut self, next: FilterDefinition) -> Option<FilterRowAction> {
        if next == self.definition {
            return None;
        }
        self.sync(&next);
        Some(FilterRowAction::Edit(next))
    }

    fn set_focus(&mut self, focus: FilterRowFocus) {
        self.focus = focus;
        self.value.set_focused(focus == FilterRowFocus::Value);
    }

    pub fn next_focus(&mut self) {
        self.set_focus(match self.focus {
            FilterRowFocus::Column => FilterRowFocus::Operation,
            FilterRowFocus::Operation => FilterRowFocus::Value,
            FilterRowFocus::Value if !self.definition.is_empty() => FilterRowFocus::Predicates,
            FilterRowFocus::Value | FilterRowFocus::Predicates => FilterRowFocus::Column,
        });
    }

    pub fn prev_focus(&mut self) {
        self.set_focus(match self.focus {
            FilterRowFocus::Column if !self.definition.is_empty() => FilterRowFocus::Predicates,
            FilterRowFocus::Column => FilterRowFocus::Value,
            FilterRowFocus::Operation => FilterRowFocus::Column,
            FilterRowFocus::Value => FilterRowFocus::Operation,
            FilterRowFocus::Predicates => FilterRowFocus::Value,
        });
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<FilterRowAction> {
        match event.code {
            KeyCode::Esc => {
                self.close();
                return Some(FilterRowAction::Close);
            }
            KeyCode::Tab => {
                self.next_focus();
                return None;
            }
            KeyCode::BackTab => {
                self.prev_focus();
                return None;
            }
            KeyCode::Char('x') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.clear();
                return self.emit(FilterDefinition::new());
            }
            _ => {}
        }

        match self.focus {
            FilterRowFocus::Column => {
                match event.code {
                    KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                        self.cycle_column(false)
                    }
                    KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                        self.cycle_column(true)
                    }
                    KeyCode::Enter => self.set_focus(FilterRowFocus::Operation),
                    _ => {}
                }
                None
            }
            FilterRowFocus::Operation => match event.code {
                KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                    self.cycle_operation(false);
                    self.emit(self.build())
                }
                KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                    self.cycle_operation(true);
                    self.emit(self.build())
                }
                KeyCode::Enter => {
                    self.set_focus(FilterRowFocus::Value);
                    None
                }
                _ => None,
            },
            FilterRowFocus::Value => match self.value.handle_key(event) {
                TextInputEvent::Changed | TextInputEvent::Submit => self.emit(self.build()),
                TextInputEvent::Cancel | TextInputEvent::None => None,
            },
            FilterRowFocus::Predicates => match event.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let i = self.list_state.selected().unwrap_or(0);
                    self.list_state.select(Some(i.saturating_sub(1)));
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let last = self.definition.len().saturating_sub(1);
                    let i = self.list_state.selected().map(|i| i + 1).unwrap_or(0);
                    self.list_state.select(Some(i.min(last)));
                    None
                }
                KeyCode::Delete | KeyCode::Backspace | KeyCode::Char('d') => {
                    let i = self.list_state.selected()?;
                    let next = self.definition.without(i);
                    if next.is_empty() {
                        self.set_focus(FilterRowFocus::Column);
                    }
                    self.emit(next)
                }
                KeyCode::Enter => {
                    // edit the selected condition in the editor fields
                    let i = self.list_state.selected()?;
                    let field = self.definition.predicates().get(i)?.field.clone();
                    self.column_idx = self.columns.iter().position(|c| c.name == field)?;
                    self.load_column();
                    self.set_focus(FilterRowFocus::Value);
                    None
                }
                _ => None,
            },
        }
    }
}

/// Colors for [`FilterRow`] rendering
pub struct FilterRowStyle {
    pub border: Color,
    pub active: Color,
    pub dimmed: Color,
}

impl Default for FilterRowStyle {
    fn default() -> Self {
        Self {
            border: Color::Cyan,
            active: Color::Yellow,
            dimmed: Color::DarkGray,
        }
    }
}

impl FilterRow {
    pub fn render_with(&mut self, area: Rect, buf: &mut Buffer, style: &FilterRowStyle) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(style.border))
            .title("Filter");
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // column
                Constraint::Length(1), // operation
                Constraint::Length(1), // value
                Constraint::Length(1),
                Constraint::Fill(1), // predicates
                Constraint::Length(1), // hint
            ])
            .split(inner);

        let label = |text: &'static str, focused: bool| {
            let s = if focused {
                Style::default()
                    .fg(style.active)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Span::styled(format!("{:<11}", text), s)
        };

        let column_title = self.current_column().map(|c| c.title).unwrap_or("-");
        Paragraph::new(Line::from(vec![
            label("Column", self.focus == FilterRowFocus::Column),
            Span::raw(format!("< {} >", column_title)),
        ]))
        .render(layout[0], buf);

        let operation = self
            .current_operation()
            .map(|op| op.as_str())
            .unwrap_or("-");
        Paragraph::new(Line::from(vec![
            label("Operation", self.focus == FilterRowFocus::Operation),
            Span::raw(format!("< {} >", operation)),
        ]))
        .render(layout[1], buf);

        let value_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(11), Constraint::Fill(1)])
            .split(layout[2]);
        Paragraph::new(Line::from(label(
            "Value",
            self.focus == FilterRowFocus::Value,
        )))
        .render(value_row[0], buf);
        (&self.value).render(value_row[1], buf);

        let items: Vec<ListItem> = self
            .definition
            .iter()
            .map(|p| ListItem::new(p.to_string()))
            .collect();
        let list_style = if self.focus == FilterRowFocus::Predicates {
            Style::default().fg(style.active)
        } else {
            Style::default().fg(style.dimmed)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(list_style)
                    .title("Conditions (AND)"),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, layout[4], buf, &mut self.list_state);

        Paragraph::new("Tab: next  ←/→: change  d: remove  ^x: clear  Esc: close")
            .style(Style::default().fg(style.dimmed))
            .render(layout[5], buf);
    }
}
