use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Changed, // Text was edited
    Submit,  // Enter pressed
    Cancel,  // Esc pressed
}

/// Single-line text input widget wrapping tui-textarea
pub struct TextInput {
    textarea: TextArea<'static>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut widget = Self {
            textarea: TextArea::default(),
            focused: false,
        };
        widget.apply_style();
        widget
    }

    fn apply_style(&mut self) {
        let style = Style::default();
        self.textarea.set_style(style);
        // No underline on the cursor line
        self.textarea.set_cursor_line_style(Style::default());
        // Setting the same style as the text hides the cursor
        let cursor_style = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        self.textarea.set_cursor_style(cursor_style);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_style();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        self.textarea
            .lines()
            .first()
            .map(|s| s.as_str())
            .unwrap_or_default()
    }

    /// Replace the text and put the cursor at the end
    pub fn set_value(&mut self, value: &str) {
        let single_line = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![single_line]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.set_value("");
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => TextInputEvent::Submit,
            KeyCode::Esc => TextInputEvent::Cancel,
            // vertical movement and tabs mean nothing on a single line
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => TextInputEvent::None,
            _ => {
                let before = self.value().to_string();
                self.textarea.input(key_event_to_input(event));
                if self.value() != before {
                    TextInputEvent::Changed
                } else {
                    TextInputEvent::None
                }
            }
        }
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Null,
    };

    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.textarea.render(area, buf);
    }
}
