use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "select_preset") for debugging key handling.
    pub last_action: String,
    /// Raw selection index as the grid sees it (-1 when detached)
    pub selection_index: i64,
    pub num_presets: usize,
    pub enabled: bool,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(format!(
            "events={} keys={} last_key={} last_action={} frames={} selection={} presets={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_action,
            self.num_frames,
            self.selection_index,
            self.num_presets,
        ))
        .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_on_key_counts() {
        let mut debug = DebugState::default();
        debug.on_key(&KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE));
        debug.on_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(debug.num_key_events, 2);
        assert_eq!(debug.last_key_event_name, "Enter");
    }
}
