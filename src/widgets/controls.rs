use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct Controls {
    pub row_count: Option<usize>,
    pub dimmed: bool,
    /// Save is only offered while the filter is detached
    pub can_save: bool,
    pub filter_active: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(row_count: usize) -> Self {
        Self {
            row_count: Some(row_count),
            ..Self::default()
        }
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_can_save(mut self, can_save: bool) -> Self {
        self.can_save = can_save;
        self
    }

    pub fn with_filter_active(mut self, filter_active: bool) -> Self {
        self.filter_active = filter_active;
        self
    }

    fn entries(&self) -> Vec<(&'static str, &'static str)> {
        let mut entries = vec![("p", "Presets"), ("f", "Filter")];
        if self.can_save {
            entries.push(("s", "Save"));
        }
        entries.extend([("c", "Clear"), ("?", "Help"), ("q", "Quit")]);
        entries
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let entries = self.entries();

        let mut constraints = entries.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });

        if self.row_count.is_some() {
            constraints.push(Constraint::Length(12)); // "Rows: 11"
        }
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let color = Color::DarkGray;

        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in entries.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            // highlight "Filter" while a filter is applied
            let action_style = if *action == "Filter" && self.filter_active {
                base_style.bg(color).fg(Color::Cyan)
            } else {
                base_style.bg(color)
            };
            Paragraph::new(*action)
                .style(action_style)
                .render(layout[j + 1], buf);
        }

        let mut fill_start_idx = entries.len() * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", count))
                .style(base_style.bg(color).fg(if self.dimmed {
                    Color::DarkGray
                } else {
                    Color::White
                }))
                .right_aligned()
                .render(layout[fill_start_idx], buf);
            fill_start_idx += 1;
        }

        Paragraph::new("")
            .style(base_style.bg(color))
            .render(layout[fill_start_idx], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_entry_only_when_detached() {
        let attached = Controls::with_row_count(3);
        assert!(!attached.entries().iter().any(|(key, _)| *key == "s"));
        let detached = Controls::with_row_count(3).with_can_save(true);
        assert!(detached.entries().iter().any(|(key, _)| *key == "s"));
    }

    #[test]
    fn test_render_row_count() {
        let controls = Controls::with_row_count(11);
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        (&controls).render(area, &mut buf);
        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(line.contains("Presets"));
        assert!(line.contains("Rows: 11"));
    }
}
