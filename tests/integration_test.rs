use albumgrid::config::AppConfig;
use albumgrid::filter::{FilterOperation, Predicate};
use albumgrid::widgets::preset_picker::PresetPickerMode;
use albumgrid::{App, AppEvent, AppOptions, InputMode, Theme};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::{channel, Receiver};

struct Harness {
    app: App,
    rx: Receiver<AppEvent>,
    exited: bool,
}

impl Harness {
    fn new() -> Result<Self> {
        Self::with_options(AppOptions::default())
    }

    fn with_options(options: AppOptions) -> Result<Self> {
        let (tx, rx) = channel();
        let app = App::new_with_config(tx, Theme::default(), &AppConfig::default(), &options)?;
        let mut harness = Self {
            app,
            rx,
            exited: false,
        };
        harness.drain();
        Ok(harness)
    }

    /// Process queued events the way the event loop does
    fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Exit | AppEvent::Crash(_) => self.exited = true,
            event => {
                if let Some(next) = self.app.event(&event) {
                    self.handle(next);
                }
            }
        }
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
        }
    }

    fn press(&mut self, code: KeyCode) -> &mut Self {
        self.handle(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
        self
    }

    fn type_str(&mut self, s: &str) -> &mut Self {
        for c in s.chars() {
            self.press(KeyCode::Char(c));
        }
        self
    }

    fn rows(&self) -> Vec<String> {
        let table = self.app.table();
        (0..table.num_rows)
            .filter_map(|i| table.cell(i, "name"))
            .collect()
    }

    fn index(&self) -> i64 {
        self.app.controller().selection().raw_index()
    }
}

#[test]
fn test_starts_unfiltered() -> Result<()> {
    let h = Harness::new()?;
    assert_eq!(h.index(), -1);
    assert_eq!(h.rows().len(), 11);
    assert_eq!(h.app.controller().presets().len(), 3);
    Ok(())
}

#[test]
fn test_pick_preset_filters_grid() -> Result<()> {
    let mut h = Harness::new()?;
    // row 0 is "None", rows 1.. are the presets
    h.press(KeyCode::Char('p'))
        .press(KeyCode::Down)
        .press(KeyCode::Down)
        .press(KeyCode::Enter);

    assert_eq!(h.index(), 1);
    assert_eq!(h.app.input_mode, InputMode::Normal);
    assert_eq!(
        h.rows(),
        vec!["Human", "The Battle of Los Angeles", "The Slim Shady LP"]
    );

    h.press(KeyCode::Char('p')).press(KeyCode::Home).press(KeyCode::Enter);
    assert_eq!(h.index(), -1);
    assert_eq!(h.rows().len(), 11);
    Ok(())
}

#[test]
fn test_edit_then_save_new_preset() -> Result<()> {
    let mut h = Harness::new()?;

    // Column: Name, Operation: contains, Value: "um"
    h.press(KeyCode::Char('f'))
        .press(KeyCode::Tab)
        .press(KeyCode::Tab)
        .type_str("um");
    assert_eq!(h.app.input_mode, InputMode::Filtering);
    assert_eq!(h.index(), -1);
    assert_eq!(h.rows(), vec!["Human", "Colour by Numbers"]);
    h.press(KeyCode::Esc);
    assert_eq!(h.app.input_mode, InputMode::Normal);

    h.press(KeyCode::Char('s'));
    assert_eq!(h.app.picker.mode, PresetPickerMode::Save);
    h.type_str("My Filter").press(KeyCode::Enter);

    let presets = h.app.controller().presets();
    assert_eq!(presets.len(), 4);
    assert_eq!(presets[3].name, "My Filter");
    assert_eq!(
        presets[3].filter.predicates(),
        &[Predicate::new("name", FilterOperation::Contains, "um")]
    );
    assert_eq!(h.index(), 3);
    assert!(!h.app.picker.active);
    Ok(())
}

#[test]
fn test_edit_detaches_and_overwrite_keeps_position() -> Result<()> {
    let mut h = Harness::with_options(AppOptions {
        initial_preset: Some("Released after 1990".to_string()),
        ..AppOptions::default()
    })?;
    assert_eq!(h.index(), 1);
    assert_eq!(h.rows().len(), 3);

    // saving is only offered while detached
    h.press(KeyCode::Char('s'));
    assert!(!h.app.picker.active);
    assert!(h.app.status().is_some());

    // Column: Year (wraps left), Operation: > , Value: 1995
    h.press(KeyCode::Char('f')).press(KeyCode::Left);
    h.press(KeyCode::Tab).press(KeyCode::Tab);
    for _ in 0..4 {
        h.press(KeyCode::Backspace);
    }
    h.type_str("1995").press(KeyCode::Esc);
    assert_eq!(h.index(), -1);
    assert_eq!(
        h.rows(),
        vec!["Human", "The Battle of Los Angeles", "The Slim Shady LP"]
    );

    h.press(KeyCode::Char('s'))
        .type_str("Released after 1990")
        .press(KeyCode::Enter);
    assert_eq!(h.index(), 1);
    let presets = h.app.controller().presets();
    assert_eq!(presets.len(), 3);
    assert_eq!(
        presets[1].filter.predicates(),
        &[Predicate::new("year", FilterOperation::GreaterThan, 1995)]
    );
    Ok(())
}

#[test]
fn test_blank_save_is_refused() -> Result<()> {
    let mut h = Harness::new()?;
    h.press(KeyCode::Char('s')).type_str("   ").press(KeyCode::Enter);

    assert!(h.app.picker.active);
    assert!(h.app.picker.name_error.is_some());
    assert_eq!(h.app.controller().presets().len(), 3);
    assert_eq!(h.index(), -1);

    h.press(KeyCode::Esc);
    assert!(!h.app.picker.active);
    assert_eq!(h.app.input_mode, InputMode::Normal);
    Ok(())
}

#[test]
fn test_clear_and_quit() -> Result<()> {
    let mut h = Harness::new()?;
    h.press(KeyCode::Char('p')).press(KeyCode::End).press(KeyCode::Enter);
    assert_eq!(h.index(), 2);
    assert_eq!(h.rows().len(), 8);

    h.press(KeyCode::Char('c'));
    assert_eq!(h.index(), -1);
    assert!(h.app.controller().selection().filter.is_empty());
    assert_eq!(h.rows().len(), 11);

    assert!(!h.exited);
    h.press(KeyCode::Char('q'));
    assert!(h.exited);
    Ok(())
}

#[test]
fn test_unknown_initial_preset_fails() {
    let (tx, _rx) = channel();
    let options = AppOptions {
        initial_preset: Some("Does not exist".to_string()),
        ..AppOptions::default()
    };
    assert!(App::new_with_config(tx, Theme::default(), &AppConfig::default(), &options).is_err());
}
