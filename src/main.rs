use albumgrid::config::AppConfig;
use albumgrid::logging::{init_logging, LogConfig};
use albumgrid::{App, AppEvent, AppOptions, Args, CacheManager, ConfigManager, Theme, APP_NAME};
use clap::Parser;
use color_eyre::Result;
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{error, info};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, config: &AppConfig, options: &AppOptions) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let theme = Theme::from_config(&config.theme)?;
    let mut app = App::new_with_config(tx.clone(), theme, config, options)?;
    let poll_interval = Duration::from_millis(options.event_poll_interval_ms);
    render(&mut terminal, &mut app)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<AppConfig> {
    match args.config.as_deref() {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(APP_NAME),
    }
}

/// Flags that do their work and exit without starting the UI
fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        let path = config_manager.write_default_config(args.force)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(Some(()));
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
            }
            Err(_e) => println!("No cache to clear"),
        }
        return Ok(Some(()));
    }

    if args.list_presets {
        let config = load_config(args)?;
        let presets = config.presets.store()?.presets();
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(Some(()));
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = load_config(&args)?;
    let options = AppOptions::from_args_and_config(&args, &config);

    let cache = CacheManager::new(APP_NAME)?;
    if let Some(log_config) = LogConfig::resolve(&args, &config.logging, &cache) {
        init_logging(&log_config)?;
        info!(file = %log_config.log_file.display(), "logging started");
    }

    let terminal = ratatui::init();
    let result = run(terminal, &config, &options);
    ratatui::restore();
    if let Err(e) = result {
        error!(%e, "exiting with error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
