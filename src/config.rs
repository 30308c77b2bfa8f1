use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::preset::{builtin_presets, Preset, PresetStore};
use albumgrid_cli::LogLevel;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub filtering: FilteringConfig,
    pub presets: PresetsConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub row_numbers: bool,
    pub row_start_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilteringConfig {
    /// Match "contains" with exact case (default: ignore case)
    pub case_sensitive_contains: bool,
}

/// Presets available when the application starts.
///
/// Presets saved while running live in memory only; nothing here is written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetsConfig {
    pub include_builtin: bool,
    /// Name of the preset selected at startup
    pub initial: Option<String>,
    /// Added after the built-ins; a repeated name replaces the earlier preset
    pub extra: Vec<Preset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub error: String,
    pub dimmed: String,
    pub table_header: String,
    pub table_border: String,
    pub row_numbers: String,
    pub modal_border: String,
    pub modal_border_active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level name; logging is off when unset
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            filtering: FilteringConfig::default(),
            presets: PresetsConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            row_numbers: false,
            row_start_index: 1,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for PresetsConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            initial: None,
            extra: Vec::new(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            table_header: "white".to_string(),
            table_border: "cyan".to_string(),
            row_numbers: "dark_gray".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");
        if !config_path.exists() {
            let config = AppConfig::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load_from(&config_path)
    }

    /// Load defaults overlaid with the config file at `path`, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read config file at {}: {}", path.display(), e))?;
        let user_config: AppConfig = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file at {}: {}", path.display(), e))?;

        let mut config = AppConfig::default();
        config.merge(user_config);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.filtering.merge(other.filtering);
        self.presets.merge(other.presets);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
        self.logging.merge(other.logging);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if let Some(level) = self.logging.level.as_deref() {
            if LogLevel::from_name(level).is_none() {
                return Err(eyre!(
                    "Invalid logging level: {}. Must be one of error, warn, info, debug, trace",
                    level
                ));
            }
        }

        let store = self
            .presets
            .store()
            .map_err(|e| eyre!("Invalid preset in [[presets.extra]]: {}", e))?;
        if let Some(initial) = self.presets.initial.as_deref() {
            if store.position(initial).is_none() {
                return Err(eyre!("presets.initial names an unknown preset: {}", initial));
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.row_numbers != default.row_numbers {
            self.row_numbers = other.row_numbers;
        }
        if other.row_start_index != default.row_start_index {
            self.row_start_index = other.row_start_index;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl FilteringConfig {
    pub fn merge(&mut self, other: Self) {
        if other.case_sensitive_contains {
            self.case_sensitive_contains = true;
        }
    }
}

impl PresetsConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PresetsConfig::default();
        if other.include_builtin != default.include_builtin {
            self.include_builtin = other.include_builtin;
        }
        if other.initial.is_some() {
            self.initial = other.initial;
        }
        if !other.extra.is_empty() {
            self.extra = other.extra;
        }
    }

    /// Store seeded with the configured presets
    pub fn store(&self) -> crate::error::Result<PresetStore> {
        let builtin = if self.include_builtin {
            builtin_presets()
        } else {
            Vec::new()
        };
        PresetStore::seeded(builtin.into_iter().chain(self.extra.iter().cloned()))
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    /// `(name, value)` for every color, in declaration order
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("primary", self.primary.as_str()),
            ("error", self.error.as_str()),
            ("dimmed", self.dimmed.as_str()),
            ("table_header", self.table_header.as_str()),
            ("table_border", self.table_border.as_str()),
            ("row_numbers", self.row_numbers.as_str()),
            ("modal_border", self.modal_border.as_str()),
            ("modal_border_active", self.modal_border_active.as_str()),
        ]
    }

    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let pick = |mine: &mut String, theirs: String, default: &str| {
            if theirs != default {
                *mine = theirs;
            }
        };
        pick(&mut self.primary, other.primary, &default.primary);
        pick(&mut self.error, other.error, &default.error);
        pick(&mut self.dimmed, other.dimmed, &default.dimmed);
        pick(&mut self.table_header, other.table_header, &default.table_header);
        pick(&mut self.table_border, other.table_border, &default.table_border);
        pick(&mut self.row_numbers, other.row_numbers, &default.row_numbers);
        pick(&mut self.modal_border, other.modal_border, &default.modal_border);
        pick(
            &mut self.modal_border_active,
            other.modal_border_active,
            &default.modal_border_active,
        );
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.level.as_deref().and_then(LogLevel::from_name)
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, `indexed(n)` or named).
    /// Invalid strings are errors even when NO_COLOR is set.
    pub fn parse(&self, s: &str) -> Result<Color> {
        let color = self.parse_color(s)?;
        Ok(if self.no_color { Color::Reset } else { color })
    }

    fn parse_color(&self, s: &str) -> Result<Color> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        if let Some(num_str) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" | "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => {
                Ok(Color::Indexed(8))
            }
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(n) or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let component = |range: std::ops::Range<usize>, name: &str| {
        s.get(range)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .ok_or_else(|| eyre!("Invalid {} component in hex color: {}", name, s))
    };
    Ok((
        component(1..3, "red")?,
        component(3..5, "green")?,
        component(5..7, "blue")?,
    ))
}

/// Convert RGB to nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        return match gray {
            0..=7 => 16,
            248.. => 231,
            _ => 232 + ((gray - 8) * 24 / 240) as u8,
        };
    }

    // 6x6x6 color cube (16-231)
    let idx = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * idx(r) + 6 * idx(g) + idx(b)
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), parser.parse(value)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

impl Default for Theme {
    fn default() -> Self {
        // the default colors are all names the parser knows
        Theme::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
        })
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
