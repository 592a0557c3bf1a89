//! Configuration: the compositor's toggles object and the `panekit.toml` file.
//!
//! [`GuiOptions`] is the plain value every `Gui` owns; there is no global
//! state, so independent compositors can run side by side with different
//! settings. The TOML file is optional and only ever produces a
//! `GuiOptions` plus a handful of key names.
//!
//! Discovery order: explicit path, then `./panekit.toml`, then
//! `<config_dir>/panekit/panekit.toml`. A missing file yields defaults. A file
//! that exists but does not parse (or names an unknown color) is an error.
//! Unknown fields are ignored.

use anyhow::{Context, Result, bail};
use core_events::KeyCode;
use core_terminal::{Attribute, Color, OutputMode};
use serde::Deserialize;
use std::{fs, io, path::PathBuf};
use tracing::{debug, info, warn};

pub const FILE_NAME: &str = "panekit.toml";

/// Global toggles of a compositor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuiOptions {
    /// Frame of the focused view is drawn with the selection colors.
    pub highlight: bool,
    /// Show the hardware cursor at the focused view's cursor.
    pub cursor: bool,
    /// Capture mouse events.
    pub mouse: bool,
    /// A lone ESC is the Escape key instead of an Alt prefix.
    pub input_esc: bool,
    /// Draw frames with `-`, `|` and `+`.
    pub ascii: bool,
    pub output: OutputMode,
    pub fg: Attribute,
    pub bg: Attribute,
    pub sel_fg: Attribute,
    pub sel_bg: Attribute,
}

// -------------------------------------------------------------------------------------------------
// File model
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub gui: GuiSection,
    #[serde(default)]
    pub keys: KeysSection,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct GuiSection {
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub cursor: bool,
    #[serde(default)]
    pub mouse: bool,
    #[serde(default)]
    pub input_esc: bool,
    #[serde(default)]
    pub ascii: bool,
    #[serde(default)]
    pub output: OutputSpec,
    #[serde(default)]
    pub colors: ColorsSection,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputSpec {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "256")]
    Color256,
}

impl From<OutputSpec> for OutputMode {
    fn from(spec: OutputSpec) -> Self {
        match spec {
            OutputSpec::Normal => OutputMode::Normal,
            OutputSpec::Color256 => OutputMode::Color256,
        }
    }
}

/// A color by name (`"red"`) or palette index (`196`).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ColorSpec {
    Index(u8),
    Name(String),
}

impl Default for ColorSpec {
    fn default() -> Self {
        ColorSpec::Name("default".to_string())
    }
}

impl ColorSpec {
    pub fn resolve(&self) -> Result<Color> {
        match self {
            ColorSpec::Index(n) => Ok(Color::basic(*n).unwrap_or(Color::Indexed(*n))),
            ColorSpec::Name(name) => match Color::from_name(name) {
                Some(c) => Ok(c),
                None => bail!("unknown color name {name:?}"),
            },
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ColorsSection {
    #[serde(default)]
    pub fg: ColorSpec,
    #[serde(default)]
    pub bg: ColorSpec,
    #[serde(default)]
    pub sel_fg: ColorSpec,
    #[serde(default)]
    pub sel_bg: ColorSpec,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct KeysSection {
    #[serde(default = "KeysSection::default_quit")]
    pub quit: String,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            quit: Self::default_quit(),
        }
    }
}

impl KeysSection {
    fn default_quit() -> String {
        "C-c".to_string()
    }
}

// -------------------------------------------------------------------------------------------------
// Loaded configuration
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Where the file was read from; `None` when defaults were used.
    pub path: Option<PathBuf>,
    pub raw: Option<String>,
    pub file: ConfigFile,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(Self {
            path: None,
            raw: Some(content.to_string()),
            file,
        })
    }

    /// Toggles derived from the `[gui]` table.
    pub fn options(&self) -> Result<GuiOptions> {
        let gui = &self.file.gui;
        let colors = &gui.colors;
        Ok(GuiOptions {
            highlight: gui.highlight,
            cursor: gui.cursor,
            mouse: gui.mouse,
            input_esc: gui.input_esc,
            ascii: gui.ascii,
            output: gui.output.into(),
            fg: colors.fg.resolve().context("gui.colors.fg")?.into(),
            bg: colors.bg.resolve().context("gui.colors.bg")?.into(),
            sel_fg: colors.sel_fg.resolve().context("gui.colors.sel_fg")?.into(),
            sel_bg: colors.sel_bg.resolve().context("gui.colors.sel_bg")?.into(),
        })
    }

    pub fn quit_key(&self) -> Result<KeyCode> {
        let name = &self.file.keys.quit;
        name.parse::<KeyCode>()
            .with_context(|| format!("keys.quit = {name:?}"))
    }
}

/// Best-effort config path following platform conventions.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("panekit").join(FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(target: "config", path = %path.display(), "config_missing_using_defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_read_failed");
            return Err(e).with_context(|| format!("reading {}", path.display()));
        }
    };
    match Config::parse(&content) {
        Ok(mut cfg) => {
            info!(target: "config", path = %path.display(), bytes = content.len(), "config_loaded");
            cfg.path = Some(path);
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Err(e.context(format!("parsing {}", path.display())))
        }
    }
}
