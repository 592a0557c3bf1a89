use core_keymap::KeymapError;
use core_terminal::SurfaceError;
use core_view::ViewError;
use thiserror::Error;

/// Every failure the compositor reports, including the two sentinels:
/// [`GuiError::Quit`] (graceful termination) and [`GuiError::UnknownView`]
/// (lookup miss).
#[derive(Debug, Error)]
pub enum GuiError {
    #[error("quit")]
    Quit,
    #[error("unknown view")]
    UnknownView,
    #[error("invalid dimensions ({x0}, {y0}, {x1}, {y1})")]
    InvalidDimensions { x0: i32, y0: i32, x1: i32, y1: i32 },
    #[error("invalid name")]
    InvalidName,
    #[error("unsupported trigger: {0:?}")]
    UnsupportedTrigger(String),
    #[error("keybinding not found")]
    KeybindingNotFound,
    #[error("invalid point ({x}, {y})")]
    InvalidPoint { x: i32, y: i32 },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    /// The input source failed or hung up.
    #[error("input error: {0}")]
    Input(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GuiResult<T> = Result<T, GuiError>;

impl GuiError {
    pub fn is_quit(&self) -> bool {
        matches!(self, GuiError::Quit)
    }

    pub fn is_unknown_view(&self) -> bool {
        matches!(self, GuiError::UnknownView)
    }
}

impl From<ViewError> for GuiError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::InvalidPoint { x, y } => GuiError::InvalidPoint { x, y },
            ViewError::Surface(e) => GuiError::Surface(e),
        }
    }
}

impl From<KeymapError> for GuiError {
    fn from(err: KeymapError) -> Self {
        match err {
            KeymapError::UnsupportedTrigger(s) => GuiError::UnsupportedTrigger(s),
            KeymapError::NotFound => GuiError::KeybindingNotFound,
        }
    }
}
