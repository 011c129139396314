use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;

use crate::record::ColumnInference;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub const HELP_TEXT: &str = "\
Navigation
  ↑ / ↓          move row selection
  ← / →          move column selection
  n / PageDown   next page
  p / PageUp     previous page
  Enter          show selected record
  Esc            close popup / record view

Data
  /              search in all columns (case insensitive)
  s              toggle sort on selected column (asc, desc, off)
  t              show / hide statistics
  u              upload an .xlsx / .xls file
  r              reload data from the store
  c              clear all data

  ?              this help
  q              quit";

#[derive(Debug)]
pub enum XVError {
    IoError(Error),
    HttpError(reqwest::Error),
    JsonError(serde_json::Error),
    Network(String),
    Validation(String),
    FileNotFound,
    PermissionDenied,
    UnsupportedFileType(String),
}

impl XVError {
    /// Message the server attached to a rejected request, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            XVError::Validation(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for XVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XVError::IoError(e) => write!(f, "I/O error: {e}"),
            XVError::HttpError(e) => write!(f, "Request failed: {e}"),
            XVError::JsonError(e) => write!(f, "Invalid response body: {e}"),
            XVError::Network(msg) => write!(f, "{msg}"),
            XVError::Validation(detail) => write!(f, "{detail}"),
            XVError::FileNotFound => write!(f, "File not found"),
            XVError::PermissionDenied => write!(f, "Permission denied"),
            XVError::UnsupportedFileType(name) => {
                write!(f, "Unsupported file type \"{name}\", only .xlsx and .xls are allowed")
            }
        }
    }
}

impl std::error::Error for XVError {}

impl From<Error> for XVError {
    fn from(err: Error) -> Self {
        XVError::IoError(err)
    }
}

impl From<reqwest::Error> for XVError {
    fn from(err: reqwest::Error) -> Self {
        XVError::HttpError(err)
    }
}

impl From<serde_json::Error> for XVError {
    fn from(err: serde_json::Error) -> Self {
        XVError::JsonError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct XVConfig {
    pub api_url: String,
    pub page_size: usize,
    pub inference: ColumnInference,
    pub request_timeout: u64, // seconds
    pub event_poll_time: u64, // milliseconds
    pub clear_session_on_exit: bool,
    pub max_column_width: usize,
}

impl Default for XVConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            inference: ColumnInference::FirstRecord,
            request_timeout: 30,
            event_poll_time: 100,
            clear_session_on_exit: true,
            max_column_width: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Search,
    Upload,
}

impl CMDMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            CMDMode::Search => "/",
            CMDMode::Upload => "upload file: ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    Sort,
    Search,
    Upload,
    Clear,
    Refresh,
    ToggleStatistics,
    Enter,
    Exit,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
