use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::XVError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    XLSX,
    XLS,
}

impl FileType {
    pub fn mime(&self) -> &'static str {
        match self {
            FileType::XLSX => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FileType::XLS => "application/vnd.ms-excel",
        }
    }
}

/// A local spreadsheet that passed validation and is ready to be posted.
#[derive(Debug, Clone)]
pub struct SpreadsheetFile {
    pub file_name: String,
    pub file_type: FileType,
    pub content: Vec<u8>,
}

impl SpreadsheetFile {
    /// Accepts `~` and environment variables in `input`.
    pub fn open(input: &str) -> Result<Self, XVError> {
        let expanded = shellexpand::full(input.trim())
            .map_err(|e| XVError::Validation(format!("Invalid path: {e}")))?;
        let path = PathBuf::from(expanded.as_ref());

        let file_type = Self::detect_file_type(&path)?;

        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => XVError::FileNotFound,
            ErrorKind::PermissionDenied => XVError::PermissionDenied,
            _ => XVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(XVError::Validation("Not a file!".into()));
        }

        let content = fs::read(&path)?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload.xlsx")
            .to_string();
        debug!(
            "Prepared {} ({:?}, {} bytes) for upload",
            path.display(),
            file_type,
            content.len()
        );

        Ok(SpreadsheetFile {
            file_name,
            file_type,
            content,
        })
    }

    fn detect_file_type(path: &Path) -> Result<FileType, XVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("XLSX") => Ok(FileType::XLSX),
            Some("XLS") => Ok(FileType::XLS),
            _ => Err(XVError::UnsupportedFileType(
                path.file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )),
        }
    }
}
