use crate::model::FormatKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of an initialization a file plays. Only changes the wording
/// of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Working,
    Origin,
}

impl FileRole {
    fn missing_suffix(&self) -> &'static str {
        match self {
            FileRole::Working => "",
            FileRole::Origin => " No se realizó la copia.",
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::Working => write!(f, "El archivo"),
            FileRole::Origin => write!(f, "El archivo origen"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{role} '{}' no existe.{}", .path.display(), .role.missing_suffix())]
    MissingFile { path: PathBuf, role: FileRole },

    #[error("{role} '{}' tiene un formato {format} inválido.", .path.display())]
    MalformedDocument {
        path: PathBuf,
        role: FileRole,
        format: FormatKind,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn missing(path: impl Into<PathBuf>, role: FileRole) -> Self {
        StoreError::MissingFile {
            path: path.into(),
            role,
        }
    }

    pub fn malformed(
        path: impl Into<PathBuf>,
        role: FileRole,
        format: FormatKind,
        reason: impl fmt::Display,
    ) -> Self {
        StoreError::MalformedDocument {
            path: path.into(),
            role,
            format,
            reason: reason.to_string(),
        }
    }

    /// Re-labels a load failure as a failure of the origin file.
    pub fn as_origin(self) -> Self {
        match self {
            StoreError::MissingFile { path, .. } => StoreError::MissingFile {
                path,
                role: FileRole::Origin,
            },
            StoreError::MalformedDocument {
                path,
                format,
                reason,
                ..
            } => StoreError::MalformedDocument {
                path,
                role: FileRole::Origin,
                format,
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
