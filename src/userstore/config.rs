use crate::error::{Result, StoreError};
use crate::model::{FormatKind, User};
use crate::session::{SessionPaths, SessionPlan};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "userstore.json";

/// Origin and working file names for one format, relative to the data
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatFiles {
    pub origin: String,
    pub working: String,
}

impl FormatFiles {
    fn for_extension(ext: &str) -> Self {
        Self {
            origin: format!("datos_usuarios_orig.{}", ext),
            working: format!("datos_usuarios.{}", ext),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTarget {
    pub id: i64,
    pub edad: i64,
}

/// Configuration for a run, stored in `userstore.json` in the data directory.
/// Every field is optional and the defaults reproduce the classic exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_json_files")]
    pub json: FormatFiles,

    #[serde(default = "default_xml_files")]
    pub xml: FormatFiles,

    #[serde(default = "default_update")]
    pub update: UpdateTarget,

    #[serde(default = "default_append")]
    pub append: User,

    #[serde(default = "default_remove_id")]
    pub remove_id: i64,
}

fn resolve(dir: &Path, file: &str) -> PathBuf {
    if dir == Path::new(".") {
        PathBuf::from(file)
    } else {
        dir.join(file)
    }
}

fn default_json_files() -> FormatFiles {
    FormatFiles::for_extension("json")
}

fn default_xml_files() -> FormatFiles {
    FormatFiles::for_extension("xml")
}

fn default_update() -> UpdateTarget {
    let plan = SessionPlan::default();
    UpdateTarget {
        id: plan.update_id,
        edad: plan.update_edad,
    }
}

fn default_append() -> User {
    SessionPlan::default().append
}

fn default_remove_id() -> i64 {
    SessionPlan::default().remove_id
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            json: default_json_files(),
            xml: default_xml_files(),
            update: default_update(),
            append: default_append(),
            remove_id: default_remove_id(),
        }
    }
}

impl SessionConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(StoreError::Io)?;
        let config: SessionConfig = serde_json::from_str(&content)
            .map_err(|e| StoreError::Config(format!("{}: {}", config_path.display(), e)))?;
        tracing::debug!(path = %config_path.display(), "config loaded");
        Ok(config)
    }

    pub fn files(&self, kind: FormatKind) -> &FormatFiles {
        match kind {
            FormatKind::Json => &self.json,
            FormatKind::Xml => &self.xml,
        }
    }

    /// Resolves the files for `kind` against `data_dir`. The current
    /// directory is left implicit so reports show bare file names.
    pub fn paths<P: AsRef<Path>>(&self, data_dir: P, kind: FormatKind) -> SessionPaths {
        let files = self.files(kind);
        SessionPaths {
            origin: resolve(data_dir.as_ref(), &files.origin),
            working: resolve(data_dir.as_ref(), &files.working),
        }
    }

    pub fn plan(&self) -> SessionPlan {
        SessionPlan {
            update_id: self.update.id,
            update_edad: self.update.edad,
            append: self.append.clone(),
            remove_id: self.remove_id,
        }
    }
}
