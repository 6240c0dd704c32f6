use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use codenest_project::{LanguageTag, NodeDefaults, TabIdentity, WorkspaceOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const PREFERENCES_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Versioned preferences file contents.  
/// 具版本號的偏好設定內容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub files: FilePreferences,
    #[serde(default)]
    pub tabs: TabPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            files: FilePreferences::default(),
            tabs: TabPreferences::default(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.files.sanitize();
    }

    /// Options for a workspace built from these preferences.
    pub fn workspace_options(&self) -> WorkspaceOptions {
        WorkspaceOptions {
            defaults: NodeDefaults {
                file_name: self.files.new_file_name.clone(),
                folder_name: self.files.new_folder_name.clone(),
                language: LanguageTag::from(self.files.default_language.clone()),
            },
            tab_identity: self.tabs.identity,
            open_seed_tab: self.tabs.open_seed_tab,
        }
    }
}

/// Names and language given to nodes created without user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePreferences {
    #[serde(default = "default_file_name")]
    pub new_file_name: String,
    #[serde(default = "default_folder_name")]
    pub new_folder_name: String,
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_file_name() -> String {
    "newfile.txt".to_string()
}

fn default_folder_name() -> String {
    "New Folder".to_string()
}

fn default_language() -> String {
    "text".to_string()
}

impl Default for FilePreferences {
    fn default() -> Self {
        Self {
            new_file_name: default_file_name(),
            new_folder_name: default_folder_name(),
            default_language: default_language(),
        }
    }
}

impl FilePreferences {
    fn sanitize(&mut self) {
        self.new_file_name = self.new_file_name.trim().to_string();
        self.new_folder_name = self.new_folder_name.trim().to_string();
        if self.new_file_name.is_empty() || self.new_file_name.contains('/') {
            self.new_file_name = default_file_name();
        }
        if self.new_folder_name.is_empty() || self.new_folder_name.contains('/') {
            self.new_folder_name = default_folder_name();
        }
        self.default_language = self.default_language.trim().to_string();
        if self.default_language.is_empty() {
            self.default_language = default_language();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabPreferences {
    #[serde(default)]
    pub identity: TabIdentity,
    #[serde(default = "default_true")]
    pub open_seed_tab: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TabPreferences {
    fn default() -> Self {
        Self {
            identity: TabIdentity::default(),
            open_seed_tab: true,
        }
    }
}

/// Preferences bound to the file they are loaded from and saved to.  
/// 與設定檔綁定的偏好設定儲存區。
#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    /// Loads preferences from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!(path = %path.display(), "no preferences file; using defaults");
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        debug!(path = %path.display(), "loaded preferences");
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    /// Writes the preferences through a temporary sibling file and a rename.
    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
