//! taskdav configuration at ~/.config/taskdav/config.toml

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

pub const DEFAULT_CALENDAR: &str = "default";
const ENV_PREFIX: &str = "TASKDAV";

fn default_calendar() -> String {
    DEFAULT_CALENDAR.to_string()
}

fn default_binary() -> String {
    "task".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub caldav: CalDavSettings,
    #[serde(default)]
    pub taskwarrior: TaskwarriorSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalDavSettings {
    /// Calendar home collection, e.g. `https://dav.example.com/calendars/me/`.
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Calendar holding tasks without a project.
    #[serde(default = "default_calendar")]
    pub default_calendar: String,
}

impl Default for CalDavSettings {
    fn default() -> Self {
        CalDavSettings {
            url: None,
            username: None,
            password: None,
            default_calendar: default_calendar(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskwarriorSettings {
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Only consider tasks completed within this many days.
    pub completed_cutoff_days: Option<u32>,
    /// Alternative taskrc, passed as `rc:<path>`.
    pub taskrc: Option<PathBuf>,
    /// Alternative data directory, passed as `rc.data.location=<path>`.
    pub data_location: Option<PathBuf>,
}

impl Default for TaskwarriorSettings {
    fn default() -> Self {
        TaskwarriorSettings {
            binary: default_binary(),
            completed_cutoff_days: None,
            taskrc: None,
            data_location: None,
        }
    }
}

impl TaskwarriorSettings {
    pub fn taskrc_path(&self) -> Option<PathBuf> {
        self.taskrc.as_deref().map(expand)
    }

    pub fn data_location_path(&self) -> Option<PathBuf> {
        self.data_location.as_deref().map(expand)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Ask before applying each category of changes.
    #[serde(default)]
    pub interactive: bool,
}

impl Settings {
    pub fn config_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("taskdav");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's config file, creating a commented template on first run.
    pub fn load() -> SyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load `path` overlaid with `TASKDAV_*` environment variables
    /// (`TASKDAV_CALDAV__URL` sets `caldav.url`).
    pub fn load_from(path: &Path) -> SyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SyncResult<()> {
        let contents = format!(
            "\
# taskdav configuration

[caldav]
# Calendar home collection on your CalDAV server:
# url = \"https://dav.example.com/calendars/me/\"
# username = \"me\"
# Prompted for when unset:
# password = \"secret\"
# Calendar for tasks without a project:
# default_calendar = \"{DEFAULT_CALENDAR}\"

[taskwarrior]
# binary = \"task\"
# Ignore tasks completed longer ago than this:
# completed_cutoff_days = 30
# taskrc = \"~/.taskrc\"
# data_location = \"~/.task\"

[sync]
# Ask before applying each batch of changes:
# interactive = false
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The CalDAV URL, or a config error telling the user how to set it.
    pub fn caldav_url(&self) -> SyncResult<&str> {
        self.caldav
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                SyncError::Config(
                    "No CalDAV URL configured. Set caldav.url in the config file, \
                     TASKDAV_CALDAV__URL, or pass --url"
                        .into(),
                )
            })
    }

    pub fn caldav_username(&self) -> SyncResult<&str> {
        self.caldav
            .username
            .as_deref()
            .filter(|user| !user.is_empty())
            .ok_or_else(|| {
                SyncError::Config(
                    "No CalDAV username configured. Set caldav.username or pass --user".into(),
                )
            })
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
