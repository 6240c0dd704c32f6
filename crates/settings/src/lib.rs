//! User preferences for CodeNest hosts, stored as versioned JSON.

pub mod preferences;

pub use preferences::{
    FilePreferences, Preferences, PreferencesError, PreferencesStore, TabPreferences,
};
