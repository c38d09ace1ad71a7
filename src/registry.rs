//! Registry of launchable applications
//!
//! Entries are kept in an explicit order: the classifier picks the first key
//! contained in an utterance, so order decides ties like "word" inside
//! "wordpad".

use serde::Deserialize;

use crate::{Error, Result};

/// A launchable application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppEntry {
    /// Spoken name, matched case-insensitively
    pub name: String,

    /// Executable name or absolute path handed to the OS
    pub target: String,
}

/// Ordered, read-only table of known applications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRegistry {
    entries: Vec<AppEntry>,
}

impl ApplicationRegistry {
    /// Build a registry from ordered `(name, target)` entries
    ///
    /// Names are lower-cased and trimmed.
    ///
    /// # Errors
    ///
    /// Returns error if a name is empty or appears twice
    pub fn new(entries: impl IntoIterator<Item = AppEntry>) -> Result<Self> {
        let mut normalized: Vec<AppEntry> = Vec::new();

        for entry in entries {
            let name = entry.name.trim().to_lowercase();
            if name.is_empty() {
                return Err(Error::Config("application name must not be empty".to_string()));
            }
            if normalized.iter().any(|e| e.name == name) {
                return Err(Error::Config(format!("duplicate application name: {name}")));
            }
            normalized.push(AppEntry {
                name,
                target: entry.target,
            });
        }

        Ok(Self {
            entries: normalized,
        })
    }

    /// Iterate entries in registry order
    pub fn iter(&self) -> impl Iterator<Item = &AppEntry> {
        self.entries.iter()
    }

    /// Look up the launch target for an application name
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.target.as_str())
    }

    /// First registered name occurring as a substring of `text`
    ///
    /// `text` is expected to be normalized already.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| text.contains(e.name.as_str()))
            .map(|e| e.name.as_str())
    }

    /// Number of registered applications
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ApplicationRegistry {
    fn default() -> Self {
        Self {
            entries: default_entries()
                .iter()
                .map(|(name, target)| AppEntry {
                    name: (*name).to_string(),
                    target: (*target).to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(target_os = "windows")]
const fn default_entries() -> &'static [(&'static str, &'static str)] {
    &[
        ("notepad", "notepad.exe"),
        ("calculator", "calc.exe"),
        ("paint", "mspaint.exe"),
        ("word", "WINWORD.EXE"),
        ("excel", "EXCEL.EXE"),
        ("chrome", r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
        ("firefox", r"C:\Program Files\Mozilla Firefox\firefox.exe"),
        ("edge", r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"),
    ]
}

#[cfg(target_os = "macos")]
const fn default_entries() -> &'static [(&'static str, &'static str)] {
    &[
        ("notepad", "/System/Applications/TextEdit.app"),
        ("calculator", "/System/Applications/Calculator.app"),
        ("paint", "/System/Applications/Preview.app"),
        ("word", "/Applications/Microsoft Word.app"),
        ("excel", "/Applications/Microsoft Excel.app"),
        ("chrome", "/Applications/Google Chrome.app"),
        ("firefox", "/Applications/Firefox.app"),
        ("edge", "/Applications/Microsoft Edge.app"),
    ]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const fn default_entries() -> &'static [(&'static str, &'static str)] {
    &[
        ("notepad", "gedit"),
        ("calculator", "gnome-calculator"),
        ("paint", "kolourpaint"),
        ("word", "libreoffice --writer"),
        ("excel", "libreoffice --calc"),
        ("chrome", "google-chrome"),
        ("firefox", "firefox"),
        ("edge", "microsoft-edge"),
    ]
}
