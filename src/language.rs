use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChatError;

/// Code of the language assistant replies are written in.
pub const SOURCE_LANGUAGE: &str = "en";

/// An entry in the language picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Languages the user can pick from.
pub const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "es", name: "Spanish" },
    Language { code: "fr", name: "French" },
    Language { code: "de", name: "German" },
    Language { code: "it", name: "Italian" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "nl", name: "Dutch" },
    Language { code: "ru", name: "Russian" },
    Language { code: "zh", name: "Chinese" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "ar", name: "Arabic" },
    Language { code: "hi", name: "Hindi" },
];

/// Case-insensitive catalog lookup.
pub fn find_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Display name for a code, falling back to the code itself.
pub fn display_name(code: &str) -> &str {
    find_language(code).map(|l| l.name).unwrap_or(code)
}

pub fn is_source_language(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(SOURCE_LANGUAGE)
}

/// The language replies should be shown in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSelection {
    pub code: String,
    pub display_name: String,
}

impl LanguageSelection {
    pub fn is_source(&self) -> bool {
        is_source_language(&self.code)
    }
}

impl From<&Language> for LanguageSelection {
    fn from(lang: &Language) -> Self {
        Self {
            code: lang.code.to_string(),
            display_name: lang.name.to_string(),
        }
    }
}

impl Default for LanguageSelection {
    fn default() -> Self {
        Self {
            code: SOURCE_LANGUAGE.to_string(),
            display_name: "English".to_string(),
        }
    }
}

/// Owns the session's current selection. Created at session start and
/// changed only through [`LanguagePreference::select`]; everything else
/// borrows the selection read-only.
#[derive(Debug, Clone, Default)]
pub struct LanguagePreference {
    current: LanguageSelection,
}

impl LanguagePreference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &LanguageSelection {
        &self.current
    }

    /// Switch to a catalog language. Unknown codes leave the selection as is.
    pub fn select(&mut self, code: &str) -> Result<&LanguageSelection, ChatError> {
        let lang = find_language(code.trim())
            .ok_or_else(|| ChatError::UnknownLanguage(code.to_string()))?;
        self.current = LanguageSelection::from(lang);
        info!(code = lang.code, "language selected");
        Ok(&self.current)
    }
}
