use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification tag attached to file nodes (html, css, javascript, ...).
/// The tag is never checked against the file content.  
/// 檔案的語言標籤，不會與檔案內容比對。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTag(Cow<'static, str>);

/// Extension table used by [`LanguageTag::from_file_name`].
const EXTENSIONS: &[(&str, &str)] = &[
    ("html", "html"),
    ("htm", "html"),
    ("css", "css"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("json", "json"),
    ("py", "python"),
    ("md", "markdown"),
    ("rs", "rust"),
    ("txt", "text"),
];

impl LanguageTag {
    pub const TEXT: LanguageTag = LanguageTag(Cow::Borrowed("text"));
    pub const HTML: LanguageTag = LanguageTag(Cow::Borrowed("html"));
    pub const CSS: LanguageTag = LanguageTag(Cow::Borrowed("css"));
    pub const JAVASCRIPT: LanguageTag = LanguageTag(Cow::Borrowed("javascript"));

    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Infers a tag from the extension of `name`, if the extension is known.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        let ext = normalize_extension(ext);
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, tag)| Self(Cow::Borrowed(tag)))
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::TEXT
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for LanguageTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for LanguageTag {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for LanguageTag {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

fn normalize_extension(raw: &str) -> String {
    raw.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_known_extensions_case_insensitively() {
        assert_eq!(LanguageTag::from_file_name("index.HTML"), Some(LanguageTag::HTML));
        assert_eq!(
            LanguageTag::from_file_name("app.js"),
            Some(LanguageTag::JAVASCRIPT)
        );
        assert_eq!(
            LanguageTag::from_file_name("main.rs").map(|tag| tag.to_string()),
            Some("rust".to_string())
        );
    }

    #[test]
    fn unknown_or_missing_extensions_yield_none() {
        assert_eq!(LanguageTag::from_file_name("Makefile"), None);
        assert_eq!(LanguageTag::from_file_name("notes.xyz"), None);
        assert_eq!(LanguageTag::from_file_name(".gitignore"), None);
    }

    #[test]
    fn default_tag_is_text() {
        assert_eq!(LanguageTag::default().as_str(), "text");
    }
}
