use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::storage::Storage;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const LANGUAGE_KEY: &str = "language";

/// Catalogs shipped with the binary, written into the language directory on
/// first run so users can edit them or add their own alongside.
const EMBEDDED_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../languages/en.json")),
    ("th", include_str!("../languages/th.json")),
];

/// Loader lifecycle. `Failed` is only reachable when the English fallback
/// itself fails to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Ready(String),
    Failed,
}

/// Holds the resolved strings for the active language. The map is replaced
/// wholesale on every successful load, never merged.
#[derive(Debug)]
pub struct Translator {
    lang_dir: PathBuf,
    map: HashMap<String, String>,
    state: LoadState,
}

impl Translator {
    pub fn new(lang_dir: &Path) -> Self {
        Self {
            lang_dir: lang_dir.to_path_buf(),
            map: HashMap::new(),
            state: LoadState::Uninitialized,
        }
    }

    /// Writes the embedded catalogs into the language directory, skipping
    /// any file the user already has.
    #[tracing::instrument(skip(self))]
    pub fn seed_catalogs(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.lang_dir)
            .with_context(|| format!("failed to create {}", self.lang_dir.display()))?;

        for (code, raw) in EMBEDDED_CATALOGS {
            let path = self.catalog_path(code);
            if path.exists() {
                continue;
            }
            debug!(file = %path.display(), "seeding catalog");
            fs::write(&path, raw)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        Ok(())
    }

    /// Loads the catalog for `code`, replacing the translation map wholesale
    /// and persisting `code` as the selected language. A failed read or
    /// parse falls back to English once; the fallback does not overwrite the
    /// persisted preference. Only the fallback's own failure leaves the
    /// loader `Failed`, with the previous map kept.
    #[tracing::instrument(skip(self, storage))]
    pub fn load<S: Storage>(&mut self, code: &str, storage: &mut S) -> anyhow::Result<()> {
        self.load_inner(code, storage, true)
    }

    fn load_inner<S: Storage>(
        &mut self,
        code: &str,
        storage: &mut S,
        persist: bool,
    ) -> anyhow::Result<()> {
        match self.read_catalog(code) {
            Ok(map) => {
                info!(language = code, keys = map.len(), "loaded translation catalog");
                self.map = map;
                self.state = LoadState::Ready(code.to_string());
                if persist {
                    storage.set(LANGUAGE_KEY, code)?;
                }
                Ok(())
            }
            Err(err) if code != DEFAULT_LANGUAGE => {
                warn!(language = code, error = %err, "catalog failed to load; falling back to English");
                self.load_inner(DEFAULT_LANGUAGE, storage, false)
            }
            Err(err) => {
                error!(error = %err, "English catalog failed to load; keeping previous strings");
                self.state = LoadState::Failed;
                Ok(())
            }
        }
    }

    fn read_catalog(&self, code: &str) -> anyhow::Result<HashMap<String, String>> {
        let path = self.catalog_path(code);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))
    }

    fn catalog_path(&self, code: &str) -> PathBuf {
        self.lang_dir.join(format!("{code}.json"))
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// The language whose catalog is currently loaded, if any.
    pub fn language(&self) -> Option<&str> {
        match &self.state {
            LoadState::Ready(code) => Some(code),
            _ => None,
        }
    }

    /// Looks up `key` in the current map. Missing keys resolve to the key
    /// itself so output never renders a hole.
    pub fn resolve(&self, key: &str) -> String {
        self.map
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Like [`resolve`](Self::resolve), then substitutes the first
    /// occurrence of each `{name}` placeholder.
    pub fn resolve_with(&self, key: &str, substitutions: &[(&str, String)]) -> String {
        let mut out = self.resolve(key);
        for (name, value) in substitutions {
            let placeholder = format!("{{{name}}}");
            if let Some(idx) = out.find(&placeholder) {
                out.replace_range(idx..idx + placeholder.len(), value);
            }
        }
        out
    }
}

/// The persisted language preference, defaulting to English.
pub fn selected_language<S: Storage>(storage: &S) -> anyhow::Result<String> {
    Ok(storage
        .get(LANGUAGE_KEY)?
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{LoadState, Translator, selected_language};
    use crate::storage::{FileStorage, Storage};

    fn setup(dir: &std::path::Path) -> (Translator, FileStorage) {
        let lang_dir = dir.join("languages");
        let translator = Translator::new(&lang_dir);
        translator.seed_catalogs().expect("seed catalogs");
        let storage = FileStorage::open(&dir.join("data")).expect("open storage");
        (translator, storage)
    }

    #[test]
    fn seeding_writes_catalog_files_once() {
        let temp = tempdir().expect("tempdir");
        let lang_dir = temp.path().join("languages");
        let translator = Translator::new(&lang_dir);

        translator.seed_catalogs().expect("seed");
        assert!(lang_dir.join("en.json").exists());
        assert!(lang_dir.join("th.json").exists());

        std::fs::write(lang_dir.join("en.json"), r#"{"appTitle": "edited"}"#)
            .expect("overwrite");
        translator.seed_catalogs().expect("seed again");

        let raw = std::fs::read_to_string(lang_dir.join("en.json")).expect("read");
        assert!(raw.contains("edited"), "user edits survive reseeding");
    }

    #[test]
    fn successful_load_replaces_map_and_persists_language() {
        let temp = tempdir().expect("tempdir");
        let (mut translator, mut storage) = setup(temp.path());

        translator.load("th", &mut storage).expect("load");
        assert_eq!(translator.state(), &LoadState::Ready("th".to_string()));
        assert_eq!(translator.resolve("notificationTaskAdded"), "เพิ่มงานแล้ว");
        assert_eq!(
            storage.get("language").expect("get").as_deref(),
            Some("th")
        );
    }

    #[test]
    fn missing_language_falls_back_to_english_without_persisting() {
        let temp = tempdir().expect("tempdir");
        let (mut translator, mut storage) = setup(temp.path());

        translator.load("fr", &mut storage).expect("load");
        assert_eq!(translator.state(), &LoadState::Ready("en".to_string()));
        assert_eq!(translator.resolve("notificationTaskAdded"), "Task added");
        assert_eq!(storage.get("language").expect("get"), None);
    }

    #[test]
    fn failed_english_fallback_keeps_previous_strings() {
        let temp = tempdir().expect("tempdir");
        let (mut translator, mut storage) = setup(temp.path());

        translator.load("th", &mut storage).expect("load");
        std::fs::remove_file(temp.path().join("languages").join("en.json"))
            .expect("remove en");

        translator.load("de", &mut storage).expect("load");
        assert_eq!(translator.state(), &LoadState::Failed);
        assert_eq!(translator.resolve("notificationTaskAdded"), "เพิ่มงานแล้ว");
    }

    #[test]
    fn malformed_catalog_is_a_load_failure() {
        let temp = tempdir().expect("tempdir");
        let (mut translator, mut storage) = setup(temp.path());
        std::fs::write(temp.path().join("languages").join("xx.json"), "not json")
            .expect("write");

        translator.load("xx", &mut storage).expect("load");
        assert_eq!(translator.state(), &LoadState::Ready("en".to_string()));
    }

    #[test]
    fn missing_key_resolves_to_the_key_itself() {
        let temp = tempdir().expect("tempdir");
        let (mut translator, mut storage) = setup(temp.path());
        translator.load("en", &mut storage).expect("load");

        assert_eq!(translator.resolve("noSuchKey"), "noSuchKey");
    }

    #[test]
    fn substitution_replaces_first_occurrence_only() {
        let temp = tempdir().expect("tempdir");
        let lang_dir = temp.path().join("languages");
        std::fs::create_dir_all(&lang_dir).expect("mkdir");
        std::fs::write(
            lang_dir.join("en.json"),
            r#"{"twice": "{n} and {n}", "counts": "{active} of {total}"}"#,
        )
        .expect("write");

        let mut translator = Translator::new(&lang_dir);
        let mut storage = FileStorage::open(&temp.path().join("data")).expect("open");
        translator.load("en", &mut storage).expect("load");

        assert_eq!(
            translator.resolve_with("twice", &[("n", "1".to_string())]),
            "1 and {n}"
        );
        assert_eq!(
            translator.resolve_with(
                "counts",
                &[("active", "2".to_string()), ("total", "5".to_string())]
            ),
            "2 of 5"
        );
    }

    #[test]
    fn selected_language_defaults_to_english() {
        let temp = tempdir().expect("tempdir");
        let mut storage = FileStorage::open(temp.path()).expect("open");

        assert_eq!(selected_language(&storage).expect("selected"), "en");
        storage.set("language", "th").expect("set");
        assert_eq!(selected_language(&storage).expect("selected"), "th");
    }
}
