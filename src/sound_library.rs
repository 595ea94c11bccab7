//! The built-in sound catalog.
//!
//! Every audio file in the sounds directory is a built-in sound whose
//! identifier is the file stem. An optional `sounds.json` sidecar in the same
//! directory adds a display label and an emoji per identifier:
//!
//! ```json
//! { "glass": { "emoji": "🥂", "label": "Glass Clink" } }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extensions recognised as playable sounds.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "oga", "flac", "aiff", "m4a"];

/// Name of the optional metadata file.
pub const SIDECAR_FILE: &str = "sounds.json";

/// Emoji shown for sounds without sidecar metadata.
pub const DEFAULT_EMOJI: &str = "🔔";

/// One built-in sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEntry {
    pub identifier: String,
    pub display_label: String,
    /// File name within the sounds directory
    pub filename: String,
    pub emoji: String,
}

#[derive(Debug, Default, Deserialize)]
struct SidecarEntry {
    #[serde(default)]
    emoji: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

/// Directory-backed sound catalog.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All built-in sounds, ordered by identifier.
    ///
    /// A missing directory is an empty catalog. When two files share a stem
    /// the first file name in sort order wins.
    pub fn list_builtin(&self) -> Vec<SoundEntry> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Sounds directory {} does not exist", self.dir.display());
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Failed to read sounds directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<(String, String)> = read_dir
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let filename = entry.file_name().to_str()?.to_string();
                let identifier = audio_stem(&filename)?;
                Some((identifier, filename))
            })
            .collect();
        files.sort();
        files.dedup_by(|later, earlier| later.0 == earlier.0);

        let metadata = self.load_sidecar();
        files
            .into_iter()
            .map(|(identifier, filename)| {
                let meta = metadata.get(&identifier);
                let display_label = meta
                    .and_then(|m| m.label.clone())
                    .filter(|label| !label.trim().is_empty())
                    .unwrap_or_else(|| title_case(&identifier));
                let emoji = meta
                    .and_then(|m| m.emoji.clone())
                    .filter(|emoji| !emoji.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_EMOJI.to_string());
                SoundEntry {
                    identifier,
                    display_label,
                    filename,
                    emoji,
                }
            })
            .collect()
    }

    /// File name of the built-in sound `identifier`, if there is one.
    pub fn resolve(&self, identifier: &str) -> Option<String> {
        self.list_builtin()
            .into_iter()
            .find(|entry| entry.identifier == identifier)
            .map(|entry| entry.filename)
    }

    /// Turn a selected-sound identifier into a playable path.
    ///
    /// Custom sounds (absolute paths, or anything containing a path
    /// separator) are used as-is; other identifiers are looked up in the
    /// catalog. Either way the file must exist.
    pub fn resolve_identifier(&self, identifier: &str) -> Option<PathBuf> {
        let path = if is_custom_path(identifier) {
            PathBuf::from(identifier)
        } else {
            self.dir.join(self.resolve(identifier)?)
        };

        if path.is_file() {
            Some(path)
        } else {
            log::warn!("Sound file not found: {}", path.display());
            None
        }
    }

    fn load_sidecar(&self) -> HashMap<String, SidecarEntry> {
        let path = self.dir.join(SIDECAR_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                return HashMap::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed {}: {}", path.display(), e);
            HashMap::new()
        })
    }
}

/// Whether `identifier` names a file rather than a catalog entry.
pub fn is_custom_path(identifier: &str) -> bool {
    Path::new(identifier).is_absolute() || identifier.contains('/') || identifier.contains('\\')
}

fn audio_stem(filename: &str) -> Option<String> {
    if filename.starts_with('.') {
        return None;
    }
    let path = Path::new(filename);
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if !AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(path.file_stem()?.to_str()?.to_string())
}

/// `"low-battery_beep"` -> `"Low Battery Beep"`.
fn title_case(identifier: &str) -> String {
    identifier
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library_with(files: &[&str]) -> (TempDir, SoundLibrary) {
        let dir = TempDir::new().unwrap();
        for name in files {
            fs::write(dir.path().join(name), b"sound").unwrap();
        }
        let library = SoundLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let library = SoundLibrary::new(dir.path().join("nope"));
        assert!(library.list_builtin().is_empty());
    }

    #[test]
    fn test_lists_audio_files_sorted() {
        let (_dir, library) =
            library_with(&["zap.mp3", "alert.wav", "notes.txt", ".hidden.wav", "chime.OGG"]);

        let ids: Vec<String> = library
            .list_builtin()
            .into_iter()
            .map(|entry| entry.identifier)
            .collect();

        assert_eq!(ids, vec!["alert", "chime", "zap"]);
    }

    #[test]
    fn test_defaults_without_sidecar() {
        let (_dir, library) = library_with(&["low-battery_beep.wav"]);

        let entry = &library.list_builtin()[0];

        assert_eq!(entry.display_label, "Low Battery Beep");
        assert_eq!(entry.emoji, DEFAULT_EMOJI);
        assert_eq!(entry.filename, "low-battery_beep.wav");
    }

    #[test]
    fn test_sidecar_metadata() {
        let (dir, library) = library_with(&["glass.wav", "bell.mp3"]);
        fs::write(
            dir.path().join(SIDECAR_FILE),
            r#"{ "glass": { "emoji": "🥂", "label": "Glass Clink" }, "bell": { "label": "" } }"#,
        )
        .unwrap();

        let entries = library.list_builtin();

        assert_eq!(entries[0].identifier, "bell");
        assert_eq!(entries[0].display_label, "Bell");
        assert_eq!(entries[1].emoji, "🥂");
        assert_eq!(entries[1].display_label, "Glass Clink");
    }

    #[test]
    fn test_malformed_sidecar_is_ignored() {
        let (dir, library) = library_with(&["glass.wav"]);
        fs::write(dir.path().join(SIDECAR_FILE), "{ not json").unwrap();

        let entries = library.list_builtin();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_label, "Glass");
    }

    #[test]
    fn test_duplicate_stems_keep_first_file() {
        let (_dir, library) = library_with(&["beep.wav", "beep.mp3"]);

        let entries = library.list_builtin();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "beep.mp3");
    }

    #[test]
    fn test_resolve() {
        let (_dir, library) = library_with(&["alert.wav"]);

        assert_eq!(library.resolve("alert").as_deref(), Some("alert.wav"));
        assert_eq!(library.resolve("missing"), None);
    }

    #[test]
    fn test_resolve_identifier_builtin() {
        let (dir, library) = library_with(&["alert.wav"]);

        assert_eq!(
            library.resolve_identifier("alert"),
            Some(dir.path().join("alert.wav"))
        );
        assert_eq!(library.resolve_identifier("missing"), None);
    }

    #[test]
    fn test_resolve_identifier_custom_path() {
        let (_dir, library) = library_with(&[]);
        let custom = TempDir::new().unwrap();
        let file = custom.path().join("mine.mp3");
        fs::write(&file, b"custom").unwrap();
        let file_str = file.to_str().unwrap();

        assert_eq!(library.resolve_identifier(file_str), Some(file.clone()));

        fs::remove_file(&file).unwrap();
        assert_eq!(library.resolve_identifier(file_str), None);
    }

    #[test]
    fn test_custom_path_detection() {
        assert!(is_custom_path("/tmp/a.wav"));
        assert!(is_custom_path("sounds/a.wav"));
        assert!(!is_custom_path("alert"));
    }
}
