//! Asset lookup
//!
//! Maps logical cue names onto WAV files under a root directory.

use super::{AudioError, CueSample};
use std::path::{Path, PathBuf};

/// Extension appended to logical names
const EXTENSION: &str = "wav";

/// Sub-directory searched after the root itself
const AUDIO_SUBDIR: &str = "AUDIO";

/// Directory of cue assets
///
/// A logical name `first_beat` resolves to `<root>/first_beat.wav`, falling
/// back to `<root>/AUDIO/first_beat.wav`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AssetStore { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths tried for `name`, in order
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let file = if Path::new(name).extension().is_some() {
            PathBuf::from(name)
        } else {
            Path::new(name).with_extension(EXTENSION)
        };
        vec![self.root.join(&file), self.root.join(AUDIO_SUBDIR).join(&file)]
    }

    /// First existing file for `name`
    pub fn resolve(&self, name: &str) -> Result<PathBuf, AudioError> {
        let searched = self.candidates(name);
        searched
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| AudioError::AssetMissing {
                name: name.to_string(),
                searched,
            })
    }

    /// Resolve and decode `name`.
    pub fn load(&self, name: &str) -> Result<CueSample, AudioError> {
        let path = self.resolve(name)?;
        log::debug!("loading cue '{name}' from {}", path.display());
        CueSample::from_wav_file(name, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_candidates() {
        let store = AssetStore::new("/assets");
        assert_eq!(
            store.candidates("first_beat"),
            vec![
                PathBuf::from("/assets/first_beat.wav"),
                PathBuf::from("/assets/AUDIO/first_beat.wav")
            ]
        );
        assert_eq!(
            store.candidates("click.wav")[0],
            PathBuf::from("/assets/click.wav")
        );
    }

    #[test]
    fn test_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        match store.resolve("first_beat") {
            Err(AudioError::AssetMissing { name, searched }) => {
                assert_eq!(name, "first_beat");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("expected AssetMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_resolves_audio_subdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("AUDIO")).unwrap();
        let path = dir.path().join("AUDIO").join("second_beat.wav");
        fs::write(&path, b"").unwrap();

        let store = AssetStore::new(dir.path());
        assert_eq!(store.resolve("second_beat").unwrap(), path);
    }

    #[test]
    fn test_root_wins_over_subdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("AUDIO")).unwrap();
        fs::write(dir.path().join("AUDIO").join("first_beat.wav"), b"").unwrap();
        fs::write(dir.path().join("first_beat.wav"), b"").unwrap();

        let store = AssetStore::new(dir.path());
        assert_eq!(
            store.resolve("first_beat").unwrap(),
            dir.path().join("first_beat.wav")
        );
    }
}
