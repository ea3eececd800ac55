//! Asset staging in a per-run working directory.
//!
//! Every render gets its own temporary directory, so concurrent runs never
//! share file names. [`StagingArea`] owns everything written there and
//! removes it on [`StagingArea::cleanup`] or, failing that, on drop.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::job::EmbeddedAsset;
use tempfile::TempDir;

use crate::manifest::ConcatManifest;

/// Staged soundtrack file name.
pub const AUDIO_FILE_NAME: &str = "audio.mp3";

/// Staged manifest file name.
pub const MANIFEST_FILE_NAME: &str = "image_list.txt";

const WORK_DIR_PREFIX: &str = "slidecast-";

/// Standard alphabet, lenient about non-zero bits after the last symbol.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);
const MIN_INDEX_WIDTH: usize = 3;

/// Owner of a run's temporary files.
#[derive(Debug)]
pub struct StagingArea {
    dir: Option<TempDir>,
    root: PathBuf,
    audio: Option<PathBuf>,
    images: Vec<PathBuf>,
    manifest: Option<PathBuf>,
}

impl StagingArea {
    /// Create a working directory under the system temp directory.
    pub fn create() -> SlidecastResult<Self> {
        Self::create_in(std::env::temp_dir())
    }

    /// Create a working directory under `parent`.
    pub fn create_in(parent: impl AsRef<Path>) -> SlidecastResult<Self> {
        let parent = absolute(parent.as_ref())?;
        let dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| SlidecastError::staging_io(&parent, e))?;
        let root = dir.path().to_path_buf();
        tracing::debug!(work_dir = %root.display(), "Created staging directory");

        Ok(Self {
            dir: Some(dir),
            root,
            audio: None,
            images: Vec::new(),
            manifest: None,
        })
    }

    /// The run's working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_paths(&self) -> &[PathBuf] {
        &self.images
    }

    /// Decode the soundtrack to `audio.mp3`.
    pub fn stage_audio(&mut self, asset: &EmbeddedAsset) -> SlidecastResult<PathBuf> {
        let bytes = decode_asset(asset, "audio")?;
        let path = self.root.join(AUDIO_FILE_NAME);
        self.audio = Some(path.clone());
        write_staged(&path, &bytes)?;
        Ok(path)
    }

    /// Decode slides to `image_000.png`, `image_001.png`, ... in order.
    pub fn stage_images(&mut self, assets: &[EmbeddedAsset]) -> SlidecastResult<&[PathBuf]> {
        let width = index_width(assets.len());
        for (index, asset) in assets.iter().enumerate() {
            let bytes = decode_asset(asset, &format!("image {index}"))?;
            let path = self
                .root
                .join(format!("image_{index:0width$}.png", width = width));
            self.images.push(path.clone());
            write_staged(&path, &bytes)?;
        }
        tracing::debug!(count = self.images.len(), "Staged images");
        Ok(&self.images)
    }

    /// Write the concat manifest to `image_list.txt`.
    pub fn write_manifest(&mut self, manifest: &ConcatManifest) -> SlidecastResult<PathBuf> {
        let path = self.root.join(MANIFEST_FILE_NAME);
        self.manifest = Some(path.clone());
        write_staged(&path, manifest.render().as_bytes())?;
        Ok(path)
    }

    /// Every file this area has claimed, staged or not.
    pub fn staged_files(&self) -> impl Iterator<Item = &Path> {
        self.audio
            .iter()
            .chain(self.manifest.iter())
            .chain(self.images.iter())
            .map(PathBuf::as_path)
    }

    /// Delete every staged file that still exists, then the directory.
    ///
    /// Missing files are skipped, so calling this more than once is fine.
    /// Returns how many files were removed.
    pub fn cleanup(&mut self) -> SlidecastResult<usize> {
        let mut removed = 0;
        let mut first_error = None;

        let claimed: Vec<PathBuf> = self.staged_files().map(Path::to_path_buf).collect();
        for path in claimed {
            match remove_if_present(&path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file");
                    first_error.get_or_insert(SlidecastError::staging_io(path, e));
                }
            }
        }
        self.audio = None;
        self.manifest = None;
        self.images.clear();

        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %self.root.display(), error = %e, "Failed to remove staging directory");
                    first_error.get_or_insert(SlidecastError::staging_io(&self.root, e));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                tracing::debug!(removed, work_dir = %self.root.display(), "Staging cleaned up");
                Ok(removed)
            }
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!(error = %e, "Staging cleanup on drop failed");
        }
    }
}

fn decode_asset(asset: &EmbeddedAsset, label: &str) -> SlidecastResult<Vec<u8>> {
    // Payloads are often line-wrapped.
    let compact: String = asset
        .data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    PAYLOAD_ENGINE
        .decode(compact)
        .map_err(|e| SlidecastError::decode(label, e))
}

fn write_staged(path: &Path, bytes: &[u8]) -> SlidecastResult<()> {
    std::fs::write(path, bytes).map_err(|e| SlidecastError::staging_io(path, e))
}

fn remove_if_present(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Digits needed so lexical order of names matches index order.
fn index_width(count: usize) -> usize {
    let last = count.saturating_sub(1);
    last.to_string().len().max(MIN_INDEX_WIDTH)
}

/// The concat manifest lists absolute paths, which ffmpeg resolves
/// independently of its own working directory.
fn absolute(path: &Path) -> SlidecastResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| SlidecastError::staging_io(path, e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn asset(bytes: &[u8]) -> EmbeddedAsset {
        EmbeddedAsset {
            data: STANDARD.encode(bytes),
        }
    }

    #[test]
    fn test_index_width() {
        assert_eq!(index_width(0), 3);
        assert_eq!(index_width(1), 3);
        assert_eq!(index_width(1000), 3);
        assert_eq!(index_width(1001), 4);
    }

    #[test]
    fn test_staged_bytes_match_original() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let path = area.stage_audio(&asset(&payload)).unwrap();
        assert_eq!(path.file_name().unwrap(), AUDIO_FILE_NAME);
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_wrapped_base64_is_accepted() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let encoded = STANDARD.encode(b"hello slideshow");
        let wrapped = EmbeddedAsset {
            data: format!("{}\n{}", &encoded[..8], &encoded[8..]),
        };

        let path = area.stage_audio(&wrapped).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"hello slideshow");
    }

    #[test]
    fn test_non_canonical_trailing_bits_are_accepted() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let lenient = EmbeddedAsset {
            data: "AB==".to_string(),
        };

        let path = area.stage_audio(&lenient).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![0u8]);
    }

    #[test]
    fn test_images_are_named_in_playback_order() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let assets: Vec<_> = (0..12u8).map(|i| asset(&[i])).collect();

        let paths = area.stage_images(&assets).unwrap().to_vec();
        assert_eq!(paths.len(), 12);
        assert_eq!(paths[0].file_name().unwrap(), "image_000.png");
        assert_eq!(paths[11].file_name().unwrap(), "image_011.png");

        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(sorted, paths);
        for (i, path) in paths.iter().enumerate() {
            assert_eq!(std::fs::read(path).unwrap(), vec![i as u8]);
        }
    }

    #[test]
    fn test_invalid_base64_is_a_decode_error() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let assets = vec![
            asset(b"ok"),
            EmbeddedAsset {
                data: "***".to_string(),
            },
        ];

        let err = area.stage_images(&assets).unwrap_err();
        assert!(matches!(err, SlidecastError::Decode { ref asset, .. } if asset == "image 1"));
        assert_eq!(area.image_paths().len(), 1);
    }

    #[test]
    fn test_cleanup_removes_everything_and_is_idempotent() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let root = area.root().to_path_buf();

        area.stage_audio(&asset(b"audio")).unwrap();
        let images = area
            .stage_images(&[asset(b"a"), asset(b"b")])
            .unwrap()
            .to_vec();
        let manifest = ConcatManifest::build(&images, 4.0).unwrap();
        area.write_manifest(&manifest).unwrap();
        assert_eq!(area.staged_files().count(), 4);

        assert_eq!(area.cleanup().unwrap(), 4);
        assert!(!root.exists());
        assert_eq!(area.cleanup().unwrap(), 0);
    }

    #[test]
    fn test_cleanup_without_staged_files() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        assert_eq!(area.cleanup().unwrap(), 0);
        assert_eq!(area.cleanup().unwrap(), 0);
    }

    #[test]
    fn test_cleanup_tolerates_externally_removed_files() {
        let parent = tempfile::tempdir().unwrap();
        let mut area = StagingArea::create_in(parent.path()).unwrap();
        let audio = area.stage_audio(&asset(b"x")).unwrap();
        std::fs::remove_file(&audio).unwrap();

        assert_eq!(area.cleanup().unwrap(), 0);
    }

    #[test]
    fn test_drop_removes_work_dir() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let mut area = StagingArea::create_in(parent.path()).unwrap();
            area.stage_audio(&asset(b"x")).unwrap();
            area.root().to_path_buf()
        };
        assert!(!root.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_areas_do_not_collide() {
        let parent = tempfile::tempdir().unwrap();
        let a = StagingArea::create_in(parent.path()).unwrap();
        let b = StagingArea::create_in(parent.path()).unwrap();
        assert_ne!(a.root(), b.root());
    }
}
