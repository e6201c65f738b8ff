use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::raster::PixelBuffer;

use super::{HashCreationErrorKind, PerceptualHasher, PhotoFingerprint};

/// Fingerprint a single photo file.
pub fn hash_photo(
    src_path: impl AsRef<Path>,
    with_thumbnail: bool,
) -> Result<PhotoFingerprint, HashCreationErrorKind> {
    let src_path = src_path.as_ref();

    let img = image::open(src_path).map_err(|e| HashCreationErrorKind::PhotoRead {
        src_path: src_path.to_path_buf(),
        error: e.to_string(),
    })?;

    let frame = PixelBuffer::from_rgb_image(&img.to_rgb8()).lock();

    let hasher = PerceptualHasher::new();
    if with_thumbnail {
        let (hash, thumbnail) = hasher.hash_frame(&frame)?;
        Ok(PhotoFingerprint::new(src_path, hash, Some(thumbnail)))
    } else {
        let hash = hasher.hash_frame_only(&frame)?;
        Ok(PhotoFingerprint::new(src_path, hash, None))
    }
}

/// Fingerprint a batch of photos in parallel.
///
/// A failing file never aborts the batch: failures are collected, retried
/// once at the end (transient I/O errors do occur on large corpora), and
/// only files that fail twice are reported as skipped.
pub fn hash_photos(
    src_paths: &[PathBuf],
    with_thumbnail: bool,
) -> (Vec<PhotoFingerprint>, Vec<(PathBuf, HashCreationErrorKind)>) {
    let (mut fingerprints, failures): (Vec<_>, Vec<_>) = src_paths
        .par_iter()
        .map(|path| (path, hash_photo(path, with_thumbnail)))
        .partition_map(|(path, result)| match result {
            Ok(fingerprint) => rayon::iter::Either::Left(fingerprint),
            Err(e) => rayon::iter::Either::Right((path.clone(), e)),
        });

    if !failures.is_empty() {
        info!(
            target: "photo_hashing",
            "retrying {} failed photos once",
            failures.len()
        );
    }

    //one retry for the failures, sequentially. Anything failing twice is
    //given up on permanently.
    let mut skipped = vec![];
    for (path, first_error) in failures {
        match hash_photo(&path, with_thumbnail) {
            Ok(fingerprint) => fingerprints.push(fingerprint),
            Err(_second_error) => {
                warn!(
                    target: "photo_hashing",
                    "skipping {}: {}",
                    path.display(),
                    first_error
                );
                skipped.push((path, first_error));
            }
        }
    }

    (fingerprints, skipped)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_photo_reports_photo_read_error() {
        let err = hash_photo("/nonexistent/photo.jpg", false).unwrap_err();
        assert!(matches!(err, HashCreationErrorKind::PhotoRead { .. }));
    }

    #[test]
    fn test_batch_collects_skipped_files_without_aborting() {
        let paths = vec![
            PathBuf::from("/nonexistent/a.jpg"),
            PathBuf::from("/nonexistent/b.jpg"),
        ];

        let (fingerprints, skipped) = hash_photos(&paths, false);
        assert!(fingerprints.is_empty());
        assert_eq!(skipped.len(), 2);
    }
}
