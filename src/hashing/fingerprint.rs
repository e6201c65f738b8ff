use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{distance::Metric, HashCreationErrorKind};

/// The fingerprint of a single video frame: the 64-bit perceptual hash plus
/// an optional bit-packed edge thumbnail. Immutable once produced.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct FrameFingerprint {
    frame_number: u32,
    phash: u64,
    edge_thumbnail: Option<Vec<u8>>,
}

impl FrameFingerprint {
    pub fn new(frame_number: u32, phash: u64, edge_thumbnail: Option<Vec<u8>>) -> Self {
        Self {
            frame_number,
            phash,
            edge_thumbnail,
        }
    }

    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn phash(&self) -> u64 {
        self.phash
    }

    pub fn edge_thumbnail(&self) -> Option<&[u8]> {
        self.edge_thumbnail.as_deref()
    }

    /// Hamming distance between the perceptual hashes of two frames.
    pub fn distance(&self, other: &Self) -> u32 {
        self.phash.distance(&other.phash)
    }
}

/// The fingerprint of a single photo. Identity is the source path; equality
/// also compares the hash and the exact thumbnail bytes.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct PhotoFingerprint {
    src_path: PathBuf,
    phash: u64,
    edge_thumbnail: Option<Vec<u8>>,
}

impl PhotoFingerprint {
    pub fn new(src_path: impl AsRef<Path>, phash: u64, edge_thumbnail: Option<Vec<u8>>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            phash,
            edge_thumbnail,
        }
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    pub fn phash(&self) -> u64 {
        self.phash
    }

    pub fn edge_thumbnail(&self) -> Option<&[u8]> {
        self.edge_thumbnail.as_deref()
    }
}

/// The fingerprint of a whole video: an unordered set of frame fingerprints
/// keyed by frame number.
///
/// Frame numbers need not be contiguous (frame subsampling is permitted) but
/// must be unique within one video. Equality is order-insensitive.
#[derive(Clone, Eq, Debug, Serialize, Deserialize)]
pub struct VideoFingerprint {
    src_path: PathBuf,
    frames: Vec<FrameFingerprint>,
}

impl VideoFingerprint {
    pub fn new(src_path: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            frames: vec![],
        }
    }

    pub fn from_frames(
        src_path: impl AsRef<Path>,
        frames: impl IntoIterator<Item = FrameFingerprint>,
    ) -> Result<Self, HashCreationErrorKind> {
        let mut ret = Self::new(src_path);
        for frame in frames {
            ret.push_frame(frame)?;
        }
        Ok(ret)
    }

    /// Add a frame. Rejects a frame number already present in this video.
    pub fn push_frame(&mut self, frame: FrameFingerprint) -> Result<(), HashCreationErrorKind> {
        if self
            .frames
            .iter()
            .any(|f| f.frame_number() == frame.frame_number())
        {
            return Err(HashCreationErrorKind::DuplicateFrameNumber {
                src_path: self.src_path.clone(),
                frame_number: frame.frame_number(),
            });
        }

        self.frames.push(frame);
        Ok(())
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    pub fn frames(&self) -> &[FrameFingerprint] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl PartialEq for VideoFingerprint {
    fn eq(&self, other: &Self) -> bool {
        if self.src_path != other.src_path || self.frames.len() != other.frames.len() {
            return false;
        }

        //frames are an unordered set keyed by frame number
        let sorted = |fp: &Self| {
            let mut frames = fp.frames.clone();
            frames.sort_by_key(FrameFingerprint::frame_number);
            frames
        };

        sorted(self) == sorted(other)
    }
}

impl std::hash::Hash for VideoFingerprint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.src_path.hash(state);
        let mut frames = self.frames.clone();
        frames.sort_by_key(FrameFingerprint::frame_number);
        frames.hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn frame(n: u32) -> FrameFingerprint {
        FrameFingerprint::new(n, n as u64 * 3, Some(vec![n as u8; 32]))
    }

    #[test]
    fn test_duplicate_frame_number_is_rejected() {
        let mut fp = VideoFingerprint::new("vid.mp4");
        fp.push_frame(frame(4)).unwrap();
        fp.push_frame(frame(8)).unwrap();

        let err = fp.push_frame(frame(4)).unwrap_err();
        assert!(matches!(
            err,
            HashCreationErrorKind::DuplicateFrameNumber { frame_number: 4, .. }
        ));
        assert_eq!(fp.len(), 2);
    }

    #[test]
    fn test_noncontiguous_frame_numbers_are_permitted() {
        let fp = VideoFingerprint::from_frames("vid.mp4", [frame(0), frame(30), frame(90)]);
        assert_eq!(fp.unwrap().len(), 3);
    }

    #[test]
    fn test_equality_is_order_insensitive() {
        let a = VideoFingerprint::from_frames("vid.mp4", [frame(1), frame(2), frame(3)]).unwrap();
        let b = VideoFingerprint::from_frames("vid.mp4", [frame(3), frame(1), frame(2)]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_compares_path_and_contents() {
        let a = VideoFingerprint::from_frames("vid.mp4", [frame(1)]).unwrap();
        let b = VideoFingerprint::from_frames("other.mp4", [frame(1)]).unwrap();
        assert_ne!(a, b);

        let c = VideoFingerprint::from_frames(
            "vid.mp4",
            [FrameFingerprint::new(1, 999, None)],
        )
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_photo_equality_includes_thumbnail_bytes() {
        let a = PhotoFingerprint::new("p.jpg", 42, Some(vec![1, 2, 3]));
        let b = PhotoFingerprint::new("p.jpg", 42, Some(vec![1, 2, 4]));
        let c = PhotoFingerprint::new("p.jpg", 42, Some(vec![1, 2, 3]));
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
