use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
};

use crossbeam_channel::{Receiver, Sender};
use log::info;
use thiserror::Error;

use crate::{
    hashing::{FrameFingerprint, HashCreationErrorKind, PerceptualHasher, VideoFingerprint},
    raster::{LockedFrame, PixelBuffer},
    store::{StoreErrorKind, Submitter},
};

use super::memory_gate::MemoryGate;

/// A source of decoded video frames. The external decoder process (and its
/// management) lives outside this crate; the pipeline consumes only its
/// output as raw pixel buffers, in presentation order.
pub trait FrameSource {
    /// The next decoded frame and its frame number, or None at end of
    /// stream. Frame numbers need not be contiguous when the source
    /// subsamples.
    fn next_frame(&mut self) -> Result<Option<(u32, PixelBuffer)>, FrameSourceErrorKind>;
}

/// Errors produced by a [FrameSource] collaborator.
#[derive(Error, Debug, Clone)]
pub enum FrameSourceErrorKind {
    /// The external decoder exited with a failure, or wrote a malformed
    /// frame. Recoverable at batch level: skip the file and continue.
    #[error("decode failure: {0}")]
    Decode(String),

    #[error("I/O failure reading frames: {0}")]
    Io(String),
}

/// Error type for one video's trip through the indexing pipeline.
#[derive(Error, Debug)]
pub enum IndexingErrorKind {
    #[error("frame source failed for {src_path}: {error}")]
    Source {
        src_path: PathBuf,
        error: FrameSourceErrorKind,
    },

    #[error("hashing failed for {src_path}: {error}")]
    Hash {
        src_path: PathBuf,
        error: HashCreationErrorKind,
    },

    #[error(transparent)]
    Store(#[from] StoreErrorKind),
}

/// Cooperative cancellation signal, observed between items: in-flight
/// frames finish hashing, no new frames are accepted, and the store still
/// receives whatever completed so its final flush loses nothing.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Relaxed)
    }
}

/// Tuning for the hashing worker pool.
#[derive(Clone, Debug)]
pub struct PipelineCfg {
    /// Number of hashing worker threads.
    pub num_workers: usize,
    /// Budget for raw decoded frame bytes outstanding at once.
    pub max_memory: u64,
    /// Whether to produce edge thumbnails alongside hashes.
    pub with_thumbnails: bool,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            num_workers: 4,
            max_memory: 256 * 1024 * 1024,
            with_thumbnails: true,
        }
    }
}

//a frame in flight between the reader and a worker, with the byte count it
//holds against the memory gate
struct QueuedFrame {
    frame_number: u32,
    frame: LockedFrame,
    gated_bytes: u64,
}

/// Stream one video through the hashing worker pool and submit the
/// resulting [VideoFingerprint] to the store.
///
/// The reader thread pulls decoded frames from the source, claiming each
/// frame's bytes from the memory gate before queueing it; `num_workers`
/// stateless workers hash in parallel and release the gate as frames are
/// consumed. Ownership of each frame buffer passes from the reader to
/// exactly one worker. Returns the number of frames fingerprinted.
pub fn index_video<S: FrameSource>(
    src_path: impl AsRef<Path>,
    mut source: S,
    cfg: &PipelineCfg,
    cancel: &CancellationToken,
    submitter: &Submitter<VideoFingerprint>,
) -> Result<u64, IndexingErrorKind> {
    let src_path = src_path.as_ref();

    let gate = MemoryGate::new(cfg.max_memory);
    let num_workers = cfg.num_workers.max(1);

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<QueuedFrame>(num_workers * 2);
    let (result_tx, result_rx) =
        crossbeam_channel::unbounded::<Result<FrameFingerprint, HashCreationErrorKind>>();

    let mut source_error: Option<FrameSourceErrorKind> = None;

    std::thread::scope(|scope| {
        for _ in 0..num_workers {
            let frame_rx = frame_rx.clone();
            let result_tx = result_tx.clone();
            let gate = &gate;
            scope.spawn(move || {
                hash_worker(frame_rx, result_tx, gate, cfg.with_thumbnails);
            });
        }
        drop(frame_rx);
        drop(result_tx);

        //the reader runs on this thread: pull frames until end of stream,
        //source failure, or cancellation
        loop {
            if cancel.is_cancelled() {
                info!(
                    target: "frame_pipeline",
                    "cancellation observed while indexing {}",
                    src_path.display()
                );
                break;
            }

            match source.next_frame() {
                Ok(None) => break,
                Ok(Some((frame_number, frame))) => {
                    let gated_bytes = frame.byte_len() as u64;
                    gate.acquire(gated_bytes);
                    let queued = QueuedFrame {
                        frame_number,
                        frame: frame.lock(),
                        gated_bytes,
                    };
                    if frame_tx.send(queued).is_err() {
                        //all workers died; the drain below reports why
                        break;
                    }
                }
                Err(e) => {
                    source_error = Some(e);
                    break;
                }
            }
        }
        drop(frame_tx);
    });

    //workers have exited; drain their results and reassemble the video
    let mut fingerprint = VideoFingerprint::new(src_path);
    let mut hashed_frames = result_rx.into_iter().collect::<Vec<_>>();
    hashed_frames.sort_by_key(|result| {
        result
            .as_ref()
            .map(FrameFingerprint::frame_number)
            .unwrap_or(u32::MAX)
    });

    for result in hashed_frames {
        let frame = result.map_err(|error| IndexingErrorKind::Hash {
            src_path: src_path.to_path_buf(),
            error,
        })?;
        fingerprint
            .push_frame(frame)
            .map_err(|error| IndexingErrorKind::Hash {
                src_path: src_path.to_path_buf(),
                error,
            })?;
    }

    if let Some(error) = source_error {
        return Err(IndexingErrorKind::Source {
            src_path: src_path.to_path_buf(),
            error,
        });
    }

    if fingerprint.is_empty() && !cancel.is_cancelled() {
        return Err(IndexingErrorKind::Hash {
            src_path: src_path.to_path_buf(),
            error: HashCreationErrorKind::EmptyVideo(src_path.to_path_buf()),
        });
    }

    let num_frames = fingerprint.len() as u64;
    submitter.submit(fingerprint)?;
    Ok(num_frames)
}

//stateless hashing worker. Shares nothing mutable with its peers; the DCT
//plan cache behind the hasher is read-mostly and thread-safe.
fn hash_worker(
    frame_rx: Receiver<QueuedFrame>,
    result_tx: Sender<Result<FrameFingerprint, HashCreationErrorKind>>,
    gate: &MemoryGate,
    with_thumbnails: bool,
) {
    let hasher = PerceptualHasher::new();

    for queued in frame_rx.iter() {
        let result = hasher.fingerprint_frame(queued.frame_number, &queued.frame, with_thumbnails);
        gate.release(queued.gated_bytes);

        if result_tx.send(result).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        raster::Rgb,
        store::{FingerPrintStore, StoreCfg},
    };

    //a synthetic in-memory decoder standing in for the external process
    struct SyntheticSource {
        frames: Vec<(u32, PixelBuffer)>,
        fail_after: Option<usize>,
        served: usize,
    }

    impl SyntheticSource {
        fn new(num_frames: u32) -> Self {
            let frames = (0..num_frames)
                .map(|n| {
                    let mut buf = PixelBuffer::new(64, 48).unwrap();
                    for y in 0..48 {
                        for x in 0..64 {
                            let v = ((x + y + n * 5) % 256) as u8;
                            buf.set_pixel(x, y, Rgb { r: v, g: v, b: v });
                        }
                    }
                    //subsampled: one fingerprinted frame every 30
                    (n * 30, buf)
                })
                .collect();

            Self {
                frames,
                fail_after: None,
                served: 0,
            }
        }
    }

    impl FrameSource for SyntheticSource {
        fn next_frame(&mut self) -> Result<Option<(u32, PixelBuffer)>, FrameSourceErrorKind> {
            if Some(self.served) == self.fail_after {
                return Err(FrameSourceErrorKind::Decode("decoder exited 1".to_string()));
            }

            if self.served >= self.frames.len() {
                return Ok(None);
            }

            let (n, frame) = self.frames[self.served].clone();
            self.served += 1;
            Ok(Some((n, frame)))
        }
    }

    fn test_cfg() -> PipelineCfg {
        PipelineCfg {
            num_workers: 3,
            max_memory: 1024 * 1024,
            with_thumbnails: false,
        }
    }

    #[test]
    fn test_all_frames_fingerprinted_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerPrintStore::spawn(StoreCfg::new(dir.path())).unwrap();
        let submitter = store.submitter().unwrap();

        let num_frames = index_video(
            "synthetic.mp4",
            SyntheticSource::new(10),
            &test_cfg(),
            &CancellationToken::new(),
            &submitter,
        )
        .unwrap();
        assert_eq!(num_frames, 10);

        drop(submitter);
        store.wait().unwrap();
    }

    #[test]
    fn test_source_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerPrintStore::spawn(StoreCfg::new(dir.path())).unwrap();
        let submitter = store.submitter().unwrap();

        let mut source = SyntheticSource::new(10);
        source.fail_after = Some(4);

        let err = index_video(
            "synthetic.mp4",
            source,
            &test_cfg(),
            &CancellationToken::new(),
            &submitter,
        )
        .unwrap_err();
        assert!(matches!(err, IndexingErrorKind::Source { .. }));

        drop(submitter);
        store.wait().unwrap();
    }

    #[test]
    fn test_pre_cancelled_pipeline_reads_no_frames() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerPrintStore::spawn(StoreCfg::new(dir.path())).unwrap();
        let submitter = store.submitter().unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        //cancellation before the first frame: a clean, empty fingerprint
        //is still submitted so nothing buffered is lost downstream
        let num_frames = index_video(
            "synthetic.mp4",
            SyntheticSource::new(10),
            &test_cfg(),
            &cancel,
            &submitter,
        )
        .unwrap();
        assert_eq!(num_frames, 0);

        drop(submitter);
        store.wait().unwrap();
    }

    #[test]
    fn test_memory_budget_smaller_than_one_frame_still_progresses() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerPrintStore::spawn(StoreCfg::new(dir.path())).unwrap();
        let submitter = store.submitter().unwrap();

        let cfg = PipelineCfg {
            max_memory: 1, //every frame is oversize; admitted one at a time
            ..test_cfg()
        };

        let num_frames = index_video(
            "synthetic.mp4",
            SyntheticSource::new(4),
            &cfg,
            &CancellationToken::new(),
            &submitter,
        )
        .unwrap();
        assert_eq!(num_frames, 4);

        drop(submitter);
        store.wait().unwrap();
    }
}
