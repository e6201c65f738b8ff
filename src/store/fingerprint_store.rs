use std::{
    path::{Path, PathBuf},
    thread::JoinHandle,
};

use crossbeam_channel::{Receiver, Sender};
use log::{info, trace};

use crate::definitions::{FLUSH_THRESHOLD, MAX_SHARD_SIZE};

use super::{
    meta_table::MetaTable,
    shard,
    shard::StoreRecord,
    store_error_kind::{StoreErrorKind, StoreResult},
};

/// Configuration for a fingerprint database on disk.
#[derive(Clone, Debug)]
pub struct StoreCfg {
    /// Directory holding the shard files.
    pub db_dir: PathBuf,
    /// Path of the metatable file.
    pub metatable_path: PathBuf,
    /// Size at which a shard stops accepting new fingerprints.
    pub max_shard_size: u64,
    /// Number of buffered fingerprints that triggers a flush.
    pub flush_threshold: usize,
}

impl StoreCfg {
    pub fn new(db_dir: impl AsRef<Path>) -> Self {
        let db_dir = db_dir.as_ref().to_path_buf();
        Self {
            metatable_path: db_dir.join("metatable.bin"),
            db_dir,
            max_shard_size: MAX_SHARD_SIZE,
            flush_threshold: FLUSH_THRESHOLD,
        }
    }
}

/// A cloneable handle through which hashing workers submit completed
/// fingerprints to the store's writer thread. Submission never blocks;
/// backpressure is applied upstream by the pipeline's memory gate.
#[derive(Clone, Debug)]
pub struct Submitter<T> {
    tx: Sender<T>,
}

impl<T> Submitter<T> {
    pub fn submit(&self, fingerprint: T) -> StoreResult<()> {
        self.tx
            .send(fingerprint)
            .map_err(|_| StoreErrorKind::StoreClosed)
    }
}

/// The concurrent fingerprint indexing pipeline's sink.
///
/// Any number of producers submit fingerprints through [Submitter] handles;
/// one dedicated writer thread drains them, buffers up to `flush_threshold`,
/// appends each batch to the current shard (rewriting the shard file and the
/// metatable entry's size), and rolls over to a fresh shard once the current
/// one exceeds `max_shard_size`. Serializing all shard and metatable
/// mutation through the single writer removes any possibility of
/// concurrent-writer corruption without file locks.
pub struct FingerPrintStore<T> {
    submit_tx: Option<Sender<T>>,
    writer: Option<JoinHandle<StoreResult<()>>>,
}

impl<T: StoreRecord> FingerPrintStore<T> {
    /// Open (or create) the database at `cfg.db_dir` and start the writer
    /// thread.
    pub fn spawn(cfg: StoreCfg) -> StoreResult<Self> {
        if let Err(e) = std::fs::create_dir_all(&cfg.db_dir) {
            return Err(StoreErrorKind::ShardIo {
                src: e,
                path: cfg.db_dir.clone(),
            });
        }

        let metatable = MetaTable::load(&cfg.metatable_path)?;

        let (submit_tx, submit_rx) = crossbeam_channel::unbounded();

        let writer = std::thread::Builder::new()
            .name("fingerprint-store-writer".to_string())
            .spawn(move || run_writer(cfg, metatable, submit_rx))
            .expect("failed to spawn store writer thread");

        Ok(Self {
            submit_tx: Some(submit_tx),
            writer: Some(writer),
        })
    }

    /// A new submission handle for a producer thread.
    pub fn submitter(&self) -> StoreResult<Submitter<T>> {
        match self.submit_tx.as_ref() {
            Some(tx) => Ok(Submitter { tx: tx.clone() }),
            None => Err(StoreErrorKind::StoreClosed),
        }
    }

    /// Mark that no more input will arrive. Idempotent. The writer thread
    /// finishes draining whatever is still queued (and whatever outstanding
    /// [Submitter] clones still send) and then performs its final flush.
    pub fn shutdown(&mut self) {
        self.submit_tx.take();
    }

    /// Block until the writer thread has drained and the final flush has
    /// completed, surfacing any error the writer hit.
    pub fn wait(mut self) -> StoreResult<()> {
        self.shutdown();
        match self.writer.take() {
            None => Ok(()),
            Some(writer) => match writer.join() {
                Err(_panic) => Err(StoreErrorKind::WriterPanic),
                Ok(result) => result,
            },
        }
    }
}

impl<T> Drop for FingerPrintStore<T> {
    fn drop(&mut self) {
        //closing the channel lets the writer drain and exit rather than
        //block forever; errors on this path have nowhere to go
        self.submit_tx.take();
        if let Some(writer) = self.writer.take() {
            let _join_error = writer.join();
        }
    }
}

//The writer thread. Per shard the state machine is
//SELECT_SHARD -> BUFFER -> FLUSH -> [ROLLOVER] -> SELECT_SHARD, with a
//final partial flush when the input channel closes.
fn run_writer<T: StoreRecord>(
    cfg: StoreCfg,
    mut metatable: MetaTable,
    submit_rx: Receiver<T>,
) -> StoreResult<()> {
    loop {
        //BUFFER: accumulate up to flush_threshold items
        let mut buffer: Vec<T> = Vec::with_capacity(cfg.flush_threshold);
        let mut input_closed = false;

        while buffer.len() < cfg.flush_threshold {
            match submit_rx.recv() {
                Ok(fingerprint) => buffer.push(fingerprint),
                Err(_) => {
                    input_closed = true;
                    break;
                }
            }
        }

        //FLUSH: on the final drain a partial buffer is flushed regardless
        //of its size
        if !buffer.is_empty() {
            flush(&cfg, &mut metatable, buffer)?;
        }

        if input_closed {
            info!(target: "store_transactions", "store input closed, writer draining complete");
            return Ok(());
        }
    }
}

fn flush<T: StoreRecord>(
    cfg: &StoreCfg,
    metatable: &mut MetaTable,
    buffer: Vec<T>,
) -> StoreResult<()> {
    //SELECT_SHARD: first metatable entry still under the size limit, else
    //register a fresh shard (this is where rollover happens: a shard that
    //grew past the limit in the previous flush no longer qualifies)
    let shard_name = match metatable.select_shard(cfg.max_shard_size) {
        Some(entry) => entry.file_name.clone(),
        None => {
            let name = shard::next_shard_name(&cfg.db_dir, &metatable.shard_names());
            info!(target: "store_transactions", "opening new shard {name}");
            metatable.register(&name);
            name
        }
    };

    let shard_path = cfg.db_dir.join(&shard_name);

    trace!(
        target: "store_transactions",
        "flushing {} fingerprints into {shard_name}",
        buffer.len()
    );

    //append-rewrite the shard, then record its true new size
    let mut records: Vec<T> = shard::load_records_or_empty(&shard_path)?;
    records.extend(buffer);
    let file_size = shard::save_records(&shard_path, &records)?;

    metatable.set_size(&shard_name, file_size);
    metatable.save(&cfg.metatable_path)?;

    Ok(())
}
