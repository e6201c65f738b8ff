use std::path::{Path, PathBuf};

use log::warn;

use crate::{
    hashing::{distance::Metric, PhotoFingerprint, VideoFingerprint},
    store::{shard, MetaTable, StoreCfg, StoreRecord, StoreResult},
};

use super::bk_tree::BkTree;

/// One hash in the index, carrying enough provenance to report a match.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct IndexedHash {
    pub phash: u64,
    pub src_path: PathBuf,
    /// None for photos.
    pub frame_number: Option<u32>,
}

//the index metric considers only the hash; provenance is payload
impl Metric for IndexedHash {
    fn distance(&self, other: &Self) -> u32 {
        self.phash.distance(&other.phash)
    }
}

/// A record type whose hashes can be fed into a [FingerprintIndex].
pub trait IndexRecord {
    fn indexed_hashes(&self) -> Vec<IndexedHash>;
}

impl IndexRecord for VideoFingerprint {
    fn indexed_hashes(&self) -> Vec<IndexedHash> {
        self.frames()
            .iter()
            .map(|frame| IndexedHash {
                phash: frame.phash(),
                src_path: self.src_path().to_path_buf(),
                frame_number: Some(frame.frame_number()),
            })
            .collect()
    }
}

impl IndexRecord for PhotoFingerprint {
    fn indexed_hashes(&self) -> Vec<IndexedHash> {
        vec![IndexedHash {
            phash: self.phash(),
            src_path: self.src_path().to_path_buf(),
            frame_number: None,
        }]
    }
}

/// One similarity match returned by a query.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct IndexMatch {
    pub src_path: PathBuf,
    pub frame_number: Option<u32>,
    pub distance: u32,
}

/// A similarity-searchable index over a persisted fingerprint database.
///
/// The index is built once per query session by walking the metatable and
/// loading every shard into a [BkTree] keyed by Hamming distance, then
/// discarded after the query batch; it is never persisted itself. The built
/// tree is read-only and safe to share between concurrently querying
/// threads.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    tree: BkTree<IndexedHash>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self { tree: BkTree::new() }
    }

    /// Build the index from every shard the database's metatable knows
    /// about. A shard that fails to load is logged and skipped; the batch
    /// carries on with the shards that remain.
    pub fn from_database<T>(cfg: &StoreCfg) -> StoreResult<Self>
    where
        T: StoreRecord + IndexRecord,
    {
        let metatable = MetaTable::load(&cfg.metatable_path)?;

        let mut ret = Self::new();
        for entry in metatable.entries() {
            let shard_path = cfg.db_dir.join(&entry.file_name);
            match shard::load_records::<T>(&shard_path) {
                Ok(records) => ret.seed(&records),
                Err(e) => {
                    warn!(
                        target: "index_build",
                        "skipping unreadable shard {}: {e}",
                        shard_path.display()
                    );
                }
            }
        }

        Ok(ret)
    }

    /// Add fingerprints directly (used for reference sets that are not on
    /// disk).
    pub fn seed<T: IndexRecord>(&mut self, records: &[T]) {
        for record in records {
            for hash in record.indexed_hashes() {
                self.tree.add(hash);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Every indexed frame/photo within `radius` Hamming distance of the
    /// candidate hash, closest first.
    pub fn query(&self, phash: u64, radius: u32) -> Vec<IndexMatch> {
        let probe = Self::probe(phash);

        let mut matches = self
            .tree
            .query(&probe, radius)
            .into_iter()
            .map(|(hash, distance)| IndexMatch {
                src_path: hash.src_path.clone(),
                frame_number: hash.frame_number,
                distance,
            })
            .collect::<Vec<_>>();

        matches.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| a.src_path.cmp(&b.src_path))
                .then_with(|| a.frame_number.cmp(&b.frame_number))
        });
        matches
    }

    /// The single closest indexed frame/photo to the candidate hash.
    pub fn find_closest(&self, phash: u64) -> Option<IndexMatch> {
        let probe = Self::probe(phash);
        self.tree.find_closest(&probe).map(|(hash, distance)| IndexMatch {
            src_path: hash.src_path.clone(),
            frame_number: hash.frame_number,
            distance,
        })
    }

    fn probe(phash: u64) -> IndexedHash {
        IndexedHash {
            phash,
            src_path: PathBuf::new(),
            frame_number: None,
        }
    }
}

/// Convenience constructor for video databases.
pub fn video_index(cfg: &StoreCfg) -> StoreResult<FingerprintIndex> {
    FingerprintIndex::from_database::<VideoFingerprint>(cfg)
}

/// Convenience constructor for photo databases.
pub fn photo_index(cfg: &StoreCfg) -> StoreResult<FingerprintIndex> {
    FingerprintIndex::from_database::<PhotoFingerprint>(cfg)
}

impl AsRef<Path> for IndexMatch {
    fn as_ref(&self) -> &Path {
        &self.src_path
    }
}
