use std::path::Path;

use serde::{Deserialize, Serialize};

use super::store_error_kind::{StoreErrorKind::*, StoreResult};

/// One shard known to the database: its file name (relative to the database
/// directory) and its true on-disk size.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct MetaTableEntry {
    pub file_name: String,
    pub file_size: u64,
}

/// The index of all shards in a fingerprint database, letting the writer
/// select a shard by size without opening every shard file.
///
/// The metatable is small and is loaded/saved wholesale. Its sizes must
/// reflect the true on-disk size of every shard after each write; shard
/// selection and coalescing both misbehave on stale sizes.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct MetaTable {
    entries: Vec<MetaTableEntry>,
}

impl MetaTable {
    /// Load from disk. A metatable that does not exist yet is an empty
    /// database, not an error.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) => {
                return Err(MetaTableIo {
                    src: e,
                    path: path.to_path_buf(),
                })
            }
        };

        let reader = std::io::BufReader::new(file);
        bincode::deserialize_from(reader).map_err(|e| Deserialization {
            src: format!("{e}"),
            path: path.to_path_buf(),
        })
    }

    /// Save durably: write to a temporary sibling, sync, rename. The
    /// coalescer relies on this completing before any old shard is deleted.
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        use std::io::BufWriter;

        let path = path.as_ref();

        if let Some(parent_dir) = path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(parent_dir) {
                    return Err(MetaTableIo {
                        src: e,
                        path: path.to_path_buf(),
                    });
                }
            }
        }

        let temp_path = path.with_extension("tmp");
        let temp_file = match std::fs::File::create(&temp_path) {
            Ok(f) => f,
            Err(e) => {
                return Err(MetaTableIo {
                    src: e,
                    path: path.to_path_buf(),
                })
            }
        };

        let mut buf = BufWriter::new(temp_file);
        if let Err(e) = bincode::serialize_into(&mut buf, self) {
            return Err(Serialization {
                src: format!("{e}"),
                path: path.to_path_buf(),
            });
        }
        let temp_file = match buf.into_inner() {
            Ok(f) => f,
            Err(e) => {
                return Err(MetaTableIo {
                    src: e.into_error(),
                    path: path.to_path_buf(),
                })
            }
        };

        if let Err(e) = temp_file.sync_all() {
            return Err(MetaTableIo {
                src: e,
                path: path.to_path_buf(),
            });
        }

        if let Err(e) = std::fs::rename(&temp_path, path) {
            return Err(MetaTableIo {
                src: e,
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    /// The first shard still under the size limit, if any. Shard selection
    /// is deliberately first-fit: earlier shards fill before new ones open.
    pub fn select_shard(&self, max_shard_size: u64) -> Option<&MetaTableEntry> {
        self.entries.iter().find(|e| e.file_size < max_shard_size)
    }

    /// Register a new, empty shard.
    pub fn register(&mut self, file_name: impl Into<String>) {
        self.entries.push(MetaTableEntry {
            file_name: file_name.into(),
            file_size: 0,
        });
    }

    pub fn set_size(&mut self, file_name: &str, file_size: u64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.file_name == file_name) {
            entry.file_size = file_size;
        }
    }

    pub fn entries(&self) -> &[MetaTableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shard_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.file_name.clone()).collect()
    }

    /// Drop every entry whose file name is in `names`. Used by the
    /// coalescer when replacing merged shards.
    pub fn remove_entries(&mut self, names: &[String]) {
        self.entries.retain(|e| !names.contains(&e.file_name));
    }

    pub fn push_entry(&mut self, entry: MetaTableEntry) {
        self.entries.push(entry);
    }
}
