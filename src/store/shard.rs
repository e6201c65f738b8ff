use std::{
    io::Write,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use super::store_error_kind::{StoreErrorKind::*, StoreResult};

/// A record type that can live in a shard file. Blanket-implemented for
/// anything serde can move across the writer thread.
pub trait StoreRecord: Serialize + DeserializeOwned + Send + 'static {}
impl<T> StoreRecord for T where T: Serialize + DeserializeOwned + Send + 'static {}

#[allow(dead_code)]
enum SerializationBackend {
    Bincode,
    Json,
}

//Json is occasionally useful when inspecting shard contents by hand during
//development; shards written by one backend cannot be read by the other.
const BACKEND: SerializationBackend = SerializationBackend::Bincode;

/// Load every record from the shard at `path`.
pub fn load_records<T: StoreRecord>(path: impl AsRef<Path>) -> StoreResult<Vec<T>> {
    let path = path.as_ref();

    let shard_file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            return Err(ShardIo {
                src: e,
                path: path.to_path_buf(),
            })
        }
    };

    let reader = std::io::BufReader::new(shard_file);
    let records: Vec<T> = match BACKEND {
        SerializationBackend::Bincode => match bincode::deserialize_from(reader) {
            Ok(records) => records,
            Err(e) => {
                return Err(Deserialization {
                    src: format!("{e}"),
                    path: path.to_path_buf(),
                })
            }
        },
        SerializationBackend::Json => match serde_json::from_reader(reader) {
            Ok(records) => records,
            Err(e) => {
                return Err(Deserialization {
                    src: format!("{e}"),
                    path: path.to_path_buf(),
                })
            }
        },
    };

    Ok(records)
}

/// As [load_records], but a shard that does not exist yet loads as empty.
/// Used when bootstrapping a freshly registered shard.
pub fn load_records_or_empty<T: StoreRecord>(path: impl AsRef<Path>) -> StoreResult<Vec<T>> {
    if !path.as_ref().exists() {
        return Ok(vec![]);
    }
    load_records(path)
}

/// Rewrite the shard at `path` with the given records and return its true
/// on-disk size.
///
/// If the process dies while saving we must not lose the previous shard
/// contents, so the records are first written to a temporary sibling, synced,
/// and renamed over the real shard file.
pub fn save_records<T: StoreRecord>(path: impl AsRef<Path>, records: &[T]) -> StoreResult<u64> {
    use std::io::BufWriter;

    let path = path.as_ref();
    let temp_store_path = path.with_extension("tmp");

    let temp_shard_file = match std::fs::File::create(&temp_store_path) {
        Ok(f) => Ok(f),
        Err(e) => Err(ShardIo {
            src: e,
            path: path.to_path_buf(),
        }),
    }?;

    let mut shard_buf = BufWriter::new(temp_shard_file);

    match BACKEND {
        SerializationBackend::Bincode => {
            if let Err(e) = bincode::serialize_into(&mut shard_buf, &records) {
                return Err(Serialization {
                    src: format!("{e}"),
                    path: path.to_path_buf(),
                });
            }
        }
        SerializationBackend::Json => {
            let json_string = match serde_json::to_string(&records) {
                Ok(s) => s,
                Err(e) => {
                    return Err(Serialization {
                        src: format!("{e}"),
                        path: path.to_path_buf(),
                    })
                }
            };

            if let Err(e) = shard_buf.write_all(json_string.as_bytes()) {
                return Err(Serialization {
                    src: format!("{e}"),
                    path: path.to_path_buf(),
                });
            }
        }
    }

    let temp_shard_file = match shard_buf.into_inner() {
        Err(e) => {
            return Err(ShardIo {
                src: e.into_error(),
                path: path.to_path_buf(),
            })
        }
        Ok(f) => f,
    };

    if let Err(e) = temp_shard_file.sync_all() {
        return Err(ShardIo {
            src: e,
            path: path.to_path_buf(),
        });
    }

    if let Err(e) = std::fs::rename(&temp_store_path, path) {
        return Err(ShardIo {
            src: e,
            path: path.to_path_buf(),
        });
    }

    on_disk_size(path)
}

/// The true size of a shard file as reported by the filesystem. Metatable
/// entries must always be updated from this, never from counted bytes.
pub fn on_disk_size(path: impl AsRef<Path>) -> StoreResult<u64> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| ShardIo {
            src: e,
            path: path.to_path_buf(),
        })
}

/// Delete a shard file. Failures are reported to the caller, which normally
/// logs and continues (orphaned shards are recoverable; a wrong metatable is
/// not).
pub fn delete_shard(path: impl AsRef<Path>) -> StoreResult<()> {
    let path = path.as_ref();
    std::fs::remove_file(path).map_err(|e| ShardIo {
        src: e,
        path: path.to_path_buf(),
    })
}

/// Shard file names are generated, not user-supplied: the lowest unused
/// index wins.
pub fn next_shard_name(db_dir: &Path, taken: &[String]) -> String {
    let mut idx = taken.len();
    loop {
        let candidate = format!("fingerprints_{idx:05}.shard");
        if !taken.contains(&candidate) && !db_dir.join(&candidate).exists() {
            return candidate;
        }
        idx += 1;
    }
}

#[allow(dead_code)]
pub fn shard_path(db_dir: &Path, file_name: &str) -> PathBuf {
    db_dir.join(file_name)
}
