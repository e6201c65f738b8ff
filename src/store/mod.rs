mod coalescer;
mod fingerprint_store;
mod meta_table;
pub mod shard;
mod store_error_kind;

pub use coalescer::{coalesce, CoalesceStats};
pub use fingerprint_store::{FingerPrintStore, StoreCfg, Submitter};
pub use meta_table::{MetaTable, MetaTableEntry};
pub use shard::StoreRecord;
pub use store_error_kind::{StoreErrorKind, StoreResult};
