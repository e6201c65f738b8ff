use log::{info, warn};

use super::{
    meta_table::{MetaTable, MetaTableEntry},
    shard,
    shard::StoreRecord,
    store_error_kind::StoreResult,
};

use super::fingerprint_store::StoreCfg;

/// What a coalescing run did.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct CoalesceStats {
    pub groups_merged: usize,
    pub shards_removed: usize,
    pub records_moved: usize,
}

/// Offline compaction: merge undersized shards into fewer, larger ones and
/// rewrite the metatable.
///
/// Shards under the size limit are partitioned into groups by greedy
/// bin-packing (a group closes when adding the next shard would reach the
/// limit). Each group's records are concatenated into one new shard; the
/// group's metatable entries are replaced by a single entry carrying the new
/// shard's true on-disk size.
///
/// Crash-safety ordering: the new metatable is saved durably BEFORE any old
/// shard file is deleted. A crash mid-coalesce therefore leaves orphaned
/// (but recoverable) shard files, never a metatable pointing at deleted
/// ones. Deletion failures are logged and ignored for the same reason.
pub fn coalesce<T: StoreRecord>(cfg: &StoreCfg) -> StoreResult<CoalesceStats> {
    let mut metatable = MetaTable::load(&cfg.metatable_path)?;

    let undersized = metatable
        .entries()
        .iter()
        .filter(|e| e.file_size < cfg.max_shard_size)
        .cloned()
        .collect::<Vec<_>>();

    let groups = pack_into_groups(&undersized, cfg.max_shard_size);

    let mut stats = CoalesceStats::default();

    for group in &groups {
        //a group of one shard gains nothing from rewriting
        if group.len() < 2 {
            continue;
        }

        let mut merged_records: Vec<T> = vec![];
        for entry in group {
            let mut records = shard::load_records(cfg.db_dir.join(&entry.file_name))?;
            merged_records.append(&mut records);
        }

        let new_name = shard::next_shard_name(&cfg.db_dir, &metatable.shard_names());
        let new_path = cfg.db_dir.join(&new_name);
        let file_size = shard::save_records(&new_path, &merged_records)?;

        info!(
            target: "coalesce",
            "merged {} shards ({} records) into {new_name}",
            group.len(),
            merged_records.len()
        );

        let old_names = group.iter().map(|e| e.file_name.clone()).collect::<Vec<_>>();
        metatable.remove_entries(&old_names);
        metatable.push_entry(MetaTableEntry {
            file_name: new_name,
            file_size,
        });

        //make the replacement durable before touching the old shard files
        metatable.save(&cfg.metatable_path)?;

        for old_name in &old_names {
            match shard::delete_shard(cfg.db_dir.join(old_name)) {
                Ok(()) => stats.shards_removed += 1,
                Err(e) => {
                    warn!(target: "coalesce", "failed to delete merged shard {old_name}: {e}");
                }
            }
        }

        stats.groups_merged += 1;
        stats.records_moved += merged_records.len();
    }

    Ok(stats)
}

//greedy bin-packing in metatable order: accumulate entries into the open
//group until adding the next one would reach the limit
fn pack_into_groups(entries: &[MetaTableEntry], max_shard_size: u64) -> Vec<Vec<MetaTableEntry>> {
    let mut groups: Vec<Vec<MetaTableEntry>> = vec![];
    let mut open_group: Vec<MetaTableEntry> = vec![];
    let mut open_size: u64 = 0;

    for entry in entries {
        if !open_group.is_empty() && open_size + entry.file_size >= max_shard_size {
            groups.push(std::mem::take(&mut open_group));
            open_size = 0;
        }

        open_size += entry.file_size;
        open_group.push(entry.clone());
    }

    if !open_group.is_empty() {
        groups.push(open_group);
    }

    groups
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(name: &str, size: u64) -> MetaTableEntry {
        MetaTableEntry {
            file_name: name.to_string(),
            file_size: size,
        }
    }

    #[test]
    fn test_packing_closes_group_at_limit() {
        let entries = vec![
            entry("a", 400),
            entry("b", 400),
            entry("c", 300),
            entry("d", 100),
        ];

        let groups = pack_into_groups(&entries, 1000);

        //a+b = 800; adding c would reach 1100 >= 1000, so the group closes
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 2);

        for group in &groups {
            let total: u64 = group.iter().map(|e| e.file_size).sum();
            assert!(total < 1000);
        }
    }

    #[test]
    fn test_packing_empty_input() {
        assert!(pack_into_groups(&[], 1000).is_empty());
    }

    #[test]
    fn test_oversize_entry_gets_its_own_group() {
        //an entry alone reaching the limit cannot merge with anything
        let entries = vec![entry("a", 100), entry("b", 999), entry("c", 100)];
        let groups = pack_into_groups(&entries, 1000);
        assert_eq!(groups.len(), 3);
    }
}
