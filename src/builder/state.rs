//! Per-thread and per-region bookkeeping for one build run.

use crate::contour::{ContourId, Oid};
use std::collections::{BTreeSet, HashMap};

/// Logical state of one traced thread
#[derive(Debug, Default, Clone)]
pub struct ThreadState {
    /// Live method contours, innermost last
    pub call_stack: Vec<ContourId>,
    /// Region new allocations are attributed to
    pub current_region: Option<String>,
    /// Region nesting pushed/popped by explicit scope events; created lazily
    pub region_stack: Option<Vec<String>>,
}

impl ThreadState {
    /// Position of `region` in the nesting stack, bottom first
    ///
    /// `None` both when the region is not on the stack and when the thread
    /// never pushed a region.
    pub fn region_index(&self, region: &str) -> Option<usize> {
        self.region_stack.as_ref()?.iter().position(|r| r == region)
    }
}

/// Live-object sets per region plus the region each raw object lives in
#[derive(Debug, Default)]
pub struct RegionTable {
    live: HashMap<String, BTreeSet<ContourId>>,
    object_regions: HashMap<Oid, String>,
}

impl RegionTable {
    /// Start a fresh, empty live set for `region`, dropping any stale one
    pub fn allocate(&mut self, region: &str) {
        self.live.insert(region.to_string(), BTreeSet::new());
    }

    /// Attribute a newly allocated object to `region`
    pub fn record(&mut self, raw_oid: Oid, region: &str, contour: ContourId) {
        self.object_regions.insert(raw_oid, region.to_string());
        self.live.entry(region.to_string()).or_default().insert(contour);
    }

    pub fn region_of(&self, raw_oid: Oid) -> Option<&str> {
        self.object_regions.get(&raw_oid).map(String::as_str)
    }

    pub fn live_in(&self, region: &str) -> Option<&BTreeSet<ContourId>> {
        self.live.get(region)
    }

    /// Remove the region, returning every object that was live in it
    pub fn free(&mut self, region: &str) -> BTreeSet<ContourId> {
        self.object_regions.retain(|_, r| r != region);
        self.live.remove(region).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_index_conflates_missing_cases() {
        let mut state = ThreadState::default();
        assert_eq!(state.region_index("r1"), None);

        state.region_stack = Some(vec!["heap".to_string(), "r1".to_string()]);
        assert_eq!(state.region_index("r1"), Some(1));
        assert_eq!(state.region_index("r2"), None);
    }

    #[test]
    fn test_free_returns_only_region_objects() {
        let mut regions = RegionTable::default();
        regions.allocate("r1");
        regions.record(0x10, "r1", ContourId(1));
        regions.record(0x20, "r1", ContourId(3));
        regions.record(0x30, "r2", ContourId(5));

        let freed = regions.free("r1");
        assert_eq!(freed.into_iter().collect::<Vec<_>>(), vec![ContourId(1), ContourId(3)]);
        assert_eq!(regions.region_of(0x10), None);
        assert_eq!(regions.region_of(0x30), Some("r2"));
        assert!(regions.live_in("r1").is_none());
    }
}
