use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const PER_COLLECTION_CAPACITY: usize = 4096;

/// Best-effort, in-process write deduplication (spec.md §4.5): a second
/// `store` call with the same content hash for the same collection is
/// dropped rather than written again. Bounded and per-process -- it is not
/// coherent across restarts or multiple `api` instances, by design (spec.md
/// §9 notes this is an optimization, not a correctness guarantee).
pub struct DedupCache {
    per_collection: Mutex<HashMap<i64, LruCache<String, ()>>>,
}

impl DedupCache {
    pub fn new() -> Self {
        DedupCache {
            per_collection: Mutex::new(HashMap::new()),
        }
    }

    pub fn hash(bytes: &[u8]) -> String {
        use md5::{Digest, Md5};
        let digest = Md5::digest(bytes);
        hex::encode(digest)
    }

    /// Returns true if `hash` was already seen for `collection_id` -- the
    /// caller should skip the write. Records the hash as seen either way.
    pub fn seen_before(&self, collection_id: i64, hash: &str) -> bool {
        let mut guard = self.per_collection.lock().unwrap();
        let cache = guard
            .entry(collection_id)
            .or_insert_with(|| LruCache::new(NonZeroUsize::new(PER_COLLECTION_CAPACITY).unwrap()));

        if cache.contains(hash) {
            true
        } else {
            cache.put(hash.to_string(), ());
            false
        }
    }

    pub fn forget_collection(&self, collection_id: i64) {
        self.per_collection.lock().unwrap().remove(&collection_id);
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}
