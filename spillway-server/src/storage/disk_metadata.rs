// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use croaring::Bitmap;
use log::warn;
use spillway_common::common::LocalTime;
use spillway_common::state::ShuffleKey;
use spillway_common::sync::{AtomicLong, FastDashMap};

// Per-shuffle bookkeeping. All fields of one key are mutated under the map's
// shard lock, which serializes updates per key.
#[derive(Debug)]
pub struct ShuffleMeta {
    pub not_uploaded_size: i64,
    pub not_uploaded_partitions: Bitmap,
    pub last_read_ts: u64,
    pub reading: bool,
}

impl ShuffleMeta {
    fn new() -> Self {
        Self {
            not_uploaded_size: 0,
            not_uploaded_partitions: Bitmap::new(),
            last_read_ts: 0,
            reading: false,
        }
    }

    pub fn is_drained(&self) -> bool {
        self.not_uploaded_size <= 0 && self.not_uploaded_partitions.is_empty()
    }
}

/// In-memory state of one shuffle disk: which keys are resident, how many
/// bytes of each are still local-only, and which partitions those bytes cover.
///
/// The uploader is the only writer of the uploaded-state transitions; write
/// ingress and the read path own the remaining mutations. Uploaded-state
/// updates are a set subtraction, so applying a stale result twice is a no-op.
pub struct DiskMetadata {
    shuffles: FastDashMap<ShuffleKey, ShuffleMeta>,
    disk_size: AtomicLong,
}

impl DiskMetadata {
    pub fn new() -> Self {
        Self {
            shuffles: FastDashMap::with_capacity(64),
            disk_size: AtomicLong::new(0),
        }
    }

    pub fn create_if_not_exist(&self, key: &ShuffleKey) {
        self.shuffles
            .entry(key.clone())
            .or_insert_with(ShuffleMeta::new);
    }

    pub fn update_write(&self, key: &ShuffleKey, size: i64, partitions: &[u32]) {
        let mut meta = self
            .shuffles
            .entry(key.clone())
            .or_insert_with(ShuffleMeta::new);
        meta.not_uploaded_size += size;
        for p in partitions {
            meta.not_uploaded_partitions.add(*p);
        }
        drop(meta);

        self.disk_size.add_and_get(size);
    }

    pub fn not_uploaded_size(&self, key: &ShuffleKey) -> i64 {
        self.shuffles
            .get(key)
            .map(|m| m.not_uploaded_size)
            .unwrap_or(0)
    }

    pub fn not_uploaded_partitions(&self, key: &ShuffleKey) -> Bitmap {
        self.shuffles
            .get(key)
            .map(|m| m.not_uploaded_partitions.clone())
            .unwrap_or_else(Bitmap::new)
    }

    // Subtract confirmed-uploaded bytes and clear the confirmed partition bits.
    // The size never goes below zero; clearing an already-clear bit is a no-op,
    // which makes late results from abandoned upload tasks safe to apply.
    pub fn update_uploaded_state(&self, key: &ShuffleKey, partitions: &[u32], bytes: i64) {
        let mut meta = match self.shuffles.get_mut(key) {
            Some(m) => m,
            None => {
                warn!("Update uploaded state for unknown shuffle {}", key);
                return;
            }
        };

        let new_size = meta.not_uploaded_size - bytes;
        if new_size < 0 {
            warn!(
                "Uploaded bytes {} exceed not uploaded size {} of shuffle {}, reset to 0",
                bytes, meta.not_uploaded_size, key
            );
        }
        meta.not_uploaded_size = new_size.max(0);

        for p in partitions {
            meta.not_uploaded_partitions.remove(*p);
        }
    }

    pub fn prepare_start_read(&self, key: &ShuffleKey) {
        let mut meta = self
            .shuffles
            .entry(key.clone())
            .or_insert_with(ShuffleMeta::new);
        meta.reading = true;
        meta.last_read_ts = LocalTime::mills();
    }

    pub fn update_last_read_ts(&self, key: &ShuffleKey) {
        if let Some(mut meta) = self.shuffles.get_mut(key) {
            meta.last_read_ts = LocalTime::mills();
        }
    }

    pub fn is_reading(&self, key: &ShuffleKey) -> bool {
        self.shuffles.get(key).map(|m| m.reading).unwrap_or(false)
    }

    // Clear the reading flag once the key went cold. Returns true if cleared.
    pub fn expire_reading(&self, key: &ShuffleKey, timeout_ms: u64) -> bool {
        let mut meta = match self.shuffles.get_mut(key) {
            Some(m) => m,
            None => return false,
        };

        if meta.reading && LocalTime::mills().saturating_sub(meta.last_read_ts) > timeout_ms {
            meta.reading = false;
            return true;
        }
        false
    }

    // Atomically drop a fully-uploaded, non-reading key. Returns true when the
    // key was removed and its on-disk directory may be reclaimed.
    pub fn remove_drained(&self, key: &ShuffleKey) -> bool {
        self.shuffles
            .remove_if(key, |_, meta| !meta.reading && meta.is_drained())
            .is_some()
    }

    /// Keys ordered for selection. With prioritize_oldest the coldest keys come
    /// first (they are the least likely to be read and thus safe to delete),
    /// otherwise the biggest not-uploaded sizes come first. Ties fall back to
    /// the lexicographic "<app>/<shuffle>" form. The result may still contain
    /// keys that drained concurrently; callers must re-check.
    pub fn sorted_shuffle_keys(&self, prioritize_oldest: bool, limit: usize) -> Vec<ShuffleKey> {
        let mut snapshot: Vec<(ShuffleKey, i64, u64)> = self
            .shuffles
            .iter()
            .map(|e| (e.key().clone(), e.not_uploaded_size, e.last_read_ts))
            .collect();

        if prioritize_oldest {
            snapshot.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.path().cmp(&b.0.path())));
        } else {
            snapshot.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.path().cmp(&b.0.path())));
        }

        snapshot.truncate(limit);
        snapshot.into_iter().map(|x| x.0).collect()
    }

    pub fn shuffle_keys(&self) -> Vec<ShuffleKey> {
        self.shuffles.iter().map(|e| e.key().clone()).collect()
    }

    pub fn shuffle_count(&self) -> usize {
        self.shuffles.len()
    }

    pub fn disk_size(&self) -> i64 {
        self.disk_size.get()
    }

    pub fn update_disk_size(&self, delta: i64) {
        if delta >= 0 {
            self.disk_size.add_and_get(delta);
            return;
        }

        loop {
            let old_size = self.disk_size.get();
            let mut new_size = old_size + delta;
            if new_size < 0 {
                warn!("disk size becomes negative {}, reset to 0", new_size);
                new_size = 0;
            }

            if self.disk_size.compare_and_set(old_size, new_size) {
                break;
            }
        }
    }
}

impl Default for DiskMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::DiskMetadata;
    use spillway_common::state::ShuffleKey;

    #[test]
    fn uploaded_state() {
        let meta = DiskMetadata::new();
        let key = ShuffleKey::new("app-1", 1);

        meta.create_if_not_exist(&key);
        meta.update_write(&key, 70, &[1, 2, 3]);
        assert_eq!(meta.not_uploaded_size(&key), 70);
        assert_eq!(meta.disk_size(), 70);

        meta.update_uploaded_state(&key, &[1, 2], 50);
        assert_eq!(meta.not_uploaded_size(&key), 20);
        let bitmap = meta.not_uploaded_partitions(&key);
        assert_eq!(bitmap.cardinality(), 1);
        assert!(bitmap.contains(3));

        // Applying the same result again must not regress state.
        meta.update_uploaded_state(&key, &[1, 2], 50);
        assert_eq!(meta.not_uploaded_size(&key), 0);
        assert_eq!(meta.not_uploaded_partitions(&key).cardinality(), 1);

        // Over-reported bytes clamp at zero.
        meta.update_uploaded_state(&key, &[3], 1000);
        assert_eq!(meta.not_uploaded_size(&key), 0);
        assert!(meta.not_uploaded_partitions(&key).is_empty());
    }

    #[test]
    fn sorted_keys() {
        let meta = DiskMetadata::new();
        let k1 = ShuffleKey::new("app-1", 1);
        let k2 = ShuffleKey::new("app-2", 1);
        let k3 = ShuffleKey::new("app-3", 1);

        meta.update_write(&k1, 10, &[1]);
        meta.update_write(&k2, 30, &[1]);
        meta.update_write(&k3, 20, &[1]);

        let by_size = meta.sorted_shuffle_keys(false, 10);
        assert_eq!(by_size, vec![k2.clone(), k3.clone(), k1.clone()]);

        meta.update_last_read_ts(&k2);
        std::thread::sleep(std::time::Duration::from_millis(5));
        meta.update_last_read_ts(&k1);

        // k3 was never read, it is the coldest.
        let by_age = meta.sorted_shuffle_keys(true, 2);
        assert_eq!(by_age, vec![k3.clone(), k2.clone()]);
    }

    #[test]
    fn remove_drained() {
        let meta = DiskMetadata::new();
        let key = ShuffleKey::new("app-1", 1);

        meta.update_write(&key, 10, &[1]);
        assert!(!meta.remove_drained(&key));

        meta.update_uploaded_state(&key, &[1], 10);
        meta.prepare_start_read(&key);
        assert!(!meta.remove_drained(&key));

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(meta.expire_reading(&key, 1));
        assert!(meta.remove_drained(&key));
        assert_eq!(meta.shuffle_count(), 0);
    }
}
