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

use crate::storage::{DiskMetadata, DiskSweeper};
use croaring::Bitmap;
use log::{info, warn};
use spillway_common::common::{ByteUnit, FileUtils};
use spillway_common::conf::DiskConf;
use spillway_common::executor::ScheduledExecutor;
use spillway_common::state::{PartitionRange, ShuffleKey};
use spillway_common::sync::AtomicBool;
use spillway_common::{CommonResult, SpillResult};
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// One local shuffle disk: the filesystem tree under base_path plus the
/// in-memory bookkeeping the uploader queries and reconciles.
///
/// On-disk layout owned by this store:
///   <base_path>/<app_id>/<shuffle_id>/<p>-<p>/<server_id>.data
///   <base_path>/<app_id>/<shuffle_id>/<p>-<p>/<server_id>.index
pub struct DiskItem {
    conf: DiskConf,
    metadata: DiskMetadata,

    // Watermark hysteresis state of write admission.
    writable: AtomicBool,

    terminated: Arc<AtomicBool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl DiskItem {
    pub fn new(mut conf: DiskConf) -> SpillResult<Self> {
        conf.init()?;
        conf.validate()?;
        FileUtils::create_dir(&conf.base_path, true)?;

        Ok(Self {
            conf,
            metadata: DiskMetadata::new(),
            writable: AtomicBool::new(true),
            terminated: Arc::new(AtomicBool::new(false)),
            sweeper: Mutex::new(None),
        })
    }

    pub fn base_path(&self) -> &str {
        &self.conf.base_path
    }

    pub fn capacity(&self) -> i64 {
        self.conf.capacity
    }

    pub fn high_watermark_of_write(&self) -> f64 {
        self.conf.high_watermark_of_write
    }

    pub fn low_watermark_of_write(&self) -> f64 {
        self.conf.low_watermark_of_write
    }

    pub fn shuffle_expired_timeout_ms(&self) -> u64 {
        self.conf.shuffle_expired_timeout_ms
    }

    pub fn disk_size(&self) -> i64 {
        self.metadata.disk_size()
    }

    pub fn update_disk_size(&self, delta: i64) {
        self.metadata.update_disk_size(delta)
    }

    pub fn exceed_high_watermark(&self) -> bool {
        let used = self.disk_size() as f64 * 100.0;
        used >= self.conf.capacity as f64 * self.conf.high_watermark_of_write
    }

    // Write admission with hysteresis: refused above the high watermark,
    // accepted again only after usage drops below the low watermark.
    pub fn can_write(&self) -> bool {
        let used = self.disk_size() as f64 * 100.0;
        let capacity = self.conf.capacity as f64;

        if self.writable.get() {
            if used >= capacity * self.conf.high_watermark_of_write {
                warn!(
                    "Disk {} crossed high watermark, used {}, stop write",
                    self.conf.base_path,
                    ByteUnit::byte_to_string(self.disk_size() as u64)
                );
                self.writable.set(false);
            }
        } else if used < capacity * self.conf.low_watermark_of_write {
            info!(
                "Disk {} dropped below low watermark, resume write",
                self.conf.base_path
            );
            self.writable.set(true);
        }

        self.writable.get()
    }

    // Writer ingress.
    pub fn create_metadata_if_not_exist(&self, key: &ShuffleKey) {
        self.metadata.create_if_not_exist(key)
    }

    pub fn update_write(&self, key: &ShuffleKey, size: i64, partitions: &[u32]) {
        self.metadata.update_write(key, size, partitions)
    }

    // Read path hooks.
    pub fn prepare_start_read(&self, key: &ShuffleKey) {
        self.metadata.prepare_start_read(key)
    }

    pub fn update_shuffle_last_read_ts(&self, key: &ShuffleKey) {
        self.metadata.update_last_read_ts(key)
    }

    pub fn is_reading(&self, key: &ShuffleKey) -> bool {
        self.metadata.is_reading(key)
    }

    // Uploader surface.
    pub fn sorted_shuffle_keys(&self, prioritize_oldest: bool, limit: usize) -> Vec<ShuffleKey> {
        self.metadata.sorted_shuffle_keys(prioritize_oldest, limit)
    }

    pub fn not_uploaded_size(&self, key: &ShuffleKey) -> i64 {
        self.metadata.not_uploaded_size(key)
    }

    pub fn not_uploaded_partitions(&self, key: &ShuffleKey) -> Bitmap {
        self.metadata.not_uploaded_partitions(key)
    }

    pub fn update_uploaded_state(&self, key: &ShuffleKey, partitions: &[u32], bytes: i64) {
        self.metadata.update_uploaded_state(key, partitions, bytes)
    }

    pub fn shuffle_keys(&self) -> Vec<ShuffleKey> {
        self.metadata.shuffle_keys()
    }

    pub fn shuffle_dir(&self, key: &ShuffleKey) -> PathBuf {
        PathBuf::from(&self.conf.base_path)
            .join(&key.app_id)
            .join(key.shuffle_id.to_string())
    }

    pub fn partition_dir(&self, key: &ShuffleKey, partition: u32) -> PathBuf {
        self.shuffle_dir(key)
            .join(PartitionRange::single(partition).dir_name())
    }

    pub(crate) fn expire_reading(&self, key: &ShuffleKey) -> bool {
        let expired = self
            .metadata
            .expire_reading(key, self.conf.shuffle_expired_timeout_ms);
        if expired {
            info!("Shuffle {} read expired on disk {}", key, self.conf.base_path);
        }
        expired
    }

    // Drop a fully-uploaded, non-reading key together with its local files.
    pub(crate) fn purge_if_drained(&self, key: &ShuffleKey) -> SpillResult<bool> {
        if !self.metadata.remove_drained(key) {
            return Ok(false);
        }

        let dir = self.shuffle_dir(key);
        let freed = FileUtils::dir_size(&dir)? as i64;
        FileUtils::delete_path(&dir, true)?;
        if freed > 0 {
            self.metadata.update_disk_size(-freed);
        }

        // The app directory may be empty now, reclaim it as well.
        if let Some(app_dir) = dir.parent() {
            let _ = std::fs::remove_dir(app_dir);
        }

        info!(
            "Purge drained shuffle {}, freed {} on disk {}",
            key,
            ByteUnit::byte_to_string(freed as u64),
            self.conf.base_path
        );
        Ok(true)
    }

    pub fn start(self: &Arc<Self>) -> CommonResult<()> {
        let mut lock = self.sweeper.lock().unwrap();
        if lock.is_some() {
            return Ok(());
        }

        self.terminated.set(false);
        let task = DiskSweeper::new(self.clone(), self.terminated.clone());
        let name = format!("disk-sweeper-{}", self.conf.base_path.replace('/', "-"));
        let handle = ScheduledExecutor::new(name, self.conf.sweep_interval_ms).start(task)?;
        *lock = Some(handle);

        info!("Disk {} sweeper started", self.conf.base_path);
        Ok(())
    }

    pub fn stop(&self) {
        self.terminated.set(true);
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Debug for DiskItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskItem")
            .field("base_path", &self.conf.base_path)
            .field(
                "capacity",
                &ByteUnit::byte_to_string(self.conf.capacity as u64),
            )
            .field(
                "disk_size",
                &ByteUnit::byte_to_string(self.disk_size() as u64),
            )
            .field("shuffles", &self.metadata.shuffle_count())
            .finish()
    }
}
