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

use crate::storage::{DiskItem, ShuffleFileInfo};
use crate::uploader::{ShuffleUploadResult, UploadHandler, UploadHandlerFactory, UPLOADER_METRICS};
use log::{debug, info, warn};
use spillway_common::common::{ByteUnit, FileUtils, TimeSpent};
use spillway_common::conf::UploaderConf;
use spillway_common::executor::{GroupExecutor, LoopTask, ScheduledExecutor};
use spillway_common::sync::AtomicBool;
use spillway_common::{err_box, CommonResult, SpillResult};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// Floor of the tick deadline, protects tiny batches from pathologically short
// waits.
const UPLOAD_TIME_MIN_S: u64 = 2;

// Pending tasks allowed per worker before dispatch blocks.
const UPLOAD_QUEUE_SIZE: usize = 16;

// Byte counters of the dispatch pipeline. They are read together by the
// deadline computation, so they live behind one lock instead of independent
// atomics.
#[derive(Debug, Default)]
struct UploadAccounting {
    in_flight_bytes: i64,
}

impl UploadAccounting {
    fn dispatch(&mut self, bytes: i64) {
        self.in_flight_bytes += bytes;
        UPLOADER_METRICS.in_flight_bytes.set(self.in_flight_bytes as f64);
    }

    fn finish(&mut self, bytes: i64) {
        self.in_flight_bytes = (self.in_flight_bytes - bytes).max(0);
        UPLOADER_METRICS.in_flight_bytes.set(self.in_flight_bytes as f64);
    }
}

/// Drains finalized shuffle partition files of one disk to the remote tier.
///
/// Every tick selects candidate shuffle keys, groups their file pairs into
/// batches, dispatches the batches to a fixed worker pool and waits up to a
/// bandwidth-derived deadline. Results observed within the deadline are
/// reconciled back into the DiskItem; local files whose partitions became
/// durable remotely are deleted unless the key is currently being read.
pub struct ShuffleUploader {
    conf: UploaderConf,
    disk_item: Arc<DiskItem>,
    executor: GroupExecutor,
    handler: Mutex<Option<Arc<dyn UploadHandler>>>,
    accounting: Arc<Mutex<UploadAccounting>>,

    terminated: Arc<AtomicBool>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl ShuffleUploader {
    pub fn new(mut conf: UploaderConf, disk_item: Arc<DiskItem>) -> SpillResult<Self> {
        conf.init()?;
        conf.validate()?;

        let executor = GroupExecutor::new(
            format!("shuffle-upload-{}", conf.server_id),
            conf.upload_thread_num,
            UPLOAD_QUEUE_SIZE,
        );

        Ok(Self {
            conf,
            disk_item,
            executor,
            handler: Mutex::new(None),
            accounting: Arc::new(Mutex::new(UploadAccounting::default())),
            terminated: Arc::new(AtomicBool::new(false)),
            scheduler: Mutex::new(None),
        })
    }

    // Construction with an injected remote sink, the factory is bypassed.
    pub fn with_handler(
        conf: UploaderConf,
        disk_item: Arc<DiskItem>,
        handler: Arc<dyn UploadHandler>,
    ) -> SpillResult<Self> {
        let uploader = Self::new(conf, disk_item)?;
        *uploader.handler.lock().unwrap() = Some(handler);
        Ok(uploader)
    }

    pub fn conf(&self) -> &UploaderConf {
        &self.conf
    }

    // The handler is created lazily so that constructing an uploader never
    // performs remote I/O.
    fn get_handler(&self) -> SpillResult<Arc<dyn UploadHandler>> {
        let mut lock = self.handler.lock().unwrap();
        if let Some(handler) = &*lock {
            return Ok(handler.clone());
        }

        let handler = UploadHandlerFactory::create(&self.conf)?;
        *lock = Some(handler.clone());
        Ok(handler)
    }

    /// Pick the file pairs to upload this tick.
    ///
    /// Keys come from the disk ordered coldest-first under forced mode and
    /// biggest-first otherwise. Within a key, partitions are scanned in
    /// ascending id order; a pair joins the current batch only when both its
    /// data and index file exist and are non-empty. A batch is closed as soon
    /// as its size exceeds max_shuffle_size, so an oversized single file forms
    /// a batch of its own. Forced mode stops after upload_thread_num batches;
    /// whatever was not selected is reconsidered next tick.
    pub fn select_shuffle_files(&self, max_num: usize, forced: bool) -> Vec<ShuffleFileInfo> {
        let batch_cap = self.conf.upload_thread_num;
        let keys = self.disk_item.sorted_shuffle_keys(forced, max_num);

        let mut infos: Vec<ShuffleFileInfo> = vec![];
        for key in keys {
            if forced && infos.len() >= batch_cap {
                debug!("Forced upload limits this tick to {} batches", batch_cap);
                break;
            }

            let size = self.disk_item.not_uploaded_size(&key);
            let partitions = self.disk_item.not_uploaded_partitions(&key);
            // The sorted store may expose keys that drained concurrently.
            if size <= 0 || partitions.is_empty() {
                continue;
            }

            let mut info = ShuffleFileInfo::new(key.clone());
            for partition in partitions.iter() {
                let dir = self.disk_item.partition_dir(&key, partition);
                let data = dir.join(self.conf.local_data_file());
                let index = dir.join(self.conf.local_index_file());

                let data_len = FileUtils::file_size(&data) as i64;
                if data_len == 0 || FileUtils::file_size(&index) == 0 {
                    // One of the pair may still be flushing, retry next tick.
                    debug!("Skip partition {} of {}, incomplete file pair", partition, key);
                    continue;
                }

                info.add_partition(partition, data, index, data_len);
                if info.size() > self.conf.max_shuffle_size {
                    let full = std::mem::replace(&mut info, ShuffleFileInfo::new(key.clone()));
                    infos.push(full);
                    if forced && infos.len() >= batch_cap {
                        break;
                    }
                }
            }

            if !info.is_empty() && !(forced && infos.len() >= batch_cap) {
                infos.push(info);
            }
        }

        infos
    }

    /// Seconds one tick may wait for its dispatched batches.
    ///
    /// In-flight bytes from earlier ticks count at half weight since they are
    /// on average half transferred already. Non-forced ticks wait at least
    /// UPLOAD_TIME_MIN_S; forced ticks are clamped into
    /// [1, max_force_upload_expire_s] so a disk above its high watermark always
    /// finishes (or abandons) within bounded time.
    pub fn calculate_upload_time(&self, in_flight_bytes: i64, new_bytes: i64, forced: bool) -> u64 {
        let weighted = in_flight_bytes.max(0) + 2 * new_bytes.max(0);
        let denom = self.conf.reference_upload_speed_mbs as i64
            * self.conf.upload_thread_num as i64
            * ByteUnit::MB as i64;

        let secs = ((weighted + denom - 1) / denom).max(0) as u64;
        let secs = secs.max(UPLOAD_TIME_MIN_S);

        if forced {
            secs.clamp(1, self.conf.max_force_upload_expire_s)
        } else {
            secs
        }
    }

    /// One upload tick. Never leaves partial state behind: every batch result
    /// observed within the deadline is reconciled, everything else stays
    /// resident and is reselected later.
    pub fn upload(&self) -> SpillResult<()> {
        let forced = self.disk_item.exceed_high_watermark();
        let infos = self.select_shuffle_files(self.conf.upload_thread_num, forced);
        if infos.is_empty() {
            return Ok(());
        }

        let handler = self.get_handler()?;
        if forced {
            UPLOADER_METRICS.forced_ticks.inc();
        }

        let new_bytes: i64 = infos.iter().map(|x| x.size()).sum();
        let in_flight = {
            let mut lock = self.accounting.lock().unwrap();
            let before = lock.in_flight_bytes;
            lock.dispatch(new_bytes);
            before
        };
        let wait_s = self.calculate_upload_time(in_flight, new_bytes, forced);

        let spent = TimeSpent::new();
        let (tx, rx) = mpsc::channel();
        let mut dispatched = 0;

        for info in infos {
            let handler = handler.clone();
            let tx = tx.clone();
            let accounting = self.accounting.clone();
            let size = info.size();

            let spawned = self.executor.spawn(move || {
                let result = handler.upload(&info);
                accounting.lock().unwrap().finish(size);
                let _ = tx.send((info, result));
            });

            match spawned {
                Ok(_) => dispatched += 1,
                Err(e) => {
                    warn!("Submit upload batch of {} bytes fail: {}", size, e);
                    self.accounting.lock().unwrap().finish(size);
                }
            }
        }
        drop(tx);

        let deadline = Instant::now() + Duration::from_secs(wait_s);
        let mut observed = 0;
        while observed < dispatched {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            match rx.recv_timeout(deadline - now) {
                Ok((info, Ok(result))) => {
                    observed += 1;
                    self.finalize_batch(&info, result);
                }
                Ok((info, Err(e))) => {
                    observed += 1;
                    UPLOADER_METRICS.failed_batches.inc();
                    warn!("Upload batch for {} fail: {}", info.key(), e);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if observed < dispatched {
            // Soft deadline: the workers keep running, only this tick stops
            // listening. Their keys are reselected once they settle.
            UPLOADER_METRICS
                .abandoned_batches
                .inc_by((dispatched - observed) as f64);
            warn!(
                "Upload deadline {}s elapsed, abandon {}/{} batches, forced: {}",
                wait_s,
                dispatched - observed,
                dispatched,
                forced
            );
        }

        info!(
            "Upload tick done, batches: {}, selected: {}, forced: {}, cost {} ms",
            dispatched,
            ByteUnit::byte_to_string(new_bytes as u64),
            forced,
            spent.used_ms()
        );
        Ok(())
    }

    // Apply one observed batch result: shrink the key's bookkeeping by exactly
    // what the handler confirmed, then delete the local pairs of the confirmed
    // partitions unless the key is being read.
    fn finalize_batch(&self, info: &ShuffleFileInfo, result: ShuffleUploadResult) {
        let key = info.key();

        let uploaded: Vec<u32> = result
            .partition_ids
            .iter()
            .copied()
            .filter(|p| info.partitions().contains(p))
            .collect();
        if uploaded.len() != result.partition_ids.len() {
            warn!("Handler reported partitions outside the batch for {}", key);
        }
        if uploaded.is_empty() {
            return;
        }

        self.disk_item
            .update_uploaded_state(key, &uploaded, result.uploaded_bytes);

        UPLOADER_METRICS
            .uploaded_bytes
            .inc_by(result.uploaded_bytes.max(0) as f64);
        UPLOADER_METRICS.uploaded_partitions.inc_by(uploaded.len() as f64);

        if self.disk_item.is_reading(key) {
            info!("Shuffle {} is being read, keep local files", key);
            return;
        }

        self.delete_uploaded_files(info, &uploaded);
    }

    fn delete_uploaded_files(&self, info: &ShuffleFileInfo, uploaded: &[u32]) {
        let mut freed = 0i64;
        for (i, partition) in info.partitions().iter().enumerate() {
            if !uploaded.contains(partition) {
                continue;
            }

            let data = &info.data_files()[i];
            let index = &info.index_files()[i];
            freed += (FileUtils::file_size(data) + FileUtils::file_size(index)) as i64;

            if let Err(e) = FileUtils::delete_path(data, false) {
                warn!("Delete {:?} fail: {}", data, e);
            }
            if let Err(e) = FileUtils::delete_path(index, false) {
                warn!("Delete {:?} fail: {}", index, e);
            }

            // The partition directory is gone once both files are.
            if let Some(dir) = data.parent() {
                let _ = std::fs::remove_dir(dir);
            }
        }

        if freed > 0 {
            self.disk_item.update_disk_size(-freed);
            debug!(
                "Deleted {} of uploaded local files for {}",
                ByteUnit::byte_to_string(freed as u64),
                info.key()
            );
        }
    }

    pub fn start(self: &Arc<Self>) -> CommonResult<()> {
        let mut lock = self.scheduler.lock().unwrap();
        if lock.is_some() {
            return err_box!("uploader of disk {} already started", self.disk_item.base_path());
        }

        self.terminated.set(false);
        let tick = UploadTick {
            uploader: self.clone(),
            terminated: self.terminated.clone(),
        };
        let name = format!("shuffle-uploader-{}", self.conf.server_id);
        let handle = ScheduledExecutor::new(name, self.conf.upload_interval_ms).start(tick)?;
        *lock = Some(handle);

        info!(
            "Shuffle uploader started for disk {}, interval {} ms, threads {}",
            self.disk_item.base_path(),
            self.conf.upload_interval_ms,
            self.conf.upload_thread_num
        );
        Ok(())
    }

    pub fn stop(&self) {
        self.terminated.set(true);
        if let Some(handle) = self.scheduler.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

// Periodic driver of upload().
struct UploadTick {
    uploader: Arc<ShuffleUploader>,
    terminated: Arc<AtomicBool>,
}

impl LoopTask for UploadTick {
    type Error = spillway_common::error::SpillError;

    fn run(&self) -> SpillResult<()> {
        self.uploader.upload()
    }

    fn terminate(&self) -> bool {
        self.terminated.get()
    }
}
