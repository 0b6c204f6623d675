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

use spillway_common::common::{FileUtils, Logger};
use spillway_common::conf::{DiskConf, UploaderConf};
use spillway_common::error::ErrorKind;
use spillway_common::state::ShuffleKey;
use spillway_common::SpillResult;
use spillway_server::storage::{DiskItem, ShuffleFileInfo};
use spillway_server::uploader::{ShuffleUploadResult, ShuffleUploader, UploadHandler};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MB: i64 = 1024 * 1024;

const SERVER_ID: &str = "127.0.0.1-8080";

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("spillway-uploader-test").join(name);
    FileUtils::delete_path(&dir, true).unwrap();
    FileUtils::create_dir(&dir, true).unwrap();
    dir
}

fn disk_conf(dir: &PathBuf, capacity: i64) -> DiskConf {
    DiskConf {
        base_path: dir.to_string_lossy().to_string(),
        capacity,
        high_watermark_of_write: 100.0,
        low_watermark_of_write: 0.0,
        shuffle_expired_timeout_str: "1s".to_string(),
        sweep_interval_str: "100ms".to_string(),
        ..Default::default()
    }
}

fn uploader_conf(max_shuffle_size: &str) -> UploaderConf {
    UploaderConf {
        upload_thread_num: 2,
        upload_interval_ms: 3,
        upload_combine_threshold_mb: 300,
        reference_upload_speed_mbs: 1,
        storage_type: "hdfs".to_string(),
        remote_base_path: "hdfs://base".to_string(),
        server_id: SERVER_ID.to_string(),
        max_shuffle_size_str: max_shuffle_size.to_string(),
        ..Default::default()
    }
}

fn write_pair(disk: &DiskItem, key: &ShuffleKey, partition: u32, data_size: usize) {
    let dir = disk.partition_dir(key, partition);
    FileUtils::write_bytes(&dir.join(format!("{}.data", SERVER_ID)), &vec![1u8; data_size])
        .unwrap();
    FileUtils::write_bytes(&dir.join(format!("{}.index", SERVER_ID)), &vec![1u8; 10]).unwrap();
}

// Remote sink returning canned results, like the mocked handler of the
// original server tests.
struct MockHandler {
    results: Mutex<VecDeque<ShuffleUploadResult>>,
}

impl MockHandler {
    fn new(results: Vec<ShuffleUploadResult>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
        })
    }
}

impl UploadHandler for MockHandler {
    fn upload(&self, info: &ShuffleFileInfo) -> SpillResult<ShuffleUploadResult> {
        let mut lock = self.results.lock().unwrap();
        match lock.pop_front() {
            Some(result) => Ok(result),
            None => Ok(ShuffleUploadResult::new(
                info.size(),
                info.partitions().to_vec(),
            )),
        }
    }
}

#[test]
fn conf_validation() {
    let dir = test_dir("conf-validation");
    let disk = Arc::new(DiskItem::new(disk_conf(&dir, 1024)).unwrap());

    let reject = |conf: UploaderConf| {
        let err = ShuffleUploader::new(conf, disk.clone()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConf);
    };

    // A half-filled record can never run.
    reject(UploaderConf::default());
    reject(UploaderConf {
        upload_thread_num: 2,
        ..Default::default()
    });
    reject(UploaderConf {
        upload_thread_num: 2,
        upload_interval_ms: 3,
        ..Default::default()
    });
    reject(UploaderConf {
        reference_upload_speed_mbs: 0,
        ..uploader_conf("128MB")
    });
    reject(UploaderConf {
        storage_type: "".to_string(),
        ..uploader_conf("128MB")
    });
    reject(UploaderConf {
        server_id: "".to_string(),
        ..uploader_conf("128MB")
    });
    reject(UploaderConf {
        remote_base_path: "hdfs://".to_string(),
        ..uploader_conf("128MB")
    });
    reject(uploader_conf("0"));

    ShuffleUploader::new(uploader_conf("128MB"), disk.clone()).unwrap();
}

#[test]
fn select_shuffle_files() -> SpillResult<()> {
    let dir = test_dir("select");
    let disk = Arc::new(DiskItem::new(disk_conf(&dir, 1024))?);
    let key = ShuffleKey::new("app-1", 1);

    disk.create_metadata_if_not_exist(&key);
    disk.update_write(&key, 30, &[1, 2, 3, 4]);
    for p in [1, 2, 3] {
        write_pair(&disk, &key, p, 10);
    }
    // Partition 4 has no index file, its pair is incomplete.
    let dir4 = disk.partition_dir(&key, 4);
    FileUtils::write_bytes(&dir4.join(format!("{}.data", SERVER_ID)), &[1u8; 10])?;

    // Unbounded batch size: one batch with partitions 1, 2, 3.
    let uploader = ShuffleUploader::new(uploader_conf("1GB"), disk.clone())?;
    let infos = uploader.select_shuffle_files(4, false);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].partitions(), &[1, 2, 3]);
    assert_eq!(infos[0].size(), 30);
    assert_eq!(infos[0].data_files().len(), infos[0].index_files().len());

    // Cap below the file size: every pair is its own batch.
    let uploader = ShuffleUploader::new(uploader_conf("5B"), disk.clone())?;
    let infos = uploader.select_shuffle_files(4, false);
    assert_eq!(infos.len(), 3);
    for (i, info) in infos.iter().enumerate() {
        assert_eq!(info.partitions(), &[i as u32 + 1]);
        assert_eq!(info.size(), 10);
    }

    // The closing pair may push a batch past the cap.
    let uploader = ShuffleUploader::new(uploader_conf("15B"), disk.clone())?;
    let infos = uploader.select_shuffle_files(4, false);
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].partitions(), &[1, 2]);
    assert_eq!(infos[0].size(), 20);
    assert_eq!(infos[1].partitions(), &[3]);
    assert_eq!(infos[1].size(), 10);

    // Forced mode caps the tick at upload_thread_num batches.
    let uploader = ShuffleUploader::new(uploader_conf("9B"), disk.clone())?;
    let infos = uploader.select_shuffle_files(4, true);
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].size(), 10);
    assert_eq!(infos[1].size(), 10);

    Ok(())
}

#[test]
fn select_forced_restriction() -> SpillResult<()> {
    let dir = test_dir("restriction");
    let disk = Arc::new(DiskItem::new(disk_conf(&dir, 1024))?);

    for i in 0..4u32 {
        let key = ShuffleKey::new(format!("app-{}", i), 1);
        disk.create_metadata_if_not_exist(&key);
        disk.update_write(&key, 5 * (i as i64 + 1) * 5, &[0, 1, 2, 3, 4]);
        for p in 0..5 {
            write_pair(&disk, &key, p, 5 * (i as usize + 1));
        }
    }

    let conf = UploaderConf {
        upload_thread_num: 4,
        reference_upload_speed_mbs: 10,
        ..uploader_conf("10B")
    };
    let uploader = ShuffleUploader::new(conf, disk.clone())?;

    let infos = uploader.select_shuffle_files(4, false);
    assert_eq!(infos.len(), 15);

    // Huge backlog under pressure: segments limited to the thread num.
    let infos = uploader.select_shuffle_files(4, true);
    assert_eq!(infos.len(), 4);
    for info in &infos {
        assert!(info.data_files().len() == info.index_files().len());
    }

    Ok(())
}

#[test]
fn calculate_upload_time() -> SpillResult<()> {
    let dir = test_dir("deadline");
    let disk = Arc::new(DiskItem::new(disk_conf(&dir, 1024))?);

    let conf = |threads: usize, expire_s: u64| UploaderConf {
        upload_thread_num: threads,
        reference_upload_speed_mbs: 128,
        max_force_upload_expire_s: expire_s,
        ..uploader_conf("128MB")
    };

    let uploader = ShuffleUploader::new(conf(1, 13), disk.clone())?;
    assert_eq!(uploader.calculate_upload_time(0, 0, false), 2);
    assert_eq!(uploader.calculate_upload_time(0, 128 * 1024, false), 2);
    assert_eq!(uploader.calculate_upload_time(0, 128 * MB, false), 2);
    assert_eq!(uploader.calculate_upload_time(0, 3 * 128 * MB, false), 6);
    assert_eq!(
        uploader.calculate_upload_time(6 * 128 * MB, 3 * 128 * MB, false),
        12
    );

    let uploader = ShuffleUploader::new(conf(2, 10), disk.clone())?;
    assert_eq!(uploader.calculate_upload_time(0, 0, false), 2);
    assert_eq!(uploader.calculate_upload_time(0, 128 * 1024, false), 2);
    assert_eq!(uploader.calculate_upload_time(0, 128 * MB, false), 2);
    assert_eq!(uploader.calculate_upload_time(0, 6 * 128 * MB, false), 6);
    assert_eq!(
        uploader.calculate_upload_time(4 * 128 * MB, 6 * 128 * MB, false),
        8
    );

    let uploader = ShuffleUploader::new(conf(2, 7), disk.clone())?;
    assert_eq!(
        uploader.calculate_upload_time(4 * 128 * MB, 6 * 128 * MB, true),
        7
    );

    let uploader = ShuffleUploader::new(conf(2, 1), disk.clone())?;
    assert_eq!(uploader.calculate_upload_time(0, 0, true), 1);

    Ok(())
}

#[test]
fn upload_reconciliation() -> SpillResult<()> {
    Logger::default();
    let dir = test_dir("reconciliation");
    let mut disk_conf = disk_conf(&dir, 100);
    disk_conf.high_watermark_of_write = 50.0;
    disk_conf.low_watermark_of_write = 45.0;
    let disk = Arc::new(DiskItem::new(disk_conf)?);

    let conf = UploaderConf {
        upload_thread_num: 1,
        upload_interval_ms: 1000,
        upload_combine_threshold_mb: 1,
        reference_upload_speed_mbs: 2,
        max_force_upload_expire_s: 1,
        ..uploader_conf("128MB")
    };

    let handler = MockHandler::new(vec![
        ShuffleUploadResult::new(50, vec![1, 2]),
        ShuffleUploadResult::new(90, vec![1, 2, 3]),
        ShuffleUploadResult::new(10, vec![1, 2]),
        ShuffleUploadResult::new(40, vec![1, 3, 2, 4]),
    ]);
    let uploader = ShuffleUploader::with_handler(conf, disk.clone(), handler)?;
    let key = ShuffleKey::new("app-1", 1);

    let data_file = |p: u32| disk.partition_dir(&key, p).join(format!("{}.data", SERVER_ID));
    let index_file = |p: u32| disk.partition_dir(&key, p).join(format!("{}.index", SERVER_ID));

    // Tick 1: partial success (50 bytes, partitions 1 and 2).
    disk.create_metadata_if_not_exist(&key);
    disk.update_write(&key, 70, &[1, 2, 3]);
    write_pair(&disk, &key, 1, 20);
    write_pair(&disk, &key, 2, 30);
    write_pair(&disk, &key, 3, 20);

    uploader.upload()?;
    assert_eq!(disk.not_uploaded_size(&key), 20);
    let bitmap = disk.not_uploaded_partitions(&key);
    assert_eq!(bitmap.cardinality(), 1);
    assert!(bitmap.contains(3));
    assert!(!FileUtils::exists(data_file(1)));
    assert!(!FileUtils::exists(index_file(1)));
    assert!(!FileUtils::exists(data_file(2)));
    assert!(!FileUtils::exists(index_file(2)));
    assert!(FileUtils::exists(data_file(3)));
    assert!(FileUtils::exists(index_file(3)));

    // Tick 2: everything confirmed, the disk drains completely.
    disk.update_write(&key, 70, &[1, 2]);
    write_pair(&disk, &key, 1, 30);
    write_pair(&disk, &key, 2, 40);

    uploader.upload()?;
    assert_eq!(disk.not_uploaded_size(&key), 0);
    assert!(disk.not_uploaded_partitions(&key).is_empty());
    for p in [1, 2, 3] {
        assert!(!FileUtils::exists(data_file(p)));
        assert!(!FileUtils::exists(index_file(p)));
    }

    // Tick 3: a reading key keeps its local files, state still updates.
    disk.update_write(&key, 30, &[1, 2, 3]);
    write_pair(&disk, &key, 1, 5);
    write_pair(&disk, &key, 2, 5);
    write_pair(&disk, &key, 3, 20);
    disk.prepare_start_read(&key);

    uploader.upload()?;
    assert_eq!(disk.not_uploaded_size(&key), 20);
    assert_eq!(disk.not_uploaded_partitions(&key).cardinality(), 1);
    for p in [1, 2, 3] {
        assert!(FileUtils::exists(data_file(p)));
        assert!(FileUtils::exists(index_file(p)));
    }

    // Tick 4: the handler over-reports; size clamps at zero.
    disk.update_shuffle_last_read_ts(&key);
    disk.start()?;

    uploader.upload()?;
    assert_eq!(disk.not_uploaded_size(&key), 0);
    assert!(disk.not_uploaded_partitions(&key).is_empty());

    // Still hot: the sweeper must not delete anything yet.
    std::thread::sleep(Duration::from_millis(300));
    for p in [1, 2, 3] {
        assert!(FileUtils::exists(data_file(p)));
    }

    // Once the read expires, metadata and every local file go away.
    std::thread::sleep(Duration::from_millis(1500));
    assert!(!FileUtils::exists(disk.shuffle_dir(&key)));
    assert!(!disk.shuffle_keys().contains(&key));

    disk.stop();
    Ok(())
}
