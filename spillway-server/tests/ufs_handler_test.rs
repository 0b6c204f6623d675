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

use spillway_common::common::FileUtils;
use spillway_common::conf::{DiskConf, UploaderConf};
use spillway_common::state::ShuffleKey;
use spillway_common::SpillResult;
use spillway_server::storage::DiskItem;
use spillway_server::uploader::ShuffleUploader;
use std::path::PathBuf;
use std::sync::Arc;

const SERVER_ID: &str = "test-server";

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("spillway-ufs-test").join(name);
    FileUtils::delete_path(&dir, true).unwrap();
    FileUtils::create_dir(&dir, true).unwrap();
    dir
}

fn localfs_conf(remote_dir: &PathBuf, combine_threshold_mb: u64) -> UploaderConf {
    UploaderConf {
        upload_thread_num: 1,
        upload_interval_ms: 1000,
        upload_combine_threshold_mb: combine_threshold_mb,
        reference_upload_speed_mbs: 1,
        storage_type: "localfs".to_string(),
        remote_base_path: format!("file://{}", remote_dir.display()),
        server_id: SERVER_ID.to_string(),
        ..Default::default()
    }
}

fn setup_disk(name: &str) -> SpillResult<Arc<DiskItem>> {
    let conf = DiskConf::with_path(test_dir(name).to_string_lossy(), 1024 * 1024 * 1024);
    Ok(Arc::new(DiskItem::new(conf)?))
}

fn write_pair(disk: &DiskItem, key: &ShuffleKey, partition: u32, data_size: usize) {
    let dir = disk.partition_dir(key, partition);
    FileUtils::write_bytes(&dir.join(format!("{}.data", SERVER_ID)), &vec![7u8; data_size])
        .unwrap();
    FileUtils::write_bytes(&dir.join(format!("{}.index", SERVER_ID)), &vec![7u8; 16]).unwrap();
}

// Small batches land as one merged object pair under combine/.
#[test]
fn upload_combined_to_localfs() -> SpillResult<()> {
    let remote = test_dir("combined-remote");
    let disk = setup_disk("combined-local")?;
    let key = ShuffleKey::new("app-1", 3);

    disk.create_metadata_if_not_exist(&key);
    disk.update_write(&key, 30, &[1, 2, 3]);
    for p in [1, 2, 3] {
        write_pair(&disk, &key, p, 10);
    }

    let uploader = ShuffleUploader::new(localfs_conf(&remote, 1), disk.clone())?;
    uploader.upload()?;

    assert_eq!(disk.not_uploaded_size(&key), 0);
    assert!(disk.not_uploaded_partitions(&key).is_empty());
    for p in [1, 2, 3] {
        assert!(!FileUtils::exists(disk.partition_dir(&key, p)));
    }

    let combine_dir = remote.join(SERVER_ID).join("app-1").join("3").join("combine");
    let mut data_files = 0;
    let mut index_files = 0;
    for entry in std::fs::read_dir(&combine_dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if name.ends_with(".data") {
            data_files += 1;
            assert_eq!(FileUtils::file_size(&path), 30);
        } else if name.ends_with(".index") {
            index_files += 1;
            assert_eq!(FileUtils::file_size(&path), 48);
        }
    }
    assert_eq!(data_files, 1);
    assert_eq!(index_files, 1);

    Ok(())
}

// Batches at or above the combine threshold keep one object pair per
// partition, mirroring the local directory layout.
#[test]
fn upload_partitioned_to_localfs() -> SpillResult<()> {
    let remote = test_dir("partitioned-remote");
    let disk = setup_disk("partitioned-local")?;
    let key = ShuffleKey::new("app-2", 1);

    let data_size = 2 * 1024 * 1024;
    disk.create_metadata_if_not_exist(&key);
    disk.update_write(&key, data_size as i64, &[5]);
    write_pair(&disk, &key, 5, data_size);

    let uploader = ShuffleUploader::new(localfs_conf(&remote, 1), disk.clone())?;
    uploader.upload()?;

    assert_eq!(disk.not_uploaded_size(&key), 0);
    assert!(!FileUtils::exists(disk.partition_dir(&key, 5)));

    let remote_dir = remote.join(SERVER_ID).join("app-2").join("1").join("5-5");
    let data = remote_dir.join(format!("{}.data", SERVER_ID));
    let index = remote_dir.join(format!("{}.index", SERVER_ID));
    assert_eq!(FileUtils::file_size(&data) as usize, data_size);
    assert_eq!(FileUtils::file_size(&index), 16);

    Ok(())
}
