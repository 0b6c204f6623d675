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
use spillway_common::conf::DiskConf;
use spillway_common::error::ErrorKind;
use spillway_common::state::ShuffleKey;
use spillway_common::SpillResult;
use spillway_server::storage::DiskItem;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("spillway-disk-test").join(name);
    FileUtils::delete_path(&dir, true).unwrap();
    dir
}

fn disk_conf(name: &str, capacity: i64) -> DiskConf {
    DiskConf {
        base_path: test_dir(name).to_string_lossy().to_string(),
        capacity,
        high_watermark_of_write: 50.0,
        low_watermark_of_write: 45.0,
        shuffle_expired_timeout_str: "200ms".to_string(),
        sweep_interval_str: "50ms".to_string(),
        ..Default::default()
    }
}

#[test]
fn reject_invalid_conf() {
    let err = DiskItem::new(DiskConf::default()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidConf);

    let mut conf = disk_conf("invalid", 100);
    conf.low_watermark_of_write = 80.0;
    let err = DiskItem::new(conf).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidConf);
}

#[test]
fn write_admission_hysteresis() -> SpillResult<()> {
    let disk = DiskItem::new(disk_conf("hysteresis", 100))?;
    let key = ShuffleKey::new("app-1", 1);

    assert!(disk.can_write());

    // Crossing the high watermark (50%) stops admission.
    disk.update_write(&key, 60, &[1]);
    assert!(!disk.can_write());
    assert!(disk.exceed_high_watermark());

    // Dropping below high but above low keeps it stopped.
    disk.update_disk_size(-12);
    assert!(!disk.can_write());

    // Dropping below the low watermark (45%) resumes admission.
    disk.update_disk_size(-10);
    assert!(disk.can_write());
    assert!(!disk.exceed_high_watermark());

    Ok(())
}

#[test]
fn sweeper_purges_drained_keys() -> SpillResult<()> {
    let disk = Arc::new(DiskItem::new(disk_conf("sweeper", 1024))?);
    let key = ShuffleKey::new("app-1", 7);

    disk.create_metadata_if_not_exist(&key);
    disk.update_write(&key, 10, &[1]);

    let data = disk.partition_dir(&key, 1).join("server.data");
    let index = disk.partition_dir(&key, 1).join("server.index");
    FileUtils::write_bytes(&data, &[1u8; 10])?;
    FileUtils::write_bytes(&index, &[1u8; 4])?;

    disk.start()?;

    // Still resident, nothing to purge.
    std::thread::sleep(Duration::from_millis(150));
    assert!(FileUtils::exists(&data));

    // Reading keys stay on disk until the read expires.
    disk.prepare_start_read(&key);
    disk.update_uploaded_state(&key, &[1], 10);
    std::thread::sleep(Duration::from_millis(120));
    assert!(FileUtils::exists(&data));
    assert!(disk.is_reading(&key));

    // After expiry the sweeper drops metadata and files.
    std::thread::sleep(Duration::from_millis(400));
    assert!(!FileUtils::exists(&data));
    assert!(!FileUtils::exists(&index));
    assert!(!disk.shuffle_keys().contains(&key));
    assert_eq!(disk.disk_size(), 0);

    disk.stop();
    Ok(())
}
