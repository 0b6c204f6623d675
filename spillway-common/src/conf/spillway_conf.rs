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

use crate::common::LogConf;
use crate::conf::{DiskConf, UploaderConf};
use crate::error::SpillError;
use crate::SpillResult;
use serde::{Deserialize, Serialize};
use std::fs;

// Whole-process configuration: one uploader policy shared by all disks.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpillwayConf {
    pub disks: Vec<DiskConf>,
    pub uploader: UploaderConf,
    pub log: LogConf,
}

impl SpillwayConf {
    pub fn from_file(path: impl AsRef<str>) -> SpillResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| SpillError::io(e).ctx(format!("read conf {}", path.as_ref())))?;

        let mut conf: SpillwayConf = toml::from_str(&content)?;
        conf.init()?;
        Ok(conf)
    }

    pub fn init(&mut self) -> SpillResult<()> {
        for disk in &mut self.disks {
            disk.init()?;
        }
        self.uploader.init()?;
        self.validate()
    }

    pub fn validate(&self) -> SpillResult<()> {
        if self.disks.is_empty() {
            return Err(SpillError::invalid_conf("at least one disk is required"));
        }
        for disk in &self.disks {
            disk.validate()?;
        }
        self.uploader.validate()
    }
}

#[cfg(test)]
mod tests {
    use crate::conf::SpillwayConf;
    use crate::SpillResult;

    #[test]
    fn from_toml() -> SpillResult<()> {
        let text = r#"
            [[disks]]
            base_path = "/data/shuffle1"
            capacity = 1073741824

            [uploader]
            upload_thread_num = 4
            upload_interval_ms = 1000
            upload_combine_threshold_mb = 32
            reference_upload_speed_mbs = 128
            max_shuffle_size = "256MB"
            storage_type = "hdfs"
            remote_base_path = "hdfs://ns1/shuffle"
            server_id = "10.0.0.1-8080"
        "#;

        let mut conf: SpillwayConf = toml::from_str(text).unwrap();
        conf.init()?;

        assert_eq!(conf.disks.len(), 1);
        assert_eq!(conf.disks[0].sweep_interval_ms, 10_000);
        assert_eq!(conf.uploader.max_shuffle_size, 256 << 20);
        Ok(())
    }
}
