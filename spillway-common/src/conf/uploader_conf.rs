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

use crate::common::ByteUnit;
use crate::error::SpillError;
use crate::state::RemoteStorageType;
use crate::SpillResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Uploader configuration. Required fields default to zero or empty values and
// are rejected by validate(), so a half-filled record can never run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConf {
    // Worker pool size, also the per-tick batch cap under forced upload.
    pub upload_thread_num: usize,

    // Period between upload ticks.
    pub upload_interval_ms: u64,

    // Batches smaller than this are merged into one remote object.
    pub upload_combine_threshold_mb: u64,

    // Assumed per-thread bandwidth, the denominator of the tick deadline.
    pub reference_upload_speed_mbs: u64,

    // Upper clamp on the deadline of a forced tick.
    pub max_force_upload_expire_s: u64,

    // Hard per-batch byte cap, resolved from max_shuffle_size_str by init().
    #[serde(skip)]
    pub max_shuffle_size: i64,
    #[serde(alias = "max_shuffle_size")]
    pub max_shuffle_size_str: String,

    // Remote tier: storage type, base path and client properties.
    pub storage_type: String,
    pub remote_base_path: String,
    pub remote_conf: HashMap<String, String>,

    // This server's identity, used in local file names and remote prefixes.
    pub server_id: String,
}

impl UploaderConf {
    pub fn init(&mut self) -> SpillResult<()> {
        let size = ByteUnit::from_str(&self.max_shuffle_size_str)
            .map_err(|e| SpillError::invalid_conf(format!("max_shuffle_size: {}", e)))?;
        self.max_shuffle_size = size.as_byte() as i64;

        Ok(())
    }

    pub fn validate(&self) -> SpillResult<()> {
        if self.upload_thread_num == 0 {
            return Err(SpillError::invalid_conf("upload_thread_num must be > 0"));
        }
        if self.upload_interval_ms == 0 {
            return Err(SpillError::invalid_conf("upload_interval_ms must be > 0"));
        }
        if self.upload_combine_threshold_mb == 0 {
            return Err(SpillError::invalid_conf(
                "upload_combine_threshold_mb must be > 0",
            ));
        }
        if self.reference_upload_speed_mbs == 0 {
            return Err(SpillError::invalid_conf(
                "reference_upload_speed_mbs must be > 0",
            ));
        }
        if self.max_force_upload_expire_s == 0 {
            return Err(SpillError::invalid_conf(
                "max_force_upload_expire_s must be > 0",
            ));
        }
        if self.max_shuffle_size <= 0 {
            return Err(SpillError::invalid_conf("max_shuffle_size must be > 0"));
        }
        if self.server_id.is_empty() {
            return Err(SpillError::invalid_conf("server_id must not be empty"));
        }

        let storage_type = self.remote_storage_type()?;
        let pattern = format!("^{}://.+$", storage_type.scheme());
        let re = Regex::new(&pattern)?;
        if !re.is_match(&self.remote_base_path) {
            return Err(SpillError::invalid_conf(format!(
                "remote_base_path {} does not match {}",
                self.remote_base_path, pattern
            )));
        }

        Ok(())
    }

    pub fn remote_storage_type(&self) -> SpillResult<RemoteStorageType> {
        if self.storage_type.is_empty() {
            return Err(SpillError::invalid_conf("storage_type must be set"));
        }
        RemoteStorageType::from_str(&self.storage_type)
            .map_err(|e| SpillError::invalid_conf(e.to_string()))
    }

    pub fn combine_threshold_bytes(&self) -> i64 {
        (self.upload_combine_threshold_mb * ByteUnit::MB) as i64
    }

    pub fn local_data_file(&self) -> String {
        format!("{}.data", self.server_id)
    }

    pub fn local_index_file(&self) -> String {
        format!("{}.index", self.server_id)
    }
}

impl Default for UploaderConf {
    fn default() -> Self {
        Self {
            upload_thread_num: 0,
            upload_interval_ms: 0,
            upload_combine_threshold_mb: 0,
            reference_upload_speed_mbs: 0,
            max_force_upload_expire_s: 60,
            max_shuffle_size: 0,
            max_shuffle_size_str: "128MB".to_string(),
            storage_type: "".to_string(),
            remote_base_path: "".to_string(),
            remote_conf: HashMap::new(),
            server_id: "".to_string(),
        }
    }
}
