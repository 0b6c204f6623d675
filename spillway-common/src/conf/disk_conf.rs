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

use crate::common::DurationUnit;
use crate::error::SpillError;
use crate::SpillResult;
use serde::{Deserialize, Serialize};

// Configuration of one local shuffle disk.
//
// Watermarks are percentages of capacity. Crossing the high watermark stops
// write admission and triggers forced uploads; admission resumes below the low
// watermark. Durations are written as strings ("60s", "500ms") and resolved
// into millisecond fields by init().
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiskConf {
    pub base_path: String,

    pub capacity: i64,

    pub high_watermark_of_write: f64,
    pub low_watermark_of_write: f64,

    // How long after the last read touch a reading shuffle stays hot.
    #[serde(skip)]
    pub shuffle_expired_timeout_ms: u64,
    #[serde(alias = "shuffle_expired_timeout")]
    pub shuffle_expired_timeout_str: String,

    // Sweeper pass interval.
    #[serde(skip)]
    pub sweep_interval_ms: u64,
    #[serde(alias = "sweep_interval")]
    pub sweep_interval_str: String,
}

impl DiskConf {
    pub fn with_path(base_path: impl Into<String>, capacity: i64) -> Self {
        Self {
            base_path: base_path.into(),
            capacity,
            ..Default::default()
        }
    }

    pub fn init(&mut self) -> SpillResult<()> {
        self.shuffle_expired_timeout_ms = DurationUnit::from_str(&self.shuffle_expired_timeout_str)
            .map_err(|e| SpillError::invalid_conf(format!("shuffle_expired_timeout: {}", e)))?
            .as_millis();
        self.sweep_interval_ms = DurationUnit::from_str(&self.sweep_interval_str)
            .map_err(|e| SpillError::invalid_conf(format!("sweep_interval: {}", e)))?
            .as_millis();

        Ok(())
    }

    pub fn validate(&self) -> SpillResult<()> {
        if self.base_path.is_empty() {
            return Err(SpillError::invalid_conf("base_path must not be empty"));
        }
        if self.capacity <= 0 {
            return Err(SpillError::invalid_conf("capacity must be > 0"));
        }
        if self.high_watermark_of_write <= 0.0 || self.high_watermark_of_write > 100.0 {
            return Err(SpillError::invalid_conf(
                "high_watermark_of_write must be in (0, 100]",
            ));
        }
        if self.low_watermark_of_write < 0.0
            || self.low_watermark_of_write > self.high_watermark_of_write
        {
            return Err(SpillError::invalid_conf(
                "low_watermark_of_write must be in [0, high_watermark_of_write]",
            ));
        }
        if self.shuffle_expired_timeout_ms == 0 {
            return Err(SpillError::invalid_conf(
                "shuffle_expired_timeout must be > 0",
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(SpillError::invalid_conf("sweep_interval must be > 0"));
        }

        Ok(())
    }
}

impl Default for DiskConf {
    fn default() -> Self {
        Self {
            base_path: "".to_string(),
            capacity: 0,
            high_watermark_of_write: 95.0,
            low_watermark_of_write: 85.0,
            shuffle_expired_timeout_ms: 0,
            shuffle_expired_timeout_str: "60s".to_string(),
            sweep_interval_ms: 0,
            sweep_interval_str: "10s".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::conf::DiskConf;
    use crate::SpillResult;

    #[test]
    fn init_and_validate() -> SpillResult<()> {
        let mut conf = DiskConf::with_path("/data/shuffle1", 1024);
        conf.init()?;
        assert_eq!(conf.shuffle_expired_timeout_ms, 60_000);
        assert_eq!(conf.sweep_interval_ms, 10_000);
        conf.validate()?;

        let mut empty = DiskConf::default();
        empty.init()?;
        assert!(empty.validate().is_err());

        let mut bad = DiskConf::with_path("/data/shuffle1", 1024);
        bad.sweep_interval_str = "10y".to_string();
        assert!(bad.init().is_err());

        let mut bad = DiskConf::with_path("/data/shuffle1", 1024);
        bad.low_watermark_of_write = 99.0;
        bad.init()?;
        assert!(bad.validate().is_err());

        Ok(())
    }
}
