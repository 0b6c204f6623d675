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

use once_cell::sync::Lazy;
use prometheus::{Counter, Gauge};
use spillway_common::common::Metrics as m;
use spillway_common::CommonResult;

pub static UPLOADER_METRICS: Lazy<UploaderMetrics> =
    Lazy::new(|| UploaderMetrics::new().expect("register uploader metrics"));

pub struct UploaderMetrics {
    pub uploaded_bytes: Counter,
    pub uploaded_partitions: Counter,
    pub failed_batches: Counter,
    pub abandoned_batches: Counter,
    pub forced_ticks: Counter,
    pub in_flight_bytes: Gauge,
}

impl UploaderMetrics {
    fn new() -> CommonResult<Self> {
        let um = Self {
            uploaded_bytes: m::new_counter("upload_bytes", "Bytes uploaded to the remote tier")?,
            uploaded_partitions: m::new_counter(
                "upload_partitions",
                "Partitions uploaded to the remote tier",
            )?,
            failed_batches: m::new_counter("upload_failed_batches", "Upload batches that failed")?,
            abandoned_batches: m::new_counter(
                "upload_abandoned_batches",
                "Upload batches not observed within the tick deadline",
            )?,
            forced_ticks: m::new_counter(
                "upload_forced_ticks",
                "Ticks running in forced mode above the high watermark",
            )?,
            in_flight_bytes: m::new_gauge("upload_in_flight_bytes", "Bytes of dispatched batches")?,
        };

        Ok(um)
    }
}
