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

use crate::storage::DiskItem;
use spillway_common::error::SpillError;
use spillway_common::executor::LoopTask;
use spillway_common::sync::AtomicBool;
use spillway_common::{try_log, SpillResult};
use std::sync::Arc;

// Background pass over all resident keys: lets reading flags expire once the
// last read went cold, and reclaims metadata plus local files of keys whose
// every partition has been uploaded.
pub struct DiskSweeper {
    disk: Arc<DiskItem>,
    terminated: Arc<AtomicBool>,
}

impl DiskSweeper {
    pub fn new(disk: Arc<DiskItem>, terminated: Arc<AtomicBool>) -> Self {
        Self { disk, terminated }
    }
}

impl LoopTask for DiskSweeper {
    type Error = SpillError;

    fn run(&self) -> SpillResult<()> {
        for key in self.disk.shuffle_keys() {
            self.disk.expire_reading(&key);

            // A failed purge is retried next pass, keep sweeping the rest.
            let _ = try_log!(self.disk.purge_if_drained(&key), false);
        }

        Ok(())
    }

    fn terminate(&self) -> bool {
        self.terminated.get()
    }
}
