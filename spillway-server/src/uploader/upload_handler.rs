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

use crate::storage::ShuffleFileInfo;
use crate::uploader::UfsUploadHandler;
use spillway_common::conf::UploaderConf;
use spillway_common::SpillResult;
use std::sync::Arc;

// What one handler call managed to make durable on the remote tier.
#[derive(Debug, Clone, Default)]
pub struct ShuffleUploadResult {
    pub uploaded_bytes: i64,
    pub partition_ids: Vec<u32>,
}

impl ShuffleUploadResult {
    pub fn new(uploaded_bytes: i64, partition_ids: Vec<u32>) -> Self {
        Self {
            uploaded_bytes,
            partition_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.partition_ids.is_empty()
    }
}

/// The remote sink the uploader drains into. Implementations block for the
/// whole remote write; they run on the uploader's worker pool.
///
/// Partial success is allowed: the reported partition ids must be a subset of
/// the batch and are reflected verbatim in state reconciliation. Everything
/// not reported stays local and is retried on a later tick.
pub trait UploadHandler: Send + Sync {
    fn upload(&self, info: &ShuffleFileInfo) -> SpillResult<ShuffleUploadResult>;
}

pub struct UploadHandlerFactory;

impl UploadHandlerFactory {
    // The conf is validated at uploader construction; this only builds the
    // client, so it may fail on environment problems (e.g. missing hdfs
    // support) without failing construction.
    pub fn create(conf: &UploaderConf) -> SpillResult<Arc<dyn UploadHandler>> {
        let handler = UfsUploadHandler::new(conf)?;
        Ok(Arc::new(handler))
    }
}
