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

use spillway_common::state::ShuffleKey;
use std::path::PathBuf;

/// One upload batch: the data/index file pairs of a single shuffle key that a
/// worker writes to the remote tier in one handler call.
///
/// The two file lists are parallel to the partition id list; ids are appended
/// in ascending order by selection.
#[derive(Debug, Clone)]
pub struct ShuffleFileInfo {
    key: ShuffleKey,
    data_files: Vec<PathBuf>,
    index_files: Vec<PathBuf>,
    partitions: Vec<u32>,
    size: i64,
}

impl ShuffleFileInfo {
    pub fn new(key: ShuffleKey) -> Self {
        Self {
            key,
            data_files: vec![],
            index_files: vec![],
            partitions: vec![],
            size: 0,
        }
    }

    pub fn add_partition(&mut self, partition: u32, data: PathBuf, index: PathBuf, size: i64) {
        self.data_files.push(data);
        self.index_files.push(index);
        self.partitions.push(partition);
        self.size += size;
    }

    pub fn key(&self) -> &ShuffleKey {
        &self.key
    }

    pub fn data_files(&self) -> &[PathBuf] {
        &self.data_files
    }

    pub fn index_files(&self) -> &[PathBuf] {
        &self.index_files
    }

    pub fn partitions(&self) -> &[u32] {
        &self.partitions
    }

    // Total data bytes in the batch; index bytes are not counted.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    // Small batches are merged into a single remote object by the handler.
    pub fn should_combine(&self, threshold_bytes: i64) -> bool {
        self.size < threshold_bytes
    }
}
