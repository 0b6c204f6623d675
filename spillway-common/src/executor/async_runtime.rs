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

use futures::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

// Bridge from blocking worker threads into async I/O clients.
#[derive(Debug)]
pub struct AsyncRuntime {
    inner: Runtime,
    name_prefix: String,
    worker_threads: usize,
}

impl AsyncRuntime {
    pub fn new<T: AsRef<str>>(name_prefix: T, worker_threads: usize) -> Self {
        let rt = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_keep_alive(Duration::from_secs(6 * 3600))
            .thread_name(name_prefix.as_ref())
            .enable_all()
            .build()
            .unwrap();

        AsyncRuntime {
            inner: rt,
            name_prefix: String::from(name_prefix.as_ref()),
            worker_threads,
        }
    }

    pub fn single() -> Self {
        Self::new("single", 1)
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.inner.block_on(future)
    }
}
