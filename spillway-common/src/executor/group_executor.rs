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

use crate::executor::SingleExecutor;
use crate::CommonResult;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-size pool of single-thread executors, tasks dispatched round robin.
#[derive(Debug)]
pub struct GroupExecutor {
    name_prefix: String,
    thread_num: usize,
    channel_size: usize,
    next: AtomicUsize,
    workers: Vec<SingleExecutor>,
}

impl GroupExecutor {
    pub fn new<T: AsRef<str>>(name_prefix: T, thread_num: usize, channel_size: usize) -> Self {
        let mut workers: Vec<SingleExecutor> = Vec::with_capacity(thread_num);

        for index in 0..thread_num {
            let name = format!("{}-{}", name_prefix.as_ref(), index);
            workers.push(SingleExecutor::new(name, channel_size));
        }

        GroupExecutor {
            name_prefix: name_prefix.as_ref().to_string(),
            thread_num,
            channel_size,
            next: AtomicUsize::new(0),
            workers,
        }
    }

    pub fn thread_num(&self) -> usize {
        self.thread_num
    }

    fn next_thread(&self) -> &SingleExecutor {
        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.thread_num;
        &self.workers[index]
    }

    pub fn spawn<F>(&self, task: F) -> CommonResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.next_thread().spawn(task)
    }
}

impl Display for GroupExecutor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GroupExecutor: name_prefix = {}, thread_num = {}, channel_size = {}",
            self.name_prefix, self.thread_num, self.channel_size
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::GroupExecutor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn round_robin() {
        let group = GroupExecutor::new("test-group", 3, 10);
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..9 {
            let c = count.clone();
            group
                .spawn(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(count.load(Ordering::SeqCst), 9);
    }
}
