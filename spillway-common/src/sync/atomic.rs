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

use std::sync::atomic::{AtomicI64 as StdAtomicI64, Ordering};

const ATOMIC_ORDERING: Ordering = Ordering::SeqCst;

pub struct AtomicLong(StdAtomicI64);

impl AtomicLong {
    pub fn new(value: i64) -> Self {
        Self(StdAtomicI64::new(value))
    }

    pub fn get(&self) -> i64 {
        self.0.load(ATOMIC_ORDERING)
    }

    pub fn set(&self, value: i64) {
        self.0.store(value, ATOMIC_ORDERING)
    }

    pub fn get_and_add(&self, value: i64) -> i64 {
        self.0.fetch_add(value, ATOMIC_ORDERING)
    }

    pub fn add_and_get(&self, value: i64) -> i64 {
        self.0.fetch_add(value, ATOMIC_ORDERING) + value
    }

    pub fn incr(&self) {
        self.0.fetch_add(1, ATOMIC_ORDERING);
    }

    pub fn decr(&self) {
        self.0.fetch_sub(1, ATOMIC_ORDERING);
    }

    pub fn compare_and_set(&self, old: i64, new: i64) -> bool {
        let res = self
            .0
            .compare_exchange(old, new, ATOMIC_ORDERING, ATOMIC_ORDERING);
        res.is_ok()
    }
}

impl Default for AtomicLong {
    fn default() -> Self {
        Self::new(0)
    }
}

pub struct AtomicBool(std::sync::atomic::AtomicBool);

impl AtomicBool {
    pub fn new(v: bool) -> Self {
        Self(std::sync::atomic::AtomicBool::new(v))
    }

    pub fn get(&self) -> bool {
        self.0.load(ATOMIC_ORDERING)
    }

    pub fn set(&self, v: bool) {
        self.0.store(v, ATOMIC_ORDERING)
    }

    pub fn compare_and_set(&self, old: bool, new: bool) -> bool {
        let res = self
            .0
            .compare_exchange(old, new, ATOMIC_ORDERING, ATOMIC_ORDERING);
        res.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::sync::{AtomicBool, AtomicLong};

    #[test]
    fn atomic_long() {
        let v = AtomicLong::new(10);
        assert_eq!(v.add_and_get(5), 15);
        assert_eq!(v.get_and_add(-15), 15);
        assert_eq!(v.get(), 0);
        assert!(v.compare_and_set(0, 7));
        assert!(!v.compare_and_set(0, 8));
    }

    #[test]
    fn atomic_bool() {
        let v = AtomicBool::new(false);
        assert!(v.compare_and_set(false, true));
        assert!(v.get());
    }
}
