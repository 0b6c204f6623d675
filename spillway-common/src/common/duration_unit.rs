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

#![allow(clippy::should_implement_trait)]

use crate::{err_box, CommonResult};
use std::time::Duration;

// The smallest unit supported is milliseconds, so DurationUnit stores millis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Default)]
pub struct DurationUnit(u64);

impl DurationUnit {
    pub const MILLISECONDS: u64 = 1;
    pub const SECONDS: u64 = 1000 * Self::MILLISECONDS;
    pub const MINUTE: u64 = 60 * Self::SECONDS;
    pub const HOUR: u64 = 60 * Self::MINUTE;
    pub const DAY: u64 = 24 * Self::HOUR;

    pub fn new(ms: u64) -> Self {
        DurationUnit(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    pub fn as_seconds(&self) -> u64 {
        self.0 / Self::SECONDS
    }

    pub fn from_str(dur_str: &str) -> CommonResult<Self> {
        let dur_str = dur_str.trim().to_lowercase();
        if !dur_str.is_ascii() {
            return err_box!("unexpect ascii string: {}", dur_str);
        }

        let size_len = dur_str
            .chars()
            .take_while(|c| char::is_ascii_digit(c) || ['.', 'e', 'E', '-', '+'].contains(c))
            .count();

        let (size, unit) = dur_str.split_at(size_len);

        let unit = match unit.trim() {
            "s" | "second" => Self::SECONDS,
            "m" | "minute" => Self::MINUTE,
            "h" | "hour" => Self::HOUR,
            "d" | "day" => Self::DAY,
            "ms" | "" => Self::MILLISECONDS,
            _ => {
                return err_box!(
                    "invalid duration {}, only d, h, m, s, ms are supported",
                    dur_str
                );
            }
        };

        match size.parse::<f64>() {
            Ok(n) if n >= 0.0 => Ok(DurationUnit((n * unit as f64) as u64)),
            _ => err_box!("invalid duration string: {}", dur_str),
        }
    }
}
