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
use std::fmt;

#[derive(Clone, Debug, Copy, PartialEq, PartialOrd, Default)]
pub struct ByteUnit(u64);

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

impl ByteUnit {
    pub const B: u64 = 1;
    pub const KB: u64 = 1u64 << 10;
    pub const MB: u64 = 1u64 << 20;
    pub const GB: u64 = 1u64 << 30;
    pub const TB: u64 = 1u64 << 40;
    pub const PB: u64 = 1u64 << 50;

    pub fn new(value: u64) -> Self {
        ByteUnit(value)
    }

    pub fn as_byte(&self) -> u64 {
        self.0
    }

    pub fn as_mb(&self) -> u64 {
        self.0 / Self::MB
    }

    pub fn from_str(size_str: impl AsRef<str>) -> CommonResult<Self> {
        let size_str = size_str.as_ref().trim().to_uppercase();
        if size_str.is_empty() {
            return err_box!("{} is not a valid size.", size_str);
        }

        if !size_str.is_ascii() {
            return err_box!("ASCII string is expected, but got {}", size_str);
        }

        let size_len = size_str
            .chars()
            .take_while(|c| char::is_ascii_digit(c) || ['.', 'e', 'E', '-', '+'].contains(c))
            .count();

        let (size, unit) = size_str.split_at(size_len);

        let unit = match unit.trim() {
            "K" | "KB" => Self::KB,
            "M" | "MB" => Self::MB,
            "G" | "GB" => Self::GB,
            "T" | "TB" => Self::TB,
            "P" | "PB" => Self::PB,
            "B" | "" => Self::B,
            _ => {
                return err_box!("only B, KB, MB, GB, TB, PB are supported: {}", size_str);
            }
        };

        match size.parse::<f64>() {
            Ok(n) if n >= 0.0 => Ok(ByteUnit((n * unit as f64) as u64)),
            _ => err_box!("invalid size string: {}", size_str),
        }
    }

    pub fn byte_to_string(bytes: u64) -> String {
        let mut value = bytes as f64;
        let mut index = 0;
        while value >= 1024.0 && index < UNITS.len() - 1 {
            value /= 1024.0;
            index += 1;
        }

        if index == 0 {
            format!("{}{}", bytes, UNITS[index])
        } else {
            format!("{:.1}{}", value, UNITS[index])
        }
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::byte_to_string(self.0))
    }
}
