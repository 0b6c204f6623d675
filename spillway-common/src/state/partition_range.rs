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

use crate::{err_box, CommonResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Inclusive partition id range, the on-disk directory name is "<start>-<end>".
/// Single-partition directories use start == end. Ranges are totally ordered by
/// start so a sorted container of non-overlapping ranges stays consistent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionRange {
    start: u32,
    end: u32,
}

impl PartitionRange {
    pub fn new(start: u32, end: u32) -> CommonResult<Self> {
        if end < start {
            return err_box!("invalid partition range [{}, {}]", start, end);
        }
        Ok(Self { start, end })
    }

    pub fn single(partition: u32) -> Self {
        Self {
            start: partition,
            end: partition,
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn overlaps(&self, other: &PartitionRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    // Directory name form, e.g. "3-3".
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    pub fn from_dir_name(name: impl AsRef<str>) -> CommonResult<Self> {
        let name = name.as_ref();
        let (start, end) = match name.split_once('-') {
            Some(v) => v,
            None => return err_box!("invalid partition dir name: {}", name),
        };

        match (start.parse::<u32>(), end.parse::<u32>()) {
            (Ok(start), Ok(end)) => Self::new(start, end),
            _ => err_box!("invalid partition dir name: {}", name),
        }
    }
}

impl PartialOrd for PartitionRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartitionRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start).then(self.end.cmp(&other.end))
    }
}

impl Display for PartitionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use crate::state::PartitionRange;
    use crate::CommonResult;

    #[test]
    fn parse_and_order() -> CommonResult<()> {
        let range = PartitionRange::from_dir_name("2-2")?;
        assert_eq!(range, PartitionRange::single(2));
        assert_eq!(range.dir_name(), "2-2");

        assert!(PartitionRange::new(3, 1).is_err());
        assert!(PartitionRange::from_dir_name("abc").is_err());

        let mut vec = vec![
            PartitionRange::single(5),
            PartitionRange::single(1),
            PartitionRange::new(2, 4)?,
        ];
        vec.sort();
        assert_eq!(vec[0], PartitionRange::single(1));
        assert_eq!(vec[1], PartitionRange::new(2, 4)?);

        assert!(vec[1].overlaps(&PartitionRange::single(3)));
        assert!(!vec[1].overlaps(&PartitionRange::single(5)));

        Ok(())
    }
}
