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
use std::fmt::{Display, Formatter};

// The remote tier shuffle files are migrated to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStorageType {
    Hdfs,
    S3,
    LocalFs,
}

impl RemoteStorageType {
    pub fn from_str(s: impl AsRef<str>) -> CommonResult<Self> {
        match s.as_ref().trim().to_lowercase().as_str() {
            "hdfs" => Ok(RemoteStorageType::Hdfs),
            "s3" | "s3a" => Ok(RemoteStorageType::S3),
            "file" | "localfs" => Ok(RemoteStorageType::LocalFs),
            other => err_box!("unknown remote storage type: {}", other),
        }
    }

    // URI scheme of the remote base path.
    pub fn scheme(&self) -> &'static str {
        match self {
            RemoteStorageType::Hdfs => "hdfs",
            RemoteStorageType::S3 => "s3",
            RemoteStorageType::LocalFs => "file",
        }
    }
}

impl Display for RemoteStorageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.scheme())
    }
}

#[cfg(test)]
mod tests {
    use crate::state::RemoteStorageType;

    #[test]
    fn parse() {
        assert_eq!(
            RemoteStorageType::from_str("HDFS").unwrap(),
            RemoteStorageType::Hdfs
        );
        assert_eq!(
            RemoteStorageType::from_str("s3").unwrap(),
            RemoteStorageType::S3
        );
        assert!(RemoteStorageType::from_str("").is_err());
        assert!(RemoteStorageType::from_str("tape").is_err());
    }
}
