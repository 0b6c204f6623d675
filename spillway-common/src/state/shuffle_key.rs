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

/// Identifies one shuffle of one application. Rendered as "<app_id>/<shuffle_id>"
/// in paths and log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShuffleKey {
    pub app_id: String,
    pub shuffle_id: u32,
}

impl ShuffleKey {
    pub fn new(app_id: impl Into<String>, shuffle_id: u32) -> Self {
        Self {
            app_id: app_id.into(),
            shuffle_id,
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.app_id, self.shuffle_id)
    }

    pub fn from_str(s: impl AsRef<str>) -> CommonResult<Self> {
        let s = s.as_ref();
        let (app_id, shuffle_id) = match s.rsplit_once('/') {
            Some(v) => v,
            None => return err_box!("invalid shuffle key: {}", s),
        };

        if app_id.is_empty() {
            return err_box!("invalid shuffle key: {}", s);
        }

        match shuffle_id.parse::<u32>() {
            Ok(id) => Ok(Self::new(app_id, id)),
            Err(_) => err_box!("invalid shuffle id in key: {}", s),
        }
    }
}

impl Display for ShuffleKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.app_id, self.shuffle_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::state::ShuffleKey;
    use crate::CommonResult;

    #[test]
    fn parse() -> CommonResult<()> {
        let key = ShuffleKey::from_str("app-1/1")?;
        assert_eq!(key, ShuffleKey::new("app-1", 1));
        assert_eq!(key.path(), "app-1/1");

        assert!(ShuffleKey::from_str("app-1").is_err());
        assert!(ShuffleKey::from_str("/1").is_err());
        assert!(ShuffleKey::from_str("app-1/x").is_err());

        Ok(())
    }
}
