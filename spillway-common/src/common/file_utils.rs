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

use crate::{try_err, CommonResult};
use std::fs;
use std::path::Path;

pub struct FileUtils;

impl FileUtils {
    pub fn delete_path<P: AsRef<Path>>(path: P, recursive: bool) -> CommonResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }

        if path.is_dir() {
            if recursive {
                try_err!(fs::remove_dir_all(path));
            } else {
                try_err!(fs::remove_dir(path));
            }
        } else {
            try_err!(fs::remove_file(path));
        }

        Ok(())
    }

    pub fn create_dir<P: AsRef<Path>>(path: P, recursive: bool) -> CommonResult<()> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(());
        }

        if recursive {
            try_err!(fs::create_dir_all(path));
        } else {
            try_err!(fs::create_dir(path));
        }

        Ok(())
    }

    pub fn create_parent_dir<P: AsRef<Path>>(path: P) -> CommonResult<()> {
        match path.as_ref().parent() {
            None => Ok(()),
            Some(parent) => Self::create_dir(parent, true),
        }
    }

    pub fn exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists()
    }

    // Size of a regular file; 0 when the file is absent, empty, or not a file.
    pub fn file_size<P: AsRef<Path>>(path: P) -> u64 {
        match fs::metadata(path.as_ref()) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        }
    }

    // Recursive byte size of everything under the path.
    pub fn dir_size<P: AsRef<Path>>(path: P) -> CommonResult<u64> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(0);
        }
        if path.is_file() {
            return Ok(Self::file_size(path));
        }

        let mut size = 0;
        for entry in try_err!(fs::read_dir(path)) {
            let entry = try_err!(entry);
            size += Self::dir_size(entry.path())?;
        }

        Ok(size)
    }

    pub fn write_bytes<P: AsRef<Path>>(path: P, data: &[u8]) -> CommonResult<()> {
        Self::create_parent_dir(path.as_ref())?;
        try_err!(fs::write(path.as_ref(), data));
        Ok(())
    }
}
