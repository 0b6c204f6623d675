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

use crate::common::LocalTime;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

// If log_dir = "stdout" or empty, the log is output to standard output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConf {
    pub level: String,
    pub log_dir: String,
    pub file_name: String,
    pub max_log_files: usize,
}

impl Default for LogConf {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            log_dir: Logger::TARGET_STDOUT.to_string(),
            file_name: "".to_string(),
            max_log_files: 10,
        }
    }
}

static INSTANCE: OnceCell<Logger> = OnceCell::new();

#[allow(unused)]
#[derive(Debug)]
pub struct Logger {
    inner: Vec<WorkerGuard>,
}

impl Logger {
    pub const TARGET_STDOUT: &'static str = "stdout";

    pub const TARGET_STDERR: &'static str = "stderr";

    pub fn new(conf: LogConf) -> Self {
        let level = Level::from_str(&conf.level).unwrap_or(Level::INFO);
        let (writer, guard) = Self::create_writer(&conf);

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_timer(LocalTime::new())
            .with_writer(writer);

        // Tests may race to install the global subscriber, keep the first one.
        let _ = subscriber.try_init();

        Logger { inner: vec![guard] }
    }

    pub fn default() {
        Self::init(LogConf::default())
    }

    pub fn init(conf: LogConf) {
        INSTANCE.get_or_init(|| Self::new(conf));
    }

    pub fn create_writer(conf: &LogConf) -> (NonBlocking, WorkerGuard) {
        let file_name = if conf.file_name.is_empty() {
            "spillway"
        } else {
            &conf.file_name
        };

        if conf.log_dir.to_ascii_lowercase() == Self::TARGET_STDOUT || conf.log_dir.is_empty() {
            tracing_appender::non_blocking(io::stdout())
        } else if conf.log_dir.to_ascii_lowercase() == Self::TARGET_STDERR {
            tracing_appender::non_blocking(io::stderr())
        } else {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(file_name)
                .max_log_files(conf.max_log_files)
                .build(&conf.log_dir)
                .expect("initializing rolling file appender failed");
            tracing_appender::non_blocking(appender)
        }
    }
}
