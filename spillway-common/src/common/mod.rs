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

mod byte_unit;
pub use self::byte_unit::ByteUnit;

mod duration_unit;
pub use self::duration_unit::DurationUnit;

mod file_utils;
pub use self::file_utils::FileUtils;

mod local_time;
pub use self::local_time::LocalTime;

mod logger;
pub use self::logger::{LogConf, Logger};

mod metrics;
pub use self::metrics::Metrics;

mod time_spent;
pub use self::time_spent::TimeSpent;

pub fn thread_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("unknown")
        .to_string()
}
