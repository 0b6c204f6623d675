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

mod disk_item;
pub use self::disk_item::DiskItem;

mod disk_metadata;
pub use self::disk_metadata::{DiskMetadata, ShuffleMeta};

mod disk_sweeper;
pub use self::disk_sweeper::DiskSweeper;

mod shuffle_file_info;
pub use self::shuffle_file_info::ShuffleFileInfo;
