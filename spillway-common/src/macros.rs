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

// Create an error message carrying the thread, file and line it came from.
#[macro_export]
macro_rules! err_msg {
    ($e:expr) => ({
        let thread = $crate::common::thread_name();
        format!("[{}] ERROR: {}({}:{})", thread, $e, file!(), line!())
    });

    ($f:tt, $($arg:expr),+) => ({
        let thread = $crate::common::thread_name();
        format!("[{}] ERROR: {}({}:{})", thread, format!($f, $($arg),+), file!(), line!())
    });
}

// Convert an error (or a format string) into the caller's error type.
// 1. String error: err_box!("{}", "error")
// 2. Error error: err_box!(std::error::Error)
#[macro_export]
macro_rules! err_box {
    ($e:expr) => ({
        Err($crate::err_msg!($e).into())
    });

    ($f:tt, $($arg:expr),+) => ({
        $crate::err_box!(format!($f, $($arg),+))
    });
}

// Unified conversion error type.
#[macro_export]
macro_rules! try_err {
    ($expr:expr) => {{
        match $expr {
            Ok(r) => r,
            Err(e) => return $crate::err_box!(e),
        }
    }};
}

// Match a Result; on Err log a warning and return the given default.
#[macro_export]
macro_rules! try_log {
    ($expr:expr, $d:expr) => {{
        match $expr {
            Err(e) => {
                log::warn!("{}", $crate::err_msg!(e));
                $d
            }
            Ok(res) => res,
        }
    }};

    // Just record the error log and do nothing else.
    ($expr:expr) => {{
        if let Err(e) = &$expr {
            log::warn!("{}", e);
        }
        $expr
    }};
}

#[macro_export]
macro_rules! ternary {
    ($condition:expr, $true_expr:expr, $false_expr:expr) => {
        if $condition {
            $true_expr
        } else {
            $false_expr
        }
    };
}
