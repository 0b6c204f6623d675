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

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// Wraps a source error together with the chain of code locations it passed
/// through, so a log line is enough to find where a failure came from.
pub struct ErrorImpl<E> {
    // Original error type
    pub source: E,

    // Context lines, usually "(file:line)" markers added on the way up.
    pub ctx: Vec<String>,
}

impl<E> ErrorImpl<E>
where
    E: Error,
{
    pub fn with_source(source: E) -> Self {
        Self {
            source,
            ctx: vec![],
        }
    }

    pub fn ctx(mut self, ctx: impl Into<String>) -> Self {
        self.ctx.push(ctx.into());
        self
    }
}

impl<E> Display for ErrorImpl<E>
where
    E: Error,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.ctx.is_empty() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}: {}", self.source, self.ctx.join("\n"))
        }
    }
}

impl<E> Debug for ErrorImpl<E>
where
    E: Error,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]{}", self.ctx.join("\n"), self.source)
    }
}

impl<E> Deref for ErrorImpl<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.source
    }
}
