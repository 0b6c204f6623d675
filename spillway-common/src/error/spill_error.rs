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

use crate::error::{ErrorImpl, StringError};
use crate::CommonError;
use std::io;
use thiserror::Error;

// Error categories of the upload core.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    IO,
    InvalidConf,
    Ufs,
    Common,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::IO => "io",
            ErrorKind::InvalidConf => "invalid_conf",
            ErrorKind::Ufs => "ufs",
            ErrorKind::Common => "common",
        }
    }
}

#[derive(Debug, Error)]
pub enum SpillError {
    // io error.
    #[error("{0}")]
    IO(ErrorImpl<io::Error>),

    // A configuration value is missing or out of range; construction refuses to proceed.
    #[error("{0}")]
    InvalidConf(ErrorImpl<StringError>),

    // Remote storage error.
    #[error("{0}")]
    Ufs(ErrorImpl<StringError>),

    // Other errors that are not defined.
    #[error("{0}")]
    Common(ErrorImpl<StringError>),
}

impl SpillError {
    pub fn common<T: AsRef<str>>(error: T) -> Self {
        Self::Common(ErrorImpl::with_source(error.as_ref().into()))
    }

    pub fn io(error: io::Error) -> Self {
        Self::IO(ErrorImpl::with_source(error))
    }

    pub fn invalid_conf(msg: impl AsRef<str>) -> Self {
        let msg = format!("Invalid configuration: {}", msg.as_ref());
        Self::InvalidConf(ErrorImpl::with_source(msg.into()))
    }

    pub fn ufs(msg: impl AsRef<str>) -> Self {
        Self::Ufs(ErrorImpl::with_source(msg.as_ref().into()))
    }

    pub fn ctx(self, ctx: impl Into<String>) -> Self {
        match self {
            SpillError::IO(e) => SpillError::IO(e.ctx(ctx)),
            SpillError::InvalidConf(e) => SpillError::InvalidConf(e.ctx(ctx)),
            SpillError::Ufs(e) => SpillError::Ufs(e.ctx(ctx)),
            SpillError::Common(e) => SpillError::Common(e.ctx(ctx)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SpillError::IO(_) => ErrorKind::IO,
            SpillError::InvalidConf(_) => ErrorKind::InvalidConf,
            SpillError::Ufs(_) => ErrorKind::Ufs,
            SpillError::Common(_) => ErrorKind::Common,
        }
    }
}

impl From<String> for SpillError {
    fn from(value: String) -> Self {
        SpillError::Common(ErrorImpl::with_source(value.into()))
    }
}

impl From<CommonError> for SpillError {
    fn from(value: CommonError) -> Self {
        SpillError::Common(ErrorImpl::with_source(value.into()))
    }
}

impl From<io::Error> for SpillError {
    fn from(value: io::Error) -> Self {
        Self::IO(ErrorImpl::with_source(value))
    }
}

impl From<regex::Error> for SpillError {
    fn from(value: regex::Error) -> Self {
        Self::Common(ErrorImpl::with_source(value.to_string().into()))
    }
}

impl From<toml::de::Error> for SpillError {
    fn from(value: toml::de::Error) -> Self {
        Self::invalid_conf(value.to_string())
    }
}
