// Copyright 2025 Fernando Borretti
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
use std::fmt::Display;
use std::fmt::Formatter;

/// The broad category of an error, so callers can branch on it without
/// parsing messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// No card is stored under the given slug.
    NotFound,
    /// A value was out of range or a document had the wrong shape.
    Validation,
    /// The backing store failed.
    Storage,
    /// A value could not be encoded or decoded.
    Format,
    Other,
}

impl ErrorKind {
    /// The process exit status for a failure of this kind. 2 is left to clap
    /// for usage errors.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Other => 1,
            ErrorKind::NotFound => 3,
            ErrorKind::Validation => 4,
            ErrorKind::Storage => 5,
            ErrorKind::Format => 6,
        }
    }
}

#[derive(Debug)]
pub struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

pub type Fallible<T> = Result<T, ErrorReport>;

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, message)
    }

    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(slug: &str) -> Self {
        Self::with_kind(
            ErrorKind::NotFound,
            format!("card with slug \"{slug}\" not found"),
        )
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Validation, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        Self::with_kind(ErrorKind::Storage, format!("database error: {value}"))
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        Self::with_kind(ErrorKind::Storage, format!("I/O error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        Self::with_kind(ErrorKind::Format, format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        Self::with_kind(ErrorKind::Format, format!("TOML error: {value}"))
    }
}
