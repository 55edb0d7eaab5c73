//! # runcmd Process Input and Captured Output (`common::process::output`)
//!
//! File: cli/src/common/process/output.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! `ProcessInput` is what `RunCommand::run_with_input` can feed to a child:
//! text (sent as UTF-8) or raw bytes. `Captured` is what comes back on stdout
//! and stderr: decoded text, or raw bytes when the command runs in binary mode.
//!
use super::options::{OutputMode, TextEncoding};
use std::borrow::Cow;

/// Stderr marker recorded when the executable cannot be found.
pub const FILE_NOT_FOUND: &str = "file not found";

/// Data written to the child's standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessInput {
    Text(String),
    Bytes(Vec<u8>),
}

impl ProcessInput {
    /// The bytes actually written to the pipe. Text is encoded as UTF-8.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ProcessInput::Text(text) => text.into_bytes(),
            ProcessInput::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for ProcessInput {
    fn from(text: String) -> Self {
        ProcessInput::Text(text)
    }
}

impl From<&str> for ProcessInput {
    fn from(text: &str) -> Self {
        ProcessInput::Text(text.to_string())
    }
}

impl From<Vec<u8>> for ProcessInput {
    fn from(bytes: Vec<u8>) -> Self {
        ProcessInput::Bytes(bytes)
    }
}

impl From<&[u8]> for ProcessInput {
    fn from(bytes: &[u8]) -> Self {
        ProcessInput::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for ProcessInput {
    fn from(bytes: &[u8; N]) -> Self {
        ProcessInput::Bytes(bytes.to_vec())
    }
}

/// A captured stdout or stderr stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Text(String),
    Bytes(Vec<u8>),
}

impl Captured {
    /// Decodes raw pipe contents according to `mode`.
    ///
    /// Returns `None` only for strict UTF-8 decoding of invalid data.
    pub fn decode(raw: Vec<u8>, mode: OutputMode) -> Option<Self> {
        match mode {
            OutputMode::Binary => Some(Captured::Bytes(raw)),
            OutputMode::Text(encoding) => encoding.decode(raw).map(Captured::Text),
        }
    }

    /// An empty stream of the kind `mode` produces.
    pub fn empty(mode: OutputMode) -> Self {
        Self::marker("", mode)
    }

    /// `text` as text, or as its UTF-8 bytes in binary mode.
    pub(crate) fn marker(text: &str, mode: OutputMode) -> Self {
        match mode {
            OutputMode::Binary => Captured::Bytes(text.as_bytes().to_vec()),
            OutputMode::Text(_) => Captured::Text(text.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Captured::Text(text) => text.is_empty(),
            Captured::Bytes(bytes) => bytes.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Captured::Text(text) => Some(text),
            Captured::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Captured::Text(text) => text.as_bytes(),
            Captured::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Captured::Text(text) => text.into_bytes(),
            Captured::Bytes(bytes) => bytes,
        }
    }

    /// Human-readable form used in traces and error messages: text verbatim,
    /// bytes hex-encoded.
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Captured::Text(text) => Cow::Borrowed(text),
            Captured::Bytes(bytes) => Cow::Owned(hex::encode(bytes)),
        }
    }
}

impl TextEncoding {
    /// Decodes `raw`; `None` when strict UTF-8 decoding fails.
    pub fn decode(self, raw: Vec<u8>) -> Option<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(raw).ok(),
            TextEncoding::Utf8Lossy => Some(match String::from_utf8(raw) {
                Ok(text) => text,
                Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
            }),
            // Every byte maps to the code point of the same value.
            TextEncoding::Latin1 => Some(raw.into_iter().map(char::from).collect()),
        }
    }
}
