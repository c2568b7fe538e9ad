// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reason codes carried on failure and termination callbacks.

use std::fmt;

/// Why an operation failed, or why a session ended.
///
/// A small closed enum with a stable machine-readable tag, the same shape
/// this codebase uses at its other external boundaries: usable both for
/// matching in tests and as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The HAL could not allocate resources for the request.
    NoResources,
    /// The request's arguments were rejected by the HAL.
    InvalidArgs,
    /// Catch-all transport/validation failure (e.g. wrong session kind).
    Other,
    /// `sendMessage` referenced a peer instance id with no known MAC.
    NoMatchSession,
    /// The session no longer exists (already terminated).
    SessionTerminated,
    /// Normal, intentional termination.
    Done,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoResources => "NO_RESOURCES",
            Self::InvalidArgs => "INVALID_ARGS",
            Self::Other => "OTHER",
            Self::NoMatchSession => "NO_MATCH_SESSION",
            Self::SessionTerminated => "SESSION_TERMINATED",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
