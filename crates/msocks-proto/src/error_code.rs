//! Failure reasons carried by FAILED frames

use serde::{Deserialize, Serialize};

/// Error codes for FAILED frames.
///
/// The codec carries the code as an opaque `u32`; this table only names the
/// values peers agree on. Extend by appending members, never reuse a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    /// Authentication rejected
    Auth = 0,
    /// SYN proposed a stream id that is already in use
    IdExists = 1,
    /// Upstream connect attempt failed
    ConnectFailed = 2,
}

impl ErrorCode {
    /// Numeric wire value
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Auth => "authentication failed",
            Self::IdExists => "stream id already exists",
            Self::ConnectFailed => "connect failed",
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        match value {
            0 => Ok(Self::Auth),
            1 => Ok(Self::IdExists),
            2 => Ok(Self::ConnectFailed),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
