//! OpenNSL status codes and KNET error handling.
//!
//! This module converts raw `opennsl_error_t` return codes into Rust's
//! Result type, preserving the message text `opennsl_errmsg()` would have
//! produced so that callers can surface the exact failing call.

use std::fmt;
use thiserror::Error;

/// OpenNSL status codes matching `opennsl_error_t` in the SDK headers.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpennslStatus {
    None = 0,
    Internal = -1,
    Memory = -2,
    Unit = -3,
    Param = -4,
    Empty = -5,
    Full = -6,
    NotFound = -7,
    Exists = -8,
    Timeout = -9,
    Busy = -10,
    Fail = -11,
    Disabled = -12,
    BadId = -13,
    Resource = -14,
    Config = -15,
    Unavail = -16,
    Init = -17,
    Port = -18,
}

impl OpennslStatus {
    /// Creates a status from a raw SDK return code.
    ///
    /// Unknown negative codes collapse to `Fail`, matching how the SDK's
    /// own `opennsl_errmsg()` treats out-of-range values.
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => OpennslStatus::None,
            -1 => OpennslStatus::Internal,
            -2 => OpennslStatus::Memory,
            -3 => OpennslStatus::Unit,
            -4 => OpennslStatus::Param,
            -5 => OpennslStatus::Empty,
            -6 => OpennslStatus::Full,
            -7 => OpennslStatus::NotFound,
            -8 => OpennslStatus::Exists,
            -9 => OpennslStatus::Timeout,
            -10 => OpennslStatus::Busy,
            -11 => OpennslStatus::Fail,
            -12 => OpennslStatus::Disabled,
            -13 => OpennslStatus::BadId,
            -14 => OpennslStatus::Resource,
            -15 => OpennslStatus::Config,
            -16 => OpennslStatus::Unavail,
            -17 => OpennslStatus::Init,
            -18 => OpennslStatus::Port,
            _ => OpennslStatus::Fail,
        }
    }

    /// Returns the raw `opennsl_error_t` value.
    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == OpennslStatus::None
    }

    /// Returns true if the entry the call named does not exist on the
    /// device (`OPENNSL_E_NOT_FOUND` / `OPENNSL_E_BADID`).
    pub fn is_not_found(&self) -> bool {
        matches!(self, OpennslStatus::NotFound | OpennslStatus::BadId)
    }

    /// Converts a call outcome to a Result, naming the failing call.
    pub fn into_result(self, call: &'static str) -> KnetResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(KnetError::Status { call, status: self })
        }
    }

    /// The message text `opennsl_errmsg()` renders for this status.
    pub fn errmsg(&self) -> &'static str {
        match self {
            OpennslStatus::None => "Ok",
            OpennslStatus::Internal => "Internal error",
            OpennslStatus::Memory => "Out of memory",
            OpennslStatus::Unit => "Invalid unit",
            OpennslStatus::Param => "Invalid parameter",
            OpennslStatus::Empty => "Table empty",
            OpennslStatus::Full => "Table full",
            OpennslStatus::NotFound => "Entry not found",
            OpennslStatus::Exists => "Entry exists",
            OpennslStatus::Timeout => "Operation timed out",
            OpennslStatus::Busy => "Device busy",
            OpennslStatus::Fail => "Operation failed",
            OpennslStatus::Disabled => "Operation disabled",
            OpennslStatus::BadId => "Invalid identifier",
            OpennslStatus::Resource => "No resources for operation",
            OpennslStatus::Config => "Invalid configuration",
            OpennslStatus::Unavail => "Feature unavailable",
            OpennslStatus::Init => "Feature not initialized",
            OpennslStatus::Port => "Invalid port",
        }
    }
}

impl fmt::Display for OpennslStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errmsg())
    }
}

/// Error type for KNET operations.
#[derive(Debug, Clone, Error)]
pub enum KnetError {
    /// A native SDK call returned a non-success status.
    #[error("{call}() failed {status}")]
    Status {
        call: &'static str,
        status: OpennslStatus,
    },

    /// Request data cannot be represented in the native descriptor.
    /// Detected before any hardware call is made.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },
}

impl KnetError {
    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        KnetError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Returns the underlying SDK status if this is a Status error.
    pub fn status(&self) -> Option<OpennslStatus> {
        match self {
            KnetError::Status { status, .. } => Some(*status),
            KnetError::InvalidParameter { .. } => None,
        }
    }

    /// Returns true if the failure means the named entry does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status().is_some_and(|s| s.is_not_found())
    }
}

/// Result type for KNET operations.
pub type KnetResult<T> = Result<T, KnetError>;

/// Extension trait for converting raw SDK return codes.
pub trait OpennslStatusExt {
    /// Converts a raw return code to a Result, naming the failing call.
    fn to_result(self, call: &'static str) -> KnetResult<()>;
}

impl OpennslStatusExt for i32 {
    fn to_result(self, call: &'static str) -> KnetResult<()> {
        OpennslStatus::from_raw(self).into_result(call)
    }
}
