//! Error and result-code types.
//!
//! Every failure surfaced by discovery or session setup is one [`Error`] variant.
//! Each variant also maps onto a small integer [`ResultCode`] so callers that speak
//! in status codes (process exit codes, FFI shims) get a stable number.

use thiserror::Error;

/// Errors produced by enumeration and session initialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The OS refused to hand out a HID device-set handle.
    #[error("unable to open the HID device collection")]
    InvalidCollections,

    /// A device path does not fit the fixed path capacity.
    #[error("device path needs {required} code units but capacity is {capacity}")]
    InvalidPathSize { required: usize, capacity: usize },

    /// The scoped path buffer could not be allocated.
    #[error("failed to allocate a {len}-unit path buffer")]
    StackOverflow { len: usize },

    /// More controllers were found than the caller supplied slots for.
    ///
    /// The first `capacity` slots are still valid descriptors.
    #[error("found {found} controllers but only {capacity} slots were supplied")]
    OutOfBounds { found: usize, capacity: usize },

    /// A precondition on the call arguments was violated.
    #[error("invalid arguments: {0}")]
    InvalidArgs(&'static str),

    /// The device could not be opened (or stopped answering).
    #[error("device disconnected")]
    DeviceDisconnected,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Integer status codes. `Success` is zero; failures follow in a fixed order.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success = 0,
    InvalidCollections = 1,
    InvalidPathSize = 2,
    StackOverflow = 3,
    OutOfBounds = 4,
    InvalidArgs = 5,
    DeviceDisconnected = 6,
}

impl Error {
    /// Status code for this error.
    pub fn code(&self) -> ResultCode {
        match self {
            Error::InvalidCollections => ResultCode::InvalidCollections,
            Error::InvalidPathSize { .. } => ResultCode::InvalidPathSize,
            Error::StackOverflow { .. } => ResultCode::StackOverflow,
            Error::OutOfBounds { .. } => ResultCode::OutOfBounds,
            Error::InvalidArgs(_) => ResultCode::InvalidArgs,
            Error::DeviceDisconnected => ResultCode::DeviceDisconnected,
        }
    }
}

impl ResultCode {
    /// Collapse a `Result` into its status code.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ResultCode::Success,
            Err(e) => e.code(),
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(i32::from(ResultCode::Success), 0);
        assert_eq!(i32::from(Error::InvalidCollections.code()), 1);
        assert_eq!(i32::from(Error::DeviceDisconnected.code()), 6);
        assert_eq!(
            Error::OutOfBounds {
                found: 3,
                capacity: 2
            }
            .code(),
            ResultCode::OutOfBounds
        );
    }

    #[test]
    fn result_code_of_ok_is_success() {
        let ok: Result<usize> = Ok(4);
        let err: Result<usize> = Err(Error::InvalidArgs("empty path"));
        assert_eq!(ResultCode::of(&ok), ResultCode::Success);
        assert_eq!(ResultCode::of(&err), ResultCode::InvalidArgs);
    }

    #[test]
    fn messages_carry_detail() {
        let e = Error::InvalidPathSize {
            required: 300,
            capacity: 260,
        };
        assert_eq!(
            e.to_string(),
            "device path needs 300 code units but capacity is 260"
        );
    }
}
