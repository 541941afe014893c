use thiserror::Error;

pub type Result<T> = std::result::Result<T, MailboxError>;

/// Error kinds surfaced by the mailbox transport and everything built on it.
///
/// Transport errors are mapped into per-operation failures by the command
/// layer and the coordinator without aborting the whole sweep; see
/// `array::ArrayCoordinator::sweep` for which failures are slot-scoped and
/// which are fatal.
#[derive(Error, Debug)]
pub enum MailboxError {
    #[error("invalid argument: {0}")]
    InvalidArgs(String),

    #[error("cannot open device {path}: {source}")]
    DeviceOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("device does not support SCSI generic pass-through")]
    NotPassThroughCapable,

    #[error("ioctl failed: errno {errno}")]
    IoctlFailed { errno: i32 },

    #[error("mailbox sector is not safe to use: non-zero content observed at open time")]
    UnsafeSector,

    #[error("CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for MailboxError {
    fn from(err: std::io::Error) -> Self {
        MailboxError::IoctlFailed {
            errno: err.raw_os_error().unwrap_or(-1),
        }
    }
}
