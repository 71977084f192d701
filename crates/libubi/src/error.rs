//! Error types for UBI control operations

use nix::errno::Errno;
use std::io;
use thiserror::Error;

/// UBI control interface errors
#[derive(Debug, Error)]
pub enum LibUbiError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// UBI sysfs interface is missing (module not loaded or kernel too old)
    #[error("UBI is not present in the system ({0} not found)")]
    UbiNotPresent(String),

    /// Kernel UBI sysfs ABI version is not the one this library speaks
    #[error("this library was made for UBI version {expected}, but UBI version {found} is detected")]
    UnsupportedVersion { expected: u32, found: u32 },

    /// UBI device not found
    #[error("UBI device {0} not found")]
    DeviceNotFound(u32),

    /// MTD device not found
    #[error("MTD device {0} not found")]
    MtdNotFound(u32),

    /// Control node path is not a character device
    #[error("'{0}' is not a character device")]
    NotCharDevice(String),

    /// Control node does not match the UBI control device numbers
    #[error("'{path}' ({found}) is not the UBI control device ({expected})")]
    NotControlNode {
        path: String,
        found: String,
        expected: String,
    },

    /// Failed to open a device node
    #[error("Cannot open '{path}': {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The attach ioctl was rejected by the kernel
    #[error("UBI_IOCATT ioctl on '{path}' failed: {source}")]
    Ioctl {
        path: String,
        #[source]
        source: Errno,
    },

    /// Failed to read sysfs attribute
    #[error("Failed to read sysfs attribute '{path}': {source}")]
    SysfsRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse sysfs attribute
    #[error("Failed to parse sysfs attribute '{path}': {value}")]
    SysfsParse { path: String, value: String },

    /// Value does not fit the kernel's signed 32-bit request fields
    #[error("Invalid request field '{name}': {value} is out of range")]
    InvalidRequest { name: &'static str, value: u32 },

    /// The kernel wrote back a value the request field cannot hold
    #[error("Invalid reply field '{name}': kernel returned {value}")]
    InvalidReply { name: &'static str, value: i32 },
}

impl LibUbiError {
    /// The OS error number behind this error, if there is one
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Io(e) | Self::OpenFailed { source: e, .. } | Self::SysfsRead { source: e, .. } => {
                e.raw_os_error().map(Errno::from_raw)
            }
            Self::Ioctl { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Result type for UBI control operations
pub type Result<T> = std::result::Result<T, LibUbiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno() {
        let err = LibUbiError::Ioctl {
            path: "/dev/ubi_ctrl".into(),
            source: Errno::EEXIST,
        };
        assert_eq!(err.errno(), Some(Errno::EEXIST));

        let err = LibUbiError::OpenFailed {
            path: "/dev/ubi_ctrl".into(),
            source: io::Error::from_raw_os_error(Errno::ENOENT as i32),
        };
        assert_eq!(err.errno(), Some(Errno::ENOENT));

        assert_eq!(LibUbiError::DeviceNotFound(0).errno(), None);
        assert_eq!(
            LibUbiError::InvalidReply {
                name: "ubi_num",
                value: -1
            }
            .errno(),
            None
        );
    }
}
