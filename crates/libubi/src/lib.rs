//! libubi - Linux UBI control interface
//!
//! This crate provides access to the UBI (Unsorted Block Images) subsystem of
//! the Linux kernel from user space. It reads the UBI and MTD sysfs classes
//! and issues requests on the UBI control device (`/dev/ubi_ctrl`).
//!
//! The flash management itself (scanning, wear-levelling, bad block handling)
//! is done by the kernel; this crate only speaks its user-space ABI.
//!
//! # Example
//!
//! ```ignore
//! use libubi::{AttachRequest, DevNum, LibUbi, UbiControl};
//! use std::path::Path;
//!
//! let ubi = LibUbi::open()?;
//! if !ubi.info()?.supports_attach() {
//!     return Err("kernel cannot attach MTD devices".into());
//! }
//!
//! // Attach mtd0 as ubi3
//! let req = AttachRequest::new(0).with_dev_num(DevNum::Fixed(3));
//! let dev_num = ubi.attach_mtd(Path::new("/dev/ubi_ctrl"), &req)?;
//! let info = ubi.dev_info(dev_num)?;
//! println!("{} LEBs available", info.avail_lebs);
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with UBI support (`CONFIG_MTD_UBI`)
//! - sysfs mounted at `/sys`
//! - Read access to `/dev/ubi_ctrl` and `CAP_SYS_RESOURCE` for attaching
//!
//! # Device Discovery
//!
//! ```bash
//! cat /sys/class/ubi/version
//! cat /sys/class/misc/ubi_ctrl/dev
//! ls /sys/class/ubi/
//! cat /proc/mtd
//! ```

pub mod control;
pub mod device;
pub mod error;
mod sysfs;
pub mod types;

// Re-exports
pub use control::UbiControl;
pub use device::LibUbi;
pub use error::{LibUbiError, Result};
pub use nix::errno::Errno;
pub use types::{
    AttachRequest, DevNode, DevNum, MtdInfo, UbiDevInfo, UbiInfo, UBI_DEV_NUM_AUTO,
    UBI_SYSFS_VERSION,
};
