//! Linux UBI control interface implementation
//!
//! Everything here goes through the user-space ABI of the kernel: sysfs
//! attributes under `class/ubi` and `class/mtd`, and the `UBI_IOCATT` ioctl
//! on the UBI control node.

use crate::control::UbiControl;
use crate::error::{LibUbiError, Result};
use crate::sysfs::{self, UbiEntry};
use crate::types::{
    AttachRequest, DevNode, DevNum, MtdInfo, UbiDevInfo, UbiInfo, UBI_DEV_NUM_AUTO,
    UBI_SYSFS_VERSION,
};
use log::{debug, info};
use nix::sys::stat::{major, minor};
use std::fs::File;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Sysfs mount point
const SYSFS_ROOT: &str = "/sys";

/// UBI class directory, relative to the sysfs root
const SYSFS_UBI: &str = "class/ubi";

/// Control device numbers, relative to the sysfs root
const SYSFS_CTRL_DEV: &str = "class/misc/ubi_ctrl/dev";

/// MTD class directory, relative to the sysfs root
const SYSFS_MTD: &str = "class/mtd";

/// Sysfs attribute names
mod attr {
    pub const VERSION: &str = "version";

    // ubiN
    pub const DEV: &str = "dev";
    pub const AVAIL_EBS: &str = "avail_eraseblocks";
    pub const TOTAL_EBS: &str = "total_eraseblocks";
    pub const BAD_COUNT: &str = "bad_peb_count";
    pub const EB_SIZE: &str = "eraseblock_size";
    pub const BAD_RSVD: &str = "reserved_for_bad";
    pub const MAX_EC: &str = "max_ec";
    pub const MAX_VOLS: &str = "max_vol_count";
    pub const MIN_IO_SIZE: &str = "min_io_size";
    pub const MTD_NUM: &str = "mtd_num";

    // mtdN
    pub const MTD_NAME: &str = "name";
    pub const MTD_TYPE: &str = "type";
    pub const MTD_SIZE: &str = "size";
    pub const MTD_ERASESIZE: &str = "erasesize";
    pub const MTD_WRITESIZE: &str = "writesize";
}

/// UBI control device ioctls (mtd/ubi-user.h)
mod ioctl {
    const UBI_CTRL_IOC_MAGIC: u8 = b'o';
    const UBI_IOCATT_NR: u8 = 64;

    /// Matches struct ubi_attach_req
    #[repr(C)]
    #[derive(Debug, Default)]
    pub struct UbiAttachReq {
        pub ubi_num: i32,
        pub mtd_num: i32,
        pub vid_hdr_offset: i32,
        pub padding: [i8; 12],
    }

    // UBI_IOCATT = _IOW('o', 64, struct ubi_attach_req)
    nix::ioctl_write_ptr!(ubi_ioc_att, UBI_CTRL_IOC_MAGIC, UBI_IOCATT_NR, UbiAttachReq);
}

/// Handle to the kernel UBI subsystem
///
/// Opening the handle only verifies that UBI is present and speaks the
/// expected sysfs version; nothing is kept open between calls.
///
/// # Example
///
/// ```ignore
/// use libubi::{AttachRequest, LibUbi, UbiControl};
///
/// let ubi = LibUbi::open()?;
/// let dev_num = ubi.attach_mtd(Path::new("/dev/ubi_ctrl"), &AttachRequest::new(0))?;
/// let info = ubi.dev_info(dev_num)?;
/// println!("ubi{}: {} LEBs of {} bytes", dev_num, info.total_lebs, info.leb_size);
/// ```
#[derive(Debug, Clone)]
pub struct LibUbi {
    /// Sysfs mount point
    sysfs: PathBuf,
}

impl LibUbi {
    /// Open the UBI subsystem through `/sys`
    pub fn open() -> Result<Self> {
        Self::open_at(SYSFS_ROOT)
    }

    /// Open the UBI subsystem through a sysfs tree mounted at `root`
    ///
    /// # Errors
    /// Returns an error if:
    /// - `class/ubi/version` does not exist (UBI not loaded)
    /// - the version is not the one this library understands
    pub fn open_at(root: impl AsRef<Path>) -> Result<Self> {
        let lib = Self {
            sysfs: root.as_ref().to_path_buf(),
        };

        let version_path = lib.ubi_dir().join(attr::VERSION);
        if !version_path.exists() {
            return Err(LibUbiError::UbiNotPresent(
                version_path.display().to_string(),
            ));
        }

        let version = sysfs::read_u32(&version_path)?;
        if version != UBI_SYSFS_VERSION {
            return Err(LibUbiError::UnsupportedVersion {
                expected: UBI_SYSFS_VERSION,
                found: version,
            });
        }

        debug!(
            "UBI sysfs version {} found under {}",
            version,
            lib.sysfs.display()
        );
        Ok(lib)
    }

    /// Sysfs mount point this handle reads from
    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs
    }

    fn ubi_dir(&self) -> PathBuf {
        self.sysfs.join(SYSFS_UBI)
    }

    fn dev_dir(&self, dev_num: u32) -> PathBuf {
        self.ubi_dir().join(format!("ubi{}", dev_num))
    }

    /// Control device numbers, `None` on kernels without a control device
    fn ctrl_dev(&self) -> Result<Option<DevNode>> {
        let path = self.sysfs.join(SYSFS_CTRL_DEV);
        match sysfs::read_string(&path) {
            Ok(value) => parse_dev_node(&path, value).map(Some),
            Err(LibUbiError::SysfsRead { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                debug!("No UBI control device ({} missing)", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Check that `node` is the UBI control character device
    fn check_ctrl_node(&self, node: &Path) -> Result<()> {
        let path = node.display().to_string();
        let meta = std::fs::metadata(node).map_err(|e| LibUbiError::OpenFailed {
            path: path.clone(),
            source: e,
        })?;

        if !meta.file_type().is_char_device() {
            return Err(LibUbiError::NotCharDevice(path));
        }

        let found = DevNode {
            major: major(meta.rdev()) as u32,
            minor: minor(meta.rdev()) as u32,
        };
        match self.ctrl_dev()? {
            Some(expected) if expected != found => Err(LibUbiError::NotControlNode {
                path,
                found: found.to_string(),
                expected: expected.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn parse_dev_node(path: &Path, value: String) -> Result<DevNode> {
    value.parse().map_err(|_| LibUbiError::SysfsParse {
        path: path.display().to_string(),
        value,
    })
}

fn request_field(name: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| LibUbiError::InvalidRequest { name, value })
}

fn reply_field(name: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| LibUbiError::InvalidReply { name, value })
}

impl UbiControl for LibUbi {
    fn info(&self) -> Result<UbiInfo> {
        let ctrl_dev = self.ctrl_dev()?;

        let devices: Vec<u32> = sysfs::scan_ubi_class(&self.ubi_dir())?
            .into_iter()
            .filter_map(|e| match e {
                UbiEntry::Device(n) => Some(n),
                UbiEntry::Volume { .. } => None,
            })
            .collect();

        let version = sysfs::read_u32(&self.ubi_dir().join(attr::VERSION))?;

        debug!("UBI devices present: {:?}", devices);
        Ok(UbiInfo {
            version,
            ctrl_dev,
            dev_count: devices.len() as u32,
            lowest_dev_num: devices.iter().copied().min(),
            highest_dev_num: devices.iter().copied().max(),
        })
    }

    fn attach_mtd(&self, node: &Path, req: &AttachRequest) -> Result<u32> {
        let ubi_num = match req.dev_num {
            DevNum::Auto => UBI_DEV_NUM_AUTO,
            DevNum::Fixed(n) => request_field("dev_num", n)?,
        };
        let mut raw = ioctl::UbiAttachReq {
            ubi_num,
            mtd_num: request_field("mtd_num", req.mtd_num)?,
            vid_hdr_offset: request_field("vid_hdr_offset", req.vid_hdr_offset)?,
            ..Default::default()
        };

        self.check_ctrl_node(node)?;

        let path = node.display().to_string();
        let file = File::open(node).map_err(|e| LibUbiError::OpenFailed {
            path: path.clone(),
            source: e,
        })?;

        info!(
            "Attaching mtd{} via {} (ubi device: {}, vid_hdr_offset: {})",
            req.mtd_num, path, req.dev_num, req.vid_hdr_offset
        );

        // SAFETY: the file descriptor is open for the duration of the call and
        // `raw` is a fully initialized ubi_attach_req. The kernel writes the
        // assigned device number back into `ubi_num`, so the pointer is derived
        // from a mutable borrow.
        unsafe {
            ioctl::ubi_ioc_att(file.as_raw_fd(), std::ptr::addr_of_mut!(raw).cast_const())
                .map_err(|e| LibUbiError::Ioctl {
                    path: path.clone(),
                    source: e,
                })?;
        }

        let dev_num = reply_field("ubi_num", raw.ubi_num)?;

        info!("mtd{} attached as ubi{}", req.mtd_num, dev_num);
        Ok(dev_num)
    }

    fn dev_info(&self, dev_num: u32) -> Result<UbiDevInfo> {
        let dir = self.dev_dir(dev_num);
        if !dir.exists() {
            return Err(LibUbiError::DeviceNotFound(dev_num));
        }

        let mut vols: Vec<u32> = sysfs::scan_ubi_class(&self.ubi_dir())?
            .into_iter()
            .filter_map(|e| match e {
                UbiEntry::Volume { dev_num: d, vol_id } if d == dev_num => Some(vol_id),
                _ => None,
            })
            .collect();
        vols.sort_unstable();

        let dev_path = dir.join(attr::DEV);
        let node = parse_dev_node(&dev_path, sysfs::read_string(&dev_path)?)?;

        let avail_lebs = sysfs::read_u32(&dir.join(attr::AVAIL_EBS))?;
        let total_lebs = sysfs::read_u32(&dir.join(attr::TOTAL_EBS))?;
        let leb_size = sysfs::read_u32(&dir.join(attr::EB_SIZE))?;

        let info = UbiDevInfo {
            dev_num,
            mtd_num: sysfs::read_u32_opt(&dir.join(attr::MTD_NUM))?,
            node,
            vol_count: vols.len() as u32,
            lowest_vol_id: vols.first().copied(),
            highest_vol_id: vols.last().copied(),
            total_lebs,
            avail_lebs,
            bad_count: sysfs::read_u32(&dir.join(attr::BAD_COUNT))?,
            bad_rsvd: sysfs::read_u32(&dir.join(attr::BAD_RSVD))?,
            max_ec: sysfs::read_u64(&dir.join(attr::MAX_EC))?,
            max_vols: sysfs::read_u32(&dir.join(attr::MAX_VOLS))?,
            min_io_size: sysfs::read_u32(&dir.join(attr::MIN_IO_SIZE))?,
            leb_size,
            total_bytes: u64::from(total_lebs) * u64::from(leb_size),
            avail_bytes: u64::from(avail_lebs) * u64::from(leb_size),
        };

        debug!(
            "ubi{}: node={}, lebs={}/{}, leb_size={}, volumes={}",
            dev_num, info.node, info.avail_lebs, info.total_lebs, info.leb_size, info.vol_count
        );
        Ok(info)
    }

    fn mtd_info(&self, mtd_num: u32) -> Result<MtdInfo> {
        let dir = self.sysfs.join(SYSFS_MTD).join(format!("mtd{}", mtd_num));
        if !dir.exists() {
            return Err(LibUbiError::MtdNotFound(mtd_num));
        }

        Ok(MtdInfo {
            mtd_num,
            name: sysfs::read_string(&dir.join(attr::MTD_NAME))?,
            mtd_type: sysfs::read_string(&dir.join(attr::MTD_TYPE))?,
            size: sysfs::read_u64(&dir.join(attr::MTD_SIZE))?,
            erase_size: sysfs::read_u32(&dir.join(attr::MTD_ERASESIZE))?,
            min_io_size: sysfs::read_u32(&dir.join(attr::MTD_WRITESIZE))?,
        })
    }
}
