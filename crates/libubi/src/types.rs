//! Data types describing the UBI subsystem, its devices and attach requests

use std::fmt;
use std::str::FromStr;

/// UBI sysfs ABI version understood by this library
pub const UBI_SYSFS_VERSION: u32 = 1;

/// Kernel value asking for an automatically assigned UBI device number
pub const UBI_DEV_NUM_AUTO: i32 = -1;

/// Character device numbers, as sysfs prints them (`major:minor`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevNode {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for DevNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

impl FromStr for DevNode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.trim().split_once(':').ok_or(())?;
        Ok(Self {
            major: major.parse().map_err(|_| ())?,
            minor: minor.parse().map_err(|_| ())?,
        })
    }
}

/// General information about the UBI subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UbiInfo {
    /// UBI sysfs ABI version
    pub version: u32,
    /// Control device numbers, `None` if the kernel has no control device
    /// (attach/detach is unsupported then)
    pub ctrl_dev: Option<DevNode>,
    /// Number of UBI devices present
    pub dev_count: u32,
    /// Lowest UBI device number present
    pub lowest_dev_num: Option<u32>,
    /// Highest UBI device number present
    pub highest_dev_num: Option<u32>,
}

impl UbiInfo {
    /// Whether the kernel supports attaching MTD devices at run time
    pub fn supports_attach(&self) -> bool {
        self.ctrl_dev.is_some()
    }
}

/// UBI device number to request when attaching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevNum {
    /// Let the kernel pick the first free number
    #[default]
    Auto,
    /// Create exactly `ubiN`
    Fixed(u32),
}

impl fmt::Display for DevNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevNum::Auto => f.write_str("auto"),
            DevNum::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// Request to attach an MTD device to UBI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRequest {
    /// UBI device number to create
    pub dev_num: DevNum,
    /// MTD device number to attach
    pub mtd_num: u32,
    /// VID header offset, 0 selects the kernel default
    pub vid_hdr_offset: u32,
}

impl AttachRequest {
    /// Attach `mtd_num` with an automatic UBI number and default VID header offset
    pub fn new(mtd_num: u32) -> Self {
        Self {
            dev_num: DevNum::Auto,
            mtd_num,
            vid_hdr_offset: 0,
        }
    }

    pub fn with_dev_num(mut self, dev_num: DevNum) -> Self {
        self.dev_num = dev_num;
        self
    }

    pub fn with_vid_hdr_offset(mut self, vid_hdr_offset: u32) -> Self {
        self.vid_hdr_offset = vid_hdr_offset;
        self
    }
}

/// Information about a UBI device read from sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UbiDevInfo {
    /// UBI device number
    pub dev_num: u32,
    /// Underlying MTD device number (not exported by old kernels)
    pub mtd_num: Option<u32>,
    /// Character device numbers of `/dev/ubiN`
    pub node: DevNode,
    /// Number of volumes on the device
    pub vol_count: u32,
    /// Lowest volume ID present
    pub lowest_vol_id: Option<u32>,
    /// Highest volume ID present
    pub highest_vol_id: Option<u32>,
    /// Total number of logical eraseblocks
    pub total_lebs: u32,
    /// Number of logical eraseblocks available for new volumes
    pub avail_lebs: u32,
    /// Number of bad physical eraseblocks
    pub bad_count: u32,
    /// Physical eraseblocks reserved for bad block handling
    pub bad_rsvd: u32,
    /// Highest erase counter seen
    pub max_ec: u64,
    /// Maximum number of volumes
    pub max_vols: u32,
    /// Minimal input/output unit size
    pub min_io_size: u32,
    /// Logical eraseblock size
    pub leb_size: u32,
    /// `total_lebs * leb_size`
    pub total_bytes: u64,
    /// `avail_lebs * leb_size`
    pub avail_bytes: u64,
}

/// Information about an MTD device read from sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtdInfo {
    /// MTD device number
    pub mtd_num: u32,
    /// Device name
    pub name: String,
    /// Device type ("nand", "nor", "mlc-nand", ...)
    pub mtd_type: String,
    /// Total size in bytes
    pub size: u64,
    /// Erase block size in bytes
    pub erase_size: u32,
    /// Minimal writable unit in bytes
    pub min_io_size: u32,
}
