//! Control interface trait

use crate::error::Result;
use crate::types::{AttachRequest, MtdInfo, UbiDevInfo, UbiInfo};
use std::path::Path;

/// Operations on the kernel UBI subsystem
///
/// `LibUbi` talks to the running kernel. The trait exists so that callers
/// can drive the same sequence against another backend.
pub trait UbiControl {
    /// General information about the UBI subsystem
    fn info(&self) -> Result<UbiInfo>;

    /// Attach an MTD device through the control node at `node`
    ///
    /// Returns the number of the newly created UBI device, which differs from
    /// the requested one when the request asked for automatic numbering.
    fn attach_mtd(&self, node: &Path, req: &AttachRequest) -> Result<u32>;

    /// Information about UBI device `dev_num`
    fn dev_info(&self, dev_num: u32) -> Result<UbiDevInfo>;

    /// Information about MTD device `mtd_num`
    fn mtd_info(&self, mtd_num: u32) -> Result<MtdInfo>;
}
