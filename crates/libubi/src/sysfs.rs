//! Sysfs attribute helpers

use crate::error::{LibUbiError, Result};
use std::io;
use std::path::Path;

/// Read a string from a sysfs file and sanitize it
pub(crate) fn read_string(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| LibUbiError::SysfsRead {
        path: path.display().to_string(),
        source: e,
    })?;

    // Sanitize: remove non-printable characters and trailing whitespace
    let sanitized: String = content
        .chars()
        .take_while(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    Ok(sanitized.trim_end().to_string())
}

/// Parse a sysfs integer, decimal or `0x` hex
pub(crate) fn parse_int(value: &str) -> Option<u64> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u64>().ok()
    }
}

/// Read an integer from a sysfs file
pub(crate) fn read_u64(path: &Path) -> Result<u64> {
    let value = read_string(path)?;
    parse_int(&value).ok_or_else(|| LibUbiError::SysfsParse {
        path: path.display().to_string(),
        value,
    })
}

/// Read an integer that must fit in 32 bits
pub(crate) fn read_u32(path: &Path) -> Result<u32> {
    let value = read_u64(path)?;
    u32::try_from(value).map_err(|_| LibUbiError::SysfsParse {
        path: path.display().to_string(),
        value: value.to_string(),
    })
}

/// Read an integer attribute that older kernels may not export
pub(crate) fn read_u32_opt(path: &Path) -> Result<Option<u32>> {
    match read_u32(path) {
        Ok(v) => Ok(Some(v)),
        Err(LibUbiError::SysfsRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// An entry of the UBI sysfs class directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UbiEntry {
    /// `ubiN`
    Device(u32),
    /// `ubiN_M`
    Volume { dev_num: u32, vol_id: u32 },
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Classify a name found under `class/ubi`
pub(crate) fn parse_ubi_entry(name: &str) -> Option<UbiEntry> {
    let rest = name.strip_prefix("ubi")?;
    match rest.split_once('_') {
        Some((dev, vol)) => Some(UbiEntry::Volume {
            dev_num: parse_digits(dev)?,
            vol_id: parse_digits(vol)?,
        }),
        None => parse_digits(rest).map(UbiEntry::Device),
    }
}

/// List the classified entries of a UBI sysfs class directory
pub(crate) fn scan_ubi_class(dir: &Path) -> Result<Vec<UbiEntry>> {
    let entries = std::fs::read_dir(dir).map_err(|e| LibUbiError::SysfsRead {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        match name.to_str().and_then(parse_ubi_entry) {
            Some(e) => found.push(e),
            None => log::trace!("Ignoring UBI sysfs entry {:?}", name),
        }
    }
    Ok(found)
}
