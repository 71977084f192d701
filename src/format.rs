//! Human-readable rendering of UBI device information

use libubi::UbiDevInfo;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Render a byte count, adding a GiB/MiB/KiB approximation when it helps
///
/// With `bracket` the approximation is enclosed as `" (x.y Unit)"` and KiB
/// values are shown too; without it the approximation follows as
/// `", x.y Unit"` and only MiB and GiB are shown.
pub fn format_bytes(bytes: u64, bracket: bool) -> String {
    let sep = if bracket { " (" } else { ", " };
    let mut out = format!("{} bytes", bytes);

    let approx = if bytes > GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes > MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes > KIB && bracket {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        return out;
    };

    out.push_str(sep);
    out.push_str(&approx);
    if bracket {
        out.push(')');
    }
    out
}

/// Summary line printed after a successful attach
pub fn format_dev_info(info: &UbiDevInfo) -> String {
    format!(
        "UBI device number {}, total {} LEBs ({}), available {} LEBs ({}), LEB size {}",
        info.dev_num,
        info.total_lebs,
        format_bytes(info.total_bytes, false),
        info.avail_lebs,
        format_bytes(info.avail_bytes, false),
        format_bytes(u64::from(info.leb_size), true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use libubi::DevNode;

    #[test]
    fn test_format_bytes_small() {
        assert_eq!(format_bytes(0, false), "0 bytes");
        assert_eq!(format_bytes(0, true), "0 bytes");
        assert_eq!(format_bytes(1024, true), "1024 bytes");
        assert_eq!(format_bytes(2048, false), "2048 bytes");
        assert_eq!(format_bytes(2048, true), "2048 bytes (2.0 KiB)");
        assert_eq!(format_bytes(126976, true), "126976 bytes (124.0 KiB)");
    }

    #[test]
    fn test_format_bytes_large() {
        assert_eq!(format_bytes(MIB, false), "1048576 bytes");
        assert_eq!(format_bytes(MIB, true), "1048576 bytes (1024.0 KiB)");
        assert_eq!(format_bytes(12697600, false), "12697600 bytes, 12.1 MiB");
        assert_eq!(format_bytes(12697600, true), "12697600 bytes (12.1 MiB)");
        assert_eq!(format_bytes(GIB, false), "1073741824 bytes, 1024.0 MiB");
        assert_eq!(format_bytes(2 * GIB, false), "2147483648 bytes, 2.0 GiB");
        assert_eq!(format_bytes(3 * GIB, true), "3221225472 bytes (3.0 GiB)");
    }

    #[test]
    fn test_format_dev_info() {
        let info = UbiDevInfo {
            dev_num: 0,
            mtd_num: Some(0),
            node: DevNode {
                major: 249,
                minor: 0,
            },
            vol_count: 0,
            lowest_vol_id: None,
            highest_vol_id: None,
            total_lebs: 100,
            avail_lebs: 0,
            bad_count: 0,
            bad_rsvd: 20,
            max_ec: 1,
            max_vols: 128,
            min_io_size: 2048,
            leb_size: 126976,
            total_bytes: 12697600,
            avail_bytes: 0,
        };
        assert_eq!(
            format_dev_info(&info),
            "UBI device number 0, total 100 LEBs (12697600 bytes, 12.1 MiB), \
             available 0 LEBs (0 bytes), LEB size 126976 bytes (124.0 KiB)"
        );
    }
}
