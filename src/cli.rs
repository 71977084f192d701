//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  ubiattach /dev/ubi_ctrl -m 0
      attach MTD device 0 (mtd0) to UBI
  ubiattach /dev/ubi_ctrl -m 0 -d 3
      attach MTD device 0 (mtd0) to UBI and create UBI device number 3 (ubi3)";

/// Largest value the kernel's signed 32-bit request fields can carry
const REQ_FIELD_MAX: u32 = i32::MAX as u32;

/// Parse an unsigned number: `0x` prefix for hex, leading `0` for octal,
/// decimal otherwise. Leading whitespace and a `+` sign are accepted.
pub fn parse_number(s: &str) -> Result<u32, String> {
    let trimmed = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (digits, radix) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (hex, 16)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (&unsigned[1..], 8)
    } else {
        (unsigned, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("Invalid number: {}", s));
    }
    u32::from_str_radix(digits, radix).map_err(|e| format!("Invalid number: {}", e))
}

fn parse_dev_num(s: &str) -> Result<u32, String> {
    parse_number(s)
        .ok()
        .filter(|n| *n <= REQ_FIELD_MAX)
        .ok_or_else(|| format!("bad UBI device number: \"{}\"", s))
}

fn parse_mtd_num(s: &str) -> Result<u32, String> {
    parse_number(s)
        .ok()
        .filter(|n| *n <= REQ_FIELD_MAX)
        .ok_or_else(|| format!("bad MTD device number: \"{}\"", s))
}

fn parse_vid_hdr_offset(s: &str) -> Result<u32, String> {
    parse_number(s)
        .ok()
        .filter(|n| *n > 0 && *n <= REQ_FIELD_MAX)
        .ok_or_else(|| format!("bad VID header offset: \"{}\"", s))
}

#[derive(Parser, Debug)]
#[command(name = "ubiattach")]
#[command(author, version, about = "A tool to attach MTD device to UBI", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// UBI control device node file name (usually /dev/ubi_ctrl)
    #[arg(value_name = "UBI_CTRL")]
    pub node: PathBuf,

    /// MTD device number to attach
    #[arg(
        short = 'm',
        long = "mtdn",
        value_name = "MTD device number",
        allow_negative_numbers = true,
        value_parser = parse_mtd_num
    )]
    pub mtdn: u32,

    /// The number to assign to the newly created UBI device
    /// (assigned automatically if not specified)
    #[arg(
        short = 'd',
        long = "devn",
        value_name = "UBI device number",
        allow_negative_numbers = true,
        value_parser = parse_dev_num
    )]
    pub devn: Option<u32>,

    /// VID header offset (do not specify this unless you really know what
    /// you do, the optimal default is used otherwise)
    #[arg(
        short = 'o',
        long = "vid-hdr-offset",
        value_name = "offset",
        allow_negative_numbers = true,
        value_parser = parse_vid_hdr_offset
    )]
    pub vid_hdr_offset: Option<u32>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
