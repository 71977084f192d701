//! Attach command implementation

use crate::cli::Cli;
use libubi::{AttachRequest, DevNum, Errno, LibUbiError, UbiControl, UbiDevInfo};
use log::{debug, warn};
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the attach sequence, one per step
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("cannot open libubi")]
    Open(#[source] LibUbiError),

    #[error("cannot get UBI information")]
    Info(#[source] LibUbiError),

    #[error("MTD attach/detach feature is not supported by your kernel")]
    Unsupported,

    #[error("cannot attach mtd{mtd_num}")]
    Attach {
        mtd_num: u32,
        #[source]
        source: LibUbiError,
    },

    #[error("cannot get information about newly created UBI device")]
    DevInfo(#[source] LibUbiError),
}

/// What to attach and through which control node
#[derive(Debug, Clone)]
pub struct AttachArgs {
    pub node: PathBuf,
    pub request: AttachRequest,
}

impl AttachArgs {
    pub fn from_cli(cli: &Cli) -> Self {
        let mut request = AttachRequest::new(cli.mtdn);
        if let Some(devn) = cli.devn {
            request = request.with_dev_num(DevNum::Fixed(devn));
        }
        if let Some(offset) = cli.vid_hdr_offset {
            request = request.with_vid_hdr_offset(offset);
        }
        Self {
            node: cli.node.clone(),
            request,
        }
    }
}

/// Attach the MTD device and return the new UBI device's information
pub fn run(ctrl: &dyn UbiControl, args: &AttachArgs) -> Result<UbiDevInfo, AttachError> {
    let mtd_num = args.request.mtd_num;

    let info = ctrl.info().map_err(AttachError::Info)?;
    debug!(
        "UBI version {}, {} device(s) present",
        info.version, info.dev_count
    );
    if !info.supports_attach() {
        return Err(AttachError::Unsupported);
    }

    match ctrl.mtd_info(mtd_num) {
        Ok(mtd) => debug!(
            "mtd{}: name='{}', type={}, size={}, erase_size={}, min_io_size={}",
            mtd.mtd_num, mtd.name, mtd.mtd_type, mtd.size, mtd.erase_size, mtd.min_io_size
        ),
        Err(e) => warn!("Cannot read information about mtd{}: {}", mtd_num, e),
    }

    let dev_num = ctrl
        .attach_mtd(&args.node, &args.request)
        .map_err(|source| {
            match source.errno() {
                Some(Errno::EEXIST) => warn!(
                    "mtd{} is already attached or UBI device {} is taken",
                    mtd_num, args.request.dev_num
                ),
                Some(Errno::EPERM) | Some(Errno::EACCES) => {
                    warn!("Attaching MTD devices requires root privileges")
                }
                _ => {}
            }
            AttachError::Attach { mtd_num, source }
        })?;

    ctrl.dev_info(dev_num).map_err(AttachError::DevInfo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use libubi::{DevNode, MtdInfo, UbiInfo};
    use std::cell::RefCell;
    use std::path::Path;

    /// In-memory UBI subsystem recording the requests it receives
    struct FakeUbi {
        ctrl_dev: Option<DevNode>,
        attach_result: Option<Errno>,
        assigned: u32,
        has_mtd: bool,
        has_dev: bool,
        requests: RefCell<Vec<(PathBuf, AttachRequest)>>,
        queried: RefCell<Vec<u32>>,
    }

    impl FakeUbi {
        fn new() -> Self {
            Self {
                ctrl_dev: Some(DevNode {
                    major: 10,
                    minor: 58,
                }),
                attach_result: None,
                assigned: 0,
                has_mtd: true,
                has_dev: true,
                requests: RefCell::new(Vec::new()),
                queried: RefCell::new(Vec::new()),
            }
        }
    }

    impl UbiControl for FakeUbi {
        fn info(&self) -> libubi::Result<UbiInfo> {
            Ok(UbiInfo {
                version: 1,
                ctrl_dev: self.ctrl_dev,
                dev_count: 0,
                lowest_dev_num: None,
                highest_dev_num: None,
            })
        }

        fn attach_mtd(&self, node: &Path, req: &AttachRequest) -> libubi::Result<u32> {
            self.requests
                .borrow_mut()
                .push((node.to_path_buf(), req.clone()));
            if let Some(errno) = self.attach_result {
                return Err(LibUbiError::Ioctl {
                    path: node.display().to_string(),
                    source: errno,
                });
            }
            Ok(match req.dev_num {
                DevNum::Auto => self.assigned,
                DevNum::Fixed(n) => n,
            })
        }

        fn dev_info(&self, dev_num: u32) -> libubi::Result<UbiDevInfo> {
            self.queried.borrow_mut().push(dev_num);
            if !self.has_dev {
                return Err(LibUbiError::DeviceNotFound(dev_num));
            }
            Ok(UbiDevInfo {
                dev_num,
                mtd_num: Some(self.requests.borrow()[0].1.mtd_num),
                node: DevNode {
                    major: 249,
                    minor: dev_num,
                },
                vol_count: 0,
                lowest_vol_id: None,
                highest_vol_id: None,
                total_lebs: 100,
                avail_lebs: 80,
                bad_count: 0,
                bad_rsvd: 20,
                max_ec: 0,
                max_vols: 128,
                min_io_size: 2048,
                leb_size: 126976,
                total_bytes: 100 * 126976,
                avail_bytes: 80 * 126976,
            })
        }

        fn mtd_info(&self, mtd_num: u32) -> libubi::Result<MtdInfo> {
            if !self.has_mtd {
                return Err(LibUbiError::MtdNotFound(mtd_num));
            }
            Ok(MtdInfo {
                mtd_num,
                name: "rootfs".to_string(),
                mtd_type: "nand".to_string(),
                size: 100 * 131072,
                erase_size: 131072,
                min_io_size: 2048,
            })
        }
    }

    fn args(cmdline: &[&str]) -> AttachArgs {
        let cli = Cli::try_parse_from(std::iter::once("ubiattach").chain(cmdline.iter().copied()))
            .unwrap();
        AttachArgs::from_cli(&cli)
    }

    #[test]
    fn test_args_from_cli() {
        let a = args(&["/dev/ubi_ctrl", "-m", "4"]);
        assert_eq!(a.node, PathBuf::from("/dev/ubi_ctrl"));
        assert_eq!(a.request, AttachRequest::new(4));

        let a = args(&["/dev/ubi_ctrl", "-m", "1", "-d", "3", "-o", "2048"]);
        assert_eq!(a.request.dev_num, DevNum::Fixed(3));
        assert_eq!(a.request.vid_hdr_offset, 2048);
    }

    #[test]
    fn test_attach_auto_number() {
        let mut ubi = FakeUbi::new();
        ubi.assigned = 2;

        let info = run(&ubi, &args(&["/dev/ubi_ctrl", "-m", "0"])).unwrap();
        assert_eq!(info.dev_num, 2);
        assert_eq!(*ubi.queried.borrow(), vec![2]);

        let requests = ubi.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, PathBuf::from("/dev/ubi_ctrl"));
        assert_eq!(requests[0].1.dev_num, DevNum::Auto);
        assert_eq!(requests[0].1.vid_hdr_offset, 0);
    }

    #[test]
    fn test_attach_fixed_number() {
        let ubi = FakeUbi::new();
        let info = run(&ubi, &args(&["/dev/ubi_ctrl", "-m", "1", "-d", "3"])).unwrap();
        assert_eq!(info.dev_num, 3);
        assert_eq!(info.mtd_num, Some(1));
    }

    #[test]
    fn test_attach_without_mtd_sysfs() {
        let mut ubi = FakeUbi::new();
        ubi.has_mtd = false;
        assert!(run(&ubi, &args(&["/dev/ubi_ctrl", "-m", "0"])).is_ok());
    }

    #[test]
    fn test_unsupported_kernel() {
        let mut ubi = FakeUbi::new();
        ubi.ctrl_dev = None;

        let err = run(&ubi, &args(&["/dev/ubi_ctrl", "-m", "0"])).unwrap_err();
        assert!(matches!(err, AttachError::Unsupported));
        assert_eq!(
            err.to_string(),
            "MTD attach/detach feature is not supported by your kernel"
        );
        assert!(ubi.requests.borrow().is_empty());
    }

    #[test]
    fn test_attach_failure() {
        let mut ubi = FakeUbi::new();
        ubi.attach_result = Some(Errno::EEXIST);

        let err = run(&ubi, &args(&["/dev/ubi_ctrl", "-m", "5"])).unwrap_err();
        assert_eq!(err.to_string(), "cannot attach mtd5");
        match err {
            AttachError::Attach { mtd_num, source } => {
                assert_eq!(mtd_num, 5);
                assert_eq!(source.errno(), Some(Errno::EEXIST));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(ubi.queried.borrow().is_empty());
    }

    #[test]
    fn test_new_device_disappeared() {
        let mut ubi = FakeUbi::new();
        ubi.has_dev = false;

        let err = run(&ubi, &args(&["/dev/ubi_ctrl", "-m", "0"])).unwrap_err();
        assert!(matches!(
            err,
            AttachError::DevInfo(LibUbiError::DeviceNotFound(0))
        ));
        assert_eq!(
            err.to_string(),
            "cannot get information about newly created UBI device"
        );
    }
}
