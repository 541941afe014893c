//! Linux SCSI generic (`SG_IO`) backend for the mailbox transport.
//!
//! This is the only backend the mailbox driver ships, per the transport's
//! scope: the bridge is only reachable as a Linux SCSI generic device. The
//! `sg_io_hdr` layout below mirrors `<scsi/sg.h>`; `SG_IO` and
//! `SG_GET_VERSION_NUM` are the kernel's literal ioctl numbers (not derived
//! via `_IOWR`, matching the kernel header itself).

use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use nix::libc::{self, c_int, c_uchar, c_uint, c_ushort, c_void};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::error::{MailboxError, Result};

const SG_IO: libc::c_ulong = 0x2285;
const SG_GET_VERSION_NUM: libc::c_ulong = 0x2282;

const SG_DXFER_NONE: c_int = -1;
const SG_DXFER_TO_DEV: c_int = -2;
const SG_DXFER_FROM_DEV: c_int = -3;
const SG_INTERFACE_ID_ORIG: c_int = 'S' as c_int;

const MIN_SG_VERSION: c_int = 30000;
const SECTOR_LEN: usize = 512;
const SENSE_LEN: usize = 32;
const IOCTL_TIMEOUT_MS: c_uint = 3_000;

#[repr(C)]
struct SgIoHdr {
    interface_id: c_int,
    dxfer_direction: c_int,
    cmd_len: c_uchar,
    mx_sb_len: c_uchar,
    iovec_count: c_ushort,
    dxfer_len: c_uint,
    dxferp: *mut c_void,
    cmdp: *mut c_uchar,
    sbp: *mut c_uchar,
    timeout: c_uint,
    flags: c_uint,
    pack_id: c_int,
    usr_ptr: *mut c_void,
    status: c_uchar,
    maskstatus: c_uchar,
    msg_status: c_uchar,
    sb_len_wr: c_uchar,
    host_status: c_ushort,
    driver_status: c_ushort,
    resid: c_int,
    duration: c_uint,
    info: c_uint,
}

impl Default for SgIoHdr {
    fn default() -> Self {
        SgIoHdr {
            interface_id: SG_INTERFACE_ID_ORIG,
            dxfer_direction: SG_DXFER_NONE,
            cmd_len: 0,
            mx_sb_len: 0,
            iovec_count: 0,
            dxfer_len: 0,
            dxferp: std::ptr::null_mut(),
            cmdp: std::ptr::null_mut(),
            sbp: std::ptr::null_mut(),
            timeout: IOCTL_TIMEOUT_MS,
            flags: 0,
            pack_id: 0,
            usr_ptr: std::ptr::null_mut(),
            status: 0,
            maskstatus: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        }
    }
}

fn build_rw10_cdb(opcode: u8, lba: u32) -> [u8; 10] {
    let lba_bytes = lba.to_be_bytes();
    [
        opcode,
        0,
        lba_bytes[0],
        lba_bytes[1],
        lba_bytes[2],
        lba_bytes[3],
        0,
        0,
        1, // transfer length: 1 block
        0,
    ]
}

/// Runs one SCSI generic command transferring exactly one 512-byte sector.
///
/// `direction` selects `SG_DXFER_TO_DEV` (write) or `SG_DXFER_FROM_DEV`
/// (read); `buf` is written from (write) or into (read) accordingly.
fn run_sg_io(fd: RawFd, opcode: u8, lba: u32, direction: c_int, buf: &mut [u8; SECTOR_LEN]) -> Result<()> {
    let mut cdb = build_rw10_cdb(opcode, lba);
    let mut sense = [0u8; SENSE_LEN];
    let mut hdr = SgIoHdr {
        dxfer_direction: direction,
        cmd_len: cdb.len() as c_uchar,
        mx_sb_len: SENSE_LEN as c_uchar,
        dxfer_len: SECTOR_LEN as c_uint,
        dxferp: buf.as_mut_ptr() as *mut c_void,
        cmdp: cdb.as_mut_ptr(),
        sbp: sense.as_mut_ptr(),
        ..SgIoHdr::default()
    };

    let rc = unsafe { libc::ioctl(fd, SG_IO as _, &mut hdr as *mut SgIoHdr) };
    if rc < 0 {
        return Err(MailboxError::IoctlFailed {
            errno: std::io::Error::last_os_error().raw_os_error().unwrap_or(-1),
        });
    }
    if hdr.status != 0 || hdr.host_status != 0 || hdr.driver_status != 0 {
        return Err(MailboxError::IoctlFailed {
            errno: hdr.status as i32,
        });
    }
    Ok(())
}

/// Writes one 512-byte sector to `lba` via `SG_IO` WRITE(10).
pub fn write_sector(fd: RawFd, lba: u32, data: &[u8; SECTOR_LEN]) -> Result<()> {
    let mut buf = *data;
    run_sg_io(fd, 0x2A, lba, SG_DXFER_TO_DEV, &mut buf)
}

/// Reads one 512-byte sector from `lba` via `SG_IO` READ(10).
pub fn read_sector(fd: RawFd, lba: u32) -> Result<[u8; SECTOR_LEN]> {
    let mut buf = [0u8; SECTOR_LEN];
    run_sg_io(fd, 0x28, lba, SG_DXFER_FROM_DEV, &mut buf)?;
    Ok(buf)
}

/// Confirms the handle supports SCSI generic pass-through (`SG_GET_VERSION_NUM`).
pub fn check_pass_through_capable(fd: RawFd) -> Result<()> {
    let mut version: c_int = 0;
    let rc = unsafe { libc::ioctl(fd, SG_GET_VERSION_NUM as _, &mut version as *mut c_int) };
    if rc < 0 || version < MIN_SG_VERSION {
        return Err(MailboxError::NotPassThroughCapable);
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Async-signal-safe cleanup registry.
//
// Set by `open_mailbox`, cleared by `close_mailbox`. The handler only
// reads these and performs a single raw `ioctl` WRITE(10) of a
// stack-allocated zero sector; no allocation, one-shot via `HANDLED`.
// ---------------------------------------------------------------------

static CLEANUP_FD: AtomicI32 = AtomicI32::new(-1);
static CLEANUP_LBA: AtomicU32 = AtomicU32::new(0);
static HANDLED: AtomicBool = AtomicBool::new(false);

extern "C" fn cleanup_handler(signum: c_int) {
    if HANDLED.swap(true, Ordering::SeqCst) {
        unsafe { libc::_exit(128 + signum) };
    }

    let fd = CLEANUP_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let lba = CLEANUP_LBA.load(Ordering::SeqCst);
        let zero = [0u8; SECTOR_LEN];
        let _ = write_sector(fd, lba, &zero);
    }

    unsafe { libc::_exit(128 + signum) };
}

/// Publishes `(fd, lba)` for the signal handler and installs it for
/// SIGINT/SIGTERM/SIGHUP/SIGQUIT. Safe to call once per open session.
pub fn register_cleanup(fd: RawFd, lba: u32) {
    CLEANUP_FD.store(fd, Ordering::SeqCst);
    CLEANUP_LBA.store(lba, Ordering::SeqCst);
    HANDLED.store(false, Ordering::SeqCst);

    let action = SigAction::new(
        SigHandler::Handler(cleanup_handler),
        SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP, Signal::SIGQUIT] {
        unsafe {
            let _ = signal::sigaction(sig, &action);
        }
    }
}

/// Clears the cleanup registry and restores default signal dispositions.
pub fn unregister_cleanup() {
    CLEANUP_FD.store(-1, Ordering::SeqCst);
    for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP, Signal::SIGQUIT] {
        unsafe {
            let _ = signal::signal(sig, SigHandler::SigDfl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rw10_cdb_encodes_lba_big_endian_and_single_block_length() {
        let cdb = build_rw10_cdb(0x28, 0x0000_0040);
        assert_eq!(cdb[0], 0x28);
        assert_eq!(&cdb[2..6], &[0x00, 0x00, 0x00, 0x40]);
        assert_eq!(cdb[7..9], [0x00, 0x01]);
    }

    #[test]
    fn write_opcode_differs_from_read_opcode() {
        let write_cdb = build_rw10_cdb(0x2A, 1);
        let read_cdb = build_rw10_cdb(0x28, 1);
        assert_ne!(write_cdb[0], read_cdb[0]);
    }
}
