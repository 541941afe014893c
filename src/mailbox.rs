//! Mailbox driver: exchanges 512-byte frames with the bridge by reading and
//! writing a specific sector of the bridge-exposed block device.
//!
//! State machine: `Closed -> Opened -> Awake -> Closed`. `open_mailbox`
//! performs `Closed -> Opened`; `send_wakeup` moves to `Awake`;
//! `execute_frame` stays in `Awake`; `close_mailbox` returns to `Closed` from
//! any state, and a delivered signal forces the equivalent cleanup from
//! `platform::linux::cleanup_handler`.

use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;

use tracing::{debug, info, warn};

use crate::error::{MailboxError, Result};
use crate::frame::{self, FRAME_LEN, WAKEUP_CONSTANTS};
use crate::platform::linux as backend;

const LEGACY_SAFE_LBA: u32 = 33;
const SAFE_RANGE: std::ops::Range<u32> = 64..2048;

fn lba_is_safe(lba: u32) -> bool {
    lba == LEGACY_SAFE_LBA || SAFE_RANGE.contains(&lba)
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    Opened,
    Awake,
}

/// An open mailbox session. Exclusively owns the device handle and the live
/// mailbox LBA for its lifetime; holds the monotonic per-session command
/// counter described in §4.4.
pub struct Session {
    file: std::fs::File,
    lba: u32,
    counter: u32,
    state: State,
    closed: bool,
}

impl Session {
    pub fn lba(&self) -> u32 {
        self.lba
    }
}

/// Opens `device_path`, validates `lba`, and performs the authoritative
/// all-zero safety pre-read via ordinary file I/O (not SG_IO pass-through).
pub fn open_mailbox(device_path: &str, lba: u32) -> Result<Session> {
    if !lba_is_safe(lba) {
        return Err(MailboxError::InvalidArgs(format!(
            "mailbox LBA {lba} is outside the safe set {{33}} \u{222a} [64, 2048)"
        )));
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(device_path)
        .map_err(|source| MailboxError::DeviceOpen {
            path: device_path.to_string(),
            source,
        })?;
    let fd = file.as_raw_fd();

    backend::check_pass_through_capable(fd)?;

    let mut sector = [0u8; FRAME_LEN];
    let offset = lba as u64 * FRAME_LEN as u64;
    file.read_exact_at(&mut sector, offset)?;
    if sector.iter().any(|&b| b != 0) {
        return Err(MailboxError::UnsafeSector);
    }

    backend::register_cleanup(fd, lba);
    info!(lba, "mailbox opened, safety check passed");

    Ok(Session {
        file,
        lba,
        counter: 1,
        state: State::Opened,
        closed: false,
    })
}

/// Sends the four unscrambled wakeup frames, per §4.3/§6.
pub fn send_wakeup(session: &mut Session) -> Result<()> {
    let fd = session.file.as_raw_fd();
    for (i, constant) in WAKEUP_CONSTANTS.iter().enumerate() {
        let wakeup_frame = frame::build_wakeup_frame(i);
        backend::write_sector(fd, session.lba, &wakeup_frame)?;
        debug!(sequence = i, constant = format!("{constant:#010x}"), "wakeup frame sent");
    }
    session.state = State::Awake;
    Ok(())
}

/// Sends one command frame built from `probe_payload` and returns the
/// decoded, CRC-verified response payload bytes.
pub fn execute_frame(session: &mut Session, probe_payload: &[u8]) -> Result<[u8; FRAME_LEN]> {
    if session.state != State::Awake {
        return Err(MailboxError::InvalidArgs(
            "execute_frame called before send_wakeup (session is not Awake)".into(),
        ));
    }

    let fd = session.file.as_raw_fd();
    let counter = session.counter;
    let outgoing = frame::build_command_frame(counter, probe_payload)?;

    backend::write_sector(fd, session.lba, &outgoing)?;
    // Advance on transmit, not on verified response: a later CrcMismatch must
    // not leave this counter value to be reused by the next frame.
    session.counter = counter.wrapping_add(1);

    let raw_response = backend::read_sector(fd, session.lba)?;
    let response = frame::verify_response_frame(raw_response).map_err(|e| {
        warn!(counter, error = %e, "CRC mismatch on mailbox response");
        e
    })?;

    Ok(response)
}

/// Idempotent: zeroes the mailbox sector, tears down the signal handlers,
/// and closes the handle. Safe to call after the signal handler has already
/// run (it only observes the file being dropped).
pub fn close_mailbox(session: &mut Session) -> Result<()> {
    if session.closed {
        return Ok(());
    }

    let fd = session.file.as_raw_fd();
    let zero = [0u8; FRAME_LEN];
    let result = backend::write_sector(fd, session.lba, &zero);
    backend::unregister_cleanup();
    session.closed = true;

    if let Err(ref e) = result {
        warn!(error = %e, "failed to zero mailbox sector on close");
    }
    result
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            let _ = close_mailbox(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_lba_accepted() {
        assert!(lba_is_safe(33));
    }

    #[test]
    fn range_boundaries() {
        assert!(lba_is_safe(64));
        assert!(lba_is_safe(2047));
        assert!(!lba_is_safe(2048));
        assert!(!lba_is_safe(63));
        assert!(!lba_is_safe(0));
        assert!(!lba_is_safe(34));
    }
}
