//! Command layer: builds probe payloads per ATA operation, issues them over
//! a mailbox session, and decodes IDENTIFY/SMART responses.
//!
//! Byte offsets below are measured against the full 512-byte decoded
//! response frame, not the probe payload — see §6's response envelope.

use crate::error::{MailboxError, Result};
use crate::frame::FRAME_LEN;
use crate::mailbox::{self, Session};
use crate::models::{IdentifyResult, RawSmartAttribute, RawSmartThreshold, SmartThresholdsPage, SmartValuesPage};
use tracing::debug;

const BITMASK_OFFSET: usize = 0x1F0;
const MODEL_OFFSET: usize = 0x10;
const MODEL_LEN: usize = 32;
const SERIAL_OFFSET: usize = 0x30;
const SERIAL_LEN: usize = 16;
const FIRMWARE_OFFSET: usize = 0x50;
const FIRMWARE_LEN: usize = 8;
const SECTOR_COUNT_OFFSET: usize = 0x4A;
const SMART_PAGE_OFFSET: usize = 0x20;
const ATTRIBUTE_STRIDE: usize = 12;

const SECTOR_COUNT_MIN: u64 = 2_000_000_000;
const SECTOR_COUNT_MAX: u64 = 50_000_000_000;

/// Outcome of an IDENTIFY probe: either a validated disk record, or `Empty`
/// when the response's CRC was valid but the content does not look like a
/// real disk (all-zero/all-0xFF prefix, or too few printable bytes).
pub enum IdentifyOutcome {
    Present(IdentifyResult),
    Empty,
}

fn probe_identify(slot: u8) -> [u8; 10] {
    [0x00, 0x02, 0x02, 0xFF, slot, 0x00, 0x00, 0x00, 0x00, slot]
}

fn probe_smart(slot: u8, subcommand: u8) -> [u8; 24] {
    [
        0x00, 0x02, 0x03, 0xFF, slot, 0x02, 0x00, 0xE0, 0x00, 0x00, subcommand, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x4F, 0x00, 0xC2, 0x00, 0xA0, 0x00, 0xB0, 0x00,
    ]
}

const SMART_READ_VALUES_SUBCOMMAND: u8 = 0xD0;
const SMART_READ_THRESHOLDS_SUBCOMMAND: u8 = 0xD1;

/// Swaps bytes within each 16-bit word of an ATA string, then trims
/// trailing and leading spaces. Mirrors `original_source/src/jm_commands.c`'s
/// `ata_string_swap`.
fn ata_string_swap(src: &[u8]) -> String {
    let mut swapped = Vec::with_capacity(src.len());
    for pair in src.chunks(2) {
        if pair.len() == 2 {
            swapped.push(pair[1]);
            swapped.push(pair[0]);
        } else {
            swapped.push(pair[0]);
        }
    }
    let text = String::from_utf8_lossy(&swapped);
    text.trim().to_string()
}

fn validate_identify_response(response: &[u8; FRAME_LEN]) -> bool {
    let model_bytes = &response[MODEL_OFFSET..MODEL_OFFSET + MODEL_LEN];
    let printable = model_bytes.iter().filter(|&&b| (0x20..0x7F).contains(&b)).count();
    let non_space = model_bytes
        .iter()
        .filter(|&&b| (0x20..0x7F).contains(&b) && b != b' ')
        .count();
    if printable < 8 || non_space < 5 {
        return false;
    }

    let prefix = &response[..64];
    let all_zero = prefix.iter().all(|&b| b == 0x00);
    let all_ff = prefix.iter().all(|&b| b == 0xFF);
    !(all_zero || all_ff)
}

fn parse_sector_count(response: &[u8; FRAME_LEN]) -> Option<u64> {
    let mut sectors: u64 = 0;
    for i in 0..6 {
        sectors |= (response[SECTOR_COUNT_OFFSET + i] as u64) << (i * 8);
    }
    if (SECTOR_COUNT_MIN..=SECTOR_COUNT_MAX).contains(&sectors) {
        Some(sectors)
    } else {
        None
    }
}

/// Executes an IDENTIFY probe for `slot`. Always returns the response's
/// presence-bitmask byte (0x1F0) alongside the outcome, since the array
/// coordinator latches it regardless of whether the slot is populated.
pub fn identify(session: &mut Session, slot: u8) -> Result<(u8, IdentifyOutcome)> {
    let payload = probe_identify(slot);
    let response = mailbox::execute_frame(session, &payload)?;
    let bitmask = response[BITMASK_OFFSET];

    if !validate_identify_response(&response) {
        debug!(slot, "identify: slot empty");
        return Ok((bitmask, IdentifyOutcome::Empty));
    }

    let model = ata_string_swap(&response[MODEL_OFFSET..MODEL_OFFSET + MODEL_LEN]);
    let serial = ata_string_swap(&response[SERIAL_OFFSET..SERIAL_OFFSET + SERIAL_LEN]);
    let firmware = ata_string_swap(&response[FIRMWARE_OFFSET..FIRMWARE_OFFSET + FIRMWARE_LEN]);
    let size_mb = parse_sector_count(&response).map(|sectors| sectors * 512 / 1_048_576);

    Ok((
        bitmask,
        IdentifyOutcome::Present(IdentifyResult {
            model,
            serial,
            firmware,
            size_mb,
            presence_bitmask: bitmask,
        }),
    ))
}

fn parse_smart_values_page(response: &[u8; FRAME_LEN]) -> Result<SmartValuesPage> {
    let base = SMART_PAGE_OFFSET;
    if base + 2 > FRAME_LEN {
        return Err(MailboxError::InvalidResponse("truncated SMART values page".into()));
    }
    let revision = u16::from_le_bytes([response[base], response[base + 1]]);

    let mut attributes = Vec::with_capacity(30);
    for i in 0..30usize {
        let off = base + 2 + i * ATTRIBUTE_STRIDE;
        if off + ATTRIBUTE_STRIDE > FRAME_LEN {
            break;
        }
        let id = response[off];
        if id == 0 {
            continue;
        }
        let flags = u16::from_le_bytes([response[off + 1], response[off + 2]]);
        let current = response[off + 3];
        let worst = response[off + 4];
        let mut raw = [0u8; 6];
        raw.copy_from_slice(&response[off + 5..off + 11]);
        let reserved = response[off + 11];
        attributes.push(RawSmartAttribute {
            id,
            flags,
            current,
            worst,
            raw,
            reserved,
        });
    }

    Ok(SmartValuesPage { revision, attributes })
}

fn parse_smart_thresholds_page(response: &[u8; FRAME_LEN]) -> Result<SmartThresholdsPage> {
    let base = SMART_PAGE_OFFSET;
    if base + 2 > FRAME_LEN {
        return Err(MailboxError::InvalidResponse(
            "truncated SMART thresholds page".into(),
        ));
    }
    let revision = u16::from_le_bytes([response[base], response[base + 1]]);

    let mut thresholds = Vec::with_capacity(30);
    for i in 0..30usize {
        let off = base + 2 + i * ATTRIBUTE_STRIDE;
        if off + ATTRIBUTE_STRIDE > FRAME_LEN {
            break;
        }
        let id = response[off];
        if id == 0 {
            continue;
        }
        let threshold = response[off + 1];
        thresholds.push(RawSmartThreshold { id, threshold });
    }

    Ok(SmartThresholdsPage { revision, thresholds })
}

/// Executes the SMART READ VALUES (0xD0) probe for `slot`.
pub fn smart_read_values(session: &mut Session, slot: u8) -> Result<SmartValuesPage> {
    let payload = probe_smart(slot, SMART_READ_VALUES_SUBCOMMAND);
    let response = mailbox::execute_frame(session, &payload)?;
    parse_smart_values_page(&response)
}

/// Executes the SMART READ THRESHOLDS (0xD1) probe for `slot`.
pub fn smart_read_thresholds(session: &mut Session, slot: u8) -> Result<SmartThresholdsPage> {
    let payload = probe_smart(slot, SMART_READ_THRESHOLDS_SUBCOMMAND);
    let response = mailbox::execute_frame(session, &payload)?;
    parse_smart_thresholds_page(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_templates_match_documented_bytes() {
        assert_eq!(probe_identify(2), [0x00, 0x02, 0x02, 0xFF, 2, 0x00, 0x00, 0x00, 0x00, 2]);
        let values = probe_smart(3, SMART_READ_VALUES_SUBCOMMAND);
        assert_eq!(values[4], 3);
        assert_eq!(values[10], 0xD0);
        let thresholds = probe_smart(3, SMART_READ_THRESHOLDS_SUBCOMMAND);
        assert_eq!(thresholds[10], 0xD1);
    }

    #[test]
    fn ata_string_swap_trims_and_unswaps() {
        // "ST1000" byte-swapped within 16-bit words, padded with spaces.
        let raw = [b'T', b'S', b'0', b'1', b'0', b'0', b'0', b'1', b' ', b' '];
        assert_eq!(ata_string_swap(&raw), "ST1000010");
    }

    #[test]
    fn sector_count_outside_sanity_range_is_none() {
        let mut response = [0u8; FRAME_LEN];
        let tiny: u64 = 10;
        for i in 0..6 {
            response[SECTOR_COUNT_OFFSET + i] = ((tiny >> (i * 8)) & 0xFF) as u8;
        }
        assert_eq!(parse_sector_count(&response), None);
    }

    #[test]
    fn sector_count_inside_sanity_range_parses() {
        let mut response = [0u8; FRAME_LEN];
        let sectors: u64 = 4_000_000_000;
        for i in 0..6 {
            response[SECTOR_COUNT_OFFSET + i] = ((sectors >> (i * 8)) & 0xFF) as u8;
        }
        assert_eq!(parse_sector_count(&response), Some(sectors));
    }

    #[test]
    fn all_zero_prefix_fails_validation() {
        let response = [0u8; FRAME_LEN];
        assert!(!validate_identify_response(&response));
    }

    #[test]
    fn all_ff_prefix_fails_validation() {
        let response = [0xFFu8; FRAME_LEN];
        assert!(!validate_identify_response(&response));
    }

    #[test]
    fn printable_model_passes_validation() {
        let mut response = [0u8; FRAME_LEN];
        let model = b"TSDISK-MODEL-0001              ";
        response[MODEL_OFFSET..MODEL_OFFSET + MODEL_LEN].copy_from_slice(model);
        assert!(validate_identify_response(&response));
    }

    #[test]
    fn smart_values_page_skips_vacant_slots() {
        let mut response = [0u8; FRAME_LEN];
        let base = SMART_PAGE_OFFSET + 2;
        response[base] = 0x05;
        response[base + 3] = 10;
        let page = parse_smart_values_page(&response).unwrap();
        assert_eq!(page.attributes.len(), 1);
        assert_eq!(page.attributes[0].id, 0x05);
        assert_eq!(page.attributes[0].current, 10);
    }
}
