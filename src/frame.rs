//! Frame construction and verification: magic, counter, payload, CRC,
//! scrambling — symmetric on decode. Owns nothing by itself; the monotonic
//! counter lives on the session (`mailbox::Session`) per §4.4.

use crate::crc;
use crate::error::{MailboxError, Result};
use crate::models::{MAGIC_COMMAND, MAGIC_WAKEUP};
use crate::scrambler;

pub const FRAME_LEN: usize = 512;
const WORD_COUNT: usize = FRAME_LEN / 4;
const CRC_WORD: usize = WORD_COUNT - 1;
const PAYLOAD_OFFSET: usize = 8;

const WAKEUP_FILL_START: usize = 0x10;
const WAKEUP_FILL_END: usize = 0x1F8;
const WAKEUP_TAG: u32 = 0x10ECA1DB;
const WAKEUP_TAG_OFFSET: usize = 0x1F8;

pub const WAKEUP_CONSTANTS: [u32; 4] = [0x3C75_A80B, 0x0388_E337, 0x6897_05F3, 0xE00C_523A];

fn words_from_bytes(frame: &[u8; FRAME_LEN]) -> [u32; WORD_COUNT] {
    let mut words = [0u32; WORD_COUNT];
    for (i, word) in words.iter_mut().enumerate() {
        let off = i * 4;
        *word = u32::from_le_bytes(frame[off..off + 4].try_into().unwrap());
    }
    words
}

fn write_word(frame: &mut [u8; FRAME_LEN], index: usize, value: u32) {
    let off = index * 4;
    frame[off..off + 4].copy_from_slice(&value.to_le_bytes());
}

/// Builds a command frame: magic 0x197B0322, the given counter, the probe
/// payload at byte 8, CRC over words 0..126 at word 127, then scrambled.
///
/// `payload` is copied starting at byte offset 8; it must fit before the CRC
/// word (i.e. at most `FRAME_LEN - PAYLOAD_OFFSET - 4` bytes).
pub fn build_command_frame(counter: u32, payload: &[u8]) -> Result<[u8; FRAME_LEN]> {
    if payload.len() > FRAME_LEN - PAYLOAD_OFFSET - 4 {
        return Err(MailboxError::InvalidArgs(
            "probe payload too large for frame".into(),
        ));
    }

    let mut frame = [0u8; FRAME_LEN];
    write_word(&mut frame, 0, MAGIC_COMMAND);
    write_word(&mut frame, 1, counter);
    frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);

    let words = words_from_bytes(&frame);
    let tag = crc::crc(&words, CRC_WORD);
    write_word(&mut frame, CRC_WORD, tag);

    scrambler::scramble(&mut frame);
    Ok(frame)
}

/// Builds one of the four wakeup frames (unscrambled, per §4.3/§6).
///
/// `sequence_index` selects which of the four fixed constants goes at word 1
/// (0..=3); panics on an out-of-range index since callers iterate a fixed
/// internal array.
pub fn build_wakeup_frame(sequence_index: usize) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    write_word(&mut frame, 0, MAGIC_WAKEUP);
    write_word(&mut frame, 1, WAKEUP_CONSTANTS[sequence_index]);

    for j in WAKEUP_FILL_START..WAKEUP_FILL_END {
        frame[j] = (j & 0xFF) as u8;
    }
    frame[WAKEUP_TAG_OFFSET..WAKEUP_TAG_OFFSET + 4].copy_from_slice(&WAKEUP_TAG.to_le_bytes());

    let words = words_from_bytes(&frame);
    let tag = crc::crc(&words, CRC_WORD);
    write_word(&mut frame, CRC_WORD, tag);
    frame
}

/// Unscrambles and CRC-verifies a response frame read from the mailbox.
///
/// Returns the unscrambled frame bytes on success.
pub fn verify_response_frame(mut frame: [u8; FRAME_LEN]) -> Result<[u8; FRAME_LEN]> {
    scrambler::scramble(&mut frame);
    let words = words_from_bytes(&frame);
    let expected = words[CRC_WORD];
    let actual = crc::crc(&words, CRC_WORD);
    if expected != actual {
        return Err(MailboxError::CrcMismatch { expected, actual });
    }
    Ok(frame)
}

/// Copies the probe payload portion of a decoded response (bytes 8..).
pub fn response_payload(frame: &[u8; FRAME_LEN]) -> &[u8] {
    &frame[PAYLOAD_OFFSET..FRAME_LEN - 4]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_frame_round_trips() {
        let payload = [0xAAu8; 16];
        let frame = build_command_frame(7, &payload).unwrap();
        let decoded = verify_response_frame(frame).unwrap();
        let words = words_from_bytes(&decoded);
        assert_eq!(words[0], MAGIC_COMMAND);
        assert_eq!(words[1], 7);
        assert_eq!(&decoded[PAYLOAD_OFFSET..PAYLOAD_OFFSET + 16], &payload);
    }

    #[test]
    fn counter_is_preserved_through_round_trip() {
        for counter in [1u32, 2, 1000, u32::MAX] {
            let frame = build_command_frame(counter, &[]).unwrap();
            let decoded = verify_response_frame(frame).unwrap();
            let words = words_from_bytes(&decoded);
            assert_eq!(words[1], counter);
        }
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; FRAME_LEN];
        assert!(build_command_frame(1, &payload).is_err());
    }

    #[test]
    fn wakeup_frame_carries_fixed_constants_and_is_unscrambled() {
        for (i, constant) in WAKEUP_CONSTANTS.iter().enumerate() {
            let frame = build_wakeup_frame(i);
            let words = words_from_bytes(&frame);
            assert_eq!(words[0], MAGIC_WAKEUP);
            assert_eq!(words[1], *constant);
            assert_eq!(frame[0x10], 0x10);
            assert_eq!(frame[0x1F7], 0x1F7 & 0xFF);
            assert_eq!(
                u32::from_le_bytes(frame[0x1F8..0x1FC].try_into().unwrap()),
                WAKEUP_TAG
            );
        }
    }

    #[test]
    fn corrupted_frame_fails_crc_check() {
        let mut frame = build_command_frame(1, &[1, 2, 3]).unwrap();
        frame[10] ^= 0xFF;
        assert!(matches!(
            verify_response_frame(frame),
            Err(MailboxError::CrcMismatch { .. })
        ));
    }
}
