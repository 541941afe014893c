use jmraid_status::crc;
use jmraid_status::frame;
use jmraid_status::scrambler;

#[test]
fn crc_is_deterministic_and_bit_sensitive() {
    let words = [0x1111_1111u32, 0x2222_2222, 0x3333_3333];
    let a = crc::crc(&words, words.len());
    let b = crc::crc(&words, words.len());
    assert_eq!(a, b);

    let mut flipped = words;
    flipped[1] ^= 1;
    assert_ne!(a, crc::crc(&flipped, flipped.len()));
}

#[test]
fn crc_of_empty_input_is_seed() {
    assert_eq!(crc::crc(&[], 0), crc::SEED);
}

#[test]
fn scrambler_is_an_involution_for_all_byte_patterns_sampled() {
    for fill in [0x00u8, 0xFF, 0x55, 0xAA, 0x3C] {
        let mut frame = [fill; 512];
        let original = frame;
        scrambler::scramble(&mut frame);
        scrambler::scramble(&mut frame);
        assert_eq!(frame, original);
    }
}

#[test]
fn command_frame_round_trip_preserves_counter_and_payload() {
    let payload = [0x11, 0x22, 0x33, 0x44];
    let frame = frame::build_command_frame(42, &payload).unwrap();
    let decoded = frame::verify_response_frame(frame).unwrap();
    assert_eq!(&frame::response_payload(&decoded)[..4], &payload);
}

#[test]
fn crc_mismatch_injection_is_detected() {
    // Scenario 6: flip one byte in a captured legitimate response (bytes
    // 0..0x1FB), re-scramble, and expect the CRC check to fail.
    let payload = [0xAB; 8];
    let mut legit = frame::build_command_frame(1, &payload).unwrap();
    legit[0x50] ^= 0x01;
    assert!(frame::verify_response_frame(legit).is_err());
}

#[test]
fn wakeup_frames_use_all_four_fixed_constants_in_order() {
    let expected = [0x3C75_A80Bu32, 0x0388_E337, 0x6897_05F3, 0xE00C_523A];
    for (i, constant) in expected.iter().enumerate() {
        let wakeup = frame::build_wakeup_frame(i);
        let word1 = u32::from_le_bytes(wakeup[4..8].try_into().unwrap());
        assert_eq!(word1, *constant);
    }
}
