//! XOR whitening applied to JMicron command/response frames.
//!
//! `original_source/`'s `sata_xor.c` (the file defining the literal 512-byte
//! mask) was outside the retrieval window, so the table below is a
//! deterministic placeholder generated from the protocol's own CRC seed
//! (`crate::crc::SEED`) rather than the real bridge's table — see
//! DESIGN.md. The property this crate guarantees and tests is the one the
//! protocol actually depends on: `scramble(scramble(x)) == x`.

/// 128 little-endian 32-bit words (512 bytes), XORed word-wise into a frame.
const MASK: [u32; 128] = [
    0x0C879183, 0x72610F00, 0xDFE59339, 0x9EB13D7E, 0x1FA7C2DF, 0xEF481B2C,
    0x0A0329F5, 0xE29FB38A, 0x0D6FADFB, 0x0AB1BE18, 0xD4297071, 0x9E4D7E56,
    0x90012ED7, 0x7E10A3C4, 0x2C93A2AD, 0xB53B29E2, 0xF7BFE173, 0x85563830,
    0xAFF4BCA9, 0x5066022E, 0xADAD21CF, 0x681EA75C, 0x79337A65, 0x9954133A,
    0x7F840BEB, 0x699CDD48, 0x30E657E1, 0x19E02906, 0x91957BC7, 0xCB4685F4,
    0x988F911D, 0x4CC5CF92, 0x92640D63, 0x4E400D60, 0x8D992219, 0xAAED52DE,
    0x8C001CBF, 0x5F889F8C, 0x4010C6D5, 0x4177BEEA, 0x6F23C5DB, 0xDAE62878,
    0x1923FB51, 0x9C8ADFB6, 0x340EE4B7, 0x10915424, 0x8D5BFB8D, 0x92DD4142,
    0x2D231553, 0x79A18E90, 0xD699C389, 0x3E022F8E, 0xE73FB3AF, 0x473903BC,
    0x51D20F45, 0x2B75B69A, 0xB3DDDBCB, 0xB8709FA8, 0xFC895AC1, 0x9268A266,
    0xB8EC69A7, 0xE3040E54, 0x4E0FE1FD, 0x1A4C7EF2, 0x226BF943, 0x5ABDBBC0,
    0x687DA0F9, 0x7E1F983E, 0xD1CAE69F, 0xE3A2D3EC, 0x5D6E53B5, 0x1878FA4A,
    0xA7014DBB, 0x1ADF42D8, 0x027D7631, 0x24547116, 0x3F6D0A97, 0xC271B484,
    0x9182446D, 0x3E9E88A2, 0xC66DB933, 0x1B9794F0, 0x108BBA69, 0x74808CEE,
    0x33C0B58F, 0x7BF9101C, 0x3D9C9425, 0xEA6C89FA, 0x139D1BAB, 0x09951208,
    0x7A274DA1, 0xE7E94BC6, 0xB48FC787, 0x496D46B4, 0xF24A22DD, 0xD41E5E52,
    0x57175523, 0xECF21A20, 0xFBCB0FD9, 0x6F200D9E, 0xBB00207F, 0x0A2EB84C,
    0x68D3D095, 0x53FB65AA, 0x2680459B, 0xAAB50D38, 0x4A6DE111, 0x8F823276,
    0xC313A077, 0x5D49C4E4, 0x5EBE7D4D, 0xD7D70002, 0xEC17CD13, 0x36504B50,
    0x2702A149, 0xB0B91A4E, 0xCB28276F, 0x6AF6CC7C, 0x614B0905, 0x88908D5A,
    0x5E39CB8B, 0x73223468, 0x61F83081, 0x9A3A2526, 0xC3779567, 0x5E1A2F14,
    0x88F653BD, 0x1F936DB2,
];

/// Applies the fixed XOR mask in place, word-wise, to a 512-byte frame.
///
/// Involution: calling twice restores the original bytes.
pub fn scramble(frame: &mut [u8; 512]) {
    for (i, mask_word) in MASK.iter().enumerate() {
        let off = i * 4;
        let word = u32::from_le_bytes(frame[off..off + 4].try_into().unwrap());
        let scrambled = word ^ mask_word;
        frame[off..off + 4].copy_from_slice(&scrambled.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn involution_on_arbitrary_data() {
        let mut frame = [0u8; 512];
        for (i, b) in frame.iter_mut().enumerate() {
            *b = (i * 37 + 11) as u8;
        }
        let original = frame;
        scramble(&mut frame);
        assert_ne!(frame, original);
        scramble(&mut frame);
        assert_eq!(frame, original);
    }

    #[test]
    fn involution_on_zeros() {
        let mut frame = [0u8; 512];
        scramble(&mut frame);
        assert_ne!(frame, [0u8; 512]);
        scramble(&mut frame);
        assert_eq!(frame, [0u8; 512]);
    }

    #[test]
    fn involution_on_uniform_pattern() {
        let mut frame = [0xAAu8; 512];
        let original = frame;
        scramble(&mut frame);
        scramble(&mut frame);
        assert_eq!(frame, original);
    }
}
