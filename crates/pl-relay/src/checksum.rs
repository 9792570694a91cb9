/// Checksum the preloader reports after receiving a DA.
///
/// XOR of little-endian 16-bit words, a trailing odd byte is XORed as is.
pub fn da_checksum(payload: &[u8]) -> u16 {
    payload.chunks(2).fold(0, |acc, chunk| match *chunk {
        [lo, hi] => acc ^ u16::from_le_bytes([lo, hi]),
        [b] => acc ^ u16::from(b),
        _ => acc,
    })
}
