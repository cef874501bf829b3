//! Property tests for the share header codec

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use horcrux::codec::Header;
use horcrux::domain::{Checksum, ShareCount, ShareIndex, SplitId, Threshold};
use horcrux::error::HeaderError;

/// Wrapper for headers that could have been written by a split
#[derive(Clone, Debug)]
struct ValidHeader(Header);

impl Arbitrary for ValidHeader {
    fn arbitrary(g: &mut Gen) -> Self {
        let total = (u8::arbitrary(g) % 255) + 1;
        let threshold = (u8::arbitrary(g) % total) + 1;
        let index = (u8::arbitrary(g) % total) + 1;

        // Mix of short ASCII names and names with multi-byte characters
        let stem: String = String::arbitrary(g)
            .chars()
            .filter(|c| !matches!(c, '/' | '\\' | '\0'))
            .take(40)
            .collect();
        let original_filename = format!("{stem}.dat");

        let mut split_id = [0u8; 16];
        split_id.iter_mut().for_each(|b| *b = u8::arbitrary(g));
        let mut checksum = [0u8; 32];
        checksum.iter_mut().for_each(|b| *b = u8::arbitrary(g));

        ValidHeader(Header {
            original_filename,
            created_at: u64::arbitrary(g),
            split_id: SplitId(split_id),
            file_size: u64::arbitrary(g),
            total: ShareCount::new(total).unwrap(),
            threshold: Threshold::new(threshold).unwrap(),
            index: ShareIndex::new(index).unwrap(),
            checksum: Checksum(checksum),
        })
    }
}

/// Decoding ignores whatever payload follows the header
#[quickcheck]
fn prop_header_survives_with_payload(header: ValidHeader, payload: Vec<u8>) -> bool {
    let ValidHeader(header) = header;
    let mut bytes = header.encode();
    let len = bytes.len();
    bytes.extend_from_slice(&payload);

    match Header::decode(&bytes) {
        Ok((decoded, consumed)) => decoded == header && consumed == len,
        Err(_) => false,
    }
}

/// Cutting the header anywhere reports truncation rather than a bogus header
#[quickcheck]
fn prop_header_prefix_is_truncated(header: ValidHeader, cut: usize) -> bool {
    let ValidHeader(header) = header;
    let bytes = header.encode();
    let cut = cut % bytes.len();
    matches!(Header::decode(&bytes[..cut]), Err(e) if e.is_truncated())
}

/// Flipping any single bit after the version byte is caught
#[quickcheck]
fn prop_header_bit_flip_detected(header: ValidHeader, position: usize, bit: u8) -> bool {
    let ValidHeader(header) = header;
    let mut bytes = header.encode();
    // magic and version have their own errors; name length changes can truncate
    let position = 7 + position % (bytes.len() - 7);
    bytes[position] ^= 1 << (bit % 8);

    match Header::decode(&bytes) {
        Ok(_) => false,
        Err(HeaderError::CrcMismatch { .. } | HeaderError::Truncated { .. }) => true,
        Err(_) => false,
    }
}
