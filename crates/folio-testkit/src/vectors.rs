//! Golden test vectors for the content identity encoding.
//!
//! Any implementation that seals or checks Folio content must produce and
//! accept exactly these bytes, and must reject exactly these malformed inputs.

use folio_core::{decode, encode, IdentityFormatError, ObjectId};

/// A well-formed identity and its expected encoding.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Container object id bytes.
    pub container: [u8; 32],
    /// Uniqueness nonce.
    pub nonce: u64,
    /// Expected encoding (hex).
    pub expected_hex: &'static str,
}

/// A malformed encoding and the error decoding must report.
#[derive(Debug, Clone)]
pub struct RejectVector {
    pub name: &'static str,
    pub hex: String,
    pub expected: IdentityFormatError,
}

/// Get all golden identity vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    let mut counting = [0u8; 32];
    for (i, b) in counting.iter_mut().enumerate() {
        *b = i as u8;
    }

    vec![
        GoldenVector {
            name: "zero container, zero nonce",
            container: [0x00; 32],
            nonce: 0,
            expected_hex: "00010000000000000000000000000000000000000000000000000000000000000000000000000000000000",
        },
        GoldenVector {
            name: "nonce is little-endian",
            container: [0x11; 32],
            nonce: 0x0102_0304_0506_0708,
            expected_hex: "00010011111111111111111111111111111111111111111111111111111111111111110807060504030201",
        },
        GoldenVector {
            name: "counting container, max nonce",
            container: counting,
            nonce: u64::MAX,
            expected_hex: "000100000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1fffffffffffffffff",
        },
        GoldenVector {
            name: "nonce one",
            container: [0xab; 32],
            nonce: 1,
            expected_hex: "000100abababababababababababababababababababababababababababababababab0100000000000000",
        },
    ]
}

/// Get all malformed identity vectors.
pub fn reject_vectors() -> Vec<RejectVector> {
    let valid = all_vectors()[1].expected_hex;

    vec![
        RejectVector {
            name: "empty",
            hex: String::new(),
            expected: IdentityFormatError::Truncated {
                expected: 43,
                actual: 0,
            },
        },
        RejectVector {
            name: "one byte short",
            hex: valid[..84].to_string(),
            expected: IdentityFormatError::Truncated {
                expected: 43,
                actual: 42,
            },
        },
        RejectVector {
            name: "one trailing byte",
            hex: format!("{valid}00"),
            expected: IdentityFormatError::TrailingBytes(1),
        },
        RejectVector {
            name: "unknown tag",
            hex: format!("01{}", &valid[2..]),
            expected: IdentityFormatError::UnknownTag(0x01),
        },
        RejectVector {
            name: "big-endian version",
            hex: format!("000001{}", &valid[6..]),
            expected: IdentityFormatError::UnsupportedVersion(0x0100),
        },
        RejectVector {
            name: "version zero",
            hex: format!("000000{}", &valid[6..]),
            expected: IdentityFormatError::UnsupportedVersion(0),
        },
    ]
}

/// Check every vector against the encoder and decoder.
///
/// Returns `(name, passed)` per vector, golden vectors first.
pub fn verify_all_vectors() -> Vec<(String, bool)> {
    let golden = all_vectors().into_iter().map(|v| {
        let container = ObjectId::from_bytes(v.container);
        let encoded = hex::encode(encode(&container, v.nonce));
        let decoded = hex::decode(v.expected_hex)
            .ok()
            .and_then(|bytes| decode(&bytes).ok())
            .is_some_and(|id| *id.container() == container && id.nonce() == v.nonce);

        (v.name.to_string(), encoded == v.expected_hex && decoded)
    });

    let rejects = reject_vectors().into_iter().map(|v| {
        let passed = hex::decode(&v.hex)
            .map(|bytes| decode(&bytes) == Err(v.expected.clone()))
            .unwrap_or(false);
        (v.name.to_string(), passed)
    });

    golden.chain(rejects).collect()
}
