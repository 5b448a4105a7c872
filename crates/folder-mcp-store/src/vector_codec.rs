//! float32 little-endian encoding for embedding BLOBs.

/// Encode a vector as little-endian float32 bytes, per the store's
/// versioned vector storage format.
#[must_use]
pub fn encode_vector(v: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(v.len() * 4);
    for x in v {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}

/// Decode little-endian float32 bytes back into a vector.
#[must_use]
pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let v = vec![1.0, -2.5, 0.0, 3.25];
        assert_eq!(decode_vector(&encode_vector(&v)), v);
    }
}
