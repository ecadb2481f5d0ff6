use accord_types::primitives::Hash;

/// Compute the BLAKE3 hash of the given data.
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(blake3_hash(b"accord"), blake3_hash(b"accord"));
    }

    #[test]
    fn test_different_input_different_hash() {
        assert_ne!(blake3_hash(b"accord"), blake3_hash(b"discord"));
    }
}
