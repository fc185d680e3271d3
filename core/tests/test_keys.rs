#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use packguard_core::crypto::{decrypt, encrypt, generate_key, KeyError, PackKey, IV_LEN_16, KEY_LEN_32};

    #[test]
    fn generated_keys_have_the_right_shape() {
        for _ in 0..256 {
            let key = generate_key();
            let s = key.as_str();
            assert_eq!(s.len(), KEY_LEN_32);
            assert!(s.bytes().all(|b| b.is_ascii_alphanumeric()), "{s}");
        }
    }

    #[test]
    fn generated_keys_are_distinct() {
        let keys: HashSet<String> = (0..128).map(|_| generate_key().to_string()).collect();
        assert_eq!(keys.len(), 128);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let short = "a".repeat(31);
        assert_eq!(
            PackKey::parse(&short).unwrap_err(),
            KeyError::InvalidLength { expected: 32, actual: 31 }
        );
        assert!(PackKey::parse(&"a".repeat(33)).is_err());
        assert!(PackKey::parse("").is_err());
    }

    #[test]
    fn parse_rejects_non_alphanumerics() {
        let mut raw = "A".repeat(32);
        raw.replace_range(7..8, "-");
        assert_eq!(PackKey::parse(&raw).unwrap_err(), KeyError::InvalidCharacter { position: 7 });
    }

    #[test]
    fn iv_is_the_key_prefix() {
        let key = PackKey::parse("0123456789abcdefGHIJKLMNOPQRSTUV").unwrap();
        assert_eq!(&key.iv(), b"0123456789abcdef");
        assert_eq!(key.iv().len(), IV_LEN_16);
    }

    #[test]
    fn debug_output_does_not_leak_the_key() {
        let key = PackKey::parse("0123456789abcdefGHIJKLMNOPQRSTUV").unwrap();
        let shown = format!("{key:?}");
        assert!(!shown.contains("GHIJKLMNOPQRSTUV"), "{shown}");
    }

    #[test]
    fn cfb8_preserves_length_and_round_trips() {
        let key = generate_key();
        for len in [0usize, 1, 15, 16, 17, 1000] {
            let plain: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let sealed = encrypt(&plain, &key).unwrap();
            assert_eq!(sealed.len(), plain.len());
            assert_eq!(decrypt(&sealed, &key).unwrap(), plain);
        }
    }

    #[test]
    fn same_key_same_plaintext_same_ciphertext() {
        // IV is derived from the key, so encryption is deterministic per key.
        let key = generate_key();
        assert_eq!(encrypt(b"hello", &key).unwrap(), encrypt(b"hello", &key).unwrap());
        assert_ne!(encrypt(b"hello", &key).unwrap(), encrypt(b"hello", &generate_key()).unwrap());
    }
}
