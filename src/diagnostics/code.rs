//! Short diagnostic codes derived from catalog keys.
//!
//! A code is `<TAG>-<XXXX>`: the language tag followed by four hex digits of a
//! 32-bit FNV-1a hash over the language's salt character and the key, folded to
//! 16 bits. The same key always maps to the same code within a language.

use super::Language;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(bytes: impl IntoIterator<Item = u8>, seed: u32) -> u32 {
    bytes.into_iter().fold(seed, |hash, b| (hash ^ b as u32).wrapping_mul(FNV_PRIME))
}

/// Fold the salted key hash down to 16 bits.
pub fn key_hash(language: Language, key: &str) -> u16 {
    let mut salt = [0u8; 4];
    let salt = language.salt().encode_utf8(&mut salt);
    let hash = fnv1a(key.bytes(), fnv1a(salt.bytes(), FNV_OFFSET));
    ((hash >> 16) ^ (hash & 0xffff)) as u16
}

/// Derive the printable code for a key.
pub fn derive_code(language: Language, key: &str) -> String {
    format!("{}-{:04X}", language.tag(), key_hash(language, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_deterministic() {
        assert_eq!(
            derive_code(Language::Macro, "divide_by_zero"),
            derive_code(Language::Macro, "divide_by_zero")
        );
    }

    #[test]
    fn code_has_fixed_width() {
        for key in ["a", "missing_header", "a_much_longer_key_than_usual"] {
            let code = derive_code(Language::Score, key);
            assert_eq!(code.len(), "SUSL-0000".len(), "{code}");
            assert!(code.starts_with("SUSL-"));
        }
    }

    #[test]
    fn salt_separates_languages() {
        assert_ne!(
            key_hash(Language::Macro, "unexpected_token"),
            key_hash(Language::Score, "unexpected_token")
        );
    }

    #[test]
    fn distinct_keys_get_distinct_codes() {
        assert_ne!(
            derive_code(Language::Macro, "undefined_variable"),
            derive_code(Language::Macro, "undefined_function")
        );
    }
}
