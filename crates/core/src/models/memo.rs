//! Fixed-width memo field.

use crate::error::{DomainError, DomainResult};

/// Width of the on-chain memo field in bytes.
pub const MEMO_LENGTH: usize = 32;

/// Right-pad `text` with null bytes to exactly `max_length` bytes.
///
/// Length is measured in UTF-8 bytes, not characters.
pub fn encode_memo(text: &str, max_length: usize) -> DomainResult<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() > max_length {
        return Err(DomainError::MemoTooLong {
            max: max_length,
            actual: bytes.len(),
        });
    }

    let mut out = vec![0u8; max_length];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// A 32-byte memo attached to a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memo([u8; MEMO_LENGTH]);

impl Memo {
    /// Encode `text` into a memo.
    pub fn new(text: &str) -> DomainResult<Self> {
        let encoded = encode_memo(text, MEMO_LENGTH)?;
        let mut bytes = [0u8; MEMO_LENGTH];
        bytes.copy_from_slice(&encoded);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; MEMO_LENGTH] {
        &self.0
    }

    /// Text up to the first null byte, lossily decoded.
    pub fn as_text(&self) -> String {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(MEMO_LENGTH);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }

    /// 0x-prefixed hex of the full 32 bytes.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for Memo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_memo_pads_to_fixed_width() {
        for text in ["", "a", "Example transfer with memo", &"x".repeat(32)] {
            let encoded = encode_memo(text, MEMO_LENGTH).unwrap();
            assert_eq!(encoded.len(), MEMO_LENGTH);
            assert!(encoded.starts_with(text.as_bytes()));
            assert!(encoded[text.len()..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_encode_memo_rejects_long_input() {
        let err = encode_memo(&"x".repeat(33), MEMO_LENGTH).unwrap_err();
        assert_eq!(err, DomainError::MemoTooLong { max: 32, actual: 33 });
    }

    // Multi-byte characters count by byte, not by char
    #[test]
    fn test_encode_memo_counts_utf8_bytes() {
        let text = "é".repeat(17); // 17 chars, 34 bytes
        let err = encode_memo(&text, MEMO_LENGTH).unwrap_err();
        assert_eq!(err, DomainError::MemoTooLong { max: 32, actual: 34 });

        assert!(encode_memo(&"é".repeat(16), MEMO_LENGTH).is_ok());
    }

    #[test]
    fn test_encode_memo_custom_width() {
        assert_eq!(encode_memo("ab", 4).unwrap(), vec![b'a', b'b', 0, 0]);
        assert!(encode_memo("abcde", 4).is_err());
    }

    #[test]
    fn test_memo_text_recovery() {
        let memo = Memo::new("Example transfer with memo").unwrap();
        assert_eq!(memo.as_text(), "Example transfer with memo");
        assert_eq!(memo.as_bytes().len(), 32);
        assert!(memo.to_hex().starts_with("0x4578616d706c65"));
    }
}
