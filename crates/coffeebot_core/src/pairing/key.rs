//! Canonical group key codec.
//!
//! # Responsibility
//! - Encode an unordered group of emails into one stable string.
//! - Decode stored keys back into sorted email lists.
//!
//! # Invariants
//! - `decode_key(&encode_key(x)) == sorted(x)` for unique, non-empty emails.
//! - `encode_key(&[]) == ""` and `decode_key("") == []`.
//! - Decoding drops empty tokens but never deduplicates.

/// Separator placed between emails inside a canonical key.
pub const KEY_SEPARATOR: char = ',';

/// Encodes a group of emails as a lexicographically sorted, separator-joined key.
pub fn encode_key<S: AsRef<str>>(emails: &[S]) -> String {
    let mut sorted: Vec<&str> = emails.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.join(&KEY_SEPARATOR.to_string())
}

/// Decodes a canonical key into its emails in lexicographic order.
pub fn decode_key(key: &str) -> Vec<String> {
    let mut emails: Vec<String> = key
        .split(KEY_SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();
    emails.sort_unstable();
    emails
}

#[cfg(test)]
mod tests {
    use super::{decode_key, encode_key};

    #[test]
    fn encode_always_sorts_lexicographically() {
        assert_eq!(
            encode_key(&["zzz@gmail.com", "mmm@hotmail.com", "aaa@gmail.com"]),
            "aaa@gmail.com,mmm@hotmail.com,zzz@gmail.com"
        );
    }

    #[test]
    fn encode_handles_empty_group() {
        let empty: [&str; 0] = [];
        assert_eq!(encode_key(&empty), "");
    }

    #[test]
    fn decode_always_sorts_lexicographically() {
        assert_eq!(
            decode_key("zzz@gmail.com,mmm@hotmail.com,aaa@gmail.com"),
            vec!["aaa@gmail.com", "mmm@hotmail.com", "zzz@gmail.com"]
        );
    }

    #[test]
    fn decode_empty_string_yields_no_emails() {
        assert!(decode_key("").is_empty());
    }

    #[test]
    fn decode_drops_empty_tokens_but_keeps_duplicates() {
        assert_eq!(decode_key(",b@x,,a@x,b@x,"), vec!["a@x", "b@x", "b@x"]);
    }

    #[test]
    fn decode_reverses_encode_for_unique_emails() {
        let group = vec![
            "carol@example.com".to_string(),
            "alice@example.com".to_string(),
            "bob@example.com".to_string(),
        ];
        let mut expected = group.clone();
        expected.sort();

        assert_eq!(decode_key(&encode_key(&group)), expected);
    }
}
