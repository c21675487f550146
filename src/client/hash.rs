//! Torrent info-hash helpers.

use data_encoding::{BASE32, HEXLOWER};
use serde_bencode::value::Value;
use sha1::{Digest, Sha1};
use url::Url;

const BTIH_PREFIX: &str = "urn:btih:";
const BASE32_HASH_LEN: usize = 32;

/// Compares two info-hashes case-insensitively.
///
/// Some qBittorrent-compatible emulators (Amarr) report 32-character ed2k
/// hashes right-padded with eight zeros to 40 characters. A padded 40-character
/// hash therefore also matches the 32-character hash equal to its first 32
/// characters, in either argument order.
#[must_use]
pub fn hashes_match(left: &str, right: &str) -> bool {
    let left = left.to_ascii_lowercase();
    let right = right.to_ascii_lowercase();

    if left == right {
        return true;
    }
    padded_matches(&left, &right) || padded_matches(&right, &left)
}

fn padded_matches(padded: &str, short: &str) -> bool {
    padded.len() == 40
        && short.len() == 32
        && padded.ends_with("00000000")
        && padded.get(..32) == Some(short)
}

/// Extracts the info-hash from a magnet URI as lowercase hex.
///
/// 32-character hashes written in the base32 alphabet are decoded to their
/// 40-character hex form; any other all-hex hash is passed through lowercased.
/// Returns `None` for non-magnet URLs or magnets without a `btih` topic.
#[must_use]
pub fn info_hash_from_magnet(uri: &str) -> Option<String> {
    let parsed = Url::parse(uri.trim()).ok()?;
    if parsed.scheme() != "magnet" {
        return None;
    }

    parsed
        .query_pairs()
        .filter(|(key, _)| key.starts_with("xt"))
        .find_map(|(_, value)| {
            let topic = value.get(..BTIH_PREFIX.len())?;
            if !topic.eq_ignore_ascii_case(BTIH_PREFIX) {
                return None;
            }
            normalize_hash(&value[BTIH_PREFIX.len()..])
        })
}

fn normalize_hash(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.len() == BASE32_HASH_LEN
        && let Ok(bytes) = BASE32.decode(raw.to_ascii_uppercase().as_bytes())
    {
        return Some(HEXLOWER.encode(&bytes));
    }
    if raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return Some(raw.to_ascii_lowercase());
    }
    None
}

/// Computes the v1 info-hash of a `.torrent` file as lowercase hex.
///
/// The hash is SHA-1 over the bencoded `info` dictionary. The dictionary is
/// re-encoded canonically (sorted keys), which reproduces the original bytes
/// for every well-formed torrent.
///
/// # Errors
///
/// Returns a description of the problem when `data` is not bencoded, is not a
/// dictionary, or has no `info` dictionary.
pub fn info_hash_from_torrent(data: &[u8]) -> Result<String, String> {
    let root: Value =
        serde_bencode::from_bytes(data).map_err(|e| format!("not a bencoded torrent: {e}"))?;
    let Value::Dict(root) = root else {
        return Err("torrent root is not a dictionary".to_string());
    };
    let info = match root.get(b"info".as_slice()) {
        Some(info @ Value::Dict(_)) => info,
        Some(_) => return Err("torrent info is not a dictionary".to_string()),
        None => return Err("torrent has no info dictionary".to_string()),
    };

    let encoded =
        serde_bencode::to_bytes(info).map_err(|e| format!("cannot re-encode torrent info: {e}"))?;
    Ok(HEXLOWER.encode(&Sha1::digest(&encoded)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_match_case_insensitive() {
        assert!(hashes_match("ABCDEF", "abcdef"));
        assert!(!hashes_match("abcdef", "abcdee"));
    }

    #[test]
    fn test_hashes_match_padded_ed2k() {
        let short = "0123456789abcdef0123456789abcdef";
        let padded = format!("{short}00000000");
        assert!(hashes_match(&padded, short));
        assert!(hashes_match(short, &padded.to_uppercase()));
    }

    #[test]
    fn test_hashes_match_requires_zero_padding() {
        let short = "0123456789abcdef0123456789abcdef";
        let not_padded = format!("{short}00000001");
        assert!(!hashes_match(&not_padded, short));
    }

    #[test]
    fn test_info_hash_from_hex_magnet() {
        let magnet = "magnet:?xt=urn:btih:C12FE1C06BBA254A9DC9F519B335AA7C1367A88A&dn=Book";
        assert_eq!(
            info_hash_from_magnet(magnet).as_deref(),
            Some("c12fe1c06bba254a9dc9f519b335aa7c1367a88a")
        );
    }

    #[test]
    fn test_info_hash_from_base32_magnet() {
        // Base32 of the 20 bytes 0x00..=0x13.
        let magnet = "magnet:?xt=urn:btih:AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQT";
        assert_eq!(
            info_hash_from_magnet(magnet).as_deref(),
            Some("000102030405060708090a0b0c0d0e0f10111213")
        );
    }

    #[test]
    fn test_info_hash_short_hex_passes_through() {
        assert_eq!(
            info_hash_from_magnet("magnet:?xt=urn:btih:ABC123").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_info_hash_base32_alphabet_wins_over_hex() {
        // Only A-F and 2-7, so it also reads as 32 hex digits.
        let raw = "ABCDEF234567ABCDEF234567ABCDEF23";
        let magnet = format!("magnet:?xt=urn:btih:{raw}");
        let expected = HEXLOWER.encode(&BASE32.decode(raw.as_bytes()).unwrap());
        assert_eq!(expected.len(), 40, "base32 hashes decode to 20 bytes");
        assert_eq!(info_hash_from_magnet(&magnet), Some(expected));
    }

    #[test]
    fn test_info_hash_lowercase_base32_magnet() {
        let magnet = "magnet:?xt=urn:btih:aaaqeayeaudaocajbifqydiob4ibceqt";
        assert_eq!(
            info_hash_from_magnet(magnet).as_deref(),
            Some("000102030405060708090a0b0c0d0e0f10111213")
        );
    }

    #[test]
    fn test_info_hash_32_char_hex_with_non_base32_digits_stays_hex() {
        let raw = "0123456789abcdef0123456789abcdef";
        let magnet = format!("magnet:?xt=urn:btih:{raw}");
        assert_eq!(info_hash_from_magnet(&magnet).as_deref(), Some(raw));
    }

    #[test]
    fn test_info_hash_from_torrent_hashes_info_dict() {
        let info = b"d6:lengthi5e4:name9:Book.epub12:piece lengthi16384e6:pieces0:e";
        let mut torrent = b"d8:announce17:http://tracker/an4:info".to_vec();
        torrent.extend_from_slice(info);
        torrent.push(b'e');

        let expected = HEXLOWER.encode(&Sha1::digest(info));
        assert_eq!(info_hash_from_torrent(&torrent).unwrap(), expected);
    }

    #[test]
    fn test_info_hash_from_torrent_rejects_bad_input() {
        assert!(info_hash_from_torrent(b"<html>not found</html>").is_err());
        assert!(info_hash_from_torrent(b"li1ei2ee").is_err());
        assert!(info_hash_from_torrent(b"d8:announce3:urle").is_err());
        assert!(info_hash_from_torrent(b"d4:infoi1ee").is_err());
    }

    #[test]
    fn test_info_hash_absent() {
        assert_eq!(info_hash_from_magnet("https://example.com/book.torrent"), None);
        assert_eq!(info_hash_from_magnet("magnet:?dn=Book"), None);
        assert_eq!(info_hash_from_magnet("magnet:?xt=urn:sha1:abc"), None);
        assert_eq!(info_hash_from_magnet("not a url"), None);
    }
}
