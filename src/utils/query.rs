use anyhow::{bail, Result};

/// Decode a percent-encoded query value into raw bytes.
///
/// `info_hash` and `peer_id` carry arbitrary binary data, so this works on
/// bytes and never round-trips through UTF-8.
pub fn percent_decode(encoded: &str) -> Result<Vec<u8>> {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    bail!("Incomplete percent-encoding at offset {}", i);
                }
                let hi = hex_digit(bytes[i + 1])
                    .ok_or_else(|| anyhow::anyhow!("Invalid hex digit in percent-encoding"))?;
                let lo = hex_digit(bytes[i + 2])
                    .ok_or_else(|| anyhow::anyhow!("Invalid hex digit in percent-encoding"))?;
                decoded.push(hi << 4 | lo);
                i += 3;
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    Ok(decoded)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Split a raw query string into key/value pairs without decoding the values.
pub fn raw_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode_plain() {
        assert_eq!(percent_decode("hello").unwrap(), b"hello");
    }

    #[test]
    fn test_percent_decode_encoded() {
        assert_eq!(percent_decode("%48%65%6c%6c%6f").unwrap(), b"Hello");
        assert_eq!(percent_decode("hello%20world").unwrap(), b"hello world");
        assert_eq!(percent_decode("hello+world").unwrap(), b"hello world");
    }

    #[test]
    fn test_percent_decode_binary() {
        assert_eq!(
            percent_decode("%de%ad%be%ef").unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn test_percent_decode_info_hash() {
        let encoded = "%12%34%56%78%9a%bc%de%f0%11%22%33%44%55%66%77%88%99%aa%bb%cc";
        let decoded = percent_decode(encoded).unwrap();
        assert_eq!(decoded.len(), 20);
        assert_eq!(decoded[0], 0x12);
        assert_eq!(decoded[19], 0xcc);
    }

    #[test]
    fn test_percent_decode_invalid() {
        assert!(percent_decode("%").is_err());
        assert!(percent_decode("%1").is_err());
        assert!(percent_decode("%GG").is_err());
    }

    #[test]
    fn test_raw_pairs() {
        let pairs: Vec<_> = raw_pairs("a=1&b=two&junk&c=").collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "two"), ("c", "")]);
    }
}
