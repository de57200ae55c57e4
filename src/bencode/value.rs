use std::collections::BTreeMap;
use thiserror::Error;

use super::encoder::BencodeEncode;

/// Nesting depth allowed when decoding untrusted input.
const MAX_DEPTH: usize = 64;

/// A bencode value tree.
///
/// Dictionary keys are raw byte strings held in a `BTreeMap`, so encoding
/// always emits keys in ascending raw-byte order. Clients verify canonical
/// form, so this is a wire-format requirement rather than a convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(BTreeMap<Vec<u8>, Value>),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of input at offset {0}")]
    UnexpectedEof(usize),

    #[error("Unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },

    #[error("Invalid integer at offset {0}")]
    InvalidInteger(usize),

    #[error("Invalid string length at offset {0}")]
    InvalidLength(usize),

    #[error("Trailing data after value at offset {0}")]
    TrailingData(usize),

    #[error("Nesting depth limit exceeded")]
    DepthLimit,
}

impl Value {
    pub fn bytes(s: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(s.into())
    }

    /// Encode this value into `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Int(i) => i.bencode(buf),
            Value::Bytes(b) => b.as_slice().bencode(buf),
            Value::List(items) => {
                buf.extend_from_slice(b"l");
                for item in items {
                    item.encode(buf);
                }
                buf.extend_from_slice(b"e");
            }
            Value::Dict(entries) => {
                buf.extend_from_slice(b"d");
                for (key, value) in entries {
                    key.as_slice().bencode(buf);
                    value.encode(buf);
                }
                buf.extend_from_slice(b"e");
            }
        }
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        self.encode(&mut buf);
        buf
    }

    /// Decode a single bencode value spanning all of `input`.
    ///
    /// Rejects truncated or malformed input and trailing bytes after the
    /// root value.
    pub fn decode(input: &[u8]) -> Result<Value, DecodeError> {
        let mut cursor = Cursor { input, pos: 0 };
        let value = cursor.parse_value(0)?;
        if cursor.pos != input.len() {
            return Err(DecodeError::TrailingData(cursor.pos));
        }
        Ok(value)
    }
}

struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Result<u8, DecodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof(self.pos))
    }

    fn advance(&mut self) -> Result<u8, DecodeError> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::DepthLimit);
        }

        match self.peek()? {
            b'i' => self.parse_int(),
            b'l' => self.parse_list(depth),
            b'd' => self.parse_dict(depth),
            b'0'..=b'9' => Ok(Value::Bytes(self.parse_bytes()?)),
            byte => Err(DecodeError::UnexpectedByte {
                byte,
                offset: self.pos,
            }),
        }
    }

    fn parse_int(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        self.advance()?; // 'i'

        let negative = if self.peek()? == b'-' {
            self.advance()?;
            true
        } else {
            false
        };

        let digits_start = self.pos;
        let mut value: i64 = 0;
        loop {
            match self.advance()? {
                b'e' => break,
                b @ b'0'..=b'9' => {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add((b - b'0') as i64))
                        .ok_or(DecodeError::InvalidInteger(start))?;
                }
                _ => return Err(DecodeError::InvalidInteger(start)),
            }
        }

        let digit_count = self.pos - 1 - digits_start;
        if digit_count == 0 {
            // "ie" or "i-e"
            return Err(DecodeError::InvalidInteger(start));
        }
        // Leading zeros and negative zero are not canonical
        if digit_count > 1 && self.input[digits_start] == b'0' {
            return Err(DecodeError::InvalidInteger(start));
        }
        if negative && value == 0 {
            return Err(DecodeError::InvalidInteger(start));
        }

        Ok(Value::Int(if negative { -value } else { value }))
    }

    fn parse_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let start = self.pos;
        let mut len: usize = 0;
        loop {
            match self.advance()? {
                b':' => break,
                b @ b'0'..=b'9' => {
                    len = len
                        .checked_mul(10)
                        .and_then(|v| v.checked_add((b - b'0') as usize))
                        .ok_or(DecodeError::InvalidLength(start))?;
                }
                _ => return Err(DecodeError::InvalidLength(start)),
            }
        }

        // Length declared by the input must fit in what remains
        if len > self.input.len() - self.pos {
            return Err(DecodeError::UnexpectedEof(self.input.len()));
        }

        let bytes = self.input[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.advance()?; // 'l'
        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.parse_value(depth + 1)?);
        }
        self.advance()?; // 'e'
        Ok(Value::List(items))
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.advance()?; // 'd'
        let mut entries = BTreeMap::new();
        while self.peek()? != b'e' {
            let key_offset = self.pos;
            if !self.peek()?.is_ascii_digit() {
                return Err(DecodeError::UnexpectedByte {
                    byte: self.peek()?,
                    offset: key_offset,
                });
            }
            let key = self.parse_bytes()?;
            let value = self.parse_value(depth + 1)?;
            entries.insert(key, value);
        }
        self.advance()?; // 'e'
        Ok(Value::Dict(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: Vec<(&str, Value)>) -> Value {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.as_bytes().to_vec(), v))
                .collect(),
        )
    }

    #[test]
    fn test_encode_int() {
        assert_eq!(Value::Int(42).encode_to_vec(), b"i42e");
        assert_eq!(Value::Int(-7).encode_to_vec(), b"i-7e");
        assert_eq!(Value::Int(0).encode_to_vec(), b"i0e");
    }

    #[test]
    fn test_encode_bytes_uses_byte_length() {
        // Raw hash bytes are not UTF-8; length must be byte count
        let raw = vec![0xde, 0xad, 0xbe, 0xef];
        assert_eq!(Value::Bytes(raw).encode_to_vec(), b"4:\xde\xad\xbe\xef");
    }

    #[test]
    fn test_encode_canonical_key_order() {
        let a_first = dict(vec![
            ("a", Value::Int(2)),
            ("b", Value::Int(1)),
        ]);
        let b_first = dict(vec![
            ("b", Value::Int(1)),
            ("a", Value::Int(2)),
        ]);

        let bytes = a_first.encode_to_vec();
        assert_eq!(bytes, b_first.encode_to_vec());
        assert_eq!(bytes, b"d1:ai2e1:bi1ee");
    }

    #[test]
    fn test_decode_int() {
        assert_eq!(Value::decode(b"i42e").unwrap(), Value::Int(42));
        assert_eq!(Value::decode(b"i-42e").unwrap(), Value::Int(-42));
        assert_eq!(Value::decode(b"i0e").unwrap(), Value::Int(0));
    }

    #[test]
    fn test_decode_int_rejects_non_canonical() {
        assert!(Value::decode(b"ie").is_err());
        assert!(Value::decode(b"i-e").is_err());
        assert!(Value::decode(b"i042e").is_err());
        assert!(Value::decode(b"i-0e").is_err());
        assert!(Value::decode(b"i4x2e").is_err());
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(
            Value::decode(b"5:hello").unwrap(),
            Value::bytes(&b"hello"[..])
        );
        assert_eq!(Value::decode(b"0:").unwrap(), Value::bytes(Vec::new()));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            Value::decode(b"5:hel"),
            Err(DecodeError::UnexpectedEof(5))
        );
        assert!(Value::decode(b"i42").is_err());
        assert!(Value::decode(b"l i1e").is_err());
        assert!(Value::decode(b"d3:fooi1e").is_err());
    }

    #[test]
    fn test_decode_trailing_data() {
        assert_eq!(
            Value::decode(b"i1ejunk"),
            Err(DecodeError::TrailingData(3))
        );
    }

    #[test]
    fn test_decode_huge_declared_length() {
        // Declared length far past the end of input must not panic
        assert!(Value::decode(b"99999999:x").is_err());
    }

    #[test]
    fn test_decode_depth_limit() {
        let mut input = Vec::new();
        input.extend(std::iter::repeat(b'l').take(200));
        input.extend(std::iter::repeat(b'e').take(200));
        assert_eq!(Value::decode(&input), Err(DecodeError::DepthLimit));
    }

    #[test]
    fn test_decode_dict_key_must_be_string() {
        assert!(Value::decode(b"di1ei2ee").is_err());
    }

    #[test]
    fn test_round_trip() {
        let value = dict(vec![
            ("complete", Value::Int(12)),
            ("incomplete", Value::Int(3)),
            (
                "peers",
                Value::List(vec![
                    dict(vec![
                        ("ip", Value::bytes(&b"10.0.0.1"[..])),
                        ("peer id", Value::Bytes(vec![0u8; 20])),
                        ("port", Value::Int(6881)),
                    ]),
                    dict(vec![
                        ("ip", Value::bytes(&b"10.0.0.2"[..])),
                        ("peer id", Value::Bytes(vec![0xff; 20])),
                        ("port", Value::Int(51413)),
                    ]),
                ]),
            ),
        ]);

        let encoded = value.encode_to_vec();
        assert_eq!(Value::decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_round_trip_binary_keys() {
        let mut entries = BTreeMap::new();
        entries.insert(vec![0x00, 0xff], Value::Int(1));
        entries.insert(vec![0x00, 0x01], Value::Int(2));
        let value = Value::Dict(entries);

        let encoded = value.encode_to_vec();
        // 0x0001 sorts before 0x00ff byte-wise
        assert_eq!(&encoded[..], &b"d2:\x00\x01i2e2:\x00\xffi1ee"[..]);
        assert_eq!(Value::decode(&encoded).unwrap(), value);
    }
}
