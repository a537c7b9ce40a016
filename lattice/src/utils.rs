use crate::error::Error;
use std::str;

/// A function that takes a hexadecimal representation of bytes
/// back into a stream of bytes.
pub fn hex_str_to_bytes(s: &str) -> Result<Vec<u8>, Error> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    stripped
        .as_bytes()
        .chunks(2)
        .map(|chunk| {
            let chars = str::from_utf8(chunk)?;
            Ok(u8::from_str_radix(chars, 16)?)
        })
        .collect()
}

pub fn bytes_to_hex_str(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Pad bytes with zeros at the start.
pub fn zpad(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes.to_vec();
    }
    let mut padded = vec![0u8; len - bytes.len()];
    padded.extend_from_slice(bytes);
    padded
}

#[test]
fn decode_bytes() {
    assert_eq!(
        hex_str_to_bytes("c0ffee").expect("Unable to decode"),
        [0xc0, 0xff, 0xee]
    );
}

#[test]
fn decode_prefixed_bytes() {
    assert_eq!(
        hex_str_to_bytes("0xdeadbeef").unwrap(),
        vec![0xde, 0xad, 0xbe, 0xef]
    );
}

#[test]
fn decode_odd_amount_of_bytes() {
    assert_eq!(hex_str_to_bytes("f").unwrap(), vec![15]);
}

#[test]
fn decode_empty_prefixed() {
    assert_eq!(hex_str_to_bytes("0x").unwrap(), Vec::<u8>::new());
}

#[test]
fn bytes_raises_decode_error() {
    let e = hex_str_to_bytes("\u{012345}deadbeef").unwrap_err();
    match e {
        Error::InvalidUtf8(_) => {}
        _ => panic!(),
    };
}

#[test]
fn bytes_raises_parse_error() {
    let e = hex_str_to_bytes("Lorem ipsum").unwrap_err();
    match e {
        Error::InvalidHex(_) => {}
        _ => panic!(),
    }
}

#[test]
fn encode_bytes() {
    assert_eq!(bytes_to_hex_str(&[0xf]), "0f".to_owned());
    assert_eq!(bytes_to_hex_str(&[0xff]), "ff".to_owned());
    assert_eq!(
        bytes_to_hex_str(&[0xde, 0xad, 0xbe, 0xef]),
        "deadbeef".to_owned()
    );
}

#[test]
fn verify_zpad() {
    assert_eq!(zpad(&[1, 2, 3, 4], 8), [0, 0, 0, 0, 1, 2, 3, 4]);
}

#[test]
fn verify_zpad_exact() {
    assert_eq!(zpad(&[1, 2, 3, 4], 4), [1, 2, 3, 4]);
}

#[test]
fn verify_zpad_less_than_size() {
    assert_eq!(zpad(&[1, 2, 3, 4], 2), [1, 2, 3, 4]);
}
