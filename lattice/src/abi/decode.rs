use crate::abi::param_type::ParamType;
use crate::abi::token::AbiToken;
use crate::address::Address;
use crate::error::Error;
use num256::{Int256, Uint256};
use std::str;

/// Decodes wire data against a list of declared parameter types, mirroring
/// the encoder. The only failures are structural ones: data shorter than the
/// head requires, or offset and length words that leave the data's bounds.
///
/// Decoding is purely a function of the declared types and the bytes. A
/// wrong type list cannot be detected here and produces plausible-looking
/// garbage rather than an error.
pub fn decode(params: &[ParamType], data: &[u8]) -> Result<Vec<AbiToken>, Error> {
    decode_sequence(params, data, 0)
}

/// Decodes one head/tail block whose head starts at `frame`. Offset words
/// inside the block are relative to `frame`.
fn decode_sequence(params: &[ParamType], data: &[u8], frame: usize) -> Result<Vec<AbiToken>, Error> {
    let mut tokens = Vec::with_capacity(params.len());
    let mut cursor = frame;
    for kind in params {
        if kind.is_dynamic() {
            let offset = read_length(data, cursor)?;
            cursor += 32;
            let at = frame.checked_add(offset).ok_or(Error::OversizedWord)?;
            if at > data.len() {
                return Err(Error::OffsetOutOfBounds {
                    offset: at,
                    length: data.len(),
                });
            }
            tokens.push(decode_value(kind, data, at)?);
        } else {
            tokens.push(decode_value(kind, data, cursor)?);
            cursor += kind.head_size();
        }
    }
    Ok(tokens)
}

/// Decodes a single value whose encoding starts at the absolute position
/// `at` within `data`.
fn decode_value(kind: &ParamType, data: &[u8], at: usize) -> Result<AbiToken, Error> {
    match kind {
        ParamType::Uint(_) => Ok(AbiToken::Uint(Uint256::from_be_bytes(read_word(
            data, at,
        )?))),
        ParamType::Int(_) => Ok(AbiToken::Int(Int256::from_be_bytes(read_word(data, at)?))),
        ParamType::Address => {
            let word = read_word(data, at)?;
            Ok(AbiToken::Address(Address::from_slice(&word[12..])?))
        }
        ParamType::Bool => Ok(AbiToken::Bool(read_word(data, at)?[31] != 0)),
        ParamType::FixedBytes(width) => {
            let word = read_word(data, at)?;
            Ok(AbiToken::FixedBytes(word[..*width].to_vec()))
        }
        ParamType::Bytes => {
            let length = read_length(data, at)?;
            Ok(AbiToken::Bytes(read_bytes(data, at + 32, length)?.to_vec()))
        }
        ParamType::String => {
            let length = read_length(data, at)?;
            let bytes = read_bytes(data, at + 32, length)?;
            Ok(AbiToken::String(str::from_utf8(bytes)?.to_owned()))
        }
        ParamType::Array(inner) => {
            let length = read_length(data, at)?;
            // every element occupies at least one word in the sequence head,
            // reject length words that the remaining data cannot possibly hold
            let available = data.len().saturating_sub(at + 32);
            if length > available / 32 {
                return Err(Error::TruncatedData {
                    needed: length.saturating_mul(32),
                    available,
                });
            }
            let kinds = vec![(**inner).clone(); length];
            Ok(AbiToken::Array(decode_sequence(&kinds, data, at + 32)?))
        }
        ParamType::FixedArray(inner, count) => {
            let kinds = vec![(**inner).clone(); *count];
            Ok(AbiToken::FixedArray(decode_sequence(&kinds, data, at)?))
        }
        ParamType::Tuple(members) => {
            Ok(AbiToken::Tuple(decode_sequence(members, data, at)?))
        }
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], Error> {
    let end = at.checked_add(32).ok_or(Error::OversizedWord)?;
    data.get(at..end).ok_or(Error::TruncatedData {
        needed: end,
        available: data.len(),
    })
}

/// Reads an offset or length word, which must fit the addressable range.
fn read_length(data: &[u8], at: usize) -> Result<usize, Error> {
    let word = read_word(data, at)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(Error::OversizedWord);
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|_| Error::OversizedWord)
}

fn read_bytes(data: &[u8], at: usize, length: usize) -> Result<&[u8], Error> {
    let end = at.checked_add(length).ok_or(Error::OversizedWord)?;
    data.get(at..end).ok_or(Error::TruncatedData {
        needed: end,
        available: data.len(),
    })
}

#[cfg(test)]
fn round_trip(params: &[ParamType], tokens: &[AbiToken]) {
    use crate::abi::encode::encode;
    let encoded = encode(params, tokens).unwrap();
    assert_eq!(encoded.len() % 32, 0);
    assert_eq!(decode(params, &encoded).unwrap(), tokens);
}

#[test]
fn round_trip_scalars() {
    let address: Address = "0x00000000000000000000000000000000deadbeef".parse().unwrap();
    round_trip(
        &[
            ParamType::Uint(64),
            ParamType::Int(32),
            ParamType::Bool,
            ParamType::Address,
            ParamType::FixedBytes(3),
        ],
        &[
            1234567u64.into(),
            (-77i32).into(),
            true.into(),
            address.into(),
            AbiToken::fixed_bytes(&[9, 8, 7]),
        ],
    );
}

#[test]
fn round_trip_dynamic_types() {
    round_trip(
        &[ParamType::String, ParamType::Bytes],
        &["delegate call considered harmful".into(), vec![0u8; 33].into()],
    );
}

#[test]
fn round_trip_nested_composites() {
    let kind: ParamType = "(uint256,string[],(bool,bytes))[2]".parse().unwrap();
    let element = |n: u32, s: &str| {
        AbiToken::Tuple(vec![
            n.into(),
            AbiToken::Array(vec![s.into(), "constant".into()]),
            AbiToken::Tuple(vec![true.into(), vec![1, 2, 3].into()]),
        ])
    };
    round_trip(
        &[kind],
        &[AbiToken::FixedArray(vec![
            element(1, "first"),
            element(2, "second"),
        ])],
    );
}

#[test]
fn round_trip_empty_dynamic_values() {
    round_trip(
        &[ParamType::String, ParamType::Array(Box::new(ParamType::Uint(256)))],
        &["".into(), AbiToken::Array(Vec::new())],
    );
}

#[test]
fn round_trip_random_uints() {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let value: u128 = rng.gen();
        round_trip(&[ParamType::Uint(128)], &[value.into()]);
        let value: i64 = rng.gen();
        round_trip(&[ParamType::Int(64)], &[value.into()]);
    }
}

#[test]
fn negative_int_round_trips_through_full_word() {
    use crate::abi::encode::encode;
    let encoded = encode(&[ParamType::Int(8)], &[(-100i32).into()]).unwrap();
    let decoded = decode(&[ParamType::Int(8)], &encoded).unwrap();
    assert_eq!(decoded, vec![(-100i32).into()]);
}

#[test]
fn decoding_does_not_mask_excess_bits() {
    // a uint8 read from a word with high bits set keeps the full word's
    // value, the declared width only matters when encoding
    let mut word = [0u8; 32];
    word[30] = 1;
    word[31] = 4;
    let decoded = decode(&[ParamType::Uint(8)], &word).unwrap();
    assert_eq!(decoded, vec![260u32.into()]);
}

#[test]
fn truncated_head_is_rejected() {
    let e = decode(&[ParamType::Uint(256), ParamType::Uint(256)], &[0u8; 32]).unwrap_err();
    match e {
        Error::TruncatedData {
            needed: 64,
            available: 32,
        } => {}
        _ => panic!(),
    }
}

#[test]
fn out_of_bounds_offset_is_rejected() {
    // a single dynamic parameter whose offset word points past the data
    let mut data = [0u8; 32];
    data[31] = 0xff;
    match decode(&[ParamType::Bytes], &data).unwrap_err() {
        Error::OffsetOutOfBounds {
            offset: 255,
            length: 32,
        } => {}
        _ => panic!(),
    }
}

#[test]
fn oversized_offset_word_is_rejected() {
    let data = [0xffu8; 32];
    match decode(&[ParamType::Bytes], &data).unwrap_err() {
        Error::OversizedWord => {}
        _ => panic!(),
    }
}

#[test]
fn truncated_tail_is_rejected() {
    use crate::abi::encode::encode;
    let mut encoded = encode(&[ParamType::Bytes], &[vec![1u8; 40].into()]).unwrap();
    encoded.truncate(encoded.len() - 32);
    assert!(decode(&[ParamType::Bytes], &encoded).is_err());
}

#[test]
fn oversized_array_length_is_rejected() {
    // length word claims far more elements than the data can hold
    let mut data = vec![0u8; 64];
    data[31] = 0x20;
    data[62] = 0xff;
    assert!(decode(
        &[ParamType::Array(Box::new(ParamType::Uint(256)))],
        &data
    )
    .is_err());
}

#[test]
fn invalid_utf8_string_is_rejected() {
    use crate::abi::encode::encode;
    let encoded = encode(&[ParamType::Bytes], &[vec![0xff, 0xfe].into()]).unwrap();
    match decode(&[ParamType::String], &encoded).unwrap_err() {
        Error::InvalidUtf8(_) => {}
        _ => panic!(),
    }
}
