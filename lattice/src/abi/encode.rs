use crate::abi::keccak256;
use crate::abi::param_type::{split_top_level, ParamType};
use crate::abi::token::AbiToken;
use crate::error::Error;
use crate::utils::zpad;
use num256::Int256;

/// Encodes a list of values against their declared parameter types into the
/// 32-byte-word wire format.
///
/// Static parameters land in the head in declaration order. Each dynamic
/// parameter leaves a single offset word in the head, counted in bytes from
/// the start of the whole block, and appends its payload to the tail.
pub fn encode(params: &[ParamType], tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
    if params.len() != tokens.len() {
        return Err(Error::WrongArgumentCount {
            expected: params.len(),
            got: tokens.len(),
        });
    }
    for (token, kind) in tokens.iter().zip(params) {
        token.type_check(kind)?;
    }
    Ok(encode_sequence(params, tokens))
}

/// Given a signature it derives the 4 byte method id used to select the
/// function in call data. The signature is parsed so aliases like `uint`
/// canonicalize to `uint256` before hashing.
pub fn derive_method_id(signature: &str) -> Result<[u8; 4], Error> {
    let digest = derive_signature(signature)?;
    let mut id = [0u8; 4];
    id.copy_from_slice(&digest[0..4]);
    Ok(id)
}

/// Given a signature it derives the full 32 byte hash, the form used as
/// topic zero of event logs.
pub fn derive_signature(signature: &str) -> Result<[u8; 32], Error> {
    let (name, params) = parse_signature(signature)?;
    Ok(keccak256(render_signature(&name, &params).as_bytes()))
}

/// One-shot helper that takes a signature string such as
/// `transfer(address,uint256)` and produces the selector plus encoded
/// arguments, ready to be used as call data.
pub fn encode_call(signature: &str, tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
    let (name, params) = parse_signature(signature)?;
    let digest = keccak256(render_signature(&name, &params).as_bytes());
    let mut out = digest[0..4].to_vec();
    out.extend(encode(&params, tokens)?);
    Ok(out)
}

pub(crate) fn parse_signature(signature: &str) -> Result<(String, Vec<ParamType>), Error> {
    let open = signature
        .find('(')
        .ok_or_else(|| Error::InvalidSignature(signature.to_string()))?;
    let name = &signature[..open];
    if name.is_empty() || !signature.ends_with(')') {
        return Err(Error::InvalidSignature(signature.to_string()));
    }
    let args = &signature[open + 1..signature.len() - 1];
    let params = if args.is_empty() {
        Vec::new()
    } else {
        split_top_level(args)?
            .iter()
            .map(|arg| arg.parse())
            .collect::<Result<Vec<_>, Error>>()?
    };
    Ok((name.to_string(), params))
}

pub(crate) fn render_signature(name: &str, params: &[ParamType]) -> String {
    let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("{}({})", name, rendered.join(","))
}

fn encode_sequence(params: &[ParamType], tokens: &[AbiToken]) -> Vec<u8> {
    let head_len: usize = params.iter().map(ParamType::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for (kind, token) in params.iter().zip(tokens) {
        if kind.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            encode_value(kind, token, &mut tail);
        } else {
            encode_value(kind, token, &mut head);
        }
    }
    head.extend_from_slice(&tail);
    head
}

fn encode_value(kind: &ParamType, token: &AbiToken, out: &mut Vec<u8>) {
    match (kind, token) {
        (ParamType::Uint(_), AbiToken::Uint(value)) => {
            out.extend_from_slice(&zpad(&value.to_be_bytes(), 32));
        }
        (ParamType::Int(_), AbiToken::Int(value)) => {
            out.extend_from_slice(&int_word(value));
        }
        (ParamType::Address, AbiToken::Address(value)) => {
            out.extend_from_slice(&zpad(value.as_bytes(), 32));
        }
        (ParamType::Bool, AbiToken::Bool(value)) => {
            let mut word = [0u8; 32];
            word[31] = *value as u8;
            out.extend_from_slice(&word);
        }
        (ParamType::FixedBytes(_), AbiToken::FixedBytes(value)) => {
            let mut word = [0u8; 32];
            word[..value.len()].copy_from_slice(value);
            out.extend_from_slice(&word);
        }
        (ParamType::Bytes, AbiToken::Bytes(value)) => {
            encode_tail_bytes(value, out);
        }
        (ParamType::String, AbiToken::String(value)) => {
            encode_tail_bytes(value.as_bytes(), out);
        }
        (ParamType::FixedArray(inner, count), AbiToken::FixedArray(elements)) => {
            let kinds = vec![(**inner).clone(); *count];
            out.extend_from_slice(&encode_sequence(&kinds, elements));
        }
        (ParamType::Array(inner), AbiToken::Array(elements)) => {
            out.extend_from_slice(&usize_word(elements.len()));
            let kinds = vec![(**inner).clone(); elements.len()];
            out.extend_from_slice(&encode_sequence(&kinds, elements));
        }
        (ParamType::Tuple(members), AbiToken::Tuple(elements)) => {
            out.extend_from_slice(&encode_sequence(members, elements));
        }
        _ => unreachable!("token shape was validated against the parameter type"),
    }
}

fn encode_tail_bytes(value: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(value.len()));
    out.extend_from_slice(value);
    let remainder = value.len() % 32;
    if remainder != 0 {
        out.extend_from_slice(&vec![0u8; 32 - remainder]);
    }
}

/// Sign extended two's complement representation of a signed integer.
fn int_word(value: &Int256) -> [u8; 32] {
    value.to_be_bytes()
}

fn usize_word(value: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

#[test]
fn derive_baz() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("baz(uint32,bool)").unwrap()),
        "cdcd77c0"
    );
}

#[test]
fn derive_bar() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("bar(bytes3[2])").unwrap()),
        "fce353f6"
    );
}

#[test]
fn derive_sam() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("sam(bytes,bool,uint256[])").unwrap()),
        "a5643bf2"
    );
}

#[test]
fn derive_f() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("f(uint256,uint32[],bytes10,bytes)").unwrap()),
        "8be65246"
    );
}

#[test]
fn derive_canonicalizes_aliases() {
    assert_eq!(
        derive_method_id("transfer(address,uint)").unwrap(),
        derive_method_id("transfer(address,uint256)").unwrap()
    );
}

#[test]
fn derive_rejects_malformed_signatures() {
    assert!(derive_method_id("no_parens").is_err());
    assert!(derive_method_id("(uint256)").is_err());
    assert!(derive_method_id("f(uint256").is_err());
    assert!(derive_method_id("f(elephant)").is_err());
}

#[test]
fn encode_static_pair() {
    use crate::utils::bytes_to_hex_str;
    let params = vec![ParamType::Uint(32), ParamType::Bool];
    let result = encode(&params, &[69u32.into(), true.into()]).unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "0000000000000000000000000000000000000000000000000000000000000045",
            "0000000000000000000000000000000000000000000000000000000000000001"
        )
    );
}

#[test]
fn encode_uint_and_string() {
    use crate::utils::bytes_to_hex_str;
    let params = vec![ParamType::Uint(256), ParamType::String];
    let result = encode(&params, &[1u32.into(), "hi".into()]).unwrap();
    // head is the value and the offset of the tail, the tail is the
    // length-prefixed string padded out to a word boundary
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000040",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "6869000000000000000000000000000000000000000000000000000000000000"
        )
    );
}

#[test]
fn encode_sam_call() {
    use crate::utils::bytes_to_hex_str;
    let result = encode_call(
        "sam(bytes,bool,uint256[])",
        &[
            b"dave".to_vec().into(),
            true.into(),
            AbiToken::Array(vec![1u32.into(), 2u32.into(), 3u32.into()]),
        ],
    )
    .unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "a5643bf2",
            "0000000000000000000000000000000000000000000000000000000000000060",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "00000000000000000000000000000000000000000000000000000000000000a0",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "6461766500000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "0000000000000000000000000000000000000000000000000000000000000003"
        )
    );
}

#[test]
fn encode_f_call() {
    use crate::utils::bytes_to_hex_str;
    let result = encode_call(
        "f(uint256,uint32[],bytes10,bytes)",
        &[
            0x123u32.into(),
            AbiToken::Array(vec![0x456u32.into(), 0x789u32.into()]),
            AbiToken::fixed_bytes(b"1234567890"),
            b"Hello, world!".to_vec().into(),
        ],
    )
    .unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "8be65246",
            "0000000000000000000000000000000000000000000000000000000000000123",
            "0000000000000000000000000000000000000000000000000000000000000080",
            "3132333435363738393000000000000000000000000000000000000000000000",
            "00000000000000000000000000000000000000000000000000000000000000e0",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "0000000000000000000000000000000000000000000000000000000000000456",
            "0000000000000000000000000000000000000000000000000000000000000789",
            "000000000000000000000000000000000000000000000000000000000000000d",
            "48656c6c6f2c20776f726c642100000000000000000000000000000000000000"
        )
    );
}

#[test]
fn encode_negative_int_sign_extends() {
    use crate::utils::bytes_to_hex_str;
    let result = encode(&[ParamType::Int(8)], &[(-1i32).into()]).unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
    );
    let result = encode(&[ParamType::Int(16)], &[(-256i32).into()]).unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff00"
    );
}

#[test]
fn encode_address_zero_pads() {
    use crate::utils::bytes_to_hex_str;
    let address: crate::Address = "0x00000000000000000000000000000000deadbeef".parse().unwrap();
    let result = encode(&[ParamType::Address], &[address.into()]).unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        "00000000000000000000000000000000000000000000000000000000deadbeef"
    );
}

#[test]
fn encode_checks_argument_count() {
    match encode(&[ParamType::Uint(256)], &[]).unwrap_err() {
        Error::WrongArgumentCount {
            expected: 1,
            got: 0,
        } => {}
        _ => panic!(),
    }
}

#[test]
fn static_encoding_has_no_offset_table() {
    // three static parameters come out as exactly three words
    let params = vec![ParamType::Uint(256), ParamType::Bool, ParamType::Address];
    let address: crate::Address = "0x00000000000000000000000000000000deadbeef".parse().unwrap();
    let result = encode(&params, &[7u32.into(), false.into(), address.into()]).unwrap();
    assert_eq!(result.len(), 96);
}

#[test]
fn encode_dynamic_tuple() {
    use crate::utils::bytes_to_hex_str;
    let kind: ParamType = "(uint256,bytes)".parse().unwrap();
    let token = AbiToken::Tuple(vec![5u32.into(), vec![0xaau8].into()]);
    let result = encode(&[kind], &[token]).unwrap();
    // the tuple itself is dynamic so the head is one offset word, the
    // tuple body repeats the head/tail scheme relative to its own start
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000005",
            "0000000000000000000000000000000000000000000000000000000000000040",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "aa00000000000000000000000000000000000000000000000000000000000000"
        )
    );
}
