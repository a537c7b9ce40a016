use crate::abi::entry::AbiInput;
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// A parameter type from a contract's ABI description.
///
/// Static types have an encoded width known from the type alone, dynamic
/// types (bytes, strings, dynamic arrays and anything containing them) are
/// encoded behind an offset word in the head of the enclosing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Uint(usize),
    Int(usize),
    Address,
    Bool,
    FixedBytes(usize),
    Bytes,
    String,
    FixedArray(Box<ParamType>, usize),
    Array(Box<ParamType>),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Number of bytes this parameter occupies in the head of an encoded
    /// block. Dynamic types leave a single offset word there.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            ParamType::FixedArray(inner, count) => count * inner.head_size(),
            ParamType::Tuple(members) => members.iter().map(ParamType::head_size).sum(),
            _ => 32,
        }
    }

    /// Resolves a type string from an ABI description, using `components`
    /// for the members of `tuple` types.
    pub fn from_abi(kind: &str, components: &[AbiInput]) -> Result<ParamType, Error> {
        if let Some(stripped) = kind.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Error::UnknownType(kind.to_string()))?;
            let inner = ParamType::from_abi(&stripped[..open], components)?;
            let count = &stripped[open + 1..];
            return if count.is_empty() {
                Ok(ParamType::Array(Box::new(inner)))
            } else {
                let count = count
                    .parse()
                    .map_err(|_| Error::UnknownType(kind.to_string()))?;
                Ok(ParamType::FixedArray(Box::new(inner), count))
            };
        }
        if kind == "tuple" {
            let members = components
                .iter()
                .map(|member| ParamType::from_abi(&member.type_, &member.components))
                .collect::<Result<Vec<_>, Error>>()?;
            return Ok(ParamType::Tuple(members));
        }
        atom(kind)
    }
}

/// Splits `s` at commas that sit outside of any parenthesized group.
pub(crate) fn split_top_level(s: &str) -> Result<Vec<&str>, Error> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::InvalidSignature(s.to_string()))?
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::InvalidSignature(s.to_string()));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn atom(kind: &str) -> Result<ParamType, Error> {
    match kind {
        "address" => Ok(ParamType::Address),
        "bool" => Ok(ParamType::Bool),
        "string" => Ok(ParamType::String),
        "bytes" => Ok(ParamType::Bytes),
        _ if kind.starts_with("uint") => {
            int_bits(&kind[4..]).map(ParamType::Uint).ok_or_else(|| Error::UnknownType(kind.to_string()))
        }
        _ if kind.starts_with("int") => {
            int_bits(&kind[3..]).map(ParamType::Int).ok_or_else(|| Error::UnknownType(kind.to_string()))
        }
        _ if kind.starts_with("bytes") => {
            byte_width(&kind[5..]).map(ParamType::FixedBytes).ok_or_else(|| Error::UnknownType(kind.to_string()))
        }
        _ => Err(Error::UnknownType(kind.to_string())),
    }
}

fn int_bits(suffix: &str) -> Option<usize> {
    if suffix.is_empty() {
        // bare "uint"/"int" are aliases for the full width
        return Some(256);
    }
    let bits: usize = suffix.parse().ok()?;
    if bits % 8 == 0 && (8..=256).contains(&bits) {
        Some(bits)
    } else {
        None
    }
}

fn byte_width(suffix: &str) -> Option<usize> {
    let width: usize = suffix.parse().ok()?;
    if (1..=32).contains(&width) {
        Some(width)
    } else {
        None
    }
}

impl FromStr for ParamType {
    type Err = Error;

    /// Parses the canonical signature form of a type, with tuples written
    /// as parenthesized member lists.
    fn from_str(s: &str) -> Result<ParamType, Error> {
        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Error::UnknownType(s.to_string()))?;
            let inner: ParamType = stripped[..open].parse()?;
            let count = &stripped[open + 1..];
            return if count.is_empty() {
                Ok(ParamType::Array(Box::new(inner)))
            } else {
                let count = count.parse().map_err(|_| Error::UnknownType(s.to_string()))?;
                Ok(ParamType::FixedArray(Box::new(inner), count))
            };
        }
        if let Some(inner) = s.strip_prefix('(') {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| Error::InvalidSignature(s.to_string()))?;
            if inner.is_empty() {
                return Ok(ParamType::Tuple(Vec::new()));
            }
            let members = split_top_level(inner)?
                .iter()
                .map(|member| member.parse())
                .collect::<Result<Vec<_>, Error>>()?;
            return Ok(ParamType::Tuple(members));
        }
        atom(s)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::FixedBytes(width) => write!(f, "bytes{width}"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::String => write!(f, "string"),
            ParamType::FixedArray(inner, count) => write!(f, "{inner}[{count}]"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::Tuple(members) => {
                let rendered: Vec<String> =
                    members.iter().map(ToString::to_string).collect();
                write!(f, "({})", rendered.join(","))
            }
        }
    }
}

#[test]
fn parse_scalars() {
    assert_eq!("uint256".parse::<ParamType>().unwrap(), ParamType::Uint(256));
    assert_eq!("uint".parse::<ParamType>().unwrap(), ParamType::Uint(256));
    assert_eq!("int64".parse::<ParamType>().unwrap(), ParamType::Int(64));
    assert_eq!("address".parse::<ParamType>().unwrap(), ParamType::Address);
    assert_eq!("bytes32".parse::<ParamType>().unwrap(), ParamType::FixedBytes(32));
    assert_eq!("bytes".parse::<ParamType>().unwrap(), ParamType::Bytes);
    assert_eq!("string".parse::<ParamType>().unwrap(), ParamType::String);
}

#[test]
fn parse_nested_arrays() {
    assert_eq!(
        "uint256[3][]".parse::<ParamType>().unwrap(),
        ParamType::Array(Box::new(ParamType::FixedArray(
            Box::new(ParamType::Uint(256)),
            3
        )))
    );
}

#[test]
fn parse_tuple_signature() {
    assert_eq!(
        "(uint256,bytes)[2]".parse::<ParamType>().unwrap(),
        ParamType::FixedArray(
            Box::new(ParamType::Tuple(vec![
                ParamType::Uint(256),
                ParamType::Bytes
            ])),
            2
        )
    );
}

#[test]
fn rejects_malformed_types() {
    assert!("uint257".parse::<ParamType>().is_err());
    assert!("uint0".parse::<ParamType>().is_err());
    assert!("bytes0".parse::<ParamType>().is_err());
    assert!("bytes33".parse::<ParamType>().is_err());
    assert!("elephant".parse::<ParamType>().is_err());
    assert!("uint256[".parse::<ParamType>().is_err());
    assert!("(uint256".parse::<ParamType>().is_err());
}

#[test]
fn resolves_tuple_components() {
    let components = vec![
        AbiInput {
            name: "a".to_owned(),
            type_: "uint256".to_owned(),
            components: Vec::new(),
            indexed: false,
        },
        AbiInput {
            name: "b".to_owned(),
            type_: "uint256[]".to_owned(),
            components: Vec::new(),
            indexed: false,
        },
    ];
    assert_eq!(
        ParamType::from_abi("tuple", &components).unwrap(),
        ParamType::Tuple(vec![
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::Uint(256)))
        ])
    );
}

#[test]
fn dynamic_classification() {
    assert!(!"uint256".parse::<ParamType>().unwrap().is_dynamic());
    assert!(!"bytes3[2]".parse::<ParamType>().unwrap().is_dynamic());
    assert!("bytes".parse::<ParamType>().unwrap().is_dynamic());
    assert!("uint256[]".parse::<ParamType>().unwrap().is_dynamic());
    assert!("(uint256,string)".parse::<ParamType>().unwrap().is_dynamic());
    assert!("string[2]".parse::<ParamType>().unwrap().is_dynamic());
}

#[test]
fn head_sizes() {
    assert_eq!("uint8".parse::<ParamType>().unwrap().head_size(), 32);
    assert_eq!("bytes3[2]".parse::<ParamType>().unwrap().head_size(), 64);
    assert_eq!(
        "(uint256,address,bool)".parse::<ParamType>().unwrap().head_size(),
        96
    );
    // dynamic types take exactly one offset word in the head
    assert_eq!("uint256[]".parse::<ParamType>().unwrap().head_size(), 32);
}

#[test]
fn canonical_rendering() {
    let kind: ParamType = "(uint256,bytes32[4],string)[]".parse().unwrap();
    assert_eq!(kind.to_string(), "(uint256,bytes32[4],string)[]");
}
