use crate::abi::param_type::ParamType;
use crate::address::Address;
use crate::error::Error;
use num256::{Int256, Uint256};

/// A token represents a value of a parameter of a contract call.
///
/// Numbers are carried as `Uint256`/`Int256` regardless of the declared bit
/// width, the width is enforced when the token is checked against its
/// parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiToken {
    Uint(Uint256),
    Int(Int256),
    Address(Address),
    Bool(bool),
    /// Fixed size sequence of bytes
    FixedBytes(Vec<u8>),
    /// Dynamic sequence of bytes
    Bytes(Vec<u8>),
    String(String),
    FixedArray(Vec<AbiToken>),
    Array(Vec<AbiToken>),
    Tuple(Vec<AbiToken>),
}

impl AbiToken {
    pub fn fixed_bytes(value: &[u8]) -> AbiToken {
        AbiToken::FixedBytes(value.to_vec())
    }

    /// Validates that this token can be encoded as `kind`, including the
    /// declared bit width for integers and the length of fixed sizes.
    pub fn type_check(&self, kind: &ParamType) -> Result<(), Error> {
        match (self, kind) {
            (AbiToken::Uint(value), ParamType::Uint(bits)) => {
                if value.0.bits() as usize <= *bits {
                    Ok(())
                } else {
                    Err(Error::ValueOutOfRange(format!(
                        "{value} does not fit in uint{bits}"
                    )))
                }
            }
            (AbiToken::Int(value), ParamType::Int(bits)) => {
                // magnitude check in two's complement: the most negative
                // value -2^(bits-1) is one further out than the positive end
                let magnitude = if value.0.is_negative() {
                    (value.clone() + Int256::from(1u32)).0.unsigned_abs().bits()
                } else {
                    value.0.bits()
                };
                if magnitude as usize <= bits - 1 {
                    Ok(())
                } else {
                    Err(Error::ValueOutOfRange(format!(
                        "{value} does not fit in int{bits}"
                    )))
                }
            }
            (AbiToken::Address(_), ParamType::Address)
            | (AbiToken::Bool(_), ParamType::Bool)
            | (AbiToken::Bytes(_), ParamType::Bytes)
            | (AbiToken::String(_), ParamType::String) => Ok(()),
            (AbiToken::FixedBytes(value), ParamType::FixedBytes(width)) => {
                if value.len() == *width {
                    Ok(())
                } else {
                    Err(Error::ValueOutOfRange(format!(
                        "{} bytes where bytes{width} was declared",
                        value.len()
                    )))
                }
            }
            (AbiToken::FixedArray(elements), ParamType::FixedArray(inner, count)) => {
                if elements.len() != *count {
                    return Err(Error::ValueOutOfRange(format!(
                        "{} elements where {count} were declared",
                        elements.len()
                    )));
                }
                for element in elements {
                    element.type_check(inner)?;
                }
                Ok(())
            }
            (AbiToken::Array(elements), ParamType::Array(inner)) => {
                for element in elements {
                    element.type_check(inner)?;
                }
                Ok(())
            }
            (AbiToken::Tuple(elements), ParamType::Tuple(members)) => {
                if elements.len() != members.len() {
                    return Err(Error::TypeMismatch {
                        expected: kind.to_string(),
                        got: format!("tuple of {} elements", elements.len()),
                    });
                }
                for (element, member) in elements.iter().zip(members) {
                    element.type_check(member)?;
                }
                Ok(())
            }
            (token, kind) => Err(Error::TypeMismatch {
                expected: kind.to_string(),
                got: token.type_name().to_string(),
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AbiToken::Uint(_) => "uint",
            AbiToken::Int(_) => "int",
            AbiToken::Address(_) => "address",
            AbiToken::Bool(_) => "bool",
            AbiToken::FixedBytes(_) => "fixed bytes",
            AbiToken::Bytes(_) => "bytes",
            AbiToken::String(_) => "string",
            AbiToken::FixedArray(_) => "fixed array",
            AbiToken::Array(_) => "array",
            AbiToken::Tuple(_) => "tuple",
        }
    }
}

impl From<u8> for AbiToken {
    fn from(v: u8) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u16> for AbiToken {
    fn from(v: u16) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u32> for AbiToken {
    fn from(v: u32) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u64> for AbiToken {
    fn from(v: u64) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u128> for AbiToken {
    fn from(v: u128) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<Uint256> for AbiToken {
    fn from(v: Uint256) -> AbiToken {
        AbiToken::Uint(v)
    }
}

impl From<i8> for AbiToken {
    fn from(v: i8) -> AbiToken {
        AbiToken::Int(v.into())
    }
}

impl From<i16> for AbiToken {
    fn from(v: i16) -> AbiToken {
        AbiToken::Int(v.into())
    }
}

impl From<i32> for AbiToken {
    fn from(v: i32) -> AbiToken {
        AbiToken::Int(v.into())
    }
}

impl From<i64> for AbiToken {
    fn from(v: i64) -> AbiToken {
        AbiToken::Int(v.into())
    }
}

impl From<i128> for AbiToken {
    fn from(v: i128) -> AbiToken {
        AbiToken::Int(v.into())
    }
}

impl From<Int256> for AbiToken {
    fn from(v: Int256) -> AbiToken {
        AbiToken::Int(v)
    }
}

impl From<bool> for AbiToken {
    fn from(v: bool) -> AbiToken {
        AbiToken::Bool(v)
    }
}

impl From<Address> for AbiToken {
    fn from(v: Address) -> AbiToken {
        AbiToken::Address(v)
    }
}

impl From<Vec<u8>> for AbiToken {
    fn from(v: Vec<u8>) -> AbiToken {
        AbiToken::Bytes(v)
    }
}

impl From<&str> for AbiToken {
    fn from(v: &str) -> AbiToken {
        AbiToken::String(v.to_owned())
    }
}

impl From<String> for AbiToken {
    fn from(v: String) -> AbiToken {
        AbiToken::String(v)
    }
}

#[test]
fn uint_range_is_enforced() {
    let kind: ParamType = "uint8".parse().unwrap();
    AbiToken::from(255u32).type_check(&kind).unwrap();
    assert!(AbiToken::from(256u32).type_check(&kind).is_err());
}

#[test]
fn int_range_is_enforced() {
    let kind: ParamType = "int8".parse().unwrap();
    AbiToken::from(127i32).type_check(&kind).unwrap();
    AbiToken::from(-128i32).type_check(&kind).unwrap();
    assert!(AbiToken::from(128i32).type_check(&kind).is_err());
    assert!(AbiToken::from(-129i32).type_check(&kind).is_err());
}

#[test]
fn fixed_bytes_length_is_enforced() {
    let kind: ParamType = "bytes4".parse().unwrap();
    AbiToken::fixed_bytes(&[1, 2, 3, 4]).type_check(&kind).unwrap();
    assert!(AbiToken::fixed_bytes(&[1, 2, 3]).type_check(&kind).is_err());
}

#[test]
fn shape_mismatch_is_rejected() {
    let kind: ParamType = "uint256".parse().unwrap();
    match AbiToken::from("hello").type_check(&kind).unwrap_err() {
        Error::TypeMismatch { expected, got } => {
            assert_eq!(expected, "uint256");
            assert_eq!(got, "string");
        }
        _ => panic!(),
    }
}

#[test]
fn nested_elements_are_checked() {
    let kind: ParamType = "uint8[]".parse().unwrap();
    let good = AbiToken::Array(vec![1u32.into(), 2u32.into()]);
    good.type_check(&kind).unwrap();
    let bad = AbiToken::Array(vec![1u32.into(), 300u32.into()]);
    assert!(bad.type_check(&kind).is_err());
}
