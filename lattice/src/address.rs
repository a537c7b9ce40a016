use crate::error::Error;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Representation of a 20-byte account or contract address.
///
/// An address is usually obtained from its textual representation or
/// recovered from the receipt of a deployment transaction. On the wire it
/// always travels as a `0x`-prefixed hex string.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_slice(data: &[u8]) -> Result<Address, Error> {
        if data.len() != 20 {
            return Err(Error::InvalidAddressLength {
                got: data.len(),
                expected: 20,
            });
        }
        let mut inner = [0u8; 20];
        inner.copy_from_slice(data);
        Ok(Address(inner))
    }

    /// Get raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parses an address and, when the input carries mixed-case hex digits,
    /// verifies its EIP-55 checksum casing. All-lowercase input is accepted
    /// as unchecksummed.
    pub fn parse_and_validate(s: &str) -> Result<Address, Error> {
        let address: Address = s.parse()?;
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.chars().any(|c| c.is_ascii_uppercase())
            && stripped != address.checksum_digits()
        {
            return Err(Error::InvalidEip55);
        }
        Ok(address)
    }

    /// EIP-55 mixed-case rendering with the 0x prefix.
    pub fn to_checksum_string(&self) -> String {
        format!("0x{}", self.checksum_digits())
    }

    fn checksum_digits(&self) -> String {
        let lower = bytes_to_hex_str(&self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        lower
            .char_indices()
            .map(|(i, c)| {
                let nibble = if i % 2 == 0 {
                    hash[i / 2] >> 4
                } else {
                    hash[i / 2] & 0x0f
                };
                if nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }
}

impl From<[u8; 20]> for Address {
    fn from(val: [u8; 20]) -> Address {
        Address(val)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Address, Error> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 {
            return Err(Error::InvalidAddressLength {
                got: stripped.len(),
                expected: 40,
            });
        }
        Address::from_slice(&hex_str_to_bytes(stripped)?)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", bytes_to_hex_str(&self.0))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[test]
fn parse_and_display_round_trip() {
    let text = "0x00000000000000000000000000000000deadbeef";
    let address: Address = text.parse().unwrap();
    assert_eq!(address.to_string(), text);
    assert_eq!(&address.as_bytes()[16..], [0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn parse_without_prefix() {
    let address: Address = "00000000000000000000000000000000deadbeef".parse().unwrap();
    assert_eq!(
        address.to_string(),
        "0x00000000000000000000000000000000deadbeef"
    );
}

#[test]
fn rejects_wrong_length() {
    let e = "0x0000000000000000000000000000deadbeef"
        .parse::<Address>()
        .unwrap_err();
    match e {
        Error::InvalidAddressLength { got: 36, .. } => {}
        _ => panic!(),
    }
}

#[test]
fn accepts_valid_checksum() {
    // test vector from the EIP-55 write up
    let text = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    let address = Address::parse_and_validate(text).unwrap();
    assert_eq!(address.to_checksum_string(), text);
}

#[test]
fn rejects_broken_checksum() {
    // lowercased one letter relative to the valid casing
    let text = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1Beaed";
    match Address::parse_and_validate(text).unwrap_err() {
        Error::InvalidEip55 => {}
        _ => panic!(),
    }
}

#[test]
fn accepts_lowercase_unchecksummed() {
    let text = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    Address::parse_and_validate(text).unwrap();
}
