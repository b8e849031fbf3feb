//! Minimal ABI codec for the handful of ERC-721 reads ChainNFT performs.
//!
//! Only two shapes are ever needed: static `uint256` words (arguments and
//! return values) and a single dynamic `string` return value. Both are
//! encoded by hand instead of pulling in a full ABI library.
//!
//! ```text
//! call data      = selector(4) ++ word(32) ++ word(32) ...
//! string return  = offset(32) ++ ... ++ [offset] length(32) ++ utf8 bytes
//! ```

use alloy_primitives::U256;
use thiserror::Error;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

/// A 4-byte function selector.
pub type Selector = [u8; 4];

/// Precomputed `keccak256(signature)[..4]` selectors.
pub mod selectors {
    use super::Selector;

    /// `name()`
    pub const NAME: Selector = [0x06, 0xfd, 0xde, 0x03];
    /// `symbol()`
    pub const SYMBOL: Selector = [0x95, 0xd8, 0x9b, 0x41];
    /// `totalSupply()`
    pub const TOTAL_SUPPLY: Selector = [0x18, 0x16, 0x0d, 0xdd];
    /// `tokenByIndex(uint256)`
    pub const TOKEN_BY_INDEX: Selector = [0x4f, 0x6c, 0xcc, 0xe7];
    /// `tokenURI(uint256)`
    pub const TOKEN_URI: Selector = [0xc8, 0x7b, 0x56, 0xdd];
    /// `ownerOf(uint256)`
    pub const OWNER_OF: Selector = [0x63, 0x52, 0x21, 0x1e];
}

/// Event topics used by the mint scan.
pub mod topics {
    /// `keccak256("Transfer(address,address,uint256)")`
    pub const TRANSFER: [u8; 32] = [
        0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d,
        0xaa, 0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23,
        0xb3, 0xef,
    ];

    /// The zero address left-padded to a topic word; marks a mint as `from`.
    pub const ZERO_ADDRESS: [u8; 32] = [0u8; 32];
}

/// Errors from the ABI codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("empty return data")]
    Empty,

    #[error("negative value cannot be encoded as uint256")]
    Negative,

    #[error("value exceeds 256 bits")]
    Overflow,

    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Encode `value` as a 32-byte big-endian word, zero-padded on the left.
pub fn encode_uint(value: U256) -> [u8; WORD] {
    value.to_be_bytes::<WORD>()
}

/// Parse a decimal or `0x`-prefixed hex integer into a `U256`.
///
/// A leading `-` is rejected with [`AbiError::Negative`] and anything wider
/// than 256 bits with [`AbiError::Overflow`].
pub fn parse_uint(text: &str) -> Result<U256, AbiError> {
    let text = text.trim();
    if text.starts_with('-') {
        return Err(AbiError::Negative);
    }
    let (digits, radix) = match strip_hex_prefix(text) {
        Some(rest) => (rest, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(AbiError::InvalidNumber(text.to_string()));
    }
    U256::from_str_radix(digits, radix as u64).map_err(|_| AbiError::Overflow)
}

/// Read the first word of `data` as a big-endian unsigned integer.
///
/// Input shorter than a word is read as-is; empty input is an error since
/// it usually means the target has no code.
pub fn decode_uint(data: &[u8]) -> Result<U256, AbiError> {
    if data.is_empty() {
        return Err(AbiError::Empty);
    }
    let word = &data[..data.len().min(WORD)];
    Ok(U256::from_be_slice(word))
}

/// Decode a single ABI-encoded dynamic `string` return value.
///
/// Lenient by design of the callers: an offset of zero (or one that does not
/// fit a buffer index) is treated as 32, and truncated buffers produce
/// partial or empty strings instead of errors.
pub fn decode_dynamic_string(data: &[u8]) -> String {
    if data.len() < WORD {
        return String::new();
    }

    let offset = match word_to_usize(&data[..WORD]) {
        Some(0) | None => WORD,
        Some(offset) => offset,
    };

    let Some(len_end) = offset.checked_add(WORD) else {
        return String::new();
    };
    if len_end > data.len() {
        return String::new();
    }

    let start = len_end;
    let available = data.len() - start;
    let len = word_to_usize(&data[offset..len_end])
        .unwrap_or(usize::MAX)
        .min(available);

    String::from_utf8_lossy(&data[start..start + len]).into_owned()
}

/// Build call data: `selector ++ encode_uint(arg)...`.
pub fn call_data(selector: Selector, args: &[U256]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&encode_uint(*arg));
    }
    data
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode `0x`-prefixed (or bare) hex. Odd-length input gets a leading zero.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, AbiError> {
    let digits = strip_hex_prefix(text).unwrap_or(text);
    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };
    decoded.map_err(|e| AbiError::InvalidHex(e.to_string()))
}

/// Parse a JSON-RPC hex quantity such as a block number.
pub fn parse_quantity(text: &str) -> Result<u64, AbiError> {
    let digits = strip_hex_prefix(text)
        .ok_or_else(|| AbiError::InvalidNumber(text.to_string()))?;
    if digits.is_empty() {
        return Err(AbiError::InvalidNumber(text.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| AbiError::InvalidNumber(text.to_string()))
}

/// Format a block height as a JSON-RPC hex quantity.
pub fn format_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Narrow a `U256` to `u64` when it fits.
pub fn to_u64(value: U256) -> Option<u64> {
    let limbs = value.as_limbs();
    if limbs[1..].iter().any(|limb| *limb != 0) {
        None
    } else {
        Some(limbs[0])
    }
}

fn word_to_usize(word: &[u8]) -> Option<usize> {
    to_u64(U256::from_be_slice(word)).and_then(|v| usize::try_from(v).ok())
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}
