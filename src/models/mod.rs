pub mod address;
pub mod hex;
pub mod transaction;

pub use address::{canonicalize_address, has_address_shape, validate_address, ADDRESS_LENGTH, ADDRESS_PREFIX};
pub use hex::{parse_hex_u128, parse_hex_u64, strip_hex_prefix};
pub use transaction::{Block, Transaction, WEI_PER_COIN};
