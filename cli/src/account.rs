//! Account naming and amount parsing.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use graze_engine::{Address, PRECISION};

/// Resolve an account argument: 32-byte hex, or a human name hashed into a
/// deterministic local address.
pub fn parse_account(input: &str) -> Address {
    if input.len() == 64 {
        if let Ok(bytes) = hex::decode(input) {
            let mut address = [0u8; 32];
            address.copy_from_slice(&bytes);
            return address;
        }
    }
    let mut hasher = Sha256::new();
    hasher.update(b"graze/account/");
    hasher.update(input.as_bytes());
    hasher.finalize().into()
}

/// Short printable form of an address.
pub fn short(address: &Address) -> String {
    format!("0x{}..", hex::encode(&address[..6]))
}

/// Parse a decimal token amount into 18-decimal smallest units.
pub fn parse_amount(input: &str) -> Result<u128> {
    parse_scaled(input, 18)
}

/// Parse a decimal string into `decimals`-scaled integer units.
pub fn parse_scaled(input: &str, decimals: u32) -> Result<u128> {
    let (int_part, frac_part) = match input.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (input, ""),
    };
    if frac_part.len() > decimals as usize {
        anyhow::bail!("more than {decimals} decimal places: {input}");
    }

    let int: u128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .with_context(|| format!("bad amount: {input}"))?
    };
    let frac: u128 = if frac_part.is_empty() {
        0
    } else {
        frac_part
            .parse()
            .with_context(|| format!("bad amount: {input}"))?
    };

    let scale = 10u128.pow(decimals);
    let frac_scale = 10u128.pow(decimals - frac_part.len() as u32);
    int.checked_mul(scale)
        .and_then(|int| int.checked_add(frac * frac_scale))
        .context("amount out of range")
}

/// Render 18-decimal units as a trimmed decimal string.
pub fn format_amount(amount: u128) -> String {
    let int = amount / PRECISION;
    let frac = amount % PRECISION;
    if frac == 0 {
        return int.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{int}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic_and_distinct() {
        assert_eq!(parse_account("alice"), parse_account("alice"));
        assert_ne!(parse_account("alice"), parse_account("bob"));
    }

    #[test]
    fn hex_addresses_pass_through() {
        let address = [0xABu8; 32];
        assert_eq!(parse_account(&hex::encode(address)), address);
    }

    #[test]
    fn amounts_parse_and_format() {
        assert_eq!(parse_amount("1").unwrap(), PRECISION);
        assert_eq!(parse_amount("1.5").unwrap(), 3 * PRECISION / 2);
        assert_eq!(
            parse_amount("1333.33").unwrap(),
            1_333_330_000_000_000_000_000
        );
        assert_eq!(format_amount(3 * PRECISION / 2), "1.5");
        assert_eq!(format_amount(2 * PRECISION), "2");
        assert!(parse_amount("1.0000000000000000001").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn scaled_parsing_matches_feed_decimals() {
        assert_eq!(parse_scaled("2000", 8).unwrap(), 2_000_00000000);
        assert_eq!(parse_scaled("1100.5", 8).unwrap(), 1_100_50000000);
    }
}
