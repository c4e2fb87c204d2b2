//! Token metadata record
//!
//! A `TokenMetadata` is produced once per successfully extracted detail page and
//! never modified afterwards. The contract address is lowercased on construction
//! and doubles as the key of the result set.

use serde::{Deserialize, Serialize};

/// Metadata scraped from a single token detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(rename = "Name")]
    name: String,

    #[serde(rename = "Symbol")]
    symbol: String,

    #[serde(rename = "ContractAddress")]
    contract_address: String,
}

impl TokenMetadata {
    /// Creates a new record, normalizing the contract address to lowercase
    ///
    /// # Examples
    ///
    /// ```
    /// use token_sifter::TokenMetadata;
    ///
    /// let token = TokenMetadata::new("Tether USD", "USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7");
    /// assert_eq!(token.contract_address(), "0xdac17f958d2ee523a2206206994597c13d831ec7");
    /// ```
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        contract_address: impl AsRef<str>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            contract_address: normalize_address(contract_address.as_ref()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The lowercase contract address, used as the result set key
    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }
}

/// Normalizes a contract address into its result-set key form
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_lowercased() {
        let token = TokenMetadata::new("Chainlink", "LINK", "0x514910771AF9Ca656af840dff83E8264EcF986CA");
        assert_eq!(
            token.contract_address(),
            "0x514910771af9ca656af840dff83e8264ecf986ca"
        );
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let upper = TokenMetadata::new("A", "A", "0xABCDEF");
        let lower = TokenMetadata::new("A", "A", "0xabcdef");
        let mixed = TokenMetadata::new("A", "A", "0xAbCdEf");

        assert_eq!(upper.contract_address(), lower.contract_address());
        assert_eq!(mixed.contract_address(), lower.contract_address());
    }

    #[test]
    fn test_serialized_field_names() {
        let token = TokenMetadata::new("Tether USD", "USDT", "0xDAC1");
        let json = serde_json::to_value(&token).unwrap();

        assert_eq!(json["Name"], "Tether USD");
        assert_eq!(json["Symbol"], "USDT");
        assert_eq!(json["ContractAddress"], "0xdac1");
    }
}
