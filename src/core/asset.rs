use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of an asset contract or token.
///
/// The engine treats addresses as opaque identifiers; any string that
/// uniquely names an asset in the surrounding system works
/// (hex addresses, token symbols, internal ids).
///
/// # Examples
///
/// ```
/// use collateral_engine::core::asset::AssetAddress;
///
/// let weth = AssetAddress::new("WETH");
/// let usdc = AssetAddress::new("USDC");
/// assert_ne!(weth, usdc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetAddress(String);

impl AssetAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Composite asset identity: address plus sub-id.
///
/// The `id` distinguishes fungible positions (`id == 0`) from
/// non-fungible or semi-fungible positions under the same address.
/// Keys are immutable once an asset is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    pub address: AssetAddress,
    pub id: u64,
}

impl AssetKey {
    pub fn new(address: impl Into<AssetAddress>, id: u64) -> Self {
        Self {
            address: address.into(),
            id,
        }
    }

    /// Key for a fungible asset (`id == 0`).
    pub fn fungible(address: impl Into<AssetAddress>) -> Self {
        Self::new(address, 0)
    }

    pub fn is_fungible(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.id)
    }
}

/// A distinct accounting domain (e.g. a lending pool) under which
/// exposures and risk parameters are tracked independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Creditor(String);

impl Creditor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Creditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Creditor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Caller identity used by the access-control checks on the
/// administrative setters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Asset-type tag returned alongside every processed deposit or
/// withdrawal. Primary assets are priced directly by an oracle;
/// derived assets are priced through their underlying assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetType {
    Primary = 0,
    Derived = 1,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Primary => write!(f, "primary"),
            AssetType::Derived => write!(f, "derived"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_equality() {
        let a = AssetKey::fungible("WETH");
        let b = AssetKey::new("WETH", 0);
        let c = AssetKey::new("WETH", 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_asset_key_display() {
        let key = AssetKey::new("FLOOR-NFT", 42);
        assert_eq!(format!("{}", key), "FLOOR-NFT#42");
        assert!(!key.is_fungible());
    }

    #[test]
    fn test_creditor_ordering() {
        let a = Creditor::new("POOL-A");
        let b = Creditor::new("POOL-B");
        assert!(a < b);
    }

    #[test]
    fn test_asset_key_serde_round_trip() {
        let key = AssetKey::new("USDC", 0);
        let json = serde_json::to_string(&key).unwrap();
        let back: AssetKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
