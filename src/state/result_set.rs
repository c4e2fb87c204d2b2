use crate::token::{normalize_address, TokenMetadata};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Contract address → metadata, ordered by address
pub type TokenMap = BTreeMap<String, TokenMetadata>;

/// The crawl's shared, append-only result map
///
/// Cloning a `ResultSet` yields another handle to the same map. Every insert
/// goes through a single mutex, so detail tasks may write concurrently when
/// the politeness rule allows more than one request in flight.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    inner: Arc<Mutex<TokenMap>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a token under its normalized contract address
    ///
    /// Last write wins; the replaced record, if any, is returned.
    pub fn insert(&self, token: TokenMetadata) -> Option<TokenMetadata> {
        let key = token.contract_address().to_string();
        let previous = self.lock().insert(key, token);

        if let Some(prev) = &previous {
            tracing::debug!(
                "Replacing metadata for {} (was '{}')",
                prev.contract_address(),
                prev.name()
            );
        }

        previous
    }

    /// Looks up a token by contract address in any letter case
    pub fn get(&self, address: &str) -> Option<TokenMetadata> {
        self.lock().get(&normalize_address(address)).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a copy of the current contents
    pub fn snapshot(&self) -> TokenMap {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, TokenMap> {
        // A panicking writer cannot leave a half-inserted entry behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
