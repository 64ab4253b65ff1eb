//! Configured accounts
//!
//! The registry is built once at startup and shared read-only between
//! requests.

use std::path::Path;
use std::sync::Arc;

use cloudbill_common::Result;
use tracing::info;

use crate::explorer::{profiles, AwsCostExplorer, CostExplorer};

/// An account identifier paired with the client authorized for it
#[derive(Clone)]
pub struct AccountClient {
    pub account: String,
    pub explorer: Arc<dyn CostExplorer>,
}

impl AccountClient {
    pub fn new(account: impl Into<String>, explorer: Arc<dyn CostExplorer>) -> Self {
        Self {
            account: account.into(),
            explorer,
        }
    }
}

impl std::fmt::Debug for AccountClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountClient")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable list of configured accounts
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<AccountClient>,
}

impl AccountRegistry {
    pub fn new(accounts: Vec<AccountClient>) -> Self {
        Self { accounts }
    }

    /// One Cost Explorer client per profile of the credentials file
    pub async fn from_profiles(profiles: &[String], credentials: &Path, region: Option<&str>) -> Self {
        let mut accounts = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let explorer = AwsCostExplorer::from_profile(profile, credentials, region).await;
            accounts.push(AccountClient::new(profile.clone(), Arc::new(explorer)));
        }
        info!(accounts = accounts.len(), "Account registry initialized");
        Self::new(accounts)
    }

    /// Discover profiles in a credentials file and build their clients
    pub async fn from_credentials_file(path: &Path, region: Option<&str>) -> Result<Self> {
        let profiles = profiles::load_profiles(path).await?;
        Ok(Self::from_profiles(&profiles, path, region).await)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountClient> {
        self.accounts.iter()
    }

    pub fn account_ids(&self) -> Vec<&str> {
        self.accounts.iter().map(|a| a.account.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cloudbill_common::{CostQuery, CostRecord};

    struct NoCost;

    #[async_trait]
    impl CostExplorer for NoCost {
        async fn query_cost_and_usage(&self, _account: &str, _query: &CostQuery) -> Result<Vec<CostRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_registry_keeps_order() {
        let explorer: Arc<dyn CostExplorer> = Arc::new(NoCost);
        let registry = AccountRegistry::new(vec![
            AccountClient::new("prod", explorer.clone()),
            AccountClient::new("dev", explorer),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.account_ids(), vec!["prod", "dev"]);
        assert!(!registry.is_empty());
        assert!(format!("{:?}", registry.iter().next().unwrap()).contains("prod"));
    }
}
