use crate::{Address, Contract, ContractKey, Deployer};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{btree_map::Entry, BTreeMap, HashMap};

/// Persisted project deployers and their contracts.
///
/// Contract writes are keyed by
/// (project id, deployer address, contract address, chain id), so concurrent
/// writers of the same records converge instead of duplicating them.
#[async_trait]
pub trait ContractRecordStore: Send + Sync {
    async fn load(&self, project_id: &str, deployer: &Address) -> anyhow::Result<Vec<Contract>>;

    /// Replaces the records with the same keys. Fails when the deployer itself
    /// is not tracked, so contracts never outlive their deployer.
    async fn upsert(
        &self,
        project_id: &str,
        deployer: &Address,
        contracts: &[Contract],
    ) -> anyhow::Result<()>;

    /// Folds `contracts` into the current records with [`Contract::merge`] in a
    /// single write and returns the resulting set.
    ///
    /// Writes nothing and returns `None` unless the deployer is tracked and
    /// verified at the time of the write.
    async fn merge(
        &self,
        project_id: &str,
        deployer: &Address,
        contracts: Vec<Contract>,
    ) -> anyhow::Result<Option<Vec<Contract>>>;

    /// Removes the deployer together with all of its contracts.
    async fn remove_deployer(&self, project_id: &str, deployer: &Address) -> anyhow::Result<()>;

    async fn load_deployer(
        &self,
        project_id: &str,
        deployer: &Address,
    ) -> anyhow::Result<Option<Deployer>>;

    async fn save_deployer(&self, project_id: &str, deployer: &Deployer) -> anyhow::Result<()>;
}

type DeployerKey = (String, Address);

#[derive(Debug, Default)]
struct DeployerRecords {
    deployer: Option<Deployer>,
    contracts: BTreeMap<ContractKey, Contract>,
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<DeployerKey, DeployerRecords>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(project_id: &str, deployer: &Address) -> DeployerKey {
    (project_id.to_string(), *deployer)
}

#[async_trait]
impl ContractRecordStore for InMemoryRecordStore {
    async fn load(&self, project_id: &str, deployer: &Address) -> anyhow::Result<Vec<Contract>> {
        let records = self.records.read();
        Ok(records
            .get(&key(project_id, deployer))
            .map(|records| records.contracts.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(
        &self,
        project_id: &str,
        deployer: &Address,
        contracts: &[Contract],
    ) -> anyhow::Result<()> {
        let mut records = self.records.write();
        let records = match records.get_mut(&key(project_id, deployer)) {
            Some(records) if records.deployer.is_some() => records,
            _ => anyhow::bail!("deployer {deployer} is not tracked in project {project_id}"),
        };
        for contract in contracts {
            records.contracts.insert(contract.key(), contract.clone());
        }
        Ok(())
    }

    async fn merge(
        &self,
        project_id: &str,
        deployer: &Address,
        contracts: Vec<Contract>,
    ) -> anyhow::Result<Option<Vec<Contract>>> {
        let mut records = self.records.write();
        let records = match records.get_mut(&key(project_id, deployer)) {
            Some(records) if records.deployer.as_ref().is_some_and(Deployer::is_verified) => {
                records
            }
            _ => return Ok(None),
        };
        for contract in contracts {
            match records.contracts.entry(contract.key()) {
                Entry::Occupied(mut entry) => entry.get_mut().merge(contract),
                Entry::Vacant(entry) => {
                    entry.insert(contract);
                }
            }
        }
        Ok(Some(records.contracts.values().cloned().collect()))
    }

    async fn remove_deployer(&self, project_id: &str, deployer: &Address) -> anyhow::Result<()> {
        self.records.write().remove(&key(project_id, deployer));
        Ok(())
    }

    async fn load_deployer(
        &self,
        project_id: &str,
        deployer: &Address,
    ) -> anyhow::Result<Option<Deployer>> {
        let records = self.records.read();
        Ok(records
            .get(&key(project_id, deployer))
            .and_then(|records| records.deployer.clone()))
    }

    async fn save_deployer(&self, project_id: &str, deployer: &Deployer) -> anyhow::Result<()> {
        self.records
            .write()
            .entry(key(project_id, &deployer.address))
            .or_default()
            .deployer = Some(deployer.clone());
        Ok(())
    }
}
