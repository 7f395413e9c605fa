//! In-memory capability fakes used by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    membership::{Endpoint, MembershipKey, MembershipRecord},
    services::{EgressServiceConfig, EgressServices, ServiceRef},
    store::{
        Clock, ConfigResolver, HealthProbe, HealthTarget, MembershipStore, ProbeVerdict,
        StoreError, WorkloadStore,
    },
    workload::{Workload, WorkloadRef},
};

pub const NAMESPACE: &str = "tailscale";
pub const GROUP: &str = "eg";

pub fn member(name: &str, address: &str) -> Workload {
    Workload::new(WorkloadRef::new(NAMESPACE, name), Some(GROUP.to_owned()))
        .with_addresses([address])
        .with_revision("1")
}

#[derive(Default)]
pub struct InMemoryWorkloads {
    workloads: Mutex<HashMap<WorkloadRef, Workload>>,
    writes: Mutex<Vec<Workload>>,
    failing_gets: Mutex<HashSet<String>>,
    fail_updates: Mutex<bool>,
}

impl InMemoryWorkloads {
    pub fn insert(&self, workload: Workload) {
        self.workloads
            .lock()
            .unwrap()
            .insert(workload.id.clone(), workload);
    }

    pub fn writes(&self) -> Vec<Workload> {
        self.writes.lock().unwrap().clone()
    }

    pub fn fail_get(&self, name: &str) {
        self.failing_gets.lock().unwrap().insert(name.to_owned());
    }

    pub fn fail_updates(&self) {
        *self.fail_updates.lock().unwrap() = true;
    }
}

#[async_trait]
impl WorkloadStore for InMemoryWorkloads {
    async fn get(&self, id: &WorkloadRef) -> Result<Option<Workload>, StoreError> {
        if self.failing_gets.lock().unwrap().contains(&id.name) {
            return Err(StoreError::new("get workload", "api server unavailable"));
        }
        Ok(self.workloads.lock().unwrap().get(id).cloned())
    }

    async fn update_conditions(&self, workload: &Workload) -> Result<(), StoreError> {
        if *self.fail_updates.lock().unwrap() {
            return Err(StoreError::new("update workload status", "conflict"));
        }
        self.writes.lock().unwrap().push(workload.clone());
        self.insert(workload.clone());
        Ok(())
    }
}

pub struct StaticConfig {
    services: Option<EgressServices>,
}

impl StaticConfig {
    pub fn with_keys(keys: &[&str]) -> Self {
        let services = keys
            .iter()
            .map(|key| ((*key).to_owned(), EgressServiceConfig::default()))
            .collect();
        Self {
            services: Some(services),
        }
    }

    pub const fn failing() -> Self {
        Self { services: None }
    }
}

#[async_trait]
impl ConfigResolver for StaticConfig {
    async fn resolve(&self, _group: &str, _namespace: &str) -> Result<EgressServices, StoreError> {
        self.services
            .clone()
            .ok_or_else(|| StoreError::new("resolve egress config", "config source unavailable"))
    }
}

#[derive(Default)]
pub struct InMemoryMemberships {
    records: Mutex<HashMap<MembershipKey, MembershipRecord>>,
}

impl InMemoryMemberships {
    pub fn publish(&self, service: &str, addresses: &[&str]) {
        let service = ServiceRef::decode(service).expect("test service key");
        let record = MembershipRecord {
            name: format!("{GROUP}-{}", service.name),
            endpoints: addresses
                .iter()
                .map(|address| Endpoint::new([*address]))
                .collect(),
        };
        self.records
            .lock()
            .unwrap()
            .insert(MembershipKey::new(GROUP, service), record);
    }
}

#[async_trait]
impl MembershipStore for InMemoryMemberships {
    async fn get(
        &self,
        _namespace: &str,
        key: &MembershipKey,
    ) -> Result<Option<MembershipRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }
}

/// Healthy unless a verdict was scripted for the target name.
#[derive(Default)]
pub struct ScriptedProbe {
    verdicts: Mutex<HashMap<String, ProbeVerdict>>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn set(&self, name: &str, verdict: ProbeVerdict) {
        self.verdicts
            .lock()
            .unwrap()
            .insert(name.to_owned(), verdict);
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, target: &HealthTarget) -> ProbeVerdict {
        self.probed.lock().unwrap().push(target.name.clone());
        self.verdicts
            .lock()
            .unwrap()
            .get(&target.name)
            .cloned()
            .unwrap_or(ProbeVerdict::Healthy)
    }
}

pub struct FixedClock(DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
