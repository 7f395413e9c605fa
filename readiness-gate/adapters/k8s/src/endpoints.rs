use async_trait::async_trait;
use egress_readiness_core::{Endpoint, MembershipKey, MembershipRecord, MembershipStore, StoreError};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::{Api, Client, api::ListParams};

use crate::{errors::K8sAdapterError, labels::membership_selector};

/// Routing-membership records backed by the EndpointSlices the egress
/// service reconciler publishes for each group.
#[derive(Clone)]
pub struct EndpointSliceStore {
    client: Client,
}

impl EndpointSliceStore {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MembershipStore for EndpointSliceStore {
    async fn get(
        &self,
        namespace: &str,
        key: &MembershipKey,
    ) -> Result<Option<MembershipRecord>, StoreError> {
        let selector = membership_selector(key);
        let api: Api<EndpointSlice> = Api::namespaced(self.client.clone(), namespace);
        let mut slices = api
            .list(&ListParams::default().labels(&selector))
            .await
            .map_err(|err| StoreError::new("list endpointslices", err))?
            .items;
        if slices.len() > 1 {
            return Err(StoreError::new(
                "list endpointslices",
                K8sAdapterError::MultipleMembershipRecords {
                    selector,
                    count: slices.len(),
                },
            ));
        }
        Ok(slices.pop().map(|slice| record_from_slice(&slice)))
    }
}

#[must_use]
pub fn record_from_slice(slice: &EndpointSlice) -> MembershipRecord {
    MembershipRecord {
        name: slice.metadata.name.clone().unwrap_or_default(),
        endpoints: slice
            .endpoints
            .iter()
            .map(|endpoint| Endpoint::new(endpoint.addresses.iter().cloned()))
            .collect(),
    }
}
