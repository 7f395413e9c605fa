use crate::services::ServiceRef;

/// Identifies the routing-membership record of one egress service of a group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MembershipKey {
    pub group: String,
    pub service: ServiceRef,
}

impl MembershipKey {
    #[must_use]
    pub fn new(group: impl Into<String>, service: ServiceRef) -> Self {
        Self {
            group: group.into(),
            service,
        }
    }
}

/// Endpoints the data plane currently routes an egress service to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipRecord {
    pub name: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub addresses: Vec<String>,
}

impl Endpoint {
    #[must_use]
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }
}

impl MembershipRecord {
    /// Whether any endpoint address matches any of `addresses`.
    ///
    /// Addresses are compared as case-insensitive strings, so only addresses
    /// of the family the record was published for can match.
    #[must_use]
    pub fn routes_to(&self, addresses: &[String]) -> bool {
        self.endpoints
            .iter()
            .flat_map(|endpoint| endpoint.addresses.iter())
            .any(|routed| {
                addresses
                    .iter()
                    .any(|address| routed.eq_ignore_ascii_case(address))
            })
    }
}
