use std::fmt;

use chrono::{DateTime, Utc};

use crate::constants::EGRESS_READY_CONDITION;

/// Identity of a workload instance as delivered by the scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Ordinal of a workload inside its group, taken from the `<group>-<n>` name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(u32);

impl Position {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Parses the numeric suffix of `name` relative to the group base name.
    ///
    /// Only `<group>-<digits>` is accepted: no sign, no empty suffix and no
    /// trailing characters.
    #[must_use]
    pub fn parse(name: &str, group: &str) -> Option<Self> {
        let suffix = name.strip_prefix(group)?.strip_prefix('-')?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse::<u32>().ok().map(Self)
    }

    /// The position directly above this one, if representable.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Name of the group member holding this position.
    #[must_use]
    pub fn member_name(self, group: &str) -> String {
        format!("{group}-{}", self.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub fn from_label(value: &str) -> Self {
        match value {
            "True" => Self::True,
            "False" => Self::False,
            _ => Self::Unknown,
        }
    }
}

/// A typed status entry attached to a workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    pub kind: String,
    pub status: ConditionStatus,
    pub last_transition: Option<DateTime<Utc>>,
}

impl Condition {
    /// The positive egress readiness condition stamped at `now`.
    #[must_use]
    pub fn egress_ready(now: DateTime<Utc>) -> Self {
        Self {
            kind: EGRESS_READY_CONDITION.to_owned(),
            status: ConditionStatus::True,
            last_transition: Some(now),
        }
    }
}

/// A workload instance as read from the backing store.
///
/// `position` is derived once, when the record is ingested, from the name and
/// the group label. `None` means the name does not follow `<group>-<n>`.
#[derive(Clone, Debug)]
pub struct Workload {
    pub id: WorkloadRef,
    pub group: Option<String>,
    pub addresses: Vec<String>,
    pub deleting: bool,
    pub conditions: Vec<Condition>,
    pub revision: Option<String>,
    pub position: Option<Position>,
}

impl Workload {
    #[must_use]
    pub fn new(id: WorkloadRef, group: Option<String>) -> Self {
        let position = group
            .as_deref()
            .and_then(|group| Position::parse(&id.name, group));
        Self {
            id,
            group,
            addresses: Vec::new(),
            deleting: false,
            conditions: Vec::new(),
            revision: None,
            position,
        }
    }

    #[must_use]
    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_deleting(mut self, deleting: bool) -> Self {
        self.deleting = deleting;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Whether a condition of the egress readiness kind is present, whatever
    /// its status.
    #[must_use]
    pub fn has_egress_condition(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.kind == EGRESS_READY_CONDITION)
    }
}
