//! Decides whether accumulated PPE evidence covers the required equipment.

use std::collections::{BTreeSet, HashSet};

use crate::tracker::detection::{GLOVES, HELMET, VEST};

/// Required-equipment subset check.
///
/// Labels are compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessPolicy {
    required: BTreeSet<String>,
}

impl Default for CompletenessPolicy {
    fn default() -> Self {
        Self::new([HELMET, VEST, GLOVES])
    }
}

impl CompletenessPolicy {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// `true` iff every required label is in `evidence`.
    pub fn is_complete(&self, evidence: &HashSet<String>) -> bool {
        self.required.iter().all(|label| evidence.contains(label))
    }

    /// Required labels absent from `evidence`, in sorted order.
    pub fn missing<'a>(&'a self, evidence: &HashSet<String>) -> Vec<&'a str> {
        self.required
            .iter()
            .filter(|label| !evidence.contains(*label))
            .map(String::as_str)
            .collect()
    }
}
