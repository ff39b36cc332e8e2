use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// key: billing-package-plan -> partner bundle config
///
/// A fixed price buying a fixed account credit, keyed by the partner tag
/// the console sends (or the client's User-Agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePlan {
    pub price_cents: i64,
    pub credit_cents: i64,
}

/// Read-only plan catalog, loaded once at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCatalog {
    plans: HashMap<String, PackagePlan>,
}

impl PlanCatalog {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let catalog: PlanCatalog =
            serde_json::from_str(raw).context("failed to parse package plan catalog")?;
        Ok(catalog)
    }

    pub fn lookup(&self, partner_tag: &str) -> Option<&PackagePlan> {
        self.plans.get(partner_tag)
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }
}

impl FromIterator<(String, PackagePlan)> for PlanCatalog {
    fn from_iter<I: IntoIterator<Item = (String, PackagePlan)>>(iter: I) -> Self {
        Self {
            plans: iter.into_iter().collect(),
        }
    }
}
