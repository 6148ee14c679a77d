// ── Appliance directory ──
//
// One listing of the account's appliances, turned into display records and
// addressed by 1-based index or exact id.

use std::collections::HashSet;

use appliprobe_api::types::ApplianceSummary;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::ApplianceRecord;
use crate::service::ApplianceService;

/// Snapshot of the appliance listing, in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    records: Vec<ApplianceRecord>,
}

impl Directory {
    /// Build records from a raw listing.
    ///
    /// Ids are unique within a directory: a repeated id is dropped, the
    /// first occurrence wins.
    pub fn from_summaries(summaries: &[ApplianceSummary]) -> Self {
        let mut seen = HashSet::new();
        let records = summaries
            .iter()
            .filter(|s| {
                let fresh = seen.insert(s.appliance_id.as_str());
                if !fresh {
                    warn!(appliance_id = %s.appliance_id, "duplicate appliance id in listing, ignoring");
                }
                fresh
            })
            .map(ApplianceRecord::from)
            .collect();
        Self { records }
    }

    /// Fetch the listing from the service.
    pub async fn fetch<S: ApplianceService + Sync>(service: &S) -> Result<Self, CoreError> {
        let summaries = service.list_appliances().await?;
        debug!(count = summaries.len(), "appliance listing received");
        Ok(Self::from_summaries(&summaries))
    }

    pub fn records(&self) -> &[ApplianceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Zero-based access.
    pub fn get(&self, position: usize) -> Option<&ApplianceRecord> {
        self.records.get(position)
    }

    /// Resolve operator input to a zero-based position.
    ///
    /// Accepts a 1-based index within range or an exact appliance id.
    /// Anything else is `None`.
    pub fn select(&self, input: &str) -> Option<usize> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        // Plain digits only: `parse` alone would also take "+1".
        if input.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(index) = input.parse::<usize>().ok().filter(|i| (1..=self.len()).contains(i)) {
                return Some(index - 1);
            }
        }
        self.records.iter().position(|r| r.appliance_id == input)
    }

    /// Like [`select`](Self::select), but a miss is a `NotFound` error.
    pub fn resolve(&self, input: &str) -> Result<&ApplianceRecord, CoreError> {
        self.select(input)
            .and_then(|i| self.get(i))
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "Appliance".into(),
                identifier: input.trim().to_owned(),
            })
    }
}
