use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::Campaign;

/// Sector name -> issue campaign, so a long export does not query the
/// mapping table once per row.
pub struct IssueCache {
    issues: HashMap<String, Campaign>,
}

impl IssueCache {
    pub fn load(ledger: &dyn Ledger) -> Result<Self> {
        let issues: HashMap<_, _> = ledger
            .sector_mappings()?
            .into_iter()
            .map(|m| (m.accounting_name, m.campaign))
            .collect();
        debug!(count = issues.len(), "loaded sector mappings");
        Ok(Self { issues })
    }

    /// Look up the issue for a sector. A miss goes back to the store once,
    /// since the mapping may have been created earlier in this run. Misses
    /// are never remembered.
    pub fn find(&mut self, ledger: &dyn Ledger, sector: &str) -> Result<Option<Campaign>> {
        if let Some(campaign) = self.issues.get(sector) {
            return Ok(Some(campaign.clone()));
        }
        let Some(mapping) = ledger.find_sector_mapping(sector)? else {
            return Ok(None);
        };
        self.issues
            .insert(mapping.accounting_name, mapping.campaign.clone());
        Ok(Some(mapping.campaign))
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}
