use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::codec::{cents_from, datetime_from};
use crate::error::{Result, SyncError};
use crate::issues::IssueCache;
use crate::ledger::Ledger;
use crate::models::{Account, Category, NewAccount, NewProject};
use crate::source::AccountingRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created(Category),
    Updated,
    /// A project whose country or issue could not be found.
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    pub rows: usize,
    pub created: BTreeMap<Category, usize>,
    pub updated: usize,
    pub skipped: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: RowOutcome) {
        self.rows += 1;
        match outcome {
            RowOutcome::Created(category) => *self.created.entry(category).or_default() += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn created_total(&self) -> usize {
        self.created.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Write each row's entities as one unit, so a failure part-way through
    /// a row leaves nothing behind for that row.
    pub atomic_rows: bool,
}

pub struct Synchronizer<'a> {
    ledger: &'a dyn Ledger,
    issues: IssueCache,
    options: SyncOptions,
}

impl<'a> Synchronizer<'a> {
    pub fn new(ledger: &'a dyn Ledger, options: SyncOptions) -> Result<Self> {
        let issues = IssueCache::load(ledger)?;
        Ok(Self {
            ledger,
            issues,
            options,
        })
    }

    /// Reconcile every row in order. The first fatal error stops the run;
    /// rows before it stay applied.
    pub fn sync_rows(&mut self, rows: &[AccountingRow]) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();
        for row in rows {
            let outcome = self.sync_row(row)?;
            summary.record(outcome);
        }
        debug!(issues = self.issues.len(), "sync finished");
        Ok(summary)
    }

    pub fn sync_row(&mut self, row: &AccountingRow) -> Result<RowOutcome> {
        if !self.options.atomic_rows {
            return self.apply(row);
        }
        self.ledger.begin_unit()?;
        match self.apply(row) {
            Ok(outcome) => {
                self.ledger.commit_unit()?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback) = self.ledger.rollback_unit() {
                    warn!("Could not roll back {}: {}", row.proj_code, rollback);
                }
                Err(e)
            }
        }
    }

    fn apply(&mut self, row: &AccountingRow) -> Result<RowOutcome> {
        match self.ledger.find_account(&row.proj_code)? {
            Some(account) => {
                info!(
                    "Updating {}, new balance: {} / {}",
                    row.proj_code, row.proj_balance, row.proj_request
                );
                self.update_account(row, &account)?;
                Ok(RowOutcome::Updated)
            }
            None => {
                info!("Creating {}", row.proj_code);
                self.create_account(row)
            }
        }
    }

    /// Drop transactions the export now accounts for and refresh the
    /// remaining balance of projects.
    fn update_account(&self, row: &AccountingRow, account: &Account) -> Result<()> {
        let watermark = row.last_updated_from_paygov.trim();
        if !watermark.is_empty() {
            let updated_at = datetime_from(watermark)?;
            let pruned = self.ledger.delete_transactions_through(account, &updated_at)?;
            debug!(code = %account.code, pruned, "pruned synced transactions");
        }
        if account.category.bears_balance() {
            let (_, current) = goal_and_current(row)?;
            self.ledger.update_account_current(account, current)?;
        }
        Ok(())
    }

    fn create_account(&mut self, row: &AccountingRow) -> Result<RowOutcome> {
        let category = classify(row);
        let name = self.unique_name(row)?;
        if category == Category::Project {
            return self.create_project(row, &name);
        }

        let account = self
            .ledger
            .create_account(&NewAccount::campaign(&row.proj_code, &name, category))?;
        let campaign = self
            .ledger
            .create_campaign(&name, category, &row.summary, &account)?;
        if category == Category::Sector {
            self.ledger.create_sector_mapping(&row.sector, &campaign)?;
        }
        Ok(RowOutcome::Created(category))
    }

    fn create_project(&mut self, row: &AccountingRow, name: &str) -> Result<RowOutcome> {
        let country = self.ledger.find_country_by_name_ci(&row.country_name)?;
        let issue = self.issues.find(self.ledger, &row.sector)?;
        let (Some(country), Some(issue)) = (country, issue) else {
            warn!(
                "Either country or issue does not exist: {}, {}",
                row.country_name, row.sector
            );
            return Ok(RowOutcome::Skipped);
        };

        let (goal, current) = goal_and_current(row)?;
        let community_contribution = match row.comm_contrib.as_str() {
            "" => 0,
            raw => cents_from(raw)?,
        };
        let account = self.ledger.create_account(&NewAccount {
            code: row.proj_code.clone(),
            name: name.to_string(),
            category: Category::Project,
            current: Some(current),
            goal: Some(goal),
            community_contribution: Some(community_contribution),
        })?;

        let project_id = self.ledger.create_project(&NewProject {
            title: row.proj_name.clone(),
            country_id: country.id,
            account_id: account.id,
            overflow_id: issue.account_id,
            volunteername: volunteer_name(&row.pcv_name, &row.state),
            volunteerhomestate: row.state.clone(),
            description: row.summary.clone(),
        })?;
        self.ledger.attach_campaign(project_id, &issue)?;
        Ok(RowOutcome::Created(Category::Project))
    }

    /// Account names are unique; a taken name gets the code appended.
    fn unique_name(&self, row: &AccountingRow) -> Result<String> {
        if self.ledger.find_account_by_name(&row.proj_name)?.is_some() {
            return Ok(format!("{} ({})", row.proj_name, row.proj_code));
        }
        Ok(row.proj_name.clone())
    }
}

/// The project goal and what is still needed to reach it, in cents.
fn goal_and_current(row: &AccountingRow) -> Result<(i64, i64)> {
    let goal = cents_from(&row.proj_request)?;
    let balance = cents_from(&row.proj_bal)?;
    let current = goal.checked_sub(balance).ok_or_else(|| SyncError::Amount {
        value: format!("{} - {}", row.proj_request, row.proj_bal),
    })?;
    Ok((goal, current))
}

/// The export prefixes volunteer names with their home state ("CA Smith").
pub fn volunteer_name(raw: &str, state: &str) -> String {
    match raw.strip_prefix(state) {
        Some(rest) => rest.trim().to_string(),
        None => raw.to_string(),
    }
}
