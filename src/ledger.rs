use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension};

use crate::db::{fmt_instant, fold_case};
use crate::error::Result;
use crate::models::{Account, Campaign, Category, Country, NewAccount, NewProject, SectorMapping};

/// Everything the sync engine needs from persistent storage.
pub trait Ledger {
    fn find_account(&self, code: &str) -> Result<Option<Account>>;
    fn find_account_by_name(&self, name: &str) -> Result<Option<Account>>;
    fn find_country_by_name_ci(&self, name: &str) -> Result<Option<Country>>;
    fn find_sector_mapping(&self, accounting_name: &str) -> Result<Option<SectorMapping>>;
    fn sector_mappings(&self) -> Result<Vec<SectorMapping>>;

    fn create_account(&self, account: &NewAccount) -> Result<Account>;
    fn create_campaign(
        &self,
        name: &str,
        campaigntype: Category,
        description: &str,
        account: &Account,
    ) -> Result<Campaign>;
    fn create_sector_mapping(&self, accounting_name: &str, campaign: &Campaign) -> Result<SectorMapping>;
    fn create_project(&self, project: &NewProject) -> Result<i64>;
    fn attach_campaign(&self, project_id: i64, campaign: &Campaign) -> Result<()>;

    fn update_account_current(&self, account: &Account, current: i64) -> Result<()>;
    /// Delete the account's transactions at or before `watermark`.
    fn delete_transactions_through(&self, account: &Account, watermark: &DateTime<Utc>) -> Result<usize>;

    /// Group the writes that follow into one unit, finished by
    /// `commit_unit` or `rollback_unit`.
    fn begin_unit(&self) -> Result<()>;
    fn commit_unit(&self) -> Result<()>;
    fn rollback_unit(&self) -> Result<()>;
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.key()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let key = value.as_str()?;
        key.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

const ACCOUNT_COLUMNS: &str = "id, code, name, category, current, goal, community_contribution";

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        current: row.get(4)?,
        goal: row.get(5)?,
        community_contribution: row.get(6)?,
    })
}

const MAPPING_QUERY: &str = "SELECT m.accounting_name, c.id, c.name, c.campaigntype, c.description, c.account_id \
     FROM sector_mappings m JOIN campaigns c ON m.campaign_id = c.id";

fn mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SectorMapping> {
    Ok(SectorMapping {
        accounting_name: row.get(0)?,
        campaign: Campaign {
            id: row.get(1)?,
            name: row.get(2)?,
            campaigntype: row.get(3)?,
            description: row.get(4)?,
            account_id: row.get(5)?,
        },
    })
}

const UNIT: &str = "sync_row";

pub struct SqliteLedger<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl Ledger for SqliteLedger<'_> {
    fn find_account(&self, code: &str) -> Result<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE code = ?1"))?;
        Ok(stmt.query_row([code], account_from_row).optional()?)
    }

    fn find_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE name = ?1"))?;
        Ok(stmt.query_row([name], account_from_row).optional()?)
    }

    fn find_country_by_name_ci(&self, name: &str) -> Result<Option<Country>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, code, name FROM countries WHERE fold_case(name) = fold_case(?1) ORDER BY id LIMIT 1",
        )?;
        let country = stmt
            .query_row([name], |row| {
                Ok(Country {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .optional()?;
        Ok(country)
    }

    fn find_sector_mapping(&self, accounting_name: &str) -> Result<Option<SectorMapping>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{MAPPING_QUERY} WHERE m.accounting_name = ?1"))?;
        Ok(stmt.query_row([accounting_name], mapping_from_row).optional()?)
    }

    fn sector_mappings(&self) -> Result<Vec<SectorMapping>> {
        let mut stmt = self.conn.prepare(MAPPING_QUERY)?;
        let mappings = stmt
            .query_map([], mapping_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(mappings)
    }

    fn create_account(&self, account: &NewAccount) -> Result<Account> {
        self.conn.execute(
            "INSERT INTO accounts (code, name, category, current, goal, community_contribution) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                account.code,
                account.name,
                account.category,
                account.current,
                account.goal,
                account.community_contribution,
            ],
        )?;
        Ok(Account {
            id: self.conn.last_insert_rowid(),
            code: account.code.clone(),
            name: account.name.clone(),
            category: account.category,
            current: account.current,
            goal: account.goal,
            community_contribution: account.community_contribution,
        })
    }

    fn create_campaign(
        &self,
        name: &str,
        campaigntype: Category,
        description: &str,
        account: &Account,
    ) -> Result<Campaign> {
        self.conn.execute(
            "INSERT INTO campaigns (name, campaigntype, description, account_id) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![name, campaigntype, description, account.id],
        )?;
        Ok(Campaign {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            campaigntype,
            description: description.to_string(),
            account_id: account.id,
        })
    }

    fn create_sector_mapping(&self, accounting_name: &str, campaign: &Campaign) -> Result<SectorMapping> {
        self.conn.execute(
            "INSERT INTO sector_mappings (accounting_name, campaign_id) VALUES (?1, ?2)",
            rusqlite::params![accounting_name, campaign.id],
        )?;
        Ok(SectorMapping {
            accounting_name: accounting_name.to_string(),
            campaign: campaign.clone(),
        })
    }

    fn create_project(&self, project: &NewProject) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO projects (title, country_id, account_id, overflow_id, volunteername, volunteerhomestate, description) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                project.title,
                project.country_id,
                project.account_id,
                project.overflow_id,
                project.volunteername,
                project.volunteerhomestate,
                project.description,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn attach_campaign(&self, project_id: i64, campaign: &Campaign) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO project_campaigns (project_id, campaign_id) VALUES (?1, ?2)",
            rusqlite::params![project_id, campaign.id],
        )?;
        Ok(())
    }

    fn update_account_current(&self, account: &Account, current: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET current = ?1 WHERE id = ?2",
            rusqlite::params![current, account.id],
        )?;
        Ok(())
    }

    fn delete_transactions_through(&self, account: &Account, watermark: &DateTime<Utc>) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM donations WHERE account_id = ?1 AND time <= ?2",
            rusqlite::params![account.id, fmt_instant(watermark)],
        )?;
        Ok(deleted)
    }

    fn begin_unit(&self) -> Result<()> {
        self.conn.execute_batch(&format!("SAVEPOINT {UNIT}"))?;
        Ok(())
    }

    fn commit_unit(&self) -> Result<()> {
        self.conn.execute_batch(&format!("RELEASE {UNIT}"))?;
        Ok(())
    }

    fn rollback_unit(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO {UNIT}; RELEASE {UNIT}"))?;
        Ok(())
    }
}
