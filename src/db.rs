use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    current INTEGER,
    goal INTEGER,
    community_contribution INTEGER,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    campaigntype TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    account_id INTEGER NOT NULL UNIQUE,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS sector_mappings (
    accounting_name TEXT PRIMARY KEY,
    campaign_id INTEGER NOT NULL,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id)
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    country_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL UNIQUE,
    overflow_id INTEGER,
    volunteername TEXT NOT NULL,
    volunteerhomestate TEXT,
    description TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (country_id) REFERENCES countries(id),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (overflow_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS project_campaigns (
    project_id INTEGER NOT NULL,
    campaign_id INTEGER NOT NULL,
    PRIMARY KEY (project_id, campaign_id),
    FOREIGN KEY (project_id) REFERENCES projects(id),
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id)
);

CREATE TABLE IF NOT EXISTS donations (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    amount INTEGER NOT NULL,
    time TEXT NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_donations_account_time ON donations (account_id, time);

CREATE TABLE IF NOT EXISTS sync_runs (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    run_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    register_functions(&conn)?;
    Ok(conn)
}

/// Case-insensitive name comparison over the full Unicode range. SQLite's
/// own `lower()`/`upper()` only fold ASCII letters.
pub fn fold_case(text: &str) -> String {
    text.to_uppercase()
}

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| fold_case(&t)))
        },
    )?;
    Ok(())
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Fixed-width UTC text, so string order in SQL is time order.
pub fn fmt_instant(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
