use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SyncError};

/// Columns the export must carry. The upstream layout changes from time to
/// time, so extra columns are ignored and only these are checked.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "PROJ_CODE",
    "PROJ_NAME",
    "SUMMARY",
    "SECTOR",
    "PROJ_REQUEST",
    "PROJ_BAL",
    "COMM_CONTRIB",
    "COUNTRY_NAME",
    "PCV_NAME",
    "STATE",
    "LAST_UPDATED_FROM_PAYGOV",
    "PROJ_BALANCE",
];

/// One line of the accounting export, fields kept as raw text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AccountingRow {
    pub proj_code: String,
    pub proj_name: String,
    pub summary: String,
    pub sector: String,
    pub proj_request: String,
    pub proj_bal: String,
    pub comm_contrib: String,
    pub country_name: String,
    pub pcv_name: String,
    pub state: String,
    pub last_updated_from_paygov: String,
    pub proj_balance: String,
}

/// Read the file and convert to UTF-8. The export is produced in a legacy
/// 8-bit code page; clean UTF-8 passes through untouched.
pub fn read_as_utf8(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // WHATWG maps ISO-8859-1 onto Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn read_rows(path: &Path) -> Result<Vec<AccountingRow>> {
    let content = read_as_utf8(path)?;
    parse_rows(&content)
}

/// Parse CSV text into rows, in file order.
pub fn parse_rows(content: &str) -> Result<Vec<AccountingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers = rdr.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(SyncError::MissingColumn(missing.to_string()));
    }

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: AccountingRow = result?;
        rows.push(row);
    }
    Ok(rows)
}
