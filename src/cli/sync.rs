use std::path::Path;

use comfy_table::{Cell, Table};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::db::{get_connection, init_db};
use crate::error::{Result, SyncError};
use crate::ledger::SqliteLedger;
use crate::models::Category;
use crate::settings::Settings;
use crate::source::read_rows;
use crate::sync::{SyncOptions, SyncSummary, Synchronizer};

pub fn run(path: Option<&Path>, settings: &Settings) -> Result<()> {
    let path = path.ok_or(SyncError::MissingPath)?;

    let db_path = settings.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    let summary = sync_file(&conn, path, settings)?;
    println!("{}", summary_table(&summary));
    Ok(())
}

/// Reconcile one export against the ledger and record the run.
pub fn sync_file(conn: &Connection, path: &Path, settings: &Settings) -> Result<SyncSummary> {
    let checksum = compute_checksum(path)?;
    let rows = read_rows(path)?;
    info!("Read {} rows from {}", rows.len(), path.display());

    let ledger = SqliteLedger::new(conn);
    let options = SyncOptions {
        atomic_rows: settings.atomic_rows,
    };
    let summary = Synchronizer::new(&ledger, options)?.sync_rows(&rows)?;

    conn.execute(
        "INSERT INTO sync_runs (filename, checksum, row_count, created, updated, skipped) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            checksum,
            summary.rows as i64,
            summary.created_total() as i64,
            summary.updated as i64,
            summary.skipped as i64,
        ],
    )?;
    Ok(summary)
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn summary_table(summary: &SyncSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Outcome", "Rows"]);
    for category in Category::ALL {
        if let Some(n) = summary.created.get(&category) {
            table.add_row(vec![Cell::new(format!("Created {category}")), Cell::new(n)]);
        }
    }
    table.add_row(vec![Cell::new("Updated"), Cell::new(summary.updated)]);
    table.add_row(vec![Cell::new("Skipped"), Cell::new(summary.skipped)]);
    table.add_row(vec![Cell::new("Total"), Cell::new(summary.rows)]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "PROJ_CODE,PROJ_NAME,SUMMARY,SECTOR,PROJ_REQUEST,PROJ_BAL,COMM_CONTRIB,\
COUNTRY_NAME,PCV_NAME,STATE,LAST_UPDATED_FROM_PAYGOV,PROJ_BALANCE";

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        conn.execute("INSERT INTO countries (code, name) VALUES ('KE', 'Kenya')", []).unwrap();
        (dir, conn)
    }

    fn write_export(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("export.csv");
        let content = format!(
            "{HEADER}\n\
             SPF-WATER,Water Fund,Clean water,Water,0,0,,D/OSP/GGM,Water Fund,,,0\n\
             111-222,Village Well,Dig a well,Water,\"1,000.00\",250.00,50,Kenya,CA Jane Smith,CA,15-Jan-21,750.00\n\
             111-333,Lost Project,Nowhere,Water,500,0,,Atlantis,TX Bob,TX,,500\n"
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let settings = Settings::default();
        assert!(matches!(run(None, &settings), Err(SyncError::MissingPath)));
    }

    #[test]
    fn test_run_writes_only_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path());
        let data_dir = dir.path().join("data");
        let settings = Settings {
            data_dir: data_dir.to_string_lossy().to_string(),
            ..Settings::default()
        };
        run(Some(&path), &settings).unwrap();

        let mut top: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        top.sort();
        assert_eq!(top, vec!["data", "export.csv"]);
        for entry in std::fs::read_dir(&data_dir).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(name.starts_with("ledger.db"), "unexpected file: {name}");
        }
    }

    #[test]
    fn test_sync_file_records_run() {
        let (dir, conn) = test_db();
        let path = write_export(dir.path());
        let summary = sync_file(&conn, &path, &Settings::default()).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.created_total(), 2);
        assert_eq!(summary.skipped, 1);

        let (filename, checksum, created, skipped): (String, String, i64, i64) = conn
            .query_row(
                "SELECT filename, checksum, created, skipped FROM sync_runs",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(filename, "export.csv");
        assert_eq!(checksum.len(), 64);
        assert_eq!((created, skipped), (2, 1));
    }

    #[test]
    fn test_same_file_twice_is_reconciled_again() {
        let (dir, conn) = test_db();
        let path = write_export(dir.path());
        sync_file(&conn, &path, &Settings::default()).unwrap();
        let second = sync_file(&conn, &path, &Settings::default()).unwrap();
        assert_eq!(second.updated, 2);
        assert_eq!(second.created_total(), 0);
        let runs: i64 = conn.query_row("SELECT count(*) FROM sync_runs", [], |r| r.get(0)).unwrap();
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_failed_run_is_not_recorded() {
        let (dir, conn) = test_db();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, format!("{HEADER}\n111-222,Well,S,Water,lots,0,,Kenya,V,,,0\n")).unwrap();
        // no issue for Water yet, so the bad amount is never parsed
        sync_file(&conn, &path, &Settings::default()).unwrap();

        std::fs::write(
            &path,
            format!(
                "{HEADER}\nSPF-WATER,Water Fund,S,Water,0,0,,D/OSP/GGM,Water Fund,,,0\n\
                 111-222,Well,S,Water,lots,0,,Kenya,V,,,0\n"
            ),
        )
        .unwrap();
        assert!(matches!(
            sync_file(&conn, &path, &Settings::default()),
            Err(SyncError::Amount { .. })
        ));
        let runs: i64 = conn.query_row("SELECT count(*) FROM sync_runs", [], |r| r.get(0)).unwrap();
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_summary_table_lists_created_categories() {
        let mut summary = SyncSummary {
            rows: 3,
            updated: 2,
            ..Default::default()
        };
        summary.created.insert(Category::Sector, 1);
        let rendered = summary_table(&summary).to_string();
        assert!(rendered.contains("Created Sector Fund"));
        assert!(!rendered.contains("Created Project"));
        assert!(rendered.contains("Updated"));
    }
}
