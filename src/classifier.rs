use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Category;
use crate::source::AccountingRow;

static PROJECT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d-]+").unwrap());

/// Special-purpose funds and sector funds share this prefix.
const SPECIAL_FUND_PREFIX: &str = "SPF-";
const GLOBAL_GRANTS_OFFICE: &str = "D/OSP/GGM";

fn is_country_fund(row: &AccountingRow) -> bool {
    row.proj_code.ends_with("-CFD")
        || (row.sector == "None"
            && row.proj_request == "0"
            && row.pcv_name == format!("{} COUNTRY FUND", row.country_name))
}

fn is_memorial(row: &AccountingRow) -> bool {
    row.proj_code.starts_with(SPECIAL_FUND_PREFIX)
        && row.proj_name.to_uppercase().contains("MEMORIAL")
}

fn is_sector_fund(row: &AccountingRow) -> bool {
    row.proj_code.starts_with(SPECIAL_FUND_PREFIX)
        && (row.country_name == GLOBAL_GRANTS_OFFICE
            || row.proj_name.to_uppercase() == row.pcv_name.to_uppercase())
}

fn is_project(row: &AccountingRow) -> bool {
    PROJECT_CODE.is_match(&row.proj_code) || !row.comm_contrib.is_empty()
}

/// Checked in order; the first rule that matches decides. Sector funds can
/// look like country funds and memorials can look like sector funds, so the
/// order carries meaning.
const RULES: &[(Category, fn(&AccountingRow) -> bool)] = &[
    (Category::Country, is_country_fund),
    (Category::Memorial, is_memorial),
    (Category::Sector, is_sector_fund),
    (Category::Project, is_project),
];

/// Infer what an account is from the code, sector and name fields.
pub fn classify(row: &AccountingRow) -> Category {
    RULES
        .iter()
        .find(|(_, matches)| matches(row))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, name: &str) -> AccountingRow {
        AccountingRow {
            proj_code: code.to_string(),
            proj_name: name.to_string(),
            sector: "Water".to_string(),
            proj_request: "100".to_string(),
            country_name: "Kenya".to_string(),
            pcv_name: "CA Smith".to_string(),
            state: "CA".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_country_fund_by_code_suffix() {
        assert_eq!(classify(&row("KEN-CFD", "Kenya Country Fund")), Category::Country);
    }

    #[test]
    fn test_country_fund_by_fields() {
        let r = AccountingRow {
            sector: "None".to_string(),
            proj_request: "0".to_string(),
            pcv_name: "Kenya COUNTRY FUND".to_string(),
            ..row("ABC", "Fund for Kenya")
        };
        assert_eq!(classify(&r), Category::Country);

        let not_zero = AccountingRow {
            proj_request: "0.00".to_string(),
            ..r.clone()
        };
        assert_eq!(classify(&not_zero), Category::Other);
    }

    #[test]
    fn test_memorial() {
        assert_eq!(
            classify(&row("SPF-JONES", "John Jones Memorial Fund")),
            Category::Memorial
        );
        assert_eq!(classify(&row("SPF-JONES", "john jones memorial")), Category::Memorial);
        assert_eq!(classify(&row("123-JONES", "Jones Memorial")), Category::Project);
    }

    #[test]
    fn test_sector_fund_by_office() {
        let r = AccountingRow {
            country_name: GLOBAL_GRANTS_OFFICE.to_string(),
            ..row("SPF-WATER", "Water Fund")
        };
        assert_eq!(classify(&r), Category::Sector);
    }

    #[test]
    fn test_sector_fund_by_matching_names() {
        let r = AccountingRow {
            pcv_name: "WATER FUND".to_string(),
            ..row("SPF-WATER", "Water Fund")
        };
        assert_eq!(classify(&r), Category::Sector);
    }

    #[test]
    fn test_country_rule_beats_sector_rule() {
        let r = AccountingRow {
            country_name: GLOBAL_GRANTS_OFFICE.to_string(),
            ..row("SPF-GHANA-CFD", "Ghana")
        };
        assert!(is_sector_fund(&r));
        assert_eq!(classify(&r), Category::Country);
    }

    #[test]
    fn test_memorial_rule_beats_sector_rule() {
        let r = AccountingRow {
            country_name: GLOBAL_GRANTS_OFFICE.to_string(),
            ..row("SPF-SMITH", "Smith Memorial")
        };
        assert_eq!(classify(&r), Category::Memorial);
    }

    #[test]
    fn test_project_by_code() {
        assert_eq!(classify(&row("123-456", "Village Well")), Category::Project);
        assert_eq!(classify(&row("-99", "Dash first")), Category::Project);
        assert_eq!(classify(&row("9ABC", "Digit first")), Category::Project);
    }

    #[test]
    fn test_project_by_community_contribution() {
        let r = AccountingRow {
            comm_contrib: "150.00".to_string(),
            ..row("ABC", "Library")
        };
        assert_eq!(classify(&r), Category::Project);
    }

    #[test]
    fn test_other() {
        assert_eq!(classify(&row("ABC", "General Fund")), Category::Other);
        assert_eq!(classify(&row("SPF-GEN", "General Fund")), Category::Other);
        assert_eq!(classify(&AccountingRow::default()), Category::Other);
    }
}
