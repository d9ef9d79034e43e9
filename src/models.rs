use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// What kind of giving vehicle an account backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Project,
    Country,
    Memorial,
    Sector,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Project,
        Category::Country,
        Category::Memorial,
        Category::Sector,
        Category::Other,
    ];

    /// Stored code, kept short to match the legacy ledger.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Project => "proj",
            Self::Country => "coun",
            Self::Memorial => "mem",
            Self::Sector => "sec",
            Self::Other => "oth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Country => "Country Fund",
            Self::Memorial => "Memorial Fund",
            Self::Sector => "Sector Fund",
            Self::Other => "Other",
        }
    }

    /// Only project accounts track a goal and remaining balance.
    pub fn bears_balance(&self) -> bool {
        matches!(self, Self::Project)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.key() == s)
            .copied()
            .ok_or_else(|| SyncError::UnknownCategory(s.to_string()))
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: Category,
    pub current: Option<i64>,
    pub goal: Option<i64>,
    pub community_contribution: Option<i64>,
}

/// An account that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub category: Category,
    pub current: Option<i64>,
    pub goal: Option<i64>,
    pub community_contribution: Option<i64>,
}

impl NewAccount {
    pub fn campaign(code: &str, name: &str, category: Category) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            category,
            current: None,
            goal: None,
            community_contribution: None,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub campaigntype: Category,
    pub description: String,
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorMapping {
    pub accounting_name: String,
    pub campaign: Campaign,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub country_id: i64,
    pub account_id: i64,
    pub overflow_id: i64,
    pub volunteername: String,
    pub volunteerhomestate: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_key_roundtrip() {
        for cat in Category::ALL {
            assert_eq!(cat.key().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn test_unknown_category_key() {
        assert!(matches!(
            "fund".parse::<Category>(),
            Err(SyncError::UnknownCategory(k)) if k == "fund"
        ));
    }

    #[test]
    fn test_only_projects_bear_balance() {
        let balance: Vec<_> = Category::ALL.iter().filter(|c| c.bears_balance()).collect();
        assert_eq!(balance, vec![&Category::Project]);
    }
}
