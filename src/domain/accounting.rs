use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

/// One booked income or expense line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingRecord {
    pub id: i64,
    pub kind: EntryKind,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub deal: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountingStats {
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expense: f64,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub deals_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountingFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
}

impl AccountingFilter {
    pub fn query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        if let Some(from) = self.date_from {
            q.push(("date_from".to_string(), from.to_string()));
        }
        if let Some(to) = self.date_to {
            q.push(("date_to".to_string(), to.to_string()));
        }
        q
    }
}

/// Income and expense totals for one calendar month, chart-ready.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthTotals {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// Records and statistics loaded together. Only ever built when both halves
/// arrived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountingReport {
    pub records: Vec<AccountingRecord>,
    pub stats: AccountingStats,
}

impl AccountingReport {
    /// Monthly totals in chronological order (`YYYY-MM`).
    pub fn monthly_series(&self) -> Vec<MonthTotals> {
        let mut months: BTreeMap<(i32, u32), MonthTotals> = BTreeMap::new();
        for rec in &self.records {
            let key = (rec.date.year(), rec.date.month());
            let entry = months.entry(key).or_insert_with(|| MonthTotals {
                month: format!("{:04}-{:02}", key.0, key.1),
                ..Default::default()
            });
            match rec.kind {
                EntryKind::Income => entry.income += rec.amount,
                EntryKind::Expense => entry.expense += rec.amount,
            }
        }
        months.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, kind: EntryKind, amount: f64, date: &str) -> AccountingRecord {
        AccountingRecord {
            id,
            kind,
            amount,
            date: date.parse().unwrap(),
            deal: None,
            comment: None,
        }
    }

    #[test]
    fn monthly_series_groups_and_sorts() {
        let report = AccountingReport {
            records: vec![
                rec(1, EntryKind::Income, 100.0, "2024-03-10"),
                rec(2, EntryKind::Expense, 40.0, "2024-01-02"),
                rec(3, EntryKind::Income, 50.0, "2024-03-28"),
            ],
            stats: AccountingStats::default(),
        };
        let series = report.monthly_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].month, "2024-01");
        assert_eq!(series[0].expense, 40.0);
        assert_eq!(series[1].month, "2024-03");
        assert_eq!(series[1].income, 150.0);
    }

    #[test]
    fn filter_query_skips_empty_bounds() {
        let f = AccountingFilter {
            date_from: Some("2024-01-01".parse().unwrap()),
            date_to: None,
        };
        assert_eq!(f.query(), vec![("date_from".into(), "2024-01-01".into())]);
    }
}
