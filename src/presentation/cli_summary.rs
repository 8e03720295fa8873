use crate::application::format::{format_currency, format_optional, format_value, EMPTY};
use crate::application::monitoring::PerfReport;
use crate::domain::accounting::{AccountingReport, EntryKind};
use crate::domain::change_log::ChangeLogPage;
use crate::domain::change_record::Operation;
use crate::domain::entities::Entity;
use crate::domain::field_change::RecordDiff;
use crate::domain::pagination::PageItem;
use colored::*;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

// ─── Change log ───────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct RecordRow {
    id: String,
    table: String,
    operation: String,
    user: String,
    date: String,
    fields: String,
}

#[derive(Tabled)]
struct FieldRow {
    field: String,
    before: String,
    after: String,
}

fn colored_operation(op: Operation) -> String {
    match op {
        Operation::Create => op.as_str().green().to_string(),
        Operation::Update => op.as_str().yellow().to_string(),
        Operation::Delete => op.as_str().red().to_string(),
    }
}

/// `‹ 1 … 4 [5] 6 … 10 ›`
pub fn window_line(page: &ChangeLogPage) -> String {
    let mut parts = Vec::with_capacity(page.window.len() + 2);
    parts.push(if page.has_previous() { "‹".to_string() } else { " ".to_string() });
    for item in &page.window {
        parts.push(match item {
            PageItem::Page(n) if *n == page.page => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        });
    }
    parts.push(if page.has_next() { "›".to_string() } else { " ".to_string() });
    parts.join(" ")
}

pub fn print_change_page(page: &ChangeLogPage) {
    println!();
    println!("{}", "CHANGE LOG".bold().cyan());
    println!(
        "Page {} of {} · {} record(s)",
        page.page.to_string().bold(),
        page.total_pages,
        page.count
    );
    println!();

    if page.entries.is_empty() {
        println!("{}", "No changes recorded.".italic());
        return;
    }

    let rows: Vec<RecordRow> = page
        .entries
        .iter()
        .map(|e| RecordRow {
            id: e.record.id.to_string(),
            table: e.record.table_name.bold().to_string(),
            operation: colored_operation(e.record.operation),
            user: e.record.user_label(),
            date: format_value("created_at", &Value::String(e.record.created_at.to_rfc3339())),
            fields: e.diff.changes.len().to_string(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(5..=5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    for entry in &page.entries {
        print_record_diff(&entry.diff);
    }

    let s = &page.summary;
    println!(
        "  {} create(s) · {} update(s) · {} delete(s) · {} changed field(s)",
        s.creates.to_string().green(),
        s.updates.to_string().yellow(),
        s.deletes.to_string().red(),
        s.changed_fields.to_string().bold(),
    );
    println!("  {}", window_line(page));
    println!();
}

/// Two columns for UPDATE, a flat list for everything else.
pub fn print_record_diff(diff: &RecordDiff) {
    if diff.is_empty() {
        return;
    }
    println!();
    println!(
        "{} #{}",
        colored_operation(diff.operation),
        diff.record_id.to_string().bold()
    );

    let table = if diff.is_side_by_side() {
        let rows: Vec<FieldRow> = diff
            .changes
            .iter()
            .map(|c| FieldRow {
                field: c.key.clone(),
                before: format_optional(&c.key, c.before.as_ref()).red().to_string(),
                after: format_value(&c.key, &c.after).green().to_string(),
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    } else {
        let mut b = Builder::default();
        b.push_record(["field".to_string(), "value".to_string()]);
        for c in &diff.changes {
            b.push_record([c.key.clone(), format_value(&c.key, &c.after)]);
        }
        b.build().with(Style::rounded()).to_string()
    };
    println!("{table}");
}

// ─── Entity listings ──────────────────────────────────────────────────────────

/// Print one page of records using the resource's list columns.
pub fn print_entities<T: Entity>(items: &[T], count: u64) {
    println!();
    println!("{}", T::LABEL.bold().cyan());

    if items.is_empty() {
        println!("{}", "Nothing found.".italic());
        println!();
        return;
    }

    let mut b = Builder::default();
    b.push_record(T::COLUMNS.iter().map(|c| c.to_string()));
    for item in items {
        let value = serde_json::to_value(item).unwrap_or(Value::Null);
        b.push_record(
            T::COLUMNS
                .iter()
                .map(|c| format_optional(c, value.get(*c))),
        );
    }
    println!("{}", b.build().with(Style::rounded()));
    println!("  {} of {} shown", items.len().to_string().bold(), count);
    println!();
}

// ─── Accounting ───────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct AccountingRow {
    date: String,
    kind: String,
    amount: String,
    deal: String,
    comment: String,
}

#[derive(Tabled)]
struct MonthRow {
    month: String,
    income: String,
    expense: String,
}

pub fn print_accounting(report: &AccountingReport) {
    println!();
    println!("{}", "ACCOUNTING".bold().cyan());

    let s = &report.stats;
    println!(
        "  Income {}  ·  Expense {}  ·  Profit {}  ·  Deals {}",
        format_currency(s.total_income).green(),
        format_currency(s.total_expense).red(),
        format_currency(s.profit).bold(),
        s.deals_count
    );
    println!();

    if report.records.is_empty() {
        println!("{}", "No records for this period.".italic());
        println!();
        return;
    }

    let rows: Vec<AccountingRow> = report
        .records
        .iter()
        .map(|r| AccountingRow {
            date: r.date.to_string(),
            kind: match r.kind {
                EntryKind::Income => "income".green().to_string(),
                EntryKind::Expense => "expense".red().to_string(),
            },
            amount: format_currency(r.amount),
            deal: r.deal.map(|d| d.to_string()).unwrap_or_else(|| EMPTY.to_string()),
            comment: r.comment.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let months: Vec<MonthRow> = report
        .monthly_series()
        .into_iter()
        .map(|m| MonthRow {
            month: m.month,
            income: format_currency(m.income),
            expense: format_currency(m.expense),
        })
        .collect();
    let table = Table::new(months)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=2)).with(Alignment::right()))
        .to_string();
    println!();
    println!("{table}");
    println!();
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    method: String,
    path: String,
    status: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            method: t.method.dimmed().to_string(),
            path: t.path.bold().to_string(),
            status: if t.failed {
                "failed".red().to_string()
            } else {
                "ok".green().to_string()
            },
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} request(s)  ·  {} failed  ·  {} ms elapsed",
        report.requests().to_string().bold(),
        report.failures,
        format_duration(report.total_ms()),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
