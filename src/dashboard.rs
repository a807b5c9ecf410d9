// Invoice grid shown on the home screen

use crate::invoice::{Invoice, InvoiceState};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub id: String,
    pub file_name: String,
    pub state: InvoiceState,
    pub status_label: &'static str,
    /// Only completed invoices have a generated document to download
    pub can_download: bool,
    /// Completed invoices are read-only
    pub can_open: bool,
}

impl DashboardRow {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let completed = invoice.state == InvoiceState::Completed;
        Self {
            id: invoice.id.clone(),
            file_name: invoice.file_name.clone(),
            state: invoice.state,
            status_label: invoice.state.label(),
            can_download: completed,
            can_open: !completed,
        }
    }

    fn status_icon(&self) -> &'static str {
        match self.state {
            InvoiceState::Processing => "⏳",
            InvoiceState::Processed => "📄",
            InvoiceState::AttributeMapped => "🔗",
            InvoiceState::Discarded => "🗑️",
            InvoiceState::Validated => "✅",
            InvoiceState::Completed => "🏁",
            InvoiceState::Unknown(_) => "❔",
        }
    }
}

pub fn rows(invoices: &[Invoice]) -> Vec<DashboardRow> {
    invoices.iter().map(DashboardRow::from_invoice).collect()
}

/// Plain-text table for terminal output
pub fn render_table(rows: &[DashboardRow]) -> String {
    let id_width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0).max(2);
    let name_width = rows
        .iter()
        .map(|r| r.file_name.chars().count())
        .max()
        .unwrap_or(0)
        .max(9);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<id_width$}  {:<name_width$}  {:<18}  ACTIONS",
        "ID", "FILE NAME", "STATUS"
    );
    let _ = writeln!(out, "{}", "─".repeat(id_width + name_width + 18 + 15));
    for row in rows {
        let mut actions = Vec::new();
        if row.can_open {
            actions.push("review");
        }
        if row.can_download {
            actions.push("download");
        }
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {} {:<15}  {}",
            row.id,
            row.file_name,
            row.status_icon(),
            row.status_label,
            actions.join(", ")
        );
    }
    out
}
