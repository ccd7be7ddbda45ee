use super::ui;
use crate::core::{Transaction, TransactionLog};
use crate::payroll::{PayrollAggregator, PayrollRequest};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn display_transaction(tx: &Transaction) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("User"),
        ui::header_cell(&format!("Fiat ({})", tx.fiat_currency)),
        ui::header_cell(&format!("Crypto ({})", tx.crypto_symbol)),
        ui::header_cell("Address"),
    ]);
    for entry in tx.breakdown() {
        table.add_row(vec![
            Cell::new(&entry.user_id),
            ui::amount_cell(entry.fiat_amount, 2),
            ui::amount_cell(entry.crypto_amount, 12),
            ui::format_optional_cell(entry.address.as_deref(), str::to_string),
        ]);
    }

    let hash = tx.tx_hash.as_deref().map_or_else(
        || ui::style_text("none (broker unavailable)", ui::StyleType::Error),
        str::to_string,
    );
    format!(
        "Transaction {}\n\nDate: {}\nStatus: {}\nPrice: {:.2} {}\nHash: {}\nPaid to: {}\n\n{table}\n\nTotal: {} {} = {}",
        ui::style_text(&tx.id, ui::StyleType::Title),
        tx.date.format("%Y-%m-%d %H:%M:%S UTC"),
        tx.status,
        tx.price_at_tx,
        tx.fiat_currency,
        hash,
        tx.addresses.join(", "),
        ui::style_text(&format!("{:.2}", tx.fiat_amount), ui::StyleType::TotalValue),
        tx.fiat_currency,
        ui::style_text(
            &format!("{:.12} {}", tx.crypto_amount, tx.crypto_symbol),
            ui::StyleType::TotalValue
        ),
    )
}

pub fn display_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return ui::style_text("No transactions yet", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Symbol"),
        ui::header_cell("Fiat"),
        ui::header_cell("Crypto"),
        ui::header_cell("Employees"),
        ui::header_cell("Status"),
        ui::header_cell("Hash"),
    ]);
    for tx in transactions {
        table.add_row(vec![
            Cell::new(short_id(&tx.id)),
            Cell::new(tx.date.format("%Y-%m-%d %H:%M")),
            Cell::new(tx.crypto_symbol.as_str()),
            Cell::new(format!("{:.2} {}", tx.fiat_amount, tx.fiat_currency)),
            ui::amount_cell(tx.crypto_amount, 8),
            Cell::new(tx.num_employees).set_alignment(CellAlignment::Right),
            ui::status_cell(tx.status),
            ui::format_optional_cell(tx.tx_hash.as_deref(), |h| short_id(h).to_string()),
        ]);
    }
    table.to_string()
}

pub async fn run(aggregator: &PayrollAggregator, symbol: &str, total: Option<f64>) -> Result<()> {
    let request = PayrollRequest::parse(symbol, total)?;

    let spinner = ui::new_spinner(&format!("Running {} payroll...", request.crypto_symbol));
    let result = aggregator.run(request).await;
    spinner.finish_and_clear();

    println!("{}", display_transaction(&result?));
    Ok(())
}

pub async fn list(log: &dyn TransactionLog) -> Result<()> {
    let transactions = log.list().await?;
    println!("{}", display_transactions(&transactions));
    Ok(())
}

pub async fn confirm(aggregator: &PayrollAggregator, id: &str) -> Result<()> {
    let tx = aggregator.confirm(id).await?;
    println!(
        "Transaction {} is {}",
        ui::style_text(&tx.id, ui::StyleType::Title),
        ui::style_text(&tx.status.to_string(), ui::StyleType::TotalValue)
    );
    Ok(())
}
