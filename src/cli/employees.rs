use super::ui;
use crate::contribution::base_amount;
use crate::core::error::PayrollError;
use crate::core::{ConvertMode, CryptoSymbol, Employee, EmployeeStore, EmployeeUpdate};
use crate::roster::upsert_employee;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::Path;

fn split_summary(employee: &Employee) -> String {
    let parts: Vec<String> = CryptoSymbol::ALL
        .iter()
        .filter(|s| employee.split(**s) > 0)
        .map(|s| format!("{s} {}%", employee.split(*s)))
        .collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" / ")
    }
}

fn conversion_summary(employee: &Employee) -> String {
    match employee.convert_mode {
        ConvertMode::Percent => format!("{}% of net", employee.percent_to_crypto),
        ConvertMode::Fixed => format!("{:.2} fixed", employee.fixed_amount_fiat),
    }
}

pub fn display_employees(employees: &[Employee]) -> String {
    if employees.is_empty() {
        return ui::style_text("No employees on file", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("User"),
        ui::header_cell("Name"),
        ui::header_cell("Conversion"),
        ui::header_cell("Per cycle"),
        ui::header_cell("Split"),
        ui::header_cell("Addresses"),
        ui::header_cell("Accumulated fiat"),
    ]);
    for employee in employees {
        let addresses = employee
            .addressed_symbols()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&employee.user_id),
            Cell::new(employee.display_name()),
            Cell::new(conversion_summary(employee)),
            ui::amount_cell(base_amount(employee), 2),
            Cell::new(split_summary(employee)),
            Cell::new(addresses),
            ui::amount_cell(employee.accumulated_fiat, 2),
        ]);
    }
    table.to_string()
}

/// Parses an upsert payload. JSON is accepted for `.json` files, YAML otherwise.
/// Malformed payloads, including unknown crypto symbols, are validation errors.
pub fn parse_update(content: &str, json: bool) -> Result<EmployeeUpdate, PayrollError> {
    let parsed = if json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    };
    parsed.map_err(PayrollError::Validation)
}

pub async fn list(store: &dyn EmployeeStore) -> Result<()> {
    let employees = store.list().await?;
    println!("{}", display_employees(&employees));
    Ok(())
}

pub async fn upsert(store: &dyn EmployeeStore, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read employee file: {}", file.display()))?;
    let json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let update = parse_update(&content, json)?;

    let employee = upsert_employee(store, update).await?;
    println!(
        "Saved employee {}\n\n{}",
        ui::style_text(&employee.user_id, ui::StyleType::Title),
        display_employees(std::slice::from_ref(&employee))
    );
    Ok(())
}
