use super::ui;
use crate::core::{CompanySettings, CompanySettingsStore, CryptoSymbol, FiatCurrency};
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::collections::BTreeMap;

pub fn display_settings(settings: &CompanySettings) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Symbol"), ui::header_cell("Company wallet")]);
    for symbol in CryptoSymbol::ALL {
        table.add_row(vec![
            Cell::new(symbol.as_str()),
            ui::format_optional_cell(settings.wallet(symbol), str::to_string),
        ]);
    }

    let custody = if settings.custody { "enabled" } else { "disabled" };
    format!(
        "{}\n\nCustody: {}\nBase fiat: {}\n\n{table}",
        ui::style_text("Company settings", ui::StyleType::Title),
        ui::style_text(custody, ui::StyleType::TotalLabel),
        ui::style_text(settings.base_fiat.as_str(), ui::StyleType::TotalLabel),
    )
}

/// Parses a `SYMBOL=ADDRESS` wallet argument. An empty address clears the wallet.
pub fn parse_wallet(arg: &str) -> Result<(CryptoSymbol, Option<String>)> {
    let (symbol, address) = arg
        .split_once('=')
        .with_context(|| format!("Expected SYMBOL=ADDRESS, got '{arg}'"))?;
    let symbol: CryptoSymbol = symbol.parse()?;
    let address = Some(address.trim().to_string()).filter(|a| !a.is_empty());
    Ok((symbol, address))
}

/// Builds the replacement settings. An unsupported base fiat falls back to the default.
pub fn settings_from_args(
    custody: bool,
    wallets: &[String],
    base_fiat: Option<&str>,
) -> Result<CompanySettings> {
    let company_wallets = wallets
        .iter()
        .map(|arg| parse_wallet(arg))
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(CompanySettings {
        custody,
        company_wallets,
        base_fiat: base_fiat.map(FiatCurrency::normalize).unwrap_or_default(),
    })
}

pub async fn show(store: &dyn CompanySettingsStore) -> Result<()> {
    let settings = store.get().await?;
    println!("{}", display_settings(&settings));
    Ok(())
}

pub async fn set(store: &dyn CompanySettingsStore, settings: CompanySettings) -> Result<()> {
    let saved = store.put(settings).await?;
    println!("{}", display_settings(&saved));
    Ok(())
}
