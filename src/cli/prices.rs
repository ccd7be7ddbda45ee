use super::ui;
use crate::core::{CryptoSymbol, FiatCurrency, PriceQuote};
use crate::price_resolver::PriceResolver;
use anyhow::Result;
use comfy_table::Cell;

pub fn display_supported() -> String {
    let crypto = CryptoSymbol::ALL.map(|s| s.as_str()).join(", ");
    let fiat = FiatCurrency::ALL.map(|f| f.as_str()).join(", ");
    format!(
        "{} {crypto}\n{} {fiat}",
        ui::style_text("Crypto:", ui::StyleType::TotalLabel),
        ui::style_text("Fiat:", ui::StyleType::TotalLabel),
    )
}

pub fn display_prices(quote: &PriceQuote, fiat: FiatCurrency) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell(&format!("Price ({fiat})")),
    ]);
    for symbol in CryptoSymbol::ALL {
        table.add_row(vec![
            Cell::new(symbol.as_str()),
            ui::format_optional_cell(quote.get(&symbol), |p| format!("{p:.2}")),
        ]);
    }
    format!(
        "Prices in {}\n\n{table}",
        ui::style_text(fiat.as_str(), ui::StyleType::Title)
    )
}

/// Resolves current prices for every supported symbol. `fiat` must be a supported code.
pub async fn run(resolver: &PriceResolver, fiat: &str) -> Result<()> {
    let fiat: FiatCurrency = fiat.parse()?;

    let spinner = ui::new_spinner("Fetching prices...");
    let result = resolver.resolve(fiat, &CryptoSymbol::ALL).await;
    spinner.finish_and_clear();

    println!("{}", display_prices(&result?, fiat));
    Ok(())
}
