//! How much fiat an employee routes to each crypto in a payroll cycle.
//!
//! The amount is computed in two steps: a *base* (how much of the paycheck is converted
//! at all, by percent of net or a fixed amount) and the employee's *split* of that base
//! across symbols. Custody and direct payouts both decide eligibility from this one value.

use crate::core::employee::{ConvertMode, Employee};
use crate::core::money::{CONTRIBUTION_DP, round_dp};
use crate::core::CryptoSymbol;

/// Fiat the employee converts this cycle, before splitting across symbols.
pub fn base_amount(employee: &Employee) -> f64 {
    match employee.convert_mode {
        ConvertMode::Fixed => employee.fixed_amount_fiat,
        ConvertMode::Percent => {
            if employee.percent_to_crypto == 0 {
                return 0.0;
            }
            let net = employee.effective_net_salary();
            if net <= 0.0 {
                return 0.0;
            }
            round_dp(
                net * (f64::from(employee.percent_to_crypto) / 100.0),
                CONTRIBUTION_DP,
            )
        }
    }
}

/// Fiat the employee routes to `symbol` this cycle. Never negative.
pub fn contribution(employee: &Employee, symbol: CryptoSymbol) -> f64 {
    let split = employee.split(symbol);
    if split == 0 {
        return 0.0;
    }
    let base = base_amount(employee);
    if !base.is_finite() || base <= 0.0 {
        return 0.0;
    }
    round_dp(base * (f64::from(split) / 100.0), CONTRIBUTION_DP)
}
