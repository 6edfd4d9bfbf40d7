//! Wallet balances derived from movement rows

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Balance of one wallet in one currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub wallet: String,
    pub currency: String,
    /// Sum of signed movement amounts
    pub balance: BigDecimal,
    pub movement_count: usize,
}

/// Sum signed amounts per (wallet, currency), in first-seen order.
///
/// Conversion and transfer legs are ordinary rows here, so each side of a
/// pair lands in its own wallet.
pub fn wallet_balances(movements: &[Movement]) -> Vec<WalletBalance> {
    let mut balances: Vec<WalletBalance> = Vec::new();

    for movement in movements {
        match balances
            .iter_mut()
            .find(|b| b.wallet == movement.wallet && b.currency == movement.currency)
        {
            Some(balance) => {
                balance.balance += &movement.amount;
                balance.movement_count += 1;
            }
            None => balances.push(WalletBalance {
                wallet: movement.wallet.clone(),
                currency: movement.currency.clone(),
                balance: movement.amount.clone(),
                movement_count: 1,
            }),
        }
    }

    balances
}

/// Balance of a single wallet and currency; zero when it has no movements
pub fn balance_for(movements: &[Movement], wallet: &str, currency: &str) -> BigDecimal {
    movements
        .iter()
        .filter(|m| m.wallet == wallet && m.currency == currency)
        .map(|m| &m.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::*;

    #[test]
    fn test_balances_per_wallet_and_currency() {
        let rows = vec![
            movement("1", "Ingreso", "1000", "USD"),
            conversion_leg("2", "Egreso", "-100", "USD", "g1"),
            conversion_leg("3", "Ingreso", "1850", "ARS", "g1"),
            transfer_leg("4", "Egreso", "-200", "Caja", "t1"),
            transfer_leg("5", "Ingreso", "200", "Banco", "t1"),
        ];

        let balances = wallet_balances(&rows);
        assert_eq!(balances.len(), 3);
        assert_eq!(balances[0].wallet, "Caja");
        assert_eq!(balances[0].currency, "USD");
        assert_eq!(balances[0].balance, BigDecimal::from(700));
        assert_eq!(balances[0].movement_count, 3);
        assert_eq!(balances[1].balance, BigDecimal::from(1850));
        assert_eq!(balances[2].wallet, "Banco");

        assert_eq!(balance_for(&rows, "Banco", "USD"), BigDecimal::from(200));
        assert_eq!(balance_for(&rows, "Banco", "EUR"), BigDecimal::from(0));
    }
}
