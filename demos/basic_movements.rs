//! Basic movements ledger example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use movements_core::utils::MemoryStorage;
use movements_core::{
    init_tracing, patterns, ConversionParams, ListQuery, MovementLedger, MovementScope,
    MovementType, MovementView, SortDirection, SortState, TransferParams,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("Movements Core - Basic Example\n");

    let storage = MemoryStorage::new();
    let _subscription = storage
        .feed()
        .subscribe(|change| println!("  ~ change: {:?}", change));
    let mut ledger = MovementLedger::new(storage);

    let ingreso = MovementType::new("t-in", "Ingreso");
    let egreso = MovementType::new("t-eg", "Egreso");

    // 1. A plain income
    let income = patterns::income(
        NaiveDate::from_ymd_opt(2024, 4, 1).ok_or("bad date")?,
        "org1".to_string(),
        "ana".to_string(),
        ingreso.clone(),
        "Aportes".to_string(),
        "Banco USD".to_string(),
        "USD".to_string(),
        BigDecimal::from(5000),
    )?;
    ledger.create_movement(income).await?;

    // 2. A conversion: two rows sharing one group id
    ledger
        .record_conversion(ConversionParams {
            date: NaiveDate::from_ymd_opt(2024, 4, 2).ok_or("bad date")?,
            organization_id: "org1".to_string(),
            project_id: None,
            created_by: "ana".to_string(),
            description: Some("Compra de pesos".to_string()),
            outgoing_type: egreso.clone(),
            incoming_type: ingreso.clone(),
            category: "Conversión".to_string(),
            from_wallet: "Banco USD".to_string(),
            to_wallet: "Banco ARS".to_string(),
            from_currency: "USD".to_string(),
            to_currency: "ARS".to_string(),
            from_amount: BigDecimal::from(100),
            to_amount: BigDecimal::from(1850),
        })
        .await?;

    // 3. A transfer into a project's petty cash
    ledger
        .record_transfer(TransferParams {
            date: NaiveDate::from_ymd_opt(2024, 4, 3).ok_or("bad date")?,
            organization_id: "org1".to_string(),
            project_id: Some("obra-norte".to_string()),
            created_by: "ana".to_string(),
            description: Some("Caja chica".to_string()),
            outgoing_type: egreso,
            incoming_type: ingreso,
            category: "Transferencia".to_string(),
            from_wallet: "Banco ARS".to_string(),
            to_wallet: "Caja obra".to_string(),
            currency: "ARS".to_string(),
            amount: BigDecimal::from(900),
        })
        .await?;

    println!("\nMovements (newest first):");
    let scope = MovementScope::organization("org1");
    let query = ListQuery::new().sort(SortState::by("movement_date", SortDirection::Descending));
    let page = ledger.list_page(&scope, &query).await?;
    for view in &page.items {
        match view {
            MovementView::Conversion(g) => println!(
                "  {} conversion {} {} -> {} {}",
                g.summary.movement_date, g.from_amount, g.from_currency, g.to_amount, g.to_currency
            ),
            MovementView::Transfer(g) => println!(
                "  {} transfer {} {} from {} to {}",
                g.summary.movement_date, g.amount, g.currency, g.from_wallet, g.to_wallet
            ),
            MovementView::Single(m) => println!(
                "  {} {} {} {}",
                m.movement_date, m.movement_type.name, m.amount, m.currency
            ),
        }
    }

    println!("\nWallet balances:");
    for balance in ledger.wallet_balances(&scope).await? {
        println!(
            "  {:<12} {} {}",
            balance.wallet, balance.balance, balance.currency
        );
    }

    Ok(())
}
