use super::ui;
use crate::core::LedgerSnapshot;
use crate::core::amount::format_fixed;
use crate::deployment::Deployment;
use anyhow::Result;
use comfy_table::Cell;

/// Renders the funders of a snapshot in first-contribution order.
pub fn funders_table(snapshot: &LedgerSnapshot) -> String {
    let mut table = ui::ledger_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Funder"),
        ui::header_cell("Contributed"),
    ]);

    for (index, funder) in snapshot.funders.iter().enumerate() {
        let amount = snapshot.contributions.get(funder).copied().unwrap_or(0);
        table.add_row(vec![
            Cell::new(index),
            Cell::new(funder),
            ui::amount_cell(format_fixed(amount)),
        ]);
    }
    table.to_string()
}

pub async fn run(deployment: &Deployment) -> Result<()> {
    let ledger = &deployment.ledger;
    let snapshot = ledger.snapshot().await;

    println!("{}\n", ui::paint("Ledger", ui::Tone::Heading));
    println!("{}", ui::labeled("Owner", ledger.owner().as_str()));
    println!("{}", ui::labeled("Price feed", &ledger.price_feed().description()));
    println!(
        "{}",
        ui::labeled(
            "Minimum contribution",
            &format_fixed(ledger.minimum_contribution())
        )
    );

    if snapshot.funders.is_empty() {
        println!(
            "\n{}",
            ui::paint("No contributions since the last withdrawal", ui::Tone::Muted)
        );
    } else {
        println!("\n{}", funders_table(&snapshot));
    }

    println!(
        "\nHeld balance: {}",
        ui::paint(&format_fixed(snapshot.balance), ui::Tone::Amount)
    );
    println!(
        "{}",
        ui::labeled(
            "Owner account",
            &format_fixed(deployment.accounts.balance_of(ledger.owner()).await)
        )
    );
    Ok(())
}
