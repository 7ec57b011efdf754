use super::ui;
use crate::core::Address;
use crate::core::amount::{format_fixed, parse_native};
use crate::deployment::Deployment;
use anyhow::Result;

pub async fn run(deployment: &Deployment, from: &Address, amount: &str) -> Result<()> {
    let amount = parse_native(amount)?;

    let pb = ui::feed_spinner("Reading price feed...");
    let result = deployment.ledger.fund(from, amount).await;
    pb.finish_and_clear();

    let receipt = result?;
    deployment.commit().await?;

    println!(
        "{} {} from {} (worth {})",
        ui::paint("Funded", ui::Tone::Amount),
        format_fixed(receipt.amount),
        receipt.contributor,
        format_fixed(receipt.reference_value)
    );
    println!(
        "{}",
        ui::labeled("Total contributed", &format_fixed(receipt.total))
    );
    if receipt.first_contribution {
        println!(
            "{}",
            ui::paint("First contribution from this account", ui::Tone::Muted)
        );
    }
    Ok(())
}
