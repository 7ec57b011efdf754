use super::ui;
use crate::core::amount::format_fixed;
use crate::core::{Address, WithdrawStrategy};
use crate::deployment::Deployment;
use anyhow::Result;

pub async fn run(deployment: &Deployment, from: &Address, strategy: WithdrawStrategy) -> Result<()> {
    let receipt = deployment.ledger.withdraw_with(from, strategy).await?;
    deployment.commit().await?;

    println!(
        "{} {} to {} ({} funders cleared)",
        ui::paint("Withdrew", ui::Tone::Amount),
        format_fixed(receipt.amount),
        receipt.to,
        receipt.funders_cleared
    );
    println!(
        "{}",
        ui::labeled(
            "Owner balance",
            &format_fixed(deployment.accounts.balance_of(&receipt.to).await)
        )
    );
    Ok(())
}
