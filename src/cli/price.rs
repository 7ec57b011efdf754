use super::ui;
use crate::core::amount::{WEI_PER_NATIVE, format_fixed};
use crate::core::conversion::{checked_rate, conversion_rate, minimum_native_amount};
use crate::core::oracle::RoundData;
use crate::deployment::Deployment;
use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;

/// `answer / 10^decimals` as a decimal string.
pub fn format_rate(round: &RoundData) -> String {
    Decimal::try_from_i128_with_scale(round.answer, u32::from(round.decimals))
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|_| format!("{}e-{}", round.answer, round.decimals))
}

pub async fn run(deployment: &Deployment) -> Result<()> {
    let ledger = &deployment.ledger;
    let feed = ledger.price_feed();

    let pb = ui::feed_spinner("Reading price feed...");
    let round = feed.current_rate().await;
    pb.finish_and_clear();
    let round = round?;

    println!("{}\n", ui::paint(&feed.description(), ui::Tone::Heading));
    println!("{}", ui::labeled("Rate", &format_rate(&round)));
    if let Some(updated_at) = round.updated_at {
        println!("{}", ui::labeled("Updated", &updated_at.to_rfc3339()));
    }

    match checked_rate(&round, ledger.max_rate_age(), Utc::now()) {
        Ok(rate) => {
            println!(
                "{}",
                ui::labeled(
                    "One native unit is worth",
                    &format_fixed(conversion_rate(WEI_PER_NATIVE, rate))
                )
            );
            let minimum = minimum_native_amount(ledger.minimum_contribution(), rate)
                .map_or("N/A".to_string(), format_fixed);
            println!(
                "{}",
                ui::labeled(
                    "Minimum contribution",
                    &format!(
                        "{} ({} reference units)",
                        ui::paint(&minimum, ui::Tone::Amount),
                        format_fixed(ledger.minimum_contribution())
                    )
                )
            );
        }
        Err(e) => println!(
            "{}",
            ui::paint(&format!("Contributions are rejected: {e}"), ui::Tone::Rejected)
        ),
    }
    Ok(())
}
