use super::ui;
use crate::conversation::reply;
use crate::core::ConversionRequest;
use crate::resolver::{ProbeOutcome, ProviderOutcome, RateResolver, Resolution};
use anyhow::{Result, bail};
use comfy_table::Cell;

/// Resolves a single conversion and prints it the way the bot would.
pub async fn convert(resolver: &RateResolver, request: &ConversionRequest) -> Result<()> {
    let spinner = ui::new_spinner("Fetching rate...");
    let resolution = resolver.resolve(request).await;
    spinner.finish_and_clear();

    match resolution {
        Resolution::Resolved { provider, value } => {
            println!(
                "{} {}",
                ui::style_text(&reply::format_conversion(request, value), ui::StyleType::Value),
                ui::style_text(&format!("(via {provider})"), ui::StyleType::Subtle)
            );
            Ok(())
        }
        Resolution::Unavailable => {
            println!(
                "{}",
                ui::style_text("No rate available from any provider", ui::StyleType::Error)
            );
            bail!("All rate providers failed for {} {} -> {}", request.amount, request.source, request.destination)
        }
    }
}

pub fn probe_table(request: &ConversionRequest, outcomes: &[ProbeOutcome]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Provider"),
        ui::header_cell("Status"),
        ui::header_cell(&format!("Result ({})", request.destination)),
    ]);

    for (index, probe) in outcomes.iter().enumerate() {
        let (status, result) = match &probe.outcome {
            ProviderOutcome::Value(v) => (ui::status_cell("ok", true), format!("{v:.2}")),
            ProviderOutcome::Absent => (ui::status_cell("no value", false), "N/A".to_string()),
            ProviderOutcome::Failed(e) => (ui::status_cell("error", false), e.to_string()),
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&probe.provider),
            status,
            Cell::new(result),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(
            &format!("{} {} → {}", request.amount, request.source, request.destination),
            ui::StyleType::Title
        ),
        table
    )
}

/// Queries every provider and prints a table of their outcomes.
pub async fn probe(resolver: &RateResolver, request: &ConversionRequest) -> Result<()> {
    let spinner = ui::new_spinner("Probing providers...");
    let outcomes = resolver.probe(request).await;
    spinner.finish_and_clear();

    println!("{}", probe_table(request, &outcomes));
    Ok(())
}
