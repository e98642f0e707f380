//! Connectivity probe commands

use super::Context;
use crate::error::{CliError, CliResult};
use colored::Colorize;
use routeway_client::{CancellationToken, NamedEndpoint, ProbeReport, ProbeResult};
use std::time::Duration;

/// Probe every configured endpoint; Ctrl-C stops between steps.
pub async fn execute(ctx: &Context, delay_ms: Option<u64>) -> CliResult<()> {
    let (client, endpoints) = ctx.client().await?;

    let mut prober = client.prober().clone();
    if let Some(ms) = delay_ms {
        prober = prober.with_delay(Duration::from_millis(ms));
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    ctx.info(&format!(
        "Probing {} endpoints ({} ms apart)",
        endpoints.len(),
        prober.delay().as_millis()
    ));
    let report = prober.probe_until_cancelled(&endpoints, &cancel).await;

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &report.results {
            print_result(result);
        }
        println!();
        println!(
            "  {}/{} connected",
            report.connected_count,
            report.results.len()
        );
    }

    outcome(&report, endpoints.len())
}

/// Map a finished run to the command result. A cancelled run is reported as
/// such even when every endpoint it reached was connected.
fn outcome(report: &ProbeReport, total: usize) -> CliResult<()> {
    if report.cancelled {
        return Err(CliError::Cancelled {
            completed: report.results.len(),
            total,
        });
    }
    if report.all_connected {
        Ok(())
    } else {
        Err(CliError::Unreachable {
            failed: report.results.len() - report.connected_count,
            total,
        })
    }
}

/// Send an OPTIONS request to one endpoint.
pub async fn preflight(ctx: &Context, url: &str) -> CliResult<()> {
    let (client, _) = ctx.client().await?;

    let result = client
        .prober()
        .preflight(&NamedEndpoint::new(url, url))
        .await;

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if result.connected {
        Ok(())
    } else {
        Err(CliError::Unreachable {
            failed: 1,
            total: 1,
        })
    }
}

fn print_result(result: &ProbeResult) {
    let status = result
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "---".to_string());

    if result.connected {
        println!(
            "  {} {} {} {}",
            "✓".green().bold(),
            status.green(),
            result.name,
            result.url.dimmed()
        );
    } else {
        println!(
            "  {} {} {} {} {}",
            "✗".red().bold(),
            status.red(),
            result.name,
            result.url.dimmed(),
            result.error.as_deref().unwrap_or_default().red()
        );
    }
}
