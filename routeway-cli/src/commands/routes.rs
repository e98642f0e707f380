//! Route listing command

use super::Context;
use crate::error::CliResult;
use colored::Colorize;
use routeway_client::{FallbackPolicy, RouteEntry};
use serde_json::json;

/// List all routes command
pub fn execute(ctx: &Context) -> CliResult<()> {
    let table = ctx.table()?;

    if ctx.json() {
        let routes: Vec<_> = table
            .routes()
            .map(|entry| {
                json!({
                    "method": entry.route().method().as_str(),
                    "path": entry.route().path_pattern(),
                    "endpoints": entry.templates(),
                    "policy": entry.policy(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    if table.is_empty() {
        println!("No routes configured.");
        return Ok(());
    }

    let entries: Vec<&RouteEntry> = table.routes().collect();
    print_routes_table(&entries);

    println!();
    println!("Statistics:");
    println!("  Total routes: {}", table.len());
    println!("  Probe endpoints: {}", table.endpoints().len());

    Ok(())
}

fn print_routes_table(entries: &[&RouteEntry]) {
    let method_width = 7;
    let path_width = entries
        .iter()
        .map(|e| e.route().path_pattern().len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:width$}  PATH", "METHOD", width = method_width);
    println!("{}", "-".repeat(method_width + path_width + 2));

    for entry in entries {
        let policy = match entry.policy() {
            FallbackPolicy::OnNotFound => String::new(),
            FallbackPolicy::Strict => format!(" {}", "[strict]".yellow()),
        };
        println!(
            "{:width$}  {}{}",
            entry.route().method().as_str().bold(),
            entry.route().path_pattern(),
            policy,
            width = method_width
        );

        for (i, template) in entry.templates().iter().enumerate() {
            println!("  {} {}. {}", "└─".dimmed(), i + 1, template.as_str());
        }
    }
}
