//! Dispatch command

use super::{Context, parse_params, parse_route};
use crate::error::CliResult;
use serde_json::Value;

/// Dispatch a call through the fallback chain and print the envelope.
pub async fn execute(
    ctx: &Context,
    verb: &str,
    path: &str,
    params: &[String],
    query: &[String],
    body: Option<&str>,
) -> CliResult<()> {
    let route = parse_route(verb, path)?;
    let params = parse_params(params)?;
    let query = parse_params(query)?;
    let body: Option<Value> = body.map(serde_json::from_str::<Value>).transpose()?;

    let (client, _) = ctx.client().await?;
    ctx.info(&format!("Dispatching {}", route));

    let envelope = client
        .dispatch_with_query(&route, &params, &query, body)
        .await;
    ctx.finish(&envelope)
}
