//! Route resolution command

use super::{Context, parse_params, parse_route};
use crate::error::CliResult;
use routeway_client::RouteResolver;
use std::sync::Arc;

/// Print the candidate URLs for a route without sending anything.
pub fn execute(ctx: &Context, verb: &str, path: &str, params: &[String]) -> CliResult<()> {
    let route = parse_route(verb, path)?;
    let params = parse_params(params)?;
    let resolver = RouteResolver::new(Arc::new(ctx.table()?));

    let requests = resolver.resolve(&route, &params)?;

    if ctx.json() {
        let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&urls)?);
    } else {
        for request in &requests {
            println!("{} {}", request.method, request.url);
        }
    }

    Ok(())
}
