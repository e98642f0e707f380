//! Session commands

use super::Context;
use crate::error::CliResult;
use routeway_client::ResultEnvelope;
use serde_json::json;

pub async fn login(ctx: &Context, email: &str, password: &str) -> CliResult<()> {
    let (client, _) = ctx.client().await?;
    if !ctx.persists_session() {
        ctx.warn("No session_file configured; the token will not outlive this process");
    }

    let envelope = client
        .login(json!({ "email": email, "password": password }))
        .await;

    // The token stays out of the output.
    if envelope.success {
        if !ctx.json() {
            ctx.success(&format!("Logged in as {}", email));
            return Ok(());
        }
        return ctx.finish(&ResultEnvelope {
            data: None,
            ..envelope
        });
    }
    ctx.finish(&envelope)
}

pub async fn logout(ctx: &Context) -> CliResult<()> {
    let (client, _) = ctx.client().await?;

    let envelope = client.logout().await;
    if envelope.success && !ctx.json() {
        ctx.success("Logged out");
        return Ok(());
    }
    ctx.finish(&envelope)
}
