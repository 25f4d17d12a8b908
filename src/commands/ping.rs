use std::time::Duration;

use chrono::Utc;
use string_builder::Builder;

use crate::error::BotError;
use crate::handlers::{CommandDefinition, Invocation};
use crate::state::BotState;

pub fn definition() -> CommandDefinition<BotState> {
    CommandDefinition::new("ping", "Responde con Pong! y muestra la latencia del bot")
        .cooldown(3)
        .handler(run)
}

pub async fn run(state: BotState, invocation: Invocation) -> Result<(), BotError> {
    invocation.responder.reply("🏓 Calculando ping...", false).await?;

    let roundtrip_ms = Utc::now().timestamp_millis() - invocation.created_at_ms;
    let heartbeat = state.gateway_latency().await;
    invocation.responder.edit(&pong_message(roundtrip_ms, heartbeat)?).await
}

pub fn pong_message(roundtrip_ms: i64, heartbeat: Option<Duration>) -> Result<String, BotError> {
    let heartbeat = heartbeat
        .map(|latency| format!("{}ms", latency.as_millis()))
        .unwrap_or_else(|| "n/d".to_string());

    let mut builder = Builder::default();
    builder.append("🏓 **Pong!**\n");
    builder.append(format!("📡 **Latencia de ida y vuelta:** {}ms\n", roundtrip_ms.max(0)));
    builder.append(format!("💓 **Latencia del WebSocket:** {}\n", heartbeat));
    builder.append("🌙 **Mizuki está funcionando perfectamente!**");
    Ok(builder.string()?)
}
