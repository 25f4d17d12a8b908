mod changelog;
mod commands;
mod config;
mod embed;
mod error;
mod events;
mod git;
mod handlers;
mod logging;
mod state;
mod status;

use std::process;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dotenv::dotenv;
use log::{debug, error, info};
use serenity::async_trait;
use serenity::cache::Cache;
use serenity::client::bridge::gateway::ShardManager;
use serenity::http::Http;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;

use crate::config::Config;
use crate::error::BotError;
use crate::handlers::cooldown::SWEEP_INTERVAL;
use crate::handlers::event::READY;
use crate::handlers::reply::invocation_from;
use crate::handlers::{Dispatcher, EventRegistry};
use crate::state::{BotState, ShardManagerContainer};

struct Bot {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher<BotState>>,
    events: Arc<EventRegistry<BotState>>,
    started_at: DateTime<Utc>,
}

impl Bot {
    fn state(&self, ctx: Context) -> BotState {
        BotState {
            ctx,
            config: self.config.clone(),
            started_at: self.started_at,
            command_count: self.dispatcher.commands().len(),
        }
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(command) = interaction {
            debug!("Received command interaction: {} from {}", command.data.name, command.user.tag());

            let invocation = invocation_from(ctx.http.clone(), &ctx.cache, command);
            self.dispatcher.dispatch(self.state(ctx), invocation).await;
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        match commands::deploy(&ctx.http, self.config.guild_id, self.dispatcher.commands()).await {
            Ok(count) => info!("{} slash commands created", count),
            Err(error) => error!("Error while creating commands: {}", error),
        }

        self.events.emit(READY, self.state(ctx)).await;
    }
}

enum Shutdown {
    Interrupt,
    Terminate,
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<Shutdown, BotError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            Ok(Shutdown::Interrupt)
        }
        _ = terminate.recv() => Ok(Shutdown::Terminate),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<Shutdown, BotError> {
    tokio::signal::ctrl_c().await?;
    Ok(Shutdown::Interrupt)
}

/// Posts a final status on SIGINT/SIGTERM, closes the shards and exits 0.
async fn shutdown_on_signal(
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard_manager: Arc<Mutex<ShardManager>>,
    config: Arc<Config>,
    started_at: DateTime<Utc>,
    command_count: usize,
) {
    let signal = match wait_for_shutdown().await {
        Ok(signal) => signal,
        Err(why) => {
            error!("Cannot listen for shutdown signals: {}", why);
            return;
        }
    };

    let manager = state::status_manager(&http, &cache, &config, started_at, command_count);
    match signal {
        Shutdown::Interrupt => {
            info!("🔄 Recibida señal SIGINT, actualizando estado...");
            manager.set_restarting().await;
        }
        Shutdown::Terminate => {
            info!("🔄 Recibida señal SIGTERM, actualizando estado...");
            manager.set_offline().await;
        }
    }

    shard_manager.lock().await.shutdown_all().await;
    process::exit(0);
}

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(why) => {
            eprintln!("{}", why);
            process::exit(1);
        }
    };
    logging::init(&config.log_level);
    logging::install_panic_hook();

    let started_at = Utc::now();
    let dispatcher = Arc::new(Dispatcher::new(commands::load(commands::definitions())));
    let events = Arc::new(events::load(events::definitions()));
    let command_count = dispatcher.commands().len();
    dispatcher.cooldowns().spawn_sweeper(SWEEP_INTERVAL);

    let bot = Bot {
        config: config.clone(),
        dispatcher,
        events,
        started_at,
    };

    // Slash commands need no privileged intents; the cache only has to see guilds.
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;

    let mut client = match Client::builder(&config.token, intents).event_handler(bot).await {
        Ok(client) => client,
        Err(why) => {
            error!("Error creating client: {}", why);
            process::exit(1);
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
    }

    let http = client.cache_and_http.http.clone();
    let cache = client.cache_and_http.cache.clone();
    tokio::spawn(shutdown_on_signal(
        http.clone(),
        cache.clone(),
        client.shard_manager.clone(),
        config.clone(),
        started_at,
        command_count,
    ));

    // Finally, start a single shard, and start listening to events.
    //
    // Shards will automatically attempt to reconnect, and will perform
    // exponential backoff until it reconnects.
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
        state::status_manager(&http, &cache, &config, started_at, command_count)
            .set_error("Error del cliente detectado")
            .await;
        process::exit(1);
    }
}
