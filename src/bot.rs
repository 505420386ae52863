//! Discord bot core logic and event handling.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use poise::{
    Framework, FrameworkOptions, builtins,
    serenity_prelude::{
        ClientBuilder, Context, CreateMessage, FullEvent, GatewayIntents, Http, Mentionable,
        Message as SerenityMessage,
    },
};

use crate::addressing::{self, Addressing};
use crate::api::{self, ApiState};
use crate::config::Credentials;
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::moderation;
use crate::queue::{self, OutboundTask, TaskReceiver};
use crate::settings::{self, SettingsStore};

type EventResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

const CONFIG_FILE: &str = "config.toml";

/// Upper bound on outbound send latency without busy-looping on the queue.
const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(1);

struct Data {
    store: Arc<SettingsStore>,
    gemini: GeminiClient,
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let credentials = Credentials::from_env()?;

    let store = Arc::new(SettingsStore::new(CONFIG_FILE));
    store.load();

    debug!("Starting file watcher");
    let watcher = settings::watch(Arc::clone(&store))?;

    let (task_tx, task_rx) = queue::task_queue();

    let api_settings = store.settings();
    let api_state = ApiState {
        store: Arc::clone(&store),
        tasks: task_tx,
    };
    let api_task = tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, &api_settings.api_host, api_settings.api_port).await {
            error!("Control surface exited with error: {}", e);
        }
    });

    debug!("Initializing Gemini client");
    let gemini = GeminiClient::new(credentials.gemini_api_key.clone());

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let data_store = Arc::clone(&store);

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord");
                builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    store: data_store,
                    gemini,
                })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(credentials.discord_token, intents)
        .framework(framework)
        .await?;

    let poller_task = spawn_outbound_poller(client.http.clone(), task_rx);

    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    // Shutdown order: file watcher first, then the control surface and the
    // queue poller. Queued outbound tasks are not drained.
    drop(watcher);
    info!("File watcher stopped");
    api_task.abort();
    poller_task.abort();
    info!("Control surface stopped");

    Ok(())
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> EventResult {
    if let FullEvent::Message { new_message } = event {
        handle_message(ctx, new_message, data).await?;
    }
    Ok(())
}

/// Per-message dispatch. Terminal states in order of first match:
/// self-authored, banned content, not addressed, empty question, completion.
async fn handle_message(ctx: &Context, message: &SerenityMessage, data: &Data) -> Result<()> {
    let bot_id = ctx.cache.current_user().id;

    if message.author.id == bot_id {
        return Ok(());
    }

    let snapshot = data.store.snapshot();

    // Moderation short-circuits addressing and completion.
    if moderation::is_banned(&message.content, &snapshot.banned_words) {
        if let Err(e) = moderation::handle_banned_message(ctx, message).await {
            error!(
                "Failed to post moderation warning for {}: {}",
                message.author.tag(),
                e
            );
        }
        return Ok(());
    }

    let resolved = addressing::resolve(
        &message.content,
        message.mentions_user_id(bot_id),
        bot_id,
        snapshot.settings.command_prefix.as_deref(),
    );
    let Addressing::Addressed { question } = resolved else {
        return Ok(());
    };

    if question.is_empty() {
        message
            .reply(
                &ctx.http,
                format!(
                    "{}, please include your question.",
                    message.author.mention()
                ),
            )
            .await?;
        return Ok(());
    }

    info!(
        "Received question from {} in channel {}: {}",
        message.author.tag(),
        message.channel_id,
        question
    );

    if let Err(e) = message.channel_id.broadcast_typing(&ctx.http).await {
        debug!("Failed to broadcast typing indicator: {}", e);
    }

    match data
        .gemini
        .complete(&question, &snapshot.faq, &snapshot.settings.gemini_model)
        .await
    {
        Ok(answer) => {
            message.reply(&ctx.http, &answer).await?;
            info!(
                "Replied to {} in channel {}: {}",
                message.author.tag(),
                message.channel_id,
                answer
            );
        }
        Err(e) => {
            error!(
                "Error answering question from {}: {}",
                message.author.tag(),
                e
            );
            message.reply(&ctx.http, e.user_message()).await?;
        }
    }

    Ok(())
}

/// Drains the outbound task queue once per poll interval, delivering each
/// task through the Discord HTTP API.
fn spawn_outbound_poller(http: Arc<Http>, mut tasks: TaskReceiver) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(QUEUE_POLL_INTERVAL);
        loop {
            interval.tick().await;
            while let Some(task) = tasks.try_pop() {
                deliver_task(&http, task).await;
            }
        }
    })
}

/// Delivery is at-most-once: a task whose target cannot be resolved or
/// whose send fails is logged and dropped.
async fn deliver_task(http: &Http, task: OutboundTask) {
    match task {
        OutboundTask::ChannelMessage {
            channel_id,
            content,
        } => {
            if let Err(e) = http.get_channel(channel_id).await {
                error!(
                    "Channel {} not found for outbound message: {}",
                    channel_id, e
                );
                return;
            }
            match channel_id.say(http, content).await {
                Ok(_) => info!("Sent outbound message to channel {}", channel_id),
                Err(e) => error!(
                    "Failed to send outbound message to channel {}: {}",
                    channel_id, e
                ),
            }
        }
        OutboundTask::DirectMessage { user_id, content } => {
            let user = match http.get_user(user_id).await {
                Ok(user) => user,
                Err(e) => {
                    error!("User {} not found for outbound DM: {}", user_id, e);
                    return;
                }
            };
            match user
                .direct_message(http, CreateMessage::new().content(content))
                .await
            {
                Ok(_) => info!("Sent outbound DM to user {}", user_id),
                Err(e) => error!("Failed to send outbound DM to user {}: {}", user_id, e),
            }
        }
    }
}
