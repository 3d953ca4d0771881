use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::{Arc, OnceLock};

use tempo::commands::{BotContext, CommandRouter};
use tempo::core::Config;
use tempo::features::activity::ActivityLog;
use tempo::features::recurrence::{DailyRolePing, WeeklyReports};
use tempo::features::reminders::{DeliveryEngine, ReminderScheduler, ReminderStore};
use tempo::features::tasks::TaskBoard;
use tempo::gateway::{ChatGateway, DiscordGateway};

struct Handler {
    config: Config,
    store: Arc<ReminderStore>,
    tasks: Arc<TaskBoard>,
    activity: Arc<ActivityLog>,
    /// Set on the first Ready event, once the session's http/cache handles
    /// exist. Messages arriving earlier are dropped.
    router: OnceLock<CommandRouter>,
}

impl Handler {
    fn new(config: Config) -> Self {
        Handler {
            config,
            store: Arc::new(ReminderStore::new()),
            tasks: Arc::new(TaskBoard::new()),
            activity: Arc::new(ActivityLog::new()),
            router: OnceLock::new(),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let Some(router) = self.router.get() else {
            return;
        };

        if let Err(e) = router.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e}");
            if let Err(why) = msg
                .channel_id
                .say(
                    &ctx.http,
                    "Sorry, I encountered an error processing your message.",
                )
                .await
            {
                error!("Failed to send error message: {why}");
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected and ready!", ready.user.name);
        info!("Connected to {} guilds", ready.guilds.len());
        info!("Bot ID: {}", ready.user.id);

        if self.router.get().is_some() {
            info!("Reconnected to gateway, schedulers already running");
            return;
        }

        let gateway: Arc<dyn ChatGateway> = Arc::new(DiscordGateway::new(
            ctx.http.clone(),
            ctx.cache.clone(),
            self.config.audit_log_channel_id,
        ));

        let bot_ctx = Arc::new(BotContext::new(
            self.config.clone(),
            gateway.clone(),
            self.store.clone(),
            self.tasks.clone(),
            self.activity.clone(),
        ));

        if self.router.set(CommandRouter::new(bot_ctx)).is_err() {
            return;
        }

        // Background loops: the 30s due sweep, the 15m weekly report poll,
        // and the self-rescheduling daily role ping.
        let engine = DeliveryEngine::new(gateway.clone(), self.config.timezone);
        let scheduler = ReminderScheduler::new(self.store.clone(), engine);
        tokio::spawn(async move {
            scheduler.run().await;
        });

        let reports = WeeklyReports::new(
            gateway.clone(),
            self.tasks.clone(),
            self.activity.clone(),
            self.config.timezone,
            self.config.moderator_channel_id,
        );
        tokio::spawn(async move {
            reports.run().await;
        });

        let daily = DailyRolePing::new(gateway, &self.config);
        tokio::spawn(async move {
            daily.run().await;
        });

        info!("Schedulers started (sweep, weekly reports, daily role ping)");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting {} automation agent...", config.bot_name);
    info!("Configured timezone: {}", config.timezone);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();
    let handler = Handler::new(config);

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            error!("This could indicate:");
            error!("  - Invalid bot token format");
            error!("  - Network issues reaching Discord API");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        error!("This could be due to:");
        error!("  - Invalid bot token");
        error!("  - Network connectivity issues");
        error!("  - Missing required permissions");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
