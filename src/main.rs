#[tokio::main]
async fn main() -> faqbot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("faqbot=info,serenity=warn"),
    )
    .init();
    log::info!("Starting faqbot Discord bot");

    match faqbot::run().await {
        Ok(_) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {}", e);
            Err(e)
        }
    }
}
