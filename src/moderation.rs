//! Banned-content filtering and enforcement.

use std::collections::HashSet;
use std::time::Duration;

use log::{error, warn};
use poise::serenity_prelude::{Context, Mentionable, Message};

use crate::error::Result;

/// How long the moderation warning stays up before deleting itself.
const WARNING_TTL: Duration = Duration::from_secs(10);

/// Returns true if the text contains any banned word as a substring,
/// case-insensitively. Matching is substring-based, so a banned "ass"
/// also flags "class".
pub fn is_banned(text: &str, banned_words: &HashSet<String>) -> bool {
    if banned_words.is_empty() {
        return false;
    }
    let lowered = text.to_lowercase();
    banned_words.iter().any(|word| lowered.contains(word.as_str()))
}

/// Deletes a message that tripped the banned-word filter and posts a
/// warning mentioning the author; the warning removes itself after
/// [`WARNING_TTL`].
///
/// A failed delete (typically a missing Manage Messages permission) is
/// logged and aborts the warning as well: the offending message stays.
pub async fn handle_banned_message(ctx: &Context, message: &Message) -> Result<()> {
    if let Err(e) = message.delete(&ctx.http).await {
        error!(
            "Failed to delete message from {}: {}",
            message.author.tag(),
            e
        );
        return Ok(());
    }

    warn!(
        "Deleted message from {} containing a banned word: {}",
        message.author.tag(),
        message.content
    );

    let warning = message
        .channel_id
        .say(
            &ctx.http,
            format!(
                "{}, your message contained a banned word and has been removed.",
                message.author.mention()
            ),
        )
        .await?;

    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(WARNING_TTL).await;
        if let Err(e) = warning.delete(&http).await {
            warn!("Failed to delete moderation warning: {}", e);
        }
    });

    Ok(())
}
