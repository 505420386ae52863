//! Decides whether an inbound message is directed at the bot and extracts
//! the question text.

use poise::serenity_prelude::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    /// The message is directed at the bot. `question` is the extracted
    /// body, trimmed, and may be empty.
    Addressed { question: String },
    NotAddressed,
}

/// A message is addressed when it mentions the bot or starts with the
/// configured command prefix. An unset or empty prefix disables prefix
/// addressing. Mention addressing takes precedence.
pub fn resolve(
    content: &str,
    mentions_bot: bool,
    bot_id: UserId,
    prefix: Option<&str>,
) -> Addressing {
    if mentions_bot {
        return Addressing::Addressed {
            question: strip_mentions(content, bot_id),
        };
    }

    if let Some(prefix) = prefix
        && !prefix.is_empty()
        && let Some(rest) = content.strip_prefix(prefix)
    {
        return Addressing::Addressed {
            question: rest.trim().to_string(),
        };
    }

    Addressing::NotAddressed
}

/// Removes every `<@id>` and `<@!id>` self-mention token and trims the
/// surrounding whitespace.
fn strip_mentions(content: &str, bot_id: UserId) -> String {
    let mention = format!("<@{bot_id}>");
    let nick_mention = format!("<@!{bot_id}>");
    content
        .replace(&nick_mention, "")
        .replace(&mention, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_ID: UserId = UserId::new(4242);

    #[test]
    fn mention_is_stripped_and_trimmed() {
        let resolved = resolve("<@4242>  what are your hours?  ", true, BOT_ID, None);
        assert_eq!(
            resolved,
            Addressing::Addressed {
                question: "what are your hours?".to_string()
            }
        );
    }

    #[test]
    fn every_mention_token_form_is_removed() {
        let resolved = resolve("<@!4242> hello <@4242> there", true, BOT_ID, None);
        assert_eq!(
            resolved,
            Addressing::Addressed {
                question: "hello  there".to_string()
            }
        );
    }

    #[test]
    fn bare_mention_yields_empty_question() {
        let resolved = resolve("<@4242>", true, BOT_ID, Some("!ask"));
        assert_eq!(
            resolved,
            Addressing::Addressed {
                question: String::new()
            }
        );
    }

    #[test]
    fn prefix_is_stripped_and_trimmed() {
        let resolved = resolve("!ask  what are your hours?", false, BOT_ID, Some("!ask"));
        assert_eq!(
            resolved,
            Addressing::Addressed {
                question: "what are your hours?".to_string()
            }
        );
    }

    #[test]
    fn unset_prefix_disables_prefix_addressing() {
        assert_eq!(
            resolve("!ask hello", false, BOT_ID, None),
            Addressing::NotAddressed
        );
        assert_eq!(
            resolve("!ask hello", false, BOT_ID, Some("")),
            Addressing::NotAddressed
        );
    }

    #[test]
    fn unrelated_message_is_not_addressed() {
        assert_eq!(
            resolve("good morning everyone", false, BOT_ID, Some("!ask")),
            Addressing::NotAddressed
        );
    }

    #[test]
    fn mention_takes_precedence_over_prefix() {
        let resolved = resolve("!ask <@4242> hours?", true, BOT_ID, Some("!ask"));
        assert_eq!(
            resolved,
            Addressing::Addressed {
                question: "!ask  hours?".to_string()
            }
        );
    }
}
