//! Delivery of notification texts to the chat.

use hwbot_telegram::TelegramBot;

use crate::error::Result;

/// Sends text to the single fixed destination.
///
/// Implementations report failures; deciding what to do about them is the
/// poll loop's job.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Delivers one message.
    async fn notify(&self, message: &str) -> Result<()>;
}

/// [`Notifier`] backed by a Telegram bot and a chat identifier.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot: TelegramBot,
    chat_id: String,
}

impl TelegramNotifier {
    /// Binds a bot to the chat it reports to.
    #[must_use]
    pub fn new(bot: TelegramBot, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }

    /// Returns the destination chat.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.bot.send_message(&self.chat_id, message).await?;
        Ok(())
    }
}
