pub mod config;
pub mod sanitize;
pub mod seed;
pub mod serve;

use anyhow::{Context, Result};
use reno_config::Config;
use reno_core::MessageRateLimiter;
use reno_engine::{ChatLimits, Marketplace};
use reno_security::Sanitizer;
use reno_storage::Storage;
use std::sync::Arc;

/// Sanitizer with the configured lexicon extensions
pub fn sanitizer(config: &Config) -> Result<Sanitizer> {
    Sanitizer::with_extra_terms(
        &config.sanitizer.extra_keywords,
        &config.sanitizer.extra_names,
    )
    .context("Invalid sanitizer terms in config")
}

/// Open the database and wire a marketplace from `config`
pub async fn marketplace(config: &Config) -> Result<Marketplace> {
    let storage = Storage::new(config.database.path.clone()).await?;

    let market = Marketplace::new(Arc::new(storage))
        .with_sanitizer(sanitizer(config)?)
        .with_rate_limiter(MessageRateLimiter::new(
            config.chat.messages_per_minute,
            config.chat.messages_per_five_minutes,
        ))
        .with_limits(ChatLimits {
            max_message_chars: config.chat.max_message_chars,
            max_proposed_slots: config.chat.max_proposed_slots,
        });

    Ok(market)
}
