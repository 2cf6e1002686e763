//! Reward classification: subscriber or not, and how many points that earns.

use crate::models::ChatMessageEvent;

/// Points awarded per chat message. Zero disables rewards for that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardConfig {
    pub subscriber: i32,
    pub base: i32,
}

impl RewardConfig {
    pub fn new(subscriber: i32, base: i32) -> Self {
        Self { subscriber, base }
    }
}

/// Pure: subscriber reward if the sender carries a subscriber badge, else the base reward.
pub fn classify(event: &ChatMessageEvent, config: &RewardConfig) -> i32 {
    if event.sender.is_subscriber() {
        config.subscriber
    } else {
        config.base
    }
}
