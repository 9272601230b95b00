// src/types/mod.rs - Message, mode and classification types shared across the engine

use log::warn;
use serde::{Deserialize, Serialize};

/// The message sent when a game ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEndMessage {
    #[default]
    GgUpper,
    GgLower,
    GoodGame,
    GoodGameLower,
    GoodFight,
    Gf,
    GoodRound,
}

impl GameEndMessage {
    pub const ALL: [GameEndMessage; 7] = [
        GameEndMessage::GgUpper,
        GameEndMessage::GgLower,
        GameEndMessage::GoodGame,
        GameEndMessage::GoodGameLower,
        GameEndMessage::GoodFight,
        GameEndMessage::Gf,
        GameEndMessage::GoodRound,
    ];

    /// Literal chat text for this message
    pub fn message(&self) -> &'static str {
        match self {
            GameEndMessage::GgUpper => "GG",
            GameEndMessage::GgLower => "gg",
            GameEndMessage::GoodGame => "Good Game",
            GameEndMessage::GoodGameLower => "good game",
            GameEndMessage::GoodFight => "Good Fight",
            GameEndMessage::Gf => "gf",
            GameEndMessage::GoodRound => "Good Round! :D",
        }
    }

    /// Name used in the settings file
    pub fn config_name(&self) -> &'static str {
        match self {
            GameEndMessage::GgUpper => "GG_UPPER",
            GameEndMessage::GgLower => "GG_LOWER",
            GameEndMessage::GoodGame => "GOOD_GAME",
            GameEndMessage::GoodGameLower => "GOOD_GAME_LOWER",
            GameEndMessage::GoodFight => "GOOD_FIGHT",
            GameEndMessage::Gf => "GF",
            GameEndMessage::GoodRound => "GOOD_ROUND",
        }
    }

    /// Parse a settings value. Unknown names fall back to the default.
    pub fn from_config_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.config_name() == name)
            .unwrap_or_else(|| {
                warn!("Unknown game end message '{}', using {}", name, Self::default().config_name());
                Self::default()
            })
    }
}

/// The optional follow-up message sent after the game end message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdditionalMessage {
    #[default]
    Heart,
    HaveAGoodDay,
    WellPlayed,
    Smile,
    NextTime,
}

impl AdditionalMessage {
    pub const ALL: [AdditionalMessage; 5] = [
        AdditionalMessage::Heart,
        AdditionalMessage::HaveAGoodDay,
        AdditionalMessage::WellPlayed,
        AdditionalMessage::Smile,
        AdditionalMessage::NextTime,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            AdditionalMessage::Heart => "<3",
            AdditionalMessage::HaveAGoodDay => "Have a good day!",
            AdditionalMessage::WellPlayed => "wp",
            AdditionalMessage::Smile => ":)",
            AdditionalMessage::NextTime => "Good luck next time!",
        }
    }

    pub fn config_name(&self) -> &'static str {
        match self {
            AdditionalMessage::Heart => "HEART",
            AdditionalMessage::HaveAGoodDay => "HAVE_A_GOOD_DAY",
            AdditionalMessage::WellPlayed => "WELL_PLAYED",
            AdditionalMessage::Smile => "SMILE",
            AdditionalMessage::NextTime => "NEXT_TIME",
        }
    }

    /// Parse a settings value. Unknown names fall back to the default.
    pub fn from_config_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.config_name() == name)
            .unwrap_or_else(|| {
                warn!("Unknown additional message '{}', using {}", name, Self::default().config_name());
                Self::default()
            })
    }
}

/// Which trigger sets a line is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Normal (karma) triggers only
    Normal,
    /// Normal and casual triggers
    Casual,
}

impl MatchMode {
    pub fn from_casual_flag(casual: bool) -> Self {
        if casual {
            MatchMode::Casual
        } else {
            MatchMode::Normal
        }
    }

    pub fn includes_casual(&self) -> bool {
        matches!(self, MatchMode::Casual)
    }
}

/// Result of classifying a chat line against the active rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No server key matched the context (or no rules are loaded yet)
    NoServerRules,
    /// Rules exist for the server but the line is not an end-of-game line
    NotTriggered,
    /// End of game detected; outgoing messages get this prefix
    Triggered { message_prefix: String },
}

impl Classification {
    pub fn is_triggered(&self) -> bool {
        matches!(self, Classification::Triggered { .. })
    }
}

/// What the host should do with a chat line after it was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    Show,
    Hide,
}
