//! Error taxonomy for the match engine.
//!
//! - [`AbilityFailure`]: a cast was refused. Nothing changed and the turn is not spent.
//! - [`ActionRejection`]: an inbound action was refused before touching any state.
//! - [`ConfigurationError`]: content tables are broken. Fatal to one match, never to the process.
//!
//! Every variant carries a stable reason code for the wire.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use thiserror::Error;

/// How a caller is expected to react to an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// The same side may try something else this turn.
    Recoverable,
    /// The request itself was wrong and should not be retried as-is.
    Validation,
    /// Broken content or state; the match cannot continue.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AbilityFailure {
    #[error("abilities are sealed")]
    Sealed,
    #[error("ability {0} was already used this match")]
    AlreadyUsed(u8),
    #[error("ability {index} needs level {index}, current level is {level}")]
    InsufficientLevel { index: u8, level: u8 },
    #[error("not enough mana: need {needed}, have {available}")]
    InsufficientResource { needed: i32, available: i32 },
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("ability {0} does not exist")]
    UnknownAbility(u8),
}

impl AbilityFailure {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Sealed => "SEALED",
            Self::AlreadyUsed(_) => "ALREADY_USED",
            Self::InsufficientLevel { .. } => "INSUFFICIENT_LEVEL",
            Self::InsufficientResource { .. } => "INSUFFICIENT_RESOURCE",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::UnknownAbility(_) => "UNKNOWN_ABILITY",
        }
    }

    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownAbility(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionRejection {
    #[error("it is not {0}'s turn")]
    NotYourTurn(crate::side::Side),
    #[error("the match has already ended")]
    MatchEnded,
    #[error("another ability is still resolving")]
    SkillInProgress,
    #[error("no item with id {0}")]
    UnknownItem(u64),
    #[error("item cannot be used: {0}")]
    ItemNotUsable(String),
    #[error("consumable limit of {0} per turn reached")]
    ItemLimitReached(u8),
    #[error("invalid slot {0}")]
    InvalidSlot(u8),
    #[error("no shop entry at index {0}")]
    ShopIndexOutOfRange(usize),
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u32, available: u32 },
    #[error("already at the level cap")]
    LevelCapReached,
    #[error("not enough exp: need {needed}, have {available}")]
    ExpInsufficient { needed: u32, available: u32 },
    #[error("exp is already sufficient, no coins needed")]
    ExpAlreadySufficient,
    #[error(transparent)]
    Ability(#[from] AbilityFailure),
}

impl ActionRejection {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotYourTurn(_) => "NOT_YOUR_TURN",
            Self::MatchEnded => "MATCH_ENDED",
            Self::SkillInProgress => "SKILL_IN_PROGRESS",
            Self::UnknownItem(_) => "UNKNOWN_ITEM",
            Self::ItemNotUsable(_) => "ITEM_NOT_USABLE",
            Self::ItemLimitReached(_) => "ITEM_LIMIT_REACHED",
            Self::InvalidSlot(_) => "INVALID_SLOT",
            Self::ShopIndexOutOfRange(_) => "SHOP_INDEX_OUT_OF_RANGE",
            Self::InsufficientCoins { .. } => "INSUFFICIENT_COINS",
            Self::LevelCapReached => "LEVEL_CAP_REACHED",
            Self::ExpInsufficient { .. } => "EXP_INSUFFICIENT",
            Self::ExpAlreadySufficient => "EXP_ALREADY_SUFFICIENT",
            Self::Ability(failure) => failure.code(),
        }
    }

    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Ability(failure) => failure.severity(),
            Self::InsufficientCoins { .. }
            | Self::ItemLimitReached(_)
            | Self::ExpInsufficient { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no job template for {0}")]
    MissingJobTemplate(String),
    #[error("corrupt item data: {0}")]
    CorruptItemData(String),
    #[error("invalid ability table: {0}")]
    InvalidAbilityTable(String),
}

impl ConfigurationError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingJobTemplate(_) => "MISSING_JOB_TEMPLATE",
            Self::CorruptItemData(_) => "CORRUPT_ITEM_DATA",
            Self::InvalidAbilityTable(_) => "INVALID_ABILITY_TABLE",
        }
    }

    pub const fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_failure_codes_pass_through_rejection() {
        let rejection: ActionRejection = AbilityFailure::Sealed.into();
        assert_eq!(rejection.code(), "SEALED");
        assert_eq!(rejection.severity(), ErrorSeverity::Recoverable);
    }

    #[test]
    fn turn_errors_are_validation() {
        let rejection = ActionRejection::NotYourTurn(crate::side::Side::P2);
        assert_eq!(rejection.code(), "NOT_YOUR_TURN");
        assert_eq!(rejection.severity().as_str(), "validation");
        assert_eq!(rejection.to_string(), "it is not P2's turn");
    }
}
