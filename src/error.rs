use thiserror::Error;

use crate::session::Screen;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog JSON")]
    Parse(#[from] serde_json::Error),

    #[error("{monster} references unknown move {key}")]
    UnknownMove { monster: String, key: String },

    #[error("{monster} knows no moves")]
    NoMoves { monster: String },

    #[error("{monster} has an invalid {stat} of zero")]
    InvalidStat { monster: String, stat: &'static str },

    #[error("catalog defines no starters")]
    NoStarters,

    #[error("catalog defines no wild monsters")]
    NoWildMonsters,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown starter {0}")]
    UnknownStarter(String),

    #[error("{operation} is not available on the {screen:?} screen")]
    WrongScreen { operation: &'static str, screen: Screen },

    #[error("the battle has not finished yet")]
    BattleNotFinished,

    #[error("the roster is empty")]
    EmptyRoster,

    #[error("no wild monsters to encounter")]
    NoWildMonsters,
}

pub type GameResult<T> = std::result::Result<T, GameError>;
