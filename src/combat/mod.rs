pub mod commentary;
pub mod logic;
pub mod manager;
pub mod state;

pub use commentary::{Commentator, CommentaryError, CommentaryProvider, CommentaryRequest};
pub use logic::Rejection;
pub use manager::{ActionOutcome, BattleController, BattlePacing};
pub use state::{
    BattleLog,
    BattlePhase,
    BattleResult,
    BattleSession,
    BattleSnapshot,
    Side,
    WildBattleOutcome,
};
