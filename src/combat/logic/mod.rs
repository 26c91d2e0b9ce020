pub mod battle_calculations;
pub mod capture;
pub mod wild_battle;

pub use battle_calculations::{calculate_damage, type_effectiveness, DamageRoll, Effectiveness};
pub use capture::attempt_capture;
pub use wild_battle::{AttackResolution, CaptureResolution, Rejection};
