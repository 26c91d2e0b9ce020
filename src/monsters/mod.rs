pub mod catalog;
pub mod monster;
pub mod move_manager;

pub use catalog::MonsterCatalog;
pub use monster::{DisplayMonster, ElementType, Monster, MonsterTemplate};
pub use move_manager::{MoveData, MoveRepository};
