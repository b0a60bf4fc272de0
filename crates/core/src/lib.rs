pub mod animation;
pub mod camera;
pub mod combat;
pub mod config;
pub mod content;
pub mod effects;
pub mod engagement;
pub mod frame;
pub mod game;
pub mod grid;
pub mod map_config;
pub mod pathfinding;
pub mod session;
pub mod types;
pub mod unit;

pub use camera::{Camera, CameraState};
pub use combat::{AutoResolver, BattleResolver, BridgeError, UnavailableResolver};
pub use config::EngineConfig;
pub use content::{CombatData, ContentError, ContentPack};
pub use effects::{ActiveEffect, Effect};
pub use engagement::Engagement;
pub use frame::{FrameDriver, FrameReport};
pub use game::{Banner, Game, GameState, Selection, UpdateReport};
pub use map_config::{MapConfig, MapConfigError};
pub use session::{MoveRecord, SessionSnapshot, SyncRequest};
pub use types::*;
pub use unit::{Unit, UnitSpec, Units};
