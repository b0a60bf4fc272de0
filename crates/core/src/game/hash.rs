//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from simulation control code.
//! It does not own session persistence.

use std::hash::Hasher;

use super::*;
use xxhash_rust::xxh3::Xxh3;

impl Game {
    /// Hash of the gameplay-relevant state: turn, phase, flags, walls and every unit in
    /// roster order. Render positions, camera and effects are excluded.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u32(self.state.turn);
        hasher.write_u8(match self.state.phase {
            Phase::Player => 0,
            Phase::Enemy => 1,
            Phase::FreeExplore => 2,
        });
        hasher.write_u8(u8::from(self.state.free_explore));
        hasher.write_u8(match self.state.outcome {
            None => 0,
            Some(Outcome::Victory) => 1,
            Some(Outcome::Defeat) => 2,
        });
        for wall in self.board.walls() {
            hasher.write_i32(wall.x);
            hasher.write_i32(wall.y);
        }
        for unit in self.units.all() {
            hasher.write(unit.key.as_bytes());
            hasher.write_i32(unit.pos.x);
            hasher.write_i32(unit.pos.y);
            hasher.write_i32(unit.hp);
            hasher.write_i32(unit.mana);
            hasher.write_u8(u8::from(unit.has_moved));
            hasher.write_u8(u8::from(unit.has_acted));
            hasher.write_u8(u8::from(unit.pending_death));
            hasher.write_u8(u8::from(self.state.acted_this_turn.contains(&unit.id)));
        }
        hasher.finish()
    }
}
