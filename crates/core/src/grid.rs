//! Static map bounds and wall set, plus the occupancy view the pathfinder queries.
//! This module answers "can a unit stand here" and nothing else.

use std::collections::BTreeSet;

use crate::types::{Pos, UnitId};
use crate::unit::{Unit, Units};

#[derive(Clone, Debug)]
pub struct Board {
    cols: i32,
    rows: i32,
    walls: BTreeSet<Pos>,
}

impl Board {
    pub fn new(cols: i32, rows: i32, walls: impl IntoIterator<Item = Pos>) -> Self {
        Self { cols: cols.max(1), rows: rows.max(1), walls: walls.into_iter().collect() }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 1 && pos.y >= 1 && pos.x <= self.cols && pos.y <= self.rows
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.walls.contains(&pos)
    }

    pub fn walls(&self) -> &BTreeSet<Pos> {
        &self.walls
    }

    /// Wall editing for external debug tooling only; normal play never mutates walls.
    pub fn toggle_wall(&mut self, pos: Pos) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        if !self.walls.remove(&pos) {
            self.walls.insert(pos);
        }
        true
    }
}

/// Read-only view combining walls with the live unit rosters.
#[derive(Clone, Copy)]
pub struct GridView<'a> {
    pub board: &'a Board,
    pub units: &'a Units,
}

impl<'a> GridView<'a> {
    pub fn new(board: &'a Board, units: &'a Units) -> Self {
        Self { board, units }
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.board.is_wall(pos)
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.units.unit_at(pos).is_some()
    }

    pub fn unit_at(&self, pos: Pos) -> Option<&'a Unit> {
        self.units.unit_at(pos)
    }

    /// In bounds, not a wall, and free of living units other than `mover`.
    pub fn is_standable(&self, pos: Pos, mover: Option<UnitId>) -> bool {
        if !self.board.in_bounds(pos) || self.board.is_wall(pos) {
            return false;
        }
        match self.units.unit_at(pos) {
            Some(unit) => Some(unit.id) == mover,
            None => true,
        }
    }
}

pub fn neighbors(p: Pos) -> [Pos; 4] {
    [
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y, x: p.x - 1 },
    ]
}

pub fn manhattan(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// 8-directional distance used for every attack-range check.
pub fn chebyshev(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x).max(a.y.abs_diff(b.y))
}
