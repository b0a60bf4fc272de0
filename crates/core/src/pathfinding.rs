//! Deterministic movement primitives and shortest-path helpers.
//! This module exists so navigation rules are shared by player moves, highlights and enemy AI.
//! It does not own turn rules or decide where a unit wants to go.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::grid::{GridView, chebyshev, manhattan, neighbors};
use crate::types::{Pos, UnitId};

/// Open-set entry. `seq` breaks `f` ties in favour of the first node found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    seq: u64,
    y: i32,
    x: i32,
}

/// Cells a unit can end its move on, with step cost. The origin is not included.
pub type ReachableSet = BTreeMap<Pos, u32>;

/// A* over 4-neighbour moves with unit cost and a Manhattan heuristic.
///
/// Returns the cells after `start` up to and including `goal`, or an empty path when
/// `start == goal`, the goal is blocked, or no route exists. `max_cost` stops expansion
/// past that many steps when set; otherwise the caller trims the path.
pub fn find_path(view: &GridView<'_>, start: Pos, goal: Pos, max_cost: Option<u32>) -> Vec<Pos> {
    if start == goal {
        return Vec::new();
    }
    let mover = view.unit_at(start).map(|unit| unit.id);
    if !view.board.in_bounds(goal) || view.is_wall(goal) {
        return Vec::new();
    }
    if view.unit_at(goal).is_some_and(|unit| Some(unit.id) != mover) {
        return Vec::new();
    }

    let mut open_set = BTreeSet::new();
    let mut open_entries: BTreeMap<Pos, OpenNode> = BTreeMap::new();
    let mut came_from: BTreeMap<Pos, Pos> = BTreeMap::new();
    let mut g_score: BTreeMap<Pos, u32> = BTreeMap::new();
    let mut seq = 0_u64;

    let start_node = OpenNode { f: manhattan(start, goal), seq, y: start.y, x: start.x };
    open_set.insert(start_node);
    open_entries.insert(start, start_node);
    g_score.insert(start, 0);

    while let Some(current_node) = open_set.pop_first() {
        let current = Pos { y: current_node.y, x: current_node.x };
        open_entries.remove(&current);

        if current == goal {
            return reconstruct_path(&came_from, start, goal);
        }

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);
        if current_g == u32::MAX {
            continue;
        }
        if max_cost.is_some_and(|cap| current_g >= cap) {
            continue;
        }

        for neighbor in neighbors(current) {
            if !is_expandable(view, neighbor, goal, mover) {
                continue;
            }

            let tentative_g = current_g.saturating_add(1);
            let existing_g = g_score.get(&neighbor).copied().unwrap_or(u32::MAX);
            if tentative_g >= existing_g {
                continue;
            }

            if let Some(existing_node) = open_entries.remove(&neighbor) {
                open_set.remove(&existing_node);
            }

            came_from.insert(neighbor, current);
            g_score.insert(neighbor, tentative_g);

            seq += 1;
            let f = tentative_g.saturating_add(manhattan(neighbor, goal));
            let node = OpenNode { f, seq, y: neighbor.y, x: neighbor.x };
            open_set.insert(node);
            open_entries.insert(neighbor, node);
        }
    }

    Vec::new()
}

fn is_expandable(view: &GridView<'_>, pos: Pos, goal: Pos, mover: Option<UnitId>) -> bool {
    if !view.board.in_bounds(pos) || view.is_wall(pos) {
        return false;
    }
    pos == goal || view.is_standable(pos, mover)
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut path = vec![goal];
    let mut current = goal;

    while current != start {
        let Some(prev) = came_from.get(&current).copied() else {
            return Vec::new();
        };
        current = prev;
        path.push(current);
    }

    path.reverse();
    path.remove(0);
    path
}

/// Breadth-first flood from `origin`, capped at `move_range` steps, through cells that
/// are neither walls nor occupied by another living unit.
pub fn reachable_cells(view: &GridView<'_>, origin: Pos, move_range: u32) -> ReachableSet {
    let mover = view.unit_at(origin).map(|unit| unit.id);
    let mut costs = BTreeMap::new();
    let mut queue = VecDeque::new();
    costs.insert(origin, 0_u32);
    queue.push_back(origin);

    while let Some(current) = queue.pop_front() {
        let cost = costs[&current];
        if cost >= move_range {
            continue;
        }
        for neighbor in neighbors(current) {
            if costs.contains_key(&neighbor) || !view.is_standable(neighbor, mover) {
                continue;
            }
            costs.insert(neighbor, cost + 1);
            queue.push_back(neighbor);
        }
    }

    costs.remove(&origin);
    costs
}

/// Route an attacker toward `target` so it ends within `attack_range` (Chebyshev).
///
/// One breadth-first flood from `from`; the first free cell in range wins, so the route
/// is a shortest one and ties follow neighbour order. The returned path is the full
/// route; `trim_to_range` cuts it to what one turn allows.
pub fn approach_path(
    view: &GridView<'_>,
    from: Pos,
    target: Pos,
    attack_range: u32,
) -> Option<Vec<Pos>> {
    if chebyshev(from, target) <= attack_range {
        return Some(Vec::new());
    }
    let mover = view.unit_at(from).map(|unit| unit.id);
    let mut came_from: BTreeMap<Pos, Pos> = BTreeMap::new();
    let mut queue = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        if current != from && chebyshev(current, target) <= attack_range {
            return Some(reconstruct_path(&came_from, from, current));
        }
        for neighbor in neighbors(current) {
            if neighbor == from
                || neighbor == target
                || came_from.contains_key(&neighbor)
                || !view.is_standable(neighbor, mover)
            {
                continue;
            }
            came_from.insert(neighbor, current);
            queue.push_back(neighbor);
        }
    }

    None
}

/// Cut `path` to at most `move_range` steps, stopping at the first cell within range.
pub fn trim_to_range(path: &[Pos], move_range: u32, target: Pos, attack_range: u32) -> Vec<Pos> {
    let mut trimmed = Vec::new();
    for &step in path.iter().take(move_range as usize) {
        trimmed.push(step);
        if chebyshev(step, target) <= attack_range {
            break;
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Board;
    use crate::types::Team;
    use crate::unit::{UnitSpec, Units};

    fn single_unit(at: Pos, move_range: u32) -> Units {
        let mut units = Units::new();
        units.insert(UnitSpec::new("hero", Team::Player, at, 10).with_ranges(move_range, 1));
        units
    }

    #[test]
    fn straight_row_path_on_empty_grid() {
        let board = Board::new(10, 10, []);
        let units = single_unit(Pos::new(1, 1), 4);
        let view = GridView::new(&board, &units);
        let path = find_path(&view, Pos::new(1, 1), Pos::new(5, 1), None);
        assert_eq!(path, vec![Pos::new(2, 1), Pos::new(3, 1), Pos::new(4, 1), Pos::new(5, 1)]);
    }

    #[test]
    fn path_to_self_is_empty() {
        let board = Board::new(10, 10, []);
        let units = single_unit(Pos::new(1, 1), 4);
        let view = GridView::new(&board, &units);
        assert!(find_path(&view, Pos::new(1, 1), Pos::new(1, 1), None).is_empty());
    }

    #[test]
    fn walls_force_a_detour() {
        let board = Board::new(10, 10, [Pos::new(2, 1), Pos::new(2, 2)]);
        let units = single_unit(Pos::new(1, 1), 4);
        let view = GridView::new(&board, &units);
        let path = find_path(&view, Pos::new(1, 1), Pos::new(3, 1), None);
        assert!(path.len() > 2);
        assert_eq!(path.last(), Some(&Pos::new(3, 1)));
        assert!(path.iter().all(|cell| !board.is_wall(*cell)));
    }

    #[test]
    fn occupied_goal_is_never_reachable() {
        let board = Board::new(6, 6, []);
        let mut units = single_unit(Pos::new(1, 1), 4);
        units.insert(UnitSpec::new("slime", Team::Enemy, Pos::new(2, 1), 5));
        let view = GridView::new(&board, &units);
        assert!(find_path(&view, Pos::new(1, 1), Pos::new(2, 1), None).is_empty());
        assert!(!reachable_cells(&view, Pos::new(1, 1), 4).contains_key(&Pos::new(2, 1)));
    }

    #[test]
    fn occupied_cells_are_routed_around() {
        let board = Board::new(6, 3, []);
        let mut units = single_unit(Pos::new(1, 2), 6);
        units.insert(UnitSpec::new("ally", Team::Player, Pos::new(2, 2), 5));
        let view = GridView::new(&board, &units);
        let path = find_path(&view, Pos::new(1, 2), Pos::new(3, 2), None);
        assert_eq!(path.len(), 4);
        assert!(!path.contains(&Pos::new(2, 2)));
    }

    #[test]
    fn tie_break_prefers_first_found_neighbor() {
        let board = Board::new(7, 7, [Pos::new(3, 3)]);
        let units = single_unit(Pos::new(2, 3), 4);
        let view = GridView::new(&board, &units);
        let path = find_path(&view, Pos::new(2, 3), Pos::new(4, 3), None);
        assert_eq!(path.first(), Some(&Pos::new(2, 2)), "up is expanded before down");
    }

    #[test]
    fn max_cost_caps_expansion() {
        let board = Board::new(10, 1, []);
        let units = single_unit(Pos::new(1, 1), 3);
        let view = GridView::new(&board, &units);
        assert!(find_path(&view, Pos::new(1, 1), Pos::new(6, 1), Some(3)).is_empty());
        assert_eq!(find_path(&view, Pos::new(1, 1), Pos::new(4, 1), Some(3)).len(), 3);
    }

    #[test]
    fn reachable_set_respects_range_and_walls() {
        let board = Board::new(10, 10, [Pos::new(2, 1)]);
        let units = single_unit(Pos::new(1, 1), 2);
        let view = GridView::new(&board, &units);
        let reach = reachable_cells(&view, Pos::new(1, 1), 2);
        assert_eq!(reach.get(&Pos::new(1, 2)), Some(&1));
        assert_eq!(reach.get(&Pos::new(2, 2)), Some(&2));
        assert_eq!(reach.get(&Pos::new(1, 3)), Some(&2));
        assert!(!reach.contains_key(&Pos::new(2, 1)));
        assert!(!reach.contains_key(&Pos::new(1, 1)));
        assert!(reach.values().all(|cost| *cost <= 2));
        assert_eq!(reach.len(), 3);
    }

    #[test]
    fn approach_stops_once_in_range() {
        let board = Board::new(12, 1, []);
        let mut units = Units::new();
        units.insert(UnitSpec::new("hero", Team::Player, Pos::new(1, 1), 10));
        units.insert(UnitSpec::new("orc", Team::Enemy, Pos::new(11, 1), 10).with_ranges(3, 1));
        let view = GridView::new(&board, &units);
        let full = approach_path(&view, Pos::new(11, 1), Pos::new(1, 1), 1).expect("route");
        assert_eq!(full.last(), Some(&Pos::new(2, 1)));
        let step = trim_to_range(&full, 3, Pos::new(1, 1), 1);
        assert_eq!(step, vec![Pos::new(10, 1), Pos::new(9, 1), Pos::new(8, 1)]);
        let near = [Pos::new(3, 1), Pos::new(2, 1), Pos::new(1, 1)];
        assert_eq!(trim_to_range(&near, 3, Pos::new(1, 1), 1), vec![Pos::new(3, 1), Pos::new(2, 1)]);
    }

    #[test]
    fn approach_without_free_cells_is_none() {
        let walls = [Pos::new(1, 2), Pos::new(2, 2), Pos::new(2, 1)];
        let board = Board::new(5, 5, walls);
        let mut units = Units::new();
        units.insert(UnitSpec::new("hero", Team::Player, Pos::new(1, 1), 10));
        units.insert(UnitSpec::new("orc", Team::Enemy, Pos::new(5, 5), 10));
        let view = GridView::new(&board, &units);
        assert!(approach_path(&view, Pos::new(5, 5), Pos::new(1, 1), 1).is_none());
    }

    #[test]
    fn approach_takes_the_shortest_route_around_walls() {
        let walls = [Pos::new(3, 1), Pos::new(3, 2), Pos::new(3, 3)];
        let board = Board::new(6, 5, walls);
        let mut units = Units::new();
        units.insert(UnitSpec::new("hero", Team::Player, Pos::new(1, 1), 10));
        units.insert(UnitSpec::new("orc", Team::Enemy, Pos::new(5, 1), 10));
        let view = GridView::new(&board, &units);
        let path = approach_path(&view, Pos::new(5, 1), Pos::new(1, 1), 1).expect("route");
        assert_eq!(path.last(), Some(&Pos::new(2, 2)));
        assert_eq!(path.len(), 8);
        assert!(path.iter().all(|cell| view.is_standable(*cell, None)));
    }
}
