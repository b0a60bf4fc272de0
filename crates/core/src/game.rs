//! The tactical map controller.
//!
//! `Game` owns the board, both rosters, the turn state and every in-flight sequence
//! (moves, the enemy loop, a running battle). All mutation goes through its command
//! methods and `update`, so state is consistent between any two ticks.

use std::collections::BTreeSet;
use std::mem;

use tracing::{debug, info};

use crate::animation::Animator;
use crate::camera::Camera;
use crate::combat::{AutoResolver, BattleResolver};
use crate::config::EngineConfig;
use crate::content::{CombatData, ContentPack};
use crate::effects::Effect;
use crate::engagement::Engagement;
use crate::grid::{Board, GridView};
use crate::map_config::{MapConfigError, validate_layout};
use crate::pathfinding::{ReachableSet, reachable_cells};
use crate::session::{SessionSnapshot, SyncRequest};
use crate::types::*;
use crate::unit::{Unit, UnitSpec, Units};

mod battle;
mod enemy_ai;
mod hash;
mod input;
mod movement;
mod turns;
mod update;

#[cfg(test)]
mod test_support;

use battle::ActiveBattle;
use enemy_ai::EnemyTurn;
use movement::MoveJob;

pub use update::UpdateReport;

/// Where the player is in the select → move → act flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    /// Unit picked, move highlights shown.
    Unit { unit: UnitId, reachable: ReachableSet },
    /// Unit moved (or chose not to); Attack / Wait offered.
    ActionMenu { unit: UnitId },
    /// Engagement preview awaiting confirm or cancel.
    Targeting { engagement: Engagement },
}

impl Selection {
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Self::None => None,
            Self::Unit { unit, .. } | Self::ActionMenu { unit } => Some(*unit),
            Self::Targeting { engagement } => Some(engagement.initiator),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    /// Starts at 1 and increments at each player-turn start.
    pub turn: u32,
    pub phase: Phase,
    pub selection: Selection,
    pub acted_this_turn: BTreeSet<UnitId>,
    /// Blocks new input while a unit-initiated sequence is in flight.
    pub is_animating: bool,
    pub free_explore: bool,
    pub outcome: Option<Outcome>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            turn: 1,
            phase: Phase::Player,
            selection: Selection::None,
            acted_this_turn: BTreeSet::new(),
            is_animating: false,
            free_explore: false,
            outcome: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub text: String,
    pub remaining: f32,
}

pub struct Game {
    session_id: String,
    config: EngineConfig,
    board: Board,
    units: Units,
    state: GameState,
    camera: Camera,
    animator: Animator,
    moves: Vec<MoveJob>,
    enemy_turn: Option<EnemyTurn>,
    battle: Option<ActiveBattle>,
    banner: Option<Banner>,
    /// Units at zero HP waiting out their death animation.
    dying: Vec<(UnitId, f32)>,
    /// Units holding the attack pose.
    posing: Vec<(UnitId, f32)>,
    data: Box<dyn CombatData>,
    resolver: Box<dyn BattleResolver>,
    effects: Vec<Effect>,
    notifications: Vec<Notification>,
    outbox: Vec<SyncRequest>,
    log: Vec<LogEvent>,
    needs_redraw: bool,
}

impl Game {
    /// Build a session from a snapshot with the built-in content and the standalone resolver.
    pub fn new(snapshot: SessionSnapshot, config: EngineConfig) -> Result<Self, MapConfigError> {
        validate_layout(snapshot.cols, snapshot.rows, &snapshot.walls, &snapshot.units)?;

        let mut units = Units::new();
        for spec in snapshot.units.into_iter().filter(|spec| spec.hp > 0) {
            units.insert(spec);
        }
        // A unit counts as acted if either the acted list or its own flag says so.
        let mut acted_this_turn: BTreeSet<UnitId> = snapshot
            .acted
            .iter()
            .filter_map(|key| units.by_key(key).map(|unit| unit.id))
            .collect();
        acted_this_turn.extend(units.all().filter(|unit| unit.has_acted).map(|unit| unit.id));
        for id in &acted_this_turn {
            if let Some(unit) = units.get_mut(*id) {
                unit.has_acted = true;
            }
        }

        // Free-explore is derived from the rosters; `check_outcome` enters it below.
        let phase = match snapshot.phase {
            Phase::FreeExplore => Phase::Player,
            phase => phase,
        };

        let resolver = AutoResolver::new(config.auto_resolver_rounds);
        let mut game = Self {
            session_id: snapshot.session_id,
            camera: Camera::new(config.tile_px),
            board: Board::new(snapshot.cols, snapshot.rows, snapshot.walls),
            units,
            state: GameState {
                turn: snapshot.turn.max(1),
                phase,
                acted_this_turn,
                ..GameState::default()
            },
            config,
            animator: Animator::default(),
            moves: Vec::new(),
            enemy_turn: None,
            battle: None,
            banner: None,
            dying: Vec::new(),
            posing: Vec::new(),
            data: Box::new(ContentPack::build_default()),
            resolver: Box::new(resolver),
            effects: Vec::new(),
            notifications: Vec::new(),
            outbox: Vec::new(),
            log: Vec::new(),
            needs_redraw: true,
        };
        info!(
            session = %game.session_id,
            players = game.units.roster(Team::Player).len(),
            enemies = game.units.roster(Team::Enemy).len(),
            turn = game.state.turn,
            "session loaded"
        );

        game.check_outcome();
        if game.state.phase == Phase::Enemy && game.state.outcome.is_none() {
            game.resume_enemy_phase();
        }
        Ok(game)
    }

    /// Swap the combat collaborators. Meant to be called right after construction.
    pub fn with_combat(
        mut self,
        data: impl CombatData + 'static,
        resolver: impl BattleResolver + 'static,
    ) -> Self {
        self.data = Box::new(data);
        self.resolver = Box::new(resolver);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.needs_redraw = true;
        &mut self.camera
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_animating
    }

    pub fn is_battle_running(&self) -> bool {
        self.battle.is_some()
    }

    /// True while any tween, death animation or pose timer is running.
    pub fn has_animation_in_flight(&self) -> bool {
        !self.animator.is_idle() || !self.dying.is_empty() || !self.posing.is_empty()
    }

    pub fn reachable(&self) -> Option<&ReachableSet> {
        match &self.state.selection {
            Selection::Unit { reachable, .. } => Some(reachable),
            _ => None,
        }
    }

    pub fn engagement(&self) -> Option<&Engagement> {
        match &self.state.selection {
            Selection::Targeting { engagement } => Some(engagement),
            _ => None,
        }
    }

    /// A unit can act when it is alive and not yet in the acted set.
    pub fn can_act(&self, id: UnitId) -> bool {
        self.units.get(id).is_some_and(|unit| unit.is_alive() && !unit.pending_death)
            && !self.state.acted_this_turn.contains(&id)
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        mem::take(&mut self.effects)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.notifications)
    }

    pub fn drain_sync_requests(&mut self) -> Vec<SyncRequest> {
        mem::take(&mut self.outbox)
    }

    /// Returns and clears the redraw request flag.
    pub fn take_redraw(&mut self) -> bool {
        mem::replace(&mut self.needs_redraw, false)
    }

    // Debug getters for external tooling.

    pub fn unit_at(&self, pos: Pos) -> Option<&Unit> {
        self.units.unit_at(pos)
    }

    pub fn walls(&self) -> &BTreeSet<Pos> {
        self.board.walls()
    }

    pub fn trigger_render(&mut self) {
        self.needs_redraw = true;
    }

    /// Debug wall edit. Refused on occupied cells so occupancy stays valid.
    pub fn debug_toggle_wall(&mut self, pos: Pos) -> bool {
        if !self.board.in_bounds(pos) || self.units.unit_at(pos).is_some() {
            return false;
        }
        let toggled = self.board.toggle_wall(pos);
        self.needs_redraw = true;
        toggled
    }

    /// Ease the camera onto a unit.
    pub fn focus_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get(id) {
            let ease = self.config.camera_manual_ease;
            self.camera.center_on(unit.pos.x as f32, unit.pos.y as f32, ease);
            self.needs_redraw = true;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            cols: self.board.cols(),
            rows: self.board.rows(),
            walls: self.board.walls().iter().copied().collect(),
            units: self
                .units
                .all()
                .filter(|unit| unit.is_alive())
                .map(UnitSpec::from)
                .collect(),
            turn: self.state.turn,
            phase: self.state.phase,
            acted: self
                .state
                .acted_this_turn
                .iter()
                .filter_map(|id| self.units.get(*id).map(|unit| unit.key.clone()))
                .collect(),
        }
    }

    fn view(&self) -> GridView<'_> {
        GridView::new(&self.board, &self.units)
    }

    fn reachable_for(&self, id: UnitId) -> ReachableSet {
        let Some(unit) = self.units.get(id) else {
            return ReachableSet::new();
        };
        if unit.has_moved && !self.state.free_explore {
            return ReachableSet::new();
        }
        reachable_cells(&self.view(), unit.pos, unit.move_range)
    }

    fn push_state_sync(&mut self) {
        self.outbox.push(SyncRequest::State(self.snapshot()));
    }

    fn notify(&mut self, notification: Notification) {
        debug!(text = %notification.text, "notification");
        self.notifications.push(notification);
    }

    fn mark_acted(&mut self, id: UnitId) {
        self.state.acted_this_turn.insert(id);
        if let Some(unit) = self.units.get_mut(id) {
            unit.has_acted = true;
        }
    }
}
