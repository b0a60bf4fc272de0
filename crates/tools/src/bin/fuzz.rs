use std::collections::BTreeSet;

use anyhow::Result;
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tactics_core::content::keys;
use tactics_core::grid::manhattan;
use tactics_core::{EngineConfig, Game, Outcome, Phase, Pos, SessionSnapshot, Team, UnitSpec};
use tactics_tools::autoplay::Autoplay;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 50)]
    runs: u32,
    #[arg(long, default_value_t = 12)]
    max_turns: u32,
}

const PLAYER_KEYS: [&str; 3] = [keys::ENTITY_KNIGHT, keys::ENTITY_ARCHER, keys::ENTITY_CLERIC];
const ENEMY_KEYS: [&str; 3] = [keys::ENTITY_GOBLIN, keys::ENTITY_ORC, keys::ENTITY_SHAMAN];

fn below(rng: &mut ChaCha8Rng, n: u64) -> u64 {
    rng.next_u64() % n
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = below(rng, slice.len() as u64) as usize;
    slice[p].clone()
}

fn random_snapshot(rng: &mut ChaCha8Rng, run: u32) -> SessionSnapshot {
    let cols = 6 + below(rng, 7) as i32;
    let rows = 6 + below(rng, 7) as i32;
    let mut free: Vec<Pos> =
        (1..=rows).flat_map(|y| (1..=cols).map(move |x| Pos::new(x, y))).collect();

    let mut walls = Vec::new();
    let wall_count = below(rng, (cols * rows / 6) as u64) as usize;
    for _ in 0..wall_count {
        let index = below(rng, free.len() as u64) as usize;
        walls.push(free.swap_remove(index));
    }

    let mut units = Vec::new();
    let players = 1 + below(rng, 3) as usize;
    let enemies = 1 + below(rng, 4) as usize;
    for (team, count, pool) in
        [(Team::Player, players, &PLAYER_KEYS), (Team::Enemy, enemies, &ENEMY_KEYS)]
    {
        for i in 0..count {
            let index = below(rng, free.len() as u64) as usize;
            let pos = free.swap_remove(index);
            let key = format!("{}_{i}", if team == Team::Player { "hero" } else { "foe" });
            let hp = 8 + below(rng, 20) as i32;
            let move_range = 1 + below(rng, 5) as u32;
            let attack_range = 1 + below(rng, 3) as u32;
            units.push(
                UnitSpec::new(&key, team, pos, hp)
                    .with_ranges(move_range, attack_range)
                    .with_combat_key(choose(rng, pool.as_slice())),
            );
        }
    }

    SessionSnapshot {
        session_id: format!("fuzz-{run}"),
        cols,
        rows,
        walls,
        units,
        turn: 1,
        phase: Phase::Player,
        acted: Vec::new(),
    }
}

/// Board and turn invariants that must hold after every engine tick.
struct InvariantCheck {
    last_turn: u32,
}

impl InvariantCheck {
    fn check(&mut self, game: &Game) {
        let board = game.board();
        let mut occupied = BTreeSet::new();
        for unit in game.units().all() {
            assert!(board.in_bounds(unit.pos), "{} left the board at {:?}", unit.key, unit.pos);
            assert!(unit.hp <= unit.max_hp, "{} has more hp than max", unit.key);
            if unit.is_alive() {
                assert!(!board.is_wall(unit.pos), "{} stands in a wall", unit.key);
                assert!(occupied.insert(unit.pos), "two living units share {:?}", unit.pos);
            }
        }

        for id in &game.state().acted_this_turn {
            assert!(game.unit(*id).is_some(), "acted set holds a removed unit");
        }

        if let Some(reachable) = game.reachable() {
            let origin = game.state().selection.unit().and_then(|id| game.unit(id));
            if let Some(origin) = origin {
                for (cell, cost) in reachable {
                    assert!(*cost <= origin.move_range, "reachable cell beyond move range");
                    assert!(*cost >= manhattan(origin.pos, *cell), "cost below grid distance");
                    assert!(!board.is_wall(*cell), "reachable wall cell");
                    assert!(game.unit_at(*cell).is_none(), "reachable occupied cell");
                }
            }
        }

        let turn = game.state().turn;
        assert!(
            turn == self.last_turn || turn == self.last_turn + 1,
            "turn jumped from {} to {turn}",
            self.last_turn
        );
        self.last_turn = turn;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for {} runs...", args.seed, args.runs);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let (mut victories, mut defeats, mut unfinished, mut rejected) = (0, 0, 0, 0);

    for run in 0..args.runs {
        let snapshot = random_snapshot(&mut rng, run);
        let mut game = match Game::new(snapshot, EngineConfig::default()) {
            Ok(game) => game,
            Err(err) => {
                rejected += 1;
                println!("run {run}: layout rejected ({err})");
                continue;
            }
        };

        let mut invariants = InvariantCheck { last_turn: game.state().turn };
        let mut autoplay = Autoplay::with_observer(|game: &Game| invariants.check(game));
        match autoplay.play(&mut game, args.max_turns) {
            Some(Outcome::Victory) => victories += 1,
            Some(Outcome::Defeat) => defeats += 1,
            None => unfinished += 1,
        }
    }

    println!(
        "Fuzzing completed: {victories} victories, {defeats} defeats, {unfinished} unfinished, \
         {rejected} rejected layouts."
    );
    Ok(())
}
