//! Drawing for the map, units, effects and overlays.

use app::app_loop::AppState;
use app::phase_label;
use macroquad::prelude::*;
use tactics_core::effects::NumberKind;
use tactics_core::{
    ActiveEffect, Camera, Effect, Facing, Game, Intent, NoticeKind, Pos, Pose, Team, Unit,
};

const GRID_COLOR: Color = Color { r: 0.18, g: 0.2, b: 0.22, a: 1.0 };
const FLOOR_COLOR: Color = Color { r: 0.11, g: 0.12, b: 0.13, a: 1.0 };
const WALL_COLOR: Color = Color { r: 0.35, g: 0.32, b: 0.28, a: 1.0 };
const REACH_COLOR: Color = Color { r: 0.25, g: 0.55, b: 0.95, a: 0.28 };
const ALLY_ZONE_COLOR: Color = Color { r: 0.3, g: 0.85, b: 0.45, a: 0.3 };
const ENEMY_ZONE_COLOR: Color = Color { r: 0.95, g: 0.3, b: 0.25, a: 0.35 };
const PLAYER_COLOR: Color = Color { r: 0.35, g: 0.6, b: 1.0, a: 1.0 };
const ENEMY_COLOR: Color = Color { r: 0.9, g: 0.3, b: 0.3, a: 1.0 };
const HEADER_HEIGHT: f32 = 32.0;

/// Per-frame screen offset from the camera shake.
fn shake_offset(camera: &Camera, frame: u64) -> (f32, f32) {
    let amount = camera.shake();
    if amount <= 0.0 {
        return (0.0, 0.0);
    }
    let t = frame as f32;
    (amount * (t * 1.7).sin(), amount * (t * 2.3).cos())
}

struct View<'a> {
    camera: &'a Camera,
    offset: (f32, f32),
}

impl View<'_> {
    fn cell_origin(&self, x: f32, y: f32) -> (f32, f32) {
        let (sx, sy) = self.camera.world_to_screen(x, y);
        (sx + self.offset.0, sy + self.offset.1)
    }

    fn cell_center(&self, x: f32, y: f32) -> (f32, f32) {
        let (sx, sy) = self.cell_origin(x, y);
        let half = self.camera.cell_px() / 2.0;
        (sx + half, sy + half)
    }

    fn fill_cell(&self, x: i32, y: i32, color: Color) {
        let (sx, sy) = self.cell_origin(x as f32, y as f32);
        let size = self.camera.cell_px();
        draw_rectangle(sx, sy, size, size, color);
    }
}

pub fn draw_frame(game: &Game, app: &AppState, effects: &[ActiveEffect], frame: u64) {
    clear_background(BLACK);
    let view = View { camera: game.camera(), offset: shake_offset(game.camera(), frame) };

    draw_board(game, &view);
    draw_highlights(game, &view, frame);
    let mut units: Vec<&Unit> = game.units().all().collect();
    units.sort_by(|a, b| a.render.y.total_cmp(&b.render.y));
    for unit in units {
        draw_unit(game, unit, &view);
    }
    for effect in effects {
        draw_effect(effect, &view);
    }

    draw_header(game);
    draw_banner(game);
    draw_toasts(app);
    if app.show_debug {
        draw_debug(app);
    }
}

fn draw_board(game: &Game, view: &View<'_>) {
    let board = game.board();
    let size = view.camera.cell_px();
    for y in 1..=board.rows() {
        for x in 1..=board.cols() {
            let color = if board.is_wall(Pos::new(x, y)) { WALL_COLOR } else { FLOOR_COLOR };
            view.fill_cell(x, y, color);
            let (sx, sy) = view.cell_origin(x as f32, y as f32);
            draw_rectangle_lines(sx, sy, size, size, 1.0, GRID_COLOR);
        }
    }
}

fn draw_highlights(game: &Game, view: &View<'_>, frame: u64) {
    let pulse = 0.75 + 0.25 * ((frame as f32) * 0.12).sin();
    if let Some(reachable) = game.reachable() {
        let color = Color { a: REACH_COLOR.a * pulse, ..REACH_COLOR };
        for cell in reachable.keys() {
            view.fill_cell(cell.x, cell.y, color);
        }
    }
    if let Some(engagement) = game.engagement() {
        for (ids, color) in
            [(&engagement.allies, ALLY_ZONE_COLOR), (&engagement.enemies, ENEMY_ZONE_COLOR)]
        {
            for unit in ids.iter().filter_map(|id| game.unit(*id)) {
                view.fill_cell(unit.pos.x, unit.pos.y, Color { a: color.a * pulse, ..color });
            }
        }
    }
    if let Some(unit) = game.state().selection.unit().and_then(|id| game.unit(id)) {
        let (sx, sy) = view.cell_origin(unit.pos.x as f32, unit.pos.y as f32);
        let size = view.camera.cell_px();
        draw_rectangle_lines(sx, sy, size, size, 3.0, YELLOW);
    }
}

fn draw_unit(game: &Game, unit: &Unit, view: &View<'_>) {
    let size = view.camera.cell_px();
    let (cx, cy) = view.cell_center(unit.render.x, unit.render.y);
    let cy = cy - unit.render.lift * size;
    let mut color = match unit.team {
        Team::Player => PLAYER_COLOR,
        Team::Enemy => ENEMY_COLOR,
    };
    if unit.pending_death {
        color.a = 0.35;
    } else if game.state().acted_this_turn.contains(&unit.id) {
        color = Color { r: color.r * 0.55, g: color.g * 0.55, b: color.b * 0.55, a: 1.0 };
    }

    let radius = size * if unit.pose == Pose::Attack { 0.4 } else { 0.34 };
    draw_circle(cx, cy, radius, color);
    let eye_dx = match unit.facing {
        Facing::Left => -radius * 0.45,
        Facing::Right => radius * 0.45,
    };
    draw_circle(cx + eye_dx, cy - radius * 0.2, radius * 0.14, WHITE);

    if unit.max_hp > 0 && !unit.pending_death {
        let ratio = (unit.hp as f32 / unit.max_hp as f32).clamp(0.0, 1.0);
        let (bx, by) = (cx - size * 0.4, cy + radius + 3.0);
        draw_rectangle(bx, by, size * 0.8, 4.0, DARKGRAY);
        draw_rectangle(bx, by, size * 0.8 * ratio, 4.0, GREEN);
    }

    if let Some(intent) = unit.intent {
        let glyph = match intent {
            Intent::Move => ">",
            Intent::Attack => "!",
            Intent::Wait => "z",
        };
        draw_text(glyph, cx + radius * 0.6, cy - radius * 0.8, size * 0.45, ORANGE);
    }
}

fn draw_effect(active: &ActiveEffect, view: &View<'_>) {
    let size = view.camera.cell_px();
    let at = active.effect.at();
    let (cx, cy) = view.cell_center(at.x as f32, at.y as f32);
    let t = active.progress();
    let fade = 1.0 - t;
    match active.effect {
        Effect::Slash { .. } => {
            let reach = size * 0.45;
            draw_line(cx - reach, cy - reach * (1.0 - t), cx + reach, cy + reach * t, 3.0, Color {
                a: fade,
                ..WHITE
            });
        }
        Effect::Impact { .. } => {
            draw_circle_lines(cx, cy, size * (0.2 + 0.4 * t), 3.0, Color { a: fade, ..ORANGE });
        }
        Effect::Heal { .. } => {
            draw_circle(cx, cy - size * 0.3 * t, size * 0.15, Color { a: fade, ..GREEN });
        }
        Effect::Death { .. } => {
            draw_circle(cx, cy, size * 0.45 * (1.0 - t * 0.5), Color { a: fade * 0.6, ..GRAY });
        }
        Effect::FloatingNumber { value, kind, .. } => {
            let (text, color) = match kind {
                NumberKind::Damage => (format!("-{value}"), RED),
                NumberKind::Heal => (format!("+{value}"), GREEN),
            };
            let rise = size * 0.8 * t;
            draw_text(&text, cx - size * 0.2, cy - size * 0.4 - rise, size * 0.5, Color {
                a: fade,
                ..color
            });
        }
    }
}

fn draw_header(game: &Game) {
    draw_rectangle(0.0, 0.0, screen_width(), HEADER_HEIGHT, Color { a: 0.8, ..BLACK });
    let state = game.state();
    let label = phase_label(state.turn, state.phase, state.outcome);
    draw_text(&label, 12.0, 22.0, 22.0, WHITE);
    draw_text(
        "[A]ttack  [W]ait  [Enter] confirm  [Esc] cancel  [E]nd turn  [C]enter",
        280.0,
        22.0,
        18.0,
        LIGHTGRAY,
    );
}

fn draw_banner(game: &Game) {
    let Some(banner) = game.banner() else {
        return;
    };
    let alpha = (banner.remaining / 0.3).clamp(0.0, 1.0);
    let height = 64.0;
    let y = screen_height() / 2.0 - height / 2.0;
    draw_rectangle(0.0, y, screen_width(), height, Color { a: 0.6 * alpha, ..BLACK });
    let dims = measure_text(&banner.text, None, 40, 1.0);
    draw_text(
        &banner.text,
        (screen_width() - dims.width) / 2.0,
        y + height / 2.0 + dims.height / 2.0,
        40.0,
        Color { a: alpha, ..WHITE },
    );
}

fn draw_toasts(app: &AppState) {
    let mut y = screen_height() - 16.0;
    for toast in app.toasts.iter().rev() {
        let color = match toast.kind {
            NoticeKind::Warning => ORANGE,
            NoticeKind::Info | NoticeKind::Banner => WHITE,
        };
        let alpha = toast.remaining_secs().clamp(0.0, 0.5) * 2.0;
        draw_text(&toast.text, 16.0, y, 20.0, Color { a: alpha, ..color });
        y -= 24.0;
    }
}

fn draw_debug(app: &AppState) {
    let text = match app.hovered {
        Some(cell) => format!("cell ({}, {})", cell.x, cell.y),
        None => "cell -".to_string(),
    };
    draw_text(&text, screen_width() - 160.0, 22.0, 20.0, YELLOW);
}
