use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::*;

use roguedepths::{
    FrameView, GameMode,
    data::Rgb,
    hooks::{GlyphView, PlayerView},
    map::TileKind,
    text::MessageCategory,
};

fn rgb((r, g, b): Rgb) -> RGB {
    RGB::from_u8(r, g, b)
}

fn tile_color(kind: TileKind) -> RGB {
    match kind {
        TileKind::Wall => RGB::from_u8(130, 130, 150),
        TileKind::Floor => RGB::from_u8(70, 70, 80),
        TileKind::Stairs => RGB::named(YELLOW),
    }
}

pub fn draw_status(ctx: &mut BTerm, frame: &FrameView) {
    let (width, _) = ctx.get_char_size();
    ctx.draw_box(0, 0, width - 1, 4, RGB::named(GRAY), RGB::named(BLACK));
    let player = &frame.player;
    ctx.print_color(
        2,
        1,
        RGB::named(WHITE),
        RGB::named(BLACK),
        format!(
            "Floor {}  Turn {}  Lv {}  XP {}/{}  Gold {}",
            frame.floor,
            frame.turn,
            player.level,
            player.experience,
            player.experience_to_next,
            player.gold
        ),
    );
    ctx.print_color(2, 2, hp_color(player), RGB::named(BLACK), vitals(player));
    let statuses: Vec<String> = player
        .statuses
        .iter()
        .map(|(kind, turns)| format!("{}({turns})", kind.name()))
        .collect();
    ctx.print_color(
        2,
        3,
        RGB::named(LIGHT_BLUE),
        RGB::named(BLACK),
        format!("{}  {}", mode_label(frame.mode), statuses.join(" ")),
    );
}

fn vitals(player: &PlayerView) -> String {
    format!(
        "HP {}/{}  MP {}/{}  ATK {}  DEF {}  DEX {}",
        player.hp,
        player.max_hp,
        player.mp,
        player.max_mp,
        player.attack,
        player.defense,
        player.dexterity
    )
}

fn hp_color(player: &PlayerView) -> RGB {
    let ratio = player.hp as f32 / player.max_hp.max(1) as f32;
    if ratio <= 0.3 {
        RGB::named(ORANGE)
    } else if ratio <= 0.6 {
        RGB::from_u8(255, 120, 120)
    } else {
        RGB::named(LIGHT_GREEN)
    }
}

fn mode_label(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Playing => "",
        GameMode::Targeting { .. } => "[aim: direction, esc cancels]",
        GameMode::Inventory => "[inventory: 1-9 equip]",
        GameMode::ItemSelection => "[use: 1-9]",
        GameMode::MagicSelection => "[cast: 1-9]",
        GameMode::Shop { .. } => "[shop: 1-9 buy, esc leaves]",
        GameMode::Dead => "[dead]",
    }
}

pub fn draw_log(ctx: &mut BTerm, log: &[(MessageCategory, String)], start_y: i32, rows: usize) {
    let (width, _) = ctx.get_char_size();
    let top = (start_y - 1).max(0);
    ctx.draw_box(
        0,
        top,
        width - 1,
        rows as i32 + 1,
        RGB::named(DARK_GRAY),
        RGB::named(BLACK),
    );
    let newest = log.iter().rev().take(rows).collect::<Vec<_>>();
    for (row, (category, text)) in newest.into_iter().rev().enumerate() {
        let fg = match category {
            MessageCategory::Combat => RGB::from_u8(255, 140, 140),
            MessageCategory::Item => RGB::named(LIGHT_CYAN),
            MessageCategory::System => RGB::named(WHITE),
        };
        ctx.print_color(2, top + 1 + row as i32, fg, RGB::named(BLACK), text);
    }
}

pub fn draw_map(ctx: &mut BTerm, frame: &FrameView, map_origin: Point, reserved_rows: i32) {
    let (screen_w, screen_h) = ctx.get_char_size();
    let max_draw_y = screen_h as i32 - reserved_rows;
    let max_draw_x = screen_w as i32 - 2;

    for y in 0..frame.height {
        let screen_y = map_origin.y + y;
        if screen_y >= max_draw_y {
            break;
        }
        for x in 0..frame.width {
            let screen_x = map_origin.x + x;
            if screen_x >= max_draw_x {
                break;
            }
            let Some(tile) = frame.tile(Point::new(x, y)) else {
                continue;
            };
            let glyph = to_cp437(tile.kind.glyph());
            if tile.visible {
                ctx.set(screen_x, screen_y, tile_color(tile.kind), RGB::named(BLACK), glyph);
            } else if tile.revealed {
                ctx.set(screen_x, screen_y, RGB::from_u8(45, 45, 55), RGB::named(BLACK), glyph);
            }
        }
    }

    let layers = [&frame.traps, &frame.items, &frame.monsters, &frame.projectiles];
    for view in layers.into_iter().flatten() {
        draw_glyph(ctx, view, map_origin, max_draw_x, max_draw_y);
    }
    let player = GlyphView {
        point: frame.player.point,
        glyph: frame.player.glyph,
        color: frame.player.color,
    };
    draw_glyph(ctx, &player, map_origin, max_draw_x, max_draw_y);
}

fn draw_glyph(ctx: &mut BTerm, view: &GlyphView, origin: Point, max_x: i32, max_y: i32) {
    let screen_x = origin.x + view.point.x;
    let screen_y = origin.y + view.point.y;
    if screen_x >= max_x || screen_y >= max_y {
        return;
    }
    ctx.set(
        screen_x,
        screen_y,
        rgb(view.color),
        RGB::named(BLACK),
        to_cp437(view.glyph),
    );
}
