use macroquad::prelude::*;

use crate::assets::{Assets, TextureKey};
use crate::config::GameRules;
use crate::engine::SpriteKind;
use crate::run::{Game, SceneId};
use crate::tilemap::GroundLayer;
use crate::world::World;

const TITLE: &str = "Key Maze";

/// Screen rectangle of the menu's start button.
pub fn start_button_rect(screen: Vec2) -> Rect {
    Rect::new(screen.x / 2.0 - 100.0, screen.y * 2.0 / 3.0 - 30.0, 200.0, 60.0)
}

pub fn draw(game: &Game, world: &World, assets: &Assets, ground: Option<&GroundLayer>, rules: &GameRules) {
    let screen = world.size();
    clear_background(BLACK);
    draw_textured(
        assets.get(TextureKey::background(game.scene())),
        Rect::new(0.0, 0.0, screen.x, screen.y),
        DARKGRAY,
    );

    match game.scene() {
        SceneId::Menu => draw_menu(assets, screen),
        SceneId::Level1 | SceneId::Level2 => {
            if let Some(ground) = ground {
                draw_ground(assets, ground);
            }
            draw_sprites(assets, world);
            if rules.debug_overlay {
                debug_draw(world);
            }
            draw_hud(game, screen);
        }
        SceneId::GameOver => draw_end_screen("Game Over", RED, game.score(), screen),
        SceneId::Win => draw_end_screen("You Win!", GREEN, game.score(), screen),
    }

    if rules.show_fps {
        let fps_text = format!("FPS: {}", get_fps());
        draw_text(&fps_text, screen.x - 120.0, 24.0, 20.0, GREEN);
    }
}

fn draw_menu(assets: &Assets, screen: Vec2) {
    draw_text(TITLE, screen.x / 2.0 - 110.0, 130.0, 48.0, WHITE);

    let button = start_button_rect(screen);
    draw_textured(assets.get(TextureKey::StartButton), button, DARKGREEN);
    draw_text("Start", button.x + 62.0, button.y + 40.0, 32.0, WHITE);
    draw_text(
        "Click Start or press Enter. Arrow keys move.",
        screen.x / 2.0 - 230.0,
        screen.y - 40.0,
        22.0,
        LIGHTGRAY,
    );
}

fn draw_ground(assets: &Assets, ground: &GroundLayer) {
    let tiles = assets.get(TextureKey::Tiles);
    for (rect, value) in ground.painted() {
        let fallback = if value == 1 { GRAY } else { DARKBROWN };
        draw_textured(tiles, rect, fallback);
    }
}

fn draw_sprites(assets: &Assets, world: &World) {
    for (_, body) in world.bodies() {
        let fallback = match body.kind {
            SpriteKind::Player => BLUE,
            SpriteKind::Key => GOLD,
            SpriteKind::Door => BROWN,
            SpriteKind::Enemy => RED,
        };
        draw_textured(assets.get(TextureKey::for_sprite(body.kind)), body.rect(), fallback);
    }
}

fn draw_hud(game: &Game, screen: Vec2) {
    draw_text(&format!("Score: {}", game.score()), 16.0, 44.0, 32.0, WHITE);
    if game.has_key() {
        draw_text("Key", 16.0, 76.0, 24.0, GOLD);
    }
    if let Some(message) = game.message() {
        draw_text(message, 200.0, screen.y - 30.0, 24.0, WHITE);
    }
}

fn draw_end_screen(title: &str, color: Color, score: u32, screen: Vec2) {
    let cx = screen.x * 0.5;
    draw_text(title, cx - 100.0, 130.0, 48.0, color);
    draw_text(&format!("Score: {score}"), cx - 100.0, 230.0, 32.0, WHITE);
    draw_text("Click to return to the menu", cx - 160.0, screen.y - 80.0, 24.0, WHITE);
}

fn debug_draw(world: &World) {
    for (_, body) in world.bodies() {
        let r = body.rect();
        let color = match body.kind {
            SpriteKind::Player => SKYBLUE,
            SpriteKind::Key => YELLOW,
            SpriteKind::Door => ORANGE,
            SpriteKind::Enemy => PINK,
        };
        draw_rectangle_lines(r.x, r.y, r.w, r.h, 1.0, color);
    }
}

fn draw_textured(texture: Option<&Texture2D>, rect: Rect, fallback: Color) {
    match texture {
        Some(tex) => draw_texture_ex(
            tex,
            rect.x,
            rect.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(rect.w, rect.h)),
                ..Default::default()
            },
        ),
        None => draw_rectangle(rect.x, rect.y, rect.w, rect.h, fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_button_sits_under_the_title() {
        let button = start_button_rect(vec2(800.0, 600.0));
        assert_eq!(button.center(), vec2(400.0, 400.0));
        assert!(button.contains(vec2(400.0, 400.0)));
        assert!(!button.contains(vec2(400.0, 100.0)));
    }
}
