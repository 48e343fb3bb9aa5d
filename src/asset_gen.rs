use std::fs;
use std::path::Path;

use ::rand::rngs::StdRng;
use ::rand::{Rng, SeedableRng};
use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba};
use tracing::{debug, info};

use crate::assets::TextureKey;
use crate::config::GameRules;
use crate::level::Level;
use crate::tilemap::{ground_path, save_ground_layer, GroundLayer};

const TILE_SIZE: u32 = 32;
const BACKGROUND_WIDTH: u32 = 200;
const BACKGROUND_HEIGHT: u32 = 150;

/// Writes placeholder art and ground layers for anything missing under
/// `root`. Existing files are left alone.
pub fn generate_placeholder_assets(root: &Path, seed: u64, rules: &GameRules) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let palette = pick_theme_colors(&rules.theme);
    let sizes = rules.sprite_sizes();
    let world = rules.world_size();
    let mut written = 0usize;

    for key in TextureKey::ALL {
        let path = root.join(key.file());
        if path.exists() {
            continue;
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let img = match key {
            TextureKey::Player => outlined(sizes.player.x, sizes.player.y, random_color(&mut rng, palette.player, 40)),
            TextureKey::Key => outlined(sizes.key.x, sizes.key.y, random_color(&mut rng, palette.key, 20)),
            TextureKey::Door => outlined(sizes.door.x, sizes.door.y, random_color(&mut rng, palette.door, 20)),
            TextureKey::Enemy => outlined(sizes.enemy.x, sizes.enemy.y, random_color(&mut rng, palette.enemy, 40)),
            TextureKey::Tiles => outlined(TILE_SIZE as f32, TILE_SIZE as f32, random_color(&mut rng, palette.wall, 30)),
            TextureKey::StartButton => outlined(200.0, 60.0, opaque(palette.button)),
            TextureKey::MenuBackground | TextureKey::Level1Background => {
                gradient(random_color(&mut rng, palette.bg_top, 20), opaque(palette.bg_bottom))
            }
            TextureKey::Level2Background => {
                gradient(opaque(palette.bg_bottom), random_color(&mut rng, palette.bg_top, 20))
            }
            TextureKey::GameOverBackground => gradient([60, 0, 0, 255], [10, 0, 0, 255]),
            TextureKey::WinBackground => gradient([0, 60, 20, 255], [0, 10, 5, 255]),
        };
        img.save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "placeholder written");
        written += 1;
    }

    let columns = (world.x / TILE_SIZE as f32).ceil().max(1.0) as usize;
    let rows = (world.y / TILE_SIZE as f32).ceil().max(1.0) as usize;
    for level in [Level::One, Level::Two] {
        let path = ground_path(root, level);
        if path.exists() {
            continue;
        }
        let inner = maze_walls(level, columns, rows);
        save_ground_layer(&path, &GroundLayer::bordered(columns, rows, TILE_SIZE as f32, &inner))?;
        written += 1;
    }

    if written > 0 {
        info!(written, root = %root.display(), "generated placeholder assets");
    }
    Ok(())
}

/// Interior wall segments, decorative only.
fn maze_walls(level: Level, columns: usize, rows: usize) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    let mid_row = rows / 2;
    match level {
        Level::One => {
            for col in columns / 4..columns / 2 {
                cells.push((col, mid_row));
            }
        }
        Level::Two => {
            for col in columns / 5..columns * 2 / 5 {
                cells.push((col, rows / 3));
            }
            for row in rows / 3..rows * 2 / 3 {
                cells.push((columns * 3 / 5, row));
            }
            for col in columns * 3 / 5..columns * 4 / 5 {
                cells.push((col, rows * 2 / 3));
            }
        }
    }
    cells
}

fn outlined(width: f32, height: f32, fill: [u8; 4]) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let w = (width.round() as u32).max(4);
    let h = (height.round() as u32).max(4);
    let edge = [fill[0] / 2, fill[1] / 2, fill[2] / 2, 255];
    ImageBuffer::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            Rgba(edge)
        } else {
            Rgba(fill)
        }
    })
}

fn gradient(top: [u8; 4], bottom: [u8; 4]) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    ImageBuffer::from_fn(BACKGROUND_WIDTH, BACKGROUND_HEIGHT, |_x, y| {
        let t = y as f32 / (BACKGROUND_HEIGHT - 1) as f32;
        let lerp = |a: u8, b: u8| -> u8 {
            ((a as f32 * (1.0 - t)) + (b as f32 * t)).round().clamp(0.0, 255.0) as u8
        };
        Rgba([
            lerp(top[0], bottom[0]),
            lerp(top[1], bottom[1]),
            lerp(top[2], bottom[2]),
            255,
        ])
    })
}

fn opaque(rgb: [u8; 3]) -> [u8; 4] {
    [rgb[0], rgb[1], rgb[2], 255]
}

fn random_color(rng: &mut StdRng, base: [u8; 3], variance: u8) -> [u8; 4] {
    let mut out = [0u8; 4];
    for i in 0..3 {
        let offset: i16 = rng.gen_range(-(variance as i16)..=(variance as i16));
        out[i] = (base[i] as i16 + offset).clamp(0, 255) as u8;
    }
    out[3] = 255;
    out
}

struct ThemePalette {
    player: [u8; 3],
    key: [u8; 3],
    door: [u8; 3],
    enemy: [u8; 3],
    wall: [u8; 3],
    button: [u8; 3],
    bg_top: [u8; 3],
    bg_bottom: [u8; 3],
}

fn pick_theme_colors(theme: &str) -> ThemePalette {
    match theme.to_lowercase().as_str() {
        "forest" => ThemePalette {
            player: [80, 200, 120],
            key: [240, 210, 60],
            door: [110, 70, 30],
            enemy: [220, 60, 60],
            wall: [60, 90, 40],
            button: [90, 160, 70],
            bg_top: [30, 80, 40],
            bg_bottom: [120, 200, 100],
        },
        "neon" => ThemePalette {
            player: [80, 200, 255],
            key: [255, 240, 80],
            door: [255, 80, 200],
            enemy: [255, 80, 80],
            wall: [80, 80, 120],
            button: [140, 60, 220],
            bg_top: [10, 10, 30],
            bg_bottom: [40, 0, 80],
        },
        _ => ThemePalette {
            player: [40, 120, 220],
            key: [230, 200, 40],
            door: [140, 90, 40],
            enemy: [220, 60, 60],
            wall: [110, 110, 110],
            button: [60, 160, 90],
            bg_top: [30, 40, 70],
            bg_bottom: [90, 110, 150],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::ground_or_empty;

    #[test]
    fn fills_an_empty_root_and_keeps_existing_files() {
        let root = std::env::temp_dir().join(format!("keymaze-assets-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let rules = GameRules::default();

        generate_placeholder_assets(&root, 1, &rules).unwrap();
        for key in TextureKey::ALL {
            assert!(root.join(key.file()).exists(), "{key:?} missing");
        }
        let door = image::open(root.join(TextureKey::Door.file())).unwrap().to_rgba8();
        assert_eq!(door.dimensions(), (48, 64));

        let level_two = ground_or_empty(ground_path(&root, Level::Two));
        assert_eq!((level_two.columns, level_two.rows), (25, 19));
        assert!(!level_two.is_empty());

        let custom = root.join(TextureKey::Key.file());
        fs::write(&custom, b"user art").unwrap();
        generate_placeholder_assets(&root, 2, &rules).unwrap();
        assert_eq!(fs::read(&custom).unwrap(), b"user art");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn oversized_rules_produce_capped_images() {
        let root = std::env::temp_dir().join(format!("keymaze-assets-big-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let rules = GameRules {
            world_width: 1.0e12,
            player_size: 1.0e9,
            ..GameRules::default()
        };

        generate_placeholder_assets(&root, 3, &rules).unwrap();
        let player = image::open(root.join(TextureKey::Player.file())).unwrap().to_rgba8();
        assert_eq!(player.dimensions(), (512, 512));
        let level_one = ground_or_empty(ground_path(&root, Level::One));
        assert_eq!(level_one.columns, 128);

        let _ = fs::remove_dir_all(&root);
    }
}
