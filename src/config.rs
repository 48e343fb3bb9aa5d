use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use macroquad::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::level::LevelTuning;
use crate::world::SpriteSizes;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub seed: Option<u64>,
    pub world_width: f32,
    pub world_height: f32,
    pub player_start_x: f32,
    pub player_start_y: f32,
    pub player_speed: f32,
    pub key_margin: f32,
    pub key_message_ms: u32,
    pub locked_message_ms: u32,
    pub enemy_speed_bound: i32,
    pub door_speed_bound: i32,
    pub enemy_period_ms: u32,
    pub door_period_ms: u32,
    pub player_size: f32,
    pub key_size: f32,
    pub door_width: f32,
    pub door_height: f32,
    pub enemy_size: f32,
    pub control_scheme: String,
    pub key_up: String,
    pub key_down: String,
    pub key_left: String,
    pub key_right: String,
    pub show_fps: bool,
    pub debug_overlay: bool,
    pub theme: String,
    pub generate_placeholder_assets: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            seed: None,
            world_width: 800.0,
            world_height: 600.0,
            player_start_x: 100.0,
            player_start_y: 100.0,
            player_speed: 160.0,
            key_margin: 50.0,
            key_message_ms: 3000,
            locked_message_ms: 2000,
            enemy_speed_bound: 200,
            door_speed_bound: 100,
            enemy_period_ms: 2000,
            door_period_ms: 3000,
            player_size: 32.0,
            key_size: 24.0,
            door_width: 48.0,
            door_height: 64.0,
            enemy_size: 32.0,
            control_scheme: "both".to_string(),
            key_up: "W".to_string(),
            key_down: "S".to_string(),
            key_left: "A".to_string(),
            key_right: "D".to_string(),
            show_fps: false,
            debug_overlay: false,
            theme: "default".to_string(),
            generate_placeholder_assets: true,
        }
    }
}

const MAX_WORLD_EXTENT: f32 = 4096.0;
const MAX_SPRITE_EXTENT: f32 = 512.0;

fn sprite_extent(value: f32) -> f32 {
    value.max(1.0).min(MAX_SPRITE_EXTENT)
}

impl GameRules {
    pub fn world_size(&self) -> Vec2 {
        vec2(
            self.world_width.max(1.0).min(MAX_WORLD_EXTENT),
            self.world_height.max(1.0).min(MAX_WORLD_EXTENT),
        )
    }

    pub fn tuning(&self) -> LevelTuning {
        let world = self.world_size();
        LevelTuning {
            world,
            player_start: vec2(self.player_start_x, self.player_start_y),
            player_speed: self.player_speed.max(0.0),
            key_margin: self.key_margin.clamp(0.0, world.x.min(world.y) / 2.0),
            key_message_ms: self.key_message_ms,
            locked_message_ms: self.locked_message_ms,
            enemy_speed_bound: self.enemy_speed_bound.max(0),
            door_speed_bound: self.door_speed_bound.max(0),
            enemy_period_ms: self.enemy_period_ms.max(1),
            door_period_ms: self.door_period_ms.max(1),
        }
    }

    pub fn sprite_sizes(&self) -> SpriteSizes {
        SpriteSizes {
            player: Vec2::splat(sprite_extent(self.player_size)),
            key: Vec2::splat(sprite_extent(self.key_size)),
            door: vec2(sprite_extent(self.door_width), sprite_extent(self.door_height)),
            enemy: Vec2::splat(sprite_extent(self.enemy_size)),
        }
    }
}

/// Reads the rules file, falling back to defaults when it is missing or
/// malformed. A missing file is written back with the defaults.
pub fn load_rules(path: impl AsRef<Path>) -> GameRules {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to parse rules, using defaults");
            GameRules::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let rules = GameRules::default();
            match save_rules(path, &rules) {
                Ok(()) => info!(path = %path.display(), "wrote default rules"),
                Err(e) => warn!(error = %format!("{e:#}"), "could not write default rules"),
            }
            rules
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read rules, using defaults");
            GameRules::default()
        }
    }
}

pub fn save_rules(path: impl AsRef<Path>, rules: &GameRules) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config dir {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(rules).context("failed to serialize rules")?;
    fs::write(path, text).with_context(|| format!("failed to write rules file {}", path.display()))?;
    Ok(())
}

pub struct InputConfig {
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
}

pub fn build_input_config(rules: &GameRules) -> InputConfig {
    let arrows = InputConfig {
        up: vec![KeyCode::Up],
        down: vec![KeyCode::Down],
        left: vec![KeyCode::Left],
        right: vec![KeyCode::Right],
    };

    match rules.control_scheme.to_lowercase().as_str() {
        "arrows" => arrows,
        "wasd" => InputConfig {
            up: vec![KeyCode::W],
            down: vec![KeyCode::S],
            left: vec![KeyCode::A],
            right: vec![KeyCode::D],
        },
        "custom" => InputConfig {
            up: parse_key(&rules.key_up).into_iter().collect(),
            down: parse_key(&rules.key_down).into_iter().collect(),
            left: parse_key(&rules.key_left).into_iter().collect(),
            right: parse_key(&rules.key_right).into_iter().collect(),
        },
        _ => InputConfig {
            up: vec![KeyCode::Up, KeyCode::W],
            down: vec![KeyCode::Down, KeyCode::S],
            left: vec![KeyCode::Left, KeyCode::A],
            right: vec![KeyCode::Right, KeyCode::D],
        },
    }
}

fn parse_key(name: &str) -> Option<KeyCode> {
    let s = name.trim().to_ascii_uppercase();
    let key = match s.as_str() {
        "UP" => KeyCode::Up,
        "DOWN" => KeyCode::Down,
        "LEFT" => KeyCode::Left,
        "RIGHT" => KeyCode::Right,
        "A" => KeyCode::A,
        "D" => KeyCode::D,
        "E" => KeyCode::E,
        "F" => KeyCode::F,
        "H" => KeyCode::H,
        "I" => KeyCode::I,
        "J" => KeyCode::J,
        "K" => KeyCode::K,
        "L" => KeyCode::L,
        "Q" => KeyCode::Q,
        "S" => KeyCode::S,
        "W" => KeyCode::W,
        "Z" => KeyCode::Z,
        "X" => KeyCode::X,
        _ => {
            if !s.is_empty() {
                warn!(key = %name, "unknown key name in rules");
            }
            return None;
        }
    };
    Some(key)
}
