use std::collections::HashMap;
use std::path::Path;

use macroquad::prelude::*;
use tracing::{debug, warn};

use crate::engine::SpriteKind;
use crate::run::SceneId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Player,
    Key,
    Door,
    Enemy,
    Tiles,
    StartButton,
    MenuBackground,
    Level1Background,
    Level2Background,
    GameOverBackground,
    WinBackground,
}

impl TextureKey {
    pub const ALL: [TextureKey; 11] = [
        TextureKey::Player,
        TextureKey::Key,
        TextureKey::Door,
        TextureKey::Enemy,
        TextureKey::Tiles,
        TextureKey::StartButton,
        TextureKey::MenuBackground,
        TextureKey::Level1Background,
        TextureKey::Level2Background,
        TextureKey::GameOverBackground,
        TextureKey::WinBackground,
    ];

    /// Path relative to the assets root.
    pub fn file(self) -> &'static str {
        match self {
            TextureKey::Player => "sprites/player.png",
            TextureKey::Key => "sprites/key.png",
            TextureKey::Door => "sprites/door.png",
            TextureKey::Enemy => "sprites/enemy.png",
            TextureKey::Tiles => "tiles/tileset.png",
            TextureKey::StartButton => "ui/start.png",
            TextureKey::MenuBackground => "backgrounds/menu.png",
            TextureKey::Level1Background => "backgrounds/level1.png",
            TextureKey::Level2Background => "backgrounds/level2.png",
            TextureKey::GameOverBackground => "backgrounds/gameover.png",
            TextureKey::WinBackground => "backgrounds/win.png",
        }
    }

    pub fn for_sprite(kind: SpriteKind) -> Self {
        match kind {
            SpriteKind::Player => TextureKey::Player,
            SpriteKind::Key => TextureKey::Key,
            SpriteKind::Door => TextureKey::Door,
            SpriteKind::Enemy => TextureKey::Enemy,
        }
    }

    pub fn background(scene: SceneId) -> Self {
        match scene {
            SceneId::Menu => TextureKey::MenuBackground,
            SceneId::Level1 => TextureKey::Level1Background,
            SceneId::Level2 => TextureKey::Level2Background,
            SceneId::GameOver => TextureKey::GameOverBackground,
            SceneId::Win => TextureKey::WinBackground,
        }
    }
}

pub struct Assets {
    textures: HashMap<TextureKey, Texture2D>,
}

impl Assets {
    pub fn get(&self, key: TextureKey) -> Option<&Texture2D> {
        self.textures.get(&key)
    }
}

/// Loads every known texture. A texture that fails to load is left out and
/// drawn as a flat placeholder instead.
pub async fn load_assets(root: &Path) -> Assets {
    let mut textures = HashMap::new();

    for key in TextureKey::ALL {
        let path = root.join(key.file());
        let Some(path_str) = path.to_str() else {
            warn!(path = %path.display(), "non-UTF8 asset path skipped");
            continue;
        };

        match load_texture(path_str).await {
            Ok(texture) => {
                texture.set_filter(FilterMode::Nearest);
                debug!(?key, path = path_str, "texture loaded");
                textures.insert(key, texture);
            }
            Err(e) => {
                warn!(?key, path = path_str, error = ?e, "texture unavailable, drawing placeholder");
            }
        }
    }

    Assets { textures }
}
