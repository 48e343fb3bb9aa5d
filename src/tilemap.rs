use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use macroquad::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::level::Level;

/// Decorative ground layer drawn under the sprites. Non-zero tiles are
/// painted; nothing collides with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundLayer {
    pub tile_size: f32,
    pub columns: usize,
    pub rows: usize,
    pub tiles: Vec<u8>,
}

impl GroundLayer {
    pub fn empty() -> Self {
        Self {
            tile_size: 32.0,
            columns: 0,
            rows: 0,
            tiles: Vec::new(),
        }
    }

    /// A ring of wall tiles with `inner` extra tiles set, given as (column, row).
    pub fn bordered(columns: usize, rows: usize, tile_size: f32, inner: &[(usize, usize)]) -> Self {
        let mut tiles = vec![0u8; columns * rows];
        for row in 0..rows {
            for col in 0..columns {
                if row == 0 || col == 0 || row + 1 == rows || col + 1 == columns {
                    tiles[row * columns + col] = 1;
                }
            }
        }
        for &(col, row) in inner {
            if col < columns && row < rows {
                tiles[row * columns + col] = 2;
            }
        }
        Self {
            tile_size,
            columns,
            rows,
            tiles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(|&t| t == 0)
    }

    /// Screen rectangles of every painted tile, with its tile value.
    pub fn painted(&self) -> impl Iterator<Item = (Rect, u8)> + '_ {
        let size = self.tile_size;
        let columns = self.columns.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t != 0)
            .map(move |(i, &t)| {
                let col = (i % columns) as f32;
                let row = (i / columns) as f32;
                (Rect::new(col * size, row * size, size, size), t)
            })
    }

    fn validate(self) -> Result<Self> {
        ensure!(
            self.tile_size.is_finite() && self.tile_size > 0.0,
            "tile size must be positive, got {}",
            self.tile_size
        );
        let expected = self.columns.checked_mul(self.rows);
        ensure!(
            expected == Some(self.tiles.len()),
            "expected {}x{} tiles, found {}",
            self.columns,
            self.rows,
            self.tiles.len()
        );
        Ok(self)
    }
}

pub fn ground_path(root: impl AsRef<Path>, level: Level) -> PathBuf {
    let name = match level {
        Level::One => "level1.json",
        Level::Two => "level2.json",
    };
    root.as_ref().join("maps").join(name)
}

pub fn load_ground_layer(path: impl AsRef<Path>) -> Result<GroundLayer> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read ground layer {}", path.display()))?;
    let layer: GroundLayer = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse ground layer {}", path.display()))?;
    layer
        .validate()
        .with_context(|| format!("invalid ground layer {}", path.display()))
}

/// Loads a ground layer; any failure is logged and yields an empty layer so
/// the level still runs.
pub fn ground_or_empty(path: impl AsRef<Path>) -> GroundLayer {
    let path = path.as_ref();
    match load_ground_layer(path) {
        Ok(layer) => {
            debug!(
                path = %path.display(),
                columns = layer.columns,
                rows = layer.rows,
                empty = layer.is_empty(),
                "ground layer loaded"
            );
            layer
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "using an empty ground layer");
            GroundLayer::empty()
        }
    }
}

pub fn save_ground_layer(path: impl AsRef<Path>, layer: &GroundLayer) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let text = serde_json::to_string(layer).context("failed to serialize ground layer")?;
    fs::write(path, text).with_context(|| format!("failed to write ground layer {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("keymaze-tilemap-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn saved_layer_loads_back() {
        let dir = scratch("ok");
        let path = ground_path(&dir, Level::Two);
        let layer = GroundLayer::bordered(25, 19, 32.0, &[(5, 5), (6, 5)]);
        save_ground_layer(&path, &layer).unwrap();

        assert_eq!(ground_or_empty(&path), layer);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_layer_degrades_to_empty() {
        let dir = scratch("missing");
        let layer = ground_or_empty(ground_path(&dir, Level::One));
        assert!(layer.is_empty());
        assert_eq!(layer.painted().count(), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_layer_degrades_to_empty() {
        let dir = scratch("malformed");
        let path = dir.join("broken.json");
        fs::write(&path, r#"{ "tile_size": 32.0, "columns": 4, "rows": 4, "tiles": [1, 1] }"#).unwrap();

        assert!(load_ground_layer(&path).is_err());
        assert!(ground_or_empty(&path).is_empty());

        fs::write(&path, "not json at all").unwrap();
        assert!(ground_or_empty(&path).is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn oversized_dimensions_degrade_to_empty() {
        let dir = scratch("oversized");
        let path = dir.join("huge.json");
        fs::write(
            &path,
            r#"{ "tile_size": 32.0, "columns": 18446744073709551615, "rows": 2, "tiles": [] }"#,
        )
        .unwrap();

        assert!(load_ground_layer(&path).is_err());
        let layer = ground_or_empty(&path);
        assert_eq!(layer, GroundLayer::empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn border_paints_the_ring() {
        let layer = GroundLayer::bordered(4, 3, 10.0, &[(9, 9)]);
        // 4 + 4 + 1 + 1 edge tiles; the out-of-range inner tile is dropped.
        assert_eq!(layer.painted().count(), 10);
        let (rect, value) = layer.painted().last().unwrap();
        assert_eq!(rect, Rect::new(30.0, 20.0, 10.0, 10.0));
        assert_eq!(value, 1);
    }
}
