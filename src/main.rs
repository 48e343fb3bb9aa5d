mod asset_gen;
mod assets;
mod config;
mod engine;
mod input;
mod level;
mod render;
mod run;
mod tilemap;
mod world;

use std::path::Path;

use ::rand::rngs::StdRng;
use ::rand::SeedableRng;
use macroquad::prelude::*;
use tracing::{info, warn};

use crate::config::{build_input_config, load_rules};
use crate::level::Level;
use crate::run::{Game, SceneId};
use crate::tilemap::{ground_or_empty, ground_path, GroundLayer};
use crate::world::World;

const ASSETS_ROOT: &str = "assets";
const RULES_PATH: &str = "assets/config/rules.json";

#[macroquad::main("Key Maze")]
async fn main() {
    init_tracing();

    let rules = load_rules(RULES_PATH);
    let seed = rules.seed.unwrap_or_else(random_seed_from_time);
    info!(seed, "starting");

    let screen = rules.world_size();
    request_new_screen_size(screen.x, screen.y);

    let root = Path::new(ASSETS_ROOT);
    if rules.generate_placeholder_assets {
        if let Err(e) = asset_gen::generate_placeholder_assets(root, seed, &rules) {
            warn!(error = %format!("{e:#}"), "failed to generate placeholder assets");
        }
    }
    let assets = assets::load_assets(root).await;
    let grounds: [GroundLayer; 2] = [
        ground_or_empty(ground_path(root, Level::One)),
        ground_or_empty(ground_path(root, Level::Two)),
    ];

    let bindings = build_input_config(&rules);
    let mut world = World::new(
        screen,
        rules.sprite_sizes(),
        StdRng::seed_from_u64(seed ^ 0x9E3779B97F4A7C15),
    );
    let mut game = Game::new(rules.tuning());

    loop {
        let dt = get_frame_time();

        match game.scene() {
            SceneId::Menu => {
                let clicked_start = input::click()
                    .is_some_and(|at| render::start_button_rect(screen).contains(at));
                if clicked_start || input::confirm_pressed() {
                    game.confirm(&mut world);
                }
            }
            SceneId::Level1 | SceneId::Level2 => {
                world.set_input(input::poll_directions(&bindings));
                game.frame(&mut world, dt);
            }
            SceneId::GameOver | SceneId::Win => {
                if input::click().is_some() || input::confirm_pressed() {
                    game.confirm(&mut world);
                }
            }
        }

        let ground = match game.scene().level() {
            Some(Level::One) => Some(&grounds[0]),
            Some(Level::Two) => Some(&grounds[1]),
            None => None,
        };
        render::draw(&game, &world, &assets, ground, &rules);

        next_frame().await;
    }
}

fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}

fn random_seed_from_time() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs() ^ (now.subsec_nanos() as u64).rotate_left(32)
}
