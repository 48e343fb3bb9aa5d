use macroquad::prelude::*;
use tracing::{debug, info, trace};

use crate::engine::{Engine, EngineEvent, EntityId, Gate, SpriteKind, Task, TimerId};
use crate::run::Trigger;

pub const KEY_COLLECTED_MESSAGE: &str = "Key collected! Head for the door.";
pub const DOOR_LOCKED_MESSAGE: &str = "You need the key to open the door!";

const DOOR_START: Vec2 = Vec2::new(700.0, 500.0);
const LEVEL_ONE_ENEMIES: &[Vec2] = &[Vec2::new(400.0, 200.0)];
const LEVEL_TWO_ENEMIES: &[Vec2] = &[Vec2::new(300.0, 200.0), Vec2::new(500.0, 400.0)];
const LEVEL_ONE_ENEMY_VELOCITY: Vec2 = Vec2::new(100.0, 100.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    One,
    Two,
}

impl Level {
    pub fn base_score_for_key(self) -> u32 {
        match self {
            Level::One => 10,
            Level::Two => 20,
        }
    }

    pub fn enemy_starts(self) -> &'static [Vec2] {
        match self {
            Level::One => LEVEL_ONE_ENEMIES,
            Level::Two => LEVEL_TWO_ENEMIES,
        }
    }

    pub fn enemy_moves(self) -> bool {
        matches!(self, Level::Two)
    }

    pub fn door_moves(self) -> bool {
        matches!(self, Level::Two)
    }
}

/// Gameplay numbers a level controller needs, projected out of `GameRules`.
#[derive(Clone, Copy, Debug)]
pub struct LevelTuning {
    pub world: Vec2,
    pub player_start: Vec2,
    pub player_speed: f32,
    pub key_margin: f32,
    pub key_message_ms: u32,
    pub locked_message_ms: u32,
    pub enemy_speed_bound: i32,
    pub door_speed_bound: i32,
    pub enemy_period_ms: u32,
    pub door_period_ms: u32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            world: vec2(800.0, 600.0),
            player_start: vec2(100.0, 100.0),
            player_speed: 160.0,
            key_margin: 50.0,
            key_message_ms: 3000,
            locked_message_ms: 2000,
            enemy_speed_bound: 200,
            door_speed_bound: 100,
            enemy_period_ms: 2000,
            door_period_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectiveState {
    pub score: u32,
    pub has_key: bool,
    pub key: Option<EntityId>,
    pub door: EntityId,
    pub enemies: Vec<EntityId>,
}

struct Message {
    text: &'static str,
    clear: TimerId,
}

/// Runs one playable level: owns its objective state and every timer it
/// schedules. `on_exit` consumes the controller, so nothing can reach the
/// objective state once the level is left.
pub struct LevelController {
    level: Level,
    tuning: LevelTuning,
    player: EntityId,
    objective: ObjectiveState,
    message: Option<Message>,
    enemy_timer: Option<TimerId>,
    door_timer: Option<TimerId>,
}

impl LevelController {
    pub fn on_entry<E: Engine>(
        level: Level,
        carried_score: u32,
        tuning: LevelTuning,
        engine: &mut E,
    ) -> Self {
        let player = engine.create_sprite(tuning.player_start, SpriteKind::Player);
        let door = engine.create_sprite(DOOR_START, SpriteKind::Door);
        let enemies: Vec<EntityId> = level
            .enemy_starts()
            .iter()
            .map(|&at| engine.create_sprite(at, SpriteKind::Enemy))
            .collect();

        let mut controller = Self {
            level,
            tuning,
            player,
            objective: ObjectiveState {
                score: carried_score,
                has_key: false,
                key: None,
                door,
                enemies,
            },
            message: None,
            enemy_timer: None,
            door_timer: None,
        };

        // Gates are registered only once the sprites they watch exist.
        controller.spawn_key(engine);
        engine.on_overlap(player, door, Gate::Door);
        for &enemy in &controller.objective.enemies {
            engine.on_collide(player, enemy, Gate::Enemy);
        }

        if level.enemy_moves() {
            controller.move_enemies(engine);
        } else {
            for &enemy in &controller.objective.enemies {
                engine.set_velocity(enemy, LEVEL_ONE_ENEMY_VELOCITY);
            }
        }
        if level.door_moves() {
            controller.move_door(engine);
        }

        info!(?level, score = carried_score, "level entered");
        controller
    }

    pub fn objective(&self) -> &ObjectiveState {
        &self.objective
    }

    pub fn score(&self) -> u32 {
        self.objective.score
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text)
    }

    /// Per-frame player steering from the directional input.
    pub fn update<E: Engine>(&mut self, engine: &mut E) {
        let input = engine.poll_directional_input();
        let speed = self.tuning.player_speed;
        let mut velocity = Vec2::ZERO;

        if input.left {
            velocity.x = -speed;
        } else if input.right {
            velocity.x = speed;
        }

        if input.up {
            velocity.y = -speed;
        } else if input.down {
            velocity.y = speed;
        }

        engine.set_velocity(self.player, velocity);
    }

    /// Routes one engine event to its handler. Returns the trigger for the
    /// run state machine when the event was a gate contact.
    pub fn handle<E: Engine>(&mut self, event: EngineEvent, engine: &mut E) -> Option<Trigger> {
        match event {
            EngineEvent::Contact {
                gate: Gate::Key,
                other,
            } => {
                self.on_key_collision(other, engine);
                None
            }
            EngineEvent::Contact {
                gate: Gate::Door,
                other,
            } => self.on_door_collision(other, engine),
            EngineEvent::Contact {
                gate: Gate::Enemy,
                other,
            } => self.on_enemy_collision(other),
            EngineEvent::Timer { id, task } => {
                self.on_timer(id, task, engine);
                None
            }
        }
    }

    pub fn on_key_collision<E: Engine>(&mut self, key: EntityId, engine: &mut E) {
        if self.objective.key != Some(key) {
            debug!(?key, "contact with an untracked key ignored");
            return;
        }

        self.objective.score = self
            .objective
            .score
            .saturating_add(self.level.base_score_for_key());
        self.objective.has_key = true;
        self.objective.key = None;
        engine.destroy(key);
        self.show_message(engine, KEY_COLLECTED_MESSAGE, self.tuning.key_message_ms);
        debug!(level = ?self.level, score = self.objective.score, "key collected");
    }

    pub fn on_door_collision<E: Engine>(&mut self, door: EntityId, engine: &mut E) -> Option<Trigger> {
        if door != self.objective.door {
            return None;
        }
        if self.objective.has_key {
            Some(Trigger::DoorWithKey)
        } else {
            self.show_message(engine, DOOR_LOCKED_MESSAGE, self.tuning.locked_message_ms);
            Some(Trigger::DoorLocked)
        }
    }

    pub fn on_enemy_collision(&mut self, enemy: EntityId) -> Option<Trigger> {
        if !self.objective.enemies.contains(&enemy) {
            return None;
        }
        debug!(level = ?self.level, ?enemy, has_key = self.objective.has_key, "caught by enemy");
        Some(Trigger::EnemyContact)
    }

    /// Cancels every timer this level scheduled and hands back the final
    /// objective state.
    pub fn on_exit<E: Engine>(mut self, engine: &mut E) -> ObjectiveState {
        let timers = [
            self.enemy_timer.take(),
            self.door_timer.take(),
            self.message.take().map(|m| m.clear),
        ];
        for id in timers.into_iter().flatten() {
            engine.cancel(id);
        }
        debug!(level = ?self.level, score = self.objective.score, "level exited");
        self.objective
    }

    fn on_timer<E: Engine>(&mut self, id: TimerId, task: Task, engine: &mut E) {
        match task {
            Task::ClearMessage => {
                if self.message.as_ref().is_some_and(|m| m.clear == id) {
                    self.message = None;
                }
            }
            Task::MoveEnemies => {
                if self.enemy_timer == Some(id) {
                    self.move_enemies(engine);
                }
            }
            Task::MoveDoor => {
                if self.door_timer == Some(id) {
                    self.move_door(engine);
                }
            }
        }
    }

    fn spawn_key<E: Engine>(&mut self, engine: &mut E) {
        let margin = self.tuning.key_margin;
        let world = self.tuning.world;
        let x = engine.uniform_random_int(margin as i32, (world.x - margin) as i32);
        let y = engine.uniform_random_int(margin as i32, (world.y - margin) as i32);

        let key = engine.create_sprite(vec2(x as f32, y as f32), SpriteKind::Key);
        engine.on_overlap(self.player, key, Gate::Key);
        self.objective.key = Some(key);
        self.objective.has_key = false;
        debug!(?key, x, y, "key spawned");
    }

    fn move_enemies<E: Engine>(&mut self, engine: &mut E) {
        for &enemy in &self.objective.enemies {
            set_random_velocity(engine, enemy, self.tuning.enemy_speed_bound);
        }
        self.enemy_timer = Some(engine.schedule_once(self.tuning.enemy_period_ms, Task::MoveEnemies));
    }

    fn move_door<E: Engine>(&mut self, engine: &mut E) {
        set_random_velocity(engine, self.objective.door, self.tuning.door_speed_bound);
        self.door_timer = Some(engine.schedule_once(self.tuning.door_period_ms, Task::MoveDoor));
    }

    fn show_message<E: Engine>(&mut self, engine: &mut E, text: &'static str, duration_ms: u32) {
        if let Some(old) = self.message.take() {
            engine.cancel(old.clear);
        }
        let clear = engine.schedule_once(duration_ms, Task::ClearMessage);
        self.message = Some(Message { text, clear });
    }
}

fn set_random_velocity<E: Engine>(engine: &mut E, id: EntityId, bound: i32) {
    let vx = engine.uniform_random_int(-bound, bound);
    let vy = engine.uniform_random_int(-bound, bound);
    trace!(?id, vx, vy, "random velocity");
    engine.set_velocity(id, vec2(vx as f32, vy as f32));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Directions;
    use crate::world::{SpriteSizes, World};
    use ::rand::rngs::StdRng;
    use ::rand::SeedableRng;

    fn world(seed: u64) -> World {
        let sizes = SpriteSizes {
            player: vec2(32.0, 32.0),
            key: vec2(24.0, 24.0),
            door: vec2(48.0, 64.0),
            enemy: vec2(32.0, 32.0),
        };
        World::new(vec2(800.0, 600.0), sizes, StdRng::seed_from_u64(seed))
    }

    fn enter(level: Level, score: u32, world: &mut World) -> LevelController {
        LevelController::on_entry(level, score, LevelTuning::default(), world)
    }

    /// Moves the key to a known spot and parks the enemies in a far corner.
    fn arrange(controller: &LevelController, world: &mut World) {
        if let Some(key) = controller.objective.key {
            world.teleport(key, vec2(200.0, 400.0));
        }
        for (i, &enemy) in controller.objective.enemies.iter().enumerate() {
            world.teleport(enemy, vec2(600.0 + 60.0 * i as f32, 60.0));
            world.set_velocity(enemy, Vec2::ZERO);
        }
        world.teleport(controller.player, vec2(400.0, 300.0));
    }

    fn run_frame(controller: &mut LevelController, world: &mut World) -> Vec<Trigger> {
        let events = world.step(0.0);
        events
            .into_iter()
            .filter_map(|e| controller.handle(e, world))
            .collect()
    }

    fn run_timers(controller: &mut LevelController, world: &mut World, ms: f64) -> usize {
        let events = world.advance_timers(ms);
        let fired = events.len();
        for event in events {
            controller.handle(event, world);
        }
        fired
    }

    #[test]
    fn level_one_entry_layout() {
        let mut world = world(1);
        let controller = enter(Level::One, 0, &mut world);

        assert_eq!(controller.score(), 0);
        assert!(!controller.objective.has_key);
        assert_eq!(controller.objective.enemies.len(), 1);
        assert_eq!(world.body(controller.objective.door).unwrap().position, DOOR_START);

        let enemy = world.body(controller.objective.enemies[0]).unwrap();
        assert_eq!(enemy.velocity, LEVEL_ONE_ENEMY_VELOCITY);
        assert_eq!(world.pending_timers(), 0);
    }

    #[test]
    fn level_two_entry_starts_both_schedules() {
        let mut world = world(2);
        let controller = enter(Level::Two, 10, &mut world);

        assert_eq!(controller.score(), 10);
        assert_eq!(controller.objective.enemies.len(), 2);
        assert!(controller.enemy_timer.is_some());
        assert!(controller.door_timer.is_some());
        assert_eq!(world.pending_timers(), 2);

        let door = world.body(controller.objective.door).unwrap();
        assert!(door.velocity.x.abs() <= 100.0 && door.velocity.y.abs() <= 100.0);
        for &enemy in &controller.objective.enemies {
            let v = world.body(enemy).unwrap().velocity;
            assert!(v.x.abs() <= 200.0 && v.y.abs() <= 200.0);
        }
    }

    #[test]
    fn key_spawns_inside_margin() {
        for seed in 0..64 {
            let mut world = world(seed);
            let controller = enter(Level::One, 0, &mut world);
            let key = controller.objective.key.unwrap();
            let at = world.body(key).unwrap().position;
            assert!((50.0..=750.0).contains(&at.x), "x = {}", at.x);
            assert!((50.0..=550.0).contains(&at.y), "y = {}", at.y);
        }
    }

    #[test]
    fn entry_spawns_a_single_tracked_key() {
        for level in [Level::One, Level::Two] {
            let mut world = world(11);
            let controller = enter(level, 0, &mut world);
            let keys: Vec<EntityId> = world
                .bodies()
                .filter(|(_, b)| b.kind == SpriteKind::Key)
                .map(|(id, _)| id)
                .collect();
            assert_eq!(keys, vec![controller.objective.key.unwrap()]);
            assert!(!controller.objective.has_key);
        }
    }

    #[test]
    fn level_one_key_pickup_awards_ten() {
        let mut world = world(3);
        let mut controller = enter(Level::One, 0, &mut world);
        arrange(&controller, &mut world);
        let key = controller.objective.key.unwrap();

        world.teleport(controller.player, vec2(200.0, 400.0));
        let triggers = run_frame(&mut controller, &mut world);

        assert!(triggers.is_empty());
        assert_eq!(controller.score(), 10);
        assert!(controller.objective.has_key);
        assert_eq!(controller.objective.key, None);
        assert!(world.body(key).is_none());
        assert_eq!(controller.message(), Some(KEY_COLLECTED_MESSAGE));
    }

    #[test]
    fn level_two_key_pickup_awards_twenty() {
        let mut world = world(4);
        let mut controller = enter(Level::Two, 10, &mut world);
        arrange(&controller, &mut world);

        world.teleport(controller.player, vec2(200.0, 400.0));
        run_frame(&mut controller, &mut world);
        assert_eq!(controller.score(), 30);
    }

    #[test]
    fn removed_key_cannot_score_twice() {
        let mut world = world(5);
        let mut controller = enter(Level::One, 0, &mut world);
        arrange(&controller, &mut world);
        let key = controller.objective.key.unwrap();

        world.teleport(controller.player, vec2(200.0, 400.0));
        run_frame(&mut controller, &mut world);
        world.teleport(controller.player, vec2(400.0, 300.0));
        run_frame(&mut controller, &mut world);
        world.teleport(controller.player, vec2(200.0, 400.0));
        run_frame(&mut controller, &mut world);

        controller.on_key_collision(key, &mut world);
        assert_eq!(controller.score(), 10);
    }

    #[test]
    fn locked_door_shows_message_then_clears() {
        let mut world = world(6);
        let mut controller = enter(Level::One, 0, &mut world);
        arrange(&controller, &mut world);
        let before = controller.objective.clone();

        world.teleport(controller.player, DOOR_START);
        let triggers = run_frame(&mut controller, &mut world);

        assert_eq!(triggers, vec![Trigger::DoorLocked]);
        assert_eq!(controller.objective, before);
        assert_eq!(controller.message(), Some(DOOR_LOCKED_MESSAGE));

        run_timers(&mut controller, &mut world, 1999.0);
        assert_eq!(controller.message(), Some(DOOR_LOCKED_MESSAGE));
        run_timers(&mut controller, &mut world, 1.0);
        assert_eq!(controller.message(), None);
        assert_eq!(controller.objective, before);
    }

    #[test]
    fn door_with_key_opens() {
        let mut world = world(7);
        let mut controller = enter(Level::One, 0, &mut world);
        arrange(&controller, &mut world);

        world.teleport(controller.player, vec2(200.0, 400.0));
        run_frame(&mut controller, &mut world);
        world.teleport(controller.player, DOOR_START);
        let triggers = run_frame(&mut controller, &mut world);

        assert_eq!(triggers, vec![Trigger::DoorWithKey]);
        assert_eq!(controller.score(), 10);
    }

    #[test]
    fn enemy_contact_ends_run_with_or_without_key() {
        for take_key in [false, true] {
            let mut world = world(8);
            let mut controller = enter(Level::Two, 10, &mut world);
            arrange(&controller, &mut world);

            if take_key {
                world.teleport(controller.player, vec2(200.0, 400.0));
                run_frame(&mut controller, &mut world);
            }
            let enemy = controller.objective.enemies[1];
            let at = world.body(enemy).unwrap().position;
            world.teleport(controller.player, at);

            let triggers = run_frame(&mut controller, &mut world);
            assert_eq!(triggers, vec![Trigger::EnemyContact]);
            assert_eq!(controller.objective.has_key, take_key);
        }
    }

    #[test]
    fn newer_message_survives_older_clear() {
        let mut world = world(9);
        let mut controller = enter(Level::One, 0, &mut world);
        arrange(&controller, &mut world);

        world.teleport(controller.player, DOOR_START);
        run_frame(&mut controller, &mut world);
        run_timers(&mut controller, &mut world, 1500.0);

        world.teleport(controller.player, vec2(200.0, 400.0));
        run_frame(&mut controller, &mut world);
        assert_eq!(controller.message(), Some(KEY_COLLECTED_MESSAGE));

        // The locked-door clear would have fired here.
        run_timers(&mut controller, &mut world, 1000.0);
        assert_eq!(controller.message(), Some(KEY_COLLECTED_MESSAGE));
        run_timers(&mut controller, &mut world, 2000.0);
        assert_eq!(controller.message(), None);
    }

    #[test]
    fn level_two_rerandomizes_on_schedule() {
        let mut world = world(10);
        let mut controller = enter(Level::Two, 0, &mut world);
        let first_enemy_timer = controller.enemy_timer;

        assert_eq!(run_timers(&mut controller, &mut world, 2000.0), 1);
        assert_ne!(controller.enemy_timer, first_enemy_timer);
        assert_eq!(world.pending_timers(), 2);

        assert_eq!(run_timers(&mut controller, &mut world, 1000.0), 1);
        let door = world.body(controller.objective.door).unwrap();
        assert!(door.velocity.x.abs() <= 100.0 && door.velocity.y.abs() <= 100.0);
        assert_eq!(world.pending_timers(), 2);
    }

    #[test]
    fn exit_cancels_every_schedule() {
        let mut world = world(11);
        let mut controller = enter(Level::Two, 0, &mut world);
        arrange(&controller, &mut world);
        world.teleport(controller.player, DOOR_START);
        run_frame(&mut controller, &mut world);
        assert_eq!(world.pending_timers(), 3);

        let objective = controller.on_exit(&mut world);
        assert_eq!(objective.score, 0);
        assert_eq!(world.pending_timers(), 0);
        assert!(world.advance_timers(60_000.0).is_empty());
    }

    #[test]
    fn steering_prefers_left_and_up() {
        let mut world = world(12);
        let mut controller = enter(Level::One, 0, &mut world);

        world.set_input(Some(Directions {
            up: true,
            down: true,
            left: true,
            right: true,
        }));
        controller.update(&mut world);
        assert_eq!(world.body(controller.player).unwrap().velocity, vec2(-160.0, -160.0));

        world.set_input(Some(Directions {
            down: true,
            right: true,
            ..Default::default()
        }));
        controller.update(&mut world);
        assert_eq!(world.body(controller.player).unwrap().velocity, vec2(160.0, 160.0));
    }

    #[test]
    fn missing_input_stands_still() {
        let mut world = world(13);
        let mut controller = enter(Level::One, 0, &mut world);
        world.set_velocity(controller.player, vec2(50.0, 50.0));
        world.set_input(None);
        controller.update(&mut world);
        assert_eq!(world.body(controller.player).unwrap().velocity, Vec2::ZERO);
    }
}
