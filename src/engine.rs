use macroquad::prelude::Vec2;

/// Handle to a live sprite. Ids are never reused within one `World`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Cancellation token returned by `Engine::schedule_once`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Player,
    Key,
    Door,
    Enemy,
}

/// Which handler a contact watch feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    Key,
    Door,
    Enemy,
}

/// Work carried by a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    ClearMessage,
    MoveEnemies,
    MoveDoor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Directions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// A watched pair started touching. `other` is the non-player side.
    Contact { gate: Gate, other: EntityId },
    Timer { id: TimerId, task: Task },
}

/// The capabilities gameplay code consumes from the 2D engine.
///
/// Handlers are registered as data (`Gate`, `Task`) and come back as
/// `EngineEvent`s from the frame step, so nothing the engine holds can
/// borrow a level controller.
pub trait Engine {
    fn create_sprite(&mut self, at: Vec2, kind: SpriteKind) -> EntityId;
    fn destroy(&mut self, id: EntityId);
    fn set_velocity(&mut self, id: EntityId, velocity: Vec2);

    /// Pass-through contact: reported once per contact, bodies are not separated.
    fn on_overlap(&mut self, a: EntityId, b: EntityId, gate: Gate);
    /// Solid contact: reported once per contact, bodies are pushed apart.
    fn on_collide(&mut self, a: EntityId, b: EntityId, gate: Gate);

    fn schedule_once(&mut self, delay_ms: u32, task: Task) -> TimerId;
    fn cancel(&mut self, id: TimerId);

    fn poll_directional_input(&self) -> Directions;
    /// Inclusive on both ends.
    fn uniform_random_int(&mut self, min: i32, max: i32) -> i32;

    /// Drops every sprite, contact watch and pending timer of the current scene.
    fn clear_scene(&mut self);
}
