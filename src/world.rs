use std::collections::BTreeMap;

use ::rand::rngs::StdRng;
use ::rand::Rng;
use macroquad::prelude::*;
use tracing::{trace, warn};

use crate::engine::{Directions, Engine, EngineEvent, EntityId, Gate, SpriteKind, Task, TimerId};

/// Collision box size of each sprite kind, in world pixels.
#[derive(Clone, Copy, Debug)]
pub struct SpriteSizes {
    pub player: Vec2,
    pub key: Vec2,
    pub door: Vec2,
    pub enemy: Vec2,
}

impl SpriteSizes {
    fn of(&self, kind: SpriteKind) -> Vec2 {
        match kind {
            SpriteKind::Player => self.player,
            SpriteKind::Key => self.key,
            SpriteKind::Door => self.door,
            SpriteKind::Enemy => self.enemy,
        }
    }
}

pub struct Body {
    pub kind: SpriteKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    pub bounce: f32,
    pub collide_world_bounds: bool,
}

impl Body {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x - self.size.x / 2.0,
            self.position.y - self.size.y / 2.0,
            self.size.x,
            self.size.y,
        )
    }
}

struct Watch {
    a: EntityId,
    b: EntityId,
    gate: Gate,
    solid: bool,
    touching: bool,
}

struct PendingTimer {
    due_ms: f64,
    task: Task,
}

/// Arcade-style world: axis-aligned boxes, constant velocities, bounce on
/// the world edges, contact watches and a millisecond timer queue.
pub struct World {
    size: Vec2,
    sizes: SpriteSizes,
    bodies: BTreeMap<EntityId, Body>,
    watches: Vec<Watch>,
    timers: BTreeMap<TimerId, PendingTimer>,
    clock_ms: f64,
    next_entity: u32,
    next_timer: u64,
    input: Option<Directions>,
    rng: StdRng,
}

impl World {
    pub fn new(size: Vec2, sizes: SpriteSizes, rng: StdRng) -> Self {
        Self {
            size,
            sizes,
            bodies: BTreeMap::new(),
            watches: Vec::new(),
            timers: BTreeMap::new(),
            clock_ms: 0.0,
            next_entity: 1,
            next_timer: 1,
            input: None,
            rng,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[cfg(test)]
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> {
        self.bodies.iter().map(|(id, body)| (*id, body))
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// `None` means no input device this frame; movement degrades to standing still.
    pub fn set_input(&mut self, input: Option<Directions>) {
        self.input = input;
    }

    /// Runs one frame: movement, then contacts, then due timers.
    pub fn step(&mut self, dt: f32) -> Vec<EngineEvent> {
        self.integrate(dt);
        let mut events = self.detect_contacts();
        events.extend(self.advance_timers(f64::from(dt) * 1000.0));
        events
    }

    fn integrate(&mut self, dt: f32) {
        let world = self.size;
        for body in self.bodies.values_mut() {
            body.position += body.velocity * dt;
            if body.collide_world_bounds {
                keep_in_bounds(body, world);
            }
        }
    }

    fn detect_contacts(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut separations = Vec::new();

        for watch in &mut self.watches {
            let (Some(a), Some(b)) = (self.bodies.get(&watch.a), self.bodies.get(&watch.b)) else {
                continue;
            };
            let overlapping = a.rect().overlaps(&b.rect());
            if overlapping && !watch.touching {
                events.push(EngineEvent::Contact {
                    gate: watch.gate,
                    other: watch.b,
                });
            }
            if overlapping && watch.solid {
                separations.push((watch.a, watch.b));
            }
            watch.touching = overlapping;
        }

        for (a, b) in separations {
            self.separate(a, b);
        }
        events
    }

    /// Advances the timer clock and drains every timer now due, earliest first.
    pub fn advance_timers(&mut self, elapsed_ms: f64) -> Vec<EngineEvent> {
        self.clock_ms += elapsed_ms.max(0.0);

        let mut due: Vec<(f64, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= self.clock_ms)
            .map(|(id, t)| (t.due_ms, *id))
            .collect();
        due.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));

        let mut events = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(timer) = self.timers.remove(&id) {
                events.push(EngineEvent::Timer {
                    id,
                    task: timer.task,
                });
            }
        }
        events
    }

    /// Pushes `a` out of `b` along the axis of least penetration.
    fn separate(&mut self, a: EntityId, b: EntityId) {
        let Some(other) = self.bodies.get(&b).map(Body::rect) else {
            return;
        };
        let Some(body) = self.bodies.get_mut(&a) else {
            return;
        };
        let Some(hit) = body.rect().intersect(other) else {
            return;
        };

        if hit.w < hit.h {
            let dir = if body.position.x < other.center().x { -1.0 } else { 1.0 };
            body.position.x += dir * hit.w;
            body.velocity.x = 0.0;
        } else {
            let dir = if body.position.y < other.center().y { -1.0 } else { 1.0 };
            body.position.y += dir * hit.h;
            body.velocity.y = 0.0;
        }
    }

    fn watch(&mut self, a: EntityId, b: EntityId, gate: Gate, solid: bool) {
        if !self.bodies.contains_key(&a) || !self.bodies.contains_key(&b) {
            warn!(?a, ?b, ?gate, "contact watch against a missing sprite ignored");
            return;
        }
        self.watches.push(Watch {
            a,
            b,
            gate,
            solid,
            touching: false,
        });
    }

    #[cfg(test)]
    pub fn teleport(&mut self, id: EntityId, to: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = to;
        }
    }
}

impl Engine for World {
    fn create_sprite(&mut self, at: Vec2, kind: SpriteKind) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;

        let (collide_world_bounds, bounce) = match kind {
            SpriteKind::Player => (true, 0.2),
            SpriteKind::Enemy | SpriteKind::Door => (true, 1.0),
            SpriteKind::Key => (false, 0.0),
        };
        self.bodies.insert(
            id,
            Body {
                kind,
                position: at,
                velocity: Vec2::ZERO,
                size: self.sizes.of(kind),
                bounce,
                collide_world_bounds,
            },
        );
        trace!(?id, ?kind, x = at.x, y = at.y, "sprite created");
        id
    }

    fn destroy(&mut self, id: EntityId) {
        if self.bodies.remove(&id).is_some() {
            self.watches.retain(|w| w.a != id && w.b != id);
            trace!(?id, "sprite destroyed");
        }
    }

    fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn on_overlap(&mut self, a: EntityId, b: EntityId, gate: Gate) {
        self.watch(a, b, gate, false);
    }

    fn on_collide(&mut self, a: EntityId, b: EntityId, gate: Gate) {
        self.watch(a, b, gate, true);
    }

    fn schedule_once(&mut self, delay_ms: u32, task: Task) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(
            id,
            PendingTimer {
                due_ms: self.clock_ms + f64::from(delay_ms),
                task,
            },
        );
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn poll_directional_input(&self) -> Directions {
        self.input.unwrap_or_default()
    }

    fn uniform_random_int(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(lo..=hi)
    }

    fn clear_scene(&mut self) {
        trace!(
            sprites = self.bodies.len(),
            timers = self.timers.len(),
            "clearing scene"
        );
        self.bodies.clear();
        self.watches.clear();
        self.timers.clear();
    }
}

fn keep_in_bounds(body: &mut Body, world: Vec2) {
    let half = body.size / 2.0;

    if body.position.x - half.x < 0.0 {
        body.position.x = half.x;
        body.velocity.x = body.velocity.x.abs() * body.bounce;
    } else if body.position.x + half.x > world.x {
        body.position.x = world.x - half.x;
        body.velocity.x = -body.velocity.x.abs() * body.bounce;
    }

    if body.position.y - half.y < 0.0 {
        body.position.y = half.y;
        body.velocity.y = body.velocity.y.abs() * body.bounce;
    } else if body.position.y + half.y > world.y {
        body.position.y = world.y - half.y;
        body.velocity.y = -body.velocity.y.abs() * body.bounce;
    }
}
