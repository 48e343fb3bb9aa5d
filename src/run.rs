use tracing::{debug, info, trace};

use crate::engine::{Engine, EngineEvent};
use crate::level::{Level, LevelController, LevelTuning};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneId {
    Menu,
    Level1,
    Level2,
    GameOver,
    Win,
}

impl SceneId {
    /// The playable level behind this scene, if it has one.
    pub fn level(self) -> Option<Level> {
        match self {
            SceneId::Level1 => Some(Level::One),
            SceneId::Level2 => Some(Level::Two),
            SceneId::Menu | SceneId::GameOver | SceneId::Win => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Start button on the menu.
    Start,
    DoorWithKey,
    DoorLocked,
    EnemyContact,
    /// Click-to-continue on an end screen.
    Confirm,
}

/// Score carried across scene transitions for one play-through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunContext {
    pub score: u32,
}

/// Scene transition table. `None` means the trigger leaves the scene as is.
pub fn next_scene(from: SceneId, trigger: Trigger) -> Option<SceneId> {
    match (from, trigger) {
        (SceneId::Menu, Trigger::Start) => Some(SceneId::Level1),
        (SceneId::Level1, Trigger::DoorWithKey) => Some(SceneId::Level2),
        (SceneId::Level2, Trigger::DoorWithKey) => Some(SceneId::Win),
        (SceneId::Level1 | SceneId::Level2, Trigger::EnemyContact) => Some(SceneId::GameOver),
        (SceneId::GameOver | SceneId::Win, Trigger::Confirm) => Some(SceneId::Menu),
        _ => None,
    }
}

/// Menu, two levels and the end screens, with the score threaded between them.
pub struct Game {
    scene: SceneId,
    run: RunContext,
    controller: Option<LevelController>,
    tuning: LevelTuning,
}

impl Game {
    pub fn new(tuning: LevelTuning) -> Self {
        Self {
            scene: SceneId::Menu,
            run: RunContext::default(),
            controller: None,
            tuning,
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn score(&self) -> u32 {
        self.controller
            .as_ref()
            .map_or(self.run.score, LevelController::score)
    }

    pub fn message(&self) -> Option<&str> {
        self.controller.as_ref().and_then(LevelController::message)
    }

    pub fn has_key(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|c| c.objective().has_key)
    }

    /// Start on the menu, continue on an end screen. Returns whether the
    /// scene changed.
    pub fn confirm<E: Engine>(&mut self, engine: &mut E) -> bool {
        let trigger = if self.scene == SceneId::Menu {
            Trigger::Start
        } else {
            Trigger::Confirm
        };
        self.apply(trigger, engine)
    }

    /// One gameplay frame: steering, then the world step, then its events.
    pub fn frame(&mut self, world: &mut World, dt: f32) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        controller.update(world);
        let events = world.step(dt);
        self.dispatch(events, world);
    }

    fn dispatch<E: Engine>(&mut self, events: Vec<EngineEvent>, engine: &mut E) {
        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            let Some(controller) = self.controller.as_mut() else {
                break;
            };
            let Some(trigger) = controller.handle(event, engine) else {
                continue;
            };
            if self.apply(trigger, engine) {
                let dropped = events.len();
                if dropped > 0 {
                    debug!(dropped, "events of the previous scene discarded");
                }
                break;
            }
        }
    }

    fn apply<E: Engine>(&mut self, trigger: Trigger, engine: &mut E) -> bool {
        match next_scene(self.scene, trigger) {
            Some(to) => {
                self.transition(to, engine);
                true
            }
            None => {
                trace!(scene = ?self.scene, ?trigger, "trigger has no transition");
                false
            }
        }
    }

    fn transition<E: Engine>(&mut self, to: SceneId, engine: &mut E) {
        let from = self.scene;

        if let Some(controller) = self.controller.take() {
            self.run.score = controller.on_exit(engine).score;
        }
        engine.clear_scene();

        if from == SceneId::Menu || to == SceneId::Menu {
            self.run = RunContext::default();
        }
        if let Some(level) = to.level() {
            self.controller = Some(LevelController::on_entry(
                level,
                self.run.score,
                self.tuning,
                engine,
            ));
        }
        self.scene = to;
        info!(?from, ?to, score = self.run.score, "scene transition");
    }
}
