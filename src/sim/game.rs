//! Game state machine: level lifecycle, car movement and collision resolution
//!
//! The game owns the active level (walls, flags, car, grid), the HUD and the
//! collaborators. It is the only authority on whether a proposed car move is
//! applied. Everything is driven by [`Game::refresh`] once per frame and by key
//! actions through [`Game::on_key`].

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::buffer::{CircularBuffer, Pr};
use super::camera::Camera;
use super::car::{Car, CarShot};
use super::color::Color;
use super::entities::{Disposable, Element, EntityId, EntityIds, Refreshable};
use super::interception::find_first_interception;
use super::level::{LevelGenerator, LevelParams};
use crate::audio::{Audio, AudioParams, Cue};
use crate::consts::*;
use crate::error::GameError;
use crate::persistence::RankingStore;
use crate::platform::display::HudDisplay;
use crate::platform::input::{Action, InputState, Key, KeyPhase, keys};
use crate::platform::scene::{NodeKind, Scene, SceneNode};
use crate::settings::Settings;
use crate::sim::geometry::Transform;
use crate::tuning::{Controls, Readout, Tunable, Tunables};
use crate::ui::hud::{Hud, HudEvent, LevelStatus};
use crate::{degrees_to_radians, pretty_radians, round_to};

const GRID_COLOR: u32 = 0x888888;

/// Everything needed to build a [`Game`]
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Level progression; position 0 is the first level played
    pub levels: Vec<LevelParams>,
    /// Level generation seed
    pub seed: u64,
    /// Show the welcome sequence before the first level
    pub intro: bool,
    pub tunables: Tunables,
}

impl GameConfig {
    pub fn from_settings(settings: &Settings, fallback_seed: u64) -> Self {
        Self {
            levels: super::level::generate_levels(settings.effective_level_count()),
            seed: settings.seed.unwrap_or(fallback_seed),
            intro: settings.intro,
            tunables: settings.tunables,
        }
    }
}

/// Outside world the game talks to
pub struct Collaborators {
    pub scene: Box<dyn Scene>,
    pub audio: Audio,
    pub display: Box<dyn HudDisplay>,
    pub store: Box<dyn RankingStore>,
}

pub struct Game {
    levels: Vec<LevelParams>,
    current_level: usize,
    params: Option<LevelParams>,
    /// True until the welcome sequence is over
    pristine: bool,
    pending_level: Option<usize>,
    exited: bool,

    elements: Vec<Element>,
    car: Option<Car>,
    grid: Option<EntityId>,
    camera: Camera,
    controls: Controls,
    position_history: CircularBuffer<Pr>,

    hud: Hud,
    audio: Audio,
    scene: Box<dyn Scene>,

    rng: Pcg32,
    ids: EntityIds,
    last_telemetry: f64,
}

impl Game {
    pub fn new(config: GameConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            scene,
            audio,
            display,
            store,
        } = collaborators;
        log::info!(
            "New game: {} levels, seed {}",
            config.levels.len(),
            config.seed
        );
        Self {
            levels: config.levels,
            current_level: 0,
            params: None,
            pristine: config.intro,
            pending_level: None,
            exited: false,
            elements: Vec::new(),
            car: None,
            grid: None,
            camera: Camera::default(),
            controls: Controls::new(config.tunables),
            position_history: CircularBuffer::new(POSITION_BUFFER_SIZE),
            hud: Hud::new(display, store),
            audio,
            scene,
            rng: Pcg32::seed_from_u64(config.seed),
            ids: EntityIds::default(),
            last_telemetry: f64::NEG_INFINITY,
        }
    }

    /// Register the game's key bindings
    pub fn bind_keys(input: &mut InputState) {
        let adjust = [
            (keys::CAMERA_ZOOM_UP, Tunable::CameraZoom, 1.0),
            (keys::CAMERA_ZOOM_DOWN, Tunable::CameraZoom, -1.0),
            (keys::CAMERA_HEIGHT_UP, Tunable::CameraHeight, 1.0),
            (keys::CAMERA_HEIGHT_DOWN, Tunable::CameraHeight, -1.0),
            (keys::CAMERA_DISTANCE_UP, Tunable::CameraDistance, 1.0),
            (keys::CAMERA_DISTANCE_DOWN, Tunable::CameraDistance, -1.0),
        ];
        for (key, tunable, delta) in adjust {
            input.bind(KeyPhase::Down, key, Action::AdjustControl(tunable, delta));
        }
        input.bind(KeyPhase::Down, keys::TOGGLE_CONTROLS, Action::ToggleControls);
        input.bind(KeyPhase::Down, keys::PAUSE, Action::TogglePause);
        input.bind(KeyPhase::Down, keys::EXIT, Action::Exit);
        input.bind(KeyPhase::Down, keys::YOU_LOSE, Action::ForceGameOver);
        input.bind(KeyPhase::Down, keys::STOP_CAMERA, Action::DetachCamera);
        input.bind(KeyPhase::Up, keys::STOP_CAMERA, Action::AttachCamera);
    }

    /// Start the first level, or the welcome sequence when enabled
    pub fn start(&mut self) -> Result<(), GameError> {
        self.init_level(0)
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn level_params(&self) -> Option<&LevelParams> {
        self.params.as_ref()
    }

    pub fn is_pristine(&self) -> bool {
        self.pristine
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    pub fn car(&self) -> Option<&Car> {
        self.car.as_ref()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn position_history(&self) -> &CircularBuffer<Pr> {
        &self.position_history
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut Hud {
        &mut self.hud
    }

    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    /// Build level `index` and replace the current one with it
    pub fn init_level(&mut self, index: usize) -> Result<(), GameError> {
        let params = self
            .levels
            .get(index)
            .cloned()
            .ok_or(GameError::InvalidLevel(index))?;

        if self.pristine {
            self.pending_level = Some(index);
            self.hud.welcome();
            return Ok(());
        }

        // Generate first: a failure leaves the previous level intact
        let elements = LevelGenerator::new(&mut self.rng, &mut self.ids).generate(&params)?;
        self.dispose_level();

        let car = Car::new(self.ids.next_id());
        self.scene.add(&car.scene_node());

        let grid = SceneNode {
            id: self.ids.next_id(),
            kind: NodeKind::Grid {
                size: params.level_size,
            },
            transform: Transform::default(),
            color: Color::from_hex(GRID_COLOR),
        };
        self.scene.add(&grid);
        self.grid = Some(grid.id);

        for element in &elements {
            self.scene.add(&element.scene_node());
        }
        self.elements = elements;
        self.position_history.flush();

        self.camera.reset(&car.transform, &mut self.controls);
        self.car = Some(car);
        self.audio.play_with(
            Cue::DropIn,
            AudioParams {
                wait_start: true,
                ..Cue::DropIn.default_params()
            },
        );

        self.hud.init(&params);
        self.controls.set(Tunable::CarSpeed, params.car_speed as f32);
        self.controls
            .set(Tunable::CarSteerAngle, params.car_steer_angle as f32);

        log::info!(
            "Level {} started ({} walls, {} flags, {} ms)",
            params.level_name,
            params.no_of_walls,
            params.no_of_flags,
            params.level_time
        );
        self.current_level = index;
        self.params = Some(params);
        Ok(())
    }

    fn dispose_level(&mut self) {
        if let Some(car) = self.car.take() {
            for shot in car.shots() {
                self.scene.dispose(shot.id);
            }
            self.scene.dispose(car.id);
        }
        if let Some(grid) = self.grid.take() {
            self.scene.dispose(grid);
        }
        for mut element in self.elements.drain(..) {
            element.dispose(self.scene.as_mut());
        }
    }

    /// Rotate the car around Y
    pub fn turn_car(&mut self, yaw: f32) {
        if let Some(car) = self.car.as_mut() {
            car.transform.rotate_y(yaw);
        }
    }

    /// Apply a proposed displacement, resolving walls and flags on the way.
    ///
    /// Moves leaving the play field are dropped. A wall hit destroys the wall and
    /// sends the car back to the origin; a flag hit collects the flag.
    pub fn move_car(&mut self, delta: Vec3) -> Result<(), GameError> {
        let (Some(car), Some(params)) = (self.car.as_mut(), self.params.as_ref()) else {
            return Ok(());
        };
        let candidate = car.transform.position + delta;
        if !params.is_inside(candidate.x, candidate.z) {
            return Ok(());
        }

        let mut pr = Pr {
            position: candidate,
            rotation: car.transform.rotation,
        };

        if let Some(hit) = find_first_interception(&*car, &self.elements, candidate) {
            log::debug!("Interception with {:?} {:?}", hit.target_kind, hit.target);
            let mut element = self.elements.remove(hit.target_index);
            self.scene.remove(hit.target);
            element.dispose(self.scene.as_mut());
            match element {
                Element::Wall(wall) => {
                    self.audio.play(Cue::Collision);
                    pr = Pr::default();
                    car.drop_in();
                    self.hud.wall_collision(&wall.label);
                }
                Element::Flag(_) => {
                    self.audio.play(Cue::FlagFound);
                    self.hud.found_a_flag()?;
                }
            }
        }

        let speed = self.controls.get(Tunable::CarSpeed);
        self.audio.play_with(
            Cue::CarMove,
            AudioParams {
                playback_rate: 1.0 - (5.0 - speed) / 10.0,
                ..Cue::CarMove.default_params()
            },
        );
        car.transform.position = pr.position;
        car.transform.rotation = pr.rotation;
        self.position_history.push(pr);
        Ok(())
    }

    /// Per-frame update
    pub fn refresh(&mut self, time: f64, input: &mut InputState) -> Result<(), GameError> {
        self.audio.update(time);
        self.hud.update(time);
        self.process_hud_events(input)?;

        if self.pristine || self.car.is_none() {
            return Ok(());
        }

        if self.hud.status() == Some(LevelStatus::InProgress) {
            self.drive(time, input)?;
        }

        if let Some(car) = self.car.as_mut() {
            for id in car.tick(time) {
                self.scene.dispose(id);
            }
            self.scene.update(&car.scene_node());
            for shot in car.shots() {
                self.scene.update(&shot.scene_node());
            }
            if input.is_pressed(keys::STOP_CAMERA) {
                self.camera.look_at(car.transform.position);
            } else {
                self.camera.reset(&car.transform, &mut self.controls);
            }
        }

        for element in &mut self.elements {
            element.refresh(time);
            self.scene.update(&element.scene_node());
        }

        if time - self.last_telemetry >= TELEMETRY_INTERVAL_MS {
            self.last_telemetry = time;
            self.update_telemetry();
        }
        Ok(())
    }

    fn drive(&mut self, time: f64, input: &InputState) -> Result<(), GameError> {
        let steer = degrees_to_radians(self.controls.get(Tunable::CarSteerAngle));
        let speed = self.controls.get(Tunable::CarSpeed) / 10.0;

        if input.is_pressed(keys::TURN_RIGHT) {
            if let Some(yaw) = self.car.as_ref().and_then(|c| c.steer_right(steer)) {
                self.turn_car(yaw);
            }
        }
        if input.is_pressed(keys::TURN_LEFT) {
            if let Some(yaw) = self.car.as_ref().and_then(|c| c.steer_left(steer)) {
                self.turn_car(yaw);
            }
        }
        if input.is_pressed(keys::MOVE_FORWARD) {
            if let Some(delta) = self.car.as_ref().and_then(|c| c.move_forward(speed)) {
                self.move_car(delta)?;
            }
        }
        if input.is_pressed(keys::MOVE_BACKWARD) {
            if let Some(delta) = self.car.as_ref().and_then(|c| c.move_backward(speed)) {
                self.move_car(delta)?;
            }
        }
        if input.is_pressed(keys::SHOOT) {
            let shot = self
                .car
                .as_mut()
                .and_then(|car| car.shoot(time, &mut self.ids))
                .map(CarShot::scene_node);
            if let Some(node) = shot {
                self.scene.add(&node);
                self.audio.play(Cue::Shot);
            }
        }
        Ok(())
    }

    fn update_telemetry(&mut self) {
        if let Some(car) = &self.car {
            let position = car.transform.position;
            let rotation = car.transform.rotation;
            let readouts = [
                (Readout::CarPosX, round_to(position.x, 3).to_string()),
                (Readout::CarPosY, round_to(position.y, 3).to_string()),
                (Readout::CarPosZ, round_to(position.z, 3).to_string()),
                (Readout::CarRotX, pretty_radians(rotation.x)),
                (Readout::CarRotY, pretty_radians(rotation.y)),
                (Readout::CarRotZ, pretty_radians(rotation.z)),
            ];
            for (readout, value) in readouts {
                self.controls.set_readout(readout, value);
            }
        }
        let camera = self.camera.position;
        self.controls
            .set_readout(Readout::CameraPosX, round_to(camera.x, 3).to_string());
        self.controls
            .set_readout(Readout::CameraPosY, round_to(camera.y, 3).to_string());
        self.controls
            .set_readout(Readout::CameraPosZ, round_to(camera.z, 3).to_string());
        self.controls.sync(self.hud.display_mut());
    }

    fn process_hud_events(&mut self, input: &mut InputState) -> Result<(), GameError> {
        for event in self.hud.take_events() {
            match event {
                HudEvent::Play(cue, params) => self.audio.play_with(cue, params),
                HudEvent::TimeUp => {
                    if let Some(car) = self.car.as_mut() {
                        car.fall_down();
                    }
                }
                HudEvent::LevelCompleted => self.init_level(self.current_level + 1)?,
                HudEvent::GameOver => self.init_level(0)?,
                HudEvent::WelcomeDone => {
                    self.pristine = false;
                    let level = self.pending_level.take().unwrap_or(0);
                    self.init_level(level)?;
                }
                HudEvent::AwaitKey(key) => input.wait_for_key(key),
                HudEvent::Exit => {
                    log::info!("Session ended");
                    self.exited = true;
                }
            }
        }
        Ok(())
    }

    /// Feed a key transition through the bindings and apply the resulting actions
    pub fn on_key(
        &mut self,
        input: &mut InputState,
        key: Key,
        phase: KeyPhase,
    ) -> Result<(), GameError> {
        let actions = match phase {
            KeyPhase::Down => input.key_down(key),
            KeyPhase::Up => input.key_up(key),
        };
        for action in actions {
            self.handle_action(action)?;
        }
        Ok(())
    }

    pub fn handle_action(&mut self, action: Action) -> Result<(), GameError> {
        match action {
            Action::AdjustControl(tunable, delta) => self.controls.add(tunable, delta),
            Action::ToggleControls => {
                self.controls.toggle();
                self.controls.sync(self.hud.display_mut());
            }
            Action::TogglePause => {
                let paused = self.hud.status() == Some(LevelStatus::Pause);
                self.pause(!paused);
            }
            Action::Exit => self.exit(),
            Action::ForceGameOver => self.hud.game_over(),
            Action::DetachCamera => {
                if let Some(car) = &self.car {
                    let distance = self.controls.get(Tunable::CameraDistance);
                    self.camera.detach(&car.transform, distance);
                }
            }
            Action::AttachCamera => {
                if let Some(car) = &self.car {
                    self.camera.attach(&car.transform, &mut self.controls);
                }
            }
            Action::Continue(key) => self.hud.key_released(key),
        }
        Ok(())
    }

    /// Returns whether the game is now paused
    pub fn pause(&mut self, paused: bool) -> bool {
        let paused = self.hud.pause(paused);
        log::info!("Paused: {}", paused);
        paused
    }

    /// Name typed on the game-over prompt
    pub fn submit_name(&mut self, name: &str, date: &str) {
        self.hud.submit_name(name, date);
    }

    pub fn exit(&mut self) {
        log::info!("Exit requested");
        self.hud.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingSink;
    use crate::highscores::Rank;
    use crate::persistence::MemoryRankingStore;
    use crate::platform::display::RecordingDisplay;
    use crate::platform::scene::RecordingScene;
    use crate::sim::car::CarMode;
    use crate::sim::interception::Interceptable;

    const FRAME_MS: f64 = 16.0;

    fn level(walls: u32, flags: u32, time: u32) -> LevelParams {
        LevelParams {
            level_name: "t".into(),
            level_size: 30,
            level_time: time,
            no_of_walls: walls,
            no_of_flags: flags,
            points_per_flag: 10,
            car_speed: 2,
            car_steer_angle: 3,
        }
    }

    struct Harness {
        game: Game,
        input: InputState,
        scene: RecordingScene,
        sink: RecordingSink,
        display: RecordingDisplay,
        store: MemoryRankingStore,
        now: f64,
    }

    impl Harness {
        fn new(levels: Vec<LevelParams>, intro: bool, store: MemoryRankingStore) -> Self {
            let scene = RecordingScene::default();
            let sink = RecordingSink::default();
            let display = RecordingDisplay::default();
            let config = GameConfig {
                levels,
                seed: 7,
                intro,
                tunables: Tunables::default(),
            };
            let game = Game::new(
                config,
                Collaborators {
                    scene: Box::new(scene.clone()),
                    audio: Audio::new(Box::new(sink.clone())),
                    display: Box::new(display.clone()),
                    store: Box::new(store.clone()),
                },
            );
            let mut input = InputState::new();
            Game::bind_keys(&mut input);
            Self {
                game,
                input,
                scene,
                sink,
                display,
                store,
                now: 0.0,
            }
        }

        fn started(levels: Vec<LevelParams>) -> Self {
            let mut harness = Self::new(levels, false, MemoryRankingStore::default());
            harness.game.start().expect("start");
            harness
        }

        fn run_until(&mut self, to: f64) {
            while self.now < to {
                self.now += FRAME_MS;
                self.game
                    .refresh(self.now, &mut self.input)
                    .expect("refresh");
            }
        }

        fn run_for(&mut self, ms: f64) {
            self.run_until(self.now + ms);
        }

        fn tap(&mut self, key: Key) {
            self.press(key);
            self.release(key);
        }

        fn press(&mut self, key: Key) {
            self.game
                .on_key(&mut self.input, key, KeyPhase::Down)
                .expect("key down");
        }

        fn release(&mut self, key: Key) {
            self.game
                .on_key(&mut self.input, key, KeyPhase::Up)
                .expect("key up");
        }

        fn land(&mut self) {
            for _ in 0..100 {
                if self.game.car().expect("car").mode() == CarMode::Active {
                    return;
                }
                self.run_for(FRAME_MS);
            }
            panic!("car never landed");
        }

        /// Jump the car onto the first remaining element
        fn hit_first_element(&mut self) -> EntityId {
            let target = &self.game.elements()[0];
            let id = target.id();
            let car = self.game.car().expect("car").transform.position;
            let mut delta = target.position() - car;
            delta.y = 0.0;
            self.game.move_car(delta).expect("move");
            id
        }

        fn car_position(&self) -> Vec3 {
            self.game.car().expect("car").transform.position
        }
    }

    #[test]
    fn test_start_builds_level() {
        let h = Harness::started(vec![level(3, 2, 20_000)]);
        assert_eq!(h.game.elements().len(), 5);
        let car = h.game.car().expect("car");
        assert_eq!(car.mode(), CarMode::Descending);
        assert!(h.scene.contains(car.id));
        assert!(
            h.scene
                .nodes()
                .iter()
                .any(|n| n.kind == NodeKind::Grid { size: 30 })
        );
        assert_eq!(h.game.controls().get(Tunable::CarSpeed), 2.0);
        assert_eq!(h.game.controls().get(Tunable::CarSteerAngle), 3.0);
        assert_eq!(h.game.hud().status(), Some(LevelStatus::InProgress));
        assert!(
            h.sink
                .last_params(Cue::DropIn)
                .is_some_and(|p| p.wait_start)
        );
    }

    #[test]
    fn test_invalid_level() {
        let mut h = Harness::started(vec![level(0, 1, 20_000)]);
        assert_eq!(h.game.init_level(5), Err(GameError::InvalidLevel(5)));
        assert_eq!(h.game.current_level(), 0);
    }

    #[test]
    fn test_failed_generation_keeps_previous_level() {
        let mut crowded = level(0, 50, 20_000);
        crowded.level_size = 2;
        let mut h = Harness::started(vec![level(0, 1, 20_000), crowded]);
        let car_id = h.game.car().expect("car").id;
        assert!(matches!(
            h.game.init_level(1),
            Err(GameError::PlacementExhausted { .. })
        ));
        assert_eq!(h.game.current_level(), 0);
        assert_eq!(h.game.car().expect("car").id, car_id);
        assert!(h.scene.contains(car_id));
    }

    #[test]
    fn test_collecting_all_flags_completes_once() {
        let mut h = Harness::started(vec![level(0, 2, 20_000), level(0, 2, 20_000)]);
        h.land();

        let first = h.hit_first_element();
        assert!(!h.scene.contains(first));
        assert!(h.scene.disposed().contains(&first));
        assert_eq!(h.game.hud().found_flags(), 1);
        assert_eq!(h.game.hud().total_score(), 10);

        h.hit_first_element();
        assert!(h.game.elements().is_empty());
        assert_eq!(h.game.hud().status(), Some(LevelStatus::YouWin));
        let remaining = h.game.hud().remaining_time();
        let bonus = ((remaining - 10_000.0) / 1000.0).floor() as u32;
        assert_eq!(h.game.hud().total_score(), 20 + bonus);

        h.game.hud_mut().level_completed();
        h.game.handle_action(Action::ForceGameOver).expect("action");
        assert_eq!(h.game.hud().total_score(), 20 + bonus);

        h.run_for(8000.0);
        assert_eq!(h.game.current_level(), 1);
        assert_eq!(h.sink.count(Cue::LevelCompleted), 1);
        assert_eq!(h.game.hud().status(), Some(LevelStatus::InProgress));
        assert_eq!(h.game.hud().found_flags(), 0);
        assert_eq!(h.game.hud().total_score(), 20 + bonus);
        assert_eq!(h.game.elements().len(), 2);
    }

    #[test]
    fn test_wall_collision_resets_car() {
        let mut h = Harness::started(vec![level(1, 0, 20_000)]);
        h.land();
        h.press(keys::TURN_LEFT);
        h.run_for(FRAME_MS * 5.0);
        h.release(keys::TURN_LEFT);

        let wall = h.hit_first_element();
        assert!(h.game.elements().is_empty());
        assert!(h.scene.disposed().contains(&wall));
        let car = h.game.car().expect("car");
        assert_eq!(car.mode(), CarMode::Descending);
        assert_eq!(car.transform.position, Vec3::ZERO);
        assert_eq!(car.transform.rotation, Vec3::ZERO);
        assert_eq!(h.sink.count(Cue::Collision), 1);
        assert_eq!(h.game.hud().collisions(), 1);

        h.run_for(FRAME_MS);
        assert!(h.display.showed("collision"));
        // Descending again: the drop-in restarted from the top
        assert!(h.car_position().y > 10.0);
    }

    #[test]
    fn test_move_outside_field_is_ignored() {
        let mut h = Harness::started(vec![level(0, 0, 20_000)]);
        h.land();
        let before = h.car_position();
        h.game.move_car(Vec3::new(15.0, 0.0, 0.0)).expect("move");
        assert_eq!(h.car_position(), before);
        assert!(h.game.position_history().is_empty());

        h.game.move_car(Vec3::new(14.0, 0.0, 0.0)).expect("move");
        assert_eq!(h.car_position().x, 14.0);
        assert_eq!(h.game.position_history().len(), 1);
    }

    #[test]
    fn test_driving_and_pause() {
        let mut h = Harness::started(vec![level(0, 0, 20_000)]);
        h.land();

        h.tap(keys::PAUSE);
        assert_eq!(h.game.hud().status(), Some(LevelStatus::Pause));
        let frozen = h.game.hud().remaining_time();
        h.press(keys::MOVE_FORWARD);
        h.run_for(1000.0);
        assert_eq!(h.car_position(), Vec3::ZERO);
        assert_eq!(h.game.hud().remaining_time(), frozen);

        h.tap(keys::PAUSE);
        assert_eq!(h.game.hud().status(), Some(LevelStatus::InProgress));
        h.run_for(FRAME_MS * 10.0);
        h.release(keys::MOVE_FORWARD);

        let position = h.car_position();
        assert!(position.z < -1.0 && position.z > -15.0);
        assert!(position.x.abs() < 1e-4);
        assert_eq!(h.game.position_history().len(), 10);
        let rate = h.sink.last_params(Cue::CarMove).expect("move cue").playback_rate;
        assert!((rate - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_shots_expire_and_are_disposed() {
        let mut h = Harness::started(vec![level(0, 0, 20_000)]);
        h.land();
        h.press(keys::SHOOT);
        h.run_for(2000.0);
        h.release(keys::SHOOT);
        let shots = h.game.car().expect("car").shots().len();
        assert!(shots > 0 && shots <= MAX_SHOTS);
        assert!(h.scene.nodes().iter().any(|n| n.kind == NodeKind::Shot));
        assert!(h.sink.count(Cue::Shot) > 0);

        h.run_for(1500.0);
        assert!(h.game.car().expect("car").shots().is_empty());
        assert!(!h.scene.nodes().iter().any(|n| n.kind == NodeKind::Shot));
    }

    #[test]
    fn test_timeout_with_full_board() {
        let ranks = (1..=10).map(|i| Rank::new("p", i * 100, "9", "d")).collect();
        let store = MemoryRankingStore::with_ranks(ranks);
        let before = store.snapshot();
        let mut h = Harness::new(vec![level(0, 1, 1000)], false, store);
        h.game.start().expect("start");

        h.run_until(1500.0);
        assert_eq!(h.game.hud().status(), Some(LevelStatus::YouLose));
        let car = h.game.car().expect("car");
        assert_eq!(car.mode(), CarMode::Falling);
        assert!(car.scale() < 1.0);

        h.run_until(15_000.0);
        assert_eq!(h.input.awaiting(), Some(Key::Enter));
        assert_eq!(h.display.name_prompts(), 0);
        assert_eq!(h.sink.count(Cue::LowScore), 1);
        assert_eq!(h.sink.count(Cue::HiScore), 0);
        assert_eq!(h.display.ranking().len(), RANKING_SIZE);

        h.tap(Key::Enter);
        h.run_for(500.0);
        assert_eq!(h.input.awaiting(), None);
        assert_eq!(h.store.snapshot(), before);
        assert_eq!(h.game.hud().status(), Some(LevelStatus::InProgress));
        assert_eq!(h.game.hud().total_score(), 0);
        assert_eq!(h.game.car().expect("car").mode(), CarMode::Descending);
    }

    #[test]
    fn test_force_game_over_records_qualifying_score() {
        let mut h = Harness::started(vec![level(0, 2, 20_000)]);
        h.land();
        h.hit_first_element();
        h.tap(keys::YOU_LOSE);
        h.run_for(10_000.0);
        assert!(h.game.hud().is_awaiting_name());
        assert_eq!(h.display.name_prompts(), 1);

        h.game.submit_name("  ada  ", "2024-01-01");
        let board = h.store.snapshot();
        assert_eq!(board.len(), 1);
        assert_eq!(board.ranking[0].name, "ada");
        assert_eq!(board.ranking[0].score, 10);
        assert_eq!(board.ranking[0].level_name, "t");
        h.run_for(FRAME_MS);
        assert_eq!(h.sink.count(Cue::HighestScore), 1);
    }

    #[test]
    fn test_welcome_runs_before_first_level() {
        let mut h = Harness::new(vec![level(0, 1, 20_000)], true, MemoryRankingStore::default());
        h.game.start().expect("start");
        h.run_until(3000.0);
        assert!(h.game.is_pristine());
        assert!(h.game.car().is_none());
        assert_eq!(h.input.awaiting(), Some(Key::Enter));

        // Other bindings are suspended while waiting
        h.tap(keys::TOGGLE_CONTROLS);
        assert!(!h.game.controls().is_visible());

        h.tap(Key::Enter);
        h.run_for(3000.0);
        assert!(!h.game.is_pristine());
        assert!(h.game.car().is_some());
        assert_eq!(h.game.hud().status(), Some(LevelStatus::InProgress));
        let welcome = h.sink.last_params(Cue::Welcome).expect("welcome cue");
        assert_eq!(welcome.start_in_ms, 200.0);
    }

    #[test]
    fn test_camera_keys() {
        let mut h = Harness::started(vec![level(0, 0, 20_000)]);
        h.tap(keys::CAMERA_ZOOM_UP);
        assert_eq!(h.game.controls().get(Tunable::CameraZoom), 6.0);
        h.run_for(FRAME_MS);
        assert_eq!(h.game.controls().get(Tunable::CameraHeight), 6.0);
        assert_eq!(h.game.controls().get(Tunable::CameraDistance), 18.0);

        h.press(keys::STOP_CAMERA);
        assert!(!h.game.camera().is_attached());
        h.run_for(FRAME_MS);
        assert_eq!(h.game.camera().target, h.car_position());
        h.release(keys::STOP_CAMERA);
        assert!(h.game.camera().is_attached());

        h.tap(keys::TOGGLE_CONTROLS);
        assert!(h.display.controls_visible());
        h.run_for(500.0);
        assert!(h.display.control("carPosY").is_some());
        assert!(h.display.control("cameraPosZ").is_some());
    }

    #[test]
    fn test_exit_ends_session() {
        let mut h = Harness::started(vec![level(0, 1, 20_000)]);
        h.tap(keys::EXIT);
        h.run_for(2000.0);
        assert!(h.game.is_exited());
        assert!(h.display.showed("bye"));
    }

    #[test]
    fn test_no_driving_after_exit() {
        let mut h = Harness::started(vec![level(0, 1, 20_000)]);
        h.land();
        h.press(keys::MOVE_FORWARD);
        h.tap(keys::EXIT);
        assert_eq!(h.game.hud().status(), None);
        h.run_for(1000.0);
        h.release(keys::MOVE_FORWARD);
        assert_eq!(h.car_position(), Vec3::ZERO);
        assert!(h.game.position_history().is_empty());
        assert_eq!(h.sink.count(Cue::CarMove), 0);
    }

    #[test]
    fn test_first_frame_late_does_not_eat_level_time() {
        let mut h = Harness::started(vec![level(0, 1, 20_000)]);
        h.now = 5000.0;
        h.run_for(FRAME_MS);
        assert_eq!(h.game.hud().remaining_time(), 20_000.0);
        h.run_for(100.0);
        assert_eq!(h.game.hud().remaining_time(), 19_900.0);
    }
}
