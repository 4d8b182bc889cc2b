//! Spectre entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, HtmlInputElement};

    use spectre::audio::{Audio, WebAudioSink};
    use spectre::highscores::now_string;
    use spectre::persistence::LocalRankingStore;
    use spectre::platform::display::{CenterId, HudDisplay, HudField, RankRow};
    use spectre::platform::input::{InputState, Key, KeyPhase};
    use spectre::platform::scene::{NodeKind, Scene, SceneNode};
    use spectre::sim::color::Color;
    use spectre::sim::entities::EntityId;
    use spectre::sim::{Collaborators, Game, GameConfig};
    use spectre::{GameError, Settings};

    const CENTER_ID: &str = "center";
    const CONTROLS_ID: &str = "controls";
    const NAME_INPUT_ID: &str = "name-input";
    const CURRENT_RANK_ID: &str = "rank-current";
    const CANVAS_ID: &str = "canvas";

    fn document() -> Result<Document, GameError> {
        web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GameError::MissingHudAnchor("document".into()))
    }

    /// HUD primitives over the page's DOM anchors
    struct DomHud {
        document: Document,
        center: Element,
        controls: Element,
    }

    impl DomHud {
        /// Fails when a required anchor is missing from the page
        fn new() -> Result<Self, GameError> {
            let document = document()?;
            let anchor = |id: &str| {
                document
                    .get_element_by_id(id)
                    .ok_or_else(|| GameError::MissingHudAnchor(id.to_string()))
            };
            for field in HudField::ALL {
                anchor(field.element_id())?;
            }
            let center = anchor(CENTER_ID)?;
            let controls = anchor(CONTROLS_ID)?;
            Ok(Self {
                document,
                center,
                controls,
            })
        }

        fn center_element(&self, id: CenterId, font_size: u32) -> Option<HtmlElement> {
            let element_id = id.element_id();
            let el = match self.document.get_element_by_id(&element_id) {
                Some(el) => el,
                None => {
                    let el = self.document.create_element("div").ok()?;
                    el.set_id(&element_id);
                    self.center.append_child(&el).ok()?;
                    el
                }
            };
            let el: HtmlElement = el.dyn_into().ok()?;
            let style = el.style();
            style.set_property("font-size", &format!("{}px", font_size)).ok();
            style.set_property("white-space", "pre").ok();
            Some(el)
        }
    }

    impl HudDisplay for DomHud {
        fn set_field(&mut self, field: HudField, text: &str) {
            match self.document.get_element_by_id(field.element_id()) {
                Some(el) => el.set_text_content(Some(text)),
                None => log::warn!("HUD field {} vanished", field.element_id()),
            }
        }

        fn append_center_text(&mut self, id: CenterId, font_size: u32, text: &str) {
            if let Some(el) = self.center_element(id, font_size) {
                let current = el.text_content().unwrap_or_default();
                el.set_text_content(Some(&(current + text)));
            }
        }

        fn set_center_html(&mut self, id: CenterId, font_size: u32, html: &str) {
            if let Some(el) = self.center_element(id, font_size) {
                el.set_inner_html(html);
            }
        }

        fn set_center_visible(&mut self, id: CenterId, visible: bool) {
            let el = self
                .document
                .get_element_by_id(&id.element_id())
                .and_then(|el| el.dyn_into::<HtmlElement>().ok());
            if let Some(el) = el {
                let value = if visible { "visible" } else { "hidden" };
                el.style().set_property("visibility", value).ok();
            }
        }

        fn remove_center(&mut self, id: CenterId) {
            if let Some(el) = self.document.get_element_by_id(&id.element_id()) {
                el.remove();
            }
        }

        fn clear_center(&mut self) {
            self.center.set_inner_html("");
        }

        fn show_name_prompt(&mut self) {
            let Ok(el) = self.document.create_element("input") else {
                return;
            };
            el.set_id(NAME_INPUT_ID);
            el.set_attribute("maxlength", "12").ok();
            el.set_attribute("placeholder", "your name").ok();
            if self.center.append_child(&el).is_ok() {
                if let Ok(input) = el.dyn_into::<HtmlInputElement>() {
                    input.focus().ok();
                }
            }
        }

        fn show_ranking(&mut self, id: CenterId, rows: &[RankRow]) {
            let mut html = String::from("<table>");
            for row in rows {
                let attr = if row.current {
                    format!(" id=\"{}\"", CURRENT_RANK_ID)
                } else {
                    String::new()
                };
                html.push_str(&format!(
                    "<tr{}><td>{}</td><td>{}</td><td>level {}</td><td>{}</td></tr>",
                    attr, row.position, row.name, row.level_name, row.score
                ));
            }
            html.push_str("</table>");
            if let Some(el) = self.center_element(id, 24) {
                el.set_inner_html(&html);
            }
        }

        fn set_rank_highlight(&mut self, color: Color) {
            if let Some(el) = self.document.get_element_by_id(CURRENT_RANK_ID) {
                el.set_attribute("style", &format!("color: {}", color.hex_string()))
                    .ok();
            }
        }

        fn set_controls_visible(&mut self, visible: bool) {
            let value = if visible { "" } else { "display: none" };
            self.controls.set_attribute("style", value).ok();
        }

        fn set_control(&mut self, name: &str, value: &str) {
            let element_id = format!("control-{}", name);
            let el = match self.document.get_element_by_id(&element_id) {
                Some(el) => el,
                None => {
                    let Ok(el) = self.document.create_element("div") else {
                        return;
                    };
                    el.set_id(&element_id);
                    if self.controls.append_child(&el).is_err() {
                        return;
                    }
                    el
                }
            };
            el.set_text_content(Some(&format!("{}: {}", name, value)));
        }
    }

    /// Top-down 2D view of the scene nodes
    #[derive(Clone)]
    struct CanvasScene {
        nodes: Rc<RefCell<Vec<SceneNode>>>,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasScene {
        fn new() -> Result<Self, GameError> {
            let missing = || GameError::MissingHudAnchor(CANVAS_ID.into());
            let canvas: HtmlCanvasElement = document()?
                .get_element_by_id(CANVAS_ID)
                .ok_or_else(missing)?
                .dyn_into()
                .map_err(|_| missing())?;
            let ctx: CanvasRenderingContext2d = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into().ok())
                .ok_or_else(missing)?;
            Ok(Self {
                nodes: Rc::new(RefCell::new(Vec::new())),
                canvas,
                ctx,
            })
        }

        fn draw(&self) {
            let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#000000");
            ctx.fill_rect(0.0, 0.0, w, h);

            let nodes = self.nodes.borrow();
            let field = nodes
                .iter()
                .find_map(|n| match n.kind {
                    NodeKind::Grid { size } => Some(size as f64),
                    _ => None,
                })
                .unwrap_or(30.0);
            let scale = w.min(h) / field;

            for node in nodes.iter() {
                let p = node.transform.position;
                ctx.save();
                ctx.translate(w / 2.0 + p.x as f64 * scale, h / 2.0 + p.z as f64 * scale)
                    .ok();
                ctx.rotate(-node.transform.rotation.y as f64).ok();
                ctx.set_fill_style_str(&node.color.hex_string());
                ctx.set_stroke_style_str(&node.color.hex_string());
                match &node.kind {
                    NodeKind::Grid { size } => {
                        let half = *size as f64 * scale / 2.0;
                        ctx.stroke_rect(-half, -half, half * 2.0, half * 2.0);
                    }
                    NodeKind::Wall {
                        width,
                        label,
                        label_color,
                        ..
                    } => {
                        let len = *width as f64 * scale;
                        ctx.fill_rect(-len / 2.0, -scale * 0.15, len, scale * 0.3);
                        ctx.set_fill_style_str(&label_color.hex_string());
                        ctx.fill_text(label, -len / 2.0, -scale * 0.2).ok();
                    }
                    NodeKind::Flag { size, stem_color } => {
                        ctx.set_stroke_style_str(&stem_color.hex_string());
                        ctx.stroke_rect(-1.0, -1.0, 2.0, 2.0);
                        ctx.begin_path();
                        ctx.arc(0.0, 0.0, *size as f64 * scale / 2.0, 0.0, std::f64::consts::TAU)
                            .ok();
                        ctx.fill();
                    }
                    NodeKind::Car { scale: s } => {
                        let (cw, cl) = (scale * *s as f64, 2.0 * scale * *s as f64);
                        ctx.fill_rect(-cw / 2.0, -cl / 2.0, cw, cl);
                    }
                    NodeKind::Shot => ctx.fill_rect(-2.0, -2.0, 4.0, 4.0),
                }
                ctx.restore();
            }
        }
    }

    impl Scene for CanvasScene {
        fn add(&mut self, node: &SceneNode) {
            let mut nodes = self.nodes.borrow_mut();
            nodes.retain(|n| n.id != node.id);
            nodes.push(node.clone());
        }

        fn update(&mut self, node: &SceneNode) {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(existing) = nodes.iter_mut().find(|n| n.id == node.id) {
                *existing = node.clone();
            }
        }

        fn remove(&mut self, id: EntityId) {
            self.nodes.borrow_mut().retain(|n| n.id != id);
        }

        fn dispose(&mut self, id: EntityId) {
            self.remove(id);
        }
    }

    /// Everything the callbacks share
    struct App {
        game: Game,
        input: InputState,
        scene: CanvasScene,
        settings: Settings,
    }

    impl App {
        fn frame(&mut self, time: f64) -> Result<(), GameError> {
            self.game.refresh(time, &mut self.input)?;
            self.scene.draw();
            Ok(())
        }

        fn key(&mut self, code: &str, phase: KeyPhase) -> Result<(), GameError> {
            let Some(key) = Key::from_code(code) else {
                return Ok(());
            };
            self.game.on_key(&mut self.input, key, phase)
        }

        /// Take the typed name out of the prompt, if one is shown
        fn submit_name(&mut self) -> bool {
            let input = document()
                .ok()
                .and_then(|d| d.get_element_by_id(NAME_INPUT_ID))
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
            let Some(input) = input else {
                return false;
            };
            let name = input.value();
            input.remove();
            self.game.submit_name(&name, &now_string());
            true
        }

        fn save_settings(&mut self) {
            self.settings.tunables = self.game.controls().values();
            self.settings.save();
        }
    }

    pub fn run() -> Result<(), GameError> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Spectre starting...");

        let settings = Settings::load();
        let display = DomHud::new()?;
        let scene = CanvasScene::new()?;

        let mut audio = Audio::new(Box::new(WebAudioSink::new()));
        audio.apply_settings(&settings);

        let config = GameConfig::from_settings(&settings, js_sys::Date::now() as u64);
        let game = Game::new(
            config,
            Collaborators {
                scene: Box::new(scene.clone()),
                audio,
                display: Box::new(display),
                store: Box::new(LocalRankingStore::new()),
            },
        );
        let mut input = InputState::new();
        Game::bind_keys(&mut input);

        let app = Rc::new(RefCell::new(App {
            game,
            input,
            scene,
            settings,
        }));
        app.borrow_mut().game.start()?;

        setup_keyboard(app.clone())?;
        setup_blur(app.clone())?;
        request_animation_frame(app);

        log::info!("Spectre running!");
        Ok(())
    }

    fn stop(app: &Rc<RefCell<App>>, err: GameError) {
        log::error!("Game stopped: {}", err);
        app.borrow_mut().save_settings();
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) -> Result<(), GameError> {
        let window = web_sys::window().ok_or_else(|| GameError::MissingHudAnchor("window".into()))?;

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let code = event.code();
                let mut a = app.borrow_mut();
                let result = if Key::from_code(&code) == Some(Key::Enter) && a.submit_name() {
                    Ok(())
                } else {
                    a.key(&code, KeyPhase::Down)
                };
                drop(a);
                if let Err(e) = result {
                    stop(&app, e);
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let result = app.borrow_mut().key(&event.code(), KeyPhase::Up);
                if let Err(e) = result {
                    stop(&app, e);
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        Ok(())
    }

    /// Held keys are lost when the window loses focus
    fn setup_blur(app: Rc<RefCell<App>>) -> Result<(), GameError> {
        let window = web_sys::window().ok_or_else(|| GameError::MissingHudAnchor("window".into()))?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
            app.borrow_mut().input.release_all();
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let result = app.borrow_mut().frame(time);
        match result {
            Err(e) if e.is_fatal() => {
                stop(&app, e);
                return;
            }
            Err(e) => log::warn!("{}", e),
            Ok(()) => {}
        }
        if app.borrow().game.is_exited() {
            app.borrow_mut().save_settings();
            log::info!("Bye");
            return;
        }
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Spectre failed to start: {}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Spectre (native) starting...");
    log::info!("Native mode is headless - serve the wasm build for the playable version");

    if let Err(e) = headless::run() {
        log::error!("Headless run failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drives a few seconds of play against the recording collaborators
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use spectre::audio::{Audio, RecordingSink};
    use spectre::persistence::MemoryRankingStore;
    use spectre::platform::display::{HudField, RecordingDisplay};
    use spectre::platform::input::{InputState, KeyPhase, keys};
    use spectre::platform::scene::RecordingScene;
    use spectre::sim::{Collaborators, Game, GameConfig};
    use spectre::{GameError, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    pub fn run() -> Result<(), GameError> {
        let settings = Settings {
            intro: false,
            ..Settings::load()
        };
        let config = GameConfig::from_settings(&settings, 42);
        let scene = RecordingScene::default();
        let sink = RecordingSink::default();
        let display = RecordingDisplay::default();

        let mut game = Game::new(
            config,
            Collaborators {
                scene: Box::new(scene.clone()),
                audio: Audio::new(Box::new(sink.clone())),
                display: Box::new(display.clone()),
                store: Box::new(MemoryRankingStore::default()),
            },
        );
        let mut input = InputState::new();
        Game::bind_keys(&mut input);
        game.start()?;

        let mut time = 0.0;
        let mut frame = |game: &mut Game, input: &mut InputState, frames: u32| {
            for _ in 0..frames {
                time += FRAME_MS;
                game.refresh(time, input)?;
            }
            Ok::<(), GameError>(())
        };

        // Land, then drive in a circle while shooting
        frame(&mut game, &mut input, 60)?;
        game.on_key(&mut input, keys::MOVE_FORWARD, KeyPhase::Down)?;
        game.on_key(&mut input, keys::TURN_LEFT, KeyPhase::Down)?;
        game.on_key(&mut input, keys::SHOOT, KeyPhase::Down)?;
        frame(&mut game, &mut input, 180)?;
        game.on_key(&mut input, keys::SHOOT, KeyPhase::Up)?;
        game.on_key(&mut input, keys::TURN_LEFT, KeyPhase::Up)?;
        game.on_key(&mut input, keys::MOVE_FORWARD, KeyPhase::Up)?;
        frame(&mut game, &mut input, 60)?;

        if let Some(car) = game.car() {
            log::info!("Car at {:?}", car.transform.position);
        }
        for field in HudField::ALL {
            log::info!("{}: {}", field.element_id(), display.field(field).unwrap_or_default());
        }
        log::info!(
            "{} scene nodes, {} cues played, {} positions recorded",
            scene.nodes().len(),
            sink.cues().len(),
            game.position_history().len()
        );
        Ok(())
    }
}
