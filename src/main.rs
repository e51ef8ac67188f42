//! Data Dash entry point
//!
//! Web: canvas frontend driving the simulation from requestAnimationFrame.
//! Native: headless autopilot run for checking level balance.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlMeterElement, KeyboardEvent, TouchEvent};

    use data_dash::Rect;
    use data_dash::assets::{AssetError, AssetManifest, Sprites, load_sprites};
    use data_dash::audio::AudioManager;
    use data_dash::consts::*;
    use data_dash::input::{InputState, Key};
    use data_dash::platform::{LogSound, route_events};
    use data_dash::render::{Canvas, Sprite, draw_frame};
    use data_dash::secs_to_ms;
    use data_dash::settings::Settings;
    use data_dash::sim::{FrameStepper, GameState, Screen, Viewport};
    use data_dash::tuning::Tuning;
    use data_dash::ui::Hud;

    /// Joystick knob travel in CSS pixels
    const JOYSTICK_TRAVEL: f32 = 40.0;

    const OVERLAYS: [(Screen, &str); 4] = [
        (Screen::Intro, "intro-screen"),
        (Screen::LevelTransition, "level-transition"),
        (Screen::Win, "win-screen"),
        (Screen::GameOver, "game-over"),
    ];

    fn js_err(e: JsValue) -> AssetError {
        AssetError::Js(format!("{:?}", e))
    }

    /// `Canvas` on a 2D context
    struct Canvas2d<'a> {
        ctx: &'a CanvasRenderingContext2d,
        sprites: &'a Sprites,
    }

    impl Canvas for Canvas2d<'_> {
        fn clear(&mut self, width: f32, height: f32) {
            self.ctx.clear_rect(0.0, 0.0, width as f64, height as f64);
        }

        fn set_alpha(&mut self, alpha: f32) {
            self.ctx.set_global_alpha(alpha as f64);
        }

        fn fill_rect(&mut self, rect: Rect, color: &str) {
            self.ctx.set_fill_style_str(color);
            self.ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
        }

        fn stroke_rect(&mut self, rect: Rect, color: &str, line_width: f32) {
            self.ctx.set_stroke_style_str(color);
            self.ctx.set_line_width(line_width as f64);
            self.ctx.stroke_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
        }

        fn line(&mut self, from: Vec2, to: Vec2, color: &str, line_width: f32) {
            self.ctx.set_stroke_style_str(color);
            self.ctx.set_line_width(line_width as f64);
            self.ctx.begin_path();
            self.ctx.move_to(from.x as f64, from.y as f64);
            self.ctx.line_to(to.x as f64, to.y as f64);
            self.ctx.stroke();
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
            self.ctx.set_fill_style_str(color);
            self.ctx.begin_path();
            if self
                .ctx
                .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, std::f64::consts::TAU)
                .is_ok()
            {
                self.ctx.fill();
            }
        }

        fn stroke_circle(&mut self, center: Vec2, radius: f32, color: &str, line_width: f32) {
            self.ctx.set_stroke_style_str(color);
            self.ctx.set_line_width(line_width as f64);
            self.ctx.begin_path();
            if self
                .ctx
                .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, std::f64::consts::TAU)
                .is_ok()
            {
                self.ctx.stroke();
            }
        }

        fn draw_sprite(&mut self, sprite: Sprite, rect: Rect) -> bool {
            let image = match sprite {
                Sprite::Player => self.sprites.player.as_ref(),
                Sprite::Rival(i) => self.sprites.rivals.get(i).and_then(Option::as_ref),
            };
            let Some(image) = image else {
                return false;
            };
            self.ctx
                .draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    rect.x as f64,
                    rect.y as f64,
                    rect.w as f64,
                    rect.h as f64,
                )
                .is_ok()
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        hud: Hud,
        input: InputState,
        audio: AudioManager,
        settings: Settings,
        sprites: Sprites,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        stepper: FrameStepper,
        last_time: f64,
        focused: bool,
    }

    impl Game {
        /// Run simulation ticks and hand their events to the HUD and audio
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            let input = &mut self.input;
            self.stepper.advance(&mut self.state, dt, || input.tick_input());

            let events = self.state.drain_events();
            route_events(&events, &mut self.audio, &mut self.hud);
            self.hud.update(secs_to_ms(dt));
        }

        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
            self.audio.apply_settings(&self.settings, focused);
        }

        /// Flip mute and persist the preference
        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.audio.apply_settings(&self.settings, self.focused);
            self.settings.save();
            log::info!("Sound {}", if self.settings.muted { "muted" } else { "on" });
        }

        fn render(&self) {
            let mut canvas = Canvas2d {
                ctx: &self.ctx,
                sprites: &self.sprites,
            };
            draw_frame(&mut canvas, &self.state, &self.settings);
        }

        /// Mirror the HUD model into the DOM
        fn update_hud(&self, document: &Document) {
            let hud = &self.hud;
            set_text(document, "hud-level", &hud.level.to_string());
            set_text(document, "hud-objective", &hud.objective);
            set_text(document, "hud-rivals", &hud.rivals_text());
            set_text(document, "hud-approval", &format!("{}%", hud.approval));
            if let Some(meter) = document
                .get_element_by_id("approval-meter")
                .and_then(|el| el.dyn_into::<HtmlMeterElement>().ok())
            {
                meter.set_value(f64::from(hud.approval_fraction()));
            }

            for (screen, id) in OVERLAYS {
                set_hidden(document, id, hud.overlay != Some(screen));
            }
            if let Some(el) = document.get_element_by_id("live-indicator") {
                let _ = el.class_list().toggle_with_force("on", hud.is_live());
            }
            set_hidden(document, "touch-controls", !self.state.viewport.is_narrow());

            if let Some(feed) = document.get_element_by_id("feedback-feed") {
                feed.set_inner_html("");
                for msg in hud.feed() {
                    let Ok(item) = document.create_element("div") else {
                        continue;
                    };
                    let class = if msg.negative {
                        "feedback negative"
                    } else {
                        "feedback"
                    };
                    item.set_class_name(class);
                    item.set_text_content(Some(&msg.text));
                    let _ = item.set_attribute("style", &format!("opacity: {:.2}", msg.opacity()));
                    let _ = feed.append_child(&item);
                }
            }
        }

        /// Match the canvas backing store to its CSS size and tell the sim
        fn fit_canvas(&mut self) {
            let viewport = canvas_viewport(&self.canvas);
            self.state.resize(viewport);
        }
    }

    fn canvas_viewport(canvas: &HtmlCanvasElement) -> Viewport {
        let w = canvas.client_width().max(1) as u32;
        let h = canvas.client_height().max(1) as u32;
        canvas.set_width(w);
        canvas.set_height(h);
        Viewport::new(w as f32, h as f32)
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    pub async fn run() -> Result<(), AssetError> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialized".into());
        }

        log::info!("Data Dash starting...");

        let window = web_sys::window().ok_or_else(|| AssetError::Js("no window".into()))?;
        let document = window.document().ok_or_else(|| AssetError::Js("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| AssetError::MissingElement("canvas".into()))?
            .dyn_into()
            .map_err(|_| AssetError::Js("#canvas is not a canvas".into()))?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(js_err)?
            .ok_or_else(|| AssetError::Js("2d context unavailable".into()))?
            .dyn_into()
            .map_err(|_| AssetError::Js("unexpected context type".into()))?;

        let settings = Settings::load();
        let manifest = AssetManifest::default();
        let sprites = load_sprites(&manifest).await;

        let seed = js_sys::Date::now() as u64;
        let viewport = canvas_viewport(&canvas);
        let mut state = GameState::new(seed, Tuning::default(), viewport);
        state.rival_sprite_count = manifest.rivals.len();
        let mut hud = Hud::new(state.tuning.max_approval);
        route_events(&state.drain_events(), &mut LogSound, &mut hud);
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            state,
            hud,
            input: InputState::new(JOYSTICK_TRAVEL),
            audio: AudioManager::new(&settings),
            settings,
            sprites,
            canvas,
            ctx,
            stepper: FrameStepper::new(),
            last_time: 0.0,
            focused: true,
        }));

        setup_keyboard(game.clone())?;
        setup_touch_controls(&document, game.clone())?;
        setup_buttons(&document, game.clone())?;
        setup_window_events(game.clone())?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        request_animation_frame(game);

        log::info!("Data Dash running!");
        Ok(())
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) -> Result<(), AssetError> {
        let window = web_sys::window().ok_or_else(|| AssetError::Js("no window".into()))?;

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let name = event.key();
                if let Some(key) = Key::from_dom_key(&name) {
                    event.prevent_default();
                    game.borrow_mut().input.key_down(key);
                } else if (name == "m" || name == "M") && !event.repeat() {
                    game.borrow_mut().toggle_mute();
                }
            });
            window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_dom_key(&event.key()) {
                    game.borrow_mut().input.key_up(key);
                }
            });
            window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_touch_controls(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), AssetError> {
        if let Some(base) = document.get_element_by_id("joystick-base") {
            let knob = document.get_element_by_id("joystick-knob");

            let on_drag = {
                let game = game.clone();
                let base = base.clone();
                let knob = knob.clone();
                Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    let Some(touch) = event.target_touches().get(0) else {
                        return;
                    };
                    let rect = base.get_bounding_client_rect();
                    let center = Vec2::new(
                        (rect.left() + rect.width() / 2.0) as f32,
                        (rect.top() + rect.height() / 2.0) as f32,
                    );
                    let offset = Vec2::new(touch.client_x() as f32, touch.client_y() as f32) - center;
                    let mut g = game.borrow_mut();
                    g.input.joystick.drag(offset);
                    if let Some(knob) = &knob {
                        let o = g.input.joystick.offset;
                        let _ = knob.set_attribute("style", &format!("transform: translate({}px, {}px)", o.x, o.y));
                    }
                })
            };
            for name in ["touchstart", "touchmove"] {
                base.add_event_listener_with_callback(name, on_drag.as_ref().unchecked_ref())
                    .map_err(js_err)?;
            }
            on_drag.forget();

            let on_release = {
                let game = game.clone();
                Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                    game.borrow_mut().input.joystick.release();
                    if let Some(knob) = &knob {
                        let _ = knob.set_attribute("style", "transform: translate(0px, 0px)");
                    }
                })
            };
            for name in ["touchend", "touchcancel"] {
                base.add_event_listener_with_callback(name, on_release.as_ref().unchecked_ref())
                    .map_err(js_err)?;
            }
            on_release.forget();
        }

        if let Some(btn) = document.get_element_by_id("laser-btn") {
            for (name, held) in [("touchstart", true), ("touchend", false), ("touchcancel", false)] {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    game.borrow_mut().input.laser_button = held;
                });
                btn.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                    .map_err(js_err)?;
                closure.forget();
            }
        }

        if let Some(btn) = document.get_element_by_id("dash-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().input.tap_dash();
            });
            btn.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), AssetError> {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input.clear();
                g.state.start();
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }

        for id in ["restart-btn", "play-again-btn"] {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input.clear();
                g.stepper.reset();
                g.state.restart();
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_window_events(game: Rc<RefCell<Game>>) -> Result<(), AssetError> {
        let window = web_sys::window().ok_or_else(|| AssetError::Js("no window".into()))?;

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().fit_canvas();
            });
            window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                // Keys released while unfocused never deliver keyup
                g.input.clear();
                g.set_focused(false);
            });
            window
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().set_focused(true);
            });
            window
                .add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use data_dash::consts::SIM_DT;
    use data_dash::platform::{LogSound, route_events};
    use data_dash::sim::{GamePhase, GameState, TickInput, Viewport, tick};
    use data_dash::tuning::{Tuning, TuningError};
    use data_dash::ui::Hud;

    /// Ten simulated minutes
    const MAX_TICKS: u64 = 60 * 60 * 10;

    /// Greedy pilot: shoot the nearest rival when lined up, otherwise head for
    /// the nearest packet, then the exit
    fn pilot(state: &GameState) -> TickInput {
        let me = state.player.center();
        let laser_range = state.tuning.player.laser_range;

        let nearest_rival = state
            .rivals
            .iter()
            .filter(|r| !r.destroyed)
            .min_by(|a, b| me.distance(a.center()).total_cmp(&me.distance(b.center())));
        let nearest_packet = state
            .collectibles
            .iter()
            .filter(|c| !c.collected)
            .min_by(|a, b| me.distance(a.pos).total_cmp(&me.distance(b.pos)));

        let goal = match (nearest_rival, nearest_packet) {
            (Some(rival), _) => {
                let to_rival = rival.center() - me;
                let dir = to_rival.normalize_or_zero();
                let lined_up = state.player.facing.normalize_or_zero().dot(dir) > 0.98;
                if lined_up && to_rival.length() < laser_range * 0.8 {
                    return TickInput {
                        movement: dir,
                        laser: true,
                        ..TickInput::default()
                    };
                }
                // Approach to firing distance, not contact
                if to_rival.length() > laser_range * 0.5 {
                    rival.center()
                } else {
                    me + dir
                }
            }
            (None, Some(packet)) => packet.pos,
            (None, None) => state.target_zone.center,
        };

        let movement = (goal - me).normalize_or_zero();
        TickInput {
            movement: if movement == Vec2::ZERO { Vec2::X } else { movement },
            dash: (goal - me).length() > 200.0,
            laser: false,
        }
    }

    fn load_tuning() -> Result<Tuning, TuningError> {
        match std::env::args().nth(1) {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|e| TuningError::Io(path.clone(), e.to_string()))?;
                log::info!("Loaded tuning from {}", path);
                Tuning::from_json(&json)
            }
            None => Ok(Tuning::default()),
        }
    }

    pub fn run() -> Result<(), TuningError> {
        let tuning = load_tuning()?;
        let seed = std::env::var("DATA_DASH_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let mut state = GameState::new(seed, tuning, Viewport::new(1280.0, 800.0));
        let mut hud = Hud::new(state.tuning.max_approval);
        let mut sound = LogSound;
        state.start();

        while state.time_ticks < MAX_TICKS {
            let input = pilot(&state);
            tick(&mut state, &input, SIM_DT);
            route_events(&state.drain_events(), &mut sound, &mut hud);
            if matches!(state.phase, GamePhase::Win | GamePhase::GameOver) {
                break;
            }
        }

        log::info!(
            "Finished in {:?} on level {} after {:.1}s, approval {}",
            state.phase,
            state.level,
            state.clock_ms / 1000.0,
            state.approval
        );
        println!(
            "phase={:?} level={} seconds={:.1} approval={} {}",
            state.phase,
            state.level,
            state.clock_ms / 1000.0,
            state.approval,
            hud.rivals_text()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Data Dash (native) starting...");
    log::info!("Headless autopilot run - use `trunk serve` for the web version");

    if let Err(e) = headless::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
