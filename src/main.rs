//! Pong Pro entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlInputElement, MouseEvent,
        TouchEvent,
    };

    use pong_pro::audio::AudioManager;
    use pong_pro::net::LocalStorageStore;
    use pong_pro::render::{DrawCmd, Surface};
    use pong_pro::sim::{Bounds, Difficulty, PlayMode};
    use pong_pro::{App, HighScores, Phase, Settings};

    /// 2D canvas drawing target
    struct CanvasSurface {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
    }

    impl Surface for CanvasSurface {
        fn size(&self) -> Option<Bounds> {
            let (w, h) = (self.canvas.width(), self.canvas.height());
            (w > 0 && h > 0).then(|| Bounds::new(w as f32, h as f32))
        }

        fn draw(&mut self, commands: &[DrawCmd]) {
            let ctx = &self.ctx;
            for cmd in commands {
                match cmd {
                    DrawCmd::Clear { color } => {
                        ctx.set_fill_style_str(&color.to_css());
                        ctx.fill_rect(
                            0.0,
                            0.0,
                            self.canvas.width() as f64,
                            self.canvas.height() as f64,
                        );
                    }
                    DrawCmd::Rect {
                        x,
                        y,
                        width,
                        height,
                        color,
                    } => {
                        ctx.set_fill_style_str(&color.to_css());
                        ctx.fill_rect(*x as f64, *y as f64, *width as f64, *height as f64);
                    }
                    DrawCmd::Circle {
                        center,
                        radius,
                        color,
                    } => {
                        ctx.set_fill_style_str(&color.to_css());
                        ctx.begin_path();
                        let _ = ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, TAU);
                        ctx.fill();
                    }
                    DrawCmd::Line {
                        from,
                        to,
                        width,
                        color,
                    } => {
                        ctx.set_stroke_style_str(&color.to_css());
                        ctx.set_line_width(*width as f64);
                        ctx.begin_path();
                        ctx.move_to(from.x as f64, from.y as f64);
                        ctx.line_to(to.x as f64, to.y as f64);
                        ctx.stroke();
                    }
                }
            }
        }
    }

    /// Everything the browser callbacks share
    struct Game {
        app: App<LocalStorageStore>,
        surface: CanvasSurface,
        audio: AudioManager,
        last_phase: Option<Phase>,
    }

    impl Game {
        fn frame(&mut self) {
            self.app.frame(&mut self.surface, &mut self.audio);
            self.update_hud();
        }

        /// Show the screen for the current phase, hide the rest
        fn update_hud(&mut self) {
            let phase = self.app.phase();
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if self.last_phase != Some(phase) {
                self.last_phase = Some(phase);
                let visible = match phase {
                    Phase::Menu => "main-menu",
                    Phase::SelectDifficulty(_) => "difficulty-menu",
                    Phase::MultiplayerMenu => "multiplayer-menu",
                    Phase::WaitingForOpponent => "waiting-screen",
                    Phase::Playing(_) => "game-screen",
                    Phase::Paused(_) => "pause-overlay",
                    Phase::GameOver(_) => "game-over",
                };
                for id in [
                    "main-menu",
                    "difficulty-menu",
                    "multiplayer-menu",
                    "waiting-screen",
                    "game-screen",
                    "pause-overlay",
                    "game-over",
                ] {
                    if let Some(el) = document.get_element_by_id(id) {
                        let class = if id == visible { "" } else { "hidden" };
                        let _ = el.set_attribute("class", class);
                    }
                }
                if let Phase::GameOver(PlayMode::Solo) = phase {
                    self.update_leaderboard(&document);
                }
            }

            if let Some(el) = document.get_element_by_id("hud-text") {
                el.set_text_content(Some(&self.app.hud()));
            }
            if let Some(el) = document.get_element_by_id("notice") {
                match self.app.session().notice() {
                    Some(notice) => {
                        let _ = el.set_attribute("class", "");
                        if let Some(text) = document.get_element_by_id("notice-text") {
                            text.set_text_content(Some(&notice.message()));
                        }
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }
        }

        fn update_leaderboard(&self, document: &web_sys::Document) {
            let Some(list) = document.get_element_by_id("leaderboard") else {
                return;
            };
            let lines: Vec<String> = self
                .app
                .highscores()
                .entries
                .iter()
                .enumerate()
                .map(|(i, entry)| entry.summary(i + 1))
                .collect();
            list.set_text_content(Some(&lines.join("\n")));
        }

        /// Size the canvas from the window, per the layout settings
        fn fit_canvas(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let width = window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0) as f32;
            let height = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0) as f32;
            let bounds = self.app.settings().canvas_size(width, height);
            self.surface.canvas.set_width(bounds.width as u32);
            self.surface.canvas.set_height(bounds.height as u32);
            self.app.resize(bounds);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Pong Pro starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("context query failed")
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let store = match LocalStorageStore::new() {
            Ok(store) => store,
            Err(err) => {
                log::error!("Room store unavailable: {}", err);
                return;
            }
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game {
            app: App::new(store, Settings::load(), HighScores::load(), seed),
            surface: CanvasSurface { canvas, ctx },
            audio: AudioManager::new(),
            last_phase: None,
        }));
        game.borrow_mut().fit_canvas();

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        setup_menu_buttons(game.clone());
        setup_window_handlers(game.clone());

        request_animation_frame(game);

        log::info!("Pong Pro running!");
    }

    fn element(id: &str) -> Option<Element> {
        web_sys::window()?.document()?.get_element_by_id(id)
    }

    /// Attach a click handler to the element with `id`, if present
    fn on_click(id: &str, game: &Rc<RefCell<Game>>, handler: impl Fn(&mut Game) + 'static) {
        let Some(btn) = element(id) else {
            log::warn!("Missing button #{}", id);
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let mut g = game.borrow_mut();
            // Browsers only start audio after a user gesture
            g.audio.resume();
            handler(&mut g);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_menu_buttons(game: Rc<RefCell<Game>>) {
        on_click("solo-btn", &game, |g| {
            g.app.choose_mode(PlayMode::Solo);
        });
        on_click("ai-btn", &game, |g| {
            g.app.choose_mode(PlayMode::VsAi);
        });
        on_click("multi-btn", &game, |g| {
            g.app.choose_mode(PlayMode::Multiplayer);
        });

        for difficulty in Difficulty::ALL {
            let id = format!("{}-btn", difficulty.as_str());
            on_click(&id, &game, move |g| {
                g.app.pick_difficulty(difficulty);
            });
        }

        on_click("create-room-btn", &game, |g| {
            g.app.create_room();
        });
        on_click("join-room-btn", &game, |g| {
            let code = element("room-code-input")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();
            g.app.join_room(&code);
        });

        for id in ["difficulty-back-btn", "multiplayer-back-btn", "cancel-wait-btn"] {
            on_click(id, &game, |g| {
                g.app.back();
            });
        }
        on_click("pause-btn", &game, |g| {
            g.app.toggle_pause();
        });
        on_click("resume-btn", &game, |g| {
            g.app.toggle_pause();
        });
        for id in ["quit-btn", "menu-btn"] {
            on_click(id, &game, |g| g.app.return_to_menu());
        }
        on_click("notice-dismiss-btn", &game, |g| {
            g.app.dismiss_notice();
        });
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let canvas = game.borrow().surface.canvas.clone();

        // Mouse move - absolute x within the canvas
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut().app.set_pointer(event.offset_x() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    game.borrow_mut().app.set_pointer(x);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "Escape" | "p" | "P" => {
                        g.app.toggle_pause();
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_window_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Resize
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().fit_canvas();
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Auto-pause when the tab is hidden
        if let Some(document) = window.document() {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.app.phase().is_playing() {
                        g.app.toggle_pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Closing the tab deletes any open room
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().app.leave_room();
            });
            let _ = window
                .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        game.borrow_mut().frame();
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pong Pro (native) starting...");
    log::info!("The playable game is the web build - running headless demos");

    // Optional difficulty for the vs-AI demo: `pong-pro hard`
    use pong_pro::sim::Difficulty;
    let difficulty = match std::env::args().nth(1) {
        Some(arg) => Difficulty::parse(&arg).unwrap_or_else(|| {
            log::warn!("Unknown difficulty '{}', using medium", arg);
            Difficulty::Medium
        }),
        None => Difficulty::Medium,
    };

    demo::vs_ai(difficulty);
    demo::loopback();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless matches over the in-memory store
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use pong_pro::App;
    use pong_pro::audio::SilentAudio;
    use pong_pro::net::{MemoryStore, Role};
    use pong_pro::render::HeadlessSurface;
    use pong_pro::sim::{Bounds, Difficulty, PlayMode};
    use pong_pro::{HighScores, Phase, Settings};

    const MAX_FRAMES: u32 = 60 * 60 * 5;

    fn app(store: &MemoryStore, seed: u64) -> App<MemoryStore> {
        App::new(store.clone(), Settings::default(), HighScores::new(), seed)
    }

    /// Player paddle chases the ball with a small lag, so points happen
    pub fn vs_ai(difficulty: Difficulty) {
        let store = MemoryStore::new();
        let mut app = app(&store, 7);
        let mut surface = HeadlessSurface::new(Bounds::default());
        let mut audio = SilentAudio::default();

        app.choose_mode(PlayMode::VsAi);
        app.pick_difficulty(difficulty);

        let mut frames = 0;
        while app.phase().is_playing() && frames < MAX_FRAMES {
            if let Some(game) = app.session().game() {
                let target = game.ball.pos.x - game.ball.vel.x * 8.0;
                app.set_pointer(target);
            }
            app.frame(&mut surface, &mut audio);
            frames += 1;
        }
        log::info!(
            "vs-AI demo ({}): {} after {} frames ({} sounds)",
            difficulty.as_str(),
            app.hud(),
            frames,
            audio.played.len()
        );
    }

    /// Host and guest in one process sharing a store
    pub fn loopback() {
        let store = MemoryStore::new();
        let mut host = app(&store, 1);
        let mut guest = app(&store, 2);
        let mut host_surface = HeadlessSurface::new(Bounds::default());
        let mut guest_surface = HeadlessSurface::new(Bounds::default());
        let mut audio = SilentAudio::default();

        host.choose_mode(PlayMode::Multiplayer);
        if !host.create_room() {
            log::error!("Loopback demo: could not create a room");
            return;
        }
        let Some(code) = host.role().map(|role| role.code().to_string()) else {
            return;
        };
        guest.choose_mode(PlayMode::Multiplayer);
        if !guest.join_room(&code) {
            log::error!("Loopback demo: could not join room {}", code);
            return;
        }

        let mut frames = 0;
        while !matches!(host.phase(), Phase::GameOver(_)) && frames < MAX_FRAMES {
            if let Some(Role::Host(link)) = host.role() {
                let ball = link.sim().ball;
                host.set_pointer(ball.pos.x - ball.vel.x * 6.0);
            }
            if let Some(Role::Guest(link)) = guest.role() {
                guest.set_pointer(link.view().ball.pos.x);
            }
            host.frame(&mut host_surface, &mut audio);
            guest.frame(&mut guest_surface, &mut audio);
            frames += 1;
        }
        log::info!("Loopback demo, host sees: {}", host.hud());
        log::info!("Loopback demo, guest sees: {}", guest.hud());
        log::info!("Room {} finished after {} frames", code, frames);
    }
}
