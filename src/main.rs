//! Control Room Tennis entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

    use control_room_tennis::audio::Sfx;
    use control_room_tennis::audio::sequencer::LOOKAHEAD_MS;
    use control_room_tennis::audio::web::WebAudio;
    use control_room_tennis::commentary::{Comment, TypeFrame, reveal, typewriter_schedule};
    use control_room_tennis::platform::{Host, RenderFrame, WebStorage, gaze_offset};
    use control_room_tennis::telemetry::TelemetryEvent;
    use control_room_tennis::{GameSession, Settings};

    /// Query parameters forwarded to [`Settings::apply_override`]
    const OVERRIDE_KEYS: [&str; 7] = ["to", "restore", "r", "seed", "difficulty", "target", "sound"];
    /// Oldest chat lines are dropped past this
    const CHAT_LOG_LIMIT: u32 = 160;
    const PUPIL_IDS: [&str; 2] = ["avatar-pupil-left", "avatar-pupil-right"];

    /// A chat line being revealed one character at a time
    struct Typing {
        el: Element,
        segments: Vec<String>,
        frames: Vec<TypeFrame>,
        next: usize,
        start_ms: Option<f64>,
    }

    impl Typing {
        /// Apply every frame due at `now_ms`. Returns true once fully shown.
        fn advance(&mut self, now_ms: f64) -> bool {
            let start = *self.start_ms.get_or_insert(now_ms);
            let mut latest = None;
            while let Some(frame) = self.frames.get(self.next)
                && frame.at_ms <= now_ms - start
            {
                latest = Some(*frame);
                self.next += 1;
            }

            if let Some(frame) = latest {
                let mut text: String = self.segments[..frame.segment].concat();
                text.push_str(reveal(&self.segments[frame.segment], frame.chars));
                self.el.set_text_content(Some(&text));
            }
            self.next >= self.frames.len()
        }
    }

    /// DOM render sink, Web Audio output and chat log
    struct DomHost {
        document: Document,
        court: HtmlElement,
        player: HtmlElement,
        opponent: HtmlElement,
        ball: HtmlElement,
        audio: WebAudio,
        typing: Vec<Typing>,
        rng: Pcg32,
    }

    impl DomHost {
        fn new(document: Document, master_volume: f32, seed: u64) -> Option<Self> {
            let html = |id: &str| -> Option<HtmlElement> {
                document.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
            };
            Some(Self {
                court: html("tennis-court")?,
                player: html("paddle-player")?,
                opponent: html("paddle-bot")?,
                ball: html("ball")?,
                audio: WebAudio::new(master_volume, seed),
                typing: Vec::new(),
                rng: Pcg32::seed_from_u64(seed),
                document,
            })
        }

        fn court_size(&self) -> (f32, f32) {
            let rect = self.court.get_bounding_client_rect();
            (rect.width() as f32, rect.height() as f32)
        }

        /// Pointer y relative to the court's top edge
        fn court_y(&self, client_y: f64) -> f32 {
            (client_y - self.court.get_bounding_client_rect().top()) as f32
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn update_gaze(&self, frame: &RenderFrame) {
            let court = self.court.get_bounding_client_rect();
            let target = Vec2::new(court.left() as f32, court.top() as f32) + frame.ball_center();

            for id in PUPIL_IDS {
                let Some(pupil) = self
                    .document
                    .get_element_by_id(id)
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                else {
                    continue;
                };
                let Some(eye) = pupil.parent_element() else {
                    continue;
                };
                let rect = eye.get_bounding_client_rect();
                let half = Vec2::new(rect.width() as f32, rect.height() as f32) / 2.0;
                let anchor = Vec2::new(rect.left() as f32, rect.top() as f32) + half;
                let offset = gaze_offset(target, anchor, half);
                let _ = pupil.style().set_property(
                    "transform",
                    &format!("translate({:.1}px, {:.1}px)", offset.x, offset.y),
                );
            }
        }

        fn advance_typing(&mut self, now_ms: f64) {
            self.typing.retain_mut(|job| !job.advance(now_ms));
        }
    }

    fn place(el: &HtmlElement, pos: Vec2) {
        let _ = el
            .style()
            .set_property("transform", &format!("translate({:.2}px, {:.2}px)", pos.x, pos.y));
    }

    fn clock_stamp() -> String {
        let now = js_sys::Date::new_0();
        format!(
            "[{:02}:{:02}:{:02}] ",
            now.get_hours(),
            now.get_minutes(),
            now.get_seconds()
        )
    }

    impl Host for DomHost {
        fn render(&mut self, frame: &RenderFrame) {
            place(&self.player, frame.player);
            place(&self.opponent, frame.opponent);
            place(&self.ball, frame.ball);

            self.set_text("score-you", &frame.score_you.to_string());
            self.set_text("score-bot", &frame.score_opponent.to_string());
            self.set_text("stat-match", &frame.match_label());
            self.set_text("stat-timer", &frame.timer_label());
            self.set_text("stat-best-rally", &frame.best_rally.to_string());
            self.set_text("stat-difficulty", frame.difficulty);
            self.set_text("stat-record", &frame.record_label());

            self.update_gaze(frame);
        }

        fn telemetry(&mut self, event: &TelemetryEvent) {
            log::debug!("telemetry {}", event.to_json());
        }

        fn navigate(&mut self, to: &str) {
            let Some(window) = web_sys::window() else {
                return;
            };
            log::info!("Navigating to {}", to);
            if window.location().assign(to).is_err() {
                log::warn!("Navigation to {} failed", to);
            }
        }

        fn play(&mut self, sfx: Sfx) {
            let now = self.audio.now();
            sfx.emit(now, &mut self.audio);
        }

        fn comment(&mut self, comment: &Comment) {
            let Some(log_el) = self.document.get_element_by_id("chat-log-inner") else {
                return;
            };
            let Ok(line) = self.document.create_element("div") else {
                return;
            };
            line.set_class_name("chat-line");
            if log_el.append_child(&line).is_err() {
                return;
            }
            while log_el.child_element_count() > CHAT_LOG_LIMIT {
                match log_el.first_element_child() {
                    Some(oldest) => oldest.remove(),
                    None => break,
                }
            }
            log_el.set_scroll_top(log_el.scroll_height());

            let segments = vec![clock_stamp(), comment.line.clone()];
            let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
            let frames = typewriter_schedule(&refs, &mut self.rng);
            self.typing.push(Typing {
                el: line,
                segments,
                frames,
                next: 0,
                start_ms: None,
            });
        }
    }

    /// Game instance holding all state
    struct Game {
        session: GameSession<WebStorage>,
        host: DomHost,
    }

    impl Game {
        /// First user gesture: unlock audio and resume music left on last visit
        fn unlock_audio(&mut self) {
            if !self.session.sound_enabled() {
                return;
            }
            self.host.audio.resume();
            self.session.resume_music(self.host.audio.now());
        }
    }

    fn performance_now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map_or(0.0, |p| p.now())
    }

    /// Stored settings, then query-string overrides, then a same-origin referrer as return route
    fn resolve_settings(local: &WebStorage) -> Settings {
        let mut settings = Settings::load(local);
        let Some(window) = web_sys::window() else {
            return settings;
        };
        let location = window.location();

        if let Ok(search) = location.search()
            && let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search)
        {
            for key in OVERRIDE_KEYS {
                if let Some(value) = params.get(key) {
                    settings.apply_override(key, &value);
                }
            }
        }

        if settings.return_route.is_none()
            && let Some(document) = window.document()
        {
            let referrer = document.referrer();
            let origin = location.origin().unwrap_or_default();
            if let Ok(url) = web_sys::Url::new(&referrer)
                && !origin.is_empty()
                && url.origin() == origin
            {
                let route = format!("{}{}{}", url.pathname(), url.search(), url.hash());
                settings.apply_override("to", &route);
            }
        }

        if settings.seed.is_none() {
            settings.seed = Some(js_sys::Date::now() as u64);
        }
        settings
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Control Room Tennis starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::warn!("No document - nothing to mount");
            return;
        };

        let local = WebStorage::local();
        let settings = resolve_settings(&local);
        let seed = settings.seed.unwrap_or_default();

        let Some(host) = DomHost::new(document, settings.master_volume, seed) else {
            log::warn!("Court elements missing - game not mounted");
            return;
        };

        let mut session = GameSession::new(local, settings)
            .with_fallback_storage(Box::new(WebStorage::session()));
        let (w, h) = host.court_size();
        session.resize(w, h);

        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game { session, host }));

        setup_court_input(game.clone());
        setup_buttons(game.clone());
        setup_keyboard(game.clone());
        setup_resize(game.clone());
        setup_music_timer(game.clone());

        request_animation_frame(game);

        log::info!("Control Room Tennis running!");
    }

    fn setup_court_input(game: Rc<RefCell<Game>>) {
        let court = game.borrow().host.court.clone();

        // Hover arms a serve
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.unlock_audio();
                let Game { session, host } = &mut *g;
                session.arm(performance_now(), host);
            });
            let _ = court
                .add_event_listener_with_callback("mouseenter", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let Game { session, host } = &mut *g;
                let y = host.court_y(event.client_y() as f64);
                session.pointer_move(y, performance_now(), host);
            });
            let _ = court
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start and move share one handler
        for name in ["touchstart", "touchmove"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let mut g = game.borrow_mut();
                if event.type_() == "touchstart" {
                    g.unlock_audio();
                }
                let Game { session, host } = &mut *g;
                let y = host.court_y(touch.client_y() as f64);
                session.pointer_move(y, performance_now(), host);
            });
            let _ = court.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = game.borrow().host.document.clone();

        if let Some(btn) = document.get_element_by_id("btn-reset") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.unlock_audio();
                let Game { session, host } = &mut *g;
                session.manual_reset(performance_now(), host);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("btn-sound") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                let Game { session, host } = &mut *g;
                host.audio.resume();
                let audio_now = host.audio.now();
                session.toggle_sound(audio_now, host);
                let label = if session.sound_enabled() { "ON" } else { "OFF" };
                host.set_text("sound-state", label);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let label = if game.borrow().session.sound_enabled() { "ON" } else { "OFF" };
        game.borrow().host.set_text("sound-state", label);
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.repeat() || !matches!(event.key().as_str(), "r" | "R") {
                return;
            }
            let mut g = game.borrow_mut();
            let Game { session, host } = &mut *g;
            session.manual_reset(performance_now(), host);
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            let (w, h) = g.host.court_size();
            g.session.resize(w, h);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Look-ahead music scheduling runs on its own timer, independent of frames
    fn setup_music_timer(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut()>::new(move || {
            let mut g = game.borrow_mut();
            let Game { session, host } = &mut *g;
            let audio_now = host.audio.now();
            session.schedule_music(audio_now, &mut host.audio);
        });
        let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            LOOKAHEAD_MS as i32,
        );
        closure.forget();
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
            let Game { session, host } = &mut *g;
            host.advance_typing(time);
            session.frame(time, host);
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Control Room Tennis (native) starting...");
    log::info!("Native mode runs a headless scripted match - build for wasm32 to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(7);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted match against the bot with a player that chases the ball at a capped speed
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use control_room_tennis::audio::AudioEvent;
    use control_room_tennis::audio::sequencer::LOOKAHEAD_MS;
    use control_room_tennis::commentary::Comment;
    use control_room_tennis::platform::{Host, MemoryStorage};
    use control_room_tennis::telemetry::TelemetryEvent;
    use control_room_tennis::{GameSession, MatchPhase, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Scripted pointer speed limit (px per frame)
    const CHASE_PX: f32 = 6.0;
    /// Give up after this much simulated time (ms)
    const TIME_LIMIT_MS: f64 = 10.0 * 60.0 * 1000.0;

    #[derive(Default)]
    struct LogHost {
        events: usize,
    }

    impl Host for LogHost {
        fn telemetry(&mut self, event: &TelemetryEvent) {
            self.events += 1;
            log::info!("telemetry {}", event.to_json());
        }

        fn navigate(&mut self, to: &str) {
            log::info!("navigate -> {}", to);
        }

        fn comment(&mut self, comment: &Comment) {
            println!("  [{:>8.0}ms] {}", comment.at_ms, comment.line);
        }
    }

    pub fn run(seed: u64) {
        let settings = Settings {
            seed: Some(seed),
            ..Settings::default()
        };
        let mut session = GameSession::new(MemoryStorage::new(), settings);
        let mut host = LogHost::default();
        let mut music: Vec<AudioEvent> = Vec::new();

        session.resize(720.0, 420.0);
        session.toggle_sound(0.0, &mut host);

        let mut now = 0.0;
        let mut pointer_y = session.state().height / 2.0;
        let mut next_music_ms = 0.0;
        session.arm(now, &mut host);

        while session.phase() != MatchPhase::Ended && now < TIME_LIMIT_MS {
            let ball_y = session.render_frame().ball_center().y;
            pointer_y += (ball_y - pointer_y).clamp(-CHASE_PX, CHASE_PX);
            // Nudge past the start threshold on the first frames
            if session.phase() != MatchPhase::Running {
                pointer_y += 3.0;
            }
            session.pointer_move(pointer_y, now, &mut host);
            session.frame(now, &mut host);

            while next_music_ms <= now {
                session.schedule_music(next_music_ms / 1000.0, &mut music);
                next_music_ms += LOOKAHEAD_MS as f64;
            }
            now += FRAME_MS;
        }

        let frame = session.render_frame();
        match session.last_result() {
            Some(result) => println!(
                "Match {} over: {:?} {}-{} in {:.1}s, longest rally {}",
                frame.match_label(),
                result.outcome,
                result.score_you,
                result.score_opponent,
                result.elapsed_ms / 1000.0,
                result.best_rally_this_match,
            ),
            None => println!("No result after {:.0}s of play", now / 1000.0),
        }
        println!(
            "Difficulty {} · record {} · {} telemetry events · {} notes queued",
            frame.difficulty,
            frame.record_label(),
            host.events,
            music.len(),
        );
    }
}
