//! Math Racer entry point
//!
//! Handles platform-specific initialization and runs the game loop.
//! On the web the HUD is plain DOM; natively a headless race is driven by a
//! bot that answers most problems and the events are logged.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, HtmlInputElement, KeyboardEvent};

    use math_racer::audio::{AudioManager, SoundEffect};
    use math_racer::hud::{Camera, HudSnapshot, RenderSink, publish};
    use math_racer::platform::FrameClock;
    use math_racer::platform::storage::LocalStorage;
    use math_racer::sim::{
        GameEvent, RaceOutcome, RacePhase, RaceResult, RaceState, TickInput, seeded, tick,
    };
    use math_racer::settings;
    use math_racer::{BestTimes, Settings, format_race_time, ordinal, ordinal_suffix};

    /// Vertical distance between lanes (px)
    const LANE_HEIGHT: f32 = 48.0;

    /// Settings panel inputs, in `Settings` field order
    const SETTINGS_INPUTS: [&str; 5] = [
        "min-multiplier",
        "max-multiplier",
        "problem-interval",
        "answer-time",
        "num-laps",
    ];

    fn element(document: &Document, id: &str) -> Option<web_sys::Element> {
        document.get_element_by_id(id)
    }

    fn html_element(document: &Document, id: &str) -> Option<HtmlElement> {
        element(document, id)?.dyn_into::<HtmlElement>().ok()
    }

    fn input_element(document: &Document, id: &str) -> Option<HtmlInputElement> {
        element(document, id)?.dyn_into::<HtmlInputElement>().ok()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = element(document, id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = element(document, id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn set_style(document: &Document, id: &str, property: &str, value: &str) {
        if let Some(el) = html_element(document, id) {
            let _ = el.style().set_property(property, value);
        }
    }

    /// DOM-backed HUD
    struct DomSink {
        document: Document,
        camera: Camera,
        audio: AudioManager,
        /// Result of a race that finished this frame, picked up by `Game`
        finished: Option<RaceResult>,
    }

    impl DomSink {
        fn new(document: Document) -> Self {
            Self {
                document,
                camera: Camera::default(),
                audio: AudioManager::new(),
                finished: None,
            }
        }

        fn show_feedback(&self, text: &str, class: &str) {
            if let Some(el) = element(&self.document, "problem-feedback") {
                el.set_text_content(Some(text));
                let _ = el.set_attribute("class", class);
            }
        }

        fn show_result(&self, result: &RaceResult, total_laps: u32) {
            let doc = &self.document;
            let headline = match result.outcome {
                RaceOutcome::Win => "You Win!".to_string(),
                RaceOutcome::Loss => format!("You finished {}", ordinal(result.rank)),
            };
            set_text(doc, "result-title", &headline);
            set_text(doc, "result-time", &format_race_time(result.race_time_ms));
            set_text(doc, "result-problems", &result.problems_solved.to_string());
            set_text(doc, "result-laps", &total_laps.to_string());
            let best_lap = result
                .best_lap_ms
                .map(format_race_time)
                .unwrap_or_else(|| "--:--.--".to_string());
            set_text(doc, "result-best-lap", &best_lap);
        }
    }

    impl RenderSink for DomSink {
        fn render(&mut self, hud: &HudSnapshot) {
            let doc = &self.document;

            set_text(doc, "position-number", &hud.rank.to_string());
            set_text(doc, "position-suffix", ordinal_suffix(hud.rank));
            set_text(doc, "timer", &hud.timer_label());
            set_text(doc, "lap-current", &hud.lap.current.to_string());
            set_text(doc, "lap-total", &hud.lap.total.to_string());
            set_text(doc, "problems-value", &hud.problems_solved.to_string());
            let next_problem = hud
                .next_problem_in_ms
                .map(|ms| format!("{}s", ms.div_ceil(1000)))
                .unwrap_or_default();
            set_text(doc, "next-problem", &next_problem);

            set_text(doc, "speed-value", &hud.display_speed.to_string());
            set_style(
                doc,
                "speed-bar",
                "width",
                &format!("{:.1}%", hud.speed_fraction * 100.0),
            );

            let boost_label = if hud.boost.turbo_active {
                "TURBO!"
            } else if hud.boost.ready {
                "READY"
            } else {
                "CHARGING"
            };
            set_text(doc, "boost-status", boost_label);
            set_style(doc, "boost-charge", "width", &format!("{}%", hud.boost.charge));

            match &hud.active_problem {
                Some(problem) => {
                    set_hidden(doc, "problem-panel", false);
                    set_text(doc, "problem-text", &problem.prompt);
                    set_style(
                        doc,
                        "problem-timer",
                        "width",
                        &format!("{:.1}%", problem.remaining_fraction * 100.0),
                    );
                }
                None => set_hidden(doc, "problem-panel", true),
            }

            // Cars and scrolling track
            let viewport = element(doc, "track")
                .map(|el| el.client_width() as f32)
                .unwrap_or(800.0);
            if let Some(player) = hud.cars.iter().find(|c| c.is_player) {
                self.camera.follow(player.position, viewport);
            }
            set_style(
                doc,
                "track",
                "background-position-x",
                &format!("{}px", -self.camera.parallax_offset()),
            );
            for (i, car) in hud.cars.iter().enumerate() {
                let id = format!("car-{}", i);
                let point = self.camera.car_point(car, LANE_HEIGHT);
                set_style(doc, &id, "left", &format!("{}px", point.x));
                set_style(doc, &id, "top", &format!("{}px", point.y));
                if let Some(el) = element(doc, &id) {
                    let _ = el.class_list().toggle_with_force("boosting", car.boost_active);
                }
            }

            set_hidden(doc, "start-race-btn", hud.phase != RacePhase::NotStarted);
            set_hidden(doc, "race-result", hud.phase != RacePhase::Finished);
        }

        fn notify(&mut self, event: &GameEvent) {
            if let Some(effect) = SoundEffect::for_event(event) {
                self.audio.play(effect);
            }

            match event {
                GameEvent::ChallengeOpened { prompt } => {
                    log::debug!("Problem: {}", prompt);
                    self.show_feedback("", "");
                    if let Some(input) = input_element(&self.document, "answer-input") {
                        input.set_value("");
                        let _ = input.focus();
                    }
                }
                GameEvent::AnswerCorrect => self.show_feedback("Correct! TURBO!", "correct"),
                GameEvent::AnswerWrong { expected } => {
                    self.show_feedback(&format!("Answer: {}", expected), "wrong")
                }
                GameEvent::ChallengeTimedOut { expected } => {
                    self.show_feedback(&format!("Time's up! Answer: {}", expected), "wrong")
                }
                GameEvent::LapCompleted { lap, lap_ms } => {
                    log::info!("Lap {} in {}", lap, format_race_time(*lap_ms));
                }
                GameEvent::RaceFinished(result) => {
                    self.finished = Some(result.clone());
                }
                _ => {}
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        state: RaceState,
        rng: rand_pcg::Pcg32,
        input: TickInput,
        clock: FrameClock,
        store: LocalStorage,
        best_times: BestTimes,
        sink: DomSink,
    }

    impl Game {
        fn new(seed: u64, document: Document) -> Self {
            let store = LocalStorage::new();
            let settings = Settings::load(&store);
            let best_times = BestTimes::load(&store);
            let mut rng = seeded(seed);
            let state = RaceState::new(settings, &mut rng);
            Self {
                state,
                rng,
                input: TickInput::default(),
                clock: FrameClock::new(),
                store,
                best_times,
                sink: DomSink::new(document),
            }
        }

        /// Run one frame: simulate, then publish to the DOM
        fn frame(&mut self, time: f64) {
            let frame_ms = self.clock.frame_ms(time);
            let input = std::mem::take(&mut self.input);
            tick(&mut self.state, &input, &mut self.rng, frame_ms);

            self.sink.audio.set_enabled(self.state.settings.sound_enabled);
            publish(&mut self.state, &mut self.sink);

            if let Some(result) = self.sink.finished.take() {
                self.sink.show_result(&result, self.state.total_laps);
                let rank = self
                    .best_times
                    .record(&result, self.state.total_laps, js_sys::Date::now());
                if let Some(rank) = rank {
                    log::info!("New best time, rank {}", rank);
                    self.best_times.save(&mut self.store);
                }
                self.update_best_times();
            }
        }

        fn update_best_times(&self) {
            let best = self
                .best_times
                .best()
                .map(format_race_time)
                .unwrap_or_else(|| "--:--.--".to_string());
            set_text(&self.sink.document, "best-time", &best);
        }

        /// Fill the settings panel from the current settings
        fn populate_settings(&self) {
            let s = &self.state.settings;
            let values = [
                s.min_multiplier,
                s.max_multiplier,
                s.problem_interval_seconds,
                s.answer_time_seconds,
                s.num_laps,
            ];
            for (id, value) in SETTINGS_INPUTS.iter().zip(values) {
                if let Some(input) = input_element(&self.sink.document, id) {
                    input.set_value(&value.to_string());
                }
            }
            if let Some(input) = input_element(&self.sink.document, "sound-enabled") {
                input.set_checked(s.sound_enabled);
            }
        }

        /// Read the settings panel. Out-of-range numbers are clamped; text that
        /// is not a number keeps the current value.
        fn read_settings(&self) -> Settings {
            let doc = &self.sink.document;
            let current = &self.state.settings;
            let read = |id: &str, fallback: u32| {
                input_element(doc, id)
                    .and_then(|input| settings::parse_field(&input.value()))
                    .unwrap_or(fallback)
            };
            Settings {
                min_multiplier: read(SETTINGS_INPUTS[0], current.min_multiplier),
                max_multiplier: read(SETTINGS_INPUTS[1], current.max_multiplier),
                problem_interval_seconds: read(SETTINGS_INPUTS[2], current.problem_interval_seconds),
                answer_time_seconds: read(SETTINGS_INPUTS[3], current.answer_time_seconds),
                num_laps: read(SETTINGS_INPUTS[4], current.num_laps),
                sound_enabled: input_element(doc, "sound-enabled")
                    .map(|input| input.checked())
                    .unwrap_or(current.sound_enabled),
            }
            .sanitized()
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Math Racer starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };

        // Hide loading indicator
        set_hidden(&document, "loading", true);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, document.clone())));
        {
            let g = game.borrow();
            g.populate_settings();
            g.update_best_times();
        }
        log::info!("Game initialized with seed: {}", seed);

        setup_buttons(&document, game.clone());
        setup_answer_input(&document, game.clone());
        setup_settings_panel(&document, game.clone());
        setup_keyboard(game.clone());
        setup_visibility(&document, game.clone());

        request_animation_frame(game);

        log::info!("Math Racer running!");
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(web_sys::MouseEvent) + 'static) {
        if let Some(btn) = element(document, id) {
            let closure = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click(document, "start-race-btn", move |_| {
                let mut g = game.borrow_mut();
                // Browsers only allow audio after a user gesture
                g.sink.audio.resume();
                g.input.start_race = true;
            });
        }
        {
            let game = game.clone();
            on_click(document, "race-again-btn", move |_| {
                let mut g = game.borrow_mut();
                g.input.race_again = true;
                log::info!("Race again");
            });
        }
        on_click(document, "clear-records-btn", move |_| {
            let mut g = game.borrow_mut();
            let Game {
                best_times, store, ..
            } = &mut *g;
            best_times.clear(store);
            g.update_best_times();
        });
    }

    fn setup_answer_input(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(input) = input_element(document, "answer-input") else {
            log::warn!("No answer input found");
            return;
        };
        let input_clone = input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().input.answer = Some(input_clone.value());
        });
        let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_settings_panel(document: &Document, game: Rc<RefCell<Game>>) {
        let ids = SETTINGS_INPUTS.iter().copied().chain(["sound-enabled"]);
        for id in ids {
            let Some(el) = element(document, id) else { continue };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                let settings = g.read_settings();
                settings.save(&mut g.store);
                g.input.settings = Some(settings);
            });
            let _ = el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if !matches!(event.key().as_str(), " " | "Enter") {
                return;
            }
            let mut g = game.borrow_mut();
            match g.state.phase {
                RacePhase::NotStarted => {
                    g.sink.audio.resume();
                    g.input.start_race = true;
                }
                RacePhase::Finished => g.input.race_again = true,
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_visibility(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Visible {
                // Don't count the time spent hidden as one long frame
                game.borrow_mut().clock.reset();
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use math_racer::consts::FRAME_MS;
    use math_racer::hud::{HudSnapshot, RenderSink, publish};
    use math_racer::platform::MemoryStore;
    use math_racer::sim::{GameEvent, RaceResult, RaceState, TickInput, UniformSource, seeded, tick};
    use math_racer::{BestTimes, Settings, format_race_time};

    /// Chance the bot types the right answer
    const BOT_ACCURACY: f32 = 0.8;
    /// How long the bot "thinks" before typing (ms)
    const BOT_THINK_MS: f64 = 1500.0;
    /// Give up after this much session time (ms)
    const MAX_SESSION_MS: f64 = 30.0 * 60.0 * 1000.0;

    /// Logs events and lap/rank changes
    #[derive(Default)]
    struct LogSink {
        last_lap: u32,
        last_rank: usize,
        result: Option<RaceResult>,
    }

    impl RenderSink for LogSink {
        fn render(&mut self, hud: &HudSnapshot) {
            if hud.lap.current != self.last_lap {
                log::info!(
                    "[{}] Lap {}/{} - {} at {} MPH",
                    hud.timer_label(),
                    hud.lap.current,
                    hud.lap.total,
                    hud.rank_label(),
                    hud.display_speed
                );
                self.last_lap = hud.lap.current;
            }
            self.last_rank = hud.rank;
        }

        fn notify(&mut self, event: &GameEvent) {
            match event {
                GameEvent::RaceFinished(result) => self.result = Some(result.clone()),
                GameEvent::RankChanged { rank } if *rank < self.last_rank => {
                    log::info!("Overtake! Now {}", math_racer::ordinal(*rank));
                }
                _ => log::debug!("{:?}", event),
            }
        }
    }

    /// Answer the open problem once the bot has "thought" long enough
    fn bot_answer(state: &RaceState, bot: &mut dyn UniformSource) -> Option<String> {
        let problem = state.problem.as_ref()?;
        let window_ms = state.settings.answer_time_seconds as f64 * 1000.0;
        if window_ms - problem.remaining_ms(state.clock_ms) < BOT_THINK_MS {
            return None;
        }
        let answer = if bot.next_unit() < BOT_ACCURACY {
            problem.hidden_value()
        } else {
            problem.hidden_value() + 1
        };
        Some(answer.to_string())
    }

    pub fn run(seed: u64) {
        let mut store = MemoryStore::default();
        let settings = Settings::load(&store);
        let mut best_times = BestTimes::load(&store);

        let mut rng = seeded(seed);
        let mut bot = seeded(seed.wrapping_add(1));
        let mut state = RaceState::new(settings, &mut rng);
        let mut sink = LogSink::default();

        let mut input = TickInput {
            start_race: true,
            ..Default::default()
        };
        while sink.result.is_none() && state.clock_ms < MAX_SESSION_MS {
            tick(&mut state, &input, &mut rng, FRAME_MS);
            publish(&mut state, &mut sink);
            input = TickInput {
                answer: bot_answer(&state, &mut bot),
                ..Default::default()
            };
        }

        let Some(result) = sink.result else {
            log::warn!("Race did not finish within {} ms", MAX_SESSION_MS);
            return;
        };

        println!(
            "\n{:?} - finished {} in {} ({} problems solved, {} missed)",
            result.outcome,
            math_racer::ordinal(result.rank),
            format_race_time(result.race_time_ms),
            result.problems_solved,
            state.problems_missed
        );
        if let Some(best_lap) = result.best_lap_ms {
            println!("Best lap: {}", format_race_time(best_lap));
        }
        if let Some(rank) = best_times.record(&result, state.total_laps, 0.0) {
            best_times.save(&mut store);
            println!("Best times rank: {}", rank);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Math Racer (native) starting...");
    log::info!("Headless race - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(42);
    log::info!("Seed: {}", seed);

    headless::run(seed);
}
