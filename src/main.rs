//! DO OR DO entry point
//!
//! Handles platform-specific initialization and runs the shell: a DOM
//! front-end on the web, a line-oriented one in a terminal. Both drive the
//! same engine; the shell owns presentation pacing (the savor pause) and
//! timer wakeups, nothing else.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlInputElement};

    use do_or_do::consts::*;
    use do_or_do::content::{self, MAX_LEVEL};
    use do_or_do::engine::{Journey, Phase};
    use do_or_do::platform::{self, WebStore};

    /// App instance holding the engine plus per-card view state.
    struct App {
        journey: Journey<WebStore>,
        /// Confirm was clicked and the savor pause is running; the card's
        /// controls stay disabled until the level swaps.
        completing: bool,
        /// Name of the attached photo, shown next to the card. The file
        /// itself is never read or uploaded.
        photo_name: Option<String>,
        /// Task the card state belongs to; a change resets the card.
        card_task_id: Option<u32>,
        /// Deadline an armed wakeup will fire at, to avoid stacking timeouts.
        wakeup_at: Option<i64>,
    }

    impl App {
        fn new() -> Self {
            Self {
                journey: Journey::load(WebStore::new(), platform::now_ms()),
                completing: false,
                photo_name: None,
                card_task_id: None,
                wakeup_at: None,
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("DO OR DO starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let app = Rc::new(RefCell::new(App::new()));

        setup_intro_buttons(app.clone());
        setup_card_controls(app.clone());
        setup_completed_button(app.clone());
        setup_post_game_button(app.clone());

        render(&app);

        log::info!("DO OR DO running!");
    }

    /// Redraw every screen from a fresh snapshot. Cheap enough to call
    /// after each intent and each timer wakeup.
    fn render(app: &Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let mut a = app.borrow_mut();
        let snap = a.journey.snapshot();

        // Card state belongs to one task; reset it when the task changes
        // or the card leaves the screen.
        match snap.task {
            Some(task) if a.card_task_id == Some(task.id) => {}
            Some(task) => {
                a.card_task_id = Some(task.id);
                a.completing = false;
                a.photo_name = None;
                clear_photo_input(&document);
            }
            None => {
                a.card_task_id = None;
                a.completing = false;
                a.photo_name = None;
            }
        }

        set_hidden(&document, "screen-intro", snap.phase != Phase::Intro);
        set_hidden(&document, "screen-playing", snap.phase != Phase::Playing);
        set_hidden(&document, "screen-completed", snap.phase != Phase::Completed);
        set_hidden(&document, "screen-postgame", snap.phase != Phase::PostGame);

        if let Some(el) = document.get_element_by_id("bloom") {
            let _ = el
                .class_list()
                .toggle_with_force("bloom-active", a.journey.bloom_active());
        }

        let message = a.journey.message();
        for id in ["intro-message", "playing-message"] {
            if let Some(el) = document.get_element_by_id(id) {
                el.set_text_content(Some(message.unwrap_or("")));
                let _ = el.class_list().toggle_with_force("hidden", message.is_none());
            }
        }

        if let Some(task) = snap.task {
            set_text(&document, "day-label", &format!("Day {}", snap.level));
            set_text(&document, "steps-label", &format!("{MAX_LEVEL} steps"));
            set_text(&document, "task-level", &format!("Level {}", task.id));
            set_text(&document, "task-narrative", &format!("\"{}\"", task.narrative));
            set_text(&document, "task-instruction", task.instruction);

            set_hidden(&document, "photo-empty", a.photo_name.is_some());
            set_hidden(&document, "photo-attached", a.photo_name.is_none());
            if let Some(name) = &a.photo_name {
                set_text(&document, "photo-name", name);
            }

            if let Some(btn) = document.get_element_by_id("confirm-btn") {
                let label = if a.completing {
                    "· · ·"
                } else if a.photo_name.is_some() {
                    "I Capture This Moment"
                } else {
                    "I Choose to DO This"
                };
                btn.set_text_content(Some(label));
                set_disabled(&btn, a.completing);
            }
            if let Some(btn) = document.get_element_by_id("skip-btn") {
                set_disabled(&btn, a.completing);
            }
        }

        if snap.phase == Phase::PostGame {
            set_text(
                &document,
                "reflection",
                content::reflection_for_day(platform::day_of_month()),
            );
        }
    }

    /// Arm one setTimeout for the engine's earliest pending deadline.
    /// Re-arms itself after firing until the timeline drains.
    fn arm_wakeup(app: &Rc<RefCell<App>>) {
        let fire_at = {
            let mut a = app.borrow_mut();
            let Some(fire_at) = a.journey.next_fire_at() else {
                return;
            };
            if a.wakeup_at.is_some_and(|t| t <= fire_at) {
                return; // an earlier wakeup is already on its way
            }
            a.wakeup_at = Some(fire_at);
            fire_at
        };

        let delay = (fire_at - platform::now_ms()).max(0) as i32;
        let app2 = app.clone();
        let closure = Closure::once(move || {
            {
                let mut a = app2.borrow_mut();
                a.wakeup_at = None;
                a.journey.advance(platform::now_ms());
            }
            render(&app2);
            arm_wakeup(&app2);
        });
        let window = web_sys::window().unwrap();
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay,
        );
        closure.forget();
    }

    fn setup_intro_buttons(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // DO
        if let Some(btn) = document.get_element_by_id("do-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().journey.begin(false, platform::now_ms());
                render(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // BEGIN AGAIN
        if let Some(btn) = document.get_element_by_id("reset-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().journey.begin(true, platform::now_ms());
                render(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_card_controls(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Confirm: savor pause first, then the engine takes over.
        if let Some(btn) = document.get_element_by_id("confirm-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                {
                    let mut a = app.borrow_mut();
                    if a.completing || a.journey.snapshot().phase != Phase::Playing {
                        return;
                    }
                    a.completing = true;
                }
                render(&app);

                let app2 = app.clone();
                let done = Closure::once(move || {
                    app2.borrow_mut().journey.task_complete(platform::now_ms());
                    render(&app2);
                    arm_wakeup(&app2);
                });
                let window = web_sys::window().unwrap();
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    done.as_ref().unchecked_ref(),
                    SAVOR_DELAY_MS as i32,
                );
                done.forget();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Skip for today
        if let Some(btn) = document.get_element_by_id("skip-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().journey.task_skip(platform::now_ms());
                render(&app);
                arm_wakeup(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Photo affordance opens the hidden file input.
        if let Some(btn) = document.get_element_by_id("photo-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(input) = document.get_element_by_id("photo-file") {
                    if let Ok(input) = input.dyn_into::<HtmlInputElement>() {
                        input.click();
                    }
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Only the chosen file's name is kept; the data never leaves the
        // picker.
        if let Some(input) = document.get_element_by_id("photo-file") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let name = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .and_then(|input| input.files())
                    .and_then(|files| files.get(0))
                    .map(|file| file.name());
                app.borrow_mut().photo_name = name;
                render(&app);
            });
            let _ =
                input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Remove the attached photo.
        if let Some(btn) = document.get_element_by_id("photo-clear") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                clear_photo_input(&document);
                app.borrow_mut().photo_name = None;
                render(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_completed_button(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("kings-path-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().journey.enter_post_game();
                render(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_post_game_button(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("begin-again-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().journey.begin(true, platform::now_ms());
                render(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_disabled(el: &Element, disabled: bool) {
        if disabled {
            let _ = el.set_attribute("disabled", "");
        } else {
            let _ = el.remove_attribute("disabled");
        }
    }

    fn clear_photo_input(document: &Document) {
        if let Some(input) = document.get_element_by_id("photo-file") {
            if let Ok(input) = input.dyn_into::<HtmlInputElement>() {
                input.set_value("");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::io::{self, BufRead, Write};
    use std::thread;
    use std::time::Duration;

    use do_or_do::consts::*;
    use do_or_do::content::{self, MAX_LEVEL};
    use do_or_do::engine::{Journey, Phase};
    use do_or_do::platform::{self, FileStore};

    pub fn run() {
        env_logger::init();

        let store = FileStore::discover();
        log::info!("Save file: {}", store.path().display());
        let mut journey = Journey::load(store, platform::now_ms());

        // Task id a `photo` command was recorded for in this session.
        let mut photo_for: Option<u32> = None;

        println!();
        println!("  DO OR DO");
        println!("  A Wonderland of Choice");
        render(&journey, photo_for);

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("> ");
            let _ = io::stdout().flush();
            let Some(Ok(line)) = lines.next() else {
                break;
            };
            let cmd = line.trim().to_ascii_lowercase();

            // Time passed while waiting on input; expired messages clear now.
            journey.advance(platform::now_ms());

            match cmd.as_str() {
                "do" => journey.begin(false, platform::now_ms()),
                "again" => {
                    journey.begin(true, platform::now_ms());
                    photo_for = None;
                }
                "done" => complete_ceremony(&mut journey, &mut photo_for),
                "skip" => journey.task_skip(platform::now_ms()),
                "photo" => attach_photo(&journey, &mut photo_for),
                "path" => journey.enter_post_game(),
                "help" | "?" => print_help(),
                "quit" | "exit" | "q" => break,
                "" => {}
                other => println!("  (\"{other}\"? try `help`)"),
            }

            journey.advance(platform::now_ms());
            render(&journey, photo_for);
        }

        println!();
        println!("  Until next time.");
    }

    /// The completion ritual: savor, confirm, bloom, and come back with the
    /// next day on screen. Blocking sleeps stand in for the web shell's
    /// timeouts.
    fn complete_ceremony(journey: &mut Journey<FileStore>, photo_for: &mut Option<u32>) {
        let Some(task) = journey.snapshot().task else {
            println!("  (nothing to complete right now)");
            return;
        };

        println!();
        if photo_for.take() == Some(task.id) {
            println!("  I Capture This Moment.");
        } else {
            println!("  I Choose to DO This.");
        }
        thread::sleep(Duration::from_millis(SAVOR_DELAY_MS as u64));

        journey.task_complete(platform::now_ms());
        println!("  · · · the light blooms · · ·");

        // Sleep the timeline dry: the swap lands mid-bloom, the bloom
        // finishes, and the new day is ready.
        while let Some(fire_at) = journey.next_fire_at() {
            let wait = fire_at - platform::now_ms();
            if wait > 0 {
                thread::sleep(Duration::from_millis(wait as u64));
            }
            journey.advance(platform::now_ms());
        }
    }

    fn attach_photo(journey: &Journey<FileStore>, photo_for: &mut Option<u32>) {
        match journey.snapshot().task {
            Some(task) => {
                *photo_for = Some(task.id);
                println!("  A moment captured. Photos stay on your device.");
            }
            None => println!("  (nothing to photograph right now)"),
        }
    }

    fn render(journey: &Journey<FileStore>, photo_for: Option<u32>) {
        let snap = journey.snapshot();
        println!();
        match snap.phase {
            Phase::Intro => {
                divider();
                println!("  Day {} of {}", snap.level.min(MAX_LEVEL), MAX_LEVEL);
                println!();
                println!("  do     begin the journey");
                println!("  again  begin again from the start");
                println!("  quit   leave for now");
            }
            Phase::Playing => {
                if let Some(task) = snap.task {
                    divider();
                    println!("  Day {}  ·  {} steps", snap.level, MAX_LEVEL);
                    println!();
                    println!("  Level {}  [{}]", task.id, task.category.as_str());
                    println!("  \"{}\"", task.narrative);
                    println!();
                    println!("  {}", task.instruction);
                    if photo_for == Some(task.id) {
                        println!();
                        println!("  (a photo is attached to this moment)");
                    }
                    divider();
                    println!("  done · skip · photo · help · quit");
                }
            }
            Phase::Completed => {
                divider();
                println!("  🜁  KING OF THE WORLD  🜁");
                println!();
                println!("  \"You didn't conquer the world.");
                println!("   You learned how to live inside it.\"");
                divider();
                println!("  path   walk the Kings' Path");
            }
            Phase::PostGame => {
                divider();
                println!("  Kings' Path");
                println!("  You are now a guide, not a ruler.");
                println!();
                println!("  Current reflection:");
                println!("  \"{}\"", content::reflection_for_day(platform::day_of_month()));
                divider();
                println!("  again  begin the journey again");
            }
        }
        if let Some(message) = journey.message() {
            println!();
            println!("  {message}");
        }
    }

    fn print_help() {
        println!("  do     begin the journey from the intro");
        println!("  done   complete today's task");
        println!("  skip   skip for today");
        println!("  photo  attach a photo to this moment (stays on your device)");
        println!("  path   step onto the Kings' Path after the final level");
        println!("  again  reset everything and begin anew");
        println!("  quit   leave; progress is already saved");
    }

    fn divider() {
        println!("  {}", "─".repeat(42));
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    cli::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
