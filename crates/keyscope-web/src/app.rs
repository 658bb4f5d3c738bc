#![forbid(unsafe_code)]

//! `wasm-bindgen` exports and DOM glue. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use keyscope_core::view::{HeldKeyView, LogRowView, PATTERN_PLACEHOLDER, RepeatCountView};
use keyscope_core::{KeyEvent, KeyPhase, RenderRegions, Session};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, EventTarget, HtmlButtonElement, HtmlElement, HtmlInputElement,
    HtmlTableSectionElement, HtmlUListElement, KeyboardEvent, MouseEvent, Node, Performance,
};

use crate::{CONFIG_ATTRIBUTE, dom_ids, session_config_from_attribute};

thread_local! {
    static APP_INSTANCE: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "keyscope panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("keyscope panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn js_error_text(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Entry point run when the module is instantiated.
///
/// A failed mount here is not fatal: the script may have run before the
/// page body was parsed. The bootstrap script calls [`mount`] again once
/// the DOM is ready.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    install_panic_hook();
    if let Err(err) = mount() {
        warn!(
            target: "keyscope_web::mount",
            error = %js_error_text(&err),
            "mount at start failed; waiting for host retry"
        );
    }
    Ok(())
}

/// Mount onto the current document. No-op when already mounted.
#[wasm_bindgen]
pub fn mount() -> Result<(), JsValue> {
    install_panic_hook();
    if APP_INSTANCE.with(|slot| slot.borrow().is_some()) {
        return Ok(());
    }
    let app = App::init().inspect_err(|err| {
        console_error(&format!("keyscope: mount failed: {}", js_error_text(err)));
    })?;
    APP_INSTANCE.with(|slot| {
        *slot.borrow_mut() = Some(app);
    });
    debug!(target: "keyscope_web::mount", "mounted");
    Ok(())
}

/// Dispatch one JSON-encoded key event through the pause gate and renderer.
/// Returns `false` if the input was rejected or nothing is mounted.
///
/// `ts` is read on the page's `performance.now()` clock, the same clock as
/// DOM event timestamps. Events stamped before the session origin (mount,
/// or the latest reset) are rejected.
#[wasm_bindgen(js_name = pushEncodedInput)]
pub fn push_encoded_input(json: &str) -> bool {
    let event = match KeyEvent::from_json_str(json) {
        Ok(event) => event,
        Err(err) => {
            warn!(
                target: "keyscope_web::input",
                error = %err,
                "rejected encoded input"
            );
            return false;
        }
    };
    with_app(|app| {
        let mut state = app.state.borrow_mut();
        if let Err(err) = state.session.check_timestamp(&event) {
            warn!(
                target: "keyscope_web::input",
                error = %err,
                "rejected encoded input"
            );
            return false;
        }
        state.handle_key(&event);
        true
    })
    .unwrap_or(false)
}

/// Current session view as JSON, or `"null"` when nothing is mounted.
#[wasm_bindgen(js_name = snapshotJson)]
pub fn snapshot_json() -> String {
    with_app(|app| {
        let mut state = app.state.borrow_mut();
        state.sync_pause();
        state.session.snapshot().to_json_string()
    })
    .and_then(Result::ok)
    .unwrap_or_else(|| "null".to_string())
}

/// Clear every store; the pause checkbox is left as it is.
#[wasm_bindgen(js_name = resetSession)]
pub fn reset_session() {
    let _ = with_app(|app| app.state.borrow_mut().reset(false));
}

/// Clear every store and unpause.
#[wasm_bindgen(js_name = clearSession)]
pub fn clear_session() {
    let _ = with_app(|app| app.state.borrow_mut().reset(true));
}

fn with_app<R>(f: impl FnOnce(&App) -> R) -> Option<R> {
    APP_INSTANCE.with(|slot| slot.borrow().as_ref().map(f))
}

struct App {
    state: Rc<RefCell<AppState>>,
    _keydown: Closure<dyn FnMut(KeyboardEvent)>,
    _keyup: Closure<dyn FnMut(KeyboardEvent)>,
    _pause_change: Closure<dyn FnMut(Event)>,
    _clear: Closure<dyn FnMut(MouseEvent)>,
    _body_click: Closure<dyn FnMut(MouseEvent)>,
}

/// Page elements the renderer writes to.
struct Dom {
    document: Document,
    body: HtmlElement,
    held_keys: HtmlUListElement,
    no_held_keys: HtmlElement,
    event_log: HtmlTableSectionElement,
    pattern_sequence: HtmlElement,
    pattern_counts: HtmlUListElement,
    pause_toggle: HtmlInputElement,
    clear_button: HtmlButtonElement,
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing {id} element")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("{id} element has the wrong type")))
}

impl Dom {
    fn lookup(document: Document) -> Result<Self, JsValue> {
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("missing body"))?;
        Ok(Self {
            held_keys: element_by_id(&document, dom_ids::HELD_KEYS)?,
            no_held_keys: element_by_id(&document, dom_ids::NO_HELD_KEYS)?,
            event_log: element_by_id(&document, dom_ids::EVENT_LOG)?,
            pattern_sequence: element_by_id(&document, dom_ids::PATTERN_SEQUENCE)?,
            pattern_counts: element_by_id(&document, dom_ids::PATTERN_COUNTS)?,
            pause_toggle: element_by_id(&document, dom_ids::PAUSE_TOGGLE)?,
            clear_button: element_by_id(&document, dom_ids::CLEAR_BUTTON)?,
            body,
            document,
        })
    }

    /// `<li><span class="pill-key">key</span><span class="pill-meta">meta</span></li>`
    fn pill(&self, key: &str, meta: &str) -> Result<Node, JsValue> {
        let li = self.document.create_element("li")?;
        let key_span = self.document.create_element("span")?;
        key_span.set_class_name("pill-key");
        key_span.set_text_content(Some(key));
        li.append_child(&key_span)?;
        let meta_span = self.document.create_element("span")?;
        meta_span.set_class_name("pill-meta");
        meta_span.set_text_content(Some(meta));
        li.append_child(&meta_span)?;
        Ok(li.into())
    }
}

/// One DOM listener registration, kept so a failed init can undo it.
struct Listener<'a> {
    target: &'a EventTarget,
    kind: &'static str,
    callback: &'a js_sys::Function,
    capture: bool,
}

/// Attach every listener or none: on failure the ones already attached are
/// removed before their closures are dropped.
fn attach_all(listeners: &[Listener<'_>]) -> Result<(), JsValue> {
    for (idx, listener) in listeners.iter().enumerate() {
        if let Err(err) = listener.target.add_event_listener_with_callback_and_bool(
            listener.kind,
            listener.callback,
            listener.capture,
        ) {
            for attached in &listeners[..idx] {
                let _ = attached.target.remove_event_listener_with_callback_and_bool(
                    attached.kind,
                    attached.callback,
                    attached.capture,
                );
            }
            return Err(err);
        }
    }
    Ok(())
}

struct AppState {
    dom: Dom,
    performance: Performance,
    session: Session,
}

impl App {
    fn init() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("missing document"))?;
        let performance = window
            .performance()
            .ok_or_else(|| JsValue::from_str("missing performance"))?;
        let dom = Dom::lookup(document.clone())?;

        let config_attr = dom.body.get_attribute(CONFIG_ATTRIBUTE);
        let config = session_config_from_attribute(config_attr.as_deref());
        let session = Session::new(config, performance.now());
        debug!(
            target: "keyscope_web::mount",
            log_capacity = config.log_capacity,
            pattern_capacity = config.pattern_capacity,
            "session created"
        );

        let body = dom.body.clone();
        let clear_button = dom.clear_button.clone();
        let pause_toggle = dom.pause_toggle.clone();
        let state = Rc::new(RefCell::new(AppState {
            dom,
            performance,
            session,
        }));

        body.set_attribute("tabindex", "0")?;
        body.focus()?;
        state.borrow().render(RenderRegions::all())?;

        let keydown_state = Rc::clone(&state);
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let event = key_event_from_dom(&event, KeyPhase::Down);
            keydown_state.borrow_mut().handle_key(&event);
        });

        let keyup_state = Rc::clone(&state);
        let keyup = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let event = key_event_from_dom(&event, KeyPhase::Up);
            keyup_state.borrow_mut().handle_key(&event);
        });

        let pause_state = Rc::clone(&state);
        let pause_change = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            pause_state.borrow_mut().sync_pause();
        });

        let clear_state = Rc::clone(&state);
        let clear = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
            clear_state.borrow_mut().reset(true);
        });

        let body_for_click = body.clone();
        let body_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
            let _ = body_for_click.focus();
        });

        attach_all(&[
            Listener {
                target: &document,
                kind: "keydown",
                callback: keydown.as_ref().unchecked_ref(),
                capture: true,
            },
            Listener {
                target: &document,
                kind: "keyup",
                callback: keyup.as_ref().unchecked_ref(),
                capture: true,
            },
            Listener {
                target: &pause_toggle,
                kind: "change",
                callback: pause_change.as_ref().unchecked_ref(),
                capture: false,
            },
            Listener {
                target: &clear_button,
                kind: "click",
                callback: clear.as_ref().unchecked_ref(),
                capture: false,
            },
            Listener {
                target: &body,
                kind: "click",
                callback: body_click.as_ref().unchecked_ref(),
                capture: false,
            },
        ])?;

        Ok(Self {
            state,
            _keydown: keydown,
            _keyup: keyup,
            _pause_change: pause_change,
            _clear: clear,
            _body_click: body_click,
        })
    }
}

fn key_event_from_dom(event: &KeyboardEvent, phase: KeyPhase) -> KeyEvent {
    match phase {
        KeyPhase::Down => KeyEvent::down(
            event.key(),
            event.code(),
            event.repeat(),
            event.time_stamp(),
        ),
        KeyPhase::Up => KeyEvent::up(event.key(), event.code(), event.time_stamp()),
    }
}

impl AppState {
    /// Copy the checkbox into the gate. The checkbox is the source of truth.
    fn sync_pause(&mut self) {
        self.session.set_paused(self.dom.pause_toggle.checked());
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        self.sync_pause();
        let regions = self.session.dispatch(event);
        if let Err(err) = self.render(regions) {
            console_error(&format!("keyscope: render failed: {}", js_error_text(&err)));
        }
    }

    fn reset(&mut self, unpause: bool) {
        let now = self.performance.now();
        let regions = if unpause {
            self.dom.pause_toggle.set_checked(false);
            self.session.clear(now)
        } else {
            self.sync_pause();
            self.session.reset(now)
        };
        self.dom.event_log.set_inner_html("");
        if let Err(err) = self.render(regions - RenderRegions::LOG) {
            console_error(&format!("keyscope: render failed: {}", js_error_text(&err)));
        }
    }

    fn render(&self, regions: RenderRegions) -> Result<(), JsValue> {
        if regions.contains(RenderRegions::HELD) {
            self.render_held_keys()?;
        }
        if regions.contains(RenderRegions::LOG) {
            self.render_newest_log_row()?;
        }
        if regions.contains(RenderRegions::PATTERN) {
            self.render_pattern_sequence();
            self.render_pattern_counts()?;
        }
        Ok(())
    }

    fn render_held_keys(&self) -> Result<(), JsValue> {
        let dom = &self.dom;
        dom.held_keys.set_inner_html("");
        let held = self.session.held();
        if held.is_empty() {
            dom.no_held_keys.set_hidden(false);
            return Ok(());
        }
        dom.no_held_keys.set_hidden(true);

        let fragment = dom.document.create_document_fragment();
        for view in held.sorted().into_iter().map(HeldKeyView::from) {
            fragment.append_child(&dom.pill(&view.key, &view.code)?)?;
        }
        dom.held_keys.append_child(&fragment)?;
        Ok(())
    }

    /// Prepend the newest record and trim the table to the log capacity.
    fn render_newest_log_row(&self) -> Result<(), JsValue> {
        let Some(record) = self.session.log().newest() else {
            return Ok(());
        };
        let body = &self.dom.event_log;
        let row = self.dom.document.create_element("tr")?;
        row.set_inner_html(&LogRowView::from(record).to_html());
        body.insert_before(&row, body.first_child().as_ref())?;

        let capacity = self.session.log().capacity();
        while body.child_element_count() as usize > capacity {
            let Some(last) = body.last_child() else {
                break;
            };
            body.remove_child(&last)?;
        }
        Ok(())
    }

    fn render_pattern_sequence(&self) {
        let patterns = self.session.patterns();
        let text = if patterns.is_empty() {
            PATTERN_PLACEHOLDER.to_string()
        } else {
            patterns.sequence()
        };
        self.dom.pattern_sequence.set_text_content(Some(&text));
    }

    fn render_pattern_counts(&self) -> Result<(), JsValue> {
        let dom = &self.dom;
        dom.pattern_counts.set_inner_html("");
        let ranked = self.session.patterns().ranked();
        if ranked.is_empty() {
            return Ok(());
        }
        let fragment = dom.document.create_document_fragment();
        for view in ranked.into_iter().map(RepeatCountView::from) {
            fragment.append_child(&dom.pill(&view.key, &view.meta_text())?)?;
        }
        dom.pattern_counts.append_child(&fragment)?;
        Ok(())
    }
}
