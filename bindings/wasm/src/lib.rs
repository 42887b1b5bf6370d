//! WebAssembly bindings for sheetload
//!
//! Loads the spreadsheet engine bundles into the current page by injecting
//! `<script>` elements in dependency order, then initializes the engine
//! through a JavaScript host object:
//!
//! ```js
//! import init, { loadBundles } from "sheetload-wasm";
//!
//! await init();
//! const engine = await loadBundles("/static/engine", {
//!   construct: (config) => new Engine(config),
//!   registerPlugin: (engine, plugin) => engine.registerPlugin(plugins[plugin.name], plugin.options),
//!   createUnit: (engine, type, data) => engine.createUnit(type, data),
//! }, {
//!   onEvent: (event) => console.log(event.level, event.message),
//!   onToast: (title, message) => toast.error(title, message),
//! });
//! ```

use std::fmt::Display;

use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use sheetload::{
    EngineConfig, EngineHost, EventSink, InitPlan, LoadEvent, Manifest, Notifier, PluginSpec,
    ScriptLoader, Sequencer, SequencerOptions, UnitKind, WorkbookData,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlScriptElement};

// =============================================================================
// Error Conversion
// =============================================================================

fn to_js_error(e: impl Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Best-effort description of a thrown JS value
fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Serialize with plain objects instead of JS `Map`s
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

fn document() -> Result<Document, String> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document available".to_string())
}

// =============================================================================
// DomScriptLoader - injects <script> elements into document.head
// =============================================================================

pub struct DomScriptLoader {
    document: Document,
}

impl DomScriptLoader {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            document: document()?,
        })
    }
}

impl ScriptLoader for DomScriptLoader {
    type Error = String;

    async fn load(&self, url: &str) -> Result<(), String> {
        let script: HtmlScriptElement = self
            .document
            .create_element("script")
            .map_err(|e| js_message(&e))?
            .dyn_into()
            .map_err(|_| "created element is not a <script>".to_string())?;
        script.set_src(url);
        script.set_type("text/javascript");

        // Executes synchronously, so borrowing the element is fine
        let settled = Promise::new(&mut |resolve: Function, reject: Function| {
            script.set_onload(Some(&resolve));
            script.set_onerror(Some(&reject));
        });

        let head = self
            .document
            .head()
            .ok_or_else(|| "document has no <head>".to_string())?;
        head.append_child(&script).map_err(|e| js_message(&e))?;

        let result = JsFuture::from(settled).await;
        script.set_onload(None);
        script.set_onerror(None);
        result
            .map(|_| ())
            .map_err(|_| format!("script failed to load: {url}"))
    }
}

// =============================================================================
// JsHost - forwards the engine construction API to a JS object
// =============================================================================

pub struct JsHost {
    target: JsValue,
}

impl JsHost {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, String> {
        let f = Reflect::get(&self.target, &JsValue::from_str(method)).map_err(|e| js_message(&e))?;
        let f: Function = f
            .dyn_into()
            .map_err(|_| format!("host.{method} is not a function"))?;
        let args: Array = args.iter().collect();
        f.apply(&self.target, &args).map_err(|e| js_message(&e))
    }
}

impl EngineHost for JsHost {
    type Instance = JsValue;
    type Error = String;

    fn construct(&mut self, config: &EngineConfig) -> Result<JsValue, String> {
        self.call("construct", &[to_js(config)?])
    }

    fn register_plugin(&mut self, instance: &mut JsValue, plugin: &PluginSpec) -> Result<(), String> {
        self.call("registerPlugin", &[instance.clone(), to_js(plugin)?])
            .map(|_| ())
    }

    fn create_unit(
        &mut self,
        instance: &mut JsValue,
        kind: UnitKind,
        data: &WorkbookData,
    ) -> Result<(), String> {
        self.call(
            "createUnit",
            &[instance.clone(), JsValue::from_str(kind.as_str()), to_js(data)?],
        )
        .map(|_| ())
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Forwards status events to `options.onEvent`
struct CallbackSink {
    callback: Function,
}

impl EventSink for CallbackSink {
    fn emit(&self, event: &LoadEvent) {
        let payload = match to_js(event) {
            Ok(payload) => payload,
            Err(e) => {
                web_sys::console::warn_1(&JsValue::from_str(&e));
                return;
            }
        };
        if let Err(e) = self.callback.call1(&JsValue::NULL, &payload) {
            web_sys::console::warn_1(&e);
        }
    }
}

/// Forwards failure toasts to `options.onToast`, or the console without one
struct CallbackNotifier {
    callback: Option<Function>,
}

impl Notifier for CallbackNotifier {
    fn notify(&self, title: &str, message: &str) {
        let (title, message) = (JsValue::from_str(title), JsValue::from_str(message));
        match &self.callback {
            Some(f) => {
                if let Err(e) = f.call2(&JsValue::NULL, &title, &message) {
                    web_sys::console::warn_1(&e);
                }
            }
            None => web_sys::console::error_2(&title, &message),
        }
    }
}

fn optional_function(options: &JsValue, key: &str) -> Result<Option<Function>, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(None);
    }
    let value = Reflect::get(options, &JsValue::from_str(key)).map_err(|e| to_js_error(js_message(&e)))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| JsError::new(&format!("options.{key} must be a function")))
}

fn optional_manifest(options: &JsValue) -> Result<Manifest, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(Manifest::default_bundles());
    }
    let value = Reflect::get(options, &JsValue::from_str("manifest")).map_err(|e| to_js_error(js_message(&e)))?;
    if value.is_undefined() || value.is_null() {
        return Ok(Manifest::default_bundles());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

// =============================================================================
// Exports
// =============================================================================

/// Load every bundle from `baseUrl` and initialize the engine through `host`.
///
/// `options` may carry `onEvent(event)`, `onToast(title, message)` and a
/// custom `manifest` array. Resolves with whatever `host.construct` returned.
#[wasm_bindgen(js_name = loadBundles)]
pub async fn load_bundles(base_url: String, host: JsValue, options: JsValue) -> Result<JsValue, JsError> {
    let manifest = optional_manifest(&options)?;
    let on_event = optional_function(&options, "onEvent")?;
    let on_toast = optional_function(&options, "onToast")?;

    let loader = DomScriptLoader::new().map_err(to_js_error)?;
    // No tokio timer driver in the browser event loop
    let mut sequencer = Sequencer::new(loader, JsHost::new(host))
        .with_options(SequencerOptions::unbounded())
        .with_notifier(CallbackNotifier { callback: on_toast });
    if let Some(callback) = on_event {
        sequencer = sequencer.with_event_sink(CallbackSink { callback });
    }

    let report = sequencer
        .run(&manifest, &base_url)
        .await
        .map_err(to_js_error)?;
    Ok(report.instance)
}

/// The built-in bundle manifest as a plain array of descriptors
#[wasm_bindgen(js_name = defaultManifest)]
pub fn default_manifest() -> Result<JsValue, JsError> {
    to_js(&Manifest::default_bundles()).map_err(to_js_error)
}

/// The workbook data the engine's default unit is created from
#[wasm_bindgen(js_name = defaultWorkbook)]
pub fn default_workbook() -> Result<JsValue, JsError> {
    to_js(&InitPlan::default().workbook).map_err(to_js_error)
}

#[wasm_bindgen(start)]
pub fn init() {}
