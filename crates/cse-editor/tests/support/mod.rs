//! In-memory host doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cse_core::{ElementFrame, Point, Rect};
use cse_editor::buffer::RopeEditor;
use cse_editor::host::{
    CanvasView, DocumentStore, ElementInfo, ElementPath, EntryKind, HostError, LiveCanvas,
    MarkdownRenderer, Panel, SettingsStore, StoreError, TextEditor, VaultPreferences,
    ZoomObserver,
};
use cse_editor::{CanvasAttachment, PanelParts, PointerEvent, Settings, Transition};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CANVAS_PATH: &str = "Boards/Plan.canvas";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Vault ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Read(String),
    Write(String),
    CreateBinary(String),
    CreateFolder(String),
}

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    folders: Mutex<BTreeSet<String>>,
    ops: Mutex<Vec<StoreOp>>,
    prefs: VaultPreferences,
    write_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), text.as_bytes().to_vec());
        self
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.folders.lock().unwrap().insert(path.to_string());
        self
    }

    pub fn with_prefs(mut self, prefs: VaultPreferences) -> Self {
        self.prefs = prefs;
        self
    }

    /// Writes take `delay` to land; the op is recorded once they do.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn text(&self, path: &str) -> Option<String> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .map(|b| String::from_utf8(b.clone()).unwrap())
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Write(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    fn record(&self, op: StoreOp) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<String, StoreError> {
        self.record(StoreOp::Read(path.to_string()));
        self.text(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), StoreError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(StoreOp::Write(path.to_string()));
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), text.as_bytes().to_vec());
        Ok(())
    }

    fn resolve(&self, path: &str) -> Option<EntryKind> {
        if self.files.lock().unwrap().contains_key(path) {
            return Some(EntryKind::File);
        }
        let prefix = format!("{path}/");
        let implied = self
            .files
            .lock()
            .unwrap()
            .keys()
            .any(|k| k.starts_with(&prefix));
        (implied || self.folders.lock().unwrap().contains(path)).then_some(EntryKind::Folder)
    }

    async fn create_binary(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.record(StoreOp::CreateBinary(path.to_string()));
        let mut files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        self.record(StoreOp::CreateFolder(path.to_string()));
        self.folders.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    fn preferences(&self) -> VaultPreferences {
        self.prefs.clone()
    }
}

// ─── Live canvas ─────────────────────────────────────────────────────────

enum Reply {
    Value(Value),
    Fail,
}

#[derive(Default)]
pub struct FakeLiveCanvas {
    methods: HashMap<String, Reply>,
    properties: Mutex<HashMap<String, Value>>,
    zoom_seam: bool,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    observer: Mutex<Option<Arc<dyn ZoomObserver>>>,
}

impl FakeLiveCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, name: &str, reply: Value) -> Self {
        self.methods.insert(name.to_string(), Reply::Value(reply));
        self
    }

    pub fn with_failing_method(mut self, name: &str) -> Self {
        self.methods.insert(name.to_string(), Reply::Fail);
        self
    }

    pub fn with_property(self, name: &str, value: Value) -> Self {
        self.set_property(name, value);
        self
    }

    /// Change a property while the canvas is in use.
    pub fn set_property(&self, name: &str, value: Value) {
        self.properties
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
    }

    pub fn with_zoom_seam(mut self) -> Self {
        self.zoom_seam = true;
        self
    }

    pub fn calls_to(&self, name: &str) -> Vec<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn has_observer(&self) -> bool {
        self.observer.lock().unwrap().is_some()
    }

    /// The host's zoom-to-selection action, hooks included.
    pub async fn zoom_to_selection(&self) {
        let observer = self.observer.lock().unwrap().clone();
        if let Some(observer) = &observer {
            observer.before_zoom().await;
        }
        self.calls
            .lock()
            .unwrap()
            .push(("zoomToSelection".to_string(), vec![]));
        if let Some(observer) = &observer {
            observer.after_zoom().await;
        }
    }
}

impl LiveCanvas for FakeLiveCanvas {
    fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, HostError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), args.to_vec()));
        match self.methods.get(name) {
            Some(Reply::Value(v)) => Ok(v.clone()),
            Some(Reply::Fail) => Err(HostError::Failed {
                method: name.to_string(),
                message: "rejected".to_string(),
            }),
            None => Err(HostError::Unsupported(name.to_string())),
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.lock().unwrap().get(name).cloned()
    }

    fn set_zoom_observer(&self, observer: Option<Arc<dyn ZoomObserver>>) -> bool {
        if !self.zoom_seam {
            return false;
        }
        *self.observer.lock().unwrap() = observer;
        true
    }
}

// ─── Canvas view ─────────────────────────────────────────────────────────

pub struct FakeView {
    pub path: Option<String>,
    pub live: Option<Arc<FakeLiveCanvas>>,
    /// Card elements, in document order.
    pub cards: Vec<(Rect, ElementPath)>,
    pub frames: Vec<ElementFrame>,
    pub viewport: Option<ElementFrame>,
    pub is_canvas: bool,
}

impl FakeView {
    /// A canvas at 1:1 zoom whose viewport sits at the screen origin.
    pub fn canvas() -> Self {
        Self {
            path: Some(CANVAS_PATH.to_string()),
            live: None,
            cards: Vec::new(),
            frames: Vec::new(),
            viewport: Some(ElementFrame::new(Point::ORIGIN, None)),
            is_canvas: true,
        }
    }

    /// Some other kind of view (markdown, graph, ...).
    pub fn not_canvas() -> Self {
        Self {
            path: Some("Notes/A.md".to_string()),
            is_canvas: false,
            ..Self::canvas()
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_live(mut self, live: Arc<FakeLiveCanvas>) -> Self {
        self.live = Some(live);
        self
    }

    /// A card element carrying `data-node-id`.
    pub fn with_card(mut self, id: &str, rect: Rect) -> Self {
        let path = vec![
            ElementInfo::with_class("markdown-rendered"),
            ElementInfo {
                node_id_attr: Some(id.to_string()),
                classes: vec!["canvas-node".to_string()],
                ..ElementInfo::default()
            },
        ];
        self.cards.push((rect, path));
        self
    }

    pub fn with_frame(mut self, frame: ElementFrame) -> Self {
        self.frames.push(frame);
        self
    }
}

impl CanvasView for FakeView {
    fn is_canvas(&self) -> bool {
        self.is_canvas
    }

    fn file_path(&self) -> Option<String> {
        self.path.clone()
    }

    fn live_canvas(&self) -> Option<Arc<dyn LiveCanvas>> {
        self.live.clone().map(|l| l as Arc<dyn LiveCanvas>)
    }

    fn elements_at(&self, screen: Point) -> Vec<ElementPath> {
        self.cards
            .iter()
            .rev()
            .filter(|(rect, _)| rect.contains(screen))
            .map(|(_, path)| path.clone())
            .collect()
    }

    fn transform_frames(&self) -> Vec<ElementFrame> {
        self.frames.clone()
    }

    fn viewport_frame(&self) -> Option<ElementFrame> {
        self.viewport.clone()
    }
}

// ─── Panel widgets ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingRenderer {
    renders: Mutex<Vec<(String, String)>>,
}

impl RecordingRenderer {
    pub fn renders(&self) -> Vec<(String, String)> {
        self.renders.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.renders().into_iter().map(|(t, _)| t).collect()
    }

    pub fn clear(&self) {
        self.renders.lock().unwrap().clear();
    }
}

#[async_trait]
impl MarkdownRenderer for RecordingRenderer {
    async fn render(&self, text: &str, source_path: &str) -> Result<(), HostError> {
        self.renders
            .lock()
            .unwrap()
            .push((text.to_string(), source_path.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PanelLog {
    pub visible: bool,
    pub shows: usize,
    pub hides: usize,
    pub preview_collapsed: Option<bool>,
}

pub struct RecordingPanel(pub Arc<Mutex<PanelLog>>);

impl Panel for RecordingPanel {
    fn show(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.visible = true;
        log.shows += 1;
    }

    fn hide(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.visible = false;
        log.hides += 1;
    }

    fn set_preview_collapsed(&mut self, collapsed: bool) {
        self.0.lock().unwrap().preview_collapsed = Some(collapsed);
    }
}

/// A `RopeEditor` the test can keep typing into after handing it over.
pub struct SharedEditor(pub Arc<Mutex<RopeEditor>>);

impl TextEditor for SharedEditor {
    fn text(&self) -> String {
        self.0.lock().unwrap().text()
    }

    fn replace_all(&mut self, text: &str) {
        self.0.lock().unwrap().replace_all(text);
    }

    fn insert_at_cursor(&mut self, text: &str) {
        self.0.lock().unwrap().insert_at_cursor(text);
    }

    fn focus(&mut self) {
        self.0.lock().unwrap().focus();
    }
}

#[derive(Default)]
pub struct MemorySettings {
    data: Mutex<Option<Value>>,
    saves: Mutex<usize>,
}

impl MemorySettings {
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Mutex::new(Some(data)),
            saves: Mutex::new(0),
        }
    }

    pub fn data(&self) -> Option<Value> {
        self.data.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self) -> Result<Option<Value>, StoreError> {
        Ok(self.data())
    }

    async fn save(&self, data: Value) -> Result<(), StoreError> {
        *self.data.lock().unwrap() = Some(data);
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Widgets for one panel plus handles to observe them.
#[derive(Clone)]
pub struct Widgets {
    pub renderer: Arc<RecordingRenderer>,
    pub panel: Arc<Mutex<PanelLog>>,
    pub editor: Arc<Mutex<RopeEditor>>,
}

impl Widgets {
    pub fn new() -> Self {
        Self {
            renderer: Arc::new(RecordingRenderer::default()),
            panel: Arc::new(Mutex::new(PanelLog::default())),
            editor: Arc::new(Mutex::new(RopeEditor::default())),
        }
    }

    pub fn parts(&self) -> PanelParts {
        PanelParts {
            editor: Box::new(SharedEditor(self.editor.clone())),
            panel: Box::new(RecordingPanel(self.panel.clone())),
            renderer: self.renderer.clone(),
        }
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────

/// One attached canvas with recording doubles all around.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub view: Arc<FakeView>,
    pub widgets: Widgets,
    pub settings: Arc<MemorySettings>,
    pub attachment: CanvasAttachment,
    pub clock: Mutex<Duration>,
}

impl Harness {
    pub fn new(view: FakeView, store: MemoryStore) -> Self {
        Self::with_settings(view, store, Settings::default())
    }

    pub fn with_settings(view: FakeView, store: MemoryStore, settings: Settings) -> Self {
        init_logging();
        let store = Arc::new(store);
        let view = Arc::new(view);
        let widgets = Widgets::new();
        let settings_store = Arc::new(MemorySettings::default());
        let attachment = CanvasAttachment::attach(
            view.clone(),
            store.clone(),
            widgets.parts(),
            settings,
            settings_store.clone(),
        );
        Self {
            store,
            view,
            widgets,
            settings: settings_store,
            attachment,
            clock: Mutex::new(Duration::from_secs(10)),
        }
    }

    fn tick(&self, by: Duration) -> Duration {
        let mut clock = self.clock.lock().unwrap();
        *clock += by;
        *clock
    }

    pub async fn press(&self, x: f64, y: f64) {
        let t = self.tick(Duration::from_millis(500));
        self.attachment
            .pointer_down(&PointerEvent::down(x, y, t))
            .await;
    }

    pub async fn release(&self, x: f64, y: f64) -> Transition {
        let t = self.tick(Duration::from_millis(60));
        self.attachment.pointer_up(&PointerEvent::up(x, y, t)).await
    }

    /// A qualifying single click.
    pub async fn click(&self, x: f64, y: f64) -> Transition {
        self.press(x, y).await;
        self.release(x, y).await
    }

    /// Press at `from`, move to `to` in one step, release there.
    pub async fn drag(&self, from: (f64, f64), to: (f64, f64)) -> Transition {
        self.press(from.0, from.1).await;
        let t = self.tick(Duration::from_millis(30));
        self.attachment
            .pointer_move(&PointerEvent::moved(to.0, to.1, t));
        self.release(to.0, to.1).await
    }

    /// Type at the caret and notify the controller, like the editor widget.
    pub async fn type_text(&self, text: &str) {
        self.widgets.editor.lock().unwrap().type_text(text);
        self.attachment.controller().lock().await.buffer_changed();
    }

    pub fn buffer(&self) -> String {
        self.widgets.editor.lock().unwrap().text()
    }

    pub fn panel(&self) -> PanelLog {
        self.widgets.panel.lock().unwrap().clone()
    }

    pub fn canvas_json(&self) -> Value {
        serde_json::from_str(&self.store.text(CANVAS_PATH).unwrap()).unwrap()
    }
}

/// Pretty canvas JSON, laid out the way the host writes it.
pub fn canvas_text(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap()
}
