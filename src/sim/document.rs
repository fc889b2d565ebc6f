//! Simulated DOM: frames with controllable load signals, plus plain elements.

use super::window::SimWindow;
use crate::collaborators::{Document, FrameElement, FrameKind, FrameSpec, MountedFrame};
use crate::messenger::WindowTarget;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use url::Url;

/// When appended frames fire their load event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Boot the frame and fire load right away
    Immediate,
    /// Never fire load (unreachable origin)
    Never,
    /// Wait for [`SimDocument::fire_load`]
    Manual,
}

/// Runs a frame's page scripts: `(frame window, parent window)`
pub type FrameBootHook = Arc<dyn Fn(&SimWindow, &SimWindow) + Send + Sync>;

pub struct SimFrame {
    src: Url,
    kind: FrameKind,
    window: SimWindow,
    parent: SimWindow,
    attached: AtomicBool,
    load_signal: Mutex<Option<oneshot::Sender<()>>>,
}

impl SimFrame {
    pub fn window(&self) -> &SimWindow {
        &self.window
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    fn fire_load(&self) -> bool {
        match self.load_signal.lock().take() {
            Some(signal) => signal.send(()).is_ok(),
            None => false,
        }
    }
}

impl FrameElement for SimFrame {
    fn src(&self) -> Url {
        self.src.clone()
    }

    fn content_window(&self) -> Arc<dyn WindowTarget> {
        self.parent.handle_to(&self.window)
    }

    fn remove(&self) {
        if self.attached.swap(false, Ordering::SeqCst) {
            self.window.close();
            self.load_signal.lock().take();
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimElement {
    pub src: Option<String>,
    pub visible: bool,
}

/// Document of one window
pub struct SimDocument {
    window: SimWindow,
    frames: Mutex<Vec<Arc<SimFrame>>>,
    elements: Mutex<HashMap<String, SimElement>>,
    load_behavior: RwLock<LoadBehavior>,
    boot_hook: RwLock<Option<FrameBootHook>>,
}

impl SimDocument {
    pub fn new(window: SimWindow) -> Self {
        Self {
            window,
            frames: Mutex::new(Vec::new()),
            elements: Mutex::new(HashMap::new()),
            load_behavior: RwLock::new(LoadBehavior::Immediate),
            boot_hook: RwLock::new(None),
        }
    }

    pub fn window(&self) -> &SimWindow {
        &self.window
    }

    pub fn set_load_behavior(&self, behavior: LoadBehavior) {
        *self.load_behavior.write() = behavior;
    }

    /// Install the page script every frame runs before its load event
    pub fn on_frame_boot<F>(&self, hook: F)
    where
        F: Fn(&SimWindow, &SimWindow) + Send + Sync + 'static,
    {
        *self.boot_hook.write() = Some(Arc::new(hook));
    }

    /// Boot and fire load for the attached frame at `src`
    pub fn fire_load(&self, src: &Url) -> bool {
        let frame = self
            .frames
            .lock()
            .iter()
            .rev()
            .find(|f| f.src == *src && f.is_attached())
            .cloned();
        match frame {
            Some(frame) => {
                self.boot(&frame);
                frame.fire_load()
            }
            None => false,
        }
    }

    fn boot(&self, frame: &SimFrame) {
        let hook = self.boot_hook.read().clone();
        if let Some(hook) = hook {
            hook(&frame.window, &frame.parent);
        }
    }

    pub fn frames(&self) -> Vec<Arc<SimFrame>> {
        self.frames.lock().clone()
    }

    pub fn attached_frames(&self, src: &Url) -> usize {
        self.frames
            .lock()
            .iter()
            .filter(|f| f.src == *src && f.is_attached())
            .count()
    }

    pub fn element(&self, dom_id: &str) -> Option<SimElement> {
        self.elements.lock().get(dom_id).cloned()
    }
}

impl Document for SimDocument {
    fn remove_frames_with_src(&self, src: &Url) -> usize {
        let frames = self.frames.lock().clone();
        let mut removed = 0;
        for frame in frames.iter().filter(|f| f.src == *src && f.is_attached()) {
            frame.remove();
            removed += 1;
        }
        removed
    }

    fn append_frame(&self, spec: FrameSpec) -> MountedFrame {
        let (signal, loaded) = oneshot::channel();
        let frame = Arc::new(SimFrame {
            src: spec.src.clone(),
            kind: spec.kind,
            window: SimWindow::open(spec.src),
            parent: self.window.clone(),
            attached: AtomicBool::new(true),
            load_signal: Mutex::new(Some(signal)),
        });
        if let Some(container) = spec.container_id {
            self.elements.lock().insert(
                container,
                SimElement {
                    src: None,
                    visible: !spec.hidden,
                },
            );
        }
        self.frames.lock().push(Arc::clone(&frame));

        let behavior = *self.load_behavior.read();
        if behavior == LoadBehavior::Immediate {
            self.boot(&frame);
            frame.fire_load();
        }

        MountedFrame {
            element: frame,
            loaded,
        }
    }

    fn append_pixel(&self, dom_id: &str, src: &str) {
        self.elements.lock().insert(
            dom_id.to_string(),
            SimElement {
                src: Some(src.to_string()),
                visible: true,
            },
        );
    }

    fn remove_element(&self, dom_id: &str) -> bool {
        self.elements.lock().remove(dom_id).is_some()
    }

    fn has_element(&self, dom_id: &str) -> bool {
        self.elements.lock().contains_key(dom_id)
    }

    fn reveal_element(&self, dom_id: &str) {
        if let Some(element) = self.elements.lock().get_mut(dom_id) {
            element.visible = true;
        }
    }
}
