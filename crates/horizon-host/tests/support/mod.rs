//! Scripted host and engine shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use horizon_host::engine::{Engine, EngineModule, TextureId};
use horizon_host::host::{Host, ImageRequest, SurfaceId};
use horizon_host::time::FrameTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Instantiate,
    Initialize,
    Fetch(String),
    Upload(String, TextureId),
    Render(TextureId, u64),
    Release(TextureId),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Returns `Pending` once so that concurrent setups interleave.
pub struct YieldOnce(bool);

impl YieldOnce {
    pub fn new() -> Self {
        Self(false)
    }
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockImage(pub String);

#[derive(Debug)]
pub struct MockContext;

pub struct MockHost {
    pub log: EventLog,
    surfaces: HashSet<SurfaceId>,
    broken_images: HashSet<String>,
    slow_images: HashSet<String>,
    pub context_available: Cell<bool>,
    pub frame_requests: RefCell<Vec<SurfaceId>>,
}

impl MockHost {
    pub fn new(log: EventLog, surfaces: &[&str]) -> Self {
        Self {
            log,
            surfaces: surfaces.iter().map(|s| SurfaceId::from(*s)).collect(),
            broken_images: HashSet::new(),
            slow_images: HashSet::new(),
            context_available: Cell::new(true),
            frame_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_broken_image(mut self, source: &str) -> Self {
        self.broken_images.insert(source.to_string());
        self
    }

    /// Makes fetches of `source` take a few extra polls to resolve.
    pub fn with_slow_image(mut self, source: &str) -> Self {
        self.slow_images.insert(source.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Fetch(_)))
            .count()
    }
}

impl Host for MockHost {
    type Surface = SurfaceId;
    type Image = MockImage;
    type Context = MockContext;

    fn resolve_surface(&self, id: &SurfaceId) -> Option<SurfaceId> {
        self.surfaces.get(id).cloned()
    }

    async fn fetch_image(&self, request: &ImageRequest) -> anyhow::Result<MockImage> {
        self.log.borrow_mut().push(Event::Fetch(request.raw().to_string()));
        YieldOnce::new().await;
        if self.slow_images.contains(request.raw()) {
            for _ in 0..3 {
                YieldOnce::new().await;
            }
        }
        if self.broken_images.contains(request.raw()) {
            anyhow::bail!("404 Not Found");
        }
        Ok(MockImage(request.raw().to_string()))
    }

    fn drawing_context(&self, _surface: &SurfaceId) -> Option<MockContext> {
        self.context_available.get().then_some(MockContext)
    }

    fn request_frame(&self, surface: &SurfaceId) {
        self.frame_requests.borrow_mut().push(surface.clone());
    }
}

pub struct RecordingEngine {
    log: EventLog,
    next_texture: u64,
    textures: HashMap<TextureId, String>,
    pub fail_render: bool,
}

impl RecordingEngine {
    pub fn texture_source(&self, texture: TextureId) -> Option<&str> {
        self.textures.get(&texture).map(String::as_str)
    }
}

impl Engine for RecordingEngine {
    type Image = MockImage;
    type Context = MockContext;

    fn initialize(&mut self) {
        self.log.borrow_mut().push(Event::Initialize);
    }

    fn load_texture(&mut self, image: MockImage) -> anyhow::Result<TextureId> {
        self.next_texture += 1;
        let texture = TextureId(self.next_texture);
        self.log
            .borrow_mut()
            .push(Event::Upload(image.0.clone(), texture));
        self.textures.insert(texture, image.0);
        Ok(texture)
    }

    fn render(
        &mut self,
        texture: TextureId,
        _ctx: &mut MockContext,
        time: &FrameTime,
    ) -> anyhow::Result<()> {
        anyhow::ensure!(self.textures.contains_key(&texture), "unknown {texture}");
        if self.fail_render {
            anyhow::bail!("out of video memory");
        }
        self.log
            .borrow_mut()
            .push(Event::Render(texture, time.frame_index));
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.log.borrow_mut().push(Event::Release(texture));
    }
}

pub struct RecordingModule {
    log: EventLog,
    failures_left: Cell<u32>,
}

impl RecordingModule {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            failures_left: Cell::new(0),
        }
    }

    pub fn failing_first(log: EventLog, failures: u32) -> Self {
        Self {
            log,
            failures_left: Cell::new(failures),
        }
    }
}

impl EngineModule for RecordingModule {
    type Engine = RecordingEngine;

    async fn instantiate(&self) -> anyhow::Result<RecordingEngine> {
        self.log.borrow_mut().push(Event::Instantiate);
        YieldOnce::new().await;
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            anyhow::bail!("module compilation failed");
        }
        Ok(RecordingEngine {
            log: self.log.clone(),
            next_texture: 0,
            textures: HashMap::new(),
            fail_render: false,
        })
    }
}

pub fn count(log: &EventLog, pred: impl Fn(&Event) -> bool) -> usize {
    log.borrow().iter().filter(|e| pred(e)).count()
}
