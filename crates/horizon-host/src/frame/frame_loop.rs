use std::time::Duration;

use super::handle::{LoopHandle, LoopId};
use super::throttle::LogThrottle;
use crate::config::{FailurePolicy, HostConfig};
use crate::engine::{Engine, EngineHandle, TextureId};
use crate::error::FrameError;
use crate::host::{Host, SurfaceId};
use crate::time::FrameClock;

/// Result of delivering one tick to a loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The engine drew a frame.
    Rendered,
    /// No frame this tick (context unavailable or a skipped render failure);
    /// the next tick was requested.
    Skipped,
    /// The loop had not requested a tick; nothing happened.
    Idle,
    /// The loop was cancelled; it did not draw or reschedule.
    Stopped,
    /// The render call failed under `StopOnError`; the loop ended.
    Failed,
    /// No loop is bound to the surface.
    NoLoop,
}

impl TickOutcome {
    /// Whether the loop ended with this tick.
    pub fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::Stopped | TickOutcome::Failed)
    }
}

/// Recurring render task for one surface.
pub struct FrameLoop<S, E> {
    handle: LoopHandle,
    surface: S,
    texture: TextureId,
    engine: EngineHandle<E>,
    clock: FrameClock,
    policy: FailurePolicy,
    missing_context: LogThrottle,
    render_failures: LogThrottle,
    armed: bool,
}

impl<S, E: Engine> FrameLoop<S, E> {
    /// Creates a running loop. It does not tick until [`FrameLoop::schedule`]
    /// requested a frame from the host.
    pub fn start(
        id: LoopId,
        surface_id: SurfaceId,
        surface: S,
        texture: TextureId,
        engine: EngineHandle<E>,
        config: &HostConfig,
    ) -> (Self, LoopHandle) {
        let handle = LoopHandle::new(id, surface_id);
        let frame_loop = Self {
            handle: handle.clone(),
            surface,
            texture,
            engine,
            clock: config.frame_clock(),
            policy: config.failure_policy,
            missing_context: LogThrottle::new(config.log_every),
            render_failures: LogThrottle::new(config.log_every),
            armed: false,
        };
        (frame_loop, handle)
    }

    pub fn id(&self) -> LoopId {
        self.handle.id()
    }

    pub fn surface_id(&self) -> &SurfaceId {
        self.handle.surface()
    }

    pub fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    /// Whether a tick has been requested and not yet delivered.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Requests the next tick from the host.
    pub fn schedule<H: Host>(&mut self, host: &H) {
        host.request_frame(self.handle.surface());
        self.armed = true;
    }

    /// Delivers one host tick at timestamp `now`.
    pub fn tick<H>(&mut self, host: &H, now: Duration) -> TickOutcome
    where
        H: Host<Surface = S, Context = E::Context>,
    {
        if !self.armed {
            return TickOutcome::Idle;
        }
        self.armed = false;

        if !self.handle.is_running() {
            return TickOutcome::Stopped;
        }

        let time = self.clock.tick(now);

        let outcome = match host.drawing_context(&self.surface) {
            None => {
                self.handle.record_skipped();
                if let Some(streak) = self.missing_context.hit() {
                    log::warn!(
                        "surface `{}`: drawing context unavailable, skipping render ({streak} consecutive frames)",
                        self.surface_id()
                    );
                }
                TickOutcome::Skipped
            }
            Some(mut ctx) => {
                if let Some(streak) = self.missing_context.clear() {
                    log::info!(
                        "surface `{}`: drawing context available again after {streak} frames",
                        self.surface_id()
                    );
                }

                let texture = self.texture;
                let result = self
                    .engine
                    .with_mut(|engine| engine.render(texture, &mut ctx, &time));

                match result {
                    Ok(()) => {
                        self.handle.record_rendered();
                        if let Some(streak) = self.render_failures.clear() {
                            log::info!(
                                "surface `{}`: rendering recovered after {streak} failed frames",
                                self.surface_id()
                            );
                        }
                        TickOutcome::Rendered
                    }
                    Err(reason) => match self.policy {
                        FailurePolicy::SkipAndContinue => {
                            self.handle.record_skipped();
                            if let Some(streak) = self.render_failures.hit() {
                                log::warn!(
                                    "surface `{}`: render failed at frame {} ({streak} consecutive): {reason:#}",
                                    self.surface_id(),
                                    time.frame_index
                                );
                            }
                            TickOutcome::Skipped
                        }
                        FailurePolicy::StopOnError => {
                            log::error!(
                                "surface `{}`: render failed at frame {}, stopping {}: {reason:#}",
                                self.surface_id(),
                                time.frame_index,
                                self.id()
                            );
                            self.handle.fail(FrameError::RenderFatal {
                                surface: self.surface_id().clone(),
                                frame: time.frame_index,
                                reason,
                            });
                            return TickOutcome::Failed;
                        }
                    },
                }
            }
        };

        // The engine or an observer may have cancelled the loop during the tick.
        if !self.handle.is_running() {
            return TickOutcome::Stopped;
        }

        self.schedule(host);
        outcome
    }

    /// Ends the loop and hands its texture back to the engine.
    pub fn retire(self) {
        self.handle.stop();
        let texture = self.texture;
        self.engine
            .with_mut(|engine| engine.release_texture(texture));
        log::debug!(
            "surface `{}`: {} retired, released {texture}",
            self.surface_id(),
            self.id()
        );
    }
}
