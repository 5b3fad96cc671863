use std::sync::{mpsc, Arc};
use std::task::Poll;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use buddhabrot4d_core::{
    AxisProjector, Blend, BuddhabrotConfig, ChannelThresholds, Density, RotationModel, ViewRect,
    VolumeTriple,
};

use crate::accumulator::{Accumulator, Channel};
use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::events::{EventBus, ScanEvent, ScanEventKind};
use crate::mask::{BoundaryMask, MaskBuilder};
use crate::scan::{ScanOutcome, ScanTask};
use crate::schedule::{ScanControl, YieldClock};
use crate::tone::ToneMapper;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Where the engine is in its lifecycle.
///
/// `Done` and `Canceled` record how the last scan ended; like `Idle` they
/// accept a new `initialize()` or `scan()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Uninitialized,
    Initializing,
    Idle,
    Scanning,
    Done,
    Canceled,
}

impl ScanState {
    pub fn can_become(self, next: ScanState) -> bool {
        use ScanState::*;
        matches!(
            (self, next),
            (Uninitialized | Initializing | Idle | Done | Canceled, Initializing)
                | (Initializing, Idle)
                | (Idle | Done | Canceled, Scanning)
                | (Scanning, Done | Canceled)
                | (Initializing | Idle | Done | Canceled, Uninitialized)
        )
    }

    /// `true` while a cooperative job needs ticks.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Initializing | Self::Scanning)
    }
}

type Completion = Box<dyn FnOnce(bool) + Send>;

struct ActiveScan {
    task: ScanTask,
    on_complete: Option<Completion>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The 4D Buddhabrot engine.
///
/// Owns the boundary mask, the accumulator and the output buffer, and runs
/// the boundary pass and the scan as cooperative jobs: each call to
/// [`tick`](Self::tick) does at most one yield interval of work. Hosts call
/// `tick` from their frame or idle callback and [`render`](Self::render)
/// from their own, independent, refresh tick.
pub struct Buddhabrot {
    config: BuddhabrotConfig,
    view: ViewRect,
    rotation: RotationModel,
    state: ScanState,
    mask: Option<BoundaryMask>,
    builder: Option<MaskBuilder>,
    active: Option<ActiveScan>,
    accumulator: Accumulator,
    control: Arc<ScanControl>,
    buffer: RenderBuffer,
    repaint: bool,
    done_painting: bool,
    events: EventBus,
    epoch: Instant,
}

impl Buddhabrot {
    pub fn new(mut config: BuddhabrotConfig) -> crate::Result<Self> {
        config.validate()?;
        config.set_angles(config.latitude, config.longitude);
        let view = config.view()?;
        Ok(Self {
            rotation: RotationModel::new(config.latitude, config.longitude),
            accumulator: Accumulator::new(view.width, view.height),
            buffer: RenderBuffer::new(view.width, view.height),
            config,
            view,
            state: ScanState::Uninitialized,
            mask: None,
            builder: None,
            active: None,
            control: Arc::new(ScanControl::new()),
            repaint: false,
            done_painting: false,
            events: EventBus::default(),
            epoch: Instant::now(),
        })
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Start (or restart) building the boundary mask. The work happens in
    /// subsequent [`tick`](Self::tick) calls.
    pub fn initialize(&mut self) -> crate::Result<()> {
        if self.state == ScanState::Scanning {
            return Err(RenderError::ScanInFlight);
        }
        self.transition(ScanState::Initializing)?;
        self.mask = None;
        self.builder = Some(MaskBuilder::new(self.view, self.config.boundary_cap));
        self.done_painting = false;
        self.repaint = true;
        Ok(())
    }

    /// Start a scan. `on_complete` receives `true` unless the scan is
    /// canceled.
    ///
    /// Without a built mask this does nothing and reports `false` at once.
    pub fn scan<F>(&mut self, on_complete: F) -> crate::Result<()>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        if self.state == ScanState::Scanning {
            return Err(RenderError::ScanInFlight);
        }
        if self.mask.is_none() {
            debug!(state = ?self.state, "Scan requested before the boundary mask is built");
            on_complete(false);
            return Ok(());
        }
        self.transition(ScanState::Scanning)?;

        self.accumulator.reset();
        self.rotation = RotationModel::new(self.config.latitude, self.config.longitude);
        let projector =
            AxisProjector::new(self.config.selection(), *self.rotation.matrix(), self.view);
        let task = ScanTask::new(
            projector,
            self.config.thresholds,
            self.config.min_escape,
            self.config.effective_oversampling(),
            Arc::clone(&self.control),
        );
        self.active = Some(ActiveScan {
            task,
            on_complete: Some(Box::new(on_complete)),
        });
        self.done_painting = false;
        self.repaint = true;
        self.emit(ScanEventKind::ScanStart, true);
        Ok(())
    }

    /// Do one yield interval of pending work. Returns `true` while more
    /// ticks are needed.
    pub fn tick(&mut self) -> crate::Result<bool> {
        let clock = YieldClock::new(self.config.yield_interval());
        match self.state {
            ScanState::Initializing => self.advance_initialization(&clock)?,
            ScanState::Scanning => self.advance_scan(&clock)?,
            _ => {}
        }
        Ok(self.state.is_busy())
    }

    /// Tick until no job is pending.
    pub fn run_until_idle(&mut self) -> crate::Result<()> {
        while self.tick()? {}
        Ok(())
    }

    /// Stop the running scan after its current row and wait for it to
    /// settle. The completion callback receives `false`. Accumulated counts
    /// are kept.
    pub fn cancel(&mut self) -> crate::Result<()> {
        if self.state != ScanState::Scanning {
            return Ok(());
        }
        info!("Scan cancel requested");
        self.control.request_cancel();
        while self.state == ScanState::Scanning {
            self.tick()?;
        }
        Ok(())
    }

    /// Refresh the output buffer if anything changed since the last call.
    ///
    /// Before the mask exists the (partial) mask itself is shown; after
    /// that, the tone-mapped accumulator. Once a scan has completed and been
    /// rendered, further calls reuse the buffer.
    pub fn render(&mut self) -> &RenderBuffer {
        if self.repaint {
            if self.mask.is_some() {
                self.buffer = self.tone_mapper().render(&self.accumulator);
            } else if let Some(builder) = &self.builder {
                self.buffer = RenderBuffer::from_mask(builder.partial());
            }
            if self.done_painting {
                self.repaint = false;
            }
        }
        &self.buffer
    }

    fn advance_initialization(&mut self, clock: &YieldClock) -> crate::Result<()> {
        let Some(builder) = self.builder.as_mut() else {
            return Ok(());
        };
        if let Poll::Ready(mask) = builder.step(clock) {
            self.builder = None;
            self.mask = Some(mask);
            self.transition(ScanState::Idle)?;
        }
        Ok(())
    }

    fn advance_scan(&mut self, clock: &YieldClock) -> crate::Result<()> {
        let (Some(active), Some(mask)) = (self.active.as_mut(), self.mask.as_ref()) else {
            return Ok(());
        };
        if let Poll::Ready(outcome) = active.task.step(mask, &mut self.accumulator, clock) {
            self.finish_scan(outcome)?;
        }
        Ok(())
    }

    fn finish_scan(&mut self, outcome: ScanOutcome) -> crate::Result<()> {
        let success = outcome.success();
        let active = self.active.take();
        info!(
            rows = outcome.rows(),
            red = self.accumulator.total(Channel::Red),
            green = self.accumulator.total(Channel::Green),
            blue = self.accumulator.total(Channel::Blue),
            "Accumulated samples"
        );
        self.done_painting = true;
        self.repaint = true;
        self.transition(if success {
            ScanState::Done
        } else {
            ScanState::Canceled
        })?;
        self.emit(ScanEventKind::ScanEnd, success);
        if let Some(callback) = active.and_then(|a| a.on_complete) {
            callback(success);
        }
        Ok(())
    }

    fn transition(&mut self, next: ScanState) -> crate::Result<()> {
        if !self.state.can_become(next) {
            return Err(RenderError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
        Ok(())
    }

    fn emit(&mut self, kind: ScanEventKind, success: bool) {
        debug!(
            event = kind.name(),
            success,
            subscribers = self.events.len(),
            "Dispatching scan event"
        );
        let event = ScanEvent {
            kind,
            config: self.config.clone(),
            success,
            timestamp: self.epoch.elapsed(),
        };
        self.events.emit(event);
    }

    // -- Observers ----------------------------------------------------------

    /// Receive `scan-start` / `scan-end` events. Drop the receiver to stop.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &BuddhabrotConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn view(&self) -> &ViewRect {
        &self.view
    }

    pub fn rotation(&self) -> &RotationModel {
        &self.rotation
    }

    /// Scan progress in `[0, 1]`, or `-1` when no scan is running.
    pub fn progress(&self) -> f64 {
        self.control.progress()
    }

    /// `true` until the current scan has gathered all its data.
    pub fn painting(&self) -> bool {
        !self.done_painting
    }

    pub fn done_painting(&self) -> bool {
        self.done_painting
    }

    pub fn is_initialized(&self) -> bool {
        self.mask.is_some()
    }

    pub fn mask(&self) -> Option<&BoundaryMask> {
        self.mask.as_ref()
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Shared handle for cancelling or polling progress from another thread.
    pub fn control(&self) -> Arc<ScanControl> {
        Arc::clone(&self.control)
    }

    pub fn tone_mapper(&self) -> ToneMapper {
        ToneMapper::new(self.config.brightness, self.config.color_cap)
    }

    // -- Settings: take effect on the next scan -------------------------------

    pub fn set_latitude_longitude(&mut self, latitude: f64, longitude: f64) {
        self.config.set_angles(latitude, longitude);
        self.rotation.set(latitude, longitude);
    }

    /// Rotate as if the canvas had been dragged by `(dx, dy)` pixels.
    pub fn drag_rotation(&mut self, dx: f64, dy: f64) {
        let half_max_dim = self.view.width.max(self.view.height) as f64 / 2.0;
        self.rotation.drag(dx, dy, half_max_dim);
        self.config
            .set_angles(self.rotation.latitude(), self.rotation.longitude());
    }

    pub fn set_color_thresholds(&mut self, thresholds: ChannelThresholds) -> crate::Result<()> {
        self.update(|cfg| cfg.thresholds = thresholds)
    }

    pub fn set_blend(&mut self, blend: Blend) {
        self.config.blend = blend;
    }

    pub fn set_volume_a(&mut self, volume: VolumeTriple) {
        self.config.volume_a = volume;
    }

    pub fn set_volume_b(&mut self, volume: VolumeTriple) {
        self.config.volume_b = volume;
    }

    pub fn set_min_escape(&mut self, min_escape: u32) {
        self.config.min_escape = min_escape;
    }

    pub fn set_oversampling(&mut self, oversampling: Option<u32>) -> crate::Result<()> {
        self.update(|cfg| cfg.oversampling = oversampling)
    }

    pub fn set_density(&mut self, density: Density) {
        self.config.oversampling = Some(density.oversampling(self.view.width, self.view.height));
    }

    pub fn set_yield_interval(&mut self, interval: Duration) {
        self.config.yield_interval_ms = interval.as_millis().min(u64::MAX as u128) as u64;
    }

    // -- Settings: tone mapping only ------------------------------------------

    pub fn set_brightness(&mut self, brightness: f64) -> crate::Result<()> {
        self.update(|cfg| cfg.brightness = brightness)?;
        self.repaint = true;
        Ok(())
    }

    pub fn set_color_cap(&mut self, color_cap: u32) -> crate::Result<()> {
        self.update(|cfg| cfg.color_cap = color_cap)?;
        self.repaint = true;
        Ok(())
    }

    // -- Settings: invalidate the mask ----------------------------------------

    pub fn set_boundary_cap(&mut self, cap: u32) -> crate::Result<()> {
        if cap == self.config.boundary_cap {
            return Ok(());
        }
        if self.state == ScanState::Scanning {
            return Err(RenderError::ScanInFlight);
        }
        self.update(|cfg| cfg.boundary_cap = cap)?;
        self.invalidate()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> crate::Result<()> {
        if (width, height) == (self.view.width, self.view.height) {
            return Ok(());
        }
        if self.state == ScanState::Scanning {
            return Err(RenderError::ScanInFlight);
        }
        self.update(|cfg| {
            cfg.width = width;
            cfg.height = height;
        })?;
        self.view = self.config.view()?;
        self.accumulator = Accumulator::new(width, height);
        self.buffer = RenderBuffer::new(width, height);
        self.invalidate()
    }

    /// Replace every setting at once, invalidating the mask only when the
    /// canvas or the boundary cap changed. Nothing changes on error.
    pub fn apply_config(&mut self, mut config: BuddhabrotConfig) -> crate::Result<()> {
        config.validate()?;
        let canvas_changed = (config.width, config.height) != (self.view.width, self.view.height);
        let cap_changed = config.boundary_cap != self.config.boundary_cap;
        if self.state == ScanState::Scanning && (canvas_changed || cap_changed) {
            return Err(RenderError::ScanInFlight);
        }
        let view = if canvas_changed {
            config.view()?
        } else {
            self.view
        };

        config.set_angles(config.latitude, config.longitude);
        if config.brightness != self.config.brightness || config.color_cap != self.config.color_cap
        {
            self.repaint = true;
        }
        self.rotation.set(config.latitude, config.longitude);
        self.config = config;

        if canvas_changed {
            self.view = view;
            self.accumulator = Accumulator::new(view.width, view.height);
            self.buffer = RenderBuffer::new(view.width, view.height);
        }
        if canvas_changed || cap_changed {
            self.invalidate()?;
        }
        Ok(())
    }

    fn update(&mut self, f: impl FnOnce(&mut BuddhabrotConfig)) -> crate::Result<()> {
        let mut candidate = self.config.clone();
        f(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    fn invalidate(&mut self) -> crate::Result<()> {
        debug!("Boundary mask invalidated");
        self.mask = None;
        self.builder = None;
        self.done_painting = false;
        self.repaint = true;
        if self.state != ScanState::Uninitialized {
            self.transition(ScanState::Uninitialized)?;
        }
        Ok(())
    }
}
