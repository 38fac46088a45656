use kurbo::{Point, Size};
use tracing::debug;

use crate::{
    cache::{CacheManager, Fingerprint},
    compositor::render_cut,
    error::RinglensResult,
    geometry::ViewTransform,
    params::{CutParams, ParameterProvider, RotationMethod},
    raster::Raster,
    slots::{SLOT_COUNT, SlotRegistry},
    transition::{Clock, SystemClock, TransitionController},
};

/// Per-frame counters for verifying the active/inactive render split: how
/// many cuts were actually composited, how many were served from cache, and
/// whether the frame skipped the render pass entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub cut_renders: usize,
    pub cache_hits: usize,
    pub skipped: bool,
}

/// The watched field set for the dirty predicate. Per-slot fingerprints fold
/// in positions, parameters, and view geometry, so comparing two of these is
/// the whole "did anything change" question.
#[derive(Clone, Debug, PartialEq)]
struct WatchedState {
    selected: usize,
    fingerprints: [Option<Fingerprint>; SLOT_COUNT],
    canvas: (u32, u32),
    view: ViewTransform,
}

/// The concentric-ring compositing engine: owns the slot registry, per-slot
/// caches, transition clock, view state, frame counter, and the display
/// layer. Single-threaded; one frame's work runs to completion before the
/// next is considered.
pub struct Engine<C: Clock = SystemClock> {
    registry: SlotRegistry,
    cache: CacheManager,
    transition: TransitionController,
    view: ViewTransform,
    canvas: (u32, u32),
    source: Option<Raster>,
    display: Raster,
    frame: u64,
    clock: C,
    pending_transition: bool,
    last_active_method: Option<RotationMethod>,
    last_watched: Option<WatchedState>,
    stats: FrameStats,
}

impl Engine<SystemClock> {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self::with_clock(canvas_width, canvas_height, SystemClock::default())
    }
}

impl<C: Clock> Engine<C> {
    pub fn with_clock(canvas_width: u32, canvas_height: u32, clock: C) -> Self {
        Self {
            registry: SlotRegistry::new(),
            cache: CacheManager::new(),
            transition: TransitionController::new(),
            view: ViewTransform::identity(),
            canvas: (canvas_width, canvas_height),
            source: None,
            display: Raster::new(canvas_width, canvas_height),
            frame: 0,
            clock,
            pending_transition: false,
            last_active_method: None,
            last_watched: None,
            stats: FrameStats::default(),
        }
    }

    /// New-image lifecycle: clears all slots and caches, resets selection to
    /// slot 0, and cover-fits the view.
    pub fn set_source_image(&mut self, source: Raster) {
        debug!(
            width = source.width(),
            height = source.height(),
            "source image loaded"
        );
        self.view = ViewTransform::fit(raster_size(&source), self.canvas_size());
        self.source = Some(source);
        self.registry.reset();
        self.cache.invalidate_all();
        self.display.clear();
        self.last_watched = None;
        self.last_active_method = None;
    }

    /// Places or moves a cut (image-space coordinates) and arms a transition
    /// so the cut animates in from zero rotation. Returns false for an
    /// out-of-range slot.
    pub fn place_or_move_cut(&mut self, slot: usize, x: f64, y: f64) -> bool {
        let placed = self.registry.place(slot, x, y);
        if placed {
            self.pending_transition = true;
        }
        placed
    }

    /// Changes the selection; a real change arms a transition. Returns true
    /// only when the selection changed.
    pub fn select_slot(&mut self, slot: usize) -> bool {
        let changed = self.registry.select(slot);
        if changed {
            self.pending_transition = true;
            self.last_active_method = None;
        }
        changed
    }

    pub fn clear_slot(&mut self, slot: usize) -> bool {
        if self.registry.clear(slot) {
            self.cache.invalidate(slot);
            return true;
        }
        false
    }

    pub fn clear_all_cuts(&mut self) {
        self.registry.clear_all();
        self.cache.invalidate_all();
    }

    /// Geometry-affecting: invalidates every cache; a real size change also
    /// drops placements, whose canvas positions are no longer meaningful.
    pub fn on_canvas_resized(&mut self, width: u32, height: u32) {
        if (width, height) != self.canvas {
            self.canvas = (width, height);
            self.display = Raster::new(width, height);
            self.registry.clear_all();
            if let Some(source) = &self.source {
                self.view = ViewTransform::fit(raster_size(source), self.canvas_size());
            }
        }
        self.cache.invalidate_all();
    }

    /// Geometry-affecting: the view is clamped to keep the image covering
    /// the canvas, then every cache is invalidated.
    pub fn on_pan_or_zoom_changed(&mut self, view: ViewTransform) {
        self.view = match &self.source {
            Some(source) => view.clamped(raster_size(source), self.canvas_size()),
            None => view,
        };
        self.cache.invalidate_all();
    }

    /// Non-geometry edits: every slot but the active one is invalidated so
    /// the active cut's in-flight transition survives.
    pub fn on_non_geometry_parameter_changed(&mut self) {
        self.cache.invalidate_all_except(self.registry.selected());
    }

    /// Renders one frame into the display layer and returns it. The active
    /// cut composites directly at the current transition progress; inactive
    /// cuts go through the fingerprint cache at full rotation. A clean frame
    /// (dirty predicate false) returns the previous display layer untouched.
    #[tracing::instrument(skip(self, provider), fields(frame = self.frame))]
    pub fn render_frame(&mut self, provider: &dyn ParameterProvider) -> RinglensResult<&Raster> {
        self.stats = FrameStats::default();

        let Some(source) = self.source.take() else {
            self.stats.skipped = true;
            return Ok(&self.display);
        };

        let now = self.clock.now_ms();
        let selected = self.registry.selected();

        // Per-slot snapshots; a missing snapshot means defaults, not failure.
        let snapshots: [CutParams; SLOT_COUNT] =
            std::array::from_fn(|i| provider.params_for(i).unwrap_or_default().sanitized());

        // A rotation-method change on the active cut re-arms the transition,
        // as does a pending selection change or placement.
        let active_method = snapshots[selected].rotation_method;
        if self.last_active_method.is_some_and(|m| m != active_method) {
            self.pending_transition = true;
        }
        self.last_active_method = Some(active_method);
        if self.pending_transition {
            self.transition.arm(snapshots[selected].rotation_speed, now);
            self.pending_transition = false;
        }

        let watched = WatchedState {
            selected,
            fingerprints: std::array::from_fn(|i| {
                self.registry.position(i).map(|pos| {
                    let (center, diameter) = self.clamped_geometry(&source, pos, &snapshots[i]);
                    Fingerprint::of(&snapshots[i], center, diameter)
                })
            }),
            canvas: self.canvas,
            view: self.view,
        };

        let active_animated = self.registry.is_occupied(selected) && snapshots[selected].animated;
        let dirty = self.last_watched.as_ref() != Some(&watched)
            || !self.transition.is_settled()
            || active_animated;
        if !dirty {
            self.stats.skipped = true;
            self.source = Some(source);
            return Ok(&self.display);
        }

        self.frame += 1;
        let progress = self.transition.progress(now);
        let result = self.composite_pass(&source, &snapshots, &watched, selected, progress);
        self.source = Some(source);
        result?;

        self.last_watched = Some(watched);
        Ok(&self.display)
    }

    /// The render pass proper: active cut straight into the display layer,
    /// inactive cuts through the cache, ascending slot order throughout.
    fn composite_pass(
        &mut self,
        source: &Raster,
        snapshots: &[CutParams; SLOT_COUNT],
        watched: &WatchedState,
        selected: usize,
        progress: f64,
    ) -> RinglensResult<()> {
        let view = self.view;
        self.display.clear();

        for slot in self.registry.occupied().collect::<Vec<_>>() {
            let Some(pos) = self.registry.position(slot) else {
                continue;
            };
            let params = &snapshots[slot];
            let (center, _) = self.clamped_geometry(source, pos, params);

            if slot == selected {
                render_cut(
                    &mut self.display,
                    source,
                    &view,
                    center,
                    params,
                    progress,
                    self.frame,
                )?;
                self.stats.cut_renders += 1;
                continue;
            }

            // Fingerprint equality is the sole staleness test; fresh entries
            // never re-render.
            let Some(fingerprint) = watched.fingerprints[slot] else {
                continue;
            };
            if self.cache.is_stale(slot, &fingerprint) {
                debug!(slot, "inactive cut cache miss, re-rendering");
                let mut raster = Raster::new(self.canvas.0, self.canvas.1);
                render_cut(&mut raster, source, &view, center, params, 1.0, self.frame)?;
                self.cache.store(slot, raster, fingerprint);
                self.stats.cut_renders += 1;
            } else {
                self.stats.cache_hits += 1;
            }
            if let Some(raster) = self.cache.raster(slot) {
                self.display.blit_over(raster)?;
            }
        }

        Ok(())
    }

    /// Canvas-space cut center clamped into the image's on-canvas footprint,
    /// plus the outer diameter clamped to the zoomed image's smaller
    /// dimension. These are the values both the fingerprint and the
    /// compositor see.
    fn clamped_geometry(
        &self,
        source: &Raster,
        position: Point,
        params: &CutParams,
    ) -> (Point, f64) {
        let image_rect = self.view.image_rect_on_canvas(raster_size(source));
        let c = self.view.image_to_canvas(position);
        let center = Point::new(
            c.x.clamp(image_rect.x0, image_rect.x1),
            c.y.clamp(image_rect.y0, image_rect.y1),
        );
        let diameter = params
            .cut_size
            .min(image_rect.width().min(image_rect.height()))
            .max(1.0);
        (center, diameter)
    }

    pub fn display(&self) -> &Raster {
        &self.display
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn transition_settled(&self) -> bool {
        self.transition.is_settled()
    }

    pub fn transition_duration_ms(&self) -> f64 {
        self.transition.duration_ms()
    }

    fn canvas_size(&self) -> Size {
        Size::new(f64::from(self.canvas.0), f64::from(self.canvas.1))
    }
}

fn raster_size(r: &Raster) -> Size {
    Size::new(f64::from(r.width()), f64::from(r.height()))
}
