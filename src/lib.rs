#![forbid(unsafe_code)]

//! Concentric-ring kinetic image distortion ("cinetisation"): up to six
//! circular cut regions over a displayed image, each decomposed into
//! rotating rings. One cut is active and animates every frame; the rest are
//! rendered once into per-slot caches and blitted until their parameter
//! fingerprints change, keeping frame cost bounded.

pub mod cache;
pub mod compositor;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod params;
pub mod raster;
pub mod slots;
pub mod transition;

pub use cache::{CacheManager, Fingerprint};
pub use compositor::{WAVE_FREQUENCY, render_cut, ring_angle_deg};
pub use engine::{Engine, FrameStats};
pub use error::{RinglensError, RinglensResult};
pub use geometry::{ViewTransform, fit_contain, fit_cover, min_zoom, pan_bounds};
pub use params::{CutParams, ParameterProvider, RotationMethod, parse_rotation_method};
pub use raster::{PremulRgba8, Raster};
pub use slots::{CutSlot, SLOT_COUNT, SlotRegistry};
pub use transition::{Clock, SystemClock, TARGET_FPS, TransitionController};
