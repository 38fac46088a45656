use kurbo::Point;
use tracing::debug;

use crate::{
    params::{CutParams, RotationMethod},
    raster::Raster,
    slots::SLOT_COUNT,
};

/// Quantization step for float fields: 1/4096 canvas pixels (or degrees).
/// Coarse enough to absorb drift from repeated pan/zoom clamping, fine enough
/// that any real geometry change misses the cache.
const QUANT: f64 = 4096.0;

fn quantize(v: f64) -> i64 {
    (v * QUANT).round() as i64
}

/// The exact set of inputs that determine a cached raster's validity.
/// Structural field-wise equality is the sole staleness test; floats are
/// quantized so the derived `Eq` is total and drift-proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    center_x: i64,
    center_y: i64,
    diameter: i64,
    ring_count: u32,
    rotation_amount: i64,
    rotation_speed: i64,
    animated: bool,
    method: RotationMethod,
}

impl Fingerprint {
    /// `center` and `diameter` are the clamped canvas-space values the
    /// compositor will actually render with.
    pub fn of(params: &CutParams, center: Point, diameter: f64) -> Self {
        Self {
            center_x: quantize(center.x),
            center_y: quantize(center.y),
            diameter: quantize(diameter),
            ring_count: params.slice_amount,
            rotation_amount: quantize(params.rotation_amount),
            rotation_speed: quantize(params.rotation_speed),
            animated: params.animated,
            method: params.rotation_method,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct CacheEntry {
    raster: Option<Raster>,
    fingerprint: Option<Fingerprint>,
}

/// Per-slot rendered rasters keyed by the fingerprint that produced them.
/// Inactive cuts are served from here; the selected slot never is.
#[derive(Clone, Debug)]
pub struct CacheManager {
    entries: [CacheEntry; SLOT_COUNT],
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    pub fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| CacheEntry::default()),
        }
    }

    /// True when no raster exists for the slot or the stored fingerprint
    /// differs in any field.
    pub fn is_stale(&self, slot: usize, fingerprint: &Fingerprint) -> bool {
        let entry = &self.entries[slot];
        entry.raster.is_none() || entry.fingerprint.as_ref() != Some(fingerprint)
    }

    /// Replaces the slot's cache contents; the previous raster is dropped.
    pub fn store(&mut self, slot: usize, raster: Raster, fingerprint: Fingerprint) {
        self.entries[slot] = CacheEntry {
            raster: Some(raster),
            fingerprint: Some(fingerprint),
        };
    }

    pub fn raster(&self, slot: usize) -> Option<&Raster> {
        self.entries[slot].raster.as_ref()
    }

    pub fn invalidate(&mut self, slot: usize) {
        if slot < SLOT_COUNT {
            self.entries[slot] = CacheEntry::default();
        }
    }

    pub fn invalidate_all(&mut self) {
        debug!("invalidating all cut caches");
        for entry in &mut self.entries {
            *entry = CacheEntry::default();
        }
    }

    /// Invalidates every slot but `keep`; used for non-geometry edits that
    /// must not disturb the active slot's in-flight transition.
    pub fn invalidate_all_except(&mut self, keep: usize) {
        debug!(keep, "invalidating cut caches except one");
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if i != keep {
                *entry = CacheEntry::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(amount: f64) -> Fingerprint {
        Fingerprint::of(
            &CutParams {
                rotation_amount: amount,
                ..CutParams::default()
            },
            Point::new(100.0, 100.0),
            300.0,
        )
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fp(10.0), fp(10.0));
    }

    #[test]
    fn fingerprint_changes_when_params_change() {
        assert_ne!(fp(10.0), fp(20.0));
        let a = Fingerprint::of(&CutParams::default(), Point::new(0.0, 0.0), 300.0);
        let b = Fingerprint::of(&CutParams::default(), Point::new(1.0, 0.0), 300.0);
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_absorbs_sub_quantum_drift() {
        let a = Fingerprint::of(&CutParams::default(), Point::new(100.0, 100.0), 300.0);
        let b = Fingerprint::of(
            &CutParams::default(),
            Point::new(100.0 + 1e-7, 100.0),
            300.0,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn empty_slot_is_stale() {
        let cache = CacheManager::new();
        assert!(cache.is_stale(0, &fp(10.0)));
    }

    #[test]
    fn stored_slot_is_fresh_until_fingerprint_moves() {
        let mut cache = CacheManager::new();
        cache.store(0, Raster::new(4, 4), fp(10.0));
        assert!(!cache.is_stale(0, &fp(10.0)));
        assert!(cache.is_stale(0, &fp(20.0)));
    }

    #[test]
    fn invalidate_all_except_spares_one_slot() {
        let mut cache = CacheManager::new();
        cache.store(1, Raster::new(4, 4), fp(10.0));
        cache.store(2, Raster::new(4, 4), fp(10.0));
        cache.invalidate_all_except(2);
        assert!(cache.raster(1).is_none());
        assert!(cache.raster(2).is_some());
    }

    #[test]
    fn invalidate_clears_one_slot() {
        let mut cache = CacheManager::new();
        cache.store(3, Raster::new(4, 4), fp(10.0));
        cache.invalidate(3);
        assert!(cache.raster(3).is_none());
        assert!(cache.is_stale(3, &fp(10.0)));
    }
}
