use crate::error::{RinglensError, RinglensResult};

/// How a cut's rings derive their per-ring rotation angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMethod {
    /// Each ring rotates by an additional multiple of the base angle — a
    /// cumulative twist ("swirl").
    Incremental,
    /// Rings oscillate independently with a spatial phase gradient — a
    /// traveling ripple.
    Wave,
}

/// Accepts the free-form method strings the UI layer deals in and rejects
/// anything unknown here, at the boundary, instead of defaulting deep in the
/// compositor.
pub fn parse_rotation_method(s: &str) -> RinglensResult<RotationMethod> {
    match s.trim().to_ascii_lowercase().as_str() {
        "incremental" | "swirl" => Ok(RotationMethod::Incremental),
        "wave" | "ripple" => Ok(RotationMethod::Wave),
        other => Err(RinglensError::validation(format!(
            "unknown rotation method '{other}'"
        ))),
    }
}

/// One slot's rendering parameters, snapshotted per frame from the provider.
/// The engine never mutates these.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CutParams {
    /// Outer ring diameter in canvas pixels.
    pub cut_size: f64,
    /// Ring count.
    pub slice_amount: u32,
    /// Full rotation amount in degrees; may be negative.
    pub rotation_amount: f64,
    /// Oscillator speed in radians per frame.
    pub rotation_speed: f64,
    pub animated: bool,
    pub rotation_method: RotationMethod,
}

impl Default for CutParams {
    fn default() -> Self {
        Self {
            cut_size: 300.0,
            slice_amount: 10,
            rotation_amount: 10.0,
            rotation_speed: 0.05,
            animated: false,
            rotation_method: RotationMethod::Incremental,
        }
    }
}

impl CutParams {
    /// Returns a copy with degenerate values clamped to safe minimums.
    /// Non-finite fields fall back to defaults; a zero rotation amount is a
    /// legitimate "no visible effect" state and passes through untouched.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            cut_size: if self.cut_size.is_finite() {
                self.cut_size.max(1.0)
            } else {
                d.cut_size
            },
            slice_amount: self.slice_amount.max(1),
            rotation_amount: if self.rotation_amount.is_finite() {
                self.rotation_amount
            } else {
                d.rotation_amount
            },
            rotation_speed: if self.rotation_speed.is_finite() {
                self.rotation_speed
            } else {
                d.rotation_speed
            },
            animated: self.animated,
            rotation_method: self.rotation_method,
        }
    }
}

/// Supplies each slot's parameters once per frame. Must be side-effect-free
/// and fast; the engine calls it up to six times per frame. Returning `None`
/// for a slot means "use defaults", never a frame failure.
pub trait ParameterProvider {
    fn params_for(&self, slot: usize) -> Option<CutParams>;
}
