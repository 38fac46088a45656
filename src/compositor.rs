use kurbo::{Point, Rect};
use tracing::trace;

use crate::{
    error::RinglensResult,
    geometry::ViewTransform,
    params::{CutParams, RotationMethod},
    raster::Raster,
};

/// Spatial frequency of the wave method's phase gradient: three full phase
/// cycles across the ring stack.
pub const WAVE_FREQUENCY: f64 = 3.0;

/// Per-ring rotation angle in degrees. `effective_amount` is the cut's
/// rotation amount already scaled by transition progress.
pub fn ring_angle_deg(
    method: RotationMethod,
    animated: bool,
    effective_amount: f64,
    rotation_speed: f64,
    frame: u64,
    ring: u32,
    ring_count: u32,
) -> f64 {
    match method {
        RotationMethod::Incremental => {
            let base = if animated {
                // sin maps the oscillator into [-amount, amount].
                (frame as f64 * rotation_speed).sin() * effective_amount
            } else {
                effective_amount
            };
            base * f64::from(ring)
        }
        RotationMethod::Wave => {
            let phase =
                f64::from(ring) / f64::from(ring_count) * std::f64::consts::TAU * WAVE_FREQUENCY;
            if animated {
                effective_amount * (frame as f64 * rotation_speed + phase).sin()
            } else {
                effective_amount * phase.sin()
            }
        }
    }
}

/// Renders one cut onto `target`: N concentric rings, each a rotated,
/// circularly-masked sample of the source image, all sharing the cut's
/// canvas-space `center` as rotation pivot. Ring 0 is the outermost; rings
/// draw in ascending order so inner rings paint over outer ones.
///
/// `progress` is the transition progress (1.0 for cached/inactive renders);
/// `frame` drives the animated oscillators and is ignored for static cuts.
pub fn render_cut(
    target: &mut Raster,
    source: &Raster,
    view: &ViewTransform,
    center: Point,
    params: &CutParams,
    progress: f64,
    frame: u64,
) -> RinglensResult<()> {
    let params = params.sanitized();

    // A zero amount means the effect is fully invisible, not rendered-but-
    // static. Deliberate short-circuit.
    if params.rotation_amount == 0.0 {
        return Ok(());
    }

    let image_rect = view.image_rect_on_canvas(kurbo::Size::new(
        f64::from(source.width()),
        f64::from(source.height()),
    ));
    let cut_size = params
        .cut_size
        .min(image_rect.width().min(image_rect.height()))
        .max(1.0);

    let effective_amount = params.rotation_amount * progress.clamp(0.0, 1.0);
    let ring_count = params.slice_amount;
    let thickness = cut_size / f64::from(ring_count);

    trace!(ring_count, cut_size, "rendering cut");

    for ring in 0..ring_count {
        let diameter = cut_size - f64::from(ring) * thickness;
        let radius = diameter / 2.0;
        let angle = ring_angle_deg(
            params.rotation_method,
            params.animated,
            effective_amount,
            params.rotation_speed,
            frame,
            ring,
            ring_count,
        )
        .to_radians();

        let sample_rect = clamp_square(center, diameter.ceil(), image_rect);
        let sample_center = sample_rect.center();
        let (sin_a, cos_a) = angle.sin_cos();

        // Disc bounding box on the target, clipped to the buffer.
        let x_min = (center.x - radius).floor().max(0.0) as u32;
        let y_min = (center.y - radius).floor().max(0.0) as u32;
        let x_max = (center.x + radius)
            .ceil()
            .clamp(0.0, f64::from(target.width())) as u32;
        let y_max = (center.y + radius)
            .ceil()
            .clamp(0.0, f64::from(target.height())) as u32;

        let r2 = radius * radius;

        for py in y_min..y_max {
            for px in x_min..x_max {
                // 2x linear supersampling: four subsamples per output pixel,
                // averaged on composite, smoothing the circular edge.
                let mut sum = [0u32; 4];
                for (sx, sy) in [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)] {
                    let dx = f64::from(px) + sx - center.x;
                    let dy = f64::from(py) + sy - center.y;
                    if dx * dx + dy * dy > r2 {
                        continue;
                    }
                    // Rotate the offset by -angle about the shared pivot.
                    let rx = dx * cos_a + dy * sin_a;
                    let ry = -dx * sin_a + dy * cos_a;
                    let sp = Point::new(
                        (sample_center.x + rx).clamp(sample_rect.x0, sample_rect.x1),
                        (sample_center.y + ry).clamp(sample_rect.y0, sample_rect.y1),
                    );
                    let ip = view.canvas_to_image(sp);
                    let px4 = source.sample_bilinear(ip.x - 0.5, ip.y - 0.5);
                    for c in 0..4 {
                        sum[c] += u32::from(px4[c]);
                    }
                }
                if sum[3] == 0 {
                    continue;
                }
                let out = [
                    ((sum[0] + 2) / 4) as u8,
                    ((sum[1] + 2) / 4) as u8,
                    ((sum[2] + 2) / 4) as u8,
                    ((sum[3] + 2) / 4) as u8,
                ];
                target.put_over(px, py, out);
            }
        }
    }

    Ok(())
}

/// Square of `side` centered on `center`, shifted (and if necessary shrunk)
/// so it never leaves `bounds`.
fn clamp_square(center: Point, side: f64, bounds: Rect) -> Rect {
    let w = side.min(bounds.width());
    let h = side.min(bounds.height());
    let x0 = (center.x - w / 2.0).clamp(bounds.x0, bounds.x1 - w);
    let y0 = (center.y - h / 2.0).clamp(bounds.y0, bounds.y1 - h);
    Rect::new(x0, y0, x0 + w, y0 + h)
}
