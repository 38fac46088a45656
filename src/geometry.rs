use kurbo::{Point, Rect, Size, Vec2};

/// Scales `image` so it fully covers `canvas`, preserving aspect ratio. The
/// returned size is at least as large as the canvas in both dimensions.
pub fn fit_cover(image: Size, canvas: Size) -> Size {
    let scale = (canvas.width / image.width).max(canvas.height / image.height);
    Size::new(image.width * scale, image.height * scale)
}

/// Scales `image` so it fits entirely inside `canvas`, preserving aspect
/// ratio.
pub fn fit_contain(image: Size, canvas: Size) -> Size {
    let scale = (canvas.width / image.width).min(canvas.height / image.height);
    Size::new(image.width * scale, image.height * scale)
}

/// The smallest zoom at which the image still covers the whole canvas.
pub fn min_zoom(image: Size, canvas: Size) -> f64 {
    (canvas.width / image.width).max(canvas.height / image.height)
}

/// Allowed pan offsets for an image scaled to `scaled`, as a rect whose
/// x-range bounds `pan.x` and y-range bounds `pan.y`. With a covering image
/// the offsets are non-positive: the image's top-left may only move left/up.
pub fn pan_bounds(scaled: Size, canvas: Size) -> Rect {
    let min_x = (canvas.width - scaled.width).min(0.0);
    let min_y = (canvas.height - scaled.height).min(0.0);
    Rect::new(min_x, min_y, 0.0, 0.0)
}

/// Maps image-space coordinates to canvas-space: scale by `zoom`, then offset
/// by `pan` (the canvas position of the image's top-left corner).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan: Vec2,
}

impl ViewTransform {
    pub fn identity() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }

    /// Cover-fits the image to the canvas, centered.
    pub fn fit(image: Size, canvas: Size) -> Self {
        let zoom = min_zoom(image, canvas);
        let scaled = Size::new(image.width * zoom, image.height * zoom);
        Self {
            zoom,
            pan: Vec2::new(
                (canvas.width - scaled.width) / 2.0,
                (canvas.height - scaled.height) / 2.0,
            ),
        }
    }

    pub fn image_to_canvas(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    pub fn canvas_to_image(&self, p: Point) -> Point {
        Point::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
    }

    /// The image's footprint on the canvas.
    pub fn image_rect_on_canvas(&self, image: Size) -> Rect {
        Rect::new(
            self.pan.x,
            self.pan.y,
            self.pan.x + image.width * self.zoom,
            self.pan.y + image.height * self.zoom,
        )
    }

    /// Clamps zoom to keep the image covering the canvas and pan to the legal
    /// offset range at that zoom.
    pub fn clamped(&self, image: Size, canvas: Size) -> Self {
        let zoom = self.zoom.max(min_zoom(image, canvas));
        let scaled = Size::new(image.width * zoom, image.height * zoom);
        let bounds = pan_bounds(scaled, canvas);
        Self {
            zoom,
            pan: Vec2::new(
                self.pan.x.clamp(bounds.x0, bounds.x1),
                self.pan.y.clamp(bounds.y0, bounds.y1),
            ),
        }
    }
}
