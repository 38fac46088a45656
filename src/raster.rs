use crate::error::{RinglensError, RinglensResult};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// A canvas-sized premultiplied RGBA8 buffer. Both the display layer and the
/// per-slot cache rasters are `Raster`s; the source image is one too, so the
/// compositor samples and composites with a single pixel vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Fully transparent buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Premultiplies a straight-alpha decoded image into a `Raster`.
    pub fn from_image(img: &image::RgbaImage) -> Self {
        let mut out = Self::new(img.width(), img.height());
        for (x, y, px) in img.enumerate_pixels() {
            let a = u16::from(px[3]);
            let p = [
                mul_div255(u16::from(px[0]), a),
                mul_div255(u16::from(px[1]), a),
                mul_div255(u16::from(px[2]), a),
                px[3],
            ];
            out.put(x, y, p);
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn get(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put(&mut self, x: u32, y: u32, px: PremulRgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Composites one pixel over the existing contents.
    pub fn put_over(&mut self, x: u32, y: u32, px: PremulRgba8) {
        let dst = self.get(x, y);
        self.put(x, y, over(dst, px));
    }

    /// Bilinear lookup with coordinates clamped to the pixel-center grid, so
    /// sampling never reads outside the buffer.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> PremulRgba8 {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as u32;
        let y0 = y0 as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let p00 = self.get(x0, y0);
        let p10 = self.get(x1, y0);
        let p01 = self.get(x0, y1);
        let p11 = self.get(x1, y1);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
            let bot = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
            out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Composites `src` over `self`. Sizes must match exactly.
    pub fn blit_over(&mut self, src: &Raster) -> RinglensResult<()> {
        if self.width != src.width || self.height != src.height {
            return Err(RinglensError::raster(format!(
                "blit_over expects matching sizes, got {}x{} over {}x{}",
                src.width, src.height, self.width, self.height
            )));
        }
        for (d, s) in self
            .data
            .chunks_exact_mut(4)
            .zip(src.data.chunks_exact(4))
        {
            if s[3] == 0 {
                continue;
            }
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_src_transparent_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn bilinear_at_pixel_centers_is_exact() {
        let mut r = Raster::new(2, 2);
        r.put(0, 0, [10, 10, 10, 255]);
        r.put(1, 0, [20, 20, 20, 255]);
        assert_eq!(r.sample_bilinear(0.0, 0.0), [10, 10, 10, 255]);
        assert_eq!(r.sample_bilinear(1.0, 0.0), [20, 20, 20, 255]);
        // Halfway blends the two.
        assert_eq!(r.sample_bilinear(0.5, 0.0), [15, 15, 15, 255]);
    }

    #[test]
    fn bilinear_clamps_outside_coordinates() {
        let mut r = Raster::new(2, 1);
        r.put(0, 0, [1, 2, 3, 255]);
        r.put(1, 0, [4, 5, 6, 255]);
        assert_eq!(r.sample_bilinear(-10.0, 0.0), r.get(0, 0));
        assert_eq!(r.sample_bilinear(10.0, 50.0), r.get(1, 0));
    }

    #[test]
    fn blit_over_rejects_size_mismatch() {
        let mut a = Raster::new(2, 2);
        let b = Raster::new(3, 2);
        assert!(a.blit_over(&b).is_err());
    }

    #[test]
    fn blit_over_composites_pixels() {
        let mut a = Raster::new(1, 1);
        a.put(0, 0, [0, 100, 0, 255]);
        let mut b = Raster::new(1, 1);
        b.put(0, 0, [200, 0, 0, 255]);
        a.blit_over(&b).unwrap();
        assert_eq!(a.get(0, 0), [200, 0, 0, 255]);
    }

    #[test]
    fn from_image_premultiplies() {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 128]));
        let r = Raster::from_image(&img);
        let px = r.get(0, 0);
        assert_eq!(px[3], 128);
        assert!(px[0] >= 127 && px[0] <= 129);
    }
}
