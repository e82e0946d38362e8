/// Packed `0x00RRGGBB`, the layout softbuffer presents.
pub type Color = u32;

pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

pub const BLACK: Color = rgb(0, 0, 0);
pub const WHITE: Color = rgb(255, 255, 255);
pub const ORANGE: Color = rgb(255, 161, 0);
pub const GREEN: Color = rgb(0, 228, 48);
pub const LIGHT_GRAY: Color = rgb(200, 200, 200);

fn channels(c: Color) -> [f32; 3] {
    [
        ((c >> 16) & 0xff) as f32,
        ((c >> 8) & 0xff) as f32,
        (c & 0xff) as f32,
    ]
}

fn pack([r, g, b]: [f32; 3]) -> Color {
    rgb(r.round() as u8, g.round() as u8, b.round() as u8)
}

fn mix(a: Color, b: Color, t: f32) -> Color {
    let (a, b) = (channels(a), channels(b));
    pack([
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ])
}

/// CPU frame buffer with clipped rectangle primitives.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.pixels = vec![BLACK; width as usize * height as usize];
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    #[cfg(test)]
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Alpha-blends `color` over the pixel at (x, y); `alpha` in [0, 1].
    pub fn blend(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = mix(self.pixels[i], color, alpha.clamp(0.0, 1.0));
        }
    }

    /// Clamps a rectangle to the surface as half-open pixel ranges.
    fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(usize, usize, usize, usize)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        let stride = self.width as usize;
        for row in y0..y1 {
            self.pixels[row * stride + x0..row * stride + x1].fill(color);
        }
    }

    /// Vertical gradient from `top` at row `y` to `bottom` at row `y + h - 1`.
    pub fn gradient_rect_v(&mut self, x: i32, y: i32, w: i32, h: i32, top: Color, bottom: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        let span = (h - 1).max(1) as f32;
        let stride = self.width as usize;
        for row in y0..y1 {
            let t = (row as i32 - y) as f32 / span;
            let color = mix(top, bottom, t);
            self.pixels[row * stride + x0..row * stride + x1].fill(color);
        }
    }

    /// One-pixel outline along the inside edge of the rectangle.
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    /// Frame bytes in ffmpeg's `bgr0` layout.
    pub fn to_bgr0(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_clipped() {
        let mut c = Canvas::new(4, 4);
        c.fill_rect(-2, -2, 4, 4, WHITE);
        assert_eq!(c.get(0, 0), Some(WHITE));
        assert_eq!(c.get(1, 1), Some(WHITE));
        assert_eq!(c.get(2, 2), Some(BLACK));
        c.fill_rect(10, 10, 5, 5, WHITE);
        c.fill_rect(0, 0, 0, 3, ORANGE);
        assert_eq!(c.get(0, 0), Some(WHITE));
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let mut c = Canvas::new(1, 11);
        c.gradient_rect_v(0, 0, 1, 11, ORANGE, GREEN);
        assert_eq!(c.get(0, 0), Some(ORANGE));
        assert_eq!(c.get(0, 10), Some(GREEN));
        assert_eq!(c.get(0, 5), Some(mix(ORANGE, GREEN, 0.5)));
    }

    #[test]
    fn stroke_leaves_interior() {
        let mut c = Canvas::new(5, 5);
        c.stroke_rect(0, 0, 5, 5, LIGHT_GRAY);
        assert_eq!(c.get(0, 2), Some(LIGHT_GRAY));
        assert_eq!(c.get(4, 4), Some(LIGHT_GRAY));
        assert_eq!(c.get(2, 2), Some(BLACK));
    }

    #[test]
    fn blend_mixes_colors() {
        let mut c = Canvas::new(1, 1);
        c.blend(0, 0, WHITE, 1.0);
        assert_eq!(c.get(0, 0), Some(WHITE));
        c.clear(BLACK);
        c.blend(0, 0, rgb(200, 100, 0), 0.5);
        assert_eq!(c.get(0, 0), Some(rgb(100, 50, 0)));
    }

    #[test]
    fn bgr0_byte_order() {
        let mut c = Canvas::new(1, 1);
        c.clear(rgb(1, 2, 3));
        assert_eq!(c.to_bgr0(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn resize_reallocates() {
        let mut c = Canvas::new(2, 2);
        c.resize(3, 5);
        assert_eq!(c.pixels().len(), 15);
        assert_eq!((c.width(), c.height()), (3, 5));
    }
}
