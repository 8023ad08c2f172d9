//! Software drawing into a `softbuffer` frame (`0x00RRGGBB` per pixel).

use crate::app::{
    Adjustments, Viewer, GLYPH_ADVANCE, INFORMATION_BAR_HEIGHT, LINE_HEIGHT, MENU_BAR_HEIGHT,
    PANEL_PADDING, TEXT_SCALE,
};
use crate::loader::{DecodedImage, Pixels};
use crate::thumbnails::{ThumbnailStrip, Thumbnail};
use crate::viewport::{FilterMode, Rect, Viewport};

pub type Color = [u8; 4];

const BACKGROUND: Color = [31, 31, 31, 255];
const BAR: Color = [37, 37, 38, 255];
const STRIP_BACKGROUND: Color = [102, 102, 102, 255];
const SELECTION: Color = [51, 204, 255, 255];
const HOVER: Color = [51, 128, 255, 128];
const PANEL: Color = [20, 20, 24, 225];
const TEXT: Color = [255, 255, 255, 255];
const TEXT_DIM: Color = [170, 170, 170, 255];
const TEXT_ERROR: Color = [255, 80, 80, 255];
const PANEL_TITLE: Color = [102, 153, 255, 255];
const CHECKER_CELL: i32 = 8;
/// Mip levels are used below this zoom.
const MIP_ZOOM: f32 = 0.5;

// 5x7 glyphs for ASCII 32..128, one byte per column, bit 0 = top row.
static FONT_5X7: [[u8; 5]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], [0x00, 0x00, 0x5F, 0x00, 0x00], [0x00, 0x07, 0x00, 0x07, 0x00], [0x14, 0x7F, 0x14, 0x7F, 0x14],
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], [0x23, 0x13, 0x08, 0x64, 0x62], [0x36, 0x49, 0x55, 0x22, 0x50], [0x00, 0x05, 0x03, 0x00, 0x00],
    [0x00, 0x1C, 0x22, 0x41, 0x00], [0x00, 0x41, 0x22, 0x1C, 0x00], [0x14, 0x08, 0x3E, 0x08, 0x14], [0x08, 0x08, 0x3E, 0x08, 0x08],
    [0x00, 0x50, 0x30, 0x00, 0x00], [0x08, 0x08, 0x08, 0x08, 0x08], [0x00, 0x60, 0x60, 0x00, 0x00], [0x20, 0x10, 0x08, 0x04, 0x02],
    [0x3E, 0x51, 0x49, 0x45, 0x3E], [0x00, 0x42, 0x7F, 0x40, 0x00], [0x42, 0x61, 0x51, 0x49, 0x46], [0x21, 0x41, 0x45, 0x4B, 0x31],
    [0x18, 0x14, 0x12, 0x7F, 0x10], [0x27, 0x45, 0x45, 0x45, 0x39], [0x3C, 0x4A, 0x49, 0x49, 0x30], [0x01, 0x71, 0x09, 0x05, 0x03],
    [0x36, 0x49, 0x49, 0x49, 0x36], [0x06, 0x49, 0x49, 0x29, 0x1E], [0x00, 0x36, 0x36, 0x00, 0x00], [0x00, 0x56, 0x36, 0x00, 0x00],
    [0x08, 0x14, 0x22, 0x41, 0x00], [0x14, 0x14, 0x14, 0x14, 0x14], [0x00, 0x41, 0x22, 0x14, 0x08], [0x02, 0x01, 0x51, 0x09, 0x06],
    [0x3E, 0x41, 0x5D, 0x55, 0x1E], [0x7E, 0x11, 0x11, 0x11, 0x7E], [0x7F, 0x49, 0x49, 0x49, 0x36], [0x3E, 0x41, 0x41, 0x41, 0x22],
    [0x7F, 0x41, 0x41, 0x22, 0x1C], [0x7F, 0x49, 0x49, 0x49, 0x41], [0x7F, 0x09, 0x09, 0x09, 0x01], [0x3E, 0x41, 0x49, 0x49, 0x7A],
    [0x7F, 0x08, 0x08, 0x08, 0x7F], [0x00, 0x41, 0x7F, 0x41, 0x00], [0x20, 0x40, 0x41, 0x3F, 0x01], [0x7F, 0x08, 0x14, 0x22, 0x41],
    [0x7F, 0x40, 0x40, 0x40, 0x40], [0x7F, 0x02, 0x0C, 0x02, 0x7F], [0x7F, 0x04, 0x08, 0x10, 0x7F], [0x3E, 0x41, 0x41, 0x41, 0x3E],
    [0x7F, 0x09, 0x09, 0x09, 0x06], [0x3E, 0x41, 0x51, 0x21, 0x5E], [0x7F, 0x09, 0x19, 0x29, 0x46], [0x46, 0x49, 0x49, 0x49, 0x31],
    [0x01, 0x01, 0x7F, 0x01, 0x01], [0x3F, 0x40, 0x40, 0x40, 0x3F], [0x1F, 0x20, 0x40, 0x20, 0x1F], [0x3F, 0x40, 0x38, 0x40, 0x3F],
    [0x63, 0x14, 0x08, 0x14, 0x63], [0x07, 0x08, 0x70, 0x08, 0x07], [0x61, 0x51, 0x49, 0x45, 0x43], [0x00, 0x7F, 0x41, 0x41, 0x00],
    [0x02, 0x04, 0x08, 0x10, 0x20], [0x00, 0x41, 0x41, 0x7F, 0x00], [0x04, 0x02, 0x01, 0x02, 0x04], [0x40, 0x40, 0x40, 0x40, 0x40],
    [0x00, 0x01, 0x02, 0x04, 0x00], [0x20, 0x54, 0x54, 0x54, 0x78], [0x7F, 0x48, 0x44, 0x44, 0x38], [0x38, 0x44, 0x44, 0x44, 0x20],
    [0x38, 0x44, 0x44, 0x48, 0x7F], [0x38, 0x54, 0x54, 0x54, 0x18], [0x08, 0x7E, 0x09, 0x01, 0x02], [0x0C, 0x52, 0x52, 0x52, 0x3E],
    [0x7F, 0x08, 0x04, 0x04, 0x78], [0x00, 0x44, 0x7D, 0x40, 0x00], [0x20, 0x40, 0x44, 0x3D, 0x00], [0x7F, 0x10, 0x28, 0x44, 0x00],
    [0x00, 0x41, 0x7F, 0x40, 0x00], [0x7C, 0x04, 0x18, 0x04, 0x78], [0x7C, 0x08, 0x04, 0x04, 0x78], [0x38, 0x44, 0x44, 0x44, 0x38],
    [0x7C, 0x14, 0x14, 0x14, 0x08], [0x08, 0x14, 0x14, 0x18, 0x7C], [0x7C, 0x08, 0x04, 0x04, 0x08], [0x48, 0x54, 0x54, 0x54, 0x20],
    [0x04, 0x3F, 0x44, 0x40, 0x20], [0x3C, 0x40, 0x40, 0x20, 0x7C], [0x1C, 0x20, 0x40, 0x20, 0x1C], [0x3C, 0x40, 0x30, 0x40, 0x3C],
    [0x44, 0x28, 0x10, 0x28, 0x44], [0x0C, 0x50, 0x50, 0x50, 0x3C], [0x44, 0x64, 0x54, 0x4C, 0x44], [0x00, 0x08, 0x36, 0x41, 0x00],
    [0x00, 0x00, 0x7F, 0x00, 0x00], [0x00, 0x41, 0x36, 0x08, 0x00], [0x10, 0x08, 0x08, 0x10, 0x08], [0x00, 0x00, 0x00, 0x00, 0x00],
];

/// Pack RGB into the softbuffer pixel format.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

/// Borrowed frame buffer with its dimensions.
pub struct Canvas<'a> {
    pub pixels: &'a mut [u32],
    pub width: i32,
    pub height: i32,
}

impl Canvas<'_> {
    #[inline]
    fn blend(&mut self, x: i32, y: i32, c: Color) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let off = (y * self.width + x) as usize;
        let a = c[3] as u32;
        if a == 255 {
            self.pixels[off] = rgb(c[0], c[1], c[2]);
            return;
        }
        let (dr, dg, db) = unpack_rgb(self.pixels[off]);
        let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
        self.pixels[off] = rgb(mix(c[0], dr), mix(c[1], dg), mix(c[2], db));
    }

    pub fn clear(&mut self, c: Color) {
        self.pixels.fill(rgb(c[0], c[1], c[2]));
    }

    pub fn fill_rect(&mut self, r: Rect, c: Color) {
        let (x0, x1) = (r.left.max(0), r.right.min(self.width));
        let (y0, y1) = (r.top.max(0), r.bottom.min(self.height));
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, c);
            }
        }
    }

    /// One-pixel-wide border drawn `thickness` pixels inwards from `r`.
    pub fn outline(&mut self, r: Rect, thickness: i32, c: Color) {
        self.fill_rect(Rect::new(r.left, r.top, r.right, r.top + thickness), c);
        self.fill_rect(Rect::new(r.left, r.bottom - thickness, r.right, r.bottom), c);
        self.fill_rect(
            Rect::new(r.left, r.top + thickness, r.left + thickness, r.bottom - thickness),
            c,
        );
        self.fill_rect(
            Rect::new(r.right - thickness, r.top + thickness, r.right, r.bottom - thickness),
            c,
        );
    }

    fn draw_char(&mut self, ch: char, px: i32, py: i32, c: Color) {
        let idx = (ch as u32).wrapping_sub(32) as usize;
        let Some(glyph) = FONT_5X7.get(idx) else { return };
        let s = TEXT_SCALE as i32;
        for (col, bits) in glyph.iter().enumerate() {
            for row in 0..7 {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for sy in 0..s {
                    for sx in 0..s {
                        self.blend(px + col as i32 * s + sx, py + row * s + sy, c);
                    }
                }
            }
        }
    }

    /// Draw `text` with its top-left at (x, y). Returns the x after the
    /// last glyph.
    pub fn text(&mut self, text: &str, x: i32, y: i32, c: Color) -> i32 {
        let mut cx = x;
        for ch in text.chars() {
            if cx >= self.width {
                break;
            }
            self.draw_char(ch, cx, y, c);
            cx += GLYPH_ADVANCE;
        }
        cx
    }

    /// Blit an RGBA8 image 1:1 with alpha.
    fn image(&mut self, img: &image::RgbaImage, x: i32, y: i32) {
        for (ix, iy, p) in img.enumerate_pixels() {
            self.blend(x + ix as i32, y + iy as i32, p.0);
        }
    }
}

fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

fn glyph_height() -> i32 {
    7 * TEXT_SCALE as i32
}

// ---------------------------------------------------------------------------
// Main image
// ---------------------------------------------------------------------------

#[inline]
fn sample_nearest(p: &Pixels, u: f32, v: f32) -> [f32; 4] {
    let (w, h) = p.dimensions();
    let x = (u.floor().max(0.0) as u32).min(w - 1);
    let y = (v.floor().max(0.0) as u32).min(h - 1);
    p.get(x, y)
}

#[inline]
fn sample_linear(p: &Pixels, u: f32, v: f32) -> [f32; 4] {
    let (w, h) = p.dimensions();
    let fx = (u - 0.5).max(0.0);
    let fy = (v - 0.5).max(0.0);
    let x0 = (fx.floor() as u32).min(w - 1);
    let y0 = (fy.floor() as u32).min(h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let (a, b, c, d) = (p.get(x0, y0), p.get(x1, y0), p.get(x0, y1), p.get(x1, y1));
    let mut out = [0.0; 4];
    for i in 0..4 {
        let top = a[i] + (b[i] - a[i]) * tx;
        let bottom = c[i] + (d[i] - c[i]) * tx;
        out[i] = top + (bottom - top) * ty;
    }
    out
}

/// Pick the pixel source for the current zoom: the full image, or a
/// pre-shrunk level when zoomed well out.
fn mip_for_zoom(image: &DecodedImage, frame: usize, zoom: f32) -> &Pixels {
    let full = &image.frames[frame].pixels;
    if image.mips.is_empty() || zoom >= MIP_ZOOM || frame > 0 {
        return full;
    }
    let level = (1.0 / zoom).log2().floor() as usize;
    let idx = level.saturating_sub(1).min(image.mips.len() - 1);
    &image.mips[idx]
}

/// Apply the display adjustments to one linear RGBA sample.
pub fn adjust(mut c: [f32; 4], tonemap: bool, adj: &Adjustments) -> [f32; 4] {
    let m = adj.channels.multiplier();
    for i in 0..4 {
        c[i] *= m[i];
    }

    let gain = 2f32.powf(adj.exposure);
    for v in &mut c[..3] {
        *v = *v * gain + adj.offset;
    }

    if tonemap && !adj.no_tonemapping {
        for v in &mut c[..3] {
            let x = v.max(0.0);
            let mapped = if adj.flat_tonemapping { x.min(1.0) } else { x / (1.0 + x) };
            *v = mapped.powf(1.0 / 2.2);
        }
    }

    if adj.grayscale {
        let y = 0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2];
        c[0] = y;
        c[1] = y;
        c[2] = y;
    }

    if adj.invert {
        for v in &mut c[..3] {
            *v = 1.0 - *v;
        }
    }
    c
}

fn zebra_hit(c: &[f32; 4], x: i32, y: i32, time: f64, adj: &Adjustments) -> bool {
    if !adj.zebra_pattern || c[0].max(c[1]).max(c[2]) < adj.zebra_threshold {
        return false;
    }
    let phase = (x + y + (time * 30.0) as i32).rem_euclid(12);
    phase < 6
}

fn checker(x: i32, y: i32) -> [f32; 3] {
    if ((x / CHECKER_CELL) + (y / CHECKER_CELL)) % 2 == 0 {
        [0.4, 0.4, 0.4]
    } else {
        [0.6, 0.6, 0.6]
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Screen-space bounding box of the rotated, scaled image.
fn image_bounds(viewport: &Viewport, size: (u32, u32)) -> Rect {
    let (fw, fh) = crate::viewport::footprint(size, viewport.rotation);
    let hw = (fw as f64 * viewport.zoom as f64 / 2.0).ceil();
    let hh = (fh as f64 * viewport.zoom as f64 / 2.0).ceil();
    let clamp = |v: f64| v.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
    Rect::new(
        clamp(viewport.position.0 as f64 - hw),
        clamp(viewport.position.1 as f64 - hh),
        clamp(viewport.position.0 as f64 + hw),
        clamp(viewport.position.1 as f64 + hh),
    )
}

pub fn draw_image(canvas: &mut Canvas, viewer: &Viewer) {
    let Some(image) = &viewer.image else { return };
    let viewport = &viewer.viewport;
    let adj = &viewer.adjustments;
    let size = image.size();
    let source = mip_for_zoom(image, viewer.frame_index, viewport.zoom);
    let (sw, sh) = source.dimensions();
    let (kx, ky) = (sw as f32 / size.0 as f32, sh as f32 / size.1 as f32);
    let filter = viewport.filter();
    let bg = [BACKGROUND[0] as f32 / 255.0, BACKGROUND[1] as f32 / 255.0, BACKGROUND[2] as f32 / 255.0];

    let b = image_bounds(viewport, size);
    let (x0, x1) = (b.left.max(0), b.right.min(canvas.width));
    let (y0, y1) = (b.top.max(0), b.bottom.min(canvas.height));

    for y in y0..y1 {
        for x in x0..x1 {
            let (u, v) = viewport.screen_to_image((x as f32 + 0.5, y as f32 + 0.5), size);
            if u < 0.0 || v < 0.0 || u >= size.0 as f32 || v >= size.1 as f32 {
                continue;
            }
            let raw = match filter {
                FilterMode::Linear => sample_linear(source, u * kx, v * ky),
                FilterMode::Nearest => sample_nearest(source, u * kx, v * ky),
            };
            let mut c = adjust(raw, image.needs_tonemap, adj);
            if zebra_hit(&c, x, y, viewer.now, adj) {
                c = [0.0, 0.0, 0.0, 1.0];
            }

            let under = if adj.alpha_checkerboard { checker(x, y) } else { bg };
            let a = c[3].clamp(0.0, 1.0);
            let px = [
                to_u8(c[0] * a + under[0] * (1.0 - a)),
                to_u8(c[1] * a + under[1] * (1.0 - a)),
                to_u8(c[2] * a + under[2] * (1.0 - a)),
                255,
            ];
            canvas.blend(x, y, px);
        }
    }
}

// ---------------------------------------------------------------------------
// Chrome
// ---------------------------------------------------------------------------

fn draw_thumbnail(canvas: &mut Canvas, strip: &ThumbnailStrip, thumb: &Thumbnail) {
    let bounds = strip.entry_bounds(thumb);
    canvas.image(&thumb.image, bounds.left, bounds.top);
}

pub fn draw_strip(canvas: &mut Canvas, strip: &ThumbnailStrip) {
    if !strip.is_visible() {
        return;
    }
    canvas.fill_rect(strip.background(), STRIP_BACKGROUND);
    for thumb in strip.entries() {
        draw_thumbnail(canvas, strip, thumb);
    }

    let current = strip.current_index();
    if let Some(centre) = strip.entries().iter().find(|t| t.list_index == current) {
        let b = strip.entry_bounds(centre);
        let r = Rect::new(b.left - 2, b.top - 2, b.left + centre.width() + 2, b.top + centre.height() + 2);
        canvas.outline(r, 2, SELECTION);
    }

    if let Some(hover) = strip.hover() {
        canvas.fill_rect(hover.bounds, HOVER);
        let (cx, _) = hover.bounds.center();
        let x = cx - text_width(&hover.label) / 2;
        canvas.text(&hover.label, x, hover.bounds.bottom - glyph_height(), TEXT);
    }
}

fn draw_menu_bar(canvas: &mut Canvas, viewer: &Viewer) {
    let bar = Rect::new(0, 0, canvas.width, MENU_BAR_HEIGHT);
    canvas.fill_rect(bar, BAR);
    let y = (MENU_BAR_HEIGHT - glyph_height()) / 2;
    let hint = "? help";
    let text_end = canvas.width - text_width(hint) - PANEL_PADDING;
    let color = if viewer.menu_is_error { TEXT_ERROR } else { TEXT };
    canvas.text(&viewer.menu_text, 4, y, color);
    canvas.text(hint, text_end, y, TEXT_DIM);
}

fn draw_information_bar(canvas: &mut Canvas, viewer: &Viewer) {
    let top = canvas.height - INFORMATION_BAR_HEIGHT;
    canvas.fill_rect(Rect::new(0, top, canvas.width, canvas.height), BAR);
    let y = top + (INFORMATION_BAR_HEIGHT - glyph_height()) / 2;

    let bar = viewer.info_bar();
    let x = viewer.permissible_rect().left + 4;
    let x = canvas.text(&bar.before_swatch, x, y, TEXT);

    let side = glyph_height() - 2;
    let swatch = Rect::new(x, y + 1, x + side, y + 1 + side);
    canvas.fill_rect(
        Rect::new(swatch.left - 1, swatch.top - 1, swatch.right + 1, swatch.bottom + 1),
        TEXT,
    );
    let c = bar.swatch;
    let under = checker(x, y);
    let a = c[3].clamp(0.0, 1.0);
    canvas.fill_rect(
        swatch,
        [
            to_u8(c[0] * a + under[0] * (1.0 - a)),
            to_u8(c[1] * a + under[1] * (1.0 - a)),
            to_u8(c[2] * a + under[2] * (1.0 - a)),
            255,
        ],
    );
    canvas.text(&bar.after_swatch, swatch.right + 2, y, TEXT);
}

fn draw_message(canvas: &mut Canvas, viewer: &Viewer) {
    let Some(message) = viewer.message else { return };
    let (cx, cy) = if viewer.image.is_some() {
        viewer.permissible_rect().center()
    } else {
        viewer.viewport.position
    };
    let w = text_width(message);
    let r = Rect::new(
        cx - w / 2 - PANEL_PADDING,
        cy - glyph_height() / 2 - PANEL_PADDING,
        cx + w / 2 + PANEL_PADDING,
        cy + glyph_height() / 2 + PANEL_PADDING,
    );
    canvas.fill_rect(r, PANEL);
    canvas.text(message, cx - w / 2, cy - glyph_height() / 2, TEXT);
}

fn draw_panels(canvas: &mut Canvas, viewer: &Viewer) {
    for panel in viewer.panels() {
        canvas.fill_rect(panel.rect, PANEL);
        let x = panel.rect.left + PANEL_PADDING;
        let mut y = panel.rect.top + PANEL_PADDING;
        for (i, line) in panel.lines.iter().enumerate() {
            let color = if i == 0 { PANEL_TITLE } else { TEXT };
            canvas.text(line, x, y, color);
            y += LINE_HEIGHT;
        }
    }
}

/// Draw the whole window for the viewer's current state.
pub fn draw_frame(canvas: &mut Canvas, viewer: &Viewer) {
    canvas.clear(BACKGROUND);
    draw_image(canvas, viewer);
    if viewer.information_bar_shown() {
        draw_information_bar(canvas, viewer);
    }
    draw_message(canvas, viewer);
    draw_strip(canvas, &viewer.strip);
    if viewer.menu_bar_shown() {
        draw_menu_bar(canvas, viewer);
    }
    draw_panels(canvas, viewer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Channels;

    fn canvas(buf: &mut Vec<u32>, w: i32, h: i32) -> Canvas<'_> {
        buf.resize((w * h) as usize, 0);
        Canvas {
            pixels: buf,
            width: w,
            height: h,
        }
    }

    #[test]
    fn fill_clips_to_canvas() {
        let mut buf = Vec::new();
        let mut c = canvas(&mut buf, 4, 4);
        c.fill_rect(Rect::new(-2, -2, 2, 2), [255, 0, 0, 255]);
        assert_eq!(c.pixels[0], rgb(255, 0, 0));
        assert_eq!(c.pixels[5], rgb(255, 0, 0));
        assert_eq!(c.pixels[2], 0);
    }

    #[test]
    fn half_alpha_blends() {
        let mut buf = Vec::new();
        let mut c = canvas(&mut buf, 1, 1);
        c.clear([0, 0, 0, 255]);
        c.fill_rect(Rect::new(0, 0, 1, 1), [255, 255, 255, 128]);
        let (r, _, _) = unpack_rgb(c.pixels[0]);
        assert_eq!(r, 128);
    }

    #[test]
    fn text_advances_per_glyph() {
        let mut buf = Vec::new();
        let mut c = canvas(&mut buf, 200, 20);
        assert_eq!(c.text("abc", 10, 0, TEXT), 10 + 3 * GLYPH_ADVANCE);
    }

    #[test]
    fn default_adjustments_leave_ldr_alone() {
        let adj = Adjustments::default();
        assert_eq!(adjust([0.25, 0.5, 0.75, 1.0], false, &adj), [0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn exposure_invert_and_channels() {
        let mut adj = Adjustments {
            exposure: 1.0,
            ..Adjustments::default()
        };
        assert_eq!(adjust([0.25, 0.1, 0.0, 1.0], false, &adj)[0], 0.5);

        adj.exposure = 0.0;
        adj.invert = true;
        assert_eq!(adjust([0.25, 0.0, 1.0, 1.0], false, &adj), [0.75, 1.0, 0.0, 1.0]);

        adj.invert = false;
        adj.channels = Channels::Green;
        assert_eq!(adjust([0.3, 0.6, 0.9, 1.0], false, &adj), [0.0, 0.6, 0.0, 1.0]);
    }

    #[test]
    fn tonemapping_compresses_highlights() {
        let adj = Adjustments::default();
        let c = adjust([4.0, 1.0, 0.0, 1.0], true, &adj);
        assert!(c[0] < 1.0 && c[0] > c[1]);

        let off = Adjustments {
            no_tonemapping: true,
            ..Adjustments::default()
        };
        assert_eq!(adjust([4.0, 1.0, 0.0, 1.0], true, &off)[0], 4.0);
    }

    #[test]
    fn image_bounds_swap_axes_when_rotated() {
        let vp = Viewport {
            zoom: 2.0,
            position: (100, 100),
            rotation: -90,
            engaged: false,
        };
        assert_eq!(image_bounds(&vp, (20, 10)), Rect::new(90, 80, 110, 120));
    }
}
