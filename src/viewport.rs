//! Placement of the main image inside the window.
//!
//! The image is anchored at its centre: `position` is the screen point the
//! centre of the (rotated) image is drawn at, and `zoom` is the uniform
//! scale. Rotation is in degrees; negative values turn the image clockwise
//! on screen.

pub const ZOOM_INCREMENT: f32 = 1.25;
pub const FINE_ZOOM_INCREMENT: f32 = 1.05;
pub const MIN_ZOOM: f32 = 1e-26;
pub const MAX_ZOOM: f32 = 1e26;
pub const DOUBLE_CLICK_SECONDS: f64 = 0.3;
/// From this zoom on, individual pixels are drawn as hard-edged blocks.
pub const NEAREST_FILTER_ZOOM: f32 = 4.0;

/// Screen rectangle in pixels. Edges are inclusive for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, (x, y): (i32, i32)) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn center(&self) -> (i32, i32) {
        (
            (self.left as f32 + self.width() as f32 / 2.0) as i32,
            (self.top as f32 + self.height() as f32 / 2.0) as i32,
        )
    }
}

/// Width and height of the image as it appears after rotation.
pub fn footprint((w, h): (u32, u32), rotation: i32) -> (u32, u32) {
    if rotation.rem_euclid(180) == 90 {
        (h, w)
    } else {
        (w, h)
    }
}

/// Zoom and centre position that fit the rotated image inside `rect`.
///
/// Images that already fit are shown at exactly 100 %; larger ones are
/// scaled down uniformly until they touch the rect on one axis.
pub fn fit_to_viewport(rect: Rect, image_size: (u32, u32), rotation: i32) -> (f32, (i32, i32)) {
    let (fw, fh) = footprint(image_size, rotation);
    let (bw, bh) = (rect.width(), rect.height());

    let zoom = if fw as i64 > bw as i64 || fh as i64 > bh as i64 {
        let screen_aspect = bw as f32 / bh as f32;
        let image_aspect = fw as f32 / fh as f32;
        if screen_aspect > image_aspect {
            bh as f32 / fh as f32
        } else {
            bw as f32 / fw as f32
        }
    } else {
        1.0
    };

    (zoom.clamp(MIN_ZOOM, MAX_ZOOM), rect.center())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Linear,
    Nearest,
}

impl FilterMode {
    pub fn for_zoom(zoom: f32) -> Self {
        if zoom < NEAREST_FILTER_ZOOM {
            FilterMode::Linear
        } else {
            FilterMode::Nearest
        }
    }
}

/// Zoom text for the information bar, with enough decimals to show
/// something other than zero at very small zooms.
pub fn zoom_label(zoom: f32) -> String {
    let percent = zoom as f64 * 100.0;
    for i in 1..20 {
        if zoom as f64 > 10f64.powi(-i) {
            return format!("{:.*}%", (i + 1) as usize, percent);
        }
    }
    format!("{:.2}%", percent)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub position: (i32, i32),
    pub rotation: i32,
    /// Auto-fit: zoom and position follow the viewport until the user
    /// drags or zooms.
    pub engaged: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            position: (0, 0),
            rotation: 0,
            engaged: true,
        }
    }
}

impl Viewport {
    pub fn fit(&mut self, rect: Rect, image_size: (u32, u32)) {
        let (zoom, position) = fit_to_viewport(rect, image_size, self.rotation);
        self.zoom = zoom;
        self.position = position;
        self.engaged = true;
    }

    /// Pan by the pointer movement `delta` (previous minus current position).
    pub fn drag(&mut self, delta: (i32, i32)) {
        if delta != (0, 0) {
            self.engaged = false;
        }
        self.position.0 = self.position.0.saturating_sub(delta.0);
        self.position.1 = self.position.1.saturating_sub(delta.1);
    }

    /// Zoom around `pointer` so the image point under it stays put.
    /// Positive `steps` zoom in, negative zoom out.
    pub fn zoom_at(&mut self, pointer: (i32, i32), steps: i32, fine: bool) {
        if steps == 0 {
            return;
        }
        let increment = if fine { FINE_ZOOM_INCREMENT } else { ZOOM_INCREMENT };
        for _ in 0..steps.unsigned_abs() {
            let offset = (
                pointer.0.saturating_sub(self.position.0),
                pointer.1.saturating_sub(self.position.1),
            );
            let factor = if steps < 0 { 1.0 / increment } else { increment };
            self.position.0 = self
                .position
                .0
                .saturating_sub((offset.0 as f32 * (factor - 1.0)) as i32);
            self.position.1 = self
                .position
                .1
                .saturating_sub((offset.1 as f32 * (factor - 1.0)) as i32);
            if steps < 0 {
                self.zoom /= increment;
            } else {
                self.zoom *= increment;
            }
            self.zoom = self.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.engaged = false;
    }

    /// Toggle between auto-fit and 100 % centred on `rect`.
    pub fn toggle_actual_size(&mut self, rect: Rect, image_size: (u32, u32)) {
        if self.engaged {
            self.engaged = false;
            self.zoom = 1.0;
            self.position = rect.center();
        } else {
            self.fit(rect, image_size);
        }
    }

    /// Quarter turn clockwise, keeping rotation within (-360, 0].
    pub fn rotate(&mut self, rect: Rect, image_size: (u32, u32)) {
        self.rotation -= 90;
        if self.rotation <= -360 {
            self.rotation += 360;
        }
        if self.engaged {
            self.fit(rect, image_size);
        }
    }

    /// Keep the image from being dragged entirely out of the window.
    pub fn keep_in_bounds(&mut self, window: (i32, i32), image_size: (u32, u32)) {
        let bound_x = ((image_size.0 / 2) as f32 * self.zoom) as i32 - window.0 / 10;
        let bound_y = ((image_size.1 / 2) as f32 * self.zoom) as i32 - window.1 / 10;

        if self.position.0 < -bound_x {
            self.position.0 = -bound_x;
        }
        if self.position.0 > window.0.saturating_add(bound_x) {
            self.position.0 = window.0.saturating_add(bound_x);
        }
        if self.position.1 < -bound_y {
            self.position.1 = -bound_y;
        }
        if self.position.1 > window.1.saturating_add(bound_y) {
            self.position.1 = window.1.saturating_add(bound_y);
        }
    }

    /// Per-frame settle: re-fit while engaged, then apply the bounds.
    pub fn update(&mut self, rect: Rect, window: (i32, i32), image_size: (u32, u32)) {
        if self.engaged {
            self.fit(rect, image_size);
        }
        self.keep_in_bounds(window, image_size);
    }

    pub fn filter(&self) -> FilterMode {
        FilterMode::for_zoom(self.zoom)
    }

    /// Map a screen point to continuous coordinates in the unrotated source
    /// image (origin at its top-left corner).
    pub fn screen_to_image(&self, (sx, sy): (f32, f32), image_size: (u32, u32)) -> (f32, f32) {
        let dx = (sx - self.position.0 as f32) / self.zoom;
        let dy = (sy - self.position.1 as f32) / self.zoom;
        let (ux, uy) = match (-self.rotation).rem_euclid(360) {
            90 => (dy, -dx),
            180 => (-dx, -dy),
            270 => (-dy, dx),
            _ => (dx, dy),
        };
        (
            ux + image_size.0 as f32 / 2.0,
            uy + image_size.1 as f32 / 2.0,
        )
    }

    /// Source pixel under `pointer`, clamped into the image.
    pub fn selected_pixel(&self, pointer: (i32, i32), image_size: (u32, u32)) -> (u32, u32) {
        if image_size.0 == 0 || image_size.1 == 0 {
            return (0, 0);
        }
        let (x, y) = self.screen_to_image((pointer.0 as f32, pointer.1 as f32), image_size);
        (
            (x.floor().max(0.0) as u32).min(image_size.0 - 1),
            (y.floor().max(0.0) as u32).min(image_size.1 - 1),
        )
    }
}

/// Detects two primary presses close together in time and space.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleClick {
    last_position: (i32, i32),
    last_time: Option<f64>,
}

impl DoubleClick {
    /// Record a press at `now` seconds; true if it completes a double click.
    pub fn register(&mut self, position: (i32, i32), now: f64) -> bool {
        let double = matches!(
            self.last_time,
            Some(t) if now - t < DOUBLE_CLICK_SECONDS && position == self.last_position
        );
        self.last_position = position;
        self.last_time = Some(now);
        double
    }
}
