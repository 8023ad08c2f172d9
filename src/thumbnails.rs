//! The strip of small previews along the top of the window.
//!
//! Only the entries that fit in the strip around the current index are
//! held. Moving the index reuses held entries by list index and drops the
//! rest, so stepping one image at a time extracts at most one or two new
//! thumbnails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::error::Result;
use crate::files::dotted_extension;
use crate::viewport::Rect;

pub const THUMBNAIL_SIZE: u32 = 64;
pub const PADDING: i32 = 4;

/// Height of the strip background.
pub const STRIP_HEIGHT: i32 = THUMBNAIL_SIZE as i32 + PADDING * 2;

/// Produces the small preview for a file. Failure is routine.
pub trait ThumbnailSource {
    fn extract(&mut self, path: &Path, target_size: u32) -> Result<RgbaImage>;
}

/// Magenta and black checks shown for files with no preview.
pub fn placeholder() -> RgbaImage {
    RgbaImage::from_fn(THUMBNAIL_SIZE, THUMBNAIL_SIZE, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba([255, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

pub struct Thumbnail {
    pub id: u64,
    pub path: PathBuf,
    pub image: RgbaImage,
    /// Horizontal offset of the anchor from the strip centre.
    pub offset: i32,
    pub list_index: usize,
    /// 0 = left edge at the anchor, 0.5 = centred, 1 = right edge.
    pub anchor: f32,
}

impl Thumbnail {
    pub fn width(&self) -> i32 {
        self.image.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.image.height() as i32
    }
}

/// Where the hover highlight goes and what it says.
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub bounds: Rect,
    pub label: String,
}

pub struct ThumbnailStrip {
    list: Vec<PathBuf>,
    entries: Vec<Thumbnail>,
    next_id: u64,
    current_index: usize,
    /// Top edge of the strip background.
    pub y: i32,
    pub width: i32,
    visible: bool,
    hover: Option<Hover>,
    clicked: Option<usize>,
}

impl Default for ThumbnailStrip {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            entries: Vec::new(),
            next_id: 0,
            current_index: 0,
            y: 0,
            width: 400,
            visible: true,
            hover: None,
            clicked: None,
        }
    }
}

impl ThumbnailStrip {
    pub fn entries(&self) -> &[Thumbnail] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.hover = None;
        }
    }

    pub fn set_geometry(&mut self, y: i32, width: i32) {
        self.y = y;
        self.width = width;
    }

    pub fn background(&self) -> Rect {
        Rect::new(0, self.y, self.width, self.y + STRIP_HEIGHT)
    }

    /// Vertical centre line the thumbnails are drawn on.
    pub fn centre_line(&self) -> i32 {
        self.y + THUMBNAIL_SIZE as i32 / 2 + PADDING
    }

    pub fn hover(&self) -> Option<&Hover> {
        self.hover.as_ref()
    }

    /// Clicked list index since the last call, if any.
    pub fn take_clicked(&mut self) -> Option<usize> {
        self.clicked.take()
    }

    /// Replace the list and lay the strip out from scratch.
    pub fn rebuild(&mut self, list: &[PathBuf], index: usize, source: &mut dyn ThumbnailSource) {
        if list.is_empty() || index >= list.len() {
            return;
        }
        self.list = list.to_vec();
        self.entries.clear();
        self.layout(index, HashMap::new(), source);
        log::debug!("Rebuilt thumbnail strip with {} entries", self.entries.len());
    }

    /// Recentre on `index`, keeping entries that are still in view.
    pub fn change_index(&mut self, index: usize, source: &mut dyn ThumbnailSource) {
        if self.list.is_empty() || index >= self.list.len() {
            return;
        }
        let held: HashMap<usize, Thumbnail> =
            self.entries.drain(..).map(|t| (t.list_index, t)).collect();
        let before = held.len();
        self.layout(index, held, source);
        log::debug!(
            "Thumbnail strip moved to {}: {} held before, {} now",
            index,
            before,
            self.entries.len()
        );
    }

    fn layout(
        &mut self,
        index: usize,
        mut held: HashMap<usize, Thumbnail>,
        source: &mut dyn ThumbnailSource,
    ) {
        let mut centre = self.take_or_create(&mut held, index, source);
        centre.offset = 0;
        centre.anchor = 0.5;
        let start = centre.width() / 2 + PADDING;
        let mut laid_out = vec![centre];

        for step in [-1i64, 1] {
            let mut offset = start;
            let mut i = index as i64;
            loop {
                i += step;
                if i < 0 || i >= self.list.len() as i64 {
                    break;
                }
                let mut thumb = self.take_or_create(&mut held, i as usize, source);
                if step < 0 {
                    thumb.offset = -offset;
                    thumb.anchor = 1.0;
                } else {
                    thumb.offset = offset;
                    thumb.anchor = 0.0;
                }
                offset += thumb.width() + PADDING;
                laid_out.push(thumb);
                if offset > self.width / 2 {
                    break;
                }
            }
        }

        // Whatever is still in `held` fell out of view and is dropped here.
        self.entries = laid_out;
        self.current_index = index;
    }

    fn take_or_create(
        &mut self,
        held: &mut HashMap<usize, Thumbnail>,
        list_index: usize,
        source: &mut dyn ThumbnailSource,
    ) -> Thumbnail {
        if let Some(existing) = held.remove(&list_index) {
            return existing;
        }
        let path = self.list[list_index].clone();
        let image = source.extract(&path, THUMBNAIL_SIZE).unwrap_or_else(|e| {
            log::warn!("{}", e);
            placeholder()
        });
        let id = self.next_id;
        self.next_id += 1;
        Thumbnail {
            id,
            path,
            image,
            offset: 0,
            list_index,
            anchor: 0.5,
        }
    }

    /// Screen box of an entry. Edges are inclusive.
    pub fn entry_bounds(&self, thumb: &Thumbnail) -> Rect {
        let anchor_x = self.width / 2 + thumb.offset;
        let centre_x = anchor_x - (thumb.width() as f32 * (thumb.anchor - 0.5)) as i32;
        let half = (thumb.width() / 2, thumb.height() / 2);
        let centre_y = self.centre_line();
        Rect::new(
            centre_x - half.0,
            centre_y - half.1,
            centre_x + half.0,
            centre_y + half.1,
        )
    }

    /// First held entry under `pointer`.
    pub fn hit_test(&self, pointer: (i32, i32)) -> Option<&Thumbnail> {
        if !self.visible || !self.background().contains(pointer) {
            return None;
        }
        self.entries
            .iter()
            .find(|t| self.entry_bounds(t).contains(pointer))
    }

    /// Update the hover highlight and record a click.
    pub fn handle_pointer(&mut self, pointer: (i32, i32), pressed: bool, captured: bool) {
        self.hover = None;
        if captured {
            return;
        }
        let Some(thumb) = self.hit_test(pointer) else { return };
        let list_index = thumb.list_index;
        let hover = Hover {
            bounds: self.entry_bounds(thumb),
            label: dotted_extension(&thumb.path).unwrap_or_else(|| "Unknown extension".to_string()),
        };
        if pressed {
            self.clicked = Some(list_index);
        }
        self.hover = Some(hover);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;

    /// Hands out solid squares and counts how often it was asked.
    #[derive(Default)]
    struct CountingSource {
        calls: Vec<PathBuf>,
        fail_on: Option<String>,
    }

    impl ThumbnailSource for CountingSource {
        fn extract(&mut self, path: &Path, target_size: u32) -> Result<RgbaImage> {
            self.calls.push(path.to_path_buf());
            if let Some(name) = &self.fail_on {
                if path.ends_with(name) {
                    return Err(ViewerError::thumbnail(path, "no preview"));
                }
            }
            Ok(RgbaImage::from_pixel(target_size, target_size, Rgba([10, 20, 30, 255])))
        }
    }

    fn list(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("img{i:03}.png"))).collect()
    }

    fn strip(width: i32) -> ThumbnailStrip {
        let mut strip = ThumbnailStrip::default();
        strip.set_geometry(19, width);
        strip
    }

    fn indices(strip: &ThumbnailStrip) -> Vec<usize> {
        let mut v: Vec<_> = strip.entries().iter().map(|t| t.list_index).collect();
        v.sort();
        v
    }

    #[test]
    fn single_entry_sits_in_the_centre() {
        let mut source = CountingSource::default();
        let mut strip = strip(800);
        strip.rebuild(&list(1), 0, &mut source);

        assert_eq!(strip.entries().len(), 1);
        let only = &strip.entries()[0];
        assert_eq!(only.offset, 0);
        assert_eq!(only.anchor, 0.5);
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let mut source = CountingSource::default();
        let mut strip = strip(800);
        strip.rebuild(&[], 0, &mut source);
        strip.change_index(3, &mut source);
        assert!(strip.entries().is_empty());
        assert!(source.calls.is_empty());
    }

    #[test]
    fn offsets_walk_outwards_until_half_width() {
        let mut source = CountingSource::default();
        // Half width 150: right side offsets 36, 104, then 172 > 150 stops.
        let mut strip = strip(300);
        strip.rebuild(&list(20), 10, &mut source);

        let mut offsets: Vec<_> = strip.entries().iter().map(|t| t.offset).collect();
        offsets.sort();
        assert_eq!(offsets, [-104, -36, 0, 36, 104]);
        assert_eq!(indices(&strip), [8, 9, 10, 11, 12]);
        assert_eq!(strip.entries().iter().filter(|t| t.offset == 0).count(), 1);

        for t in strip.entries() {
            let expected = match t.offset {
                o if o < 0 => 1.0,
                0 => 0.5,
                _ => 0.0,
            };
            assert_eq!(t.anchor, expected);
        }
    }

    #[test]
    fn list_edges_stop_the_walk() {
        let mut source = CountingSource::default();
        let mut strip = strip(2000);
        strip.rebuild(&list(3), 0, &mut source);
        assert_eq!(indices(&strip), [0, 1, 2]);
        assert!(strip.entries().iter().all(|t| t.offset >= 0));
    }

    #[test]
    fn change_index_reuses_and_evicts() {
        let mut source = CountingSource::default();
        let mut strip = strip(300);
        strip.rebuild(&list(20), 10, &mut source);
        assert_eq!(source.calls.len(), 5);
        let ids: HashMap<usize, u64> = strip.entries().iter().map(|t| (t.list_index, t.id)).collect();

        strip.change_index(11, &mut source);
        assert_eq!(indices(&strip), [9, 10, 11, 12, 13]);
        // Only index 13 was new.
        assert_eq!(source.calls.len(), 6);
        assert_eq!(source.calls.last(), Some(&PathBuf::from("img013.png")));
        for t in strip.entries() {
            if let Some(old) = ids.get(&t.list_index) {
                assert_eq!(*old, t.id);
            }
        }
        assert!(strip.entries().iter().all(|t| t.list_index != 8));
        assert_eq!(strip.current_index(), 11);
    }

    #[test]
    fn change_index_to_same_index_is_idempotent() {
        let mut source = CountingSource::default();
        let mut strip = strip(300);
        strip.rebuild(&list(20), 5, &mut source);
        let before: Vec<_> = strip.entries().iter().map(|t| (t.id, t.offset)).collect();

        strip.change_index(5, &mut source);
        let after: Vec<_> = strip.entries().iter().map(|t| (t.id, t.offset)).collect();
        assert_eq!(before, after);
        assert_eq!(source.calls.len(), 5);
    }

    #[test]
    fn failed_extraction_uses_placeholder() {
        let mut source = CountingSource {
            fail_on: Some("img001.png".into()),
            ..Default::default()
        };
        let mut strip = strip(300);
        strip.rebuild(&list(3), 1, &mut source);

        let centre = strip.entries().iter().find(|t| t.offset == 0).unwrap();
        assert_eq!(centre.image, placeholder());
        assert_eq!(strip.entries().len(), 3);
    }

    #[test]
    fn click_is_taken_once() {
        let mut source = CountingSource::default();
        let mut strip = strip(300);
        strip.rebuild(&list(20), 10, &mut source);

        // Right neighbour spans x 186..=250 on the centre line 19 + 32 + 4.
        strip.handle_pointer((200, 55), true, false);
        assert_eq!(strip.hover().map(|h| h.label.as_str()), Some(".png"));
        assert_eq!(strip.take_clicked(), Some(11));
        assert_eq!(strip.take_clicked(), None);

        // Left neighbour, anchored on its right edge at 150 - 36 = 114.
        strip.handle_pointer((60, 55), true, false);
        assert_eq!(strip.take_clicked(), Some(9));
    }

    #[test]
    fn captured_or_hidden_strip_ignores_pointer() {
        let mut source = CountingSource::default();
        let mut strip = strip(300);
        strip.rebuild(&list(20), 10, &mut source);

        strip.handle_pointer((150, 55), true, true);
        assert_eq!(strip.take_clicked(), None);
        assert!(strip.hover().is_none());

        strip.set_visible(false);
        strip.handle_pointer((150, 55), true, false);
        assert_eq!(strip.take_clicked(), None);

        // Below the background.
        strip.set_visible(true);
        strip.handle_pointer((150, 200), true, false);
        assert_eq!(strip.take_clicked(), None);
    }
}
