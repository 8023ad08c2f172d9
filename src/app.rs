//! Viewer state and the per-frame update.
//!
//! [`Viewer::frame`] consumes one [`InputState`] snapshot and advances
//! everything: hotkeys, open requests, browsing, the viewport, the
//! thumbnail strip and the text shown in the bars and panels. Drawing is
//! left to `ui::render`, which only reads from the viewer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cli::HELP_KEYS;
use crate::config::Config;
use crate::dialogs::Dialogs;
use crate::error::ViewerError;
use crate::files::{build_list, resort_list, step_index, SortMode};
use crate::input::{Button, InputState, Key};
use crate::loader::{
    decode_image, exif_summary, modified_timestamp, read_exif_orientation,
    rotation_for_orientation, save_image, DecodedImage, SaveOutcome,
};
use crate::thumbnails::{ThumbnailSource, ThumbnailStrip, STRIP_HEIGHT};
use crate::viewport::{DoubleClick, Rect, Viewport};

pub const MENU_BAR_HEIGHT: i32 = 19;
pub const INFORMATION_BAR_HEIGHT: i32 = 19;
/// Fullscreen overlays and the cursor hide after this long without movement.
pub const IDLE_HIDE_SECONDS: f64 = 1.0;

pub const TEXT_SCALE: u32 = 2;
pub const GLYPH_ADVANCE: i32 = 6 * TEXT_SCALE as i32;
pub const LINE_HEIGHT: i32 = 9 * TEXT_SCALE as i32;
pub const PANEL_PADDING: i32 = 8;

pub const FAILED_TO_OPEN: &str = "Failed to open this image.";
pub const NO_IMAGES: &str = "This directory has no images.";
const UNKNOWN_FILE_NAME: &str = "CAN'T DISPLAY FILE NAME!";
const EMPTY_LIST: &str = "EMPTY BROWSING LIST";

// ---------------------------------------------------------------------------
// Settings and adjustments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub show_thumbnails: bool,
    pub show_information_bar: bool,
    pub ignore_unknown_extensions: bool,
    pub sort_by_modified: bool,
    pub color_info_normalized: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_thumbnails: true,
            show_information_bar: true,
            ignore_unknown_extensions: true,
            sort_by_modified: false,
            color_info_normalized: true,
        }
    }
}

impl Settings {
    pub fn sort_mode(&self) -> SortMode {
        if self.sort_by_modified {
            SortMode::ModifiedDescending
        } else {
            SortMode::Alphabetical
        }
    }
}

/// Which channels reach the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channels {
    #[default]
    All,
    Red,
    Green,
    Blue,
}

impl Channels {
    pub fn multiplier(self) -> [f32; 4] {
        match self {
            Channels::All => [1.0, 1.0, 1.0, 1.0],
            Channels::Red => [1.0, 0.0, 0.0, 1.0],
            Channels::Green => [0.0, 1.0, 0.0, 1.0],
            Channels::Blue => [0.0, 0.0, 1.0, 1.0],
        }
    }

    fn next(self) -> Self {
        match self {
            Channels::All => Channels::Red,
            Channels::Red => Channels::Green,
            Channels::Green => Channels::Blue,
            Channels::Blue => Channels::All,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Channels::All => "RGBA",
            Channels::Red => "R",
            Channels::Green => "G",
            Channels::Blue => "B",
        }
    }
}

/// Display-only adjustments applied while drawing the main image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustments {
    pub grayscale: bool,
    pub invert: bool,
    pub zebra_pattern: bool,
    pub zebra_threshold: f32,
    pub alpha_checkerboard: bool,
    pub flat_tonemapping: bool,
    pub no_tonemapping: bool,
    /// Stops, -8..=8.
    pub exposure: f32,
    /// Added after exposure, -1..=1.
    pub offset: f32,
    pub channels: Channels,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            grayscale: false,
            invert: false,
            zebra_pattern: false,
            zebra_threshold: 0.95,
            alpha_checkerboard: true,
            flat_tonemapping: false,
            no_tonemapping: false,
            exposure: 0.0,
            offset: 0.0,
            channels: Channels::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Thumbnails,
    InformationBar,
    IgnoreUnknownExtensions,
    SortByModified,
    ColorInfoNormalized,
    Grayscale,
    Invert,
    ZebraPattern,
    AlphaCheckerboard,
    FlatTonemapping,
    NoTonemapping,
}

const SETTINGS_TOGGLES: &[(char, &str, Toggle)] = &[
    ('1', "Thumbnails", Toggle::Thumbnails),
    ('2', "Information bar", Toggle::InformationBar),
    ('3', "Ignore unknown extensions", Toggle::IgnoreUnknownExtensions),
    ('4', "Sort by last modified", Toggle::SortByModified),
    ('5', "Colour info normalised", Toggle::ColorInfoNormalized),
    ('6', "Grayscale", Toggle::Grayscale),
    ('7', "Invert", Toggle::Invert),
    ('8', "Zebra pattern", Toggle::ZebraPattern),
    ('9', "Alpha checkerboard", Toggle::AlphaCheckerboard),
    ('0', "Flat tonemapping", Toggle::FlatTonemapping),
    ('n', "No tonemapping", Toggle::NoTonemapping),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overlays {
    pub settings: bool,
    pub info: bool,
    pub help: bool,
}

/// A text box drawn over the image. Pointer input inside it does not reach
/// the viewport or the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub rect: Rect,
    pub lines: Vec<String>,
}

impl Panel {
    fn sized(x: i32, y: i32, lines: Vec<String>) -> Self {
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32;
        let w = widest * GLYPH_ADVANCE + PANEL_PADDING * 2;
        let h = lines.len() as i32 * LINE_HEIGHT + PANEL_PADDING * 2;
        Panel {
            rect: Rect::new(x, y, x + w, y + h),
            lines,
        }
    }
}

// ---------------------------------------------------------------------------
// Bar text
// ---------------------------------------------------------------------------

fn file_name_text(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
}

fn position_text(index: usize, len: usize) -> String {
    if len == 0 {
        EMPTY_LIST.to_string()
    } else {
        format!("{}/{}", index + 1, len)
    }
}

pub fn loaded_menu_text(
    index: usize,
    len: usize,
    path: Option<&Path>,
    size: (u32, u32),
    modified: &str,
) -> String {
    format!(
        "| {} | {} | {}x{} | {}",
        position_text(index, len),
        file_name_text(path),
        size.0,
        size.1,
        modified
    )
}

pub fn failed_menu_text(index: usize, len: usize, path: Option<&Path>) -> String {
    format!("| {} | {}", position_text(index, len), file_name_text(path))
}

/// `1234567` -> `1,234,567`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Information bar contents: text before the colour swatch, the swatch
/// colour, text after it.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoBar {
    pub before_swatch: String,
    pub swatch: [f32; 4],
    pub after_swatch: String,
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

pub struct Viewer {
    config: Config,
    dialogs: Box<dyn Dialogs>,
    thumbnail_source: Box<dyn ThumbnailSource>,

    pub list: Vec<PathBuf>,
    pub index: usize,
    loaded_index: Option<usize>,
    current_path: Option<PathBuf>,

    pub image: Option<DecodedImage>,
    pub frame_index: usize,
    animation_start: f64,
    /// Centred message shown over the image area.
    pub message: Option<&'static str>,
    pub menu_text: String,
    pub menu_is_error: bool,
    info_text: String,
    exif_text: Option<String>,
    file_size: Option<u64>,
    pointer_pixel: ((u32, u32), [f32; 4]),

    pub viewport: Viewport,
    double_click: DoubleClick,
    dragging: bool,
    pub strip: ThumbnailStrip,

    pub settings: Settings,
    pub adjustments: Adjustments,
    pub overlays: Overlays,

    pub window_size: (i32, i32),
    pub fullscreen: bool,
    last_mouse_move: f64,
    pub now: f64,
    pub title: String,
    pub quit: bool,
}

impl Viewer {
    pub fn new(
        config: Config,
        settings: Settings,
        dialogs: Box<dyn Dialogs>,
        thumbnail_source: Box<dyn ThumbnailSource>,
        window_size: (i32, i32),
    ) -> Self {
        let mut strip = ThumbnailStrip::default();
        strip.set_geometry(MENU_BAR_HEIGHT, window_size.0);
        strip.set_visible(settings.show_thumbnails);
        Self {
            config,
            dialogs,
            thumbnail_source,
            list: Vec::new(),
            index: 0,
            loaded_index: None,
            current_path: None,
            image: None,
            frame_index: 0,
            animation_start: 0.0,
            message: None,
            menu_text: String::new(),
            menu_is_error: false,
            info_text: String::new(),
            exif_text: None,
            file_size: None,
            pointer_pixel: ((0, 0), [0.0; 4]),
            viewport: Viewport::default(),
            double_click: DoubleClick::default(),
            dragging: false,
            strip,
            settings,
            adjustments: Adjustments::default(),
            overlays: Overlays::default(),
            window_size,
            fullscreen: false,
            last_mouse_move: 0.0,
            now: 0.0,
            title: "peek".to_string(),
            quit: false,
        }
    }

    pub fn set_window_size(&mut self, size: (i32, i32)) {
        self.window_size = (size.0.max(1), size.1.max(1));
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Where the image may be placed: below the menu bar and strip, above
    /// the information bar.
    pub fn permissible_rect(&self) -> Rect {
        let menu = if self.fullscreen { 0 } else { MENU_BAR_HEIGHT };
        let top = if self.settings.show_thumbnails {
            menu + STRIP_HEIGHT
        } else {
            menu
        };
        let bottom_bar = if self.settings.show_information_bar {
            INFORMATION_BAR_HEIGHT
        } else {
            0
        };
        Rect::new(0, top, self.window_size.0, self.window_size.1 - bottom_bar)
    }

    /// Fullscreen with the pointer left alone long enough.
    pub fn idle_hidden(&self) -> bool {
        self.fullscreen && self.now - self.last_mouse_move > IDLE_HIDE_SECONDS
    }

    pub fn menu_bar_shown(&self) -> bool {
        !self.fullscreen
    }

    pub fn information_bar_shown(&self) -> bool {
        self.settings.show_information_bar && !self.idle_hidden()
    }

    fn sync_strip(&mut self) {
        let top = if self.fullscreen { 0 } else { MENU_BAR_HEIGHT };
        self.strip.set_geometry(top, self.window_size.0);
        self.strip
            .set_visible(self.settings.show_thumbnails && !self.idle_hidden());
    }

    pub fn panels(&self) -> Vec<Panel> {
        if self.idle_hidden() {
            return Vec::new();
        }
        let rect = self.permissible_rect();
        let mut panels = Vec::new();
        if self.overlays.settings {
            panels.push(Panel::sized(
                PANEL_PADDING,
                rect.top + PANEL_PADDING,
                self.settings_lines(),
            ));
        }
        if self.overlays.info {
            let panel = Panel::sized(0, rect.top + PANEL_PADDING, self.info_lines());
            let w = panel.rect.width();
            let x = self.window_size.0 - w - PANEL_PADDING;
            panels.push(Panel::sized(x, rect.top + PANEL_PADDING, panel.lines));
        }
        if self.overlays.help {
            let lines: Vec<String> = HELP_KEYS.lines().map(str::to_string).collect();
            let panel = Panel::sized(0, 0, lines);
            let (cx, cy) = rect.center();
            let x = cx - panel.rect.width() / 2;
            let y = (cy - panel.rect.height() / 2).max(rect.top);
            panels.push(Panel::sized(x, y, panel.lines));
        }
        panels
    }

    /// True when the pointer is over the menu bar or a panel.
    pub fn pointer_captured(&self, pointer: (i32, i32)) -> bool {
        if self.menu_bar_shown() && pointer.1 >= 0 && pointer.1 < MENU_BAR_HEIGHT {
            return true;
        }
        self.panels().iter().any(|p| p.rect.contains(pointer))
    }

    fn toggle_value(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Thumbnails => self.settings.show_thumbnails,
            Toggle::InformationBar => self.settings.show_information_bar,
            Toggle::IgnoreUnknownExtensions => self.settings.ignore_unknown_extensions,
            Toggle::SortByModified => self.settings.sort_by_modified,
            Toggle::ColorInfoNormalized => self.settings.color_info_normalized,
            Toggle::Grayscale => self.adjustments.grayscale,
            Toggle::Invert => self.adjustments.invert,
            Toggle::ZebraPattern => self.adjustments.zebra_pattern,
            Toggle::AlphaCheckerboard => self.adjustments.alpha_checkerboard,
            Toggle::FlatTonemapping => self.adjustments.flat_tonemapping,
            Toggle::NoTonemapping => self.adjustments.no_tonemapping,
        }
    }

    fn flip(&mut self, toggle: Toggle) {
        match toggle {
            Toggle::Thumbnails => self.settings.show_thumbnails ^= true,
            Toggle::InformationBar => self.settings.show_information_bar ^= true,
            Toggle::IgnoreUnknownExtensions => self.settings.ignore_unknown_extensions ^= true,
            Toggle::SortByModified => {
                self.settings.sort_by_modified ^= true;
                self.resort();
            }
            Toggle::ColorInfoNormalized => self.settings.color_info_normalized ^= true,
            Toggle::Grayscale => self.adjustments.grayscale ^= true,
            Toggle::Invert => self.adjustments.invert ^= true,
            Toggle::ZebraPattern => self.adjustments.zebra_pattern ^= true,
            Toggle::AlphaCheckerboard => self.adjustments.alpha_checkerboard ^= true,
            Toggle::FlatTonemapping => self.adjustments.flat_tonemapping ^= true,
            Toggle::NoTonemapping => self.adjustments.no_tonemapping ^= true,
        }
        log::debug!("{:?} is now {}", toggle, self.toggle_value(toggle));
    }

    fn settings_lines(&self) -> Vec<String> {
        let mut lines = vec!["Settings (Tab to close)".to_string()];
        for (key, label, toggle) in SETTINGS_TOGGLES {
            let mark = if self.toggle_value(*toggle) { 'x' } else { ' ' };
            lines.push(format!("{} [{}] {}", key, mark, label));
        }
        let a = &self.adjustments;
        lines.push(format!("-/=  Exposure: {:.2}", a.exposure));
        lines.push(format!("[/]  Offset: {:.2}", a.offset));
        lines.push(format!("Up/Down  Zebra threshold: {:.4}", a.zebra_threshold));
        lines.push(format!("c  Channels: {}", a.channels.label()));
        lines.push("x  Reset adjustments".to_string());
        lines
    }

    fn info_lines(&self) -> Vec<String> {
        let mut lines = vec!["Image Information".to_string()];
        lines.extend(self.info_text.lines().map(str::to_string));
        if let Some(exif) = &self.exif_text {
            lines.push(String::new());
            lines.push("EXIF INFORMATION".to_string());
            lines.extend(exif.lines().map(str::to_string));
        }
        lines
    }

    pub fn info_bar(&self) -> InfoBar {
        let (pixel, color) = self.pointer_pixel;
        let before_swatch = format!(
            "{} | Rot:{} | X:{} Y:{} | ",
            crate::viewport::zoom_label(self.viewport.zoom),
            -self.viewport.rotation,
            pixel.0,
            pixel.1
        );

        let (scale, precision) = if self.settings.color_info_normalized {
            (1.0, 4)
        } else {
            (255.0, 2)
        };
        let mut after_swatch = format!(
            "  R:{:.*} G:{:.*} B:{:.*} A:{:.*}",
            precision,
            color[0] * scale,
            precision,
            color[1] * scale,
            precision,
            color[2] * scale,
            precision,
            color[3] * scale
        );
        if let Some(image) = self.image.as_ref().filter(|i| i.is_animated()) {
            after_swatch.push_str(&format!(
                " | {}/{} ({:.2}fps)",
                self.frame_index + 1,
                image.frames.len(),
                image.fps()
            ));
        }
        if let Some(size) = self.file_size {
            after_swatch.push_str(&format!(" | File size: {} bytes", group_thousands(size)));
        }

        InfoBar {
            before_swatch,
            swatch: color,
            after_swatch,
        }
    }

    // -----------------------------------------------------------------------
    // Opening and loading
    // -----------------------------------------------------------------------

    /// Build a new browsing list from `path` and show its selected entry.
    pub fn open_path(&mut self, path: &Path, supported_only: bool, recursive: bool) {
        match build_list(path, supported_only, recursive, self.settings.sort_mode()) {
            Ok(selection) => {
                self.list = selection.list;
                self.index = selection.index;
                self.load_current();
                self.strip
                    .rebuild(&self.list, self.index, self.thumbnail_source.as_mut());
            }
            Err(ViewerError::EmptyDirectory(dir)) => {
                log::warn!("No images in {:?}", dir);
                self.message = Some(NO_IMAGES);
                self.menu_is_error = true;
            }
            Err(e) => {
                log::error!("Couldn't open {:?}: {}", path, e);
                self.message = Some(FAILED_TO_OPEN);
                self.menu_is_error = true;
            }
        }
    }

    fn load_current(&mut self) {
        let Some(path) = self.list.get(self.index).cloned() else {
            return;
        };
        self.loaded_index = Some(self.index);
        self.current_path = Some(path.clone());

        let start = Instant::now();
        match decode_image(&path) {
            Ok(mut image) => {
                if self.config.use_mipmaps {
                    image.build_mipmaps();
                }
                log::info!(
                    "Loaded {:?} ({}x{} {}, {} frame(s)) in {:.2}s",
                    path,
                    image.width,
                    image.height,
                    image.format_name,
                    image.frames.len(),
                    start.elapsed().as_secs_f64()
                );
                self.loaded(image, &path);
            }
            Err(e) => {
                log::error!("{}", e);
                self.load_failed();
            }
        }
    }

    fn loaded(&mut self, image: DecodedImage, path: &Path) {
        let rotation = read_exif_orientation(path)
            .map(rotation_for_orientation)
            .unwrap_or(0);
        let modified = modified_timestamp(path).unwrap_or_default();

        self.menu_text = loaded_menu_text(
            self.index,
            self.list.len(),
            Some(path),
            image.size(),
            &modified,
        );
        self.menu_is_error = false;
        self.message = None;
        self.info_text = format!(
            "Dimensions: {}x{}\nLast Modified Time: {}",
            image.width, image.height, modified
        );
        self.exif_text = exif_summary(path);
        self.file_size = Some(image.file_size);
        self.title = file_name_text(Some(path));

        self.viewport = Viewport {
            rotation,
            ..Viewport::default()
        };
        let rect = self.permissible_rect();
        self.viewport.fit(rect, image.size());
        self.animation_start = self.now;
        self.frame_index = 0;
        self.image = Some(image);
    }

    fn load_failed(&mut self) {
        self.image = None;
        self.viewport.rotation = 0;
        self.message = Some(FAILED_TO_OPEN);
        self.menu_is_error = true;
        self.menu_text = failed_menu_text(self.index, self.list.len(), self.current_path.as_deref());
        self.info_text.clear();
        self.exif_text = None;
        self.file_size = None;
        self.title = file_name_text(self.current_path.as_deref());
    }

    /// Re-scan the directory of the current file.
    pub fn refresh(&mut self) {
        if let Some(path) = self.current_path.clone() {
            log::info!("Refreshing {:?}", path.parent().unwrap_or(path.as_path()));
            self.open_path(&path, self.settings.ignore_unknown_extensions, false);
        }
    }

    fn resort(&mut self) {
        if self.list.is_empty() {
            return;
        }
        resort_list(&mut self.list, self.settings.sort_mode());
        if let Some(current) = &self.current_path {
            if let Some(i) = self.list.iter().position(|p| p == current) {
                self.index = i;
                self.loaded_index = Some(i);
            }
        }
        self.menu_text = match &self.image {
            Some(image) => {
                let modified = modified_timestamp(&self.list[self.index]).unwrap_or_default();
                loaded_menu_text(
                    self.index,
                    self.list.len(),
                    self.current_path.as_deref(),
                    image.size(),
                    &modified,
                )
            }
            None => failed_menu_text(self.index, self.list.len(), self.current_path.as_deref()),
        };
        self.strip
            .rebuild(&self.list, self.index, self.thumbnail_source.as_mut());
    }

    fn start_dir(&self) -> Option<PathBuf> {
        self.current_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
    }

    pub fn save(&mut self) {
        let Some(image) = &self.image else {
            return;
        };
        let Some(frame) = image.frames.get(self.frame_index) else {
            return;
        };
        let pixels = frame.pixels.to_rgba8();
        let name = self
            .current_path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("image.png")
            .to_string();
        let start = self.start_dir();
        let Some(target) = self.dialogs.save_file(start.as_deref(), &name) else {
            return;
        };

        match save_image(&pixels, &target) {
            Ok(SaveOutcome::Saved) => {}
            Ok(SaveOutcome::SavedAsJpeg) => {
                log::warn!("{:?}: unsupported format, wrote a JPEG", target);
                self.dialogs.warn(
                    "Saved file as a JPEG",
                    "File type is not supported. Saved as a JPEG instead.",
                );
            }
            Err(e) => log::error!("{}", e),
        }
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    pub fn frame(&mut self, input: &InputState, now: f64) {
        self.now = now;
        if input.mouse_moved() || input.button_pressed(Button::Primary) {
            self.last_mouse_move = now;
        }
        let layout_before = (self.permissible_rect(), self.fullscreen);

        if input.close_requested || input.key_pressed(Key::Escape) {
            self.quit = true;
            return;
        }

        self.handle_hotkeys(input);
        self.handle_open_requests(input);
        self.handle_browsing(input);
        if self.image.is_some() {
            self.handle_viewport(input);
        }
        self.handle_strip(input);
        self.reconcile(input, layout_before);

        let rect = self.permissible_rect();
        if let Some(image) = &self.image {
            let size = image.size();
            self.viewport.update(rect, self.window_size, size);
            self.frame_index = image.frame_at(now - self.animation_start);
            let pixel = self.viewport.selected_pixel(input.cursor, size);
            let color = image.frames[self.frame_index].pixels.get(pixel.0, pixel.1);
            self.pointer_pixel = (pixel, color);
        }
    }

    /// Whether the window should keep redrawing without new input.
    pub fn wants_continuous_redraw(&self) -> bool {
        let animated = self.image.as_ref().map(|i| i.is_animated()).unwrap_or(false);
        animated || (self.fullscreen && !self.idle_hidden()) || self.adjustments.zebra_pattern
    }

    fn handle_hotkeys(&mut self, input: &InputState) {
        let ctrl = input.modifiers.ctrl;

        if input.ctrl_pressed('o') {
            let start = self.start_dir();
            if let Some(path) = self.dialogs.open_file(start.as_deref()) {
                self.open_path(&path, self.settings.ignore_unknown_extensions, false);
            }
        }
        if input.ctrl_pressed('p') || input.ctrl_pressed('l') {
            let recursive = input.ctrl_pressed('l');
            let start = self.start_dir();
            if let Some(dir) = self.dialogs.open_folder(start.as_deref()) {
                self.open_path(&dir, self.settings.ignore_unknown_extensions, recursive);
            }
        }
        if input.ctrl_pressed('s') {
            self.save();
        }
        if input.key_pressed(Key::F5) {
            self.refresh();
        }
        if input.key_pressed(Key::F11) || (!ctrl && input.char_pressed('f')) {
            self.fullscreen = !self.fullscreen;
            self.last_mouse_move = self.now;
        }
        if input.key_pressed(Key::Tab) {
            self.overlays.settings = !self.overlays.settings;
        }
        if ctrl {
            return;
        }
        if input.char_pressed('i') {
            self.overlays.info = !self.overlays.info;
        }
        if input.char_pressed('t') {
            self.flip(Toggle::Thumbnails);
        }
        if input.char_pressed('b') {
            self.flip(Toggle::InformationBar);
        }
        if input.char_pressed('?') {
            self.overlays.help = !self.overlays.help;
        }
        if input.char_pressed('r') {
            let rect = self.permissible_rect();
            if let Some(image) = &self.image {
                self.viewport.rotate(rect, image.size());
            }
        }
        if self.overlays.settings {
            self.handle_settings_keys(input);
        }
    }

    fn handle_settings_keys(&mut self, input: &InputState) {
        for (key, _, toggle) in SETTINGS_TOGGLES {
            if input.char_pressed(*key) {
                self.flip(*toggle);
            }
        }
        let a = &mut self.adjustments;
        if input.char_pressed('-') {
            a.exposure = (a.exposure - 0.25).max(-8.0);
        }
        if input.char_pressed('=') {
            a.exposure = (a.exposure + 0.25).min(8.0);
        }
        if input.char_pressed('[') {
            a.offset = (a.offset - 0.05).max(-1.0);
        }
        if input.char_pressed(']') {
            a.offset = (a.offset + 0.05).min(1.0);
        }
        if input.key_pressed(Key::Down) {
            a.zebra_threshold = (a.zebra_threshold - 0.01).max(0.0);
        }
        if input.key_pressed(Key::Up) {
            a.zebra_threshold = (a.zebra_threshold + 0.01).min(1.0);
        }
        if input.char_pressed('c') {
            a.channels = a.channels.next();
        }
        if input.char_pressed('x') {
            *a = Adjustments::default();
        }
    }

    fn handle_open_requests(&mut self, input: &InputState) {
        if let Some(path) = input.dropped.first() {
            log::info!("Dropped {:?}", path);
            self.open_path(path, true, false);
        }
    }

    fn handle_browsing(&mut self, input: &InputState) {
        let len = self.list.len();
        if len == 0 {
            return;
        }

        let mut direction = 0i64;
        if input.key_pressed(Key::Right) {
            direction += 1;
        }
        if input.key_pressed(Key::Left) {
            direction -= 1;
        }
        direction -= input.horizontal_scroll_steps().signum() as i64;

        if direction != 0 {
            let step = if input.modifiers.shift {
                100
            } else if input.modifiers.ctrl {
                10
            } else {
                1
            };
            self.index = step_index(self.index, direction.signum() * step, len);
            log::debug!("Browsed to {}/{}", self.index + 1, len);
        }

        if input.char_pressed(',') || input.key_pressed(Key::Home) {
            self.index = 0;
        }
        if input.char_pressed('.') || input.key_pressed(Key::End) {
            self.index = len - 1;
        }
    }

    fn handle_viewport(&mut self, input: &InputState) {
        let Some(size) = self.image.as_ref().map(|i| i.size()) else {
            return;
        };
        let pointer = input.cursor;
        let rect = self.permissible_rect();
        let inside = rect.contains(pointer) && !self.pointer_captured(pointer);

        let pressed = [Button::Primary, Button::Secondary, Button::Middle]
            .into_iter()
            .any(|b| input.button_pressed(b));
        if pressed && inside {
            self.dragging = true;
            if input.button_pressed(Button::Primary) && self.double_click.register(pointer, self.now)
            {
                self.viewport.toggle_actual_size(rect, size);
            }
        }

        if self.dragging {
            if input.any_button_down() {
                self.viewport.drag(input.mouse_delta());
            } else {
                self.dragging = false;
            }
        }

        let steps = input.scroll_steps();
        if steps != 0 && inside {
            self.viewport.zoom_at(pointer, steps, input.modifiers.ctrl);
        }
    }

    fn handle_strip(&mut self, input: &InputState) {
        let captured = self.pointer_captured(input.cursor);
        self.strip.handle_pointer(
            input.cursor,
            input.button_pressed(Button::Primary),
            captured,
        );
        if let Some(clicked) = self.strip.take_clicked() {
            if clicked != self.index && clicked < self.list.len() {
                self.index = clicked;
            }
        }
    }

    fn reconcile(&mut self, input: &InputState, (rect_before, fullscreen_before): (Rect, bool)) {
        if !self.list.is_empty() && self.loaded_index != Some(self.index) {
            self.load_current();
            self.strip
                .change_index(self.index, self.thumbnail_source.as_mut());
        }

        self.sync_strip();
        let layout_changed =
            rect_before != self.permissible_rect() || fullscreen_before != self.fullscreen;
        if input.resized || layout_changed {
            if !self.list.is_empty() {
                self.strip
                    .rebuild(&self.list, self.index, self.thumbnail_source.as_mut());
            }
            if input.resized {
                let rect = self.permissible_rect();
                if let Some(image) = &self.image {
                    self.viewport.fit(rect, image.size());
                }
            }
        }
    }
}
