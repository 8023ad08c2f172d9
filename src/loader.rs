use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::imageops::FilterType;
use image::{
    AnimationDecoder, ColorType, DynamicImage, ImageError, ImageFormat, ImageReader, Rgba,
    Rgba32FImage, RgbaImage,
};
use resvg::usvg;

use crate::error::{Result, ViewerError};
use crate::files::{dotted_extension, modified_time};
use crate::thumbnails::ThumbnailSource;

/// Formats whose values routinely exceed display range.
pub const TONEMAPPED_EXTENSIONS: &[&str] = &[
    ".hdr", ".exr", ".cr2", ".crw", ".dcr", ".mrw", ".arw", ".nef", ".orf", ".raf", ".x3f",
];

pub const JPEG_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".jfif", ".pjpeg", ".pjp"];

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

// ---------------------------------------------------------------------------
// Decoded pixels
// ---------------------------------------------------------------------------

/// Pixel storage for one frame. High bit depth and float sources keep
/// their range; everything else stays 8-bit.
pub enum Pixels {
    Rgba8(RgbaImage),
    Rgba32F(Rgba32FImage),
}

impl Pixels {
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img.color() {
            ColorType::L16
            | ColorType::La16
            | ColorType::Rgb16
            | ColorType::Rgba16
            | ColorType::Rgb32F
            | ColorType::Rgba32F => Pixels::Rgba32F(img.to_rgba32f()),
            _ => Pixels::Rgba8(img.to_rgba8()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Pixels::Rgba8(img) => img.dimensions(),
            Pixels::Rgba32F(img) => img.dimensions(),
        }
    }

    /// RGBA in 0..1 (float sources may exceed 1). Caller keeps x, y in range.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        match self {
            Pixels::Rgba8(img) => {
                let p = img.get_pixel(x, y).0;
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            }
            Pixels::Rgba32F(img) => img.get_pixel(x, y).0,
        }
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        match self {
            Pixels::Rgba8(img) => img.clone(),
            Pixels::Rgba32F(img) => DynamicImage::ImageRgba32F(img.clone()).to_rgba8(),
        }
    }

    fn half_size(&self) -> Option<Pixels> {
        let (w, h) = self.dimensions();
        if w < 2 && h < 2 {
            return None;
        }
        let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
        Some(match self {
            Pixels::Rgba8(img) => Pixels::Rgba8(image::imageops::resize(img, nw, nh, FilterType::Triangle)),
            Pixels::Rgba32F(img) => {
                Pixels::Rgba32F(image::imageops::resize(img, nw, nh, FilterType::Triangle))
            }
        })
    }
}

pub struct Frame {
    pub pixels: Pixels,
    /// Display time in centiseconds.
    pub delay_cs: u32,
}

pub struct DecodedImage {
    pub frames: Vec<Frame>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub format_name: String,
    pub needs_tonemap: bool,
    /// Successively halved copies of a still image, largest first.
    pub mips: Vec<Pixels>,
}

impl DecodedImage {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn total_delay_cs(&self) -> u32 {
        self.frames.iter().map(|f| f.delay_cs).sum()
    }

    pub fn fps(&self) -> f32 {
        let total = self.total_delay_cs();
        if total == 0 {
            return 0.0;
        }
        (self.frames.len() as f32 * 100.0) / total as f32
    }

    /// Which frame is on screen `elapsed` seconds after playback started.
    pub fn frame_at(&self, elapsed: f64) -> usize {
        let total = self.total_delay_cs();
        if !self.is_animated() || total == 0 {
            return 0;
        }
        let mut t = ((elapsed * 100.0) as u64 % total as u64) as u32;
        for (i, frame) in self.frames.iter().enumerate() {
            if t < frame.delay_cs {
                return i;
            }
            t -= frame.delay_cs;
        }
        self.frames.len() - 1
    }

    pub fn build_mipmaps(&mut self) {
        self.mips.clear();
        if self.is_animated() {
            return;
        }
        let Some(first) = self.frames.first() else { return };
        let mut level = first.pixels.half_size();
        while let Some(pixels) = level {
            let (w, h) = pixels.dimensions();
            level = if w > 1 || h > 1 { pixels.half_size() } else { None };
            self.mips.push(pixels);
        }
        log::debug!("Built {} mip levels", self.mips.len());
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

pub fn decode_image(path: &Path) -> Result<DecodedImage> {
    if !path.exists() {
        return Err(ViewerError::PathNotFound(path.to_path_buf()));
    }
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let extension = dotted_extension(path).unwrap_or_default();

    let frames = match extension.as_str() {
        ".svg" => vec![Frame {
            pixels: Pixels::Rgba8(render_svg(path)?),
            delay_cs: 0,
        }],
        ".gif" => decode_gif(path)?,
        ext => match decode_multi_frame(path, ext)? {
            Some(frames) => frames,
            None => {
                let img = ImageReader::open(path)
                    .and_then(|r| r.with_guessed_format())
                    .map_err(|e| ViewerError::decode(path, e))?
                    .decode()
                    .map_err(|e| ViewerError::decode(path, e))?;
                vec![Frame {
                    pixels: Pixels::from_dynamic(img),
                    delay_cs: 0,
                }]
            }
        },
    };

    let (width, height) = frames
        .first()
        .map(|f| f.pixels.dimensions())
        .ok_or_else(|| ViewerError::decode(path, "no frames"))?;

    let format_name = match extension.trim_start_matches('.') {
        "" => "UNKNOWN".to_string(),
        ext => ext.to_uppercase(),
    };

    Ok(DecodedImage {
        frames,
        width,
        height,
        file_size,
        format_name,
        needs_tonemap: TONEMAPPED_EXTENSIONS.contains(&extension.as_str()),
        mips: Vec::new(),
    })
}

fn open_buffered(path: &Path) -> Result<BufReader<fs::File>> {
    fs::File::open(path)
        .map(BufReader::new)
        .map_err(|e| ViewerError::decode(path, e))
}

/// Coalesce every frame of an animation, delays in centiseconds.
fn collect_animation<'a>(path: &Path, decoder: impl AnimationDecoder<'a>) -> Result<Vec<Frame>> {
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| ViewerError::decode(path, e))?;

    Ok(frames
        .into_iter()
        .map(|frame| {
            let (num, den) = frame.delay().numer_denom_ms();
            let delay_cs = num / den.max(1) / 10;
            Frame {
                pixels: Pixels::Rgba8(frame.into_buffer()),
                delay_cs,
            }
        })
        .collect())
}

fn decode_gif(path: &Path) -> Result<Vec<Frame>> {
    let decoder = GifDecoder::new(open_buffered(path)?).map_err(|e| ViewerError::decode(path, e))?;
    collect_animation(path, decoder)
}

/// Frames of an APNG or animated WebP. `None` for anything else, including
/// files whose header doesn't match their extension; those go through the
/// format-sniffing decoder instead.
fn decode_multi_frame(path: &Path, extension: &str) -> Result<Option<Vec<Frame>>> {
    match extension {
        ".webp" => {
            let Ok(decoder) = WebPDecoder::new(open_buffered(path)?) else {
                return Ok(None);
            };
            if !decoder.has_animation() {
                return Ok(None);
            }
            collect_animation(path, decoder).map(Some)
        }
        ".png" | ".apng" => {
            let Ok(decoder) = PngDecoder::new(open_buffered(path)?) else {
                return Ok(None);
            };
            if !decoder.is_apng().unwrap_or(false) {
                return Ok(None);
            }
            let apng = decoder.apng().map_err(|e| ViewerError::decode(path, e))?;
            collect_animation(path, apng).map(Some)
        }
        _ => Ok(None),
    }
}

fn render_svg(path: &Path) -> Result<RgbaImage> {
    let data = fs::read(path).map_err(|e| ViewerError::decode(path, e))?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| ViewerError::decode(path, e))?;

    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ViewerError::decode(path, "SVG has empty dimensions"))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Thumbnails
// ---------------------------------------------------------------------------

/// Thumbnails produced by decoding the file and shrinking it.
pub struct ImageThumbnails;

impl ThumbnailSource for ImageThumbnails {
    fn extract(&mut self, path: &Path, target_size: u32) -> Result<RgbaImage> {
        let img = if dotted_extension(path).as_deref() == Some(".svg") {
            DynamicImage::ImageRgba8(render_svg(path)?)
        } else {
            ImageReader::open(path)
                .and_then(|r| r.with_guessed_format())
                .map_err(|e| ViewerError::thumbnail(path, e))?
                .decode()
                .map_err(|e| ViewerError::thumbnail(path, e))?
        };
        Ok(img.thumbnail(target_size, target_size).to_rgba8())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    exif::Reader::new().read_from_container(&mut reader).ok()
}

pub fn read_exif_orientation(path: &Path) -> Option<u32> {
    read_exif(path)?
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)
}

/// Initial rotation in degrees for an EXIF orientation code.
pub fn rotation_for_orientation(code: u32) -> i32 {
    match code {
        3 => 180,
        4 => -180,
        5 => 90,
        6 => -90,
        7 => 270,
        8 => -270,
        _ => 0,
    }
}

const EXIF_SUMMARY_TAGS: &[(exif::Tag, &str)] = &[
    (exif::Tag::Make, "Camera Make"),
    (exif::Tag::Model, "Camera Model"),
    (exif::Tag::BodySerialNumber, "Serial Number"),
    (exif::Tag::Orientation, "Orientation"),
    (exif::Tag::XResolution, "X Resolution"),
    (exif::Tag::YResolution, "Y Resolution"),
    (exif::Tag::ResolutionUnit, "Resolution Unit"),
    (exif::Tag::BitsPerSample, "Bits Per Sample"),
    (exif::Tag::Software, "Software"),
    (exif::Tag::DateTime, "DateTime"),
    (exif::Tag::DateTimeOriginal, "DateTimeOriginal"),
    (exif::Tag::DateTimeDigitized, "DateTimeDigitized"),
    (exif::Tag::Copyright, "Copyright"),
    (exif::Tag::ExposureTime, "Exposure Time"),
    (exif::Tag::PhotographicSensitivity, "ISO Speed"),
    (exif::Tag::FNumber, "FNumber"),
    (exif::Tag::ExposureProgram, "Exposure Program"),
    (exif::Tag::ExposureBiasValue, "Exposure Bias"),
    (exif::Tag::FocalLength, "Focal Length"),
    (exif::Tag::Flash, "Flash"),
];

/// Human-readable EXIF lines for the info panel.
pub fn exif_summary(path: &Path) -> Option<String> {
    let exif = read_exif(path)?;
    let lines: Vec<String> = EXIF_SUMMARY_TAGS
        .iter()
        .filter_map(|(tag, label)| {
            let field = exif.get_field(*tag, exif::In::PRIMARY)?;
            let value = field.display_value().with_unit(&exif).to_string();
            Some(format!("{}: {}", label, value.trim_matches('"')))
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

pub fn modified_timestamp(path: &Path) -> Option<String> {
    let time: chrono::DateTime<chrono::Local> = modified_time(path)?.into();
    Some(time.format("%a, %d %b %Y %I:%M:%S %p").to_string())
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The requested format could not be written; the file holds a JPEG.
    SavedAsJpeg,
}

fn is_unsupported(e: &ImageError) -> bool {
    matches!(e, ImageError::Unsupported(_))
}

fn write_as(image: &RgbaImage, path: &Path, format: ImageFormat) -> std::result::Result<(), ImageError> {
    match DynamicImage::ImageRgba8(image.clone()).save_with_format(path, format) {
        Err(e) if is_unsupported(&e) => {
            DynamicImage::ImageRgba8(image.clone())
                .to_rgb8()
                .save_with_format(path, format)
        }
        other => other,
    }
}

pub fn starts_with_jpeg_magic(path: &Path) -> std::io::Result<bool> {
    let mut head = [0u8; 3];
    let mut file = fs::File::open(path)?;
    match file.read_exact(&mut head) {
        Ok(()) => Ok(head == JPEG_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Write `image` to `path` in the format its extension names, falling back
/// to JPEG when that format cannot be encoded.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<SaveOutcome> {
    let written = match ImageFormat::from_path(path) {
        Ok(format) => match write_as(image, path, format) {
            Ok(()) => true,
            Err(e) if is_unsupported(&e) => false,
            Err(e) => return Err(ViewerError::save(path, e)),
        },
        Err(_) => false,
    };

    if !written {
        DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg)
            .map_err(|e| ViewerError::save(path, e))?;
    }

    let named_jpeg = dotted_extension(path)
        .map(|e| JPEG_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false);
    if !named_jpeg && starts_with_jpeg_magic(path)? {
        log::warn!("{:?} was written as a JPEG", path);
        return Ok(SaveOutcome::SavedAsJpeg);
    }
    log::info!("Saved {:?}", path);
    Ok(SaveOutcome::Saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Delay, Frame as AnimFrame, GenericImageView};
    use tempfile::tempdir;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255]))
    }

    #[test]
    fn decodes_png_with_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pic.png");
        gradient(12, 7).save(&path).unwrap();

        let img = decode_image(&path).unwrap();
        assert_eq!(img.size(), (12, 7));
        assert_eq!(img.format_name, "PNG");
        assert!(!img.is_animated());
        assert!(!img.needs_tonemap);
        assert!(img.file_size > 0);
        assert_eq!(img.frames[0].pixels.get(1, 2)[0], 10.0 / 255.0);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(decode_image(&path), Err(ViewerError::Decode { .. })));
    }

    #[test]
    fn tonemap_follows_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.hdr");
        DynamicImage::ImageRgb32F(image::Rgb32FImage::from_pixel(4, 4, image::Rgb([2.0, 1.0, 0.5])))
            .save(&path)
            .unwrap();
        let img = decode_image(&path).unwrap();
        assert!(img.needs_tonemap);
        assert!(img.frames[0].pixels.get(0, 0)[0] > 1.0);
    }

    #[test]
    fn animated_gif_keeps_frames_and_delays() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        {
            let file = fs::File::create(&path).unwrap();
            let mut encoder = image::codecs::gif::GifEncoder::new(file);
            let frames = (0..3).map(|i| {
                AnimFrame::from_parts(
                    RgbaImage::from_pixel(8, 8, Rgba([i * 80, 0, 0, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }

        let img = decode_image(&path).unwrap();
        assert!(img.is_animated());
        assert_eq!(img.frames.len(), 3);
        assert_eq!(img.total_delay_cs(), 30);
        assert!((img.fps() - 10.0).abs() < 1e-4);
        assert_eq!(img.frame_at(0.05), 0);
        assert_eq!(img.frame_at(0.15), 1);
        assert_eq!(img.frame_at(0.25), 2);
        assert_eq!(img.frame_at(0.35), 0);
    }

    #[test]
    fn animated_png_keeps_frames_and_delays() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anim.png");
        {
            let file = fs::File::create(&path).unwrap();
            let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), 4, 4);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_animated(3, 0).unwrap();
            encoder.set_frame_delay(10, 100).unwrap();
            let mut writer = encoder.write_header().unwrap();
            for i in 0..3u8 {
                let data: Vec<u8> = (0..16).flat_map(|_| [i * 80, 0, 0, 255]).collect();
                writer.write_image_data(&data).unwrap();
            }
            writer.finish().unwrap();
        }

        let img = decode_image(&path).unwrap();
        assert!(img.is_animated());
        assert_eq!(img.frames.len(), 3);
        assert_eq!(img.size(), (4, 4));
        assert_eq!(img.total_delay_cs(), 30);
        assert_eq!(img.frames[2].pixels.get(0, 0)[0], 160.0 / 255.0);
    }

    #[test]
    fn still_png_stays_single_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("still.png");
        gradient(3, 3).save(&path).unwrap();
        let img = decode_image(&path).unwrap();
        assert!(!img.is_animated());
        assert_eq!(img.frames.len(), 1);
    }

    #[test]
    fn misnamed_png_falls_back_to_sniffing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("actually.png");
        gradient(5, 2)
            .save_with_format(&path, ImageFormat::Bmp)
            .unwrap();
        assert_eq!(decode_image(&path).unwrap().size(), (5, 2));
    }

    #[test]
    fn svg_is_rasterised() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("box.svg");
        fs::write(
            &path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#ff0000"/></svg>"##,
        )
        .unwrap();

        let img = decode_image(&path).unwrap();
        assert_eq!(img.size(), (20, 10));
        let px = img.frames[0].pixels.get(5, 5);
        assert_eq!(px, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        gradient(16, 8).save(&path).unwrap();
        let mut img = decode_image(&path).unwrap();
        img.build_mipmaps();
        let sizes: Vec<_> = img.mips.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, [(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn thumbnails_fit_target_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        gradient(200, 100).save(&path).unwrap();

        let thumb = ImageThumbnails.extract(&path, 64).unwrap();
        assert_eq!(thumb.dimensions(), (64, 32));
        assert!(matches!(
            ImageThumbnails.extract(&dir.path().join("missing.png"), 64),
            Err(ViewerError::ThumbnailExtraction { .. })
        ));
    }

    #[test]
    fn orientation_codes_map_to_rotation() {
        let expected = [(1, 0), (2, 0), (3, 180), (4, -180), (5, 90), (6, -90), (7, 270), (8, -270), (0, 0)];
        for (code, rotation) in expected {
            assert_eq!(rotation_for_orientation(code), rotation, "code {code}");
        }
    }

    #[test]
    fn images_without_exif_have_no_orientation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.png");
        gradient(2, 2).save(&path).unwrap();
        assert_eq!(read_exif_orientation(&path), None);
        assert_eq!(exif_summary(&path), None);
    }

    #[test]
    fn saving_png_keeps_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        assert_eq!(save_image(&gradient(4, 4), &path).unwrap(), SaveOutcome::Saved);
        assert!(!starts_with_jpeg_magic(&path).unwrap());
        assert_eq!(image::open(&path).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn saving_jpeg_by_name_is_not_a_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.JPG");
        assert_eq!(save_image(&gradient(4, 4), &path).unwrap(), SaveOutcome::Saved);
        assert!(starts_with_jpeg_magic(&path).unwrap());
    }

    #[test]
    fn unknown_format_falls_back_to_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.weird");
        assert_eq!(
            save_image(&gradient(4, 4), &path).unwrap(),
            SaveOutcome::SavedAsJpeg
        );
        assert!(starts_with_jpeg_magic(&path).unwrap());
    }

    #[test]
    fn short_files_are_not_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny");
        fs::write(&path, [0xFF, 0xD8]).unwrap();
        assert!(!starts_with_jpeg_magic(&path).unwrap());
    }
}
