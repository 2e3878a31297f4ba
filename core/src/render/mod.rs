//! Annotated-image rendering: measurement segments, landmark markers, and
//! angle vertices drawn over the photo bitmap.
//!
//! Batch rendering drives the same engine pipeline the interactive path
//! uses, photo by photo, and restores the shared viewport state on every
//! exit path through an RAII guard.

use image::RgbaImage;
use thiserror::Error;
use tiny_skia::{LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::warn;

use crate::chart::AngleKind;
use crate::engine::{AngleEngine, CalculatedAngle};
use crate::geometry::Segment;
use crate::ledger::AngleLedger;
use crate::photo::{PhotoRecord, PhotoSize, PlacementRng};

/// Rendering failures abort only the photo they occur on.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("bitmap decode: {0}")]
    Decode(#[from] image::ImageError),
    #[error("bitmap dimensions unsupported")]
    Dimensions,
}

/// Stroke and marker styling for annotation overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// RGBA stroke color for segments and markers.
    pub color: [u8; 4],
    pub stroke_width: f32,
    pub point_radius: f32,
    /// Zoom factor the overlap-extension math runs at.
    pub geometry_scale: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: [255, 255, 255, 255],
            stroke_width: 3.0,
            point_radius: 6.0,
            geometry_scale: 3000.0,
        }
    }
}

/// Shared mutable state of the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset: (f64, f64),
    pub size: (u32, u32),
}

impl Viewport {
    pub fn new(scale: f64, offset: (f64, f64), size: (u32, u32)) -> Self {
        Self {
            scale,
            offset,
            size,
        }
    }
}

/// Captures a viewport on construction and restores it when dropped, so
/// every exit path of a batch leaves the surface as it found it.
pub struct ViewportGuard<'a> {
    viewport: &'a mut Viewport,
    saved: Viewport,
}

impl<'a> ViewportGuard<'a> {
    pub fn new(viewport: &'a mut Viewport) -> Self {
        let saved = *viewport;
        Self { viewport, saved }
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        self.viewport
    }
}

impl Drop for ViewportGuard<'_> {
    fn drop(&mut self) {
        *self.viewport = self.saved;
    }
}

/// Convert an RgbaImage to a Pixmap, run `draw`, and copy the pixels back.
fn with_pixmap(img: &mut RgbaImage, draw: impl FnOnce(&mut Pixmap)) -> Result<(), RenderError> {
    let size = tiny_skia::IntSize::from_wh(img.width(), img.height())
        .ok_or(RenderError::Dimensions)?;
    let mut pixmap =
        Pixmap::from_vec(img.as_raw().clone(), size).ok_or(RenderError::Dimensions)?;

    draw(&mut pixmap);

    img.copy_from_slice(pixmap.data());
    Ok(())
}

fn overlay_paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn overlay_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        ..Stroke::default()
    }
}

fn segment_path(segments: &[Segment]) -> Option<tiny_skia::Path> {
    if segments.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    for segment in segments {
        pb.move_to(segment.start.x as f32, segment.start.y as f32);
        pb.line_to(segment.end.x as f32, segment.end.y as f32);
    }
    pb.finish()
}

fn marker_path(centers: &[(f32, f32)], radius: f32) -> Option<tiny_skia::Path> {
    if centers.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    for (cx, cy) in centers {
        pb.push_circle(*cx, *cy, radius);
    }
    pb.finish()
}

fn vertex_path(angles: &[CalculatedAngle], arm: f32) -> Option<tiny_skia::Path> {
    if angles.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    for angle in angles {
        let (x, y) = (angle.x as f32, angle.y as f32);
        pb.move_to(x - arm, y);
        pb.line_to(x + arm, y);
        pb.move_to(x, y - arm);
        pb.line_to(x, y + arm);
    }
    pb.finish()
}

/// Render one photo with the overlay for `kind`.
///
/// Runs a full engine pass at the option's geometry scale first, so
/// unplaced landmarks get scattered placements, then strokes segments,
/// circles every working point, and cross-marks each angle vertex. Returns
/// the annotated bitmap and the engine's reported value, if any.
pub fn render_annotated(
    photo: &mut PhotoRecord,
    kind: AngleKind,
    opts: &RenderOptions,
    rng: &mut PlacementRng,
) -> Result<(RgbaImage, Option<CalculatedAngle>), RenderError> {
    let decoded = image::load_from_memory(&photo.image)?;
    let mut bitmap = if photo.is_flipped {
        image::imageops::flip_horizontal(&decoded.to_rgba8())
    } else {
        decoded.to_rgba8()
    };

    let size = PhotoSize {
        width: bitmap.width() as f64,
        height: bitmap.height() as f64,
    };

    let mut engine = AngleEngine::new(kind);
    let reported = engine.update(&mut photo.chart, size, opts.geometry_scale, rng);

    let markers: Vec<(f32, f32)> = engine
        .working_points()
        .iter()
        .map(|point| (point.position.x as f32, point.position.y as f32))
        .collect();

    with_pixmap(&mut bitmap, |pixmap| {
        let paint = overlay_paint(opts.color);
        let stroke = overlay_stroke(opts.stroke_width);

        if let Some(path) = segment_path(engine.segments()) {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        if let Some(path) = marker_path(&markers, opts.point_radius) {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        if let Some(path) = vertex_path(engine.angles(), opts.point_radius * 1.5) {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    })?;

    Ok((bitmap, reported))
}

/// Sequentially render every photo's used angle kinds, recording reported
/// values into the ledger.
///
/// Output names are `<stem>_<kind>.png`. The viewport is forced to 1:1 for
/// the duration of the batch and restored to its pre-batch state on every
/// exit path. Per-photo failures are logged and skipped; there is no
/// cancellation, the batch runs to completion.
pub fn render_batch(
    photos: &mut [PhotoRecord],
    viewport: &mut Viewport,
    ledger: &mut AngleLedger,
    opts: &RenderOptions,
    rng: &mut PlacementRng,
) -> Vec<(String, RgbaImage)> {
    let mut guard = ViewportGuard::new(viewport);
    guard.viewport_mut().scale = 1.0;
    guard.viewport_mut().offset = (0.0, 0.0);

    let mut rendered = Vec::new();

    for (index, photo) in photos.iter_mut().enumerate() {
        let kinds: Vec<AngleKind> = photo.used.iter().collect();
        for kind in kinds {
            match render_annotated(photo, kind, opts, rng) {
                Ok((bitmap, reported)) => {
                    guard.viewport_mut().size = (bitmap.width(), bitmap.height());
                    if let Some(value) = reported {
                        ledger.record(index, kind, value);
                    }
                    rendered.push((format!("{}_{kind}.png", photo.stem()), bitmap));
                }
                Err(error) => {
                    warn!(photo = %photo.name, %kind, %error, "skipping annotated render");
                }
            }
        }
    }

    rendered
}
