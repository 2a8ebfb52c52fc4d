//! # Freeform Overlay
//!
//! A transparent annotation layer, fixed at A4 in user units (595×842),
//! composited above the document during export capture only.
//!
//! ## Payload
//!
//! The payload is a JSON scene produced by an external drawing editor, in
//! the shape such editors commonly serialize:
//!
//! ```text
//! { "version": "5.3.0",
//!   "background": "#fff",                      ← ignored, always transparent
//!   "objects": [
//!     { "type": "rect", "left": 40, "top": 60, "width": 120, "height": 30,
//!       "fill": "rgba(255,0,0,0.3)", "stroke": "#c00", "strokeWidth": 2 },
//!     { "type": "textbox", "left": 50, "top": 70, "text": "PAID", "fontSize": 24 } ] }
//! ```
//!
//! Supported objects: `rect`, `circle`, `ellipse`, `line`, and
//! `text`/`textbox`/`i-text`. Anything else is skipped.
//!
//! ## Lifecycle
//!
//! [`load_overlay`] builds a fresh [`OverlayHandle`] per render. The handle
//! owns the layer's raster resources until [`OverlayHandle::dispose`] (or
//! drop). [`OverlaySlot::replace`] disposes the old handle before the new one
//! is installed, so repeated settings changes never hold two layers.

use std::sync::{Arc, Mutex, Weak};

use image::{Rgba, RgbaImage, imageops};
use serde::Deserialize;
use thiserror::Error;

use crate::layout::Rect;
use crate::raster::Painter;
use crate::raster::color::{BLACK, TRANSPARENT, parse_color, with_opacity};

/// Overlay page width in user units.
pub const OVERLAY_WIDTH: f32 = 595.0;

/// Overlay page height in user units.
pub const OVERLAY_HEIGHT: f32 = 842.0;

#[derive(Debug, Error, PartialEq)]
pub enum OverlayError {
    #[error("Overlay payload is empty")]
    Empty,

    #[error("Overlay parse error: {0}")]
    Parse(String),
}

// ============================================================================
// SCENE
// ============================================================================

/// Geometry and paint shared by every object type. Missing keys take the
/// editor's defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shape {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
    pub visible: bool,
    /// Color string, or a gradient/pattern object that paints nothing.
    pub fill: Option<serde_json::Value>,
    pub stroke: Option<serde_json::Value>,
    pub stroke_width: f32,
    pub radius: f32,
    pub rx: f32,
    pub ry: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub text: String,
    pub font_size: f32,
    pub font_weight: Option<serde_json::Value>,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            radius: 0.0,
            rx: 0.0,
            ry: 0.0,
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            text: String::new(),
            font_size: 40.0,
            font_weight: None,
        }
    }
}

impl Shape {
    fn bold(&self) -> bool {
        match &self.font_weight {
            Some(serde_json::Value::String(s)) => s == "bold",
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|w| w >= 600.0),
            _ => false,
        }
    }

    fn paint(&self, value: &Option<serde_json::Value>) -> Option<Rgba<u8>> {
        let Some(serde_json::Value::String(value)) = value else {
            return None;
        };
        let color = parse_color(value)?;
        Some(with_opacity(color, self.opacity))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Rect,
    Circle,
    Ellipse,
    Line,
    Text,
    Unsupported(String),
}

impl ObjectKind {
    fn from_type(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "rect" => ObjectKind::Rect,
            "circle" => ObjectKind::Circle,
            "ellipse" => ObjectKind::Ellipse,
            "line" => ObjectKind::Line,
            "text" | "textbox" | "i-text" | "itext" => ObjectKind::Text,
            _ => ObjectKind::Unsupported(kind.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(flatten)]
    shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawObject")]
pub struct OverlayObject {
    pub kind: ObjectKind,
    pub shape: Shape,
}

impl From<RawObject> for OverlayObject {
    fn from(raw: RawObject) -> Self {
        Self {
            kind: ObjectKind::from_type(&raw.kind),
            shape: raw.shape,
        }
    }
}

/// Parsed overlay scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverlayScene {
    #[serde(default)]
    pub version: Option<String>,
    /// Embedded background. Always cleared by [`parse_scene`].
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub objects: Vec<OverlayObject>,
}

/// Parse a serialized scene. The embedded background is discarded.
pub fn parse_scene(serialized: &str) -> Result<OverlayScene, OverlayError> {
    if serialized.trim().is_empty() {
        return Err(OverlayError::Empty);
    }
    let mut scene: OverlayScene =
        serde_json::from_str(serialized).map_err(|e| OverlayError::Parse(e.to_string()))?;
    scene.background = None;
    Ok(scene)
}

// ============================================================================
// LAYER
// ============================================================================

/// The overlay's raster resource: the scene plus its last rasterization.
#[derive(Debug)]
pub struct OverlayLayer {
    scene: OverlayScene,
    cache: Mutex<Option<RgbaImage>>,
}

impl OverlayLayer {
    fn new(scene: OverlayScene) -> Self {
        Self {
            scene,
            cache: Mutex::new(None),
        }
    }

    pub fn scene(&self) -> &OverlayScene {
        &self.scene
    }

    /// Transparent raster of the scene, `width` pixels wide.
    fn raster(&self, width: u32) -> RgbaImage {
        if let Ok(cache) = self.cache.lock()
            && let Some(image) = cache.as_ref()
            && image.width() == width
        {
            return image.clone();
        }

        let image = rasterize(&self.scene, width);
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(image.clone());
        }
        image
    }
}

fn rasterize(scene: &OverlayScene, width: u32) -> RgbaImage {
    let scale = width as f32 / OVERLAY_WIDTH;
    let height = (OVERLAY_HEIGHT * scale).round() as u32;
    let mut painter = Painter::new(width, height, scale, TRANSPARENT);

    for object in &scene.objects {
        let shape = &object.shape;
        if !shape.visible {
            continue;
        }
        match &object.kind {
            ObjectKind::Rect => draw_rect(&mut painter, shape),
            ObjectKind::Circle => {
                let r = shape.radius;
                draw_ellipse(&mut painter, shape, r * shape.scale_x, r * shape.scale_y);
            }
            ObjectKind::Ellipse => {
                draw_ellipse(&mut painter, shape, shape.rx * shape.scale_x, shape.ry * shape.scale_y);
            }
            ObjectKind::Line => draw_line(&mut painter, shape),
            ObjectKind::Text => draw_text(&mut painter, shape),
            ObjectKind::Unsupported(kind) => {
                tracing::debug!(kind = %kind, "skipping unsupported overlay object");
            }
        }
    }

    painter.into_image()
}

fn draw_rect(painter: &mut Painter, shape: &Shape) {
    let w = shape.width * shape.scale_x;
    let h = shape.height * shape.scale_y;
    let rect = Rect::new(shape.left, shape.top, w, h);
    if let Some(fill) = shape.paint(&shape.fill) {
        painter.fill_rect(rect, fill);
    }
    if let Some(stroke) = shape.paint(&shape.stroke) {
        let t = shape.stroke_width.max(0.0);
        if t > 0.0 {
            painter.fill_line(Rect::new(rect.x, rect.y, w, t), stroke);
            painter.fill_line(Rect::new(rect.x, rect.bottom() - t, w, t), stroke);
            painter.fill_line(Rect::new(rect.x, rect.y, t, h), stroke);
            painter.fill_line(Rect::new(rect.right() - t, rect.y, t, h), stroke);
        }
    }
}

/// Filled and/or stroked ellipse whose bounding box starts at `left, top`.
fn draw_ellipse(painter: &mut Painter, shape: &Shape, rx: f32, ry: f32) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let s = painter.scale();
    let (cx, cy) = ((shape.left + rx) * s, (shape.top + ry) * s);
    let (rx, ry) = (rx * s, ry * s);
    let fill = shape.paint(&shape.fill);
    let stroke = shape.paint(&shape.stroke);
    let t = (shape.stroke_width.max(0.0) * s).max(1.0);

    // bounding box clipped to the canvas
    let y0 = ((cy - ry).floor() as i64).max(0);
    let y1 = ((cy + ry).ceil() as i64).min(painter.height() as i64);
    let x0 = ((cx - rx).floor() as i64).max(0);
    let x1 = ((cx + rx).ceil() as i64).min(painter.width() as i64);
    let inner_rx = (rx - t).max(0.0);
    let inner_ry = (ry - t).max(0.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = (x as f32 + 0.5 - cx) / rx;
            let dy = (y as f32 + 0.5 - cy) / ry;
            let d = dx * dx + dy * dy;
            if d > 1.0 {
                continue;
            }
            // inside the stroke band when the point is within `t` of the edge
            let on_edge = inner_rx <= 0.0 || inner_ry <= 0.0 || {
                let ix = (x as f32 + 0.5 - cx) / inner_rx;
                let iy = (y as f32 + 0.5 - cy) / inner_ry;
                ix * ix + iy * iy > 1.0
            };
            match (on_edge, stroke, fill) {
                (true, Some(c), _) => painter.blend(x, y, c),
                (_, _, Some(c)) => painter.blend(x, y, c),
                _ => {}
            }
        }
    }
}

/// Line endpoints are relative to the object's center.
fn draw_line(painter: &mut Painter, shape: &Shape) {
    let Some(color) = shape.paint(&shape.stroke).or_else(|| shape.paint(&shape.fill)) else {
        return;
    };
    let width = if shape.width > 0.0 {
        shape.width
    } else {
        (shape.x2 - shape.x1).abs()
    };
    let height = if shape.height > 0.0 {
        shape.height
    } else {
        (shape.y2 - shape.y1).abs()
    };
    let cx = shape.left + width * shape.scale_x / 2.0;
    let cy = shape.top + height * shape.scale_y / 2.0;
    let (ax, ay) = (cx + shape.x1 * shape.scale_x, cy + shape.y1 * shape.scale_y);
    let (bx, by) = (cx + shape.x2 * shape.scale_x, cy + shape.y2 * shape.scale_y);

    let s = painter.scale();
    let half = ((shape.stroke_width.max(1.0) * s) / 2.0).max(0.5);
    let bounds = (
        -half,
        -half,
        painter.width() as f32 + half,
        painter.height() as f32 + half,
    );
    let Some(((ax, ay), (bx, by))) = clip_segment((ax * s, ay * s), (bx * s, by * s), bounds) else {
        return;
    };
    let steps = (bx - ax).abs().max((by - ay).abs()).ceil().max(1.0) as i64;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let px = ax + (bx - ax) * t;
        let py = ay + (by - ay) * t;
        painter.fill_px(
            (px - half).floor() as i64,
            (py - half).floor() as i64,
            (px + half).ceil() as i64,
            (py + half).ceil() as i64,
            color,
        );
    }
}

/// Liang-Barsky clip of segment `a`-`b` to `(min_x, min_y, max_x, max_y)`.
/// `None` when nothing of the segment is inside.
fn clip_segment(a: (f32, f32), b: (f32, f32), bounds: (f32, f32, f32, f32)) -> Option<((f32, f32), (f32, f32))> {
    let (min_x, min_y, max_x, max_y) = bounds;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-dx, a.0 - min_x),
        (dx, max_x - a.0),
        (-dy, a.1 - min_y),
        (dy, max_y - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    if !t0.is_finite() || !t1.is_finite() {
        return None;
    }
    Some((
        (a.0 + dx * t0, a.1 + dy * t0),
        (a.0 + dx * t1, a.1 + dy * t1),
    ))
}

fn draw_text(painter: &mut Painter, shape: &Shape) {
    let color = shape.paint(&shape.fill).unwrap_or(with_opacity(BLACK, shape.opacity));
    let size = shape.font_size * shape.scale_y;
    let line_height = size * crate::layout::text::LINE_HEIGHT_RATIO;
    for (i, line) in shape.text.lines().enumerate() {
        painter.draw_text(
            shape.left,
            shape.top + i as f32 * line_height,
            line,
            size,
            color,
            shape.bold(),
        );
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// Owner of one overlay layer.
#[derive(Debug)]
pub struct OverlayHandle {
    layer: Option<Arc<OverlayLayer>>,
}

impl OverlayHandle {
    pub fn from_scene(scene: OverlayScene) -> Self {
        Self {
            layer: Some(Arc::new(OverlayLayer::new(scene))),
        }
    }

    /// Composite the overlay onto `target`, scaled to its width.
    ///
    /// Returns `false` when the handle has been disposed.
    pub fn render_into(&self, target: &mut RgbaImage) -> bool {
        let Some(layer) = &self.layer else {
            return false;
        };
        let raster = layer.raster(target.width());
        imageops::overlay(target, &raster, 0, 0);
        true
    }

    /// Release the layer's resources. Idempotent.
    pub fn dispose(&mut self) {
        if self.layer.take().is_some() {
            tracing::debug!("overlay layer disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.layer.is_none()
    }

    pub fn scene(&self) -> Option<&OverlayScene> {
        self.layer.as_ref().map(|l| l.scene())
    }

    /// Weak reference to the layer, for checking that it was released.
    pub fn layer_ref(&self) -> Weak<OverlayLayer> {
        self.layer.as_ref().map(Arc::downgrade).unwrap_or_default()
    }
}

impl Drop for OverlayHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Load an overlay from its serialized scene.
///
/// Returns `None` (with a warning) when the payload does not parse; the
/// caller renders without an overlay.
pub fn load_overlay(serialized: &str) -> Option<OverlayHandle> {
    match parse_scene(serialized) {
        Ok(scene) => Some(OverlayHandle::from_scene(scene)),
        Err(e) => {
            tracing::warn!(error = %e, "overlay payload rejected");
            None
        }
    }
}

/// Holds at most one live overlay.
#[derive(Debug, Default)]
pub struct OverlaySlot {
    current: Option<OverlayHandle>,
}

impl OverlaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispose the current handle, then install `next`.
    pub fn replace(&mut self, next: Option<OverlayHandle>) {
        if let Some(mut old) = self.current.take() {
            old.dispose();
        }
        self.current = next;
    }

    pub fn clear(&mut self) {
        self.replace(None);
    }

    pub fn get(&self) -> Option<&OverlayHandle> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::color::WHITE;

    const RED_BOX: &str = r##"{
        "version": "5.3.0",
        "background": "#000000",
        "objects": [
            {"type": "rect", "left": 0, "top": 0, "width": 100, "height": 100, "fill": "#ff0000"}
        ]
    }"##;

    fn white_page() -> RgbaImage {
        RgbaImage::from_pixel(595, 842, WHITE)
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_scene(""), Err(OverlayError::Empty));
        assert!(matches!(parse_scene("{oops"), Err(OverlayError::Parse(_))));
        assert!(load_overlay("[1, 2").is_none());
    }

    #[test]
    fn parse_clears_background() {
        let scene = parse_scene(RED_BOX).unwrap();
        assert_eq!(scene.background, None);
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].kind, ObjectKind::Rect);
    }

    #[test]
    fn unknown_objects_are_kept_but_not_drawn() {
        let scene = parse_scene(r#"{"objects":[{"type":"path","path":[]},{"type":"image","src":"x.png"}]}"#).unwrap();
        assert_eq!(scene.objects[0].kind, ObjectKind::Unsupported("path".to_string()));
        assert_eq!(scene.objects[1].kind, ObjectKind::Unsupported("image".to_string()));
        let mut page = white_page();
        OverlayHandle::from_scene(scene).render_into(&mut page);
        assert!(page.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn background_never_occludes() {
        let handle = load_overlay(RED_BOX).unwrap();
        let mut page = white_page();
        assert!(handle.render_into(&mut page));
        assert_eq!(*page.get_pixel(50, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*page.get_pixel(300, 500), WHITE);
    }

    #[test]
    fn overlay_scales_with_target_width() {
        let handle = load_overlay(RED_BOX).unwrap();
        let mut page = RgbaImage::from_pixel(1190, 1684, WHITE);
        handle.render_into(&mut page);
        assert_eq!(*page.get_pixel(190, 190), Rgba([255, 0, 0, 255]));
        assert_eq!(*page.get_pixel(210, 210), WHITE);
    }

    #[test]
    fn translucent_fill_blends() {
        let handle = load_overlay(
            r#"{"objects":[{"type":"rect","left":0,"top":0,"width":10,"height":10,"fill":"rgba(0,0,0,0.5)"}]}"#,
        )
        .unwrap();
        let mut page = white_page();
        handle.render_into(&mut page);
        let p = page.get_pixel(5, 5);
        assert!(p.0[0] > 100 && p.0[0] < 160, "{:?}", p);
    }

    #[test]
    fn circle_and_text_draw() {
        let handle = load_overlay(
            r##"{"objects":[
                {"type":"circle","left":100,"top":100,"radius":20,"fill":"blue"},
                {"type":"textbox","left":300,"top":300,"text":"PAID","fontSize":24,"fill":"#00aa00"}
            ]}"##,
        )
        .unwrap();
        let mut page = white_page();
        handle.render_into(&mut page);
        assert_eq!(*page.get_pixel(120, 120), Rgba([0, 0, 255, 255]));
        assert_eq!(*page.get_pixel(101, 101), WHITE);
        assert!(page.pixels().any(|p| *p == Rgba([0, 0xaa, 0, 255])));
    }

    #[test]
    fn line_draws_between_endpoints() {
        let handle = load_overlay(
            r##"{"objects":[{"type":"line","left":10,"top":50,"width":100,"height":0,
                "x1":-50,"y1":0,"x2":50,"y2":0,"stroke":"#000000","strokeWidth":2}]}"##,
        )
        .unwrap();
        let mut page = white_page();
        handle.render_into(&mut page);
        assert_eq!(*page.get_pixel(60, 50), BLACK);
        assert_eq!(*page.get_pixel(60, 60), WHITE);
    }

    #[test]
    fn huge_circle_is_clipped_to_the_page() {
        let started = std::time::Instant::now();
        let handle = load_overlay(
            r#"{"objects":[{"type":"circle","left":-1000000,"top":-1000000,"radius":1000000,"fill":"blue"}]}"#,
        )
        .unwrap();
        let mut page = RgbaImage::from_pixel(1190, 1684, WHITE);
        handle.render_into(&mut page);
        // the page lies inside the circle, near its center
        assert_eq!(*page.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*page.get_pixel(1189, 1683), Rgba([0, 0, 255, 255]));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn huge_line_is_clipped_to_the_page() {
        let started = std::time::Instant::now();
        let handle = load_overlay(
            r##"{"objects":[{"type":"line","left":-1000000,"top":100,"width":2000000,"height":0,
                "x1":-1000000,"y1":0,"x2":1000000,"y2":0,"stroke":"#000000","strokeWidth":2}]}"##,
        )
        .unwrap();
        let mut page = white_page();
        handle.render_into(&mut page);
        assert_eq!(*page.get_pixel(0, 100), BLACK);
        assert_eq!(*page.get_pixel(594, 100), BLACK);
        assert_eq!(*page.get_pixel(300, 120), WHITE);
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn segment_outside_the_bounds_is_dropped() {
        let bounds = (0.0, 0.0, 10.0, 10.0);
        assert_eq!(clip_segment((-5.0, 20.0), (15.0, 20.0), bounds), None);
        assert_eq!(
            clip_segment((-5.0, 5.0), (15.0, 5.0), bounds),
            Some(((0.0, 5.0), (10.0, 5.0)))
        );
    }

    #[test]
    fn gradient_fill_paints_nothing_but_keeps_the_scene() {
        let handle = load_overlay(
            r##"{"objects":[
                {"type":"rect","left":0,"top":0,"width":50,"height":50,
                 "fill":{"type":"linear","coords":{"x1":0,"y1":0,"x2":50,"y2":0},
                         "colorStops":[{"offset":0,"color":"red"},{"offset":1,"color":"blue"}]}},
                {"type":"rect","left":100,"top":0,"width":50,"height":50,"fill":"#ff0000",
                 "stroke":{"source":"pattern.png","repeat":"repeat"}}
            ]}"##,
        )
        .unwrap();
        assert_eq!(handle.scene().map(|s| s.objects.len()), Some(2));
        let mut page = white_page();
        handle.render_into(&mut page);
        assert_eq!(*page.get_pixel(25, 25), WHITE);
        assert_eq!(*page.get_pixel(125, 25), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn disposed_handle_renders_nothing() {
        let mut handle = load_overlay(RED_BOX).unwrap();
        let layer = handle.layer_ref();
        handle.dispose();
        assert!(handle.is_disposed());
        assert!(layer.upgrade().is_none());
        let mut page = white_page();
        assert!(!handle.render_into(&mut page));
        assert_eq!(*page.get_pixel(50, 50), WHITE);
        handle.dispose();
    }

    #[test]
    fn slot_disposes_before_replacing() {
        let mut slot = OverlaySlot::new();
        let first = load_overlay(RED_BOX).unwrap();
        let first_layer = first.layer_ref();
        slot.replace(Some(first));
        assert!(first_layer.upgrade().is_some());

        let second = load_overlay(RED_BOX).unwrap();
        let second_layer = second.layer_ref();
        slot.replace(Some(second));
        assert!(first_layer.upgrade().is_none());
        assert!(second_layer.upgrade().is_some());

        slot.clear();
        assert!(second_layer.upgrade().is_none());
        assert!(slot.get().is_none());
    }

    #[test]
    fn drop_releases_layer() {
        let handle = load_overlay(RED_BOX).unwrap();
        let layer = handle.layer_ref();
        drop(handle);
        assert!(layer.upgrade().is_none());
    }
}
