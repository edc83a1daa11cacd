/// Draw-time constants that depend on how the map assets were authored.
/// Kept as configuration so maps authored at other densities don't silently
/// drift against hardcoded literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Marker footprint on the canvas, in CSS pixels.
    pub icon_size_px: f64,
    /// Density correction for backgrounds authored at reduced resolution.
    pub small_texture_scale: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            icon_size_px: 24.0,
            small_texture_scale: 0.5,
        }
    }
}

/// Convert a 1-based in-game coordinate to texture pixels.
///
/// Map assets are authored at a fixed logical resolution per `size_factor`;
/// small-map variants are rendered at reduced density, so the extra scale is
/// a texture-resolution correction independent of the viewport.
///
/// Pure and total: non-finite input yields non-finite output, never a panic.
pub fn project(
    game_x: f64,
    game_y: f64,
    size_factor: f64,
    is_small_map: bool,
    config: &RenderConfig,
) -> (f64, f64) {
    let density = if is_small_map {
        config.small_texture_scale
    } else {
        1.0
    };
    (
        ((game_x - 1.0) / 2.0) * size_factor * density,
        ((game_y - 1.0) / 2.0) * size_factor * density,
    )
}

/// Letterbox transform from texture pixels to canvas pixels.
/// Derived per redraw and never cached across redraws — both the canvas and
/// the source image can change between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewportTransform {
    /// Texture pixels → canvas pixels.
    pub fn apply(&self, tex_x: f64, tex_y: f64) -> (f64, f64) {
        (
            self.offset_x + tex_x * self.scale,
            self.offset_y + tex_y * self.scale,
        )
    }
}

/// Uniform scale plus centering offsets so the whole image fits inside the
/// canvas without cropping or distortion.
///
/// Returns `None` when either image dimension is not positive — the image
/// simply hasn't loaded yet, and nothing should be drawn.
pub fn fit(image_w: f64, image_h: f64, canvas_w: f64, canvas_h: f64) -> Option<ViewportTransform> {
    if image_w <= 0.0 || image_h <= 0.0 {
        return None;
    }
    let scale = (canvas_w / image_w).min(canvas_h / image_h);
    Some(ViewportTransform {
        scale,
        offset_x: (canvas_w - image_w * scale) / 2.0,
        offset_y: (canvas_h - image_h * scale) / 2.0,
    })
}
