use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::{
    error::{LomoError, LomoResult},
    raster::{Painter, RadialGradient},
    surface::Surface,
};

/// Per-channel weights for the grayscale conversion. The defaults sum to
/// 1.06, so the weighted brightness can exceed 255 and is clamped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrayscaleWeights {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Default for GrayscaleWeights {
    fn default() -> Self {
        Self {
            red: 0.38,
            green: 0.50,
            blue: 0.18,
        }
    }
}

impl GrayscaleWeights {
    pub fn validate(&self) -> LomoResult<()> {
        for w in [self.red, self.green, self.blue] {
            if !w.is_finite() || w < 0.0 {
                return Err(LomoError::validation(
                    "grayscale weights must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Brightness/contrast curve for the color filter. The contrast intercept is
/// derived: `128 * (1 - contrast)`, -32 with the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorCurve {
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for ColorCurve {
    fn default() -> Self {
        Self {
            brightness: 1.35,
            contrast: 1.25,
        }
    }
}

impl ColorCurve {
    pub fn intercept(&self) -> f32 {
        128.0 * (1.0 - self.contrast)
    }

    pub fn validate(&self) -> LomoResult<()> {
        for v in [self.brightness, self.contrast] {
            if !v.is_finite() || v < 0.0 {
                return Err(LomoError::validation(
                    "color curve brightness and contrast must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Horizontal blur parameters: the compositing alpha of each pass and the
/// half-open offset range, stepped by one. The defaults give offsets
/// -1, 0, +1 at 50% alpha.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurSpread {
    pub alpha: f32,
    pub shift_start: i32,
    pub shift_end: i32,
}

impl Default for BlurSpread {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            shift_start: -1,
            shift_end: 2,
        }
    }
}

impl BlurSpread {
    /// The pass offsets, in increasing order.
    pub fn offsets(&self) -> std::ops::Range<i32> {
        self.shift_start..self.shift_end
    }

    pub fn validate(&self) -> LomoResult<()> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(LomoError::validation("blur alpha must be within 0..=1"));
        }
        if self.shift_start > self.shift_end {
            return Err(LomoError::validation("blur shift range must not be reversed"));
        }
        Ok(())
    }
}

/// Alpha ramp of one vignette layer at the three gradient stops.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerRamp {
    pub inner_alpha: f32,
    pub transition_alpha: f32,
    pub outer_alpha: f32,
}

impl LayerRamp {
    fn validate(&self, layer: &str) -> LomoResult<()> {
        for a in [self.inner_alpha, self.transition_alpha, self.outer_alpha] {
            if !a.is_finite() || !(0.0..=1.0).contains(&a) {
                return Err(LomoError::validation(format!(
                    "vignette {layer} layer alphas must be within 0..=1"
                )));
            }
        }
        Ok(())
    }
}

/// Vignette geometry and the two layer ramps: a black edge-darkening layer
/// painted first, then a white center-glow layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteShape {
    pub transition_stop: f32,
    pub outer_stop: f32,
    pub black: LayerRamp,
    pub white: LayerRamp,
}

impl Default for VignetteShape {
    fn default() -> Self {
        Self {
            transition_stop: 0.65,
            outer_stop: 1.0,
            black: LayerRamp {
                inner_alpha: 0.0,
                transition_alpha: 0.0,
                outer_alpha: 14.0 / 255.0,
            },
            white: LayerRamp {
                inner_alpha: 0.2,
                transition_alpha: 0.0,
                outer_alpha: 0.0,
            },
        }
    }
}

impl VignetteShape {
    pub fn validate(&self) -> LomoResult<()> {
        let ordered = self.transition_stop.is_finite()
            && self.outer_stop.is_finite()
            && 0.0 <= self.transition_stop
            && self.transition_stop <= self.outer_stop
            && self.outer_stop <= 1.0;
        if !ordered {
            return Err(LomoError::validation(
                "vignette stops must satisfy 0 <= transition <= outer <= 1",
            ));
        }
        self.black.validate("black")?;
        self.white.validate("white")
    }
}

/// Converts every pixel to its weighted brightness, written to R, G and B.
/// Alpha is untouched. The weighted sum is clamped, so pure white survives
/// weights that sum above 1.
pub fn apply_grayscale(surface: &mut Surface, weights: &GrayscaleWeights) {
    for px in surface.data_mut().chunks_exact_mut(4) {
        let brightness = weights.red * f32::from(px[0])
            + weights.green * f32::from(px[1])
            + weights.blue * f32::from(px[2]);
        let v = clamp_channel(brightness);
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
}

/// Warms and punches up the image: per channel, brightness multiply (clamped)
/// then a contrast line through the midpoint intercept (clamped). Alpha is
/// untouched. Not idempotent: repeated application compounds, so callers
/// re-derive from the original snapshot instead of stacking.
pub fn apply_color(surface: &mut Surface, curve: &ColorCurve) {
    let intercept = curve.intercept();
    for px in surface.data_mut().chunks_exact_mut(4) {
        for c in 0..3 {
            let brightened = (f32::from(px[c]) * curve.brightness).min(255.0);
            px[c] = clamp_channel(brightened * curve.contrast + intercept);
        }
    }
}

/// Horizontal soft blur: composites the surface's accumulated content over
/// itself at each offset in the spread, in increasing order, at the spread's
/// alpha. The painter's global alpha is restored to exactly 1.0 on exit no
/// matter what it was before the call. With the default spread this is the
/// [1, 2, 1]/4 kernel on opaque content.
pub fn apply_blur(surface: &mut Surface, painter: &mut Painter, spread: &BlurSpread) {
    painter.set_alpha(spread.alpha);
    for dx in spread.offsets() {
        painter.blend_self_shifted(surface, dx, 0);
    }
    painter.set_alpha(1.0);
}

/// Builds the two vignette gradient layers for a surface of the given size:
/// both centered at (w/2, h/2), spanning radius 0 to the corner distance
/// `sqrt((w/2)^2 + (h/2)^2)`, three stops each.
pub fn vignette_layers(
    width: u32,
    height: u32,
    shape: &VignetteShape,
) -> (RadialGradient, RadialGradient) {
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let center = Point::new(cx, cy);
    let outer_radius = (cx * cx + cy * cy).sqrt();

    let black = RadialGradient::new(center, outer_radius)
        .with_stop(0.0, [0, 0, 0], shape.black.inner_alpha)
        .with_stop(shape.transition_stop, [0, 0, 0], shape.black.transition_alpha)
        .with_stop(shape.outer_stop, [0, 0, 0], shape.black.outer_alpha);
    let white = RadialGradient::new(center, outer_radius)
        .with_stop(0.0, [255, 255, 255], shape.white.inner_alpha)
        .with_stop(shape.transition_stop, [255, 255, 255], shape.white.transition_alpha)
        .with_stop(shape.outer_stop, [255, 255, 255], shape.white.outer_alpha);
    (black, white)
}

/// Darkened edges plus a subtle center glow: fills the surface with the black
/// layer, then the white layer. A zero-area surface is left untouched.
pub fn apply_vignette(surface: &mut Surface, painter: &Painter, shape: &VignetteShape) {
    if surface.is_empty() {
        return;
    }
    let (black, white) = vignette_layers(surface.width(), surface.height(), shape);
    painter.fill_radial(surface, &black);
    painter.fill_radial(surface, &white);
}

/// One configured filter operation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Grayscale(GrayscaleWeights),
    Color(ColorCurve),
    Blur(BlurSpread),
    Vignette(VignetteShape),
}

impl Effect {
    pub fn validate(&self) -> LomoResult<()> {
        match self {
            Effect::Grayscale(w) => w.validate(),
            Effect::Color(c) => c.validate(),
            Effect::Blur(b) => b.validate(),
            Effect::Vignette(v) => v.validate(),
        }
    }

    pub fn apply(&self, surface: &mut Surface, painter: &mut Painter) {
        match self {
            Effect::Grayscale(w) => apply_grayscale(surface, w),
            Effect::Color(c) => apply_color(surface, c),
            Effect::Blur(b) => apply_blur(surface, painter, b),
            Effect::Vignette(v) => apply_vignette(surface, painter, v),
        }
    }
}

/// Validates every effect up front, then applies them in order.
pub fn apply_effects(
    effects: &[Effect],
    surface: &mut Surface,
    painter: &mut Painter,
) -> LomoResult<()> {
    for effect in effects {
        effect.validate()?;
    }
    for effect in effects {
        tracing::trace!(?effect, "effect pass");
        effect.apply(surface, painter);
    }
    Ok(())
}

/// The two named looks, each a fixed effect stack applied front to back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Look {
    BlackWhite,
    Color,
}

impl Look {
    pub fn effects(self) -> Vec<Effect> {
        match self {
            Look::BlackWhite => vec![
                Effect::Grayscale(GrayscaleWeights::default()),
                Effect::Blur(BlurSpread::default()),
                Effect::Vignette(VignetteShape::default()),
            ],
            Look::Color => vec![
                Effect::Color(ColorCurve::default()),
                Effect::Blur(BlurSpread::default()),
                Effect::Vignette(VignetteShape::default()),
            ],
        }
    }
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
