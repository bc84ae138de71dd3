use kurbo::Point;

use crate::surface::Surface;

/// One color stop of a radial gradient. Offsets are 0.0..=1.0 along the
/// radius, color is straight RGB, alpha is 0.0..=1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: [u8; 3],
    pub alpha: f32,
}

/// A radial gradient from `center` out to `radius`, sampled piecewise-linearly
/// between its stops. Outside the first/last stop the nearest stop's value
/// holds.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    center: Point,
    radius: f64,
    stops: Vec<GradientStop>,
}

impl RadialGradient {
    /// A gradient with no stops yet. Negative radii collapse to 0.
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            stops: Vec::new(),
        }
    }

    /// Adds a stop, keeping stops sorted by offset. Offsets are clamped to
    /// 0.0..=1.0; among equal offsets insertion order is preserved.
    pub fn with_stop(mut self, offset: f32, color: [u8; 3], alpha: f32) -> Self {
        let stop = GradientStop {
            offset: offset.clamp(0.0, 1.0),
            color,
            alpha: alpha.clamp(0.0, 1.0),
        };
        let at = self
            .stops
            .iter()
            .position(|s| s.offset > stop.offset)
            .unwrap_or(self.stops.len());
        self.stops.insert(at, stop);
        self
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Samples color and alpha at `t` (clamped to 0.0..=1.0). A gradient with
    /// no stops samples as fully transparent black.
    pub fn sample(&self, t: f32) -> ([u8; 3], f32) {
        let (first, last) = match self.stops.as_slice() {
            [] => return ([0, 0, 0], 0.0),
            [only] => return (only.color, only.alpha),
            [first, .., last] => (first, last),
        };

        let t = t.clamp(0.0, 1.0);
        if t <= first.offset {
            return (first.color, first.alpha);
        }
        if t >= last.offset {
            return (last.color, last.alpha);
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t < lo.offset || t > hi.offset {
                continue;
            }
            let span = hi.offset - lo.offset;
            if span <= 0.0 {
                // Hard stop: the later stop wins past the shared offset.
                return (hi.color, hi.alpha);
            }
            let f = (t - lo.offset) / span;
            let color = [
                lerp_channel(lo.color[0], hi.color[0], f),
                lerp_channel(lo.color[1], hi.color[1], f),
                lerp_channel(lo.color[2], hi.color[2], f),
            ];
            return (color, lo.alpha + (hi.alpha - lo.alpha) * f);
        }

        (last.color, last.alpha)
    }
}

/// Stateful raster context over a [`Surface`]: a global compositing alpha plus
/// the two paint operations the effects engine needs.
#[derive(Clone, Debug)]
pub struct Painter {
    alpha: f32,
}

impl Default for Painter {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter {
    pub fn new() -> Self {
        Self { alpha: 1.0 }
    }

    /// The global compositing alpha, 0.0..=1.0. Starts at 1.0.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Sets the global alpha. Out-of-range or non-finite values are ignored
    /// and the previous alpha is kept.
    pub fn set_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.alpha = alpha;
        }
    }

    /// Composites the surface's current content over itself, shifted by
    /// `(dx, dy)` pixels, at the global alpha. Destination pixels whose
    /// shifted source falls outside the surface are left untouched.
    pub fn blend_self_shifted(&self, surface: &mut Surface, dx: i32, dy: i32) {
        if surface.is_empty() {
            return;
        }
        let w = i64::from(surface.width());
        let h = i64::from(surface.height());
        let snapshot = surface.data().to_vec();
        let data = surface.data_mut();

        for y in 0..h {
            for x in 0..w {
                let sx = x - i64::from(dx);
                let sy = y - i64::from(dy);
                if sx < 0 || sx >= w || sy < 0 || sy >= h {
                    continue;
                }
                let si = ((sy * w + sx) as usize) * 4;
                let di = ((y * w + x) as usize) * 4;
                let rgb = [snapshot[si], snapshot[si + 1], snapshot[si + 2]];
                let src_alpha = f32::from(snapshot[si + 3]) / 255.0 * self.alpha;
                source_over(&mut data[di..di + 4], rgb, src_alpha);
            }
        }
    }

    /// Fills the whole surface with a radial gradient via source-over.
    /// Pixels are sampled at their centers. A zero radius samples the final
    /// stop everywhere.
    pub fn fill_radial(&self, surface: &mut Surface, gradient: &RadialGradient) {
        if surface.is_empty() {
            return;
        }
        let w = surface.width();
        let h = surface.height();
        let center = gradient.center();
        let radius = gradient.radius();
        let data = surface.data_mut();

        for y in 0..h {
            for x in 0..w {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let t = if radius > 0.0 {
                    (p.distance(center) / radius).clamp(0.0, 1.0) as f32
                } else {
                    1.0
                };
                let (rgb, alpha) = gradient.sample(t);
                let di = ((y as usize) * (w as usize) + x as usize) * 4;
                source_over(&mut data[di..di + 4], rgb, alpha * self.alpha);
            }
        }
    }
}

/// Straight-alpha source-over of `(rgb, src_alpha)` onto one RGBA8 pixel.
fn source_over(dst: &mut [u8], rgb: [u8; 3], src_alpha: f32) {
    let sa = src_alpha.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst[3]) / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        dst[..4].fill(0);
        return;
    }
    for c in 0..3 {
        let oc = (f32::from(rgb[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / oa;
        dst[c] = round_channel(oc);
    }
    dst[3] = round_channel(oa * 255.0);
}

fn lerp_channel(a: u8, b: u8, f: f32) -> u8 {
    round_channel(f32::from(a) + (f32::from(b) - f32::from(a)) * f)
}

fn round_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_alpha_ignores_out_of_range() {
        let mut p = Painter::new();
        assert_eq!(p.alpha(), 1.0);
        p.set_alpha(0.5);
        assert_eq!(p.alpha(), 0.5);
        p.set_alpha(1.5);
        assert_eq!(p.alpha(), 0.5);
        p.set_alpha(-0.1);
        assert_eq!(p.alpha(), 0.5);
        p.set_alpha(f32::NAN);
        assert_eq!(p.alpha(), 0.5);
        p.set_alpha(0.0);
        assert_eq!(p.alpha(), 0.0);
    }

    #[test]
    fn source_over_half_blend_on_opaque() {
        let mut px = [0u8, 0, 0, 255];
        source_over(&mut px, [255, 255, 255], 0.5);
        assert_eq!(px, [128, 128, 128, 255]);
    }

    #[test]
    fn source_over_zero_alpha_is_identity() {
        let mut px = [9u8, 8, 7, 200];
        source_over(&mut px, [255, 255, 255], 0.0);
        assert_eq!(px, [9, 8, 7, 200]);
    }

    #[test]
    fn source_over_onto_transparent_takes_source() {
        let mut px = [0u8, 0, 0, 0];
        source_over(&mut px, [10, 20, 30], 1.0);
        assert_eq!(px, [10, 20, 30, 255]);

        let mut px = [0u8, 0, 0, 0];
        source_over(&mut px, [100, 100, 100], 0.5);
        // Straight alpha: color passes through, coverage is halved.
        assert_eq!(px, [100, 100, 100, 128]);
    }

    #[test]
    fn gradient_sample_clamps_and_lerps() {
        let g = RadialGradient::new(Point::new(0.0, 0.0), 10.0)
            .with_stop(0.2, [0, 0, 0], 0.0)
            .with_stop(0.8, [100, 200, 60], 1.0);
        assert_eq!(g.sample(0.0), ([0, 0, 0], 0.0));
        assert_eq!(g.sample(1.0), ([100, 200, 60], 1.0));
        let (color, alpha) = g.sample(0.5);
        assert_eq!(color, [50, 100, 30]);
        assert!((alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gradient_stops_stay_sorted() {
        let g = RadialGradient::new(Point::new(0.0, 0.0), 1.0)
            .with_stop(0.9, [3, 3, 3], 0.3)
            .with_stop(0.1, [1, 1, 1], 0.1)
            .with_stop(0.5, [2, 2, 2], 0.2);
        let offsets: Vec<f32> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.1, 0.5, 0.9]);
    }

    #[test]
    fn gradient_hard_stop_prefers_later() {
        let g = RadialGradient::new(Point::new(0.0, 0.0), 1.0)
            .with_stop(0.0, [0, 0, 0], 0.0)
            .with_stop(0.5, [10, 10, 10], 0.2)
            .with_stop(0.5, [200, 200, 200], 0.8)
            .with_stop(1.0, [255, 255, 255], 1.0);
        // Just past the shared offset the later ramp governs.
        let (color, _) = g.sample(0.5001);
        assert!(color[0] >= 200);
    }

    #[test]
    fn gradient_without_stops_is_transparent() {
        let g = RadialGradient::new(Point::new(0.0, 0.0), 5.0);
        assert_eq!(g.sample(0.5), ([0, 0, 0], 0.0));
    }

    #[test]
    fn blend_self_shifted_spreads_an_impulse() {
        let mut s = Surface::new(3, 1);
        s.fill([0, 0, 0, 255]);
        s.set_pixel(1, 0, [255, 255, 255, 255]);

        let mut p = Painter::new();
        p.set_alpha(0.5);
        p.blend_self_shifted(&mut s, 1, 0);

        // dest(x) <- src(x - 1) at 50%: the impulse leaks one pixel right.
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(1, 0), Some([128, 128, 128, 255]));
        assert_eq!(s.pixel(2, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn blend_self_shifted_leaves_uncovered_pixels() {
        let mut s = Surface::new(2, 1);
        s.fill([10, 10, 10, 255]);
        let p = Painter::new();
        // Shift farther than the surface is wide: nothing is covered.
        p.blend_self_shifted(&mut s, 5, 0);
        assert_eq!(s.pixel(0, 0), Some([10, 10, 10, 255]));
        assert_eq!(s.pixel(1, 0), Some([10, 10, 10, 255]));
    }

    #[test]
    fn blend_self_shifted_zero_offset_is_identity_on_opaque() {
        let mut s = Surface::new(2, 2);
        s.fill([40, 80, 120, 255]);
        s.set_pixel(0, 0, [200, 10, 10, 255]);
        let before = s.clone();
        let mut p = Painter::new();
        p.set_alpha(0.5);
        p.blend_self_shifted(&mut s, 0, 0);
        assert_eq!(s, before);
    }

    #[test]
    fn fill_radial_covers_whole_surface() {
        let mut s = Surface::new(2, 2);
        s.fill([0, 0, 0, 255]);
        let g = RadialGradient::new(Point::new(1.0, 1.0), 2.0)
            .with_stop(0.0, [255, 255, 255], 1.0)
            .with_stop(1.0, [255, 255, 255], 1.0);
        Painter::new().fill_radial(&mut s, &g);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(s.pixel(x, y), Some([255, 255, 255, 255]));
            }
        }
    }

    #[test]
    fn fill_radial_respects_global_alpha() {
        let mut s = Surface::new(1, 1);
        s.fill([0, 0, 0, 255]);
        let g = RadialGradient::new(Point::new(0.5, 0.5), 1.0)
            .with_stop(0.0, [255, 255, 255], 1.0)
            .with_stop(1.0, [255, 255, 255], 1.0);
        let mut p = Painter::new();
        p.set_alpha(0.5);
        p.fill_radial(&mut s, &g);
        assert_eq!(s.pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn empty_surface_paints_are_no_ops() {
        let mut s = Surface::new(0, 3);
        let g = RadialGradient::new(Point::new(0.0, 0.0), 1.0).with_stop(0.0, [1, 1, 1], 1.0);
        let p = Painter::new();
        p.fill_radial(&mut s, &g);
        p.blend_self_shifted(&mut s, 1, 0);
        assert!(s.data().is_empty());
    }
}
