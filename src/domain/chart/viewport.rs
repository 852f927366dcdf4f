use serde::{Deserialize, Serialize};

/// Zoom bounds; zoom factor is `len / span`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Never show fewer bars than this, whatever `max_zoom` allows
    pub min_visible_bars: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min_zoom: 1.0, max_zoom: 500.0, min_visible_bars: 5.0 }
    }
}

/// Visible window over a series of `len` bars.
///
/// `start` is fractional so zooming and panning stay continuous; the integer
/// range [`Viewport::range`] is derived and always lies within the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    start: f64,
    span: f64,
    len: usize,
    limits: ZoomLimits,
}

impl Viewport {
    /// Viewport showing the whole series
    pub fn new(len: usize, limits: ZoomLimits) -> Self {
        let mut vp = Self { start: 0.0, span: len as f64, len, limits };
        vp.clamp();
        vp
    }

    pub fn with_window(len: usize, start: f64, span: f64, limits: ZoomLimits) -> Self {
        let mut vp = Self { start, span, len, limits };
        vp.clamp();
        vp
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    /// Bars across the plot width
    pub fn span(&self) -> f64 {
        self.span
    }

    pub fn pan_offset(&self) -> f64 {
        self.start
    }

    pub fn zoom(&self) -> f64 {
        if self.span > 0.0 { self.len as f64 / self.span } else { 1.0 }
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    /// Inclusive index range of bars at least partly visible
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.len == 0 {
            return None;
        }
        let last = self.len - 1;
        let lo = (self.start.floor().max(0.0) as usize).min(last);
        let hi = ((self.start + self.span).ceil() as usize).saturating_sub(1).clamp(lo, last);
        Some((lo, hi))
    }

    pub fn visible_count(&self) -> usize {
        self.range().map_or(0, |(lo, hi)| hi - lo + 1)
    }

    /// Smallest and largest span the zoom bounds allow for the current length
    pub fn span_bounds(&self) -> (f64, f64) {
        let len = self.len as f64;
        if self.len == 0 {
            return (0.0, 0.0);
        }
        let max_span = (len / self.limits.min_zoom.max(1.0)).min(len);
        let min_span = (len / self.limits.max_zoom.max(1.0))
            .max(self.limits.min_visible_bars)
            .min(max_span);
        (min_span, max_span)
    }

    /// Zoom by `factor` (> 1 zooms in) around `anchor_ratio` of the plot width.
    ///
    /// The fractional bar under the anchor stays under it unless the window
    /// hits the end of the data.
    pub fn zoom_at(&mut self, factor: f64, anchor_ratio: f64) {
        if self.len == 0 || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let r = anchor_ratio.clamp(0.0, 1.0);
        let (min_span, max_span) = self.span_bounds();
        let anchor = self.start + r * self.span;
        let new_span = (self.span / factor).clamp(min_span, max_span);
        self.start = anchor - r * new_span;
        self.span = new_span;
        self.clamp();
    }

    /// Translate by a number of bars; positive moves towards newer data
    pub fn pan_bars(&mut self, delta: f64) {
        if delta.is_finite() {
            self.start += delta;
            self.clamp();
        }
    }

    /// Translate by a pointer drag of `dx` pixels over a plot `width` wide
    pub fn pan_pixels(&mut self, dx: f64, width: f64) {
        if width > 0.0 {
            self.pan_bars(-dx / width * self.span);
        }
    }

    /// Show exactly the inclusive index range `[lo, hi]`, within zoom bounds
    pub fn show_range(&mut self, lo: usize, hi: usize) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let (min_span, max_span) = self.span_bounds();
        let wanted = (hi - lo + 1) as f64;
        let span = wanted.clamp(min_span, max_span);
        self.start = lo as f64 - (span - wanted) / 2.0;
        self.span = span;
        self.clamp();
    }

    /// True when the right edge sits on the newest bar
    pub fn is_pinned_right(&self) -> bool {
        self.start + self.span >= self.len as f64 - 1e-6
    }

    /// Series length changed; optionally keep the window glued to the live edge
    pub fn resize_data(&mut self, len: usize, follow: bool) {
        let grew = len.saturating_sub(self.len) as f64;
        let was_empty = self.len == 0;
        self.len = len;
        if was_empty {
            self.start = 0.0;
            self.span = len as f64;
        } else if follow {
            self.start += grew;
        }
        self.clamp();
    }

    /// Linear blend of the window; `t` in `[0, 1]`
    pub fn lerp(&self, target: &Viewport, t: f64) -> Viewport {
        let t = t.clamp(0.0, 1.0);
        let mut vp = Viewport {
            start: self.start + (target.start - self.start) * t,
            span: self.span + (target.span - self.span) * t,
            len: target.len,
            limits: target.limits,
        };
        vp.clamp();
        vp
    }

    fn clamp(&mut self) {
        if self.len == 0 {
            self.start = 0.0;
            self.span = 0.0;
            return;
        }
        let (min_span, max_span) = self.span_bounds();
        let span = if self.span.is_finite() { self.span } else { max_span };
        self.span = span.clamp(min_span, max_span);
        let max_start = self.len as f64 - self.span;
        let start = if self.start.is_finite() { self.start } else { max_start };
        self.start = start.clamp(0.0, max_start);
    }
}
