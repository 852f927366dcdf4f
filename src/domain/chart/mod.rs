//! Chart geometry: viewport, panel layout, scales and crosshair.

pub mod crosshair;
pub mod layout;
pub mod scales;
pub mod value_objects;
pub mod viewport;

pub use crosshair::{CrosshairState, TooltipContent, TooltipLine};
pub use layout::{LayoutConfig, PanelLayout, Rect};
pub use scales::{BandScale, LinearScale, OscillatorScale, ScaleCoordinator, ScaleOptions, ScaleSet};
pub use value_objects::*;
pub use viewport::{Viewport, ZoomLimits};
