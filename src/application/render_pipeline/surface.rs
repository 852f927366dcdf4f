use super::diff::RetainedOp;
use super::primitives::Primitive;
use crate::domain::chart::SurfaceSize;

/// Clear-and-redraw drawing, used in bulk mode
pub trait ImmediateSurface {
    fn clear(&mut self, size: SurfaceSize);
    fn draw(&mut self, primitive: &Primitive);
}

/// Keyed primitives with animated enter/update/exit, used in diffed mode
pub trait RetainedSurface {
    fn apply(&mut self, op: &RetainedOp);
    /// Drop every retained primitive without animation
    fn clear_retained(&mut self);
}

/// Drawing backend offering both capability sets
pub trait RenderTarget {
    fn immediate(&mut self) -> &mut dyn ImmediateSurface;
    fn retained(&mut self) -> &mut dyn RetainedSurface;

    /// Called once per frame after all ops were issued
    fn present(&mut self) {}
}
