//! Retained scene kept in a `hecs` world: one entity per primitive key, with
//! an optional tween component while it enters, moves or exits.

use crate::application::render_pipeline::{Primitive, PrimitiveKey, RetainedOp, RetainedSurface, Shape};
use crate::domain::chart::{Point, Rect};
use crate::domain::logging::LogComponent;
use crate::log_trace;
use hecs::{Entity, World};
use std::collections::HashMap;

const COMPONENT: LogComponent = LogComponent::Infrastructure("RetainedScene");

/// Current geometry of a retained primitive
#[derive(Debug, Clone)]
pub struct PrimitiveComponent(pub Primitive);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenKind {
    Enter,
    Update,
    Exit,
}

/// Animation in flight for one entity
#[derive(Debug, Clone)]
pub struct Tween {
    pub kind: TweenKind,
    /// Shape the update animates away from
    pub from: Option<Shape>,
    pub started_ms: f64,
    pub duration_ms: f64,
}

impl Tween {
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

/// Snapshot of one primitive at the scene clock
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrimitive {
    pub shape: Shape,
    pub opacity: f64,
}

#[derive(Default)]
pub struct RetainedScene {
    world: World,
    index: HashMap<PrimitiveKey, Entity>,
    now_ms: f64,
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &PrimitiveKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Entities with a tween still running
    pub fn animating(&self) -> usize {
        self.world.query::<&Tween>().iter().count()
    }

    /// Move the scene clock; finished exits are despawned and finished tweens dropped
    pub fn advance(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        let mut finished = Vec::new();
        let mut exited = Vec::new();
        for (entity, (primitive, tween)) in self.world.query::<(&PrimitiveComponent, &Tween)>().iter() {
            if tween.progress(now_ms) >= 1.0 {
                if tween.kind == TweenKind::Exit {
                    exited.push((entity, primitive.0.key.clone()));
                } else {
                    finished.push(entity);
                }
            }
        }
        for entity in finished {
            let _ = self.world.remove_one::<Tween>(entity);
        }
        for (entity, key) in exited {
            let _ = self.world.despawn(entity);
            self.index.remove(&key);
        }
    }

    /// Geometry and opacity of `key` at the scene clock
    pub fn rendered(&self, key: &PrimitiveKey) -> Option<RenderedPrimitive> {
        let entity = *self.index.get(key)?;
        let primitive = self.world.get::<&PrimitiveComponent>(entity).ok()?;
        let tween = self.world.get::<&Tween>(entity).ok();
        Some(self.sample(&primitive.0, tween.as_deref()))
    }

    /// Every primitive back to front
    pub fn snapshot(&self) -> Vec<(PrimitiveKey, RenderedPrimitive)> {
        let mut out: Vec<_> = self
            .world
            .query::<(&PrimitiveComponent, Option<&Tween>)>()
            .iter()
            .map(|(_, (primitive, tween))| (primitive.0.key.clone(), self.sample(&primitive.0, tween)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn sample(&self, primitive: &Primitive, tween: Option<&Tween>) -> RenderedPrimitive {
        let Some(tween) = tween else {
            return RenderedPrimitive { shape: primitive.shape.clone(), opacity: 1.0 };
        };
        let t = tween.progress(self.now_ms);
        match tween.kind {
            TweenKind::Enter => RenderedPrimitive { shape: primitive.shape.clone(), opacity: t },
            TweenKind::Exit => RenderedPrimitive { shape: primitive.shape.clone(), opacity: 1.0 - t },
            TweenKind::Update => {
                let shape = match &tween.from {
                    Some(from) => lerp_shape(from, &primitive.shape, t),
                    None => primitive.shape.clone(),
                };
                RenderedPrimitive { shape, opacity: 1.0 }
            }
        }
    }

    fn tween(&self, kind: TweenKind, from: Option<Shape>, duration_ms: f64) -> Tween {
        Tween { kind, from, started_ms: self.now_ms, duration_ms }
    }

    fn enter(&mut self, primitive: &Primitive, duration_ms: f64) {
        let tween = self.tween(TweenKind::Enter, None, duration_ms);
        if let Some(&entity) = self.index.get(&primitive.key) {
            // Re-entering while an exit was still fading out
            let _ = self.world.insert(entity, (PrimitiveComponent(primitive.clone()), tween));
            return;
        }
        let entity = self.world.spawn((PrimitiveComponent(primitive.clone()), tween));
        self.index.insert(primitive.key.clone(), entity);
    }

    fn update(&mut self, primitive: &Primitive, duration_ms: f64) {
        let Some(&entity) = self.index.get(&primitive.key) else {
            self.enter(primitive, duration_ms);
            return;
        };
        let from = self.rendered(&primitive.key).map(|r| r.shape);
        let tween = self.tween(TweenKind::Update, from, duration_ms);
        let _ = self.world.insert(entity, (PrimitiveComponent(primitive.clone()), tween));
    }

    fn exit(&mut self, key: &PrimitiveKey, duration_ms: f64) {
        let Some(&entity) = self.index.get(key) else {
            return;
        };
        let tween = self.tween(TweenKind::Exit, None, duration_ms);
        let _ = self.world.insert_one(entity, tween);
    }
}

impl RetainedSurface for RetainedScene {
    fn apply(&mut self, op: &RetainedOp) {
        log_trace!(COMPONENT, "apply {:?}", op.key());
        match op {
            RetainedOp::Enter { primitive, duration_ms } => self.enter(primitive, *duration_ms),
            RetainedOp::Update { primitive, duration_ms } => self.update(primitive, *duration_ms),
            RetainedOp::Exit { key, duration_ms } => self.exit(key, *duration_ms),
        }
    }

    fn clear_retained(&mut self) {
        self.world.clear();
        self.index.clear();
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

fn lerp_rect(a: &Rect, b: &Rect, t: f64) -> Rect {
    Rect::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.width, b.width, t), lerp(a.height, b.height, t))
}

/// Geometry interpolation between two shapes of the same kind; anything else snaps
fn lerp_shape(from: &Shape, to: &Shape, t: f64) -> Shape {
    match (from, to) {
        (
            Shape::Candle { x: x0, body: b0, wick_top: t0, wick_bottom: w0, .. },
            Shape::Candle { x, body, wick_top, wick_bottom, color },
        ) => Shape::Candle {
            x: lerp(*x0, *x, t),
            body: lerp_rect(b0, body, t),
            wick_top: lerp(*t0, *wick_top, t),
            wick_bottom: lerp(*w0, *wick_bottom, t),
            color: *color,
        },
        (Shape::Rect { rect: r0, .. }, Shape::Rect { rect, color }) => {
            Shape::Rect { rect: lerp_rect(r0, rect, t), color: *color }
        }
        (Shape::Segment { from: f0, to: t0, .. }, Shape::Segment { from: f, to: to_p, color, width, dashed }) => {
            Shape::Segment {
                from: lerp_point(*f0, *f, t),
                to: lerp_point(*t0, *to_p, t),
                color: *color,
                width: *width,
                dashed: *dashed,
            }
        }
        (Shape::Polyline { points: p0, .. }, Shape::Polyline { points, color, width }) if p0.len() == points.len() => {
            Shape::Polyline {
                points: p0.iter().zip(points).map(|(a, b)| lerp_point(*a, *b, t)).collect(),
                color: *color,
                width: *width,
            }
        }
        _ => to.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render_pipeline::{Layer, PrimitiveId};
    use crate::domain::chart::Color;

    fn bar(ts: u64, height: f64) -> Primitive {
        Primitive::new(
            Layer::Volume,
            PrimitiveId::Bar(ts),
            Shape::Rect { rect: Rect::new(0.0, 0.0, 2.0, height), color: Color::WHITE },
        )
    }

    #[test]
    fn enter_fades_in_and_settles() {
        let mut scene = RetainedScene::new();
        scene.apply(&RetainedOp::Enter { primitive: bar(1, 10.0), duration_ms: 100.0 });
        scene.advance(50.0);
        let key = bar(1, 10.0).key;
        assert!((scene.rendered(&key).unwrap().opacity - 0.5).abs() < 1e-9);
        scene.advance(100.0);
        assert_eq!(scene.animating(), 0);
        assert_eq!(scene.rendered(&key).unwrap().opacity, 1.0);
    }

    #[test]
    fn update_interpolates_geometry() {
        let mut scene = RetainedScene::new();
        scene.apply(&RetainedOp::Enter { primitive: bar(1, 10.0), duration_ms: 0.0 });
        scene.advance(0.0);
        scene.apply(&RetainedOp::Update { primitive: bar(1, 20.0), duration_ms: 100.0 });
        scene.advance(50.0);
        let Shape::Rect { rect, .. } = scene.rendered(&bar(1, 0.0).key).unwrap().shape else {
            panic!("expected rect");
        };
        assert!((rect.height - 15.0).abs() < 1e-9);
    }

    #[test]
    fn exit_despawns_after_duration() {
        let mut scene = RetainedScene::new();
        scene.apply(&RetainedOp::Enter { primitive: bar(1, 10.0), duration_ms: 0.0 });
        scene.apply(&RetainedOp::Exit { key: bar(1, 0.0).key, duration_ms: 100.0 });
        scene.advance(40.0);
        assert_eq!(scene.len(), 1);
        scene.advance(100.0);
        assert!(scene.is_empty());
    }
}
