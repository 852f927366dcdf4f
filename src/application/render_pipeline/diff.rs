use super::primitives::{Primitive, PrimitiveKey};
use serde::Serialize;
use std::collections::BTreeMap;

/// One change to the retained scene
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum RetainedOp {
    Enter { primitive: Primitive, duration_ms: f64 },
    Update { primitive: Primitive, duration_ms: f64 },
    Exit { key: PrimitiveKey, duration_ms: f64 },
}

impl RetainedOp {
    pub fn key(&self) -> &PrimitiveKey {
        match self {
            Self::Enter { primitive, .. } | Self::Update { primitive, .. } => &primitive.key,
            Self::Exit { key, .. } => key,
        }
    }
}

/// Ops turning `previous` into `next`; identical primitives produce nothing
pub fn diff(
    previous: &BTreeMap<PrimitiveKey, Primitive>,
    next: &[Primitive],
    duration_ms: f64,
) -> Vec<RetainedOp> {
    let mut ops = Vec::new();
    for primitive in next {
        match previous.get(&primitive.key) {
            None => ops.push(RetainedOp::Enter { primitive: primitive.clone(), duration_ms }),
            Some(old) if old != primitive => {
                ops.push(RetainedOp::Update { primitive: primitive.clone(), duration_ms })
            }
            Some(_) => {}
        }
    }

    let live: std::collections::BTreeSet<&PrimitiveKey> = next.iter().map(|p| &p.key).collect();
    ops.extend(
        previous
            .keys()
            .filter(|key| !live.contains(key))
            .map(|key| RetainedOp::Exit { key: key.clone(), duration_ms }),
    );
    ops
}
