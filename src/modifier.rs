//! Additive modifier layers.
//!
//! A modifier stores one delta per keyframe and is applied at a scalar
//! strength without ever mutating the base path. Sketch modifiers perturb
//! anchors and spatial handles; graph modifiers perturb timing handles only.

use kurbo::{CubicBez, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bezier::{self, DELTA_EPSILON};
use crate::curves;
use crate::error::CoreError;
use crate::keyframe::Keyframe;
use crate::path_splitting;

/// Largest strength a modifier can be dialed up to.
pub const MAX_STRENGTH: f64 = 2.0;

/// Per-keyframe perturbation of a sketch modifier. Absent fields read as
/// zero vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SketchKeyframeDelta {
    pub position: Option<Vec2>,
    pub handle_in: Option<Vec2>,
    pub handle_out: Option<Vec2>,
}

/// Per-keyframe perturbation of a graph modifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphKeyframeDelta {
    pub handle_in: Option<Vec2>,
    pub handle_out: Option<Vec2>,
}

/// A named, strength-scaled layer of spatial deltas.
///
/// The delta list always has one entry per keyframe of the owning path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SketchModifier {
    pub id: Uuid,
    pub name: String,
    /// Scale applied to every delta, in [0, [`MAX_STRENGTH`]].
    pub strength: f64,
    pub deltas: Vec<SketchKeyframeDelta>,
}

/// A named, strength-scaled layer of timing-handle deltas.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphModifier {
    pub id: Uuid,
    pub name: String,
    pub strength: f64,
    pub deltas: Vec<GraphKeyframeDelta>,
}

/// Collapse a difference vector to absent when both components are within
/// the delta floor of zero.
fn difference(v: Vec2) -> Option<Vec2> {
    if v.x.abs() < DELTA_EPSILON && v.y.abs() < DELTA_EPSILON {
        None
    } else {
        Some(v)
    }
}

impl SketchModifier {
    /// Record `modified − original` as a new strength-1 layer.
    ///
    /// `selection` is a curve-index interval; keyframes outside it keep empty
    /// deltas. Positional change may not bleed across an interior selection
    /// boundary, so interior boundary keyframes keep handle deltas only.
    pub fn from_difference(
        name: impl Into<String>,
        original: &[Keyframe],
        modified: &[Keyframe],
        selection: Option<(usize, usize)>,
    ) -> Self {
        let count = original.len();
        if count == 0 {
            return Self {
                id: Uuid::new_v4(),
                name: name.into(),
                strength: 1.0,
                deltas: Vec::new(),
            };
        }
        let last = count - 1;
        let (first_keyframe, last_keyframe) = match selection {
            Some((start_curve, end_curve)) => (start_curve.min(last), (end_curve + 1).min(last)),
            None => (0, last),
        };

        let mut deltas = vec![SketchKeyframeDelta::default(); count];
        for i in first_keyframe..=last_keyframe {
            let Some(changed) = modified.get(i) else {
                break;
            };
            let base = &original[i];
            deltas[i] = SketchKeyframeDelta {
                position: difference(changed.position - base.position),
                handle_in: difference(changed.sketch_in_offset() - base.sketch_in_offset()),
                handle_out: difference(changed.sketch_out_offset() - base.sketch_out_offset()),
            };
        }

        if selection.is_some() {
            if first_keyframe > 0 {
                deltas[first_keyframe].position = None;
            }
            if last_keyframe < last {
                deltas[last_keyframe].position = None;
            }
        }

        log::debug!("sketch modifier created over keyframes {first_keyframe}..={last_keyframe}");
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            strength: 1.0,
            deltas,
        }
    }

    /// Strength is clamped into [0, [`MAX_STRENGTH`]].
    pub fn set_strength(&mut self, strength: f64) {
        self.strength = strength.clamp(0.0, MAX_STRENGTH);
    }

    /// Apply the raw (strength-1) deltas to a keyframe list.
    pub fn apply_to_keyframes(&self, keyframes: &[Keyframe]) -> Vec<Keyframe> {
        keyframes
            .iter()
            .enumerate()
            .map(|(i, keyframe)| {
                let mut keyframe = *keyframe;
                let Some(delta) = self.deltas.get(i) else {
                    return keyframe;
                };
                if let Some(offset) = delta.position {
                    keyframe.position += offset;
                }
                if let Some(offset) = delta.handle_in {
                    keyframe.sketch_in =
                        bezier::collapse_vector(keyframe.sketch_in_offset() + offset);
                }
                if let Some(offset) = delta.handle_out {
                    keyframe.sketch_out =
                        bezier::collapse_vector(keyframe.sketch_out_offset() + offset);
                }
                keyframe
            })
            .collect()
    }

    /// Mirror a segment split inside this layer so the modified curve keeps
    /// its shape through the split.
    pub(crate) fn propagate_split(
        &mut self,
        base: &[Keyframe],
        base_split: &[Keyframe],
        segment: usize,
        t: f64,
    ) -> Result<(), CoreError> {
        let modified = self.apply_to_keyframes(base);
        let modified_split = path_splitting::split_segment(&modified, segment, t)?;
        let s = segment;

        let mut deltas = self.deltas.clone();
        deltas.insert(s + 1, SketchKeyframeDelta::default());
        deltas[s] = SketchKeyframeDelta {
            position: None,
            handle_in: None,
            handle_out: difference(
                modified_split[s].sketch_out_offset() - base_split[s].sketch_out_offset(),
            ),
        };
        deltas[s + 1] = SketchKeyframeDelta {
            position: difference(modified_split[s + 1].position - base_split[s + 1].position),
            handle_in: difference(
                modified_split[s + 1].sketch_in_offset() - base_split[s + 1].sketch_in_offset(),
            ),
            handle_out: difference(
                modified_split[s + 1].sketch_out_offset() - base_split[s + 1].sketch_out_offset(),
            ),
        };
        deltas[s + 2] = SketchKeyframeDelta {
            position: None,
            handle_in: difference(
                modified_split[s + 2].sketch_in_offset() - base_split[s + 2].sketch_in_offset(),
            ),
            handle_out: None,
        };

        self.deltas = deltas;
        Ok(())
    }
}

impl GraphModifier {
    /// Record the timing-handle part of `modified − original` as a new
    /// strength-1 layer.
    pub fn from_difference(
        name: impl Into<String>,
        original: &[Keyframe],
        modified: &[Keyframe],
        selection: Option<(usize, usize)>,
    ) -> Self {
        let count = original.len();
        if count == 0 || modified.is_empty() {
            return Self {
                id: Uuid::new_v4(),
                name: name.into(),
                strength: 1.0,
                deltas: vec![GraphKeyframeDelta::default(); count],
            };
        }
        let last = count - 1;
        let (first_keyframe, last_keyframe) = match selection {
            Some((start_curve, end_curve)) => (start_curve.min(last), (end_curve + 1).min(last)),
            None => (0, last),
        };

        let original_handles = resolved_graph_handles(original);
        let modified_handles = resolved_graph_handles(modified);

        let mut deltas = vec![GraphKeyframeDelta::default(); count];
        for i in first_keyframe..=last_keyframe.min(modified.len() - 1) {
            deltas[i] = GraphKeyframeDelta {
                handle_in: difference(modified_handles[i].0 - original_handles[i].0),
                handle_out: difference(modified_handles[i].1 - original_handles[i].1),
            };
        }

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            strength: 1.0,
            deltas,
        }
    }

    /// Strength is clamped into [0, [`MAX_STRENGTH`]].
    pub fn set_strength(&mut self, strength: f64) {
        self.strength = strength.clamp(0.0, MAX_STRENGTH);
    }

    /// Apply the raw (strength-1) deltas to a keyframe list.
    ///
    /// Absent graph handles resolve to their natural defaults first so the
    /// deltas always land on explicit handles.
    pub fn apply_to_keyframes(&self, keyframes: &[Keyframe]) -> Vec<Keyframe> {
        let resolved = resolved_graph_handles(keyframes);
        let last = keyframes.len().saturating_sub(1);

        keyframes
            .iter()
            .enumerate()
            .map(|(i, keyframe)| {
                let mut keyframe = *keyframe;
                let Some(delta) = self.deltas.get(i) else {
                    return keyframe;
                };
                if i > 0 {
                    keyframe.graph_in = Some(resolved[i].0 + delta.handle_in.unwrap_or(Vec2::ZERO));
                }
                if i < last {
                    keyframe.graph_out =
                        Some(resolved[i].1 + delta.handle_out.unwrap_or(Vec2::ZERO));
                }
                keyframe
            })
            .collect()
    }

    /// Mirror a segment split inside this layer.
    pub(crate) fn propagate_split(
        &mut self,
        base: &[Keyframe],
        base_split: &[Keyframe],
        segment: usize,
        t: f64,
    ) -> Result<(), CoreError> {
        let modified = self.apply_to_keyframes(base);
        let modified_split = path_splitting::split_segment(&modified, segment, t)?;
        let s = segment;

        // Split keyframes around the seam always carry explicit timing
        // handles, so the unwraps below never see the natural default.
        fn graph_in(keyframes: &[Keyframe], i: usize) -> Vec2 {
            keyframes[i].graph_in.unwrap_or(Vec2::ZERO)
        }
        fn graph_out(keyframes: &[Keyframe], i: usize) -> Vec2 {
            keyframes[i].graph_out.unwrap_or(Vec2::ZERO)
        }

        let mut deltas = self.deltas.clone();
        deltas.insert(s + 1, GraphKeyframeDelta::default());
        deltas[s] = GraphKeyframeDelta {
            handle_in: None,
            handle_out: difference(graph_out(&modified_split, s) - graph_out(base_split, s)),
        };
        deltas[s + 1] = GraphKeyframeDelta {
            handle_in: difference(graph_in(&modified_split, s + 1) - graph_in(base_split, s + 1)),
            handle_out: difference(graph_out(&modified_split, s + 1) - graph_out(base_split, s + 1)),
        };
        deltas[s + 2] = GraphKeyframeDelta {
            handle_in: difference(graph_in(&modified_split, s + 2) - graph_in(base_split, s + 2)),
            handle_out: None,
        };

        self.deltas = deltas;
        Ok(())
    }
}

/// Explicit (in, out) graph handles for every keyframe, with absent handles
/// resolved to their natural one-third defaults.
fn resolved_graph_handles(keyframes: &[Keyframe]) -> Vec<(Vec2, Vec2)> {
    let sketch = curves::build_sketch_curves(keyframes);
    let progress = curves::keyframe_progress(keyframes, &sketch);
    let graph = curves::build_graph_curves(keyframes, &progress);

    (0..keyframes.len())
        .map(|i| {
            let handle_in = if i > 0 {
                graph[i - 1].p2 - graph[i - 1].p3
            } else {
                Vec2::ZERO
            };
            let handle_out = if i < graph.len() {
                graph[i].p1 - graph[i].p0
            } else {
                Vec2::ZERO
            };
            (handle_in, handle_out)
        })
        .collect()
}

/// Offset a sketch chain by every modifier at its strength.
///
/// Anchors move by the accumulated position deltas; each inner control moves
/// by its anchor's position delta plus its own handle delta.
pub fn apply_sketch_modifiers(curves: &[CubicBez], modifiers: &[SketchModifier]) -> Vec<CubicBez> {
    let keyframe_count = curves.len() + 1;
    let mut position = vec![Vec2::ZERO; keyframe_count];
    let mut handle_in = vec![Vec2::ZERO; keyframe_count];
    let mut handle_out = vec![Vec2::ZERO; keyframe_count];

    for modifier in modifiers {
        for (i, delta) in modifier.deltas.iter().take(keyframe_count).enumerate() {
            if let Some(offset) = delta.position {
                position[i] += offset * modifier.strength;
            }
            if let Some(offset) = delta.handle_in {
                handle_in[i] += offset * modifier.strength;
            }
            if let Some(offset) = delta.handle_out {
                handle_out[i] += offset * modifier.strength;
            }
        }
    }

    curves
        .iter()
        .enumerate()
        .map(|(i, curve)| {
            CubicBez::new(
                curve.p0 + position[i],
                curve.p1 + position[i] + handle_out[i],
                curve.p2 + position[i + 1] + handle_in[i + 1],
                curve.p3 + position[i + 1],
            )
        })
        .collect()
}

/// Offset a graph chain by every modifier at its strength. Only the inner
/// controls move; the anchors are pinned to their (time, progress) points.
pub fn apply_graph_modifiers(curves: &[CubicBez], modifiers: &[GraphModifier]) -> Vec<CubicBez> {
    let keyframe_count = curves.len() + 1;
    let mut handle_in = vec![Vec2::ZERO; keyframe_count];
    let mut handle_out = vec![Vec2::ZERO; keyframe_count];

    for modifier in modifiers {
        for (i, delta) in modifier.deltas.iter().take(keyframe_count).enumerate() {
            if let Some(offset) = delta.handle_in {
                handle_in[i] += offset * modifier.strength;
            }
            if let Some(offset) = delta.handle_out {
                handle_out[i] += offset * modifier.strength;
            }
        }
    }

    curves
        .iter()
        .enumerate()
        .map(|(i, curve)| {
            CubicBez::new(
                curve.p0,
                curve.p1 + handle_out[i],
                curve.p2 + handle_in[i + 1],
                curve.p3,
            )
        })
        .collect()
}
