//! Hover/selection transitions.
//!
//! Each body is in one of four phases. A transition interpolates scale and
//! lift from wherever the body currently is toward its target over a fixed
//! duration of scene time, and stops being updated once it reaches the end.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::components::body::{BodyInstance, BodySpec, Presentation, TransformOverride};
use crate::core::scene::BodySet;
use crate::extensions::easing::{lerp, Easing};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionTuning {
    /// Selected scale as a multiple of the body's base scale.
    pub scale_multiplier: f32,
    /// Pivot height while selected.
    pub lifted_offset: f32,
    /// Transition length in seconds.
    pub duration: f64,
    pub easing: Easing,
}

impl Default for SelectionTuning {
    fn default() -> Self {
        Self {
            scale_multiplier: 3.0,
            lifted_offset: 20.0,
            duration: 0.5,
            easing: Easing::QuadInOut,
        }
    }
}

impl SelectionTuning {
    pub fn selected(&self, spec: &BodySpec) -> Presentation {
        Presentation {
            scale: spec.base_scale * self.scale_multiplier,
            vertical_offset: self.lifted_offset,
        }
    }

    pub fn idle(&self, spec: &BodySpec) -> Presentation {
        Presentation::resting(spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    #[default]
    Idle,
    AnimatingToSelected,
    SelectedResting,
    AnimatingToIdle,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: Presentation,
    to: Presentation,
    started_at: f64,
}

/// Eased presentation `progress` of the way from `from` to `to`.
pub fn interpolate(from: Presentation, to: Presentation, progress: f32, easing: Easing) -> Presentation {
    let e = easing.apply(progress);
    Presentation {
        scale: lerp(from.scale, to.scale, e),
        vertical_offset: lerp(from.vertical_offset, to.vertical_offset, e),
    }
}

pub struct SelectionController {
    tuning: SelectionTuning,
    selected: Option<String>,
    phases: HashMap<String, SelectionPhase>,
    transitions: HashMap<String, Transition>,
}

impl SelectionController {
    pub fn new(tuning: SelectionTuning) -> Self {
        Self {
            tuning,
            selected: None,
            phases: HashMap::new(),
            transitions: HashMap::new(),
        }
    }

    pub fn tuning(&self) -> &SelectionTuning {
        &self.tuning
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn phase(&self, name: &str) -> SelectionPhase {
        self.phases.get(name).copied().unwrap_or_default()
    }

    /// Change the selected body. The previous body animates back to idle
    /// while the new one animates up, both from their current state.
    /// Bodies that haven't loaded yet are remembered and picked up by
    /// [`Self::on_body_added`].
    pub fn select(&mut self, name: Option<&str>, now: f64, bodies: &mut BodySet) {
        if self.selected.as_deref() == name {
            return;
        }
        if let Some(prev) = self.selected.take() {
            if let Some(body) = bodies.get_mut(&prev) {
                let to = self.tuning.idle(&body.spec);
                self.begin(body, to, SelectionPhase::AnimatingToIdle, now);
            }
        }
        self.selected = name.map(str::to_string);
        if let Some(next) = name {
            if let Some(body) = bodies.get_mut(next) {
                let to = self.tuning.selected(&body.spec);
                self.begin(body, to, SelectionPhase::AnimatingToSelected, now);
            }
        }
        log::debug!("selection -> {:?}", self.selected);
    }

    /// A body joined the scene. If it is the pending selection it starts
    /// animating up immediately.
    pub fn on_body_added(&mut self, body: &mut BodyInstance, now: f64) {
        if self.selected.as_deref() == Some(body.name()) {
            let to = self.tuning.selected(&body.spec);
            self.begin(body, to, SelectionPhase::AnimatingToSelected, now);
        }
    }

    fn begin(&mut self, body: &mut BodyInstance, to: Presentation, phase: SelectionPhase, now: f64) {
        let from = body.effective_presentation();
        body.transform_override = Some(TransformOverride {
            scale: from.scale,
            vertical_offset: from.vertical_offset,
            progress: 0.0,
        });
        self.phases.insert(body.name().to_string(), phase);
        self.transitions.insert(
            body.name().to_string(),
            Transition {
                from,
                to,
                started_at: now,
            },
        );
    }

    /// Advance every running transition to scene time `now`. Returns the
    /// bodies whose transition finished this call.
    pub fn update(&mut self, now: f64, bodies: &mut BodySet) -> Vec<String> {
        let duration = self.tuning.duration;
        let easing = self.tuning.easing;
        let mut settled = Vec::new();
        for (name, t) in &self.transitions {
            let Some(body) = bodies.get_mut(name) else {
                settled.push(name.clone());
                continue;
            };
            let progress = ((now - t.started_at) / duration).clamp(0.0, 1.0) as f32;
            if progress >= 1.0 {
                body.presentation = t.to;
                body.transform_override = None;
                settled.push(name.clone());
            } else {
                let p = interpolate(t.from, t.to, progress, easing);
                body.transform_override = Some(TransformOverride {
                    scale: p.scale,
                    vertical_offset: p.vertical_offset,
                    progress,
                });
            }
        }
        for name in &settled {
            self.transitions.remove(name);
            let rest = match self.phases.get(name) {
                Some(SelectionPhase::AnimatingToSelected) => SelectionPhase::SelectedResting,
                _ => SelectionPhase::Idle,
            };
            self.phases.insert(name.clone(), rest);
        }
        settled.sort();
        settled
    }

    pub fn is_animating(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub fn resting_selected_count(&self) -> usize {
        self.phases
            .values()
            .filter(|p| **p == SelectionPhase::SelectedResting)
            .count()
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.phases.clear();
        self.transitions.clear();
    }
}
