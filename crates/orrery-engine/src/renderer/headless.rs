use std::collections::BTreeMap;
use crate::api::error::SceneError;
use crate::api::types::ResourceId;
use crate::input::pointer::ViewportRect;
use super::camera::CameraUniform;
use super::instance::{NodeInstance, RenderBuffer};
use super::traits::{RenderBackend, ResourceKind};

/// Backend that draws nothing and records every call.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_id: u32,
    live: BTreeMap<ResourceId, (ResourceKind, String)>,
    released: Vec<ResourceId>,
    double_releases: u32,
    frames: u32,
    last_frame: Vec<NodeInstance>,
    viewport: Option<ViewportRect>,
    context_failure: Option<String>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose context can never be acquired.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            context_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn allocated_count(&self) -> u32 {
        self.next_id
    }

    pub fn released(&self) -> &[ResourceId] {
        &self.released
    }

    /// Releases of ids that were already freed or never allocated.
    pub fn double_releases(&self) -> u32 {
        self.double_releases
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn last_frame(&self) -> &[NodeInstance] {
        &self.last_frame
    }

    pub fn viewport(&self) -> Option<ViewportRect> {
        self.viewport
    }
}

impl RenderBackend for HeadlessRenderer {
    fn acquire_context(&mut self, viewport: ViewportRect) -> Result<(), SceneError> {
        if let Some(reason) = &self.context_failure {
            return Err(SceneError::RenderContextUnavailable(reason.clone()));
        }
        self.viewport = Some(viewport);
        Ok(())
    }

    fn allocate(&mut self, kind: ResourceKind, label: &str) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, (kind, label.to_string()));
        id
    }

    fn release(&mut self, id: ResourceId) {
        if self.live.remove(&id).is_some() {
            self.released.push(id);
        } else {
            self.double_releases += 1;
        }
    }

    fn resize(&mut self, width: f32, height: f32) {
        if let Some(v) = self.viewport.as_mut() {
            v.width = width;
            v.height = height;
        }
    }

    fn render(&mut self, frame: &RenderBuffer, _camera: &CameraUniform) -> Result<(), SceneError> {
        self.frames += 1;
        self.last_frame.clear();
        self.last_frame.extend_from_slice(&frame.instances);
        Ok(())
    }
}
