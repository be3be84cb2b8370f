use bytemuck::{Pod, Zeroable};

/// Per-node draw record read by the host renderer through a raw pointer.
/// 8 words of metadata followed by a column-major world matrix: 96 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct NodeInstance {
    /// Scene-graph node index.
    pub node: u32,
    /// Geometry resource bound to this node, or [`NodeInstance::NO_RESOURCE`].
    pub geometry: u32,
    /// Material resource bound to this node, or [`NodeInstance::NO_RESOURCE`].
    pub material: u32,
    /// One of the `KIND_*` constants.
    pub kind: u32,
    /// 1 when the node and all its ancestors are visible.
    pub visible: u32,
    /// Higher values draw later.
    pub render_order: u32,
    pub _pad: [u32; 2],
    pub world: [f32; 16],
}

impl NodeInstance {
    pub const WORDS: usize = 24;
    pub const STRIDE_BYTES: usize = Self::WORDS * 4;
    pub const NO_RESOURCE: u32 = u32::MAX;

    pub const KIND_MESH: u32 = 1;
    pub const KIND_POINTS: u32 = 2;
    pub const KIND_LINE: u32 = 3;
    pub const KIND_LIGHT: u32 = 4;
}

impl Default for NodeInstance {
    fn default() -> Self {
        Self {
            node: 0,
            geometry: Self::NO_RESOURCE,
            material: Self::NO_RESOURCE,
            kind: 0,
            visible: 1,
            render_order: 0,
            _pad: [0; 2],
            world: glam::Mat4::IDENTITY.to_cols_array(),
        }
    }
}

/// Instances for one frame, sorted by render order (stable within a level).
pub struct RenderBuffer {
    pub instances: Vec<NodeInstance>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(64),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: NodeInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw pointer to instance data for host-side reads.
    pub fn instances_ptr(&self) -> *const u32 {
        self.instances.as_ptr() as *const u32
    }

    pub fn find_node(&self, node: u32) -> Option<&NodeInstance> {
        self.instances.iter().find(|i| i.node == node)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
