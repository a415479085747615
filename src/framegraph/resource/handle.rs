
use bitflags::bitflags;

/// Whether a handle's backing storage is a buffer or a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
}

bitflags! {
    /// Per-handle traits that affect lifecycle and registry placement.
    pub struct HandleFlags: u8 {
        /// survives across frames; lives in the persistent registry.
        const PERSISTENT     = 0b0001;
        /// a persistent resource whose first frame creates it; reads before that are invalid.
        const HISTORY_BUFFER = 0b0010;
        /// backs a swapchain image; materialisation is deferred to first render-pass use.
        const WINDOW_HANDLE  = 0b0100;
        /// the backing memory has been written by at least one completed frame.
        const INITIALISED    = 0b1000;
    }
}

/// An opaque identifier for a frame-graph resource.
///
/// Handles are stable within a frame; persistent handles (`HandleFlags::PERSISTENT` set) are
/// additionally stable across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub flags: HandleFlags,
    pub index: u32,
}

impl ResourceHandle {

    pub fn transient_buffer(index: u32) -> ResourceHandle {
        ResourceHandle { kind: ResourceKind::Buffer, flags: HandleFlags::empty(), index }
    }

    pub fn transient_texture(index: u32) -> ResourceHandle {
        ResourceHandle { kind: ResourceKind::Texture, flags: HandleFlags::empty(), index }
    }

    pub fn persistent(kind: ResourceKind, index: u32, is_history: bool) -> ResourceHandle {

        let mut flags = HandleFlags::PERSISTENT;
        if is_history {
            flags |= HandleFlags::HISTORY_BUFFER;
        }

        ResourceHandle { kind, flags, index }
    }

    pub fn window_handle(index: u32) -> ResourceHandle {
        ResourceHandle { kind: ResourceKind::Texture, flags: HandleFlags::WINDOW_HANDLE, index }
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.flags.contains(HandleFlags::PERSISTENT)
    }

    #[inline]
    pub fn is_history_buffer(&self) -> bool {
        self.flags.contains(HandleFlags::HISTORY_BUFFER)
    }

    #[inline]
    pub fn is_window_handle(&self) -> bool {
        self.flags.contains(HandleFlags::WINDOW_HANDLE)
    }
}
