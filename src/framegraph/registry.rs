
//! Transient and persistent resource registries: handle -> backing `VmaBuffer`/`VmaImage`.

use ash::vk;
use parking_lot::{RwLock, Mutex};

use std::collections::HashMap;

use crate::context::{VkDevice, VmaResourceDiscardable};
use crate::ci::vma::{VmaBuffer, VmaImage, VmaAllocationCI};
use crate::ci::image::ImageCI;
use crate::ci::buffer::BufferCI;
use crate::error::{VkResult, VkError};
use crate::framegraph::resource::{ResourceHandle, BufferDescriptor, TextureDescriptor};
use crate::framegraph::layout_tracker::ImageLayoutTracker;

/// An entry kept alive across frames: a history buffer, or any other long-lived resource.
pub struct PersistentEntry {
    pub buffer: Option<VmaBuffer>,
    pub image : Option<VmaImage>,
    pub layout_tracker: Option<ImageLayoutTracker>,
    /// set once a history buffer's creation frame has run.
    pub initialised: bool,
    /// the semaphore a future frame must wait on before reading this entry, set by `StoreResource`.
    pub store_wait_semaphore: Option<vk::Semaphore>,
}

/// `parking_lot::RwLock`-guarded map of resources that outlive a single frame.
pub struct PersistentRegistry {
    entries: RwLock<HashMap<ResourceHandle, PersistentEntry>>,
}

impl PersistentRegistry {

    pub fn new() -> PersistentRegistry {
        PersistentRegistry { entries: RwLock::new(HashMap::new()) }
    }

    pub fn resolve_buffer(&self, handle: ResourceHandle) -> vk::Buffer {

        let guard = self.entries.read();
        guard.get(&handle)
            .and_then(|entry| entry.buffer.as_ref())
            .map(|b| b.handle)
            .expect("persistent buffer handle resolved before allocation")
    }

    pub fn resolve_image(&self, handle: ResourceHandle) -> vk::Image {

        let guard = self.entries.read();
        guard.get(&handle)
            .and_then(|entry| entry.image.as_ref())
            .map(|i| i.handle)
            .expect("persistent image handle resolved before allocation")
    }

    pub fn is_initialised(&self, handle: ResourceHandle) -> bool {
        self.entries.read().get(&handle).map(|e| e.initialised).unwrap_or(false)
    }

    /// Allocate the backing buffer for a history buffer's creation frame, if not already present.
    pub fn allocate_buffer(&self, device: &VkDevice, handle: ResourceHandle, desc: &BufferDescriptor) -> VkResult<()> {

        let mut guard = self.entries.write();
        if guard.contains_key(&handle) {
            return Ok(());
        }

        let buffer = allocate_vma_buffer(device, desc)?;

        guard.insert(handle, PersistentEntry {
            buffer: Some(buffer),
            image: None,
            layout_tracker: None,
            initialised: false,
            store_wait_semaphore: None,
        });

        Ok(())
    }

    pub fn allocate_image(&self, device: &VkDevice, handle: ResourceHandle, desc: &TextureDescriptor) -> VkResult<()> {

        let mut guard = self.entries.write();
        if guard.contains_key(&handle) {
            return Ok(());
        }

        let image = allocate_vma_image(device, desc)?;
        let tracker = ImageLayoutTracker::new(format!("persistent[{}]", handle.index), desc.array_length, desc.mip_levels);

        guard.insert(handle, PersistentEntry {
            buffer: None,
            image: Some(image),
            layout_tracker: Some(tracker),
            initialised: false,
            store_wait_semaphore: None,
        });

        Ok(())
    }

    pub fn mark_initialised(&self, handle: ResourceHandle) {
        if let Some(entry) = self.entries.write().get_mut(&handle) {
            entry.initialised = true;
        }
    }

    pub fn with_layout_tracker<R>(&self, handle: ResourceHandle, f: impl FnOnce(&ImageLayoutTracker) -> R) -> R {
        let guard = self.entries.read();
        let entry = guard.get(&handle).expect("persistent image registered before layout query");
        f(entry.layout_tracker.as_ref().expect("persistent entry is a texture"))
    }

    pub fn replace_layout_tracker(&self, handle: ResourceHandle, tracker: ImageLayoutTracker) {
        if let Some(entry) = self.entries.write().get_mut(&handle) {
            entry.layout_tracker = Some(tracker);
        }
    }

    pub fn record_store(&self, handle: ResourceHandle, semaphore: vk::Semaphore) {
        if let Some(entry) = self.entries.write().get_mut(&handle) {
            entry.store_wait_semaphore = Some(semaphore);
        }
    }

    pub fn discard(&self, device: &VkDevice) {

        let mut guard = self.entries.write();
        let mut vma = device.vma.lock();

        for (_, entry) in guard.drain() {
            if let Some(buffer) = entry.buffer {
                let _ = buffer.discard_by(&mut vma);
            }
            if let Some(image) = entry.image {
                let _ = image.discard_by(&mut vma);
            }
        }
    }
}

/// `Free` entries are available for immediate reuse; `InFlight` entries are still referenced by
/// a submitted-but-not-yet-retired frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientState {
    Free,
    InFlight { frame: u64 },
}

struct TransientBuffer {
    buffer: VmaBuffer,
    state: TransientState,
}

struct TransientImage {
    image: VmaImage,
    tracker: ImageLayoutTracker,
    state: TransientState,
}

/// A short-critical-section guarded map of resources owned by exactly one in-flight frame.
///
/// `parking_lot::Mutex` plays the "spinlock" role this registry's concurrency policy calls for:
/// its uncontended fast path spins rather than parking the thread, and every critical section
/// here is a handful of hashmap operations.
pub struct TransientRegistry {
    state: Mutex<TransientInner>,
}

struct TransientInner {
    buffers: HashMap<ResourceHandle, TransientBuffer>,
    images : HashMap<ResourceHandle, TransientImage>,
}

impl TransientRegistry {

    pub fn new() -> TransientRegistry {
        TransientRegistry {
            state: Mutex::new(TransientInner { buffers: HashMap::new(), images: HashMap::new() }),
        }
    }

    pub fn resolve_buffer(&self, handle: ResourceHandle) -> vk::Buffer {
        self.state.lock().buffers.get(&handle).map(|b| b.buffer.handle)
            .expect("transient buffer handle resolved before materialisation")
    }

    pub fn resolve_image(&self, handle: ResourceHandle) -> vk::Image {
        self.state.lock().images.get(&handle).map(|i| i.image.handle)
            .expect("transient image handle resolved before materialisation")
    }

    pub fn materialise_buffer(&self, device: &VkDevice, handle: ResourceHandle, desc: &BufferDescriptor) -> VkResult<()> {

        let mut guard = self.state.lock();
        if guard.buffers.contains_key(&handle) {
            return Ok(());
        }

        let buffer = allocate_vma_buffer(device, desc)?;
        guard.buffers.insert(handle, TransientBuffer { buffer, state: TransientState::Free });
        Ok(())
    }

    pub fn materialise_image(&self, device: &VkDevice, handle: ResourceHandle, desc: &TextureDescriptor) -> VkResult<()> {

        let mut guard = self.state.lock();
        if guard.images.contains_key(&handle) {
            return Ok(());
        }

        let image = allocate_vma_image(device, desc)?;
        let tracker = ImageLayoutTracker::new(format!("transient[{}]", handle.index), desc.array_length, desc.mip_levels);
        guard.images.insert(handle, TransientImage { image, tracker, state: TransientState::Free });
        Ok(())
    }

    pub fn with_layout_tracker<R>(&self, handle: ResourceHandle, f: impl FnOnce(&ImageLayoutTracker) -> R) -> R {
        let guard = self.state.lock();
        let entry = guard.images.get(&handle).expect("transient image registered before layout query");
        f(&entry.tracker)
    }

    pub fn replace_layout_tracker(&self, handle: ResourceHandle, tracker: ImageLayoutTracker) {
        if let Some(entry) = self.state.lock().images.get_mut(&handle) {
            entry.tracker = tracker;
        }
    }

    /// Mark a resource as disposed at the end of the current frame; it becomes eligible for
    /// reclaiming once the frame's fence has signalled (see `prepare_frame`).
    pub fn dispose(&self, handle: ResourceHandle, frame: u64) {

        let mut guard = self.state.lock();
        if let Some(b) = guard.buffers.get_mut(&handle) {
            b.state = TransientState::InFlight { frame };
        }
        if let Some(i) = guard.images.get_mut(&handle) {
            i.state = TransientState::InFlight { frame };
        }
    }

    /// Called at the start of a new frame's compile: drop the backing allocation of every
    /// resource whose disposing frame has retired, then start the new frame's map empty.
    pub fn prepare_frame(&self, device: &VkDevice, retired_frame: u64) {

        let mut guard = self.state.lock();
        let mut vma = device.vma.lock();

        let expired_buffers: Vec<ResourceHandle> = guard.buffers.iter()
            .filter(|(_, entry)| is_retired(entry.state, retired_frame))
            .map(|(handle, _)| *handle)
            .collect();

        for handle in expired_buffers {
            if let Some(entry) = guard.buffers.remove(&handle) {
                let _ = entry.buffer.discard_by(&mut vma);
            }
        }

        let expired_images: Vec<ResourceHandle> = guard.images.iter()
            .filter(|(_, entry)| is_retired(entry.state, retired_frame))
            .map(|(handle, _)| *handle)
            .collect();

        for handle in expired_images {
            if let Some(entry) = guard.images.remove(&handle) {
                let _ = entry.image.discard_by(&mut vma);
            }
        }
    }

    pub fn discard(&self, device: &VkDevice) {

        let mut guard = self.state.lock();
        let mut vma = device.vma.lock();

        for (_, entry) in guard.buffers.drain() {
            let _ = entry.buffer.discard_by(&mut vma);
        }
        for (_, entry) in guard.images.drain() {
            let _ = entry.image.discard_by(&mut vma);
        }
    }
}

fn is_retired(state: TransientState, retired_frame: u64) -> bool {
    match state {
        | TransientState::InFlight { frame } => frame <= retired_frame,
        | TransientState::Free => false,
    }
}

fn allocate_vma_buffer(device: &VkDevice, desc: &BufferDescriptor) -> VkResult<VmaBuffer> {

    let buffer_ci = BufferCI::new(desc.length).usage(desc.usage_hint);
    let alloc_ci = VmaAllocationCI::new(vma::MemoryUsage::GpuOnly, vk::MemoryPropertyFlags::empty());

    let mut vma = device.vma.lock();
    let (handle, allocation, info) = vma.create_buffer(buffer_ci.as_ref(), &alloc_ci)
        .map_err(|e| VkError::from(crate::error::VkErrorKind::Vma(e)))?;

    Ok(VmaBuffer::from((handle, allocation, info)))
}

fn allocate_vma_image(device: &VkDevice, desc: &TextureDescriptor) -> VkResult<VmaImage> {

    let image_ci = ImageCI::new_2d(desc.format, vk::Extent2D { width: desc.width, height: desc.height })
        .usage(desc.usage_hint)
        .mip_levels(desc.mip_levels)
        .array_layers(desc.array_length)
        .samples(desc.sample_count);

    let alloc_ci = VmaAllocationCI::new(vma::MemoryUsage::GpuOnly, vk::MemoryPropertyFlags::empty());

    let mut vma = device.vma.lock();
    let (handle, allocation, info) = vma.create_image(image_ci.as_ref(), &alloc_ci)
        .map_err(|e| VkError::from(crate::error::VkErrorKind::Vma(e)))?;

    Ok(VmaImage::from((handle, allocation, info)))
}
