
//! Per-frame orchestration: turns a pass's declared resource usages into a compiled, compacted
//! command stream, then submits it alongside the caller's recorded graphics commands.

use ash::vk;
use ash::version::DeviceV1_0;
use parking_lot::Mutex;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::context::{VkDevice, VkSubmitCI};
use crate::error::{VkResult, VkError};
use crate::command::{VkCmdRecorder, ITransfer, CmdTransferApi, IGraphics, CmdGraphicsApi};
use crate::ci::VkObjectBuildableCI;
use crate::ci::image::ImageViewCI;
use crate::ci::sync::FenceCI;
use crate::ci::device::SubmitCI;

use crate::framegraph::config::{FrameGraphConfig, DescriptorPoolConfig, SyncPoolConfig};
use crate::framegraph::resource::{ResourceHandle, ResourceKind, BufferDescriptor, TextureDescriptor};
use crate::framegraph::resource::usage::{ResourceUsage, CommandIndex};
use crate::framegraph::subresource::SubresourceMask;
use crate::framegraph::layout_tracker::ImageLayoutTracker;
use crate::framegraph::registry::{PersistentRegistry, TransientRegistry};
use crate::framegraph::resource_command::{self, ResourceCommand, ResourceCommandKind, EventId};
use crate::framegraph::compactor::{self, CompactedCommand};
use crate::framegraph::pools::{EventPool, SemaphorePool, DescriptorPoolChain};
use crate::framegraph::render_target::{RenderTargetPlanner, RenderTargetDescriptor, DrawRenderPassDescriptor, AttachmentDescriptor, ClearOp, load_store_ops};
use crate::framegraph::render_pass_builder::{self, AttachmentPlan, FusedRenderPass};

/// One pass's declaration of the resources it touches, supplied by the caller ahead of recording.
pub struct PassRecord {
    pub usages: Vec<ResourceUsage>,
    pub buffer_descriptors: HashMap<ResourceHandle, BufferDescriptor>,
    pub texture_descriptors: HashMap<ResourceHandle, TextureDescriptor>,
    pub window_handles: Vec<ResourceHandle>,
    /// draw passes to fuse into render passes, in recording order; empty for a frame with no
    /// graphics (e.g. a pure compute/transfer frame).
    pub draw_passes: Vec<DrawRenderPassDescriptor>,
    /// render area shared by every fused render pass this frame (the swapchain/target dimension).
    pub render_extent: vk::Extent2D,
}

impl PassRecord {
    pub fn new() -> PassRecord {
        PassRecord {
            usages: Vec::new(),
            buffer_descriptors: HashMap::new(),
            texture_descriptors: HashMap::new(),
            window_handles: Vec::new(),
            draw_passes: Vec::new(),
            render_extent: vk::Extent2D { width: 0, height: 0 },
        }
    }
}

/// Command buffers and the fence guarding them, handed to the background completion worker by
/// `submit_frame`; reclaimed once the fence signals (§1b "Command-buffer resource bag").
struct CommandBufferBag {
    fence: vk::Fence,
    frame: u64,
    command_buffers: Vec<vk::CommandBuffer>,
}

/// Blocks on each submitted frame's fence off the controlling thread, resets its command buffers
/// for reuse, destroys the fence, then reports the frame index back so `poll_completed_frames`
/// can retire pooled primitives and transient resources for it.
fn spawn_completion_worker(
    device: ash::Device,
    submit_rx: mpsc::Receiver<CommandBufferBag>,
    completed_tx: mpsc::Sender<u64>,
) -> thread::JoinHandle<()> {

    thread::spawn(move || {
        while let Ok(bag) = submit_rx.recv() {

            unsafe {
                let _ = device.wait_for_fences(&[bag.fence], true, crate::utils::time::VkTimeDuration::Infinite.into());
                for &command in &bag.command_buffers {
                    let _ = device.reset_command_buffer(command, vk::CommandBufferResetFlags::empty());
                }
                device.destroy_fence(bag.fence, None);
            }

            if completed_tx.send(bag.frame).is_err() {
                break;
            }
        }
    })
}

/// The outcome of compiling one frame: a sorted, compacted command stream ready to be replayed
/// around the caller's own draw/dispatch calls, keyed by the command index each entry precedes
/// or follows.
pub struct CompiledFrame {
    /// frame index assigned by `compile_frame`; pass back into `submit_frame` so the background
    /// completion worker retires this frame's pooled primitives once its fence signals.
    pub frame: u64,
    pub compacted: Vec<CompactedCommand>,
    pub materialise: Vec<ResourceCommand>,
    pub dispose: Vec<ResourceCommand>,
    /// fused render passes ready for `vkCmdBeginRenderPass`, in the order `draw_passes` were fused.
    /// owned by the executor's retire-frame teardown; the caller reads the handles but never
    /// calls `FusedRenderPass::discard` on these itself.
    pub render_passes: Vec<FusedRenderPass>,
}

/// Owns the registries, synchronisation pools, and frame counter that persist across frames;
/// compiles and submits one frame graph at a time.
pub struct FrameGraphExecutor {

    config: FrameGraphConfig,
    persistent: PersistentRegistry,
    transient: TransientRegistry,
    events: EventPool,
    semaphores: SemaphorePool,
    descriptors: DescriptorPoolChain,
    frame_counter: AtomicU64,
    completed_frame: AtomicU64,
    /// render passes/framebuffers/views awaiting destruction once their producing frame retires.
    render_pass_graveyard: Mutex<Vec<(u64, FusedRenderPass, Vec<vk::ImageView>)>>,
    /// hands submitted frames' fences off to the background completion worker.
    submit_tx: mpsc::Sender<CommandBufferBag>,
    /// frame indices the worker has confirmed complete, awaiting `retire_frame`.
    completed_rx: mpsc::Receiver<u64>,
    completion_worker: Option<thread::JoinHandle<()>>,
}

impl FrameGraphExecutor {

    pub fn new(device: &VkDevice, config: FrameGraphConfig, sync_config: SyncPoolConfig, descriptor_config: DescriptorPoolConfig) -> FrameGraphExecutor {

        let (submit_tx, submit_rx) = mpsc::channel();
        let (completed_tx, completed_rx) = mpsc::channel();
        let completion_worker = Some(spawn_completion_worker(device.logic.handle.clone(), submit_rx, completed_tx));

        FrameGraphExecutor {
            config,
            persistent: PersistentRegistry::new(),
            transient: TransientRegistry::new(),
            events: EventPool::new(sync_config),
            semaphores: SemaphorePool::new(sync_config),
            descriptors: DescriptorPoolChain::new(descriptor_config),
            frame_counter: AtomicU64::new(0),
            completed_frame: AtomicU64::new(0),
            render_pass_graveyard: Mutex::new(Vec::new()),
            submit_tx,
            completed_rx,
            completion_worker,
        }
    }

    /// Drains every frame the background completion worker has confirmed complete since the
    /// last call, retiring each in submission order. Call once per frame from the controlling
    /// thread (§5: compaction/recording/retire all run on one thread per queue).
    pub fn poll_completed_frames(&mut self, device: &VkDevice) {
        while let Ok(frame) = self.completed_rx.try_recv() {
            self.retire_frame(device, frame);
        }
    }

    /// Submits `command_buffers` to `queue`, waiting on `acquisition_wait` at
    /// `COLOR_ATTACHMENT_OUTPUT` and signalling `presentation_signal` on completion (§4.5 step 5),
    /// then hands the fence to the background worker instead of blocking on it here — the only
    /// blocking wait in this backend happens off the controlling thread (§5 "Suspension points").
    pub fn submit_frame(
        &mut self,
        device: &VkDevice,
        queue: vk::Queue,
        frame: u64,
        command_buffers: Vec<vk::CommandBuffer>,
        acquisition_wait: Option<vk::Semaphore>,
        presentation_signal: Option<vk::Semaphore>,
    ) -> VkResult<()> {

        let fence = unsafe {
            device.logic.handle.create_fence(FenceCI::new(false).as_ref(), None)
                .map_err(|_| VkError::create("Fence"))?
        };

        let mut submit = SubmitCI::new();
        for &command in &command_buffers {
            submit = submit.add_command(command);
        }
        if let Some(wait) = acquisition_wait {
            submit = submit.add_wait(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT, wait);
        }
        if let Some(signal) = presentation_signal {
            submit = submit.add_signal(signal);
        }

        submit.submit(device, queue, fence)?;

        self.submit_tx.send(CommandBufferBag { fence, frame, command_buffers })
            .map_err(|_| VkError::device("frame-completion worker has shut down"))?;

        Ok(())
    }

    pub fn current_frame(&self) -> u64 {
        self.frame_counter.load(Ordering::Acquire)
    }

    /// Drains resources whose disposing frame has completed on the device; call once a frame's
    /// fence has been waited on, from whatever thread owns fence-completion polling.
    pub fn retire_frame(&mut self, device: &VkDevice, completed_frame: u64) {

        self.completed_frame.store(completed_frame, Ordering::Release);
        self.transient.prepare_frame(device, completed_frame);
        self.events.retire(completed_frame);
        self.semaphores.retire(completed_frame);

        let mut graveyard = self.render_pass_graveyard.lock();
        let mut i = 0;
        while i < graveyard.len() {
            if graveyard[i].0 <= completed_frame {
                let (_, fused, views) = graveyard.remove(i);
                for view in views {
                    unsafe { device.logic.handle.destroy_image_view(view, None); }
                }
                fused.discard(device);
            } else {
                i += 1;
            }
        }
    }

    /// Compile one frame's resource-command stream: materialise backing memory for every
    /// transient/first-use-persistent resource, recompute layout timelines, generate and compact
    /// the dependency stream.
    pub fn compile_frame(&mut self, device: &VkDevice, pass: &PassRecord) -> VkResult<CompiledFrame> {

        let frame = self.frame_counter.fetch_add(1, Ordering::AcqRel);

        let mut usages_by_resource: HashMap<ResourceHandle, Vec<ResourceUsage>> = HashMap::new();
        for usage in &pass.usages {
            usages_by_resource.entry(usage.resource).or_insert_with(Vec::new).push(usage.clone());
        }

        let mut layout_trackers: HashMap<ResourceHandle, ImageLayoutTracker> = HashMap::new();
        let mut full_masks: HashMap<ResourceHandle, SubresourceMask> = HashMap::new();

        for (&handle, usages) in usages_by_resource.iter() {

            if handle.kind != ResourceKind::Texture {
                continue;
            }

            let is_history_frame = handle.is_history_buffer() && !self.persistent.is_initialised(handle);

            if let Some(desc) = pass.texture_descriptors.get(&handle) {

                if handle.is_persistent() {
                    self.persistent.allocate_image(device, handle, desc)?;
                } else {
                    self.transient.materialise_image(device, handle, desc)?;
                }

                full_masks.insert(handle, SubresourceMask::full(desc.array_length, desc.mip_levels));

                let mut tracker = if handle.is_persistent() {
                    self.persistent.with_layout_tracker(handle, |t| t.clone())
                } else {
                    self.transient.with_layout_tracker(handle, |t| t.clone())
                };

                let preserve = handle.is_persistent() && !is_history_frame;
                tracker.recompute_for_frame(usages, preserve, desc.is_depth_stencil());

                if handle.is_persistent() {
                    self.persistent.replace_layout_tracker(handle, tracker.clone());
                    self.persistent.mark_initialised(handle);
                } else {
                    self.transient.replace_layout_tracker(handle, tracker.clone());
                }

                layout_trackers.insert(handle, tracker);
            }
        }

        for (&handle, desc) in pass.buffer_descriptors.iter() {
            if handle.is_persistent() {
                self.persistent.allocate_buffer(device, handle, desc)?;
            } else {
                self.transient.materialise_buffer(device, handle, desc)?;
            }
        }

        let render_passes = self.compile_render_passes(device, pass, &layout_trackers, frame)?;

        let is_depth_stencil = |handle: ResourceHandle| {
            pass.texture_descriptors.get(&handle).map(|d| d.is_depth_stencil()).unwrap_or(false)
        };
        let persistent_modified = |handle: ResourceHandle| {
            handle.is_persistent() && usages_by_resource.get(&handle).map(|u| u.iter().any(|x| x.usage_type.is_write())).unwrap_or(false)
        };
        let history_creation_frame = |handle: ResourceHandle| {
            handle.is_history_buffer() && self.persistent.is_initialised(handle)
        };

        let raw_commands = resource_command::generate_all(
            &usages_by_resource, &layout_trackers, &full_masks,
            is_depth_stencil, persistent_modified, history_creation_frame,
        );

        let materialise: Vec<ResourceCommand> = raw_commands.iter().cloned()
            .filter(|c| match &c.kind {
                | ResourceCommandKind::MaterialiseBuffer | ResourceCommandKind::MaterialiseTexture { .. } => true,
                | _ => false,
            })
            .collect();

        let dispose: Vec<ResourceCommand> = raw_commands.iter().cloned()
            .filter(|c| c.kind.is_dispose())
            .collect();

        for command in &dispose {
            self.transient.dispose(command.resource, frame);
        }

        let compacted = compactor::compact(&raw_commands);

        Ok(CompiledFrame { frame, compacted, materialise, dispose, render_passes })
    }

    /// Fuse `pass.draw_passes` into Vulkan render passes and build their framebuffers, binding
    /// the concrete image views the layout tracker just recomputed for this frame.
    fn compile_render_passes(
        &self,
        device: &VkDevice,
        pass: &PassRecord,
        layout_trackers: &HashMap<ResourceHandle, ImageLayoutTracker>,
        frame: u64,
    ) -> VkResult<Vec<FusedRenderPass>> {

        if pass.draw_passes.is_empty() {
            return Ok(Vec::new());
        }

        let mut planner = RenderTargetPlanner::new();
        for draw_pass in pass.draw_passes.clone() {
            planner.push_draw_pass(draw_pass);
        }
        let descriptors = planner.finish();

        let mut built = Vec::with_capacity(descriptors.len());

        for descriptor in &descriptors {

            let mut plans = Vec::with_capacity(descriptor.colour_attachments.len() + 1);

            for (slot, attachment) in descriptor.colour_attachments.iter().enumerate() {
                let attachment = attachment.as_ref()
                    .expect("every render-pass colour slot must be bound by at least one fused draw pass");
                let window = descriptor.attachment_usage_window[slot];
                plans.push(self.attachment_plan(device, pass, layout_trackers, attachment, window)?);
            }

            if let Some(attachment) = &descriptor.depth_attachment {
                let slot = descriptor.colour_attachments.len();
                let window = descriptor.attachment_usage_window[slot];
                plans.push(self.attachment_plan(device, pass, layout_trackers, attachment, window)?);
            }

            let views: Vec<vk::ImageView> = plans.iter().map(|p| p.view).collect();
            let fused = render_pass_builder::build(device, descriptor, &plans, pass.render_extent)?;

            self.render_pass_graveyard.lock().push((frame, FusedRenderPass {
                render_pass: fused.render_pass,
                framebuffer: fused.framebuffer,
                extent: fused.extent,
                clear_values: fused.clear_values.clone(),
            }, views));

            built.push(fused);
        }

        Ok(built)
    }

    fn attachment_plan(
        &self,
        device: &VkDevice,
        pass: &PassRecord,
        layout_trackers: &HashMap<ResourceHandle, ImageLayoutTracker>,
        attachment: &AttachmentDescriptor,
        usage_window: (Option<CommandIndex>, Option<CommandIndex>),
    ) -> VkResult<AttachmentPlan> {

        let desc = pass.texture_descriptors.get(&attachment.texture)
            .expect("attachment texture must carry a descriptor");
        let tracker = layout_trackers.get(&attachment.texture)
            .expect("attachment texture must have a recomputed layout tracker");

        let mask = SubresourceMask::single(desc.array_length, desc.mip_levels, attachment.slice, attachment.level);
        let is_window = pass.window_handles.contains(&attachment.texture);

        let (initial_layout, final_layout) = tracker.render_pass_layouts(usage_window.0, usage_window.1, &mask, is_window);

        let (load_op, store_op) = load_store_ops(
            attachment.clear_op == ClearOp::Clear,
            usage_window.0.is_some(),
            attachment.fully_overwrites,
            usage_window.1.is_some(),
            attachment.texture.is_persistent(),
        );

        let image = if attachment.texture.is_persistent() {
            self.persistent.resolve_image(attachment.texture)
        } else {
            self.transient.resolve_image(attachment.texture)
        };

        let aspect_mask = if desc.is_depth_stencil() {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::COLOR
        };

        let view = ImageViewCI::new(image, vk::ImageViewType::TYPE_2D, desc.format)
            .subrange(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: attachment.level,
                level_count: 1,
                base_array_layer: attachment.slice,
                layer_count: 1,
            })
            .build(device)?;

        let clear_value = if desc.is_depth_stencil() {
            vk::ClearValue { depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 } }
        } else {
            vk::ClearValue { color: vk::ClearColorValue { float32: [0.0, 0.0, 0.0, 0.0] } }
        };

        Ok(AttachmentPlan {
            view,
            format: desc.format,
            samples: desc.sample_count,
            load_op, store_op,
            initial_layout, final_layout,
            clear_value,
        })
    }

    /// Replay a compiled frame's compacted commands into `recorder`, bracketing whatever user
    /// draw/dispatch calls the caller interleaves by command index (the caller is expected to
    /// have already recorded up to each barrier/event's `command_index`). `pass` supplies the
    /// texture descriptors needed to resolve each barrier's correct aspect mask.
    pub fn record_compacted(&mut self, device: &VkDevice, recorder: &VkCmdRecorder<ITransfer>, pass: &PassRecord, compiled: &CompiledFrame) -> VkResult<()> {

        let frame = self.current_frame();

        // maps each dependency's `SignalEvent` to the pool event it was actually signalled on,
        // so the matching `WaitForEvents` waits on that same event instead of an unrelated one.
        let mut signalled: HashMap<EventId, vk::Event> = HashMap::new();

        for command in &compiled.compacted {
            match command {

                | CompactedCommand::PipelineBarrier { src_stages, dst_stages, dependency_flags, barriers, .. } => {

                    let mut image_barriers = Vec::new();
                    let mut buffer_barriers = Vec::new();

                    for barrier in barriers {
                        push_barrier(&self.persistent, &self.transient, &pass.texture_descriptors, barrier, &mut buffer_barriers, &mut image_barriers);
                    }

                    recorder.pipeline_barrier(*src_stages, *dst_stages, *dependency_flags, &buffer_barriers, &image_barriers);
                },

                | CompactedCommand::SignalEvent { after_stages, barrier, event_id, .. } => {
                    let event = self.events.acquire(device, frame)?;
                    let _ = barrier;
                    signalled.insert(*event_id, event);
                    recorder.set_event(event, *after_stages);
                },

                | CompactedCommand::WaitForEvents { src_stages, dst_stages, barriers, event_ids, .. } => {

                    let mut image_barriers = Vec::new();
                    let mut buffer_barriers = Vec::new();

                    for barrier in barriers {
                        push_barrier(&self.persistent, &self.transient, &pass.texture_descriptors, barrier, &mut buffer_barriers, &mut image_barriers);
                    }

                    let events: Vec<vk::Event> = event_ids.iter()
                        .map(|id| signalled.get(id).copied().ok_or_else(|| VkError::device("WaitForEvents references unsignalled event")))
                        .collect::<VkResult<Vec<_>>>()?;

                    recorder.wait_events(&events, *src_stages, *dst_stages, &buffer_barriers, &image_barriers);
                },
            }
        }

        Ok(())
    }

    pub fn allocate_descriptor_sets(&mut self, device: &VkDevice, layouts: &[vk::DescriptorSetLayout]) -> VkResult<Vec<vk::DescriptorSet>> {
        self.descriptors.allocate(device, layouts)
    }

    pub fn resolve_buffer(&self, handle: ResourceHandle) -> vk::Buffer {
        if handle.is_persistent() { self.persistent.resolve_buffer(handle) } else { self.transient.resolve_buffer(handle) }
    }

    pub fn resolve_image(&self, handle: ResourceHandle) -> vk::Image {
        if handle.is_persistent() { self.persistent.resolve_image(handle) } else { self.transient.resolve_image(handle) }
    }

    /// Begin one fused render pass produced by `compile_frame`; the caller records its subpasses'
    /// draws between this, any `next_subpass` calls on `recorder`, and a matching `end_render_pass`.
    pub fn begin_render_pass(&self, recorder: &VkCmdRecorder<IGraphics>, fused: &FusedRenderPass) {

        use crate::ci::pipeline::RenderPassBI;

        let bi = RenderPassBI::new(fused.render_pass, fused.framebuffer)
            .render_extent(fused.extent)
            .clear_values(&fused.clear_values);

        recorder.begin_render_pass(bi);
    }

    pub fn discard(&mut self, device: &VkDevice) {

        // dropping the sender unblocks the worker's `recv()` loop; every frame submitted before
        // this point must already have been drained by `poll_completed_frames` by the caller.
        let (dead_tx, _) = mpsc::channel();
        if let Some(worker) = std::mem::replace(&mut self.completion_worker, None) {
            self.submit_tx = dead_tx;
            let _ = worker.join();
        }

        self.persistent.discard(device);
        self.transient.discard(device);
        self.events.destroy(device);
        self.semaphores.destroy(device);
        self.descriptors.destroy(device);

        let mut graveyard = self.render_pass_graveyard.lock();
        for (_, fused, views) in graveyard.drain(..) {
            for view in views {
                unsafe { device.logic.handle.destroy_image_view(view, None); }
            }
            fused.discard(device);
        }
    }
}

fn push_barrier(
    persistent: &PersistentRegistry,
    transient: &TransientRegistry,
    texture_descriptors: &HashMap<ResourceHandle, TextureDescriptor>,
    barrier: &crate::framegraph::resource_command::BarrierInfo,
    buffer_barriers: &mut Vec<vk::BufferMemoryBarrier>,
    image_barriers: &mut Vec<vk::ImageMemoryBarrier>,
) {
    let resolve_buffer = |h: ResourceHandle| if h.is_persistent() { persistent.resolve_buffer(h) } else { transient.resolve_buffer(h) };
    let resolve_image = |h: ResourceHandle| if h.is_persistent() { persistent.resolve_image(h) } else { transient.resolve_image(h) };

    if let Some((old_layout, new_layout, mask)) = &barrier.image_transition {

        let image = resolve_image(barrier.resource);
        let aspect_mask = texture_descriptors.get(&barrier.resource)
            .map(|desc| desc.all_aspects())
            .unwrap_or(vk::ImageAspectFlags::COLOR);

        for range in mask.iterate_ranges(aspect_mask) {
            image_barriers.push(vk::ImageMemoryBarrier {
                s_type: vk::StructureType::IMAGE_MEMORY_BARRIER,
                p_next: std::ptr::null(),
                src_access_mask: barrier.src_access,
                dst_access_mask: barrier.dst_access,
                old_layout: *old_layout,
                new_layout: *new_layout,
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                image,
                subresource_range: range,
            });
        }
    } else if let Some((offset, size)) = barrier.buffer_range {

        let buffer = resolve_buffer(barrier.resource);

        buffer_barriers.push(vk::BufferMemoryBarrier {
            s_type: vk::StructureType::BUFFER_MEMORY_BARRIER,
            p_next: std::ptr::null(),
            src_access_mask: barrier.src_access,
            dst_access_mask: barrier.dst_access,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer,
            offset,
            size,
        });
    }
}
