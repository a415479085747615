
//! From each resource's ordered sequence of active usages, emits all materialise/dispose/
//! synchronisation commands.

use ash::vk;
use std::collections::HashMap;

use crate::vkbytes;
use crate::framegraph::resource::{ResourceHandle, ResourceKind, ActiveRange};
use crate::framegraph::resource::usage::{ResourceUsage, CommandIndex};
use crate::framegraph::subresource::SubresourceMask;
use crate::framegraph::layout_tracker::ImageLayoutTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrder {
    Before,
    After,
}

#[derive(Debug, Clone)]
pub struct BarrierInfo {
    pub resource: ResourceHandle,
    pub src_stage : vk::PipelineStageFlags,
    pub dst_stage : vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    /// set for textures requiring a layout transition; `None` for buffers and no-op-layout images.
    pub image_transition: Option<(vk::ImageLayout, vk::ImageLayout, SubresourceMask)>,
    /// set for buffers; `None` for textures (textures barrier the whole subresource mask instead).
    pub buffer_range: Option<(vkbytes, vkbytes)>,
}

/// Correlates one `SignalEvent` with the `WaitForEvent` it unblocks; unique within a frame's
/// command stream since `sequence` is the dependency's position in its resource's usage window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId {
    pub resource: ResourceHandle,
    pub sequence: u32,
}

#[derive(Debug, Clone)]
pub enum ResourceCommandKind {
    MaterialiseBuffer,
    MaterialiseTexture { initial_barrier: Option<BarrierInfo> },
    DisposeBuffer,
    DisposeTexture,
    SignalEvent { stages: vk::PipelineStageFlags, event_id: EventId },
    WaitForEvent { barrier: BarrierInfo, event_id: EventId },
    SignalSemaphore { stages: vk::PipelineStageFlags },
    WaitForSemaphore { stages: vk::PipelineStageFlags },
    PipelineBarrier { barrier: BarrierInfo },
    /// residency no-op on Vulkan; kept only to mirror the source data model's closed enumeration.
    UseResource,
}

impl ResourceCommandKind {

    fn is_materialise(&self) -> bool {
        match self {
            | ResourceCommandKind::MaterialiseBuffer | ResourceCommandKind::MaterialiseTexture { .. } => true,
            | _ => false,
        }
    }

    pub fn is_dispose(&self) -> bool {
        match self {
            | ResourceCommandKind::DisposeBuffer | ResourceCommandKind::DisposeTexture => true,
            | _ => false,
        }
    }

    pub fn is_signal_event(&self) -> bool {
        match self {
            | ResourceCommandKind::SignalEvent { .. } => true,
            | _ => false,
        }
    }

    pub fn is_wait_event(&self) -> bool {
        match self {
            | ResourceCommandKind::WaitForEvent { .. } => true,
            | _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceCommand {
    pub command_index: CommandIndex,
    pub order: CommandOrder,
    pub resource: ResourceHandle,
    pub kind: ResourceCommandKind,
}

fn access_and_stage(usage: &ResourceUsage, is_depth_stencil: bool) -> (vk::AccessFlags, vk::PipelineStageFlags) {
    (usage.usage_type.access_mask(is_depth_stencil), usage.usage_type.stage_mask(is_depth_stencil, usage.render_stages))
}

fn active_mask(range: &ActiveRange, full: &SubresourceMask) -> SubresourceMask {
    match range {
        | ActiveRange::Texture(mask) => mask.clone(),
        | _ => full.clone(),
    }
}

/// Strategy chosen for a dependency between two adjacent usages of the same resource.
enum Strategy {
    /// both usages are inside the same fused render pass; handled by the planner's subpass
    /// dependency table, optionally with an intra-subpass self-dependency barrier.
    SubpassDependency { intra_subpass: bool },
    CrossQueueFamily,
    CrossEncoderSameQueue,
    LayoutOnlyBarrier,
}

fn choose_strategy(prev: &ResourceUsage, next: &ResourceUsage, layout_changed: bool) -> Strategy {

    if let (Some(prev_rp), Some(next_rp)) = (prev.render_pass_instance, next.render_pass_instance) {
        if prev_rp == next_rp {
            return Strategy::SubpassDependency { intra_subpass: prev.owning_pass == next.owning_pass };
        }
    }

    if prev.queue_family != next.queue_family {
        return Strategy::CrossQueueFamily;
    }

    if prev.encoder_id != next.encoder_id {
        return Strategy::CrossEncoderSameQueue;
    }

    // same encoder: a write-involved dependency still needs an intra-encoder barrier since this
    // function is only called when prev/next warrant a dependency at all (see generate_for_resource).
    let _ = layout_changed;
    Strategy::LayoutOnlyBarrier
}

/// Generate all resource commands for one resource given its ordered active usages (the caller
/// has already filtered out `unusedArgumentBuffer`/`unusedRenderTarget`/cpu-only usages) and,
/// for textures, the layout tracker recomputed for this frame.
pub fn generate_for_resource(
    handle: ResourceHandle,
    usages: &[ResourceUsage],
    layout_tracker: Option<&ImageLayoutTracker>,
    full_mask: Option<&SubresourceMask>,
    is_depth_stencil: bool,
    is_persistent_modified: bool,
    is_history_creation_frame: bool,
) -> Vec<ResourceCommand> {

    let mut commands = Vec::new();

    if usages.is_empty() {
        return commands;
    }

    let first = &usages[0];
    let materialise_kind = match handle.kind {
        | ResourceKind::Buffer => ResourceCommandKind::MaterialiseBuffer,
        | ResourceKind::Texture => {
            let initial_barrier = layout_tracker.zip(full_mask).map(|(tracker, full)| {
                let mask = active_mask(&first.active_range, full);
                let (initial, _, _) = tracker.frame_initial_layout(&mask);
                BarrierInfo {
                    resource: handle,
                    src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                    dst_stage: access_and_stage(first, is_depth_stencil).1,
                    src_access: vk::AccessFlags::empty(),
                    dst_access: access_and_stage(first, is_depth_stencil).0,
                    image_transition: Some((initial, tracker.layout(first.command_range.start, &mask), mask)),
                    buffer_range: None,
                }
            });
            ResourceCommandKind::MaterialiseTexture { initial_barrier }
        },
    };

    if !handle.is_persistent() {
        commands.push(ResourceCommand {
            command_index: first.command_range.start,
            order: CommandOrder::Before,
            resource: handle,
            kind: materialise_kind,
        });
    }

    for (window_index, window) in usages.windows(2).enumerate() {

        let (prev, next) = (&window[0], &window[1]);

        let render_target_mismatch = prev.usage_type.is_render_target() && next.usage_type.is_render_target()
            && prev.usage_type != next.usage_type;

        if !(prev.usage_type.is_write() || next.usage_type.is_write() || render_target_mismatch) {
            continue;
        }

        let (src_access, src_stage) = access_and_stage(prev, is_depth_stencil);
        let (dst_access, dst_stage) = access_and_stage(next, is_depth_stencil);

        let (image_transition, layout_changed) = match (handle.kind, layout_tracker, full_mask) {
            | (ResourceKind::Texture, Some(tracker), Some(full)) => {
                let mask = active_mask(&next.active_range, full);
                let prev_layout = tracker.layout(prev.command_range.start, &mask);
                let next_layout = tracker.layout(next.command_range.start, &mask);
                (Some((prev_layout, next_layout, mask)), prev_layout != next_layout)
            },
            | _ => (None, false),
        };

        let barrier = BarrierInfo {
            resource: handle,
            src_stage, dst_stage, src_access, dst_access,
            image_transition,
            buffer_range: match handle.kind {
                | ResourceKind::Buffer => Some((0, vk::WHOLE_SIZE)),
                | ResourceKind::Texture => None,
            },
        };

        match choose_strategy(prev, next, layout_changed) {

            | Strategy::SubpassDependency { intra_subpass: false } => {
                // the planner already folded this into its subpass-dependency table; nothing to emit here.
            },

            | Strategy::SubpassDependency { intra_subpass: true } => {
                // same subpass reading back its own output (a forced-GENERAL attachment, per the
                // planner): the VkSubpassDependency table records the self-dependency, but Vulkan
                // still requires an explicit vkCmdPipelineBarrier recorded inside the subpass —
                // the one exception the render-pass-interior invariant allows.
                commands.push(ResourceCommand {
                    command_index: next.command_range.start,
                    order: CommandOrder::Before,
                    resource: handle,
                    kind: ResourceCommandKind::PipelineBarrier { barrier },
                });
            },

            | Strategy::CrossQueueFamily => {

                commands.push(ResourceCommand {
                    command_index: prev.command_range.end - 1,
                    order: CommandOrder::After,
                    resource: handle,
                    kind: ResourceCommandKind::SignalSemaphore { stages: src_stage },
                });

                commands.push(ResourceCommand {
                    command_index: next.command_range.start,
                    order: CommandOrder::Before,
                    resource: handle,
                    kind: ResourceCommandKind::WaitForSemaphore { stages: dst_stage },
                });

                if handle.kind == ResourceKind::Texture && layout_changed {
                    commands.push(ResourceCommand {
                        command_index: next.command_range.start,
                        order: CommandOrder::Before,
                        resource: handle,
                        kind: ResourceCommandKind::PipelineBarrier { barrier: barrier.clone() },
                    });
                }
            },

            | Strategy::CrossEncoderSameQueue => {

                let event_id = EventId { resource: handle, sequence: window_index as u32 };

                commands.push(ResourceCommand {
                    command_index: prev.command_range.end - 1,
                    order: CommandOrder::After,
                    resource: handle,
                    kind: ResourceCommandKind::SignalEvent { stages: src_stage, event_id },
                });

                commands.push(ResourceCommand {
                    command_index: next.command_range.start,
                    order: CommandOrder::Before,
                    resource: handle,
                    kind: ResourceCommandKind::WaitForEvent { barrier, event_id },
                });
            },

            | Strategy::LayoutOnlyBarrier => {

                commands.push(ResourceCommand {
                    command_index: next.command_range.start,
                    order: CommandOrder::Before,
                    resource: handle,
                    kind: ResourceCommandKind::PipelineBarrier { barrier },
                });
            },
        }
    }

    let last = usages.last().unwrap();

    if !handle.is_persistent() {
        if !is_history_creation_frame {
            let dispose_kind = match handle.kind {
                | ResourceKind::Buffer => ResourceCommandKind::DisposeBuffer,
                | ResourceKind::Texture => ResourceCommandKind::DisposeTexture,
            };
            commands.push(ResourceCommand {
                command_index: last.command_range.end,
                order: CommandOrder::After,
                resource: handle,
                kind: dispose_kind,
            });
        }
    } else if is_persistent_modified {
        commands.push(ResourceCommand {
            command_index: last.command_range.end,
            order: CommandOrder::After,
            resource: handle,
            kind: ResourceCommandKind::SignalSemaphore { stages: access_and_stage(last, is_depth_stencil).1 },
        });
    }

    commands
}

/// Stable sort by (command-index ascending, order {before<after}, materialise-first-within-tie).
pub fn sort_commands(commands: &mut Vec<ResourceCommand>) {

    commands.sort_by(|a, b| {
        a.command_index.cmp(&b.command_index)
            .then_with(|| order_rank(a.order).cmp(&order_rank(b.order)))
            .then_with(|| materialise_rank(&a.kind).cmp(&materialise_rank(&b.kind)))
    });
}

fn order_rank(order: CommandOrder) -> u8 {
    match order {
        | CommandOrder::Before => 0,
        | CommandOrder::After  => 1,
    }
}

fn materialise_rank(kind: &ResourceCommandKind) -> u8 {
    if kind.is_materialise() { 0 } else { 1 }
}

/// Generate and sort commands across every resource's usage list in one pass.
pub fn generate_all(
    usages_by_resource: &HashMap<ResourceHandle, Vec<ResourceUsage>>,
    layout_trackers: &HashMap<ResourceHandle, ImageLayoutTracker>,
    full_masks: &HashMap<ResourceHandle, SubresourceMask>,
    is_depth_stencil: impl Fn(ResourceHandle) -> bool,
    persistent_modified: impl Fn(ResourceHandle) -> bool,
    history_creation_frame: impl Fn(ResourceHandle) -> bool,
) -> Vec<ResourceCommand> {

    let mut all = Vec::new();

    for (&handle, usages) in usages_by_resource {

        let tracker = layout_trackers.get(&handle);
        let full = full_masks.get(&handle);

        let mut commands = generate_for_resource(
            handle, usages, tracker, full,
            is_depth_stencil(handle), persistent_modified(handle), history_creation_frame(handle),
        );

        all.append(&mut commands);
    }

    sort_commands(&mut all);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framegraph::resource::usage::{CommandRange, UsageType};

    fn usage(handle: ResourceHandle, usage_type: UsageType, start: i64, end: i64, encoder: u32) -> ResourceUsage {
        ResourceUsage {
            resource: handle,
            usage_type,
            render_stages: vk::PipelineStageFlags::FRAGMENT_SHADER,
            command_range: CommandRange { start, end },
            active_range: ActiveRange::FullResource,
            owning_pass: 0,
            queue_family: 0,
            encoder_id: encoder,
            render_pass_instance: None,
        }
    }

    #[test]
    fn single_blit_materialises_and_disposes() {

        let handle = ResourceHandle::transient_texture(0);
        let usages = vec![usage(handle, UsageType::BlitDestination, 0, 1, 0)];

        let mut tracker = ImageLayoutTracker::new("t", 1, 1);
        tracker.recompute_for_frame(&usages, false, false);
        let full = SubresourceMask::full(1, 1);

        let commands = generate_for_resource(handle, &usages, Some(&tracker), Some(&full), false, false, false);

        assert!(commands.iter().any(|c| c.kind.is_materialise()));
        assert!(commands.iter().any(|c| c.kind.is_dispose()));
        assert!(!commands.iter().any(|c| c.kind.is_signal_event()));
    }

    #[test]
    fn cross_encoder_write_emits_event_pair() {

        let handle = ResourceHandle::transient_buffer(0);
        let usages = vec![
            usage(handle, UsageType::Write, 0, 3, 0),
            usage(handle, UsageType::Read, 3, 6, 1),
        ];

        let commands = generate_for_resource(handle, &usages, None, None, false, false, false);

        let signals = commands.iter().filter(|c| c.kind.is_signal_event()).count();
        let waits   = commands.iter().filter(|c| c.kind.is_wait_event()).count();
        assert_eq!(signals, 1);
        assert_eq!(waits, 1);
    }
}
