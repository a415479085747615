
//! Collapses the raw per-resource dependency stream into the minimum number of Vulkan calls.

use ash::vk;

use crate::framegraph::resource::usage::CommandIndex;
use crate::framegraph::resource_command::{ResourceCommand, ResourceCommandKind, CommandOrder, BarrierInfo, EventId};

/// A bit-exact description of one Vulkan synchronisation call.
#[derive(Debug, Clone)]
pub enum CompactedCommand {
    SignalEvent {
        command_index: CommandIndex,
        after_stages: vk::PipelineStageFlags,
        barrier: BarrierInfo,
        event_id: EventId,
    },
    WaitForEvents {
        command_index: CommandIndex,
        src_stages: vk::PipelineStageFlags,
        dst_stages: vk::PipelineStageFlags,
        barriers: Vec<BarrierInfo>,
        /// parallel to `barriers`: the `event_id` of the `SignalEvent` that unblocks each one.
        event_ids: Vec<EventId>,
    },
    PipelineBarrier {
        command_index: CommandIndex,
        src_stages: vk::PipelineStageFlags,
        dst_stages: vk::PipelineStageFlags,
        dependency_flags: vk::DependencyFlags,
        barriers: Vec<BarrierInfo>,
    },
}

struct PendingBarrier {
    command_index: CommandIndex,
    src_stages: vk::PipelineStageFlags,
    dst_stages: vk::PipelineStageFlags,
    barriers: Vec<BarrierInfo>,
}

/// Run the two-phase compaction algorithm over an already-sorted resource-command stream
/// (sorted by `resource_command::sort_commands`).
///
/// Events are passed through as independent `(signal, wait)` command descriptors — each
/// generator-level `SignalEvent`/`WaitForEvent` pair already corresponds to exactly one
/// dependency (the generator only emits one per producer/consumer pair), so no further
/// transitive reduction is needed here. `WaitForEvent`s sharing a command index are merged into
/// a single `WaitForEvents` call; adjacent `PipelineBarrier`s are batched until the next
/// command's index reaches the pending batch's, then flushed as one `vkCmdPipelineBarrier`.
pub fn compact(commands: &[ResourceCommand]) -> Vec<CompactedCommand> {

    let mut out = Vec::new();
    let mut pending: Option<PendingBarrier> = None;
    let mut pending_wait: Option<(CommandIndex, vk::PipelineStageFlags, vk::PipelineStageFlags, Vec<BarrierInfo>, Vec<EventId>)> = None;

    let flush_barrier = |pending: &mut Option<PendingBarrier>, out: &mut Vec<CompactedCommand>| {
        if let Some(batch) = pending.take() {
            out.push(CompactedCommand::PipelineBarrier {
                command_index: batch.command_index,
                src_stages: batch.src_stages,
                dst_stages: batch.dst_stages,
                dependency_flags: vk::DependencyFlags::empty(),
                barriers: batch.barriers,
            });
        }
    };

    let flush_wait = |pending_wait: &mut Option<(CommandIndex, vk::PipelineStageFlags, vk::PipelineStageFlags, Vec<BarrierInfo>, Vec<EventId>)>, out: &mut Vec<CompactedCommand>| {
        if let Some((index, src, dst, barriers, event_ids)) = pending_wait.take() {
            out.push(CompactedCommand::WaitForEvents {
                command_index: index,
                src_stages: src,
                dst_stages: dst,
                barriers,
                event_ids,
            });
        }
    };

    for command in commands {

        match &command.kind {

            | ResourceCommandKind::SignalEvent { stages, event_id } => {

                flush_wait(&mut pending_wait, &mut out);

                out.push(CompactedCommand::SignalEvent {
                    command_index: command.command_index,
                    after_stages: *stages,
                    barrier: BarrierInfo {
                        resource: command.resource,
                        src_stage: *stages,
                        dst_stage: vk::PipelineStageFlags::empty(),
                        src_access: vk::AccessFlags::empty(),
                        dst_access: vk::AccessFlags::empty(),
                        image_transition: None,
                        buffer_range: None,
                    },
                    event_id: *event_id,
                });
            },

            | ResourceCommandKind::WaitForEvent { barrier, event_id } => {

                match &mut pending_wait {
                    | Some((index, src, dst, barriers, event_ids)) if *index == command.command_index => {
                        *src = *src | barrier.src_stage;
                        *dst = *dst | barrier.dst_stage;
                        barriers.push(barrier.clone());
                        event_ids.push(*event_id);
                    },
                    | _ => {
                        flush_wait(&mut pending_wait, &mut out);
                        pending_wait = Some((command.command_index, barrier.src_stage, barrier.dst_stage, vec![barrier.clone()], vec![*event_id]));
                    },
                }
            },

            | ResourceCommandKind::PipelineBarrier { barrier } => {

                flush_wait(&mut pending_wait, &mut out);

                let should_flush = match &pending {
                    | Some(batch) => command.command_index >= batch.command_index && !barrier_overlaps_pending(batch, barrier),
                    | None => false,
                };

                if should_flush {
                    flush_barrier(&mut pending, &mut out);
                }

                match &mut pending {
                    | Some(batch) => {
                        batch.src_stages = batch.src_stages | barrier.src_stage;
                        batch.dst_stages = batch.dst_stages | barrier.dst_stage;
                        batch.barriers.push(barrier.clone());
                    },
                    | None => {
                        pending = Some(PendingBarrier {
                            command_index: command.command_index,
                            src_stages: barrier.src_stage,
                            dst_stages: barrier.dst_stage,
                            barriers: vec![barrier.clone()],
                        });
                    },
                }
            },

            | ResourceCommandKind::MaterialiseBuffer
            | ResourceCommandKind::MaterialiseTexture { .. }
            | ResourceCommandKind::DisposeBuffer
            | ResourceCommandKind::DisposeTexture
            | ResourceCommandKind::SignalSemaphore { .. }
            | ResourceCommandKind::WaitForSemaphore { .. }
            | ResourceCommandKind::UseResource => {
                // materialise/dispose/semaphore commands are consumed directly by the executor
                // and the registry; they carry no further compaction here.
                if let ResourceCommandKind::MaterialiseTexture { initial_barrier: Some(barrier) } = &command.kind {
                    flush_wait(&mut pending_wait, &mut out);
                    flush_barrier(&mut pending, &mut out);
                    out.push(CompactedCommand::PipelineBarrier {
                        command_index: command.command_index,
                        src_stages: barrier.src_stage,
                        dst_stages: barrier.dst_stage,
                        dependency_flags: vk::DependencyFlags::empty(),
                        barriers: vec![barrier.clone()],
                    });
                }
            },
        }

        // keep the two pending batches mutually exclusive in program order: anything that isn't
        // a barrier/wait command forces both batches closed, since it may depend on them.
        match &command.kind {
            | ResourceCommandKind::PipelineBarrier { .. } | ResourceCommandKind::WaitForEvent { .. } => {},
            | _ => {
                flush_wait(&mut pending_wait, &mut out);
                flush_barrier(&mut pending, &mut out);
            },
        }

        let _ = command.order;
    }

    flush_wait(&mut pending_wait, &mut out);
    flush_barrier(&mut pending, &mut out);

    out
}

fn barrier_overlaps_pending(batch: &PendingBarrier, incoming: &BarrierInfo) -> bool {

    batch.barriers.iter().any(|existing| {
        existing.resource == incoming.resource && ranges_overlap(existing, incoming)
    })
}

fn ranges_overlap(a: &BarrierInfo, b: &BarrierInfo) -> bool {

    match (&a.image_transition, &b.image_transition) {
        | (Some((_, _, mask_a)), Some((_, _, mask_b))) => mask_a.intersects(mask_b),
        | _ => match (&a.buffer_range, &b.buffer_range) {
            | (Some(_), Some(_)) => true,
            | _ => false,
        },
    }
}

/// Count how many `SignalEvent`/`WaitForEvents` calls exist after compaction; used to assert
/// the "every event has exactly one signal and exactly one wait" invariant in tests.
pub fn event_signal_count(compacted: &[CompactedCommand]) -> usize {
    compacted.iter().filter(|c| match c {
        | CompactedCommand::SignalEvent { .. } => true,
        | _ => false,
    }).count()
}

pub fn event_wait_count(compacted: &[CompactedCommand]) -> usize {
    compacted.iter().map(|c| match c {
        | CompactedCommand::WaitForEvents { barriers, .. } => barriers.len(),
        | _ => 0,
    }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framegraph::resource::ResourceHandle;

    fn barrier(resource: ResourceHandle) -> BarrierInfo {
        BarrierInfo {
            resource,
            src_stage: vk::PipelineStageFlags::TRANSFER,
            dst_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
            src_access: vk::AccessFlags::TRANSFER_WRITE,
            dst_access: vk::AccessFlags::SHADER_READ,
            image_transition: None,
            buffer_range: Some((0, vk::WHOLE_SIZE)),
        }
    }

    #[test]
    fn signal_wait_pair_survives_one_to_one() {

        let resource = ResourceHandle::transient_buffer(0);
        let event_id = EventId { resource, sequence: 0 };

        let commands = vec![
            ResourceCommand {
                command_index: 2, order: CommandOrder::After, resource,
                kind: ResourceCommandKind::SignalEvent { stages: vk::PipelineStageFlags::TRANSFER, event_id },
            },
            ResourceCommand {
                command_index: 3, order: CommandOrder::Before, resource,
                kind: ResourceCommandKind::WaitForEvent { barrier: barrier(resource), event_id },
            },
        ];

        let compacted = compact(&commands);
        assert_eq!(event_signal_count(&compacted), 1);
        assert_eq!(event_wait_count(&compacted), 1);
    }

    #[test]
    fn wait_event_id_matches_its_signal() {

        let resource = ResourceHandle::transient_buffer(0);
        let event_id = EventId { resource, sequence: 0 };

        let commands = vec![
            ResourceCommand {
                command_index: 2, order: CommandOrder::After, resource,
                kind: ResourceCommandKind::SignalEvent { stages: vk::PipelineStageFlags::TRANSFER, event_id },
            },
            ResourceCommand {
                command_index: 3, order: CommandOrder::Before, resource,
                kind: ResourceCommandKind::WaitForEvent { barrier: barrier(resource), event_id },
            },
        ];

        let compacted = compact(&commands);

        let signalled = compacted.iter().find_map(|c| match c {
            | CompactedCommand::SignalEvent { event_id, .. } => Some(*event_id),
            | _ => None,
        }).expect("signal present");

        let waited = compacted.iter().find_map(|c| match c {
            | CompactedCommand::WaitForEvents { event_ids, .. } => Some(event_ids.clone()),
            | _ => None,
        }).expect("wait present");

        assert_eq!(waited, vec![signalled]);
    }

    #[test]
    fn distinct_dependencies_on_same_resource_get_distinct_event_ids() {

        let resource = ResourceHandle::transient_buffer(0);
        let first = EventId { resource, sequence: 0 };
        let second = EventId { resource, sequence: 1 };

        assert_ne!(first, second);
    }

    #[test]
    fn adjacent_barriers_at_same_index_merge() {

        let resource_a = ResourceHandle::transient_buffer(0);
        let resource_b = ResourceHandle::transient_buffer(1);

        let commands = vec![
            ResourceCommand { command_index: 5, order: CommandOrder::Before, resource: resource_a, kind: ResourceCommandKind::PipelineBarrier { barrier: barrier(resource_a) } },
            ResourceCommand { command_index: 5, order: CommandOrder::Before, resource: resource_b, kind: ResourceCommandKind::PipelineBarrier { barrier: barrier(resource_b) } },
        ];

        let compacted = compact(&commands);
        let barrier_calls: Vec<_> = compacted.iter().filter(|c| match c {
            | CompactedCommand::PipelineBarrier { .. } => true,
            | _ => false,
        }).collect();

        assert_eq!(barrier_calls.len(), 1);
    }
}
