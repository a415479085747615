
//! Fuses consecutive draw passes into one Vulkan render pass, assigning subpasses, attachments,
//! load/store ops, and the subpass dependency table.

use ash::vk;

use crate::framegraph::resource::ResourceHandle;
use crate::framegraph::resource::usage::{CommandIndex, UsageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOp {
    None,
    Clear,
}

/// A single colour/depth/stencil slot an attached texture occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub texture: ResourceHandle,
    pub slice: u32,
    pub level: u32,
    pub depth_plane: u32,
    pub clear_op: ClearOp,
    /// true if the pass is known to write every pixel (makes `LOAD` unnecessary).
    pub fully_overwrites: bool,
}

impl AttachmentDescriptor {

    fn identical_binding(&self, other: &AttachmentDescriptor) -> bool {
        self.texture == other.texture && self.slice == other.slice
            && self.level == other.level && self.depth_plane == other.depth_plane
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compatibility {
    Identical,
    Compatible,
    Incompatible,
}

fn try_update(old: &Option<AttachmentDescriptor>, new: &Option<AttachmentDescriptor>) -> Compatibility {

    match (old, new) {
        | (None, None) => Compatibility::Identical,
        | (None, Some(_)) | (Some(_), None) => Compatibility::Compatible,
        | (Some(o), Some(n)) => {
            if o.identical_binding(n) {
                if n.clear_op == ClearOp::Clear {
                    // a clear on an already-bound attachment would overwrite in-progress contents.
                    Compatibility::Incompatible
                } else {
                    Compatibility::Identical
                }
            } else {
                Compatibility::Incompatible
            }
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubpassDescriptor {
    pub colour_attachments: Vec<usize>,
    pub depth_attachment: Option<usize>,
    pub input_attachments: Vec<usize>,
    pub preserve_attachments: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask : vk::PipelineStageFlags,
    pub dst_stage_mask : vk::PipelineStageFlags,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
    pub dependency_flags: vk::DependencyFlags,
}

impl SubpassDependency {

    fn or_in(&mut self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags,
              src_access: vk::AccessFlags, dst_access: vk::AccessFlags, flags: vk::DependencyFlags) {
        self.src_stage_mask  = self.src_stage_mask  | src_stage;
        self.dst_stage_mask  = self.dst_stage_mask  | dst_stage;
        self.src_access_mask = self.src_access_mask | src_access;
        self.dst_access_mask = self.dst_access_mask | dst_access;
        self.dependency_flags = self.dependency_flags | flags;
    }

    pub fn as_vk(&self) -> vk::SubpassDependency {
        vk::SubpassDependency {
            src_subpass: self.src_subpass,
            dst_subpass: self.dst_subpass,
            src_stage_mask : self.src_stage_mask,
            dst_stage_mask : self.dst_stage_mask,
            src_access_mask: self.src_access_mask,
            dst_access_mask: self.dst_access_mask,
            dependency_flags: self.dependency_flags,
        }
    }
}

/// One planned Vulkan render pass: the fused colour/depth attachments shared across its subpasses,
/// plus one `SubpassDescriptor` per fused draw pass.
#[derive(Debug, Clone, Default)]
pub struct RenderTargetDescriptor {
    pub colour_attachments: Vec<Option<AttachmentDescriptor>>,
    pub depth_attachment: Option<AttachmentDescriptor>,
    pub subpasses: Vec<SubpassDescriptor>,
    pub dependencies: Vec<SubpassDependency>,
    /// per attachment index: (previous-usage command index, next-usage command index).
    pub attachment_usage_window: Vec<(Option<CommandIndex>, Option<CommandIndex>)>,
}

impl RenderTargetDescriptor {

    fn new(colour_count: usize) -> RenderTargetDescriptor {
        RenderTargetDescriptor {
            colour_attachments: vec![None; colour_count],
            depth_attachment: None,
            subpasses: Vec::new(),
            dependencies: Vec::new(),
            attachment_usage_window: vec![(None, None); colour_count + 1],
        }
    }

    fn dependency_mut(&mut self, src: u32, dst: u32) -> &mut SubpassDependency {

        if let Some(pos) = self.dependencies.iter().position(|d| d.src_subpass == src && d.dst_subpass == dst) {
            return &mut self.dependencies[pos];
        }

        self.dependencies.push(SubpassDependency { src_subpass: src, dst_subpass: dst, ..Default::default() });
        self.dependencies.last_mut().unwrap()
    }
}

/// One incoming draw pass's requested attachment bindings, prior to fusion.
#[derive(Debug, Clone)]
pub struct DrawRenderPassDescriptor {
    pub command_index: CommandIndex,
    pub colour_attachments: Vec<Option<AttachmentDescriptor>>,
    pub depth_attachment: Option<AttachmentDescriptor>,
    /// attachments this subpass reads as an input attachment (indices into the fused descriptor's
    /// colour/depth attachment slots, depth being the last index).
    pub input_attachment_slots: Vec<usize>,
}

/// Incrementally fuses consecutive `DrawRenderPassDescriptor`s into `RenderTargetDescriptor`s.
pub struct RenderTargetPlanner {
    finished: Vec<RenderTargetDescriptor>,
    open: Option<RenderTargetDescriptor>,
}

impl RenderTargetPlanner {

    pub fn new() -> RenderTargetPlanner {
        RenderTargetPlanner { finished: Vec::new(), open: None }
    }

    /// Attempt to fuse `pass` into the currently open descriptor; finalise and open a new one on
    /// incompatibility (size mismatch or any attachment slot incompatible).
    pub fn push_draw_pass(&mut self, pass: DrawRenderPassDescriptor) {

        let colour_count = pass.colour_attachments.len();

        let compatible = match &self.open {
            | None => false,
            | Some(open) => {
                open.colour_attachments.len() == colour_count
                    && (0..colour_count).all(|i| {
                        try_update(&open.colour_attachments[i], &pass.colour_attachments[i]) != Compatibility::Incompatible
                    })
                    && try_update(&open.depth_attachment, &pass.depth_attachment) != Compatibility::Incompatible
            },
        };

        if !compatible {
            self.finalise_open();
            self.open = Some(RenderTargetDescriptor::new(colour_count));
        }

        let open = self.open.as_mut().unwrap();
        let subpass_index = open.subpasses.len() as u32;

        let mut subpass = SubpassDescriptor::default();

        for i in 0..colour_count {

            let compatibility = try_update(&open.colour_attachments[i], &pass.colour_attachments[i]);
            if compatibility != Compatibility::Identical {
                if let Some(new_att) = pass.colour_attachments[i].clone() {
                    open.colour_attachments[i] = Some(new_att);
                }
            }

            if pass.colour_attachments[i].is_some() {
                subpass.colour_attachments.push(i);
            }
        }

        if pass.depth_attachment.is_some() {
            let compatibility = try_update(&open.depth_attachment, &pass.depth_attachment);
            if compatibility != Compatibility::Identical {
                open.depth_attachment = pass.depth_attachment.clone();
            }
            subpass.depth_attachment = Some(colour_count);
        }

        for &slot in &pass.input_attachment_slots {
            subpass.input_attachments.push(slot);
        }

        // every attachment bound in an earlier subpass but not this one gets preserved.
        for i in 0..=colour_count {
            let bound_here = subpass.colour_attachments.contains(&i) || subpass.depth_attachment == Some(i);
            let bound_before = open.subpasses.iter().any(|s| s.colour_attachments.contains(&i) || s.depth_attachment == Some(i));
            if bound_before && !bound_here {
                subpass.preserve_attachments.push(i);
            }
        }

        // a slot bound as both a colour/depth attachment and an input attachment in this very
        // subpass (the readWrite-render-target case, forced to GENERAL layout) needs a
        // self-dependency so the driver knows the read must wait on the write.
        let self_referencing = subpass.colour_attachments.iter().chain(subpass.depth_attachment.iter())
            .any(|slot| subpass.input_attachments.contains(slot));

        open.subpasses.push(subpass);

        if subpass_index > 0 {
            let prior_writes_color = vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
            let now_reads_input = vk::AccessFlags::INPUT_ATTACHMENT_READ;
            let dep = open.dependency_mut(subpass_index - 1, subpass_index);
            dep.or_in(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                prior_writes_color,
                now_reads_input,
                vk::DependencyFlags::BY_REGION,
            );
        }

        if self_referencing {
            let dep = open.dependency_mut(subpass_index, subpass_index);
            dep.or_in(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                vk::AccessFlags::INPUT_ATTACHMENT_READ,
                vk::DependencyFlags::BY_REGION,
            );
        }
    }

    fn finalise_open(&mut self) {
        if let Some(descriptor) = self.open.take() {
            self.finished.push(descriptor);
        }
    }

    pub fn finish(mut self) -> Vec<RenderTargetDescriptor> {
        self.finalise_open();
        self.finished
    }
}

/// Given a subpass's bound attachment slots and the usage type each was declared with, return the
/// subset that must also be listed as input attachments (read, explicit input attachment, or a
/// readWrite render target reading back its own prior output).
pub fn input_attachment_slots_for(slot_usages: &[(usize, UsageType)]) -> Vec<usize> {

    let mut slots = Vec::new();

    for &(slot, usage_type) in slot_usages {

        let wants_input = match usage_type {
            | UsageType::Read | UsageType::InputAttachment | UsageType::InputAttachmentRenderTarget => true,
            | UsageType::ReadWriteRenderTarget => {
                log::warn!("attachment slot {} bound as both render target and input attachment (readWrite); forcing GENERAL layout", slot);
                true
            },
            | _ => false,
        };

        if wants_input {
            slots.push(slot);
        }
    }

    slots
}

/// Resolve `VkAttachmentLoadOp`/`VkAttachmentStoreOp` for one attachment slot.
pub fn load_store_ops(
    clear_requested: bool,
    has_earlier_usage: bool,
    fully_overwritten: bool,
    has_later_usage: bool,
    resource_is_durable: bool,
) -> (vk::AttachmentLoadOp, vk::AttachmentStoreOp) {

    let load = if clear_requested {
        vk::AttachmentLoadOp::CLEAR
    } else if has_earlier_usage && !fully_overwritten {
        vk::AttachmentLoadOp::LOAD
    } else {
        vk::AttachmentLoadOp::DONT_CARE
    };

    let store = if has_later_usage || resource_is_durable {
        vk::AttachmentStoreOp::STORE
    } else {
        vk::AttachmentStoreOp::DONT_CARE
    };

    (load, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(texture_index: u32, clear: ClearOp) -> AttachmentDescriptor {
        AttachmentDescriptor {
            texture: ResourceHandle::transient_texture(texture_index),
            slice: 0, level: 0, depth_plane: 0,
            clear_op: clear,
            fully_overwrites: clear == ClearOp::Clear,
        }
    }

    #[test]
    fn identical_attachments_share_one_render_pass_two_subpasses() {

        let mut planner = RenderTargetPlanner::new();

        planner.push_draw_pass(DrawRenderPassDescriptor {
            command_index: 0,
            colour_attachments: vec![Some(attachment(0, ClearOp::Clear))],
            depth_attachment: None,
            input_attachment_slots: vec![],
        });

        planner.push_draw_pass(DrawRenderPassDescriptor {
            command_index: 1,
            colour_attachments: vec![Some(attachment(0, ClearOp::None))],
            depth_attachment: None,
            input_attachment_slots: vec![0],
        });

        let finished = planner.finish();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].subpasses.len(), 2);
        assert_eq!(finished[0].dependencies.len(), 1);
    }

    #[test]
    fn attachment_bound_as_colour_and_input_in_same_subpass_gets_self_dependency() {

        let mut planner = RenderTargetPlanner::new();

        planner.push_draw_pass(DrawRenderPassDescriptor {
            command_index: 0,
            colour_attachments: vec![Some(attachment(0, ClearOp::Clear))],
            depth_attachment: None,
            input_attachment_slots: vec![0],
        });

        let finished = planner.finish();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].subpasses.len(), 1);

        let dep = finished[0].dependencies.iter().find(|d| d.src_subpass == 0 && d.dst_subpass == 0);
        assert!(dep.is_some(), "same-subpass colour+input binding must record a self-dependency");
        assert_eq!(dep.unwrap().dependency_flags, vk::DependencyFlags::BY_REGION);
    }

    #[test]
    fn clear_on_bound_attachment_forces_new_render_pass() {

        let mut planner = RenderTargetPlanner::new();

        planner.push_draw_pass(DrawRenderPassDescriptor {
            command_index: 0,
            colour_attachments: vec![Some(attachment(0, ClearOp::None))],
            depth_attachment: None,
            input_attachment_slots: vec![],
        });

        planner.push_draw_pass(DrawRenderPassDescriptor {
            command_index: 1,
            colour_attachments: vec![Some(attachment(0, ClearOp::Clear))],
            depth_attachment: None,
            input_attachment_slots: vec![],
        });

        let finished = planner.finish();
        assert_eq!(finished.len(), 2);
    }

    #[test]
    fn load_store_op_matrix() {

        assert_eq!(load_store_ops(true, true, false, true, false), (vk::AttachmentLoadOp::CLEAR, vk::AttachmentStoreOp::STORE));
        assert_eq!(load_store_ops(false, true, false, false, false), (vk::AttachmentLoadOp::LOAD, vk::AttachmentStoreOp::DONT_CARE));
        assert_eq!(load_store_ops(false, false, false, false, false), (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::DONT_CARE));
        assert_eq!(load_store_ops(false, true, true, false, true), (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::STORE));
    }

    #[test]
    fn read_write_render_target_counts_as_input_attachment() {

        let slots = input_attachment_slots_for(&[
            (0, UsageType::WriteOnlyRenderTarget),
            (1, UsageType::ReadWriteRenderTarget),
            (2, UsageType::UnusedRenderTarget),
        ]);

        assert_eq!(slots, vec![1]);
    }
}
