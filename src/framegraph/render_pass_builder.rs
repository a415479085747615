
//! Turns a fused `RenderTargetDescriptor` plus the concrete image views it binds into a real
//! `vk::RenderPass`/`vk::Framebuffer` pair, ready for `vkCmdBeginRenderPass`.

use ash::vk;
use ash::version::DeviceV1_0;

use crate::context::VkDevice;
use crate::context::VkObjectCreatable;
use crate::error::{VkResult, VkError};
use crate::ci::pipeline::renderpass::RenderPassCI;
use crate::framegraph::render_target::RenderTargetDescriptor;

use std::ptr;

/// The concrete Vulkan-facing counterpart of one `AttachmentDescriptor` slot: the caller resolves
/// format/layouts/load-store-ops (from the owning `TextureDescriptor` and `ImageLayoutTracker`)
/// before handing this plan to `build`.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentPlan {
    pub view: vk::ImageView,
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
    pub clear_value: vk::ClearValue,
}

/// A built render pass, ready to be driven by `RenderPassBI`.
pub struct FusedRenderPass {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub clear_values: Vec<vk::ClearValue>,
}

impl FusedRenderPass {

    pub fn discard(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_framebuffer(self.framebuffer, None);
        }
        self.render_pass.discard(device);
    }
}

/// Per-subpass attachment-reference arrays, held separately from the `vk::SubpassDescription`s
/// that point into them (those arrays must outlive the structs referencing them).
struct SubpassReferences {
    colour: Vec<Vec<vk::AttachmentReference>>,
    input: Vec<Vec<vk::AttachmentReference>>,
    depth: Vec<Option<vk::AttachmentReference>>,
    preserve: Vec<Vec<u32>>,
}

/// A render target slot used as both a colour/depth binding and an input attachment in the same
/// subpass must sit in `GENERAL` layout; every other binding uses its optimal layout.
fn plan_subpass_references(descriptor: &RenderTargetDescriptor) -> SubpassReferences {

    let mut colour = Vec::with_capacity(descriptor.subpasses.len());
    let mut input = Vec::with_capacity(descriptor.subpasses.len());
    let mut depth = Vec::with_capacity(descriptor.subpasses.len());
    let mut preserve = Vec::with_capacity(descriptor.subpasses.len());

    for subpass in &descriptor.subpasses {

        let is_general = |slot: usize| -> bool {
            subpass.colour_attachments.contains(&slot) && subpass.input_attachments.contains(&slot)
        };

        let colour_refs: Vec<vk::AttachmentReference> = subpass.colour_attachments.iter()
            .map(|&slot| vk::AttachmentReference {
                attachment: slot as u32,
                layout: if is_general(slot) { vk::ImageLayout::GENERAL } else { vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL },
            })
            .collect();

        let input_refs: Vec<vk::AttachmentReference> = subpass.input_attachments.iter()
            .map(|&slot| vk::AttachmentReference {
                attachment: slot as u32,
                layout: if is_general(slot) { vk::ImageLayout::GENERAL } else { vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL },
            })
            .collect();

        let depth_ref = subpass.depth_attachment.map(|slot| vk::AttachmentReference {
            attachment: slot as u32,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        });

        colour.push(colour_refs);
        input.push(input_refs);
        depth.push(depth_ref);
        preserve.push(subpass.preserve_attachments.iter().map(|&i| i as u32).collect());
    }

    SubpassReferences { colour, input, depth, preserve }
}

fn plan_attachment_descriptions(attachments: &[AttachmentPlan]) -> Vec<vk::AttachmentDescription> {

    attachments.iter()
        .map(|plan| vk::AttachmentDescription {
            flags: vk::AttachmentDescriptionFlags::empty(),
            format : plan.format,
            samples: plan.samples,
            load_op : plan.load_op,
            store_op: plan.store_op,
            stencil_load_op : vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: plan.initial_layout,
            final_layout  : plan.final_layout,
        })
        .collect()
}

/// Build one `vk::RenderPass`/`vk::Framebuffer` from a fused descriptor. `attachments` is indexed
/// exactly as `descriptor.colour_attachments` followed by the depth slot (matching
/// `RenderTargetDescriptor::attachment_usage_window`'s layout).
pub fn build(device: &VkDevice, descriptor: &RenderTargetDescriptor, attachments: &[AttachmentPlan], extent: vk::Extent2D) -> VkResult<FusedRenderPass> {

    let colour_count = descriptor.colour_attachments.len();
    let has_depth = descriptor.depth_attachment.is_some();

    debug_assert_eq!(attachments.len(), colour_count + if has_depth { 1 } else { 0 }, "attachment plan count must match fused descriptor's attachment slots");

    // per-subpass reference arrays must outlive the `vk::SubpassDescription`s that point into
    // them, so they are collected up front and held until after `RenderPassCI::build` returns.
    let refs = plan_subpass_references(descriptor);

    let subpass_descriptions: Vec<vk::SubpassDescription> = (0..descriptor.subpasses.len())
        .map(|i| vk::SubpassDescription {
            flags: vk::SubpassDescriptionFlags::empty(),
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            input_attachment_count: refs.input[i].len() as _,
            p_input_attachments   : refs.input[i].as_ptr(),
            color_attachment_count: refs.colour[i].len() as _,
            p_color_attachments   : refs.colour[i].as_ptr(),
            p_resolve_attachments : ptr::null(),
            p_depth_stencil_attachment: refs.depth[i].as_ref().map(|r| r as *const _).unwrap_or(ptr::null()),
            preserve_attachment_count: refs.preserve[i].len() as _,
            p_preserve_attachments   : refs.preserve[i].as_ptr(),
        })
        .collect();

    let attachment_descriptions = plan_attachment_descriptions(attachments);

    let mut render_pass_ci = RenderPassCI::new();
    for attachment in attachment_descriptions {
        render_pass_ci = render_pass_ci.add_attachment(attachment);
    }
    for subpass in subpass_descriptions {
        render_pass_ci = render_pass_ci.add_subpass(subpass);
    }
    for dependency in &descriptor.dependencies {
        render_pass_ci = render_pass_ci.add_dependency(dependency.as_vk());
    }

    let render_pass = render_pass_ci.build(device)?;

    let views: Vec<vk::ImageView> = attachments.iter().map(|plan| plan.view).collect();
    let framebuffer_ci = vk::FramebufferCreateInfo {
        s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::FramebufferCreateFlags::empty(),
        render_pass,
        attachment_count: views.len() as _,
        p_attachments   : views.as_ptr(),
        width : extent.width,
        height: extent.height,
        layers: 1,
    };

    let framebuffer = unsafe {
        device.logic.handle.create_framebuffer(&framebuffer_ci, None)
            .map_err(|_| VkError::create("Framebuffer"))?
    };

    let clear_values = attachments.iter().map(|plan| plan.clear_value).collect();

    Ok(FusedRenderPass { render_pass, framebuffer, extent, clear_values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framegraph::render_target::SubpassDescriptor;

    fn plan(format: vk::Format) -> AttachmentPlan {
        AttachmentPlan {
            view: vk::ImageView::null(),
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            clear_value: vk::ClearValue { color: vk::ClearColorValue { float32: [0.0; 4] } },
        }
    }

    #[test]
    fn single_subpass_uses_optimal_layouts() {

        let mut descriptor = RenderTargetDescriptor::default();
        descriptor.subpasses.push(SubpassDescriptor {
            colour_attachments: vec![0],
            depth_attachment: None,
            input_attachments: vec![],
            preserve_attachments: vec![],
        });

        let refs = plan_subpass_references(&descriptor);

        assert_eq!(refs.colour[0], vec![vk::AttachmentReference { attachment: 0, layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL }]);
        assert!(refs.input[0].is_empty());
        assert!(refs.depth[0].is_none());
    }

    #[test]
    fn slot_bound_as_colour_and_input_in_same_subpass_forces_general_layout() {

        let mut descriptor = RenderTargetDescriptor::default();
        descriptor.subpasses.push(SubpassDescriptor {
            colour_attachments: vec![0],
            depth_attachment: None,
            input_attachments: vec![0],
            preserve_attachments: vec![],
        });

        let refs = plan_subpass_references(&descriptor);

        assert_eq!(refs.colour[0][0].layout, vk::ImageLayout::GENERAL);
        assert_eq!(refs.input[0][0].layout, vk::ImageLayout::GENERAL);
    }

    #[test]
    fn second_subpass_reads_first_as_input_attachment_in_optimal_layout() {

        let mut descriptor = RenderTargetDescriptor::default();
        descriptor.subpasses.push(SubpassDescriptor {
            colour_attachments: vec![0],
            depth_attachment: None,
            input_attachments: vec![],
            preserve_attachments: vec![],
        });
        descriptor.subpasses.push(SubpassDescriptor {
            colour_attachments: vec![1],
            depth_attachment: None,
            input_attachments: vec![0],
            preserve_attachments: vec![],
        });

        let refs = plan_subpass_references(&descriptor);

        assert_eq!(refs.input[1], vec![vk::AttachmentReference { attachment: 0, layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL }]);
        assert_eq!(refs.colour[0][0].layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn depth_attachment_always_depth_stencil_optimal() {

        let mut descriptor = RenderTargetDescriptor::default();
        descriptor.subpasses.push(SubpassDescriptor {
            colour_attachments: vec![0],
            depth_attachment: Some(1),
            input_attachments: vec![],
            preserve_attachments: vec![],
        });

        let refs = plan_subpass_references(&descriptor);

        assert_eq!(refs.depth[0], Some(vk::AttachmentReference { attachment: 1, layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL }));
    }

    #[test]
    fn preserve_attachments_carry_through_unchanged() {

        let mut descriptor = RenderTargetDescriptor::default();
        descriptor.subpasses.push(SubpassDescriptor {
            colour_attachments: vec![0],
            depth_attachment: None,
            input_attachments: vec![],
            preserve_attachments: vec![2, 3],
        });

        let refs = plan_subpass_references(&descriptor);

        assert_eq!(refs.preserve[0], vec![2, 3]);
    }

    #[test]
    fn attachment_descriptions_carry_plan_fields_verbatim() {

        let plans = vec![plan(vk::Format::R8G8B8A8_UNORM), plan(vk::Format::D32_SFLOAT)];
        let descriptions = plan_attachment_descriptions(&plans);

        assert_eq!(descriptions.len(), 2);
        assert_eq!(descriptions[0].format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(descriptions[0].load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(descriptions[1].format, vk::Format::D32_SFLOAT);
    }
}
