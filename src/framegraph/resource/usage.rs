
use ash::vk;

use crate::framegraph::resource::{ResourceHandle, ActiveRange};

/// The role a resource plays at one point in a pass's declared usages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageType {
    Read,
    Write,
    ReadWrite,
    ConstantBuffer,
    VertexBuffer,
    IndexBuffer,
    IndirectBuffer,
    BlitSource,
    BlitDestination,
    BlitSynchronisation,
    Sampler,
    InputAttachment,
    ReadWriteRenderTarget,
    WriteOnlyRenderTarget,
    InputAttachmentRenderTarget,
    UnusedRenderTarget,
    UnusedArgumentBuffer,
    FrameStartLayoutTransitionCheck,
}

impl UsageType {

    pub fn is_write(&self) -> bool {
        match self {
            | UsageType::Write
            | UsageType::ReadWrite
            | UsageType::BlitDestination
            | UsageType::ReadWriteRenderTarget
            | UsageType::WriteOnlyRenderTarget => true,
            | _ => false,
        }
    }

    pub fn is_read(&self) -> bool {
        match self {
            | UsageType::Read
            | UsageType::ReadWrite
            | UsageType::ConstantBuffer
            | UsageType::VertexBuffer
            | UsageType::IndexBuffer
            | UsageType::IndirectBuffer
            | UsageType::BlitSource
            | UsageType::BlitSynchronisation
            | UsageType::Sampler
            | UsageType::InputAttachment
            | UsageType::ReadWriteRenderTarget
            | UsageType::InputAttachmentRenderTarget
            | UsageType::FrameStartLayoutTransitionCheck => true,
            | _ => false,
        }
    }

    pub fn is_render_target(&self) -> bool {
        match self {
            | UsageType::ReadWriteRenderTarget
            | UsageType::WriteOnlyRenderTarget
            | UsageType::InputAttachmentRenderTarget
            | UsageType::UnusedRenderTarget => true,
            | _ => false,
        }
    }

    pub fn access_mask(&self, is_depth_stencil: bool) -> vk::AccessFlags {
        match self {
            | UsageType::Read => vk::AccessFlags::SHADER_READ,
            | UsageType::Write => vk::AccessFlags::SHADER_WRITE,
            | UsageType::ReadWrite => vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            | UsageType::ConstantBuffer => vk::AccessFlags::UNIFORM_READ,
            | UsageType::VertexBuffer => vk::AccessFlags::VERTEX_ATTRIBUTE_READ,
            | UsageType::IndexBuffer => vk::AccessFlags::INDEX_READ,
            | UsageType::IndirectBuffer => vk::AccessFlags::INDIRECT_COMMAND_READ,
            | UsageType::BlitSource => vk::AccessFlags::TRANSFER_READ,
            | UsageType::BlitDestination => vk::AccessFlags::TRANSFER_WRITE,
            | UsageType::BlitSynchronisation => vk::AccessFlags::TRANSFER_READ | vk::AccessFlags::TRANSFER_WRITE,
            | UsageType::Sampler => vk::AccessFlags::SHADER_READ,
            | UsageType::InputAttachment => vk::AccessFlags::INPUT_ATTACHMENT_READ,
            | UsageType::ReadWriteRenderTarget => {
                if is_depth_stencil {
                    vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
                } else {
                    vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                }
            },
            | UsageType::WriteOnlyRenderTarget => {
                if is_depth_stencil {
                    vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
                } else {
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                }
            },
            | UsageType::InputAttachmentRenderTarget => vk::AccessFlags::INPUT_ATTACHMENT_READ,
            | UsageType::UnusedRenderTarget
            | UsageType::UnusedArgumentBuffer
            | UsageType::FrameStartLayoutTransitionCheck => vk::AccessFlags::empty(),
        }
    }

    pub fn stage_mask(&self, is_depth_stencil: bool, shader_stages: vk::PipelineStageFlags) -> vk::PipelineStageFlags {
        match self {
            | UsageType::Read | UsageType::Write | UsageType::ReadWrite
            | UsageType::Sampler | UsageType::ConstantBuffer => shader_stages,
            | UsageType::VertexBuffer => vk::PipelineStageFlags::VERTEX_INPUT,
            | UsageType::IndexBuffer => vk::PipelineStageFlags::VERTEX_INPUT,
            | UsageType::IndirectBuffer => vk::PipelineStageFlags::DRAW_INDIRECT,
            | UsageType::BlitSource | UsageType::BlitDestination | UsageType::BlitSynchronisation => {
                vk::PipelineStageFlags::TRANSFER
            },
            | UsageType::InputAttachment | UsageType::InputAttachmentRenderTarget => {
                vk::PipelineStageFlags::FRAGMENT_SHADER
            },
            | UsageType::ReadWriteRenderTarget | UsageType::WriteOnlyRenderTarget => {
                if is_depth_stencil {
                    vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS
                } else {
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                }
            },
            | UsageType::UnusedRenderTarget
            | UsageType::UnusedArgumentBuffer
            | UsageType::FrameStartLayoutTransitionCheck => vk::PipelineStageFlags::TOP_OF_PIPE,
        }
    }

    /// The image layout this usage requires, or `None` if it imposes no layout requirement
    /// (e.g. a buffer usage, or a usage that simply inherits whatever layout is already active).
    pub fn image_layout(&self, is_depth_stencil: bool) -> Option<vk::ImageLayout> {
        match self {
            | UsageType::Read | UsageType::Sampler => Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            | UsageType::Write | UsageType::ReadWrite => Some(vk::ImageLayout::GENERAL),
            | UsageType::BlitSource => Some(vk::ImageLayout::TRANSFER_SRC_OPTIMAL),
            | UsageType::BlitDestination => Some(vk::ImageLayout::TRANSFER_DST_OPTIMAL),
            | UsageType::BlitSynchronisation => Some(vk::ImageLayout::GENERAL),
            | UsageType::InputAttachment => Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            | UsageType::ReadWriteRenderTarget => Some(vk::ImageLayout::GENERAL),
            | UsageType::WriteOnlyRenderTarget => {
                if is_depth_stencil {
                    Some(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                } else {
                    Some(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                }
            },
            | UsageType::InputAttachmentRenderTarget => {
                if is_depth_stencil {
                    Some(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
                } else {
                    Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                }
            },
            | UsageType::ConstantBuffer | UsageType::VertexBuffer | UsageType::IndexBuffer
            | UsageType::IndirectBuffer | UsageType::UnusedRenderTarget | UsageType::UnusedArgumentBuffer
            | UsageType::FrameStartLayoutTransitionCheck => None,
        }
    }
}

/// A command-index is a position in a pass's user-recorded command stream; `-1` marks
/// "before the frame's first recorded command" (used by frame-initial layout entries).
pub type CommandIndex = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRange {
    pub start: CommandIndex,
    pub end: CommandIndex,
}

impl CommandRange {

    pub fn contains(&self, index: CommandIndex) -> bool {
        index >= self.start && index < self.end
    }
}

/// An opaque reference back to the pass record that declared a usage; used only for
/// diagnostics (the panic path in the layout tracker names the offending resource and range).
pub type PassId = u32;

#[derive(Debug, Clone)]
pub struct ResourceUsage {
    pub resource: ResourceHandle,
    pub usage_type: UsageType,
    pub render_stages: vk::PipelineStageFlags,
    pub command_range: CommandRange,
    pub active_range: ActiveRange,
    pub owning_pass: PassId,
    /// the queue family the owning pass records on; drives cross-queue-family strategy selection.
    pub queue_family: u32,
    /// identifies the executor encoder (command buffer) the owning pass records into; two
    /// usages in the same encoder never need a semaphore, only a barrier or event.
    pub encoder_id: u32,
    /// `Some(render_pass_id)` if this usage occurs inside a fused Vulkan render-pass instance.
    pub render_pass_instance: Option<u32>,
}
