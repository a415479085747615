
use ash::vk;

use crate::vkbytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// device-local only, not CPU-visible.
    Private,
    /// host-visible and host-coherent.
    Shared,
    /// host-visible, flushed explicitly by the allocator on map/unmap.
    Managed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuCacheMode {
    DefaultCache,
    WriteCombined,
}

#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub length: vkbytes,
    pub storage_mode: StorageMode,
    pub cpu_cache_mode: CpuCacheMode,
    /// superset of every `vk::BufferUsageFlags` observed across this buffer's usages.
    pub usage_hint: vk::BufferUsageFlags,
}

#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub width : u32,
    pub height: u32,
    pub depth : u32,
    pub array_length: u32,
    pub mip_levels  : u32,
    pub sample_count: vk::SampleCountFlags,
    pub format: vk::Format,
    pub storage_mode: StorageMode,
    /// superset of every `vk::ImageUsageFlags` observed across this texture's usages.
    pub usage_hint: vk::ImageUsageFlags,
}

impl TextureDescriptor {

    #[inline]
    pub fn subresource_count(&self) -> u32 {
        self.array_length * self.mip_levels
    }

    pub fn all_aspects(&self) -> vk::ImageAspectFlags {

        match self.format {
            | vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
                vk::ImageAspectFlags::DEPTH
            },
            | vk::Format::S8_UINT => {
                vk::ImageAspectFlags::STENCIL
            },
            | vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
                vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
            },
            | _ => vk::ImageAspectFlags::COLOR,
        }
    }

    #[inline]
    pub fn is_depth_stencil(&self) -> bool {
        let aspects = self.all_aspects();
        (aspects & (vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL)) != vk::ImageAspectFlags::empty()
    }
}
