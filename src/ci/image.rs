
use ash::vk;
use ash::version::DeviceV1_0;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::{VulkanCI, VkObjectBuildableCI};
use crate::error::{VkResult, VkError};
use crate::vkuint;

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for `vk::ImageCreateInfo`.
#[derive(Debug, Clone)]
pub struct ImageCI {
    inner: vk::ImageCreateInfo,
    queue_families: Option<Vec<vkuint>>,
}

impl VulkanCI<vk::ImageCreateInfo> for ImageCI {

    fn default_ci() -> vk::ImageCreateInfo {

        vk::ImageCreateInfo {
            s_type: vk::StructureType::IMAGE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::ImageCreateFlags::empty(),
            image_type  : vk::ImageType::TYPE_2D,
            format      : vk::Format::UNDEFINED,
            extent      : vk::Extent3D { width: 0, height: 0, depth: 1 },
            mip_levels  : 1,
            array_layers: 1,
            samples     : vk::SampleCountFlags::TYPE_1,
            tiling      : vk::ImageTiling::OPTIMAL,
            usage       : vk::ImageUsageFlags::empty(),
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_family_index_count: 0,
            p_queue_family_indices  : ptr::null(),
            initial_layout: vk::ImageLayout::UNDEFINED,
        }
    }
}

impl AsRef<vk::ImageCreateInfo> for ImageCI {

    fn as_ref(&self) -> &vk::ImageCreateInfo {
        &self.inner
    }
}

impl VkObjectBuildableCI for ImageCI {
    type ObjectType = (vk::Image, vk::MemoryRequirements);

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        debug_assert_ne!(self.inner.usage, vk::ImageUsageFlags::empty(), "the usage member of vk::ImageCreateInfo must not be 0!");

        let image = unsafe {
            device.logic.handle.create_image(self.as_ref(), None)
                .map_err(|_| VkError::create("Image"))?
        };

        let requirement = unsafe {
            device.logic.handle.get_image_memory_requirements(image)
        };

        Ok((image, requirement))
    }
}

impl ImageCI {

    pub fn new_2d(format: vk::Format, dimension: vk::Extent2D) -> ImageCI {

        ImageCI {
            inner: vk::ImageCreateInfo {
                format,
                extent: vk::Extent3D { width: dimension.width, height: dimension.height, depth: 1 },
                ..ImageCI::default_ci()
            },
            queue_families: None,
        }
    }

    #[inline(always)]
    pub fn usage(mut self, flags: vk::ImageUsageFlags) -> ImageCI {
        self.inner.usage = flags; self
    }

    #[inline(always)]
    pub fn mip_levels(mut self, levels: vkuint) -> ImageCI {
        self.inner.mip_levels = levels; self
    }

    #[inline(always)]
    pub fn array_layers(mut self, layers: vkuint) -> ImageCI {
        self.inner.array_layers = layers; self
    }

    #[inline(always)]
    pub fn samples(mut self, samples: vk::SampleCountFlags) -> ImageCI {
        self.inner.samples = samples; self
    }

    #[inline(always)]
    pub fn tiling(mut self, tiling: vk::ImageTiling) -> ImageCI {
        self.inner.tiling = tiling; self
    }

    #[inline(always)]
    pub fn flags(mut self, flags: vk::ImageCreateFlags) -> ImageCI {
        self.inner.flags = flags; self
    }

    #[inline(always)]
    pub fn initial_layout(mut self, layout: vk::ImageLayout) -> ImageCI {
        self.inner.initial_layout = layout; self
    }

    #[inline(always)]
    pub fn sharing_queues(mut self, families_indices: Vec<vkuint>) -> ImageCI {

        self.inner.queue_family_index_count = families_indices.len() as _;
        self.inner.p_queue_family_indices   = families_indices.as_ptr();

        debug_assert!(self.inner.queue_family_index_count > 1, "The number of shared queue families must be greater than 1!");

        self.queue_families = Some(families_indices);
        self.inner.sharing_mode = vk::SharingMode::CONCURRENT; self
    }
}

impl VkObjectDiscardable for vk::Image {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_image(self, None)
        }
    }
}
// ----------------------------------------------------------------------------------------------


// ----------------------------------------------------------------------------------------------
/// Wrapper class for `vk::ImageViewCreateInfo`.
#[derive(Debug, Clone)]
pub struct ImageViewCI {
    inner: vk::ImageViewCreateInfo,
}

impl VulkanCI<vk::ImageViewCreateInfo> for ImageViewCI {

    fn default_ci() -> vk::ImageViewCreateInfo {

        vk::ImageViewCreateInfo {
            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::ImageViewCreateFlags::empty(),
            image : vk::Image::null(),
            view_type: vk::ImageViewType::TYPE_2D,
            format   : vk::Format::UNDEFINED,
            components: vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            },
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level  : 0,
                level_count     : 1,
                base_array_layer: 0,
                layer_count     : 1,
            },
        }
    }
}

impl AsRef<vk::ImageViewCreateInfo> for ImageViewCI {

    fn as_ref(&self) -> &vk::ImageViewCreateInfo {
        &self.inner
    }
}

impl VkObjectBuildableCI for ImageViewCI {
    type ObjectType = vk::ImageView;

    fn build(&self, device: &VkDevice) -> VkResult<vk::ImageView> {

        let view = unsafe {
            device.logic.handle.create_image_view(self.as_ref(), None)
                .map_err(|_| VkError::create("Image View"))?
        };
        Ok(view)
    }
}

impl ImageViewCI {

    pub fn new(image: vk::Image, view_type: vk::ImageViewType, format: vk::Format) -> ImageViewCI {

        ImageViewCI {
            inner: vk::ImageViewCreateInfo {
                image, view_type, format,
                ..ImageViewCI::default_ci()
            },
        }
    }

    #[inline(always)]
    pub fn subrange(mut self, subrange: vk::ImageSubresourceRange) -> ImageViewCI {
        self.inner.subresource_range = subrange; self
    }

    #[inline(always)]
    pub fn components(mut self, components: vk::ComponentMapping) -> ImageViewCI {
        self.inner.components = components; self
    }
}

impl VkObjectDiscardable for vk::ImageView {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_image_view(self, None)
        }
    }
}
// ----------------------------------------------------------------------------------------------


// ----------------------------------------------------------------------------------------------
/// Wrapper class for `vk::SamplerCreateInfo`.
#[derive(Debug, Clone)]
pub struct SamplerCI {
    inner: vk::SamplerCreateInfo,
}

impl VulkanCI<vk::SamplerCreateInfo> for SamplerCI {

    fn default_ci() -> vk::SamplerCreateInfo {

        vk::SamplerCreateInfo {
            s_type: vk::StructureType::SAMPLER_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::SamplerCreateFlags::empty(),
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            address_mode_u: vk::SamplerAddressMode::REPEAT,
            address_mode_v: vk::SamplerAddressMode::REPEAT,
            address_mode_w: vk::SamplerAddressMode::REPEAT,
            mip_lod_bias: 0.0,
            anisotropy_enable: vk::FALSE,
            max_anisotropy: 1.0,
            compare_enable: vk::FALSE,
            compare_op: vk::CompareOp::ALWAYS,
            min_lod: 0.0,
            max_lod: 0.0,
            border_color: vk::BorderColor::INT_OPAQUE_BLACK,
            unnormalized_coordinates: vk::FALSE,
        }
    }
}

impl AsRef<vk::SamplerCreateInfo> for SamplerCI {

    fn as_ref(&self) -> &vk::SamplerCreateInfo {
        &self.inner
    }
}

impl VkObjectBuildableCI for SamplerCI {
    type ObjectType = vk::Sampler;

    fn build(&self, device: &VkDevice) -> VkResult<vk::Sampler> {

        let sampler = unsafe {
            device.logic.handle.create_sampler(self.as_ref(), None)
                .map_err(|_| VkError::create("Sampler"))?
        };
        Ok(sampler)
    }
}

impl SamplerCI {

    pub fn new() -> SamplerCI {
        SamplerCI { inner: SamplerCI::default_ci() }
    }

    #[inline(always)]
    pub fn filter(mut self, mag: vk::Filter, min: vk::Filter) -> SamplerCI {
        self.inner.mag_filter = mag;
        self.inner.min_filter = min; self
    }

    #[inline(always)]
    pub fn address(mut self, u: vk::SamplerAddressMode, v: vk::SamplerAddressMode, w: vk::SamplerAddressMode) -> SamplerCI {
        self.inner.address_mode_u = u;
        self.inner.address_mode_v = v;
        self.inner.address_mode_w = w; self
    }

    #[inline(always)]
    pub fn anisotropy(mut self, max: f32) -> SamplerCI {
        self.inner.anisotropy_enable = vk::TRUE;
        self.inner.max_anisotropy = max; self
    }
}

impl VkObjectDiscardable for vk::Sampler {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_sampler(self, None)
        }
    }
}
// ----------------------------------------------------------------------------------------------


#[derive(Debug, Clone)]
pub struct ImageBarrierCI {
    ci: vk::ImageMemoryBarrier,
}

impl ImageBarrierCI {

    pub fn new(image: vk::Image, subrange: vk::ImageSubresourceRange) -> ImageBarrierCI {

        let mut barrier = ImageBarrierCI::inner_default();
        barrier.ci.image = image;
        barrier.ci.subresource_range = subrange;

        barrier
    }

    fn inner_default() -> ImageBarrierCI {

        let barrier = vk::ImageMemoryBarrier {
            s_type: vk::StructureType::IMAGE_MEMORY_BARRIER,
            p_next: ptr::null(),
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::empty(),
            old_layout: vk::ImageLayout::UNDEFINED,
            new_layout: vk::ImageLayout::UNDEFINED,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: vk::Image::null(),
            subresource_range: Default::default(),
        };

        ImageBarrierCI { ci: barrier }
    }

    pub(crate) fn build(self) -> vk::ImageMemoryBarrier {
        self.ci
    }

    pub fn access_mask(mut self, from: vk::AccessFlags, to: vk::AccessFlags) -> Self {
        self.ci.src_access_mask = from;
        self.ci.dst_access_mask = to;
        self
    }

    pub fn layout(mut self, from: vk::ImageLayout, to: vk::ImageLayout) -> Self {

        self.ci.old_layout = from;
        self.ci.new_layout = to;
        self
    }

    pub fn queue_family_index(mut self, from: vkuint, to: vkuint) -> Self {

        self.ci.src_queue_family_index = from;
        self.ci.dst_queue_family_index = to;
        self
    }
}

impl From<ImageBarrierCI> for vk::ImageMemoryBarrier {

    fn from(v: ImageBarrierCI) -> vk::ImageMemoryBarrier {
        v.ci
    }
}
