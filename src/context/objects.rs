
use crate::context::VkDevice;
use crate::error::VkResult;
use crate::vkbytes;

/// Represent Vulkan Object used during the whole runtime of application.
///
/// These objects must be initialized and destroyed in a specific order, so they have to be destroyed manually.
pub trait VkBackendObject {

    unsafe fn discard(&self);
}

/// A device-owned object created directly through a `vkCreateXxx` call (no separate memory
/// allocation/binding step), destroyed through the matching `vkDestroyXxx`.
pub trait VulkanObject
    where
        Self: Sized {

    fn discard(self, device: &VkDevice);
}

/// A device-owned object produced by a CI-builder's `.build(device)` call, mirroring `VulkanObject`
/// but kept distinct so render-pass/pipeline/framebuffer objects read as their own family at call sites.
pub trait VkObjectCreatable
    where
        Self: Sized {

    fn discard(self, device: &VkDevice);
}

/// An object that owns no memory of its own and is destroyed without going through the allocator
/// (e.g. `vk::Buffer`/`vk::Image` handles created via a raw `vkCreateXxx`, prior to `VmaResourceDiscardable`
/// taking over once the handle is wrapped by the allocator).
pub trait VkObjectDiscardable
    where
        Self: Sized {

    fn discard_by(self, device: &VkDevice);
}

/// An object that must be bound to a `vk::DeviceMemory` range before use.
pub trait VkObjectBindable
    where
        Self: Sized {

    fn bind(self, device: &VkDevice, memory: ash::vk::DeviceMemory, offset: vkbytes) -> VkResult<()>;
}

/// A `vma::Allocator`-owned resource (buffer or image), destroyed through the allocator rather
/// than a raw `vkDestroyXxx` call so its backing memory is released too.
pub trait VmaResourceDiscardable
    where
        Self: Sized {

    fn discard_by(self, vma: &mut vma::Allocator) -> VkResult<()>;
}

/// An object produced by a `vk::SubmitInfo`/`SubmitCI`, submitted to a queue against a fence.
pub trait VkSubmitCI {

    fn submit(self, device: &VkDevice, queue: ash::vk::Queue, wait_fence: ash::vk::Fence) -> VkResult<()>;
}
