
use ash::vk;
use ash::version::DeviceV1_0;

use crate::context::VkDevice;
use crate::ci::VulkanCI;
use crate::error::{VkResult, VkError};

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::SemaphoreCreateInfo.
#[derive(Debug, Clone)]
pub struct SemaphoreCI {
    ci: vk::SemaphoreCreateInfo,
}

impl VulkanCI<vk::SemaphoreCreateInfo> for SemaphoreCI {

    fn default_ci() -> vk::SemaphoreCreateInfo {

        vk::SemaphoreCreateInfo {
            s_type: vk::StructureType::SEMAPHORE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::SemaphoreCreateFlags::empty(),
        }
    }
}

impl AsRef<vk::SemaphoreCreateInfo> for SemaphoreCI {

    fn as_ref(&self) -> &vk::SemaphoreCreateInfo {
        &self.ci
    }
}

impl SemaphoreCI {

    pub fn new() -> SemaphoreCI {
        SemaphoreCI { ci: SemaphoreCI::default_ci() }
    }

    pub fn build(&self, device: &VkDevice) -> VkResult<vk::Semaphore> {

        let semaphore = unsafe {
            device.logic.handle.create_semaphore(self.as_ref(), None)
                .map_err(|_| VkError::create("Semaphore"))?
        };
        Ok(semaphore)
    }
}
// ----------------------------------------------------------------------------------------------


// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::FenceCreateInfo.
#[derive(Debug, Clone)]
pub struct FenceCI {
    ci: vk::FenceCreateInfo,
}

impl VulkanCI<vk::FenceCreateInfo> for FenceCI {

    fn default_ci() -> vk::FenceCreateInfo {

        vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::FenceCreateFlags::empty(),
        }
    }
}

impl AsRef<vk::FenceCreateInfo> for FenceCI {

    fn as_ref(&self) -> &vk::FenceCreateInfo {
        &self.ci
    }
}

impl FenceCI {

    /// `is_signed` sets whether the fence is created in the already-signalled state
    /// (useful for the very first wait on a per-frame-in-flight fence).
    pub fn new(is_signed: bool) -> FenceCI {

        let flags = if is_signed { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };

        FenceCI {
            ci: vk::FenceCreateInfo {
                flags,
                ..FenceCI::default_ci()
            }
        }
    }

    pub fn build(&self, device: &VkDevice) -> VkResult<vk::Fence> {

        let fence = unsafe {
            device.logic.handle.create_fence(self.as_ref(), None)
                .map_err(|_| VkError::create("Fence"))?
        };
        Ok(fence)
    }
}
// ----------------------------------------------------------------------------------------------


// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::EventCreateInfo.
///
/// Events back up the compactor's cross-encoder, same-queue dependency strategy (signal in one
/// encoder, wait in a later one) — see the command-compaction "event phase".
#[derive(Debug, Clone)]
pub struct EventCI {
    ci: vk::EventCreateInfo,
}

impl VulkanCI<vk::EventCreateInfo> for EventCI {

    fn default_ci() -> vk::EventCreateInfo {

        vk::EventCreateInfo {
            s_type: vk::StructureType::EVENT_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::EventCreateFlags::empty(),
        }
    }
}

impl AsRef<vk::EventCreateInfo> for EventCI {

    fn as_ref(&self) -> &vk::EventCreateInfo {
        &self.ci
    }
}

impl EventCI {

    pub fn new() -> EventCI {
        EventCI { ci: EventCI::default_ci() }
    }

    pub fn build(&self, device: &VkDevice) -> VkResult<vk::Event> {

        let event = unsafe {
            device.logic.handle.create_event(self.as_ref(), None)
                .map_err(|_| VkError::create("Event"))?
        };
        Ok(event)
    }
}
// ----------------------------------------------------------------------------------------------
