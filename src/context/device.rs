
mod physical;
mod logical;
mod queue;

pub use self::physical::{VkPhysicalDevice, PhysicalDevConfig};
pub use self::logical::{VkLogicalDevice, LogicDevConfig, VkQueue, QueryFamilies};

use parking_lot::Mutex;

use crate::context::instance::VkInstance;
use crate::error::{VkResult, VkError, VkErrorKind};

/// Wrapper holding the logical/physical device pair plus the VMA allocator bound to them.
///
/// `vma` is declared before `logic`/`phy` so that, should this value ever be dropped without
/// an explicit `discard()` call, the allocator's fields are torn down first.
pub struct VkDevice {

    pub vma   : Mutex<vma::Allocator>,
    pub logic : VkLogicalDevice,
    pub phy   : VkPhysicalDevice,
}

impl VkDevice {

    pub(crate) fn new(instance: &VkInstance, phy: VkPhysicalDevice, logic: VkLogicalDevice) -> VkResult<VkDevice> {

        let vma_ci = vma::AllocatorCreateInfo {
            physical_device: phy.handle,
            device: logic.handle.clone(),
            instance: instance.handle.clone(),
            flags: vma::AllocatorCreateFlags::NONE,
            preferred_large_heap_block_size: 0,
            frame_in_use_count: 0,
            heap_size_limits: None,
        };

        let vma = vma::Allocator::new(&vma_ci)
            .map_err(|e| VkError::from(VkErrorKind::Vma(e)))?;

        Ok(VkDevice { vma: Mutex::new(vma), logic, phy })
    }

    pub fn discard(&self) {

        unsafe {
            self.vma.lock().destroy();
        }
        self.logic.discard();
    }
}
