
pub mod pipeline;
pub mod device;
pub mod image;
pub mod buffer;
pub mod memory;
pub mod command;
pub mod sync;
pub mod vma;


use crate::context::VkDevice;
use crate::VkResult;

pub trait VulkanCI<T> {

    fn default_ci() -> T;
}

pub trait VkObjectBuildableCI {
    type ObjectType;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType>;
}
