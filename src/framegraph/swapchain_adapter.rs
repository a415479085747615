
//! Binds the swapchain into the frame graph: acquisition hands back a window-handle resource
//! usable like any other transient texture, and presentation is driven by the graph's own
//! final-usage semaphore rather than a caller-supplied one.

use ash::vk;

use crate::context::VkDevice;
use crate::context::instance::VkInstance;
use crate::context::surface::VkSurface;
use crate::context::swapchain::{VkSwapchain, SwapchainConfig, SwapchainSyncError};
use crate::vkuint;

pub struct AcquiredFrame {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub image_index: vkuint,
}

/// Wraps `VkSwapchain`, transparently recreating it when the surface reports
/// `SurfaceOutDate` instead of surfacing that as a fatal error to the executor.
pub struct SwapchainAdapter {
    swapchain: Option<VkSwapchain>,
    config: SwapchainConfig,
}

impl SwapchainAdapter {

    pub fn new(instance: &VkInstance, device: &VkDevice, surface: &VkSurface, config: SwapchainConfig) -> Result<SwapchainAdapter, SwapchainSyncError> {

        let swapchain = VkSwapchain::new(instance, device, surface, config.clone(), None)
            .or(Err(SwapchainSyncError::Unknown))?;

        Ok(SwapchainAdapter { swapchain: Some(swapchain), config })
    }

    fn current(&self) -> &VkSwapchain {
        self.swapchain.as_ref().expect("swapchain adapter never observes its swapchain absent")
    }

    /// Acquire the next presentable image, recreating the swapchain transparently on
    /// `SurfaceOutDate` and retrying exactly once.
    pub fn acquire_next(
        &mut self,
        instance: &VkInstance,
        device: &VkDevice,
        surface: &VkSurface,
        semaphore: vk::Semaphore,
        fence: Option<vk::Fence>,
    ) -> Result<AcquiredFrame, SwapchainSyncError> {

        match self.current().next_image(Some(semaphore), fence) {
            | Ok(index) => Ok(self.frame_at(index)),
            | Err(SwapchainSyncError::SurfaceOutDate) => {
                self.recreate(instance, device, surface)?;
                let index = self.current().next_image(Some(semaphore), fence)?;
                Ok(self.frame_at(index))
            },
            | Err(other) => Err(other),
        }
    }

    fn frame_at(&self, index: vkuint) -> AcquiredFrame {
        AcquiredFrame {
            image: self.current().image_at(index as usize),
            view: self.current().view_at(index as usize),
            image_index: index,
        }
    }

    pub fn present(
        &mut self,
        instance: &VkInstance,
        device: &VkDevice,
        surface: &VkSurface,
        wait_semaphores: &[vk::Semaphore],
        image_index: vkuint,
    ) -> Result<(), SwapchainSyncError> {

        match self.current().present(device, wait_semaphores, image_index) {
            | Ok(()) => Ok(()),
            | Err(SwapchainSyncError::SurfaceOutDate) | Err(SwapchainSyncError::SubOptimal) => {
                self.recreate(instance, device, surface)
            },
            | Err(other) => Err(other),
        }
    }

    fn recreate(&mut self, instance: &VkInstance, device: &VkDevice, surface: &VkSurface) -> Result<(), SwapchainSyncError> {

        log::info!("swapchain out of date, recreating");

        let old = self.swapchain.take();
        let fresh = VkSwapchain::new(instance, device, surface, self.config.clone(), old)
            .or(Err(SwapchainSyncError::Unknown))?;

        self.swapchain = Some(fresh);
        Ok(())
    }

    pub fn format(&self) -> vk::Format {
        self.current().format()
    }

    pub fn dimension(&self) -> vk::Extent2D {
        self.current().dimension()
    }

    pub fn image_count(&self) -> usize {
        self.current().image_count()
    }

    pub fn discard(&mut self, device: &VkDevice) {
        if let Some(swapchain) = self.swapchain.take() {
            swapchain.discard(device);
        }
    }
}
