
/// Configuration for the frame-graph compiler and executor.
///
/// Follows the same plain-data-plus-`Default` pattern as `LogicDevConfig`/`PhysicalDevConfig`/
/// `SwapchainConfig`; consumed through a `with_framegraph_config` builder method.
#[derive(Debug, Clone)]
pub struct FrameGraphConfig {

    /// number of frames allowed to be in flight on the GPU at once.
    pub frames_in_flight: usize,
    /// whether same-size-class transient resources may alias the same memory block.
    pub enable_aliasing: bool,
    /// whether adjacent pipeline barriers are allowed to be merged across encoder boundaries.
    pub merge_cross_encoder_barriers: bool,
}

impl Default for FrameGraphConfig {

    fn default() -> FrameGraphConfig {

        FrameGraphConfig {
            frames_in_flight: 2,
            enable_aliasing: false,
            merge_cross_encoder_barriers: true,
        }
    }
}

/// Configuration for `EventPool`/`SemaphorePool` growth.
#[derive(Debug, Clone, Copy)]
pub struct SyncPoolConfig {

    pub initial_capacity: usize,
    pub growth_factor: f32,
}

impl Default for SyncPoolConfig {

    fn default() -> SyncPoolConfig {
        SyncPoolConfig { initial_capacity: 4, growth_factor: 1.5 }
    }
}

/// Configuration for `DescriptorPoolChain`.
#[derive(Debug, Clone)]
pub struct DescriptorPoolConfig {

    pub pool_sizes: Vec<ash::vk::DescriptorPoolSize>,
    pub max_sets: u32,
}

impl Default for DescriptorPoolConfig {

    fn default() -> DescriptorPoolConfig {

        use ash::vk;

        DescriptorPoolConfig {
            pool_sizes: vec![
                vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: 128 },
                vk::DescriptorPoolSize { ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER, descriptor_count: 128 },
                vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER, descriptor_count: 64 },
                vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_IMAGE, descriptor_count: 64 },
            ],
            max_sets: 128,
        }
    }
}
