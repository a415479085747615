
//! Recyclable pools for the synchronisation primitives and descriptor sets the executor hands
//! out each frame.

use ash::vk;
use ash::version::DeviceV1_0;

use crate::context::VkDevice;
use crate::error::{VkResult, VkError};
use crate::framegraph::config::{DescriptorPoolConfig, SyncPoolConfig};

/// Number of fresh handles to create when every pooled entry is in flight and `growth_factor`
/// rounds down to zero (pool is still small).
const MIN_GROWTH: usize = 1;

fn growth_amount(current_len: usize, config: &SyncPoolConfig) -> usize {
    let grown = (current_len as f32 * (config.growth_factor - 1.0)).ceil() as usize;
    grown.max(MIN_GROWTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Free,
    InFlight { frame: u64 },
}

struct PooledEvent {
    handle: vk::Event,
    state: PoolState,
}

/// Recycles `vk::Event`s across frames instead of creating/destroying one per cross-encoder
/// dependency; an event is only safe to reuse once the frame that last signalled it has
/// completed on the device.
pub struct EventPool {
    config: SyncPoolConfig,
    events: Vec<PooledEvent>,
}

impl EventPool {

    pub fn new(config: SyncPoolConfig) -> EventPool {
        EventPool { events: Vec::with_capacity(config.initial_capacity), config }
    }

    pub fn acquire(&mut self, device: &VkDevice, current_frame: u64) -> VkResult<vk::Event> {

        if let Some(entry) = self.events.iter_mut().find(|e| e.state == PoolState::Free) {
            entry.state = PoolState::InFlight { frame: current_frame };
            return Ok(entry.handle);
        }

        let grow_by = growth_amount(self.events.len(), &self.config);
        log::debug!("event pool exhausted at {} entries, growing by {}", self.events.len(), grow_by);

        let create_info = vk::EventCreateInfo {
            s_type: vk::StructureType::EVENT_CREATE_INFO,
            p_next: std::ptr::null(),
            flags: vk::EventCreateFlags::empty(),
        };

        let mut acquired = None;
        for i in 0..grow_by {
            let handle = unsafe {
                device.logic.handle.create_event(&create_info, None)
                    .map_err(|_| VkError::create("Event"))?
            };
            let state = if i == 0 { PoolState::InFlight { frame: current_frame } } else { PoolState::Free };
            if i == 0 { acquired = Some(handle); }
            self.events.push(PooledEvent { handle, state });
        }

        Ok(acquired.expect("grow_by is always >= MIN_GROWTH"))
    }

    /// Release every event signalled during `completed_frame` (or earlier) back to the free list.
    pub fn retire(&mut self, completed_frame: u64) {
        for entry in self.events.iter_mut() {
            if let PoolState::InFlight { frame } = entry.state {
                if frame <= completed_frame {
                    entry.state = PoolState::Free;
                }
            }
        }
    }

    pub fn destroy(&mut self, device: &VkDevice) {
        for entry in self.events.drain(..) {
            unsafe { device.logic.handle.destroy_event(entry.handle, None); }
        }
    }
}

struct PooledSemaphore {
    handle: vk::Semaphore,
    state: PoolState,
}

/// Recycles binary semaphores used for cross-queue-family and acquire/present synchronisation.
pub struct SemaphorePool {
    config: SyncPoolConfig,
    semaphores: Vec<PooledSemaphore>,
}

impl SemaphorePool {

    pub fn new(config: SyncPoolConfig) -> SemaphorePool {
        SemaphorePool { semaphores: Vec::with_capacity(config.initial_capacity), config }
    }

    pub fn acquire(&mut self, device: &VkDevice, current_frame: u64) -> VkResult<vk::Semaphore> {

        if let Some(entry) = self.semaphores.iter_mut().find(|e| e.state == PoolState::Free) {
            entry.state = PoolState::InFlight { frame: current_frame };
            return Ok(entry.handle);
        }

        let grow_by = growth_amount(self.semaphores.len(), &self.config);
        log::debug!("semaphore pool exhausted at {} entries, growing by {}", self.semaphores.len(), grow_by);

        let create_info = vk::SemaphoreCreateInfo {
            s_type: vk::StructureType::SEMAPHORE_CREATE_INFO,
            p_next: std::ptr::null(),
            flags: vk::SemaphoreCreateFlags::empty(),
        };

        let mut acquired = None;
        for i in 0..grow_by {
            let handle = unsafe {
                device.logic.handle.create_semaphore(&create_info, None)
                    .map_err(|_| VkError::create("Semaphore"))?
            };
            let state = if i == 0 { PoolState::InFlight { frame: current_frame } } else { PoolState::Free };
            if i == 0 { acquired = Some(handle); }
            self.semaphores.push(PooledSemaphore { handle, state });
        }

        Ok(acquired.expect("grow_by is always >= MIN_GROWTH"))
    }

    pub fn retire(&mut self, completed_frame: u64) {
        for entry in self.semaphores.iter_mut() {
            if let PoolState::InFlight { frame } = entry.state {
                if frame <= completed_frame {
                    entry.state = PoolState::Free;
                }
            }
        }
    }

    pub fn destroy(&mut self, device: &VkDevice) {
        for entry in self.semaphores.drain(..) {
            unsafe { device.logic.handle.destroy_semaphore(entry.handle, None); }
        }
    }
}

struct ChainedPool {
    handle: vk::DescriptorPool,
    allocated_sets: u32,
    capacity: u32,
}

/// A growable chain of descriptor pools: allocation tries the newest pool first and only opens
/// a fresh one when the current pool reports it is exhausted or fragmented.
pub struct DescriptorPoolChain {
    config: DescriptorPoolConfig,
    pools: Vec<ChainedPool>,
}

impl DescriptorPoolChain {

    pub fn new(config: DescriptorPoolConfig) -> DescriptorPoolChain {
        DescriptorPoolChain { config, pools: Vec::new() }
    }

    fn open_new_pool(&mut self, device: &VkDevice) -> VkResult<()> {

        let create_info = vk::DescriptorPoolCreateInfo {
            s_type: vk::StructureType::DESCRIPTOR_POOL_CREATE_INFO,
            p_next: std::ptr::null(),
            flags: vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET,
            max_sets: self.config.max_sets,
            pool_size_count: self.config.pool_sizes.len() as _,
            p_pool_sizes: self.config.pool_sizes.as_ptr(),
        };

        let handle = unsafe {
            device.logic.handle.create_descriptor_pool(&create_info, None)
                .map_err(|_| VkError::create("Descriptor Pool"))?
        };

        log::debug!("descriptor pool chain growing: opening pool #{} (max_sets={})", self.pools.len(), self.config.max_sets);

        self.pools.push(ChainedPool { handle, allocated_sets: 0, capacity: self.config.max_sets });
        Ok(())
    }

    pub fn allocate(&mut self, device: &VkDevice, layouts: &[vk::DescriptorSetLayout]) -> VkResult<Vec<vk::DescriptorSet>> {

        if self.pools.is_empty() {
            self.open_new_pool(device)?;
        }

        loop {

            let pool_index = self.pools.len() - 1;
            let pool_handle = self.pools[pool_index].handle;

            let alloc_info = vk::DescriptorSetAllocateInfo {
                s_type: vk::StructureType::DESCRIPTOR_SET_ALLOCATE_INFO,
                p_next: std::ptr::null(),
                descriptor_pool: pool_handle,
                descriptor_set_count: layouts.len() as _,
                p_set_layouts: layouts.as_ptr(),
            };

            match unsafe { device.logic.handle.allocate_descriptor_sets(&alloc_info) } {
                | Ok(sets) => {
                    self.pools[pool_index].allocated_sets += layouts.len() as u32;
                    return Ok(sets);
                },
                | Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                    self.open_new_pool(device)?;
                },
                | Err(_) => return Err(VkError::device("Allocate DescriptorSet")),
            }
        }
    }

    pub fn reset(&mut self, device: &VkDevice) -> VkResult<()> {
        for pool in self.pools.iter_mut() {
            unsafe {
                device.logic.handle.reset_descriptor_pool(pool.handle, vk::DescriptorPoolResetFlags::empty())
                    .map_err(|_| VkError::device("Reset DescriptorPool"))?;
            }
            pool.allocated_sets = 0;
        }
        Ok(())
    }

    pub fn destroy(&mut self, device: &VkDevice) {
        for pool in self.pools.drain(..) {
            unsafe { device.logic.handle.destroy_descriptor_pool(pool.handle, None); }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_state_free_after_retire() {
        let mut entry = PooledEvent { handle: vk::Event::null(), state: PoolState::InFlight { frame: 3 } };
        if let PoolState::InFlight { frame } = entry.state {
            if frame <= 3 {
                entry.state = PoolState::Free;
            }
        }
        assert_eq!(entry.state, PoolState::Free);
    }

    #[test]
    fn growth_amount_never_zero_on_empty_pool() {
        let config = SyncPoolConfig { initial_capacity: 4, growth_factor: 1.5 };
        assert_eq!(growth_amount(0, &config), MIN_GROWTH);
    }

    #[test]
    fn growth_amount_scales_with_current_size() {
        let config = SyncPoolConfig { initial_capacity: 4, growth_factor: 2.0 };
        assert_eq!(growth_amount(4, &config), 4);
        assert_eq!(growth_amount(10, &config), 10);
    }

    #[test]
    fn growth_amount_rounds_up_fractional_growth() {
        let config = SyncPoolConfig { initial_capacity: 4, growth_factor: 1.5 };
        // 4 * 0.5 = 2.0 exactly, 5 * 0.5 = 2.5 rounds up to 3.
        assert_eq!(growth_amount(4, &config), 2);
        assert_eq!(growth_amount(5, &config), 3);
    }
}
