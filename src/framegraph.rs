
//! Frame-graph compiler: resource timelines, image layout tracking, render-pass fusion,
//! and synchronisation-command generation/compaction for the Vulkan backend.

pub mod config;
pub mod subresource;
pub mod resource;
pub mod layout_tracker;
pub mod registry;
pub mod render_target;
pub mod render_pass_builder;
pub mod resource_command;
pub mod compactor;
pub mod pools;
pub mod swapchain_adapter;
pub mod executor;

pub use self::config::FrameGraphConfig;
pub use self::subresource::SubresourceMask;
pub use self::layout_tracker::ImageLayoutTracker;
pub use self::executor::FrameGraphExecutor;
