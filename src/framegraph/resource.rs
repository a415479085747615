
pub mod handle;
pub mod descriptor;
pub mod active_range;
pub mod usage;

pub use self::handle::{ResourceHandle, ResourceKind, HandleFlags};
pub use self::descriptor::{BufferDescriptor, TextureDescriptor, StorageMode, CpuCacheMode};
pub use self::active_range::ActiveRange;
pub use self::usage::{ResourceUsage, UsageType};
