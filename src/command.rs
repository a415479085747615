
pub mod recorder;
pub mod graphics;
pub mod compute;
pub mod transfer;

use ash::vk;

pub use self::recorder::VkCmdRecorder;
pub use self::graphics::{IGraphics, CmdGraphicsApi};
pub use self::compute::{ICompute, CmdComputeApi};
pub use self::transfer::{ITransfer, CmdTransferApi};

pub trait VkCommandType {
    const BIND_POINT: vk::PipelineBindPoint;
}
