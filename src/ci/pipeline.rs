
pub mod renderpass;

pub use self::renderpass::{RenderPassBI, RenderPassCI};
