//! 交互式种子分割驱动.
//!
//! 笔画涂抹种子, `connect()` 编排一次 (或一次增量) IFT 运行,
//! LiveWire 后处理把掩码边界转成可编辑的锚点轮廓.

mod connect;
mod draw;
mod livewire;
mod tool;

pub use connect::PathFunctionKind;
pub use draw::{DrawType, RedrawThrottle, StrokeButton};
pub use tool::{GradientKind, SegImage, SegmentationTool};
