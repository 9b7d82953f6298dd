#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供基于图像森林变换 (Image Forest Transform, IFT)
//! 的交互式种子分割与 LiveWire 边界精化算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 将来可能为部分高性能场景关键路径提供 `unsafe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 只负责分割核心 (队列/路径函数/森林生长/交互驱动),
//!   不负责图像文件读写和任何 GUI 组件. 调用方以典型灰度图
//!   (整数或浮点) 和鼠标事件坐标作为输入.
//! 2. 在非期望情况下 (明确的编程错误), 程序会直接 panic 或返回逻辑错误,
//!   而不会导致内存错误. As what Rust promises.
//!
//! # 开发计划
//!
//! ### 桶队列族 ✅
//!
//! 增长式 (权值范围未知)、定界快速式 (严格 O(1))、旋转式 (LiveWire 专用)
//! 三种桶队列, 共享同一套侵入式双向链表节点布局.
//!
//! 实现位于 `ift-berry/src/queue`.
//!
//! ### 路径函数族 ✅
//!
//! Max (分水岭), Sum (模糊连接), 测地约束 (测地星凸), 定向内/外,
//! LiveWire 受限弧搜索. 统一策略接口, 按可用映射一次性选择更新变体.
//!
//! 实现位于 `ift-berry/src/path`.
//!
//! ### 森林生长控制循环 ✅
//!
//! `DegeneratedIft` (无邻接全图松弛) 与 `ImageIft` (邻接驱动, 支持
//! 提前终止元素). 实现位于 `ift-berry/src/ift.rs`.
//!
//! ### 交互分割驱动 ✅
//!
//! 种子笔画栅格化, `connect()` 全量/增量编排, 掩码提取.
//!
//! 实现位于 `ift-berry/src/seg`.
//!
//! ### LiveWire 后处理 ✅
//!
//! 轮廓跟踪, 锚点放置, 受限逐弧最短路与锚点拖动增量重算.
//!
//! 实现位于 `ift-berry/src/seg/livewire.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 提供压缩快照以支持种子图的备份与恢复. ✅
//! 2. 合成测试图像 (圆盘/渐变). ✅
//! 3. 显示叠加层渲染与诊断转储. ✅

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 典型灰度图基础数据结构.
mod grid;

pub use grid::{CompactGridMap, GridMap, OverlayStyle};

pub mod consts;

mod error;

pub use error::{IftError, QueueError, SegError};

pub mod adjacency;

pub mod filter;

pub mod queue;

pub mod path;

pub mod ift;

pub mod seg;

pub mod phantom;

pub mod dump;

pub mod prelude;
