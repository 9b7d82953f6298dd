use super::connect::Runtime;
use super::draw::{DrawType, RedrawThrottle};
use super::livewire::LiveWireState;
use crate::filter::{gradient_morphological, gradient_sobel};
use crate::grid::{render_overlay, OverlayStyle};
use crate::{CompactGridMap, GridMap, Idx2d};
use either::Either;
use image::RgbaImage;

/// 活动数值表示下的灰度图: 整数或浮点.
pub type SegImage = Either<GridMap<i32>, GridMap<f32>>;

/// 梯度滤波选择.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GradientKind {
    /// 形态学梯度 (默认).
    Morphological,

    /// Sobel 幅值.
    Sobel,
}

/// 交互式种子分割工具.
///
/// 种子图与掩码在工具生命周期内持续存在, 只被笔画操作和
/// `connect()` 修改; 队列与路径函数在增量重跑之间保留.
pub struct SegmentationTool {
    pub(crate) image: SegImage,
    pub(crate) seeds: GridMap<i32>,
    pub(crate) label: GridMap<i32>,
    pub(crate) mask: GridMap<i32>,
    pub(crate) grad: Option<SegImage>,
    pub(crate) grad_kind: GradientKind,
    pub(crate) grad_ready: bool,

    pub(crate) alpha: f64,
    pub(crate) beta: f64,
    pub(crate) thickness: usize,
    pub(crate) draw_type: DrawType,
    pub(crate) seeds_visible: bool,
    pub(crate) mask_visible: bool,

    /// 四个显示轴的重绘脏标记.
    pub(crate) need_update: [bool; 4],
    pub(crate) overlays: [Option<RgbaImage>; 4],
    pub(crate) throttle: RedrawThrottle,

    pub(crate) drawing: bool,
    pub(crate) last_point: Option<Idx2d>,

    pub(crate) runtime: Option<Runtime>,
    pub(crate) livewire: Option<LiveWireState>,

    /// 诊断转储开关.
    pub dump_maps: bool,
}

impl SegmentationTool {
    /// 以一张灰度图构建.
    pub fn new(image: SegImage) -> Self {
        let shape = match &image {
            Either::Left(img) => img.shape(),
            Either::Right(img) => img.shape(),
        };
        Self {
            image,
            seeds: GridMap::filled(shape, 0),
            label: GridMap::filled(shape, 0),
            mask: GridMap::filled(shape, 0),
            grad: None,
            grad_kind: GradientKind::Morphological,
            grad_ready: false,
            alpha: 0.0,
            beta: 0.5,
            thickness: 0,
            draw_type: DrawType::Object,
            seeds_visible: true,
            mask_visible: true,
            need_update: [true; 4],
            overlays: [None, None, None, None],
            throttle: RedrawThrottle::default(),
            drawing: false,
            last_point: None,
            runtime: None,
            livewire: None,
            dump_maps: false,
        }
    }

    /// 图像形状.
    pub fn shape(&self) -> Idx2d {
        self.seeds.shape()
    }

    /// 借用种子图.
    pub fn get_seeds(&self) -> &GridMap<i32> {
        &self.seeds
    }

    /// 借用最近一次 `connect()` 的标签图.
    pub fn get_label_map(&self) -> &GridMap<i32> {
        &self.label
    }

    /// 借用掩码 (标签减去其腐蚀的边界带).
    pub fn get_mask(&self) -> &GridMap<i32> {
        &self.mask
    }

    /// 掩码是否非空.
    pub fn has_mask(&self) -> bool {
        self.mask.contains(1)
    }

    /// 是否已有保留的增量运行状态.
    pub fn is_initiated(&self) -> bool {
        self.runtime.is_some()
    }

    /// alpha (边界取向强度, 符号选择内向/外向).
    pub fn get_alpha(&self) -> f64 {
        self.alpha
    }

    /// 设置 alpha.
    pub fn set_alpha(&mut self, value: f64) {
        self.alpha = value;
    }

    /// beta (测地项指数).
    pub fn get_beta(&self) -> f64 {
        self.beta
    }

    /// 设置 beta.
    pub fn set_beta(&mut self, value: f64) {
        self.beta = value;
    }

    /// 笔画粗细 (种子膨胀半径).
    pub fn set_thickness(&mut self, value: usize) {
        self.thickness = value;
    }

    /// 当前笔画类型.
    pub fn get_draw_type(&self) -> DrawType {
        self.draw_type
    }

    /// 设置笔画类型.
    pub fn set_draw_type(&mut self, draw_type: DrawType) {
        self.draw_type = draw_type;
    }

    /// 切换种子层可见性. 只影响叠加层渲染, 不触碰数据.
    pub fn set_seeds_visibility(&mut self, visible: bool) {
        self.seeds_visible = visible;
        self.mark_all_dirty();
    }

    /// 切换掩码层可见性. 只影响叠加层渲染, 不触碰数据.
    pub fn set_mask_visibility(&mut self, visible: bool) {
        self.mask_visible = visible;
        self.mark_all_dirty();
    }

    /// 种子层是否可见.
    pub fn get_seeds_visible(&self) -> bool {
        self.seeds_visible
    }

    /// 掩码层是否可见.
    pub fn get_mask_visible(&self) -> bool {
        self.mask_visible
    }

    /// 选择梯度滤波. 变更会使增量状态失效, 下次 `connect()` 全量重算.
    pub fn set_gradient_kind(&mut self, kind: GradientKind) {
        if self.grad_kind != kind {
            self.grad_kind = kind;
            self.grad_ready = false;
            self.runtime = None;
        }
    }

    /// 当前梯度滤波.
    pub fn get_gradient_kind(&self) -> GradientKind {
        self.grad_kind
    }

    /// 最近一次后处理放置的锚点位置 (平铺索引).
    pub fn anchor_positions(&self) -> &[usize] {
        self.livewire
            .as_ref()
            .map(|lw| lw.anchors.as_slice())
            .unwrap_or(&[])
    }

    /// 渲染 `axis` 轴的显示叠加层 (种子绿/蓝, 掩码红).
    ///
    /// 脏标记未置位时返回缓存. `axis` 超出 0..4 时 panic.
    pub fn get_label(&mut self, axis: usize) -> &RgbaImage {
        assert!(axis < 4, "非法显示轴: {axis}");
        if self.need_update[axis] || self.overlays[axis].is_none() {
            self.overlays[axis] = Some(render_overlay(
                &self.seeds,
                &self.mask,
                self.seeds_visible,
                self.mask_visible,
                OverlayStyle::default(),
            ));
            self.need_update[axis] = false;
        }
        self.overlays[axis].as_ref().unwrap()
    }

    /// 获取种子图的压缩快照.
    pub fn snapshot_seeds(&self) -> CompactGridMap {
        self.seeds.compress()
    }

    /// 从快照恢复种子图. 形状不符时 panic.
    pub fn restore_seeds(&mut self, snapshot: &CompactGridMap) {
        assert_eq!(snapshot.shape(), self.shape(), "快照形状不符");
        self.seeds = snapshot.decompress();
        self.mark_all_dirty();
    }

    pub(crate) fn mark_all_dirty(&mut self) {
        self.need_update = [true; 4];
    }

    /// 按需重算梯度.
    pub(crate) fn ensure_gradient(&mut self) {
        if self.grad_ready {
            return;
        }
        self.grad = Some(match (&self.image, self.grad_kind) {
            (Either::Left(img), GradientKind::Morphological) => {
                Either::Left(gradient_morphological(img))
            }
            (Either::Left(img), GradientKind::Sobel) => Either::Left(gradient_sobel(img)),
            (Either::Right(img), GradientKind::Morphological) => {
                Either::Right(gradient_morphological(img))
            }
            (Either::Right(img), GradientKind::Sobel) => Either::Right(gradient_sobel(img)),
        });
        self.grad_ready = true;
        self.runtime = None;
        if self.dump_maps {
            match self.grad.as_ref().unwrap() {
                Either::Left(g) => crate::dump::dump_map(g, "ift_berry_grad"),
                Either::Right(g) => crate::dump::dump_map_f32(g, "ift_berry_grad"),
            }
        }
    }
}
