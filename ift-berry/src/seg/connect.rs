use super::tool::SegmentationTool;
use crate::adjacency::Adjacency;
use crate::consts::{LABEL_OBJECT, MIN_ANCHORS};
use crate::filter::erode_bin;
use crate::ift::ImageIft;
use crate::path::{
    CostScalar, ForestMaps, GeodesicRestrictionPathFunction, MaxPathFunction,
    OrientedExternPathFunction, OrientedInternPathFunction, PathFunction, SumPathFunction,
};
use crate::queue::{BucketQueue, GrowingBucketQueue, RemovalOrder, TieBreak};
use crate::{GridMap, Idx2d, IftError, SegError};
use either::Either;

/// 可选的路径函数策略.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PathFunctionKind {
    /// 测地星凸 (两遍: 测地距离场 + 定向边代价).
    GeodesicStar,

    /// 分水岭 (Max 路径函数).
    Watershed,

    /// 模糊连接 (Sum 路径函数).
    FuzzySum,
}

/// 测地星凸第二遍的取向变体, 由 alpha 的符号选定.
enum Pass2<D> {
    Extern(OrientedExternPathFunction<D>),
    Intern(OrientedInternPathFunction<D>),
}

impl<D: CostScalar + std::ops::Add<Output = D>> Pass2<D> {
    fn maps(&self) -> &ForestMaps<D> {
        match self {
            Self::Extern(pf) => pf.maps(),
            Self::Intern(pf) => pf.maps(),
        }
    }

    fn maps_mut(&mut self) -> &mut ForestMaps<D> {
        match self {
            Self::Extern(pf) => pf.maps_mut(),
            Self::Intern(pf) => pf.maps_mut(),
        }
    }

    fn into_maps(self) -> ForestMaps<D> {
        match self {
            Self::Extern(pf) => pf.into_maps(),
            Self::Intern(pf) => pf.into_maps(),
        }
    }
}

/// 单个数值表示下的策略与映射.
enum PolicyState<D> {
    Watershed(MaxPathFunction<D>),
    FuzzySum(SumPathFunction<D>),
    GeodesicStar {
        pass1: GeodesicRestrictionPathFunction<D>,
        pass2: Pass2<D>,
    },
}

/// 跨 `connect()` 调用保留的引擎状态.
///
/// 同一策略与梯度下的重复调用切换到增量传播,
/// 只重新初始化种子, 其余像素保留既有定型值.
pub(crate) struct EngineState<D> {
    kind: PathFunctionKind,
    alpha: f64,
    beta: f64,
    shape: Idx2d,
    adj: Adjacency,
    queue: GrowingBucketQueue,
    policy: PolicyState<D>,
}

/// 活动数值表示的引擎状态.
pub(crate) type Runtime = Either<EngineState<i32>, EngineState<f32>>;

/// 把对象/背景种子写进映射并排队:
/// 标签置 1/0, 代价清零, 以零权值入队.
fn init_seeds<D: CostScalar, Q: BucketQueue>(
    maps: &mut ForestMaps<D>,
    queue: &mut Q,
    obj_seeds: &[usize],
    bkg_seeds: &[usize],
) -> Result<(), IftError> {
    for (&elm, lbl) in obj_seeds
        .iter()
        .map(|e| (e, LABEL_OBJECT))
        .chain(bkg_seeds.iter().map(|e| (e, 0)))
    {
        if let Some(label) = maps.label.as_mut() {
            label[elm] = lbl;
        }
        maps.value[elm] = D::from_weight(0.0);
        queue.insert(elm, 0.0)?;
    }
    Ok(())
}

fn run_ift<P: PathFunction, Q: BucketQueue>(
    pf: &mut P,
    adj: &Adjacency,
    shape: Idx2d,
    queue: &mut Q,
) -> Result<(), IftError> {
    ImageIft::new(pf, adj, shape, queue)?.run()
}

impl<D: CostScalar + std::ops::Add<Output = D>> EngineState<D> {
    /// 全量初始化并运行一遍.
    fn full_init(
        kind: PathFunctionKind,
        image: &GridMap<D>,
        grad: &GridMap<D>,
        alpha: f64,
        beta: f64,
        obj_seeds: &[usize],
        bkg_seeds: &[usize],
    ) -> Result<Self, SegError> {
        let shape = image.shape();
        let size = image.size();
        let mut queue =
            GrowingBucketQueue::new(size, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        match kind {
            PathFunctionKind::Watershed | PathFunctionKind::FuzzySum => {
                let adj = Adjacency::circular(1.0);
                let maps =
                    ForestMaps::new(GridMap::filled(shape, D::max_value()), true, true);
                let mut policy = match kind {
                    PathFunctionKind::Watershed => {
                        PolicyState::Watershed(MaxPathFunction::new(maps, grad.clone(), false))
                    }
                    _ => PolicyState::FuzzySum(SumPathFunction::new(maps, grad.clone(), false)),
                };
                match &mut policy {
                    PolicyState::Watershed(pf) => {
                        init_seeds(pf.maps_mut(), &mut queue, obj_seeds, bkg_seeds)
                            .map_err(SegError::from)?;
                        run_ift(pf, &adj, shape, &mut queue)?;
                    }
                    PolicyState::FuzzySum(pf) => {
                        init_seeds(pf.maps_mut(), &mut queue, obj_seeds, bkg_seeds)
                            .map_err(SegError::from)?;
                        run_ift(pf, &adj, shape, &mut queue)?;
                    }
                    _ => unreachable!(),
                }
                Ok(Self {
                    kind,
                    alpha,
                    beta,
                    shape,
                    adj,
                    queue,
                    policy,
                })
            }
            PathFunctionKind::GeodesicStar => {
                let adj = Adjacency::circular(1.5);
                // 第一遍: 只从对象种子出发的无约束测地距离场.
                let maps1 =
                    ForestMaps::new(GridMap::filled(shape, D::max_value()), false, true);
                let mut pass1 = GeodesicRestrictionPathFunction::new(
                    maps1,
                    grad.clone(),
                    image.clone(),
                    &adj,
                    alpha,
                    beta,
                )?;
                init_seeds(pass1.maps_mut(), &mut queue, obj_seeds, &[])
                    .map_err(SegError::from)?;
                run_ift(&mut pass1, &adj, shape, &mut queue)?;

                // 第二遍: 带标签的定向代价, 以第一遍前驱森林为约束.
                let restriction = pass1.maps().predecessor.clone();
                let maps2 =
                    ForestMaps::new(GridMap::filled(shape, D::max_value()), true, true);
                queue.reset_state();
                let mut pass2 = if alpha >= 0.0 {
                    Pass2::Extern(OrientedExternPathFunction::new(
                        maps2,
                        grad.clone(),
                        image.clone(),
                        restriction,
                        alpha,
                    )?)
                } else {
                    Pass2::Intern(OrientedInternPathFunction::new(
                        maps2,
                        grad.clone(),
                        image.clone(),
                        restriction,
                        -alpha,
                    )?)
                };
                init_seeds(pass2.maps_mut(), &mut queue, obj_seeds, bkg_seeds)
                    .map_err(SegError::from)?;
                match &mut pass2 {
                    Pass2::Extern(pf) => run_ift(pf, &adj, shape, &mut queue)?,
                    Pass2::Intern(pf) => run_ift(pf, &adj, shape, &mut queue)?,
                }
                Ok(Self {
                    kind,
                    alpha,
                    beta,
                    shape,
                    adj,
                    queue,
                    policy: PolicyState::GeodesicStar { pass1, pass2 },
                })
            }
        }
    }

    /// 增量重跑: 队列状态清零, 只重新初始化种子.
    fn rerun(
        &mut self,
        image: &GridMap<D>,
        grad: &GridMap<D>,
        obj_seeds: &[usize],
        bkg_seeds: &[usize],
    ) -> Result<(), SegError> {
        let shape = self.shape;
        match &mut self.policy {
            PolicyState::Watershed(pf) => {
                pf.differential_propagation(true);
                self.queue.reset_state();
                init_seeds(pf.maps_mut(), &mut self.queue, obj_seeds, bkg_seeds)
                    .map_err(SegError::from)?;
                run_ift(pf, &self.adj, shape, &mut self.queue)?;
            }
            PolicyState::FuzzySum(pf) => {
                pf.differential_propagation(true);
                self.queue.reset_state();
                init_seeds(pf.maps_mut(), &mut self.queue, obj_seeds, bkg_seeds)
                    .map_err(SegError::from)?;
                run_ift(pf, &self.adj, shape, &mut self.queue)?;
            }
            PolicyState::GeodesicStar { pass1, pass2 } => {
                pass1.differential_propagation(true);
                self.queue.reset_state();
                init_seeds(pass1.maps_mut(), &mut self.queue, obj_seeds, &[])
                    .map_err(SegError::from)?;
                run_ift(pass1, &self.adj, shape, &mut self.queue)?;

                // 第二遍重建: 约束森林取第一遍的最新前驱,
                // 代价与标签全图重置, 前驱图保留.
                let restriction = pass1.maps().predecessor.clone();
                let old = std::mem::replace(
                    pass2,
                    Pass2::Extern(OrientedExternPathFunction::new(
                        ForestMaps::new(GridMap::filled((1, 1), D::max_value()), true, false),
                        GridMap::filled((1, 1), D::max_value()),
                        GridMap::filled((1, 1), D::max_value()),
                        None,
                        0.0,
                    )?),
                );
                let mut maps2 = old.into_maps();
                maps2.value.fill(D::max_value());
                maps2.label.as_mut().unwrap().fill(0);
                self.queue.reset_state();
                *pass2 = if self.alpha >= 0.0 {
                    Pass2::Extern(OrientedExternPathFunction::new(
                        maps2,
                        grad.clone(),
                        image.clone(),
                        restriction,
                        self.alpha,
                    )?)
                } else {
                    Pass2::Intern(OrientedInternPathFunction::new(
                        maps2,
                        grad.clone(),
                        image.clone(),
                        restriction,
                        -self.alpha,
                    )?)
                };
                init_seeds(pass2.maps_mut(), &mut self.queue, obj_seeds, bkg_seeds)
                    .map_err(SegError::from)?;
                match pass2 {
                    Pass2::Extern(pf) => run_ift(pf, &self.adj, shape, &mut self.queue)?,
                    Pass2::Intern(pf) => run_ift(pf, &self.adj, shape, &mut self.queue)?,
                }
            }
        }
        Ok(())
    }

    /// 引擎是否与请求的配置兼容 (不兼容则需全量重建).
    fn compatible(&self, kind: PathFunctionKind, alpha: f64, beta: f64) -> bool {
        if self.kind != kind {
            return false;
        }
        // 测地星凸对 alpha/beta 敏感; 其他策略不读取它们.
        kind != PathFunctionKind::GeodesicStar || (self.alpha == alpha && self.beta == beta)
    }

    /// 最终标签图.
    fn label_map(&self) -> &GridMap<i32> {
        let maps = match &self.policy {
            PolicyState::Watershed(pf) => pf.maps(),
            PolicyState::FuzzySum(pf) => pf.maps(),
            PolicyState::GeodesicStar { pass2, .. } => pass2.maps(),
        };
        maps.label.as_ref().unwrap()
    }

    /// 最终代价图 (LiveWire 的种子连通需要它).
    pub(crate) fn value_map(&self) -> &GridMap<D> {
        let maps = match &self.policy {
            PolicyState::Watershed(pf) => pf.maps(),
            PolicyState::FuzzySum(pf) => pf.maps(),
            PolicyState::GeodesicStar { pass2, .. } => pass2.maps(),
        };
        &maps.value
    }

    /// 最终前驱图.
    pub(crate) fn predecessor_map(&self) -> &GridMap<i32> {
        let maps = match &self.policy {
            PolicyState::Watershed(pf) => pf.maps(),
            PolicyState::FuzzySum(pf) => pf.maps(),
            PolicyState::GeodesicStar { pass2, .. } => pass2.maps(),
        };
        maps.predecessor.as_ref().unwrap()
    }
}

/// `connect()` 编排.
impl SegmentationTool {
    /// 运行 (或增量重跑) 一次种子分割.
    ///
    /// 需要对象与背景种子同时存在, 否则返回可恢复的
    /// [`SegError::SeedsMissing`]. 成功后掩码更新为
    /// `标签 − 腐蚀(标签)` 的边界带; 整数图像还会触发 LiveWire
    /// 后处理, 返回实际放置的锚点个数 (`anchors` 传 0 表示
    /// 按轮廓长度自动选择).
    pub fn connect(
        &mut self,
        kind: PathFunctionKind,
        alpha: f64,
        beta: f64,
        anchors: usize,
    ) -> Result<usize, SegError> {
        self.ensure_gradient();
        let obj_seeds = self.seeds.positions_of(crate::consts::seed::SEED_OBJECT);
        let bkg_seeds = self.seeds.positions_of(crate::consts::seed::SEED_BACKGROUND);
        if obj_seeds.is_empty() || bkg_seeds.is_empty() {
            return Err(SegError::SeedsMissing);
        }
        self.mask_visible = true;
        self.alpha = alpha;
        self.beta = beta;

        // 数值表示或配置不兼容时丢弃增量状态.
        let matches_variant = match (&self.image, &self.runtime) {
            (Either::Left(_), Some(Either::Left(e))) => e.compatible(kind, alpha, beta),
            (Either::Right(_), Some(Either::Right(e))) => e.compatible(kind, alpha, beta),
            (_, None) => false,
            _ => false,
        };
        if !matches_variant {
            self.runtime = None;
        }

        match (&self.image, self.grad.as_ref().unwrap()) {
            (Either::Left(img), Either::Left(grad)) => {
                let label = match self.runtime.as_mut() {
                    Some(Either::Left(engine)) => {
                        engine.rerun(img, grad, &obj_seeds, &bkg_seeds)?;
                        engine.label_map().clone()
                    }
                    _ => {
                        let engine = EngineState::full_init(
                            kind, img, grad, alpha, beta, &obj_seeds, &bkg_seeds,
                        )?;
                        let label = engine.label_map().clone();
                        self.runtime = Some(Either::Left(engine));
                        label
                    }
                };
                self.finish_run(label);
                // LiveWire 后处理只对整数表示可用.
                let auto = self.border_length() / 20;
                let requested = if anchors > 0 { anchors } else { auto };
                match self.live_wire_post_processing(requested.max(MIN_ANCHORS)) {
                    Ok(used) => Ok(used),
                    Err(SegError::ContourTooShort(n)) => {
                        log::warn!("轮廓过短 ({n} 像素), 跳过 LiveWire 后处理");
                        Ok(0)
                    }
                    Err(SegError::ContourBroken) => {
                        log::warn!("轮廓跟踪失败, 跳过 LiveWire 后处理");
                        Ok(0)
                    }
                    Err(e) => Err(e),
                }
            }
            (Either::Right(img), Either::Right(grad)) => {
                let label = match self.runtime.as_mut() {
                    Some(Either::Right(engine)) => {
                        engine.rerun(img, grad, &obj_seeds, &bkg_seeds)?;
                        engine.label_map().clone()
                    }
                    _ => {
                        let engine = EngineState::full_init(
                            kind, img, grad, alpha, beta, &obj_seeds, &bkg_seeds,
                        )?;
                        let label = engine.label_map().clone();
                        self.runtime = Some(Either::Right(engine));
                        label
                    }
                };
                self.finish_run(label);
                Ok(MIN_ANCHORS)
            }
            _ => unreachable!("梯度与图像的数值表示一致"),
        }
    }

    /// 掩码提取与脏标记.
    fn finish_run(&mut self, label: GridMap<i32>) {
        let eroded = erode_bin(&label, &Adjacency::circular(1.0));
        let mut mask = label.clone();
        for (m, e) in mask.iter_mut().zip(eroded.iter()) {
            *m -= e;
        }
        self.label = label;
        self.mask = mask;
        self.mark_all_dirty();
        if self.dump_maps {
            crate::dump::dump_map(&self.label, "ift_berry_label");
            crate::dump::dump_map(&self.mask, "ift_berry_mask");
        }
    }

    /// 当前标签图的边界长度 (与背景相邻的对象像素数).
    pub(crate) fn border_length(&self) -> usize {
        let adj = Adjacency::circular(1.1);
        let shape = self.label.shape();
        self.label
            .pos_iter()
            .filter(|&pos| {
                self.label[pos] != 0
                    && adj.neighbors_pos(shape, pos).any(|n| self.label[n] == 0)
            })
            .count()
    }
}
