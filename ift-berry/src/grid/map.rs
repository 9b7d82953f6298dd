use crate::Idx2d;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维像素图.
///
/// 同时提供两套索引: `(高, 宽)` 元组索引服务于几何操作,
/// 行优先平铺索引 (`usize`) 服务于森林生长循环中以像素编号为节点的图算法.
/// 底层保证行优先标准布局.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GridMap<T> {
    data: Array2<T>,
}

impl<T: Copy> GridMap<T> {
    /// 以统一填充值构建.
    pub fn filled((h, w): Idx2d, fill: T) -> Self {
        Self {
            data: Array2::from_elem((h, w), fill),
        }
    }

    /// 从行优先序列构建. 序列长度与形状不符时 panic.
    pub fn from_row_major((h, w): Idx2d, buf: Vec<T>) -> Self {
        assert_eq!(h * w, buf.len(), "行优先数据大小不符");
        Self {
            data: Array2::from_shape_vec((h, w), buf).unwrap(),
        }
    }

    /// 将全图填充为 `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// 获得行优先存储的数据切片.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // 构造方式保证标准布局.
        self.data.as_slice().unwrap()
    }

    /// 获得行优先存储的可变数据切片.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_slice_mut().unwrap()
    }

    /// 对每个像素应用 `f`, 产生同形状的新图.
    pub fn map_pixels<U: Copy, F: FnMut(T) -> U>(&self, mut f: F) -> GridMap<U> {
        GridMap {
            data: self.data.map(|&p| f(p)),
        }
    }
}

impl<T> GridMap<T> {
    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<T> {
        self.data.view()
    }

    /// 获得 **底层** 数据的一份可变 shallow copy.
    #[inline]
    pub fn array_view_mut(&mut self) -> ArrayViewMut2<T> {
        self.data.view_mut()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 判断一个元组索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 平铺索引对应的元组索引.
    #[inline]
    pub fn pos_of(&self, flat: usize) -> Idx2d {
        let w = self.width();
        (flat / w, flat % w)
    }

    /// 元组索引对应的平铺索引.
    #[inline]
    pub fn flat_of(&self, (h, w): Idx2d) -> usize {
        h * self.width() + w
    }

    /// 判断一个元组索引是否位于图像的边缘.
    #[inline]
    pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
        h == 0
            || h.saturating_add(1) == self.height()
            || w == 0
            || w.saturating_add(1) == self.width()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&T> {
        self.data.get(pos)
    }

    /// 获取给定位置 (高, 宽) 的像素值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    pub fn get_mut(&mut self, pos: Idx2d) -> Option<&mut T> {
        self.data.get_mut(pos)
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// 获取可以迭代并修改图像像素的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }

    /// 以行优先规则, 获取能迭代图像所有元组索引的迭代器.
    pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
        let (h, w) = self.shape();
        (0..h).flat_map(move |first| (0..w).map(move |second| (first, second)))
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &T)> {
        self.data.indexed_iter()
    }
}

impl<T: Copy + PartialEq> GridMap<T> {
    /// 统计图像中值为 `target` 的像素总个数.
    #[inline]
    pub fn count(&self, target: T) -> usize {
        self.iter().filter(|&&p| p == target).count()
    }

    /// 判断图像中是否存在值为 `target` 的像素.
    #[inline]
    pub fn contains(&self, target: T) -> bool {
        self.iter().any(|&p| p == target)
    }

    /// 收集所有值为 `target` 的像素的平铺索引.
    pub fn positions_of(&self, target: T) -> Vec<usize> {
        self.as_slice()
            .iter()
            .enumerate()
            .filter_map(|(idx, &p)| (p == target).then_some(idx))
            .collect()
    }
}

impl<T> Index<Idx2d> for GridMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<Idx2d> for GridMap<T> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: Copy> Index<usize> for GridMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<T: Copy> IndexMut<usize> for GridMap<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let w = self.width();
        &mut self.data[(index / w, index % w)]
    }
}

#[cfg(test)]
mod tests {
    use super::GridMap;

    #[test]
    fn test_dual_indexing_consistency() {
        let mut m = GridMap::filled((3, 4), 0i32);
        m[(1, 2)] = 7;
        assert_eq!(m[1 * 4 + 2], 7);
        m[5usize] = 9;
        assert_eq!(m[(1, 1)], 9);
        assert_eq!(m.pos_of(5), (1, 1));
        assert_eq!(m.flat_of((2, 3)), 11);
    }

    #[test]
    fn test_shape_border() {
        let m = GridMap::filled((2, 5), 0u8);
        assert_eq!(m.shape(), (2, 5));
        assert_eq!(m.size(), 10);
        assert!(m.is_at_border((0, 3)));
        assert!(m.is_at_border((1, 3)));
        assert!(!GridMap::filled((3, 3), 0u8).is_at_border((1, 1)));
    }

    #[test]
    fn test_positions_of() {
        let mut m = GridMap::filled((2, 2), 0i32);
        m[(0, 1)] = 1;
        m[(1, 0)] = 1;
        assert_eq!(m.positions_of(1), vec![1, 2]);
        assert_eq!(m.count(0), 2);
    }

    #[test]
    fn test_pos_iter_row_major() {
        let m = GridMap::filled((2, 3), 0u8);
        let order: Vec<_> = m.pos_iter().collect();
        assert_eq!(
            order,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
    }
}
