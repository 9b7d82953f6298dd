//! 形态学与梯度滤波.
//!
//! 分割核心把这些滤波当作黑盒消费: 掩码提取需要二值腐蚀,
//! `connect()` 需要按需重算的梯度图.

use crate::adjacency::Adjacency;
use crate::GridMap;
use num::{Bounded, NumCast};

/// 以 `adj` 为腐蚀核做二值腐蚀. 非零像素视为前景.
///
/// 越界邻居不参与判定, 与邻接迭代的越界跳过规则一致.
pub fn erode_bin(img: &GridMap<i32>, adj: &Adjacency) -> GridMap<i32> {
    let shape = img.shape();
    let mut out = GridMap::filled(shape, 0);
    for pos in img.pos_iter() {
        if img[pos] != 0 && adj.neighbors_pos(shape, pos).all(|n| img[n] != 0) {
            out[pos] = 1;
        }
    }
    out
}

/// 以 `adj` 为膨胀核做二值膨胀. 非零像素视为前景.
pub fn dilate_bin(img: &GridMap<i32>, adj: &Adjacency) -> GridMap<i32> {
    let shape = img.shape();
    let mut out = GridMap::filled(shape, 0);
    for pos in img.pos_iter() {
        if img[pos] != 0 || adj.neighbors_pos(shape, pos).any(|n| img[n] != 0) {
            out[pos] = 1;
        }
    }
    out
}

/// 形态学梯度: 单位圆形邻域上的 (膨胀 − 腐蚀).
pub fn gradient_morphological<D>(img: &GridMap<D>) -> GridMap<D>
where
    D: Copy + PartialOrd + std::ops::Sub<Output = D>,
{
    let adj = Adjacency::circular(1.0);
    let shape = img.shape();
    let mut out = GridMap::filled(shape, img[(0, 0)]);
    for pos in img.pos_iter() {
        let mut lo = img[pos];
        let mut hi = img[pos];
        for n in adj.neighbors_pos(shape, pos) {
            let v = img[n];
            if v < lo {
                lo = v;
            }
            if hi < v {
                hi = v;
            }
        }
        out[pos] = hi - lo;
    }
    out
}

/// Sobel 梯度幅值.
pub fn gradient_sobel<D>(img: &GridMap<D>) -> GridMap<D>
where
    D: Copy + NumCast,
{
    const KX: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    const KY: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];
    let (h, w) = img.shape();
    let mut out = GridMap::filled((h, w), NumCast::from(0).unwrap());
    for pos in img.pos_iter() {
        let mut gx = 0.0;
        let mut gy = 0.0;
        for dh in 0..3usize {
            for dw in 0..3usize {
                // 越界时取图像边缘像素 (复制边界).
                let nh = (pos.0 + dh).saturating_sub(1).min(h - 1);
                let nw = (pos.1 + dw).saturating_sub(1).min(w - 1);
                let v: f64 = NumCast::from(img[(nh, nw)]).unwrap();
                gx += KX[dh][dw] * v;
                gy += KY[dh][dw] * v;
            }
        }
        out[pos] = NumCast::from((gx * gx + gy * gy).sqrt()).unwrap();
    }
    out
}

/// 亮度取补: 每个像素变为 `max − p`. LiveWire 以此把高梯度变成低代价.
pub fn complement<D>(img: &GridMap<D>) -> GridMap<D>
where
    D: Copy + PartialOrd + Bounded + std::ops::Sub<Output = D>,
{
    let mut hi = D::min_value();
    for &p in img.as_slice() {
        if hi < p {
            hi = p;
        }
    }
    img.map_pixels(|p| hi - p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridMap;

    fn cross() -> GridMap<i32> {
        let mut m = GridMap::filled((5, 5), 0);
        for p in [(1, 2), (2, 1), (2, 2), (2, 3), (3, 2)] {
            m[p] = 1;
        }
        m
    }

    #[test]
    fn test_erode_bin_cross() {
        // 十字腐蚀后只剩中心: 只有中心的 4-邻域全为前景.
        let e = erode_bin(&cross(), &Adjacency::circular(1.0));
        assert_eq!(e.count(1), 1);
        assert_eq!(e[(2, 2)], 1);
    }

    #[test]
    fn test_dilate_then_erode_superset() {
        let img = cross();
        let adj = Adjacency::circular(1.0);
        let d = dilate_bin(&img, &adj);
        for pos in img.pos_iter() {
            assert!(img[pos] == 0 || d[pos] == 1);
        }
    }

    #[test]
    fn test_morphological_gradient_flat_zero() {
        let flat = GridMap::filled((4, 4), 7i32);
        assert!(gradient_morphological(&flat).iter().all(|&g| g == 0));
    }

    #[test]
    fn test_morphological_gradient_edge() {
        let mut img = GridMap::filled((3, 4), 0i32);
        img[(0, 2)] = 10;
        img[(1, 2)] = 10;
        img[(2, 2)] = 10;
        img[(0, 3)] = 10;
        img[(1, 3)] = 10;
        img[(2, 3)] = 10;
        let g = gradient_morphological(&img);
        assert_eq!(g[(1, 0)], 0);
        assert_eq!(g[(1, 1)], 10);
        assert_eq!(g[(1, 2)], 10);
        assert_eq!(g[(1, 3)], 0);
    }

    #[test]
    fn test_sobel_flat_zero() {
        let flat = GridMap::filled((4, 4), 3.5f32);
        assert!(gradient_sobel(&flat).iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_complement_involution() {
        let mut img = GridMap::filled((2, 3), 0i32);
        img[(0, 1)] = 4;
        img[(1, 2)] = 9;
        let c = complement(&img);
        assert_eq!(c[(0, 1)], 5);
        assert_eq!(c[(1, 2)], 0);
        assert_eq!(c[(0, 0)], 9);
    }
}
