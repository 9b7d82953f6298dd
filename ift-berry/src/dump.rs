//! 诊断转储.
//!
//! 把中间映射写到固定的临时路径, 方便排查分割结果.
//! 这只是调试辅助, 不是稳定契约, 调用方不应依赖这些文件.

use crate::GridMap;
use image::GrayImage;
use std::path::{Path, PathBuf};

/// 诊断文件的固定目录.
pub fn dump_dir() -> PathBuf {
    std::env::temp_dir()
}

/// 把整数图按线性拉伸写成 8 位灰度 PNG.
///
/// 写失败只记录日志, 不打断调用方.
pub fn dump_map(map: &GridMap<i32>, name: &str) {
    let path = dump_dir().join(format!("{name}.png"));
    let (lo, hi) = map
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    let span = (hi - lo).max(1) as f64;
    let (h, w) = map.shape();
    let mut img = GrayImage::new(w as u32, h as u32);
    for (pos, &p) in map.indexed_iter() {
        let g = (((p - lo) as f64 / span) * 255.0) as u8;
        img.put_pixel(pos.1 as u32, pos.0 as u32, image::Luma([g]));
    }
    if let Err(e) = img.save(&path) {
        log::warn!("诊断转储写入失败 {}: {e}", path.display());
    } else {
        log::debug!("诊断转储: {}", path.display());
    }
}

/// 把浮点图按线性拉伸写成 8 位灰度 PNG. NaN 像素压为黑.
pub fn dump_map_f32(map: &GridMap<f32>, name: &str) {
    use ordered_float::OrderedFloat;

    let path = dump_dir().join(format!("{name}.png"));
    let lo = map
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .map(OrderedFloat)
        .min()
        .map(|m| m.0)
        .unwrap_or(0.0);
    let hi = map
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .map(OrderedFloat)
        .max()
        .map(|m| m.0)
        .unwrap_or(0.0);
    let span = (hi - lo).max(f32::EPSILON);
    let (h, w) = map.shape();
    let mut img = GrayImage::new(w as u32, h as u32);
    for (pos, &p) in map.indexed_iter() {
        let g = if p.is_finite() {
            (((p - lo) / span) * 255.0) as u8
        } else {
            0
        };
        img.put_pixel(pos.1 as u32, pos.0 as u32, image::Luma([g]));
    }
    if let Err(e) = img.save(&path) {
        log::warn!("诊断转储写入失败 {}: {e}", path.display());
    } else {
        log::debug!("诊断转储: {}", path.display());
    }
}

/// 删除先前的同名转储 (若有).
pub fn clear_dump(name: &str) {
    let path = dump_dir().join(format!("{name}.png"));
    let _ = std::fs::remove_file(Path::new(&path));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridMap;

    #[test]
    fn test_dump_writes_file() {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Warn)
            .init();
        let mut m = GridMap::filled((4, 4), 0i32);
        m[(1, 1)] = 10;
        clear_dump("ift_berry_dump_test");
        dump_map(&m, "ift_berry_dump_test");
        let path = dump_dir().join("ift_berry_dump_test.png");
        assert!(path.exists());
        clear_dump("ift_berry_dump_test");
    }
}
