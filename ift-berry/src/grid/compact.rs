use super::GridMap;
use crate::Idx2d;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 压缩存储的 [`GridMap<i32>`] 快照; 不透明类型.
///
/// 分割工具在破坏性操作 (如清空种子) 之前保存快照, 供以后恢复.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactGridMap {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    sh: Idx2d,
}

impl GridMap<i32> {
    /// 压缩数据.
    pub fn compress(&self) -> CompactGridMap {
        let mut raw = Vec::with_capacity(self.size() * 4);
        for &p in self.as_slice() {
            raw.extend_from_slice(&p.to_le_bytes());
        }
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        e.write_all(&raw).expect("Compression error");
        CompactGridMap {
            buf: e.finish().expect("Compression error"),
            sh: self.shape(),
        }
    }
}

impl CompactGridMap {
    /// 解压缩数据.
    pub fn decompress(&self) -> GridMap<i32> {
        let (h, w) = self.sh;
        let mut d = ZlibDecoder::new(self.buf.as_slice());
        let mut raw = Vec::with_capacity(h * w * 4);
        d.read_to_end(&mut raw).expect("Decompression error");
        debug_assert_eq!(raw.len(), h * w * 4);
        let buf = raw
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        GridMap::from_row_major((h, w), buf)
    }

    /// 快照的形状.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.sh
    }
}

#[cfg(test)]
mod tests {
    use crate::GridMap;

    #[test]
    fn test_compress_roundtrip() {
        let mut m = GridMap::filled((7, 5), 0i32);
        m[(0, 0)] = -2;
        m[(3, 4)] = 1;
        m[(6, 2)] = 255;
        let z = m.compress();
        assert_eq!(z.shape(), (7, 5));
        assert_eq!(z.decompress(), m);
    }
}
