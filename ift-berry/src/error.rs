//! 运行时错误.

use core::fmt;

/// 桶队列的逻辑错误与增长保护.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// 重复插入已在队列中的元素.
    AlreadyQueued(usize),

    /// 从空队列中取出元素.
    Underflow,

    /// 权值范围离谱, 桶数超过硬阈值. 参数为估算的桶数.
    TooBig(u64),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyQueued(id) => {
                write!(f, "元素 {id} 已在队列中, 不允许重复插入")
            }
            Self::Underflow => write!(f, "空队列取出"),
            Self::TooBig(n) => {
                write!(f, "桶队列过大 ({n} 桶), 请检查权值范围")
            }
        }
    }
}

impl std::error::Error for QueueError {}

/// 森林生长循环的构造与运行错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IftError {
    /// 值图与邻接关系的维度不符.
    ///
    /// 两个参数分别为值图像素数与期望的像素数.
    DimensionMismatch(usize, usize),

    /// 底层队列错误.
    Queue(QueueError),
}

impl fmt::Display for IftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch(got, want) => {
                write!(f, "值图大小 {got} 与邻接关系期望 {want} 不符")
            }
            Self::Queue(e) => write!(f, "队列错误: {e}"),
        }
    }
}

impl std::error::Error for IftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Queue(e) => Some(e),
            _ => None,
        }
    }
}

impl From<QueueError> for IftError {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

/// 分割工具的错误.
///
/// `SeedsMissing` 与 `ContourTooShort` 是可恢复的用户输入错误,
/// 调用方应提示用户而非中止; 其余为编程错误.
#[derive(Debug, Clone, PartialEq)]
pub enum SegError {
    /// 对象种子与背景种子必须同时存在.
    SeedsMissing,

    /// 掩码边界长度不足以做 LiveWire 后处理.
    ContourTooShort(usize),

    /// 轮廓跟踪陷入死循环, 掩码含孔洞或单像素宽通路.
    ContourBroken,

    /// 未知的笔画类型.
    InvalidDrawType(i32),

    /// alpha 超出 [-1, 1].
    InvalidAlpha(f64),

    /// beta 超出 [0, 4].
    InvalidBeta(f64),

    /// 底层 IFT 错误.
    Ift(IftError),
}

impl fmt::Display for SegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeedsMissing => {
                write!(f, "缺少种子: 需要同时给出对象种子和背景种子")
            }
            Self::ContourTooShort(n) => {
                write!(f, "轮廓过短 ({n} 像素), 至少需要 10 像素")
            }
            Self::ContourBroken => {
                write!(f, "轮廓跟踪失败: 掩码必须无孔且无单像素宽通路")
            }
            Self::InvalidDrawType(t) => write!(f, "未知笔画类型: {t}"),
            Self::InvalidAlpha(a) => {
                write!(f, "alpha 非法: 期望 [-1, 1], 实际 {a}")
            }
            Self::InvalidBeta(b) => {
                write!(f, "beta 非法: 期望 [0, 4], 实际 {b}")
            }
            Self::Ift(e) => write!(f, "IFT 错误: {e}"),
        }
    }
}

impl std::error::Error for SegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ift(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IftError> for SegError {
    fn from(e: IftError) -> Self {
        Self::Ift(e)
    }
}

impl From<QueueError> for SegError {
    fn from(e: QueueError) -> Self {
        Self::Ift(IftError::Queue(e))
    }
}
