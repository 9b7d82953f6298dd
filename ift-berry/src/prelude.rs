//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::grid::{CompactGridMap, GridMap, OverlayStyle};

pub use crate::adjacency::Adjacency;

pub use crate::consts::seed::{SEED_BACKGROUND, SEED_NONE, SEED_OBJECT};
pub use crate::consts::{LABEL_OBJECT, MIN_ANCHORS, MIN_CONTOUR_LEN};

pub use crate::error::{IftError, QueueError, SegError};

pub use crate::ift::{DegeneratedIft, ImageIft};
pub use crate::path::{
    ForestMaps, GeodesicRestrictionPathFunction, LiveWirePathFunction, MaxPathFunction,
    OrientedExternPathFunction, OrientedInternPathFunction, PathFunction, SumPathFunction,
};
pub use crate::queue::{
    BucketQueue, BucketState, FastBucketQueue, GrowingBucketQueue, RemovalOrder,
    RotatingBucketQueue, TieBreak,
};

pub use crate::seg::{
    DrawType, GradientKind, PathFunctionKind, SegImage, SegmentationTool, StrokeButton,
};
