//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, PointMm};

pub use crate::data::{
    BoneLabel, CtScan, CtWindow, LabelSlice, LabelSliceMut, NiftiHeaderAttr,
    ScanSlice, VoxelSpacing,
};
pub use crate::error::{BoneError, BoneResult, Stage, StageContext};

pub use crate::consts::gray::{BACKGROUND, FEMUR, TIBIA};

pub use crate::segment::{
    build_variants, segment_knee, MaskVariant, RandomSource, SegmentConfig, Segmentation,
    SegmentationMethod, VariantKind, VariantPlan,
};

pub use crate::landmark::{
    find_tibia_lowest_points, save_landmark_overlay, Landmark, LandmarkReport, TibiaLandmarks,
};
