use crate::consts::{
    BONE_THRESHOLD, FALLBACK_BONE_THRESHOLD, MIN_PLAUSIBLE_VOXELS, SLAB_RANGE,
};
use crate::{BoneError, BoneResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 分割参数. 默认值即本流程使用的参数.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentConfig {
    /// 骨骼 HU 阈值, 严格大于该值的像素为骨骼. 切片最大值低于该值时整张切片被跳过.
    pub bone_threshold: f32,

    /// 骨骼掩膜中保留的最小 4-连通区域面积.
    pub bone_min_size: usize,

    /// 骨骼掩膜闭运算所用圆盘半径.
    pub closing_radius: usize,

    /// 纵向密度曲线的高斯平滑标准差 (以像素为单位).
    pub joint_sigma: f64,

    /// 股骨/胫骨各自保留的最小 4-连通区域面积.
    pub side_min_size: usize,

    /// 参与分割的切片范围 (占 Y 方向长度的比例), 左闭右开.
    pub slab: (f64, f64),

    /// 三维后处理闭运算的立方体边长.
    pub refine_closing: usize,

    /// 三维后处理保留的最小 6-连通区域体积.
    pub min_component: usize,

    /// 任一骨骼体素数低于该值时, 认为主方法失败.
    pub min_plausible: usize,

    /// 备用方法参数.
    pub fallback: FallbackConfig,
}

/// 备用分割参数.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FallbackConfig {
    /// 骨骼 HU 阈值.
    pub threshold: f32,

    /// 股骨/胫骨各自保留的最小 4-连通区域面积.
    pub side_min_size: usize,

    /// 三维后处理闭运算的立方体边长.
    pub closing: usize,

    /// 三维后处理保留的最小 6-连通区域体积.
    pub min_component: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            threshold: FALLBACK_BONE_THRESHOLD,
            side_min_size: 50,
            closing: 5,
            min_component: 1000,
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            bone_threshold: BONE_THRESHOLD,
            bone_min_size: 50,
            closing_radius: 2,
            joint_sigma: 5.0,
            side_min_size: 100,
            slab: SLAB_RANGE,
            refine_closing: 3,
            min_component: 1000,
            min_plausible: MIN_PLAUSIBLE_VOXELS,
            fallback: FallbackConfig::default(),
        }
    }
}

impl SegmentConfig {
    /// 检查参数是否合法.
    pub fn validate(&self) -> BoneResult<()> {
        let fail = |what: &str| Err(BoneError::invalid_parameter(what.to_string()));
        if !self.bone_threshold.is_finite() || !self.fallback.threshold.is_finite() {
            return fail("bone thresholds must be finite");
        }
        if !self.joint_sigma.is_finite() || self.joint_sigma <= 0.0 {
            return fail("joint smoothing sigma must be positive");
        }
        let (lo, hi) = self.slab;
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo >= hi {
            return fail("slab must satisfy 0 <= start < end <= 1");
        }
        if self.refine_closing == 0 || self.fallback.closing == 0 {
            return fail("closing kernels must be at least one voxel wide");
        }
        Ok(())
    }
}
