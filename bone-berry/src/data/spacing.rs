//! 体素分辨率与体素/物理坐标换算.

use crate::{BoneError, BoneResult, Idx3d, PointMm};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 物理坐标换算回体素索引时的容差. 用于抵消 `i * s / s` 的浮点误差,
/// 保证 "体素 -> 毫米 -> 体素" 的往返结果与原索引一致.
const ROUND_TRIP_EPS: f64 = 1e-6;

/// 单个体素的物理尺寸, 以毫米为单位, 按 `[x, y, z]` 组织.
///
/// 三个分量均为正的有限值, 该性质在构造时检查.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelSpacing([f64; 3]);

impl Default for VoxelSpacing {
    /// 各向同性的 1mm 体素.
    #[inline]
    fn default() -> Self {
        Self([1.0; 3])
    }
}

impl VoxelSpacing {
    /// 创建体素分辨率. 若任一分量不是正的有限值, 则返回 `Err`.
    pub fn new(x: f64, y: f64, z: f64) -> BoneResult<Self> {
        Self::from_array([x, y, z])
    }

    /// 从 `[x, y, z]` 数组创建体素分辨率. 检查规则同 [`VoxelSpacing::new`].
    pub fn from_array(spacing: [f64; 3]) -> BoneResult<Self> {
        if spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
            Ok(Self(spacing))
        } else {
            Err(BoneError::InvalidSpacing(spacing))
        }
    }

    /// 从 nifti header 的 `pixdim` 字段读取体素分辨率. 取绝对值, 忽略 `pixdim[0]` (qfac).
    pub fn from_pixdim(pixdim: &[f32; 8]) -> BoneResult<Self> {
        let [_, x, y, z, ..] = *pixdim;
        Self::from_array([x.abs() as f64, y.abs() as f64, z.abs() as f64])
    }

    /// 以 `[x, y, z]` 数组形式返回.
    #[inline]
    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    /// x 方向 (左右) 体素分辨率.
    #[inline]
    pub fn x_mm(&self) -> f64 {
        self.0[0]
    }

    /// y 方向 (前后, 即切片方向) 体素分辨率.
    #[inline]
    pub fn y_mm(&self) -> f64 {
        self.0[1]
    }

    /// z 方向 (上下) 体素分辨率.
    #[inline]
    pub fn z_mm(&self) -> f64 {
        self.0[2]
    }

    /// 单个体素的体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.0.iter().product()
    }

    /// 体素索引 -> 物理坐标 (毫米). 仅做逐轴缩放, 不考虑 header 的仿射变换.
    #[inline]
    pub fn to_mm(&self, (x, y, z): Idx3d) -> PointMm {
        let [sx, sy, sz] = self.0;
        [x as f64 * sx, y as f64 * sy, z as f64 * sz]
    }

    /// 物理坐标 (毫米) -> 体素索引. 逐轴相除后向零截断.
    ///
    /// 负坐标会被截断为 0.
    #[inline]
    pub fn to_voxel(&self, mm: PointMm) -> Idx3d {
        let [sx, sy, sz] = self.0;
        let trunc = |v: f64, s: f64| (v / s + ROUND_TRIP_EPS).trunc().max(0.0) as usize;
        (trunc(mm[0], sx), trunc(mm[1], sy), trunc(mm[2], sz))
    }

    /// 将物理扩张距离换算为每个轴上的盒形结构元素边长:
    /// `max(1, ceil(expansion_mm / spacing))`.
    ///
    /// `expansion_mm` 必须是非负的有限值, 否则返回 `Err`.
    pub fn kernel_size(&self, expansion_mm: f64) -> BoneResult<[usize; 3]> {
        if !expansion_mm.is_finite() || expansion_mm < 0.0 {
            return Err(BoneError::invalid_parameter(format!(
                "expansion must be a non-negative distance, got {expansion_mm} mm"
            )));
        }
        Ok(self.0.map(|s| ((expansion_mm / s).ceil() as usize).max(1)))
    }
}
