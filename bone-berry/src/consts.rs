//! 通用常量.

/// 单通道标签值.
pub mod gray {
    /// 背景的体素值.
    pub const BACKGROUND: u8 = 0;

    /// 胫骨的体素值.
    pub const TIBIA: u8 = 1;

    /// 股骨的体素值.
    pub const FEMUR: u8 = 2;

    /// 体素是否是胫骨?
    #[inline]
    pub const fn is_tibia(p: u8) -> bool {
        matches!(p, TIBIA)
    }

    /// 体素值是否在合法标签域 {0, 1, 2} 中?
    #[inline]
    pub const fn is_valid(p: u8) -> bool {
        matches!(p, BACKGROUND | TIBIA | FEMUR)
    }
}

/// 可视化用的 RGB 颜色.
pub mod rgb {
    /// 胫骨叠加色 (绿).
    pub const TIBIA_GREEN: [u8; 3] = [0, 200, 0];

    /// 股骨叠加色 (红).
    pub const FEMUR_RED: [u8; 3] = [220, 0, 0];

    /// 内侧最低点标记色 (蓝).
    pub const MEDIAL_BLUE: [u8; 3] = [0, 90, 255];

    /// 外侧最低点标记色 (黄).
    pub const LATERAL_YELLOW: [u8; 3] = [255, 220, 0];
}

/// 主方法的骨骼 HU 阈值. 严格大于该值的体素才被视为骨骼.
pub const BONE_THRESHOLD: f32 = 200.0;

/// 备用方法的骨骼 HU 阈值.
pub const FALLBACK_BONE_THRESHOLD: f32 = 150.0;

/// 分割结果中任一骨骼的最少体素数. 低于该值时改用备用方法.
pub const MIN_PLAUSIBLE_VOXELS: usize = 1000;

/// 参与分割的切片范围 (占 Y 方向长度的比例), 左闭右开.
pub const SLAB_RANGE: (f64, f64) = (0.2, 0.8);

/// 本流程中默认生成的扩张距离, 单位为毫米.
pub const EXPANSIONS_MM: [f64; 2] = [2.0, 4.0];
