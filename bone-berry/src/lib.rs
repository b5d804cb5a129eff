#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供膝关节 3D CT 扫描的股骨/胫骨分割、掩膜扰动以及胫骨平台最低点定位算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 假设输入是单个、连续的腿部扫描, 其中恰好包含一对股骨/胫骨.
//!   体素坐标按 nifti 惯例以 `(X, Y, Z)` 组织, 其中 Y 为切片方向 (前后方向),
//!   Z 为上下方向.
//! 2. 与用户输入有关的失败均以 [`BoneError`] 返回; 只有内部不变量被破坏时程序才会 panic.
//!
//! # 开发计划
//!
//! ### 单切片骨骼提取与关节线定位 ✅
//!
//! 阈值化 + 小连通域去除 + 圆盘闭运算得到骨骼掩膜; 对掩膜的纵向密度曲线做高斯平滑,
//! 在切片中间三分之一范围内寻找局部极小值作为股骨/胫骨分界.
//!
//! 实现位于 `bone-berry/src/segment/{bone, joint, slice}.rs`.
//!
//! ### 体数据拼装与三维后处理 ✅
//!
//! 只处理 Y 方向中间 60% 的切片. 每个切片的计算相互独立, 在打开 `rayon`
//! feature 时并行执行, 最后由单次归约写入标签体.
//!
//! 三维后处理依次为: 填洞, 3x3x3 闭运算, 去除小于 1000 体素的连通域.
//!
//! 实现位于 `bone-berry/src/segment/{volume, refine}.rs`.
//!
//! ### 备用分割 ✅
//!
//! 当主方法得到的任一骨骼体素数不足 1000 时, 以更宽松的阈值 (150) 和切片中点分界重新分割.
//!
//! 实现位于 `bone-berry/src/segment/fallback.rs`.
//!
//! ### 掩膜扩张与随机化 ✅
//!
//! 以毫米为单位的各向异性盒形膨胀; 两个标签的争议区域退回原始状态.
//! 在原始掩膜与扩张掩膜之间的 "扩张环" 上做伯努利抽样. 随机源显式传入,
//! 给定种子时结果可复现.
//!
//! 实现位于 `bone-berry/src/segment/{expand, random}.rs`.
//!
//! ### 胫骨平台最低点 ✅
//!
//! 按胫骨体素 X 坐标均值划分内/外侧, 分别取物理坐标 Z 最小的点.
//! **不** 根据 header 的方向信息进行校正: "最低" 就是字面意义上的最小 Z.
//!
//! 实现位于 `bone-berry/src/landmark`.
//!
//! ### 结果持久化 ✅
//!
//! 1. nifti 标签体写出 (沿用输入扫描的 header). ✅
//! 2. 最低点 CSV 报表. ✅
//! 3. 冠状切片叠加可视化 (PNG). ✅

/// 二维索引. 对冠状切片而言分别是 `(x, z)`.
pub type Idx2d = (usize, usize);

/// 三维索引, 按 `(x, y, z)` 组织.
pub type Idx3d = (usize, usize, usize);

/// 物理空间中的三维点, 以毫米为单位.
pub type PointMm = [f64; 3];

type Predicate = fn(u8) -> bool;

/// 3D CT nii 文件基础数据结构.
mod data;

mod error;

pub use data::{
    BoneLabel, CtScan, CtWindow, LabelSlice, LabelSliceMut, NiftiHeaderAttr,
    ScanSlice, VoxelSpacing,
};

pub use data::slice::save_overlay;

pub use error::{BoneError, BoneResult, Stage, StageContext};

pub mod consts;

pub mod landmark;

pub mod morph;

pub mod prelude;

pub mod segment;
