//! 运行时错误.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 本 crate 的通用结果类型.
pub type BoneResult<T> = Result<T, BoneError>;

/// 流水线阶段. 用于标注错误发生的位置.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    /// 读取输入扫描.
    Load,

    /// 主分割 (含切片分割与体数据拼装).
    Segment,

    /// 检查变体生成计划.
    Variants,

    /// 掩膜扩张.
    Expand,

    /// 掩膜随机化.
    Randomize,

    /// 写出标签体.
    Save,

    /// 写出报表.
    Report,

    /// 写出可视化图像.
    Visualize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Load => "load",
            Stage::Segment => "segment",
            Stage::Variants => "variants",
            Stage::Expand => "expand",
            Stage::Randomize => "randomize",
            Stage::Save => "save",
            Stage::Report => "report",
            Stage::Visualize => "visualize",
        };
        f.write_str(s)
    }
}

/// 运行时错误.
#[derive(Debug, Error)]
pub enum BoneError {
    /// 输入文件不存在. 在任何分割工作开始前即终止.
    #[error("input volume `{}` does not exist", .0.display())]
    MissingInput(PathBuf),

    /// nifti 读写错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 数组形状错误.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 其他底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 图像编码错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 体素分辨率必须是正的有限值.
    #[error("invalid voxel spacing {0:?}")]
    InvalidSpacing([f64; 3]),

    /// 参数不合法.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// 带有阶段信息的错误.
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        /// 出错的阶段.
        stage: Stage,

        /// 原始错误.
        #[source]
        source: Box<BoneError>,
    },
}

impl BoneError {
    /// 创建参数错误.
    #[inline]
    pub fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::InvalidParameter(details.into())
    }

    /// 为错误附加阶段信息. 已带阶段信息的错误不会被重复包装.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            e @ Self::Stage { .. } => e,
            e => Self::Stage {
                stage,
                source: Box::new(e),
            },
        }
    }

    /// 获取错误发生的阶段 (若有).
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// 为 `Result` 附加阶段信息.
pub trait StageContext<T> {
    /// 若为 `Err`, 则将其包装为 [`BoneError::Stage`].
    fn stage(self, stage: Stage) -> BoneResult<T>;
}

impl<T, E: Into<BoneError>> StageContext<T> for Result<T, E> {
    #[inline]
    fn stage(self, stage: Stage) -> BoneResult<T> {
        self.map_err(|e| e.into().at(stage))
    }
}
