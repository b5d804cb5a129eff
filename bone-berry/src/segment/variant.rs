use super::expand::expand_label;
use super::random::{randomize_label, RandomSource};
use crate::consts::EXPANSIONS_MM;
use crate::{BoneError, BoneLabel, BoneResult, Stage, StageContext};
use log::info;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 掩膜变体的种类.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariantKind {
    /// 原始分割结果.
    Original,

    /// 扩张 `mm` 毫米.
    Expanded {
        /// 扩张距离.
        mm: f64,
    },

    /// 第 `index` 个 (从 1 开始) 随机化变体.
    Random {
        /// 序号.
        index: usize,

        /// 扩张环保留比例.
        ratio: f64,
    },
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKind::Original => f.write_str("Original"),
            VariantKind::Expanded { mm } => write!(f, "Expanded {mm}mm"),
            VariantKind::Random { index, ratio } => {
                write!(f, "Random {index} ({}%)", (ratio * 100.0).round())
            }
        }
    }
}

impl VariantKind {
    /// 写出该变体时使用的文件名.
    pub fn file_name(&self) -> String {
        match self {
            VariantKind::Original => "original_mask.nii.gz".to_string(),
            VariantKind::Expanded { mm } => format!("expanded_{mm}mm_mask.nii.gz"),
            VariantKind::Random { index, .. } => format!("random_mask_{index}.nii.gz"),
        }
    }
}

/// 一个随机化变体的参数.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RandomSpec {
    /// 基于 [`VariantPlan::expansions_mm`] 中的第几个扩张结果.
    pub expansion: usize,

    /// 扩张环保留比例.
    pub ratio: f64,
}

/// 变体生成计划.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariantPlan {
    /// 依次生成的扩张距离 (毫米).
    pub expansions_mm: Vec<f64>,

    /// 依次生成的随机化变体.
    pub randoms: Vec<RandomSpec>,

    /// 随机数来源.
    pub source: RandomSource,
}

impl Default for VariantPlan {
    /// 2mm / 4mm 扩张; 分别以 65% / 40% 的比例保留 2mm / 4mm 扩张环.
    fn default() -> Self {
        Self {
            expansions_mm: EXPANSIONS_MM.to_vec(),
            randoms: vec![
                RandomSpec {
                    expansion: 0,
                    ratio: 0.65,
                },
                RandomSpec {
                    expansion: 1,
                    ratio: 0.40,
                },
            ],
            source: RandomSource::entropy(),
        }
    }
}

impl VariantPlan {
    /// 替换随机种子.
    #[inline]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.source = RandomSource::from_seed(seed);
        self
    }

    /// 检查参数是否合法.
    pub fn validate(&self) -> BoneResult<()> {
        if let Some(mm) = self
            .expansions_mm
            .iter()
            .find(|mm| !mm.is_finite() || **mm < 0.0)
        {
            return Err(BoneError::invalid_parameter(format!(
                "expansion must be a non-negative distance, got {mm} mm"
            )));
        }
        for r in self.randoms.iter() {
            if r.expansion >= self.expansions_mm.len() {
                return Err(BoneError::invalid_parameter(format!(
                    "random variant refers to missing expansion #{}",
                    r.expansion
                )));
            }
            if r.ratio.is_nan() {
                return Err(BoneError::invalid_parameter("randomization ratio is NaN"));
            }
        }
        Ok(())
    }

    /// 变体总数 (含原始结果).
    #[inline]
    pub fn len(&self) -> usize {
        1 + self.expansions_mm.len() + self.randoms.len()
    }

    /// 是否只有原始结果?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expansions_mm.is_empty() && self.randoms.is_empty()
    }
}

/// 一个掩膜变体.
#[derive(Debug, Clone)]
pub struct MaskVariant {
    /// 种类.
    pub kind: VariantKind,

    /// 标签体.
    pub label: BoneLabel,
}

/// 按 `plan` 从原始分割结果派生所有变体. 返回顺序为: 原始, 各扩张, 各随机化.
///
/// 所有变体都只由 `original` 派生, 不会相互影响.
pub fn build_variants(original: &BoneLabel, plan: &VariantPlan) -> BoneResult<Vec<MaskVariant>> {
    plan.validate().stage(Stage::Variants)?;

    let mut variants = Vec::with_capacity(plan.len());
    variants.push(MaskVariant {
        kind: VariantKind::Original,
        label: original.clone(),
    });

    for &mm in plan.expansions_mm.iter() {
        info!("Creating {mm}mm expanded mask");
        let label = expand_label(original, mm).stage(Stage::Expand)?;
        variants.push(MaskVariant {
            kind: VariantKind::Expanded { mm },
            label,
        });
    }

    for (i, spec) in plan.randoms.iter().enumerate() {
        let index = i + 1;
        let expanded = &variants[1 + spec.expansion].label;
        info!(
            "Creating random mask {index} ({:.0}% of the {}mm ring)",
            spec.ratio * 100.0,
            plan.expansions_mm[spec.expansion]
        );
        let mut rng = plan.source.rng(index as u64);
        let label =
            randomize_label(original, expanded, spec.ratio, &mut rng).stage(Stage::Randomize)?;
        variants.push(MaskVariant {
            kind: VariantKind::Random {
                index,
                ratio: spec.ratio,
            },
            label,
        });
    }
    Ok(variants)
}
