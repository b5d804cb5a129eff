use super::expand::expansion_ring;
use crate::consts::gray::{FEMUR, TIBIA};
use crate::{BoneError, BoneLabel, BoneResult, NiftiHeaderAttr};
use log::debug;
use ndarray::Zip;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 随机数来源. 给定种子时, 第 `stream` 路随机数由 `seed + stream` 初始化, 可复现;
/// 否则每次从系统熵源初始化.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RandomSource {
    seed: Option<u64>,
}

impl RandomSource {
    /// 固定种子.
    #[inline]
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// 使用系统熵源.
    #[inline]
    pub fn entropy() -> Self {
        Self { seed: None }
    }

    /// 可选种子.
    #[inline]
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// 获取种子 (若有).
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// 创建第 `stream` 路随机数生成器.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

/// 在扩张环上随机保留一部分体素.
///
/// 对胫骨和股骨依次处理: 扩张环为 `expanded` 中为该标签而 `original` 中不是的体素,
/// 按行优先顺序对每个环上体素抽样, 以 `ratio` 的概率保留.
/// 结果为原始标签并上保留的环体素; 股骨后写入, 因此重叠处为股骨.
///
/// `ratio` 会被截断到 `[0, 1]`. `ratio` 为 NaN 或两个标签形状不一致时返回 `Err`.
pub fn randomize_label<R: Rng + ?Sized>(
    original: &BoneLabel,
    expanded: &BoneLabel,
    ratio: f64,
    rng: &mut R,
) -> BoneResult<BoneLabel> {
    if ratio.is_nan() {
        return Err(BoneError::invalid_parameter("randomization ratio is NaN"));
    }
    if original.shape() != expanded.shape() {
        return Err(BoneError::invalid_parameter(format!(
            "original shape {:?} differs from expanded shape {:?}",
            original.shape(),
            expanded.shape()
        )));
    }
    let ratio = ratio.clamp(0.0, 1.0);

    let mut result = original.data().to_owned();
    for label in [TIBIA, FEMUR] {
        let ring = expansion_ring(original, expanded, label);
        let mut kept = 0usize;
        let mut total = 0usize;
        Zip::from(&mut result)
            .and(original.data())
            .and(&ring)
            .for_each(|r, &o, &in_ring| {
                if o == label {
                    *r = label;
                } else if in_ring {
                    total += 1;
                    if rng.gen::<f64>() < ratio {
                        *r = label;
                        kept += 1;
                    }
                }
            });
        debug!("Label {label}: kept {kept} of {total} ring voxels (ratio {ratio})");
    }
    Ok(original.with_data(result))
}
