use crate::consts::gray::is_valid;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};
use std::ops::{Index, IndexMut};

/// 不可变、借用的二维冠状骨骼标签切片, 形状为 `(X, Z)`.
pub struct LabelSlice<'a> {
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for LabelSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维冠状骨骼标签切片, 形状为 `(X, Z)`.
pub struct LabelSliceMut<'a> {
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> LabelSliceMut<'a> {
    /// 将 `mask` 为真的所有像素涂为 `label`, 覆盖原有值.
    ///
    /// 返回被涂写的像素个数. 如果 `mask` 形状与切片不一致, 则程序 panic.
    pub fn paint(&mut self, mask: ArrayView2<bool>, label: u8) -> usize {
        let mut cnt = 0usize;
        Zip::from(&mut self.data).and(&mask).for_each(|p, &m| {
            if m {
                *p = label;
                cnt += 1;
            }
        });
        cnt
    }
}

impl Index<Idx2d> for LabelSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LabelSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// label 不可变方法集合.
macro_rules! impl_label_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 图像的分辨率 `(X, Z)`.
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 统计图像中值为 `label` 的像素总个数.
            #[inline]
            pub fn count(&self, label: u8) -> usize {
                self.data.iter().filter(|&p| *p == label).count()
            }

            /// 获取切片的基本统计信息.
            ///
            /// 统计信息格式为: \[背景像素数, 胫骨像素数, 股骨像素数\].
            /// 该操作不会统计任何其他像素信息.
            pub fn numeric_statistics(&self) -> [usize; 3] {
                let mut ans = [0; 3];
                for pixel in self.data.iter().filter(|p| is_valid(**p)) {
                    ans[*pixel as usize] += 1;
                }
                ans
            }

            /// 提取值为 `label` 的像素构成的二值掩膜.
            #[inline]
            pub fn mask(&self, label: u8) -> Array2<bool> {
                self.data.map(|p| *p == label)
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
                self.data.indexed_iter()
            }
        }
    };
}

impl_label_slice_immut!('a, LabelSlice<'a>, ArrayView2<'a, u8>);
impl_label_slice_immut!('a, LabelSliceMut<'a>, ArrayViewMut2<'a, u8>);

/// 不可变、借用的二维冠状 CT 扫描切片, 形状为 `(X, Z)`.
///
/// 切片的 "高" 指 Z 方向 (上下方向) 的长度, 即 `shape().1`.
pub struct ScanSlice<'a> {
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 图像的分辨率 `(X, Z)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 切片的高, 即 Z 方向长度.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().1
    }

    /// 切片中的最大 HU 值. 忽略 NaN; 空切片或全为 NaN 时返回负无穷.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// 严格大于 `threshold` 的像素构成的二值掩膜.
    #[inline]
    pub fn threshold(&self, threshold: f32) -> Array2<bool> {
        self.data.map(|hu| *hu > threshold)
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, CT HU 值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }
}
