use std::fs;
use std::ops::{Index, IndexMut};
use std::path::Path;

use log::{debug, info};
use ndarray::{Array3, ArrayView, ArrayViewMut, Axis, Ix3, Zip};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, NiftiType, ReaderOptions};
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::consts::gray::*;
use crate::{BoneError, BoneResult, Idx3d, Predicate};

pub mod slice;
pub mod spacing;
pub mod window;

pub use slice::{LabelSlice, LabelSliceMut, ScanSlice};
pub use spacing::VoxelSpacing;
pub use window::CtWindow;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// nii 格式 3D CT 扫描, 包括 header 和 CT 扫描 (HU). HU 值以 `f32` 保存.
///
/// 数据按 nifti 惯例以 `(X, Y, Z)` 组织. 第 `y` 个冠状切片的形状为 `(X, Z)`.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<f32>,
    spacing: VoxelSpacing,
}

/// 从 header 读取 (X, Y, Z) 体素个数.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    let [_, x, y, z, ..] = h.dim;
    (x as usize, y as usize, z as usize)
}

/// 为手动创建的体数据生成最小可用的 header.
fn synthetic_header(shape: Idx3d, spacing: VoxelSpacing) -> BoneResult<BoxedHeader> {
    let (x, y, z) = shape;
    let dim = |n: usize| {
        u16::try_from(n).map_err(|_| {
            BoneError::invalid_parameter(format!("volume extent {n} does not fit a nifti header"))
        })
    };

    let mut header = Box::<NiftiHeader>::default();
    header.dim = [3, dim(x)?, dim(y)?, dim(z)?, 1, 1, 1, 1];
    let [sx, sy, sz] = spacing.as_array();
    header.pixdim = [1.0, sx as f32, sy as f32, sz as f32, 1.0, 1.0, 1.0, 1.0];
    header.datatype = NiftiType::Float32 as i16;
    header.bitpix = 32;
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    Ok(header)
}

/// 3D CT nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取经过检查的体素分辨率.
    fn spacing(&self) -> VoxelSpacing;

    /// 获取数据形状大小, 按 `(X, Y, Z)` 组织.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取冠状切片个数.
    #[inline]
    fn len_y(&self) -> usize {
        self.shape().1
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.spacing().voxel()
    }
}

impl NiftiHeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }

    #[inline]
    fn spacing(&self) -> VoxelSpacing {
        self.spacing
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtScan {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件 (可为 gzip 压缩) 的本地路径.
    ///
    /// 文件不存在时返回 [`BoneError::MissingInput`]. 第四维长度为 1 的体数据会被压缩为三维.
    pub fn open<P: AsRef<Path>>(path: P) -> BoneResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BoneError::MissingInput(path.to_path_buf()));
        }

        let obj = ReaderOptions::new().read_file(path)?;
        let header = Box::new(obj.header().clone());
        let spacing = VoxelSpacing::from_pixdim(&header.pixdim)?;

        let data = obj.into_volume().into_ndarray::<f32>()?;
        let data = if data.ndim() == 4 && data.shape()[3] == 1 {
            data.index_axis_move(Axis(3), 0)
        } else {
            data
        };

        // nifti 数据本身是列优先的, 这里转为行优先, 但不改变 (X, Y, Z) 的轴顺序.
        let data = data
            .into_dimensionality::<Ix3>()?
            .as_standard_layout()
            .into_owned();

        let scan = Self {
            header,
            data,
            spacing,
        };
        info!(
            "Loaded `{}`: shape {:?}, spacing {:?} mm",
            path.display(),
            scan.data.dim(),
            scan.spacing.as_array()
        );
        let (lo, hi) = scan.value_range();
        debug!("HU range [{lo}, {hi}]");
        Ok(scan)
    }

    /// 根据裸数据和体素分辨率直接创建 `CtScan` 实体. `data` 按 `(X, Y, Z)` 组织.
    ///
    /// 若某一维长度超出 nifti header 的表示范围, 则返回 `Err`.
    pub fn from_array(data: Array3<f32>, spacing: VoxelSpacing) -> BoneResult<Self> {
        let header = synthetic_header(data.dim(), spacing)?;
        let data = data.as_standard_layout().into_owned();
        Ok(Self {
            header,
            data,
            spacing,
        })
    }

    /// 获取体数据中的最小和最大 HU 值. 忽略 NaN.
    pub fn value_range(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    }

    /// 获取第 `y_index` 个冠状切片视图, 形状为 `(X, Z)`.
    ///
    /// 当 `y_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, y_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(1), y_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

/// nii 格式 3D 骨骼标签. 标签值以 `u8` 保存, 取值为 0 (背景), 1 (胫骨) 或 2 (股骨).
///
/// header 和体素分辨率始终与产生它的 [`CtScan`] 一致.
#[derive(Debug, Clone)]
pub struct BoneLabel {
    header: BoxedHeader,
    data: Array3<u8>,
    spacing: VoxelSpacing,
}

impl NiftiHeaderAttr for BoneLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }

    #[inline]
    fn spacing(&self) -> VoxelSpacing {
        self.spacing
    }
}

impl Index<Idx3d> for BoneLabel {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for BoneLabel {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl PartialEq for BoneLabel {
    /// 仅比较体数据和体素分辨率.
    fn eq(&self, other: &Self) -> bool {
        self.spacing == other.spacing && self.data == other.data
    }
}

impl BoneLabel {
    /// 创建与 `scan` 形状、header 一致的全背景标签.
    pub fn zeros_like(scan: &CtScan) -> Self {
        Self {
            header: scan.header.clone(),
            data: Array3::zeros(scan.data.raw_dim()),
            spacing: scan.spacing,
        }
    }

    /// 以 `self` 的元信息包装新的标签数据.
    ///
    /// `data` 的形状必须与 `self` 一致, 否则 panic.
    pub fn with_data(&self, data: Array3<u8>) -> Self {
        assert_eq!(self.data.dim(), data.dim(), "标签形状不一致");
        Self {
            header: self.header.clone(),
            data,
            spacing: self.spacing,
        }
    }

    /// 以 `self` 的元信息, 依次将 `tibia` 和 `femur` 掩膜写入新的标签.
    /// 两者重叠处为股骨.
    ///
    /// 掩膜形状必须与 `self` 一致, 否则 panic.
    pub fn from_masks(&self, tibia: &Array3<bool>, femur: &Array3<bool>) -> Self {
        let mut data = Array3::<u8>::zeros(self.data.raw_dim());
        Zip::from(&mut data)
            .and(tibia)
            .and(femur)
            .for_each(|p, &t, &f| {
                if f {
                    *p = FEMUR;
                } else if t {
                    *p = TIBIA;
                }
            });
        self.with_data(data)
    }

    /// 获取第 `y_index` 个冠状不可变切片.
    ///
    /// 当 `y_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, y_index: usize) -> LabelSlice {
        LabelSlice::new(self.data.index_axis(Axis(1), y_index))
    }

    /// 获取第 `y_index` 个冠状可变切片.
    ///
    /// 当 `y_index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, y_index: usize) -> LabelSliceMut {
        LabelSliceMut::new(self.data.index_axis_mut(Axis(1), y_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }

    /// 提取值为 `label` 的体素构成的二值掩膜.
    #[inline]
    pub fn mask(&self, label: u8) -> Array3<bool> {
        self.data.map(|p| *p == label)
    }

    /// 获取 3D 标签中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 获取骨骼标签的基本统计信息: \[背景体素数, 胫骨体素数, 股骨体素数\].
    /// 非法标签值不计入. 启用 `rayon` 时按冠状切片并行统计.
    pub fn numeric_statistics(&self) -> [usize; 3] {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                self.data
                    .axis_iter(Axis(1))
                    .into_par_iter()
                    .map(|v| LabelSlice::new(v).numeric_statistics())
                    .reduce(|| [0; 3], |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2]])
            } else {
                let mut ans = [0; 3];
                for pixel in self.data.iter().filter(|p| is_valid(**p)) {
                    ans[*pixel as usize] += 1;
                }
                ans
            }
        }
    }

    /// 值为 `label` 的体素的总体积, 以立方毫米为单位.
    #[inline]
    pub fn volume_mm3(&self, label: u8) -> f64 {
        self.count(label) as f64 * self.voxel()
    }

    /// 所有体素值是否都在合法标签域中?
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|p| is_valid(*p))
    }

    /// 收集满足谓词 `pred` 的所有体素对应的下标, 结果按行优先存储.
    pub fn filter_pos(&self, pred: Predicate) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(ref pos, pixel)| pred(*pixel).then_some(*pos))
            .collect()
    }

    /// 收集所有胫骨体素对应的下标. 结果按行优先存储.
    #[inline]
    pub fn tibia_pos(&self) -> Vec<Idx3d> {
        self.filter_pos(is_tibia)
    }

    /// 以 `u8` nifti 格式写出到 `path`, 文件名以 `.gz` 结尾时自动压缩.
    /// 父目录不存在时会被创建.
    ///
    /// 除数据类型和缩放系数外, header 沿用输入扫描.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> BoneResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut header = (*self.header).clone();
        header.datatype = NiftiType::Uint8 as i16;
        header.bitpix = 8;
        header.scl_slope = 1.0;
        header.scl_inter = 0.0;

        nifti::writer::WriterOptions::new(path)
            .reference_header(&header)
            .write_nifti(&self.data)?;
        debug!("Saved label volume to `{}`", path.display());
        Ok(())
    }

    /// 读取由 [`BoneLabel::save`] 写出的标签文件.
    pub fn open<P: AsRef<Path>>(path: P) -> BoneResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BoneError::MissingInput(path.to_path_buf()));
        }
        let obj = ReaderOptions::new().read_file(path)?;
        let header = Box::new(obj.header().clone());
        let spacing = VoxelSpacing::from_pixdim(&header.pixdim)?;
        let data = obj
            .into_volume()
            .into_ndarray::<u8>()?
            .into_dimensionality::<Ix3>()?
            .as_standard_layout()
            .into_owned();
        Ok(Self {
            header,
            data,
            spacing,
        })
    }
}
