use super::{find_tibia_lowest_points, Landmark, TibiaLandmarks};
use crate::segment::MaskVariant;
use crate::BoneResult;
use log::info;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const HEADER: &str = "Mask,\
Medial_X_mm,Medial_Y_mm,Medial_Z_mm,\
Lateral_X_mm,Lateral_Y_mm,Lateral_Z_mm,\
Medial_X_voxel,Medial_Y_voxel,Medial_Z_voxel,\
Lateral_X_voxel,Lateral_Y_voxel,Lateral_Z_voxel";

/// 各掩膜变体的最低点汇总, 保持插入顺序.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LandmarkReport {
    rows: Vec<(String, TibiaLandmarks)>,
}

impl FromIterator<(String, TibiaLandmarks)> for LandmarkReport {
    fn from_iter<I: IntoIterator<Item = (String, TibiaLandmarks)>>(it: I) -> Self {
        Self {
            rows: it.into_iter().collect(),
        }
    }
}

/// 含逗号或引号的字段需要加引号.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// 缺失时写 3 个空字段.
fn mm_fields(l: &Landmark) -> [String; 3] {
    match l.mm() {
        Some(p) => p.map(|v| format!("{v:?}")),
        None => Default::default(),
    }
}

fn voxel_fields(l: &Landmark) -> [String; 3] {
    match l.voxel() {
        Some((x, y, z)) => [x.to_string(), y.to_string(), z.to_string()],
        None => Default::default(),
    }
}

impl LandmarkReport {
    /// 创建空报表.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次对每个变体求最低点, 以变体名称为行名.
    pub fn from_variants(variants: &[MaskVariant]) -> Self {
        variants
            .iter()
            .map(|v| {
                info!("Locating tibia landmarks for {}", v.kind);
                (v.kind.to_string(), find_tibia_lowest_points(&v.label))
            })
            .collect()
    }

    /// 追加一行.
    #[inline]
    pub fn push<S: Into<String>>(&mut self, name: S, landmarks: TibiaLandmarks) {
        self.rows.push((name.into(), landmarks));
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按名称查找.
    pub fn get(&self, name: &str) -> Option<&TibiaLandmarks> {
        self.rows.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    /// 按插入顺序迭代.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &TibiaLandmarks)> {
        self.rows.iter().map(|(n, l)| (n.as_str(), l))
    }

    /// 以 CSV 格式写入 `w`. 缺失的坐标写为空字段.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "{HEADER}")?;
        for (name, lm) in self.rows.iter() {
            let fields = [
                mm_fields(&lm.medial),
                mm_fields(&lm.lateral),
                voxel_fields(&lm.medial),
                voxel_fields(&lm.lateral),
            ];
            write!(w, "{}", escape(name))?;
            for f in fields.iter().flatten() {
                write!(w, ",{f}")?;
            }
            writeln!(w)?;
        }
        w.flush()
    }

    /// 保存为 CSV 文件. 父目录不存在时会被创建.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> BoneResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.write_csv(BufWriter::new(fs::File::create(path)?))?;
        info!("Saved landmark summary of {} masks to {}", self.len(), path.display());
        Ok(())
    }
}
