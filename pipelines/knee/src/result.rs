//! 运行结果.

use bone_berry::prelude::*;
use std::io::{self, Write};

/// 单个掩膜变体的体积统计.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSummary {
    name: String,
    tibia: usize,
    femur: usize,
    tibia_mm3: f64,
    femur_mm3: f64,
}

impl VolumeSummary {
    /// 统计 `label` 中两块骨骼的体素数和体积.
    pub fn new(name: String, label: &BoneLabel) -> Self {
        let [_, tibia, femur] = label.numeric_statistics();
        Self {
            name,
            tibia,
            femur,
            tibia_mm3: label.volume_mm3(TIBIA),
            femur_mm3: label.volume_mm3(FEMUR),
        }
    }
}

/// `a / b`, `b` 为 0 时为 `None`.
#[inline]
fn ratio(a: usize, b: usize) -> Option<f64> {
    (b != 0).then(|| a as f64 / b as f64)
}

#[inline]
fn f64_to_display(f: Option<f64>) -> String {
    match f {
        Some(f) => format!("{f:.2}x"),
        None => "/".to_string(),
    }
}

#[inline]
fn landmark_to_display(l: &Landmark) -> String {
    match l {
        Landmark::Present {
            mm: [x, y, z],
            voxel: (vx, vy, vz),
        } => format!("({x:.2}, {y:.2}, {z:.2}) mm, voxel ({vx}, {vy}, {vz})"),
        Landmark::Absent => "/".to_string(),
    }
}

/// 将变体 `v` 相对 `original` 的统计结果和最低点写进 `w` 中.
fn describe_into<W: Write>(
    v: &VolumeSummary,
    original: &VolumeSummary,
    lm: &TibiaLandmarks,
    w: &mut W,
) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Mask `{}`:", v.name)?;
    writeln!(
        w,
        "{S4}Tibia: {} voxels, {:.1} mm^3, {} of original",
        v.tibia,
        v.tibia_mm3,
        f64_to_display(ratio(v.tibia, original.tibia))
    )?;
    writeln!(
        w,
        "{S4}Femur: {} voxels, {:.1} mm^3, {} of original",
        v.femur,
        v.femur_mm3,
        f64_to_display(ratio(v.femur, original.femur))
    )?;
    writeln!(
        w,
        "{S4}Medial lowest point: {}",
        landmark_to_display(&lm.medial)
    )?;
    write!(
        w,
        "{S4}Lateral lowest point: {}",
        landmark_to_display(&lm.lateral)
    )?;
    Ok(())
}

/// 流程最终结果.
pub struct KneeResult {
    method: SegmentationMethod,
    summaries: Vec<VolumeSummary>,
    report: LandmarkReport,
}

impl KneeResult {
    /// `summaries` 与 `report` 的行按同一顺序排列, 第一行为原始分割结果.
    pub fn new(
        method: SegmentationMethod,
        summaries: Vec<VolumeSummary>,
        report: LandmarkReport,
    ) -> Self {
        Self {
            method,
            summaries,
            report,
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        self.describe(io::stdout().lock())
    }

    fn describe<W: Write>(&self, mut w: W) -> io::Result<()> {
        utils::sep_to(&mut w)?;
        writeln!(w, "Segmentation method: {}", self.method)?;
        utils::sep_to(&mut w)?;

        let Some(original) = self.summaries.first() else {
            return Ok(());
        };
        for (v, (_, lm)) in self.summaries.iter().zip(self.report.iter()) {
            describe_into(v, original, lm, &mut w)?;
            writeln!(w)?;
            utils::sep_to(&mut w)?;
        }
        w.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, tibia: usize, femur: usize) -> VolumeSummary {
        VolumeSummary {
            name: name.to_string(),
            tibia,
            femur,
            tibia_mm3: tibia as f64,
            femur_mm3: femur as f64,
        }
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(3, 2), Some(1.5));
        assert_eq!(ratio(3, 0), None);
        assert_eq!(f64_to_display(ratio(5, 4)), "1.25x");
        assert_eq!(f64_to_display(None), "/");
    }

    #[test]
    fn test_describe() {
        let mut report = LandmarkReport::new();
        report.push("Original", TibiaLandmarks::ABSENT);
        report.push(
            "Expanded 2mm",
            TibiaLandmarks {
                medial: Landmark::Present {
                    mm: [1.0, 2.0, 3.5],
                    voxel: (1, 2, 3),
                },
                lateral: Landmark::Absent,
            },
        );
        let result = KneeResult::new(
            SegmentationMethod::Primary,
            vec![summary("Original", 100, 50), summary("Expanded 2mm", 150, 50)],
            report,
        );

        let mut buf = Vec::new();
        result.describe(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Segmentation method: primary"));
        assert!(text.contains("Mask `Expanded 2mm`:"));
        assert!(text.contains("Tibia: 150 voxels, 150.0 mm^3, 1.50x of original"));
        assert!(text.contains("Medial lowest point: (1.00, 2.00, 3.50) mm, voxel (1, 2, 3)"));
        assert!(text.contains("Lateral lowest point: /"));
    }
}
