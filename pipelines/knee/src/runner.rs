//! 程序运行函数.

use crate::result::{KneeResult, VolumeSummary};
use bone_berry::prelude::*;
use log::info;
use std::path::Path;
use utils::loader;

/// 汇总报表文件名.
const SUMMARY_CSV: &str = "tibia_points_summary.csv";

/// 可视化图像子目录.
const VIZ_DIR: &str = "viz_img";

/// 标签体文件名对应的叠加图文件名.
fn overlay_name(kind: &VariantKind) -> String {
    let name = kind.file_name();
    format!("{}.png", name.trim_end_matches(".nii.gz"))
}

/// 写出所有变体的叠加图. 切片取原始结果内侧最低点所在的冠状切片, 缺失时取中间切片.
fn save_overlays(
    scan: &CtScan,
    variants: &[MaskVariant],
    report: &LandmarkReport,
    dir: &Path,
) -> BoneResult<()> {
    let y = report
        .get(&VariantKind::Original.to_string())
        .and_then(|l| l.medial.voxel())
        .map_or(scan.len_y() / 2, |(_, y, _)| y);
    info!("Saving overlays of coronal slice {y} to {}", dir.display());

    for (v, (_, lm)) in variants.iter().zip(report.iter()) {
        save_landmark_overlay(scan, &v.label, y, lm, dir.join(overlay_name(&v.kind)))?;
    }
    Ok(())
}

/// 实际运行.
pub fn run() -> BoneResult<KneeResult> {
    let input = loader::input_from_env_or_home().stage(Stage::Load)?;
    let out_dir = loader::output_dir_from_env();
    let seed = loader::seed_from_env()?;
    info!(
        "Input: {}, output: {}, seed: {seed:?}, {} worker threads",
        input.display(),
        out_dir.display(),
        utils::cpus()
    );

    let scan = CtScan::open(&input).stage(Stage::Load)?;
    let seg = segment_knee(&scan, &SegmentConfig::default())?;

    let plan = VariantPlan::default().with_seed(seed);
    let variants = build_variants(&seg.label, &plan)?;
    for v in variants.iter() {
        let path = out_dir.join(v.kind.file_name());
        v.label.save(&path).stage(Stage::Save)?;
        info!("Saved {} mask to {}", v.kind, path.display());
    }

    let report = LandmarkReport::from_variants(&variants);
    report
        .save_csv(out_dir.join(SUMMARY_CSV))
        .stage(Stage::Report)?;
    save_overlays(&scan, &variants, &report, &out_dir.join(VIZ_DIR)).stage(Stage::Visualize)?;

    let summaries = variants
        .iter()
        .map(|v| VolumeSummary::new(v.kind.to_string(), &v.label))
        .collect();
    Ok(KneeResult::new(seg.method, summaries, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_name() {
        assert_eq!(overlay_name(&VariantKind::Original), "original_mask.png");
        assert_eq!(
            overlay_name(&VariantKind::Expanded { mm: 2.0 }),
            "expanded_2mm_mask.png"
        );
        assert_eq!(
            overlay_name(&VariantKind::Random {
                index: 2,
                ratio: 0.4
            }),
            "random_mask_2.png"
        );
    }
}
