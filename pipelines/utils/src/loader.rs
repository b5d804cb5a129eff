//! 输入/输出路径以及随机种子的解析. 只读取环境变量, 不解析命令行.

use bone_berry::{BoneError, BoneResult};
use std::env;
use std::path::{Path, PathBuf};

/// 默认输入文件名.
pub const DEFAULT_INPUT: &str = "3702_left_knee.nii.gz";

/// 默认输出目录.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 读取非空环境变量.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// 获取输入 CT 路径.
///
/// 1. 若环境变量 `$KNEE_CT_INPUT` 非空, 则返回其值;
/// 2. 否则, 若 `data/3702_left_knee.nii.gz` 存在, 则返回它;
/// 3. 否则, 若 `$HOME/dataset/knee/3702_left_knee.nii.gz` 存在, 则返回它;
/// 4. 否则返回 `Err`.
pub fn input_from_env_or_home() -> BoneResult<PathBuf> {
    if let Some(p) = non_empty_var("KNEE_CT_INPUT") {
        return Ok(PathBuf::from(p));
    }
    let local = Path::new("data").join(DEFAULT_INPUT);
    if local.is_file() {
        return Ok(local);
    }
    match home_dataset_dir_with(["knee", DEFAULT_INPUT]) {
        Some(p) if p.is_file() => Ok(p),
        _ => Err(BoneError::MissingInput(local)),
    }
}

/// 获取输出目录.
///
/// 1. 若环境变量 `$KNEE_CT_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `output`.
pub fn output_dir_from_env() -> PathBuf {
    non_empty_var("KNEE_CT_OUTPUT_DIR").map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), PathBuf::from)
}

/// 解析随机种子.
fn parse_seed(s: &str) -> BoneResult<u64> {
    s.trim()
        .parse()
        .map_err(|e| BoneError::invalid_parameter(format!("invalid KNEE_CT_SEED `{s}`: {e}")))
}

/// 获取随机种子. `$KNEE_CT_SEED` 未设置时返回 `Ok(None)`, 无法解析时返回 `Err`.
pub fn seed_from_env() -> BoneResult<Option<u64>> {
    non_empty_var("KNEE_CT_SEED").map(|s| parse_seed(&s)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert_eq!(parse_seed(" 7 ").unwrap(), 7);
        assert!(parse_seed("-1").is_err());
        assert!(parse_seed("abc").is_err());
    }

    #[test]
    fn test_home_dataset_dir() {
        if let Some(p) = home_dataset_dir_with(["knee", DEFAULT_INPUT]) {
            assert!(p.ends_with("dataset/knee/3702_left_knee.nii.gz"));
        }
    }
}
