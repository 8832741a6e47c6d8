//! 归档文件 I/O.
//!
//! 约定的归档布局为 `{用户主目录}/liver/<归档名>.zip`, 其内含待读取的 nii
//! 成员文件. 成员先被解压到 `{用户主目录}/liver/temp`, 读取完成后
//! 无论成败该临时目录都会被删除.
//!
//! # 注意
//!
//! 临时目录是固定路径, 并发运行的两个进程会在该路径上竞争. 单进程流水线下
//! 这不构成问题.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::{CtMask, CtVolume};

/// 读取归档错误.
#[derive(Debug)]
pub enum ReadArchiveError {
    /// 无法定位用户主目录.
    NoHomeDir,

    /// 底层 I/O 错误 (归档文件缺失、临时目录不可写等).
    Io(std::io::Error),

    /// zip 归档格式错误或成员缺失.
    Zip(ZipError),

    /// 成员不是合法的 nii 体积.
    Nifti(nifti::NiftiError),
}

impl From<std::io::Error> for ReadArchiveError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ZipError> for ReadArchiveError {
    fn from(e: ZipError) -> Self {
        Self::Zip(e)
    }
}

impl From<nifti::NiftiError> for ReadArchiveError {
    fn from(e: nifti::NiftiError) -> Self {
        Self::Nifti(e)
    }
}

/// 获取 `{用户主目录}/liver` 目录.
pub fn home_liver_dir() -> Result<PathBuf, ReadArchiveError> {
    let mut ans = dirs::home_dir().ok_or(ReadArchiveError::NoHomeDir)?;
    ans.push("liver");
    Ok(ans)
}

/// 从 zip 归档中读取 nii 格式的 CT 扫描体积.
///
/// `archive_name` 相对于 `{用户主目录}/liver` 解析, `file_name`
/// 为归档内的成员名. 读取尝试结束后 (无论成败) 临时解压目录都会被删除.
pub fn zipped_volume(archive_name: &str, file_name: &str) -> Result<CtVolume, ReadArchiveError> {
    let base = home_liver_dir()?;
    let ans = read_via_temp(&base, archive_name, file_name, |p| {
        CtVolume::open(p).map_err(ReadArchiveError::from)
    });
    cleanup_temp(&base);
    ans
}

/// 从 zip 归档中读取 nii 格式的掩膜/标注体积.
///
/// 语义与 [`zipped_volume`] 相同.
pub fn zipped_mask(archive_name: &str, file_name: &str) -> Result<CtMask, ReadArchiveError> {
    let base = home_liver_dir()?;
    let ans = read_via_temp(&base, archive_name, file_name, |p| {
        CtMask::open(p).map_err(ReadArchiveError::from)
    });
    cleanup_temp(&base);
    ans
}

/// 将成员解压到临时目录并执行读取闭包.
fn read_via_temp<T>(
    base: &Path,
    archive_name: &str,
    file_name: &str,
    read: impl FnOnce(&Path) -> Result<T, ReadArchiveError>,
) -> Result<T, ReadArchiveError> {
    let archive_path = base.join(archive_name);
    let mut zip = ZipArchive::new(File::open(archive_path)?)?;
    let mut entry = zip.by_name(file_name)?;

    let dest = base.join("temp").join(file_name);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&dest)?;
    std::io::copy(&mut entry, &mut out)?;
    drop(out);

    read(&dest)
}

/// 删除临时解压目录. 目录不存在时静默成功.
fn cleanup_temp(base: &Path) {
    let _ = fs::remove_dir_all(base.join("temp"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NiftiHeaderAttr;
    use ndarray::Array3;
    use std::io::Write;

    #[test]
    fn test_missing_archive_is_io_error() {
        if dirs::home_dir().is_none() {
            return;
        }
        let ans = zipped_volume("does-not-exist.zip", "vol.nii");
        assert!(matches!(ans, Err(ReadArchiveError::Io(_))));
    }

    #[test]
    fn test_missing_member_is_zip_error() {
        let Some(_) = dirs::home_dir() else { return };

        // 在系统临时目录下准备一个只含占位成员的归档,
        // 以绝对路径传入 (join 会以绝对路径覆盖基目录).
        let mut archive_path = std::env::temp_dir();
        archive_path.push(format!("rg-berry-empty-{}.zip", std::process::id()));
        {
            let file = File::create(&archive_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            writer
                .start_file("placeholder.txt", zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(b"x").unwrap();
            writer.finish().unwrap();
        }

        let ans = zipped_volume(archive_path.to_str().unwrap(), "vol.nii");
        assert!(matches!(ans, Err(ReadArchiveError::Zip(_))));
        fs::remove_file(&archive_path).unwrap();
    }

    #[test]
    fn test_zipped_mask_roundtrip_and_cleanup() {
        let Some(_) = dirs::home_dir() else { return };

        let mut data = Array3::<u8>::zeros((2, 4, 4));
        data[(0, 1, 2)] = 1;
        data[(1, 3, 3)] = 2;
        let mask = crate::CtMask::fake(data, [2.0, 1.0, 1.0]);

        let pid = std::process::id();
        let mut nii_path = std::env::temp_dir();
        nii_path.push(format!("rg-berry-roundtrip-{pid}.nii"));
        mask.save(&nii_path).unwrap();

        let mut archive_path = std::env::temp_dir();
        archive_path.push(format!("rg-berry-roundtrip-{pid}.zip"));
        {
            let file = File::create(&archive_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            writer
                .start_file("gt.nii", zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(&fs::read(&nii_path).unwrap()).unwrap();
            writer.finish().unwrap();
        }

        let loaded = zipped_mask(archive_path.to_str().unwrap(), "gt.nii").unwrap();
        assert_eq!(loaded.shape(), (2, 4, 4));
        assert_eq!(loaded[(0, 1, 2)], 1);
        assert_eq!(loaded[(1, 3, 3)], 2);
        assert_eq!(loaded.count_nonzero(), 2);

        // 读取结束后临时目录必须已被清理.
        let temp_dir = home_liver_dir().unwrap().join("temp");
        assert!(!temp_dir.exists());

        fs::remove_file(&nii_path).unwrap();
        fs::remove_file(&archive_path).unwrap();
    }
}
