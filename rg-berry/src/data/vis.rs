//! 切片的可视化持久化存储.

use std::path::Path;

use image::ImageResult;

use super::{MaskSlice, VolumeSlice};
use crate::consts::gray::*;
use crate::CtWindow;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好"
/// 的方式保存, 而不是 "as is" 的方式. 对于 [`MaskSlice`] 这类仅存在小标签值的图像,
/// 在保存时会映射到肉眼较易区分的灰度; 对于 [`VolumeSlice`] 这类以 CT HU
/// 值存储的扫描, 在保存时会用常见的肝脏可视化窗口规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使像素更有利于单通道可视化.
#[inline]
fn pretty(label: u8) -> u8 {
    match label {
        // 背景为黑色
        GT_BACKGROUND => BLACK,

        // 肝脏/掩膜前景为白色
        GT_LIVER => WHITE,

        // 让肿瘤颜色更接近肝脏颜色
        GT_TUMOR => LIGHT_GRAY,

        any_else => panic!("只允许图像存在 0, 1, 2 像素, 但发现了 `{any_else}`"),
    }
}

/// 会将背景/前景/肿瘤像素分别映射为黑色/白色/亮灰色. 不允许其他标签值.
impl ImgWriteVis for MaskSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.array_view().indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pretty(pix)]));
        }
        buf.save(path)
    }
}

/// 窗位 60, 窗宽 200.
impl ImgWriteVis for VolumeSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        const WINDOW: CtWindow = CtWindow::from_liver_visual();
        for ((h, w), &hu) in self.array_view().indexed_iter() {
            let gray = WINDOW.eval(hu).unwrap_or(u8::MIN);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CtMask, CtVolume};
    use ndarray::Array3;

    fn temp_png(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rg-berry-vis-{name}-{}.png", std::process::id()));
        p
    }

    #[test]
    fn test_mask_slice_save() {
        let mut data = Array3::<u8>::zeros((1, 4, 4));
        data[(0, 1, 1)] = 1;
        data[(0, 2, 2)] = 2;
        let mask = CtMask::fake(data, [1.0, 1.0, 1.0]);
        let path = temp_png("mask");
        mask.slice_at(0).save(&path).unwrap();
        assert!(path.is_file());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_volume_slice_save() {
        let mut data = Array3::<f32>::zeros((1, 4, 4));
        data[(0, 0, 0)] = -1000.0;
        data[(0, 3, 3)] = 400.0;
        let vol = CtVolume::fake(data, [1.0, 1.0, 1.0]);
        let path = temp_png("vol");
        vol.slice_at(0).save(&path).unwrap();
        assert!(path.is_file());
        std::fs::remove_file(&path).unwrap();
    }
}
