//! 预处理滤波器集合.
//!
//! 每个滤波器接受一个体积/掩膜和若干参数, 返回同网格形状的新值
//! (显式裁剪除外). 所有基于半径的滤波器在 `radius < 1` 时 panic.

mod intensity;
mod morph;

pub use intensity::{
    crop_right_half, histogram_equalization, mask_filter, mean_filter, sigmoid_filter, threshold,
};
pub use morph::{binary_closing, binary_closing_br, binary_opening, dilate, erode};
