//! 灰度域滤波器: 裁剪、均值模糊、阈值化、直方图均衡、sigmoid 对比度增强、掩膜.

use ndarray::{s, Array3, Axis, Zip};

use crate::consts::params::SIGMOID_ROI_EDGE;
use crate::{CtMask, CtVolume, Idx2d, NiftiHeaderAttr};

/// 裁剪体积, 只保留宽度方向的左半部分 (病人的右侧, 肝脏主要所在).
///
/// 新宽度为 `w / 2` (向下取整), header 的 dim 字段会被同步.
pub fn crop_right_half(vol: &CtVolume) -> CtVolume {
    let (_, _, w) = vol.shape();
    let keep = w / 2;
    let data = vol.data().slice(s![.., .., ..keep]).to_owned();
    vol.with_data(data)
}

/// 对体积应用 box 均值模糊.
///
/// 邻域为 `(2r+1)^3` 立方体, 按三个轴做可分离均值, 边界按复制处理.
///
/// 如果 `radius < 1` 则程序 panic.
pub fn mean_filter(vol: &CtVolume, radius: usize) -> CtVolume {
    assert!(radius >= 1, "半径必须大于等于 1");
    let mut data = vol.data().to_owned();
    for axis in [Axis(2), Axis(1), Axis(0)] {
        data = box_pass(&data, axis, radius);
    }
    vol.with_data(data)
}

/// 沿单轴做一维 box 均值. 窗口越界部分以边缘值复制.
fn box_pass(data: &Array3<f32>, axis: Axis, radius: usize) -> Array3<f32> {
    let mut out = data.clone();
    Zip::from(out.lanes_mut(axis))
        .and(data.lanes(axis))
        .for_each(|mut dst, src| {
            let n = src.len();
            let r = radius as isize;
            for i in 0..n {
                let mut acc = 0.0f64;
                for j in (i as isize - r)..=(i as isize + r) {
                    let j = j.clamp(0, n as isize - 1) as usize;
                    acc += src[j] as f64;
                }
                dst[i] = (acc / (2 * radius + 1) as f64) as f32;
            }
        });
    out
}

/// 对体积做区间阈值化.
///
/// HU 值位于 `[lower, upper]` 的体素映射为 `inside`, 其余映射为 `outside`.
/// 如果 `lower > upper` 则程序 panic.
pub fn threshold(vol: &CtVolume, lower: f32, upper: f32, inside: u8, outside: u8) -> CtMask {
    assert!(lower <= upper, "阈值下界不能大于上界");
    let data = vol
        .data()
        .mapv(|v| if (lower..=upper).contains(&v) { inside } else { outside });
    CtMask::with_header_of(vol, data)
}

/// 对体积做直方图均衡.
///
/// 等价于向一个 512 步的线性 ramp 参考图像做直方图匹配:
/// 以 256 个灰度桶统计全体积直方图, 按 CDF 将体素重映射到
/// `[0, 255 * 511/512]` 区间.
pub fn histogram_equalization(vol: &CtVolume) -> CtVolume {
    const LEVELS: usize = 256;
    const RAMP_MAX: f64 = 255.0 * 511.0 / 512.0;

    let data = vol.data();
    let min = data.iter().copied().fold(f32::INFINITY, f32::min);
    let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if min >= max {
        // 常值体积没有可均衡的对比度.
        return vol.clone();
    }

    let span = (max - min) as f64;
    let bin_of = |v: f32| -> usize {
        let t = ((v - min) as f64 / span * LEVELS as f64) as usize;
        t.min(LEVELS - 1)
    };

    let mut hist = [0usize; LEVELS];
    for &v in data.iter() {
        hist[bin_of(v)] += 1;
    }
    let mut cdf = [0usize; LEVELS];
    let mut acc = 0usize;
    for (dst, cnt) in cdf.iter_mut().zip(hist.iter()) {
        acc += cnt;
        *dst = acc;
    }

    let total = vol.size();
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let denom = (total - cdf_min).max(1) as f64;

    let out = data.mapv(|v| {
        let c = cdf[bin_of(v)];
        ((c.saturating_sub(cdf_min)) as f64 / denom * RAMP_MAX) as f32
    });
    vol.with_data(out)
}

/// sigmoid 对比度增强.
///
/// 在 `slice_idx` 切片上, 以 `pixel` 为角点取一个
/// [`SIGMOID_ROI_EDGE`]×[`SIGMOID_ROI_EDGE`] 的 ROI (越界部分截断到切片内),
/// 令 α = ROI 最大值 − 最小值, β = ROI 平均值, 然后对整个体积应用
///
/// `f(x) = (Max − Min) / (1 + e^(−(x−β)/α)) + Min`,
///
/// 其中 Max/Min 为所选切片的最大/最小 HU 值.
///
/// 如果 `slice_idx` 越界则程序 panic.
pub fn sigmoid_filter(vol: &CtVolume, slice_idx: usize, pixel: Idx2d) -> CtVolume {
    let sli = vol.slice_at(slice_idx);
    let (input_min, input_max) = sli.min_max();

    let (h_len, w_len) = sli.shape();
    let h0 = pixel.0.min(h_len.saturating_sub(1));
    let w0 = pixel.1.min(w_len.saturating_sub(1));
    let h1 = (h0 + SIGMOID_ROI_EDGE).min(h_len);
    let w1 = (w0 + SIGMOID_ROI_EDGE).min(w_len);

    let roi = sli.array_view().slice(s![h0..h1, w0..w1]).to_owned();
    let roi_min = roi.iter().copied().fold(f32::INFINITY, f32::min);
    let roi_max = roi.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let roi_mean = (roi.iter().map(|&v| v as f64).sum::<f64>() / roi.len() as f64) as f32;

    // 常值 ROI 会让指数退化为 0/0, 钳到极小正数.
    let alpha = (roi_max - roi_min).max(f32::EPSILON);
    let beta = roi_mean;
    let span = input_max - input_min;

    let out = vol
        .data()
        .mapv(|x| span / (1.0 + (-(x - beta) / alpha).exp()) + input_min);
    vol.with_data(out)
}

/// 将掩膜应用到体积上.
///
/// 掩膜非零处保留原 HU 值, 其余体素写为体积的最小 HU 值.
/// 如果两者形状不一致则程序 panic.
pub fn mask_filter(vol: &CtVolume, mask: &CtMask) -> CtVolume {
    assert_eq!(vol.shape(), mask.shape(), "体积与掩膜形状不一致");
    let outside = vol.min_value();
    let mut out = vol.data().to_owned();
    Zip::from(&mut out).and(mask.data()).for_each(|v, &m| {
        if m == 0 {
            *v = outside;
        }
    });
    vol.with_data(out)
}
