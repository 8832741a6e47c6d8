//! 分割评估: VOE / RVD / Dice / Jaccard / ASSD 五项指标.

use std::fmt;

use ndarray::{Array3, Axis};

use crate::consts::gray::GT_LIVER;
use crate::{CtMask, NiftiHeaderAttr};

/// 评估的运行时错误.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// 真值掩膜限制到健康肝脏标签后为空, 重叠指标无定义.
    EmptyGroundTruth,

    /// 待评分割为空, 表面距离无定义.
    EmptySegmentation,
}

/// 五项评估指标.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// 体积重叠误差, 百分比: `100 * (1 - |A∩B| / |A∪B|)`.
    pub voe: f64,

    /// 相对体积差, 百分比: `100 * |(|A| - |B|) / |B||`.
    pub rvd: f64,

    /// Dice 系数: `2|A∩B| / (|A| + |B|)`.
    pub dice: f64,

    /// Jaccard 指数: `|A∩B| / |A∪B|`.
    pub jaccard: f64,

    /// 平均对称表面距离, 以体素为单位.
    pub assd: f64,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VOE: {:.4}% | RVD: {:.4}% | Dice: {:.4} | Jaccard: {:.4} | ASSD: {:.4}",
            self.voe, self.rvd, self.dice, self.jaccard, self.assd
        )
    }
}

/// 将分割与真值掩膜比较, 计算五项指标.
///
/// 真值仅保留健康肝脏标签 ([`GT_LIVER`]), 肿瘤等其他标签视为背景;
/// 分割的前景为任意非零体素. 表面距离以体素为单位.
///
/// # 返回值
///
/// 真值 (限制后) 为空时返回 [`EvalError::EmptyGroundTruth`],
/// 分割为空时返回 [`EvalError::EmptySegmentation`].
/// 两者形状不一致时程序 panic.
pub fn evaluate(seg: &CtMask, gt: &CtMask) -> Result<Evaluation, EvalError> {
    assert_eq!(seg.shape(), gt.shape(), "分割与真值形状不一致");

    let seg_fg = seg.data().mapv(|p| p != 0);
    let gt_fg = gt.data().mapv(|p| p == GT_LIVER);

    let mut a = 0usize; // |A|
    let mut b = 0usize; // |B|
    let mut inter = 0usize; // |A∩B|
    for (&sa, &sb) in seg_fg.iter().zip(gt_fg.iter()) {
        a += sa as usize;
        b += sb as usize;
        inter += (sa && sb) as usize;
    }

    if b == 0 {
        return Err(EvalError::EmptyGroundTruth);
    }
    if a == 0 {
        return Err(EvalError::EmptySegmentation);
    }

    let union = a + b - inter;
    let jaccard = inter as f64 / union as f64;
    let dice = 2.0 * inter as f64 / (a + b) as f64;
    let voe = 100.0 * (1.0 - jaccard);
    let rvd = 100.0 * ((a as f64 - b as f64) / b as f64).abs();
    let assd = average_symmetric_surface_distance(&seg_fg, &gt_fg);

    Ok(Evaluation {
        voe,
        rvd,
        dice,
        jaccard,
        assd,
    })
}

/// 前景体素中, 6-邻域含背景或位于体积边界者构成表面.
fn surface_of(fg: &Array3<bool>) -> Array3<bool> {
    let &[z_len, h_len, w_len] = fg.shape() else {
        unreachable!()
    };
    let mut surf = Array3::<bool>::default(fg.raw_dim());
    for ((z, h, w), dst) in surf.indexed_iter_mut() {
        if !fg[(z, h, w)] {
            continue;
        }
        let at_border =
            z == 0 || h == 0 || w == 0 || z + 1 == z_len || h + 1 == h_len || w + 1 == w_len;
        *dst = at_border
            || !fg[(z - 1, h, w)]
            || !fg[(z + 1, h, w)]
            || !fg[(z, h - 1, w)]
            || !fg[(z, h + 1, w)]
            || !fg[(z, h, w - 1)]
            || !fg[(z, h, w + 1)];
    }
    surf
}

/// 双向平均对称表面距离. 两个集合必须非空.
fn average_symmetric_surface_distance(a: &Array3<bool>, b: &Array3<bool>) -> f64 {
    let surf_a = surface_of(a);
    let surf_b = surface_of(b);

    let dist_to_b = squared_edt(&surf_b);
    let dist_to_a = squared_edt(&surf_a);

    let mut sum = 0.0f64;
    let mut count = 0u64;
    for (pos, &s) in surf_a.indexed_iter() {
        if s {
            sum += dist_to_b[pos].sqrt();
            count += 1;
        }
    }
    for (pos, &s) in surf_b.indexed_iter() {
        if s {
            sum += dist_to_a[pos].sqrt();
            count += 1;
        }
    }
    debug_assert!(count > 0);
    sum / count as f64
}

/// 精确欧氏平方距离变换 (Felzenszwalb-Huttenlocher 下包络法).
///
/// 返回每个体素到最近 `site` 体素的平方距离场.
/// 若 `sites` 全空, 则场处处为无穷.
fn squared_edt(sites: &Array3<bool>) -> Array3<f64> {
    let mut d = sites.mapv(|s| if s { 0.0 } else { f64::INFINITY });
    for axis in [Axis(2), Axis(1), Axis(0)] {
        for mut lane in d.lanes_mut(axis) {
            let f: Vec<f64> = lane.iter().copied().collect();
            for (dst, v) in lane.iter_mut().zip(dt_1d(&f)) {
                *dst = v;
            }
        }
    }
    d
}

/// 一维平方距离下包络变换. 无穷高度的抛物线被跳过.
fn dt_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut out = vec![f64::INFINITY; n];

    // v: 包络抛物线的顶点横坐标; zleft: 各抛物线区间的左边界.
    let mut v: Vec<usize> = Vec::with_capacity(n);
    let mut zleft: Vec<f64> = Vec::with_capacity(n);

    for (q, &fq_raw) in f.iter().enumerate() {
        if fq_raw.is_infinite() {
            continue;
        }
        let fq = fq_raw + (q * q) as f64;
        let mut s = f64::NEG_INFINITY;
        while let Some(&p) = v.last() {
            let fp = f[p] + (p * p) as f64;
            s = (fq - fp) / (2.0 * (q - p) as f64);
            if s <= *zleft.last().unwrap() {
                v.pop();
                zleft.pop();
            } else {
                break;
            }
        }
        zleft.push(if v.is_empty() { f64::NEG_INFINITY } else { s });
        v.push(q);
    }

    if v.is_empty() {
        return out;
    }

    let mut k = 0usize;
    for (q, dst) in out.iter_mut().enumerate() {
        while k + 1 < v.len() && zleft[k + 1] < q as f64 {
            k += 1;
        }
        let p = v[k];
        let dq = q as f64 - p as f64;
        *dst = dq * dq + f[p];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Idx3d;
    use ndarray::Array3;

    /// 3D 索引间的平方欧氏距离.
    fn sq_dist(a: Idx3d, b: Idx3d) -> f64 {
        let d = |x: usize, y: usize| (x as f64 - y as f64).powi(2);
        d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
    }

    fn box_mask(z: std::ops::Range<usize>, h: std::ops::Range<usize>, w: std::ops::Range<usize>) -> CtMask {
        let mut data = Array3::<u8>::zeros((8, 8, 8));
        for zi in z {
            for hi in h.clone() {
                for wi in w.clone() {
                    data[(zi, hi, wi)] = 1;
                }
            }
        }
        CtMask::fake(data, [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_identical_masks_perfect_scores() {
        let m = box_mask(2..6, 2..6, 2..6);
        let ev = evaluate(&m, &m).unwrap();
        assert_eq!(ev.voe, 0.0);
        assert_eq!(ev.rvd, 0.0);
        assert_eq!(ev.dice, 1.0);
        assert_eq!(ev.jaccard, 1.0);
        assert_eq!(ev.assd, 0.0);
    }

    #[test]
    fn test_empty_ground_truth_is_error() {
        let seg = box_mask(2..6, 2..6, 2..6);
        let gt = box_mask(0..0, 0..0, 0..0);
        assert!(matches!(
            evaluate(&seg, &gt),
            Err(EvalError::EmptyGroundTruth)
        ));
    }

    #[test]
    fn test_tumor_labels_excluded_from_ground_truth() {
        let seg = box_mask(2..6, 2..6, 2..6);
        // 真值只有肿瘤标签: 限制到健康肝脏后为空.
        let mut data = Array3::<u8>::zeros((8, 8, 8));
        data[(3, 3, 3)] = 2;
        let gt = CtMask::fake(data, [1.0, 1.0, 1.0]);
        assert!(matches!(
            evaluate(&seg, &gt),
            Err(EvalError::EmptyGroundTruth)
        ));
    }

    #[test]
    fn test_empty_segmentation_is_error() {
        let seg = box_mask(0..0, 0..0, 0..0);
        let gt = box_mask(2..6, 2..6, 2..6);
        assert!(matches!(
            evaluate(&seg, &gt),
            Err(EvalError::EmptySegmentation)
        ));
    }

    #[test]
    fn test_overlap_metrics_known_values() {
        // A = 2 体素, B = 1 体素, 交 = 1, 并 = 2.
        let seg = box_mask(0..1, 0..1, 0..2);
        let gt = box_mask(0..1, 0..1, 0..1);
        let ev = evaluate(&seg, &gt).unwrap();
        assert!((ev.jaccard - 0.5).abs() < 1e-12);
        assert!((ev.dice - 2.0 / 3.0).abs() < 1e-12);
        assert!((ev.voe - 50.0).abs() < 1e-12);
        assert!((ev.rvd - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_squared_edt_small_grid() {
        let mut sites = Array3::<bool>::default((3, 3, 3));
        sites[(0, 0, 0)] = true;
        sites[(2, 2, 2)] = true;
        let d = squared_edt(&sites);
        assert_eq!(d[(0, 0, 0)], 0.0);
        assert_eq!(d[(2, 2, 2)], 0.0);
        for (pos, &v) in d.indexed_iter() {
            let expect = sq_dist(pos, (0, 0, 0)).min(sq_dist(pos, (2, 2, 2)));
            assert!((v - expect).abs() < 1e-9, "{pos:?}: {v} != {expect}");
        }
    }

    #[test]
    fn test_squared_edt_no_sites_is_infinite() {
        let sites = Array3::<bool>::default((2, 2, 2));
        let d = squared_edt(&sites);
        assert!(d.iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_assd_unit_shift() {
        // 两个单体素掩膜相距 3: 双向距离均为 3.
        let seg = box_mask(1..2, 1..2, 1..2);
        let gt = box_mask(1..2, 1..2, 4..5);
        let ev = evaluate(&seg, &gt).unwrap();
        assert!((ev.assd - 3.0).abs() < 1e-9);
    }
}
