//! 水平切片的轻量级视图与二维统计操作.

use std::collections::VecDeque;
use std::ops::Index;

use itertools::{Itertools, MinMaxResult};
use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;

use crate::{Area2d, Areas2d, Idx2d, Predicate};

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 不可变、借用的二维水平 CT 扫描切片.
pub struct VolumeSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CtVolume`].
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for VolumeSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> VolumeSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 求切片的最小/最大 HU 值. 切片必须非空, 否则程序 panic.
    pub fn min_max(&self) -> (f32, f32) {
        match self.data.iter().copied().map(OrderedFloat).minmax() {
            MinMaxResult::NoElements => panic!("切片不能为空"),
            MinMaxResult::OneElement(v) => (v.0, v.0),
            MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
        }
    }

    /// 求切片所有像素的平均 HU 值. 切片必须非空.
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        sum / (self.size() as f64)
    }
}

/// 不可变、借用的二维水平掩膜/标注切片.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CtMask`].
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> MaskSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, u8>) -> Self {
        Self { data }
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 判断一个索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 统计图像中值为 `label` 的像素总个数.
    #[inline]
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|&p| *p == label).count()
    }

    /// 统计图像中非零像素总个数.
    #[inline]
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&p| *p != 0).count()
    }

    /// 该图是否为全背景图?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|&p| p == 0)
    }

    /// 以行优先规则获取所有满足谓词 `pred` 的像素索引.
    pub fn positions(&self, pred: Predicate) -> Vec<Idx2d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, &pix)| pred(pix).then_some(pos))
            .collect()
    }

    /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
    pub fn n4_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
        neighbour4(pos)
            .into_iter()
            .filter(|p| self.check(*p))
            .collect()
    }

    /// 按照 4-相邻规则获取所有区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
    /// 当且仅当存在一条从 `p1` 到 `p2` 的 4-相邻路径, 且路径上的所有像素
    /// (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
    ///
    /// 区域按首像素的行优先顺序产出, 区域内部为 BFS 顺序.
    pub fn areas(&self, pred: Predicate) -> Areas2d {
        let mut visited = Array2::<bool>::default(self.shape());
        let mut ans: Areas2d = Vec::new();

        for (start, &pix) in self.data.indexed_iter() {
            if visited[start] || !pred(pix) {
                continue;
            }

            let mut area: Area2d = Vec::new();
            let mut q: VecDeque<Idx2d> = VecDeque::new();
            visited[start] = true;
            q.push_back(start);

            while let Some(cur) = q.pop_front() {
                area.push(cur);
                for neigh in self.n4_positions(cur) {
                    if !visited[neigh] && pred(self[neigh]) {
                        visited[neigh] = true;
                        q.push_back(neigh);
                    }
                }
            }
            ans.push(area);
        }
        ans
    }
}
