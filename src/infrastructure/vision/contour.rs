//! 候補領域抽出とターゲット選択
//!
//! 結合マスクから4近傍連結成分を抽出し、最大面積の候補を選ぶ。
//! 候補は真ピクセルの連結集合として定義されるため、領域内部の穴が
//! 独立した候補になることはない（外側境界のみ）。

use crate::domain::AimOffset;
use image::GrayImage;
use std::collections::VecDeque;

/// 候補領域の軸平行バウンディングボックス（ROIローカル座標）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 候補領域（4近傍連結成分）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    /// 面積（真ピクセル数）
    pub area: u32,
    /// バウンディングボックス
    pub bbox: BoundingBox,
}

/// マスクから候補領域をラスタ走査順に抽出
///
/// 返り値の順序は各成分が最初に発見されたピクセルの走査順。
pub fn find_blobs(mask: &GrayImage) -> Vec<Blob> {
    let (width, height) = mask.dimensions();
    let mut visited = vec![false; (width * height) as usize];
    let mut blobs = Vec::new();

    let index = |x: u32, y: u32| (y * width + x) as usize;

    for y in 0..height {
        for x in 0..width {
            if mask.get_pixel(x, y)[0] == 0 || visited[index(x, y)] {
                continue;
            }

            // BFSで1成分を収集
            let mut area = 0u32;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
            let mut queue = VecDeque::new();
            visited[index(x, y)] = true;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                area += 1;
                min_x = min_x.min(cx);
                min_y = min_y.min(cy);
                max_x = max_x.max(cx);
                max_y = max_y.max(cy);

                let mut push = |nx: u32, ny: u32, visited: &mut Vec<bool>| {
                    if mask.get_pixel(nx, ny)[0] != 0 && !visited[index(nx, ny)] {
                        visited[index(nx, ny)] = true;
                        queue.push_back((nx, ny));
                    }
                };
                if cx > 0 {
                    push(cx - 1, cy, &mut visited);
                }
                if cx + 1 < width {
                    push(cx + 1, cy, &mut visited);
                }
                if cy > 0 {
                    push(cx, cy - 1, &mut visited);
                }
                if cy + 1 < height {
                    push(cx, cy + 1, &mut visited);
                }
            }

            blobs.push(Blob {
                area,
                bbox: BoundingBox {
                    x: min_x,
                    y: min_y,
                    width: max_x - min_x + 1,
                    height: max_y - min_y + 1,
                },
            });
        }
    }

    blobs
}

/// 最大面積の候補を選択し、照準オフセットを導出する
///
/// 面積ゲートは厳密比較: `area > min_area` のみ通過
/// （面積がちょうど `min_area` の候補は棄却）。
/// 同面積の候補は走査順で先に見つかったものを保持する。
///
/// アンカーはバウンディングボックスの上辺中央 `(x + w/2, y)` で、
/// ROI中心相対へ `(S/2, S/2)` を各軸独立に減算して変換する。
pub fn select_target(blobs: &[Blob], min_area: u32, roi_size: u32) -> Option<AimOffset> {
    let mut best: Option<&Blob> = None;
    for blob in blobs {
        if best.map_or(true, |current| blob.area > current.area) {
            best = Some(blob);
        }
    }

    let blob = best?;
    if blob.area <= min_area {
        return None;
    }

    let bbox = blob.bbox;
    let anchor_x = (bbox.x + bbox.width / 2) as i32;
    let anchor_y = bbox.y as i32;
    let half = (roi_size / 2) as i32;
    Some(AimOffset::new(anchor_x - half, anchor_y - half))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    use crate::infrastructure::vision::segment::MASK_ON;

    fn mask_with_rect(size: u32, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        let mut mask = GrayImage::new(size, size);
        fill_rect(&mut mask, x, y, w, h);
        mask
    }

    fn fill_rect(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([MASK_ON]));
            }
        }
    }

    #[test]
    fn test_find_blobs_single_rect() {
        let mask = mask_with_rect(100, 45, 45, 10, 10);
        let blobs = find_blobs(&mask);

        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 100);
        assert_eq!(
            blobs[0].bbox,
            BoundingBox {
                x: 45,
                y: 45,
                width: 10,
                height: 10
            }
        );
    }

    #[test]
    fn test_find_blobs_empty_mask() {
        let mask = GrayImage::new(50, 50);
        assert!(find_blobs(&mask).is_empty());
    }

    #[test]
    fn test_find_blobs_diagonal_pixels_are_separate() {
        // 斜め接触は4近傍では非連結
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(2, 2, Luma([MASK_ON]));
        mask.put_pixel(3, 3, Luma([MASK_ON]));

        assert_eq!(find_blobs(&mask).len(), 2);
    }

    #[test]
    fn test_find_blobs_ring_hole_is_not_a_candidate() {
        // 1ピクセル幅のリング: 穴の内側は候補にならない
        let mut mask = GrayImage::new(12, 12);
        fill_rect(&mut mask, 2, 2, 6, 1);
        fill_rect(&mut mask, 2, 7, 6, 1);
        fill_rect(&mut mask, 2, 3, 1, 4);
        fill_rect(&mut mask, 7, 3, 1, 4);

        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 20);
        assert_eq!(
            blobs[0].bbox,
            BoundingBox {
                x: 2,
                y: 2,
                width: 6,
                height: 6
            }
        );
    }

    #[test]
    fn test_select_target_anchor_math() {
        // (45,45)起点の10x10矩形、ROI 100 → 上辺中央(50,45) → (0,-5)
        let mask = mask_with_rect(100, 45, 45, 10, 10);
        let blobs = find_blobs(&mask);
        let offset = select_target(&blobs, 5, 100);
        assert_eq!(offset, Some(AimOffset::new(0, -5)));
    }

    #[test]
    fn test_select_target_negative_quadrant() {
        // 左上寄りの矩形は両軸とも負のオフセット
        let mask = mask_with_rect(100, 10, 20, 4, 6);
        let blobs = find_blobs(&mask);
        let offset = select_target(&blobs, 5, 100);
        assert_eq!(offset, Some(AimOffset::new(12 - 50, 20 - 50)));
    }

    #[test]
    fn test_select_target_gate_is_strict() {
        // 面積ちょうど5は棄却、6は通過
        let mask5 = mask_with_rect(50, 10, 10, 5, 1);
        let blobs5 = find_blobs(&mask5);
        assert_eq!(blobs5[0].area, 5);
        assert!(select_target(&blobs5, 5, 50).is_none());

        let mask6 = mask_with_rect(50, 10, 10, 6, 1);
        let blobs6 = find_blobs(&mask6);
        assert!(select_target(&blobs6, 5, 50).is_some());
    }

    #[test]
    fn test_select_target_empty_yields_none() {
        assert!(select_target(&[], 5, 100).is_none());
    }

    #[test]
    fn test_select_target_picks_larger_regardless_of_order() {
        // 大きい方が後に発見されるレイアウト
        let mut mask = GrayImage::new(100, 100);
        fill_rect(&mut mask, 5, 5, 3, 3); // 面積9、先に発見
        fill_rect(&mut mask, 60, 70, 5, 5); // 面積25、後に発見

        let blobs = find_blobs(&mask);
        let offset = select_target(&blobs, 5, 100).expect("Target should be selected");
        assert_eq!(offset, AimOffset::new(62 - 50, 70 - 50));

        // 大きい方が先に発見されるレイアウトでも同じ選択
        let mut mask = GrayImage::new(100, 100);
        fill_rect(&mut mask, 5, 5, 5, 5); // 面積25、先に発見
        fill_rect(&mut mask, 60, 70, 3, 3); // 面積9、後に発見

        let blobs = find_blobs(&mask);
        let offset = select_target(&blobs, 5, 100).expect("Target should be selected");
        assert_eq!(offset, AimOffset::new(7 - 50, 5 - 50));
    }

    #[test]
    fn test_select_target_tie_keeps_first_in_scan_order() {
        // 同面積の候補は走査順で先のものを採用
        let mut mask = GrayImage::new(100, 100);
        fill_rect(&mut mask, 10, 10, 4, 4); // 先に発見
        fill_rect(&mut mask, 60, 60, 4, 4); // 同面積、後に発見

        let blobs = find_blobs(&mask);
        let offset = select_target(&blobs, 5, 100).expect("Target should be selected");
        assert_eq!(offset, AimOffset::new(12 - 50, 10 - 50));
    }
}
