//! マスク整形
//!
//! 矩形構造要素による2値膨張で、ノイズや部分遮蔽によるマスクの
//! 小さな欠落を埋める。各バンドのマスクへ個別に適用したのちにOR結合
//! する順序が前提（OR後の膨張はより粗い別アルゴリズムになる）。

use image::{GrayImage, Luma};

use super::segment::MASK_ON;

/// 矩形カーネルによる2値膨張
///
/// アンカーは `(k/2, k/2)`（OpenCVの既定と同じ）。偶数カーネルは
/// 下右方向に広がる。カーネル0は1として扱い、反復回数0は恒等変換。
/// 膨張は単調で、出力の真ピクセル集合は入力の上位集合になる。
pub fn dilate(mask: &GrayImage, kernel: u32, iterations: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let kernel = kernel.max(1);
    let anchor = (kernel / 2) as i64;

    let mut current = mask.clone();
    for _ in 0..iterations {
        let mut next = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if window_any_on(&current, x, y, kernel, anchor) {
                    next.put_pixel(x, y, Luma([MASK_ON]));
                }
            }
        }
        current = next;
    }
    current
}

/// カーネル窓内に真ピクセルがあるか
#[inline]
fn window_any_on(mask: &GrayImage, x: u32, y: u32, kernel: u32, anchor: i64) -> bool {
    let (width, height) = mask.dimensions();
    for ky in 0..kernel as i64 {
        for kx in 0..kernel as i64 {
            let sx = x as i64 + kx - anchor;
            let sy = y as i64 + ky - anchor;
            if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
                continue;
            }
            if mask.get_pixel(sx as u32, sy as u32)[0] != 0 {
                return true;
            }
        }
    }
    false
}
