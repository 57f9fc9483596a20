//! 領域抽出
//!
//! フレーム中心に固定サイズの正方形ROIを切り出す。
//! ROIはイテレーションごとに新規に導出され、保持されない。

use crate::domain::{Frame, Roi};
use image::{Rgb, RgbImage};

/// フレーム中心のROIをRGB画像として切り出す
///
/// フレームが不在・サイズ不足・データ不正の場合は `None`
/// （エラーではなく、そのイテレーションをスキップする条件）。
pub fn extract_centered(frame: &Frame, size: u32) -> Option<RgbImage> {
    let roi = Roi::centered(size, frame.width, frame.height)?;
    if !frame.is_well_formed() {
        return None;
    }

    let stride = frame.width as usize * 3;
    let mut out = RgbImage::new(size, size);
    for y in 0..size {
        let row = (roi.y + y) as usize * stride;
        for x in 0..size {
            let idx = row + (roi.x + x) as usize * 3;
            // デバイスネイティブのBGR順からRGBへ
            let b = frame.data[idx];
            let g = frame.data[idx + 1];
            let r = frame.data[idx + 2];
            out.put_pixel(x, y, Rgb([r, g, b]));
        }
    }
    Some(out)
}
