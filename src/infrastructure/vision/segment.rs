//! 色空間分割
//!
//! ROIをHSV表現へ変換し、カラーバンドごとの2値マスクを生成する。
//! バンドの判定は3チャンネルすべて包括レンジ。2バンドのマスクは
//! それぞれ膨張処理を経たのちに論理ORで結合される（morphology参照）。

use crate::domain::ColorBand;
use image::{GrayImage, Luma, RgbImage};

/// マスクの「真」を表すピクセル値
pub const MASK_ON: u8 = 255;

/// RGB値をOpenCV準拠のHSVへ変換（H[0-180), S[0-255], V[0-255]）
///
/// 色相はネイティブモジュラス（360度→180値）で折り返す。
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;

    if max == 0 || max == min {
        // 無彩色: 色相は定義されないため0
        let s = 0;
        return (0, s, v);
    }

    let diff = f32::from(max - min);
    let s = (255.0 * diff / f32::from(max)).round() as u8;

    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let mut hue = if max == r {
        60.0 * (gf - bf) / diff
    } else if max == g {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let mut h = (hue / 2.0).round() as u16;
    if h >= 180 {
        h -= 180;
    }

    (h as u8, s, v)
}

/// 1バンド分の2値マスクを生成
///
/// ピクセルのHSV値が3チャンネルすべてレンジ内（包括）なら真。
pub fn band_mask(roi: &RgbImage, band: &ColorBand) -> GrayImage {
    let (width, height) = roi.dimensions();
    let mut mask = GrayImage::new(width, height);
    for (x, y, pixel) in roi.enumerate_pixels() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        if band.contains(h, s, v) {
            mask.put_pixel(x, y, Luma([MASK_ON]));
        }
    }
    mask
}

/// 2つのマスクを論理ORで結合
pub fn combine_or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let (width, height) = a.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if a.get_pixel(x, y)[0] != 0 || b.get_pixel(x, y)[0] != 0 {
                out.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }
    out
}
