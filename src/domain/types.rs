/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// すべての処理で共有される不変の型。

use std::time::Instant;

/// ピクセル座標で指定される正方形ROI（Region of Interest）
///
/// パイプラインの設計方針として、ROIは常にフレーム中心に配置される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl Roi {
    /// フレーム中心に配置されたROIを作成
    ///
    /// 左上座標は `((W−S)/2, (H−S)/2)`（切り捨て除算）。
    /// ROIがフレームに収まらない場合は `None`。
    pub fn centered(size: u32, frame_width: u32, frame_height: u32) -> Option<Self> {
        if size == 0 || size > frame_width || size > frame_height {
            return None;
        }
        Some(Self {
            x: (frame_width - size) / 2,
            y: (frame_height - size) / 2,
            size,
        })
    }

    /// ROIの中心座標を取得
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.size / 2, self.y + self.size / 2)
    }
}

/// HSV色空間の包括レンジ（OpenCV準拠: H[0-180), S[0-255], V[0-255]）
///
/// ターゲット色の1つの見え方を表す。色相の折り返しはレンジ自身では
/// 扱わないため、折り返し境界付近の色は2つのバンドで共同カバーする。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBand {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl ColorBand {
    /// 新しいカラーバンドを作成
    pub fn new(h_min: u8, h_max: u8, s_min: u8, s_max: u8, v_min: u8, v_max: u8) -> Self {
        Self {
            h_min,
            h_max,
            s_min,
            s_max,
            v_min,
            v_max,
        }
    }

    /// HSV値が3チャンネルすべてで包括レンジ内にあるか判定
    #[inline]
    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        (self.h_min..=self.h_max).contains(&h)
            && (self.s_min..=self.s_max).contains(&s)
            && (self.v_min..=self.v_max).contains(&v)
    }
}

/// キャプチャされたフレームデータ
///
/// ピクセルはBGR順（デバイスネイティブ）、連続メモリ。
/// ライフタイムはちょうど1イテレーション分で、保持されない。
#[derive(Debug, Clone)]
pub struct Frame {
    /// フレーム取得時刻
    pub timestamp: Instant,
    /// フレーム画像データ（BGR形式、3バイト/ピクセル）
    pub data: Vec<u8>,
    /// 画像の幅
    pub width: u32,
    /// 画像の高さ
    pub height: u32,
}

impl Frame {
    /// 新しいフレームを作成
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            timestamp: Instant::now(),
            data,
            width,
            height,
        }
    }

    /// データ長が width × height × 3 と一致しているか
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }
}

/// ROI中心からの相対照準オフセット（ピクセル、±値）
///
/// 選択された候補領域のバウンディングボックス上辺中央を指す。
/// 外部アクチュエータへの相対移動量として送信される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AimOffset {
    pub dx: i32,
    pub dy: i32,
}

impl AimOffset {
    /// 新しいオフセットを作成
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}
