/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層の制御ループに注入される。

use crate::domain::{AimOffset, DomainResult, Frame};

/// フレームソースポート: キャプチャデバイスからのフレーム取得を抽象化
pub trait FrameSourcePort {
    /// 最新フレームを取得する（非ブロッキング）
    ///
    /// # Returns
    /// - `Ok(Some(Frame))`: 新しいフレームの取得成功
    /// - `Ok(None)`: 新しいフレームなし（ブロックせずに即座に返る）
    /// - `Err(DomainError)`: 取得失敗（制御ループはイテレーションをスキップ）
    fn latest_frame(&mut self) -> DomainResult<Option<Frame>>;

    /// キャプチャセッションを停止する
    fn stop(&mut self) -> DomainResult<()>;
}

/// チャネルポート: アクチュエータへのバイトストリーム送信を抽象化
pub trait ChannelPort {
    /// バイト列をチャネルに書き込む
    ///
    /// # Returns
    /// - `Ok(())`: 書き込み成功
    /// - `Err(DomainError)`: 書き込み失敗（コマンドは破棄され、再送しない）
    fn write(&mut self, bytes: &[u8]) -> DomainResult<()>;

    /// チャネルを閉じる（冪等）
    fn close(&mut self) -> DomainResult<()>;
}

impl<T: FrameSourcePort + ?Sized> FrameSourcePort for Box<T> {
    fn latest_frame(&mut self) -> DomainResult<Option<Frame>> {
        (**self).latest_frame()
    }

    fn stop(&mut self) -> DomainResult<()> {
        (**self).stop()
    }
}

impl<T: ChannelPort + ?Sized> ChannelPort for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> DomainResult<()> {
        (**self).write(bytes)
    }

    fn close(&mut self) -> DomainResult<()> {
        (**self).close()
    }
}

/// 照準オフセットをワイヤフォーマットに変換する
///
/// # ワイヤフォーマット
/// ASCII1行 `MOVE <dx>,<dy>\n`。dx, dyは符号付き10進整数で、
/// 先頭ゼロなし・前後空白なし。1イテレーションにつき最大1コマンド。
pub fn encode_move(offset: AimOffset) -> Vec<u8> {
    format!("MOVE {},{}\n", offset.dx, offset.dy).into_bytes()
}

/// ワイヤフォーマットの行をパースする（テスト・デバッグ表示用の逆変換）
///
/// 文法に合致しない入力は `None`。
pub fn parse_move(bytes: &[u8]) -> Option<AimOffset> {
    let line = std::str::from_utf8(bytes).ok()?;
    let rest = line.strip_prefix("MOVE ")?.strip_suffix('\n')?;
    let (dx, dy) = rest.split_once(',')?;
    Some(AimOffset::new(dx.parse().ok()?, dy.parse().ok()?))
}
