/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 1イテレーションの失敗で制御ループを止めない（呼び出し側でログして続行）

use thiserror::Error;

/// Domain層の統一エラー型
#[derive(Error, Debug)]
pub enum DomainError {
    /// フレーム取得関連のエラー
    #[error("Capture error: {0}")]
    Capture(String),

    /// 検出（画像処理）関連のエラー
    #[error("Detection error: {0}")]
    Detection(String),

    /// 通信（チャネル送信）関連のエラー
    #[error("Communication error: {0}")]
    Communication(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 初期化エラー（バインダ失敗、制御ループはRunningに入らない）
    #[error("Initialization failed: {0}")]
    Initialization(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
