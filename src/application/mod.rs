//! Application層: ユースケースの調整
//!
//! Domain層のポートを介してInfrastructure層を駆動する。
//! 制御ループ本体と、その補助（停止フラグ・統計）を持つ。

pub mod control_loop;
pub mod shutdown;
pub mod stats;

pub use control_loop::{ControlLoop, LoopState};
pub use shutdown::ShutdownFlag;
pub use stats::{StatKind, StatsCollector};
