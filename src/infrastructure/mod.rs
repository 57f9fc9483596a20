//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、外部ライブラリ（image/serialport）と接続する。

pub mod mock_channel;
pub mod serial_channel;
pub mod sim_frame_source;
pub mod vision;
