//! フットサルコートの予約・枠割り当てエンジン
//!
//! - `domain`: 予約集約と純粋関数（副作用なし）
//! - `ports`: 外部との境界（予約ストア、施設カタログ、ユーザー、通知）
//! - `application`: ポートを使ってドメインを動かすサービス関数
//! - `adapters`: ポートの実装（インメモリ、PostgreSQL）

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
