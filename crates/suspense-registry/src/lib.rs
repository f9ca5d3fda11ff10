//! # suspense-registry
//!
//! リクエスト単位の Fragment レジストリ。
//!
//! ページレンダリングコードが「まだ解決していない Fragment」を登録し、
//! レスポンス送出時に `drain()` で settle 順のストリームとして取り出す。
//!
//! ## ライフサイクル
//!
//! ```text
//! リクエスト受信
//!   → SuspenseRegistry::new()          (1 リクエスト = 1 レジストリ)
//!   → register() × N                   (レンダリング中に ID を採番)
//!   → drain()                          (レジストリを消費、以降の登録は不可)
//!   → settle した順に ResolvedFragment が流れる
//! レスポンス完了/中断 → レジストリ破棄
//! ```
//!
//! ## 順序保証
//!
//! 配信順は **settle 順** であり登録順ではない。ID 0 が ID 1 より先に
//! 届く保証はない（先に解決したものから送る）。
//!
//! ## エラー回復
//!
//! - content の失敗 → ログの上、同じ ID でエラーレンダラーの出力に差し替える
//! - エラーレンダラー自体の失敗 → ログの上、空 content の Fragment を流す。
//!   ストリームは必ず終端する（該当 ID が永久に届かない事態にはしない）

pub mod registry;

pub use registry::{ContentFuture, RenderError, SuspenseRegistry};

pub use suspense_wire::ResolvedFragment;
