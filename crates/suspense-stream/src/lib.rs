//! # suspense-stream
//!
//! サーバー側のレスポンス変換。
//!
//! HTTP ミドルウェアの内側で使う想定: ホストフレームワークが
//! リクエストヘッダーとレスポンスを渡し、このクレートが
//! 「元のボディをそのまま流したあと、settle した chunk を追記する」
//! ストリームを返す。
//!
//! ## レスポンスの流れ
//!
//! ```text
//! negotiate(prerender?, content-type, astro-suspense-transition ヘッダー)
//!   ├── Bypass     → 変換なし（非 HTML / ビルド時レンダリング）
//!   ├── Inline     → 元バイト列 … <script>bootstrap</script> + chunk …
//!   └── JsonLines  → JSON(シェル)\n JSON(chunk)\n …
//! 送出が終わるのは drain 完了後（それまでシンクは閉じない）
//! ```
//!
//! ## バックプレッシャー
//!
//! 変換は pull 型 `futures::Stream` で表現する。次の chunk は消費側が
//! 要求したときだけ生成されるため、下位トランスポートの書き込み完了を
//! 待ってから次を書く、という性質はホストの駆動ループがそのまま満たす。
//! 実行ランタイムには依存しない。

pub mod negotiate;
pub mod transform;

pub use negotiate::{negotiate, response_content_type, vary_with_transition, ResponseMode};
pub use transform::{transform_body, transform_suspense};
