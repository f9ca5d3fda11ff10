//! # suspense-wire
//!
//! suspense ストリーミングプロトコルの Wire Format 層。
//!
//! サーバーが解決済み Fragment を 2 種類のエンコーディングに変換し、
//! クライアントが line-delimited ストリームを復元するための共通クレート。
//! サーバー / WASM 両方から使うため `no_std` + `alloc` で動作する。
//!
//! ## 2 つのエンコーディング
//!
//! ```text
//! Inline (text/html のまま追記):
//!   …元の HTML…
//!   <script>{bootstrap}</script>              ← 最初の chunk のみ
//!   <template astro-suspense-id="0">…</template>
//!   <script astro-suspense-id="0">window.astroSuspenseLoad(0)</script>
//!   <template astro-suspense-id="1">…</template>
//!   …
//!
//! JsonLines (text/astro-suspense-transition-stream):
//!   1 行目: JSON 文字列化した初期 HTML シェル
//!   2 行目以降: JSON 文字列化した chunk（1 chunk = 1 行、"\n" 終端）
//!   終端はトランスポートのクローズ（番兵値なし）
//! ```
//!
//! chunk の配信順は Fragment の settle 順であり、登録順ではない。

#![no_std]
extern crate alloc;

pub mod bootstrap;
pub mod chunk;
pub mod error;
pub mod line;

pub use bootstrap::{bootstrap_script, LOADER_BOOTSTRAP};
pub use chunk::{chunk_markup, encode_chunk, encode_shell, Encoding, ResolvedFragment};
pub use error::WireError;
pub use line::LineAssembly;

/// streaming variant を要求するリクエストヘッダー名
pub const TRANSITION_HEADER: &str = "astro-suspense-transition";

/// streaming variant を要求するヘッダー値
pub const TRANSITION_HEADER_VALUE: &str = "1";

/// line-delimited エンコーディングのレスポンス content-type
pub const STREAM_CONTENT_TYPE: &str = "text/astro-suspense-transition-stream";

/// chunk の template / script 要素に付く Fragment ID 属性
pub const SUSPENSE_ID_ATTR: &str = "astro-suspense-id";

/// プレースホルダー要素のタグ名
pub const PLACEHOLDER_TAG: &str = "astro-suspense";

/// プレースホルダー要素側の Fragment ID 属性
pub const PLACEHOLDER_ID_ATTR: &str = "suspense-id";

/// chunk 内の inline script が呼び出すグローバル関数名
pub const GLOBAL_LOAD_FN: &str = "astroSuspenseLoad";

/// ナビゲーションをまたいで引き継ぐ要素のキー属性
pub const PERSIST_ATTR: &str = "data-astro-transition-persist";

/// dev ツーリングのスタイル同一性属性（client:only スタイル複製回避用）
pub const DEV_STYLE_ID_ATTR: &str = "data-vite-dev-id";

/// soft navigation 対応を宣言するマーカー要素の name
pub const ENABLED_MARKER_NAME: &str = "astro-view-transitions-enabled";

/// view transition 非対応ブラウザ向けフォールバック指定の name
pub const FALLBACK_MARKER_NAME: &str = "astro-view-transitions-fallback";

/// 実行済み script を示すマーカー属性（二重実行防止）
pub const EXEC_ATTR: &str = "data-astro-exec";
