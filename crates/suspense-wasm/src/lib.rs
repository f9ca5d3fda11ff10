//! # suspense-wasm
//!
//! ブラウザ常駐ランタイム。wasm-bindgen エクスポートの公開 API。
//!
//! ## 構成
//!
//! ```text
//! SuspenseRouter
//!   ├── SuspenseLoader       (loader.rs)  - Fragment の template スワップ
//!   ├── SuspenseStreamReader (decoder.rs) - line-delimited ストリーム読み取り
//!   ├── HistoryTracker ほか  (suspense-router) - DOM 非依存の判断ロジック
//!   └── DOM スワップ実行     (swap.rs / scripts.rs / anim.rs / islands.rs)
//! ```
//!
//! ## 使用方法（TypeScript）
//!
//! ```typescript
//! import init, { SuspenseRouter, init_panic_hook } from "./suspense_wasm";
//!
//! await init();
//! init_panic_hook();
//!
//! const router = new SuspenseRouter();
//! router.attach();
//!
//! // リンククリックのハンドラーから
//! router.navigate("/next-page");
//! ```
//!
//! ## スレッド安全性
//!
//! WASM はシングルスレッドのため `!Send + !Sync` で構わない。
//! デコーダーとローダーはドキュメント単位のシングルトンで、
//! soft navigation では作り直さず再利用する（ハードリロードでのみ再構築）。

use wasm_bindgen::prelude::*;

pub mod anim;
pub mod decoder;
pub mod islands;
pub mod loader;
pub mod router;
pub mod scripts;
pub mod swap;

pub use decoder::SuspenseStreamReader;
pub use loader::SuspenseLoader;
pub use router::SuspenseRouter;

/// パニック時にブラウザコンソールにスタックトレースを出力する
///
/// 開発時に必ず呼び出すこと。本番ビルドでは feature flag で無効化可能。
#[wasm_bindgen]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Fragment ID を受け取る直接エントリポイント
///
/// chunk の inline script が呼ぶ `window.astroSuspenseLoad` の wasm 側実装。
/// MutationObserver の接続前から存在していたプレースホルダーもここで拾える。
///
/// # 引数
/// - `id`: chunk の template / プレースホルダーに共通の Fragment ID
///
/// # 戻り値
/// スワップが行われたら true（2 回目以降の呼び出しは no-op で false）
#[wasm_bindgen(js_name = "astroSuspenseLoad")]
pub fn astro_suspense_load(id: u32) -> bool {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return false;
    };
    loader::SuspenseLoader::load(&document, u64::from(id))
}
