//! # suspense-router
//!
//! soft navigation の DOM 非依存コア。
//!
//! ブラウザ API を一切触らない判断ロジックだけを持つ。実際の DOM スワップや
//! fetch は `suspense-wasm` クレートがこのクレートの決定に従って実行する。
//! 判断と実行を分けているのはテストのため: History の index 不変条件や
//! head の突き合わせはネイティブテストで検証できる。
//!
//! ## ナビゲーション 1 回の状態遷移
//!
//! ```text
//! Idle → Intercepted → Fetching → Parsing → Swapping → Settling → Idle
//!                │          │         │
//!                │          └─────────┴──→ Idle (full reload へ脱出)
//!                └──→ Idle (intra-page / full reload)
//! ```
//!
//! fetch 失敗・非対応 content-type・遷移先の機能フラグ欠如は、
//! すべて「通常のブラウザナビゲーションへの脱出」に縮退する。
//! 中途半端な DOM を残すリトライはしない。

#![no_std]
extern crate alloc;

pub mod error;
pub mod history;
pub mod location;
pub mod media;
pub mod phase;
pub mod strategy;
pub mod swap;
pub mod throttle;

pub use error::RouterError;
pub use history::{classify_popstate, Direction, HistoryTracker, NavigationState, PopAction};
pub use location::{plan_navigation, HistoryMode, NavigateDecision, NavigationOptions, PageLocation};
pub use media::{classify_media_type, destination_supports_transition, FetchedKind};
pub use phase::{TransitionPhase, TransitionPhases};
pub use strategy::{router_should_attach, select_strategy, Fallback, TransitionStrategy};
pub use swap::{mark_executed, plan_head_swap, HeadEntry, HeadOp, ScriptSig};
pub use throttle::{ScrollThrottle, ThrottleDecision};

/// タイトル読み上げまでの遅延（ミリ秒）
///
/// スクリーンリーダーが aria-live 要素の「変化」を認識するには
/// 挿入からテキスト設定まで間を置く必要がある（経験的な値）。
pub const ANNOUNCE_DELAY_MS: u32 = 60;

/// scrollend 非対応ブラウザでのスクロール記録スロットル幅（ミリ秒）
pub const SCROLL_THROTTLE_MS: u32 = 350;

/// client:only コンポーネントの hydration 完了を待つ最大ポーリング回数
///
/// 回数を使い切ったら諦めてそのまま進む（エラーではなくソフトタイムアウト）。
pub const HYDRATION_POLL_LIMIT: u32 = 21;

/// hydration ポーリングの間隔（ミリ秒）
pub const HYDRATION_POLL_INTERVAL_MS: u32 = 50;
