//! view transition とフォールバックアニメーション
//!
//! `document.startViewTransition` は web-sys にまだ安定して生えていないため
//! Reflect 経由の capability チェックで呼ぶ。非対応ブラウザでは
//! `data-astro-transition-fallback` 属性を付け替えて CSS アニメーションを
//! 起動し、無限ループでないものの完了を待ってからスワップする。

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, Window};

/// フォールバック状態マーカー（documentElement に付ける）
pub const FALLBACK_STATE_ATTR: &str = "data-astro-transition-fallback";

/// ネイティブ view transition が使えるか
pub fn native_view_transitions_supported(document: &Document) -> bool {
    Reflect::has(document, &JsValue::from_str("startViewTransition")).unwrap_or(false)
}

/// DOM 更新コールバックをネイティブ view transition の中で実行する
///
/// # 戻り値
/// transition 全体の完了を表す `finished` Promise（取れなければ None）
pub fn start_view_transition(
    document: &Document,
    update: &Function,
) -> Result<Option<Promise>, JsValue> {
    let start = Reflect::get(document, &JsValue::from_str("startViewTransition"))?;
    let start: Function = start.dyn_into()?;
    let transition = start.call1(document, update)?;
    let finished = Reflect::get(&transition, &JsValue::from_str("finished"))?;
    Ok(finished.dyn_into::<Promise>().ok())
}

/// 現在実行中のアニメーション一覧（Animations API）
///
/// `Document.getAnimations` も Reflect 経由で呼ぶ。
pub fn document_animations(document: &Document) -> Array {
    let get = Reflect::get(document, &JsValue::from_str("getAnimations"))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok());
    match get {
        Some(get) => get
            .call0(document)
            .ok()
            .and_then(|v| v.dyn_into::<Array>().ok())
            .unwrap_or_else(Array::new),
        None => Array::new(),
    }
}

/// フォールバックアニメーションを起動し、新しく始まった有限アニメーションを待つ
///
/// 1. 現在のアニメーション集合を控える
/// 2. 状態マーカーを `old` にして退出アニメーションを起動する
/// 3. 差分のうち無限ループでないものの完了を待つ
///
/// スワップ後、呼び出し側がマーカーを `new` に付け替えると
/// 進入アニメーションが非同期に走る。
pub async fn run_exit_animations(window: &Window, document: &Document) -> Result<(), JsValue> {
    let before = document_animations(document);

    if let Some(root) = document.document_element() {
        root.set_attribute(FALLBACK_STATE_ATTR, "old")?;
    }

    let after = document_animations(document);
    let mut finished: Vec<Promise> = Vec::new();
    for animation in after.iter() {
        if before.includes(&animation, 0) {
            continue;
        }
        if is_infinite(window, &animation) {
            continue;
        }
        if let Ok(promise) = Reflect::get(&animation, &JsValue::from_str("finished"))
            .and_then(|p| p.dyn_into::<Promise>().map_err(JsValue::from))
        {
            finished.push(promise);
        }
    }

    for promise in finished {
        // キャンセルされた finished は reject する。縮退はしない
        let _ = JsFuture::from(promise).await;
    }
    Ok(())
}

/// スワップ完了の状態マーカーを付ける（進入アニメーションのトリガー）
pub fn mark_new_state(document: &Document) {
    if let Some(root) = document.document_element() {
        let _ = root.set_attribute(FALLBACK_STATE_ATTR, "new");
    }
}

/// アニメーションが無限ループか
///
/// iteration count が infinite のアニメーションの完了を待つと
/// スワップが永遠に走らないため除外する。
fn is_infinite(window: &Window, animation: &JsValue) -> bool {
    let Ok(effect) = Reflect::get(animation, &JsValue::from_str("effect")) else {
        return false;
    };
    let Ok(target) = Reflect::get(&effect, &JsValue::from_str("target")) else {
        return false;
    };
    let Some(target) = target.dyn_ref::<Element>() else {
        return false;
    };

    let pseudo = Reflect::get(&effect, &JsValue::from_str("pseudoElement"))
        .ok()
        .and_then(|p| p.as_string());
    let style = match pseudo {
        Some(pseudo) => window.get_computed_style_with_pseudo_elt(target, &pseudo),
        None => window.get_computed_style(target),
    };

    match style {
        Ok(Some(style)) => {
            style
                .get_property_value("animation-iteration-count")
                .map(|v| v == "infinite")
                .unwrap_or(false)
        }
        _ => false,
    }
}
