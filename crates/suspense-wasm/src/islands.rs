//! client:only コンポーネントのスタイル持ち越し（dev 用）
//!
//! client:only の island はサーバー出力に含まれないため、次のページを
//! 不可視 iframe で読み込んで hydration 後の head からスタイルを回収する。
//! hydration 完了はバウンデッドなポーリングで待つ: 上限に達したら
//! 諦めてそのまま進む（ソフトタイムアウトでありエラーではない）。

use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, EventTarget, HtmlIFrameElement, Window};

use suspense_router::{HYDRATION_POLL_INTERVAL_MS, HYDRATION_POLL_LIMIT};
use suspense_wire::{DEV_STYLE_ID_ATTR, PERSIST_ATTR};

/// 次ページの client:only スタイルを新ドキュメントの head へ複製する
///
/// island が無ければ何もしない。iframe のロードや hydration が遅くても
/// ポーリング上限で打ち切って先へ進む。
pub async fn prepare_client_only_styles(
    window: &Window,
    document: &Document,
    new_document: &Document,
    to_href: &str,
) -> Result<(), JsValue> {
    let has_island = new_document
        .body()
        .and_then(|body| body.query_selector("astro-island[client='only']").ok().flatten())
        .is_some();
    if !has_island {
        return Ok(());
    }

    // モジュールローダーのキャッシュを使わずに次ページを読み込む
    // （srcdoc だと webkit 系で import 解決が動かないため src を使う）
    let iframe: HtmlIFrameElement = document.create_element("iframe")?.unchecked_into();
    iframe.set_src(to_href);
    iframe.style().set_property("display", "none")?;
    if let Some(body) = document.body() {
        body.append_child(&iframe)?;
    }

    if let Some(frame_window) = iframe.content_window() {
        silence_console(&frame_window);
        wait_for_load(frame_window.as_ref()).await;
        poll_hydration(window, &iframe).await;
    }

    if let Some(next_head) = iframe.content_document().and_then(|d| d.head()) {
        copy_hydration_styles(document, new_document, &next_head)?;
    }

    iframe.remove();
    Ok(())
}

/// iframe 内の console を黙らせる（次ページのログを二重に出さない）
fn silence_console(frame_window: &Window) {
    let Ok(console) = Reflect::get(frame_window, &JsValue::from_str("console")) else {
        return;
    };
    let silent = Object::new();
    let noop = Function::new_no_args("");
    for key in Object::keys(&console.unchecked_into::<Object>()).iter() {
        let _ = Reflect::set(&silent, &key, &noop);
    }
    let _ = Reflect::set(frame_window, &JsValue::from_str("console"), &silent);
}

/// load イベントを 1 回だけ待つ
async fn wait_for_load(target: &EventTarget) {
    let target = target.clone();
    let promise = Promise::new(&mut |resolve, _reject| {
        let on_load = Closure::once_into_js(move |_event: web_sys::Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let _ = target.add_event_listener_with_callback("load", on_load.unchecked_ref());
    });
    let _ = JsFuture::from(promise).await;
}

/// hydration 未完了の island が無くなるまでポーリングする（上限あり）
async fn poll_hydration(window: &Window, iframe: &HtmlIFrameElement) {
    for _ in 0..HYDRATION_POLL_LIMIT {
        let pending = iframe
            .content_document()
            .and_then(|d| d.body())
            .and_then(|body| body.query_selector("astro-island[ssr]").ok().flatten());
        if pending.is_none() {
            break;
        }
        sleep(window, HYDRATION_POLL_INTERVAL_MS as i32).await;
    }
    // 上限超過はソフトタイムアウト: そのまま進む
}

/// hydration 由来のスタイルを新ドキュメントへ複製する
fn copy_hydration_styles(
    document: &Document,
    new_document: &Document,
    next_head: &Element,
) -> Result<(), JsValue> {
    // 前回の持ち越しマークを掃除する
    let marked = document
        .head()
        .map(|h| h.query_selector_all(&format!("style[{}=\"\"]", PERSIST_ATTR)))
        .transpose()?;
    if let Some(marked) = marked {
        for i in 0..marked.length() {
            if let Some(node) = marked.get(i) {
                let element: Element = node.unchecked_into();
                element.remove_attribute(PERSIST_ATTR)?;
            }
        }
    }

    // 次ページの head にあるスタイルの識別子を集める
    let styles = next_head.query_selector_all(&format!("style[{}]", DEV_STYLE_ID_ATTR))?;
    for i in 0..styles.length() {
        let Some(node) = styles.get(i) else { continue };
        let style: Element = node.unchecked_into();
        let Some(id) = style.get_attribute(DEV_STYLE_ID_ATTR) else {
            continue;
        };

        let selector = format!("style[{}=\"{}\"]", DEV_STYLE_ID_ATTR, id);
        let current = document
            .head()
            .and_then(|h| h.query_selector(&selector).ok().flatten());
        let missing_in_new = new_document
            .head()
            .and_then(|h| h.query_selector(&selector).ok().flatten())
            .is_none();

        // hydration で作られたスタイルだけを新ドキュメントに足す
        if let (Some(current), true) = (current, missing_in_new) {
            if let Some(new_head) = new_document.head() {
                new_head.append_child(&current.clone_node_with_deep(true)?)?;
            }
        }
    }
    Ok(())
}

/// setTimeout ベースの待機
async fn sleep(window: &Window, ms: i32) {
    let promise = Promise::new(&mut |resolve, _reject| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
    });
    let _ = JsFuture::from(promise).await;
}
