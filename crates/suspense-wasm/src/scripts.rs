//! script の再実行
//!
//! DOM に挿入しただけの script 要素は実行されない。同じ属性・本文の
//! 要素を作り直して差し替えると実行される。各 script は実行済みマーカーを
//! 持ち、二重実行しない。外部 script はドキュメント順を守るため
//! load イベントを待ってから次に進む。

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlElement, HtmlScriptElement};

use suspense_router::ScriptSig;
use suspense_wire::EXEC_ATTR;

/// ドキュメント内の未実行 script をすべて実行する
///
/// 実行した script には実行済みマーカーを付ける。
/// streaming の chunk が新しい script を挿入した場合に備え、
/// 呼び出し側は chunk ごとに 2 回呼ぶ。
pub async fn run_scripts(document: &Document) -> Result<(), JsValue> {
    let scripts = document.query_selector_all("script")?;

    for i in 0..scripts.length() {
        let Some(node) = scripts.get(i) else { continue };
        let script: HtmlScriptElement = node.unchecked_into();
        if script.get_attribute(EXEC_ATTR).is_some() {
            continue;
        }

        let replacement: HtmlScriptElement =
            document.create_element("script")?.unchecked_into();
        replacement.set_inner_html(&script.inner_html());

        let mut wait: Option<Promise> = None;
        let attributes = script.attributes();
        for j in 0..attributes.length() {
            let Some(attr) = attributes.item(j) else { continue };
            if attr.name() == "src" {
                wait = Some(load_promise(&replacement));
            }
            replacement.set_attribute(&attr.name(), &attr.value())?;
        }
        replacement.set_attribute(EXEC_ATTR, "")?;
        script.replace_with_with_node_1(&replacement)?;

        // 外部 script はドキュメント順を保つため load を待ってから次へ
        if let Some(promise) = wait {
            let _ = JsFuture::from(promise).await;
        }
    }
    Ok(())
}

/// 現在の全 script に実行済みマーカーを付ける
///
/// 初期ロード時はブラウザが実行済みなので、ルーター起動時に 1 回呼ぶ。
pub fn mark_all_executed(document: &Document) -> Result<(), JsValue> {
    let scripts = document.query_selector_all("script")?;
    for i in 0..scripts.length() {
        if let Some(node) = scripts.get(i) {
            let script: Element = node.unchecked_into();
            script.set_attribute(EXEC_ATTR, "")?;
        }
    }
    Ok(())
}

/// 同一性判定のため script のシグネチャを集める
pub fn collect_script_sigs(document: &Document) -> Result<Vec<(HtmlScriptElement, ScriptSig)>, JsValue> {
    let scripts = document.query_selector_all("script")?;
    let mut sigs = Vec::with_capacity(scripts.length() as usize);
    for i in 0..scripts.length() {
        let Some(node) = scripts.get(i) else { continue };
        let script: HtmlScriptElement = node.unchecked_into();
        let sig = ScriptSig {
            src: non_empty(script.get_attribute("src")),
            kind: script.get_attribute("type"),
            text: script.text().unwrap_or_default(),
        };
        sigs.push((script, sig));
    }
    Ok(sigs)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 要素の load 完了で解決する Promise を作る
fn load_promise(element: &HtmlScriptElement) -> Promise {
    let element: HtmlElement = element.clone().unchecked_into();
    Promise::new(&mut |resolve, _reject| {
        let on_load = Closure::once_into_js(move |_event: web_sys::Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        element.set_onload(Some(on_load.unchecked_ref()));
    })
}
