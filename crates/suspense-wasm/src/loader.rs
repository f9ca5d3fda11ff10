//! DOMPatcher: プレースホルダーと template の原子的スワップ
//!
//! サーバーが送る chunk は `<template astro-suspense-id="N">` と
//! それを起動する inline script のペア。ページ側には同じ ID の
//! `<astro-suspense suspense-id="N">` プレースホルダーが居る。
//!
//! スワップの主経路は直接エントリポイント（`load`）で、
//! MutationObserver は「observer 接続後に挿入されたプレースホルダー」を
//! 拾うための最適化。ドキュメントの load 完了後は observer を切断し、
//! 以降は直接エントリポイントだけで動く。

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlTemplateElement, MutationObserver, MutationObserverInit, MutationRecord};

use suspense_wire::{GLOBAL_LOAD_FN, PLACEHOLDER_ID_ATTR, PLACEHOLDER_TAG, SUSPENSE_ID_ATTR};

/// インストール済みマーカー（documentElement に付ける）
const INSTALLED_ATTR: &str = "data-astro-suspense-loader";

/// ドキュメント単位の Fragment ローダー
///
/// `install` は 1 ドキュメントに 1 回だけ効く。2 回目以降は no-op。
pub struct SuspenseLoader {
    observer: Option<MutationObserver>,
}

impl SuspenseLoader {
    /// ローダーをドキュメントにインストールする
    ///
    /// 1. `window.astroSuspenseLoad` を wasm 実装に束縛する
    /// 2. body の childList を監視し、プレースホルダー挿入で即スワップする
    /// 3. load 完了イベントで observer を切断する
    pub fn install(document: &Document) -> Result<SuspenseLoader, JsValue> {
        let root = document
            .document_element()
            .ok_or_else(|| JsValue::from_str("document has no root element"))?;

        if root.has_attribute(INSTALLED_ATTR) {
            return Ok(SuspenseLoader { observer: None });
        }
        root.set_attribute(INSTALLED_ATTR, "")?;

        Self::bind_global_entry(document)?;

        // observer 接続前に挿入済みのプレースホルダーは inline script →
        // 直接エントリポイント経由で処理される
        let observer = Self::observe_insertions(document)?;
        Self::disconnect_on_load(document, observer.clone())?;

        Ok(SuspenseLoader {
            observer: Some(observer),
        })
    }

    /// Fragment ID を指定してスワップする（直接エントリポイント）
    ///
    /// template の内容でプレースホルダーを置き換え、template と
    /// 起動用 script を取り除く。template が既に消えていれば no-op。
    pub fn load(document: &Document, id: u64) -> bool {
        let template = query(document, &format!("template[{}='{}']", SUSPENSE_ID_ATTR, id));
        let placeholder = query(
            document,
            &format!("{}[{}='{}']", PLACEHOLDER_TAG, PLACEHOLDER_ID_ATTR, id),
        );
        let script = query(document, &format!("script[{}='{}']", SUSPENSE_ID_ATTR, id));

        let swapped = match (placeholder, template) {
            (Some(placeholder), Some(template)) => {
                let template: HtmlTemplateElement = template.unchecked_into();
                let swapped = placeholder
                    .replace_with_with_node_1(&template.content())
                    .is_ok();
                template.remove();
                swapped
            }
            _ => false,
        };

        if let Some(script) = script {
            script.remove();
        }
        swapped
    }

    /// `window.astroSuspenseLoad` を wasm 実装で束縛する
    ///
    /// ブートストラップ JS が先に素の実装を置いていても、同じ動作の
    /// wasm 実装で上書きする（結合点はこのグローバル関数 1 つだけ）。
    fn bind_global_entry(document: &Document) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = document.clone();

        let entry = Closure::<dyn FnMut(f64) -> bool>::new(move |id: f64| {
            Self::load(&document, id as u64)
        });
        js_sys::Reflect::set(&window, &JsValue::from_str(GLOBAL_LOAD_FN), entry.as_ref())?;
        // グローバル束縛はドキュメントと同寿命
        entry.forget();
        Ok(())
    }

    /// body への挿入を監視してプレースホルダーを検知する
    fn observe_insertions(document: &Document) -> Result<MutationObserver, JsValue> {
        let target = document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;

        let doc = document.clone();
        let on_mutations = Closure::<dyn FnMut(js_sys::Array)>::new(move |mutations: js_sys::Array| {
            for mutation in mutations.iter() {
                let mutation: MutationRecord = mutation.unchecked_into();
                let added = mutation.added_nodes();
                for i in 0..added.length() {
                    let Some(node) = added.get(i) else { continue };
                    let Some(element) = node.dyn_ref::<Element>() else {
                        continue;
                    };
                    if element.tag_name().to_ascii_lowercase() != PLACEHOLDER_TAG {
                        continue;
                    }
                    if let Some(id) = element
                        .get_attribute(PLACEHOLDER_ID_ATTR)
                        .and_then(|v| v.parse::<u64>().ok())
                    {
                        Self::load(&doc, id);
                    }
                }
            }
        });

        let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;
        on_mutations.forget();

        let mut init = MutationObserverInit::new();
        init.child_list(true).subtree(true);
        observer.observe_with_options(&target, &init)?;
        Ok(observer)
    }

    /// load 完了後に observer を切断する（以降は直接エントリポイントのみ）
    fn disconnect_on_load(document: &Document, observer: MutationObserver) -> Result<(), JsValue> {
        let on_load = Closure::once_into_js(move || observer.disconnect());
        document.add_event_listener_with_callback("DOMContentLoaded", on_load.unchecked_ref())?;
        Ok(())
    }

    /// インストール時に observer を張れたか（テスト・診断用）
    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }
}

fn query(document: &Document, selector: &str) -> Option<Element> {
    document.query_selector(selector).ok().flatten()
}
