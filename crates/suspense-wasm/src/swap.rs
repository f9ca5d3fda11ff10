//! DOM スワップの実行
//!
//! `suspense-router` が立てた計画（head の突き合わせ・script の同一性）を
//! 実際のドキュメントに適用する。スワップは全置換が原則で、例外は
//! 永続化キー付き要素だけ: 旧ドキュメントの実体を新ドキュメント側の
//! 同キー要素と差し替え、フォーカスやフォーム値などの生きた状態を持ち越す。

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

use suspense_router::{mark_executed, plan_head_swap, HeadEntry, HeadOp};
use suspense_wire::{EXEC_ATTR, PERSIST_ATTR};

use crate::scripts::collect_script_sigs;

/// head と body を新ドキュメントの内容に入れ替える
///
/// 処理順:
/// 1. `<html>` の属性を入れ替える（`data-astro-*` だけ現状維持）
/// 2. 新ドキュメント側の既存 script に実行済みマーカーを付ける
/// 3. head を要素単位で突き合わせる（永続キー / stylesheet href）
/// 4. body を丸ごと差し替え、永続化要素を旧実体で差し戻す
/// 5. フォーカスと選択範囲を復元する
pub fn swap_documents(document: &Document, new_document: &Document) -> Result<(), JsValue> {
    swap_root_attributes(document, new_document)?;
    mark_known_scripts(document, new_document)?;
    reconcile_head(document, new_document)?;

    let saved = save_focus(document);
    swap_body(document, new_document)?;
    restore_focus(&saved);
    Ok(())
}

/// `<html>` 要素の属性を新ドキュメントに合わせる
///
/// 現ドキュメントの `data-astro-*` 属性（遷移方向マーカーなど）は残す。
fn swap_root_attributes(document: &Document, new_document: &Document) -> Result<(), JsValue> {
    let (Some(root), Some(new_root)) = (document.document_element(), new_document.document_element())
    else {
        return Ok(());
    };

    let mut retained: Vec<(String, String)> = Vec::new();
    let attributes = root.attributes();
    // 削除しながら回すためスナップショットを取る
    let names: Vec<String> = (0..attributes.length())
        .filter_map(|i| attributes.item(i).map(|a| a.name()))
        .collect();
    for name in names {
        if name.starts_with("data-astro-") {
            if let Some(value) = root.get_attribute(&name) {
                retained.push((name.clone(), value));
            }
        }
        root.remove_attribute(&name)?;
    }

    let new_attributes = new_root.attributes();
    for i in 0..new_attributes.length() {
        if let Some(attr) = new_attributes.item(i) {
            root.set_attribute(&attr.name(), &attr.value())?;
        }
    }
    for (name, value) in retained {
        root.set_attribute(&name, &value)?;
    }
    Ok(())
}

/// 新ドキュメントの script のうち現ページに既にあるものへ実行済みマーカーを付ける
fn mark_known_scripts(document: &Document, new_document: &Document) -> Result<(), JsValue> {
    let current: Vec<_> = collect_script_sigs(document)?
        .into_iter()
        .map(|(_, sig)| sig)
        .collect();
    let incoming = collect_script_sigs(new_document)?;
    let sigs: Vec<_> = incoming.iter().map(|(_, sig)| sig.clone()).collect();

    for index in mark_executed(&current, &sigs) {
        incoming[index].0.set_attribute(EXEC_ATTR, "")?;
    }
    Ok(())
}

/// head を要素単位で突き合わせる
fn reconcile_head(document: &Document, new_document: &Document) -> Result<(), JsValue> {
    let (Some(head), Some(new_head)) = (document.head(), new_document.head()) else {
        return Ok(());
    };

    let old_children = children_of(&head);
    let new_children = children_of(&new_head);

    let old_entries: Vec<HeadEntry> = old_children.iter().map(head_entry).collect();
    let new_entries: Vec<HeadEntry> = new_children.iter().map(head_entry).collect();

    for (element, op) in old_children.iter().zip(plan_head_swap(&old_entries, &new_entries)) {
        match op {
            // 旧実体を残し、新側の重複を取り除く
            HeadOp::Persist { new_index } => new_children[new_index].remove(),
            HeadOp::Remove => element.remove(),
        }
    }

    // 新 head に残ったものはすべて新規。そのまま移す（append で所有権が移る）
    let remaining = children_of(&new_head);
    for element in remaining {
        head.append_child(&element)?;
    }
    Ok(())
}

/// body を差し替え、永続化要素を旧実体で差し戻す
fn swap_body(document: &Document, new_document: &Document) -> Result<(), JsValue> {
    let (Some(old_body), Some(new_body)) = (document.body(), new_document.body()) else {
        return Ok(());
    };

    old_body.replace_with_with_node_1(&new_body)?;

    let selector = format!("[{}]", PERSIST_ATTR);
    let persisted = old_body.query_selector_all(&selector)?;
    for i in 0..persisted.length() {
        let Some(node) = persisted.get(i) else { continue };
        let element: Element = node.unchecked_into();
        let Some(key) = element.get_attribute(PERSIST_ATTR) else {
            continue;
        };
        let replacement = document
            .query_selector(&format!("[{}=\"{}\"]", PERSIST_ATTR, key))
            .ok()
            .flatten();
        if let Some(new_element) = replacement {
            // 新ページ側の同キー要素を旧実体で置き換えて状態を持ち越す
            new_element.replace_with_with_node_1(&element)?;
        }
    }
    Ok(())
}

/// 新ドキュメントから noscript を取り除く
///
/// DOMParser は noscript の中身をマークアップとして返すため、
/// スワップ前に落としておく。
pub fn strip_noscript(new_document: &Document) -> Result<(), JsValue> {
    let list = new_document.query_selector_all("noscript")?;
    for i in 0..list.length() {
        if let Some(node) = list.get(i) {
            let element: Element = node.unchecked_into();
            element.remove();
        }
    }
    Ok(())
}

/// head 内の 1 要素を突き合わせキーに落とす
fn head_entry(element: &Element) -> HeadEntry {
    let persist_key = element.get_attribute(PERSIST_ATTR);
    let stylesheet_href = if element.matches("link[rel=stylesheet]").unwrap_or(false) {
        element.get_attribute("href")
    } else {
        None
    };
    HeadEntry {
        persist_key,
        stylesheet_href,
    }
}

fn children_of(parent: &Element) -> Vec<Element> {
    let children = parent.children();
    (0..children.length())
        .filter_map(|i| children.item(i))
        .collect()
}

/// スワップ前後で持ち越すフォーカス状態
struct SavedFocus {
    element: Option<HtmlElement>,
    selection: Option<(Option<u32>, Option<u32>)>,
}

/// フォーカス中の要素が永続化ツリーに属していれば記録する
///
/// 永続化されない要素は新 body 側に実体がないため復元できない。
fn save_focus(document: &Document) -> SavedFocus {
    let selector = format!("[{}]", PERSIST_ATTR);
    let active = document
        .active_element()
        .filter(|el| el.closest(&selector).ok().flatten().is_some());

    let Some(active) = active else {
        return SavedFocus {
            element: None,
            selection: None,
        };
    };

    let selection = if let Some(input) = active.dyn_ref::<HtmlInputElement>() {
        Some((
            input.selection_start().unwrap_or(None),
            input.selection_end().unwrap_or(None),
        ))
    } else if let Some(area) = active.dyn_ref::<HtmlTextAreaElement>() {
        Some((
            area.selection_start().unwrap_or(None),
            area.selection_end().unwrap_or(None),
        ))
    } else {
        None
    };

    SavedFocus {
        element: active.dyn_into().ok(),
        selection,
    }
}

fn restore_focus(saved: &SavedFocus) {
    let Some(element) = &saved.element else { return };
    let _ = element.focus();

    if let Some((start, end)) = saved.selection {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let _ = input.set_selection_start(start);
            let _ = input.set_selection_end(end);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            let _ = area.set_selection_start(start);
            let _ = area.set_selection_end(end);
        }
    }
}
