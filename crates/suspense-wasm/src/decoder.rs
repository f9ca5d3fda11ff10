//! line-delimited レスポンスの読み取り
//!
//! fetch のボディストリームからバイトを読み、`suspense-wire` の
//! LineAssembly でレコードに復元する。1 ナビゲーション = 1 リーダー。
//! 新しいナビゲーションを始める前に前のリーダーを `cancel` することで、
//! 2 つのデコードが同時に DOM を触る事態を防ぐ。

use std::collections::VecDeque;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStream, ReadableStreamDefaultReader};

use suspense_wire::LineAssembly;

/// line-delimited ストリームのリーダー
pub struct SuspenseStreamReader {
    reader: ReadableStreamDefaultReader,
    assembly: LineAssembly,
    /// 1 回の read で複数行そろった場合の持ち越し
    pending: VecDeque<String>,
    done: bool,
}

impl SuspenseStreamReader {
    /// レスポンスボディからリーダーを作る
    pub fn new(body: ReadableStream) -> SuspenseStreamReader {
        SuspenseStreamReader {
            reader: body.get_reader().unchecked_into(),
            assembly: LineAssembly::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// 次のレコードを返す
    ///
    /// # 戻り値
    /// - `Some(record)`: 復元した 1 レコード（1 行目はシェル、以降は chunk）
    /// - `None`: ストリーム終端（終端デリミタなしの残りも排出済み）
    ///
    /// # エラー
    /// - ネットワーク読み取りの失敗
    /// - 行が JSON 文字列としてデコードできない
    pub async fn next_record(&mut self) -> Result<Option<String>, JsValue> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }
            if self.done {
                return Ok(None);
            }

            let result = JsFuture::from(self.reader.read()).await?;
            let done = Reflect::get(&result, &JsValue::from_str("done"))?
                .as_bool()
                .unwrap_or(true);
            let value = Reflect::get(&result, &JsValue::from_str("value"))?;

            if !value.is_undefined() && !value.is_null() {
                let bytes = Uint8Array::new(&value).to_vec();
                let records = self
                    .assembly
                    .push(&bytes)
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                self.pending.extend(records);
            }

            if done {
                self.done = true;
                // 終端デリミタを送らないトランスポートに備えて残りを排出する
                let assembly = std::mem::take(&mut self.assembly);
                if let Some(tail) = assembly
                    .finish()
                    .map_err(|e| JsValue::from_str(&e.to_string()))?
                {
                    self.pending.push_back(tail);
                }
            }
        }
    }

    /// 読み取りを打ち切る
    ///
    /// 追い越されたナビゲーションのリーダーは、次の fetch を始める前に
    /// 必ずこれで止める。
    pub fn cancel(&self) {
        // 破棄のための fire-and-forget。結果は待たない
        let _ = self.reader.cancel();
    }

    /// キャンセル用のハンドルを返す
    ///
    /// リーダー本体は読み取り中のタスクが所有するため、後続の
    /// ナビゲーションはこのハンドル経由で `cancel` する。
    /// キャンセルされた読み取りはタスク側で終端として扱われる。
    pub fn cancel_handle(&self) -> ReadableStreamDefaultReader {
        self.reader.clone()
    }
}
