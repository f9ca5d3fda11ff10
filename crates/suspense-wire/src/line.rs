//! line-delimited ストリームの再組み立て
//!
//! ネットワークパケットの切れ目は行の切れ目と一致しない。
//! 受信バイト列を溜め、`\n` が揃った行だけを JSON デコードして返す。
//! 末尾の不完全な行は次の push まで保持する。
//!
//! バイト単位でバッファリングするため、マルチバイト UTF-8 文字が
//! パケット境界で分断されても問題ない（デコードは完全な行に対してのみ行う）。

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::WireError;

/// line-delimited レコードの再組み立て器
///
/// 1 ナビゲーション = 1 インスタンス。リクエストをまたいだ再利用はしない
/// （新しいナビゲーションは新しい LineAssembly を作る）。
#[derive(Debug, Default)]
pub struct LineAssembly {
    /// 未完の行を含む受信バッファ
    buf: Vec<u8>,
}

impl LineAssembly {
    /// 新しい LineAssembly を生成する
    pub fn new() -> Self {
        LineAssembly { buf: Vec::new() }
    }

    /// 受信バイト列を追加し、完成した行のデコード結果を返す
    ///
    /// # 引数
    /// - `bytes`: ネットワークから届いた生バイト（任意の境界で分割されていてよい）
    ///
    /// # 戻り値
    /// `\n` まで揃った行を JSON デコードしたレコード列。
    /// 行が揃っていなければ空の Vec。
    ///
    /// # エラー
    /// - `WireError::BadRecord`: 完成した行が JSON 文字列としてデコードできない。
    ///   バッファは消費されないため、エラーは再現可能（呼び出し側はストリームを破棄する）。
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, WireError> {
        self.buf.extend_from_slice(bytes);

        let mut records = Vec::new();
        let mut start = 0usize;

        while let Some(off) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + off;
            let line = &self.buf[start..end];
            // 空行はレコードにならない（cyrup の JSONL デコーダーと同じ扱い）
            if !line.is_empty() {
                records.push(decode_record(line)?);
            }
            start = end + 1;
        }

        if start > 0 {
            self.buf.drain(..start);
        }
        Ok(records)
    }

    /// ストリーム終端の処理
    ///
    /// 終端デリミタを送らないトランスポートに備え、
    /// 非空の残りバッファを最後のレコードとしてデコードする。
    pub fn finish(self) -> Result<Option<String>, WireError> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        decode_record(&self.buf).map(Some)
    }

    /// 未完の行として保持しているバイト数
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

/// 1 行分のバイト列を JSON 文字列としてデコードする
fn decode_record(line: &[u8]) -> Result<String, WireError> {
    serde_json::from_slice::<String>(line).map_err(WireError::BadRecord)
}
