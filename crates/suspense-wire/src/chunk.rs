//! Chunk エンコーディング
//!
//! ## Chunk の Wire Format
//!
//! ```text
//! <template astro-suspense-id="N">…エスケープ済み content…</template>
//! <script astro-suspense-id="N">window.astroSuspenseLoad(N)</script>
//! ```
//!
//! content 内の `</template>` は `\x3c/template>` にエスケープされ、
//! template 要素が途中で閉じるのを防ぐ。
//!
//! JsonLines では chunk 全体（初回はブートストラップ込み）を
//! JSON 文字列化して `\n` 終端の 1 行にする。

use alloc::format;
use alloc::string::String;

use crate::bootstrap::bootstrap_script;
use crate::error::WireError;

/// 解決済み Fragment（settle 順にサーバーから届く配信単位）
///
/// `id` はリクエスト内で 0 始まりの単調増加。content は成功値か、
/// 失敗時はエラーレンダラーの出力。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFragment {
    /// Fragment ID（リクエスト内で一意、再利用なし）
    pub id: u64,
    /// 差し込む HTML 断片
    pub content: String,
}

/// Wire エンコーディングの種別
///
/// 1 組のエンコーダー / デコーダーをこの enum でパラメータ化する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// text/html レスポンスの末尾にそのまま追記する
    Inline,
    /// 1 chunk = 1 JSON 文字列行（streaming navigation 用）
    JsonLines,
}

/// content 内の `</template>` を無害化する
///
/// 置換先の `\x3c` は `<` の JS 文字列エスケープと同じ見た目だが、
/// ここでは HTML テキストとしてそのまま残る（元実装と同じ挙動）。
pub fn escape_template_close(content: &str) -> String {
    content.replace("</template>", "\\x3c/template>")
}

/// 1 Fragment 分の template + script ペアを組み立てる
pub fn chunk_markup(fragment: &ResolvedFragment) -> String {
    format!(
        "<template astro-suspense-id=\"{id}\">{content}</template>\
         <script astro-suspense-id=\"{id}\">window.astroSuspenseLoad({id})</script>",
        id = fragment.id,
        content = escape_template_close(&fragment.content),
    )
}

/// Fragment を Wire Format に変換する
///
/// # 引数
/// - `fragment`: 解決済み Fragment
/// - `encoding`: 出力エンコーディング
/// - `is_first`: このレスポンスで最初の chunk か。
///   true のときだけ LoaderBootstrap を前置する（繰り返さない）。
///
/// # 戻り値
/// レスポンスボディに追記するバイト列（JsonLines では `\n` 終端の 1 行）
pub fn encode_chunk(
    fragment: &ResolvedFragment,
    encoding: Encoding,
    is_first: bool,
) -> Result<String, WireError> {
    let mut markup = String::new();
    if is_first {
        markup.push_str(&bootstrap_script());
    }
    markup.push_str(&chunk_markup(fragment));

    match encoding {
        Encoding::Inline => Ok(markup),
        Encoding::JsonLines => json_line(&markup),
    }
}

/// JsonLines ストリームの 1 行目: 変換前にキャプチャした初期ドキュメントシェル
///
/// 「シェル → パッチ列」というストリーム文法の起点。
pub fn encode_shell(shell: &str) -> Result<String, WireError> {
    json_line(shell)
}

/// 文字列を JSON 文字列化して `\n` 終端の 1 行にする
fn json_line(s: &str) -> Result<String, WireError> {
    let mut line = serde_json::to_string(s).map_err(WireError::BadRecord)?;
    line.push('\n');
    Ok(line)
}
