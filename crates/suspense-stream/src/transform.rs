//! レスポンスボディの変換ストリーム

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use suspense_registry::SuspenseRegistry;
use suspense_wire::{encode_chunk, encode_shell, Encoding};

/// text/html レスポンスの末尾に chunk を追記するストリームを作る
///
/// 元のボディのバイト列は一切手を加えずに先に流し、ボディが尽きたら
/// レジストリを drain して settle 順に chunk を書く。
/// ストリームが終端するのは drain 完了後のみ。
///
/// # 引数
/// - `body`: 元のレスポンスボディ（任意のチャンク分割でよい）
/// - `registry`: このリクエストで登録された Fragment のレジストリ
pub fn transform_body<S>(
    body: S,
    registry: SuspenseRegistry,
) -> impl Stream<Item = Bytes>
where
    S: Stream<Item = Bytes>,
{
    body.chain(chunk_lines(registry, Encoding::Inline).map(Bytes::from))
}

/// streaming navigation 用の line-delimited ストリームを作る
///
/// 1 行目は変換前にキャプチャした初期 HTML シェル。以降は chunk が
/// settle するたびに 1 行ずつ続く（最初の chunk にはブートストラップ込み）。
///
/// # 引数
/// - `shell`: バッファ済みの元レスポンスボディ全体
/// - `registry`: このリクエストで登録された Fragment のレジストリ
pub fn transform_suspense(
    shell: String,
    registry: SuspenseRegistry,
) -> impl Stream<Item = Bytes> {
    let shell_line = stream::once(async move {
        match encode_shell(&shell) {
            Ok(line) => Some(line),
            Err(err) => {
                tracing::error!(error = %err, "shell encode failed");
                None
            }
        }
    })
    .filter_map(|line| async move { line });

    shell_line
        .chain(chunk_lines(registry, Encoding::JsonLines))
        .map(Bytes::from)
}

/// レジストリを drain し、Wire Format にエンコードした chunk 列を返す
///
/// ブートストラップは最初の chunk にだけ前置される。
fn chunk_lines(
    registry: SuspenseRegistry,
    encoding: Encoding,
) -> impl Stream<Item = String> {
    registry
        .drain()
        .enumerate()
        .filter_map(move |(index, fragment)| async move {
            match encode_chunk(&fragment, encoding, index == 0) {
                Ok(chunk) => Some(chunk),
                Err(err) => {
                    // 文字列の JSON 化は実質失敗しないが、chunk を欠いても
                    // ストリーム全体は止めない
                    tracing::error!(fragment_id = fragment.id, error = %err, "chunk encode failed");
                    None
                }
            }
        })
}
