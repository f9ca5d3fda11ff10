//! suspense-stream 統合テスト
//!
//! registry + wire + stream の完全なパイプラインをテストする。
//! サーバーがエンコードしたストリームを、クライアント側の LineAssembly が
//! 任意のパケット分割から復元できることを確認する。

use bytes::Bytes;
use futures::executor::block_on;
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use suspense_registry::{RenderError, SuspenseRegistry};
use suspense_stream::{negotiate, transform_body, transform_suspense, ResponseMode};
use suspense_wire::LineAssembly;

/// n 回 Pending を返してから完了する Future
struct YieldTimes(u32);

impl Future for YieldTimes {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            Poll::Ready(())
        } else {
            self.0 -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

async fn after(yields: u32, content: String) -> Result<String, RenderError> {
    YieldTimes(yields).await;
    Ok(content)
}

fn never_fails() -> impl Future<Output = Result<String, RenderError>> {
    async { unreachable!("error renderer should not run") }
}

fn collect_bytes(s: impl Stream<Item = Bytes>) -> Vec<u8> {
    let chunks: Vec<Bytes> = block_on(s.collect());
    let mut all = Vec::new();
    for chunk in chunks {
        all.extend_from_slice(&chunk);
    }
    all
}

/// ページレンダリングを模して 2 Fragment を登録する
fn rendered_page() -> SuspenseRegistry {
    let mut registry = SuspenseRegistry::new();
    let instant = registry.register(after(0, "<p>即時</p>".to_string()), never_fails);
    let delayed = registry.register(after(6, "<p>遅延\n\"q\"</template></p>".to_string()), never_fails);
    assert_eq!((instant, delayed), (0, 1));
    registry
}

#[test]
fn test_streaming_request_roundtrip() {
    // ヘッダー付きリクエスト → JsonLines 選択
    let mode = negotiate(false, Some("text/html"), Some("1"));
    assert_eq!(mode, ResponseMode::JsonLines);

    let shell = "<!DOCTYPE html><html><body>shell</body></html>";
    let wire = collect_bytes(transform_suspense(shell.to_string(), rendered_page()));

    // クライアント側: 3 バイトずつの到着を模して復元する
    let mut assembly = LineAssembly::new();
    let mut records = Vec::new();
    for part in wire.chunks(3) {
        records.extend(assembly.push(part).unwrap());
    }
    if let Some(tail) = assembly.finish().unwrap() {
        records.push(tail);
    }

    // 1 件目はシェル、残り 2 件に ID 0 と 1 がちょうど 1 回ずつ
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], shell);
    for id in 0..2u64 {
        let needle = format!("astroSuspenseLoad({})", id);
        assert_eq!(
            records[1..].iter().filter(|r| r.contains(&needle)).count(),
            1
        );
    }
    // ブートストラップは最初の chunk のみ
    assert!(records[1].starts_with("<script>"));
    assert!(!records[2].starts_with("<script>"));
}

#[test]
fn test_plain_request_gets_inline_chunks_after_body() {
    let mode = negotiate(false, Some("text/html"), None);
    assert_eq!(mode, ResponseMode::Inline);

    let body = stream::iter(vec![
        Bytes::from_static(b"<html><body>"),
        Bytes::from_static(b"</body></html>"),
    ]);
    let out = collect_bytes(transform_body(body, rendered_page()));
    let out = String::from_utf8(out).unwrap();

    // 元の HTML が改変なしで先頭に来る
    assert!(out.starts_with("<html><body></body></html>"));
    // content 内の </template> はエスケープされ、template は 2 つだけ閉じる
    assert_eq!(out.matches("</template>").count(), 2);
    assert!(out.contains("\\x3c/template>"));
}

#[test]
fn test_failed_fragment_streams_error_rendering() {
    let mut registry = SuspenseRegistry::new();
    registry.register(
        async { Err::<String, _>("db timeout".into()) },
        || async { Ok("<p>読み込めませんでした</p>".to_string()) },
    );

    let wire = collect_bytes(transform_suspense("s".to_string(), registry));
    let mut assembly = LineAssembly::new();
    let records = assembly.push(&wire).unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[1].contains("<p>読み込めませんでした</p>"));
    assert!(records[1].contains("astroSuspenseLoad(0)"));
}
