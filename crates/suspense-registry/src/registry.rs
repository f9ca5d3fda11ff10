//! Fragment レジストリと settle 順 drain

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, Stream};
use futures::FutureExt;

use suspense_wire::ResolvedFragment;

/// Fragment レンダリングの失敗理由（ホストのレンダラー任せなので型は開いておく）
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Fragment の content を生成する Future
pub type ContentFuture = BoxFuture<'static, Result<String, RenderError>>;

/// content 失敗時に代替 content を生成するレンダラー
///
/// content が成功した場合は一度も呼ばれないため、遅延構築にしてある。
type ErrorRenderer = Box<dyn FnOnce() -> ContentFuture + Send>;

/// 未解決の Fragment（レジストリが所有する）
struct PendingFragment {
    id: u64,
    content: ContentFuture,
    error_content: ErrorRenderer,
}

/// リクエスト単位の Fragment レジストリ
///
/// ID は 0 始まりで単調増加、リクエスト内で再利用しない。
/// リクエストをまたいだ共有はしない前提なのでロックは不要。
pub struct SuspenseRegistry {
    next_id: u64,
    pending: Vec<PendingFragment>,
}

impl SuspenseRegistry {
    /// 新しいレジストリを生成する
    pub fn new() -> Self {
        SuspenseRegistry {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// 未解決 Fragment を登録し、採番した ID を同期的に返す
    ///
    /// # 引数
    /// - `content`: Fragment 本体を生成する Future
    /// - `error_content`: content 失敗時の代替レンダラー（成功時は呼ばれない）
    ///
    /// # 戻り値
    /// プレースホルダー要素と chunk を対応付ける Fragment ID
    pub fn register<C, E, F>(&mut self, content: C, error_content: E) -> u64
    where
        C: std::future::Future<Output = Result<String, RenderError>> + Send + 'static,
        E: FnOnce() -> F + Send + 'static,
        F: std::future::Future<Output = Result<String, RenderError>> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        self.pending.push(PendingFragment {
            id,
            content: content.boxed(),
            error_content: Box::new(move || error_content().boxed()),
        });

        id
    }

    /// 登録済み Fragment 数
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// 登録がひとつもないか
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 全 Fragment を並行に解決し、settle した順に流すストリームを返す
    ///
    /// レジストリを消費する。drain 開始後の追加登録は想定しない
    /// （登録はレスポンスボディ生成中に完了している）。
    /// 登録ゼロなら即終端するストリームになる。
    pub fn drain(self) -> impl Stream<Item = ResolvedFragment> + Send {
        // 残りの未解決集合を完了のたびに再レースする k-way マージ。
        // FuturesUnordered がまさにその fan-in を実装している。
        self.pending
            .into_iter()
            .map(resolve_one)
            .collect::<FuturesUnordered<_>>()
    }
}

impl Default for SuspenseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 1 Fragment を解決する: 成功値か、失敗時はエラーレンダラーの出力
async fn resolve_one(fragment: PendingFragment) -> ResolvedFragment {
    let PendingFragment {
        id,
        content,
        error_content,
    } = fragment;

    match content.await {
        Ok(content) => ResolvedFragment { id, content },
        Err(err) => {
            tracing::error!(fragment_id = id, error = %err, "fragment content failed");
            match error_content().await {
                Ok(content) => ResolvedFragment { id, content },
                Err(err) => {
                    // 代替レンダラーまで失敗した場合も chunk は必ず流す。
                    // ID が永久に届かないとクライアントのプレースホルダーが残り続ける。
                    tracing::error!(fragment_id = id, error = %err, "error renderer failed, emitting empty fragment");
                    ResolvedFragment {
                        id,
                        content: String::new(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::StreamExt;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// n 回 Pending を返してから完了する Future（wall-clock なしの決定的な遅延）
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

    async fn slow_ok(yields: u32, content: &'static str) -> Result<String, RenderError> {
        YieldTimes(yields).await;
        Ok(content.to_string())
    }

    async fn fail(message: &'static str) -> Result<String, RenderError> {
        Err(message.into())
    }

    fn unused_error() -> impl Future<Output = Result<String, RenderError>> {
        async { panic!("error renderer must not run for successful fragments") }
    }

    #[test]
    fn test_ids_are_monotonic_from_zero() {
        let mut registry = SuspenseRegistry::new();
        for expected in 0..4 {
            let id = registry.register(slow_ok(0, "x"), unused_error);
            assert_eq!(id, expected);
        }
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_drain_yields_in_settlement_order() {
        let mut registry = SuspenseRegistry::new();
        // 登録順 0,1,2 / settle 順 1,2,0
        registry.register(slow_ok(5, "late"), unused_error);
        registry.register(slow_ok(0, "instant"), unused_error);
        registry.register(slow_ok(2, "middle"), unused_error);

        let resolved: Vec<_> = block_on(registry.drain().collect());

        let ids: Vec<u64> = resolved.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(resolved[0].content, "instant");
        assert_eq!(resolved[2].content, "late");
    }

    #[test]
    fn test_each_id_yields_exactly_once() {
        let mut registry = SuspenseRegistry::new();
        let n = 8u64;
        for i in 0..n {
            // 登録順と逆の settle 順になるような遅延
            registry.register(slow_ok((n - i) as u32, "c"), unused_error);
        }

        let resolved: Vec<_> = block_on(registry.drain().collect());
        assert_eq!(resolved.len(), n as usize);

        let mut ids: Vec<u64> = resolved.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_failed_content_substitutes_error_renderer() {
        let mut registry = SuspenseRegistry::new();
        registry.register(fail("boom"), || async { Ok("fallback".to_string()) });

        let resolved: Vec<_> = block_on(registry.drain().collect());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, 0);
        assert_eq!(resolved[0].content, "fallback");
    }

    #[test]
    fn test_failed_error_renderer_still_terminates() {
        let mut registry = SuspenseRegistry::new();
        registry.register(fail("boom"), || fail("renderer down"));
        registry.register(slow_ok(1, "ok"), unused_error);

        let resolved: Vec<_> = block_on(registry.drain().collect());
        // 両方の ID が届き、ストリームは終端する
        assert_eq!(resolved.len(), 2);
        let broken = resolved.iter().find(|r| r.id == 0).unwrap();
        assert_eq!(broken.content, "");
    }

    #[test]
    fn test_empty_registry_drains_immediately() {
        let registry = SuspenseRegistry::new();
        let resolved: Vec<_> = block_on(registry.drain().collect());
        assert!(resolved.is_empty());
    }
}
