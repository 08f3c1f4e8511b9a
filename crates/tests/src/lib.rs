//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> 内存命名空间 -> Dispatcher 的端到端测试

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, MirrorSettings, Value};

    #[test]
    fn test_contract_defaults() {
        assert_eq!(ConfigVersion::default(), ConfigVersion::V1);

        let settings = MirrorSettings::default();
        assert!(!settings.capture_rows);
        assert!(settings.supervised);
    }

    #[test]
    fn test_param_syntax_snapshot() {
        let parsed: Vec<Value> = ["null", "7", "1.5", "text:7", "blob:0aff", "hello"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let rendered: Vec<String> = parsed.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["NULL", "7", "1.5", "'7'", "X'0AFF'", "'hello'"]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{collect_rows, FanoutBlueprint, Query, Row, Value};
    use dispatcher::{
        BackgroundTasks, Dispatcher, DispatcherBuilder, DispatcherConfig, DispatcherError,
        MirrorOutcome,
    };
    use memstore::{MemoryNamespace, ReplicaBehavior};
    use tokio::sync::mpsc;

    const CONFIG: &str = r#"
namespace = "orders"

[mirror]
capture_rows = true

[[targets]]
name = "a"
location_hint = "weur"

[[targets]]
name = "b"

[[targets]]
name = "c"
location_hint = "enam"

[[fixtures]]
sql = "SELECT id FROM t WHERE id=?"
columns = ["id"]
rows = [[7]]
"#;

    const SQL: &str = "SELECT id FROM t WHERE id=?";

    struct Harness {
        blueprint: FanoutBlueprint,
        namespace: MemoryNamespace,
        dispatcher: Dispatcher<MemoryNamespace>,
        outcomes: mpsc::UnboundedReceiver<MirrorOutcome>,
    }

    fn harness() -> Harness {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let namespace = MemoryNamespace::from_blueprint(&blueprint);
        let (tx, outcomes) = mpsc::unbounded_channel();
        let dispatcher = DispatcherBuilder::with_config(
            namespace.clone(),
            DispatcherConfig::from_blueprint(&blueprint),
        )
        .outcomes(tx)
        .build();

        Harness {
            blueprint,
            namespace,
            dispatcher,
            outcomes,
        }
    }

    async fn next_outcomes(
        rx: &mut mpsc::UnboundedReceiver<MirrorOutcome>,
        n: usize,
    ) -> HashMap<String, MirrorOutcome> {
        let mut outcomes = HashMap::new();
        for _ in 0..n {
            let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("mirror outcome timed out")
                .expect("outcome channel closed");
            outcomes.insert(outcome.target.clone(), outcome);
        }
        outcomes
    }

    /// End-to-end: TOML config -> MemoryNamespace -> Dispatcher
    ///
    /// 验证：
    /// 1. main (a) 返回 [7]
    /// 2. mirror b 执行失败仅记录日志
    /// 3. mirror c 读完游标，且与 main 结果一致
    #[tokio::test]
    async fn test_e2e_failing_mirror_scenario() {
        let mut h = harness();
        h.namespace.replica("b").set_behavior(ReplicaBehavior {
            fail_exec: Some("network failure".to_string()),
            ..Default::default()
        });
        let ctx = BackgroundTasks::new();
        let query = Query::new(SQL, vec![Value::Integer(7)]);

        let mut cursor = h
            .dispatcher
            .query(Some(&ctx), &h.blueprint.targets, &query)
            .await
            .unwrap();
        let rows = collect_rows(&mut cursor).await.unwrap();
        assert_eq!(rows, vec![Row::new(vec![Value::Integer(7)])]);

        ctx.wait_idle().await;
        let outcomes = next_outcomes(&mut h.outcomes, 2).await;

        assert!(!outcomes["b"].is_success());
        let c = outcomes["c"].result.as_ref().unwrap();
        assert_eq!(c.captured.as_deref(), Some(rows.as_slice()));

        assert_eq!(
            h.namespace.replica("a").location_hint(),
            Some(contracts::LocationHint::Weur)
        );
        assert_eq!(h.namespace.replica("c").completed(), 1);
        assert_eq!(h.namespace.replica("b").journal()[0].params, vec![Value::Integer(7)]);
    }

    /// main 结果与 mirror 的配置和状态无关
    #[tokio::test]
    async fn test_e2e_main_result_independent_of_mirrors() {
        let query = Query::new(SQL, vec![Value::Integer(7)]);

        let baseline = {
            let h = harness();
            let mut cursor = h
                .dispatcher
                .query(None, &h.blueprint.targets[..1], &query)
                .await
                .unwrap();
            collect_rows(&mut cursor).await.unwrap()
        };

        let h = harness();
        h.namespace.replica("b").pause();
        h.namespace.replica("c").set_behavior(ReplicaBehavior {
            fail_after_rows: Some(0),
            ..Default::default()
        });
        let ctx = BackgroundTasks::new();

        let mut cursor = h
            .dispatcher
            .query(Some(&ctx), &h.blueprint.targets, &query)
            .await
            .unwrap();
        assert_eq!(collect_rows(&mut cursor).await.unwrap(), baseline);

        h.namespace.replica("b").resume();
        ctx.wait_idle().await;
        let snapshot = h.dispatcher.metrics().snapshot();
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.failed, 1);
    }

    /// 并发查询共享同一个 dispatcher，互不干扰
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_queries() {
        let h = harness();
        let dispatcher = Arc::new(h.dispatcher);
        let targets = Arc::new(h.blueprint.targets.clone());
        let ctx = Arc::new(BackgroundTasks::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let dispatcher = Arc::clone(&dispatcher);
            let targets = Arc::clone(&targets);
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::spawn(async move {
                let query = Query::new(SQL, vec![Value::Integer(7)]);
                let mut cursor = dispatcher
                    .query(Some(ctx.as_ref()), &targets, &query)
                    .await
                    .unwrap();
                collect_rows(&mut cursor).await.unwrap().len()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        ctx.wait_idle().await;

        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.fanouts, 16);
        assert_eq!(snapshot.launched, 32);
        assert_eq!(snapshot.succeeded, 32);
        assert_eq!(h.namespace.replica("b").completed(), 16);
        assert_eq!(h.namespace.replica("c").exec_count(), 16);
    }

    /// 解析失败与 main 失败对调用方可见，且不会触发任何 mirror
    #[tokio::test]
    async fn test_e2e_main_path_errors_are_visible() {
        let h = harness();
        let ctx = BackgroundTasks::new();
        let query = Query::sql_only(SQL);

        h.namespace.replica("a").set_behavior(ReplicaBehavior {
            fail_exec: Some("no such table: t".to_string()),
            ..Default::default()
        });
        let err = h
            .dispatcher
            .query(Some(&ctx), &h.blueprint.targets, &query)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::MainExecution { .. }));

        h.namespace.set_fail_resolution(true);
        let err = h
            .dispatcher
            .query(Some(&ctx), &h.blueprint.targets, &query)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::Resolution { .. }));

        assert_eq!(ctx.pending(), 0);
        assert_eq!(h.namespace.replica("b").exec_count(), 0);
        assert_eq!(h.namespace.replica("c").exec_count(), 0);
    }
}
