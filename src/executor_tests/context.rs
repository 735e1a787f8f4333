use std::sync::Arc;

use futures::future::join_all;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{
    Arguments, Context, ExecutionResult, Executor, GraphQLObject, Request, Variables, async_trait,
    schema::{
        meta::{Field, ObjectMeta, Registry, Scalar, TypeRef},
        model::RootNode,
    },
    value::Value,
};

struct Query;

#[async_trait]
impl GraphQLObject for Query {
    fn type_name(&self) -> &str {
        "Query"
    }

    async fn resolve_field(
        &self,
        field_name: &str,
        _: &Arguments,
        executor: &Executor<'_>,
    ) -> ExecutionResult {
        match field_name {
            "whoami" => {
                // Lets sibling executions interleave with this one.
                tokio::task::yield_now().await;
                Ok(Context::with_current(|ctx| {
                    ctx.and_then(|ctx| ctx.request_as::<String>().cloned())
                })
                .into())
            }
            "sameContext" => Ok(Context::current()
                .is_some_and(|ctx| std::ptr::eq(&*ctx, executor.context()))
                .into()),
            "operations" => Ok(i32::try_from(executor.context().operations().count())
                .ok()
                .into()),
            "variable" => Ok(executor
                .context()
                .variables()
                .get("name")
                .and_then(|v| v.as_string_value())
                .map(ToOwned::to_owned)
                .into()),
            _ => Ok(Value::null()),
        }
    }
}

fn schema() -> RootNode {
    let mut registry = Registry::new();
    let query = registry.register(
        ObjectMeta::new(
            "Query",
            &[
                Field::new("whoami", TypeRef::from(Scalar::String).nullable()),
                Field::new("sameContext", Scalar::Boolean),
                Field::new("operations", Scalar::Int),
                Field::new("variable", TypeRef::from(Scalar::String).nullable()),
            ],
        )
        .constructor(|| Query),
    );
    RootNode::build(registry).query(query).finish().unwrap()
}

async fn whoami(root: &RootNode, name: String) -> serde_json::Value {
    let request: Request = Arc::new(name);
    let resp = crate::execute("{ whoami }", None, root, &Variables::new(), Some(request))
        .await
        .unwrap();
    serde_json::to_value(resp.data()).unwrap()
}

#[tokio::test]
async fn context_is_bound_while_resolving() {
    let root = schema();

    let resp = crate::execute(
        r#"query A($name: String = "default") { sameContext operations variable }
           query B { whoami }"#,
        None,
        &root,
        &Variables::new(),
        None,
    )
    .await
    .unwrap();

    assert!(resp.is_ok(), "{:?}", resp.errors());
    assert_eq!(
        serde_json::to_value(resp.data()).unwrap(),
        json!({"sameContext": true, "operations": 2, "variable": "default"}),
    );
    assert!(Context::current().is_none());
}

#[tokio::test]
async fn concurrent_executions_are_isolated() {
    let root = schema();

    let results = join_all((0..32).map(|i| whoami(&root, format!("user-{i}")))).await;

    for (i, data) in results.into_iter().enumerate() {
        assert_eq!(data, json!({"whoami": format!("user-{i}")}));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_executions_are_isolated() {
    let root = schema();

    let handles = (0..16)
        .map(|i| {
            let root = root.clone();
            tokio::spawn(async move { whoami(&root, format!("task-{i}")).await })
        })
        .collect::<Vec<_>>();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), json!({"whoami": format!("task-{i}")}));
    }
}

#[tokio::test]
async fn nested_executions_restore_outer_context() {
    struct Outer;

    #[async_trait]
    impl GraphQLObject for Outer {
        fn type_name(&self) -> &str {
            "Outer"
        }

        async fn resolve_field(
            &self,
            _: &str,
            _: &Arguments,
            _: &Executor<'_>,
        ) -> ExecutionResult {
            let inner = whoami(&schema(), "inner".into()).await;
            let outer = Context::with_current(|ctx| {
                ctx.and_then(|ctx| ctx.request_as::<String>().cloned())
            });
            let inner = inner["whoami"].as_str().unwrap_or_default().to_owned();
            Ok(format!("{inner}/{}", outer.unwrap_or_default()).into())
        }
    }

    let mut registry = Registry::new();
    let outer = registry.register(
        ObjectMeta::new("Outer", &[Field::new("both", Scalar::String)]).constructor(|| Outer),
    );
    let root = RootNode::build(registry).query(outer).finish().unwrap();

    let request: Request = Arc::new("outer".to_owned());
    let resp = crate::execute("{ both }", None, &root, &Variables::new(), Some(request))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(resp.data()).unwrap(),
        json!({"both": "inner/outer"}),
    );
}
