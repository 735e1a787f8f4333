mod field_execution {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        Arguments, ExecutionResult, Executor, GraphQLObject, async_trait,
        ast::InputValue,
        schema::{
            meta::{Argument, Field, ObjectMeta, Registry, Scalar, TypeRef},
            model::RootNode,
        },
        value::Value,
    };

    struct DataType;
    struct DeepDataType;

    #[async_trait]
    impl GraphQLObject for DataType {
        fn type_name(&self) -> &str {
            "DataType"
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            args: &Arguments,
            executor: &Executor<'_>,
        ) -> ExecutionResult {
            match field_name {
                "a" => Ok("Apple".into()),
                "b" => Ok("Banana".into()),
                "c" => Ok("Cookie".into()),
                "d" => Ok("Donut".into()),
                "e" => Ok("Egg".into()),
                "f" => Ok("Fish".into()),
                "pic" => {
                    let size = args.get::<i32>("size").unwrap_or(50);
                    Ok(format!("Pic of size: {size}").into())
                }
                "deep" => executor.resolve(&DeepDataType).await,
                _ => Err("not implemented".into()),
            }
        }
    }

    #[async_trait]
    impl GraphQLObject for DeepDataType {
        fn type_name(&self) -> &str {
            "DeepDataType"
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _: &Arguments,
            executor: &Executor<'_>,
        ) -> ExecutionResult {
            match field_name {
                "a" => Ok("Already Been Done".into()),
                "b" => Ok("Boring".into()),
                "c" => Ok(vec![Some("Contrived"), None, Some("Confusing")].into()),
                "deeper" => Ok(Value::list(vec![
                    executor.resolve_into_value(&DataType).await,
                    Value::null(),
                    executor.resolve_into_value(&DataType).await,
                ])),
                _ => Err("not implemented".into()),
            }
        }
    }

    fn schema() -> RootNode {
        let string = || TypeRef::from(Scalar::String).nullable();

        let mut registry = Registry::new();
        let data = registry.placeholder("DataType");
        let deep = registry.register(ObjectMeta::new(
            "DeepDataType",
            &[
                Field::new("a", string()),
                Field::new("b", string()),
                Field::new("c", string().list().nullable()),
                Field::new("deeper", TypeRef::from(data).nullable().list().nullable()),
            ],
        ));
        registry
            .define(
                data,
                ObjectMeta::new(
                    "DataType",
                    &[
                        Field::new("a", string()),
                        Field::new("b", string()),
                        Field::new("c", string()),
                        Field::new("d", string()),
                        Field::new("e", string()),
                        Field::new("f", string()),
                        Field::new("pic", string())
                            .argument(Argument::new("size", TypeRef::from(Scalar::Int).nullable())),
                        Field::new("deep", TypeRef::from(deep).nullable()),
                    ],
                )
                .constructor(|| DataType),
            )
            .unwrap();

        RootNode::build(registry).query(data).finish().unwrap()
    }

    async fn run(doc: &str, vars: &crate::Variables) -> crate::GraphQLResponse {
        crate::execute(doc, None, &schema(), vars, None).await.unwrap()
    }

    #[tokio::test]
    async fn test() {
        let doc = r"
          query Example($size: Int) {
            a,
            b,
            x: c
            ...c
            f
            ...on DataType {
              pic(size: $size)
            }
            deep {
              a
              b
              c
              deeper {
                a
                b
              }
            }
          }

          fragment c on DataType {
            d
            e
          }";

        let mut vars = crate::Variables::new();
        vars.insert("size".into(), InputValue::scalar(100));

        let resp = run(doc, &vars).await;

        assert!(resp.errors().is_empty(), "{:?}", resp.errors());
        assert_eq!(
            serde_json::to_value(resp.data()).unwrap(),
            json!({
                "a": "Apple",
                "b": "Banana",
                "x": "Cookie",
                "d": "Donut",
                "e": "Egg",
                "f": "Fish",
                "pic": "Pic of size: 100",
                "deep": {
                    "a": "Already Been Done",
                    "b": "Boring",
                    "c": ["Contrived", null, "Confusing"],
                    "deeper": [
                        {"a": "Apple", "b": "Banana"},
                        null,
                        {"a": "Apple", "b": "Banana"},
                    ],
                },
            }),
        );
    }

    #[tokio::test]
    async fn unknown_argument() {
        let resp = run(r#"{ pic(size: 1, color: "red") a }"#, &crate::Variables::new()).await;

        assert_eq!(
            serde_json::to_value(resp.data()).unwrap(),
            json!({"pic": null, "a": "Apple"}),
        );
        assert_eq!(resp.errors().len(), 1);
        assert_eq!(resp.errors()[0].error().message(), "Unknown argument \"color\"");
        assert_eq!(resp.errors()[0].path(), ["pic"]);
    }

    #[tokio::test]
    async fn object_without_selection() {
        let resp = run("{ deep }", &crate::Variables::new()).await;

        assert_eq!(serde_json::to_value(resp.data()).unwrap(), json!({"deep": null}));
        assert_eq!(
            resp.errors()[0].error().message(),
            "Field of type \"DeepDataType\" must have a selection of subfields",
        );
    }

    #[tokio::test]
    async fn unknown_fragment() {
        let resp = run("{ ...Missing a }", &crate::Variables::new()).await;

        assert_eq!(serde_json::to_value(resp.data()).unwrap(), json!({"a": "Apple"}));
        assert_eq!(resp.errors()[0].error().message(), "Unknown fragment \"Missing\"");
    }

    #[tokio::test]
    async fn fragment_on_other_type_is_skipped() {
        let resp = run(
            "{ a ... on DeepDataType { b } ...Deep } fragment Deep on DeepDataType { c }",
            &crate::Variables::new(),
        )
        .await;

        assert!(resp.is_ok());
        assert_eq!(serde_json::to_value(resp.data()).unwrap(), json!({"a": "Apple"}));
    }

    #[tokio::test]
    async fn fragment_spreading_itself_is_rejected() {
        let result = crate::execute(
            "{ ...A } fragment A on DataType { a ...A }",
            None,
            &schema(),
            &crate::Variables::new(),
            None,
        )
        .await;

        assert_eq!(result, Err(crate::GraphQLError::FragmentCycle("A".into())));
    }

    #[tokio::test]
    async fn indirect_fragment_cycle_is_rejected() {
        let result = crate::execute(
            r"
            { ...A }
            fragment A on DataType { deep { ...B } }
            fragment B on DeepDataType { ...C }
            fragment C on DeepDataType { a ... on DeepDataType { ...B } }
            ",
            None,
            &schema(),
            &crate::Variables::new(),
            None,
        )
        .await;

        assert_eq!(result, Err(crate::GraphQLError::FragmentCycle("B".into())));
    }

    #[tokio::test]
    async fn shared_fragment_is_not_a_cycle() {
        let resp = run(
            "{ ...A ...B } fragment A on DataType { ...C } \
             fragment B on DataType { ...C } fragment C on DataType { a }",
            &crate::Variables::new(),
        )
        .await;

        assert!(resp.is_ok());
        assert_eq!(serde_json::to_value(resp.data()).unwrap(), json!({"a": "Apple"}));
    }
}

mod merge_parallel_fragments {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        Arguments, ExecutionResult, Executor, GraphQLObject, Variables, async_trait,
        schema::{
            meta::{Field, ObjectMeta, Registry, Scalar, TypeRef},
            model::RootNode,
        },
    };

    struct Type;

    #[async_trait]
    impl GraphQLObject for Type {
        fn type_name(&self) -> &str {
            "Type"
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _: &Arguments,
            executor: &Executor<'_>,
        ) -> ExecutionResult {
            match field_name {
                "a" => Ok("Apple".into()),
                "b" => Ok("Banana".into()),
                "c" => Ok("Cherry".into()),
                "deep" => executor.resolve(&Type).await,
                _ => Err("not implemented".into()),
            }
        }
    }

    #[tokio::test]
    async fn test() {
        let mut registry = Registry::new();
        let ty = registry.placeholder("Type");
        registry
            .define(
                ty,
                ObjectMeta::new(
                    "Type",
                    &[
                        Field::new("a", TypeRef::from(Scalar::String).nullable()),
                        Field::new("b", TypeRef::from(Scalar::String).nullable()),
                        Field::new("c", TypeRef::from(Scalar::String).nullable()),
                        Field::new("deep", TypeRef::from(ty).nullable()),
                    ],
                )
                .constructor(|| Type),
            )
            .unwrap();
        let schema = RootNode::build(registry).query(ty).finish().unwrap();

        let doc = r"
          { a, ...FragOne, ...FragTwo }
          fragment FragOne on Type {
            b
            deep { b, deeper: deep { b } }
          }
          fragment FragTwo on Type {
            c
            deep { c, deeper: deep { c } }
          }";

        let resp = crate::execute(doc, None, &schema, &Variables::new(), None)
            .await
            .unwrap();

        assert!(resp.is_ok());
        assert_eq!(
            serde_json::to_string(resp.data()).unwrap(),
            r#"{"a":"Apple","b":"Banana","deep":{"b":"Banana","deeper":{"b":"Banana","c":"Cherry"},"c":"Cherry"},"c":"Cherry"}"#,
        );
        assert_eq!(
            serde_json::to_value(resp.data()).unwrap(),
            json!({
                "a": "Apple",
                "b": "Banana",
                "c": "Cherry",
                "deep": {
                    "b": "Banana",
                    "c": "Cherry",
                    "deeper": {"b": "Banana", "c": "Cherry"},
                },
            }),
        );
    }
}

mod propagates_errors_to_nullable_fields {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        Arguments, ExecutionResult, Executor, FieldError, GraphQLObject, Variables, async_trait,
        schema::{
            meta::{Field, ObjectMeta, Registry, Scalar, TypeRef},
            model::RootNode,
        },
        value::Value,
    };

    struct Schema;
    struct Inner;

    fn failing() -> ExecutionResult {
        Err(FieldError::new(
            "Failed",
            Value::object(vec![("code", Value::scalar("E42"))].into_iter().collect()),
        ))
    }

    #[async_trait]
    impl GraphQLObject for Schema {
        fn type_name(&self) -> &str {
            "Schema"
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _: &Arguments,
            executor: &Executor<'_>,
        ) -> ExecutionResult {
            match field_name {
                "ok" => Ok("ok".into()),
                "fail" => failing(),
                "nonNull" => Ok(Value::null()),
                "inner" => executor.resolve(&Inner).await,
                _ => Err("not implemented".into()),
            }
        }
    }

    #[async_trait]
    impl GraphQLObject for Inner {
        fn type_name(&self) -> &str {
            "Inner"
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _: &Arguments,
            _: &Executor<'_>,
        ) -> ExecutionResult {
            match field_name {
                "ok" => Ok("ok".into()),
                "fail" => failing(),
                _ => Err("not implemented".into()),
            }
        }
    }

    fn schema() -> RootNode {
        let nullable = || TypeRef::from(Scalar::String).nullable();

        let mut registry = Registry::new();
        let inner = registry.register(ObjectMeta::new(
            "Inner",
            &[Field::new("ok", nullable()), Field::new("fail", nullable())],
        ));
        let query = registry.register(
            ObjectMeta::new(
                "Schema",
                &[
                    Field::new("ok", nullable()),
                    Field::new("fail", nullable()),
                    Field::new("nonNull", Scalar::String),
                    Field::new("inner", TypeRef::from(inner).nullable()),
                ],
            )
            .constructor(|| Schema),
        );

        RootNode::build(registry).query(query).finish().unwrap()
    }

    #[tokio::test]
    async fn keeps_sibling_data() {
        let resp = crate::execute(
            "{ ok fail inner { ok fail } nonNull }",
            None,
            &schema(),
            &Variables::new(),
            None,
        )
        .await
        .unwrap();

        assert!(!resp.is_ok());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "errors": [
                    {
                        "message": "Failed",
                        "locations": [{"line": 1, "column": 6}],
                        "path": ["fail"],
                        "extensions": {"code": "E42"},
                    },
                    {
                        "message": "Failed",
                        "locations": [{"line": 1, "column": 22}],
                        "path": ["inner", "fail"],
                        "extensions": {"code": "E42"},
                    },
                    {
                        "message": "Cannot return null for non-nullable field \"nonNull\"",
                        "locations": [{"line": 1, "column": 29}],
                        "path": ["nonNull"],
                    },
                ],
                "data": {
                    "ok": "ok",
                    "fail": null,
                    "inner": {"ok": "ok", "fail": null},
                    "nonNull": null,
                },
            }),
        );
    }

    #[tokio::test]
    async fn success_flag_follows_errors() {
        let root = schema();

        let (_, ok) = root.execute("{ ok inner { ok } }", None, None).await.unwrap();
        assert!(ok);

        let (json, ok) = root.execute("{ ok fail }", None, None).await.unwrap();
        assert!(!ok);
        assert!(json.starts_with(r#"{"errors":[{"message":"Failed""#), "{json}");
    }
}

mod directives {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{InputValue, Variables, tests::fixtures::hello};

    async fn run(doc: &str, vars: &Variables) -> serde_json::Value {
        let resp = crate::execute(doc, None, &hello::schema(), vars, None)
            .await
            .unwrap();
        assert!(resp.is_ok(), "{:?}", resp.errors());
        serde_json::to_value(resp.data()).unwrap()
    }

    #[tokio::test]
    async fn scalar_include_true() {
        assert_eq!(
            run("{ a: hello, b: hello @include(if: true) }", &Variables::new()).await,
            json!({"a": "world", "b": "world"}),
        );
    }

    #[tokio::test]
    async fn scalar_include_false() {
        assert_eq!(
            run("{ a: hello, b: hello @include(if: false) }", &Variables::new()).await,
            json!({"a": "world"}),
        );
    }

    #[tokio::test]
    async fn scalar_skip_true() {
        assert_eq!(
            run("{ a: hello, b: hello @skip(if: true) }", &Variables::new()).await,
            json!({"a": "world"}),
        );
    }

    #[tokio::test]
    async fn fragment_spread_skip() {
        assert_eq!(
            run(
                "{ a: hello, ...Frag @skip(if: true) } fragment Frag on RootQuery { b: hello }",
                &Variables::new(),
            )
            .await,
            json!({"a": "world"}),
        );
    }

    #[tokio::test]
    async fn inline_fragment_include_variable() {
        let mut vars = Variables::new();
        vars.insert("show".into(), InputValue::scalar(false));

        assert_eq!(
            run(
                "query Q($show: Boolean!) { a: hello, ... @include(if: $show) { b: hello } }",
                &vars,
            )
            .await,
            json!({"a": "world"}),
        );
    }
}

mod operations {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::time::{Duration, sleep};

    use crate::{
        Arguments, ExecutionResult, Executor, GraphQLError, GraphQLObject, OperationType,
        Request, Variables, async_trait,
        schema::{
            meta::{Field, ObjectMeta, Registry, Scalar},
            model::RootNode,
        },
        tests::fixtures::hello,
    };

    /// Records the order in which fields complete.
    #[derive(Default)]
    struct Log(Mutex<Vec<&'static str>>);

    struct Recorder(&'static str);

    #[async_trait]
    impl GraphQLObject for Recorder {
        fn type_name(&self) -> &str {
            self.0
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _: &Arguments,
            executor: &Executor<'_>,
        ) -> ExecutionResult {
            let log = executor
                .context()
                .request_as::<Log>()
                .ok_or("no log")?;
            let name = match field_name {
                "slow" => {
                    sleep(Duration::from_millis(50)).await;
                    "slow"
                }
                "fast" => "fast",
                _ => return Err("not implemented".into()),
            };
            log.0.lock().unwrap().push(name);
            Ok(name.into())
        }
    }

    fn schema() -> RootNode {
        let fields = [
            Field::new("slow", Scalar::String),
            Field::new("fast", Scalar::String),
        ];

        let mut registry = Registry::new();
        let query = registry.register(
            ObjectMeta::new("Query", &fields).constructor(|| Recorder("Query")),
        );
        let mutation = registry.register(
            ObjectMeta::new("Mutation", &fields).constructor(|| Recorder("Mutation")),
        );

        RootNode::build(registry)
            .query(query)
            .mutation(mutation)
            .finish()
            .unwrap()
    }

    async fn run(doc: &str) -> (serde_json::Value, Vec<&'static str>) {
        let log = Arc::new(Log::default());
        let request: Request = log.clone();
        let resp = crate::execute(doc, None, &schema(), &Variables::new(), Some(request))
            .await
            .unwrap();
        assert!(resp.is_ok(), "{:?}", resp.errors());

        let order = log.0.lock().unwrap().clone();
        (serde_json::to_value(resp.data()).unwrap(), order)
    }

    #[tokio::test]
    async fn query_fields_resolve_concurrently() {
        let (data, order) = run("{ slow fast }").await;

        assert_eq!(order, ["fast", "slow"]);
        assert_eq!(data, json!({"slow": "slow", "fast": "fast"}));
    }

    #[tokio::test]
    async fn mutation_fields_resolve_serially() {
        let (data, order) = run("mutation { slow fast }").await;

        assert_eq!(order, ["slow", "fast"]);
        assert_eq!(data, json!({"slow": "slow", "fast": "fast"}));
    }

    #[tokio::test]
    async fn mutation_without_root() {
        assert_eq!(
            crate::execute(
                "mutation { hello }",
                None,
                &hello::schema(),
                &Variables::new(),
                None,
            )
            .await,
            Err(GraphQLError::NoRootType(OperationType::Mutation)),
        );
    }

    #[tokio::test]
    async fn subscription_is_not_executable() {
        assert_eq!(
            crate::execute(
                "subscription { hello }",
                None,
                &hello::schema(),
                &Variables::new(),
                None,
            )
            .await,
            Err(GraphQLError::NoOperationProvided),
        );
    }
}

mod panics {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        Arguments, Context, ExecutionResult, Executor, GraphQLObject, Variables, async_trait,
        schema::{
            meta::{Field, ObjectMeta, Registry, Scalar, TypeRef},
            model::RootNode,
        },
    };

    struct Fragile;

    #[async_trait]
    impl GraphQLObject for Fragile {
        fn type_name(&self) -> &str {
            "Fragile"
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _: &Arguments,
            _: &Executor<'_>,
        ) -> ExecutionResult {
            match field_name {
                "fine" => Ok("fine".into()),
                "boom" => panic!("boom"),
                _ => Err("not implemented".into()),
            }
        }
    }

    fn schema() -> RootNode {
        let mut registry = Registry::new();
        let query = registry.register(
            ObjectMeta::new(
                "Fragile",
                &[
                    Field::new("fine", Scalar::String),
                    Field::new("boom", TypeRef::from(Scalar::String).nullable()),
                ],
            )
            .constructor(|| Fragile),
        );
        RootNode::build(registry).query(query).finish().unwrap()
    }

    #[tokio::test]
    async fn panic_is_captured_as_error() {
        let root = schema();

        let resp = crate::execute("{ fine boom }", None, &root, &Variables::new(), None)
            .await
            .unwrap();

        assert!(!resp.is_ok());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "errors": [{
                    "message": "boom",
                    "locations": [{"line": 1, "column": 1}],
                    "path": [],
                }],
                "data": null,
            }),
        );
        assert!(Context::current().is_none());

        let resp = crate::execute("{ fine }", None, &root, &Variables::new(), None)
            .await
            .unwrap();
        assert!(resp.is_ok());
    }
}
