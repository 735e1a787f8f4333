use std::sync::Arc;

use crate::{
    Arguments, ExecutionResult, Executor, GraphQLObject, Request, Value, async_trait,
    schema::{
        meta::{
            Argument, EnumMeta, EnumValue, Field, InterfaceMeta, ObjectMeta, Registry, Scalar,
            TypeId, TypeRef, UnionMeta,
        },
        model::RootNode,
    },
};

use super::model::{Database, Episode};

/// The root query object of the schema
#[derive(Default)]
pub struct Query;

#[async_trait]
impl GraphQLObject for Query {
    fn type_name(&self) -> &str {
        "Query"
    }

    async fn resolve_field(
        &self,
        field_name: &str,
        args: &Arguments,
        executor: &Executor<'_>,
    ) -> ExecutionResult {
        let database = Database::from_executor(executor)?;
        let found = match field_name {
            "hero" => {
                let episode = args
                    .get_input_value("episode")
                    .and_then(|e| e.as_enum_value())
                    .and_then(Episode::from_name);
                database.hero(episode)
            }
            "human" => database.human(&args.get::<String>("id").unwrap_or_default()),
            "droid" => database.droid(&args.get::<String>("id").unwrap_or_default()),
            "search" => return executor.resolve_list(&database.all()).await,
            _ => return Err(format!("Field \"{field_name}\" is not implemented").into()),
        };
        match found {
            Some(character) => executor.resolve(character).await,
            None => Ok(Value::null()),
        }
    }
}

fn character_fields(character: TypeId, episode: TypeId) -> Vec<Field> {
    vec![
        Field::new("id", Scalar::ID).description("The id of the character"),
        Field::new("name", TypeRef::from(Scalar::String).nullable())
            .description("The name of the character"),
        Field::new("friends", TypeRef::from(character).list().nullable())
            .description("The friends of the character"),
        Field::new("appearsIn", TypeRef::from(episode).list().nullable())
            .description("Which movies they appear in"),
    ]
}

/// Builds the Star Wars schema.
///
/// Its resolvers expect the [`request()`] to be passed along.
pub fn schema() -> RootNode {
    let mut registry = Registry::new();

    let episode = registry.register(
        EnumMeta::new(
            "Episode",
            &[
                EnumValue::new("NEW_HOPE"),
                EnumValue::new("EMPIRE"),
                EnumValue::new("JEDI"),
            ],
        )
        .description("One of the films in the Star Wars Trilogy"),
    );

    // `Character` refers to itself through `friends`.
    let character = registry.placeholder("Character");

    let mut human_fields = character_fields(character, episode);
    human_fields.push(
        Field::new("homePlanet", TypeRef::from(Scalar::String).nullable())
            .description("The home planet of the human"),
    );
    let human = registry.register(
        ObjectMeta::new("Human", &human_fields)
            .description("A humanoid creature in the Star Wars universe.")
            .interfaces(&[character]),
    );

    let mut droid_fields = character_fields(character, episode);
    droid_fields.push(
        Field::new("primaryFunction", TypeRef::from(Scalar::String).nullable())
            .description("The primary function of the droid"),
    );
    let droid = registry.register(
        ObjectMeta::new("Droid", &droid_fields)
            .description("A mechanical creature in the Star Wars universe.")
            .interfaces(&[character]),
    );

    registry
        .define(
            character,
            InterfaceMeta::new("Character", &character_fields(character, episode))
                .description("A character in the Star Wars Trilogy"),
        )
        .expect("`Character` is declared once");

    let search_result = registry.register(UnionMeta::new("SearchResult", &[human, droid]));

    let query = registry.register(
        ObjectMeta::new(
            "Query",
            &[
                Field::new("hero", TypeRef::from(character).nullable()).argument(
                    Argument::new("episode", TypeRef::from(episode).nullable()).description(
                        "If omitted, returns the hero of the whole saga. \
                         If provided, returns the hero of that particular episode",
                    ),
                ),
                Field::new("human", TypeRef::from(human).nullable())
                    .argument(Argument::new("id", Scalar::ID).description("id of the human")),
                Field::new("droid", TypeRef::from(droid).nullable())
                    .argument(Argument::new("id", Scalar::ID).description("id of the droid")),
                Field::new("search", TypeRef::from(search_result).list().nullable())
                    .deprecated(Some("Use `hero` instead")),
            ],
        )
        .description("The root query object of the schema")
        .constructor(Query::default),
    );

    RootNode::build(registry)
        .description("The Star Wars trilogy")
        .query(query)
        .finish()
        .expect("Star Wars schema is valid")
}

/// The [`Database`] to execute the [`schema()`] with.
pub fn request() -> Request {
    Arc::new(Database::new())
}
