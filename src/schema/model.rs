//! Schema roots, and registration of the types reachable from them

use std::{iter, sync::Arc};

use arcstr::ArcStr;
use fnv::FnvHashMap;
use indexmap::IndexSet;

use crate::{
    GraphQLError,
    ast::{OperationType, Variables},
    executor::Request,
    schema::{
        meta::{Argument, Classified, Field, MetaType, ObjectMeta, Registry, TypeId, TypeRef},
        printer,
        validation::{self, MUTATION_FIELD, QUERY_FIELD, SchemaError},
    },
};

/// Root query node of a schema
///
/// This brings the declared types together: it holds the validated,
/// registered [`SchemaType`] every request is executed against. Cloning is
/// cheap, as the schema itself is shared.
#[derive(Clone, Debug)]
pub struct RootNode {
    schema: Arc<SchemaType>,
}

/// Metadata for a schema
///
/// Built once by [`SchemaBuilder::finish()`] and read-only afterwards, so it
/// can be shared by any number of concurrent executions.
#[derive(Debug)]
pub struct SchemaType {
    registry: Registry,
    description: Option<ArcStr>,
    fields: Vec<Field>,
    validated_types: IndexSet<TypeRef>,
    registered_types: Vec<TypeId>,
    implementors: FnvHashMap<TypeId, Vec<TypeId>>,
    types_by_name: FnvHashMap<ArcStr, TypeId>,
    query_type: TypeId,
    mutation_type: Option<TypeId>,
}

/// Builder of a [`RootNode`].
///
/// Collects the root fields of a schema over the types declared in a
/// [`Registry`]. Nothing is checked until [`SchemaBuilder::finish()`].
#[derive(Debug)]
#[must_use]
pub struct SchemaBuilder {
    registry: Registry,
    description: Option<ArcStr>,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Sets the `description` of the schema.
    ///
    /// Overwrites any previously set description.
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a raw root `field`.
    ///
    /// Only `query` and `mutation` fields of a nullable object type are
    /// accepted by [`SchemaBuilder::finish()`].
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares the object type serving query operations.
    pub fn query(self, object: TypeId) -> Self {
        self.field(Field::new(QUERY_FIELD, TypeRef::Named(object).nullable()))
    }

    /// Declares the object type serving mutation operations.
    pub fn mutation(self, object: TypeId) -> Self {
        self.field(Field::new(MUTATION_FIELD, TypeRef::Named(object).nullable()))
    }

    /// Validates the schema and registers every type reachable from its root.
    ///
    /// # Errors
    ///
    /// If any structural rule is violated. No schema is built in that case.
    pub fn finish(self) -> Result<RootNode, SchemaError> {
        validation::validate_schema(&self.registry, &self.fields)?;
        SchemaType::new(self.registry, self.description, self.fields).map(|schema| RootNode {
            schema: Arc::new(schema),
        })
    }
}

impl RootNode {
    /// Starts building a schema over the types declared in `registry`.
    pub fn build(registry: Registry) -> SchemaBuilder {
        SchemaBuilder {
            registry,
            description: None,
            fields: vec![],
        }
    }

    /// The schema this node executes against.
    pub fn schema(&self) -> &Arc<SchemaType> {
        &self.schema
    }

    /// Executes the first operation of the `query` document and serializes
    /// the response.
    ///
    /// Returns the JSON text of the response together with whether it is
    /// free of errors.
    ///
    /// # Errors
    ///
    /// If the document can't be parsed, holds no executable operation, or the
    /// response can't be serialized. Resolution errors end up inside the
    /// response instead.
    pub async fn execute(
        &self,
        query: &str,
        variables: Option<Variables>,
        request: Option<Request>,
    ) -> Result<(String, bool), GraphQLError> {
        crate::execute(query, None, self, &variables.unwrap_or_default(), request)
            .await?
            .to_json()
            .map_err(|e| GraphQLError::Serialization(e.to_string()))
    }

    /// Returns this schema printed in the GraphQL schema definition language.
    pub fn as_sdl(&self) -> String {
        printer::print_schema(&self.schema)
    }
}

impl SchemaType {
    fn new(
        registry: Registry,
        description: Option<ArcStr>,
        fields: Vec<Field>,
    ) -> Result<Self, SchemaError> {
        let mut implementors = FnvHashMap::<TypeId, Vec<TypeId>>::default();
        for (id, meta) in registry.iter() {
            if let MetaType::Object(ObjectMeta { interfaces, .. }) = meta {
                for iface in interfaces {
                    implementors.entry(*iface).or_default().push(id);
                }
            }
        }

        let mut registrar = Registrar {
            registry: &registry,
            implementors: &implementors,
            validated_types: IndexSet::new(),
            registered_types: vec![],
        };
        registrar.register_fields_type(&fields)?;
        let Registrar {
            validated_types,
            registered_types,
            ..
        } = registrar;

        let types_by_name = registered_types
            .iter()
            .filter_map(|id| registry.get(*id).map(|m| (ArcStr::from(m.name()), *id)))
            .collect();

        let root_type = |name: &str| {
            fields
                .iter()
                .find(|f| f.name == name)
                .and_then(|f| f.field_type.innermost_id())
        };
        let query_type = root_type(QUERY_FIELD).ok_or(SchemaError::MissingQueryRoot)?;
        let mutation_type = root_type(MUTATION_FIELD);

        tracing::debug!(
            validated = validated_types.len(),
            registered = registered_types.len(),
            "schema built"
        );

        Ok(Self {
            registry,
            description,
            fields,
            validated_types,
            registered_types,
            implementors,
            types_by_name,
            query_type,
            mutation_type,
        })
    }

    /// The registry of all declared types.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The description of the schema, if any.
    pub fn description(&self) -> Option<&ArcStr> {
        self.description.as_ref()
    }

    /// The root fields of the schema.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Every type annotation visited while registering, in discovery order.
    pub fn validated_types(&self) -> &IndexSet<TypeRef> {
        &self.validated_types
    }

    /// Every named type reachable from the root, in discovery order.
    pub fn registered_types(&self) -> &[TypeId] {
        &self.registered_types
    }

    /// Iterates over the metadata of [`SchemaType::registered_types()`].
    pub fn type_list(&self) -> impl Iterator<Item = (TypeId, &MetaType)> {
        self.registered_types
            .iter()
            .filter_map(|id| self.registry.get(*id).map(|m| (*id, m)))
    }

    /// Looks up a registered type by its name.
    pub fn type_by_name(&self, name: &str) -> Option<(TypeId, &MetaType)> {
        let id = *self.types_by_name.get(name)?;
        self.registry.get(id).map(|m| (id, m))
    }

    /// Looks up a registered object type by its name.
    pub fn concrete_type_by_name(&self, name: &str) -> Option<(TypeId, &ObjectMeta)> {
        match self.type_by_name(name)? {
            (id, MetaType::Object(o)) => Some((id, o)),
            _ => None,
        }
    }

    /// Looks up the metadata of a declared type.
    pub fn meta(&self, id: TypeId) -> Option<&MetaType> {
        self.registry.get(id)
    }

    /// Objects declaring to implement the `interface`, in declaration order.
    pub fn implementors(&self, interface: TypeId) -> &[TypeId] {
        self.implementors
            .get(&interface)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The object type serving query operations.
    pub fn query_type(&self) -> TypeId {
        self.query_type
    }

    /// The object type serving mutation operations, if any.
    pub fn mutation_type(&self) -> Option<TypeId> {
        self.mutation_type
    }

    /// The object type serving operations of the given kind, if any.
    pub fn root_type(&self, operation: OperationType) -> Option<(TypeId, &ObjectMeta)> {
        let id = match operation {
            OperationType::Query => Some(self.query_type),
            OperationType::Mutation => self.mutation_type,
        }?;
        match self.registry.get(id)? {
            MetaType::Object(o) => Some((id, o)),
            _ => None,
        }
    }

    /// Whether a value of the `object` type satisfies a fragment type
    /// condition naming `condition`.
    ///
    /// Satisfied by the object itself, by an interface it implements and by a
    /// union it is a member of.
    pub fn is_possible_type(&self, condition: &str, object: TypeId) -> bool {
        match self.type_by_name(condition) {
            Some((id, MetaType::Object(_))) => id == object,
            Some((id, MetaType::Interface(_))) => self.implementors(id).contains(&object),
            Some((_, MetaType::Union(u))) => u.members.contains(&object),
            _ => false,
        }
    }
}

/// Depth-first closure over the type graph reachable from a set of fields.
///
/// A type annotation is marked as visited before its contents are walked,
/// so cyclic graphs are traversed exactly once.
struct Registrar<'r> {
    registry: &'r Registry,
    implementors: &'r FnvHashMap<TypeId, Vec<TypeId>>,
    validated_types: IndexSet<TypeRef>,
    registered_types: Vec<TypeId>,
}

impl Registrar<'_> {
    /// Registers the types of `fields` along with the types of their
    /// arguments.
    fn register_fields_type(&mut self, fields: &[Field]) -> Result<(), SchemaError> {
        self.register_types(fields.iter().flat_map(|f| {
            iter::once(f.field_type.clone())
                .chain(f.arguments.iter().map(|a| a.arg_type.clone()))
        }))
    }

    fn register_input_fields_type(&mut self, fields: &[Argument]) -> Result<(), SchemaError> {
        self.register_types(fields.iter().map(|a| a.arg_type.clone()))
    }

    fn register_types<I>(&mut self, types: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = TypeRef>,
    {
        let (registry, implementors) = (self.registry, self.implementors);
        for t in types {
            if !self.validated_types.insert(t.clone()) {
                continue;
            }

            match registry.classify(&t)? {
                Classified::Scalar(_) => {}
                // Wrappers are transparent: only their contents are registered.
                Classified::Nullable(inner) | Classified::List(inner) => {
                    self.register_types([inner.clone()])?;
                }
                Classified::Object(id, o) => {
                    self.registered_types.push(id);
                    self.register_fields_type(&o.fields)?;
                }
                Classified::Union(id, u) => {
                    self.registered_types.push(id);
                    self.register_types(u.members.iter().copied().map(TypeRef::Named))?;
                }
                Classified::InputObject(id, i) => {
                    self.registered_types.push(id);
                    self.register_input_fields_type(&i.input_fields)?;
                }
                Classified::Interface(id, i) => {
                    self.registered_types.push(id);
                    self.register_fields_type(&i.fields)?;
                    if let Some(objects) = implementors.get(&id) {
                        self.register_types(objects.iter().copied().map(TypeRef::Named))?;
                    }
                }
                Classified::Enum(id, _) => {
                    self.registered_types.push(id);
                }
            }
        }
        Ok(())
    }
}
