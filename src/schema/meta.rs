//! Types used to describe a `GraphQL` schema

use std::{fmt, sync::Arc};

use arcstr::ArcStr;
use derive_more::with_trait::{Display, From};

use crate::{ast::InputValue, schema::validation::SchemaError, types::async_await::GraphQLObject};

/// Identity of a type declared in a [`Registry`].
///
/// Two descriptors are the same type if and only if they share a [`TypeId`],
/// no matter how alike their contents are.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("#{_0}")]
pub struct TypeId(usize);

impl TypeId {
    /// Position of the type inside its [`Registry`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// Built-in scalar types.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Scalar {
    /// A signed 32-bit integer.
    Int,
    /// A signed double-precision floating-point value.
    Float,
    /// A UTF-8 character sequence.
    String,
    /// `true` or `false`.
    Boolean,
    /// A unique identifier, serialized as a string.
    #[display("ID")]
    ID,
}

/// Declared type of a field or an argument.
///
/// A bare annotation is non-null. [`TypeRef::Nullable`] is the "optional"
/// wrapper, [`TypeRef::List`] the list one; both hold a single inner type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TypeRef {
    /// One of the built-in scalars.
    Scalar(Scalar),
    /// A declared type, referenced by identity.
    Named(TypeId),
    /// Optional wrapper around the inner type.
    Nullable(Box<TypeRef>),
    /// List wrapper around the inner type.
    List(Box<TypeRef>),
}

impl TypeRef {
    /// Wraps this type into the optional wrapper.
    #[must_use]
    pub fn nullable(self) -> Self {
        Self::Nullable(Box::new(self))
    }

    /// Wraps this type into the list wrapper.
    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// Whether a `null` is an acceptable value for this type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// The declared type at the bottom of all wrappers, if any.
    pub fn innermost_id(&self) -> Option<TypeId> {
        match self {
            Self::Scalar(_) => None,
            Self::Named(id) => Some(*id),
            Self::Nullable(inner) | Self::List(inner) => inner.innermost_id(),
        }
    }
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        Self::Named(id)
    }
}

impl From<Scalar> for TypeRef {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

/// Whether an item is deprecated, with context.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DeprecationStatus {
    /// The field/variant is not deprecated.
    Current,
    /// The field/variant is deprecated, with an optional reason
    Deprecated(Option<ArcStr>),
}

impl DeprecationStatus {
    /// If this deprecation status indicates the item is deprecated.
    pub fn is_deprecated(&self) -> bool {
        match self {
            Self::Current => false,
            Self::Deprecated(_) => true,
        }
    }

    /// An optional reason for the deprecation, or none if `Current`.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Deprecated(rsn) => rsn.as_deref(),
        }
    }
}

/// Factory producing a fresh instance of an object type.
pub type Constructor = Arc<dyn Fn() -> Box<dyn GraphQLObject> + Send + Sync>;

/// Object type metadata
pub struct ObjectMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<Field>,
    #[doc(hidden)]
    pub interfaces: Vec<TypeId>,
    #[doc(hidden)]
    pub constructor: Option<Constructor>,
}

/// Enum type metadata
#[derive(Debug)]
pub struct EnumMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub values: Vec<EnumValue>,
}

/// Interface type metadata
#[derive(Debug)]
pub struct InterfaceMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub fields: Vec<Field>,
}

/// Union type metadata
#[derive(Debug)]
pub struct UnionMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub members: Vec<TypeId>,
}

/// Input object metadata
#[derive(Debug)]
pub struct InputObjectMeta {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub input_fields: Vec<Argument>,
}

/// A placeholder for not-yet-defined types
///
/// Reserves a [`TypeId`] so that cyclic type graphs can reference a type
/// before its fields are known.
#[derive(Debug)]
pub struct PlaceholderMeta {
    #[doc(hidden)]
    pub name: ArcStr,
}

/// Generic type metadata
#[derive(Debug, From)]
pub enum MetaType {
    #[doc(hidden)]
    Object(ObjectMeta),
    #[doc(hidden)]
    Enum(EnumMeta),
    #[doc(hidden)]
    Interface(InterfaceMeta),
    #[doc(hidden)]
    Union(UnionMeta),
    #[doc(hidden)]
    InputObject(InputObjectMeta),
    #[doc(hidden)]
    Placeholder(PlaceholderMeta),
}

/// Metadata for a field
#[derive(Clone, Debug)]
pub struct Field {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arguments: Vec<Argument>,
    #[doc(hidden)]
    pub field_type: TypeRef,
    #[doc(hidden)]
    pub deprecation_status: DeprecationStatus,
}

/// Metadata for an argument to a field
#[derive(Clone, Debug)]
pub struct Argument {
    #[doc(hidden)]
    pub name: ArcStr,
    #[doc(hidden)]
    pub description: Option<ArcStr>,
    #[doc(hidden)]
    pub arg_type: TypeRef,
    #[doc(hidden)]
    pub default_value: Option<InputValue>,
}

/// Metadata for a single value in an enum
#[derive(Clone, Debug)]
pub struct EnumValue {
    /// The name of the enum value
    ///
    /// This is the string literal representation of the enum in responses.
    pub name: ArcStr,
    /// The optional description of the enum value.
    pub description: Option<ArcStr>,
    /// Whether the field is deprecated or not, with an optional reason.
    pub deprecation_status: DeprecationStatus,
}

impl MetaType {
    /// Access the name of the type.
    pub fn name(&self) -> &str {
        match self {
            Self::Object(ObjectMeta { name, .. })
            | Self::Enum(EnumMeta { name, .. })
            | Self::Interface(InterfaceMeta { name, .. })
            | Self::Union(UnionMeta { name, .. })
            | Self::InputObject(InputObjectMeta { name, .. })
            | Self::Placeholder(PlaceholderMeta { name }) => name,
        }
    }

    /// Access the description of the type, if applicable
    ///
    /// Placeholders don't have descriptions.
    pub fn description(&self) -> Option<&ArcStr> {
        match self {
            Self::Object(ObjectMeta { description, .. })
            | Self::Enum(EnumMeta { description, .. })
            | Self::Interface(InterfaceMeta { description, .. })
            | Self::Union(UnionMeta { description, .. })
            | Self::InputObject(InputObjectMeta { description, .. }) => description.as_ref(),
            Self::Placeholder(_) => None,
        }
    }

    /// Human readable kind of the type, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Enum(_) => "enum",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::InputObject(_) => "input object",
            Self::Placeholder(_) => "placeholder",
        }
    }

    /// Access a field's meta data given its name
    ///
    /// Only objects and interfaces have fields. This method always returns
    /// `None` for other types.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        match self {
            Self::Object(meta) => meta.field_by_name(name),
            Self::Interface(InterfaceMeta { fields, .. }) => {
                fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    /// Access an input field's meta data given its name
    ///
    /// Only input objects have input fields. This method always returns
    /// `None` for other types.
    pub fn input_field_by_name(&self, name: &str) -> Option<&Argument> {
        match self {
            Self::InputObject(InputObjectMeta { input_fields, .. }) => {
                input_fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    /// Returns true if the type can occur in argument positions.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Enum(_) | Self::InputObject(_))
    }

    /// Returns true if the type can be returned by a field.
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            Self::Object(_) | Self::Enum(_) | Self::Interface(_) | Self::Union(_),
        )
    }
}

impl ObjectMeta {
    /// Build a new [`ObjectMeta`] type with the specified `name` and `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: &[Field]) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.to_vec(),
            interfaces: vec![],
            constructor: None,
        }
    }

    /// Sets the `description` of this [`ObjectMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the `interfaces` this [`ObjectMeta`] type implements.
    ///
    /// Overwrites any previously set list of interfaces.
    #[must_use]
    pub fn interfaces(mut self, interfaces: &[TypeId]) -> Self {
        self.interfaces = interfaces.to_vec();
        self
    }

    /// Sets the no-argument `constructor` used to instantiate this type when
    /// it serves as a root operation type.
    #[must_use]
    pub fn constructor<F, T>(mut self, constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: GraphQLObject + 'static,
    {
        self.constructor = Some(Arc::new(move || -> Box<dyn GraphQLObject> {
            Box::new(constructor())
        }));
        self
    }

    /// Access a field's meta data given its name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wraps this [`ObjectMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Object(self)
    }
}

impl fmt::Debug for ObjectMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("fields", &self.fields)
            .field("interfaces", &self.interfaces)
            .field("constructor", &self.constructor.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl EnumMeta {
    /// Build a new [`EnumMeta`] type with the specified `name` and possible
    /// `values`.
    pub fn new(name: impl Into<ArcStr>, values: &[EnumValue]) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: values.to_vec(),
        }
    }

    /// Sets the `description` of this [`EnumMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`EnumMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Enum(self)
    }
}

impl InterfaceMeta {
    /// Builds a new [`InterfaceMeta`] type with the specified `name` and
    /// `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: &[Field]) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.to_vec(),
        }
    }

    /// Sets the `description` of this [`InterfaceMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`InterfaceMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Interface(self)
    }
}

impl UnionMeta {
    /// Build a new [`UnionMeta`] type with the specified `name` and possible
    /// [`ObjectMeta`] `members`.
    pub fn new(name: impl Into<ArcStr>, members: &[TypeId]) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: members.to_vec(),
        }
    }

    /// Sets the `description` of this [`UnionMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`UnionMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Union(self)
    }
}

impl InputObjectMeta {
    /// Builds a new [`InputObjectMeta`] type with the specified `name` and
    /// `input_fields`.
    pub fn new(name: impl Into<ArcStr>, input_fields: &[Argument]) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields: input_fields.to_vec(),
        }
    }

    /// Set the `description` of this [`InputObjectMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`InputObjectMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::InputObject(self)
    }
}

impl Field {
    /// Builds a new [`Field`] of the given type with the given `name`.
    pub fn new(name: impl Into<ArcStr>, field_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: vec![],
            field_type: field_type.into(),
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Set the `description` of this [`Field`].
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an `argument` to this [`Field`].
    ///
    /// Arguments keep their declaration order.
    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Sets this [`Field`] as deprecated with an optional `reason`.
    ///
    /// Overwrites any previously set deprecation reason.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }

    /// Whether the field takes arguments, i.e. is computed by a resolver.
    pub fn is_resolver(&self) -> bool {
        !self.arguments.is_empty()
    }

    /// Access an argument's meta data given its name.
    pub fn argument_by_name(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Returns true if the field is built-in to GraphQL.
    pub fn is_builtin(&self) -> bool {
        // "used exclusively by GraphQL’s introspection system"
        self.name.starts_with("__")
    }
}

impl Argument {
    /// Builds a new [`Argument`] of the given type with the given `name`.
    pub fn new(name: impl Into<ArcStr>, arg_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arg_type: arg_type.into(),
            default_value: None,
        }
    }

    /// Sets the `description` of this [`Argument`].
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default value of this [`Argument`].
    ///
    /// Overwrites any previously set default value.
    #[must_use]
    pub fn default_value(mut self, val: InputValue) -> Self {
        self.default_value = Some(val);
        self
    }
}

impl EnumValue {
    /// Constructs a new [`EnumValue`] with the provided `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Sets the `description` of this [`EnumValue`].
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets this [`EnumValue`] as deprecated with an optional `reason`.
    ///
    /// Overwrites any previously set deprecation reason.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }
}

/// Shape of a [`TypeRef`], resolved against a [`Registry`].
///
/// Every consumer that needs to know what a declared type is goes through
/// [`Registry::classify()`].
#[derive(Clone, Copy, Debug)]
pub enum Classified<'r> {
    /// A bare built-in scalar.
    Scalar(Scalar),
    /// A declared object type.
    Object(TypeId, &'r ObjectMeta),
    /// A declared union type.
    Union(TypeId, &'r UnionMeta),
    /// A declared input object type.
    InputObject(TypeId, &'r InputObjectMeta),
    /// A declared interface type.
    Interface(TypeId, &'r InterfaceMeta),
    /// A declared enum type.
    Enum(TypeId, &'r EnumMeta),
    /// The optional wrapper, holding its inner type.
    Nullable(&'r TypeRef),
    /// The list wrapper, holding its inner type.
    List(&'r TypeRef),
}

/// Arena of declared types.
///
/// Types are identified by the [`TypeId`] handed out on declaration, so the
/// graph they form may freely contain cycles.
#[derive(Debug, Default)]
pub struct Registry {
    types: Vec<MetaType>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a [`TypeId`] for a type that is [`define`]d later.
    ///
    /// [`define`]: Registry::define
    pub fn placeholder(&mut self, name: impl Into<ArcStr>) -> TypeId {
        self.register(PlaceholderMeta { name: name.into() })
    }

    /// Provides the definition of a type reserved with
    /// [`Registry::placeholder()`].
    ///
    /// # Errors
    ///
    /// If `id` doesn't belong to this registry or is already defined.
    pub fn define(&mut self, id: TypeId, meta: impl Into<MetaType>) -> Result<(), SchemaError> {
        let slot = self
            .types
            .get_mut(id.0)
            .ok_or(SchemaError::UnknownType(id))?;
        if !matches!(slot, MetaType::Placeholder(_)) {
            return Err(SchemaError::AlreadyDefined(slot.name().into()));
        }
        *slot = meta.into();
        Ok(())
    }

    /// Declares and defines a type in one step.
    pub fn register(&mut self, meta: impl Into<MetaType>) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(meta.into());
        id
    }

    /// Looks up a declared type.
    pub fn get(&self, id: TypeId) -> Option<&MetaType> {
        self.types.get(id.0)
    }

    /// Iterates over all declared types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &MetaType)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types have been declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Classifies a type annotation.
    ///
    /// Pure with respect to the registry: wrappers are reported as such
    /// without looking at their inner type.
    ///
    /// # Errors
    ///
    /// If the annotation names an unknown or not yet defined type.
    pub fn classify<'r>(&'r self, t: &'r TypeRef) -> Result<Classified<'r>, SchemaError> {
        Ok(match t {
            TypeRef::Scalar(s) => Classified::Scalar(*s),
            TypeRef::Nullable(inner) => Classified::Nullable(inner),
            TypeRef::List(inner) => Classified::List(inner),
            TypeRef::Named(id) => match self.get(*id).ok_or(SchemaError::UnknownType(*id))? {
                MetaType::Object(o) => Classified::Object(*id, o),
                MetaType::Union(u) => Classified::Union(*id, u),
                MetaType::InputObject(i) => Classified::InputObject(*id, i),
                MetaType::Interface(i) => Classified::Interface(*id, i),
                MetaType::Enum(e) => Classified::Enum(*id, e),
                MetaType::Placeholder(p) => {
                    return Err(SchemaError::UndefinedType(p.name.to_string()));
                }
            },
        })
    }

    /// Name of a type annotation in GraphQL notation, e.g. `[Episode!]`.
    pub fn type_name(&self, t: &TypeRef) -> String {
        fn inner(r: &Registry, t: &TypeRef, non_null: bool) -> String {
            let bang = if non_null { "!" } else { "" };
            match t {
                TypeRef::Scalar(s) => format!("{s}{bang}"),
                TypeRef::Named(id) => match r.get(*id) {
                    Some(m) => format!("{}{bang}", m.name()),
                    None => format!("{id}{bang}"),
                },
                TypeRef::Nullable(t) => inner(r, t, false),
                TypeRef::List(t) => format!("[{}]{bang}", inner(r, t, true)),
            }
        }
        inner(self, t, true)
    }
}
