//! Type unification for inferred collections.
//!
//! Given the types of a collection's members, decide whether it fits a
//! uniform container (`list`/`map`) or has to fall back to a heterogeneous
//! one (`tuple`/`object`). Member types are always kept in full, even after
//! the first divergence has settled the decision.

use std::collections::BTreeMap;

use crate::wire::Type;

/// Element type assumed for collections with no members.
pub const EMPTY_ELEMENT: Type = Type::Dynamic;

/// Outcome of unifying a collection's member types.
#[derive(Debug, Clone, PartialEq)]
pub enum Unified<T> {
    /// Every member shares this type; `None` when there were no members.
    Uniform(Option<Type>),
    /// Members diverge; every member type is retained.
    Mixed(T),
}

impl<T> Unified<T> {
    /// Element type of a uniform outcome, falling back to [`EMPTY_ELEMENT`].
    pub fn element(&self) -> Option<Type> {
        match self {
            Unified::Uniform(element) => Some(element.clone().unwrap_or(EMPTY_ELEMENT)),
            Unified::Mixed(_) => None,
        }
    }
}

/// Running state of the uniform/heterogeneous decision.
#[derive(Debug, Clone, Default)]
enum Shape {
    #[default]
    Empty,
    Uniform(Type),
    Mixed,
}

impl Shape {
    fn observe(&mut self, ty: &Type) {
        match self {
            Shape::Empty => *self = Shape::Uniform(ty.clone()),
            Shape::Uniform(common) if common != ty => *self = Shape::Mixed,
            Shape::Uniform(_) | Shape::Mixed => {}
        }
    }
}

/// Unify the member types of a sequence, in order.
pub fn unify_sequence(types: Vec<Type>) -> Unified<Vec<Type>> {
    let mut shape = Shape::default();
    for ty in &types {
        shape.observe(ty);
    }
    match shape {
        Shape::Empty => Unified::Uniform(None),
        Shape::Uniform(common) => Unified::Uniform(Some(common)),
        Shape::Mixed => Unified::Mixed(types),
    }
}

/// Unify the member types of a keyed collection.
pub fn unify_keyed(types: BTreeMap<String, Type>) -> Unified<BTreeMap<String, Type>> {
    let mut shape = Shape::default();
    for ty in types.values() {
        shape.observe(ty);
    }
    match shape {
        Shape::Empty => Unified::Uniform(None),
        Shape::Uniform(common) => Unified::Uniform(Some(common)),
        Shape::Mixed => Unified::Mixed(types),
    }
}

/// Collection type for a sequence with the given member types.
pub fn sequence_type(types: Vec<Type>) -> Type {
    match unify_sequence(types) {
        Unified::Uniform(element) => Type::list(element.unwrap_or(EMPTY_ELEMENT)),
        Unified::Mixed(types) => Type::Tuple(types),
    }
}

/// Collection type for a keyed collection with the given member types.
pub fn keyed_type(types: BTreeMap<String, Type>) -> Type {
    match unify_keyed(types) {
        Unified::Uniform(element) => Type::map(element.unwrap_or(EMPTY_ELEMENT)),
        Unified::Mixed(types) => Type::Object(types),
    }
}
