//! Kotlin type usages.

use crate::flags::TypeFlags;
use crate::names::ClassName;

/// `org.gradle.api.Action`
pub const ACTION_CLASS: &str = "org/gradle/api/Action";

/// `kotlin.Function1`
pub const FUNCTION1_CLASS: &str = "kotlin/Function1";

/// What a type refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KmClassifier {
    /// A class, interface or object.
    Class(ClassName),
}

/// Declaration-site or use-site variance of a type argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KmVariance {
    /// No variance annotation.
    #[default]
    Invariant,
    /// `in T`
    In,
    /// `out T`
    Out,
}

/// One type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KmTypeProjection {
    /// `*`
    Star,
    /// A type with a variance.
    Projection {
        /// Variance of the argument.
        variance: KmVariance,
        /// The argument type.
        ty: KmType,
    },
}

/// A type usage: classifier, arguments in declaration order, and flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KmType {
    /// What the type refers to.
    pub classifier: KmClassifier,
    /// Type arguments in order.
    pub arguments: Vec<KmTypeProjection>,
    /// Nullability and other type flags.
    pub flags: TypeFlags,
}

impl KmType {
    /// A non-nullable class type without arguments.
    #[must_use]
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self {
            classifier: KmClassifier::Class(name.into()),
            arguments: Vec::new(),
            flags: TypeFlags::empty(),
        }
    }

    /// Append an invariant type argument.
    #[must_use]
    pub fn with_argument(self, ty: KmType) -> Self {
        self.with_projection(KmVariance::Invariant, ty)
    }

    /// Append a type argument with the given variance.
    #[must_use]
    pub fn with_projection(mut self, variance: KmVariance, ty: KmType) -> Self {
        self.arguments
            .push(KmTypeProjection::Projection { variance, ty });
        self
    }

    /// Append a `*` argument.
    #[must_use]
    pub fn with_star(mut self) -> Self {
        self.arguments.push(KmTypeProjection::Star);
        self
    }

    /// Add flags to the type.
    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark the type nullable.
    #[must_use]
    pub fn nullable(self) -> Self {
        self.with_flags(TypeFlags::IS_NULLABLE)
    }

    /// Whether the type is nullable.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.flags.contains(TypeFlags::IS_NULLABLE)
    }

    /// The class this type refers to.
    #[must_use]
    pub fn class_name(&self) -> &ClassName {
        match &self.classifier {
            KmClassifier::Class(name) => name,
        }
    }
}

/// `Action<T>` with `t` as its invariant argument.
#[must_use]
pub fn action_type_of(t: KmType) -> KmType {
    KmType::class(ACTION_CLASS).with_argument(t)
}

/// `Function1<P, R>`: the parameter type first, then the return type.
#[must_use]
pub fn function_type_of(parameter: KmType, returns: KmType) -> KmType {
    KmType::class(FUNCTION1_CLASS)
        .with_argument(parameter)
        .with_argument(returns)
}
