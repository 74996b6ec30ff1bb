//! Function, property and value-parameter descriptors.

use crate::flags::{AccessorFlags, FunctionFlags, PropertyFlags, TypeFlags, ValueParameterFlags};
use crate::signature::JvmMethodSignature;
use crate::types::KmType;

/// A value parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmValueParameter {
    /// Parameter flags.
    pub flags: ValueParameterFlags,
    /// Parameter name.
    pub name: String,
    /// Parameter type, including its nullability.
    pub ty: KmType,
}

/// A top-level function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmFunction {
    /// Function flags.
    pub flags: FunctionFlags,
    /// Function name.
    pub name: String,
    /// Extension receiver, if any.
    pub receiver_type: Option<KmType>,
    /// Return type.
    pub return_type: KmType,
    /// Parameters in declaration order.
    pub value_parameters: Vec<KmValueParameter>,
    /// JVM method this function compiles to.
    pub signature: Option<JvmMethodSignature>,
}

impl KmFunction {
    /// A public, non-inline function without receiver or parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: KmType) -> Self {
        Self {
            flags: FunctionFlags::NON_INLINE_FUNCTION,
            name: name.into(),
            receiver_type: None,
            return_type,
            value_parameters: Vec::new(),
            signature: None,
        }
    }

    /// Replace the function flags.
    #[must_use]
    pub fn with_flags(mut self, flags: FunctionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the extension receiver.
    #[must_use]
    pub fn with_receiver(mut self, receiver: KmType) -> Self {
        self.receiver_type = Some(receiver);
        self
    }

    /// Add flags to the return type.
    #[must_use]
    pub fn with_return_type_flags(mut self, flags: TypeFlags) -> Self {
        self.return_type.flags |= flags;
        self
    }

    /// Set the JVM method signature.
    #[must_use]
    pub fn with_signature(mut self, signature: JvmMethodSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Append a required parameter.
    pub fn visit_parameter(&mut self, name: impl Into<String>, ty: KmType) -> &mut Self {
        self.visit_parameter_with_flags(name, ty, ValueParameterFlags::empty(), TypeFlags::empty())
    }

    /// Append a parameter with explicit parameter and type flags.
    pub fn visit_parameter_with_flags(
        &mut self,
        name: impl Into<String>,
        ty: KmType,
        flags: ValueParameterFlags,
        type_flags: TypeFlags,
    ) -> &mut Self {
        self.value_parameters.push(KmValueParameter {
            flags,
            name: name.into(),
            ty: ty.with_flags(type_flags),
        });
        self
    }

    /// Append a parameter that declares a default value and has a nullable type.
    pub fn visit_optional_parameter(&mut self, name: impl Into<String>, ty: KmType) -> &mut Self {
        self.visit_parameter_with_flags(
            name,
            ty,
            ValueParameterFlags::DECLARES_DEFAULT_VALUE,
            TypeFlags::IS_NULLABLE,
        )
    }
}

/// A top-level read-only property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmProperty {
    /// Property flags.
    pub flags: PropertyFlags,
    /// Property name.
    pub name: String,
    /// Getter flags.
    pub getter_flags: AccessorFlags,
    /// Extension receiver, if any.
    pub receiver_type: Option<KmType>,
    /// Property type.
    pub return_type: KmType,
    /// JVM method the getter compiles to.
    pub getter_signature: Option<JvmMethodSignature>,
}

impl KmProperty {
    /// A public read-only property with an inline getter.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: KmType) -> Self {
        Self {
            flags: PropertyFlags::READ_ONLY,
            name: name.into(),
            getter_flags: AccessorFlags::INLINE_GETTER,
            receiver_type: None,
            return_type,
            getter_signature: None,
        }
    }

    /// Replace the getter flags.
    #[must_use]
    pub fn with_getter_flags(mut self, flags: AccessorFlags) -> Self {
        self.getter_flags = flags;
        self
    }

    /// Set the extension receiver.
    #[must_use]
    pub fn with_receiver(mut self, receiver: KmType) -> Self {
        self.receiver_type = Some(receiver);
        self
    }

    /// Set the getter's JVM signature.
    #[must_use]
    pub fn with_getter_signature(mut self, signature: JvmMethodSignature) -> Self {
        self.getter_signature = Some(signature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> KmType {
        KmType::class("kotlin/String")
    }

    #[test]
    fn test_parameter_order_follows_calls() {
        let mut function = KmFunction::new("f", KmType::class("kotlin/Unit"));
        function
            .visit_parameter("a", string())
            .visit_optional_parameter("b", string())
            .visit_parameter("c", string());
        let names: Vec<_> = function
            .value_parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_optional_parameter_flags() {
        let mut function = KmFunction::new("f", KmType::class("kotlin/Unit"));
        function.visit_optional_parameter("configuration", string());
        let parameter = &function.value_parameters[0];
        assert_eq!(parameter.flags, ValueParameterFlags::DECLARES_DEFAULT_VALUE);
        assert!(parameter.ty.is_nullable());
    }

    #[test]
    fn test_function_defaults_and_builders() {
        let function = KmFunction::new("f", string())
            .with_flags(FunctionFlags::INLINE_FUNCTION)
            .with_return_type_flags(TypeFlags::IS_NULLABLE)
            .with_receiver(KmType::class("org/gradle/api/Project"));
        assert_eq!(function.flags, FunctionFlags::INLINE_FUNCTION);
        assert!(function.return_type.is_nullable());
        assert!(function.receiver_type.is_some());
        assert!(function.signature.is_none());
    }

    #[test]
    fn test_property_defaults() {
        let property = KmProperty::new("name", string());
        assert_eq!(property.flags, PropertyFlags::READ_ONLY);
        assert_eq!(property.getter_flags, AccessorFlags::INLINE_GETTER);
    }
}
