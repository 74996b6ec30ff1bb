//! Declaration flag sets.
//!
//! Bit positions follow the Kotlin metadata protobuf layout: bit 0 is
//! `HAS_ANNOTATIONS`, bits 1..=3 hold visibility, bits 4..=5 modality,
//! bits 6..=7 member kind, and kind-specific flags start at bit 8
//! (bit 6 for accessors, bit 1 for value parameters).
//!
//! Composition is plain bitwise OR, so order never matters.

use bitflags::bitflags;

bitflags! {
    /// Flags of a function declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FunctionFlags: u32 {
        /// The function has annotations.
        const HAS_ANNOTATIONS = 1;
        /// Public visibility.
        const IS_PUBLIC = 3 << 1;
        /// A declaration, as opposed to a fake override, delegation or synthesized member.
        const IS_DECLARATION = 0;
        /// `operator fun`.
        const IS_OPERATOR = 1 << 8;
        /// `infix fun`.
        const IS_INFIX = 1 << 9;
        /// `inline fun`.
        const IS_INLINE = 1 << 10;
        /// `tailrec fun`.
        const IS_TAILREC = 1 << 11;
        /// `external fun`.
        const IS_EXTERNAL = 1 << 12;
        /// `suspend fun`.
        const IS_SUSPEND = 1 << 13;
    }
}

bitflags! {
    /// Flags of a property declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        /// The property has annotations.
        const HAS_ANNOTATIONS = 1;
        /// Public visibility.
        const IS_PUBLIC = 3 << 1;
        /// A declaration, as opposed to a fake override, delegation or synthesized member.
        const IS_DECLARATION = 0;
        /// `var` rather than `val`.
        const IS_VAR = 1 << 8;
        /// The property has a getter.
        const HAS_GETTER = 1 << 9;
        /// The property has a setter.
        const HAS_SETTER = 1 << 10;
        /// `const val`.
        const IS_CONST = 1 << 11;
        /// `lateinit var`.
        const IS_LATEINIT = 1 << 12;
    }
}

bitflags! {
    /// Flags of a property accessor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessorFlags: u32 {
        /// The accessor has annotations.
        const HAS_ANNOTATIONS = 1;
        /// Public visibility.
        const IS_PUBLIC = 3 << 1;
        /// The accessor has a body or modifiers.
        const IS_NOT_DEFAULT = 1 << 6;
        /// `external` accessor.
        const IS_EXTERNAL = 1 << 7;
        /// `inline` accessor.
        const IS_INLINE = 1 << 8;
    }
}

bitflags! {
    /// Flags of a value parameter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ValueParameterFlags: u32 {
        /// The parameter has annotations.
        const HAS_ANNOTATIONS = 1;
        /// The parameter declares a default value.
        const DECLARES_DEFAULT_VALUE = 1 << 1;
        /// `crossinline` parameter.
        const IS_CROSSINLINE = 1 << 2;
        /// `noinline` parameter.
        const IS_NOINLINE = 1 << 3;
    }
}

bitflags! {
    /// Flags of a type usage.
    ///
    /// Nullability is stored apart from the other bits on the wire.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// `T?`
        const IS_NULLABLE = 1;
        /// `suspend` function type.
        const IS_SUSPEND = 1 << 1;
    }
}

/// Visibility and modality bits shared by declarations and their accessors.
const VISIBILITY_AND_MODALITY: u32 = 0b11_1110;

impl FunctionFlags {
    /// Public inline function.
    pub const INLINE_FUNCTION: Self = Self::IS_PUBLIC.union(Self::IS_INLINE);
    /// Public function.
    pub const NON_INLINE_FUNCTION: Self = Self::IS_PUBLIC;

    /// Value a reader assumes when the flags field is absent.
    pub(crate) const PROTO_DEFAULT: u32 = 6;
}

impl PropertyFlags {
    /// Public read-only property declaration with a getter.
    pub const READ_ONLY: Self = Self::IS_PUBLIC
        .union(Self::HAS_GETTER)
        .union(Self::IS_DECLARATION);

    /// Value a reader assumes when the flags field is absent.
    pub(crate) const PROTO_DEFAULT: u32 = 518;

    /// Accessor flags a reader assumes when `getter_flags` is absent.
    pub(crate) fn default_accessor_flags(self) -> AccessorFlags {
        AccessorFlags::from_bits_retain(self.bits() & VISIBILITY_AND_MODALITY)
    }
}

impl AccessorFlags {
    /// Public, non-default, inline getter.
    pub const INLINE_GETTER: Self = Self::IS_PUBLIC
        .union(Self::IS_NOT_DEFAULT)
        .union(Self::IS_INLINE);
}

/// Reinterpret a flag word as the protobuf `int32` it is stored in.
pub(crate) fn to_proto(bits: u32) -> i32 {
    bits.cast_signed()
}

/// Reinterpret a protobuf `int32` flag word.
pub(crate) fn from_proto(value: i32) -> u32 {
    value.cast_unsigned()
}
