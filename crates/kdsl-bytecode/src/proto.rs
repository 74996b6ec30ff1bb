//! Field numbers of the Kotlin metadata messages this crate reads and writes.

pub(crate) mod package {
    pub(crate) const FUNCTION: u32 = 3;
    pub(crate) const PROPERTY: u32 = 4;
}

pub(crate) mod function {
    pub(crate) const NAME: u32 = 2;
    pub(crate) const RETURN_TYPE: u32 = 3;
    pub(crate) const RECEIVER_TYPE: u32 = 5;
    pub(crate) const VALUE_PARAMETER: u32 = 6;
    pub(crate) const FLAGS: u32 = 9;
    /// `JvmProtoBuf.methodSignature`
    pub(crate) const JVM_METHOD_SIGNATURE: u32 = 100;
}

pub(crate) mod property {
    pub(crate) const NAME: u32 = 2;
    pub(crate) const RETURN_TYPE: u32 = 3;
    pub(crate) const RECEIVER_TYPE: u32 = 5;
    pub(crate) const GETTER_FLAGS: u32 = 7;
    pub(crate) const FLAGS: u32 = 11;
    /// `JvmProtoBuf.propertySignature`
    pub(crate) const JVM_PROPERTY_SIGNATURE: u32 = 100;
}

pub(crate) mod value_parameter {
    pub(crate) const FLAGS: u32 = 1;
    pub(crate) const NAME: u32 = 2;
    pub(crate) const TYPE: u32 = 3;
}

pub(crate) mod types {
    pub(crate) const FLAGS: u32 = 1;
    pub(crate) const ARGUMENT: u32 = 2;
    pub(crate) const NULLABLE: u32 = 3;
    pub(crate) const CLASS_NAME: u32 = 6;
}

pub(crate) mod argument {
    pub(crate) const PROJECTION: u32 = 1;
    pub(crate) const TYPE: u32 = 2;

    pub(crate) const PROJECTION_IN: i32 = 0;
    pub(crate) const PROJECTION_OUT: i32 = 1;
    pub(crate) const PROJECTION_INV: i32 = 2;
    pub(crate) const PROJECTION_STAR: i32 = 3;
}

pub(crate) mod jvm_method_signature {
    pub(crate) const NAME: u32 = 1;
    pub(crate) const DESC: u32 = 2;
}

pub(crate) mod jvm_property_signature {
    pub(crate) const GETTER: u32 = 3;
}
