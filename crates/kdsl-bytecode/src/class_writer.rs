//! Minimal class-file writer for generated facade classes.
//!
//! Supports what accessor facades need: a public final class, public static
//! methods with straight-line bytecode, and runtime-visible annotations.

use tracing::debug;

use crate::constant_pool::{ConstantPool, MemberKind};
use crate::error::{BytecodeError, BytecodeResult};
use crate::header::MetadataHeader;
use crate::names::InternalName;
use crate::signature::{JvmMethodSignature, method_descriptor_slots};

/// Java 8.
pub const DEFAULT_CLASS_FILE_MAJOR: u16 = 52;

/// Class-file access flags.
pub mod access {
    /// `ACC_PUBLIC`
    pub const PUBLIC: u16 = 0x0001;
    /// `ACC_STATIC`
    pub const STATIC: u16 = 0x0008;
    /// `ACC_FINAL`
    pub const FINAL: u16 = 0x0010;
    /// `ACC_SUPER`
    pub const SUPER: u16 = 0x0020;
}

const MAGIC: u32 = 0xCAFE_BABE;
const OBJECT: &str = "java/lang/Object";
const KOTLIN_METADATA_DESCRIPTOR: &str = "Lkotlin/Metadata;";

/// A class being written. Sealed by [`ClassWriter::into_bytes`].
#[derive(Debug)]
#[must_use = "a class writer produces nothing until into_bytes is called"]
pub struct ClassWriter {
    major_version: u16,
    access_flags: u16,
    name: InternalName,
    this_class: u16,
    super_class: u16,
    pool: ConstantPool,
    methods: Vec<Vec<u8>>,
    annotations: Vec<Vec<u8>>,
}

impl ClassWriter {
    /// Start a class with the given access flags and super class.
    ///
    /// # Errors
    ///
    /// Returns an error if a name does not fit the constant pool.
    pub fn new(access_flags: u16, name: &InternalName, super_name: &str) -> BytecodeResult<Self> {
        let mut pool = ConstantPool::new();
        let this_class = pool.class(name.as_str())?;
        let super_class = pool.class(super_name)?;
        Ok(Self {
            major_version: DEFAULT_CLASS_FILE_MAJOR,
            access_flags,
            name: name.clone(),
            this_class,
            super_class,
            pool,
            methods: Vec::new(),
            annotations: Vec::new(),
        })
    }

    /// A `public final` class extending `java.lang.Object`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` does not fit the constant pool.
    pub fn public_class(name: &InternalName) -> BytecodeResult<Self> {
        Self::new(access::PUBLIC | access::FINAL | access::SUPER, name, OBJECT)
    }

    /// Set the class-file major version.
    pub fn with_major_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    /// Name of the class being written.
    #[must_use]
    pub fn name(&self) -> &InternalName {
        &self.name
    }

    /// Add `header` as a runtime-visible `kotlin.Metadata` annotation.
    ///
    /// # Errors
    ///
    /// Returns an error if a metadata string does not fit a `CONSTANT_Utf8`
    /// entry or the constant pool overflows.
    pub fn visit_kotlin_metadata_annotation(&mut self, header: &MetadataHeader) -> BytecodeResult<()> {
        let mut annotation = AnnotationWriter::new(&mut self.pool, KOTLIN_METADATA_DESCRIPTOR)?;
        annotation.int_array("mv", &header.metadata_version)?;
        annotation.int_array("bv", &header.bytecode_version)?;
        annotation.int("k", header.kind.as_i32())?;
        annotation.int("xi", header.extra_int)?;
        annotation.string_array("d1", &header.data1)?;
        annotation.string_array("d2", &header.data2)?;
        let bytes = annotation.finish();
        self.annotations.push(bytes);
        Ok(())
    }

    /// Add a `public static` method whose body is produced by `body`.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is malformed, the body fails, or
    /// the method exceeds class-file limits.
    pub fn public_static_method(
        &mut self,
        signature: &JvmMethodSignature,
        generic_signature: Option<&str>,
        exceptions: &[InternalName],
        body: impl FnOnce(&mut CodeBuilder<'_>) -> BytecodeResult<()>,
    ) -> BytecodeResult<()> {
        self.method(
            access::PUBLIC | access::STATIC,
            signature,
            generic_signature,
            exceptions,
            body,
        )
    }

    /// Add a method with explicit access flags.
    ///
    /// # Errors
    ///
    /// See [`ClassWriter::public_static_method`].
    pub fn method(
        &mut self,
        access_flags: u16,
        signature: &JvmMethodSignature,
        generic_signature: Option<&str>,
        exceptions: &[InternalName],
        body: impl FnOnce(&mut CodeBuilder<'_>) -> BytecodeResult<()>,
    ) -> BytecodeResult<()> {
        let slots = method_descriptor_slots(&signature.desc)?;
        let receiver_slots = u16::from(access_flags & access::STATIC == 0);
        let max_locals = slots
            .arguments
            .checked_add(receiver_slots)
            .ok_or_else(|| BytecodeError::malformed("method descriptor", "too many arguments"))?;

        let name_index = self.pool.utf8(&signature.name)?;
        let desc_index = self.pool.utf8(&signature.desc)?;

        let mut code = CodeBuilder::new(&mut self.pool, max_locals);
        body(&mut code)?;
        let code_attribute = code.finish()?;

        let mut attributes = vec![code_attribute];
        if let Some(generic) = generic_signature {
            let mut attribute = Vec::with_capacity(2);
            attribute.extend_from_slice(&self.pool.utf8(generic)?.to_be_bytes());
            attributes.push(self.attribute("Signature", &attribute)?);
        }
        if !exceptions.is_empty() {
            let mut attribute = Vec::new();
            attribute.extend_from_slice(&u16_len(exceptions.len(), "Exceptions")?.to_be_bytes());
            for exception in exceptions {
                attribute.extend_from_slice(&self.pool.class(exception.as_str())?.to_be_bytes());
            }
            attributes.push(self.attribute("Exceptions", &attribute)?);
        }

        let mut method = Vec::new();
        method.extend_from_slice(&access_flags.to_be_bytes());
        method.extend_from_slice(&name_index.to_be_bytes());
        method.extend_from_slice(&desc_index.to_be_bytes());
        method.extend_from_slice(&u16_len(attributes.len(), "method attributes")?.to_be_bytes());
        for attribute in attributes {
            method.extend_from_slice(&attribute);
        }
        self.methods.push(method);
        Ok(())
    }

    fn attribute(&mut self, name: &str, payload: &[u8]) -> BytecodeResult<Vec<u8>> {
        attribute(&mut self.pool, name, payload)
    }

    /// Seal the class and produce its bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute or table exceeds class-file limits.
    pub fn into_bytes(mut self) -> BytecodeResult<Vec<u8>> {
        let annotations_attribute = if self.annotations.is_empty() {
            None
        } else {
            let mut payload = Vec::new();
            payload.extend_from_slice(
                &u16_len(self.annotations.len(), "RuntimeVisibleAnnotations")?.to_be_bytes(),
            );
            for annotation in &self.annotations {
                payload.extend_from_slice(annotation);
            }
            Some(attribute(&mut self.pool, "RuntimeVisibleAnnotations", &payload)?)
        };

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&0_u16.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.pool.write_to(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        // interfaces, fields
        out.extend_from_slice(&0_u16.to_be_bytes());
        out.extend_from_slice(&0_u16.to_be_bytes());
        out.extend_from_slice(&u16_len(self.methods.len(), "methods")?.to_be_bytes());
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        match annotations_attribute {
            Some(attribute) => {
                out.extend_from_slice(&1_u16.to_be_bytes());
                out.extend_from_slice(&attribute);
            },
            None => out.extend_from_slice(&0_u16.to_be_bytes()),
        }

        debug!(
            class = %self.name,
            methods = self.methods.len(),
            bytes = out.len(),
            "wrote class file"
        );
        Ok(out)
    }
}

/// Bytes of a `public final` class carrying `header` as its
/// `kotlin.Metadata`, with members added by `body`.
///
/// # Errors
///
/// Propagates errors from `body` and from class-file limits.
pub fn public_kotlin_class(
    name: &InternalName,
    header: &MetadataHeader,
    body: impl FnOnce(&mut ClassWriter) -> BytecodeResult<()>,
) -> BytecodeResult<Vec<u8>> {
    public_kotlin_class_with_major(name, header, DEFAULT_CLASS_FILE_MAJOR, body)
}

/// [`public_kotlin_class`] with an explicit class-file major version.
///
/// # Errors
///
/// Propagates errors from `body` and from class-file limits.
pub fn public_kotlin_class_with_major(
    name: &InternalName,
    header: &MetadataHeader,
    major_version: u16,
    body: impl FnOnce(&mut ClassWriter) -> BytecodeResult<()>,
) -> BytecodeResult<Vec<u8>> {
    let mut writer = ClassWriter::public_class(name)?.with_major_version(major_version);
    writer.visit_kotlin_metadata_annotation(header)?;
    body(&mut writer)?;
    writer.into_bytes()
}

fn u16_len(len: usize, what: &'static str) -> BytecodeResult<u16> {
    u16::try_from(len).map_err(|_| BytecodeError::AttributeTooLarge { what, len })
}

fn attribute(pool: &mut ConstantPool, name: &str, payload: &[u8]) -> BytecodeResult<Vec<u8>> {
    let name_index = pool.utf8(name)?;
    let len = u32::try_from(payload.len()).map_err(|_| BytecodeError::AttributeTooLarge {
        what: "attribute",
        len: payload.len(),
    })?;
    let mut out = Vec::with_capacity(payload.len().saturating_add(6));
    out.extend_from_slice(&name_index.to_be_bytes());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// One `annotation` structure under construction.
struct AnnotationWriter<'a> {
    pool: &'a mut ConstantPool,
    type_index: u16,
    pairs: u16,
    body: Vec<u8>,
}

impl<'a> AnnotationWriter<'a> {
    fn new(pool: &'a mut ConstantPool, descriptor: &str) -> BytecodeResult<Self> {
        let type_index = pool.utf8(descriptor)?;
        Ok(Self {
            pool,
            type_index,
            pairs: 0,
            body: Vec::new(),
        })
    }

    fn name(&mut self, name: &str) -> BytecodeResult<()> {
        let index = self.pool.utf8(name)?;
        self.body.extend_from_slice(&index.to_be_bytes());
        self.pairs = self
            .pairs
            .checked_add(1)
            .ok_or(BytecodeError::AttributeTooLarge {
                what: "annotation element pairs",
                len: usize::from(u16::MAX),
            })?;
        Ok(())
    }

    fn int_value(&mut self, value: i32) -> BytecodeResult<()> {
        let index = self.pool.integer(value)?;
        self.body.push(b'I');
        self.body.extend_from_slice(&index.to_be_bytes());
        Ok(())
    }

    fn string_value(&mut self, value: &str) -> BytecodeResult<()> {
        let index = self.pool.utf8(value)?;
        self.body.push(b's');
        self.body.extend_from_slice(&index.to_be_bytes());
        Ok(())
    }

    fn array_header(&mut self, len: usize) -> BytecodeResult<()> {
        self.body.push(b'[');
        self.body
            .extend_from_slice(&u16_len(len, "annotation array")?.to_be_bytes());
        Ok(())
    }

    fn int(&mut self, name: &str, value: i32) -> BytecodeResult<()> {
        self.name(name)?;
        self.int_value(value)
    }

    fn int_array(&mut self, name: &str, values: &[i32]) -> BytecodeResult<()> {
        self.name(name)?;
        self.array_header(values.len())?;
        for value in values {
            self.int_value(*value)?;
        }
        Ok(())
    }

    fn string_array(&mut self, name: &str, values: &[String]) -> BytecodeResult<()> {
        self.name(name)?;
        self.array_header(values.len())?;
        for value in values {
            self.string_value(value)?;
        }
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len().saturating_add(4));
        out.extend_from_slice(&self.type_index.to_be_bytes());
        out.extend_from_slice(&self.pairs.to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

mod opcodes {
    pub(super) const ACONST_NULL: u8 = 0x01;
    pub(super) const LDC: u8 = 0x12;
    pub(super) const LDC_W: u8 = 0x13;
    pub(super) const ALOAD: u8 = 0x19;
    pub(super) const ALOAD_0: u8 = 0x2a;
    pub(super) const POP: u8 = 0x57;
    pub(super) const DUP: u8 = 0x59;
    pub(super) const ARETURN: u8 = 0xb0;
    pub(super) const RETURN: u8 = 0xb1;
    pub(super) const GETSTATIC: u8 = 0xb2;
    pub(super) const INVOKEVIRTUAL: u8 = 0xb6;
    pub(super) const INVOKESPECIAL: u8 = 0xb7;
    pub(super) const INVOKESTATIC: u8 = 0xb8;
    pub(super) const INVOKEINTERFACE: u8 = 0xb9;
    pub(super) const NEW: u8 = 0xbb;
    pub(super) const ATHROW: u8 = 0xbf;
    pub(super) const CHECKCAST: u8 = 0xc0;
}

/// Straight-line bytecode for one method body.
///
/// Tracks operand stack depth and local slots so `max_stack` and
/// `max_locals` come out right without a separate analysis pass.
pub struct CodeBuilder<'a> {
    pool: &'a mut ConstantPool,
    code: Vec<u8>,
    stack: u16,
    max_stack: u16,
    max_locals: u16,
}

impl<'a> CodeBuilder<'a> {
    fn new(pool: &'a mut ConstantPool, max_locals: u16) -> Self {
        Self {
            pool,
            code: Vec::new(),
            stack: 0,
            max_stack: 0,
            max_locals,
        }
    }

    fn push(&mut self, slots: u16) -> BytecodeResult<()> {
        self.stack = self
            .stack
            .checked_add(slots)
            .ok_or_else(|| BytecodeError::malformed("method body", "operand stack overflow"))?;
        self.max_stack = self.max_stack.max(self.stack);
        Ok(())
    }

    fn pop(&mut self, slots: u16) -> BytecodeResult<()> {
        self.stack = self
            .stack
            .checked_sub(slots)
            .ok_or_else(|| BytecodeError::malformed("method body", "operand stack underflow"))?;
        Ok(())
    }

    fn op_u16(&mut self, opcode: u8, operand: u16) {
        self.code.push(opcode);
        self.code.extend_from_slice(&operand.to_be_bytes());
    }

    /// Push the reference in local `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operand stack overflows.
    pub fn aload(&mut self, slot: u8) -> BytecodeResult<()> {
        match slot {
            0..=3 => self.code.push(opcodes::ALOAD_0.saturating_add(slot)),
            _ => self.code.extend_from_slice(&[opcodes::ALOAD, slot]),
        }
        self.max_locals = self.max_locals.max(u16::from(slot).saturating_add(1));
        self.push(1)
    }

    /// Push `null`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operand stack overflows.
    pub fn aconst_null(&mut self) -> BytecodeResult<()> {
        self.code.push(opcodes::ACONST_NULL);
        self.push(1)
    }

    /// Push a string constant.
    ///
    /// # Errors
    ///
    /// Returns an error if the constant pool overflows.
    pub fn ldc_string(&mut self, value: &str) -> BytecodeResult<()> {
        let index = self.pool.string(value)?;
        match u8::try_from(index) {
            Ok(short) => self.code.extend_from_slice(&[opcodes::LDC, short]),
            Err(_) => self.op_u16(opcodes::LDC_W, index),
        }
        self.push(1)
    }

    /// Cast the top of stack to `class`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or the constant pool overflows.
    pub fn checkcast(&mut self, class: &str) -> BytecodeResult<()> {
        if self.stack == 0 {
            return Err(BytecodeError::malformed("method body", "checkcast on empty stack"));
        }
        let index = self.pool.class(class)?;
        self.op_u16(opcodes::CHECKCAST, index);
        Ok(())
    }

    /// Allocate an uninitialised `class` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the constant pool overflows.
    pub fn new_instance(&mut self, class: &str) -> BytecodeResult<()> {
        let index = self.pool.class(class)?;
        self.op_u16(opcodes::NEW, index);
        self.push(1)
    }

    /// Duplicate the top of stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty.
    pub fn dup(&mut self) -> BytecodeResult<()> {
        self.pop(1)?;
        self.code.push(opcodes::DUP);
        self.push(2)
    }

    /// Discard the top of stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty.
    pub fn pop_value(&mut self) -> BytecodeResult<()> {
        self.code.push(opcodes::POP);
        self.pop(1)
    }

    /// Push a static reference field.
    ///
    /// # Errors
    ///
    /// Returns an error if the constant pool overflows.
    pub fn getstatic(&mut self, owner: &str, name: &str, desc: &str) -> BytecodeResult<()> {
        let index = self.pool.member(MemberKind::Field, owner, name, desc)?;
        self.op_u16(opcodes::GETSTATIC, index);
        let slots = if matches!(desc, "J" | "D") { 2 } else { 1 };
        self.push(slots)
    }

    /// Call a static method.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is malformed or the stack does not
    /// hold the arguments.
    pub fn invokestatic(&mut self, owner: &str, name: &str, desc: &str) -> BytecodeResult<()> {
        self.invoke(opcodes::INVOKESTATIC, MemberKind::Method, owner, name, desc, false)
    }

    /// Call a virtual method.
    ///
    /// # Errors
    ///
    /// See [`CodeBuilder::invokestatic`].
    pub fn invokevirtual(&mut self, owner: &str, name: &str, desc: &str) -> BytecodeResult<()> {
        self.invoke(opcodes::INVOKEVIRTUAL, MemberKind::Method, owner, name, desc, true)
    }

    /// Call a constructor or private method.
    ///
    /// # Errors
    ///
    /// See [`CodeBuilder::invokestatic`].
    pub fn invokespecial(&mut self, owner: &str, name: &str, desc: &str) -> BytecodeResult<()> {
        self.invoke(opcodes::INVOKESPECIAL, MemberKind::Method, owner, name, desc, true)
    }

    /// Call an interface method.
    ///
    /// # Errors
    ///
    /// See [`CodeBuilder::invokestatic`].
    pub fn invokeinterface(&mut self, owner: &str, name: &str, desc: &str) -> BytecodeResult<()> {
        self.invoke(
            opcodes::INVOKEINTERFACE,
            MemberKind::InterfaceMethod,
            owner,
            name,
            desc,
            true,
        )
    }

    fn invoke(
        &mut self,
        opcode: u8,
        kind: MemberKind,
        owner: &str,
        name: &str,
        desc: &str,
        has_receiver: bool,
    ) -> BytecodeResult<()> {
        let slots = method_descriptor_slots(desc)?;
        let consumed = slots
            .arguments
            .checked_add(u16::from(has_receiver))
            .ok_or_else(|| BytecodeError::malformed("method descriptor", desc.to_string()))?;
        let index = self.pool.member(kind, owner, name, desc)?;
        self.op_u16(opcode, index);
        if opcode == opcodes::INVOKEINTERFACE {
            let count = u8::try_from(consumed)
                .map_err(|_| BytecodeError::malformed("method descriptor", desc.to_string()))?;
            self.code.extend_from_slice(&[count, 0]);
        }
        self.pop(consumed)?;
        self.push(slots.returns)
    }

    /// Return the reference on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty.
    pub fn areturn(&mut self) -> BytecodeResult<()> {
        self.code.push(opcodes::ARETURN);
        self.pop(1)
    }

    /// Return from a `void` method.
    ///
    /// # Errors
    ///
    /// Never fails; returns a result for uniformity with other instructions.
    pub fn return_void(&mut self) -> BytecodeResult<()> {
        self.code.push(opcodes::RETURN);
        Ok(())
    }

    /// Throw the exception on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty.
    pub fn athrow(&mut self) -> BytecodeResult<()> {
        self.code.push(opcodes::ATHROW);
        self.pop(1)
    }

    /// Highest operand stack depth so far.
    #[must_use]
    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    /// Local variable slots used so far.
    #[must_use]
    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    fn finish(self) -> BytecodeResult<Vec<u8>> {
        if self.code.is_empty() {
            return Err(BytecodeError::malformed("method body", "empty code"));
        }
        let code_len = u32::try_from(self.code.len())
            .ok()
            .filter(|len| *len < 65536)
            .ok_or(BytecodeError::AttributeTooLarge {
                what: "Code",
                len: self.code.len(),
            })?;

        let mut payload = Vec::with_capacity(self.code.len().saturating_add(12));
        payload.extend_from_slice(&self.max_stack.to_be_bytes());
        payload.extend_from_slice(&self.max_locals.to_be_bytes());
        payload.extend_from_slice(&code_len.to_be_bytes());
        payload.extend_from_slice(&self.code);
        // exception_table_length, attributes_count
        payload.extend_from_slice(&0_u16.to_be_bytes());
        payload.extend_from_slice(&0_u16.to_be_bytes());
        attribute(self.pool, "Code", &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_reader::{ClassFile, CodeInfo};
    use crate::header::begin_file_facade_header;

    fn facade() -> InternalName {
        InternalName::new("org/gradle/kotlin/dsl/FooKt")
    }

    #[test]
    fn test_public_class_header() {
        let bytes = ClassWriter::public_class(&facade())
            .unwrap()
            .into_bytes()
            .unwrap();
        assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 52]);

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.this_class, "org/gradle/kotlin/dsl/FooKt");
        assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(class.access_flags, 0x0031);
        assert!(class.methods.is_empty());
    }

    #[test]
    fn test_major_version_override() {
        let bytes = ClassWriter::public_class(&facade())
            .unwrap()
            .with_major_version(55)
            .into_bytes()
            .unwrap();
        assert_eq!(ClassFile::parse(&bytes).unwrap().major_version, 55);
    }

    #[test]
    fn test_static_method_stack_and_locals() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        let signature = JvmMethodSignature::new(
            "getName",
            "(Lorg/gradle/api/Project;)Ljava/lang/String;",
        );
        writer
            .public_static_method(&signature, None, &[], |code| {
                code.aload(0)?;
                code.invokeinterface("org/gradle/api/Project", "getName", "()Ljava/lang/String;")?;
                code.areturn()
            })
            .unwrap();
        let class = ClassFile::parse(&writer.into_bytes().unwrap()).unwrap();

        let method = &class.methods[0];
        assert_eq!(method.name, "getName");
        assert_eq!(method.access_flags, access::PUBLIC | access::STATIC);
        let code = method.code.as_ref().unwrap();
        assert_eq!(code.max_stack, 1);
        assert_eq!(code.max_locals, 1);
        // aload_0, invokeinterface #idx count=1 0, areturn
        assert_eq!(code.code[0], 0x2a);
        assert_eq!(code.code[1], 0xb9);
        assert_eq!(&code.code[4..6], &[1, 0]);
        assert_eq!(code.code[6], 0xb0);
    }

    #[test]
    fn test_static_method_with_signature_and_exceptions() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        let signature = JvmMethodSignature::new("fail", "(Ljava/lang/String;)Ljava/lang/Object;");
        writer
            .public_static_method(
                &signature,
                Some("<T:Ljava/lang/Object;>(Ljava/lang/String;)TT;"),
                &[InternalName::new("java/lang/IllegalStateException")],
                |code| {
                    code.new_instance("java/lang/IllegalStateException")?;
                    code.dup()?;
                    code.aload(0)?;
                    code.invokespecial(
                        "java/lang/IllegalStateException",
                        "<init>",
                        "(Ljava/lang/String;)V",
                    )?;
                    code.athrow()
                },
            )
            .unwrap();
        let class = ClassFile::parse(&writer.into_bytes().unwrap()).unwrap();
        let method = &class.methods[0];
        assert_eq!(
            method.signature.as_deref(),
            Some("<T:Ljava/lang/Object;>(Ljava/lang/String;)TT;")
        );
        assert_eq!(method.exceptions, vec!["java/lang/IllegalStateException"]);
        assert_eq!(method.code.as_ref().unwrap().max_stack, 3);
    }

    #[test]
    fn test_stack_underflow_is_an_error() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        let result = writer.public_static_method(&JvmMethodSignature::new("f", "()V"), None, &[], |code| {
            code.areturn()
        });
        assert!(matches!(result, Err(BytecodeError::Malformed { .. })));
    }

    #[test]
    fn test_empty_body_is_an_error() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        let result =
            writer.public_static_method(&JvmMethodSignature::new("f", "()V"), None, &[], |_| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn test_ldc_and_checkcast() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        writer
            .public_static_method(
                &JvmMethodSignature::new("answer", "()Ljava/lang/String;"),
                None,
                &[],
                |code| {
                    code.ldc_string("42")?;
                    code.checkcast("java/lang/String")?;
                    code.areturn()
                },
            )
            .unwrap();
        let class = ClassFile::parse(&writer.into_bytes().unwrap()).unwrap();
        let code = class.methods[0].code.as_ref().unwrap();
        assert_eq!(code.code[0], 0x12);
        assert_eq!(code.max_locals, 0);
    }

    fn single_code(body: impl FnOnce(&mut CodeBuilder<'_>) -> BytecodeResult<()>) -> CodeInfo {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        writer
            .public_static_method(&JvmMethodSignature::new("f", "()V"), None, &[], body)
            .unwrap();
        let mut class = ClassFile::parse(&writer.into_bytes().unwrap()).unwrap();
        class.methods.remove(0).code.unwrap()
    }

    #[test]
    fn test_aconst_null_and_areturn() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        writer
            .public_static_method(
                &JvmMethodSignature::new("nothing", "()Ljava/lang/Object;"),
                None,
                &[],
                |code| {
                    code.aconst_null()?;
                    code.areturn()
                },
            )
            .unwrap();
        let class = ClassFile::parse(&writer.into_bytes().unwrap()).unwrap();
        let code = class.methods[0].code.as_ref().unwrap();
        assert_eq!(code.code, vec![0x01, 0xb0]);
        assert_eq!(code.max_stack, 1);
    }

    #[test]
    fn test_getstatic_invokevirtual_and_return_void() {
        let code = single_code(|code| {
            code.getstatic("java/lang/System", "out", "Ljava/io/PrintStream;")?;
            code.ldc_string("hello")?;
            code.invokevirtual("java/io/PrintStream", "println", "(Ljava/lang/String;)V")?;
            code.return_void()
        });
        // getstatic #f, ldc #s, invokevirtual #m, return
        assert_eq!(code.code.len(), 9);
        assert_eq!(code.code[0], 0xb2);
        assert_eq!(code.code[3], 0x12);
        assert_eq!(code.code[5], 0xb6);
        assert_eq!(code.code[8], 0xb1);
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.max_locals, 0);
    }

    #[test]
    fn test_wide_static_field_takes_two_slots() {
        let code = single_code(|code| {
            code.getstatic("java/lang/Long", "MAX_VALUE", "J")?;
            code.return_void()
        });
        assert_eq!(code.max_stack, 2);
    }

    #[test]
    fn test_pop_value_discards_top_of_stack() {
        let code = single_code(|code| {
            code.aconst_null()?;
            code.pop_value()?;
            code.return_void()
        });
        assert_eq!(code.code, vec![0x01, 0x57, 0xb1]);
        assert_eq!(code.max_stack, 1);
    }

    #[test]
    fn test_pop_value_on_empty_stack_is_an_error() {
        let mut writer = ClassWriter::public_class(&facade()).unwrap();
        let result = writer.public_static_method(&JvmMethodSignature::new("f", "()V"), None, &[], |code| {
            code.pop_value()?;
            code.return_void()
        });
        assert!(matches!(result, Err(BytecodeError::Malformed { .. })));
    }

    #[test]
    fn test_public_kotlin_class_carries_metadata() {
        let header = begin_file_facade_header().close_header();
        let bytes = public_kotlin_class(&facade(), &header, |_| Ok(())).unwrap();
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.kotlin_metadata().unwrap(), header);
    }
}
