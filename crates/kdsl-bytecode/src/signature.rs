//! JVM method signatures.

use std::fmt;

use crate::error::{BytecodeError, BytecodeResult};

/// A JVM method name paired with its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JvmMethodSignature {
    /// Method name (`getName`).
    pub name: String,
    /// Method descriptor (`()Ljava/lang/String;`).
    pub desc: String,
}

impl JvmMethodSignature {
    /// Create a signature.
    #[must_use]
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
        }
    }
}

impl fmt::Display for JvmMethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.desc)
    }
}

/// Getter signature for `property_name`: `get` followed by the name with its
/// first char upper-cased.
///
/// JavaBeans conventions (`is` prefixes, names starting with an upper-case
/// char) are not applied. An empty name yields `get`.
#[must_use]
pub fn jvm_getter_signature_for(property_name: &str, desc: impl Into<String>) -> JvmMethodSignature {
    let mut name = String::with_capacity(property_name.len().saturating_add(3));
    name.push_str("get");
    let mut chars = property_name.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    JvmMethodSignature::new(name, desc)
}

/// Local variable slots taken by the arguments of a method descriptor, and by
/// its return value on the operand stack.
pub(crate) struct DescriptorSlots {
    pub(crate) arguments: u16,
    pub(crate) returns: u16,
}

/// Count argument and return slots of `desc`. `long` and `double` take two.
pub(crate) fn method_descriptor_slots(desc: &str) -> BytecodeResult<DescriptorSlots> {
    let malformed = || BytecodeError::malformed("method descriptor", desc.to_string());

    let params = desc
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .ok_or_else(malformed)?;
    let (mut args, ret) = params;

    let mut arguments = 0_u16;
    while !args.is_empty() {
        let (slots, rest) = field_type(args).ok_or_else(malformed)?;
        arguments = arguments.checked_add(slots).ok_or_else(malformed)?;
        args = rest;
    }

    let returns = if ret == "V" {
        0
    } else {
        match field_type(ret) {
            Some((slots, "")) => slots,
            _ => return Err(malformed()),
        }
    };

    Ok(DescriptorSlots { arguments, returns })
}

/// Split one field type off the front of `s`, returning its slot count.
fn field_type(s: &str) -> Option<(u16, &str)> {
    let mut chars = s.char_indices();
    let (_, first) = chars.next()?;
    match first {
        'B' | 'C' | 'F' | 'I' | 'S' | 'Z' => Some((1, &s[1..])),
        'J' | 'D' => Some((2, &s[1..])),
        'L' => {
            let end = s.find(';')?;
            s.get(end.checked_add(1)?..).map(|rest| (1, rest))
        },
        '[' => {
            let (_, rest) = field_type(&s[1..])?;
            Some((1, rest))
        },
        _ => None,
    }
}
