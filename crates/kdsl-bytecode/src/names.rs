//! JVM and Kotlin class names.

use std::fmt;

/// JVM internal class name, `/`-separated (`org/gradle/kotlin/dsl/FooKt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalName(String);

impl InternalName {
    /// Wrap an internal name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build an internal name from a dotted package and a simple name.
    #[must_use]
    pub fn from_package(package: &str, simple_name: &str) -> Self {
        if package.is_empty() {
            Self(simple_name.to_string())
        } else {
            Self(format!("{}/{simple_name}", package.replace('.', "/")))
        }
    }

    /// The raw internal name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Class name without its package (`FooKt`).
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Package in internal form (`org/gradle/kotlin/dsl`), empty for the
    /// root package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(package, _)| package)
    }

    /// Field descriptor of this class (`Lorg/gradle/kotlin/dsl/FooKt;`).
    #[must_use]
    pub fn descriptor(&self) -> String {
        format!("L{};", self.0)
    }
}

impl fmt::Display for InternalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InternalName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InternalName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for InternalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kotlin class name: `/` separates packages, `.` separates nested classes
/// (`kotlin/collections/Map.Entry`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(String);

impl ClassName {
    /// Wrap a Kotlin class name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw class name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The JVM internal form, with nested classes joined by `$`.
    #[must_use]
    pub fn to_internal(&self) -> InternalName {
        InternalName(self.0.replace('.', "$"))
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassName {
    fn from(value: String) -> Self {
        Self(value)
    }
}
