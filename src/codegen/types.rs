//! Semantic type descriptors for generated code.
//!
//! A `Type` names a class or module-level symbol in the target language
//! together with the module it must be imported from. Primitive and
//! builtin types carry an empty module path and are never imported.
//! Backends resolve these descriptors to concrete syntax; the tables below
//! cover the OpenCV surface used by the built-in nodes.

use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub name: String,
    pub module: String,
    pub generics: Vec<Type>,
}

impl Type {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            generics: Vec::new(),
        }
    }

    /// A type with no import requirement (primitives, same-file symbols).
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn with_generics(mut self, generics: Vec<Type>) -> Self {
        self.generics = generics;
        self
    }

    pub fn should_import(&self) -> bool {
        !self.module.is_empty() && self.name != self.module
    }

    /// Short name including generic arguments, as written at use sites.
    pub fn display_name(&self) -> String {
        if self.generics.is_empty() {
            self.name.clone()
        } else {
            let args: Vec<String> = self.generics.iter().map(|g| g.display_name()).collect();
            format!("{}<{}>", self.name, args.join(", "))
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({}, module={})", self.display_name(), self.module)
    }
}

/// Language-neutral primitives. Backends may substitute their own
/// spellings; these names are what the Java backend prints.
pub mod std_types {
    use super::Type;

    pub fn void() -> Type {
        Type::plain("void")
    }
    pub fn boolean() -> Type {
        Type::plain("boolean")
    }
    pub fn int() -> Type {
        Type::plain("int")
    }
    pub fn long() -> Type {
        Type::plain("long")
    }
    pub fn float() -> Type {
        Type::plain("float")
    }
    pub fn double() -> Type {
        Type::plain("double")
    }
    pub fn string() -> Type {
        Type::new("String", "java.lang")
    }
}

/// OpenCV types as seen from the JVM backend.
pub mod jvm {
    use super::Type;

    pub fn mat() -> Type {
        Type::new("Mat", "org.opencv.core")
    }
    pub fn scalar() -> Type {
        Type::new("Scalar", "org.opencv.core")
    }
    pub fn core() -> Type {
        Type::new("Core", "org.opencv.core")
    }
    pub fn mat_of_point() -> Type {
        Type::new("MatOfPoint", "org.opencv.core")
    }
    pub fn point() -> Type {
        Type::new("Point", "org.opencv.core")
    }
    pub fn rect() -> Type {
        Type::new("Rect", "org.opencv.core")
    }
    pub fn size() -> Type {
        Type::new("Size", "org.opencv.core")
    }
    pub fn imgproc() -> Type {
        Type::new("Imgproc", "org.opencv.imgproc")
    }
    pub fn array_list(element: Type) -> Type {
        Type::new("ArrayList", "java.util").with_generics(vec![element])
    }
    pub fn opencv_pipeline() -> Type {
        Type::new("OpenCvPipeline", "org.openftc.easyopencv")
    }
    pub fn streamable_pipeline() -> Type {
        Type::new("StreamableOpenCvPipeline", "io.github.deltacv.steve")
    }
    pub fn label_annotation() -> Type {
        Type::new("Label", "io.github.deltacv.steve.tuner")
    }
}

/// Python-side pseudo-types. Python declarations are untyped; the `cv2`
/// entry exists so uses of it register the module import.
pub mod py {
    use super::Type;

    pub fn none() -> Type {
        Type::plain("None")
    }
    pub fn cv2() -> Type {
        Type::new("cv2", "cv2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_types_are_not_imported() {
        assert!(!std_types::int().should_import());
        assert!(!py::none().should_import());
    }

    #[test]
    fn test_opencv_types_are_imported() {
        assert!(jvm::mat().should_import());
        assert!(jvm::imgproc().should_import());
    }

    #[test]
    fn test_generic_display_name() {
        let t = jvm::array_list(jvm::mat_of_point());
        assert_eq!(t.display_name(), "ArrayList<MatOfPoint>");
    }

    #[test]
    fn test_cv2_module_import() {
        let t = py::cv2();
        assert_eq!(t.module, "cv2");
        assert!(!t.should_import()); // module == name, imported as a module
    }
}
