//! Document location paths for error labelling.
//!
//! A context is a persistent singly-linked list of path segments; child
//! contexts share their parent's spine, so extending a path while walking
//! never copies it. Rendering is `(root)` at the top and dot-joined below,
//! with array indices in decimal: `(root).items.0.name`.

use std::fmt;
use std::rc::Rc;

const ROOT_SEGMENT: &str = "(root)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonContext {
    segment: String,
    parent: Option<Rc<JsonContext>>,
}

impl JsonContext {
    pub fn root() -> Rc<JsonContext> {
        Rc::new(JsonContext { segment: ROOT_SEGMENT.to_string(), parent: None })
    }

    pub fn child(parent: &Rc<JsonContext>, segment: impl Into<String>) -> Rc<JsonContext> {
        Rc::new(JsonContext { segment: segment.into(), parent: Some(Rc::clone(parent)) })
    }
}

impl fmt::Display for JsonContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // segments are stored leaf-first
        let mut segments = Vec::new();
        let mut cursor = Some(self);
        while let Some(ctx) = cursor {
            segments.push(ctx.segment.as_str());
            cursor = ctx.parent.as_deref();
        }
        for (i, segment) in segments.into_iter().rev().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_bare() {
        assert_eq!(JsonContext::root().to_string(), "(root)");
    }

    #[test]
    fn nested_segments_are_dot_joined() {
        let root = JsonContext::root();
        let field = JsonContext::child(&root, "field");
        let index = JsonContext::child(&field, "0");
        let leaf = JsonContext::child(&index, "subfield");
        assert_eq!(leaf.to_string(), "(root).field.0.subfield");
    }

    #[test]
    fn siblings_share_the_parent_spine() {
        let root = JsonContext::root();
        let a = JsonContext::child(&root, "a");
        let b = JsonContext::child(&root, "b");
        assert_eq!(a.to_string(), "(root).a");
        assert_eq!(b.to_string(), "(root).b");
    }
}
