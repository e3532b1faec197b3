//! Path evaluation over encoded buffers and decoded trees.

use super::{JsonPath, PathStep};
use crate::binary::JsonbBinary;
use crate::error::Result;
use crate::navigator::{JsonbRef, Lookup};
use crate::value::JsonbValue;

impl JsonPath {
    /// Applies every step to `root`, left to right.
    ///
    /// A missing key or index, or a step that does not fit the value it is
    /// applied to, yields `Ok(None)`. Only a corrupt buffer is an error.
    pub fn evaluate<'a>(&self, root: JsonbRef<'a>) -> Result<Option<JsonbRef<'a>>> {
        let mut current = root;
        for step in self.steps() {
            match current.step(step)? {
                Lookup::Found(next) => current = next,
                Lookup::NotFound | Lookup::TypeMismatch => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

/// Evaluates `path` against an encoded buffer.
pub fn evaluate<'a>(buf: &'a [u8], path: &JsonPath) -> Result<Option<JsonbRef<'a>>> {
    path.evaluate(JsonbRef::from_slice(buf)?)
}

/// Evaluates `path` and copies the selected sub-value into its own buffer.
pub fn evaluate_to_binary(buf: &[u8], path: &JsonPath) -> Result<Option<JsonbBinary>> {
    Ok(evaluate(buf, path)?.map(|v| v.to_binary()))
}

impl JsonbValue {
    /// Evaluates `path` on the decoded tree with the same semantics as the
    /// buffer evaluator.
    pub fn get_path(&self, path: &JsonPath) -> Option<&JsonbValue> {
        let mut current = self;
        for step in path.steps() {
            current = match (step, current) {
                (PathStep::Key(key), JsonbValue::Object(obj)) => obj.get(key)?,
                (PathStep::Index(i), JsonbValue::Array(items)) => {
                    items.get(usize::try_from(*i).ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;
    use crate::value::JsonbObject;
    use alloc::string::ToString;
    use alloc::vec;

    fn object(pairs: &[(&str, JsonbValue)]) -> JsonbValue {
        JsonbValue::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<JsonbObject>(),
        )
    }

    fn nested() -> JsonbBinary {
        let value = object(&[(
            "a",
            object(&[
                ("b", 1i64.into()),
                ("c", JsonbValue::Array(vec![1i64.into(), 2i64.into()])),
            ]),
        )]);
        JsonbBinary::encode(&value).unwrap()
    }

    #[test]
    fn test_evaluate_nested() {
        let buf = nested();
        let path = JsonPath::parse("a.c").unwrap();
        let found = evaluate(buf.as_bytes(), &path).unwrap().unwrap();
        assert_eq!(
            found.to_value().unwrap(),
            JsonbValue::Array(vec![1i64.into(), 2i64.into()])
        );

        let path = JsonPath::parse("a['b']").unwrap();
        let found = evaluate(buf.as_bytes(), &path).unwrap().unwrap();
        assert_eq!(found.as_number(), Some(Number::Int64(1)));
    }

    #[test]
    fn test_evaluate_missing_is_none() {
        let buf = nested();
        for text in [":a.c[5]", ":a.x", ":a.b.c", ":a.c.k", ":a[0]", ":a.c[-1]"] {
            let path = JsonPath::parse(text).unwrap();
            assert!(evaluate(buf.as_bytes(), &path).unwrap().is_none(), "{}", text);
        }
    }

    #[test]
    fn test_empty_path_selects_root() {
        let buf = nested();
        let root = evaluate(buf.as_bytes(), &JsonPath::default()).unwrap().unwrap();
        assert_eq!(root.to_value().unwrap(), buf.decode().unwrap());
    }

    #[test]
    fn test_evaluate_to_binary() {
        let buf = nested();
        let path = JsonPath::parse(":a").unwrap();
        let sub = evaluate_to_binary(buf.as_bytes(), &path).unwrap().unwrap();
        let inner = JsonPath::parse(":c[1]").unwrap();
        let found = evaluate(sub.as_bytes(), &inner).unwrap().unwrap();
        assert_eq!(found.as_number(), Some(Number::Int64(2)));
    }

    #[test]
    fn test_evaluate_corrupt_buffer() {
        assert!(evaluate(&[0xFF, 0, 0], &JsonPath::default()).is_err());
    }

    #[test]
    fn test_tree_and_buffer_agree() {
        let buf = nested();
        let tree = buf.decode().unwrap();
        for text in [":a", ":a.b", ":a.c[0]", ":a.c[2]", ":a.b[0]", "[0]"] {
            let path = JsonPath::parse(text).unwrap();
            let from_tree = tree.get_path(&path).cloned();
            let from_buf = evaluate(buf.as_bytes(), &path)
                .unwrap()
                .map(|v| v.to_value().unwrap());
            assert_eq!(from_tree, from_buf, "{}", text);
        }
    }
}
