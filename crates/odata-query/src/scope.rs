//! Closure frames for lambda free variables

use indexmap::IndexMap;

use crate::ast::Value;

/// Captured variables visible to a lambda, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: IndexMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Find `name` in the nearest frame that defines it (index 0 is nearest)
pub fn lookup<'a>(scopes: &'a [Scope], name: &str) -> Option<&'a Value> {
    scopes.iter().find_map(|scope| scope.get(name))
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (name, value) in iter {
            scope.insert(name, value);
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_frame_wins() {
        let inner = Scope::new().with("id", 1);
        let outer = Scope::new().with("id", 2).with("name", "acme");
        let scopes = [inner, outer];

        assert_eq!(lookup(&scopes, "id"), Some(&Value::Int(1)));
        assert_eq!(lookup(&scopes, "name"), Some(&Value::from("acme")));
        assert_eq!(lookup(&scopes, "missing"), None);
    }

    #[test]
    fn collect_keeps_insertion_order() {
        let scope: Scope = [("b", 2), ("a", 1), ("b", 3)].into_iter().collect();
        let names: Vec<&str> = scope.vars.keys().map(String::as_str).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(scope.get("b"), Some(&Value::Int(3)));
    }
}
