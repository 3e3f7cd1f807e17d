//! The partial loader external interface (spec §6).

use std::collections::HashMap;

/// Resolves a partial name to template text.
///
/// This crate never touches a filesystem, a database, or a network; a
/// caller supplies an implementation backed by whichever of those fits
/// their embedding. `None` signals "not found," which the render engine
/// treats as empty output in lenient mode (spec §7).
pub trait PartialLoader {
    fn load(&self, name: &str) -> Option<String>;
}

impl<F> PartialLoader for F
where
    F: Fn(&str) -> Option<String>,
{
    fn load(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// A trivial in-memory partial loader, handy for tests and small embedded
/// template sets. Not a filesystem loader: that collaborator is explicitly
/// out of this crate's scope.
#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    partials: HashMap<String, String>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, template: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), template.into());
        self
    }
}

impl FromIterator<(String, String)> for MapLoader {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        MapLoader {
            partials: iter.into_iter().collect(),
        }
    }
}

impl PartialLoader for MapLoader {
    fn load(&self, name: &str) -> Option<String> {
        self.partials.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_loader_returns_none_for_missing_partial() {
        let loader = MapLoader::new();
        assert_eq!(loader.load("missing"), None);
    }

    #[test]
    fn map_loader_returns_inserted_partial() {
        let mut loader = MapLoader::new();
        loader.insert("greet", "Hi, {{name}}\n");
        assert_eq!(loader.load("greet"), Some("Hi, {{name}}\n".to_string()));
    }

    #[test]
    fn closure_implements_partial_loader() {
        let loader = |name: &str| if name == "x" { Some("X".to_string()) } else { None };
        assert_eq!(PartialLoader::load(&loader, "x"), Some("X".to_string()));
    }
}
