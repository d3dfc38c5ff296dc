//! Template helper functions.
//!
//! The helper set layers, from bottom to top:
//!
//! - the engine's built-in filters and tests
//! - the `minijinja-contrib` library, with Python-style string methods
//! - sprig-compatible filters the engine lacks (see [`sprig`])
//! - the file-inclusion helpers `getFile` and `getYaml`
//!
//! The file helpers never fail the render. Their errors go to the
//! [`ErrorCollector`] the set was built with, and they substitute an empty
//! string at the call site.

mod files;
pub mod sprig;

use std::sync::Arc;

use minijinja::Environment;

use crate::collector::ErrorCollector;

/// Name of the raw file inclusion helper.
pub const GET_FILE: &str = "getFile";

/// Name of the YAML re-serializing inclusion helper.
pub const GET_YAML: &str = "getYaml";

/// The helper functions made available to templates.
///
/// Cloning is cheap: clones share the same collector.
#[derive(Debug, Clone)]
pub struct HelperSet {
    collector: Arc<ErrorCollector>,
}

impl HelperSet {
    /// Creates a helper set that records failures into `collector`.
    #[must_use]
    pub const fn new(collector: Arc<ErrorCollector>) -> Self {
        Self { collector }
    }

    /// Returns the collector helper failures are recorded into.
    #[must_use]
    pub fn collector(&self) -> &ErrorCollector {
        &self.collector
    }

    /// Returns the full contents of the file at `path`.
    ///
    /// On failure the error is recorded and an empty string is returned.
    pub fn get_file(&self, path: &str) -> String {
        files::read_text(path).unwrap_or_else(|failure| {
            self.collector.add(failure.to_string());
            String::new()
        })
    }

    /// Reads the YAML file at `path` and returns it re-serialized.
    ///
    /// On failure the error, tagged with the failing step, is recorded and an
    /// empty string is returned.
    pub fn get_yaml(&self, path: &str) -> String {
        files::reserialize_yaml(path).unwrap_or_else(|failure| {
            self.collector.add(failure.to_string());
            String::new()
        })
    }

    /// Registers every helper into `env`.
    pub fn install(&self, env: &mut Environment<'_>) {
        minijinja_contrib::add_to_environment(env);
        env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);

        sprig::install(env);

        let helpers = self.clone();
        env.add_function(GET_FILE, move |path: String| helpers.get_file(&path));
        let helpers = self.clone();
        env.add_function(GET_YAML, move |path: String| helpers.get_yaml(&path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use std::fs;
    use tempfile::TempDir;

    fn render(helpers: &HelperSet, source: &str) -> String {
        let mut env = Environment::new();
        helpers.install(&mut env);
        env.render_str(source, context! {}).unwrap()
    }

    fn helpers() -> (Arc<ErrorCollector>, HelperSet) {
        let collector = Arc::new(ErrorCollector::new());
        let helpers = HelperSet::new(Arc::clone(&collector));
        (collector, helpers)
    }

    #[test]
    fn test_get_file_returns_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippet.conf");
        fs::write(&path, "gzip on;\n").unwrap();

        let (collector, helpers) = helpers();
        assert_eq!(helpers.get_file(path.to_str().unwrap()), "gzip on;\n");
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_get_file_missing_records_one_error() {
        let (collector, helpers) = helpers();

        assert_eq!(helpers.get_file("/nonexistent/missing.txt"), "");
        let messages = collector.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("/nonexistent/missing.txt"));
        assert!(messages[0].starts_with("getFile:"));
    }

    #[test]
    fn test_get_yaml_reserializes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upstreams.yaml");
        fs::write(&path, "b: 2\na:   [1,   2]\n").unwrap();

        let (collector, helpers) = helpers();
        assert_eq!(
            helpers.get_yaml(path.to_str().unwrap()),
            "b: 2\na:\n- 1\n- 2\n"
        );
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_get_yaml_invalid_is_tagged_as_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "key: [unclosed\n").unwrap();

        let (collector, helpers) = helpers();
        assert_eq!(helpers.get_yaml(path.to_str().unwrap()), "");

        let messages = collector.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("parse failed"));
        assert!(!messages[0].contains("read failed"));
    }

    #[test]
    fn test_get_yaml_missing_is_tagged_as_read_failure() {
        let (collector, helpers) = helpers();
        assert_eq!(helpers.get_yaml("/nonexistent/values.yaml"), "");
        assert!(collector.messages()[0].contains("read failed"));
    }

    #[test]
    fn test_installed_helpers_continue_after_failure() {
        let (collector, helpers) = helpers();
        let output = render(
            &helpers,
            r#"before[{{ getFile("/nonexistent/a") }}]after[{{ getYaml("/nonexistent/b") }}]"#,
        );

        assert_eq!(output, "before[]after[]");
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_clones_record_into_the_same_collector() {
        let (collector, helpers) = helpers();
        let clone = helpers.clone();

        clone.get_file("/nonexistent/a");
        helpers.get_yaml("/nonexistent/b");

        assert!(std::ptr::eq(helpers.collector(), clone.collector()));
        assert!(std::ptr::eq(helpers.collector(), Arc::as_ptr(&collector)));
        assert_eq!(helpers.collector().len(), 2);
    }

    #[test]
    fn test_contrib_and_pycompat_are_installed() {
        let (_, helpers) = helpers();
        assert_eq!(render(&helpers, r#"{{ "nginx".upper() }}"#), "NGINX");
        assert_eq!(render(&helpers, "{{ 1 | pluralize }}"), "");
        assert_eq!(render(&helpers, "{{ 2 | pluralize }}"), "s");
    }
}
