//! Configuration access port trait.

/// Raw configuration lookup by section and key.
///
/// Values come back untyped; parsing and range checks live in
/// `domain::config_validation` so that malformed values are reported
/// instead of defaulted.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Keys present in `section`, empty when the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;
}
