//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value of `key` in `section`; typed parsing and validation live
    /// in `domain::config_validation`.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
