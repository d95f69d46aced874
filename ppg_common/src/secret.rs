use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper for sensitive configuration values. The value is never printed by `Debug` or `Display`, so secrets can
/// be carried around inside config structs that are logged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// True if the secret was never configured (or configured as an empty / whitespace-only string).
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Treats an empty secret as absent.
    pub fn non_empty(&self) -> Option<&str> {
        if self.is_empty() {
            None
        } else {
            Some(self.value.as_str())
        }
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
