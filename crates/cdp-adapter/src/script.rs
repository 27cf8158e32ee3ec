//! Page script descriptors and positional script parameters.

use serde_json::Value;

/// A script that is evaluated inside a tab's own rendering context.
///
/// Injecting the source installs one or more globals on `window`; `entry_point`
/// names the one [`crate::TabGateway::inject_and_run`] invokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageScript {
    name: &'static str,
    source: &'static str,
    entry_point: &'static str,
}

impl PageScript {
    pub const fn new(name: &'static str, source: &'static str, entry_point: &'static str) -> Self {
        Self {
            name,
            source,
            entry_point,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn entry_point(&self) -> &'static str {
        self.entry_point
    }
}

/// Named script arguments, passed to the entry point positionally in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptParams {
    entries: Vec<(String, Value)>,
}

impl ScriptParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter; re-using a name replaces its value in place.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, value)| value.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the expression that invokes `window[entry](...args)`.
pub fn entry_point_expression(entry: &str, args: &[Value]) -> Result<String, serde_json::Error> {
    let entry_literal = serde_json::to_string(entry)?;
    let args_literal = serde_json::to_string(args)?;
    Ok(format!("window[{entry_literal}](...{args_literal})"))
}
