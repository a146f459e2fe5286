//! Module invocations and their captured output.

use std::fmt;

/// A single engine module invocation: module name, flags and parameters.
///
/// ```
/// use spatial_engine::ModuleCall;
///
/// let call = ModuleCall::new("g.region").flags("g");
/// assert_eq!(call.args(), vec!["-g".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCall {
    module: String,
    flags: String,
    params: Vec<(String, String)>,
}

impl ModuleCall {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            flags: String::new(),
            params: Vec::new(),
        }
    }

    /// Add single-letter flags; they are passed as one `-xyz` argument.
    pub fn flags(mut self, flags: &str) -> Self {
        self.flags.push_str(flags);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn params<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: ToString,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in params {
            self.params.push((key.into(), value.to_string()));
        }
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn flag_letters(&self) -> &str {
        &self.flags
    }

    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }

    /// Value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn param_pairs(&self) -> &[(String, String)] {
        &self.params
    }

    /// Command-line arguments, excluding the module name itself.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.params.len() + 1);
        if !self.flags.is_empty() {
            args.push(format!("-{}", self.flags));
        }
        args.extend(self.params.iter().map(|(k, v)| format!("{}={}", k, v)));
        args
    }
}

impl fmt::Display for ModuleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        for arg in self.args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_order() {
        let call = ModuleCall::new("r.out.png")
            .param("input", "elevation")
            .param("output", "/tmp/out.png")
            .param("compression", 6)
            .flags("tw");
        assert_eq!(
            call.args(),
            vec!["-tw", "input=elevation", "output=/tmp/out.png", "compression=6"]
        );
        assert_eq!(
            call.to_string(),
            "r.out.png -tw input=elevation output=/tmp/out.png compression=6"
        );
    }

    #[test]
    fn test_no_flags() {
        let call = ModuleCall::new("r.info").param("map", "dem");
        assert_eq!(call.args(), vec!["map=dem"]);
        assert!(!call.has_flag('g'));
        assert_eq!(call.get("map"), Some("dem"));
        assert_eq!(call.get("input"), None);
    }
}
