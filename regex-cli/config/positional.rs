use {
    anyhow::Context,
    lexopt::{Arg, Parser, ValueExt},
};

use crate::{args::Usage, config::Configurable};

/// Collects positional arguments, e.g., a pattern followed by a haystack.
#[derive(Debug)]
pub struct Config {
    names: &'static [&'static str],
    values: Vec<String>,
}

impl Config {
    /// Accepts exactly one positional argument for each of the given names.
    pub fn new(names: &'static [&'static str]) -> Config {
        Config { names, values: vec![] }
    }

    /// Returns the positional argument with the given name.
    pub fn get(&self, name: &str) -> anyhow::Result<&str> {
        anyhow::ensure!(
            self.values.len() == self.names.len(),
            "expected {} positional arguments ({}), but got {}",
            self.names.len(),
            self.names.join(", "),
            self.values.len(),
        );
        let i = self
            .names
            .iter()
            .position(|&n| n == name)
            .with_context(|| format!("unknown positional argument {}", name))?;
        Ok(&self.values[i])
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        _: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            Arg::Value(ref mut v) => {
                let v = std::mem::take(v)
                    .string()
                    .context("arguments must be valid UTF-8")?;
                self.values.push(v);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        &[]
    }
}
