//! Debug console command registry.
//!
//! Commands are registered explicitly by name with a help string and a
//! handler. [`CommandRegistry::execute`] splits an input line on whitespace,
//! looks up the first word and calls its handler with the rest. Drawing a
//! console and reading keyboard input are the host's business; this module
//! only dispatches.
//!
//! ```
//! use sprig_engine::console::CommandRegistry;
//!
//! let mut console = CommandRegistry::new();
//! console
//!     .register("add", "add two integers", |args| {
//!         let [a, b] = args else { anyhow::bail!("usage: add <a> <b>") };
//!         Ok((a.parse::<i64>()? + b.parse::<i64>()?).to_string())
//!     })
//!     .unwrap();
//!
//! assert_eq!(console.execute("add 2 3").unwrap(), "5");
//! assert!(console.execute("add 2").is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

/// Handler invoked with the arguments following the command name.
pub type CommandHandler = Box<dyn FnMut(&[&str]) -> anyhow::Result<String>>;

/// Errors from registering or executing console commands.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("console command '{name}' is already registered")]
    Duplicate { name: String },

    #[error("unknown console command '{name}'")]
    NotFound { name: String },

    /// The input line was blank.
    #[error("no command given")]
    EmptyInput,

    /// The handler itself failed.
    #[error("console command '{name}' failed: {source}")]
    Handler {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

struct Registered {
    help: String,
    handler: CommandHandler,
}

/// Name-to-handler table for debug commands.
///
/// A built-in `help` command lists every registered command with its help
/// text. It cannot be unregistered or replaced.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Registered>,
}

impl CommandRegistry {
    pub const HELP: &'static str = "help";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, help: &str, handler: F) -> Result<(), ConsoleError>
    where
        F: FnMut(&[&str]) -> anyhow::Result<String> + 'static,
    {
        if name == Self::HELP || self.commands.contains_key(name) {
            return Err(ConsoleError::Duplicate {
                name: name.to_owned(),
            });
        }
        self.commands.insert(
            name.to_owned(),
            Registered {
                help: help.to_owned(),
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<(), ConsoleError> {
        self.commands
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ConsoleError::NotFound {
                name: name.to_owned(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        name == Self::HELP || self.commands.contains_key(name)
    }

    /// Registered command names, sorted. Does not include `help`.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn help_text(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|c| c.help.as_str())
    }

    /// Parse and run one input line, returning the handler's output.
    pub fn execute(&mut self, line: &str) -> Result<String, ConsoleError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ConsoleError::EmptyInput)?;
        let args: Vec<&str> = words.collect();

        if name == Self::HELP {
            return Ok(self.help(&args));
        }

        let command = self
            .commands
            .get_mut(name)
            .ok_or_else(|| ConsoleError::NotFound {
                name: name.to_owned(),
            })?;
        debug!(command = name, args = ?args, "console command");
        (command.handler)(&args).map_err(|source| ConsoleError::Handler {
            name: name.to_owned(),
            source,
        })
    }

    fn help(&self, args: &[&str]) -> String {
        match args.first() {
            Some(name) => match self.commands.get(*name) {
                Some(c) => format!("{name}: {}", c.help),
                None => format!("unknown command '{name}'"),
            },
            None => self
                .commands
                .iter()
                .map(|(name, c)| format!("{name}: {}", c.help))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn registry() -> CommandRegistry {
        let mut r = CommandRegistry::new();
        r.register("echo", "print the arguments", |args| Ok(args.join(" ")))
            .unwrap();
        r.register("fail", "always fails", |_| anyhow::bail!("boom"))
            .unwrap();
        r
    }

    #[test]
    fn dispatches_on_first_word() {
        let mut r = registry();
        assert_eq!(r.execute("  echo   hello   world ").unwrap(), "hello world");
        assert_eq!(r.execute("echo").unwrap(), "");
    }

    #[test]
    fn errors() {
        let mut r = registry();
        assert!(matches!(r.execute("   "), Err(ConsoleError::EmptyInput)));
        assert!(matches!(r.execute("nope"), Err(ConsoleError::NotFound { .. })));

        let err = r.execute("fail").unwrap_err();
        assert!(matches!(err, ConsoleError::Handler { .. }));
        assert_eq!(err.to_string(), "console command 'fail' failed: boom");

        assert!(matches!(
            r.register("echo", "again", |_| Ok(String::new())),
            Err(ConsoleError::Duplicate { .. })
        ));
        assert!(matches!(
            r.register("help", "mine", |_| Ok(String::new())),
            Err(ConsoleError::Duplicate { .. })
        ));
    }

    #[test]
    fn unregister() {
        let mut r = registry();
        r.unregister("echo").unwrap();
        assert!(!r.contains("echo"));
        assert!(matches!(r.unregister("echo"), Err(ConsoleError::NotFound { .. })));
    }

    #[test]
    fn help_lists_commands() {
        let mut r = registry();
        assert_eq!(
            r.execute("help").unwrap(),
            "echo: print the arguments\nfail: always fails"
        );
        assert_eq!(r.execute("help echo").unwrap(), "echo: print the arguments");
        assert_eq!(r.execute("help zzz").unwrap(), "unknown command 'zzz'");
    }

    #[test]
    fn handlers_can_hold_state() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let mut r = CommandRegistry::new();
        r.register("tick", "count calls", move |_| {
            counter.set(counter.get() + 1);
            Ok(counter.get().to_string())
        })
        .unwrap();
        r.execute("tick").unwrap();
        assert_eq!(r.execute("tick").unwrap(), "2");
        assert_eq!(hits.get(), 2);
    }
}
