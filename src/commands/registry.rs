//! Command handler registry
//!
//! A pluggable, name-keyed table of handlers. Each handler implements
//! [`CommandHandler`] and is registered under its name and every alias.
//! Aliases are independent entries sharing one handler instance.

use super::context::TransformContext;
use crate::ast::Group;
use std::collections::HashMap;
use std::sync::Arc;

/// Handles one LaTeX command by mutating the transform context
///
/// Handlers are stateless: everything they read or write lives in the
/// context or in their own argument groups. A handler receiving fewer
/// arguments than it needs should do nothing (or warn), never panic.
pub trait CommandHandler: Send + Sync {
    /// The primary command name, without backslash
    fn name(&self) -> &str;

    /// Additional names this handler answers to
    fn aliases(&self) -> &[&str] {
        &[]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext);
}

/// Registry of command handlers
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        CommandRegistry {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its name and aliases
    ///
    /// Existing entries with the same name or alias are replaced.
    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.register_arc(Arc::new(handler));
    }

    pub fn register_arc(&mut self, handler: Arc<dyn CommandHandler>) {
        self.handlers
            .insert(handler.name().to_string(), Arc::clone(&handler));
        for alias in handler.aliases() {
            self.handlers
                .insert((*alias).to_string(), Arc::clone(&handler));
        }
    }

    pub fn register_many<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = Arc<dyn CommandHandler>>,
    {
        for handler in handlers {
            self.register_arc(handler);
        }
    }

    /// Get a handler by command name
    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    /// Check if a command name is registered
    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// List all registered names, aliases included (sorted)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a registry with the base and resume command sets
    ///
    /// Resume handlers are registered last and win on name collisions.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_many(super::base::handlers());
        registry.register_many(super::resume::handlers());
        registry
    }
}
