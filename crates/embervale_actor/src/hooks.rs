//! # Named State Hooks
//!
//! A hook is a named closure polled at the start of every tick, before
//! messages are drained. Hooks watch for state conditions that no message
//! announces, such as a reply that never arrived. They must be idempotent;
//! the runtime may poll them on every tick for the actor's whole life.
//!
//! A hook that returns an error is logged and removed. The actor keeps
//! running; one broken watcher must never take the entity down with it.

use tracing::warn;

use crate::context::{Actor, ActorContext};

type HookFn<E> = Box<
    dyn FnMut(&mut E, &mut ActorContext<'_, E>) -> Result<bool, <E as Actor>::Error> + Send,
>;

struct StateHook<E: Actor> {
    name: &'static str,
    func: HookFn<E>,
}

/// The ordered set of state hooks installed on one actor.
pub struct HookSet<E: Actor> {
    hooks: Vec<StateHook<E>>,
}

impl<E: Actor> HookSet<E> {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Installs a named hook. The closure returns `Ok(true)` when it did
    /// observable work this tick, `Ok(false)` when it just polled.
    ///
    /// Installing a second hook under an existing name is a programming
    /// error; the new hook is rejected with a warning and the original
    /// keeps running.
    pub fn install<F>(&mut self, name: &'static str, func: F)
    where
        F: FnMut(&mut E, &mut ActorContext<'_, E>) -> Result<bool, E::Error> + Send + 'static,
    {
        if self.hooks.iter().any(|hook| hook.name == name) {
            warn!(hook = name, "duplicate state hook rejected");
            return;
        }
        self.hooks.push(StateHook {
            name,
            func: Box::new(func),
        });
    }

    /// Removes a hook by name. Returns `true` if it was installed.
    pub fn uninstall(&mut self, name: &'static str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|hook| hook.name != name);
        self.hooks.len() != before
    }

    /// Polls every hook once, in installation order. Returns how many
    /// reported doing work. A failing hook is logged and dropped from the
    /// set.
    pub fn run_all(&mut self, entity: &mut E, ctx: &mut ActorContext<'_, E>) -> usize {
        let mut worked = 0;
        let mut index = 0;
        while index < self.hooks.len() {
            let name = self.hooks[index].name;
            match (self.hooks[index].func)(entity, ctx) {
                Ok(true) => {
                    worked += 1;
                    index += 1;
                }
                Ok(false) => index += 1,
                Err(error) => {
                    warn!(hook = name, %error, "state hook failed, dropping it");
                    self.hooks.remove(index);
                }
            }
        }
        worked
    }

    /// Number of installed hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` when no hooks are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<E: Actor> Default for HookSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
