//! One phase of an operation stack.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use opstack_core::{SdkResult, ServiceError};

use crate::context::Context;
use crate::error::StackError;
use crate::middleware::{FnMiddleware, Handler, Middleware, Next};

/// Where an intercepting middleware lands within its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Outermost: runs before every middleware already in the step.
    Before,
    /// Innermost: runs after every middleware already in the step.
    After,
}

/// An ordered list of middleware sharing one input type.
///
/// Middleware run in list order, outermost first; the step's terminal
/// handler runs after the last one.
pub struct Step<I, O, E: ServiceError> {
    id: String,
    entries: Vec<Arc<dyn Middleware<I, O, E>>>,
}

impl<I, O, E: ServiceError> Step<I, O, E> {
    /// An empty step.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// The step's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a middleware at the front or back of the step.
    pub fn intercept(&mut self, position: Position, middleware: impl Middleware<I, O, E> + 'static) {
        self.insert(position, Arc::new(middleware));
    }

    /// Add a function as a middleware at the front or back of the step.
    pub fn intercept_fn<F>(&mut self, position: Position, id: impl Into<String>, func: F)
    where
        F: for<'a> Fn(&'a mut Context, I, Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>> + Send + Sync + 'static,
    {
        self.intercept(position, FnMiddleware::new(id, func));
    }

    /// Add a middleware immediately before the middleware named `anchor`.
    pub fn intercept_before(
        &mut self,
        anchor: &str,
        middleware: impl Middleware<I, O, E> + 'static,
    ) -> Result<(), StackError> {
        let index = self.index_of(anchor)?;
        self.entries.insert(index, Arc::new(middleware));
        Ok(())
    }

    /// Add a middleware immediately after the middleware named `anchor`.
    pub fn intercept_after(
        &mut self,
        anchor: &str,
        middleware: impl Middleware<I, O, E> + 'static,
    ) -> Result<(), StackError> {
        let index = self.index_of(anchor)?;
        self.entries.insert(index + 1, Arc::new(middleware));
        Ok(())
    }

    /// Remove the first middleware named `id`.
    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn Middleware<I, O, E>>> {
        let index = self.entries.iter().position(|m| m.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Whether a middleware named `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|m| m.id() == id)
    }

    /// Middleware ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.id()).collect()
    }

    /// Number of middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the step has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every middleware of the step around `terminal`.
    pub fn run<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: I,
        terminal: &'a dyn Handler<I, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        Next::new(&self.entries, terminal).run(ctx, input)
    }

    fn insert(&mut self, position: Position, middleware: Arc<dyn Middleware<I, O, E>>) {
        match position {
            Position::Before => self.entries.insert(0, middleware),
            Position::After => self.entries.push(middleware),
        }
    }

    fn index_of(&self, anchor: &str) -> Result<usize, StackError> {
        self.entries
            .iter()
            .position(|m| m.id() == anchor)
            .ok_or_else(|| StackError::MiddlewareNotFound {
                step: self.id.clone(),
                id: anchor.to_owned(),
            })
    }
}

impl<I, O, E: ServiceError> fmt::Debug for Step<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("middleware", &self.ids())
            .finish()
    }
}
