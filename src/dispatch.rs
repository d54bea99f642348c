use crate::error::DispatchError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Token returned by [Dispatcher::register], used to unregister the handler
/// later. Each registration gets its own id, so the same closure registered
/// twice counts as two independent handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// A generic event dispatcher for broadcasting values to registered
/// callbacks.
///
/// Built for a single task: registrations live behind a `RefCell` and
/// handlers may call back into the dispatcher while a broadcast is running.
/// [Dispatcher::fire] iterates over a snapshot of the registrations, so a
/// handler that unregisters itself (or anyone else) mid-broadcast still sees
/// the current broadcast complete for everyone who was registered when it
/// started, and the removed handler receives nothing afterwards. Handlers
/// registered during a broadcast start with the next one.
pub struct Dispatcher<T> {
    handlers: RefCell<Vec<(HandlerId, Rc<dyn Fn(&T)>)>>,
    next_id: Cell<u64>,
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        Dispatcher {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers a callback, returning the id to unregister it with.
    pub fn register<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Removes a handler so that it doesn't receive future broadcasts. An
    /// in-flight broadcast is not affected.
    pub fn unregister(&self, id: HandlerId) -> Result<(), DispatchError> {
        let mut handlers = self.handlers.borrow_mut();
        let count = handlers.len();
        handlers.retain(|(registered, _)| *registered != id);

        if handlers.len() == count {
            return Err(DispatchError::HandlerNotFound);
        }
        Ok(())
    }

    /// Invokes every currently registered handler once with the given value.
    /// A panicking handler is not caught; whether the remaining handlers of
    /// that broadcast matter is the caller's problem.
    pub fn fire(&self, event: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(event);
        }
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_to_registered_handlers_once() {
        let dispatch = Dispatcher::new();
        let called = Rc::new(Cell::new(0));

        let counter = Rc::clone(&called);
        dispatch.register(move |_: &()| counter.set(counter.get() + 1));

        dispatch.fire(&());
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn fires_with_the_given_arguments() {
        let dispatch = Dispatcher::new();
        let seen = Rc::new(Cell::new((0, 0, 0)));

        let sink = Rc::clone(&seen);
        dispatch.register(move |event: &(i32, i32, i32)| sink.set(*event));

        dispatch.fire(&(1, 2, 3));
        assert_eq!(seen.get(), (1, 2, 3));
    }

    #[test]
    fn does_not_fire_unregistered_handlers() {
        let dispatch = Dispatcher::new();
        let called = Rc::new(Cell::new(0));

        let counter = Rc::clone(&called);
        let id = dispatch.register(move |_: &()| counter.set(counter.get() + 1));

        dispatch.unregister(id).unwrap();
        dispatch.fire(&());
        assert_eq!(called.get(), 0);
    }

    #[test]
    fn unregister_during_fire_completes_the_current_broadcast() {
        let dispatch = Rc::new(Dispatcher::new());
        let called = Rc::new(Cell::new(0));

        let counter = Rc::clone(&called);
        let this = Rc::downgrade(&dispatch);
        let id = Rc::new(Cell::new(None));
        let own_id = Rc::clone(&id);
        id.set(Some(dispatch.register(move |_: &()| {
            counter.set(counter.get() + 1);
            if let (Some(dispatch), Some(id)) = (this.upgrade(), own_id.get()) {
                dispatch.unregister(id).unwrap();
            }
        })));

        dispatch.fire(&());
        dispatch.fire(&());
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn handlers_registered_during_fire_wait_for_the_next_broadcast() {
        let dispatch = Rc::new(Dispatcher::new());
        let called = Rc::new(Cell::new(0));

        let this = Rc::downgrade(&dispatch);
        let counter = Rc::clone(&called);
        dispatch.register(move |_: &()| {
            let counter = Rc::clone(&counter);
            if let Some(dispatch) = this.upgrade() {
                dispatch.register(move |_: &()| counter.set(counter.get() + 1));
            }
        });

        dispatch.fire(&());
        assert_eq!(called.get(), 0);

        dispatch.fire(&());
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn unregistering_an_unknown_id_fails() {
        let dispatch: Dispatcher<()> = Dispatcher::new();
        let id = dispatch.register(|_| {});
        dispatch.unregister(id).unwrap();

        assert_eq!(
            dispatch.unregister(id),
            Err(crate::error::DispatchError::HandlerNotFound)
        );
    }
}
