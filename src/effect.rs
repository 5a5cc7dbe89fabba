use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{Future, FutureExt};

/// Cancellation handle for a debounced effect. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct Debouncer(Arc<AtomicBool>);

impl Debouncer {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Follow-up work returned by a reducer. The store executes it and feeds the
/// resulting actions back into the queue.
pub enum Effect<A> {
    None,
    Action(A),
    Future(BoxFuture<'static, A>),
    Debounce {
        action: A,
        delay: Duration,
        debouncer: Debouncer,
    },
    Merge(Vec<Effect<A>>),
}

impl<A> Effect<A> {
    pub const NONE: Self = Effect::None;

    pub fn action(action: A) -> Self {
        Effect::Action(action)
    }

    pub fn future<T, F>(future: F, map: impl FnOnce(T) -> A + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        A: 'static,
    {
        Effect::Future(future.map(map).boxed())
    }

    /// Dispatch `action` after `delay` unless `debouncer` was cancelled in between
    pub fn debounce(action: A, delay: Duration, debouncer: Debouncer) -> Self {
        Effect::Debounce {
            action,
            delay,
            debouncer,
        }
    }

    pub fn merge2(a: Self, b: Self) -> Self {
        Effect::Merge(vec![a, b])
    }

    pub fn is_none(&self) -> bool {
        match self {
            Effect::None => true,
            Effect::Merge(effects) => effects.iter().all(Effect::is_none),
            _ => false,
        }
    }
}

impl<A: Send + 'static> Effect<A> {
    /// Run the effect, sending every produced action to `sender`.
    /// Immediate actions are queued in order before this returns.
    pub fn run(self, sender: &flume::Sender<A>) {
        match self {
            Effect::None => {}
            Effect::Action(action) => {
                if sender.send(action).is_err() {
                    log::error!("Store closed, dropping action");
                }
            }
            Effect::Future(future) => {
                let sender = sender.clone();
                tokio::spawn(async move {
                    let action = future.await;
                    if sender.send_async(action).await.is_err() {
                        log::error!("Store closed, dropping action");
                    }
                });
            }
            Effect::Debounce {
                action,
                delay,
                debouncer,
            } => {
                let sender = sender.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if debouncer.is_cancelled() {
                        return;
                    }
                    if sender.send_async(action).await.is_err() {
                        log::error!("Store closed, dropping debounced action");
                    }
                });
            }
            Effect::Merge(effects) => {
                for effect in effects {
                    effect.run(sender);
                }
            }
        }
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Action(arg0) => f.debug_tuple("Action").field(arg0).finish(),
            Self::Future(_) => write!(f, "Future"),
            Self::Debounce { action, delay, .. } => f
                .debug_struct("Debounce")
                .field("action", action)
                .field("delay", delay)
                .finish(),
            Self::Merge(arg0) => f.debug_tuple("Merge").field(arg0).finish(),
        }
    }
}
