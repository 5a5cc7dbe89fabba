//! # Store
//!
//! Owns the search state and applies actions strictly one after another.
//! Effects returned by the reducer run on the tokio runtime and feed their
//! actions back into the same queue, so every state transition goes through
//! [`Store::apply`].

use flume::{Receiver, Sender};

use crate::environment::Environment;
use crate::search::{reduce, Action, State};

pub struct Store {
    state: State,
    environment: Environment,
    sender: Sender<Action>,
    receiver: Receiver<Action>,
    subscribers: Vec<Sender<State>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("queued", &self.receiver.len())
            .finish()
    }
}

impl Store {
    pub fn new(environment: Environment) -> Self {
        let state = State::new(environment.navigation.location());
        let (sender, receiver) = flume::unbounded();
        Self {
            state,
            environment,
            sender,
            receiver,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// A handle other tasks can use to dispatch actions
    pub fn sender(&self) -> Sender<Action> {
        self.sender.clone()
    }

    pub fn send(&self, action: Action) {
        if self.sender.send(action).is_err() {
            log::error!("Store queue closed");
        }
    }

    /// Receive a snapshot of the state after every applied action
    pub fn subscribe(&mut self) -> Receiver<State> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Apply a single action and start its effects
    pub fn apply(&mut self, action: Action) {
        let effect = reduce(action, &mut self.state, &self.environment);
        self.subscribers
            .retain(|subscriber| subscriber.send(self.state.clone()).is_ok());
        effect.run(&self.sender);
    }

    /// Wait for the next queued action and apply it
    pub async fn step(&mut self) -> bool {
        match self.receiver.recv_async().await {
            Ok(action) => {
                self.apply(action);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply actions until `done` holds for the state
    pub async fn run_until(&mut self, done: impl Fn(&State) -> bool) {
        while self.step().await {
            if done(&self.state) {
                break;
            }
        }
    }

    pub async fn run(mut self) {
        while self.step().await {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::mock::MockResourceApi;
    use crate::environment::{Location, MemoryHistory, SearchConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn store(api: Arc<MockResourceApi>) -> Store {
        let history = MemoryHistory::new(Location::new("/search/", ""));
        Store::new(Environment::new(api, Arc::new(history), SearchConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_input_collapses_into_one_request() {
        let api = Arc::new(MockResourceApi::numbered(1).with_suggestions(&["roads", "rocks"]));
        let mut store = store(api.clone());

        for text in ["r", "ro", "roa"] {
            store.send(Action::FetchSuggestions(text.to_string()));
            store.step().await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        store
            .run_until(|s| !s.loading_suggestions && !s.suggestions.is_empty())
            .await;

        assert_eq!(api.autocomplete_calls(), 1);
        assert_eq!(api.autocomplete_texts(), vec!["roa".to_string()]);
        assert_eq!(store.state().suggestions, vec!["roads".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_input_requests_each_time() {
        let api = Arc::new(MockResourceApi::numbered(1).with_suggestions(&["roads"]));
        let mut store = store(api.clone());

        for text in ["r", "ro"] {
            store.send(Action::FetchSuggestions(text.to_string()));
            store.step().await;
            store.run_until(|s| !s.loading_suggestions).await;
        }
        assert_eq!(api.autocomplete_calls(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_every_transition() {
        let api = Arc::new(MockResourceApi::numbered(3));
        let mut store = store(api);
        let snapshots = store.subscribe();

        let initial = MemoryHistory::new(Location::new("/search/", "")).initial_change();
        store.send(Action::LocationChanged(initial));
        store.run_until(|s| !s.loading).await;

        let states: Vec<State> = snapshots.try_iter().collect();
        assert_eq!(states.len(), 2);
        assert!(states[0].loading);
        assert!(!states[1].loading);
        assert_eq!(states[1].resources.len(), 3);
    }
}
