// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairs begin signals with completion signals, regardless of arrival order.

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    hash::Hash,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, warn};

/// What happened when a begin or completion was delivered to a [`BeginCompletionMatcher`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchOutcome {
    /// Both halves are now present: the completion action was invoked.
    Fired,

    /// This half was stored and is waiting for its counterpart.
    Waiting,

    /// A completion was already waiting for this key and was replaced by the new one.
    Replaced,

    /// A begin was already waiting for this key; the redelivered begin had no effect.
    AlreadyWaiting,
}

/// Pairs a "begin" with a "completion" for the same key, independent of arrival order.
///
/// Each key is in one of three states:
///
/// * absent: no activity;
/// * present without an action: a begin arrived and is waiting for its completion;
/// * present with an action: a completion arrived and is waiting for its begin.
///
/// The action passed to [`on_completion`](Self::on_completion) is invoked exactly once, at the
/// moment both halves are present, and the key is removed at the same instant. Checking for the
/// counterpart and acting on it happen under one lock, so a begin and a completion racing on
/// different threads can neither double-fire nor lose the pair.
///
/// Actions run while the matcher's lock is held. They must not call back into the same matcher.
pub struct BeginCompletionMatcher<K, A> {
    pending: Mutex<HashMap<K, Option<A>>>,
}

impl<K, A> BeginCompletionMatcher<K, A>
where
    K: Eq + Hash + Clone + fmt::Display,
    A: FnOnce(),
{
    /// Creates a new, empty matcher.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Records that `key` began.
    ///
    /// If a completion is already waiting for `key`, its action is invoked before this returns.
    pub fn on_begin(&self, key: K) -> MatchOutcome {
        let mut pending = self.lock();
        match pending.entry(key) {
            Entry::Occupied(entry) if entry.get().is_some() => {
                let (key, action) = entry.remove_entry();
                debug!("- begin: {key} (completion was waiting)");
                if let Some(action) = action {
                    action();
                }
                MatchOutcome::Fired
            }
            Entry::Occupied(entry) => {
                debug!("= begin: {} (begin already waiting)", entry.key());
                MatchOutcome::AlreadyWaiting
            }
            Entry::Vacant(entry) => {
                debug!("+ begin: {}", entry.key());
                entry.insert(None);
                MatchOutcome::Waiting
            }
        }
    }

    /// Records that `key` completed, with `action` finalizing the result.
    ///
    /// If the begin for `key` has already arrived, `action` is invoked before this returns.
    /// Otherwise it is stored until the begin arrives. If another completion is already waiting
    /// for `key`, it is dropped and replaced by `action`.
    pub fn on_completion(&self, key: K, action: A) -> MatchOutcome {
        let mut pending = self.lock();
        match pending.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_some() {
                    warn!(
                        "duplicate completion for {} while waiting for its begin: \
                         replacing the earlier one",
                        entry.key(),
                    );
                    entry.insert(Some(action));
                    MatchOutcome::Replaced
                } else {
                    let (key, _) = entry.remove_entry();
                    debug!("- completion: {key} (begin was waiting)");
                    action();
                    MatchOutcome::Fired
                }
            }
            Entry::Vacant(entry) => {
                debug!("+ completion: {}", entry.key());
                entry.insert(Some(action));
                MatchOutcome::Waiting
            }
        }
    }

    /// Returns the number of keys waiting for a counterpart.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    /// Returns the keys waiting for a counterpart, split into begins waiting for completions and
    /// completions waiting for begins. Each list is sorted.
    pub fn pending_keys(&self) -> PendingKeys<K>
    where
        K: Ord,
    {
        let pending = self.lock();
        let mut begins = Vec::new();
        let mut completions = Vec::new();
        for (key, action) in pending.iter() {
            match action {
                Some(_) => completions.push(key.clone()),
                None => begins.push(key.clone()),
            }
        }
        begins.sort_unstable();
        completions.sort_unstable();
        PendingKeys { begins, completions }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Option<A>>> {
        // A panicking action leaves the table itself consistent: the entry was removed before the
        // action ran. Keep going rather than propagating the poison.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, A> Default for BeginCompletionMatcher<K, A>
where
    K: Eq + Hash + Clone + fmt::Display,
    A: FnOnce(),
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> fmt::Debug for BeginCompletionMatcher<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .pending
            .lock()
            .map(|pending| pending.len())
            .unwrap_or_else(|err| err.into_inner().len());
        f.debug_struct("BeginCompletionMatcher")
            .field("pending_len", &len)
            .finish()
    }
}

/// Keys still waiting in a [`BeginCompletionMatcher`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingKeys<K> {
    /// Keys whose begin arrived but whose completion never did.
    pub begins: Vec<K>,

    /// Keys whose completion arrived but whose begin never did.
    pub completions: Vec<K>,
}

impl<K> Default for PendingKeys<K> {
    fn default() -> Self {
        Self {
            begins: Vec::new(),
            completions: Vec::new(),
        }
    }
}

impl<K> PendingKeys<K> {
    /// Returns true if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.begins.is_empty() && self.completions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use test_strategy::proptest;

    type Action = Box<dyn FnOnce() + Send>;

    fn counting_action(counter: &Arc<AtomicUsize>) -> Action {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn begin_then_completion_fires_on_completion() {
        let matcher = BeginCompletionMatcher::<String, Action>::new();
        let fired = Arc::new(AtomicUsize::new(0));

        assert_eq!(matcher.on_begin("a".to_owned()), MatchOutcome::Waiting);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(
            matcher.on_completion("a".to_owned(), counting_action(&fired)),
            MatchOutcome::Fired
        );
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(matcher.pending_len(), 0);
    }

    #[test]
    fn completion_then_begin_fires_on_begin() {
        let matcher = BeginCompletionMatcher::<String, Action>::new();
        let fired = Arc::new(AtomicUsize::new(0));

        assert_eq!(
            matcher.on_completion("a".to_owned(), counting_action(&fired)),
            MatchOutcome::Waiting
        );
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(
            matcher.pending_keys(),
            PendingKeys {
                begins: vec![],
                completions: vec!["a".to_owned()],
            }
        );

        assert_eq!(matcher.on_begin("a".to_owned()), MatchOutcome::Fired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(matcher.pending_keys().is_empty());
    }

    #[test]
    fn duplicate_completion_replaces() {
        let matcher = BeginCompletionMatcher::<String, Action>::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        matcher.on_completion("a".to_owned(), counting_action(&first));
        assert_eq!(
            matcher.on_completion("a".to_owned(), counting_action(&second)),
            MatchOutcome::Replaced
        );
        assert_eq!(matcher.pending_len(), 1);

        matcher.on_begin("a".to_owned());
        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced action never runs");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_begin_is_idempotent() {
        let matcher = BeginCompletionMatcher::<String, Action>::new();
        let fired = Arc::new(AtomicUsize::new(0));

        matcher.on_begin("a".to_owned());
        assert_eq!(
            matcher.on_begin("a".to_owned()),
            MatchOutcome::AlreadyWaiting
        );
        matcher.on_completion("a".to_owned(), counting_action(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(matcher.pending_len(), 0);
    }

    #[test]
    fn keys_are_independent() {
        let matcher = BeginCompletionMatcher::<String, Action>::new();
        let fired = Arc::new(AtomicUsize::new(0));

        matcher.on_begin("a".to_owned());
        matcher.on_completion("b".to_owned(), counting_action(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(
            matcher.pending_keys(),
            PendingKeys {
                begins: vec!["a".to_owned()],
                completions: vec!["b".to_owned()],
            }
        );
    }

    #[test]
    fn concurrent_pairs_fire_exactly_once() {
        const KEYS: usize = 64;

        let matcher = BeginCompletionMatcher::<String, Action>::new();
        let fired: Vec<_> = (0..KEYS).map(|_| Arc::new(AtomicUsize::new(0))).collect();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for key in 0..KEYS {
                    matcher.on_begin(key.to_string());
                }
            });
            scope.spawn(|| {
                for (key, counter) in fired.iter().enumerate().rev() {
                    matcher.on_completion(key.to_string(), counting_action(counter));
                }
            });
        });

        for (key, counter) in fired.iter().enumerate() {
            assert_eq!(counter.load(Ordering::SeqCst), 1, "key {key} fired once");
        }
        assert_eq!(matcher.pending_len(), 0);
    }

    /// Delivers begins and completions for a handful of keys in an arbitrary interleaving, with
    /// arbitrary redelivery, and checks that no action ever runs twice.
    #[proptest]
    fn no_action_fires_twice(
        #[strategy(proptest::collection::vec((0u8..4, proptest::bool::ANY), 0..64))] ops: Vec<(
            u8,
            bool,
        )>,
    ) {
        let matcher = BeginCompletionMatcher::<u8, Action>::new();
        let mut counters = Vec::new();

        for (key, is_begin) in ops {
            if is_begin {
                matcher.on_begin(key);
            } else {
                let counter = Arc::new(AtomicUsize::new(0));
                matcher.on_completion(key, counting_action(&counter));
                counters.push(counter);
            }
        }

        for counter in &counters {
            proptest::prop_assert!(counter.load(Ordering::SeqCst) <= 1);
        }
    }

    /// Pairing is commutative: whichever half arrives first, the action fires exactly once.
    #[proptest]
    fn pairing_is_commutative(completion_first: bool) {
        let matcher = BeginCompletionMatcher::<u8, Action>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        if completion_first {
            matcher.on_completion(1, counting_action(&counter));
            matcher.on_begin(1);
        } else {
            matcher.on_begin(1);
            matcher.on_completion(1, counting_action(&counter));
        }

        proptest::prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
        proptest::prop_assert_eq!(matcher.pending_len(), 0);
    }
}
