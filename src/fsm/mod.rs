//! Table-driven finite state machine engine.
//!
//! Classic embedded FSM pattern expressed in Rust:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transition table (scanned top to bottom)                   │
//! │  ┌──────────┬──────────────┬─────────────┬───────────────┐  │
//! │  │ origin   │ guard        │ destination │ action        │  │
//! │  ├──────────┼──────────────┼─────────────┼───────────────┤  │
//! │  │ State::A │ fn(&M)->bool │ State::B    │ Some(fn(&mut))│  │
//! │  │ State::B │ fn(&M)->bool │ State::B    │ None          │  │
//! │  │ ...      │ ...          │ ...         │ ...           │  │
//! │  └──────────┴──────────────┴─────────────┴───────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each [`Machine::fire`] scans the table in declaration order.  For every
//! row whose origin is the current state the guard is evaluated against
//! the owning machine; the **first** true guard wins: its action (if any)
//! runs with mutable access to the machine, the current state moves to the
//! row's destination, and scanning stops.  If no row matches nothing
//! happens.  Row order is observable behaviour, so tables are kept as
//! ordered sequences and never re-sorted into maps.
//!
//! Concrete machines embed an [`Fsm`] by composition and implement
//! [`Machine`] to expose it; guards and actions are plain `fn` pointers over
//! the concrete machine type, with no closures and no heap.

pub mod button;
pub mod display;
pub mod ultrasound;
pub mod urbanite;

use core::fmt;

use log::debug;

/// Upper bound on rows per table (the largest table, Urbanite, has 13).
pub const MAX_TRANSITIONS: usize = 16;

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Total predicate over the owning machine's full state.
pub type GuardFn<M> = fn(&M) -> bool;

/// Side effect executed when a row fires.
pub type ActionFn<M> = fn(&mut M);

// ---------------------------------------------------------------------------
// Transition row
// ---------------------------------------------------------------------------

/// One row of a transition table.
pub struct Transition<M: Machine> {
    pub origin: M::State,
    pub guard: GuardFn<M>,
    pub destination: M::State,
    pub action: Option<ActionFn<M>>,
}

impl<M: Machine> Transition<M> {
    pub const fn new(
        origin: M::State,
        guard: GuardFn<M>,
        destination: M::State,
        action: Option<ActionFn<M>>,
    ) -> Self {
        Self {
            origin,
            guard,
            destination,
            action,
        }
    }
}

impl<M: Machine> Clone for Transition<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Machine> Copy for Transition<M> {}

// ---------------------------------------------------------------------------
// Machine trait
// ---------------------------------------------------------------------------

/// A concrete state machine that owns an [`Fsm`] header.
pub trait Machine: Sized {
    /// State identity.  `Default` is the fallback initial state for an
    /// empty table.
    type State: Copy + PartialEq + Default + fmt::Debug;

    fn engine(&self) -> &Fsm<Self>;
    fn engine_mut(&mut self) -> &mut Fsm<Self>;

    /// Evaluate the transition table once.  Returns `true` if a row fired.
    fn fire(&mut self) -> bool {
        let current = self.engine().current;
        let rows = self.engine().table.len();

        for idx in 0..rows {
            // Rows are `Copy`; taking one out releases the borrow on `self`
            // before the guard and action see the machine.
            let row = self.engine().table[idx];
            if row.origin != current || !(row.guard)(self) {
                continue;
            }
            if let Some(action) = row.action {
                action(self);
            }
            let engine = self.engine_mut();
            if row.destination != current {
                debug!("{}: {:?} -> {:?}", engine.name, current, row.destination);
            }
            engine.current = row.destination;
            return true;
        }

        false
    }

    /// The current state.
    fn state(&self) -> Self::State {
        self.engine().current
    }

    /// Overwrite the current state without running any action.  Test hook.
    fn set_state(&mut self, state: Self::State) {
        self.engine_mut().current = state;
    }
}

// ---------------------------------------------------------------------------
// FSM header
// ---------------------------------------------------------------------------

/// The generic header every concrete machine embeds: an ordered transition
/// table and the current state.
pub struct Fsm<M: Machine> {
    name: &'static str,
    table: heapless::Vec<Transition<M>, MAX_TRANSITIONS>,
    current: M::State,
}

impl<M: Machine> Fsm<M> {
    /// Bind a transition table.  The initial state is the origin of the
    /// first row.
    pub fn new(name: &'static str, rows: &[Transition<M>]) -> Self {
        debug_assert!(!rows.is_empty(), "{name}: empty transition table");
        debug_assert!(
            rows.len() <= MAX_TRANSITIONS,
            "{name}: {} rows exceed table capacity",
            rows.len()
        );

        let mut table = heapless::Vec::new();
        for row in rows {
            if table.push(*row).is_err() {
                break;
            }
        }
        let current = rows.first().map_or_else(M::State::default, |row| row.origin);

        Self {
            name,
            table,
            current,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of rows in the bound table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal counter machine used to pin down the engine contract.

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum Light {
        #[default]
        Off,
        On,
        Broken,
    }

    struct Lamp {
        fsm: Fsm<Lamp>,
        switch: bool,
        fuse_ok: bool,
        actions: Vec<&'static str>,
    }

    impl Machine for Lamp {
        type State = Light;
        fn engine(&self) -> &Fsm<Self> {
            &self.fsm
        }
        fn engine_mut(&mut self) -> &mut Fsm<Self> {
            &mut self.fsm
        }
    }

    fn switch_on(l: &Lamp) -> bool {
        l.switch
    }
    fn switch_off(l: &Lamp) -> bool {
        !l.switch
    }
    fn fuse_blown(l: &Lamp) -> bool {
        !l.fuse_ok
    }
    fn always(_: &Lamp) -> bool {
        true
    }
    fn do_light(l: &mut Lamp) {
        l.actions.push("light");
    }
    fn do_dark(l: &mut Lamp) {
        l.actions.push("dark");
    }
    fn do_mark_broken(l: &mut Lamp) {
        l.actions.push("broken");
    }

    fn make_lamp() -> Lamp {
        Lamp {
            fsm: Fsm::new(
                "lamp",
                &[
                    Transition::new(Light::Off, switch_on, Light::On, Some(do_light)),
                    Transition::new(Light::On, fuse_blown, Light::Broken, Some(do_mark_broken)),
                    Transition::new(Light::On, switch_off, Light::Off, Some(do_dark)),
                    Transition::new(Light::On, always, Light::On, None),
                ],
            ),
            switch: false,
            fuse_ok: true,
            actions: Vec::new(),
        }
    }

    #[test]
    fn initial_state_is_first_origin() {
        let lamp = make_lamp();
        assert_eq!(lamp.state(), Light::Off);
        assert_eq!(lamp.engine().len(), 4);
        assert_eq!(lamp.engine().name(), "lamp");
    }

    #[test]
    fn unmatched_guard_leaves_state_untouched() {
        let mut lamp = make_lamp();
        assert!(!lamp.fire());
        assert_eq!(lamp.state(), Light::Off);
        assert!(lamp.actions.is_empty());
    }

    #[test]
    fn matching_row_runs_action_then_moves() {
        let mut lamp = make_lamp();
        lamp.switch = true;
        assert!(lamp.fire());
        assert_eq!(lamp.state(), Light::On);
        assert_eq!(lamp.actions, vec!["light"]);
    }

    #[test]
    fn first_match_wins() {
        let mut lamp = make_lamp();
        lamp.switch = true;
        lamp.fire();

        // Both "fuse blown" and "always" match; only the earlier row fires.
        lamp.fuse_ok = false;
        lamp.fire();
        assert_eq!(lamp.state(), Light::Broken);
        assert_eq!(lamp.actions, vec!["light", "broken"]);
    }

    #[test]
    fn one_transition_per_fire() {
        let mut lamp = make_lamp();
        lamp.switch = true;
        lamp.fire();
        lamp.switch = false;
        // On -> Off fires, but Off -> On is not evaluated in the same cycle.
        lamp.fire();
        assert_eq!(lamp.state(), Light::Off);
    }

    #[test]
    fn row_without_action_is_a_pure_move() {
        let mut lamp = make_lamp();
        lamp.switch = true;
        lamp.fire();
        let before = lamp.actions.len();
        assert!(lamp.fire()); // "always" self-loop
        assert_eq!(lamp.state(), Light::On);
        assert_eq!(lamp.actions.len(), before);
    }

    #[test]
    fn set_state_bypasses_actions() {
        let mut lamp = make_lamp();
        lamp.set_state(Light::Broken);
        assert_eq!(lamp.state(), Light::Broken);
        assert!(lamp.actions.is_empty());
        // No rows originate in Broken.
        assert!(!lamp.fire());
    }
}
