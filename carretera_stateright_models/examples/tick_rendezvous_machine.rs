//! Model: tick / circulate rendezvous.
//!
//! Vehicles count down travel ticks. A vehicle may park a `circulate` call;
//! the tick that brings it to 0 releases it, and the tick only returns once
//! every released caller has resumed. Vehicles without a parked call never
//! hold the clock.
//!
//! Intentionally abstract: no grid, no queues. One segment per vehicle.

use stateright::{Checker, Model, Property, report::WriteReporter};
use std::collections::BTreeMap;
use std::time::Duration;

const VEHICLES: [u8; 3] = [1, 2, 3];
const TRAVEL: [u8; 3] = [1, 2, 2];
const MAX_TICKS: u8 = 3;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Call {
    Idle,
    Parked,
    Released,
    Returned,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct State {
    pub remaining: BTreeMap<u8, u8>,
    pub calls: BTreeMap<u8, Call>,
    /// A tick decremented the counters and has not returned yet.
    pub tick_open: bool,
    pub pending_acks: u8,
    pub ticks: u8,
    /// `pending_acks` observed by the last tick return.
    pub acks_at_return: Option<u8>,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Circulate(u8),
    Resume(u8),
    TickStart,
    TickReturn,
}

#[derive(Clone, Debug)]
pub struct RendezvousModel;

impl Model for RendezvousModel {
    type State = State;
    type Action = Action;

    fn init_states(&self) -> Vec<Self::State> {
        vec![State {
            remaining: VEHICLES.iter().copied().zip(TRAVEL).collect(),
            calls: VEHICLES.iter().map(|&v| (v, Call::Idle)).collect(),
            tick_open: false,
            pending_acks: 0,
            ticks: 0,
            acks_at_return: None,
        }]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        for (&vehicle, &call) in &state.calls {
            match call {
                Call::Idle => actions.push(Action::Circulate(vehicle)),
                Call::Released => actions.push(Action::Resume(vehicle)),
                Call::Parked | Call::Returned => {}
            }
        }
        if state.tick_open {
            actions.push(Action::TickReturn);
        } else if state.ticks < MAX_TICKS {
            actions.push(Action::TickStart);
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        let mut next = state.clone();
        match action {
            Action::Circulate(vehicle) => {
                let call = if next.remaining[&vehicle] == 0 {
                    Call::Returned
                } else {
                    Call::Parked
                };
                next.calls.insert(vehicle, call);
            }
            Action::Resume(vehicle) => {
                next.calls.insert(vehicle, Call::Returned);
                next.pending_acks -= 1;
            }
            Action::TickStart => {
                next.ticks += 1;
                next.tick_open = true;
                for (vehicle, remaining) in next.remaining.iter_mut() {
                    if *remaining == 0 {
                        continue;
                    }
                    *remaining -= 1;
                    if *remaining == 0 && next.calls[vehicle] == Call::Parked {
                        next.calls.insert(*vehicle, Call::Released);
                        next.pending_acks += 1;
                    }
                }
            }
            Action::TickReturn => {
                // The tick caller is still blocked until every release resumed.
                if next.pending_acks > 0 {
                    return None;
                }
                next.tick_open = false;
                next.acks_at_return = Some(next.pending_acks);
            }
        }
        Some(next)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("released only at zero", |_, s: &State| {
                s.calls.iter().all(|(vehicle, call)| match call {
                    Call::Released | Call::Returned => s.remaining[vehicle] == 0,
                    Call::Idle | Call::Parked => true,
                })
            }),
            Property::always("parked calls still have ticks to go", |_, s: &State| {
                s.calls
                    .iter()
                    .all(|(vehicle, call)| *call != Call::Parked || s.remaining[vehicle] > 0)
            }),
            Property::always("tick returns after every resume", |_, s: &State| {
                s.acks_at_return.is_none_or(|pending| pending == 0)
            }),
            Property::always("acks match released calls", |_, s: &State| {
                let released = s.calls.values().filter(|c| **c == Call::Released).count();
                released == s.pending_acks as usize
            }),
            Property::sometimes("every call returns", |_, s: &State| {
                s.calls.values().all(|call| *call == Call::Returned)
            }),
        ]
    }
}

fn main() -> Result<(), pico_args::Error> {
    env_logger::init();

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some("explore") => {
            let address = args
                .opt_free_from_str()?
                .unwrap_or("localhost:3000".to_string());
            println!("Exploring tick rendezvous state space on {address}.");
            RendezvousModel
                .checker()
                .threads(num_cpus::get())
                .timeout(Duration::from_secs(60))
                .serve(address);
        }
        Some("check") | None => {
            println!("Model checking the tick / circulate rendezvous.");
            RendezvousModel
                .checker()
                .threads(num_cpus::get())
                .timeout(Duration::from_secs(60))
                .spawn_dfs()
                .report(&mut WriteReporter::new(&mut std::io::stdout()));
        }
        _ => {
            println!("USAGE:");
            println!("  tick_rendezvous_machine check");
            println!("  tick_rendezvous_machine explore [ADDRESS]");
        }
    }

    Ok(())
}
