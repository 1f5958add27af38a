//! Model: lane grants, FIFO queues and the backward cascade.
//!
//! Four vehicles on a 3-segment, 1-lane road. Each vehicle may enter, advance
//! while not in the last segment, or exit once on the road; every step is
//! followed by one resolver sweep, as after each call in the crate.

use carretera_stateright_models::toy_road::{Move, Road, Vehicle};
use stateright::{Checker, Model, Property, report::WriteReporter};
use std::collections::BTreeMap;
use std::time::Duration;

pub const SEGMENTS: u8 = 3;
pub const LANES: u8 = 1;
pub const VEHICLES: [Vehicle; 4] = [1, 2, 3, 4];

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Phase {
    Outside,
    Waiting,
    OnRoad,
    Left,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct State {
    pub road: Road,
    pub phases: BTreeMap<Vehicle, Phase>,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Enter(Vehicle),
    Advance(Vehicle),
    Exit(Vehicle),
}

#[derive(Clone, Debug)]
pub struct CascadeModel;

impl Model for CascadeModel {
    type State = State;
    type Action = Action;

    fn init_states(&self) -> Vec<Self::State> {
        vec![State {
            road: Road::new(SEGMENTS, LANES),
            phases: VEHICLES.iter().map(|&v| (v, Phase::Outside)).collect(),
        }]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        for (&vehicle, &phase) in &state.phases {
            match phase {
                Phase::Outside => actions.push(Action::Enter(vehicle)),
                Phase::OnRoad => {
                    if state.road.positions[&vehicle].segment < SEGMENTS {
                        actions.push(Action::Advance(vehicle));
                    }
                    actions.push(Action::Exit(vehicle));
                }
                Phase::Waiting | Phase::Left => {}
            }
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        let mut next = state.clone();
        match action {
            Action::Enter(vehicle) => {
                next.road.submit(vehicle, Move::Enter);
                next.phases.insert(vehicle, Phase::Waiting);
            }
            Action::Advance(vehicle) => {
                let from = *next.road.positions.get(&vehicle)?;
                next.road.submit(vehicle, Move::Advance { from });
                next.phases.insert(vehicle, Phase::Waiting);
            }
            Action::Exit(vehicle) => {
                next.road.exit(vehicle);
                next.phases.insert(vehicle, Phase::Left);
            }
        }

        next.road.resolve();
        for (vehicle, phase) in next.phases.iter_mut() {
            if *phase == Phase::Waiting && !next.road.is_queued(*vehicle) {
                *phase = Phase::OnRoad;
            }
        }
        Some(next)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("lanes are exclusive", |_, s: &State| {
                s.road.grid_matches_positions()
            }),
            Property::always("no free lane while someone waits for it", |_, s: &State| {
                s.road.work_conserving()
            }),
            Property::always("grants follow arrival order", |_, s: &State| {
                s.road.grants_in_arrival_order()
            }),
            Property::always("waiting advances keep their cell", |_, s: &State| {
                s.road.queues.iter().flatten().all(|request| match request.movement {
                    Move::Enter => !s.road.positions.contains_key(&request.vehicle),
                    Move::Advance { from } => s.road.positions.get(&request.vehicle) == Some(&from),
                })
            }),
            Property::sometimes("one exit serves every segment", |_, s: &State| {
                s.road.last_grants.len() == SEGMENTS as usize
            }),
            Property::sometimes("everybody leaves", |_, s: &State| {
                s.phases.values().all(|phase| *phase == Phase::Left)
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
            println!("Exploring cascade state space on {address}.");
            CascadeModel
                .checker()
                .threads(num_cpus::get())
                .timeout(Duration::from_secs(60))
                .serve(address);
        }
        Some("check") | None => {
            println!("Model checking lane grants and the cascade.");
            CascadeModel
                .checker()
                .threads(num_cpus::get())
                .timeout(Duration::from_secs(60))
                .spawn_dfs()
                .report(&mut WriteReporter::new(&mut std::io::stdout()));
        }
        _ => {
            println!("USAGE:");
            println!("  cascade_machine check");
            println!("  cascade_machine explore [ADDRESS]");
        }
    }

    Ok(())
}
