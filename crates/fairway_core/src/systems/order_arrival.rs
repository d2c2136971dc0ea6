//! Order arrival: record the order and hand it to dispatch.
//!
//! Arrivals with no subject come from the generator and spawn a fresh order;
//! arrivals targeting an existing entity were injected through the adapter
//! surface and only need logging and a dispatch kick.

use bevy_ecs::prelude::{Commands, Query, Res, ResMut};

use crate::clock::{mins_to_ms, CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::TimeOfDay;
use crate::ecs::{IdSequences, Order, OrderItems, OrderState, OrderTiming};
use crate::scenario::{DispatchTuning, SimulationEndTimeMs};
use crate::systems::spawner::OrderSpawner;
use crate::telemetry::SimTelemetry;

#[allow(clippy::too_many_arguments)]
pub fn order_arrival_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut spawner: ResMut<OrderSpawner>,
    end: Res<SimulationEndTimeMs>,
    tuning: Res<DispatchTuning>,
    mut ids: ResMut<IdSequences>,
    mut telemetry: ResMut<SimTelemetry>,
    orders: Query<&Order>,
) {
    if event.0.kind != EventKind::OrderArrival {
        return;
    }
    let now = clock.now();
    let dispatch_delay_ms = mins_to_ms(tuning.dispatch_aggregation_min);

    match event.0.subject {
        Some(EventSubject::Order(order_entity)) => {
            let Ok(order) = orders.get(order_entity) else {
                return;
            };
            telemetry.orders_placed += 1;
            telemetry.log(
                now,
                "order_arrival",
                Some(order.id),
                None,
                format!("hole={} value={:.2}", order.target_hole, order.total_value),
            );
            clock.schedule_in(
                dispatch_delay_ms,
                EventKind::DispatchOrder,
                Some(EventSubject::Order(order_entity)),
            );
        }
        Some(_) => {}
        None => {
            let arrival_index = spawner.spawned;
            let hole = spawner.draw_hole(arrival_index);
            let items = spawner.draw_items(arrival_index);
            let total_value: f64 = items.iter().map(|i| i.line_value()).sum();
            let id = ids.next_order_id();

            let order_entity = commands
                .spawn((
                    Order {
                        id,
                        state: OrderState::Pending,
                        target_hole: hole,
                        time_of_day: TimeOfDay::from_sim_ms(now),
                        total_value,
                        retry_count: 0,
                        assigned_asset: None,
                        batch_size: 1,
                        delivery_hole: None,
                    },
                    OrderItems(items),
                    OrderTiming {
                        placed_at: now,
                        ..OrderTiming::default()
                    },
                ))
                .id();

            spawner.spawned += 1;
            telemetry.orders_placed += 1;
            telemetry.log(
                now,
                "order_arrival",
                Some(id),
                None,
                format!("hole={hole} value={total_value:.2}"),
            );
            clock.schedule_in(
                dispatch_delay_ms,
                EventKind::DispatchOrder,
                Some(EventSubject::Order(order_entity)),
            );

            if let Some(at) = spawner.next_arrival_ms(now, end.0) {
                clock.schedule_at(at, EventKind::OrderArrival, None);
            }
        }
    }
}
