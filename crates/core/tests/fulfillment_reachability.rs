//! Every state reachable through legal transitions has an effective stage

use std::collections::{HashSet, VecDeque};

use quarry::fulfillment::{
    DeliveryMethod, DeliveryStatus, EffectiveStage, FulfillmentChange, FulfillmentState,
    OrderStatus, effective_stage,
};

fn changes() -> Vec<FulfillmentChange> {
    OrderStatus::ALL
        .into_iter()
        .map(FulfillmentChange::Order)
        .chain(DeliveryStatus::ALL.into_iter().map(FulfillmentChange::Delivery))
        .chain([FulfillmentChange::Cancel])
        .collect()
}

fn reachable(method: DeliveryMethod) -> Vec<FulfillmentState> {
    let start = FulfillmentState::placed(method);
    let changes = changes();

    let mut seen = HashSet::from([(start.order(), start.delivery())]);
    let mut queue = VecDeque::from([start]);
    let mut states = Vec::new();

    while let Some(state) = queue.pop_front() {
        states.push(state);

        for change in &changes {
            if let Ok(next) = state.apply(*change)
                && seen.insert((next.order(), next.delivery()))
            {
                queue.push_back(next);
            }
        }
    }

    states
}

#[test]
fn every_reachable_delivery_state_has_a_stage() {
    for state in reachable(DeliveryMethod::StandardDelivery) {
        let stage = effective_stage(state.order(), state.method(), state.delivery());

        assert_eq!(stage, Ok(state.stage()), "state {state:?}");
        assert!(state.delivery().is_some(), "delivery vanished in {state:?}");
    }
}

#[test]
fn every_reachable_pick_up_state_has_a_stage() {
    for state in reachable(DeliveryMethod::PickUp) {
        let stage = effective_stage(state.order(), state.method(), state.delivery());

        assert_eq!(stage, Ok(state.stage()), "state {state:?}");
        assert!(state.delivery().is_none(), "pick-up grew a delivery in {state:?}");
    }
}

#[test]
fn both_methods_can_reach_completed_and_cancelled() {
    for method in [DeliveryMethod::StandardDelivery, DeliveryMethod::PickUp] {
        let stages: HashSet<EffectiveStage> =
            reachable(method).iter().map(FulfillmentState::stage).collect();

        assert!(stages.contains(&EffectiveStage::Completed), "{method} never completes");
        assert!(stages.contains(&EffectiveStage::Cancelled), "{method} never cancels");
    }
}

#[test]
fn rating_eligibility_follows_completed_stage() {
    for method in [DeliveryMethod::StandardDelivery, DeliveryMethod::PickUp] {
        for state in reachable(method) {
            assert_eq!(
                state.is_rating_eligible(),
                state.stage() == EffectiveStage::Completed,
                "state {state:?}"
            );
        }
    }
}

#[test]
fn delivered_never_coexists_with_waiting_payment() {
    let illegal = reachable(DeliveryMethod::StandardDelivery).into_iter().any(|state| {
        state.order() == OrderStatus::WaitingPayment
            && state.delivery() == Some(DeliveryStatus::Delivered)
    });

    assert!(!illegal, "delivery overtook an unpaid order");
}
