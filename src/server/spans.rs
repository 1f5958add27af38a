use tracing::Span;

use crate::core::VehicleId;

pub(super) fn request_span(op: &'static str, vehicle: &VehicleId) -> Span {
    tracing::debug_span!("highway_request", op, vehicle = %vehicle)
}
