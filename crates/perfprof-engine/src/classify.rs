//! Pure classification of one pair's measurements against its SLO.

use perfprof_core::{MeasurementPoint, ProfileStatus};

/// Outcome for a single pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: ProfileStatus,
    pub max_throughput_rps: f32,
}

impl Classification {
    fn zero(status: ProfileStatus) -> Self {
        Self {
            status,
            max_throughput_rps: 0.0,
        }
    }

    fn at(status: ProfileStatus, max_throughput_rps: f32) -> Self {
        Self {
            status,
            max_throughput_rps,
        }
    }
}

/// Classify `points` against a TPOT ceiling of `slo_ms`.
///
/// Sorts `points` in place, ascending by throughput; the sort is stable so
/// equal-throughput points keep their fetch order. Comparisons are exact
/// (no epsilon). When several adjacent pairs enclose the SLO, the first one
/// in ascending-throughput order is used.
pub fn classify(points: &mut [MeasurementPoint], slo_ms: f32) -> Classification {
    points.sort_by(|a, b| sort_key(a.throughput_rps).total_cmp(&sort_key(b.throughput_rps)));

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Classification::zero(ProfileStatus::NoDataFound);
    };

    if slo_ms < first.latency_tpot_ms {
        return Classification::zero(ProfileStatus::SloUnattainable);
    }

    // Covers the single-point case: nothing above to interpolate against.
    if slo_ms >= last.latency_tpot_ms {
        return Classification::at(ProfileStatus::OkUsingHighestRate, last.throughput_rps);
    }

    for window in points.windows(2) {
        let (p1, p2) = (&window[0], &window[1]);
        if slo_ms >= p1.latency_tpot_ms && slo_ms < p2.latency_tpot_ms {
            return Classification::at(ProfileStatus::Ok, interpolate(p1, p2, slo_ms));
        }
    }

    if slo_ms == last.latency_tpot_ms {
        return Classification::at(ProfileStatus::Ok, last.throughput_rps);
    }

    // Only reachable with NaN latencies or SLO.
    Classification::zero(ProfileStatus::InternalError)
}

/// Total order on throughput that still treats `-0.0` and `0.0` as equal.
fn sort_key(rate: f32) -> f32 {
    if rate == 0.0 { 0.0 } else { rate }
}

/// Linear interpolation of throughput over latency between two points.
fn interpolate(p1: &MeasurementPoint, p2: &MeasurementPoint, slo_ms: f32) -> f32 {
    let (r1, t1) = (p1.throughput_rps, p1.latency_tpot_ms);
    let (r2, t2) = (p2.throughput_rps, p2.latency_tpot_ms);

    if t2 - t1 == 0.0 {
        r1
    } else {
        r1 + (slo_ms - t1) * (r2 - r1) / (t2 - t1)
    }
}
