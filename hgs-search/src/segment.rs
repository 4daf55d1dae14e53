use hgs_structs::ProblemData;
use ndarray::Array2;
use std::cmp::{max, min};

/// Time window summary of a contiguous visit sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DurationSegment {
    /// total duration including service and waiting
    pub duration: i64,
    /// accumulated time warp
    pub time_warp: i64,
    /// earliest start of the sequence without extra waiting
    pub tw_early: i64,
    /// latest start of the sequence without extra time warp
    pub tw_late: i64,
    pub first: usize,
    pub last: usize,
}

impl DurationSegment {
    #[inline]
    pub fn singleton(data: &ProblemData, location: usize) -> Self {
        Self::with_window(
            location,
            data.service_duration(location),
            data.tw_early(location),
            data.tw_late(location),
        )
    }

    #[inline]
    pub fn with_window(location: usize, service: i64, tw_early: i64, tw_late: i64) -> Self {
        Self {
            duration: service,
            time_warp: 0,
            tw_early,
            tw_late,
            first: location,
            last: location,
        }
    }

    /// Concatenation `s1 ∘ s2`.
    #[inline]
    pub fn merge(durations: &Array2<i64>, s1: &Self, s2: &Self) -> Self {
        let travel = durations[[s1.last, s2.first]];
        let at_second = s1.duration - s1.time_warp + travel;

        let wait = max(s2.tw_early.saturating_sub(at_second).saturating_sub(s1.tw_late), 0);
        let warp = max(s1.tw_early.saturating_add(at_second).saturating_sub(s2.tw_late), 0);

        Self {
            duration: s1.duration + s2.duration + travel + wait,
            time_warp: s1.time_warp + s2.time_warp + warp,
            tw_early: max(s2.tw_early.saturating_sub(at_second), s1.tw_early) - wait,
            tw_late: min(s2.tw_late.saturating_sub(at_second), s1.tw_late).saturating_add(warp),
            first: s1.first,
            last: s2.last,
        }
    }
}

/// Cached route statistics, recomputed by `Route::update`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub distance: i64,
    pub duration: i64,
    pub time_warp: i64,
    pub load: i64,
    pub excess_load: i64,
}

/// Evaluates a full visit sequence, depots included, for one vehicle type.
pub fn route_stats(data: &ProblemData, vehicle_type: usize, locations: &[usize]) -> RouteStats {
    debug_assert!(locations.len() >= 2);
    let vt = &data.vehicle_types()[vehicle_type];
    let distances = data.distance_matrix(vt.profile);
    let durations = data.duration_matrix(vt.profile);

    let depot_segment = |location: usize| {
        DurationSegment::with_window(
            location,
            0,
            max(data.tw_early(location), vt.tw_early),
            min(data.tw_late(location), vt.tw_late),
        )
    };

    let last = locations.len() - 1;
    let mut segment = depot_segment(locations[0]);
    let mut distance = 0;
    let mut load = 0;
    for pos in 1..locations.len() {
        let next = if pos == last {
            depot_segment(locations[pos])
        } else {
            DurationSegment::singleton(data, locations[pos])
        };
        distance += distances[[locations[pos - 1], locations[pos]]];
        load += data.delivery(locations[pos]);
        segment = DurationSegment::merge(durations, &segment, &next);
    }

    RouteStats {
        distance,
        duration: segment.duration,
        time_warp: segment.time_warp,
        load,
        excess_load: max(load - vt.capacity, 0),
    }
}
