//! Nearest-neighbor ordering of a courier's stops.
//!
//! Greedy and O(n²), which is fine for the stop counts couriers actually carry
//! (typically under ten). Not an optimal tour.

use crate::geo::{GeoPoint, haversine_km};

/// Order `stops` by repeatedly walking to the closest unvisited one, starting
/// from `start`. Returns indices into `stops`; ties go to the earliest index.
pub fn order_stops(start: &GeoPoint, stops: &[GeoPoint]) -> Vec<usize> {
    let mut route = Vec::with_capacity(stops.len());
    let mut visited = vec![false; stops.len()];
    let mut current = *start;

    while route.len() < stops.len() {
        let mut best: Option<(usize, f64)> = None;

        for (index, stop) in stops.iter().enumerate() {
            if visited[index] {
                continue;
            }
            let distance = haversine_km(&current, stop);
            let closer = match best {
                Some((_, best_distance)) => distance < best_distance,
                None => true,
            };
            if closer {
                best = Some((index, distance));
            }
        }

        let Some((next, _)) = best else {
            break;
        };
        visited[next] = true;
        current = stops[next];
        route.push(next);
    }

    route
}

#[cfg(test)]
mod tests {
    use super::order_stops;
    use crate::geo::GeoPoint;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint { lat, lng }
    }

    #[test]
    fn empty_input_yields_empty_route() {
        let route = order_stops(&point(4.6, -74.08), &[]);
        assert!(route.is_empty());
    }

    #[test]
    fn single_stop_is_returned_as_is() {
        let route = order_stops(&point(4.6, -74.08), &[point(4.7, -74.1)]);
        assert_eq!(route, vec![0]);
    }

    #[test]
    fn route_is_a_permutation_of_the_input() {
        let stops = vec![
            point(4.70, -74.10),
            point(4.61, -74.08),
            point(4.65, -74.05),
            point(4.58, -74.12),
        ];
        let mut route = order_stops(&point(4.60, -74.08), &stops);
        assert_eq!(route.len(), stops.len());
        route.sort_unstable();
        assert_eq!(route, vec![0, 1, 2, 3]);
    }

    #[test]
    fn nearest_stop_comes_first() {
        let stops = vec![
            point(5.50, -74.08), // ~100 km north
            point(4.61, -74.08), // ~1 km north
            point(4.90, -74.08), // ~33 km north
        ];
        let route = order_stops(&point(4.60, -74.08), &stops);
        assert_eq!(route, vec![1, 2, 0]);
    }

    #[test]
    fn ties_break_toward_earlier_input_order() {
        let duplicate = point(4.65, -74.05);
        let route = order_stops(&point(4.60, -74.08), &[duplicate, duplicate]);
        assert_eq!(route, vec![0, 1]);
    }
}
