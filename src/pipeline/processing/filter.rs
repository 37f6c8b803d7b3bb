//! Selection of elements that still need an elevation, and the alpine-hut
//! priority split. Everything here is a pure function of its input.

use crate::constants::{ACCOMMODATION_TYPES, ALPINE_HUT, ELE_TAG, RAILWAY_TAG, RAILWAY_TYPES, TOURISM_TAG};
use crate::domain::{Category, CategoryMap, Element, RawExtract};

pub fn has_elevation(element: &Element) -> bool {
    element.tags.contains_key(ELE_TAG)
}

pub fn is_alpine_hut(element: &Element) -> bool {
    element.tag(TOURISM_TAG) == Some(ALPINE_HUT)
}

/// Classify an element by its tags; `None` for anything outside the three classes
pub fn categorize(element: &Element) -> Option<Category> {
    if is_alpine_hut(element) {
        return Some(Category::AlpineHuts);
    }
    if let Some(railway) = element.tag(RAILWAY_TAG) {
        if RAILWAY_TYPES.contains(&railway) {
            return Some(Category::TrainStations);
        }
    }
    match element.tag(TOURISM_TAG) {
        Some(tourism) if ACCOMMODATION_TYPES.contains(&tourism) => {
            Some(Category::OtherAccommodations)
        }
        _ => None,
    }
}

/// Keep elements without an `ele` tag that have a coordinate to look up.
/// Elements without a coordinate can never be enriched and are dropped here.
pub fn filter_missing_elevation(elements: &[Element]) -> Vec<Element> {
    elements
        .iter()
        .filter(|element| !has_elevation(element) && element.coordinates().is_some())
        .cloned()
        .collect()
}

/// Split into (alpine huts, everything else), keeping input order in both
pub fn prioritize(elements: Vec<Element>) -> (Vec<Element>, Vec<Element>) {
    elements.into_iter().partition(is_alpine_hut)
}

/// Train stations go through the missing-elevation filter only; accommodations
/// are filtered and then split into alpine huts and the rest.
pub fn filter_all(raw: &RawExtract) -> CategoryMap<Vec<Element>> {
    let train_stations = filter_missing_elevation(&raw.train_stations);
    let (alpine_huts, other_accommodations) =
        prioritize(filter_missing_elevation(&raw.accommodations));

    CategoryMap {
        train_stations,
        alpine_huts,
        other_accommodations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    fn node(id: i64) -> Element {
        Element::point(id, Some(Coordinates::new(45.0, 25.0)))
    }

    #[test]
    fn test_filter_drops_tagged_and_coordinate_less_elements() {
        let elements = vec![
            node(1).with_tag("railway", "station"),
            node(2).with_tag("railway", "station").with_tag("ele", "300"),
            Element::point(3, None).with_tag("railway", "halt"),
            Element::area(4, None).with_tag("tourism", "hotel"),
            Element::area(5, Some(Coordinates::new(46.0, 24.0))).with_tag("tourism", "hotel"),
        ];

        let kept: Vec<i64> = filter_missing_elevation(&elements)
            .iter()
            .map(|e| e.id)
            .collect();

        assert_eq!(kept, vec![1, 5]);
    }

    #[test]
    fn test_prioritize_is_a_stable_partition() {
        let elements = vec![
            node(1).with_tag("tourism", "hotel"),
            node(2).with_tag("tourism", "alpine_hut"),
            node(3).with_tag("tourism", "chalet"),
            node(4).with_tag("tourism", "alpine_hut"),
            node(5),
        ];

        let (huts, rest) = prioritize(elements.clone());

        assert_eq!(huts.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(rest.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(huts.len() + rest.len(), elements.len());
    }

    #[test]
    fn test_filter_all_routes_categories() {
        let raw = RawExtract {
            train_stations: vec![
                node(10).with_tag("railway", "station"),
                node(11).with_tag("railway", "halt").with_tag("ele", "120"),
            ],
            accommodations: vec![
                node(20).with_tag("tourism", "alpine_hut"),
                node(21).with_tag("tourism", "guest_house"),
                node(22).with_tag("tourism", "alpine_hut").with_tag("ele", "1800"),
            ],
        };

        let filtered = filter_all(&raw);

        assert_eq!(filtered.train_stations.iter().map(|e| e.id).collect::<Vec<_>>(), vec![10]);
        assert_eq!(filtered.alpine_huts.iter().map(|e| e.id).collect::<Vec<_>>(), vec![20]);
        assert_eq!(
            filtered.other_accommodations.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![21]
        );
    }

    #[test]
    fn test_filter_all_is_deterministic() {
        let raw = RawExtract {
            train_stations: vec![node(1).with_tag("railway", "station")],
            accommodations: vec![node(2).with_tag("tourism", "alpine_hut")],
        };
        assert_eq!(filter_all(&raw), filter_all(&raw));
    }

    #[test]
    fn test_categorize() {
        assert_eq!(
            categorize(&node(1).with_tag("tourism", "alpine_hut")),
            Some(Category::AlpineHuts)
        );
        assert_eq!(
            categorize(&node(2).with_tag("railway", "halt")),
            Some(Category::TrainStations)
        );
        assert_eq!(
            categorize(&node(3).with_tag("tourism", "motel")),
            Some(Category::OtherAccommodations)
        );
        assert_eq!(categorize(&node(4).with_tag("tourism", "museum")), None);
        assert_eq!(categorize(&node(5)), None);
    }
}
