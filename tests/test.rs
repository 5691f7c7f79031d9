use chrono::{TimeZone, Utc};
use idlespot::{
    cluster,
    geo::{equatorial_degrees, great_circle_distance},
    Cluster, ClusterConfig, Coord, EventWindow, HotspotClusterer, HotspotSink, IdleEvent,
    IdleSpotError, IdlingReportPage, JsonSink, KmlFile, TextSink, DEFAULT_HISTORY_HOURS,
    DEFAULT_RADIUS_MILES, DEFAULT_TOP_K, EARTH_RADIUS_MILES,
};
use std::collections::HashSet;

/*-------------------------------------------------------------------------------------------------
 *                                         Helpers
 *-----------------------------------------------------------------------------------------------*/
fn event(id: &str, vehicle: &str, lat: f64, lon: f64) -> IdleEvent {
    IdleEvent::new(
        id,
        vehicle,
        lat,
        lon,
        300,
        Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap(),
    )
}

/// Degrees of longitude along the equator per mile.
fn mile() -> f64 {
    equatorial_degrees(1.0, EARTH_RADIUS_MILES)
}

/// A group of `n` events packed within a fraction of a mile of (lat, lon).
fn group(prefix: &str, n: usize, lat: f64, lon: f64) -> Vec<IdleEvent> {
    (0..n)
        .map(|i| {
            event(
                &format!("{}{}", prefix, i),
                &format!("{}-truck-{}", prefix, i % 2),
                lat + 0.001 * i as f64,
                lon,
            )
        })
        .collect()
}

fn ids(clust: &Cluster) -> Vec<&str> {
    clust.members().iter().map(|evt| evt.id.as_str()).collect()
}

/*-------------------------------------------------------------------------------------------------
 *                                    Clustering tests
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_empty_input() {
    let clusters = cluster(vec![], DEFAULT_RADIUS_MILES, DEFAULT_TOP_K).unwrap();
    assert!(clusters.is_empty());

    let clusters = cluster(vec![], 0.1, 1).unwrap();
    assert!(clusters.is_empty());
}

#[test]
fn test_single_event() {
    let clusters = cluster(vec![event("a", "V1", 10.0, 10.0)], 2.0, 5).unwrap();

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].total_events(), 1);
    assert_eq!(clusters[0].total_duration_seconds(), 300);
    assert!(clusters[0]
        .centroid()
        .is_close(Coord { lat: 10.0, lon: 10.0 }, 1.0e-12));
}

#[test]
fn test_every_event_in_exactly_one_cluster() {
    let mut events = group("a", 4, 45.0, -120.0);
    events.extend(group("b", 3, 46.0, -120.0));
    events.extend(group("c", 6, 45.0, -119.0));
    events.push(event("lonely", "V9", 30.0, -100.0));
    events.extend(group("d", 2, 45.0, -120.0));

    let all_ids: HashSet<String> = events.iter().map(|evt| evt.id.clone()).collect();
    let num_events = events.len();

    let clusterer = HotspotClusterer::new(ClusterConfig::default()).unwrap();
    let clusters = clusterer.cluster_all(events).unwrap();

    let total: usize = clusters.iter().map(Cluster::total_events).sum();
    assert_eq!(total, num_events);

    let mut seen = HashSet::new();
    for clust in &clusters {
        for id in ids(clust) {
            assert!(seen.insert(id.to_owned()), "{} is in more than one cluster", id);
        }
    }
    assert_eq!(seen, all_ids);

    // The late "d" events land back in the first cluster.
    assert_eq!(clusters.len(), 4);
    assert_eq!(clusters[0].total_events(), 6);
}

#[test]
fn test_sorted_descending_with_stable_ties() {
    // Discovery order: a(3), b(5), c(1), d(4), e(6), f(2), g(5)
    let mut events = vec![];
    let sizes = [("a", 3), ("b", 5), ("c", 1), ("d", 4), ("e", 6), ("f", 2), ("g", 5)];
    for (idx, (prefix, n)) in sizes.iter().enumerate() {
        events.extend(group(prefix, *n, 10.0 + idx as f64, 10.0));
    }

    let clusters = cluster(events, 2.0, 10).unwrap();
    let counts: Vec<usize> = clusters.iter().map(Cluster::total_events).collect();
    assert_eq!(counts, vec![6, 5, 5, 4, 3, 2, 1]);

    // b was discovered before g.
    assert_eq!(clusters[1].members()[0].id, "b0");
    assert_eq!(clusters[2].members()[0].id, "g0");

    for pair in clusters.windows(2) {
        assert!(pair[0].total_events() >= pair[1].total_events());
    }
}

#[test]
fn test_top_k_limits_output() {
    let mut events = group("big", 5, 40.0, -105.0);
    events.extend(group("small", 2, 41.0, -105.0));

    let clusters = cluster(events.clone(), 2.0, 5).unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].total_events(), 5);
    assert_eq!(clusters[1].total_events(), 2);

    let clusters = cluster(events, 2.0, 1).unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].total_events(), 5);
    assert_eq!(clusters[0].members()[0].id, "big0");
}

#[test]
fn test_exact_radius_is_included() {
    let first = event("a", "V1", 0.0, 0.0);
    let second = event("b", "V1", 0.0, 2.0 * mile());

    // Use the computed separation as the radius so the boundary is hit exactly.
    let radius = great_circle_distance(second.coord, first.coord, EARTH_RADIUS_MILES);

    let clusterer = HotspotClusterer::new(ClusterConfig {
        radius_miles: radius,
        ..ClusterConfig::default()
    })
    .unwrap();

    let clusters = clusterer.cluster_all(vec![first.clone(), second.clone()]).unwrap();
    assert_eq!(clusters.len(), 1);

    // A third event just beyond the radius from the merged centroid starts a new cluster.
    let centroid = clusters[0].centroid();
    let third = event("c", "V2", 0.0, centroid.lon + 2.0 * mile() * 1.0001);
    assert!(clusters[0].distance_to(third.coord, EARTH_RADIUS_MILES) > radius);

    let clusters = clusterer.cluster_all(vec![first, second, third]).unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(ids(&clusters[0]), vec!["a", "b"]);
    assert_eq!(ids(&clusters[1]), vec!["c"]);
}

#[test]
fn test_centroid_is_midpoint() {
    let delta = 2.0 * mile();
    let clusters = cluster(
        vec![event("a", "V1", 0.0, 0.0), event("b", "V1", 0.0, delta)],
        2.5,
        DEFAULT_TOP_K,
    )
    .unwrap();

    assert_eq!(clusters.len(), 1);
    assert!(clusters[0].centroid().is_close(
        Coord {
            lat: 0.0,
            lon: delta / 2.0
        },
        1.0e-12
    ));
}

#[test]
fn test_clustering_depends_on_order() {
    // a-b are 1.4 miles apart, b-c 1.6 miles, and a-c 3 miles.
    let a = event("a", "V1", 0.0, 0.0);
    let b = event("b", "V1", 0.0, 1.4 * mile());
    let c = event("c", "V1", 0.0, 3.0 * mile());

    // a then c first: they can't merge, then b is in range of both and joins the nearer a.
    let clusters = cluster(vec![a.clone(), c.clone(), b.clone()], 2.0, 5).unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(ids(&clusters[0]), vec!["a", "b"]);

    // b first: a joins, the centroid moves 0.7 miles toward a, and c is too far.
    let clusters = cluster(vec![b, a, c], 2.0, 5).unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(ids(&clusters[0]), vec!["b", "a"]);
    assert_eq!(ids(&clusters[1]), vec!["c"]);
}

#[test]
fn test_invalid_input() {
    let good = || vec![event("a", "V1", 45.0, -120.0)];

    assert!(matches!(
        cluster(good(), 0.0, 5),
        Err(IdleSpotError::InvalidInput(_))
    ));
    assert!(matches!(
        cluster(good(), -2.0, 5),
        Err(IdleSpotError::InvalidInput(_))
    ));
    assert!(matches!(
        cluster(good(), 2.0, 0),
        Err(IdleSpotError::InvalidInput(_))
    ));
    assert!(matches!(
        cluster(vec![event("x", "V1", 45.0, 181.0)], 2.0, 5),
        Err(IdleSpotError::InvalidInput(_))
    ));
    assert!(matches!(
        cluster(vec![event("x", "V1", -91.0, 0.0)], 2.0, 5),
        Err(IdleSpotError::InvalidInput(_))
    ));
}

/*-------------------------------------------------------------------------------------------------
 *                                  Idling report tests
 *-----------------------------------------------------------------------------------------------*/
const PAGE: &str = r#"{
  "data": [
    {
      "vehicle": {"id": "281474977075805", "name": "Truck 12"},
      "address": {"latitude": 37.7749, "longitude": -122.4194, "formattedAddress": "Market St"},
      "startTime": "2022-06-01T10:00:00Z",
      "durationMs": 900000
    },
    {
      "vehicle": {"name": "Truck 7"},
      "address": {"latitude": 37.7751, "longitude": -122.4190},
      "startTime": "2022-06-01T02:30:00Z",
      "durationMs": 1500
    }
  ],
  "pagination": {"endCursor": "next-page", "hasNextPage": true}
}"#;

#[test]
fn test_parse_idling_report_page() {
    let page = IdlingReportPage::from_json(PAGE).unwrap();
    assert_eq!(page.next_cursor(), Some("next-page"));

    let events = page.into_events();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].id, "281474977075805@2022-06-01T10:00:00+00:00");
    assert_eq!(events[0].vehicle, "Truck 12");
    assert_eq!(events[0].duration_seconds, 900);
    assert!(events[0]
        .coord
        .is_close(Coord { lat: 37.7749, lon: -122.4194 }, 1.0e-12));

    assert_eq!(events[1].id, "Truck 7@2022-06-01T02:30:00+00:00");
    assert_eq!(events[1].duration_seconds, 1);

    let rdr = PAGE.as_bytes();
    let page = IdlingReportPage::from_reader(rdr).unwrap();
    assert_eq!(page.data.len(), 2);
}

#[test]
fn test_bad_page_is_an_error() {
    assert!(IdlingReportPage::from_json("not json").is_err());
    assert!(IdlingReportPage::from_json(r#"{"data": [{"vehicle": {}}]}"#).is_err());
}

#[test]
fn test_window_filters_events() {
    let mut events = IdlingReportPage::from_json(PAGE).unwrap().into_events();

    let end = Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap();
    let window = EventWindow::past_hours(end, DEFAULT_HISTORY_HOURS).unwrap();
    window.retain_window(&mut events);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].vehicle, "Truck 12");
}

#[test]
fn test_window_out_of_range_is_invalid_input() {
    let end = Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap();

    assert!(EventWindow::past_hours(end, 3_000_000_000).is_err());
    assert!(EventWindow::past_hours(end, 0).is_err());
}

/*-------------------------------------------------------------------------------------------------
 *                                    Reporting tests
 *-----------------------------------------------------------------------------------------------*/
fn sample_hotspots() -> Vec<Cluster> {
    let mut events = group("a", 3, 45.0, -120.0);
    events.extend(group("b", 1, 46.0, -120.0));
    cluster(events, 2.0, 5).unwrap()
}

#[test]
fn test_text_sink() {
    let hotspots = sample_hotspots();

    let mut buf: Vec<u8> = vec![];
    TextSink(&mut buf).deliver(&hotspots).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.starts_with("Top 2 idling clusters:\n\n"));
    assert!(text.contains("1. (45.001000, -120.000000): 3 event(s) across 2 vehicle(s)"));
    assert!(text.contains("2. (46.000000, -120.000000): 1 event(s) across 1 vehicle(s)"));

    let mut buf: Vec<u8> = vec![];
    TextSink(&mut buf).deliver(&[]).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "No idling clusters found.\n");
}

#[test]
fn test_json_sink() {
    let hotspots = sample_hotspots();

    let mut buf: Vec<u8> = vec![];
    JsonSink(&mut buf).deliver(&hotspots).unwrap();

    let payload: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .starts_with("Top 2 idling clusters"));

    let first = &payload["hotspots"][0];
    assert_eq!(first["rank"], 1);
    assert_eq!(first["total_events"], 3);
    assert_eq!(first["total_duration_seconds"], 900);
    assert_eq!(first["vehicles"], 2);
    assert_eq!(first["representative_ids"][0], "a0");
    assert_eq!(payload["hotspots"][1]["rank"], 2);
}

#[test]
fn test_kml_sink() {
    let hotspots = sample_hotspots();

    let mut buf: Vec<u8> = vec![];
    {
        let mut kml = KmlFile::from_writer(&mut buf).unwrap();
        kml.deliver(&hotspots).unwrap();
    }
    let kml = String::from_utf8(buf).unwrap();

    assert!(kml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(kml.trim_end().ends_with("</kml>"));
    assert_eq!(kml.matches("<Placemark>").count(), 2);
    assert_eq!(kml.matches("</Placemark>").count(), 2);
    assert!(kml.contains("<name>1. 3 event(s)</name>"));
    assert!(kml.contains("<begin>2022-06-01T12:00:00.000Z</begin>"));
    assert!(kml.contains("<coordinates>-120,46,0</coordinates>"));
    assert!(kml.contains("event(s)</li>"));
}
