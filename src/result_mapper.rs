use std::collections::BTreeMap;

use crate::models::datasource::{Point, TimeSeries};
use crate::models::kairos::{GroupInfo, MetricQueryResult, MetricQueryResults};

/// Flatten one query's result groups into series, one per group, in arrival order.
pub fn map_results(results: &MetricQueryResults) -> Vec<TimeSeries> {
    results.results.iter().map(map_result).collect()
}

fn map_result(result: &MetricQueryResult) -> TimeSeries {
    TimeSeries {
        name: result.name.clone(),
        tags: build_group_tags(&result.group_info),
        points: result
            .values
            .iter()
            .map(|dp| Point {
                timestamp: dp.0,
                value: dp.1,
            })
            .collect(),
    }
}

/// Union of every group descriptor's resolved tags. Later descriptors win on key clashes.
pub fn build_group_tags(group_info: &[GroupInfo]) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for info in group_info {
        for (k, v) in &info.group {
            tags.insert(k.clone(), v.clone());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kairos::DataPoint;

    fn group(host: &str, dc: &str) -> GroupInfo {
        GroupInfo {
            kind: "tag".to_string(),
            requested_tag_keys: vec!["host".to_string(), "pool".to_string()],
            group: BTreeMap::from([
                ("host".to_string(), host.to_string()),
                ("data_center".to_string(), dc.to_string()),
            ]),
        }
    }

    #[test]
    fn test_single_series() {
        let results = MetricQueryResults {
            sample_size: 2,
            results: vec![MetricQueryResult {
                name: "MetricA".to_string(),
                group_info: vec![],
                values: vec![DataPoint(1564682818000, 10.5), DataPoint(1564682819000, 8.0)],
            }],
        };

        let series = map_results(&results);
        assert_eq!(
            series,
            vec![TimeSeries {
                name: "MetricA".to_string(),
                tags: BTreeMap::new(),
                points: vec![
                    Point {
                        timestamp: 1564682818000,
                        value: 10.5
                    },
                    Point {
                        timestamp: 1564682819000,
                        value: 8.0
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_grouped_series_are_not_collapsed() {
        let results = MetricQueryResults {
            sample_size: 2,
            results: vec![
                MetricQueryResult {
                    name: "MetricA".to_string(),
                    group_info: vec![group("server1", "dc1")],
                    values: vec![DataPoint(1564682818000, 10.5)],
                },
                MetricQueryResult {
                    name: "MetricA".to_string(),
                    group_info: vec![group("server2", "dc2")],
                    values: vec![DataPoint(1564682818000, 10.5)],
                },
            ],
        };

        let series = map_results(&results);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "MetricA");
        assert_eq!(
            series[0].tags,
            BTreeMap::from([
                ("host".to_string(), "server1".to_string()),
                ("data_center".to_string(), "dc1".to_string()),
            ])
        );
        assert_eq!(
            series[0].points,
            vec![Point {
                timestamp: 1564682818000,
                value: 10.5
            }]
        );
        assert_eq!(series[1].tags["host"], "server2");
        assert_eq!(series[1].tags["data_center"], "dc2");
    }

    #[test]
    fn test_tags_union_across_descriptors() {
        let info = vec![
            GroupInfo {
                kind: "tag".to_string(),
                requested_tag_keys: vec!["host".to_string()],
                group: BTreeMap::from([("host".to_string(), "server1".to_string())]),
            },
            GroupInfo {
                kind: "type".to_string(),
                requested_tag_keys: vec![],
                group: BTreeMap::new(),
            },
            GroupInfo {
                kind: "tag".to_string(),
                requested_tag_keys: vec!["pool".to_string()],
                group: BTreeMap::from([("pool".to_string(), "blue".to_string())]),
            },
        ];

        let tags = build_group_tags(&info);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["host"], "server1");
        assert_eq!(tags["pool"], "blue");
    }

    #[test]
    fn test_points_pass_through_unchanged() {
        let values = vec![
            DataPoint(3000, 0.1 + 0.2),
            DataPoint(1000, f64::MAX),
            DataPoint(2000, -1e-300),
        ];
        let results = MetricQueryResults {
            sample_size: 3,
            results: vec![MetricQueryResult {
                name: "m".to_string(),
                group_info: vec![],
                values: values.clone(),
            }],
        };

        let series = map_results(&results);
        let got: Vec<_> = series[0]
            .points
            .iter()
            .map(|p| (p.timestamp, p.value.to_bits()))
            .collect();
        let want: Vec<_> = values.iter().map(|dp| (dp.0, dp.1.to_bits())).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_empty_result_set() {
        assert!(map_results(&MetricQueryResults::default()).is_empty());
    }
}
