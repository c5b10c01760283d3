//! Deterministic k-means over 2-D points.
//!
//! Initial centroids are picked evenly from the sorted distinct points, so
//! the same input always yields the same clusters. Lloyd iterations then run
//! until assignments stop changing.

const MAX_ITERATIONS: usize = 300;

pub type Point = [f64; 2];

/// Fitted clusters: centroids plus the cluster index of every input point.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<Point>,
    pub labels: Vec<usize>,
}

/// Cluster `points` into at most `k` groups.
///
/// `k` shrinks to the number of distinct points. Clusters that end up empty
/// are dropped and labels renumbered. No points (or `k == 0`) gives no
/// clusters.
pub fn fit(points: &[Point], k: usize) -> Clustering {
    let mut distinct: Vec<Point> = points.to_vec();
    distinct.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    distinct.dedup();

    let k = k.min(distinct.len());
    if k == 0 {
        return Clustering {
            centroids: Vec::new(),
            labels: Vec::new(),
        };
    }

    // Midpoint of each of k equal slices of the sorted points.
    let n = distinct.len();
    let mut centroids: Vec<Point> = (0..k).map(|i| distinct[(2 * i + 1) * n / (2 * k)]).collect();
    let mut labels = assign(points, &centroids);

    for _ in 0..MAX_ITERATIONS {
        centroids = update(points, &labels, &centroids);
        let next = assign(points, &centroids);
        if next == labels {
            break;
        }
        labels = next;
    }

    drop_empty(centroids, labels)
}

/// Index of the centroid closest to `point`. Ties go to the lower index.
pub fn nearest(centroids: &[Point], point: Point) -> Option<usize> {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance2(a, &point).total_cmp(&distance2(b, &point)))
        .map(|(i, _)| i)
}

fn distance2(a: &Point, b: &Point) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

fn assign(points: &[Point], centroids: &[Point]) -> Vec<usize> {
    points
        .iter()
        .map(|p| nearest(centroids, *p).unwrap_or(0))
        .collect()
}

/// Mean of each cluster's members; an empty cluster keeps its centroid.
fn update(points: &[Point], labels: &[usize], centroids: &[Point]) -> Vec<Point> {
    let mut sums = vec![([0.0, 0.0], 0usize); centroids.len()];
    for (p, &label) in points.iter().zip(labels) {
        let entry = &mut sums[label];
        entry.0[0] += p[0];
        entry.0[1] += p[1];
        entry.1 += 1;
    }
    sums.iter()
        .zip(centroids)
        .map(|((sum, count), old)| {
            if *count == 0 {
                *old
            } else {
                [sum[0] / *count as f64, sum[1] / *count as f64]
            }
        })
        .collect()
}

fn drop_empty(centroids: Vec<Point>, labels: Vec<usize>) -> Clustering {
    let mut used = vec![false; centroids.len()];
    for &label in &labels {
        used[label] = true;
    }
    let mut remap = vec![0; centroids.len()];
    let mut kept = Vec::with_capacity(centroids.len());
    for (i, centroid) in centroids.into_iter().enumerate() {
        if used[i] {
            remap[i] = kept.len();
            kept.push(centroid);
        }
    }
    Clustering {
        centroids: kept,
        labels: labels.into_iter().map(|l| remap[l]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_obvious_groups() {
        let points = [
            [10.0, 1.0],
            [11.0, 1.5],
            [10.5, 0.5],
            [100.0, 10.0],
            [101.0, 11.0],
            [500.0, 50.0],
        ];
        let clustering = fit(&points, 3);
        assert_eq!(clustering.centroids.len(), 3);

        let l = &clustering.labels;
        assert_eq!(l[0], l[1]);
        assert_eq!(l[1], l[2]);
        assert_eq!(l[3], l[4]);
        assert_ne!(l[0], l[3]);
        assert_ne!(l[3], l[5]);
        assert_ne!(l[0], l[5]);

        let low = clustering.centroids[l[0]];
        assert!((low[0] - 10.5).abs() < 1e-9);
        assert!((low[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn k_shrinks_to_distinct_points() {
        let points = [[1.0, 1.0], [1.0, 1.0], [2.0, 2.0]];
        let clustering = fit(&points, 3);
        assert_eq!(clustering.centroids.len(), 2);
        assert_eq!(clustering.labels, vec![0, 0, 1]);
    }

    #[test]
    fn empty_input_has_no_clusters() {
        let clustering = fit(&[], 3);
        assert!(clustering.centroids.is_empty());
        assert_eq!(nearest(&clustering.centroids, [1.0, 1.0]), None);
    }

    #[test]
    fn deterministic() {
        let points: Vec<Point> = (0..40).map(|i| [(i * 7 % 13) as f64, (i % 5) as f64]).collect();
        assert_eq!(fit(&points, 3), fit(&points, 3));
    }

    #[test]
    fn nearest_picks_closest() {
        let centroids = [[0.0, 0.0], [10.0, 10.0]];
        assert_eq!(nearest(&centroids, [1.0, 2.0]), Some(0));
        assert_eq!(nearest(&centroids, [8.0, 9.0]), Some(1));
    }
}
