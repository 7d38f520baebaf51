//! Speciation groups similar genomes into sub-populations,
//! which then evolve mostly in isolation. Groups are found by
//! k-medoids clustering (PAM) over genetic distance.

use rand::seq::SliceRandom;
use rand::Rng;

use std::num::NonZeroUsize;

/// A k-medoids partitioner, searching medoids by
/// repeatedly swapping medoids with other members.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KMedoids {
    cluster_count: NonZeroUsize,
    max_tries: usize,
}

/// The result of a [`KMedoids`] partition.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    /// Item indices of each cluster. The medoid comes first.
    /// Clusters are empty when there are fewer items than
    /// clusters.
    pub clusters: Vec<Vec<usize>>,
    /// Medoid of each non-empty cluster.
    pub medoids: Vec<usize>,
    /// Sum of distances from every item to its medoid.
    pub cost: f32,
    /// Whether the medoids stopped changing before
    /// running out of tries.
    pub converged: bool,
}

impl Partition {
    /// Returns the cluster of every item.
    ///
    /// # Examples
    /// ```
    /// use neatfit::speciation::Partition;
    ///
    /// let partition = Partition {
    ///     clusters: vec![vec![2, 0], vec![1]],
    ///     medoids: vec![2, 1],
    ///     cost: 0.0,
    ///     converged: true,
    /// };
    /// assert_eq!(partition.assignments(3), vec![0, 1, 0]);
    /// ```
    pub fn assignments(&self, item_count: usize) -> Vec<usize> {
        let mut assignments = vec![0; item_count];
        for (cluster, members) in self.clusters.iter().enumerate() {
            for member in members {
                assignments[*member] = cluster;
            }
        }
        assignments
    }
}

impl KMedoids {
    /// Default bound on medoid search passes.
    pub const MAX_TRIES: usize = 100;

    pub fn new(cluster_count: NonZeroUsize) -> KMedoids {
        KMedoids {
            cluster_count,
            max_tries: Self::MAX_TRIES,
        }
    }

    /// Bounds the number of medoid search passes.
    pub fn with_max_tries(self, max_tries: usize) -> KMedoids {
        KMedoids { max_tries, ..self }
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count.get()
    }

    /// Partitions `items` into clusters by the dissimilarity
    /// `distance`, which is evaluated once per pair and
    /// assumed symmetric.
    ///
    /// Initial medoids are a random selection of distinct
    /// items. Each pass tries swapping every medoid with every
    /// other item, keeping swaps that strictly lower the total
    /// cost, until a pass changes nothing or the tries run out.
    /// Non-convergence is not an error.
    ///
    /// # Examples
    /// ```
    /// use neatfit::speciation::KMedoids;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let points = [0.0f32, 0.1, 0.2, 10.0, 10.1];
    /// let partition = KMedoids::new(NonZeroUsize::new(2).unwrap())
    ///     .partition(&points, |a, b| (a - b).abs(), &mut StdRng::seed_from_u64(0));
    ///
    /// let assignments = partition.assignments(points.len());
    /// assert_eq!(assignments[0], assignments[2]);
    /// assert_eq!(assignments[3], assignments[4]);
    /// assert_ne!(assignments[0], assignments[3]);
    /// ```
    pub fn partition<T, F, R>(&self, items: &[T], mut distance: F, rng: &mut R) -> Partition
    where
        F: FnMut(&T, &T) -> f32,
        R: Rng + ?Sized,
    {
        let n = items.len();
        let mut table = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..i {
                let d = distance(&items[i], &items[j]);
                table[i * n + j] = d;
                table[j * n + i] = d;
            }
        }
        let table = DistanceTable { table, n };

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let mut others = order.split_off(self.cluster_count().min(n));
        let mut medoids = order;

        let mut converged = false;
        for _ in 0..self.max_tries {
            let previous = medoids.clone();
            let mut best_cost = table.assign(&medoids, &others, self.cluster_count()).1;

            for m in 0..medoids.len() {
                for o in 0..others.len() {
                    std::mem::swap(&mut medoids[m], &mut others[o]);
                    let cost = table.assign(&medoids, &others, self.cluster_count()).1;
                    if cost < best_cost {
                        best_cost = cost;
                    } else {
                        std::mem::swap(&mut medoids[m], &mut others[o]);
                    }
                }
            }

            if medoids == previous {
                converged = true;
                break;
            }
        }
        if !converged {
            log::trace!("k-medoids did not converge after {} tries", self.max_tries);
        }

        let (clusters, cost) = table.assign(&medoids, &others, self.cluster_count());
        Partition {
            clusters,
            medoids,
            cost,
            converged,
        }
    }
}

struct DistanceTable {
    table: Vec<f32>,
    n: usize,
}

impl DistanceTable {
    fn get(&self, i: usize, j: usize) -> f32 {
        self.table[i * self.n + j]
    }

    /// Assigns every non-medoid to its closest medoid, the
    /// earliest one on ties. Returns the clusters and the
    /// total distance to medoids.
    fn assign(&self, medoids: &[usize], others: &[usize], cluster_count: usize) -> (Vec<Vec<usize>>, f32) {
        let mut clusters: Vec<Vec<usize>> = (0..cluster_count)
            .map(|c| medoids.get(c).map(|m| vec![*m]).unwrap_or_default())
            .collect();
        let mut cost = 0.0;
        for &item in others {
            let mut closest = 0;
            let mut closest_distance = self.get(item, medoids[0]);
            for (c, &medoid) in medoids.iter().enumerate().skip(1) {
                let d = self.get(item, medoid);
                if d < closest_distance {
                    closest = c;
                    closest_distance = d;
                }
            }
            clusters[closest].push(item);
            cost += closest_distance;
        }
        (clusters, cost)
    }
}
