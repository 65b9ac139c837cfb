//! Social Proof / Diffusion Model
//!
//! Generates a social network, diffuses adoption through it, and tracks how a
//! corpus of testimonials moves a prospect's belief over time.
//!
//! Diffusion is synchronous: every candidate in a period is scored against
//! the adoption state at the *start* of that period, and all new adoptions
//! land together. Adoption is never reversed.

use crate::error::ModelError;
use crate::sampling::{chance, clip01, gaussian, mean, model_rng};
use crate::seed::Seed;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info, warn};

const MODEL: &str = "social_proof";

/// Largest population a network may be generated for.
pub const MAX_POPULATION: usize = 100_000;

/// Candidates adopt when their score exceeds this.
const ADOPTION_THRESHOLD: f64 = 0.6;

/// Herd behavior kicks in above this global adoption rate.
const CONFORMITY_THRESHOLD: f64 = 0.3;

/// Strong ties have at least this multiple of the mean degree.
const STRONG_TIE_FACTOR: f64 = 1.5;

const SMALL_WORLD_HALF_DEGREE: usize = 3;
const SMALL_WORLD_REWIRE: f64 = 0.1;
const SCALE_FREE_M: usize = 3;
const RANDOM_EDGE_P: f64 = 0.1;

// =============================================================================
// NETWORK
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkArchetype {
    #[default]
    SmallWorld,
    ScaleFree,
    Random,
}

/// Undirected graph over nodes `0..n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialNetwork {
    pub archetype: NetworkArchetype,
    adjacency: Vec<BTreeSet<usize>>,
}

impl SocialNetwork {
    /// Generates a network of the given archetype.
    pub fn generate(
        archetype: NetworkArchetype,
        population: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self, ModelError> {
        if population == 0 {
            return Err(ModelError::invalid(MODEL, "population must be positive"));
        }
        if population > MAX_POPULATION {
            return Err(ModelError::invalid(
                MODEL,
                format!("population {} exceeds the maximum of {}", population, MAX_POPULATION),
            ));
        }

        let mut network = Self {
            archetype,
            adjacency: vec![BTreeSet::new(); population],
        };
        match archetype {
            NetworkArchetype::SmallWorld => network.build_small_world(rng),
            NetworkArchetype::ScaleFree => network.build_scale_free(rng),
            NetworkArchetype::Random => network.build_random(rng),
        }

        debug!(
            "Generated {:?} network: {} nodes, {} edges",
            archetype,
            network.node_count(),
            network.edge_count()
        );
        Ok(network)
    }

    /// Builds a network from an explicit edge list. Self-loops and
    /// out-of-range endpoints are ignored.
    pub fn from_edges(population: usize, edges: &[(usize, usize)]) -> Self {
        let mut network = Self {
            archetype: NetworkArchetype::Random,
            adjacency: vec![BTreeSet::new(); population],
        };
        for &(a, b) in edges {
            if a < population && b < population {
                network.connect(a, b);
            }
        }
        network
    }

    fn connect(&mut self, a: usize, b: usize) -> bool {
        if a == b {
            return false;
        }
        let added = self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
        added
    }

    fn disconnect(&mut self, a: usize, b: usize) {
        self.adjacency[a].remove(&b);
        self.adjacency[b].remove(&a);
    }

    /// Watts-Strogatz: ring lattice, then rewire each lattice edge with a
    /// small probability to a node that is not already a neighbor.
    fn build_small_world(&mut self, rng: &mut ChaCha8Rng) {
        let n = self.node_count();
        let half = SMALL_WORLD_HALF_DEGREE.min((n - 1) / 2);

        for i in 0..n {
            for j in 1..=half {
                self.connect(i, (i + j) % n);
            }
        }

        for i in 0..n {
            for j in 1..=half {
                let target = (i + j) % n;
                if !self.adjacency[i].contains(&target) || !chance(rng, SMALL_WORLD_REWIRE) {
                    continue;
                }
                // Already linked to everyone
                if self.adjacency[i].len() + 1 >= n {
                    continue;
                }
                let replacement = loop {
                    let c = rng.gen_range(0..n);
                    if c != i && !self.adjacency[i].contains(&c) {
                        break c;
                    }
                };
                self.disconnect(i, target);
                self.connect(i, replacement);
            }
        }
    }

    /// Barabási-Albert preferential attachment from a small clique.
    fn build_scale_free(&mut self, rng: &mut ChaCha8Rng) {
        let n = self.node_count();
        let seed_nodes = n.min(SCALE_FREE_M + 1);

        // Every endpoint appears once per incident edge
        let mut endpoints: Vec<usize> = Vec::new();
        for a in 0..seed_nodes {
            for b in (a + 1)..seed_nodes {
                self.connect(a, b);
                endpoints.push(a);
                endpoints.push(b);
            }
        }
        let mut connected_nodes = if seed_nodes > 1 { seed_nodes } else { 0 };

        for v in seed_nodes..n {
            let wanted = SCALE_FREE_M.min(v);
            let mut targets = BTreeSet::new();
            while targets.len() < wanted {
                let candidate = if connected_nodes >= wanted {
                    endpoints[rng.gen_range(0..endpoints.len())]
                } else {
                    rng.gen_range(0..v)
                };
                targets.insert(candidate);
            }
            for t in targets {
                if self.adjacency[t].is_empty() {
                    connected_nodes += 1;
                }
                self.connect(v, t);
                endpoints.push(v);
                endpoints.push(t);
            }
            connected_nodes += 1;
        }
    }

    /// Erdős-Rényi G(n, p).
    fn build_random(&mut self, rng: &mut ChaCha8Rng) {
        let n = self.node_count();
        for a in 0..n {
            for b in (a + 1)..n {
                if chance(rng, RANDOM_EDGE_P) {
                    self.connect(a, b);
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn neighbors(&self, node: usize) -> &BTreeSet<usize> {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn average_degree(&self) -> f64 {
        if self.adjacency.is_empty() {
            return 0.0;
        }
        2.0 * self.edge_count() as f64 / self.node_count() as f64
    }

    /// Node label as used in external output.
    pub fn label(node: usize) -> String {
        node.to_string()
    }

    /// Local clustering coefficient; 0 for degree below 2.
    pub fn clustering_coefficient(&self, node: usize) -> f64 {
        let neighbors = &self.adjacency[node];
        let k = neighbors.len();
        if k < 2 {
            return 0.0;
        }
        let links = neighbors
            .iter()
            .map(|a| neighbors.iter().filter(|b| *b > a && self.adjacency[*a].contains(*b)).count())
            .sum::<usize>();
        links as f64 / (k * (k - 1) / 2) as f64
    }

    pub fn average_clustering(&self) -> f64 {
        let values: Vec<f64> = (0..self.node_count())
            .map(|n| self.clustering_coefficient(n))
            .collect();
        mean(&values)
    }

    /// Connected components of the subgraph induced by `members`.
    pub fn components_among(&self, members: &[bool]) -> Vec<usize> {
        let mut seen = vec![false; self.node_count()];
        let mut sizes = Vec::new();

        for start in 0..self.node_count() {
            if !members[start] || seen[start] {
                continue;
            }
            let mut size = 0;
            let mut queue = VecDeque::from([start]);
            seen[start] = true;
            while let Some(node) = queue.pop_front() {
                size += 1;
                for &next in &self.adjacency[node] {
                    if members[next] && !seen[next] {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            sizes.push(size);
        }

        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }
}

// =============================================================================
// DIFFUSION
// =============================================================================

/// Components of one candidate's adoption score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceFactors {
    /// Adopted share of direct neighbors
    pub direct_ratio: f64,

    /// Adopted share of nodes exactly two hops away
    pub indirect_ratio: f64,
    pub herd: f64,
    pub pressure: f64,
    pub appeal: f64,
    pub noise: f64,
}

impl InfluenceFactors {
    pub fn score(&self) -> f64 {
        0.45 * self.direct_ratio
            + 0.15 * self.indirect_ratio
            + self.herd
            + self.pressure
            + 0.25 * self.appeal
            + self.noise
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionEvent {
    pub node: usize,
    pub period: u32,
    pub score: f64,
    pub factors: InfluenceFactors,
}

/// Adoption outcome of a diffusion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionResult {
    /// Adopter count at the start and after each period
    pub adoption_curve: Vec<usize>,
    pub events: Vec<AdoptionEvent>,
    pub adopted: Vec<bool>,
}

impl DiffusionResult {
    pub fn final_adopters(&self) -> usize {
        self.adoption_curve.last().copied().unwrap_or(0)
    }
}

// =============================================================================
// TESTIMONIALS
// =============================================================================

/// A customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Star rating, 1-5
    pub rating: u8,

    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestimonialEffect {
    pub review_count: usize,
    pub rating_distribution: BTreeMap<u8, usize>,
    pub average_rating: f64,
    pub verified_share: f64,

    /// Belief at the start and after each period
    pub belief_trajectory: Vec<f64>,

    /// Credibility at the start and after each period
    pub credibility_trajectory: Vec<f64>,
    pub final_belief: f64,
    pub final_credibility: f64,
}

const INITIAL_BELIEF: f64 = 0.5;
const INITIAL_CREDIBILITY: f64 = 0.8;

// =============================================================================
// METRICS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralityMetrics {
    /// Mean new adopters per period
    pub velocity: f64,

    /// Mean period-over-period change in new adopters
    pub acceleration: f64,

    /// `max(0, acceleration) / velocity`
    pub virality_coefficient: f64,

    /// Final / initial adopters, 0 without initial adopters
    pub growth_factor: f64,

    /// Period with the most new adopters
    pub peak_period: Option<u32>,
}

impl ViralityMetrics {
    pub fn from_curve(curve: &[usize]) -> Self {
        let new_adopters: Vec<f64> = curve
            .windows(2)
            .map(|w| w[1] as f64 - w[0] as f64)
            .collect();
        let accelerations: Vec<f64> = new_adopters.windows(2).map(|w| w[1] - w[0]).collect();

        let velocity = mean(&new_adopters);
        let acceleration = mean(&accelerations);

        let peak_period = new_adopters
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0.0)
            .fold(None::<(usize, f64)>, |best, (i, d)| match best {
                Some((_, b)) if b >= *d => best,
                _ => Some((i, *d)),
            })
            .map(|(i, _)| i as u32 + 1);

        let initial = curve.first().copied().unwrap_or(0);
        let last = curve.last().copied().unwrap_or(0);

        Self {
            velocity,
            acceleration,
            virality_coefficient: acceleration.max(0.0) / velocity.max(f64::EPSILON),
            growth_factor: if initial == 0 { 0.0 } else { last as f64 / initial as f64 },
            peak_period,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdopterClusters {
    pub count: usize,
    pub largest: usize,

    /// Component sizes, largest first
    pub sizes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub nodes: usize,
    pub edges: usize,
    pub average_degree: f64,
    pub average_clustering: f64,
    pub adopter_clusters: AdopterClusters,
}

impl NetworkMetrics {
    pub fn measure(network: &SocialNetwork, adopted: &[bool]) -> Self {
        let sizes = network.components_among(adopted);
        Self {
            nodes: network.node_count(),
            edges: network.edge_count(),
            average_degree: network.average_degree(),
            average_clustering: network.average_clustering(),
            adopter_clusters: AdopterClusters {
                count: sizes.len(),
                largest: sizes.first().copied().unwrap_or(0),
                sizes,
            },
        }
    }
}

// =============================================================================
// SCENARIO
// =============================================================================

/// Scenario section for the social model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialScenario {
    pub network_type: NetworkArchetype,
    pub population: usize,

    /// Seed adopters by node label (`"0"` .. `"N-1"`); bare indices are accepted too
    #[serde(
        serialize_with = "serialize_labels",
        deserialize_with = "deserialize_labels"
    )]
    pub initial_adopters: Vec<usize>,

    /// Intrinsic product appeal in [0, 1]
    pub product_appeal: f64,
    pub reviews: Vec<Review>,
}

impl Default for SocialScenario {
    fn default() -> Self {
        Self {
            network_type: NetworkArchetype::default(),
            population: 100,
            initial_adopters: vec![0],
            product_appeal: 0.5,
            reviews: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeLabel {
    Index(usize),
    Label(String),
}

fn serialize_labels<S: Serializer>(nodes: &[usize], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(nodes.iter().map(|n| SocialNetwork::label(*n)))
}

fn deserialize_labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<usize>, D::Error> {
    Vec::<NodeLabel>::deserialize(deserializer)?
        .into_iter()
        .map(|label| match label {
            NodeLabel::Index(n) => Ok(n),
            NodeLabel::Label(s) => s.trim().parse::<usize>().map_err(|_| {
                serde::de::Error::custom(format!("node label {:?} is not a node index", s))
            }),
        })
        .collect()
}

/// Full social model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialSimulation {
    pub archetype: NetworkArchetype,
    pub periods: u32,
    pub adoption_curve: Vec<usize>,
    pub adoption_events: Vec<AdoptionEvent>,
    pub final_adoption_rate: f64,
    pub virality_metrics: ViralityMetrics,
    pub network_metrics: NetworkMetrics,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub testimonials: Option<TestimonialEffect>,
}

// =============================================================================
// MODEL
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SocialProofModel;

impl SocialProofModel {
    pub fn new() -> Self {
        Self
    }

    /// Generates the network, diffuses adoption and evaluates testimonials.
    pub fn simulate(
        &self,
        scenario: &SocialScenario,
        periods: u32,
        seed: Seed,
    ) -> Result<SocialSimulation, ModelError> {
        if !(scenario.product_appeal.is_finite() && (0.0..=1.0).contains(&scenario.product_appeal)) {
            return Err(ModelError::invalid(MODEL, "product appeal must be in [0, 1]"));
        }

        let mut rng = model_rng(seed);
        let network = SocialNetwork::generate(scenario.network_type, scenario.population, &mut rng)?;
        let diffusion = self.simulate_diffusion(
            &network,
            &scenario.initial_adopters,
            scenario.product_appeal,
            periods,
            &mut rng,
        )?;

        let testimonials = if scenario.reviews.is_empty() {
            None
        } else {
            Some(self.simulate_testimonial_effect(&scenario.reviews, periods, seed)?)
        };

        let virality_metrics = ViralityMetrics::from_curve(&diffusion.adoption_curve);
        let network_metrics = NetworkMetrics::measure(&network, &diffusion.adopted);
        let final_adoption_rate = diffusion.final_adopters() as f64 / network.node_count() as f64;

        info!(
            "Social diffusion: {} of {} adopted after {} periods",
            diffusion.final_adopters(),
            network.node_count(),
            periods
        );

        Ok(SocialSimulation {
            archetype: scenario.network_type,
            periods,
            adoption_curve: diffusion.adoption_curve,
            adoption_events: diffusion.events,
            final_adoption_rate,
            virality_metrics,
            network_metrics,
            testimonials,
        })
    }

    /// Runs synchronous threshold diffusion over an existing network.
    pub fn simulate_diffusion(
        &self,
        network: &SocialNetwork,
        initial_adopters: &[usize],
        product_appeal: f64,
        periods: u32,
        rng: &mut ChaCha8Rng,
    ) -> Result<DiffusionResult, ModelError> {
        let n = network.node_count();
        let mut adopted = vec![false; n];
        for &node in initial_adopters {
            if node >= n {
                return Err(ModelError::invalid(
                    MODEL,
                    format!("initial adopter {} is outside a network of {} nodes", node, n),
                ));
            }
            adopted[node] = true;
        }

        let mean_degree = network.average_degree();
        let strong_degree = STRONG_TIE_FACTOR * mean_degree;
        let mut curve = vec![adopted.iter().filter(|a| **a).count()];
        let mut events = Vec::new();

        for period in 1..=periods {
            let snapshot = adopted.clone();
            let adopter_count = curve.last().copied().unwrap_or(0);
            let global_rate = adopter_count as f64 / n as f64;
            let herd = if global_rate > CONFORMITY_THRESHOLD {
                0.15 * global_rate
            } else {
                0.0
            };

            for node in 0..n {
                if snapshot[node] {
                    continue;
                }
                let neighbors = network.neighbors(node);
                let adopted_neighbors: Vec<usize> =
                    neighbors.iter().copied().filter(|&m| snapshot[m]).collect();
                if adopted_neighbors.is_empty() {
                    continue;
                }

                let strong = adopted_neighbors
                    .iter()
                    .filter(|&&m| network.degree(m) as f64 >= strong_degree)
                    .count();

                let factors = InfluenceFactors {
                    direct_ratio: adopted_neighbors.len() as f64 / neighbors.len() as f64,
                    indirect_ratio: second_hop_ratio(network, node, &snapshot),
                    herd,
                    pressure: 0.15 * (strong as f64 / 3.0).min(1.0),
                    appeal: product_appeal,
                    noise: gaussian(rng, 0.0, 0.1),
                };
                let score = factors.score();

                if score > ADOPTION_THRESHOLD {
                    adopted[node] = true;
                    events.push(AdoptionEvent {
                        node,
                        period,
                        score,
                        factors,
                    });
                }
            }

            curve.push(adopted.iter().filter(|a| **a).count());
        }

        Ok(DiffusionResult {
            adoption_curve: curve,
            events,
            adopted,
        })
    }

    /// Evolves belief and credibility under growing review exposure.
    pub fn simulate_testimonial_effect(
        &self,
        reviews: &[Review],
        periods: u32,
        seed: Seed,
    ) -> Result<TestimonialEffect, ModelError> {
        if let Some(bad) = reviews.iter().find(|r| !(1..=5).contains(&r.rating)) {
            return Err(ModelError::invalid(
                MODEL,
                format!("review rating {} is outside 1-5", bad.rating),
            ));
        }

        let mut belief = INITIAL_BELIEF;
        let mut credibility = INITIAL_CREDIBILITY;
        let mut belief_trajectory = vec![belief];
        let mut credibility_trajectory = vec![credibility];

        let mut rating_distribution = BTreeMap::new();
        for r in reviews {
            *rating_distribution.entry(r.rating).or_insert(0) += 1;
        }
        let ratings: Vec<f64> = reviews.iter().map(|r| f64::from(r.rating)).collect();
        let average_rating = mean(&ratings);
        let verified_share = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().filter(|r| r.verified).count() as f64 / reviews.len() as f64
        };

        if reviews.is_empty() {
            warn!("Testimonial simulation with no reviews; belief unchanged");
            let steps = periods as usize;
            belief_trajectory.extend(std::iter::repeat(belief).take(steps));
            credibility_trajectory.extend(std::iter::repeat(credibility).take(steps));
        } else {
            let mut rng = model_rng(seed);
            let target = (average_rating - 1.0) / 4.0;
            let five_star_share =
                rating_distribution.get(&5).copied().unwrap_or(0) as f64 / reviews.len() as f64;

            for t in 0..periods as usize {
                let exposures = reviews.len().min(3 * (t + 1));
                let effect = 1.0 - (-(exposures as f64) / 5.0).exp();

                belief += 0.3 * credibility * effect * (target - belief) + gaussian(&mut rng, 0.0, 0.02);
                belief = clip01(belief);

                credibility = credibility * 0.98 + 0.02 * verified_share;
                if five_star_share > 0.9 {
                    credibility -= 0.05;
                }
                credibility = clip01(credibility);

                belief_trajectory.push(belief);
                credibility_trajectory.push(credibility);
            }
        }

        Ok(TestimonialEffect {
            review_count: reviews.len(),
            rating_distribution,
            average_rating,
            verified_share,
            belief_trajectory,
            credibility_trajectory,
            final_belief: belief,
            final_credibility: credibility,
        })
    }
}

/// Adopted share of nodes exactly two hops from `node`.
fn second_hop_ratio(network: &SocialNetwork, node: usize, adopted: &[bool]) -> f64 {
    let direct = network.neighbors(node);
    let mut second: BTreeSet<usize> = BTreeSet::new();
    for &m in direct {
        for &k in network.neighbors(m) {
            if k != node && !direct.contains(&k) {
                second.insert(k);
            }
        }
    }
    if second.is_empty() {
        return 0.0;
    }
    second.iter().filter(|&&k| adopted[k]).count() as f64 / second.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn small_world_scenario() -> SocialScenario {
        SocialScenario {
            network_type: NetworkArchetype::SmallWorld,
            population: 50,
            initial_adopters: vec![0, 1, 2],
            product_appeal: 0.7,
            reviews: vec![],
        }
    }

    #[test]
    fn test_small_world_example() {
        let sim = SocialProofModel::new().simulate(&small_world_scenario(), 8, 42).unwrap();

        assert!(sim.final_adoption_rate >= 3.0 / 50.0);
        assert_eq!(sim.adoption_curve.len(), 9);
        assert_eq!(sim.adoption_curve[0], 3);
        assert_eq!(sim.network_metrics.edges, 150);
        assert!(sim.virality_metrics.virality_coefficient >= 0.0);
    }

    #[test]
    fn test_diffusion_deterministic() {
        let model = SocialProofModel::new();
        let a = model.simulate(&small_world_scenario(), 8, 42).unwrap();
        let b = model.simulate(&small_world_scenario(), 8, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_adoption_monotonic_for_all_archetypes() {
        for archetype in [NetworkArchetype::SmallWorld, NetworkArchetype::ScaleFree, NetworkArchetype::Random] {
            let scenario = SocialScenario {
                network_type: archetype,
                population: 120,
                initial_adopters: vec![0, 5, 9],
                product_appeal: 0.9,
                reviews: vec![],
            };
            let sim = SocialProofModel::new().simulate(&scenario, 10, 17).unwrap();
            for w in sim.adoption_curve.windows(2) {
                assert!(w[1] >= w[0], "{:?} curve decreased", archetype);
            }
            assert_eq!(
                sim.adoption_events.len(),
                sim.adoption_curve.last().unwrap() - sim.adoption_curve[0]
            );
        }
    }

    #[test]
    fn test_single_node_network() {
        let scenario = SocialScenario {
            population: 1,
            initial_adopters: vec![],
            ..small_world_scenario()
        };
        let sim = SocialProofModel::new().simulate(&scenario, 5, 3).unwrap();

        assert_eq!(sim.network_metrics.nodes, 1);
        assert_eq!(sim.network_metrics.edges, 0);
        assert_eq!(sim.final_adoption_rate, 0.0);
        assert_eq!(sim.virality_metrics.growth_factor, 0.0);
        assert_eq!(sim.virality_metrics.peak_period, None);
    }

    #[test]
    fn test_scale_free_edge_count() {
        let mut rng = model_rng(11);
        let network = SocialNetwork::generate(NetworkArchetype::ScaleFree, 200, &mut rng).unwrap();
        assert_eq!(network.edge_count(), 6 + 3 * (200 - 4));
        assert!((0..200).all(|n| network.degree(n) >= 3));
    }

    #[test]
    fn test_population_limits() {
        let mut rng = model_rng(1);
        assert!(SocialNetwork::generate(NetworkArchetype::Random, MAX_POPULATION + 1, &mut rng).is_err());
        assert!(SocialNetwork::generate(NetworkArchetype::Random, 0, &mut rng).is_err());
    }

    #[test]
    fn test_small_world_rewiring_scales() {
        let mut rng = model_rng(5);
        let network = SocialNetwork::generate(NetworkArchetype::SmallWorld, 20_000, &mut rng).unwrap();
        assert_eq!(network.edge_count(), 3 * 20_000);

        // Complete graph: nothing left to rewire to
        let mut rng = model_rng(5);
        let tiny = SocialNetwork::generate(NetworkArchetype::SmallWorld, 7, &mut rng).unwrap();
        assert_eq!(tiny.edge_count(), 21);
    }

    #[test]
    fn test_initial_adopters_parse_node_labels() {
        let scenario: SocialScenario = serde_json::from_str(
            r#"{"network_type": "small_world", "population": 50, "initial_adopters": ["0", "1", 2]}"#,
        )
        .unwrap();
        assert_eq!(scenario.initial_adopters, vec![0, 1, 2]);

        let json = serde_json::to_value(&scenario).unwrap();
        assert_eq!(json["initial_adopters"], serde_json::json!(["0", "1", "2"]));

        assert!(serde_json::from_str::<SocialScenario>(r#"{"initial_adopters": ["alice"]}"#).is_err());
        assert!(serde_json::from_str::<SocialScenario>(r#"{"initial_adopters": ["-1"]}"#).is_err());
    }

    #[test]
    fn test_invalid_initial_adopter() {
        let scenario = SocialScenario {
            initial_adopters: vec![50],
            ..small_world_scenario()
        };
        assert!(SocialProofModel::new().simulate(&scenario, 3, 1).is_err());
    }

    #[test]
    fn test_clustering_and_components() {
        // Triangle 0-1-2 plus a tail 2-3, and an isolated pair 4-5
        let network = SocialNetwork::from_edges(6, &[(0, 1), (1, 2), (0, 2), (2, 3), (4, 5)]);
        assert_abs_diff_eq!(network.clustering_coefficient(0), 1.0);
        assert_abs_diff_eq!(network.clustering_coefficient(2), 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(network.clustering_coefficient(3), 0.0);

        let adopted = [true, true, false, true, true, true];
        assert_eq!(network.components_among(&adopted), vec![2, 2, 1]);
    }

    #[test]
    fn test_virality_metrics_from_curve() {
        let metrics = ViralityMetrics::from_curve(&[2, 3, 5, 9]);
        assert_abs_diff_eq!(metrics.velocity, 7.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.acceleration, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.growth_factor, 4.5, epsilon = 1e-12);
        assert_eq!(metrics.peak_period, Some(3));

        let flat = ViralityMetrics::from_curve(&[4, 4, 4]);
        assert_eq!(flat.virality_coefficient, 0.0);
    }

    #[test]
    fn test_testimonials_empty_corpus_unchanged() {
        let effect = SocialProofModel::new().simulate_testimonial_effect(&[], 4, 9).unwrap();
        assert_eq!(effect.belief_trajectory, vec![INITIAL_BELIEF; 5]);
        assert_eq!(effect.final_credibility, INITIAL_CREDIBILITY);
    }

    #[test]
    fn test_testimonials_move_belief_toward_ratings() {
        let good: Vec<Review> = (0..20)
            .map(|i| Review {
                rating: if i % 4 == 0 { 4 } else { 5 },
                verified: true,
            })
            .collect();
        let bad: Vec<Review> = (0..20).map(|_| Review { rating: 1, verified: true }).collect();

        let model = SocialProofModel::new();
        let up = model.simulate_testimonial_effect(&good, 12, 4).unwrap();
        let down = model.simulate_testimonial_effect(&bad, 12, 4).unwrap();

        assert!(up.final_belief > INITIAL_BELIEF);
        assert!(down.final_belief < INITIAL_BELIEF);
        assert_eq!(up.rating_distribution[&5], 15);
        assert_eq!(up.verified_share, 1.0);
    }

    #[test]
    fn test_all_five_star_loses_credibility() {
        let suspicious: Vec<Review> = (0..10).map(|_| Review { rating: 5, verified: false }).collect();
        let effect = SocialProofModel::new()
            .simulate_testimonial_effect(&suspicious, 3, 2)
            .unwrap();
        assert!(effect.final_credibility < INITIAL_CREDIBILITY - 0.1);
    }

    #[test]
    fn test_invalid_rating_rejected() {
        let reviews = [Review { rating: 6, verified: true }];
        assert!(SocialProofModel::new().simulate_testimonial_effect(&reviews, 2, 1).is_err());
    }
}
