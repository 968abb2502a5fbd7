use super::{PerConfig, PrioritizationMode};
use crate::error::QmixError;
use anyhow::Result;
use log::debug;
use ordered_float::OrderedFloat;
use rand::{distributions::WeightedIndex, Rng};
use std::collections::{BTreeMap, BTreeSet};

/// Priority assigned to an episode that has not been prioritized yet.
pub const NEW_EPISODE_PRIORITY: f32 = 1.0;

/// Priorities, importance-sampling weights and td-errors of stored episodes.
///
/// The three mappings always share the same set of episode ids.
#[derive(Debug, Default, Clone)]
pub struct EpisodePriorities {
    priority: BTreeMap<usize, f32>,
    isweights: BTreeMap<usize, f32>,
    td_error: BTreeMap<usize, f32>,
    new_episodes: BTreeSet<usize>,
}

impl EpisodePriorities {
    /// Creates empty bookkeeping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked episodes.
    pub fn len(&self) -> usize {
        self.priority.len()
    }

    /// Returns `true` if no episode is tracked.
    pub fn is_empty(&self) -> bool {
        self.priority.is_empty()
    }

    /// Returns `true` if the episode is tracked.
    pub fn contains(&self, episode_id: usize) -> bool {
        self.priority.contains_key(&episode_id)
    }

    /// Marks an episode as new, giving it [`NEW_EPISODE_PRIORITY`].
    ///
    /// The episode stays new until the next call to [`Self::prioritize`].
    /// The importance-sampling weight and td-error of an episode seen for the
    /// first time are initialized to `1` and `0`.
    pub fn mark_new(&mut self, episode_id: usize) {
        self.new_episodes.insert(episode_id);
        self.priority.insert(episode_id, NEW_EPISODE_PRIORITY);
        self.isweights.entry(episode_id).or_insert(1.0);
        self.td_error.entry(episode_id).or_insert(0.0);
    }

    /// Stops tracking an episode.
    ///
    /// Returns `(priority, isweight, td_error)` of the removed episode.
    pub fn remove(&mut self, episode_id: usize) -> Option<(f32, f32, f32)> {
        self.new_episodes.remove(&episode_id);
        let p = self.priority.remove(&episode_id)?;
        let w = self.isweights.remove(&episode_id)?;
        let td = self.td_error.remove(&episode_id)?;
        Some((p, w, td))
    }

    /// Sampling priority of an episode.
    pub fn priority(&self, episode_id: usize) -> Option<f32> {
        self.priority.get(&episode_id).copied()
    }

    /// Importance-sampling weight of an episode.
    pub fn isweight(&self, episode_id: usize) -> Option<f32> {
        self.isweights.get(&episode_id).copied()
    }

    /// Latest td-error of an episode.
    pub fn td_error(&self, episode_id: usize) -> Option<f32> {
        self.td_error.get(&episode_id).copied()
    }

    /// Priorities of all tracked episodes.
    pub fn priorities(&self) -> &BTreeMap<usize, f32> {
        &self.priority
    }

    /// Importance-sampling weights of all tracked episodes.
    pub fn isweights(&self) -> &BTreeMap<usize, f32> {
        &self.isweights
    }

    /// Returns `true` if the episode was marked new after the last prioritization.
    pub fn is_new(&self, episode_id: usize) -> bool {
        self.new_episodes.contains(&episode_id)
    }

    /// Td-errors of all tracked episodes.
    pub fn td_errors(&self) -> &BTreeMap<usize, f32> {
        &self.td_error
    }

    /// Stores the td-error of a tracked episode.
    pub fn set_td_error(&mut self, episode_id: usize, td_error: f32) -> Result<()> {
        match self.td_error.get_mut(&episode_id) {
            Some(v) => {
                *v = td_error;
                Ok(())
            }
            None => Err(QmixError::EpisodeNotFound(episode_id).into()),
        }
    }

    /// Recomputes priorities from td-errors, then importance-sampling weights.
    ///
    /// Priorities are normalized to sum to one. Episodes marked new since the
    /// last pass get the largest raw priority of this pass and are no longer
    /// new afterwards.
    pub fn prioritize(&mut self, config: &PerConfig) {
        let n = self.priority.len();
        if n == 0 {
            return;
        }
        debug!("Prioritizing {} episodes in {} mode", n, config.mode);

        let raw: BTreeMap<usize, f32> = match config.mode {
            PrioritizationMode::Uniform => self.priority.keys().map(|&k| (k, 1.0)).collect(),
            PrioritizationMode::RankBased => {
                let mut ranked = self.td_error.iter().collect::<Vec<_>>();
                ranked.sort_by_key(|(_, &td)| std::cmp::Reverse(OrderedFloat(td)));
                ranked
                    .into_iter()
                    .enumerate()
                    .map(|(i, (&k, _))| {
                        let p = if self.is_new(k) {
                            NEW_EPISODE_PRIORITY
                        } else {
                            (1.0 / (i + 1) as f32).powf(config.alpha)
                        };
                        (k, p)
                    })
                    .collect()
            }
            PrioritizationMode::Proportional => {
                let scored = self
                    .td_error
                    .iter()
                    .filter(|(&k, _)| !self.is_new(k))
                    .map(|(&k, &td)| (k, td.abs() + config.eps))
                    .collect::<BTreeMap<_, _>>();
                let max_p = scored
                    .values()
                    .copied()
                    .map(OrderedFloat)
                    .max()
                    .map_or(NEW_EPISODE_PRIORITY, |p| p.0);
                self.priority
                    .keys()
                    .map(|&k| (k, scored.get(&k).copied().unwrap_or(max_p)))
                    .collect()
            }
        };

        let sum: f32 = raw.values().sum();
        self.priority = raw.into_iter().map(|(k, p)| (k, p / sum)).collect();
        self.isweights = self
            .priority
            .iter()
            .map(|(&k, &p)| (k, ((1.0 / n as f32) * (1.0 / p)).powf(config.beta)))
            .collect();
        self.new_episodes.clear();

        for (k, td) in self.td_error.iter() {
            debug!(
                "Episode {:<4} td_error={:.4} priority={:.4}",
                k, td, self.priority[k]
            );
        }
    }

    /// Draws episode ids without replacement according to the priorities.
    ///
    /// If more ids are requested than tracked, all ids are returned.
    pub fn select_episodes(&self, rng: &mut impl Rng, num_samples: usize) -> Result<Vec<usize>> {
        if num_samples > self.priority.len() {
            return Ok(self.priority.keys().copied().collect());
        }

        let mut ids = self.priority.keys().copied().collect::<Vec<_>>();
        let mut weights = self.priority.values().copied().collect::<Vec<_>>();
        let mut selected = Vec::with_capacity(num_samples);

        for _ in 0..num_samples {
            let dist = WeightedIndex::new(&weights)
                .map_err(|e| QmixError::InvalidPriorities(e.to_string()))?;
            let ix = rng.sample(dist);
            selected.push(ids.swap_remove(ix));
            weights.swap_remove(ix);
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn priorities(td_errors: &[f32]) -> EpisodePriorities {
        let mut p = EpisodePriorities::new();
        for (i, &td) in td_errors.iter().enumerate() {
            p.mark_new(i + 1);
            p.set_td_error(i + 1, td).unwrap();
        }
        p
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn test_uniform() {
        let mut p = priorities(&[0.1, 0.2, 0.3, 0.4]);
        p.prioritize(&PerConfig::default().mode(PrioritizationMode::Uniform));
        for (_, &v) in p.priorities() {
            assert_eq!(v, 0.25);
        }
        for (_, &w) in p.isweights() {
            assert_close(w, 1.0);
        }
    }

    #[test]
    fn test_rank_based() {
        let config = PerConfig::default().mode(PrioritizationMode::Proportional);
        let mut p = priorities(&[0.1, 0.4, 0.2]);
        // Leave the new-episode marker behind.
        p.prioritize(&config);
        p.prioritize(&config.clone().mode(PrioritizationMode::RankBased));

        let raw = [
            (1.0f32 / 3.0).powf(0.7),
            1.0,
            (1.0f32 / 2.0).powf(0.7),
        ];
        let sum: f32 = raw.iter().sum();
        for (i, r) in raw.iter().enumerate() {
            assert_close(p.priority(i + 1).unwrap(), r / sum);
        }
        let total: f32 = p.priorities().values().sum();
        assert_close(total, 1.0);
    }

    #[test]
    fn test_rank_based_new_episode_gets_max_priority() {
        let config = PerConfig::default().mode(PrioritizationMode::RankBased);
        let mut p = priorities(&[0.1, 0.4, 0.2]);
        p.prioritize(&config);
        p.mark_new(4);
        p.prioritize(&config);

        let max = p
            .priorities()
            .values()
            .copied()
            .fold(f32::MIN, f32::max);
        assert_eq!(p.priority(4), Some(max));
    }

    #[test]
    fn test_rank_based_old_episode_with_unit_priority() {
        let config = PerConfig::default().mode(PrioritizationMode::RankBased);
        // A lone episode is normalized to a priority of exactly one.
        let mut p = priorities(&[0.1]);
        p.prioritize(&config);
        assert_eq!(p.priority(1), Some(NEW_EPISODE_PRIORITY));
        assert!(!p.is_new(1));

        for (k, td) in [(2, 0.4), (3, 0.2)] {
            p.mark_new(k);
            p.set_td_error(k, td).unwrap();
        }
        assert!(p.is_new(2) && p.is_new(3));
        p.prioritize(&config);

        // Episode 1 is ranked third, episodes 2 and 3 are new.
        let raw = (1.0f32 / 3.0).powf(config.alpha);
        let sum = 2.0 + raw;
        assert_close(p.priority(1).unwrap(), raw / sum);
        assert_close(p.priority(2).unwrap(), 1.0 / sum);
        assert_close(p.priority(3).unwrap(), 1.0 / sum);
        assert!(!p.is_new(2) && !p.is_new(3));
    }

    #[test]
    fn test_proportional() {
        let mut p = priorities(&[1.0, -2.0, 3.0, 4.0]);
        let config = PerConfig::default().mode(PrioritizationMode::Proportional);
        // First pass assigns every episode the same raw priority.
        p.prioritize(&config);
        p.prioritize(&config);

        let sum = 10.0 + 4.0 * config.eps;
        for (i, td) in [1.0f32, 2.0, 3.0, 4.0].iter().enumerate() {
            assert_close(p.priority(i + 1).unwrap(), (td + config.eps) / sum);
        }

        // isweight = ((1/N) * (1/P))^beta
        let w = (0.25 / p.priority(1).unwrap()).powf(0.5);
        assert_close(p.isweight(1).unwrap(), w);
    }

    #[test]
    fn test_remove_keeps_mappings_in_sync() {
        let mut p = priorities(&[1.0, 2.0]);
        assert_eq!(p.remove(1), Some((NEW_EPISODE_PRIORITY, 1.0, 1.0)));
        assert!(!p.contains(1));
        assert!(p.isweight(1).is_none());
        assert!(p.td_error(1).is_none());
        assert_eq!(p.len(), 1);
        assert!(p.set_td_error(1, 0.0).is_err());
    }

    #[test]
    fn test_select_episodes_more_than_stored() -> Result<()> {
        let p = priorities(&[1.0, 2.0, 3.0]);
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(p.select_episodes(&mut rng, 5)?, vec![1, 2, 3]);

        let mut ids = p.select_episodes(&mut rng, 3)?;
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_select_episodes_follows_priorities() -> Result<()> {
        let config = PerConfig::default().mode(PrioritizationMode::Proportional);
        let mut p = priorities(&[1.0, 2.0, 3.0, 4.0]);
        p.prioritize(&config);
        p.prioritize(&config);

        let mut rng = StdRng::seed_from_u64(42);
        let n_draws = 20_000;
        let mut counts = BTreeMap::new();
        for _ in 0..n_draws {
            let ids = p.select_episodes(&mut rng, 1)?;
            assert_eq!(ids.len(), 1);
            *counts.entry(ids[0]).or_insert(0usize) += 1;
        }

        for (&k, &prob) in p.priorities() {
            let freq = counts.get(&k).copied().unwrap_or(0) as f32 / n_draws as f32;
            assert!((freq - prob).abs() < 0.02, "episode {}: {} vs {}", k, freq, prob);
        }
        Ok(())
    }

    #[test]
    fn test_select_episodes_without_replacement() -> Result<()> {
        let config = PerConfig::default().mode(PrioritizationMode::Uniform);
        let mut p = priorities(&[0.0; 6]);
        p.prioritize(&config);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let mut ids = p.select_episodes(&mut rng, 4)?;
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 4);
        }
        Ok(())
    }
}
