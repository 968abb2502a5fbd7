use anyhow::Result;
use qmix_core::{
    episode_buffer::{EpisodeBufferConfig, EpisodeReplayBuffer},
    AgentObs, ExperienceBufferBase, RawAgentObs, RawTransition, Transition,
};
use std::collections::HashMap;

const AGENTS: [&str; 3] = ["agent_0", "agent_1", "agent_2"];

fn agents() -> Vec<String> {
    AGENTS.iter().map(|a| a.to_string()).collect()
}

fn observations(t: usize) -> HashMap<String, RawAgentObs> {
    AGENTS
        .iter()
        .map(|&a| {
            let obs = AgentObs {
                observation: vec![t as f32; 4],
                action_mask: vec![1, 1, 0, 1, 1],
            };
            (a.to_string(), obs)
        })
        .collect()
}

fn transition(episode_id: usize, t: usize, rewards: f32) -> RawTransition {
    Transition {
        episode_id,
        previous_observations: observations(t),
        observations: observations(t + 1),
        previous_state: vec![t as f32; 8],
        state: vec![(t + 1) as f32; 8],
        actions: AGENTS.iter().map(|&a| (a.to_string(), t % 5)).collect(),
        rewards,
    }
}

#[test]
fn test_sample_include_last_returns_trailing_window() -> Result<()> {
    let config = EpisodeBufferConfig::default().batch_size(4);
    let mut buffer: EpisodeReplayBuffer<RawAgentObs, Vec<f32>> =
        EpisodeReplayBuffer::build(agents(), &config);

    let mut rewards = vec![0f32; 10];
    rewards[0] = 1.0;
    rewards[9] = 10.0;
    let pushed = rewards
        .iter()
        .enumerate()
        .map(|(t, &r)| transition(1, t, r))
        .collect::<Vec<_>>();
    for tr in pushed.iter() {
        buffer.push(tr.clone())?;
    }

    let window = buffer.sample(Some(1), true, false)?;
    assert_eq!(window, &pushed[6..]);
    assert_eq!(window.last().map(|tr| tr.rewards), Some(10.0));
    Ok(())
}

#[test]
fn test_random_episode_sampling_covers_all_episodes() -> Result<()> {
    let config = EpisodeBufferConfig::default().batch_size(2).seed(3);
    let mut buffer: EpisodeReplayBuffer<RawAgentObs, Vec<f32>> =
        EpisodeReplayBuffer::build(agents(), &config);
    for episode_id in 1..=3 {
        for t in 0..5 {
            buffer.push(transition(episode_id, t, 0.0))?;
        }
    }

    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..200 {
        let window = buffer.sample(None, false, false)?;
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].episode_id, window[1].episode_id);
        seen.insert(window[0].episode_id);
    }
    assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    Ok(())
}
