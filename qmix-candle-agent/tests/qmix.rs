mod common;
use anyhow::Result;
use common::*;
use qmix_candle_agent::{
    agent::{CentralizedRnnAgentConfig, RnnAgentConfig},
    opt::OptimizerConfig,
    qmix::{Qmix, QmixConfig, ValueNetworksConfig},
};
use qmix_core::error::QmixError;
use tempdir::TempDir;

fn factorized() -> ValueNetworksConfig {
    let agents = agents()
        .into_iter()
        .map(|a| (a, RnnAgentConfig::new(OBS_DIM, N_ACTIONS).hidden_dim(8)))
        .collect();
    ValueNetworksConfig::Factorized {
        agents,
        mixer: qmix_config(),
    }
}

#[test]
fn test_opt_step() -> Result<()> {
    let mut buffer = buffer(3, 6)?;
    let config = QmixConfig::new(factorized())
        .optimizer(OptimizerConfig::Adam { lr: 1e-3 })
        .target_update_interval(2)
        .weighted(true);
    let mut qmix = Qmix::build(config)?;

    let record = qmix.opt(&mut buffer, 2)?;
    assert!(record.get_scalar("loss")?.is_finite());
    assert_eq!(record.get_scalar("n_sampled_episodes")?, 2.0);
    assert_eq!(record.get_string("mode")?, "RANK-BASED");
    assert_eq!(qmix.n_opts(), 1);

    // Sampled episodes were scored and all priorities form a distribution.
    let total: f32 = buffer.priorities().priorities().values().sum();
    assert!((total - 1.0).abs() < 1e-5);

    qmix.opt(&mut buffer, 10)?;
    assert_eq!(qmix.n_opts(), 2);
    Ok(())
}

#[test]
fn test_opt_centralized() -> Result<()> {
    let mut buffer = buffer(2, 4)?;
    let agent = CentralizedRnnAgentConfig::new(STATE_DIM, vec![N_ACTIONS; AGENTS.len()])
        .hidden_dim(8);
    let config = QmixConfig::new(ValueNetworksConfig::Centralized { agent })
        .use_isweight(false)
        .prioritize_all(true);
    let mut qmix = Qmix::build(config)?;

    let record = qmix.opt(&mut buffer, 1)?;
    assert!(record.get_scalar("loss")?.is_finite());
    assert_eq!(record.get_scalar("n_episodes")?, 2.0);
    for episode_id in 1..=2 {
        assert!(buffer.priorities().td_error(episode_id).unwrap() > 0.0);
    }
    Ok(())
}

#[test]
fn test_opt_empty_buffer() -> Result<()> {
    let mut buffer = buffer(0, 0)?;
    let mut qmix = Qmix::build(QmixConfig::new(factorized()))?;
    let err = qmix.opt(&mut buffer, 4).unwrap_err();
    assert_eq!(err.downcast_ref::<QmixError>(), Some(&QmixError::EmptyBuffer));
    Ok(())
}

#[test]
fn test_save_load() -> Result<()> {
    let mut buffer = buffer(2, 4)?;
    let mut qmix = Qmix::build(QmixConfig::new(factorized()))?;
    qmix.opt(&mut buffer, 2)?;

    let dir = TempDir::new("qmix")?;
    qmix.save(dir.path())?;
    assert!(dir.path().join("qmix.safetensors").exists());
    assert!(dir.path().join("qmix_tgt.safetensors").exists());

    let mut qmix_ = Qmix::build(QmixConfig::new(factorized()))?;
    qmix_.load(dir.path())?;
    assert_eq!(qmix_.value_networks(&agents())?.agents(), &agents()[..]);
    Ok(())
}
