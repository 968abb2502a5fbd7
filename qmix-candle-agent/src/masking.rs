//! Masking of Q-values with action validity masks.
//!
//! Masks hold `1` for valid and `0` for invalid actions and broadcast along
//! the action axis of the Q-values. Invalid entries are replaced by negative
//! infinity so that they never win an argmax.
use anyhow::{ensure, Result};
use candle_core::{Tensor, D};
use candle_nn::ops::softmax;
use qmix_core::{
    error::QmixError,
    joint_action::decode_joint_action,
    AgentId, AgentObs, ObservationMap,
};

fn neg_inf_like(q: &Tensor) -> Result<Tensor> {
    Ok(Tensor::full(f32::NEG_INFINITY, q.dims(), q.device())?.to_dtype(q.dtype())?)
}

/// Returns an integer predicate of the shape of `q`, non-zero at valid actions.
fn keep(mask: &Tensor, q: &Tensor) -> Result<Tensor> {
    Ok(mask.ne(0f64)?.broadcast_as(q.dims())?)
}

/// Sets invalid actions to negative infinity, then applies softmax over actions.
///
/// Invalid actions get probability zero.
pub fn mask_then_softmax(mask: &Tensor, q: &Tensor) -> Result<Tensor> {
    let q = mask_only(mask, q)?;
    Ok(softmax(&q, D::Minus1)?)
}

/// Applies softmax over actions, then sets invalid actions to negative infinity.
///
/// The result is not a probability distribution anymore.
pub fn softmax_then_mask(mask: &Tensor, q: &Tensor) -> Result<Tensor> {
    let p = softmax(q, D::Minus1)?;
    mask_only(mask, &p)
}

/// Sets invalid actions to negative infinity.
pub fn mask_only(mask: &Tensor, q: &Tensor) -> Result<Tensor> {
    let keep = keep(mask, q)?;
    Ok(keep.where_cond(q, &neg_inf_like(q)?)?)
}

/// Invalidates joint actions containing an invalid action of any agent.
///
/// `q` is indexed by one trailing axis per agent, in the order of `masks`;
/// leading axes (typically the batch axis) are left untouched.
pub fn joint_mask_only(masks: &[&Tensor], q: &Tensor) -> Result<Tensor> {
    let rank = q.rank();
    ensure!(
        rank >= masks.len(),
        "Q-values of rank {} cannot hold {} action axes",
        rank,
        masks.len()
    );
    let offset = rank - masks.len();
    let neg_inf = neg_inf_like(q)?;

    let mut q = q.clone();
    for (i, mask) in masks.iter().enumerate() {
        let mut shape = vec![1; rank];
        shape[offset + i] = mask.elem_count();
        let keep = keep(&mask.reshape(shape)?, &q)?;
        q = keep.where_cond(&q, &neg_inf)?;
    }
    Ok(q)
}

/// Applies [`joint_mask_only`] with the masks of `agents` taken from `observations`.
pub fn centralized_mask_only<X>(
    observations: &ObservationMap<AgentObs<X, Tensor>>,
    agents: &[AgentId],
    q: &Tensor,
) -> Result<Tensor> {
    let masks = agents
        .iter()
        .map(|a| {
            observations
                .get(a)
                .map(|o| &o.action_mask)
                .ok_or_else(|| QmixError::UnknownAgent(a.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    joint_mask_only(&masks, q)
}

/// Returns the greedy joint action of each batch element as per-agent indices.
///
/// `q` is reshaped to `(batch_size, n_joint_actions)`, its argmax decoded
/// with [`decode_joint_action`].
pub fn get_action_from_q(
    q: &Tensor,
    n_actions_list: &[usize],
    batch_size: usize,
) -> Result<Vec<Vec<usize>>> {
    let flat = q
        .reshape((batch_size, ()))?
        .argmax(D::Minus1)?
        .to_vec1::<u32>()?;
    Ok(flat
        .into_iter()
        .map(|ix| decode_joint_action(ix as usize, n_actions_list))
        .collect())
}
