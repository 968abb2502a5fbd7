//! Conversion between joint actions and flat indices of a joint action space.
//!
//! A centralized network scores every combination of per-agent actions. With
//! `n_actions_list = [n_1, ..., n_k]` the joint action `(a_1, ..., a_k)` has
//! the mixed-radix flat index `sum_i a_i * prod_{j > i} n_j`, so the last
//! agent varies fastest.

/// Number of joint actions.
pub fn n_joint_actions(n_actions_list: &[usize]) -> usize {
    n_actions_list.iter().product()
}

/// Decodes a flat index into per-agent action indices.
pub fn decode_joint_action(flat: usize, n_actions_list: &[usize]) -> Vec<usize> {
    let mut idx = flat;
    let mut actions = n_actions_list
        .iter()
        .rev()
        .map(|&n| {
            let a = idx % n;
            idx /= n;
            a
        })
        .collect::<Vec<_>>();
    actions.reverse();
    actions
}

/// Encodes per-agent action indices into a flat index.
pub fn encode_joint_action(actions: &[usize], n_actions_list: &[usize]) -> usize {
    debug_assert_eq!(actions.len(), n_actions_list.len());
    actions
        .iter()
        .zip(n_actions_list.iter())
        .fold(0, |acc, (&a, &n)| acc * n + a)
}
