//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::VarMap;
use log::trace;
use serde::{Deserialize, Serialize};

/// How elementwise losses are reduced to a scalar.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum Reduction {
    /// Mean over all elements.
    #[default]
    Mean,

    /// Sum over all elements.
    Sum,
}

impl Reduction {
    /// Reduces `loss` to a scalar.
    pub fn apply(&self, loss: &Tensor) -> Result<Tensor> {
        match self {
            Self::Mean => Ok(loss.mean_all()?),
            Self::Sum => Ok(loss.sum_all()?),
        }
    }
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// `tau = 1.0` copies `src` into `dest`.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("dest");
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("var map of the update destination is poisoned"))?;
    trace!("src");
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("var map of the update source is poisoned"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("variable {} is missing in the update source", k_dest))?;
        let t_dest = ((tau * v_src.as_tensor())? + ((1.0 - tau) * v_dest.as_tensor())?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Huber loss with `delta = 1`, elementwise.
///
/// `0.5 * d^2` where `|d| < 1`, `|d| - 0.5` elsewhere, with `d = x - y`.
pub fn huber_loss_elementwise(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    let d = (x - y)?.abs()?;
    let quadratic = (0.5 * d.sqr()?)?;
    let linear = (&d - 0.5)?;
    Ok(d.lt(1.0)?.where_cond(&quadratic, &linear)?)
}

/// Huber loss with `delta = 1` reduced to a scalar.
///
/// See <https://pytorch.org/docs/stable/generated/torch.nn.HuberLoss.html>.
pub fn huber_loss(x: &Tensor, y: &Tensor, reduction: Reduction) -> Result<Tensor> {
    reduction.apply(&huber_loss_elementwise(x, y)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::Init;

    fn varmap_with(t: &Tensor) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((3,), "var1", init, DType::F32, &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(t)?;
        Ok(vm)
    }

    fn var1(vm: &VarMap) -> Tensor {
        vm.data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .as_tensor()
            .clone()
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let t = ((tau * &t_src)? + ((1.0 - tau) * &t_dest)?)?;

        let vm_src = varmap_with(&t_src)?;
        let vm_dest = varmap_with(&t_dest)?;
        track(&vm_dest, &vm_src, tau)?;

        let diff = (t - var1(&vm_dest))?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert!(diff < 1e-6);
        Ok(())
    }

    #[test]
    fn test_hard_update() -> Result<()> {
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let vm_src = varmap_with(&t_src)?;
        let vm_dest = varmap_with(&t_dest)?;
        track(&vm_dest, &vm_src, 1.0)?;

        assert_eq!(var1(&vm_dest).to_vec1::<f32>()?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_huber_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.0f32, 0.5, 3.0, -2.0], (4,), &Device::Cpu)?;
        let y = Tensor::zeros((4,), DType::F32, &Device::Cpu)?;

        let elementwise = huber_loss_elementwise(&x, &y)?.to_vec1::<f32>()?;
        assert_eq!(elementwise, vec![0.0, 0.125, 2.5, 1.5]);

        let sum = huber_loss(&x, &y, Reduction::Sum)?.to_scalar::<f32>()?;
        assert!((sum - 4.125).abs() < 1e-6);
        let mean = huber_loss(&x, &y, Reduction::Mean)?.to_scalar::<f32>()?;
        assert!((mean - 4.125 / 4.0).abs() < 1e-6);
        Ok(())
    }
}
