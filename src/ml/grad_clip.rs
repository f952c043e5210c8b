// ============================================================
// Layer 5 — Global Gradient Norm Clipping
// ============================================================
// Clips the gradients of a whole model as one vector:
//
//   norm  = sqrt(Σ over every parameter of Σ g²)
//   if norm > max_norm: every g ← g · max_norm / (norm + 1e-6)
//
// Unlike burn's GradientClippingConfig::Norm, no tensor is clipped
// on its own.

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// Sums the squared gradient entries of every visited parameter.
struct SquaredNorm<'a> {
    grads: &'a GradientsParams,
    sum:   f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            let squared: f64 = grad.clone().mul(grad).sum().into_scalar().elem();
            self.sum += squared;
        }
    }
}

/// Multiplies the gradient of every visited parameter by `factor`.
struct Rescale<'a> {
    grads:  &'a mut GradientsParams,
    factor: f32,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register::<B::InnerBackend, D>(id, grad.mul_scalar(self.factor));
        }
    }
}

/// L2 norm of all of `module`'s gradients taken together.
pub fn global_grad_norm<B, M>(module: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = SquaredNorm { grads, sum: 0.0 };
    module.visit(&mut visitor);
    visitor.sum.sqrt()
}

/// Rescale `grads` so their global norm is at most `max_norm`.
///
/// Returns the clipped gradients and the norm measured before clipping.
pub fn clip_grad_norm<B, M>(module: &M, mut grads: GradientsParams, max_norm: f32) -> (GradientsParams, f64)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let norm = global_grad_norm::<B, M>(module, &grads);
    if norm > max_norm as f64 {
        let factor = (max_norm as f64 / (norm + 1e-6)) as f32;
        let mut visitor = Rescale { grads: &mut grads, factor };
        module.visit(&mut visitor);
        tracing::debug!("gradient norm {:.4} clipped to {}", norm, max_norm);
    }
    (grads, norm)
}
