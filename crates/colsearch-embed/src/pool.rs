use anyhow::{ensure, Result};
use candle_core::{DType, Tensor, D};

fn eps_for(dtype: DType) -> f32 {
    match dtype { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 }
}

/// Mean over unmasked positions of `[B,T,H]`, then L2 normalisation: `[B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let (batch, hidden_dim) = (dims[0], dims[2]);

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape())?;
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?;
    let mean = sum.broadcast_div(&lengths)?;
    let out = l2_normalize_rows(&mean)?;
    ensure!(out.dims() == [batch, hidden_dim].as_slice(), "pooled shape {:?}", out.dims());
    Ok(out)
}

/// L2-normalise along the last dimension.
pub fn l2_normalize_rows(t: &Tensor) -> Result<Tensor> {
    let eps = Tensor::new(&[eps_for(t.dtype())], t.device())?.to_dtype(t.dtype())?;
    let norm = t.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.broadcast_add(&eps)?;
    Ok(t.broadcast_div(&norm)?)
}
