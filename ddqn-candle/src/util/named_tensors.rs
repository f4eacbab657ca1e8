use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::VarMap;
use std::collections::HashMap;

/// Named copies of the variables of a [`VarMap`].
///
/// The tensors do not share storage with the variables they were copied from.
#[derive(Debug, Clone)]
pub struct NamedTensors {
    /// Tensors keyed by variable name.
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copies the variables of `vs`.
    pub fn copy_from(vs: &VarMap) -> Result<Self> {
        let data = vs
            .data()
            .lock()
            .map_err(|_| anyhow!("Variable map is poisoned"))?;
        let named_tensors = data
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.as_tensor().copy()?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { named_tensors })
    }

    /// Overwrites the variables of `vs` with the tensors of the same names.
    ///
    /// Fails if a variable has no counterpart or differs in shape.
    pub fn copy_to(&self, vs: &VarMap) -> Result<()> {
        let data = vs
            .data()
            .lock()
            .map_err(|_| anyhow!("Variable map is poisoned"))?;
        if data.len() != self.named_tensors.len() {
            return Err(anyhow!(
                "{} variables but {} tensors",
                data.len(),
                self.named_tensors.len()
            ));
        }
        for (name, var) in data.iter() {
            let src = self
                .named_tensors
                .get(name)
                .ok_or_else(|| anyhow!("No tensor named {}", name))?;
            var.set(src)?;
        }
        Ok(())
    }
}
