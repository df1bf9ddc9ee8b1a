//! Feed-forward dense network interpreter.
//!
//! ## Binary Layout
//!
//! All integers are `u32` and all weights `f32`, little-endian.
//!
//! | Field | Contents |
//! |-------|----------|
//! | layer count | `u32` |
//! | per layer | `u32` kind: 1 dense, 8 activation |
//! | dense | weight tensor, bias tensor, activation tag |
//! | activation | activation tag |
//!
//! A tensor is its rank, one `u32` per dimension, then the row-major data.
//! Dense weights have dimensions `[outputs, inputs]`, biases `[outputs]`.

use std::fs;
use std::path::Path;

use crate::error::ModelError;

const KIND_DENSE: u32 = 1;
const KIND_ACTIVATION: u32 = 8;

/// Element-wise nonlinearity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Linear,
    Relu,
    /// With `alpha = 1`.
    Elu,
    Softplus,
    Softsign,
    Sigmoid,
    Tanh,
    /// `clamp(0.2 x + 0.5, 0, 1)`.
    HardSigmoid,
}

impl Activation {
    pub fn from_tag(tag: u32) -> Result<Self, ModelError> {
        Ok(match tag {
            1 => Activation::Linear,
            2 => Activation::Relu,
            3 => Activation::Elu,
            4 => Activation::Softplus,
            5 => Activation::Softsign,
            6 => Activation::Sigmoid,
            7 => Activation::Tanh,
            8 => Activation::HardSigmoid,
            other => return Err(ModelError::UnknownActivation(other)),
        })
    }

    pub fn tag(self) -> u32 {
        match self {
            Activation::Linear => 1,
            Activation::Relu => 2,
            Activation::Elu => 3,
            Activation::Softplus => 4,
            Activation::Softsign => 5,
            Activation::Sigmoid => 6,
            Activation::Tanh => 7,
            Activation::HardSigmoid => 8,
        }
    }

    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Elu => {
                if x >= 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            Activation::Softplus => {
                // ln(1 + e^x) without overflow for large x.
                if x > 20.0 { x } else { x.exp().ln_1p() }
            }
            Activation::Softsign => x / (1.0 + x.abs()),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::HardSigmoid => (0.2 * x + 0.5).clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Dense {
        inputs: usize,
        outputs: usize,
        /// Row-major `[outputs, inputs]`.
        weights: Vec<f32>,
        biases: Vec<f32>,
        activation: Activation,
    },
    Activation(Activation),
}

/// Immutable dense network with validated layer shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseNetwork {
    layers: Vec<Layer>,
    inputs: usize,
    outputs: usize,
}

impl DenseNetwork {
    /// Check that consecutive dense layers agree on their widths.
    pub fn new(layers: Vec<Layer>) -> Result<Self, ModelError> {
        let mut inputs = None;
        let mut width: Option<usize> = None;
        for (index, layer) in layers.iter().enumerate() {
            let Layer::Dense {
                inputs: layer_inputs,
                outputs,
                weights,
                biases,
                ..
            } = layer
            else {
                continue;
            };
            if *layer_inputs == 0 || *outputs == 0 {
                return Err(ModelError::ShapeMismatch(format!(
                    "layer {index} has an empty dimension"
                )));
            }
            if weights.len() != layer_inputs * outputs || biases.len() != *outputs {
                return Err(ModelError::ShapeMismatch(format!(
                    "layer {index}: {} weights and {} biases for {layer_inputs}x{outputs}",
                    weights.len(),
                    biases.len()
                )));
            }
            match width {
                Some(previous) if previous != *layer_inputs => {
                    return Err(ModelError::ShapeMismatch(format!(
                        "layer {index} takes {layer_inputs} inputs but receives {previous}"
                    )));
                }
                _ => {}
            }
            inputs.get_or_insert(*layer_inputs);
            width = Some(*outputs);
        }

        match (inputs, width) {
            (Some(inputs), Some(outputs)) => Ok(Self {
                layers,
                inputs,
                outputs,
            }),
            _ => Err(ModelError::ShapeMismatch(
                "network has no dense layer".to_owned(),
            )),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Run the network on one feature vector.
    pub fn infer(&self, input: &[f32]) -> Result<Vec<f32>, ModelError> {
        if input.len() != self.inputs {
            return Err(ModelError::ShapeMismatch(format!(
                "expected {} inputs, got {}",
                self.inputs,
                input.len()
            )));
        }

        let mut current = input.to_vec();
        let mut next = Vec::new();
        for layer in &self.layers {
            match layer {
                Layer::Dense {
                    inputs,
                    outputs,
                    weights,
                    biases,
                    activation,
                } => {
                    next.clear();
                    next.extend((0..*outputs).map(|row| {
                        let w = &weights[row * inputs..(row + 1) * inputs];
                        let sum: f32 = w.iter().zip(&current).map(|(w, x)| w * x).sum();
                        activation.apply(sum + biases[row])
                    }));
                    std::mem::swap(&mut current, &mut next);
                }
                Layer::Activation(activation) => {
                    for x in &mut current {
                        *x = activation.apply(*x);
                    }
                }
            }
        }
        Ok(current)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ModelError> {
        let mut reader = ByteReader { data, pos: 0 };
        let count = reader.u32()? as usize;
        let mut layers = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let layer = match reader.u32()? {
                KIND_DENSE => {
                    let (weight_dims, weights) = reader.tensor()?;
                    let (bias_dims, biases) = reader.tensor()?;
                    let activation = Activation::from_tag(reader.u32()?)?;
                    let &[outputs, inputs] = weight_dims.as_slice() else {
                        return Err(ModelError::ShapeMismatch(format!(
                            "dense weights have rank {}",
                            weight_dims.len()
                        )));
                    };
                    if bias_dims.as_slice() != [outputs] {
                        return Err(ModelError::ShapeMismatch(format!(
                            "bias dimensions {bias_dims:?} for {outputs} outputs"
                        )));
                    }
                    Layer::Dense {
                        inputs,
                        outputs,
                        weights,
                        biases,
                        activation,
                    }
                }
                KIND_ACTIVATION => Layer::Activation(Activation::from_tag(reader.u32()?)?),
                other => return Err(ModelError::UnsupportedLayer(other)),
            };
            layers.push(layer);
        }
        Self::new(layers)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        push_u32(&mut buf, self.layers.len());
        for layer in &self.layers {
            match layer {
                Layer::Dense {
                    inputs,
                    outputs,
                    weights,
                    biases,
                    activation,
                } => {
                    push_u32(&mut buf, KIND_DENSE as usize);
                    push_tensor(&mut buf, &[*outputs, *inputs], weights);
                    push_tensor(&mut buf, &[*outputs], biases);
                    push_u32(&mut buf, activation.tag() as usize);
                }
                Layer::Activation(activation) => {
                    push_u32(&mut buf, KIND_ACTIVATION as usize);
                    push_u32(&mut buf, activation.tag() as usize);
                }
            }
        }
        buf
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let data = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&data)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, self.to_bytes()).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn push_u32(buf: &mut Vec<u8>, value: usize) {
    buf.extend_from_slice(&(value as u32).to_le_bytes());
}

fn push_tensor(buf: &mut Vec<u8>, dims: &[usize], data: &[f32]) {
    push_u32(buf, dims.len());
    for &dim in dims {
        push_u32(buf, dim);
    }
    for value in data {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl ByteReader<'_> {
    fn take(&mut self, len: usize) -> Result<&[u8], ModelError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ModelError::Truncated(self.pos))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, ModelError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn tensor(&mut self) -> Result<(Vec<usize>, Vec<f32>), ModelError> {
        let rank = self.u32()? as usize;
        if rank == 0 || rank > 4 {
            return Err(ModelError::ShapeMismatch(format!("tensor rank {rank}")));
        }
        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(self.u32()? as usize);
        }
        let len = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .and_then(|n| n.checked_mul(4))
            .ok_or(ModelError::Truncated(self.pos))?;
        let data = self
            .take(len)?
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok((dims, data))
    }
}
