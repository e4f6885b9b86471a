//! Sigmoid feedforward network: the evolvable "brain" of one bird.
//!
//! A network is defined by a layer-size vector `[l0, l1, ..., lk]` and owns
//! one weight matrix of shape `(l[i+1], l[i])` and one bias column of shape
//! `(l[i+1], 1)` per layer transition. Networks are never resized after
//! construction; evolution only perturbs weights ([`mutate`]) and swaps whole
//! layers between two parents ([`crossover`]).
//!
//! # Persistence
//!
//! A network round-trips through a line-oriented text format, one layer per
//! line:
//!
//! ```text
//! rows_w cols_w w_00 w_01 ... rows_b cols_b b_00 b_10 ...
//! ```
//!
//! with all values flattened row-major and floats printed in their shortest
//! exact form, so `export` followed by `import` reproduces bit-identical
//! weights and biases.
//!
//! [`mutate`]: NeuralNetwork::mutate
//! [`crossover`]: NeuralNetwork::crossover

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::SplitWhitespace;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Magnitude of a single weight perturbation: `mutate` adds a uniform draw
/// from `[-MUTATION_SPAN, MUTATION_SPAN]` to each selected entry.
const MUTATION_SPAN: f32 = 0.1;

/// Binary decision produced by [`NeuralNetwork::infer`] for one simulation
/// tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Apply the jump impulse this tick.
    Flap,
    /// Do nothing and keep falling.
    Glide,
}

impl Action {
    pub fn is_flap(self) -> bool {
        matches!(self, Action::Flap)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuralNetwork {
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl NeuralNetwork {
    /// Randomly initialized network for the given layer-size vector.
    ///
    /// Weights are drawn uniformly from `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`
    /// (Xavier-style), biases uniformly from `[0, 1]`.
    pub fn random<R: Rng>(layers: &[usize], rng: &mut R) -> Result<Self> {
        if layers.len() < 2 {
            return Err(Error::IncompatibleTopology(format!(
                "a network needs at least an input and an output layer, got {} layer(s)",
                layers.len()
            )));
        }
        if let Some(&width) = layers.iter().find(|&&w| w == 0) {
            return Err(Error::IncompatibleTopology(format!(
                "layer width must be positive, got {width}"
            )));
        }

        let mut weights = Vec::with_capacity(layers.len() - 1);
        let mut biases = Vec::with_capacity(layers.len() - 1);
        for pair in layers.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let bound = 1.0 / (fan_in as f32).sqrt();
            weights.push(Matrix::random(fan_out, fan_in, -bound, bound, rng));
            biases.push(Matrix::random(fan_out, 1, 0.0, 1.0, rng));
        }
        Ok(Self { weights, biases })
    }

    /// Assembles a network from explicit weight and bias matrices, checking
    /// the chain invariants (`biases[i]` is a column matching `weights[i]`,
    /// consecutive layers are shape-compatible for multiplication).
    pub fn from_layers(weights: Vec<Matrix>, biases: Vec<Matrix>) -> Result<Self> {
        if weights.is_empty() || weights.len() != biases.len() {
            return Err(Error::IncompatibleTopology(format!(
                "{} weight matrices vs {} bias matrices",
                weights.len(),
                biases.len()
            )));
        }
        for (i, (w, b)) in weights.iter().zip(&biases).enumerate() {
            if b.rows() != w.rows() || b.cols() != 1 {
                return Err(Error::IncompatibleTopology(format!(
                    "layer {i}: bias is {}x{}, expected {}x1",
                    b.rows(),
                    b.cols(),
                    w.rows()
                )));
            }
        }
        for (i, pair) in weights.windows(2).enumerate() {
            if pair[1].cols() != pair[0].rows() {
                return Err(Error::IncompatibleTopology(format!(
                    "layer {} consumes {} activations but layer {} produces {}",
                    i + 1,
                    pair[1].cols(),
                    i,
                    pair[0].rows()
                )));
            }
        }
        Ok(Self { weights, biases })
    }

    /// Number of layer transitions (weight/bias pairs).
    pub fn layer_count(&self) -> usize {
        self.weights.len()
    }

    /// Reconstructs the layer-size vector `[l0, l1, ..., lk]`.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.weights.len() + 1);
        sizes.push(self.weights[0].cols());
        sizes.extend(self.weights.iter().map(Matrix::rows));
        sizes
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    /// Feeds `input` (shape `(l0, 1)`) through the network and collapses the
    /// final activation into a binary action.
    ///
    /// A single-row output flaps when it exceeds `0.5`; a two-row output is
    /// treated as two competing scores and flaps when the first strictly
    /// beats the second, so ties glide. Both historical output shapes are
    /// kept; anything wider is a contract violation.
    pub fn infer(&self, input: &Matrix) -> Result<Action> {
        let expected = self.weights[0].cols();
        if input.rows() != expected || input.cols() != 1 {
            return Err(Error::shape(
                "infer",
                (expected, 1),
                (input.rows(), input.cols()),
            ));
        }

        let mut activation = input.clone();
        for (w, b) in self.weights.iter().zip(&self.biases) {
            activation = w.matmul(&activation)?.add(b)?.map(sigmoid);
        }

        match activation.rows() {
            1 => Ok(if activation.get(0, 0)? > 0.5 {
                Action::Flap
            } else {
                Action::Glide
            }),
            2 => Ok(if activation.get(0, 0)? > activation.get(1, 0)? {
                Action::Flap
            } else {
                Action::Glide
            }),
            rows => Err(Error::shape("infer output", (2, 1), (rows, 1))),
        }
    }

    /// Perturbs each weight entry independently with probability `chance`,
    /// adding a uniform draw from `[-0.1, 0.1]`.
    ///
    /// Biases are left untouched; only weights carry mutation pressure.
    pub fn mutate<R: Rng>(&mut self, chance: f32, rng: &mut R) {
        for w in &mut self.weights {
            for entry in w.as_mut_slice() {
                if rng.random::<f32>() < chance {
                    *entry += rng.random_range(-MUTATION_SPAN..=MUTATION_SPAN);
                }
            }
        }
    }

    /// Layer-level recombination: starting from deep copies of both parents,
    /// the weight/bias pair at every odd layer index is swapped, so each
    /// child's chain alternates between the two parents. Both children are
    /// returned by value.
    pub fn crossover(a: &Self, b: &Self) -> Result<(Self, Self)> {
        if a.layer_sizes() != b.layer_sizes() {
            return Err(Error::IncompatibleTopology(format!(
                "cannot recombine {:?} with {:?}",
                a.layer_sizes(),
                b.layer_sizes()
            )));
        }
        let mut left = a.clone();
        let mut right = b.clone();
        for i in (1..left.weights.len()).step_by(2) {
            std::mem::swap(&mut left.weights[i], &mut right.weights[i]);
            std::mem::swap(&mut left.biases[i], &mut right.biases[i]);
        }
        Ok((left, right))
    }

    /// Writes the layer-by-layer text dump to `path`.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Reads a network previously written by [`export`](Self::export).
    pub fn import<P: AsRef<Path>>(path: P) -> Result<Self> {
        let origin = path.as_ref().display().to_string();
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file), &origin)
    }

    /// Serializes the network to any writer, one layer per line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (w, b) in self.weights.iter().zip(&self.biases) {
            write!(out, "{} {}", w.rows(), w.cols())?;
            for v in w.as_slice() {
                write!(out, " {v}")?;
            }
            write!(out, " {} {}", b.rows(), b.cols())?;
            for v in b.as_slice() {
                write!(out, " {v}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Parses a network from any buffered reader. `origin` names the source
    /// in error reports (usually the file path).
    pub fn read_from<R: BufRead>(reader: R, origin: &str) -> Result<Self> {
        let mut weights: Vec<Matrix> = Vec::new();
        let mut biases = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut tokens = Tokens::new(&line, origin, index + 1);
            let w = tokens.matrix()?;
            let b = tokens.matrix()?;
            tokens.finish()?;

            if b.rows() != w.rows() || b.cols() != 1 {
                return Err(tokens.malformed(format!(
                    "bias is {}x{}, expected {}x1",
                    b.rows(),
                    b.cols(),
                    w.rows()
                )));
            }
            if let Some(prev) = weights.last() {
                if w.cols() != prev.rows() {
                    return Err(tokens.malformed(format!(
                        "layer consumes {} activations but the previous layer produces {}",
                        w.cols(),
                        prev.rows()
                    )));
                }
            }
            weights.push(w);
            biases.push(b);
        }

        if weights.is_empty() {
            return Err(Error::MalformedSerialization {
                origin: origin.to_string(),
                line: 0,
                token: 0,
                reason: "no layers found".to_string(),
            });
        }
        Ok(Self { weights, biases })
    }
}

/// Whitespace tokenizer that tracks its position for error reports.
struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    origin: &'a str,
    line: usize,
    /// 1-based index of the last token consumed.
    index: usize,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str, origin: &'a str, number: usize) -> Self {
        Self {
            inner: line.split_whitespace(),
            origin,
            line: number,
            index: 0,
        }
    }

    fn malformed(&self, reason: String) -> Error {
        Error::MalformedSerialization {
            origin: self.origin.to_string(),
            line: self.line,
            token: self.index,
            reason,
        }
    }

    fn next(&mut self) -> Result<&'a str> {
        self.index += 1;
        self.inner
            .next()
            .ok_or_else(|| self.malformed("unexpected end of line".to_string()))
    }

    fn usize(&mut self) -> Result<usize> {
        let token = self.next()?;
        token
            .parse()
            .map_err(|_| self.malformed(format!("expected a dimension, got {token:?}")))
    }

    fn f32(&mut self) -> Result<f32> {
        let token = self.next()?;
        token
            .parse()
            .map_err(|_| self.malformed(format!("expected a float, got {token:?}")))
    }

    /// Reads `rows cols` followed by `rows * cols` row-major floats.
    fn matrix(&mut self) -> Result<Matrix> {
        let rows = self.usize()?;
        let cols = self.usize()?;
        let len = rows
            .checked_mul(cols)
            .filter(|&n| n > 0)
            .ok_or_else(|| self.malformed(format!("invalid matrix shape {rows}x{cols}")))?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(self.f32()?);
        }
        Matrix::from_vec(rows, cols, data)
    }

    fn finish(&mut self) -> Result<()> {
        if self.inner.next().is_some() {
            self.index += 1;
            return Err(self.malformed("trailing data after the bias block".to_string()));
        }
        Ok(())
    }
}
