use std::io::Cursor;

use flappy_evolution::{Action, Error, Matrix, NeuralNetwork};
use rand::prelude::SeedableRng;
use rand_pcg::Pcg64;

// --- Fixture helpers ---

fn mat(rows: usize, cols: usize, vals: &[f32]) -> Matrix {
    Matrix::from_vec(rows, cols, vals.to_vec()).unwrap()
}

fn column(vals: &[f32]) -> Matrix {
    mat(vals.len(), 1, vals)
}

/// Network whose every weight and bias entry equals `value`; handy as a
/// marker when checking which parent a layer came from.
fn constant_net(layers: &[usize], value: f32) -> NeuralNetwork {
    let mut weights = Vec::new();
    let mut biases = Vec::new();
    for pair in layers.windows(2) {
        weights.push(mat(pair[1], pair[0], &vec![value; pair[1] * pair[0]]));
        biases.push(column(&vec![value; pair[1]]));
    }
    NeuralNetwork::from_layers(weights, biases).unwrap()
}

// --- Construction ---

#[test]
fn random_network_has_xavier_weights_and_unit_interval_biases() {
    let mut rng = Pcg64::seed_from_u64(1);
    let net = NeuralNetwork::random(&[4, 3, 2], &mut rng).unwrap();

    assert_eq!(net.layer_sizes(), vec![4, 3, 2]);
    assert_eq!(net.layer_count(), 2);

    // fan_in = 4 then 3.
    let bounds = [1.0 / 4.0_f32.sqrt(), 1.0 / 3.0_f32.sqrt()];
    for (w, bound) in net.weights().iter().zip(bounds) {
        assert!(w.as_slice().iter().all(|&v| v.abs() <= bound));
    }
    for b in net.biases() {
        assert_eq!(b.cols(), 1);
        assert!(b.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}

#[test]
fn random_network_rejects_degenerate_layer_vectors() {
    let mut rng = Pcg64::seed_from_u64(1);
    assert!(matches!(
        NeuralNetwork::random(&[5], &mut rng),
        Err(Error::IncompatibleTopology(_))
    ));
    assert!(matches!(
        NeuralNetwork::random(&[2, 0, 1], &mut rng),
        Err(Error::IncompatibleTopology(_))
    ));
}

#[test]
fn from_layers_rejects_broken_chains() {
    // Bias rows do not match weight rows.
    assert!(matches!(
        NeuralNetwork::from_layers(vec![mat(2, 1, &[0.0, 0.0])], vec![column(&[0.0])]),
        Err(Error::IncompatibleTopology(_))
    ));
    // Second layer consumes 3 activations, first produces 2.
    assert!(matches!(
        NeuralNetwork::from_layers(
            vec![mat(2, 1, &[0.0, 0.0]), mat(1, 3, &[0.0, 0.0, 0.0])],
            vec![column(&[0.0, 0.0]), column(&[0.0])],
        ),
        Err(Error::IncompatibleTopology(_))
    ));
}

// --- Inference ---

#[test]
fn single_row_output_flaps_only_above_half() {
    // All-zero weights leave the decision to the output bias:
    // sigmoid(1) > 0.5 flaps, sigmoid(0) == 0.5 glides.
    let zeros_w = vec![mat(3, 2, &[0.0; 6]), mat(1, 3, &[0.0; 3])];
    let flap = NeuralNetwork::from_layers(zeros_w.clone(), vec![column(&[0.0; 3]), column(&[1.0])])
        .unwrap();
    let glide =
        NeuralNetwork::from_layers(zeros_w, vec![column(&[0.0; 3]), column(&[0.0])]).unwrap();

    let input = column(&[1.0, 1.0]);
    assert_eq!(flap.infer(&input).unwrap(), Action::Flap);
    assert_eq!(glide.infer(&input).unwrap(), Action::Glide);
}

#[test]
fn two_row_output_picks_the_strictly_larger_score() {
    let net = NeuralNetwork::from_layers(
        vec![mat(2, 1, &[2.0, -2.0])],
        vec![column(&[0.0, 0.0])],
    )
    .unwrap();
    assert_eq!(net.infer(&column(&[1.0])).unwrap(), Action::Flap);
    assert_eq!(net.infer(&column(&[-1.0])).unwrap(), Action::Glide);
}

#[test]
fn two_row_ties_glide() {
    let net = NeuralNetwork::from_layers(
        vec![mat(2, 1, &[1.0, 1.0])],
        vec![column(&[0.0, 0.0])],
    )
    .unwrap();
    assert_eq!(net.infer(&column(&[1.0])).unwrap(), Action::Glide);
}

#[test]
fn infer_rejects_wrong_input_shape() {
    let net = constant_net(&[2, 3, 1], 0.5);
    assert!(matches!(
        net.infer(&column(&[1.0])),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        net.infer(&mat(1, 2, &[1.0, 1.0])),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn infer_rejects_outputs_wider_than_two() {
    let net = constant_net(&[2, 3], 0.5);
    assert!(matches!(
        net.infer(&column(&[1.0, 1.0])),
        Err(Error::ShapeMismatch { .. })
    ));
}

// --- Mutation ---

#[test]
fn mutate_with_zero_chance_is_a_no_op() {
    let mut rng = Pcg64::seed_from_u64(3);
    let original = NeuralNetwork::random(&[3, 4, 2], &mut rng).unwrap();
    let mut mutated = original.clone();
    mutated.mutate(0.0, &mut rng);
    assert_eq!(mutated, original);
}

#[test]
fn mutate_with_full_chance_perturbs_every_weight_but_no_bias() {
    let mut rng = Pcg64::seed_from_u64(4);
    let original = NeuralNetwork::random(&[3, 4, 2], &mut rng).unwrap();
    let mut mutated = original.clone();
    mutated.mutate(1.0, &mut rng);

    for (before, after) in original.weights().iter().zip(mutated.weights()) {
        for (b, a) in before.as_slice().iter().zip(after.as_slice()) {
            assert_ne!(b, a);
            assert!((a - b).abs() <= 0.1 + f32::EPSILON);
        }
    }
    assert_eq!(mutated.biases(), original.biases());
}

// --- Crossover ---

#[test]
fn self_crossover_reproduces_the_parent() {
    let mut rng = Pcg64::seed_from_u64(5);
    let a = NeuralNetwork::random(&[2, 3, 3, 1], &mut rng).unwrap();
    let (left, right) = NeuralNetwork::crossover(&a, &a).unwrap();
    assert_eq!(left, a);
    assert_eq!(right, a);
}

#[test]
fn crossover_swaps_exactly_the_odd_layers() {
    // Four sizes -> three weight/bias pairs; only index 1 is odd.
    let a = constant_net(&[2, 2, 2, 2], 1.0);
    let b = constant_net(&[2, 2, 2, 2], 2.0);
    let (left, right) = NeuralNetwork::crossover(&a, &b).unwrap();

    let marker = |net: &NeuralNetwork, layer: usize| net.weights()[layer].get(0, 0).unwrap();
    assert_eq!(marker(&left, 0), 1.0);
    assert_eq!(marker(&left, 1), 2.0);
    assert_eq!(marker(&left, 2), 1.0);
    assert_eq!(marker(&right, 0), 2.0);
    assert_eq!(marker(&right, 1), 1.0);
    assert_eq!(marker(&right, 2), 2.0);
    // Biases travel with their layer.
    assert_eq!(left.biases()[1].get(0, 0).unwrap(), 2.0);
    assert_eq!(right.biases()[1].get(0, 0).unwrap(), 1.0);
    // Parents are untouched.
    assert_eq!(a, constant_net(&[2, 2, 2, 2], 1.0));
    assert_eq!(b, constant_net(&[2, 2, 2, 2], 2.0));
}

#[test]
fn crossover_rejects_mismatched_topologies() {
    let a = constant_net(&[2, 3, 1], 1.0);
    let b = constant_net(&[2, 3, 3, 1], 2.0);
    assert!(matches!(
        NeuralNetwork::crossover(&a, &b),
        Err(Error::IncompatibleTopology(_))
    ));
}

// --- Persistence ---

#[test]
fn export_then_import_is_bit_exact() {
    let mut rng = Pcg64::seed_from_u64(6);
    let net = NeuralNetwork::random(&[4, 5, 2], &mut rng).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("brain.txt");
    net.export(&path).unwrap();
    let restored = NeuralNetwork::import(&path).unwrap();

    assert_eq!(restored, net);
}

#[test]
fn write_then_read_round_trips_in_memory() {
    let mut rng = Pcg64::seed_from_u64(7);
    let net = NeuralNetwork::random(&[2, 3, 1], &mut rng).unwrap();

    let mut buf = Vec::new();
    net.write_to(&mut buf).unwrap();
    let restored = NeuralNetwork::read_from(Cursor::new(buf), "memory").unwrap();
    assert_eq!(restored, net);
}

#[test]
fn serialized_fixture_reproduces_its_decision() {
    // [2, 3, 1] network: zero weights throughout, output bias 1, so the
    // final activation is sigmoid(1) ~ 0.73 whatever the input.
    let fixture = "3 2 0 0 0 0 0 0 3 1 0 0 0\n1 3 0 0 0 1 1 1\n";
    let net = NeuralNetwork::read_from(Cursor::new(fixture), "fixture").unwrap();
    assert_eq!(net.layer_sizes(), vec![2, 3, 1]);

    let input = column(&[1.0, 1.0]);
    let first = net.infer(&input).unwrap();
    assert_eq!(first, Action::Flap);
    for _ in 0..10 {
        assert_eq!(net.infer(&input).unwrap(), first);
    }
}

#[test]
fn import_reports_position_of_a_bad_token() {
    let err = NeuralNetwork::read_from(Cursor::new("abc"), "bad").unwrap_err();
    match err {
        Error::MalformedSerialization { origin, line, token, .. } => {
            assert_eq!(origin, "bad");
            assert_eq!(line, 1);
            assert_eq!(token, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn import_reports_a_truncated_line() {
    // Declares a 2x2 weight block but provides three entries, then ends.
    let err = NeuralNetwork::read_from(Cursor::new("2 2 1 0 0"), "short").unwrap_err();
    match err {
        Error::MalformedSerialization { line, token, .. } => {
            assert_eq!(line, 1);
            assert_eq!(token, 6);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn import_rejects_bias_shape_mismatch() {
    // 1x1 weight paired with a 2x1 bias.
    let err = NeuralNetwork::read_from(Cursor::new("1 1 0 2 1 0 0"), "bias").unwrap_err();
    assert!(matches!(err, Error::MalformedSerialization { .. }));
}

#[test]
fn import_rejects_an_incompatible_layer_chain() {
    // First layer produces 1 activation, second consumes 3.
    let fixture = "1 2 0 0 1 1 0\n1 3 0 0 0 1 1 0\n";
    let err = NeuralNetwork::read_from(Cursor::new(fixture), "chain").unwrap_err();
    match err {
        Error::MalformedSerialization { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn import_rejects_trailing_tokens() {
    let err = NeuralNetwork::read_from(Cursor::new("1 1 0 1 1 0 9"), "extra").unwrap_err();
    assert!(matches!(err, Error::MalformedSerialization { .. }));
}

#[test]
fn import_rejects_an_empty_file() {
    let err = NeuralNetwork::read_from(Cursor::new(""), "empty").unwrap_err();
    assert!(matches!(err, Error::MalformedSerialization { .. }));
}

#[test]
fn import_rejects_zero_dimensions() {
    let err = NeuralNetwork::read_from(Cursor::new("0 2 1 1 0"), "zero").unwrap_err();
    assert!(matches!(err, Error::MalformedSerialization { .. }));
}
