//! E5: build, save, load, save again — byte-identical files and equal
//! node-by-node adjacency.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vamana::builder::{build_unfiltered, ConnectionMode, NullObserver, VamanaParams};
use vamana::persistence::{load, save};
use vamana::point::{Point, PointStore};

#[test]
fn e5_build_save_load_save_is_byte_identical() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let points = PointStore::new(
        (0..40).map(|i| Point::new(i, (0..4).map(|_| rng.random_range(-5.0..5.0)).collect())).collect(),
    )
    .unwrap();
    let params = VamanaParams { alpha: 1.2, l: 16, r: 8 };
    let (graph, _cache) =
        build_unfiltered(&points, params, ConnectionMode::Filled, &mut rng, &mut NullObserver).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let first_path = dir.path().join("first.txt");
    let second_path = dir.path().join("second.txt");

    save(&first_path, &points, &graph).unwrap();
    let (loaded_points, loaded_graph) = load(&first_path).unwrap();
    save(&second_path, &loaded_points, &loaded_graph).unwrap();

    let first = std::fs::read_to_string(&first_path).unwrap();
    let second = std::fs::read_to_string(&second_path).unwrap();
    assert_eq!(first, second);

    for i in 0..points.len() {
        assert_eq!(graph.node(i).unwrap().neighbors(), loaded_graph.node(i).unwrap().neighbors());
    }
}
