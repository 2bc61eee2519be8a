//! Write then read every writable format through the dispatch layer.

use approx::assert_abs_diff_eq;
use std::path::Path;
use vfx_lutio::{
    AscCdl, Domain, Format, Lut, Lut1D, Lut3D, Lut3x1D, LutError, LutSequence, Matrix, Operator,
    read_lut, write_lut,
};

fn assert_rows_eq(a: &[[f64; 3]], b: &[[f64; 3]], epsilon: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        for c in 0..3 {
            assert_abs_diff_eq!(x[c], y[c], epsilon = epsilon);
        }
    }
}

fn graded_cube(size: usize, domain: Domain<[f64; 3]>) -> Lut3D {
    let table = Lut3D::linear_table(size, &Domain::unit())
        .into_iter()
        .map(|[r, g, b]| [r * r, g.sqrt(), (r + b) * 0.5])
        .collect();
    Lut3D::new(table, size, domain).unwrap()
}

fn roundtrip(lut: &Lut, path: &Path, decimals: usize, method: Option<Format>) -> Lut {
    write_lut(lut, path, decimals, method).unwrap();
    read_lut(path, method).unwrap()
}

#[test]
fn spi3d_16_cube_keeps_size_comments_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let lut = graded_cube(16, Domain::unit())
        .with_comments(["Comments are ignored by most parsers", "A second comment"]);

    let back = roundtrip(&lut.clone().into(), &dir.path().join("graded.spi3d"), 7, None);
    let back = back.as_lut3d().expect("LUT3D");
    assert_eq!(back.size, 16);
    assert_eq!(back.comments, lut.comments);
    assert_eq!(back.name, "graded");
    assert_rows_eq(&back.table, &lut.table, 1e-7);
}

#[test]
fn spi3d_index_columns_match_lattice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lattice.spi3d");
    write_lut(&graded_cube(5, Domain::unit()).into(), &path, 7, None).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let indexes: Vec<[usize; 3]> = text
        .lines()
        .skip(3)
        .map(|line| {
            let mut it = line.split_whitespace().map(|t| t.parse::<usize>().unwrap());
            [it.next().unwrap(), it.next().unwrap(), it.next().unwrap()]
        })
        .collect();
    assert_eq!(indexes, vfx_lutio::spi::lattice_indexes(5));
}

#[test]
fn spi3d_write_checks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.spi3d");

    let err = write_lut(&Lut1D::identity(8).into(), &path, 7, None).unwrap_err();
    assert!(matches!(err, LutError::TypeMismatch(_)), "{err}");

    let wide = graded_cube(3, Domain::new([-0.5; 3], [1.5; 3]));
    let err = write_lut(&wide.into(), &path, 7, None).unwrap_err();
    assert!(matches!(err, LutError::Invariant(_)), "{err}");

    // A sequence is narrowed to its first table.
    let seq = LutSequence::new([
        Operator::from(graded_cube(3, Domain::unit()).with_name("first")),
        Operator::from(Matrix::identity()),
    ]);
    let back = roundtrip(&Lut::Sequence(seq), &path, 7, None);
    assert_eq!(back.as_lut3d().map(|l| l.size), Some(3));
}

#[test]
fn iridas_cube_3d() {
    let dir = tempfile::tempdir().unwrap();
    let lut = graded_cube(9, Domain::new([-0.1, 0.0, 0.0], [1.2, 1.0, 2.0]))
        .with_name("Graded Look")
        .with_comments(["first", "second"]);

    let back = roundtrip(&lut.clone().into(), &dir.path().join("graded.cube"), 6, None);
    let back = back.as_lut3d().unwrap();
    assert_eq!(back.name, "Graded Look");
    assert_eq!(back.comments, lut.comments);
    assert_eq!(back.domain, lut.domain);
    assert_rows_eq(&back.table, &lut.table, 1e-6);
}

#[test]
fn iridas_cube_1d() {
    let dir = tempfile::tempdir().unwrap();
    let table = (0..32).map(|i| {
        let x = i as f64 / 31.0;
        [x.powf(2.2), x, x.sqrt()]
    });
    let lut = Lut3x1D::new(table.collect(), Domain::new([0.0; 3], [4.0; 3]))
        .unwrap()
        .with_name("curves");

    let back = roundtrip(&lut.clone().into(), &dir.path().join("curves.cube"), 7, None);
    let back = back.as_lut3x1d().unwrap();
    assert_eq!(back.domain, lut.domain);
    assert_rows_eq(&back.table, &lut.table, 1e-7);

    // A single-channel curve is widened.
    let curve = Lut1D::new(vec![0.0, 0.2, 1.0], Domain::new(0.0, 1.0))
        .unwrap()
        .with_name("curve");
    let back = roundtrip(&curve.clone().into(), &dir.path().join("curve.cube"), 7, None);
    assert_eq!(back.as_lut3x1d(), Some(&curve.to_lut3x1d()));
}

#[test]
fn resolve_shaper_and_cube() {
    let dir = tempfile::tempdir().unwrap();
    let shaper = Lut3x1D::new(
        (0..6).map(|i| [i as f64 / 5.0; 3]).collect(),
        Domain::new([-0.125; 3], [1.125; 3]),
    )
    .unwrap();
    let cube = graded_cube(4, Domain::unit()).with_name("Look").with_comments(["graded"]);
    let seq = LutSequence::new([Operator::from(shaper.clone()), Operator::from(cube.clone())]);

    let back = roundtrip(
        &Lut::Sequence(seq),
        &dir.path().join("look.cube"),
        7,
        Some(Format::ResolveCube),
    );
    let seq = back.as_sequence().expect("sequence");
    let (Operator::Lut3x1D(s), Operator::Lut3D(c)) = (&seq[0], &seq[1]) else {
        panic!("expected shaper then cube");
    };
    assert_eq!(s.name, "Look - Shaper");
    assert_eq!(s.domain, shaper.domain);
    assert_rows_eq(&s.table, &shaper.table, 1e-7);
    assert_eq!(c.name, "Look - Cube");
    assert_eq!(c.comments, ["graded"]);
    assert_rows_eq(&c.table, &cube.table, 1e-7);
}

#[test]
fn spi1d_three_components() {
    let dir = tempfile::tempdir().unwrap();
    let lut = Lut3x1D::new(
        vec![[0.0, 0.0, 0.0], [0.3, 0.4, 0.5], [2.0, 1.5, 1.0]],
        Domain::new([0.0; 3], [2.0; 3]),
    )
    .unwrap()
    .with_comments(["per channel"]);

    let back = roundtrip(&lut.clone().into(), &dir.path().join("rgb.spi1d"), 7, None);
    let back = back.as_lut3x1d().unwrap();
    assert_eq!(back.domain, lut.domain);
    assert_eq!(back.comments, ["per channel"]);
    assert_rows_eq(&back.table, &lut.table, 1e-7);

    let skewed = Lut3x1D::new(lut.table.clone(), Domain::new([0.0; 3], [2.0, 2.0, 3.0])).unwrap();
    let err = write_lut(&skewed.into(), dir.path().join("skewed.spi1d"), 7, None).unwrap_err();
    assert!(matches!(err, LutError::Invariant(_)), "{err}");
}

#[test]
fn spimtx_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let mut matrix = Matrix::new(
        [[1.2249, -0.2247, 0.0], [-0.042, 1.0419, 0.0], [-0.0196, -0.0786, 1.0979]],
        [0.01, 0.0, -0.02],
    );
    matrix.comments = vec!["display".into()];

    let back = roundtrip(&matrix.clone().into(), &dir.path().join("display.spimtx"), 7, None);
    let back = back.as_matrix().unwrap();
    assert_eq!(back.comments, ["display"]);
    for row in 0..3 {
        assert_rows_eq(&[back.matrix[row]], &[matrix.matrix[row]], 1e-7);
    }
    assert_rows_eq(&[back.offset], &[matrix.offset], 1e-9);

    let err = write_lut(&Lut3D::identity(2).into(), dir.path().join("x.spimtx"), 7, None)
        .unwrap_err();
    assert!(matches!(err, LutError::TypeMismatch(_)));
}

#[test]
fn csp_with_shaper() {
    let dir = tempfile::tempdir().unwrap();
    let shaper = Lut3x1D::new(
        (0..5).map(|i| [(i as f64 / 4.0).powi(2); 3]).collect(),
        Domain::new([-0.1; 3], [1.2; 3]),
    )
    .unwrap();
    let cube = graded_cube(3, Domain::unit()).with_name("Look").with_comments(["c1"]);
    let seq = LutSequence::new([Operator::from(shaper.clone()), Operator::from(cube.clone())]);

    let back = roundtrip(&Lut::Sequence(seq), &dir.path().join("look.csp"), 7, None);
    let seq = back.as_sequence().expect("shaper stays a stage");
    let (Operator::Lut3x1D(s), Operator::Lut3D(c)) = (&seq[0], &seq[1]) else {
        panic!("expected shaper then cube");
    };
    assert_eq!(s.name, "Look - Shaper");
    assert_rows_eq(&s.table, &shaper.table, 1e-7);
    assert_rows_eq(&[s.domain.min(), s.domain.max()], &[[-0.1; 3], [1.2; 3]], 1e-7);
    assert_eq!(c.name, "Look");
    assert_eq!(c.comments, ["c1"]);
    assert_rows_eq(&c.table, &cube.table, 1e-7);
}

#[test]
fn csp_plain_table() {
    let dir = tempfile::tempdir().unwrap();
    let cube = graded_cube(5, Domain::new([0.0; 3], [2.0; 3])).with_name("Plain");
    let back = roundtrip(&cube.clone().into(), &dir.path().join("plain.csp"), 7, None);
    let back = back.as_lut3d().expect("domain folds back into the table");
    assert_eq!(back.domain, cube.domain);
    assert_rows_eq(&back.table, &cube.table, 1e-7);
}

#[test]
fn cdl_flavors() {
    let dir = tempfile::tempdir().unwrap();
    let mut cc = AscCdl::new([1.1, 1.0, 0.9], [0.01, 0.0, -0.02], [1.0, 1.2, 0.8]).with_id("sh010");
    cc.name = "sh010".into();
    cc.saturation = 0.85;
    cc.comments = vec!["warm".into()];

    let back = roundtrip(&cc.clone().into(), &dir.path().join("sh010.cc"), 7, None);
    assert_eq!(back.as_cdl(), Some(&cc));

    let mut other = AscCdl::default().with_id("sh020");
    other.name = "sh020".into();
    let both = Lut::CdlCollection(vec![cc.clone(), other.clone()]);
    for name in ["grades.ccc", "grades.cdl"] {
        let back = roundtrip(&both, &dir.path().join(name), 7, None);
        assert_eq!(back.cdls(), Some(&[cc.clone(), other.clone()][..]), "{name}");
    }

    // A single correction file cannot hold two.
    let err = write_lut(&both, dir.path().join("two.cc"), 7, None).unwrap_err();
    assert!(matches!(err, LutError::TypeMismatch(_)), "{err}");
}

#[test]
fn decimals_control_precision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coarse.cube");
    write_lut(&graded_cube(2, Domain::unit()).into(), &path, 3, None).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.lines().any(|line| line == "0.000 0.000 0.000"), "{text}");
    assert!(text.contains("DOMAIN_MAX 1.000 1.000 1.000"));
}
