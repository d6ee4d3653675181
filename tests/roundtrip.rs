use std::collections::HashSet;

use corto_oxide::prelude::*;
use glam::Vec3;
use proptest::prelude::*;

fn compress(mesh: &Mesh, cfg: encode::Config) -> (Vec<u8>, EncodeReport) {
    let mut out = Vec::new();
    let report = encode(mesh, &mut out, cfg).unwrap();
    assert_eq!(report.total_bytes, out.len());
    (out, report)
}

/// rotates a face so its smallest index comes first, keeping the winding.
fn canonical(f: [u32; 3]) -> [u32; 3] {
    let k = (0..3).min_by_key(|&k| f[k]).unwrap_or(0);
    [f[k], f[(k + 1) % 3], f[(k + 2) % 3]]
}

/// the faces of 'original' in decoded indices, next to the decoded faces, both sorted.
fn face_sets(original: &[[u32; 3]], order: &[u32], decoded: &[[u32; 3]]) -> (Vec<[u32; 3]>, Vec<[u32; 3]>) {
    let mut expected = original.iter()
        .map(|f| canonical(f.map(|v| order[v as usize])))
        .collect::<Vec<_>>();
    let mut found = decoded.iter().copied().map(canonical).collect::<Vec<_>>();
    expected.sort();
    found.sort();
    (expected, found)
}

fn positions_of(mesh: &Mesh) -> Vec<[f32; 3]> {
    mesh.get_attribute("position").unwrap()
        .as_slice::<f32>().unwrap()
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect()
}

/// a cube made of twelve unconnected triangles, wound outwards.
fn cube_soup() -> Mesh {
    let corners = |x: f32, y: f32, z: f32| [x, y, z];
    let quads = [
        [corners(-1., -1., 1.), corners(1., -1., 1.), corners(1., 1., 1.), corners(-1., 1., 1.)],
        [corners(1., -1., -1.), corners(-1., -1., -1.), corners(-1., 1., -1.), corners(1., 1., -1.)],
        [corners(1., -1., 1.), corners(1., -1., -1.), corners(1., 1., -1.), corners(1., 1., 1.)],
        [corners(-1., -1., -1.), corners(-1., -1., 1.), corners(-1., 1., 1.), corners(-1., 1., -1.)],
        [corners(-1., 1., 1.), corners(1., 1., 1.), corners(1., 1., -1.), corners(-1., 1., -1.)],
        [corners(-1., -1., -1.), corners(1., -1., -1.), corners(1., -1., 1.), corners(-1., -1., 1.)],
    ];
    let mut positions = Vec::new();
    for q in quads {
        for k in [0, 1, 2, 0, 2, 3] {
            positions.extend_from_slice(&q[k]);
        }
    }
    let faces = (0..12).map(|f| [3 * f, 3 * f + 1, 3 * f + 2]).collect();
    let mut builder = MeshBuilder::new();
    builder.set_faces(faces);
    builder.add_positions(positions).unwrap();
    builder.build().unwrap()
}

/// a bumpy height field over a 'w' by 'h' grid with normals, colors and uvs.
fn terrain(w: u32, h: u32) -> Mesh {
    let height = |x: f32, y: f32| (x * 0.7).sin() * (y * 0.5).cos();
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut colors = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let (fx, fy) = (x as f32, y as f32);
            positions.extend_from_slice(&[fx, fy, height(fx, fy)]);
            let dx = 0.7 * (fx * 0.7).cos() * (fy * 0.5).cos();
            let dy = -0.5 * (fx * 0.7).sin() * (fy * 0.5).sin();
            normals.extend_from_slice(&Vec3::new(-dx, -dy, 1.0).normalize().to_array());
            uvs.extend_from_slice(&[fx / (w - 1) as f32, fy / (h - 1) as f32]);
            colors.extend_from_slice(&[(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) * 11 % 256) as u8, 255]);
        }
    }
    let mut faces = Vec::new();
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let v = y * w + x;
            faces.push([v, v + 1, v + w + 1]);
            faces.push([v, v + w + 1, v + w]);
        }
    }
    let mut builder = MeshBuilder::new();
    builder.set_faces(faces);
    builder.add_positions(positions).unwrap();
    builder.add_normals(normals).unwrap();
    builder.add_uvs(uvs).unwrap();
    builder.add_colors(colors, 4).unwrap();
    builder.build().unwrap()
}

#[test]
fn cube_collapses_to_its_corners() {
    let mesh = cube_soup();
    let cfg = encode::Config::default().with_attribute(
        "position",
        encode::AttributeConfig::Generic { quantization: encode::Quantization::Bits(1), strategy: Strategy::PARALLEL },
    );
    let (data, report) = compress(&mesh, cfg);
    let decoded = decode(&data, decode::Config::default()).unwrap();

    assert_eq!(decoded.num_faces(), 12);
    assert_eq!(decoded.num_vertices(), 36);
    let positions = positions_of(&decoded);
    let corners = positions.iter().map(|p| p.map(f32::to_bits)).collect::<HashSet<_>>();
    assert_eq!(corners.len(), 8);
    for (i, p) in positions_of(&mesh).iter().enumerate() {
        assert_eq!(positions[report.vertex_order[i] as usize], *p);
    }
    let (expected, found) = face_sets(mesh.get_faces(), &report.vertex_order, decoded.get_faces());
    assert_eq!(expected, found);
}

#[test]
fn single_triangle() {
    let mut builder = MeshBuilder::new();
    builder.set_faces(vec![[0, 1, 2]]);
    builder.add_positions(vec![0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
    let mesh = builder.build().unwrap();
    let (data, report) = compress(&mesh, encode::Config::default());

    assert_eq!(report.symbols.vertex, 1);
    assert_eq!(report.symbols.boundary, 3);
    assert_eq!(report.symbols.total(), 4);
    let decoded = decode(&data, decode::Config::default()).unwrap();
    assert_eq!(decoded.get_faces(), &[[0, 1, 2]]);
    assert_eq!(positions_of(&decoded), positions_of(&mesh));
}

#[test]
fn terrain_attributes_stay_close() {
    let mesh = terrain(9, 7);
    let (data, report) = compress(&mesh, encode::Config::default());
    assert_eq!(report.attributes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), ["position", "normal", "uv", "color"]);
    let decoded = decode(&data, decode::Config::default()).unwrap();
    assert_eq!(decoded.num_vertices(), mesh.num_vertices());
    let order = &report.vertex_order;

    let (expected, found) = face_sets(mesh.get_faces(), order, decoded.get_faces());
    assert_eq!(expected, found);

    let original = mesh.get_attribute("normal").unwrap().as_slice::<f32>().unwrap();
    let normals = decoded.get_attribute("normal").unwrap().as_slice::<f32>().unwrap();
    for (i, n) in original.chunks_exact(3).enumerate() {
        let t = order[i] as usize * 3;
        let d = Vec3::from_slice(&normals[t..t + 3]);
        assert!(d.angle_between(Vec3::from_slice(n)) < 0.01, "normal {i}");
    }

    let original = mesh.get_attribute("uv").unwrap().as_slice::<f32>().unwrap();
    let uvs = decoded.get_attribute("uv").unwrap().as_slice::<f32>().unwrap();
    for (i, uv) in original.chunks_exact(2).enumerate() {
        let t = order[i] as usize * 2;
        for k in 0..2 {
            assert!((uvs[t + k] - uv[k]).abs() <= 1.0 / 4096.0 + 1e-6, "uv {i}");
        }
    }

    let original = mesh.get_attribute("color").unwrap().as_slice::<u8>().unwrap();
    let colors = decoded.get_attribute("color").unwrap().as_slice::<u8>().unwrap();
    for (i, c) in original.chunks_exact(4).enumerate() {
        let t = order[i] as usize * 4;
        for k in 0..4 {
            assert!((colors[t + k] as i32 - c[k] as i32).abs() <= 4, "color {i}");
        }
    }
}

#[test]
fn positions_alone_predict_normals_on_decode() {
    let mesh = terrain(5, 5);
    let cfg = encode::Config::default().with_attribute(
        "normal",
        encode::AttributeConfig::Normal { bits: 12, prediction: Some(NormalPrediction::Border) },
    );
    let (data, report) = compress(&mesh, cfg);
    let decoded = decode(&data, decode::Config::default()).unwrap();
    let normals = decoded.get_attribute("normal").unwrap().as_slice::<f32>().unwrap();
    // the rim keeps its normals, the interior gets unit vectors estimated from the surface.
    for (i, n) in mesh.get_attribute("normal").unwrap().as_slice::<f32>().unwrap().chunks_exact(3).enumerate() {
        let (x, y) = (i % 5, i / 5);
        let t = report.vertex_order[i] as usize * 3;
        let d = Vec3::from_slice(&normals[t..t + 3]);
        assert!((d.length() - 1.0).abs() < 1e-3);
        if x == 0 || y == 0 || x == 4 || y == 4 {
            assert!(d.angle_between(Vec3::from_slice(n)) < 0.01, "boundary normal {i}");
        }
    }
}

#[test]
fn outputs_can_change_format() {
    let mesh = terrain(4, 4);
    let (data, _) = compress(&mesh, encode::Config::default());
    let cfg = decode::Config::default()
        .with_output("normal", decode::OutputFormat::new(ComponentDataType::I16))
        .with_output("color", decode::OutputFormat::new(ComponentDataType::F32).with_components(3))
        .with_output("position", decode::OutputFormat::new(ComponentDataType::F64));
    let decoded = decode(&data, cfg).unwrap();
    assert_eq!(decoded.get_attribute("normal").unwrap().get_component_type(), ComponentDataType::I16);
    let color = decoded.get_attribute("color").unwrap();
    assert_eq!(color.get_num_components(), 3);
    assert!(color.as_slice::<f32>().unwrap().iter().all(|c| (0.0..=1.0).contains(c)));
    assert!(decoded.get_attribute("position").unwrap().as_slice::<f64>().is_some());
}

#[test]
fn groups_and_metadata_survive() {
    let mut mesh_builder = MeshBuilder::new();
    let base = terrain(5, 4);
    mesh_builder.set_faces(base.get_faces().to_vec());
    for att in base.get_attributes() {
        mesh_builder.add_attribute(att.clone());
    }
    mesh_builder
        .add_group(Group::new(10).with_property("material", "grass"))
        .add_group(Group::new(base.num_faces() as u32).with_property("material", "rock"))
        .add_metadata("author", "survey team")
        .add_metadata("units", "meters");
    let mesh = mesh_builder.build().unwrap();

    let (data, report) = compress(&mesh, encode::Config::default());
    let decoded = decode(&data, decode::Config::default()).unwrap();
    assert_eq!(decoded.get_groups(), mesh.get_groups());
    assert_eq!(decoded.get_metadata(), mesh.get_metadata());

    // faces keep their group.
    let order = &report.vertex_order;
    let (first, _) = face_sets(&mesh.get_faces()[..10], order, &[]);
    let (_, decoded_first) = face_sets(&[], order, &decoded.get_faces()[..10]);
    assert_eq!(first, decoded_first);
}

#[test]
fn raw_entropy_mode() {
    let mesh = terrain(6, 6);
    let raw_cfg = encode::Config { entropy: EntropyMode::None, ..encode::Config::default() };
    let (raw, raw_report) = compress(&mesh, raw_cfg);
    let (packed, packed_report) = compress(&mesh, encode::Config::default());
    assert_eq!(raw_report.vertex_order, packed_report.vertex_order);

    let a = decode(&raw, decode::Config::default()).unwrap();
    let b = decode(&packed, decode::Config::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn point_clouds_follow_the_vertex_order() {
    let positions = (0..200)
        .flat_map(|i| {
            let t = i as f32 * 0.1;
            [t.cos() * t, t.sin() * t, t * 0.5]
        })
        .collect::<Vec<_>>();
    let mut builder = MeshBuilder::new();
    builder.add_positions(positions).unwrap();
    let mesh = builder.build().unwrap();

    let (data, report) = compress(&mesh, encode::Config::default());
    assert_eq!(report.num_faces, 0);
    assert_eq!(report.symbols.total(), 0);
    let mut seen = report.vertex_order.clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..200).collect::<Vec<_>>());

    let decoded = decode(&data, decode::Config::default()).unwrap();
    assert_eq!(decoded.num_faces(), 0);
    let header = decode::read_header(&data).unwrap();
    let step = header.attributes[0].q;
    let positions = positions_of(&decoded);
    for (i, p) in positions_of(&mesh).iter().enumerate() {
        let d = positions[report.vertex_order[i] as usize];
        for k in 0..3 {
            assert!((d[k] - p[k]).abs() <= step + 1e-5);
        }
    }
}

#[test]
fn requantizing_a_decoded_mesh_is_exact() {
    let mesh = terrain(8, 8);
    let cfg = || encode::Config::default().with_attribute(
        "uv",
        encode::AttributeConfig::Generic { quantization: encode::Quantization::Bits(6), strategy: Strategy::PARALLEL },
    );
    let (data, _) = compress(&mesh, cfg());
    let once = decode(&data, decode::Config::default()).unwrap();
    let (data, report) = compress(&once, cfg());
    let twice = decode(&data, decode::Config::default()).unwrap();

    for name in ["position", "uv"] {
        let a = once.get_attribute(name).unwrap();
        let b = twice.get_attribute(name).unwrap();
        let n = a.get_num_components();
        let (a, b) = (a.as_slice::<f32>().unwrap(), b.as_slice::<f32>().unwrap());
        for (i, v) in a.chunks_exact(n).enumerate() {
            let t = report.vertex_order[i] as usize * n;
            assert_eq!(&b[t..t + n], v, "{name} {i}");
        }
    }
}

#[test]
fn plain_sequences_are_lossless() {
    let mut builder = MeshBuilder::new();
    builder.set_faces(vec![[0, 1, 2], [0, 2, 3]]);
    builder.add_positions(vec![0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
    builder.add_custom("label", vec![7_u16, 65535, 0, 300], 1).unwrap();
    builder.add_custom("offset", vec![-3_i32, 4, -100000, 12, 0, 1, 1, 1], 2).unwrap();
    let mesh = builder.build().unwrap();
    let plain = encode::AttributeConfig::Generic { quantization: encode::Quantization::Step(1.0), strategy: Strategy::NONE };
    let cfg = encode::Config::default()
        .with_attribute("label", plain)
        .with_attribute("offset", plain);

    let (data, report) = compress(&mesh, cfg);
    let decoded = decode(&data, decode::Config::default()).unwrap();
    let labels = decoded.get_attribute("label").unwrap().as_slice::<u16>().unwrap();
    let offsets = decoded.get_attribute("offset").unwrap().as_slice::<i32>().unwrap();
    for i in 0..4 {
        let t = report.vertex_order[i] as usize;
        assert_eq!(labels[t], [7, 65535, 0, 300][i]);
        assert_eq!(offsets[2 * t..2 * t + 2], [[-3, 4], [-100000, 12], [0, 1], [1, 1]][i]);
    }
}

/// a grid of 'w' by 'h' cells with some cells left out.
fn holey_grid(w: u32, h: u32, holes: &[bool]) -> Vec<[u32; 3]> {
    let mut faces = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if holes[(y * w + x) as usize % holes.len()] {
                continue;
            }
            let v = y * (w + 1) + x;
            faces.push([v, v + 1, v + w + 2]);
            faces.push([v, v + w + 2, v + w + 1]);
        }
    }
    faces
}

proptest! {
    #[test]
    fn connectivity_is_rebuilt(
        w in 1_u32..7,
        h in 1_u32..7,
        holes in proptest::collection::vec(proptest::bool::weighted(0.2), 1..40),
        rotation in 0_usize..50,
    ) {
        let mut faces = holey_grid(w, h, &holes);
        prop_assume!(!faces.is_empty());
        let len = faces.len();
        faces.rotate_left(rotation % len);
        let num_vertices = ((w + 1) * (h + 1)) as usize;
        let positions = (0..num_vertices as u32)
            .flat_map(|v| [(v % (w + 1)) as f32, (v / (w + 1)) as f32, 0.0])
            .collect::<Vec<_>>();
        let mut builder = MeshBuilder::new();
        builder.set_faces(faces.clone());
        builder.add_positions(positions).unwrap();
        let mesh = builder.build().unwrap();

        let (data, report) = compress(&mesh, encode::Config::default());
        let s = report.symbols;
        prop_assert_eq!(s.vertex + s.split + s.left + s.right + s.end, faces.len());

        let decoded = decode(&data, decode::Config::default()).unwrap();
        prop_assert_eq!(decoded.num_vertices(), num_vertices);
        let (expected, found) = face_sets(&faces, &report.vertex_order, decoded.get_faces());
        prop_assert_eq!(expected, found);
    }
}
