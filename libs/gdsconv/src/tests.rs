use std::path::PathBuf;

use gds::{
    GdsArrayRef, GdsBoundary, GdsBox, GdsElement, GdsLibrary, GdsPath, GdsPoint, GdsProperty,
    GdsStrans, GdsStruct, GdsStructRef, GdsTextElem, GdsUnits,
};
use geometry::prelude::*;
use layir::{ArrayParams, BuildError, Cell, GeometryMode, Instance, Library, LibraryBuilder, Text};
use test_log::test;

use crate::{
    export::{export_gds, GdsExportError, GdsExportOpts},
    import::{import_gds, GdsImportError, GdsImportOpts, GdsImporter, INSTANCE_NAME_ATTR},
    GdsLayer,
};

const BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

#[inline]
fn get_path(test_name: &str, file_name: &str) -> PathBuf {
    PathBuf::from(BUILD_DIR).join(test_name).join(file_name)
}

fn r90() -> Orientation {
    Orientation::from_reflect_and_angle(false, Rotation::R90)
}

fn gdslib() -> Library<GdsLayer> {
    let mut lib = LibraryBuilder::new();
    let mut bot = Cell::new("bot");
    bot.add_shape(GdsLayer(1, 0), Rect::from_sides(0, 0, 100, 100));
    let bot = lib.add_cell(bot);
    let mut mid1 = Cell::new("mid1");
    mid1.add_shape(GdsLayer(2, 0), Rect::from_sides(100, 0, 200, 100));
    mid1.add_instance(Instance::new(bot, "xbot"));
    let mid1 = lib.add_cell(mid1);
    let mut mid2 = Cell::new("mid2");
    mid2.add_shape(GdsLayer(3, 0), Rect::from_sides(0, 0, 100, 100));
    mid2.add_instance(Instance::with_transformation(
        bot,
        "xbot",
        Transformation::from_offset_and_orientation(Point::new(100, 0), r90()),
    ));
    let mid2 = lib.add_cell(mid2);
    let mut top = Cell::new("top");
    top.add_shape(GdsLayer(4, 0), Rect::from_sides(0, 0, 200, 200));
    top.add_text(Text::with_transformation(
        GdsLayer(4, 5),
        "vdd",
        Transformation::translate(10, 10),
    ));
    top.add_instance(Instance::with_transformation(
        mid1,
        "xmid1",
        Transformation::translate(0, 100),
    ));
    top.add_instance(Instance::with_transformation(
        mid2,
        "xmid2",
        Transformation::identity(),
    ));
    top.add_instance(
        Instance::with_transformation(bot, "xarr", Transformation::translate(300, 0)).with_array(
            ArrayParams {
                cols: 3,
                rows: 2,
                col_step: Point::new(100, 0),
                row_step: Point::new(0, 150),
            },
        ),
    );
    lib.add_cell(top);
    lib.build().unwrap()
}

fn gds_struct(name: &str, elems: Vec<GdsElement>) -> GdsStruct {
    let mut s = GdsStruct::new(name);
    s.elems = elems;
    s
}

fn gds_lib(structs: Vec<GdsStruct>) -> GdsLibrary {
    let mut lib = GdsLibrary::new("lib");
    lib.structs = structs;
    lib
}

fn pts(xy: &[(i32, i32)]) -> Vec<GdsPoint> {
    xy.iter().map(|&(x, y)| GdsPoint::new(x, y)).collect()
}

/// A closed boundary through `xy`.
fn boundary(layer: i16, xy: &[(i32, i32)]) -> GdsElement {
    let mut xy = pts(xy);
    xy.push(xy[0]);
    GdsBoundary {
        layer,
        datatype: 0,
        xy,
        ..Default::default()
    }
    .into()
}

fn sref(name: &str, x: i32, y: i32, strans: Option<GdsStrans>) -> GdsElement {
    GdsStructRef {
        name: name.into(),
        xy: GdsPoint::new(x, y),
        strans,
        ..Default::default()
    }
    .into()
}

fn leaf() -> GdsStruct {
    gds_struct("leaf", vec![boundary(1, &[(0, 0), (5, 0), (5, 5), (0, 5)])])
}

fn path(xy: &[(i32, i32)], width: Option<i32>, path_type: Option<i16>) -> GdsPath {
    GdsPath {
        layer: 6,
        datatype: 0,
        xy: pts(xy),
        width,
        path_type,
        ..Default::default()
    }
}

fn import_path(path: GdsPath) -> Result<Vec<Rect>, GdsImportError> {
    let lib = import_gds(
        &gds_lib(vec![gds_struct("wire", vec![path.into()])]),
        GdsImportOpts::default(),
    )?;
    Ok(lib
        .cell_named("wire")
        .layer(&GdsLayer(6, 0))
        .map(|g| g.rects().to_vec())
        .unwrap_or_default())
}

fn flattened(lib: &Library<GdsLayer>, layer: GdsLayer) -> Vec<Rect> {
    let index = lib
        .geo_index(lib.cell_id_named("top"), &layer, 0, 0)
        .unwrap();
    let mut rects: Vec<Rect> = index
        .query(Rect::from_sides(-10_000, -10_000, 10_000, 10_000), 0, 0)
        .map(|s| s.bbox().unwrap())
        .collect();
    rects.sort();
    rects
}

#[test]
fn export_writes_children_first() {
    let lib = gdslib();
    let opts = GdsExportOpts {
        name: "top".into(),
        units: Some(GdsUnits::new(1., 1e-6)),
    };
    let gds = export_gds(&lib, opts).unwrap();

    gds.save(get_path("export_writes_children_first", "layout.gds"))
        .expect("failed to write gds");

    let names: Vec<_> = gds.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["bot", "mid1", "mid2", "top"]);
    assert_eq!(gds.units, GdsUnits::new(1., 1e-6));
    assert_eq!(gds.structs[0].elems.len(), 1);
    assert_eq!(gds.structs[1].elems.len(), 2);
    assert_eq!(gds.structs[2].elems.len(), 2);
    assert_eq!(gds.structs[3].elems.len(), 5);
}

#[test]
fn export_element_encoding() {
    let gds = export_gds(&gdslib(), GdsExportOpts::default()).unwrap();
    assert_eq!(gds.units, GdsUnits::default());

    let bot = &gds.structs[0];
    assert_eq!(
        bot.elems[0],
        GdsBoundary {
            layer: 1,
            datatype: 0,
            xy: pts(&[(0, 0), (100, 0), (100, 100), (0, 100), (0, 0)]),
            ..Default::default()
        }
        .into()
    );

    let GdsElement::GdsStructRef(plain) = &gds.structs[1].elems[1] else {
        panic!("expected a structure reference in mid1");
    };
    assert_eq!(plain.name, "bot");
    assert_eq!(plain.strans, None);

    let GdsElement::GdsStructRef(rotated) = &gds.structs[2].elems[1] else {
        panic!("expected a structure reference in mid2");
    };
    assert_eq!(rotated.xy, GdsPoint::new(100, 0));
    assert_eq!(
        rotated.strans,
        Some(GdsStrans {
            angle: Some(90.),
            ..Default::default()
        })
    );

    let top = &gds.structs[3];
    let GdsElement::GdsTextElem(text) = &top.elems[1] else {
        panic!("expected a text element in top");
    };
    assert_eq!(text.string, "vdd");
    assert_eq!((text.layer, text.texttype), (4, 5));
    assert_eq!(text.xy, GdsPoint::new(10, 10));
    assert_eq!(text.presentation, Some(gds::DEFAULT_PRESENTATION));

    let GdsElement::GdsArrayRef(array) = &top.elems[4] else {
        panic!("expected an array reference in top");
    };
    assert_eq!(array.name, "bot");
    assert_eq!((array.cols, array.rows), (3, 2));
    assert_eq!(array.xy, pts(&[(300, 0), (600, 0), (300, 300)])[..]);
    assert_eq!(array.strans, None);
}

#[test]
fn export_rejects_oversized_values() {
    let mut lib = LibraryBuilder::new();
    let mut big = Cell::new("big");
    big.add_shape(GdsLayer(1, 0), Rect::from_sides(0, 0, 1 << 40, 10));
    lib.add_cell(big);
    let err = export_gds(&lib.build().unwrap(), GdsExportOpts::default()).unwrap_err();
    assert_eq!(
        err,
        GdsExportError::CoordinateOverflow {
            cell: "big".into(),
            value: 1 << 40,
        }
    );

    let mut lib = LibraryBuilder::new();
    let mut layered = Cell::new("layered");
    layered.add_shape(GdsLayer(40_000, 0), Rect::from_sides(0, 0, 10, 10));
    lib.add_cell(layered);
    let err = export_gds(&lib.build().unwrap(), GdsExportOpts::default()).unwrap_err();
    assert!(matches!(err, GdsExportError::LayerOverflow { .. }));
}

#[test]
fn export_rejects_degenerate_polygons() {
    for verts in [vec![], vec![Point::new(0, 0), Point::new(10, 10)]] {
        let mut lib = LibraryBuilder::new();
        let mut thin = Cell::new("thin");
        thin.add_shape(GdsLayer(1, 0), Polygon::from_verts(verts));
        lib.add_cell(thin);
        let err = export_gds(&lib.build().unwrap(), GdsExportOpts::default()).unwrap_err();
        assert_eq!(
            err,
            GdsExportError::DegeneratePolygon {
                cell: "thin".into(),
                layer: GdsLayer(1, 0),
            }
        );
    }
}

#[test]
fn round_trip_through_file() {
    let lib = gdslib();
    let path = get_path("round_trip_through_file", "layout.gds");
    export_gds(&lib, GdsExportOpts::default())
        .unwrap()
        .save(&path)
        .unwrap();
    let rawlib = GdsLibrary::load(&path).expect("failed to read GDS");
    let lib2 = import_gds(&rawlib, GdsImportOpts::default()).expect("failed to import GDS");

    assert_eq!(lib2.len(), lib.len());
    for (_, cell) in lib.cells() {
        let cell2 = lib2.cell_named(cell.name());
        for (layer, geometry) in cell.layers() {
            let geometry2 = cell2.layer(layer).expect("layer was not imported");
            assert_eq!(geometry2.rects(), geometry.rects());
            assert_eq!(geometry2.mode(), GeometryMode::Rect);
        }
        assert_eq!(
            cell2.texts().collect::<Vec<_>>(),
            cell.texts().collect::<Vec<_>>()
        );

        let insts: Vec<_> = cell.instances().map(|(_, i)| i).collect();
        let insts2: Vec<_> = cell2.instances().map(|(_, i)| i).collect();
        assert_eq!(insts.len(), insts2.len());
        for (inst, inst2) in insts.into_iter().zip(insts2) {
            assert_eq!(lib.cell(inst.child()).name(), lib2.cell(inst2.child()).name());
            assert_eq!(inst.transformation(), inst2.transformation());
            assert_eq!(inst.array(), inst2.array());
        }
    }

    let flat = flattened(&lib, GdsLayer(1, 0));
    assert_eq!(flat.len(), 8);
    assert_eq!(flattened(&lib2, GdsLayer(1, 0)), flat);
}

#[test]
fn import_names_instances_by_position() {
    let gds = export_gds(&gdslib(), GdsExportOpts::default()).unwrap();
    let lib = import_gds(&gds, GdsImportOpts::default()).unwrap();
    let top = lib.cell_named("top");
    let names: Vec<_> = top.instances().map(|(_, i)| i.name().as_str()).collect();
    assert_eq!(names, ["mid1_0", "mid2_1", "bot_2"]);
}

#[test]
fn import_reads_stored_instance_names() {
    let named = |value: &str| GdsProperty {
        attr: INSTANCE_NAME_ATTR,
        value: value.into(),
    };
    let top = gds_struct(
        "top",
        vec![
            GdsStructRef {
                name: "leaf".into(),
                properties: vec![named("xinv")],
                ..Default::default()
            }
            .into(),
            sref("leaf", 10, 0, None),
            GdsArrayRef {
                name: "leaf".into(),
                xy: [GdsPoint::new(0, 0), GdsPoint::new(20, 0), GdsPoint::new(0, 20)],
                cols: 2,
                rows: 2,
                properties: vec![
                    GdsProperty {
                        attr: 1,
                        value: "other".into(),
                    },
                    named("xgrid"),
                ],
                ..Default::default()
            }
            .into(),
            GdsStructRef {
                name: "leaf".into(),
                properties: vec![GdsProperty {
                    attr: 1,
                    value: "other".into(),
                }],
                ..Default::default()
            }
            .into(),
        ],
    );
    let lib = import_gds(&gds_lib(vec![leaf(), top]), GdsImportOpts::default()).unwrap();
    let top = lib.cell_named("top");
    let names: Vec<_> = top.instances().map(|(_, i)| i.name().as_str()).collect();
    assert_eq!(names, ["xinv", "leaf_1", "xgrid", "leaf_3"]);
    assert!(top.try_instance_named("xgrid").unwrap().array().is_some());
}

#[test]
fn import_checks_units() {
    let gds = gds_lib(vec![leaf()]);
    import_gds(
        &gds,
        GdsImportOpts {
            units: Some(GdsUnits::new(1., 1.0000001e-9)),
        },
    )
    .expect("units within tolerance should be accepted");

    let err = import_gds(
        &gds,
        GdsImportOpts {
            units: Some(GdsUnits::new(1e-3, 1e-6)),
        },
    )
    .expect_err("should fail due to unit mismatch");
    assert_eq!(
        err,
        GdsImportError::UnitsMismatch {
            expected: 1e-6,
            found: 1e-9,
        }
    );
}

#[test]
fn import_classifies_boundaries() {
    let gds = gds_lib(vec![gds_struct(
        "shapes",
        vec![
            boundary(1, &[(0, 0), (10, 0), (10, 20), (0, 20)]),
            boundary(1, &[(0, 0), (0, 20), (10, 20), (10, 0)]),
            boundary(2, &[(0, 0), (20, 0), (20, 10), (10, 10), (10, 20), (0, 20)]),
            boundary(3, &[(0, 0), (10, 0), (20, 10), (20, 20), (0, 20)]),
            boundary(4, &[(0, 0), (20, 0), (5, 10)]),
            GdsBox {
                layer: 5,
                boxtype: 0,
                xy: [(0, 0), (5, 0), (5, 5), (0, 5), (0, 0)].map(|(x, y)| GdsPoint::new(x, y)),
                ..Default::default()
            }
            .into(),
        ],
    )]);
    let lib = import_gds(&gds, GdsImportOpts::default()).unwrap();
    let cell = lib.cell_named("shapes");
    let layer = move |l| cell.layer(&GdsLayer(l, 0)).unwrap();

    assert_eq!(layer(1).mode(), GeometryMode::Rect);
    assert_eq!(layer(1).rects(), [Rect::from_sides(0, 0, 10, 20); 2]);
    assert_eq!(layer(2).mode(), GeometryMode::Polygon90);
    assert_eq!(layer(2).poly90s().len(), 1);
    assert_eq!(layer(2).poly90s()[0].len(), 6);
    assert_eq!(layer(3).mode(), GeometryMode::Polygon45);
    assert_eq!(layer(3).poly45s().len(), 1);
    assert_eq!(layer(4).mode(), GeometryMode::Polygon);
    assert_eq!(layer(4).polys().len(), 1);
    assert_eq!(layer(5).rects(), [Rect::from_sides(0, 0, 5, 5)]);
}

#[test]
fn import_rejects_bad_boundaries() {
    let open = GdsBoundary {
        layer: 1,
        xy: pts(&[(0, 0), (10, 0), (10, 10)]),
        ..Default::default()
    };
    let err = import_gds(
        &gds_lib(vec![gds_struct("open", vec![open.into()])]),
        GdsImportOpts::default(),
    )
    .unwrap_err();
    assert_eq!(err, GdsImportError::OpenBoundary { cell: "open".into() });

    let err = import_gds(
        &gds_lib(vec![gds_struct("line", vec![boundary(1, &[(0, 0), (10, 0)])])]),
        GdsImportOpts::default(),
    )
    .unwrap_err();
    assert_eq!(err, GdsImportError::EmptyElement { cell: "line".into() });

    let err = import_gds(
        &gds_lib(vec![gds_struct("neg", vec![boundary(-1, &[(0, 0), (1, 0), (1, 1)])])]),
        GdsImportOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GdsImportError::InvalidLayer { layer: -1, .. }));
}

#[test]
fn import_paths_as_rects() {
    let xy = [(0, 0), (100, 0), (100, 50)];
    assert_eq!(
        import_path(path(&xy, Some(10), None)).unwrap(),
        [
            Rect::from_sides(0, -5, 105, 5),
            Rect::from_sides(95, -5, 105, 50),
        ]
    );
    assert_eq!(
        import_path(path(&xy, Some(10), Some(2))).unwrap(),
        [
            Rect::from_sides(-5, -5, 105, 5),
            Rect::from_sides(95, -5, 105, 55),
        ]
    );

    let mut extended = path(&xy, Some(10), Some(4));
    extended.begin_extn = Some(3);
    extended.end_extn = Some(7);
    assert_eq!(
        import_path(extended).unwrap(),
        [
            Rect::from_sides(-3, -5, 105, 5),
            Rect::from_sides(95, -5, 105, 57),
        ]
    );

    // Reversed direction with a repeated vertex.
    assert_eq!(
        import_path(path(&[(100, 50), (100, 0), (100, 0), (0, 0)], Some(4), None)).unwrap(),
        [
            Rect::from_sides(98, -2, 102, 50),
            Rect::from_sides(0, -2, 102, 2),
        ]
    );
}

#[test]
fn path_ends_skip_zero_length_segments() {
    let expected = [Rect::from_sides(0, -2, 10, 2)];
    for xy in [
        [(0, 0), (0, 0), (10, 0)],
        [(0, 0), (10, 0), (10, 0)],
    ] {
        assert_eq!(import_path(path(&xy, Some(4), Some(0))).unwrap(), expected);
    }
    assert_eq!(
        import_path(path(&[(0, 0), (0, 0), (10, 0), (10, 0)], Some(4), Some(2))).unwrap(),
        [Rect::from_sides(-2, -2, 12, 2)]
    );
}

#[test]
fn import_rejects_unsupported_paths() {
    let xy = [(0, 0), (100, 0)];
    for bad in [
        path(&xy, None, None),
        path(&xy, Some(5), None),
        path(&xy, Some(10), Some(1)),
        path(&[(0, 0), (10, 10)], Some(10), None),
    ] {
        assert!(matches!(
            import_path(bad),
            Err(GdsImportError::UnsupportedPath { .. })
        ));
    }
    assert!(matches!(
        import_path(path(&[(0, 0)], Some(10), None)),
        Err(GdsImportError::EmptyElement { .. })
    ));
}

#[test]
fn import_transformations() {
    let gds = gds_lib(vec![
        leaf(),
        gds_struct(
            "top",
            vec![
                sref(
                    "leaf",
                    10,
                    20,
                    Some(GdsStrans {
                        reflected: true,
                        angle: Some(270.),
                        ..Default::default()
                    }),
                ),
                sref(
                    "leaf",
                    0,
                    0,
                    Some(GdsStrans {
                        abs_angle: true,
                        ..Default::default()
                    }),
                ),
                GdsTextElem {
                    string: "Out".into(),
                    layer: 1,
                    texttype: 5,
                    xy: GdsPoint::new(3, 4),
                    strans: Some(GdsStrans {
                        mag: Some(2.),
                        angle: Some(90.),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
                .into(),
            ],
        ),
    ]);
    let lib = import_gds(&gds, GdsImportOpts::default()).unwrap();
    let top = lib.cell_named("top");

    let inst = top.try_instance_named("leaf_0").unwrap();
    assert_eq!(
        inst.transformation(),
        Transformation::from_offset_and_orientation(
            Point::new(10, 20),
            Orientation::from_reflect_and_angle(true, Rotation::R270),
        )
    );
    assert!(top
        .try_instance_named("leaf_1")
        .unwrap()
        .transformation()
        .is_identity());

    let text = top.texts().next().unwrap();
    assert_eq!(text.text(), "Out");
    assert_eq!(text.layer(), &GdsLayer(1, 5));
    assert_eq!(
        text.transformation(),
        Transformation::from_offset_and_orientation(Point::new(3, 4), r90())
    );
}

#[test]
fn import_rejects_unsupported_strans() {
    for strans in [
        GdsStrans {
            mag: Some(2.),
            ..Default::default()
        },
        GdsStrans {
            angle: Some(45.),
            ..Default::default()
        },
    ] {
        let gds = gds_lib(vec![
            leaf(),
            gds_struct("top", vec![sref("leaf", 0, 0, Some(strans))]),
        ]);
        let err = import_gds(&gds, GdsImportOpts::default()).unwrap_err();
        assert!(matches!(err, GdsImportError::UnsupportedStrans { .. }));
    }
}

#[test]
fn import_arrays() {
    let aref = |cols, rows, xy: [(i32, i32); 3]| -> GdsElement {
        GdsArrayRef {
            name: "leaf".into(),
            xy: xy.map(|(x, y)| GdsPoint::new(x, y)),
            cols,
            rows,
            strans: Some(GdsStrans {
                angle: Some(90.),
                ..Default::default()
            }),
            ..Default::default()
        }
        .into()
    };

    let gds = gds_lib(vec![
        leaf(),
        gds_struct("top", vec![aref(3, 2, [(10, 10), (70, 10), (10, 70)])]),
    ]);
    let lib = import_gds(&gds, GdsImportOpts::default()).unwrap();
    let (_, inst) = lib.cell_named("top").instances().next().unwrap();
    assert_eq!(
        inst.transformation(),
        Transformation::from_offset_and_orientation(Point::new(10, 10), r90())
    );
    assert_eq!(
        inst.array(),
        Some(&ArrayParams {
            cols: 3,
            rows: 2,
            col_step: Point::new(20, 0),
            row_step: Point::new(0, 30),
        })
    );
    assert_eq!(inst.placements().count(), 6);

    let exported = export_gds(&lib, GdsExportOpts::default()).unwrap();
    assert_eq!(exported.structs[1].elems, gds.structs[1].elems);

    for (cols, rows, xy) in [
        (3, 1, [(0, 0), (10, 0), (0, 5)]),
        (0, 1, [(0, 0), (0, 0), (0, 5)]),
        (-2, 1, [(0, 0), (10, 0), (0, 5)]),
    ] {
        let gds = gds_lib(vec![leaf(), gds_struct("top", vec![aref(cols, rows, xy)])]);
        let err = import_gds(&gds, GdsImportOpts::default()).unwrap_err();
        assert!(
            matches!(err, GdsImportError::InvalidArray { ref name, .. } if name == "leaf"),
            "unexpected error {err:?}"
        );
    }
}

#[test]
fn import_follows_dependencies_not_file_order() {
    let gds = gds_lib(vec![
        gds_struct("top", vec![sref("mid", 0, 0, None)]),
        gds_struct("mid", vec![sref("leaf", 5, 0, None)]),
        leaf(),
        gds_struct("other", vec![boundary(2, &[(0, 0), (1, 0), (1, 1), (0, 1)])]),
    ]);
    let lib = import_gds(&gds, GdsImportOpts::default()).unwrap();
    let order: Vec<_> = lib
        .topological_order()
        .into_iter()
        .map(|id| lib.cell(id).name().clone())
        .collect();
    assert_eq!(order, ["leaf", "mid", "top", "other"]);

    let lib = GdsImporter::new(&gds, GdsImportOpts::default())
        .import_cell("mid")
        .unwrap();
    assert_eq!(lib.len(), 2);
    assert!(lib.try_cell_named("leaf").is_some());
    assert!(lib.try_cell_named("top").is_none());
}

#[test]
fn import_rejects_broken_hierarchies() {
    let cyclic = gds_lib(vec![
        gds_struct("a", vec![sref("b", 0, 0, None)]),
        gds_struct("b", vec![sref("a", 0, 0, None)]),
    ]);
    assert_eq!(
        import_gds(&cyclic, GdsImportOpts::default()).unwrap_err(),
        GdsImportError::Build(BuildError::Cycle("a".into()))
    );

    let dangling = gds_lib(vec![gds_struct("top", vec![sref("nope", 0, 0, None)])]);
    assert_eq!(
        import_gds(&dangling, GdsImportOpts::default()).unwrap_err(),
        GdsImportError::MissingCell("nope".into())
    );

    let duplicate = gds_lib(vec![leaf(), leaf()]);
    assert_eq!(
        import_gds(&duplicate, GdsImportOpts::default()).unwrap_err(),
        GdsImportError::DuplicateCell("leaf".into())
    );

    let err = GdsImporter::new(&gds_lib(vec![leaf()]), GdsImportOpts::default())
        .import_cell("nope")
        .unwrap_err();
    assert_eq!(err, GdsImportError::MissingCell("nope".into()));
}

#[test]
fn imported_hierarchy_supports_spatial_queries() {
    let gds = gds_lib(vec![
        gds_struct(
            "top",
            vec![
                boundary(1, &[(0, 0), (10, 0), (10, 10), (0, 10)]),
                sref("leaf", 20, 20, None),
            ],
        ),
        leaf(),
    ]);
    let bytes = gds.to_bytes().unwrap();
    let lib = import_gds(&GdsLibrary::from_bytes(&bytes).unwrap(), GdsImportOpts::default())
        .unwrap();

    let index = lib
        .geo_index(lib.cell_id_named("top"), &GdsLayer(1, 0), 0, 0)
        .unwrap();
    let mut found: Vec<Rect> = index
        .query(Rect::from_sides(0, 0, 30, 30), 0, 0)
        .map(|s| s.bbox().unwrap())
        .collect();
    found.sort();
    assert_eq!(
        found,
        [
            Rect::from_sides(0, 0, 10, 10),
            Rect::from_sides(20, 20, 25, 25),
        ]
    );
}
