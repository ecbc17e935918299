//! End-to-end skim runs against synthetic CZI files on disk.

use std::path::{Path, PathBuf};

use czi_skim::format::czi::{Compression, PixelType};
use czi_skim::{IoError, NhdrCheck, Skim, SkimError, SkimOptions};

use super::test_utils::{CziBuilder, PlaneSpec, XmlDims};

fn write_czi(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Split an attached NRRD into its header text and float samples.
fn read_nrrd(path: &Path) -> (String, Vec<f32>) {
    let bytes = std::fs::read(path).unwrap();
    let split = bytes
        .windows(2)
        .position(|w| w == b"\n\n")
        .expect("header terminator");
    let header = String::from_utf8(bytes[..split + 2].to_vec()).unwrap();
    let data = bytes[split + 2..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    (header, data)
}

fn skip_lines(nhdr: &str) -> Vec<String> {
    nhdr.lines()
        .skip_while(|l| *l != "data file: SKIPLIST 2")
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_skim_writes_xml_and_nhdr() {
    let dir = tempfile::tempdir().unwrap();
    let dims = XmlDims::new(4, 3, 3, 1, PixelType::Gray16);
    let xml = dims.to_xml();
    let built = CziBuilder::new(dims).full_stack().build();
    let czi = write_czi(dir.path(), "stack.czi", &built.bytes);

    let report = Skim::new(SkimOptions::new(&czi))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.planes, 3);
    assert_eq!(report.padded, 0);
    assert_eq!(report.paths.nhdr, dir.path().join("stack.nhdr"));
    assert_eq!(report.paths.xml, dir.path().join("stack.xml"));
    assert!(report.cache.misses > 0);

    assert_eq!(std::fs::read_to_string(&report.paths.xml).unwrap(), xml);

    let nhdr = std::fs::read_to_string(&report.paths.nhdr).unwrap();
    assert!(nhdr.starts_with("NRRD0006\ntype: ushort\nendian: little\nencoding: raw\n"));
    assert!(nhdr.contains("dimension: 3\nsizes: 4 3 3\ncenters: cell cell cell\n"));
    assert!(nhdr.contains(
        "space directions: (0.250000000000, 0, 0) (0, 0.250000000000, 0) (0, 0, 1.000000000000)\n"
    ));

    let expected: Vec<String> = built
        .data_offsets
        .iter()
        .map(|o| format!("{} {}", o, czi.display()))
        .collect();
    assert_eq!(skip_lines(&nhdr), expected);
}

#[tokio::test]
async fn test_skim_multichannel_with_projections() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(4, 3, 2, 2, PixelType::Gray16))
        .full_stack()
        .subblock_metadata(24)
        .build();
    let czi = write_czi(dir.path(), "embryo.czi", &built.bytes);
    let proj = dir.path().join("out");

    let options = SkimOptions::new(&czi)
        .with_nhdr(dir.path().join("custom.nhdr"))
        .with_xml(dir.path().join("custom.xml"))
        .with_proj(proj.to_string_lossy());
    let report = Skim::new(options).unwrap().run().await.unwrap();

    assert_eq!(report.planes, 4);
    assert!(dir.path().join("custom.xml").exists());

    let nhdr = std::fs::read_to_string(dir.path().join("custom.nhdr")).unwrap();
    assert!(nhdr.contains("dimension: 4\nsizes: 4 3 2 2\ncenters: cell cell none cell\n"));
    assert!(nhdr.contains(") none (0, 0, 1.000000000000)\n"));
    assert_eq!(skip_lines(&nhdr).len(), 4);

    let paths = report.paths.projections.unwrap();
    assert_eq!(paths.xy, dir.path().join("out-projXY.nrrd"));

    // XY: axes (x=4, y=3, c=2, proj=2)
    let (header, xy) = read_nrrd(&paths.xy);
    assert!(header.contains("sizes: 4 3 2 2\n"));
    assert!(header.contains("labels: \"x\" \"y\" \"c\" \"proj\"\n"));
    assert_eq!(xy.len(), 48);
    let at = |x: usize, y: usize, c: usize, p: usize| x + 4 * y + 12 * c + 24 * p;
    assert_eq!(xy[at(1, 2, 1, 0)], 113.0);
    assert_eq!(xy[at(1, 2, 1, 1)], 108.0);
    assert_eq!(xy[at(0, 0, 0, 0)], 10.0);

    // XZ: axes (x=4, z=2, c=2, proj=2), reduced over y
    let (header, xz) = read_nrrd(&paths.xz);
    assert!(header.contains("labels: \"x\" \"z\" \"c\" \"proj\"\n"));
    let at = |x: usize, z: usize, c: usize, p: usize| x + 4 * z + 8 * c + 16 * p;
    assert_eq!(xz[at(3, 1, 1, 0)], 115.0);
    assert!((xz[at(3, 1, 1, 1)] - 114.0).abs() < 1e-3);

    // YZ: axes (y=3, z=2, c=2, proj=2), reduced over x
    let (header, yz) = read_nrrd(&paths.yz);
    assert!(header.contains("sizes: 3 2 2 2\n"));
    let at = |y: usize, z: usize, c: usize, p: usize| y + 3 * z + 6 * c + 12 * p;
    assert_eq!(yz[at(2, 0, 0, 0)], 5.0);
    assert!((yz[at(2, 0, 0, 1)] - 3.5).abs() < 1e-4);
}

#[tokio::test]
async fn test_skim_pads_incomplete_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 4, 1, PixelType::Gray8))
        .plane_with(0, 0, |_, _| 1.0)
        .plane_with(0, 1, |_, _| 2.0)
        .build();
    let czi = write_czi(dir.path(), "short.czi", &built.bytes);

    let report = Skim::new(SkimOptions::new(&czi).with_proj(dir.path().join("p").to_string_lossy()))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.planes, 2);
    assert_eq!(report.padded, 2);

    let nhdr = std::fs::read_to_string(&report.paths.nhdr).unwrap();
    let lines = skip_lines(&nhdr);
    assert_eq!(lines.len(), 4);
    let last = format!("{} {}", built.data_offsets[1], czi.display());
    assert_eq!(lines[1], last);
    assert_eq!(lines[2], last);
    assert_eq!(lines[3], last);
}

#[tokio::test]
async fn test_skim_float_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 1, 1, PixelType::Gray32Float))
        .plane_with(0, 0, |x, y| -0.5 * (x + y) as f32)
        .build();
    let czi = write_czi(dir.path(), "float.czi", &built.bytes);

    let report = Skim::new(SkimOptions::new(&czi).with_proj(dir.path().join("f").to_string_lossy()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let nhdr = std::fs::read_to_string(&report.paths.nhdr).unwrap();
    assert!(nhdr.contains("type: float\n"));

    let (_, xy) = read_nrrd(&report.paths.projections.unwrap().xy);
    // max slot of (1, 1) keeps the negative value
    assert_eq!(xy[3], -1.0);
}

#[tokio::test]
async fn test_skim_rejects_pixel_type_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 1, 1, PixelType::Gray16))
        .plane(PlaneSpec {
            c: 0,
            z: 0,
            pixels: vec![0; 4],
            pixel_type: PixelType::Gray8,
            compression: Compression::Raw,
        })
        .build();
    let czi = write_czi(dir.path(), "mixed.czi", &built.bytes);

    let result = Skim::new(SkimOptions::new(&czi)).unwrap().run().await;
    assert!(matches!(
        result,
        Err(SkimError::PixelTypeMismatch { ref expected, ref found, .. })
            if expected == "Gray16" && found == "Gray8"
    ));
}

#[tokio::test]
async fn test_skim_rejects_compressed_subblocks() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 1, 1, PixelType::Gray8))
        .plane(PlaneSpec {
            c: 0,
            z: 0,
            pixels: vec![0; 4],
            pixel_type: PixelType::Gray8,
            compression: Compression::JpgFile,
        })
        .build();
    let czi = write_czi(dir.path(), "jpeg.czi", &built.bytes);

    let result = Skim::new(SkimOptions::new(&czi)).unwrap().run().await;
    assert!(matches!(
        result,
        Err(SkimError::UnsupportedCompression { ref compression, .. }) if compression == "JpgFile"
    ));
}

#[tokio::test]
async fn test_skim_rejects_unsupported_pixel_type() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 1, 1, PixelType::Bgr24)).build();
    let czi = write_czi(dir.path(), "rgb.czi", &built.bytes);

    let result = Skim::new(SkimOptions::new(&czi)).unwrap().run().await;
    assert!(matches!(result, Err(SkimError::UnsupportedPixelType(ref t)) if t == "Bgr24"));
    // The XML is written before the pixel type is checked
    assert!(dir.path().join("rgb.xml").exists());
    assert!(!dir.path().join("rgb.nhdr").exists());
}

#[tokio::test]
async fn test_skim_without_subblocks() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 1, 1, PixelType::Gray8)).build();
    let czi = write_czi(dir.path(), "empty.czi", &built.bytes);

    let result = Skim::new(SkimOptions::new(&czi)).unwrap().run().await;
    assert!(matches!(result, Err(SkimError::NoSubBlocks(_))));
}

#[tokio::test]
async fn test_skim_plane_outside_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let built = CziBuilder::new(XmlDims::new(2, 2, 1, 1, PixelType::Gray8))
        .plane_with(0, 3, |_, _| 0.0)
        .build();
    let czi = write_czi(dir.path(), "odd.czi", &built.bytes);

    // Without projections the plane index is never used
    assert!(Skim::new(SkimOptions::new(&czi)).unwrap().run().await.is_ok());

    let result = Skim::new(SkimOptions::new(&czi).with_proj(dir.path().join("q").to_string_lossy()))
        .unwrap()
        .run()
        .await;
    assert!(matches!(result, Err(SkimError::PlaneOutOfRange { z: 3, .. })));
}

#[tokio::test]
async fn test_skim_rejects_sizes_larger_than_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("overflow.czi", XmlDims::new(4, 3, usize::MAX, 2, PixelType::Gray16)),
        ("wide.czi", XmlDims::new(100_000, 100_000, 1, 1, PixelType::Gray16)),
        ("deep.czi", XmlDims::new(4, 3, 1_000_000, 3, PixelType::Gray8)),
    ];

    for (name, dims) in cases {
        // Sizes are checked before any plane is looked at
        let built = CziBuilder::new(dims).build();
        let czi = write_czi(dir.path(), name, &built.bytes);

        let options = SkimOptions::new(&czi).with_proj(dir.path().join(name).to_string_lossy());
        let result = Skim::new(options).unwrap().run().await;
        assert!(
            matches!(result, Err(SkimError::InvalidDimensions(_))),
            "{} should be rejected, got {:?}",
            name,
            result
        );
        assert!(!czi.with_extension("nhdr").exists());
    }
}

#[tokio::test]
async fn test_skim_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Skim::new(SkimOptions::new(dir.path().join("absent.czi")))
        .unwrap()
        .run()
        .await;
    assert!(matches!(result, Err(SkimError::Io(IoError::NotFound(_)))));
}

#[tokio::test]
async fn test_skim_not_a_czi() {
    let result = Skim::new(SkimOptions::new("stack.tif"));
    assert!(matches!(result, Err(SkimError::NotCzi(_))));
}

#[tokio::test]
async fn test_nhdrcheck_counts_line_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["001-line.nrrd", "002-line.nrrd", "001.nhdr"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    let check = NhdrCheck::new(Some(dir.path().to_path_buf())).unwrap();
    assert_eq!(check.run().await.unwrap().len(), 2);
}
