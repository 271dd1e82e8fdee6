mod common;

use common::{files_under, nested_chain, oversized_entry_zip, write_archive, zip_bytes};
use deepunzip::{ArchiveSource, ExpandOptions, SkipReason, UnnestError};
use tempfile::TempDir;

fn options(source: &std::path::Path, dest: &std::path::Path) -> ExpandOptions {
    ExpandOptions::new(ArchiveSource::Local(source.to_path_buf()), dest)
}

#[tokio::test]
async fn flat_archive_extracts_exactly_its_entries() {
    let dir = TempDir::new().unwrap();
    let source = write_archive(
        &dir.path().join("flat.zip"),
        &[
            ("readme.txt", b"hello"),
            ("docs/", b""),
            ("docs/guide.md", b"# guide"),
            ("empty/", b""),
        ],
    );
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert_eq!(report.extracted.len(), 1);
    assert_eq!(report.extracted[0].depth, 0);
    assert_eq!(report.extracted[0].files, 2);
    assert!(report.failures.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(files_under(&dest), ["docs/guide.md", "readme.txt"]);
    assert!(dest.join("empty").is_dir());
    assert_eq!(std::fs::read(dest.join("readme.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn nested_archive_lands_in_sibling_directory() {
    let dir = TempDir::new().unwrap();
    let inner = zip_bytes(&[("inside.txt", b"nested content")]);
    let source = write_archive(
        &dir.path().join("A.zip"),
        &[("pkg/inner.zip", &inner), ("top.txt", b"top")],
    );
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert_eq!(report.extracted.len(), 2);
    assert_eq!(report.extracted[1].archive, dest.join("pkg").join("inner.zip"));
    assert_eq!(report.extracted[1].target, dest.join("pkg").join("inner"));
    assert_eq!(
        files_under(&dest),
        ["pkg/inner.zip", "pkg/inner/inside.txt", "top.txt"]
    );
    assert_eq!(
        std::fs::read_to_string(dest.join("pkg/inner/inside.txt")).unwrap(),
        "nested content"
    );
}

#[tokio::test]
async fn each_nesting_level_adds_one_extraction() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("chain.zip");
    std::fs::write(&source, nested_chain(4)).unwrap();
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    let depths: Vec<_> = report.extracted.iter().map(|a| a.depth).collect();
    assert_eq!(depths, [0, 1, 2, 3]);
    assert!(dest.join("l1/l2/l3/deepest.txt").is_file());
    assert_eq!(
        std::fs::read_to_string(dest.join("l1/l2/l3/deepest.txt")).unwrap(),
        "bottom"
    );
}

#[tokio::test]
async fn rerun_overwrites_previous_output() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("chain.zip");
    std::fs::write(&source, nested_chain(3)).unwrap();
    let dest = dir.path().join("out");
    let opts = options(&source, &dest);

    deepunzip::run(&opts).await.unwrap();
    let first = files_under(&dest);
    std::fs::write(dest.join("l1/l2/deepest.txt"), b"tampered").unwrap();

    let report = deepunzip::run(&opts).await.unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(files_under(&dest), first);
    assert_eq!(
        std::fs::read_to_string(dest.join("l1/l2/deepest.txt")).unwrap(),
        "bottom"
    );
}

#[tokio::test]
async fn missing_source_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out");

    let err = deepunzip::run(&options(&dir.path().join("absent.zip"), &dest))
        .await
        .unwrap_err();

    assert!(matches!(err, UnnestError::MissingSource(ref p) if p.ends_with("absent.zip")));
    assert!(!dest.exists());
}

#[tokio::test]
async fn corrupt_sibling_does_not_stop_the_others() {
    let dir = TempDir::new().unwrap();
    let good = zip_bytes(&[("ok.txt", b"fine")]);
    let source = write_archive(
        &dir.path().join("mixed.zip"),
        &[
            ("a.zip", &good),
            ("b.zip", b"this is not an archive at all"),
            ("c.zip", &good),
        ],
    );
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].archive, dest.join("b.zip"));
    assert!(report.failures[0].to_string().contains("b.zip"));
    assert_eq!(report.extracted.len(), 3);
    assert!(dest.join("a/ok.txt").is_file());
    assert!(dest.join("c/ok.txt").is_file());
    assert!(!dest.join("b").exists());
}

#[tokio::test]
async fn lying_entry_size_fails_only_that_archive() {
    let dir = TempDir::new().unwrap();
    let good = zip_bytes(&[("ok.txt", b"fine")]);
    let liar = oversized_entry_zip(1 << 62);
    let source = write_archive(
        &dir.path().join("mixed.zip"),
        &[("a.zip", &good), ("b.zip", &liar), ("c.zip", &good)],
    );
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].archive, dest.join("b.zip"));
    assert!(
        report.failures[0]
            .to_string()
            .contains("extends past end of archive")
    );
    assert!(dest.join("a/ok.txt").is_file());
    assert!(dest.join("c/ok.txt").is_file());
    assert!(!dest.join("b/huge.bin").exists());
}

#[tokio::test]
async fn corrupt_source_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("broken.zip");
    std::fs::write(&source, b"PK\x03\x04 truncated").unwrap();
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert!(report.has_failures());
    assert!(report.extracted.is_empty());
    assert!(dest.is_dir());
}

#[tokio::test]
async fn uppercase_extension_is_discovered() {
    let dir = TempDir::new().unwrap();
    let inner = zip_bytes(&[("x.txt", b"x")]);
    let source = write_archive(&dir.path().join("outer.zip"), &[("SHOUT.ZIP", &inner)]);
    let dest = dir.path().join("out");

    deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert!(dest.join("SHOUT/x.txt").is_file());
}

#[tokio::test]
async fn depth_limit_stops_recursion() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("chain.zip");
    std::fs::write(&source, nested_chain(3)).unwrap();
    let dest = dir.path().join("out");

    let report = deepunzip::run(&options(&source, &dest).with_max_depth(1))
        .await
        .unwrap();

    assert_eq!(report.extracted.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::DepthLimit);
    assert_eq!(report.skipped[0].archive, dest.join("l1/l2.zip"));
    assert!(dest.join("l1/l2.zip").is_file());
    assert!(!dest.join("l1/l2").exists());
}

#[tokio::test]
async fn unsafe_entry_names_stay_inside_destination() {
    let dir = TempDir::new().unwrap();
    let source = write_archive(
        &dir.path().join("slip.zip"),
        &[("../../escaped.txt", b"bad"), ("fine.txt", b"good")],
    );
    let dest = dir.path().join("nested").join("out");

    let report = deepunzip::run(&options(&source, &dest)).await.unwrap();

    assert_eq!(report.extracted[0].files, 1);
    assert!(!dir.path().join("escaped.txt").exists());
    assert_eq!(files_under(&dest), ["fine.txt"]);
}
