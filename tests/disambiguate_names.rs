use std::path::{Path, PathBuf};

use treelink::disambiguate::{disambiguate, upload_name};

#[test]
fn first_occurrence_keeps_its_name_later_ones_are_numbered() {
    let paths = [
        PathBuf::from("a.txt"),
        PathBuf::from("sub/a.txt"),
        PathBuf::from("other/a.txt"),
    ];
    let renames = disambiguate(&paths);

    assert!(
        !renames.contains_key(Path::new("a.txt")),
        "first occurrence stays untouched"
    );
    assert_eq!(
        renames.get(Path::new("sub/a.txt")).map(String::as_str),
        Some("a_1.txt")
    );
    assert_eq!(
        renames.get(Path::new("other/a.txt")).map(String::as_str),
        Some("a_2.txt")
    );
    assert_eq!(upload_name(Path::new("a.txt"), &renames), "a.txt");
    assert_eq!(upload_name(Path::new("sub/a.txt"), &renames), "a_1.txt");
}

#[test]
fn distinct_basenames_are_never_renamed() {
    let paths = [
        PathBuf::from("one/a.txt"),
        PathBuf::from("two/b.txt"),
        PathBuf::from("three/c.txt"),
    ];
    let renames = disambiguate(&paths);
    assert!(renames.is_empty());
    assert_eq!(upload_name(Path::new("two/b.txt"), &renames), "b.txt");
}

#[test]
fn counter_inserts_before_the_last_extension() {
    let paths = [
        PathBuf::from("one/report.tar.gz"),
        PathBuf::from("two/report.tar.gz"),
        PathBuf::from("three/report.tar.gz"),
    ];
    let renames = disambiguate(&paths);
    assert_eq!(
        renames.get(Path::new("two/report.tar.gz")).map(String::as_str),
        Some("report.tar_1.gz")
    );
    assert_eq!(
        renames
            .get(Path::new("three/report.tar.gz"))
            .map(String::as_str),
        Some("report.tar_2.gz")
    );
}

#[test]
fn names_without_extension_get_a_plain_suffix() {
    let paths = [PathBuf::from("one/Makefile"), PathBuf::from("two/Makefile")];
    let renames = disambiguate(&paths);
    assert_eq!(
        renames.get(Path::new("two/Makefile")).map(String::as_str),
        Some("Makefile_1")
    );
}

#[test]
fn leading_dot_is_not_treated_as_an_extension_boundary() {
    let paths = [PathBuf::from("one/.env"), PathBuf::from("two/.env")];
    let renames = disambiguate(&paths);
    assert_eq!(
        renames.get(Path::new("two/.env")).map(String::as_str),
        Some(".env_1")
    );
}

#[test]
fn output_is_deterministic_for_the_same_ordered_input() {
    let paths = [
        PathBuf::from("x/a.txt"),
        PathBuf::from("y/a.txt"),
        PathBuf::from("z/b.txt"),
        PathBuf::from("w/a.txt"),
    ];
    assert_eq!(disambiguate(&paths), disambiguate(&paths));
}
