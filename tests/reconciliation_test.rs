mod common;

use common::{assert_disjoint, create_test_dir, read_file, write_file};
use itemgen::reconciliation::{materialize, reconcile};
use std::collections::HashSet;
use std::path::PathBuf;

#[tokio::test]
async fn test_classifies_new_modified_conflicting_and_unchanged() {
    let output = create_test_dir();
    let project = create_test_dir();

    write_file(output.path(), "A.txt", "new").await;
    write_file(output.path(), "B.txt", "generated b").await;
    write_file(output.path(), "C.txt", "generated c").await;
    write_file(output.path(), "D.txt", "same").await;

    write_file(project.path(), "B.txt", "project b").await;
    write_file(project.path(), "C.txt", "project c").await;
    write_file(project.path(), "D.txt", "same").await;

    let merge: HashSet<PathBuf> = [project.path().join("B.txt")].into_iter().collect();

    let result = reconcile(output.path(), project.path(), &merge)
        .await
        .expect("Should reconcile");

    assert_eq!(result.new_files, vec!["A.txt".to_string()]);
    assert_eq!(result.modified_files, vec!["B.txt".to_string()]);
    assert_eq!(result.conflicting_files, vec!["C.txt".to_string()]);
    assert_disjoint(&result);
}

#[tokio::test]
async fn test_disjoint_trees_are_all_new() {
    let output = create_test_dir();
    let project = create_test_dir();

    write_file(output.path(), "Views/MapPage.xaml", "<Page/>").await;
    write_file(output.path(), "Views/MapPage.xaml.cs", "class MapPage {}").await;
    write_file(output.path(), "Services/LocationService.cs", "class L {}").await;
    write_file(project.path(), "App.xaml", "<Application/>").await;

    let result = reconcile(output.path(), project.path(), &HashSet::new())
        .await
        .expect("Should reconcile");

    assert_eq!(
        result.new_files,
        vec![
            "Services/LocationService.cs".to_string(),
            "Views/MapPage.xaml".to_string(),
            "Views/MapPage.xaml.cs".to_string(),
        ]
    );
    assert!(result.modified_files.is_empty());
    assert!(result.conflicting_files.is_empty());
}

#[tokio::test]
async fn test_identical_merge_eligible_file_is_not_modified() {
    let output = create_test_dir();
    let project = create_test_dir();

    write_file(output.path(), "App.xaml.cs", "same").await;
    write_file(project.path(), "App.xaml.cs", "same").await;
    let merge: HashSet<PathBuf> = [project.path().join("App.xaml.cs")].into_iter().collect();

    let result = reconcile(output.path(), project.path(), &merge)
        .await
        .expect("Should reconcile");

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_marker_files_are_never_reported() {
    let output = create_test_dir();
    let project = create_test_dir();

    write_file(output.path(), "App_postaction.xaml.cs", "snippet").await;
    write_file(output.path(), "Views/Shell_gpostaction.xaml", "snippet").await;
    write_file(output.path(), "App_failedpostaction.xaml.cs", "snippet").await;
    write_file(output.path(), "Strings/Resources$en-us_failedpostaction1.resw", "x").await;
    write_file(output.path(), "Real.cs", "real").await;

    let result = reconcile(output.path(), project.path(), &HashSet::new())
        .await
        .expect("Should reconcile");

    assert_eq!(result.new_files, vec!["Real.cs".to_string()]);
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_materialize_makes_project_match_output() {
    let output = create_test_dir();
    let project = create_test_dir();

    write_file(output.path(), "A.txt", "new").await;
    write_file(output.path(), "Nested/Deep/E.txt", "nested new").await;
    write_file(output.path(), "B.txt", "generated b").await;
    write_file(output.path(), "C.txt", "generated c").await;
    write_file(project.path(), "B.txt", "project b").await;
    write_file(project.path(), "C.txt", "project c").await;

    let merge: HashSet<PathBuf> = [project.path().join("B.txt")].into_iter().collect();
    let result = reconcile(output.path(), project.path(), &merge)
        .await
        .expect("Should reconcile");

    let report = materialize(&result, output.path(), project.path())
        .await
        .expect("Should materialize");
    assert_eq!(report.copied.len(), 4);

    for path in result
        .new_files
        .iter()
        .chain(result.modified_files.iter())
        .chain(result.conflicting_files.iter())
    {
        assert_eq!(
            read_file(project.path(), path).await,
            read_file(output.path(), path).await,
            "{} should match the output",
            path
        );
    }

    // Nothing left to do once synced
    let again = reconcile(output.path(), project.path(), &merge)
        .await
        .expect("Should reconcile");
    assert!(again.is_empty());
}
